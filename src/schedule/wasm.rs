//! WASM bindings for the schedule module.
//!
//! JavaScript-friendly wrapper around ScheduleManager so the schedule UI can
//! preview and apply script diffs in the browser.

use automerge::ChangeHash;
use js_sys::{Array, Uint8Array};
use serde::Serialize;
use serde_wasm_bindgen::{from_value, Serializer};
use wasm_bindgen::prelude::*;

use crate::reconcile::{DiffResult, ImpactSummarizer, SceneDraft, ScheduleReconciler};
use crate::schedule::manager::ScheduleManager;
use crate::schedule::model::*;
use crate::ScheduleError;

/// Serialize a value to JsValue with HashMaps as plain JS objects (not Map).
fn to_js_value<T: Serialize>(value: &T) -> Result<JsValue, serde_wasm_bindgen::Error> {
    value.serialize(&Serializer::new().serialize_maps_as_objects(true))
}

/// Helper macro for Result conversion
macro_rules! js_result {
    ($expr:expr) => {
        $expr.map_err(|e: ScheduleError| JsValue::from_str(&e.to_string()))
    };
}

/// Parses hex change hashes sent from JavaScript.
fn parse_heads(heads: Array) -> Result<Vec<ChangeHash>, JsValue> {
    heads
        .iter()
        .map(|value| {
            let hex = value
                .as_string()
                .ok_or_else(|| JsValue::from_str("head must be a hex string"))?;
            hex.parse::<ChangeHash>()
                .map_err(|e| JsValue::from_str(&format!("invalid head {}: {}", hex, e)))
        })
        .collect()
}

/// JavaScript-friendly wrapper around ScheduleManager.
#[wasm_bindgen]
pub struct JsScheduleManager {
    inner: ScheduleManager,
    reconciler: ScheduleReconciler,
}

#[wasm_bindgen]
impl JsScheduleManager {
    // =========================================================================
    // LIFECYCLE
    // =========================================================================

    /// Creates a new empty schedule manager.
    ///
    /// # Example (JavaScript)
    /// ```js
    /// const manager = new JsScheduleManager();
    /// ```
    #[wasm_bindgen(constructor)]
    pub fn new() -> JsScheduleManager {
        JsScheduleManager {
            inner: ScheduleManager::new(),
            reconciler: ScheduleReconciler::new(),
        }
    }

    /// Loads from binary bytes (Uint8Array).
    #[wasm_bindgen(js_name = fromBytes)]
    pub fn from_bytes(bytes: &[u8]) -> Result<JsScheduleManager, JsValue> {
        let inner = js_result!(ScheduleManager::from_bytes(bytes))?;
        Ok(JsScheduleManager {
            inner,
            reconciler: ScheduleReconciler::new(),
        })
    }

    /// Saves to binary bytes (returns Uint8Array).
    #[wasm_bindgen(js_name = toBytes)]
    pub fn to_bytes(&mut self) -> Uint8Array {
        let bytes = self.inner.save();
        Uint8Array::from(&bytes[..])
    }

    /// Gets the actor ID for this document instance.
    #[wasm_bindgen(js_name = actorId)]
    pub fn actor_id(&self) -> String {
        self.inner.actor_id()
    }

    /// Gets the current heads (for sync protocol).
    #[wasm_bindgen(js_name = getHeads)]
    pub fn get_heads(&mut self) -> Array {
        self.inner
            .get_heads()
            .into_iter()
            .map(|h| JsValue::from_str(&h.to_string()))
            .collect()
    }

    // =========================================================================
    // STATE ACCESS
    // =========================================================================

    /// Gets the full schedule graph as a JavaScript object.
    #[wasm_bindgen(js_name = getState)]
    pub fn get_state(&mut self) -> Result<JsValue, JsValue> {
        let state = js_result!(self.inner.get_state())?;
        Ok(to_js_value(&state)?)
    }

    /// Gets the unscheduled pool in script order.
    #[wasm_bindgen(js_name = getUnscheduledScenes)]
    pub fn get_unscheduled_scenes(&mut self) -> Result<JsValue, JsValue> {
        let scenes = js_result!(self.inner.unscheduled_scenes())?;
        Ok(to_js_value(&scenes)?)
    }

    /// Gets the shoot days in calendar order.
    #[wasm_bindgen(js_name = getDays)]
    pub fn get_days(&mut self) -> Result<JsValue, JsValue> {
        let days = js_result!(self.inner.days_in_order())?;
        Ok(to_js_value(&days)?)
    }

    // =========================================================================
    // SCENES AND DAYS
    // =========================================================================

    /// Creates a scene from a JavaScript object.
    #[wasm_bindgen(js_name = createScene)]
    pub fn create_scene(&mut self, scene: JsValue) -> Result<(), JsValue> {
        let scene: Scene = from_value(scene)?;
        js_result!(self.inner.create_scene(scene))
    }

    /// Creates a scene from a draft object; a missing `page_eighths` is
    /// estimated from the paragraphs. Returns the scene ID.
    #[wasm_bindgen(js_name = createSceneFromDraft)]
    pub fn create_scene_from_draft(&mut self, draft: JsValue) -> Result<String, JsValue> {
        let draft: SceneDraft = from_value(draft)?;
        js_result!(self.inner.create_scene_from_draft(&draft))
    }

    /// Creates a shoot day.
    #[wasm_bindgen(js_name = createShootDay)]
    pub fn create_shoot_day(&mut self, id: &str, date: &str) -> Result<(), JsValue> {
        js_result!(self.inner.create_shoot_day(ShootDay::new(id, date)))
    }

    /// Sets a scene's page length by hand.
    #[wasm_bindgen(js_name = setScenePageEighths)]
    pub fn set_scene_page_eighths(&mut self, scene_id: &str, eighths: u32) -> Result<(), JsValue> {
        js_result!(self.inner.set_scene_page_eighths(scene_id, eighths))
    }

    /// Assigns a scene to a shoot day.
    #[wasm_bindgen(js_name = assignScene)]
    pub fn assign_scene(&mut self, scene_id: &str, day_id: &str) -> Result<(), JsValue> {
        js_result!(self.inner.assign_scene(scene_id, day_id))
    }

    /// Returns a scene to the unscheduled pool.
    #[wasm_bindgen(js_name = unassignScene)]
    pub fn unassign_scene(&mut self, scene_id: &str) -> Result<(), JsValue> {
        js_result!(self.inner.unassign_scene(scene_id)).map(|_| ())
    }

    /// Re-estimates page lengths; returns the scenes that changed.
    #[wasm_bindgen(js_name = recalculatePageLengths)]
    pub fn recalculate_page_lengths(&mut self) -> Result<JsValue, JsValue> {
        let updates = js_result!(self.inner.recalculate_page_lengths())?;
        Ok(to_js_value(&updates)?)
    }

    // =========================================================================
    // RECONCILIATION
    // =========================================================================

    /// Previews a diff without touching the document.
    ///
    /// # Example (JavaScript)
    /// ```js
    /// const impact = manager.summarizeImpact(diff);
    /// if (impact.has_impact && !confirm(impact.summary)) return;
    /// const report = manager.reconcile(diff);
    /// ```
    #[wasm_bindgen(js_name = summarizeImpact)]
    pub fn summarize_impact(&self, diff: JsValue) -> Result<JsValue, JsValue> {
        let diff: DiffResult = from_value(diff)?;
        Ok(to_js_value(&ImpactSummarizer::summarize(&diff))?)
    }

    /// Applies a diff and returns the reconcile report.
    #[wasm_bindgen]
    pub fn reconcile(&mut self, diff: JsValue) -> Result<JsValue, JsValue> {
        let diff: DiffResult = from_value(diff)?;
        let report = self
            .inner
            .reconcile(&diff, &self.reconciler)
            .map_err(|e| JsValue::from_str(&e.to_string()))?;
        Ok(to_js_value(&report)?)
    }

    // =========================================================================
    // SYNC OPERATIONS
    // =========================================================================

    /// Merges another document into this one.
    #[wasm_bindgen]
    pub fn merge(&mut self, other: &mut JsScheduleManager) -> Result<(), JsValue> {
        js_result!(self.inner.merge(&mut other.inner))
    }

    /// Generates a sync message for a peer at `their_heads`, or null.
    #[wasm_bindgen(js_name = generateSyncMessage)]
    pub fn generate_sync_message(&mut self, their_heads: Array) -> Result<JsValue, JsValue> {
        let heads = parse_heads(their_heads)?;
        Ok(match self.inner.generate_sync_message(&heads) {
            Some(bytes) => Uint8Array::from(&bytes[..]).into(),
            None => JsValue::NULL,
        })
    }

    /// Applies a sync message from a peer.
    #[wasm_bindgen(js_name = applySyncMessage)]
    pub fn apply_sync_message(&mut self, msg: &[u8]) -> Result<(), JsValue> {
        js_result!(self.inner.apply_sync_message(msg))
    }
}

impl Default for JsScheduleManager {
    fn default() -> Self {
        Self::new()
    }
}
