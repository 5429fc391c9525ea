//! ScheduleManager implementation over an Automerge document.
//!
//! This module provides the main `ScheduleManager` struct that wraps an Automerge
//! document and provides:
//! - High-level operations via autosurgeon (hydrate/reconcile) for graph edits
//! - Targeted O(1) updates via direct put operations for scalar scene fields
//! - The [`ScheduleStore`] transaction boundary used by the reconciler

use std::sync::Arc;

use automerge::{
    transaction::{CommitOptions, Transactable},
    AutoCommit, ChangeHash, ObjId, ReadDoc, ScalarValue, Value, ROOT,
};
use autosurgeon::{hydrate, reconcile};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::error::{PersistenceError, ScheduleError, ScheduleResult};
use crate::pagination::{DayAggregateRecalculator, PageLengthEstimator};
use crate::reconcile::{DiffResult, ReconcileReport, SceneDraft, ScheduleReconciler, ScheduleStore};
use crate::schedule::model::*;

/// A scene whose stored length differed from a fresh estimate.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PageLengthUpdate {
    pub scene_id: String,
    pub old_eighths: u32,
    pub new_eighths: u32,
}

// =============================================================================
// SCHEDULE MANAGER
// =============================================================================

/// Document manager for one project's scene/day graph.
///
/// Every edit that changes scene membership or length recomputes the
/// affected shoot-day aggregates before it is written back.
pub struct ScheduleManager {
    doc: AutoCommit,
    /// Cached hydrated state - invalidated after direct document mutations.
    cached_state: Option<ScheduleRoot>,
    estimator: PageLengthEstimator,
}

impl ScheduleManager {
    // =========================================================================
    // INITIALIZATION
    // =========================================================================

    /// Creates a new empty ScheduleManager with an initialized document schema.
    pub fn new() -> Self {
        Self::from_root(ScheduleRoot::new(""))
            .expect("Failed to initialize document")
    }

    /// Creates a ScheduleManager holding the given graph.
    pub fn from_root(root: ScheduleRoot) -> ScheduleResult<Self> {
        let mut doc = AutoCommit::new();
        reconcile(&mut doc, &root)?;
        doc.commit_with(CommitOptions::default().with_message("init schedule"));
        Ok(Self {
            doc,
            cached_state: Some(root),
            estimator: PageLengthEstimator::default(),
        })
    }

    /// Creates a ScheduleManager from saved binary data.
    pub fn from_bytes(bytes: &[u8]) -> ScheduleResult<Self> {
        let doc = AutoCommit::load(bytes)?;
        Ok(Self {
            doc,
            cached_state: None,
            estimator: PageLengthEstimator::default(),
        })
    }

    /// Builder: Set the estimator used when seeding and recalculating lengths.
    pub fn with_estimator(mut self, estimator: PageLengthEstimator) -> Self {
        self.estimator = estimator;
        self
    }

    /// Saves the document to binary format.
    pub fn save(&mut self) -> Vec<u8> {
        self.doc.save()
    }

    /// Returns the current heads (for sync protocol).
    pub fn get_heads(&mut self) -> Vec<ChangeHash> {
        self.doc.get_heads()
    }

    /// Gets the actor ID for this document instance.
    pub fn actor_id(&self) -> String {
        self.doc.get_actor().to_hex_string()
    }

    // =========================================================================
    // HIGH-LEVEL OPERATIONS (via Hydrate/Reconcile)
    // =========================================================================

    /// Hydrates the entire document state to Rust structs.
    pub fn get_state(&mut self) -> ScheduleResult<ScheduleRoot> {
        Ok(self.load_state()?)
    }

    /// Applies a function to mutate the state, then reconciles back to the document.
    pub fn update_state<F>(&mut self, f: F) -> ScheduleResult<()>
    where
        F: FnOnce(&mut ScheduleRoot),
    {
        let mut state = self.get_state()?;
        f(&mut state);
        reconcile(&mut self.doc, &state)?;
        self.cached_state = Some(state);
        Ok(())
    }

    /// Like `update_state`, then recomputes every day's aggregates.
    fn update_graph<F>(&mut self, f: F) -> ScheduleResult<()>
    where
        F: FnOnce(&mut ScheduleRoot),
    {
        self.update_state(|state| {
            f(state);
            DayAggregateRecalculator::recompute_all(state);
        })
    }

    fn load_state(&mut self) -> Result<ScheduleRoot, PersistenceError> {
        if let Some(ref cached) = self.cached_state {
            return Ok(cached.clone());
        }
        let state: ScheduleRoot = hydrate(&self.doc)?;
        self.cached_state = Some(state.clone());
        Ok(state)
    }

    // =========================================================================
    // ROOT METADATA OPERATIONS
    // =========================================================================

    /// Sets the project title (O(1)).
    pub fn set_title(&mut self, title: &str) -> ScheduleResult<()> {
        self.cached_state = None;
        self.doc.put(&ROOT, "title", ScalarValue::Str(title.into()))?;
        Ok(())
    }

    // =========================================================================
    // SCENE OPERATIONS
    // =========================================================================

    /// Creates a scene and places it in the script order at its index.
    ///
    /// The scene's length is stored as given.
    pub fn create_scene(&mut self, scene: Scene) -> ScheduleResult<()> {
        tracing::debug!(scene_id = %scene.id, page_eighths = scene.page_eighths, "Creating scene");
        self.update_state(|state| {
            state.insert_scene(scene);
            state.reindex_script_order();
        })
    }

    /// Creates a scene from a draft, seeding its length from the paragraphs
    /// when the draft has none. Returns the new scene's ID.
    pub fn create_scene_from_draft(&mut self, draft: &SceneDraft) -> ScheduleResult<String> {
        let id = draft
            .id
            .clone()
            .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
        let scene = draft.to_scene(id.clone(), &self.estimator);
        self.create_scene(scene)?;
        Ok(id)
    }

    /// Gets a scene by ID.
    pub fn get_scene(&mut self, id: &str) -> ScheduleResult<Option<Scene>> {
        let state = self.get_state()?;
        Ok(state.scenes.get(id).cloned())
    }

    /// Deletes a scene outright. Reconciliation never calls this.
    pub fn delete_scene(&mut self, id: &str) -> ScheduleResult<()> {
        self.require_scene(id)?;
        tracing::debug!(scene_id = %id, "Deleting scene");
        self.update_graph(|state| {
            state.unassign(id);
            state.scenes.remove(id);
            state.scene_order.retain(|s| s != id);
            state.reindex_script_order();
        })
    }

    /// Scenes currently in the script, in script order.
    pub fn scenes_in_script_order(&mut self) -> ScheduleResult<Vec<Scene>> {
        let state = self.get_state()?;
        Ok(state.scenes_in_script_order().into_iter().cloned().collect())
    }

    /// Sets the scene number (O(1)). Scheduling keys off the scene ID.
    pub fn set_scene_number(&mut self, scene_id: &str, number: &str) -> ScheduleResult<()> {
        self.require_scene(scene_id)?;
        self.cached_state = None;
        let obj = self.get_obj_at_path(&["scenes", scene_id])?;
        self.doc.put(&obj, "number", ScalarValue::Str(number.into()))?;
        Ok(())
    }

    /// Replaces the scene heading.
    pub fn set_scene_heading(&mut self, scene_id: &str, heading: SceneHeading) -> ScheduleResult<()> {
        self.require_scene(scene_id)?;
        self.update_state(|state| {
            if let Some(scene) = state.scenes.get_mut(scene_id) {
                scene.heading = heading;
            }
        })
    }

    /// Sets the scene length by hand and recomputes its day.
    pub fn set_scene_page_eighths(&mut self, scene_id: &str, page_eighths: u32) -> ScheduleResult<()> {
        self.require_scene(scene_id)?;
        self.update_graph(|state| {
            if let Some(scene) = state.scenes.get_mut(scene_id) {
                scene.page_eighths = page_eighths;
            }
        })
    }

    /// Re-estimates every scene with paragraphs and rewrites only the lengths
    /// that differ from the stored value.
    pub fn recalculate_page_lengths(&mut self) -> ScheduleResult<Vec<PageLengthUpdate>> {
        let estimator = self.estimator;
        let mut updates = Vec::new();
        self.update_graph(|state| {
            for id in &state.scene_order {
                let Some(scene) = state.scenes.get_mut(id) else {
                    continue;
                };
                if scene.paragraphs.is_empty() {
                    continue;
                }
                let fresh = estimator.estimate(&scene.paragraphs);
                if fresh != scene.page_eighths {
                    updates.push(PageLengthUpdate {
                        scene_id: scene.id.clone(),
                        old_eighths: scene.page_eighths,
                        new_eighths: fresh,
                    });
                    scene.page_eighths = fresh;
                }
            }
        })?;
        tracing::info!(updated = updates.len(), "Recalculated page lengths");
        Ok(updates)
    }

    // =========================================================================
    // SHOOT DAY OPERATIONS
    // =========================================================================

    /// Creates a shoot day and appends it to the calendar order.
    pub fn create_shoot_day(&mut self, day: ShootDay) -> ScheduleResult<()> {
        self.update_graph(|state| {
            let id = day.id.clone();
            state.shoot_days.insert(id.clone(), day);
            if !state.day_order.contains(&id) {
                state.day_order.push(id);
            }
        })
    }

    /// Gets a shoot day by ID.
    pub fn get_shoot_day(&mut self, id: &str) -> ScheduleResult<Option<ShootDay>> {
        let state = self.get_state()?;
        Ok(state.shoot_days.get(id).cloned())
    }

    /// Deletes a shoot day. Its scenes go back to the unscheduled pool.
    pub fn delete_shoot_day(&mut self, id: &str) -> ScheduleResult<()> {
        self.require_day(id)?;
        self.update_state(|state| {
            let scene_ids = state
                .shoot_days
                .get(id)
                .map(|day| day.scene_ids.clone())
                .unwrap_or_default();
            for scene_id in scene_ids {
                state.unassign(&scene_id);
            }
            state.shoot_days.remove(id);
            state.day_order.retain(|d| d != id);
        })
    }

    /// Shoot days in calendar order.
    pub fn days_in_order(&mut self) -> ScheduleResult<Vec<ShootDay>> {
        let state = self.get_state()?;
        Ok(state.days_in_order().into_iter().cloned().collect())
    }

    /// Assigns a scene to a day, moving it off any previous day.
    pub fn assign_scene(&mut self, scene_id: &str, day_id: &str) -> ScheduleResult<()> {
        self.require_scene(scene_id)?;
        self.require_day(day_id)?;
        self.update_graph(|state| {
            state.assign(scene_id, day_id);
        })
    }

    /// Returns a scene to the unscheduled pool.
    pub fn unassign_scene(&mut self, scene_id: &str) -> ScheduleResult<Option<String>> {
        self.require_scene(scene_id)?;
        let mut former = None;
        self.update_graph(|state| {
            former = state.unassign(scene_id);
        })?;
        Ok(former)
    }

    /// Scripted scenes without a shoot day, in script order.
    pub fn unscheduled_scenes(&mut self) -> ScheduleResult<Vec<Scene>> {
        let state = self.get_state()?;
        Ok(state.unscheduled_scenes().into_iter().cloned().collect())
    }

    /// Recomputes every day's aggregates. Idempotent.
    pub fn recompute_aggregates(&mut self) -> ScheduleResult<usize> {
        let mut days = 0;
        self.update_state(|state| {
            days = DayAggregateRecalculator::recompute_all(state);
        })?;
        Ok(days)
    }

    // =========================================================================
    // RECONCILIATION
    // =========================================================================

    /// Applies a script diff with this document as the store.
    pub fn reconcile(
        &mut self,
        diff: &DiffResult,
        reconciler: &ScheduleReconciler,
    ) -> Result<ReconcileReport, PersistenceError> {
        reconciler.reconcile(diff, self)
    }

    // =========================================================================
    // SYNC OPERATIONS
    // =========================================================================

    /// Merges another document into this one.
    pub fn merge(&mut self, other: &mut Self) -> ScheduleResult<()> {
        self.cached_state = None;
        self.doc.merge(&mut other.doc)?;
        Ok(())
    }

    /// Generates sync message for incremental sync.
    /// Returns None if there are no changes since their_heads.
    pub fn generate_sync_message(&mut self, their_heads: &[ChangeHash]) -> Option<Vec<u8>> {
        let changes = self.doc.get_changes(their_heads);
        if changes.is_empty() {
            return None;
        }
        let mut bytes = Vec::new();
        for change in changes {
            bytes.extend(change.raw_bytes());
        }
        Some(bytes)
    }

    /// Applies sync message from peer.
    pub fn apply_sync_message(&mut self, msg: &[u8]) -> ScheduleResult<()> {
        self.cached_state = None;
        self.doc.load_incremental(msg)?;
        Ok(())
    }

    // =========================================================================
    // INTERNAL HELPERS
    // =========================================================================

    fn require_scene(&mut self, id: &str) -> ScheduleResult<()> {
        if self.get_state()?.scenes.contains_key(id) {
            Ok(())
        } else {
            Err(ScheduleError::scene_not_found(id))
        }
    }

    fn require_day(&mut self, id: &str) -> ScheduleResult<()> {
        if self.get_state()?.shoot_days.contains_key(id) {
            Ok(())
        } else {
            Err(ScheduleError::shoot_day_not_found(id))
        }
    }

    /// Gets ObjId at a path.
    fn get_obj_at_path(&self, path: &[&str]) -> ScheduleResult<ObjId> {
        let mut current = ROOT;
        for key in path {
            current = self.get_obj_at_key(&current, key)?;
        }
        Ok(current)
    }

    /// Gets an object ID at a map key.
    fn get_obj_at_key(&self, parent: &ObjId, key: &str) -> ScheduleResult<ObjId> {
        match self.doc.get(parent, key) {
            Ok(Some((Value::Object(_), obj_id))) => Ok(obj_id),
            Ok(Some(_)) => Err(ScheduleError::schema_violation(format!(
                "'{}' is not an object",
                key
            ))),
            Ok(None) => Err(ScheduleError::field_not_found(key)),
            Err(e) => Err(e.into()),
        }
    }
}

impl Default for ScheduleManager {
    fn default() -> Self {
        Self::new()
    }
}

impl ScheduleStore for ScheduleManager {
    /// Seals any pending edits so a failed commit rolls back only its own work.
    fn load(&mut self) -> Result<ScheduleRoot, PersistenceError> {
        self.doc.commit();
        self.load_state()
    }

    fn commit(&mut self, state: &ScheduleRoot, message: &str) -> Result<(), PersistenceError> {
        if let Err(err) = reconcile(&mut self.doc, state) {
            let undone = self.doc.rollback();
            self.cached_state = None;
            tracing::debug!(ops = undone, "Rolled back schedule document");
            return Err(err.into());
        }
        self.doc
            .commit_with(CommitOptions::default().with_message(message));
        self.cached_state = Some(state.clone());
        Ok(())
    }
}

// =============================================================================
// SHARED MANAGER
// =============================================================================

/// One lock per project: every reconciliation against the graph goes
/// through it, one at a time.
#[derive(Clone)]
pub struct SharedScheduleManager {
    inner: Arc<Mutex<ScheduleManager>>,
}

impl SharedScheduleManager {
    pub fn new(manager: ScheduleManager) -> Self {
        Self {
            inner: Arc::new(Mutex::new(manager)),
        }
    }

    /// Reconciles while holding the project lock. Blocks until commit or failure.
    ///
    /// Observers run after the lock is released, so they may read the
    /// schedule through this handle.
    pub fn reconcile(
        &self,
        diff: &DiffResult,
        reconciler: &ScheduleReconciler,
    ) -> Result<ReconcileReport, PersistenceError> {
        let report = {
            let mut manager = self.inner.lock();
            reconciler.apply_and_commit(diff, &mut *manager)?
        };
        reconciler.emit(&report);
        Ok(report)
    }

    /// Runs a closure against the manager while holding the lock.
    pub fn with_manager<R>(&self, f: impl FnOnce(&mut ScheduleManager) -> R) -> R {
        let mut manager = self.inner.lock();
        f(&mut manager)
    }
}

// =============================================================================
// TESTS
// =============================================================================
