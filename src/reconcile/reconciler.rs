//! ScheduleReconciler: applies a script diff to the scene/day graph.
//!
//! Steps run in a fixed order regardless of the order of changes in the diff:
//! removed, added, modified, moved, then a full aggregate recompute. The graph
//! mutation happens on a hydrated copy; the store commits it as one change or
//! not at all. Diagnostics reach `tracing` and observers only after commit.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::PersistenceError;
use crate::pagination::{DayAggregateRecalculator, PageLengthEstimator};
use crate::reconcile::diff::{Change, ChangeSet, DiffResult, SceneDraft};
use crate::schedule::model::{Scene, ScheduleRoot};

// =============================================================================
// STORE AND OBSERVER SEAMS
// =============================================================================

/// Transaction boundary around the persisted graph.
pub trait ScheduleStore {
    /// Loads the current graph.
    fn load(&mut self) -> Result<ScheduleRoot, PersistenceError>;

    /// Writes the whole state as one change. On error nothing is written.
    fn commit(&mut self, state: &ScheduleRoot, message: &str) -> Result<(), PersistenceError>;
}

/// Receives diagnostics after a reconciliation has been committed.
pub trait ScheduleObserver: Send + Sync {
    fn on_diagnostic(&self, diagnostic: &Diagnostic);
}

// =============================================================================
// DIAGNOSTICS
// =============================================================================

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Info,
    Warning,
}

/// What reconciliation did, keyed by scene identity.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Diagnostic {
    SceneUnscheduled {
        scene_id: String,
        former_day: String,
    },
    ScenesAdded {
        count: usize,
        scene_ids: Vec<String>,
    },
    SceneRenumbered {
        scene_id: String,
        old_number: String,
        new_number: String,
        shoot_day: Option<String>,
    },
    HeadingChanged {
        scene_id: String,
        fields: Vec<String>,
    },
    PageLengthChanged {
        scene_id: String,
        old_eighths: u32,
        new_eighths: u32,
        shoot_day: Option<String>,
    },
    SceneMoved {
        scene_id: String,
        old_index: u32,
        new_index: u32,
    },
    /// A change referred to a scene the graph does not contain; it was skipped.
    UnknownScene {
        scene_id: String,
    },
    /// An added draft reused the ID of a scene still in the script or on a
    /// shoot day; it was skipped and the scene left as it was.
    SceneAlreadyExists {
        scene_id: String,
        shoot_day: Option<String>,
    },
}

impl Diagnostic {
    pub fn severity(&self) -> Severity {
        match self {
            Diagnostic::SceneRenumbered {
                shoot_day: Some(_), ..
            }
            | Diagnostic::UnknownScene { .. }
            | Diagnostic::SceneAlreadyExists { .. } => Severity::Warning,
            _ => Severity::Info,
        }
    }

    /// The scene this diagnostic is about, if it concerns a single scene.
    pub fn scene_id(&self) -> Option<&str> {
        match self {
            Diagnostic::SceneUnscheduled { scene_id, .. }
            | Diagnostic::SceneRenumbered { scene_id, .. }
            | Diagnostic::HeadingChanged { scene_id, .. }
            | Diagnostic::PageLengthChanged { scene_id, .. }
            | Diagnostic::SceneMoved { scene_id, .. }
            | Diagnostic::UnknownScene { scene_id }
            | Diagnostic::SceneAlreadyExists { scene_id, .. } => Some(scene_id),
            Diagnostic::ScenesAdded { .. } => None,
        }
    }
}

/// Outcome of a committed reconciliation.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ReconcileReport {
    pub diagnostics: Vec<Diagnostic>,
    pub days_recomputed: usize,
    pub scenes_unscheduled: Vec<String>,
    pub scenes_added: Vec<String>,
}

impl ReconcileReport {
    /// Every scene mentioned by a diagnostic, without duplicates, in order.
    pub fn affected_scene_ids(&self) -> Vec<String> {
        let mut seen = HashSet::new();
        let mut ids = Vec::new();
        let mentioned = self.diagnostics.iter().flat_map(|d| match d {
            Diagnostic::ScenesAdded { scene_ids, .. } => {
                scene_ids.iter().map(String::as_str).collect::<Vec<_>>()
            }
            other => other.scene_id().into_iter().collect::<Vec<_>>(),
        });
        for id in mentioned {
            if seen.insert(id) {
                ids.push(id.to_string());
            }
        }
        ids
    }

    pub fn warnings(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics
            .iter()
            .filter(|d| d.severity() == Severity::Warning)
    }

    /// Change message recorded with the commit.
    pub fn commit_message(&self) -> String {
        format!(
            "reconcile: {} added, {} unscheduled, {} days recomputed",
            self.scenes_added.len(),
            self.scenes_unscheduled.len(),
            self.days_recomputed
        )
    }
}

// =============================================================================
// RECONCILER
// =============================================================================

/// Applies [`DiffResult`]s to the schedule.
#[derive(Default)]
pub struct ScheduleReconciler {
    estimator: PageLengthEstimator,
    observers: Vec<Box<dyn ScheduleObserver>>,
}

impl ScheduleReconciler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder: Set the estimator used to seed new scenes without a length.
    pub fn with_estimator(mut self, estimator: PageLengthEstimator) -> Self {
        self.estimator = estimator;
        self
    }

    /// Registers an observer for post-commit diagnostics.
    pub fn add_observer(&mut self, observer: impl ScheduleObserver + 'static) {
        self.observers.push(Box::new(observer));
    }

    /// Loads the graph, applies the diff, recomputes every day and commits.
    ///
    /// Either the whole diff lands in one commit or the store is unchanged.
    pub fn reconcile<S>(
        &self,
        diff: &DiffResult,
        store: &mut S,
    ) -> Result<ReconcileReport, PersistenceError>
    where
        S: ScheduleStore + ?Sized,
    {
        let report = self.apply_and_commit(diff, store)?;
        self.emit(&report);
        Ok(report)
    }

    /// The transactional part of [`reconcile`](Self::reconcile), without
    /// notifying anyone. Callers holding a lock on the store release it and
    /// then pass the report to [`emit`](Self::emit).
    pub fn apply_and_commit<S>(
        &self,
        diff: &DiffResult,
        store: &mut S,
    ) -> Result<ReconcileReport, PersistenceError>
    where
        S: ScheduleStore + ?Sized,
    {
        let mut state = store.load()?;
        let report = self.apply(diff, &mut state);

        if let Err(err) = store.commit(&state, &report.commit_message()) {
            tracing::error!(error = %err, changes = diff.len(), "Reconciliation rolled back");
            return Err(err);
        }
        Ok(report)
    }

    /// Applies the diff to an in-memory graph. Cannot fail.
    pub fn apply(&self, diff: &DiffResult, state: &mut ScheduleRoot) -> ReconcileReport {
        let mut removed = Vec::new();
        let mut added = Vec::new();
        let mut modified = Vec::new();
        let mut moved = Vec::new();
        for change in &diff.changes {
            match change {
                Change::Removed(scene) => removed.push(scene),
                Change::Added(draft) => added.push(draft),
                Change::Modified {
                    existing,
                    incoming,
                    changes,
                } => modified.push((existing, incoming, changes)),
                Change::Moved {
                    scene,
                    old_index,
                    new_index,
                } => moved.push((scene, *old_index, *new_index)),
            }
        }

        let mut report = ReconcileReport::default();

        for scene in removed {
            self.apply_removed(state, scene, &mut report);
        }

        let added_ids: Vec<String> = added
            .into_iter()
            .filter_map(|draft| self.apply_added(state, draft, &mut report))
            .collect();
        if !added_ids.is_empty() {
            report.diagnostics.push(Diagnostic::ScenesAdded {
                count: added_ids.len(),
                scene_ids: added_ids.clone(),
            });
        }
        report.scenes_added = added_ids;

        for (existing, incoming, changes) in modified {
            self.apply_modified(state, existing, incoming, changes, &mut report);
        }

        for (scene, old_index, new_index) in moved {
            self.apply_moved(state, &scene.id, old_index, new_index, &mut report);
        }

        normalize_script_order(state);
        report.days_recomputed = DayAggregateRecalculator::recompute_all(state);
        report
    }

    /// Clears the shoot day of a removed scene. The scene itself stays.
    fn apply_removed(&self, state: &mut ScheduleRoot, scene: &Scene, report: &mut ReconcileReport) {
        if !state.scenes.contains_key(&scene.id) {
            report.diagnostics.push(Diagnostic::UnknownScene {
                scene_id: scene.id.clone(),
            });
            return;
        }

        state.scene_order.retain(|id| id != &scene.id);
        if let Some(former_day) = state.unassign(&scene.id) {
            report.scenes_unscheduled.push(scene.id.clone());
            report.diagnostics.push(Diagnostic::SceneUnscheduled {
                scene_id: scene.id.clone(),
                former_day,
            });
        }
    }

    /// Creates an unscheduled scene from a draft. Returns its ID.
    ///
    /// A draft may revive a scene removed earlier. One whose ID is still in
    /// the script or on a shoot day is skipped: adding never drops an
    /// assignment.
    fn apply_added(
        &self,
        state: &mut ScheduleRoot,
        draft: &SceneDraft,
        report: &mut ReconcileReport,
    ) -> Option<String> {
        let id = draft
            .id
            .clone()
            .unwrap_or_else(|| Uuid::new_v4().to_string());

        if let Some(existing) = state.scenes.get(&id) {
            if existing.is_scheduled() || state.scene_order.contains(&id) {
                report.diagnostics.push(Diagnostic::SceneAlreadyExists {
                    scene_id: id,
                    shoot_day: existing.shoot_day.clone(),
                });
                return None;
            }
        }

        state.insert_scene(draft.to_scene(id.clone(), &self.estimator));
        Some(id)
    }

    /// Copies flagged fields from the draft. Never changes the assignment.
    fn apply_modified(
        &self,
        state: &mut ScheduleRoot,
        existing: &Scene,
        incoming: &SceneDraft,
        changes: &ChangeSet,
        report: &mut ReconcileReport,
    ) {
        let Some(scene) = state.scenes.get_mut(&existing.id) else {
            report.diagnostics.push(Diagnostic::UnknownScene {
                scene_id: existing.id.clone(),
            });
            return;
        };

        if changes.number_changed {
            report.diagnostics.push(Diagnostic::SceneRenumbered {
                scene_id: scene.id.clone(),
                old_number: scene.number.clone(),
                new_number: incoming.number.clone(),
                shoot_day: scene.shoot_day.clone(),
            });
            scene.number = incoming.number.clone();
        }

        if changes.heading_changed {
            scene.heading = incoming.heading.clone();
        }
        if changes.location_type_changed {
            scene.heading.location_type = incoming.heading.location_type;
        }
        if changes.script_location_changed {
            scene.heading.location_name = incoming.heading.location_name.clone();
        }
        let heading_fields = changes.heading_fields();
        if !heading_fields.is_empty() {
            report.diagnostics.push(Diagnostic::HeadingChanged {
                scene_id: scene.id.clone(),
                fields: heading_fields.into_iter().map(String::from).collect(),
            });
        }

        if changes.page_eighths_changed {
            if let Some(new_eighths) = incoming.page_eighths {
                report.diagnostics.push(Diagnostic::PageLengthChanged {
                    scene_id: scene.id.clone(),
                    old_eighths: scene.page_eighths,
                    new_eighths,
                    shoot_day: scene.shoot_day.clone(),
                });
                scene.page_eighths = new_eighths;
            }
        }

        if !incoming.paragraphs.is_empty() {
            scene.paragraphs = incoming.paragraphs.clone();
        }
    }

    /// Puts the scene at its new script position. Never changes the
    /// assignment.
    ///
    /// Scenes no longer in the script (unknown or removed by this diff) are
    /// skipped.
    fn apply_moved(
        &self,
        state: &mut ScheduleRoot,
        scene_id: &str,
        old_index: u32,
        new_index: u32,
        report: &mut ReconcileReport,
    ) {
        let Some(position) = state.scene_order.iter().position(|id| id == scene_id) else {
            report.diagnostics.push(Diagnostic::UnknownScene {
                scene_id: scene_id.to_string(),
            });
            return;
        };

        let id = state.scene_order.remove(position);
        let target = (new_index as usize).min(state.scene_order.len());
        state.scene_order.insert(target, id);
        report.diagnostics.push(Diagnostic::SceneMoved {
            scene_id: scene_id.to_string(),
            old_index,
            new_index,
        });
    }

    /// Logs and forwards diagnostics. Call only after a successful commit.
    pub fn emit(&self, report: &ReconcileReport) {
        for diagnostic in &report.diagnostics {
            match diagnostic.severity() {
                Severity::Warning => tracing::warn!(
                    scene_id = diagnostic.scene_id().unwrap_or_default(),
                    ?diagnostic,
                    "Reconciliation warning"
                ),
                Severity::Info => tracing::info!(
                    scene_id = diagnostic.scene_id().unwrap_or_default(),
                    ?diagnostic,
                    "Reconciliation change"
                ),
            }
            for observer in &self.observers {
                observer.on_diagnostic(diagnostic);
            }
        }

        tracing::info!(
            added = report.scenes_added.len(),
            unscheduled = report.scenes_unscheduled.len(),
            days = report.days_recomputed,
            "Reconciliation committed"
        );
    }
}

/// Drops dangling IDs from the script order and renumbers it densely.
fn normalize_script_order(state: &mut ScheduleRoot) {
    let scenes = &state.scenes;
    state.scene_order.retain(|id| scenes.contains_key(id));
    state.reindex_script_order();
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schedule::model::{LocationType, ParagraphKind, SceneHeading, ShootDay, TypedParagraph};
    use parking_lot::Mutex;
    use std::sync::Arc;

    /// In-memory store whose next commit can be made to fail.
    #[derive(Default)]
    struct MemoryStore {
        state: ScheduleRoot,
        fail_commit: bool,
        commits: Vec<String>,
    }

    impl ScheduleStore for MemoryStore {
        fn load(&mut self) -> Result<ScheduleRoot, PersistenceError> {
            Ok(self.state.clone())
        }

        fn commit(&mut self, state: &ScheduleRoot, message: &str) -> Result<(), PersistenceError> {
            if self.fail_commit {
                return Err(PersistenceError::store("disk full"));
            }
            self.state = state.clone();
            self.commits.push(message.to_string());
            Ok(())
        }
    }

    #[derive(Clone, Default)]
    struct Recorder(Arc<Mutex<Vec<Diagnostic>>>);

    impl ScheduleObserver for Recorder {
        fn on_diagnostic(&self, diagnostic: &Diagnostic) {
            self.0.lock().push(diagnostic.clone());
        }
    }

    /// Day1: a(3) b(3) y(4); Day2: x(2); unscheduled: u(5).
    fn fixture() -> ScheduleRoot {
        let mut root = ScheduleRoot::new("proj");
        for (i, (id, eighths)) in [("a", 3), ("b", 3), ("y", 4), ("x", 2), ("u", 5)]
            .into_iter()
            .enumerate()
        {
            root.insert_scene(
                Scene::new(id, (i + 1).to_string())
                    .with_heading(SceneHeading::new(LocationType::Interior, "OFFICE", "DAY"))
                    .with_page_eighths(eighths)
                    .with_script_order_index(i as u32),
            );
        }
        for (id, date) in [("day-1", "2026-03-14"), ("day-2", "2026-03-15")] {
            root.shoot_days.insert(id.to_string(), ShootDay::new(id, date));
            root.day_order.push(id.to_string());
        }
        for id in ["a", "b", "y"] {
            root.assign(id, "day-1");
        }
        root.assign("x", "day-2");
        DayAggregateRecalculator::recompute_all(&mut root);
        root
    }

    fn store() -> MemoryStore {
        MemoryStore {
            state: fixture(),
            ..Default::default()
        }
    }

    fn order(root: &ScheduleRoot) -> Vec<&str> {
        root.scene_order.iter().map(String::as_str).collect()
    }

    #[test]
    fn test_fixture_aggregates() {
        let root = fixture();
        assert_eq!(root.shoot_days["day-1"].total_page_eighths, 10);
        assert_eq!(root.shoot_days["day-1"].scene_count, 3);
        assert_eq!(root.shoot_days["day-2"].total_page_eighths, 2);
    }

    #[test]
    fn test_removed_scheduled_scene_is_unscheduled_not_deleted() {
        let mut store = store();
        let scene_x = store.state.scenes["x"].clone();
        let diff = DiffResult::from_parts(vec![], vec![scene_x], vec![], vec![]);

        let report = ScheduleReconciler::new().reconcile(&diff, &mut store).unwrap();

        let x = &store.state.scenes["x"];
        assert!(x.shoot_day.is_none());
        assert!(!store.state.scene_order.contains(&"x".to_string()));
        assert_eq!(store.state.shoot_days["day-2"].scene_count, 0);
        assert_eq!(store.state.shoot_days["day-2"].total_page_eighths, 0);
        assert_eq!(report.scenes_unscheduled, vec!["x"]);
        assert!(report.diagnostics.contains(&Diagnostic::SceneUnscheduled {
            scene_id: "x".to_string(),
            former_day: "day-2".to_string(),
        }));
    }

    #[test]
    fn test_removed_unscheduled_scene_emits_nothing() {
        let mut store = store();
        let scene_u = store.state.scenes["u"].clone();
        let diff = DiffResult::from_parts(vec![], vec![scene_u], vec![], vec![]);

        let report = ScheduleReconciler::new().reconcile(&diff, &mut store).unwrap();
        assert!(report.scenes_unscheduled.is_empty());
        assert!(store.state.scenes.contains_key("u"));
        assert!(store.state.unscheduled_scenes().is_empty());
    }

    #[test]
    fn test_page_change_updates_day_total() {
        let mut store = store();
        let y = store.state.scenes["y"].clone();
        let incoming = SceneDraft::new(y.number.clone())
            .with_heading(y.heading.clone())
            .with_page_eighths(6);
        let changes = ChangeSet::between(&y, &incoming);
        assert!(changes.page_eighths_changed);

        let diff = DiffResult::from_parts(vec![], vec![], vec![(y, incoming, changes)], vec![]);
        ScheduleReconciler::new().reconcile(&diff, &mut store).unwrap();

        assert_eq!(store.state.scenes["y"].page_eighths, 6);
        assert_eq!(store.state.scenes["y"].shoot_day.as_deref(), Some("day-1"));
        assert_eq!(store.state.shoot_days["day-1"].total_page_eighths, 12);
        assert_eq!(store.state.shoot_days["day-1"].scene_count, 3);
    }

    #[test]
    fn test_unflagged_page_length_is_not_copied() {
        let mut root = fixture();
        let y = root.scenes["y"].clone();
        let incoming = SceneDraft::new("3A").with_page_eighths(40);
        let changes = ChangeSet {
            number_changed: true,
            ..Default::default()
        };
        let diff = DiffResult::from_parts(vec![], vec![], vec![(y, incoming, changes)], vec![]);

        ScheduleReconciler::new().apply(&diff, &mut root);
        assert_eq!(root.scenes["y"].page_eighths, 4);
        assert_eq!(root.scenes["y"].number, "3A");
    }

    #[test]
    fn test_renumber_of_scheduled_scene_warns() {
        let mut root = fixture();
        let a = root.scenes["a"].clone();
        let u = root.scenes["u"].clone();
        let renumber = ChangeSet {
            number_changed: true,
            ..Default::default()
        };
        let diff = DiffResult::from_parts(
            vec![],
            vec![],
            vec![
                (a, SceneDraft::new("1A"), renumber),
                (u, SceneDraft::new("5A"), renumber),
            ],
            vec![],
        );

        let report = ScheduleReconciler::new().apply(&diff, &mut root);
        let warnings: Vec<_> = report.warnings().collect();
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].scene_id(), Some("a"));
        assert_eq!(root.scenes["a"].shoot_day.as_deref(), Some("day-1"));
    }

    #[test]
    fn test_heading_change_is_informational() {
        let mut root = fixture();
        let b = root.scenes["b"].clone();
        let incoming = SceneDraft::new(b.number.clone())
            .with_heading(SceneHeading::new(LocationType::Exterior, "ROOFTOP", "NIGHT"));
        let changes = ChangeSet::between(&b, &incoming);
        let diff = DiffResult::from_parts(vec![], vec![], vec![(b, incoming, changes)], vec![]);

        let report = ScheduleReconciler::new().apply(&diff, &mut root);
        assert_eq!(report.warnings().count(), 0);
        assert_eq!(
            root.scenes["b"].heading.to_string(),
            "EXT. ROOFTOP - NIGHT"
        );
        assert!(matches!(
            &report.diagnostics[0],
            Diagnostic::HeadingChanged { fields, .. } if fields.len() == 3
        ));
    }

    #[test]
    fn test_added_scenes_start_unscheduled() {
        let mut store = store();
        let paragraphs = vec![
            TypedParagraph::new(ParagraphKind::SceneHeading, "EXT. PIER - DAWN"),
            TypedParagraph::new(ParagraphKind::Action, "x".repeat(600)),
        ];
        let diff = DiffResult::from_parts(
            vec![
                SceneDraft::new("2A")
                    .with_id("new-1")
                    .with_page_eighths(7)
                    .with_script_order_index(2),
                SceneDraft::new("9")
                    .with_script_order_index(9)
                    .with_paragraphs(paragraphs),
            ],
            vec![],
            vec![],
            vec![],
        );

        let report = ScheduleReconciler::new().reconcile(&diff, &mut store).unwrap();

        assert_eq!(report.scenes_added.len(), 2);
        assert_eq!(report.scenes_added[0], "new-1");
        for id in &report.scenes_added {
            assert!(store.state.scenes[id].shoot_day.is_none());
        }
        assert_eq!(store.state.scenes["new-1"].page_eighths, 7);
        // heading 3 lines + 10 text lines + 1 spacing = 14 lines -> 2 eighths
        assert_eq!(store.state.scenes[&report.scenes_added[1]].page_eighths, 2);
        assert_eq!(order(&store.state)[2], "new-1");
        assert!(matches!(
            report.diagnostics.last(),
            Some(Diagnostic::ScenesAdded { count: 2, .. })
        ));
    }

    #[test]
    fn test_added_draft_for_scheduled_scene_keeps_assignment() {
        let mut root = fixture();
        let before = root.clone();
        let diff = DiffResult::new().with_change(Change::Added(
            SceneDraft::new("4").with_id("x").with_script_order_index(3),
        ));

        let report = ScheduleReconciler::new().apply(&diff, &mut root);

        assert_eq!(root, before);
        assert_eq!(root.scenes["x"].shoot_day.as_deref(), Some("day-2"));
        assert!(report.scenes_added.is_empty());
        assert!(report.scenes_unscheduled.is_empty());
        assert_eq!(
            report.diagnostics,
            vec![Diagnostic::SceneAlreadyExists {
                scene_id: "x".to_string(),
                shoot_day: Some("day-2".to_string()),
            }]
        );
        assert_eq!(report.warnings().count(), 1);
    }

    #[test]
    fn test_removed_scene_can_be_added_back() {
        let mut store = store();
        let scene_x = store.state.scenes["x"].clone();
        let remove = DiffResult::from_parts(vec![], vec![scene_x], vec![], vec![]);
        ScheduleReconciler::new().reconcile(&remove, &mut store).unwrap();

        let readd = DiffResult::new().with_change(Change::Added(
            SceneDraft::new("4").with_id("x").with_page_eighths(2).with_script_order_index(3),
        ));
        let report = ScheduleReconciler::new().reconcile(&readd, &mut store).unwrap();

        assert_eq!(report.scenes_added, vec!["x"]);
        assert_eq!(order(&store.state), vec!["a", "b", "y", "x", "u"]);
        assert!(store.state.scenes["x"].shoot_day.is_none());
    }

    #[test]
    fn test_moved_scene_keeps_shoot_day() {
        let mut store = store();
        let x = store.state.scenes["x"].clone();
        let diff = DiffResult::from_parts(vec![], vec![], vec![], vec![(x, 3, 0)]);

        let report = ScheduleReconciler::new().reconcile(&diff, &mut store).unwrap();

        assert_eq!(store.state.scenes["x"].shoot_day.as_deref(), Some("day-2"));
        assert_eq!(order(&store.state), vec!["x", "a", "b", "y", "u"]);
        assert_eq!(store.state.scenes["x"].script_order_index, 0);
        assert_eq!(store.state.scenes["a"].script_order_index, 1);
        assert_eq!(report.diagnostics.len(), 1);
    }

    #[test]
    fn test_processing_order_is_fixed() {
        let mut root = fixture();
        let x = root.scenes["x"].clone();
        let a = root.scenes["a"].clone();
        let diff = DiffResult::new()
            .with_change(Change::Moved {
                scene: a,
                old_index: 0,
                new_index: 4,
            })
            .with_change(Change::Added(SceneDraft::new("6").with_id("n")))
            .with_change(Change::Removed(x));

        let report = ScheduleReconciler::new().apply(&diff, &mut root);
        let kinds: Vec<_> = report
            .diagnostics
            .iter()
            .map(|d| match d {
                Diagnostic::SceneUnscheduled { .. } => "removed",
                Diagnostic::ScenesAdded { .. } => "added",
                Diagnostic::SceneMoved { .. } => "moved",
                _ => "other",
            })
            .collect();
        assert_eq!(kinds, vec!["removed", "added", "moved"]);
        // x removed, n inserted at 0, then a moved to the last slot
        assert_eq!(order(&root), vec!["n", "b", "y", "u", "a"]);
        assert_eq!(root.scenes["a"].script_order_index, 4);
    }

    #[test]
    fn test_move_toward_end_lands_on_new_index() {
        let mut root = ScheduleRoot::new("proj");
        for (i, id) in ["a", "b", "c", "d", "e"].into_iter().enumerate() {
            root.insert_scene(Scene::new(id, (i + 1).to_string()).with_script_order_index(i as u32));
        }
        let a = root.scenes["a"].clone();
        let c = root.scenes["c"].clone();
        let diff = DiffResult::from_parts(vec![], vec![], vec![], vec![(a, 0, 4)]);

        ScheduleReconciler::new().apply(&diff, &mut root);
        assert_eq!(order(&root), vec!["b", "c", "d", "e", "a"]);
        assert_eq!(root.scenes["a"].script_order_index, 4);

        let diff = DiffResult::from_parts(vec![], vec![], vec![], vec![(c, 1, 3)]);
        ScheduleReconciler::new().apply(&diff, &mut root);
        assert_eq!(order(&root), vec!["b", "d", "e", "c", "a"]);
        assert_eq!(root.scenes["c"].script_order_index, 3);
    }

    #[test]
    fn test_unknown_scene_is_skipped_with_warning() {
        let mut root = fixture();
        let ghost = Scene::new("ghost", "99");
        let diff = DiffResult::from_parts(vec![], vec![ghost.clone()], vec![], vec![(ghost, 1, 2)]);

        let before = root.clone();
        let report = ScheduleReconciler::new().apply(&diff, &mut root);
        assert_eq!(report.warnings().count(), 2);
        assert_eq!(root, before);
    }

    #[test]
    fn test_empty_diff_recomputes_every_day() {
        let mut root = fixture();
        root.shoot_days.get_mut("day-1").unwrap().total_page_eighths = 0;

        let report = ScheduleReconciler::new().apply(&DiffResult::new(), &mut root);
        assert_eq!(report.days_recomputed, 2);
        assert_eq!(root.shoot_days["day-1"].total_page_eighths, 10);
    }

    #[test]
    fn test_failed_commit_leaves_store_untouched() {
        let mut store = store();
        store.fail_commit = true;
        let before = store.state.clone();
        let recorder = Recorder::default();
        let mut reconciler = ScheduleReconciler::new();
        reconciler.add_observer(recorder.clone());

        let scene_x = store.state.scenes["x"].clone();
        let diff = DiffResult::from_parts(vec![], vec![scene_x], vec![], vec![]);
        let result = reconciler.reconcile(&diff, &mut store);

        assert!(matches!(result, Err(PersistenceError::Store(_))));
        assert_eq!(store.state, before);
        assert!(store.commits.is_empty());
        assert!(recorder.0.lock().is_empty());
    }

    #[test]
    fn test_observers_see_diagnostics_after_commit() {
        let mut store = store();
        let recorder = Recorder::default();
        let mut reconciler = ScheduleReconciler::new();
        reconciler.add_observer(recorder.clone());

        let scene_x = store.state.scenes["x"].clone();
        let scene_a = store.state.scenes["a"].clone();
        let diff = DiffResult::from_parts(vec![], vec![scene_x], vec![], vec![(scene_a, 0, 1)]);
        let report = reconciler.reconcile(&diff, &mut store).unwrap();

        assert_eq!(*recorder.0.lock(), report.diagnostics);
        assert_eq!(store.commits.len(), 1);
        assert_eq!(report.affected_scene_ids(), vec!["x", "a"]);
    }

    #[test]
    fn test_affected_scene_ids_include_added() {
        let report = ReconcileReport {
            diagnostics: vec![
                Diagnostic::ScenesAdded {
                    count: 2,
                    scene_ids: vec!["n1".to_string(), "n2".to_string()],
                },
                Diagnostic::SceneMoved {
                    scene_id: "n1".to_string(),
                    old_index: 0,
                    new_index: 1,
                },
            ],
            ..Default::default()
        };
        assert_eq!(report.affected_scene_ids(), vec!["n1", "n2"]);
    }
}
