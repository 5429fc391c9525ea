//! HeyoSchedule - script-to-schedule reconciliation for shooting schedules.
//!
//! When a screenplay is re-imported, an external differ reports which scenes
//! were added, removed, modified or moved. This crate applies that diff to the
//! project's scene/day graph, stored as an Automerge document:
//!
//! - **Assignments are preserved**: moving or editing a scene never changes its shoot day
//! - **Removed scenes are unscheduled, never deleted**
//! - **Day totals are derived**: every day's page total and scene count are recomputed
//! - **All or nothing**: the whole diff is committed as one change, or nothing is
//!
//! # Example
//!
//! ```rust
//! use heyoschedule::{
//!     DiffResult, ImpactSummarizer, Scene, ScheduleManager, ScheduleReconciler, ShootDay,
//! };
//!
//! let mut manager = ScheduleManager::new();
//! manager.create_scene(Scene::new("s1", "1").with_page_eighths(12)).unwrap();
//! manager.create_shoot_day(ShootDay::new("day-1", "2026-03-14")).unwrap();
//! manager.assign_scene("s1", "day-1").unwrap();
//!
//! // The scene was cut from the latest draft
//! let removed = manager.get_scene("s1").unwrap().unwrap();
//! let diff = DiffResult::from_parts(vec![], vec![removed], vec![], vec![]);
//!
//! let impact = ImpactSummarizer::summarize(&diff);
//! assert_eq!(impact.summary, "1 scheduled scene(s) will be unscheduled");
//!
//! manager.reconcile(&diff, &ScheduleReconciler::new()).unwrap();
//! assert!(manager.get_scene("s1").unwrap().unwrap().shoot_day.is_none());
//! ```

pub mod error;
pub mod pagination;
pub mod reconcile;
pub mod schedule;

// Re-exports for convenience
pub use error::{PersistenceError, ScheduleError, ScheduleResult};
pub use pagination::{
    format_eighths, DayAggregate, DayAggregateRecalculator, EstimatorConfig, PageLengthEstimator,
};
pub use reconcile::{
    Change, ChangeSet, Diagnostic, DiffResult, ImpactSummarizer, ImpactSummary, ReconcileReport,
    SceneDraft, ScheduleObserver, ScheduleReconciler, ScheduleStore, Severity,
};
pub use schedule::{
    LocationType, ParagraphKind, Scene, SceneHeading, ScheduleImport, ScheduleManager,
    ScheduleRoot, SharedScheduleManager, ShootDay, TypedParagraph,
};

#[cfg(feature = "wasm")]
pub use schedule::JsScheduleManager;
