//! Script-to-schedule reconciliation.
//!
//! This module provides:
//! - `diff`: the tagged-union script diff consumed from the external differ
//! - `reconciler`: ScheduleReconciler, the store/observer seams and diagnostics
//! - `impact`: ImpactSummarizer, a read-only preview for confirmation

pub mod diff;
pub mod impact;
pub mod reconciler;

pub use diff::{Change, ChangeSet, DiffResult, SceneDraft};
pub use impact::{ImpactSummarizer, ImpactSummary};
pub use reconciler::{
    Diagnostic, ReconcileReport, ScheduleObserver, ScheduleReconciler, ScheduleStore, Severity,
};
