//! Error types for the schedule reconciliation engine.

use thiserror::Error;

/// Result type alias for schedule operations.
pub type ScheduleResult<T> = Result<T, ScheduleError>;

/// Errors raised while loading or committing the schedule document.
///
/// This is the only error reconciliation itself can produce: the in-memory
/// graph mutation cannot fail, only the final commit can.
#[derive(Error, Debug)]
pub enum PersistenceError {
    /// Automerge error during document operations.
    #[error("Automerge error: {0}")]
    Automerge(#[from] automerge::AutomergeError),

    /// Autosurgeon hydration error.
    #[error("Hydration error: {0}")]
    Hydrate(#[from] autosurgeon::HydrateError),

    /// Autosurgeon reconcile error.
    #[error("Reconcile error: {0}")]
    Reconcile(#[from] autosurgeon::ReconcileError),

    /// Failure reported by a non-Automerge store.
    #[error("Store error: {0}")]
    Store(String),
}

impl PersistenceError {
    /// Creates a Store error.
    pub fn store(msg: impl Into<String>) -> Self {
        Self::Store(msg.into())
    }
}

/// Errors that can occur during schedule editing operations.
#[derive(Error, Debug)]
pub enum ScheduleError {
    /// Loading or committing the document failed.
    #[error(transparent)]
    Persistence(#[from] PersistenceError),

    /// Scene not found in the schedule.
    #[error("Scene not found: {0}")]
    SceneNotFound(String),

    /// Shoot day not found in the schedule.
    #[error("Shoot day not found: {0}")]
    ShootDayNotFound(String),

    /// Field not found in the document.
    #[error("Field not found: {0}")]
    FieldNotFound(String),

    /// Schema violation - document structure is invalid.
    #[error("Schema violation: {0}")]
    SchemaViolation(String),

    /// Imported record carries a version this build does not understand.
    #[error("Unsupported record version {found} (latest supported is {supported})")]
    UnsupportedRecordVersion { found: u32, supported: u32 },

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl ScheduleError {
    /// Creates a SceneNotFound error.
    pub fn scene_not_found(id: impl Into<String>) -> Self {
        Self::SceneNotFound(id.into())
    }

    /// Creates a ShootDayNotFound error.
    pub fn shoot_day_not_found(id: impl Into<String>) -> Self {
        Self::ShootDayNotFound(id.into())
    }

    /// Creates a FieldNotFound error.
    pub fn field_not_found(field: impl Into<String>) -> Self {
        Self::FieldNotFound(field.into())
    }

    /// Creates a SchemaViolation error.
    pub fn schema_violation(msg: impl Into<String>) -> Self {
        Self::SchemaViolation(msg.into())
    }

    /// Creates an UnsupportedRecordVersion error.
    pub fn unsupported_record_version(found: u32, supported: u32) -> Self {
        Self::UnsupportedRecordVersion { found, supported }
    }

    /// Creates a Serialization error.
    pub fn serialization(msg: impl Into<String>) -> Self {
        Self::Serialization(msg.into())
    }
}

impl From<automerge::AutomergeError> for ScheduleError {
    fn from(err: automerge::AutomergeError) -> Self {
        Self::Persistence(err.into())
    }
}

impl From<autosurgeon::HydrateError> for ScheduleError {
    fn from(err: autosurgeon::HydrateError) -> Self {
        Self::Persistence(err.into())
    }
}

impl From<autosurgeon::ReconcileError> for ScheduleError {
    fn from(err: autosurgeon::ReconcileError) -> Self {
        Self::Persistence(err.into())
    }
}

impl From<serde_json::Error> for ScheduleError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}
