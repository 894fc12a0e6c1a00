//! Common error types used across the workspace.
//!
//! Each layer defines its own typed errors and converts into
//! [`TidyHubError`] via `#[from]`.

/// Top-level error for every tidyhub operation.
#[derive(Debug, thiserror::Error)]
pub enum TidyHubError {
    /// Input or configuration rejected before anything ran.
    #[error("validation error")]
    Validation(#[from] ValidationError),

    /// A directory or state lookup returned nothing.
    #[error("not found")]
    NotFound(#[from] NotFoundError),

    /// A single command invocation failed.
    #[error("actuation failed")]
    Actuation(#[from] ActuationError),

    /// Some targets of a bulk operation failed while others succeeded.
    #[error("batch partially failed")]
    Batch(#[from] BatchFailure),
}

/// Invariant violations detected while loading or validating input.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("name must not be empty")]
    EmptyName,

    #[error("room location must not be empty")]
    EmptyLocation,

    #[error("room device must not be empty")]
    EmptyDevice,

    #[error("room {0} is configured more than once")]
    DuplicateRoom(String),

    #[error("segment attribute must not be empty")]
    EmptySegmentAttribute,

    #[error("no segments to clean on {0}")]
    NoSegments(String),

    #[error("invalid segment id {0:?}")]
    InvalidSegment(String),
}

/// A lookup that found nothing.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{entity} not found: {id}")]
pub struct NotFoundError {
    pub entity: &'static str,
    pub id: String,
}

/// Failure reported by the command-invocation surface.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ActuationError {
    #[error("command timed out")]
    Timeout,

    #[error("command failed: {0}")]
    Fault(String),

    /// The target does not know the requested action. Retrying cannot help.
    #[error("action not recognised: {0}")]
    UnknownAction(String),
}

impl ActuationError {
    /// Whether another attempt may succeed.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        !matches!(self, Self::UnknownAction(_))
    }
}

/// One failed target inside a [`BatchFailure`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetFailure {
    pub target: String,
    pub error: ActuationError,
}

/// Summary of a bulk operation where at least one target failed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{operation}: {} of {attempted} targets failed", .failures.len())]
pub struct BatchFailure {
    pub operation: &'static str,
    pub attempted: usize,
    pub failures: Vec<TargetFailure>,
}

impl BatchFailure {
    /// Turn collected failures into `Ok` when there are none.
    ///
    /// # Errors
    ///
    /// Returns the batch summary when `failures` is non-empty.
    pub fn check(
        operation: &'static str,
        attempted: usize,
        failures: Vec<TargetFailure>,
    ) -> Result<(), Self> {
        if failures.is_empty() {
            return Ok(());
        }
        Err(Self {
            operation,
            attempted,
            failures,
        })
    }
}
