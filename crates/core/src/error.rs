//! Domain error type shared across the callsheet crates.

/// Domain-level error for validation, state, and lookup failures.
///
/// Transport and collaborator failures have their own error types in the
/// vault and session crates; they wrap or sit beside `CoreError` rather
/// than extending it.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// Input failed a validation rule.
    #[error("Validation error: {0}")]
    Validation(String),

    /// The operation conflicts with the entity's current state
    /// (locked shot, wrong lifecycle status, duplicate id).
    #[error("Conflict: {0}")]
    Conflict(String),

    /// A referenced entity does not exist.
    #[error("{entity} with id {id} not found")]
    NotFound { entity: &'static str, id: String },

    /// An internal invariant was broken.
    #[error("Internal error: {0}")]
    Internal(String),
}
