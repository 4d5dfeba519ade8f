use std::error::Error;

/// Errors an iterator tree can raise while executing (§4.1, §7 "never
/// panics on malformed Shapes" — malformed input surfaces as `Malformed`
/// rather than a panic).
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum IterError {
    /// The governing [`crate::Context`] was cancelled mid-execution.
    #[error("operation cancelled")]
    Cancelled,
    /// An error surfaced from the storage backend.
    #[error("storage error: {0}")]
    Backend(Box<dyn Error + Send + Sync>),
    /// A `Shape` was structurally invalid for the position it appeared in
    /// (e.g. a bare `Placeholder` outside a `Recursive` morphism).
    #[error("malformed shape: {0}")]
    Malformed(&'static str),
}

impl IterError {
    #[must_use]
    pub fn backend<E: Error + Send + Sync + 'static>(error: E) -> Self {
        IterError::Backend(Box::new(error))
    }
}
