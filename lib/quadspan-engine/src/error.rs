use std::convert::Infallible;
use std::fmt;

/// The in-memory backend's own error type. It has no failure modes beyond
/// what [`quadspan_model::DeltaError`] already expresses, so it is
/// uninhabited — the same role `Infallible` plays in the evaluator crate's
/// `From<Infallible>` impl.
#[derive(Debug)]
pub struct StoreError(Infallible);

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {}
    }
}

impl std::error::Error for StoreError {}

/// Errors surfaced by the engine facade that are not already covered by
/// [`quadspan_iter::IterError`] or [`quadspan_model::DeltaApplyError`].
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum EngineError {
    /// A query named a backend not present in the [`crate::BackendRegistry`]
    /// it was built with — fatal at session construction (§7
    /// "Not-registered").
    #[error("no backend registered under the name {0:?}")]
    BackendNotRegistered(String),
    /// An iterator tree raised an error while the driver was consuming it.
    #[error(transparent)]
    Iteration(#[from] quadspan_iter::IterError),
    /// A delta failed to apply against the active backend.
    #[error(transparent)]
    Delta(#[from] quadspan_iter::DeltaApplyError<StoreError>),
}
