use crate::quad::Quad;
use crate::term::Timestamp;

/// The intended effect of a [`Delta`] on the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    Add,
    Delete,
}

/// A single intended change to the store: a quad, the action to apply to
/// it, when it was authored, and a monotonically-assigned id used for
/// ordering and diagnostics. Deltas are produced by writers and consumed
/// (and dropped) once the backend acknowledges them.
#[derive(Debug, Clone)]
pub struct Delta {
    pub quad: Quad,
    pub action: Action,
    pub timestamp: Timestamp,
    pub id: u64,
}

impl Delta {
    #[must_use]
    pub fn new(quad: Quad, action: Action, timestamp: Timestamp, id: u64) -> Self {
        Self {
            quad,
            action,
            timestamp,
            id,
        }
    }
}

/// Tolerance flags applied while replaying a batch of [`Delta`]s.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IgnoreOpts {
    /// Suppress [`DeltaErrorKind::QuadExists`] on an `Add` of an already
    /// present quad, turning it into a no-op.
    pub ignore_duplicate: bool,
    /// Suppress [`DeltaErrorKind::QuadNotExist`] on a `Delete` of an absent
    /// quad, turning it into a no-op.
    pub ignore_missing: bool,
}

/// The three ways applying a [`Delta`] can fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum DeltaErrorKind {
    #[error("quad already exists")]
    QuadExists,
    #[error("quad does not exist")]
    QuadNotExist,
    #[error("invalid action")]
    InvalidAction,
}

/// A [`DeltaErrorKind`] paired with the offending [`Delta`], for
/// diagnostics.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{kind} for delta #{} ({})", .delta.id, .delta.quad)]
pub struct DeltaError {
    pub kind: DeltaErrorKind,
    pub delta: Delta,
}

impl DeltaError {
    #[must_use]
    pub fn new(kind: DeltaErrorKind, delta: Delta) -> Self {
        Self { kind, delta }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::term::Term;

    fn sample_delta(id: u64) -> Delta {
        Delta::new(
            Quad::new(Term::iri("s"), Term::iri("p"), Term::iri("o"), None).unwrap(),
            Action::Add,
            Timestamp::from_micros(0),
            id,
        )
    }

    #[test]
    fn ignore_opts_default_to_strict() {
        let opts = IgnoreOpts::default();
        assert!(!opts.ignore_duplicate);
        assert!(!opts.ignore_missing);
    }

    #[test]
    fn delta_error_carries_offending_delta() {
        let err = DeltaError::new(DeltaErrorKind::QuadExists, sample_delta(42));
        assert_eq!(err.delta.id, 42);
        assert_eq!(err.kind, DeltaErrorKind::QuadExists);
    }
}
