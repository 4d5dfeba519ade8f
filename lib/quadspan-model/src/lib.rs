//! The term, quad, reference and delta data model shared by every layer of
//! the query engine.
//!
//! This crate has no notion of shapes, iterators or storage: it is the
//! vocabulary the rest of the workspace is built out of.

mod delta;
mod hash;
mod quad;
mod reference;
mod term;

pub use crate::delta::{Action, Delta, DeltaError, DeltaErrorKind, IgnoreOpts};
pub use crate::hash::ContentHash;
pub use crate::quad::{Direction, InvalidQuadError, Quad};
pub use crate::reference::Ref;
pub use crate::term::{OrderedFloat, Term, Timestamp};
