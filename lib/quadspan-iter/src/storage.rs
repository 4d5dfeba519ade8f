use quadspan_model::{Delta, IgnoreOpts, Quad, Ref, Term};
use quadspan_model::Direction;
use quadspan_optimize::{Size, Stats};
use quadspan_shape::Shape;
use std::error::Error;
use std::fmt::Debug;
use std::hash::Hash;

use crate::base::Scanner;

/// Aggregate size figures a backend reports for cost estimation (§4.3
/// "the optimizer consults backend-reported sizes").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreStats {
    pub nodes: Size,
    pub quads: Size,
}

/// Failure applying a single [`Delta`] to a backend (§5 "Delta
/// application").
#[derive(Debug, thiserror::Error)]
pub enum DeltaApplyError<E: Error + Send + Sync + 'static> {
    #[error(transparent)]
    Delta(#[from] quadspan_model::DeltaError),
    #[error(transparent)]
    Backend(E),
}

/// The minimal interface the engine depends on from a backend (§5 "Storage
/// Contract"). Every leaf `Shape` variant compiles down to one or more
/// calls against this trait; everything above it (joins, unions,
/// filters, tagging, recursion) is backend-agnostic and lives in
/// `quadspan-iter::ops`.
///
/// Per-direction and whole-store enumerations return owned, materialized
/// iterators rather than a streaming cursor type parameterized over this
/// trait's own associated types: a backend is free to page internally, but
/// the contract itself stays first-order, avoiding a self-referential
/// `StorageContract: Fn() -> IteratorShape<Self>`-shaped trait. Laziness
/// and short-circuiting are the *operator's* job (see `ops::intersect`,
/// `ops::union`), not the backend's.
pub trait StorageContract: Clone {
    /// A backend-native, cheaply cloned identity for a stored term or quad.
    type Token: Clone + Eq + Hash + Debug;
    type Error: Error + Send + Sync + 'static;

    fn value_of(&self, r: &Ref<Self::Token>) -> Option<Term>;
    fn name_of(&self, term: &Term) -> Option<Ref<Self::Token>>;
    fn quad_of(&self, r: &Ref<Self::Token>) -> Option<Quad>;

    /// Every quad ref whose `direction` component is `node`.
    fn quads_at(
        &self,
        direction: Direction,
        node: &Ref<Self::Token>,
    ) -> Box<dyn Iterator<Item = Ref<Self::Token>>>;

    fn all_nodes(&self) -> Box<dyn Iterator<Item = Ref<Self::Token>>>;
    fn all_quads(&self) -> Box<dyn Iterator<Item = Ref<Self::Token>>>;

    /// The number of quads with `node` at `direction`, used by the
    /// optimizer to estimate `LinksTo`'s size without enumerating it.
    fn size_at(&self, direction: Direction, node: &Ref<Self::Token>) -> Size;

    fn stats(&self) -> StoreStats;

    /// Applies a single delta, honoring `opts`'s tolerance flags.
    fn apply_delta(
        &mut self,
        delta: &Delta,
        opts: IgnoreOpts,
    ) -> Result<(), DeltaApplyError<Self::Error>>;

    /// An optional hook (§4.3 rule 9 "backend-native replacement") letting
    /// a backend substitute a whole-subtree-native scan for a shape it can
    /// answer more efficiently than the generic operator library. The
    /// default implementation declines every shape, falling back to the
    /// generic compiler.
    fn native_scan(
        &self,
        _shape: &Shape<Ref<Self::Token>>,
    ) -> Option<Box<dyn Scanner<Ref<Self::Token>>>> {
        None
    }
}
