//! Pure shape-level rewrites and the cost vocabulary shared by the
//! iterator-level optimizer in `quadspan-iter`.
//!
//! Deliberately split from `quadspan-iter`: rules here (null propagation,
//! unit elimination, `AllNodes`/`AllQuads` absorption) only need a `Shape`,
//! never a compiled iterator tree or a backend, so they're free of the
//! `quadspan-iter` dependency entirely. `quadspan-iter` depends on this
//! crate — not the reverse — for `CostConfig`/`Size`/`Stats`.

mod cost;
mod rules;

pub use crate::cost::{CostConfig, Size, Stats};
pub use crate::rules::normalize;

use quadspan_shape::Shape;

/// The pure shape-level optimizer (§4.3 rules 1-3). Stateless: holds no
/// cost configuration because its rules never rank alternatives, only
/// eliminate structurally-dead ones.
#[derive(Debug, Default, Clone, Copy)]
pub struct ShapeOptimizer;

impl ShapeOptimizer {
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Rewrites `shape` to an equivalent, simplified shape. Never mutates
    /// `shape` in place — the input is consumed and a new tree returned
    /// (§8 "the optimizer never mutates an input Shape").
    #[must_use]
    pub fn optimize<R>(&self, shape: Shape<R>) -> Shape<R> {
        normalize(shape)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn optimize_is_idempotent() {
        let optimizer = ShapeOptimizer::new();
        let shape: Shape<u64> = Shape::Intersect(vec![Shape::AllNodes, Shape::Null]);
        let once = optimizer.optimize(shape);
        assert_eq!(once, Shape::Null);
        let twice = optimizer.optimize(once.clone());
        assert_eq!(once, twice);
    }
}
