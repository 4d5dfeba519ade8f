//! The query engine facade (analogous to `spareval::QueryEvaluator`):
//! threads a [`CostConfig`] and a backend instance through a
//! [`Driver`](crate::Driver) without touching any global state.

use crate::driver::{Binding, Driver, ExecutionExplanation};
use crate::error::EngineError;
use quadspan_iter::{Context, StorageContract};
use quadspan_model::Ref;
use quadspan_optimize::CostConfig;
use quadspan_shape::Shape;

/// Evaluates a [`Shape`] against a chosen backend.
///
/// ```
/// use quadspan_engine::{MemoryStore, QueryEngine};
/// use quadspan_model::{Direction, Quad, Term};
/// use quadspan_shape::Shape;
///
/// let mut store = MemoryStore::new();
/// store.insert_all([
///     Quad::new(Term::iri("alice"), Term::iri("follows"), Term::iri("bob"), None).unwrap(),
/// ]);
/// let engine = QueryEngine::new(Default::default());
/// let shape = Shape::Quads(vec![
///     (Direction::Subject, Shape::Lookup(Term::iri("alice"))),
///     (Direction::Predicate, Shape::Lookup(Term::iri("follows"))),
/// ])
/// .has_a(Direction::Object);
/// let bindings = engine.collect(&store, shape, 0, None).unwrap();
/// assert_eq!(bindings.len(), 1);
/// ```
#[derive(Debug, Clone, Default)]
pub struct QueryEngine {
    cost_config: CostConfig,
}

impl QueryEngine {
    #[must_use]
    pub fn new(cost_config: CostConfig) -> Self {
        Self { cost_config }
    }

    #[must_use]
    pub fn cost_config(&self) -> CostConfig {
        self.cost_config
    }

    fn driver<S: StorageContract + 'static>(
        &self,
        backend: &S,
        shape: Shape<Ref<S::Token>>,
    ) -> Driver<S> {
        Driver::new(shape, backend.clone(), self.cost_config)
    }

    pub fn count<S: StorageContract + 'static>(
        &self,
        backend: &S,
        shape: Shape<Ref<S::Token>>,
    ) -> Result<u64, EngineError> {
        self.driver(backend, shape).count(&Context::new())
    }

    pub fn first<S: StorageContract + 'static>(
        &self,
        backend: &S,
        shape: Shape<Ref<S::Token>>,
    ) -> Result<Option<Binding<Ref<S::Token>>>, EngineError> {
        self.driver(backend, shape).first(&Context::new(), 0)
    }

    pub fn collect<S: StorageContract + 'static>(
        &self,
        backend: &S,
        shape: Shape<Ref<S::Token>>,
        skip: usize,
        limit: Option<usize>,
    ) -> Result<Vec<Binding<Ref<S::Token>>>, EngineError> {
        self.driver(backend, shape).collect(&Context::new(), skip, limit)
    }

    /// Builds a driver without consuming it, for callers that want the
    /// plan's [`ExecutionExplanation`] or finer control over the
    /// [`Context`] (e.g. a shared cancellation token).
    #[must_use]
    pub fn explain<S: StorageContract + 'static>(
        &self,
        backend: &S,
        shape: Shape<Ref<S::Token>>,
    ) -> (Driver<S>, ExecutionExplanation) {
        let driver = self.driver(backend, shape);
        let explanation = driver.explanation().clone();
        (driver, explanation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryStore;
    use quadspan_model::{Direction, Quad, Term};

    fn store() -> MemoryStore {
        let mut store = MemoryStore::new();
        store.insert_all([Quad::new(
            Term::iri("alice"),
            Term::iri("follows"),
            Term::iri("bob"),
            None,
        )
        .unwrap()]);
        store
    }

    fn followees_of_alice() -> Shape<Ref<u64>> {
        Shape::Quads(vec![
            (Direction::Subject, Shape::Lookup(Term::iri("alice"))),
            (Direction::Predicate, Shape::Lookup(Term::iri("follows"))),
        ])
        .has_a(Direction::Object)
    }

    #[test]
    fn count_matches_collect_len() {
        let engine = QueryEngine::new(CostConfig::default());
        let store = store();
        assert_eq!(engine.count(&store, followees_of_alice()).unwrap(), 1);
        assert_eq!(
            engine.collect(&store, followees_of_alice(), 0, None).unwrap().len(),
            1
        );
    }

    #[test]
    fn first_on_empty_shape_is_none() {
        let engine = QueryEngine::new(CostConfig::default());
        let store = store();
        let empty = Shape::Fixed(Vec::new());
        assert!(engine.first(&store, empty).unwrap().is_none());
    }

    #[test]
    fn explain_exposes_the_optimized_shape() {
        let engine = QueryEngine::new(CostConfig::default());
        let store = store();
        let (driver, explanation) = engine.explain(&store, followees_of_alice());
        assert_eq!(driver.count(&Context::new()).unwrap(), 1);
        assert!(!explanation.shape_after.is_empty());
    }
}
