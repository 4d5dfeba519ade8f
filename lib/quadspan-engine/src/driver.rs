//! The execution driver (§4.4): turns an optimized [`IteratorShape`] into
//! one of four consumption modes, honoring limit/skip/cancellation and
//! recording an [`ExecutionExplanation`] of what the optimizer did.

use crate::error::EngineError;
use quadspan_iter::{Context, Scanner, TagMap};
use quadspan_model::Ref;
use quadspan_optimize::{CostConfig, ShapeOptimizer, Stats};
use quadspan_shape::Shape;
use quadspan_iter::{IteratorShape, StorageContract};
use tracing::instrument;

/// A single result: the produced ref together with every tag captured
/// along the path that produced it.
#[derive(Debug, Clone)]
pub struct Binding<R> {
    pub result: R,
    pub tags: TagMap<R>,
}

/// What the optimizer did to a query's shape before execution, and the
/// top-level cost figures it produced — the queryable, structured
/// counterpart to the driver's log lines (§10.2).
#[derive(Debug, Clone)]
pub struct ExecutionExplanation {
    pub shape_before: String,
    pub shape_after: String,
    pub projected_stats: Stats,
}

/// Drives an [`IteratorShape`] to completion in one of four consumption
/// modes (§4.4), applying `skip` then `limit` at the driver level (on top
/// of, not instead of, any `Shape::Skip`/`Shape::Limit` baked into the
/// shape itself) and honoring cancellation at every step.
pub struct Driver<S: StorageContract> {
    shape: IteratorShape<S>,
    explanation: ExecutionExplanation,
}

impl<S: StorageContract + 'static> Driver<S> {
    /// Re-optimizes `shape` once (opt-out via [`Driver::without_reoptimize`])
    /// and builds the executable tree, recording an
    /// [`ExecutionExplanation`] of the rewrite before compilation runs.
    #[must_use]
    #[instrument(skip_all, fields(cost_config = ?cost_config))]
    pub fn new(shape: Shape<Ref<S::Token>>, backend: S, cost_config: CostConfig) -> Self {
        let shape_before = format!("{shape:?}");
        let optimized = ShapeOptimizer::new().optimize(shape);
        let shape_after = format!("{optimized:?}");
        let iterator_shape = IteratorShape::new(optimized, backend, cost_config);
        let projected_stats = iterator_shape.stats();
        tracing::info!(%shape_after, size = projected_stats.size.value, "planned query");
        Self {
            shape: iterator_shape,
            explanation: ExecutionExplanation {
                shape_before,
                shape_after,
                projected_stats,
            },
        }
    }

    /// Skips re-optimizing: `shape` is compiled as given, for callers that
    /// have already normalized it (or want to observe the unoptimized
    /// plan's behavior).
    #[must_use]
    pub fn without_reoptimize(shape: Shape<Ref<S::Token>>, backend: S, cost_config: CostConfig) -> Self {
        let shape_before = format!("{shape:?}");
        let iterator_shape = IteratorShape::new(shape, backend, cost_config);
        let projected_stats = iterator_shape.stats();
        Self {
            shape: iterator_shape,
            explanation: ExecutionExplanation {
                shape_before: shape_before.clone(),
                shape_after: shape_before,
                projected_stats,
            },
        }
    }

    #[must_use]
    pub fn explanation(&self) -> &ExecutionExplanation {
        &self.explanation
    }

    /// Consumption mode 1: materializes only the cardinality, via the
    /// tree's own `Count` semantics rather than draining a scan and
    /// discarding the results — callers who want `COUNT` should prefer
    /// wrapping their shape in `Shape::Count` so the optimizer can see it;
    /// this is the cheap fallback for a shape that wasn't.
    #[instrument(skip(self, ctx))]
    pub fn count(&self, ctx: &Context) -> Result<u64, EngineError> {
        let mut scanner = self.shape.iterate();
        let mut count = 0u64;
        while scanner.next(ctx)? {
            count += 1;
        }
        scanner.close();
        Ok(count)
    }

    /// Consumption mode 2: the first binding only, or `None` if the shape
    /// is empty.
    #[instrument(skip(self, ctx))]
    pub fn first(&self, ctx: &Context, skip: usize) -> Result<Option<Binding<Ref<S::Token>>>, EngineError> {
        let mut scanner = self.shape.iterate();
        let found = advance_past_skip(scanner.as_mut(), ctx, skip)?;
        let binding = if found && scanner.next(ctx)? {
            Some(binding_of(scanner.as_mut()))
        } else {
            None
        };
        scanner.close();
        Ok(binding)
    }

    /// Consumption mode 3: every binding, `skip`ped then `limit`ed at the
    /// driver level. For each result, also enumerates every alternative
    /// path `next_path` offers (§4.4 "for each result, optionally
    /// enumerates alternative paths with nextPath") — a result justified
    /// by several witnesses (e.g. two predicate edges both saving the same
    /// tagged node) yields one binding per witness, all sharing the same
    /// `result` but carrying distinct `tags`.
    #[instrument(skip(self, ctx))]
    pub fn collect(
        &self,
        ctx: &Context,
        skip: usize,
        limit: Option<usize>,
    ) -> Result<Vec<Binding<Ref<S::Token>>>, EngineError> {
        let mut scanner = self.shape.iterate();
        advance_past_skip(scanner.as_mut(), ctx, skip)?;
        let mut out = Vec::new();
        while limit.is_none_or(|limit| out.len() < limit) {
            ctx.check_cancelled()?;
            if !scanner.next(ctx)? {
                break;
            }
            push_bindings_for_result(scanner.as_mut(), ctx, limit, &mut out)?;
        }
        scanner.close();
        Ok(out)
    }

    /// Consumption mode 4: pushes each binding into `sink` as it's
    /// produced, enumerating `next_path`'s alternatives per result the
    /// same way [`Driver::collect`] does. `sink` returning `false` stops
    /// the scan early (the streaming analogue of `limit`), matching the
    /// driver's job to close the tree on every exit path, not just
    /// exhaustion.
    #[instrument(skip(self, ctx, sink))]
    pub fn stream(
        &self,
        ctx: &Context,
        skip: usize,
        mut sink: impl FnMut(Binding<Ref<S::Token>>) -> bool,
    ) -> Result<(), EngineError> {
        let mut scanner = self.shape.iterate();
        advance_past_skip(scanner.as_mut(), ctx, skip)?;
        'results: loop {
            ctx.check_cancelled()?;
            if !scanner.next(ctx)? {
                break;
            }
            if !sink(binding_of(scanner.as_mut())) {
                break;
            }
            while scanner.next_path(ctx)? {
                if !sink(binding_of(scanner.as_mut())) {
                    break 'results;
                }
            }
        }
        scanner.close();
        Ok(())
    }
}

/// Pushes one [`Binding`] for the scanner's current result, then one more
/// per alternative path `next_path` yields, stopping early once `out`
/// reaches `limit`.
fn push_bindings_for_result<R: Clone>(
    scanner: &mut dyn Scanner<R>,
    ctx: &Context,
    limit: Option<usize>,
    out: &mut Vec<Binding<R>>,
) -> Result<(), EngineError> {
    out.push(binding_of(scanner));
    while limit.is_none_or(|limit| out.len() < limit) {
        if !scanner.next_path(ctx)? {
            break;
        }
        out.push(binding_of(scanner));
    }
    Ok(())
}

fn advance_past_skip<R>(
    scanner: &mut dyn Scanner<R>,
    ctx: &Context,
    skip: usize,
) -> Result<bool, EngineError> {
    for _ in 0..skip {
        if !scanner.next(ctx)? {
            return Ok(false);
        }
    }
    Ok(true)
}

fn binding_of<R: Clone>(scanner: &mut dyn Scanner<R>) -> Binding<R> {
    let mut tags = TagMap::default();
    scanner.tag_results(&mut tags);
    Binding {
        result: scanner.result().cloned().expect("next just returned true"),
        tags,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryStore;
    use quadspan_model::{Quad, Term};

    fn store_of(names: &[&str]) -> MemoryStore {
        let mut store = MemoryStore::new();
        store.insert_all(
            names
                .iter()
                .map(|n| Quad::new(Term::iri("root"), Term::iri("member"), Term::iri(*n), None).unwrap()),
        );
        store
    }

    fn members_shape() -> Shape<Ref<u64>> {
        Shape::Quads(vec![
            (quadspan_model::Direction::Subject, Shape::Lookup(Term::iri("root"))),
            (quadspan_model::Direction::Predicate, Shape::Lookup(Term::iri("member"))),
        ])
        .has_a(quadspan_model::Direction::Object)
    }

    #[test]
    fn skip_past_everything_yields_no_first() {
        let store = store_of(&["a", "b"]);
        let driver = Driver::new(members_shape(), store, CostConfig::default());
        let ctx = Context::new();
        assert!(driver.first(&ctx, 5).unwrap().is_none());
    }

    #[test]
    fn collect_honors_skip_and_limit() {
        let store = store_of(&["a", "b", "c"]);
        let driver = Driver::new(members_shape(), store, CostConfig::default());
        let ctx = Context::new();
        let all = driver.collect(&ctx, 0, None).unwrap();
        assert_eq!(all.len(), 3);
        let limited = driver.collect(&ctx, 1, Some(1)).unwrap();
        assert_eq!(limited.len(), 1);
    }

    #[test]
    fn cancelled_context_stops_count_early() {
        let store = store_of(&["a", "b", "c"]);
        let driver = Driver::new(members_shape(), store, CostConfig::default());
        let token = quadspan_iter::CancellationToken::new();
        let ctx = Context::with_token(token.clone());
        token.cancel();
        assert!(driver.count(&ctx).is_err());
    }

    #[test]
    fn without_reoptimize_leaves_shape_before_and_after_identical() {
        let store = store_of(&["a"]);
        let driver = Driver::without_reoptimize(members_shape(), store, CostConfig::default());
        let explanation = driver.explanation();
        assert_eq!(explanation.shape_before, explanation.shape_after);
    }

    #[test]
    fn stream_sink_returning_false_stops_early() {
        let store = store_of(&["a", "b", "c"]);
        let driver = Driver::new(members_shape(), store, CostConfig::default());
        let ctx = Context::new();
        let mut seen = 0;
        driver
            .stream(&ctx, 0, |_binding| {
                seen += 1;
                seen < 2
            })
            .unwrap();
        assert_eq!(seen, 2);
    }
}
