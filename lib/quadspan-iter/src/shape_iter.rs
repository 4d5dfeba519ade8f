//! Compiles a pure [`Shape`] into an executable [`Scanner`]/[`Index`] tree
//! bound to a concrete backend (§4.1 "Iterator Shape").

use crate::base::{Base, Index, Scanner, TagMap};
use crate::context::Context;
use crate::error::IterError;
use crate::ops;
use crate::storage::StorageContract;
use quadspan_model::Ref;
use quadspan_optimize::{CostConfig, Stats};
use quadspan_shape::Shape;
use std::rc::Rc;

/// A `Shape`, a concrete backend and the cost configuration to build an
/// executable iterator tree from them (§4.1). Each call to
/// [`IteratorShape::iterate`]/[`IteratorShape::lookup`] compiles a fresh
/// tree rather than sharing state across calls — the reference
/// implementation this engine descends from documented its own multi-call
/// `Iterate`/`Lookup` reuse as unsound, so this engine never attempts it.
pub struct IteratorShape<S: StorageContract> {
    shape: Shape<Ref<S::Token>>,
    backend: S,
    cost_config: CostConfig,
}

impl<S: StorageContract + 'static> IteratorShape<S> {
    #[must_use]
    pub fn new(shape: Shape<Ref<S::Token>>, backend: S, cost_config: CostConfig) -> Self {
        Self {
            shape,
            backend,
            cost_config,
        }
    }

    #[must_use]
    pub fn iterate(&self) -> Box<dyn Scanner<Ref<S::Token>>> {
        compile_scanner(&self.shape, &self.backend, &self.cost_config)
    }

    #[must_use]
    pub fn lookup(&self) -> Box<dyn Index<Ref<S::Token>>> {
        compile_index(&self.shape, &self.backend, &self.cost_config)
    }

    /// The top-level tree's projected cost/size, for diagnostics
    /// (`ExecutionExplanation` in `quadspan-engine`) without running it.
    #[must_use]
    pub fn stats(&self) -> Stats {
        self.iterate().stats()
    }
}

/// A candidate compiled as `Index`, paired with the `direction` it applies
/// to (when relevant) — used while the compiler is still deciding which
/// candidate should drive a scan.
struct Candidate<R> {
    index: Box<dyn Index<R>>,
}

fn compile_candidates<S: StorageContract + 'static>(
    shapes: &[Shape<Ref<S::Token>>],
    backend: &S,
    cfg: &CostConfig,
) -> Vec<Candidate<Ref<S::Token>>> {
    shapes
        .iter()
        .map(|s| Candidate {
            index: compile_index(s, backend, cfg),
        })
        .collect()
}

/// Picks the member with the lowest projected cost of driving the scan as
/// the primary, the rest checked via `contains` (§4.3 rule 6:
/// `cost(p) = p.size · (p.nextCost + Σ_{s≠p} s.containsCost)`).
fn select_driver_index(stats: &[Stats]) -> usize {
    stats
        .iter()
        .enumerate()
        .min_by(|(i, a), (j, b)| {
            let cost_a = a.projected_primary_cost(
                stats.iter().enumerate().filter(|(k, _)| k != i).map(|(_, s)| s),
            );
            let cost_b = b.projected_primary_cost(
                stats.iter().enumerate().filter(|(k, _)| k != j).map(|(_, s)| s),
            );
            cost_a.partial_cmp(&cost_b).unwrap_or(std::cmp::Ordering::Equal)
        })
        .map(|(i, _)| i)
        .unwrap_or(0)
}

/// Picks the member with the lowest projected driving cost as the scan
/// driver (§4.3 rule 6), re-compiling that one member fresh as a `Scanner`
/// (`compile_index` and `compile_scanner` are both stateless constructors,
/// so compiling a shape twice is wasted work, not a correctness risk).
/// The remaining members are returned as `Index` checks, sorted ascending
/// by `contains` cost (§4.3 rule 7).
fn select_driver<S: StorageContract + 'static>(
    shapes: &[Shape<Ref<S::Token>>],
    backend: &S,
    cfg: &CostConfig,
    candidates: Vec<Candidate<Ref<S::Token>>>,
) -> (
    Box<dyn Scanner<Ref<S::Token>>>,
    Vec<Box<dyn Index<Ref<S::Token>>>>,
) {
    if shapes.is_empty() {
        return (Box::new(ops::null::NullIter), Vec::new());
    }
    let stats: Vec<Stats> = candidates.iter().map(|c| c.index.stats()).collect();
    let driver_pos = select_driver_index(&stats);
    let driver_scanner = compile_scanner(&shapes[driver_pos], backend, cfg);
    let mut checks: Vec<_> = candidates
        .into_iter()
        .enumerate()
        .filter(|(i, _)| *i != driver_pos)
        .map(|(_, c)| c.index)
        .collect();
    checks.sort_by(|a, b| {
        a.stats()
            .contains_cost
            .partial_cmp(&b.stats().contains_cost)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    (driver_scanner, checks)
}

/// Compiles `shape` into a [`Scanner`] bound to `backend`.
pub fn compile_scanner<S: StorageContract + 'static>(
    shape: &Shape<Ref<S::Token>>,
    backend: &S,
    cfg: &CostConfig,
) -> Box<dyn Scanner<Ref<S::Token>>> {
    // §4.3 rule 9 "backend replacement": give the backend first refusal on
    // every shape before falling through to the generic operator tree. The
    // default `StorageContract::native_scan` declines everything, so this
    // is a no-op for backends (like the in-memory one) with no native
    // index to exploit; a backend that does advertise support for a
    // pattern such as §4.3 rule 5's `Filter(HasA(LinksTo))` push-down
    // short-circuits here instead of paying for the generic compilation.
    if let Some(native) = backend.native_scan(shape) {
        return native;
    }
    match shape {
        Shape::Null => Box::new(ops::null::NullIter),
        Shape::Placeholder => Box::new(MalformedIter::new(
            "Placeholder outside a Recursive morphism",
        )),
        Shape::AllNodes => Box::new(ops::all::AllIter::nodes(backend)),
        Shape::AllQuads => Box::new(ops::all::AllIter::quads(backend)),
        Shape::Fixed(values) => Box::new(ops::fixed::FixedIter::new(values.clone())),
        Shape::Lookup(term) => Box::new(ops::lookup::LookupIter::resolve(backend, term)),

        Shape::NodesFrom { direction, quads } => Box::new(ops::nodes_from::NodesFromScanner::new(
            backend.clone(),
            *direction,
            compile_scanner(quads, backend, cfg),
        )),

        Shape::Quads(constraints) => compile_quads_scanner(constraints, backend, cfg),

        Shape::Intersect(subs) => {
            let candidates = compile_candidates(subs, backend, cfg);
            let (driver, checks) = select_driver(subs, backend, cfg, candidates);
            Box::new(ops::intersect::IntersectScanner::new(driver, checks))
        }

        Shape::IntersectOptional { required, checks } => {
            let candidates = compile_candidates(required, backend, cfg);
            let (driver, mut rest) = select_driver(required, backend, cfg, candidates);
            rest.extend(
                checks
                    .iter()
                    .map(|s| compile_index(s, backend, cfg)),
            );
            rest.sort_by(|a, b| {
                a.stats()
                    .contains_cost
                    .partial_cmp(&b.stats().contains_cost)
                    .unwrap_or(std::cmp::Ordering::Equal)
            });
            Box::new(ops::intersect::IntersectScanner::new(driver, rest))
        }

        Shape::Union(subs) => Box::new(ops::union::UnionScanner::new(
            subs.iter()
                .map(|s| compile_scanner(s, backend, cfg))
                .collect(),
        )),

        Shape::Difference { base, minus } => Box::new(ops::difference::DifferenceScanner::new(
            compile_scanner(base, backend, cfg),
            compile_index(minus, backend, cfg),
        )),

        Shape::Save {
            inner,
            predicate,
            direction,
            tag,
            reverse,
            optional,
        } => Box::new(ops::save::SaveScanner::new(
            backend.clone(),
            compile_scanner(inner, backend, cfg),
            predicate.as_deref().map(|p| compile_index(p, backend, cfg)),
            *direction,
            tag.clone(),
            *reverse,
            *optional,
        )),

        Shape::Filter { inner, predicate } => Box::new(ops::filter::FilterScanner::new(
            backend.clone(),
            compile_scanner(inner, backend, cfg),
            predicate.clone(),
        )),

        Shape::Limit { inner, count } => Box::new(ops::limit::LimitScanner::new(
            compile_scanner(inner, backend, cfg),
            *count,
        )),

        Shape::Skip { inner, count } => Box::new(ops::skip::SkipScanner::new(
            compile_scanner(inner, backend, cfg),
            *count,
        )),

        Shape::Unique(inner) => Box::new(ops::unique::UniqueScanner::new(compile_scanner(
            inner, backend, cfg,
        ))),

        Shape::Count(inner) => {
            Box::new(ops::count::CountScanner::new(compile_scanner(inner, backend, cfg)))
        }

        Shape::Order(inner) => Box::new(ops::order::OrderScanner::new(
            backend.clone(),
            compile_scanner(inner, backend, cfg),
        )),

        Shape::Recursive {
            seed,
            morphism,
            max_depth,
            tag,
        } => {
            let seed_values = drain_scanner(compile_scanner(seed, backend, cfg));
            let compiler = step_compiler(backend.clone(), *cfg);
            Box::new(ops::recursive::RecursiveScanner::new(
                seed_values,
                compiler,
                (**morphism).clone(),
                *max_depth,
                tag.clone(),
            ))
        }
    }
}

/// Compiles `shape` into an [`Index`] bound to `backend`.
pub fn compile_index<S: StorageContract + 'static>(
    shape: &Shape<Ref<S::Token>>,
    backend: &S,
    cfg: &CostConfig,
) -> Box<dyn Index<Ref<S::Token>>> {
    match shape {
        Shape::Null => Box::new(ops::null::NullIter),
        Shape::Placeholder => Box::new(MalformedIter::new(
            "Placeholder outside a Recursive morphism",
        )),
        Shape::AllNodes => Box::new(ops::all::AllIndex::nodes(backend.clone())),
        Shape::AllQuads => Box::new(ops::all::AllIndex::quads(backend.clone())),
        Shape::Fixed(values) => Box::new(ops::fixed::FixedIter::new(values.clone())),
        Shape::Lookup(term) => Box::new(ops::lookup::LookupIter::resolve(backend, term)),

        Shape::NodesFrom { direction, quads } => Box::new(ops::nodes_from::NodesFromIndex::new(
            backend.clone(),
            *direction,
            compile_index(quads, backend, cfg),
        )),

        Shape::Quads(constraints) => {
            let checks = constraints
                .iter()
                .map(|(d, s)| (*d, compile_index(s, backend, cfg)))
                .collect::<Vec<_>>();
            let size = checks
                .iter()
                .map(|(_, c)| c.stats().size)
                .min_by_key(|s| s.value)
                .unwrap_or(quadspan_optimize::Size::estimate(0));
            Box::new(ops::quads::QuadsIndex::new(backend.clone(), checks, size))
        }

        Shape::Intersect(subs) => Box::new(ops::intersect::IntersectIndex::new(
            subs.iter().map(|s| compile_index(s, backend, cfg)).collect(),
        )),

        Shape::IntersectOptional { required, checks } => {
            let mut all: Vec<Box<dyn Index<Ref<S::Token>>>> = required
                .iter()
                .map(|s| compile_index(s, backend, cfg))
                .collect();
            all.extend(checks.iter().map(|s| compile_index(s, backend, cfg)));
            Box::new(ops::intersect::IntersectIndex::new(all))
        }

        Shape::Union(subs) => Box::new(ops::union::UnionIndex::new(
            subs.iter().map(|s| compile_index(s, backend, cfg)).collect(),
        )),

        Shape::Difference { base, minus } => Box::new(ops::difference::DifferenceIndex::new(
            compile_index(base, backend, cfg),
            compile_index(minus, backend, cfg),
        )),

        Shape::Save {
            inner,
            predicate,
            direction,
            tag,
            reverse,
            optional,
        } => Box::new(ops::save::SaveIndex::new(
            backend.clone(),
            compile_index(inner, backend, cfg),
            predicate.as_deref().map(|p| compile_index(p, backend, cfg)),
            *direction,
            tag.clone(),
            *reverse,
            *optional,
        )),

        Shape::Filter { inner, predicate } => Box::new(ops::filter::FilterIndex::new(
            backend.clone(),
            compile_index(inner, backend, cfg),
            predicate.clone(),
        )),

        Shape::Unique(inner) => Box::new(ops::unique::UniqueIndex::new(compile_index(
            inner, backend, cfg,
        ))),

        Shape::Count(inner) => {
            Box::new(ops::count::CountIndex::new(compile_scanner(inner, backend, cfg)))
        }

        Shape::Recursive {
            seed,
            morphism,
            max_depth,
            tag,
        } => {
            let seed_values = drain_scanner(compile_scanner(seed, backend, cfg));
            let compiler = step_compiler(backend.clone(), *cfg);
            Box::new(ops::recursive::RecursiveIndex::new(
                seed_values,
                compiler,
                (**morphism).clone(),
                *max_depth,
                tag.clone(),
            ))
        }

        // Limit/Skip/Order have no cheaper membership test than scanning:
        // position and sort order aren't meaningful to a single candidate
        // in isolation, so falling back to a full scan is the honest
        // answer rather than a misleading shortcut.
        Shape::Limit { .. } | Shape::Skip { .. } | Shape::Order(_) => {
            Box::new(ScanAsIndex::new(compile_scanner(shape, backend, cfg)))
        }
    }
}

fn compile_quads_scanner<S: StorageContract + 'static>(
    constraints: &[(quadspan_model::Direction, Shape<Ref<S::Token>>)],
    backend: &S,
    cfg: &CostConfig,
) -> Box<dyn Scanner<Ref<S::Token>>> {
    if constraints.is_empty() {
        return Box::new(ops::all::AllIter::quads(backend));
    }
    let shapes: Vec<_> = constraints.iter().map(|(_, s)| s.clone()).collect();
    let candidates = compile_candidates(&shapes, backend, cfg);
    let stats: Vec<Stats> = candidates.iter().map(|c| c.index.stats()).collect();
    let driver_pos = select_driver_index(&stats);
    let (driver_direction, driver_shape) = &constraints[driver_pos];
    let driver_scanner = compile_scanner(driver_shape, backend, cfg);
    let mut checks: Vec<_> = constraints
        .iter()
        .enumerate()
        .filter(|(i, _)| *i != driver_pos)
        .map(|(_, (d, s))| (*d, compile_index(s, backend, cfg)))
        .collect();
    checks.sort_by(|a, b| {
        a.1.stats()
            .contains_cost
            .partial_cmp(&b.1.stats().contains_cost)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    Box::new(ops::quads::QuadsScanner::new(
        backend.clone(),
        *driver_direction,
        driver_scanner,
        checks,
    ))
}

fn drain_scanner<R: Clone>(mut scanner: Box<dyn Scanner<R>>) -> Vec<R> {
    let ctx = Context::new();
    let mut values = Vec::new();
    while scanner.next(&ctx).unwrap_or(false) {
        if let Some(v) = scanner.result().cloned() {
            values.push(v);
        }
    }
    scanner.close();
    values
}

type StepFn<S> =
    dyn Fn(&Shape<Ref<<S as StorageContract>::Token>>) -> Box<dyn Scanner<Ref<<S as StorageContract>::Token>>>;

fn step_compiler<S: StorageContract + 'static>(backend: S, cfg: CostConfig) -> Rc<StepFn<S>> {
    Rc::new(move |shape| compile_scanner(shape, &backend, &cfg))
}

/// Always errors: the shape it was compiled from is structurally invalid
/// in the position it appeared (§7 "never panics on malformed Shapes").
struct MalformedIter {
    message: &'static str,
}

impl MalformedIter {
    fn new(message: &'static str) -> Self {
        Self { message }
    }
}

impl<R> Base<R> for MalformedIter {
    fn result(&self) -> Option<&R> {
        None
    }

    fn tag_results(&self, _tags: &mut TagMap<R>) {}

    fn next_path(&mut self, _ctx: &Context) -> Result<bool, IterError> {
        Ok(false)
    }

    fn err(&self) -> Option<&IterError> {
        None
    }

    fn close(&mut self) {}
}

impl<R> Scanner<R> for MalformedIter {
    fn next(&mut self, _ctx: &Context) -> Result<bool, IterError> {
        Err(IterError::Malformed(self.message))
    }

    fn stats(&self) -> Stats {
        Stats::new(0.0, 0.0, quadspan_optimize::Size::exact(0))
    }
}

impl<R> Index<R> for MalformedIter {
    fn contains(&mut self, _ctx: &Context, _candidate: &R) -> Result<bool, IterError> {
        Err(IterError::Malformed(self.message))
    }

    fn stats(&self) -> Stats {
        Stats::new(0.0, 0.0, quadspan_optimize::Size::exact(0))
    }
}

/// Adapts a [`Scanner`] into an [`Index`] by linear search — the fallback
/// for operators with no cheaper membership test (`Limit`, `Skip`,
/// `Order`).
struct ScanAsIndex<R> {
    scanner: Box<dyn Scanner<R>>,
    current: Option<R>,
}

impl<R> ScanAsIndex<R> {
    fn new(scanner: Box<dyn Scanner<R>>) -> Self {
        Self {
            scanner,
            current: None,
        }
    }
}

impl<R: Clone> Base<R> for ScanAsIndex<R> {
    fn result(&self) -> Option<&R> {
        self.current.as_ref()
    }

    fn tag_results(&self, tags: &mut TagMap<R>) {
        self.scanner.tag_results(tags);
    }

    fn next_path(&mut self, _ctx: &Context) -> Result<bool, IterError> {
        Ok(false)
    }

    fn err(&self) -> Option<&IterError> {
        self.scanner.err()
    }

    fn close(&mut self) {
        self.scanner.close();
    }
}

impl<R: Clone + PartialEq> Index<R> for ScanAsIndex<R> {
    fn contains(&mut self, ctx: &Context, candidate: &R) -> Result<bool, IterError> {
        while self.scanner.next(ctx)? {
            if self.scanner.result() == Some(candidate) {
                self.current = Some(candidate.clone());
                return Ok(true);
            }
        }
        Ok(false)
    }

    fn stats(&self) -> Stats {
        self.scanner.stats()
    }
}
