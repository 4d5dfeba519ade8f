use crate::base::{Base, Index, Scanner, TagMap};
use crate::context::Context;
use crate::error::IterError;
use quadspan_model::Ref;
use quadspan_optimize::{Size, Stats};
use quadspan_shape::{Shape, Tag};
use rustc_hash::{FxHashMap, FxHashSet};
use std::collections::VecDeque;
use std::hash::Hash;
use std::rc::Rc;

/// Substitutes every [`Shape::Placeholder`] in `shape` with
/// `Shape::Fixed(vec![frontier])`, the step that turns a `Recursive`'s
/// pure-data morphism into a concrete shape for the current BFS frontier.
pub fn substitute_placeholder<R: Clone>(shape: &Shape<R>, frontier: &R) -> Shape<R> {
    match shape {
        Shape::Placeholder => Shape::Fixed(vec![frontier.clone()]),
        Shape::AllNodes | Shape::AllQuads | Shape::Fixed(_) | Shape::Lookup(_) | Shape::Null => {
            shape.clone()
        }
        Shape::NodesFrom { direction, quads } => Shape::NodesFrom {
            direction: *direction,
            quads: Box::new(substitute_placeholder(quads, frontier)),
        },
        Shape::Quads(constraints) => Shape::Quads(
            constraints
                .iter()
                .map(|(d, s)| (*d, substitute_placeholder(s, frontier)))
                .collect(),
        ),
        Shape::Intersect(subs) => {
            Shape::Intersect(subs.iter().map(|s| substitute_placeholder(s, frontier)).collect())
        }
        Shape::IntersectOptional { required, checks } => Shape::IntersectOptional {
            required: required
                .iter()
                .map(|s| substitute_placeholder(s, frontier))
                .collect(),
            checks: checks
                .iter()
                .map(|s| substitute_placeholder(s, frontier))
                .collect(),
        },
        Shape::Union(subs) => {
            Shape::Union(subs.iter().map(|s| substitute_placeholder(s, frontier)).collect())
        }
        Shape::Difference { base, minus } => Shape::Difference {
            base: Box::new(substitute_placeholder(base, frontier)),
            minus: Box::new(substitute_placeholder(minus, frontier)),
        },
        Shape::Save {
            inner,
            predicate,
            direction,
            tag,
            reverse,
            optional,
        } => Shape::Save {
            inner: Box::new(substitute_placeholder(inner, frontier)),
            predicate: predicate
                .as_ref()
                .map(|p| Box::new(substitute_placeholder(p, frontier))),
            direction: *direction,
            tag: tag.clone(),
            reverse: *reverse,
            optional: *optional,
        },
        Shape::Filter { inner, predicate } => Shape::Filter {
            inner: Box::new(substitute_placeholder(inner, frontier)),
            predicate: predicate.clone(),
        },
        Shape::Limit { inner, count } => Shape::Limit {
            inner: Box::new(substitute_placeholder(inner, frontier)),
            count: *count,
        },
        Shape::Skip { inner, count } => Shape::Skip {
            inner: Box::new(substitute_placeholder(inner, frontier)),
            count: *count,
        },
        Shape::Unique(inner) => Shape::Unique(Box::new(substitute_placeholder(inner, frontier))),
        Shape::Count(inner) => Shape::Count(Box::new(substitute_placeholder(inner, frontier))),
        Shape::Order(inner) => Shape::Order(Box::new(substitute_placeholder(inner, frontier))),
        Shape::Recursive {
            seed,
            morphism,
            max_depth,
            tag,
        } => Shape::Recursive {
            seed: Box::new(substitute_placeholder(seed, frontier)),
            // A nested Recursive's own morphism is resolved against its
            // own frontier at its own depth, never the outer one.
            morphism: morphism.clone(),
            max_depth: *max_depth,
            tag: tag.clone(),
        },
    }
}

type StepCompiler<B> = dyn Fn(&Shape<Ref<B>>) -> Box<dyn Scanner<Ref<B>>>;

/// Fixed-point follow (§4.2.11): a breadth-first traversal over
/// `morphism`, re-substituting the current frontier node for
/// [`Shape::Placeholder`] at every step, with an explicit visited set so
/// cycles terminate. Seed nodes prime the frontier but are never emitted
/// themselves — only refs reached via one or more applications of
/// `morphism` are results (§8 "Recursive follow"), matching the way
/// `out`/`in` never return their own starting node.
pub struct RecursiveScanner<B: Clone + Eq + Hash> {
    compile: Rc<StepCompiler<B>>,
    morphism: Shape<Ref<B>>,
    max_depth: usize,
    tag: Option<Tag>,
    visited: FxHashSet<Ref<B>>,
    emitted: FxHashSet<Ref<B>>,
    parents: FxHashMap<Ref<B>, Ref<B>>,
    queue: VecDeque<(Ref<B>, usize)>,
    current: Option<Ref<B>>,
}

impl<B: Clone + Eq + Hash> RecursiveScanner<B> {
    pub fn new(
        seed: Vec<Ref<B>>,
        compile: Rc<StepCompiler<B>>,
        morphism: Shape<Ref<B>>,
        max_depth: usize,
        tag: Option<Tag>,
    ) -> Self {
        let mut visited = FxHashSet::default();
        let mut queue = VecDeque::new();
        for node in seed {
            if visited.insert(node.clone()) {
                queue.push_back((node, 0));
            }
        }
        Self {
            compile,
            morphism,
            max_depth,
            tag,
            visited,
            emitted: FxHashSet::default(),
            parents: FxHashMap::default(),
            queue,
            current: None,
        }
    }
}

impl<B: Clone + Eq + Hash> Base<Ref<B>> for RecursiveScanner<B> {
    fn result(&self) -> Option<&Ref<B>> {
        self.current.as_ref()
    }

    fn tag_results(&self, tags: &mut TagMap<Ref<B>>) {
        let Some(tag) = &self.tag else { return };
        let Some(node) = &self.current else { return };
        if let Some(parent) = self.parents.get(node) {
            tags.insert(tag.clone(), parent.clone());
        }
    }

    fn next_path(&mut self, _ctx: &Context) -> Result<bool, IterError> {
        Ok(false)
    }

    fn err(&self) -> Option<&IterError> {
        None
    }

    fn close(&mut self) {
        self.queue.clear();
    }
}

impl<B: Clone + Eq + Hash> Scanner<Ref<B>> for RecursiveScanner<B> {
    fn next(&mut self, ctx: &Context) -> Result<bool, IterError> {
        loop {
            ctx.check_cancelled()?;
            let Some((node, depth)) = self.queue.pop_front() else {
                self.current = None;
                return Ok(false);
            };
            if self.max_depth == 0 || depth < self.max_depth {
                let expanded = substitute_placeholder(&self.morphism, &node);
                let mut scanner = (self.compile)(&expanded);
                while scanner.next(ctx)? {
                    let Some(next_ref) = scanner.result().cloned() else {
                        continue;
                    };
                    if self.visited.insert(next_ref.clone()) {
                        self.parents.insert(next_ref.clone(), node.clone());
                        self.queue.push_back((next_ref, depth + 1));
                    }
                }
                scanner.close();
            }
            if depth == 0 {
                // Seed node: expanded above to find its successors, but a
                // seed is not itself a result of following the morphism.
                continue;
            }
            self.current = Some(node.clone());
            self.emitted.insert(node);
            return Ok(true);
        }
    }

    fn stats(&self) -> Stats {
        Stats::new(2.0, f64::INFINITY, Size::estimate(self.visited.len() as u64))
    }
}

/// Membership test for `Recursive`: expands the frontier until the
/// candidate is found or the traversal is exhausted, reusing the same
/// visited set and queue across calls so repeated `contains` probes don't
/// re-walk ground already covered.
pub struct RecursiveIndex<B: Clone + Eq + Hash> {
    scanner: RecursiveScanner<B>,
}

impl<B: Clone + Eq + Hash> RecursiveIndex<B> {
    pub fn new(
        seed: Vec<Ref<B>>,
        compile: Rc<StepCompiler<B>>,
        morphism: Shape<Ref<B>>,
        max_depth: usize,
        tag: Option<Tag>,
    ) -> Self {
        Self {
            scanner: RecursiveScanner::new(seed, compile, morphism, max_depth, tag),
        }
    }
}

impl<B: Clone + Eq + Hash> Base<Ref<B>> for RecursiveIndex<B> {
    fn result(&self) -> Option<&Ref<B>> {
        self.scanner.result()
    }

    fn tag_results(&self, tags: &mut TagMap<Ref<B>>) {
        self.scanner.tag_results(tags);
    }

    fn next_path(&mut self, _ctx: &Context) -> Result<bool, IterError> {
        Ok(false)
    }

    fn err(&self) -> Option<&IterError> {
        None
    }

    fn close(&mut self) {
        self.scanner.close();
    }
}

impl<B: Clone + Eq + Hash> Index<Ref<B>> for RecursiveIndex<B> {
    fn contains(&mut self, ctx: &Context, candidate: &Ref<B>) -> Result<bool, IterError> {
        if self.scanner.emitted.contains(candidate) {
            self.scanner.current = Some(candidate.clone());
            return Ok(true);
        }
        while self.scanner.next(ctx)? {
            if self.scanner.current.as_ref() == Some(candidate) {
                return Ok(true);
            }
        }
        Ok(false)
    }

    fn stats(&self) -> Stats {
        self.scanner.stats()
    }
}
