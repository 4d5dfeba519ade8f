use crate::base::{Base, Index, Scanner, TagMap};
use crate::context::Context;
use crate::error::IterError;
use crate::storage::StorageContract;
use quadspan_model::{Direction, Ref};
use quadspan_optimize::Stats;

type BoxScanner<S> = Box<dyn Scanner<Ref<<S as StorageContract>::Token>>>;
type BoxIndex<S> = Box<dyn Index<Ref<<S as StorageContract>::Token>>>;

/// Projects a quad set down to the nodes at `direction` (§4.2.2 `HasA`).
/// Fan-in tolerant: a node justified by several quads is emitted once per
/// justifying quad, matching the spec's explicit multiplicity rule —
/// `Unique` is the caller's job if deduplication is wanted.
pub struct NodesFromScanner<S: StorageContract> {
    backend: S,
    direction: Direction,
    quads: BoxScanner<S>,
    current: Option<Ref<S::Token>>,
}

impl<S: StorageContract> NodesFromScanner<S> {
    pub fn new(backend: S, direction: Direction, quads: BoxScanner<S>) -> Self {
        Self {
            backend,
            direction,
            quads,
            current: None,
        }
    }
}

impl<S: StorageContract> Base<Ref<S::Token>> for NodesFromScanner<S> {
    fn result(&self) -> Option<&Ref<S::Token>> {
        self.current.as_ref()
    }

    fn tag_results(&self, tags: &mut TagMap<Ref<S::Token>>) {
        self.quads.tag_results(tags);
    }

    fn next_path(&mut self, _ctx: &Context) -> Result<bool, IterError> {
        Ok(false)
    }

    fn err(&self) -> Option<&IterError> {
        self.quads.err()
    }

    fn close(&mut self) {
        self.quads.close();
    }
}

impl<S: StorageContract> Scanner<Ref<S::Token>> for NodesFromScanner<S> {
    fn next(&mut self, ctx: &Context) -> Result<bool, IterError> {
        loop {
            ctx.check_cancelled()?;
            if !self.quads.next(ctx)? {
                return Ok(false);
            }
            let Some(quad_ref) = self.quads.result() else {
                continue;
            };
            let Some(quad) = self.backend.quad_of(quad_ref) else {
                continue;
            };
            let Some(term) = quad.get(self.direction) else {
                continue;
            };
            let Some(node_ref) = self.backend.name_of(term) else {
                continue;
            };
            self.current = Some(node_ref);
            return Ok(true);
        }
    }

    fn stats(&self) -> Stats {
        let inner = self.quads.stats();
        Stats::new(inner.next_cost, inner.contains_cost, inner.size)
    }
}

/// `contains(node)` holds iff some quad has `node` at `direction` and that
/// quad also satisfies the wrapped `quads` shape (checked via the
/// backend's per-direction index rather than re-scanning).
pub struct NodesFromIndex<S: StorageContract> {
    backend: S,
    direction: Direction,
    quads: BoxIndex<S>,
    current: Option<Ref<S::Token>>,
    /// Every justifying quad ref found for the current candidate (§4.2.2
    /// HasA: "the first success sets v as current; subsequent results
    /// become alternative paths for nextPath").
    witnesses: Vec<Ref<S::Token>>,
    witness_pos: usize,
}

impl<S: StorageContract> NodesFromIndex<S> {
    pub fn new(backend: S, direction: Direction, quads: BoxIndex<S>) -> Self {
        Self {
            backend,
            direction,
            quads,
            current: None,
            witnesses: Vec::new(),
            witness_pos: 0,
        }
    }

    fn compute_witnesses(
        &mut self,
        ctx: &Context,
        candidate: &Ref<S::Token>,
    ) -> Result<(), IterError> {
        self.witnesses.clear();
        for quad_ref in self.backend.quads_at(self.direction, candidate) {
            ctx.check_cancelled()?;
            if self.quads.contains(ctx, &quad_ref)? {
                self.witnesses.push(quad_ref);
            }
        }
        Ok(())
    }
}

impl<S: StorageContract> Base<Ref<S::Token>> for NodesFromIndex<S> {
    fn result(&self) -> Option<&Ref<S::Token>> {
        self.current.as_ref()
    }

    fn tag_results(&self, tags: &mut TagMap<Ref<S::Token>>) {
        if self.witness_pos > 0 {
            self.quads.tag_results(tags);
        }
    }

    fn next_path(&mut self, ctx: &Context) -> Result<bool, IterError> {
        if self.witness_pos >= self.witnesses.len() {
            return Ok(false);
        }
        let witness = self.witnesses[self.witness_pos].clone();
        self.witness_pos += 1;
        self.quads.contains(ctx, &witness)
    }

    fn err(&self) -> Option<&IterError> {
        None
    }

    fn close(&mut self) {
        self.quads.close();
    }
}

impl<S: StorageContract> Index<Ref<S::Token>> for NodesFromIndex<S> {
    fn contains(&mut self, ctx: &Context, candidate: &Ref<S::Token>) -> Result<bool, IterError> {
        self.witness_pos = 0;
        self.compute_witnesses(ctx, candidate)?;
        if self.witnesses.is_empty() {
            return Ok(false);
        }
        // Re-run the first witness so `self.quads`'s tag state matches it
        // (the scan above left it pointed at whichever was checked last).
        self.quads.contains(ctx, &self.witnesses[0])?;
        self.witness_pos = 1;
        self.current = Some(candidate.clone());
        Ok(true)
    }

    fn stats(&self) -> Stats {
        let inner = self.quads.stats();
        Stats::new(inner.next_cost, inner.contains_cost, inner.size)
    }
}
