use crate::base::{Base, Index, Scanner, TagMap};
use crate::context::Context;
use crate::error::IterError;
use crate::storage::StorageContract;
use quadspan_model::{Direction, Ref};
use quadspan_optimize::{Size, Stats};

/// `Index<Ref<S::Token>>` written out fully would repeat the same bound at
/// every use site; this alias keeps signatures legible.
type BoxIndex<S> = Box<dyn Index<Ref<<S as StorageContract>::Token>>>;
type BoxScanner<S> = Box<dyn Scanner<Ref<<S as StorageContract>::Token>>>;

/// The quads constrained at one or more directions (§4.2.2 `LinksTo`,
/// generalized to `Shape::Quads`). One constraint drives the scan by
/// enumerating the backend's per-direction index; the remaining
/// constraints are reduced to `contains` checks against the driven
/// candidate's other directions, cheapest check first (§4.3 rule 7).
pub struct QuadsScanner<S: StorageContract> {
    backend: S,
    driver_direction: Direction,
    driver: BoxScanner<S>,
    checks: Vec<(Direction, BoxIndex<S>)>,
    current_node: Option<Ref<S::Token>>,
    pending: Vec<Ref<S::Token>>,
    current: Option<Ref<S::Token>>,
    driver_size: Size,
}

impl<S: StorageContract> QuadsScanner<S> {
    /// `checks` should already be sorted by ascending `contains` cost
    /// (§4.3 rule 7); the caller compiles candidate sub-shapes to `Index`
    /// before ranking them, so sorting happens once at compile time
    /// rather than on every `QuadsScanner`.
    pub fn new(
        backend: S,
        driver_direction: Direction,
        driver: BoxScanner<S>,
        checks: Vec<(Direction, BoxIndex<S>)>,
    ) -> Self {
        let driver_size = driver.stats().size;
        Self {
            backend,
            driver_direction,
            driver,
            checks,
            current_node: None,
            pending: Vec::new(),
            current: None,
            driver_size,
        }
    }

    fn advance_to_next_node(&mut self, ctx: &Context) -> Result<bool, IterError> {
        loop {
            if !self.driver.next(ctx)? {
                return Ok(false);
            }
            let Some(node) = self.driver.result().cloned() else {
                continue;
            };
            self.current_node = Some(node.clone());
            self.pending = self
                .backend
                .quads_at(self.driver_direction, &node)
                .collect();
            if !self.pending.is_empty() {
                return Ok(true);
            }
        }
    }

    fn quad_satisfies_checks(
        &mut self,
        ctx: &Context,
        quad_ref: &Ref<S::Token>,
    ) -> Result<bool, IterError> {
        let Some(quad) = self.backend.quad_of(quad_ref) else {
            return Ok(false);
        };
        for (direction, check) in &mut self.checks {
            let Some(term) = quad.get(*direction) else {
                return Ok(false);
            };
            let Some(term_ref) = self.backend.name_of(term) else {
                return Ok(false);
            };
            if !check.contains(ctx, &term_ref)? {
                return Ok(false);
            }
        }
        Ok(true)
    }
}

impl<S: StorageContract> Base<Ref<S::Token>> for QuadsScanner<S> {
    fn result(&self) -> Option<&Ref<S::Token>> {
        self.current.as_ref()
    }

    fn tag_results(&self, tags: &mut TagMap<Ref<S::Token>>) {
        self.driver.tag_results(tags);
        for (_, check) in &self.checks {
            check.tag_results(tags);
        }
    }

    fn next_path(&mut self, ctx: &Context) -> Result<bool, IterError> {
        self.driver.next_path(ctx)
    }

    fn err(&self) -> Option<&IterError> {
        self.driver.err()
    }

    fn close(&mut self) {
        self.driver.close();
        for (_, check) in &mut self.checks {
            check.close();
        }
    }
}

impl<S: StorageContract> Scanner<Ref<S::Token>> for QuadsScanner<S> {
    fn next(&mut self, ctx: &Context) -> Result<bool, IterError> {
        loop {
            ctx.check_cancelled()?;
            if self.pending.is_empty() && !self.advance_to_next_node(ctx)? {
                return Ok(false);
            }
            let candidate = self.pending.remove(0);
            if self.quad_satisfies_checks(ctx, &candidate)? {
                self.current = Some(candidate);
                return Ok(true);
            }
        }
    }

    fn stats(&self) -> Stats {
        let checks_cost: f64 = self
            .checks
            .iter()
            .map(|(_, c)| c.stats().contains_cost)
            .sum();
        Stats::new(1.0 + checks_cost, 1.0, self.driver_size)
    }
}

/// A membership test for `Quads`: every constraint is checked, cheapest
/// first, against the candidate quad's resolved directions. No driver is
/// needed since `contains` never enumerates.
pub struct QuadsIndex<S: StorageContract> {
    backend: S,
    checks: Vec<(Direction, BoxIndex<S>)>,
    current: Option<Ref<S::Token>>,
    size: Size,
}

impl<S: StorageContract> QuadsIndex<S> {
    pub fn new(backend: S, checks: Vec<(Direction, BoxIndex<S>)>, size: Size) -> Self {
        Self {
            backend,
            checks,
            current: None,
            size,
        }
    }
}

impl<S: StorageContract> Base<Ref<S::Token>> for QuadsIndex<S> {
    fn result(&self) -> Option<&Ref<S::Token>> {
        self.current.as_ref()
    }

    fn tag_results(&self, tags: &mut TagMap<Ref<S::Token>>) {
        for (_, check) in &self.checks {
            check.tag_results(tags);
        }
    }

    fn next_path(&mut self, _ctx: &Context) -> Result<bool, IterError> {
        Ok(false)
    }

    fn err(&self) -> Option<&IterError> {
        None
    }

    fn close(&mut self) {
        for (_, check) in &mut self.checks {
            check.close();
        }
    }
}

impl<S: StorageContract> Index<Ref<S::Token>> for QuadsIndex<S> {
    fn contains(&mut self, ctx: &Context, candidate: &Ref<S::Token>) -> Result<bool, IterError> {
        let Some(quad) = self.backend.quad_of(candidate) else {
            return Ok(false);
        };
        for (direction, check) in &mut self.checks {
            let Some(term) = quad.get(*direction) else {
                return Ok(false);
            };
            let Some(term_ref) = self.backend.name_of(term) else {
                return Ok(false);
            };
            if !check.contains(ctx, &term_ref)? {
                return Ok(false);
            }
        }
        self.current = Some(candidate.clone());
        Ok(true)
    }

    fn stats(&self) -> Stats {
        let checks_cost: f64 = self
            .checks
            .iter()
            .map(|(_, c)| c.stats().contains_cost)
            .sum();
        Stats::new(1.0, checks_cost, self.size)
    }
}
