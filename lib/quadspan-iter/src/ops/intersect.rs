use crate::base::{Base, Index, Scanner, TagMap};
use crate::context::Context;
use crate::error::IterError;
use quadspan_optimize::Stats;

/// An intersection driven by one scanner and confirmed by the remaining
/// members as `contains` checks, cheapest first (§4.2.3, §4.3 rules 6-7).
/// The caller (`shape_iter::compile`) is responsible for picking the
/// cheapest member as `driver` and sorting `checks` ascending by
/// `contains_cost` before construction.
pub struct IntersectScanner<R> {
    driver: Box<dyn Scanner<R>>,
    checks: Vec<Box<dyn Index<R>>>,
    current: Option<R>,
}

impl<R> IntersectScanner<R> {
    #[must_use]
    pub fn new(driver: Box<dyn Scanner<R>>, checks: Vec<Box<dyn Index<R>>>) -> Self {
        Self {
            driver,
            checks,
            current: None,
        }
    }
}

impl<R: Clone> Base<R> for IntersectScanner<R> {
    fn result(&self) -> Option<&R> {
        self.current.as_ref()
    }

    fn tag_results(&self, tags: &mut TagMap<R>) {
        self.driver.tag_results(tags);
        for check in &self.checks {
            check.tag_results(tags);
        }
    }

    fn next_path(&mut self, ctx: &Context) -> Result<bool, IterError> {
        if self.driver.next_path(ctx)? {
            return Ok(true);
        }
        for check in &mut self.checks {
            if check.next_path(ctx)? {
                return Ok(true);
            }
        }
        Ok(false)
    }

    fn err(&self) -> Option<&IterError> {
        self.driver.err()
    }

    fn close(&mut self) {
        self.driver.close();
        for check in &mut self.checks {
            check.close();
        }
    }
}

impl<R: Clone> Scanner<R> for IntersectScanner<R> {
    fn next(&mut self, ctx: &Context) -> Result<bool, IterError> {
        'candidates: loop {
            ctx.check_cancelled()?;
            if !self.driver.next(ctx)? {
                return Ok(false);
            }
            let Some(candidate) = self.driver.result().cloned() else {
                continue;
            };
            for check in &mut self.checks {
                if !check.contains(ctx, &candidate)? {
                    continue 'candidates;
                }
            }
            self.current = Some(candidate);
            return Ok(true);
        }
    }

    fn stats(&self) -> Stats {
        let driver_stats = self.driver.stats();
        let checks_cost: f64 = self.checks.iter().map(|c| c.stats().contains_cost).sum();
        Stats::new(
            driver_stats.next_cost + checks_cost,
            driver_stats.contains_cost + checks_cost,
            driver_stats.size,
        )
    }
}

/// Membership test for an intersection: every member must accept the
/// candidate, cheapest first.
pub struct IntersectIndex<R> {
    checks: Vec<Box<dyn Index<R>>>,
    current: Option<R>,
}

impl<R> IntersectIndex<R> {
    #[must_use]
    pub fn new(checks: Vec<Box<dyn Index<R>>>) -> Self {
        Self {
            checks,
            current: None,
        }
    }
}

impl<R: Clone> Base<R> for IntersectIndex<R> {
    fn result(&self) -> Option<&R> {
        self.current.as_ref()
    }

    fn tag_results(&self, tags: &mut TagMap<R>) {
        for check in &self.checks {
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
        for check in &mut self.checks {
            check.close();
        }
    }
}

impl<R: Clone> Index<R> for IntersectIndex<R> {
    fn contains(&mut self, ctx: &Context, candidate: &R) -> Result<bool, IterError> {
        for check in &mut self.checks {
            if !check.contains(ctx, candidate)? {
                return Ok(false);
            }
        }
        self.current = Some(candidate.clone());
        Ok(true)
    }

    fn stats(&self) -> Stats {
        let checks_cost: f64 = self.checks.iter().map(|c| c.stats().contains_cost).sum();
        let size = self
            .checks
            .iter()
            .map(|c| c.stats().size)
            .min_by_key(|s| s.value)
            .unwrap_or(quadspan_optimize::Size::exact(0));
        Stats::new(1.0, checks_cost, size)
    }
}
