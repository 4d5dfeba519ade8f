use crate::base::{Base, Index, Scanner, TagMap};
use crate::context::Context;
use crate::error::IterError;
use quadspan_optimize::Stats;

/// `base - minus` (§4.2.5): scans `base`, suppressing anything `minus`
/// contains.
pub struct DifferenceScanner<R> {
    base: Box<dyn Scanner<R>>,
    minus: Box<dyn Index<R>>,
    current: Option<R>,
}

impl<R> DifferenceScanner<R> {
    #[must_use]
    pub fn new(base: Box<dyn Scanner<R>>, minus: Box<dyn Index<R>>) -> Self {
        Self {
            base,
            minus,
            current: None,
        }
    }
}

impl<R: Clone> Base<R> for DifferenceScanner<R> {
    fn result(&self) -> Option<&R> {
        self.current.as_ref()
    }

    fn tag_results(&self, tags: &mut TagMap<R>) {
        self.base.tag_results(tags);
    }

    fn next_path(&mut self, ctx: &Context) -> Result<bool, IterError> {
        self.base.next_path(ctx)
    }

    fn err(&self) -> Option<&IterError> {
        self.base.err()
    }

    fn close(&mut self) {
        self.base.close();
        self.minus.close();
    }
}

impl<R: Clone> Scanner<R> for DifferenceScanner<R> {
    fn next(&mut self, ctx: &Context) -> Result<bool, IterError> {
        loop {
            ctx.check_cancelled()?;
            if !self.base.next(ctx)? {
                return Ok(false);
            }
            let Some(candidate) = self.base.result().cloned() else {
                continue;
            };
            if !self.minus.contains(ctx, &candidate)? {
                self.current = Some(candidate);
                return Ok(true);
            }
        }
    }

    fn stats(&self) -> Stats {
        let base_stats = self.base.stats();
        let minus_stats = self.minus.stats();
        Stats::new(
            base_stats.next_cost + minus_stats.contains_cost,
            base_stats.contains_cost,
            base_stats.size,
        )
    }
}

/// `contains(c)` holds iff `base` contains `c` and `minus` does not.
pub struct DifferenceIndex<R> {
    base: Box<dyn Index<R>>,
    minus: Box<dyn Index<R>>,
    current: Option<R>,
}

impl<R> DifferenceIndex<R> {
    #[must_use]
    pub fn new(base: Box<dyn Index<R>>, minus: Box<dyn Index<R>>) -> Self {
        Self {
            base,
            minus,
            current: None,
        }
    }
}

impl<R: Clone> Base<R> for DifferenceIndex<R> {
    fn result(&self) -> Option<&R> {
        self.current.as_ref()
    }

    fn tag_results(&self, tags: &mut TagMap<R>) {
        self.base.tag_results(tags);
    }

    fn next_path(&mut self, _ctx: &Context) -> Result<bool, IterError> {
        Ok(false)
    }

    fn err(&self) -> Option<&IterError> {
        None
    }

    fn close(&mut self) {
        self.base.close();
        self.minus.close();
    }
}

impl<R: Clone> Index<R> for DifferenceIndex<R> {
    fn contains(&mut self, ctx: &Context, candidate: &R) -> Result<bool, IterError> {
        if self.base.contains(ctx, candidate)? && !self.minus.contains(ctx, candidate)? {
            self.current = Some(candidate.clone());
            Ok(true)
        } else {
            Ok(false)
        }
    }

    fn stats(&self) -> Stats {
        let base_stats = self.base.stats();
        let minus_stats = self.minus.stats();
        Stats::new(
            1.0,
            base_stats.contains_cost + minus_stats.contains_cost,
            base_stats.size,
        )
    }
}
