use crate::base::{Base, Scanner, TagMap};
use crate::context::Context;
use crate::error::IterError;
use quadspan_optimize::{Size, Stats};

/// Discards `inner`'s first `count` results (§4.2.9).
pub struct SkipScanner<R> {
    inner: Box<dyn Scanner<R>>,
    count: usize,
    skipped: bool,
}

impl<R> SkipScanner<R> {
    #[must_use]
    pub fn new(inner: Box<dyn Scanner<R>>, count: usize) -> Self {
        Self {
            inner,
            count,
            skipped: false,
        }
    }

    fn skip_prefix(&mut self, ctx: &Context) -> Result<(), IterError> {
        for _ in 0..self.count {
            if !self.inner.next(ctx)? {
                break;
            }
        }
        self.skipped = true;
        Ok(())
    }
}

impl<R: Clone> Base<R> for SkipScanner<R> {
    fn result(&self) -> Option<&R> {
        self.inner.result()
    }

    fn tag_results(&self, tags: &mut TagMap<R>) {
        self.inner.tag_results(tags);
    }

    fn next_path(&mut self, ctx: &Context) -> Result<bool, IterError> {
        self.inner.next_path(ctx)
    }

    fn err(&self) -> Option<&IterError> {
        self.inner.err()
    }

    fn close(&mut self) {
        self.inner.close();
    }
}

impl<R: Clone> Scanner<R> for SkipScanner<R> {
    fn next(&mut self, ctx: &Context) -> Result<bool, IterError> {
        if !self.skipped {
            self.skip_prefix(ctx)?;
        }
        self.inner.next(ctx)
    }

    fn stats(&self) -> Stats {
        let inner = self.inner.stats();
        Stats::new(
            inner.next_cost,
            inner.contains_cost,
            Size {
                value: inner.size.value.saturating_sub(self.count as u64),
                exact: inner.size.exact,
            },
        )
    }
}
