use crate::base::{Base, Index, Scanner, TagMap};
use crate::context::Context;
use crate::error::IterError;
use quadspan_optimize::{Size, Stats};

/// Caps `inner` at `count` results (§4.2.9).
pub struct LimitScanner<R> {
    inner: Box<dyn Scanner<R>>,
    count: usize,
    emitted: usize,
}

impl<R> LimitScanner<R> {
    #[must_use]
    pub fn new(inner: Box<dyn Scanner<R>>, count: usize) -> Self {
        Self {
            inner,
            count,
            emitted: 0,
        }
    }
}

impl<R: Clone> Base<R> for LimitScanner<R> {
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

impl<R: Clone> Scanner<R> for LimitScanner<R> {
    fn next(&mut self, ctx: &Context) -> Result<bool, IterError> {
        if self.emitted >= self.count {
            return Ok(false);
        }
        if self.inner.next(ctx)? {
            self.emitted += 1;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    fn stats(&self) -> Stats {
        let inner = self.inner.stats();
        Stats::new(
            inner.next_cost,
            inner.contains_cost,
            Size {
                value: inner.size.value.min(self.count as u64),
                exact: inner.size.exact || inner.size.value >= self.count as u64,
            },
        )
    }
}
