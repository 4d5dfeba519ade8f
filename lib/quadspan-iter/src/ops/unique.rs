use crate::base::{Base, Index, Scanner, TagMap};
use crate::context::Context;
use crate::error::IterError;
use quadspan_optimize::Stats;
use rustc_hash::FxHashSet;
use std::hash::Hash;

/// Deduplicates `inner`'s results by ref identity (§4.2.9).
pub struct UniqueScanner<R> {
    inner: Box<dyn Scanner<R>>,
    seen: FxHashSet<R>,
}

impl<R: Eq + Hash> UniqueScanner<R> {
    #[must_use]
    pub fn new(inner: Box<dyn Scanner<R>>) -> Self {
        Self {
            inner,
            seen: FxHashSet::default(),
        }
    }
}

impl<R: Clone + Eq + Hash> Base<R> for UniqueScanner<R> {
    fn result(&self) -> Option<&R> {
        self.inner.result()
    }

    fn tag_results(&self, tags: &mut TagMap<R>) {
        self.inner.tag_results(tags);
    }

    fn next_path(&mut self, _ctx: &Context) -> Result<bool, IterError> {
        // A repeated path to an already-emitted result is exactly what
        // `Unique` exists to suppress, so further paths are never exposed.
        Ok(false)
    }

    fn err(&self) -> Option<&IterError> {
        self.inner.err()
    }

    fn close(&mut self) {
        self.inner.close();
    }
}

impl<R: Clone + Eq + Hash> Scanner<R> for UniqueScanner<R> {
    fn next(&mut self, ctx: &Context) -> Result<bool, IterError> {
        loop {
            ctx.check_cancelled()?;
            if !self.inner.next(ctx)? {
                return Ok(false);
            }
            let Some(candidate) = self.inner.result().cloned() else {
                continue;
            };
            if self.seen.insert(candidate) {
                return Ok(true);
            }
        }
    }

    fn stats(&self) -> Stats {
        self.inner.stats()
    }
}

/// Membership in a deduplicated set is identical to membership in the
/// underlying set.
pub struct UniqueIndex<R> {
    inner: Box<dyn Index<R>>,
}

impl<R> UniqueIndex<R> {
    #[must_use]
    pub fn new(inner: Box<dyn Index<R>>) -> Self {
        Self { inner }
    }
}

impl<R: Clone> Base<R> for UniqueIndex<R> {
    fn result(&self) -> Option<&R> {
        self.inner.result()
    }

    fn tag_results(&self, tags: &mut TagMap<R>) {
        self.inner.tag_results(tags);
    }

    fn next_path(&mut self, _ctx: &Context) -> Result<bool, IterError> {
        Ok(false)
    }

    fn err(&self) -> Option<&IterError> {
        None
    }

    fn close(&mut self) {
        self.inner.close();
    }
}

impl<R: Clone> Index<R> for UniqueIndex<R> {
    fn contains(&mut self, ctx: &Context, candidate: &R) -> Result<bool, IterError> {
        self.inner.contains(ctx, candidate)
    }

    fn stats(&self) -> Stats {
        self.inner.stats()
    }
}
