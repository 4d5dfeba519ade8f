use crate::base::{Base, Index, Scanner, TagMap};
use crate::context::Context;
use crate::error::IterError;
use quadspan_optimize::{Size, Stats};

/// The empty set (§4.2.12). Never advances, never contains anything.
pub struct NullIter;

impl<R> Base<R> for NullIter {
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

impl<R> Scanner<R> for NullIter {
    fn next(&mut self, _ctx: &Context) -> Result<bool, IterError> {
        Ok(false)
    }

    fn stats(&self) -> Stats {
        Stats::new(0.0, 0.0, Size::exact(0))
    }
}

impl<R> Index<R> for NullIter {
    fn contains(&mut self, _ctx: &Context, _candidate: &R) -> Result<bool, IterError> {
        Ok(false)
    }

    fn stats(&self) -> Stats {
        Stats::new(0.0, 0.0, Size::exact(0))
    }
}
