use crate::base::{Base, Index, Scanner, TagMap};
use crate::context::Context;
use crate::error::IterError;
use crate::storage::StorageContract;
use quadspan_model::{Ref, Term};
use quadspan_optimize::{Size, Stats};

/// Resolves a literal [`Term`] to its backend ref (§3 `Shape::Lookup`).
/// Empty if the term is unknown to the backend — this is the one leaf
/// whose entire result set is computed eagerly, since resolving a single
/// term is already the cheapest possible backend call.
pub struct LookupIter<R> {
    resolved: Option<R>,
    emitted: bool,
}

impl<T> LookupIter<Ref<T>> {
    pub fn resolve<S: StorageContract<Token = T>>(backend: &S, term: &Term) -> Self {
        Self {
            resolved: backend.name_of(term),
            emitted: false,
        }
    }
}

impl<R: Clone> Base<R> for LookupIter<R> {
    fn result(&self) -> Option<&R> {
        if self.emitted {
            self.resolved.as_ref()
        } else {
            None
        }
    }

    fn tag_results(&self, _tags: &mut TagMap<R>) {}

    fn next_path(&mut self, _ctx: &Context) -> Result<bool, IterError> {
        Ok(false)
    }

    fn err(&self) -> Option<&IterError> {
        None
    }

    fn close(&mut self) {
        self.emitted = true;
    }
}

impl<R: Clone> Scanner<R> for LookupIter<R> {
    fn next(&mut self, _ctx: &Context) -> Result<bool, IterError> {
        if !self.emitted && self.resolved.is_some() {
            self.emitted = true;
            Ok(true)
        } else {
            self.emitted = true;
            Ok(false)
        }
    }

    fn stats(&self) -> Stats {
        Stats::new(1.0, 1.0, Size::exact(u64::from(self.resolved.is_some())))
    }
}

impl<R: Clone + PartialEq> Index<R> for LookupIter<R> {
    fn contains(&mut self, _ctx: &Context, candidate: &R) -> Result<bool, IterError> {
        let matched = self.resolved.as_ref() == Some(candidate);
        if matched {
            self.emitted = true;
        }
        Ok(matched)
    }

    fn stats(&self) -> Stats {
        Stats::new(1.0, 1.0, Size::exact(u64::from(self.resolved.is_some())))
    }
}
