use crate::base::{Base, Index, Scanner, TagMap};
use crate::context::Context;
use crate::error::IterError;
use quadspan_model::{Ref, Term};
use quadspan_optimize::{Size, Stats};

/// Materializes the cardinality of `inner` (§4.2.9, terminal). The count
/// itself is exposed as a single ref via the universal content-hash
/// fallback (`Ref::from_wire_form`), since a cardinality has no backend
/// token of its own — the same fallback `Fixed` set literals use.
pub struct CountScanner<B> {
    inner: Box<dyn Scanner<Ref<B>>>,
    result: Option<Ref<B>>,
    done: bool,
}

impl<B> CountScanner<B> {
    #[must_use]
    pub fn new(inner: Box<dyn Scanner<Ref<B>>>) -> Self {
        Self {
            inner,
            result: None,
            done: false,
        }
    }
}

impl<B: Clone> Base<Ref<B>> for CountScanner<B> {
    fn result(&self) -> Option<&Ref<B>> {
        self.result.as_ref()
    }

    fn tag_results(&self, _tags: &mut TagMap<Ref<B>>) {}

    fn next_path(&mut self, _ctx: &Context) -> Result<bool, IterError> {
        Ok(false)
    }

    fn err(&self) -> Option<&IterError> {
        self.inner.err()
    }

    fn close(&mut self) {
        self.inner.close();
    }
}

impl<B: Clone> Scanner<Ref<B>> for CountScanner<B> {
    fn next(&mut self, ctx: &Context) -> Result<bool, IterError> {
        if self.done {
            return Ok(false);
        }
        let mut count: i64 = 0;
        while self.inner.next(ctx)? {
            count += 1;
        }
        self.result = Some(Ref::from_wire_form(&Term::Integer(count).to_wire_form()));
        self.done = true;
        Ok(true)
    }

    fn stats(&self) -> Stats {
        Stats::new(self.inner.stats().size.value as f64, 1.0, Size::exact(1))
    }
}

/// `contains(candidate)` holds iff `candidate` is the one ref this count
/// ever produces.
pub struct CountIndex<B: PartialEq> {
    scanner: CountScanner<B>,
}

impl<B: PartialEq> CountIndex<B> {
    #[must_use]
    pub fn new(inner: Box<dyn Scanner<Ref<B>>>) -> Self {
        Self {
            scanner: CountScanner::new(inner),
        }
    }
}

impl<B: Clone + PartialEq> Base<Ref<B>> for CountIndex<B> {
    fn result(&self) -> Option<&Ref<B>> {
        self.scanner.result()
    }

    fn tag_results(&self, _tags: &mut TagMap<Ref<B>>) {}

    fn next_path(&mut self, _ctx: &Context) -> Result<bool, IterError> {
        Ok(false)
    }

    fn err(&self) -> Option<&IterError> {
        self.scanner.err()
    }

    fn close(&mut self) {
        self.scanner.close();
    }
}

impl<B: Clone + PartialEq> Index<Ref<B>> for CountIndex<B> {
    fn contains(&mut self, ctx: &Context, candidate: &Ref<B>) -> Result<bool, IterError> {
        self.scanner.next(ctx)?;
        Ok(self.scanner.result() == Some(candidate))
    }

    fn stats(&self) -> Stats {
        self.scanner.stats()
    }
}
