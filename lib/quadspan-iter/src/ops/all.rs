use crate::base::{Base, Index, Scanner, TagMap};
use crate::context::Context;
use crate::error::IterError;
use crate::storage::StorageContract;
use quadspan_model::Ref;
use quadspan_optimize::{Size, Stats};

/// Every node, or every quad, the backend exposes (§3 `Shape::AllNodes` /
/// `Shape::AllQuads`). Scans the backend's enumeration lazily; `contains`
/// degrades to re-scanning, since membership in "everything" only needs a
/// cheap backend round trip (`value_of`) rather than a linear walk — a
/// backend wanting better is expected to use `native_scan`.
pub struct AllIter<S: StorageContract> {
    source: Box<dyn Iterator<Item = Ref<S::Token>>>,
    current: Option<Ref<S::Token>>,
    total: Size,
}

impl<S: StorageContract> AllIter<S> {
    pub fn nodes(backend: &S) -> Self {
        Self {
            source: backend.all_nodes(),
            current: None,
            total: backend.stats().nodes,
        }
    }

    pub fn quads(backend: &S) -> Self {
        Self {
            source: backend.all_quads(),
            current: None,
            total: backend.stats().quads,
        }
    }
}

impl<S: StorageContract> Base<Ref<S::Token>> for AllIter<S> {
    fn result(&self) -> Option<&Ref<S::Token>> {
        self.current.as_ref()
    }

    fn tag_results(&self, _tags: &mut TagMap<Ref<S::Token>>) {}

    fn next_path(&mut self, _ctx: &Context) -> Result<bool, IterError> {
        Ok(false)
    }

    fn err(&self) -> Option<&IterError> {
        None
    }

    fn close(&mut self) {
        self.current = None;
    }
}

impl<S: StorageContract> Scanner<Ref<S::Token>> for AllIter<S> {
    fn next(&mut self, ctx: &Context) -> Result<bool, IterError> {
        ctx.check_cancelled()?;
        self.current = self.source.next();
        Ok(self.current.is_some())
    }

    fn stats(&self) -> Stats {
        Stats::new(1.0, 1.0, self.total)
    }
}

/// A fresh backend-backed existence check per `contains` call: `value_of`
/// confirming the candidate actually resolves is sufficient, since every
/// ref a backend ever hands out is, by construction, a member of "all".
pub struct AllIndex<S: StorageContract> {
    backend: S,
    current: Option<Ref<S::Token>>,
    total: Size,
}

impl<S: StorageContract> AllIndex<S> {
    pub fn nodes(backend: S) -> Self {
        let total = backend.stats().nodes;
        Self {
            backend,
            current: None,
            total,
        }
    }

    pub fn quads(backend: S) -> Self {
        let total = backend.stats().quads;
        Self {
            backend,
            current: None,
            total,
        }
    }
}

impl<S: StorageContract> Base<Ref<S::Token>> for AllIndex<S> {
    fn result(&self) -> Option<&Ref<S::Token>> {
        self.current.as_ref()
    }

    fn tag_results(&self, _tags: &mut TagMap<Ref<S::Token>>) {}

    fn next_path(&mut self, _ctx: &Context) -> Result<bool, IterError> {
        Ok(false)
    }

    fn err(&self) -> Option<&IterError> {
        None
    }

    fn close(&mut self) {
        self.current = None;
    }
}

impl<S: StorageContract> Index<Ref<S::Token>> for AllIndex<S> {
    fn contains(&mut self, ctx: &Context, candidate: &Ref<S::Token>) -> Result<bool, IterError> {
        ctx.check_cancelled()?;
        let present = self.backend.value_of(candidate).is_some();
        self.current = present.then(|| candidate.clone());
        Ok(present)
    }

    fn stats(&self) -> Stats {
        Stats::new(1.0, 1.0, self.total)
    }
}
