use crate::base::{Base, Index, Scanner, TagMap};
use crate::context::Context;
use crate::error::IterError;
use crate::storage::StorageContract;
use quadspan_model::{Direction, Ref};
use quadspan_optimize::Stats;
use quadspan_shape::Tag;

type BoxScanner<S> = Box<dyn Scanner<Ref<<S as StorageContract>::Token>>>;
type BoxIndex<S> = Box<dyn Index<Ref<<S as StorageContract>::Token>>>;

fn opposite(direction: Direction) -> Direction {
    match direction {
        Direction::Subject => Direction::Object,
        Direction::Object => Direction::Subject,
        Direction::Predicate => Direction::Predicate,
        Direction::Label => Direction::Label,
    }
}

/// Passes `inner` through unchanged while recording a tag (§4.2.6,
/// §4.2.8). With no `predicate`, the tag is the ref itself; with a
/// `predicate`, the tag is the other end of a quad that has the ref at
/// `direction` and whose predicate is accepted by `predicate`, the other
/// end taken from `direction`'s opposite (or `direction` itself when
/// `reverse` is set). A driving ref with several justifying quads is
/// revisited once per witness via [`Base::next_path`]; one with none is
/// dropped unless `optional` is set, in which case it is still emitted
/// with no tag recorded.
pub struct SaveScanner<S: StorageContract> {
    backend: S,
    inner: BoxScanner<S>,
    predicate: Option<BoxIndex<S>>,
    direction: Direction,
    tag: Tag,
    reverse: bool,
    optional: bool,
    witnesses: Vec<Ref<S::Token>>,
    witness_pos: usize,
}

impl<S: StorageContract> SaveScanner<S> {
    #[must_use]
    pub fn new(
        backend: S,
        inner: BoxScanner<S>,
        predicate: Option<BoxIndex<S>>,
        direction: Direction,
        tag: Tag,
        reverse: bool,
        optional: bool,
    ) -> Self {
        Self {
            backend,
            inner,
            predicate,
            direction,
            tag,
            reverse,
            optional,
            witnesses: Vec::new(),
            witness_pos: 0,
        }
    }

    fn compute_witnesses(&mut self, ctx: &Context, node: &Ref<S::Token>) -> Result<(), IterError> {
        self.witnesses.clear();
        self.witness_pos = 0;
        let Some(predicate) = &mut self.predicate else {
            self.witnesses.push(node.clone());
            return Ok(());
        };
        let target = if self.reverse {
            self.direction
        } else {
            opposite(self.direction)
        };
        for quad_ref in self.backend.quads_at(self.direction, node) {
            ctx.check_cancelled()?;
            let Some(quad) = self.backend.quad_of(&quad_ref) else {
                continue;
            };
            let Some(pred_ref) = self.backend.name_of(quad.predicate()) else {
                continue;
            };
            if !predicate.contains(ctx, &pred_ref)? {
                continue;
            }
            let Some(target_term) = quad.get(target) else {
                continue;
            };
            if let Some(target_ref) = self.backend.name_of(target_term) {
                self.witnesses.push(target_ref);
            }
        }
        Ok(())
    }
}

impl<S: StorageContract> Base<Ref<S::Token>> for SaveScanner<S> {
    fn result(&self) -> Option<&Ref<S::Token>> {
        self.inner.result()
    }

    fn tag_results(&self, tags: &mut TagMap<Ref<S::Token>>) {
        self.inner.tag_results(tags);
        if self.witness_pos > 0 {
            if let Some(value) = self.witnesses.get(self.witness_pos - 1) {
                tags.insert(self.tag.clone(), value.clone());
            }
        }
    }

    fn next_path(&mut self, ctx: &Context) -> Result<bool, IterError> {
        if self.witness_pos < self.witnesses.len() {
            self.witness_pos += 1;
            Ok(true)
        } else {
            self.inner.next_path(ctx)
        }
    }

    fn err(&self) -> Option<&IterError> {
        self.inner.err()
    }

    fn close(&mut self) {
        self.inner.close();
        if let Some(p) = &mut self.predicate {
            p.close();
        }
    }
}

impl<S: StorageContract> Scanner<Ref<S::Token>> for SaveScanner<S> {
    fn next(&mut self, ctx: &Context) -> Result<bool, IterError> {
        loop {
            if self.witness_pos < self.witnesses.len() {
                self.witness_pos += 1;
                return Ok(true);
            }
            ctx.check_cancelled()?;
            if !self.inner.next(ctx)? {
                return Ok(false);
            }
            let Some(node) = self.inner.result().cloned() else {
                continue;
            };
            self.compute_witnesses(ctx, &node)?;
            if self.witnesses.is_empty() {
                if self.optional {
                    return Ok(true);
                }
                continue;
            }
        }
    }

    fn stats(&self) -> Stats {
        self.inner.stats()
    }
}

/// Membership test for `Save`: mirrors `SaveScanner`'s witness rule for a
/// single candidate rather than a stream — with a `predicate`, membership
/// additionally requires a witness unless `optional` is set, and the first
/// witness found is recorded under `tag` so a `Save` used as a
/// non-driving `Quads` check still contributes to the tag map.
pub struct SaveIndex<S: StorageContract> {
    backend: S,
    inner: BoxIndex<S>,
    predicate: Option<BoxIndex<S>>,
    direction: Direction,
    tag: Tag,
    reverse: bool,
    optional: bool,
    witnesses: Vec<Ref<S::Token>>,
    witness_pos: usize,
}

impl<S: StorageContract> SaveIndex<S> {
    #[must_use]
    pub fn new(
        backend: S,
        inner: BoxIndex<S>,
        predicate: Option<BoxIndex<S>>,
        direction: Direction,
        tag: Tag,
        reverse: bool,
        optional: bool,
    ) -> Self {
        Self {
            backend,
            inner,
            predicate,
            direction,
            tag,
            reverse,
            optional,
            witnesses: Vec::new(),
            witness_pos: 0,
        }
    }

    fn compute_witnesses(&mut self, ctx: &Context, node: &Ref<S::Token>) -> Result<(), IterError> {
        self.witnesses.clear();
        self.witness_pos = 0;
        let Some(predicate) = &mut self.predicate else {
            self.witnesses.push(node.clone());
            return Ok(());
        };
        let target = if self.reverse {
            self.direction
        } else {
            opposite(self.direction)
        };
        for quad_ref in self.backend.quads_at(self.direction, node) {
            ctx.check_cancelled()?;
            let Some(quad) = self.backend.quad_of(&quad_ref) else {
                continue;
            };
            let Some(pred_ref) = self.backend.name_of(quad.predicate()) else {
                continue;
            };
            if !predicate.contains(ctx, &pred_ref)? {
                continue;
            }
            let Some(target_term) = quad.get(target) else {
                continue;
            };
            if let Some(target_ref) = self.backend.name_of(target_term) {
                self.witnesses.push(target_ref);
            }
        }
        Ok(())
    }
}

impl<S: StorageContract> Base<Ref<S::Token>> for SaveIndex<S> {
    fn result(&self) -> Option<&Ref<S::Token>> {
        self.inner.result()
    }

    fn tag_results(&self, tags: &mut TagMap<Ref<S::Token>>) {
        self.inner.tag_results(tags);
        if self.witness_pos > 0 {
            if let Some(value) = self.witnesses.get(self.witness_pos - 1) {
                tags.insert(self.tag.clone(), value.clone());
            }
        }
    }

    fn next_path(&mut self, _ctx: &Context) -> Result<bool, IterError> {
        if self.witness_pos < self.witnesses.len() {
            self.witness_pos += 1;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    fn err(&self) -> Option<&IterError> {
        None
    }

    fn close(&mut self) {
        self.inner.close();
        if let Some(p) = &mut self.predicate {
            p.close();
        }
    }
}

impl<S: StorageContract> Index<Ref<S::Token>> for SaveIndex<S> {
    fn contains(&mut self, ctx: &Context, candidate: &Ref<S::Token>) -> Result<bool, IterError> {
        self.witnesses.clear();
        self.witness_pos = 0;
        if !self.inner.contains(ctx, candidate)? {
            return Ok(false);
        }
        self.compute_witnesses(ctx, candidate)?;
        if self.witnesses.is_empty() {
            return Ok(self.optional);
        }
        self.witness_pos = 1;
        Ok(true)
    }

    fn stats(&self) -> Stats {
        self.inner.stats()
    }
}
