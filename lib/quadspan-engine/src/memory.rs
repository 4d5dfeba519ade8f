//! The reference in-memory backend: a term/quad interner plus one
//! `BTreeSet` index per [`Direction`], the way `oxrdf::Dataset` keeps
//! `gspo`/`gpos`/`gosp`/`spog` indices over interned terms rather than
//! scanning a flat quad list.
//!
//! Quads and terms are interned to small `u64` tokens the moment they are
//! added by a [`Delta`]; a term the store has never seen resolves to
//! `None` from `name_of` rather than being created implicitly, matching
//! §6.1's round-trip law.

use crate::StoreError;
use quadspan_model::{
    Action, Delta, DeltaError, DeltaErrorKind, Direction, IgnoreOpts, Quad, Ref, Term,
};
use quadspan_iter::{DeltaApplyError, StoreStats};
use quadspan_optimize::Size;
use rustc_hash::FxHashMap;
use std::cell::RefCell;
use std::collections::BTreeSet;
use std::rc::Rc;

type TermId = u64;
type QuadId = u64;

#[derive(Default)]
struct Inner {
    term_ids: FxHashMap<Term, TermId>,
    terms: Vec<Term>,
    quad_ids: FxHashMap<Quad, QuadId>,
    quads: Vec<Quad>,
    /// Every quad id that has a given term id at a given direction.
    by_direction: [FxHashMap<TermId, BTreeSet<QuadId>>; 4],
    live_quads: BTreeSet<QuadId>,
    /// Terms interned are never retracted even after every quad
    /// mentioning them is deleted — no garbage collection, matching
    /// `oxrdf::Dataset`'s own interner.
    live_terms: BTreeSet<TermId>,
}

impl Inner {
    fn direction_index(&self, direction: Direction) -> &FxHashMap<TermId, BTreeSet<QuadId>> {
        &self.by_direction[direction_slot(direction)]
    }

    fn direction_index_mut(
        &mut self,
        direction: Direction,
    ) -> &mut FxHashMap<TermId, BTreeSet<QuadId>> {
        &mut self.by_direction[direction_slot(direction)]
    }

    fn intern_term(&mut self, term: &Term) -> TermId {
        if let Some(id) = self.term_ids.get(term) {
            return *id;
        }
        let id = self.terms.len() as TermId;
        self.terms.push(term.clone());
        self.term_ids.insert(term.clone(), id);
        id
    }

    fn term_id(&self, term: &Term) -> Option<TermId> {
        self.term_ids.get(term).copied()
    }

    fn add_quad(&mut self, quad: &Quad) -> bool {
        if self.quad_ids.contains_key(quad) {
            let id = self.quad_ids[quad];
            return self.live_quads.insert(id);
        }
        let id = self.quads.len() as QuadId;
        self.quads.push(quad.clone());
        self.quad_ids.insert(quad.clone(), id);
        for direction in Direction::ALL {
            let Some(term) = quad.get(direction) else {
                continue;
            };
            let term_id = self.intern_term(term);
            self.live_terms.insert(term_id);
            self.direction_index_mut(direction)
                .entry(term_id)
                .or_default()
                .insert(id);
        }
        self.live_quads.insert(id);
        true
    }

    fn remove_quad(&mut self, quad: &Quad) -> bool {
        let Some(&id) = self.quad_ids.get(quad) else {
            return false;
        };
        self.live_quads.remove(&id)
    }
}

fn direction_slot(direction: Direction) -> usize {
    match direction {
        Direction::Subject => 0,
        Direction::Predicate => 1,
        Direction::Object => 2,
        Direction::Label => 3,
    }
}

/// The reference in-memory [`quadspan_iter::StorageContract`]
/// implementation. Cloning shares the same store (an `Rc<RefCell<_>>>`
/// bump, not a deep copy) — the engine's single-threaded-per-query model
/// (§5) means every operator in a compiled tree can hold its own clone
/// without ever racing another thread for the `RefCell`.
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Rc<RefCell<Inner>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Convenience for building a fixed dataset in tests: applies an `Add`
    /// delta for each quad, panicking on a duplicate (tests are expected to
    /// supply a quad set with no repeats).
    ///
    /// # Panics
    /// Panics if `quads` contains a duplicate.
    pub fn insert_all(&mut self, quads: impl IntoIterator<Item = Quad>) {
        let mut inner = self.inner.borrow_mut();
        for quad in quads {
            assert!(inner.add_quad(&quad), "duplicate quad in insert_all");
        }
    }
}

impl quadspan_iter::StorageContract for MemoryStore {
    type Token = TermId;
    type Error = StoreError;

    fn value_of(&self, r: &Ref<Self::Token>) -> Option<Term> {
        let inner = self.inner.borrow();
        match r {
            Ref::Native(id) => inner.terms.get(*id as usize).cloned(),
            Ref::Hash(_) => None,
        }
    }

    fn name_of(&self, term: &Term) -> Option<Ref<Self::Token>> {
        let inner = self.inner.borrow();
        let id = inner.term_id(term)?;
        inner.live_terms.contains(&id).then(|| Ref::native(id))
    }

    fn quad_of(&self, r: &Ref<Self::Token>) -> Option<Quad> {
        let inner = self.inner.borrow();
        let Ref::Native(id) = r else {
            return None;
        };
        if !inner.live_quads.contains(id) {
            return None;
        }
        inner.quads.get(*id as usize).cloned()
    }

    fn quads_at(
        &self,
        direction: Direction,
        node: &Ref<Self::Token>,
    ) -> Box<dyn Iterator<Item = Ref<Self::Token>>> {
        let inner = self.inner.borrow();
        let Ref::Native(id) = node else {
            return Box::new(std::iter::empty());
        };
        let ids: Vec<QuadId> = inner
            .direction_index(direction)
            .get(id)
            .into_iter()
            .flatten()
            .filter(|qid| inner.live_quads.contains(qid))
            .copied()
            .collect();
        Box::new(ids.into_iter().map(Ref::native))
    }

    fn all_nodes(&self) -> Box<dyn Iterator<Item = Ref<Self::Token>>> {
        let inner = self.inner.borrow();
        let ids: Vec<TermId> = inner.live_terms.iter().copied().collect();
        Box::new(ids.into_iter().map(Ref::native))
    }

    fn all_quads(&self) -> Box<dyn Iterator<Item = Ref<Self::Token>>> {
        let inner = self.inner.borrow();
        let ids: Vec<QuadId> = inner.live_quads.iter().copied().collect();
        Box::new(ids.into_iter().map(Ref::native))
    }

    fn size_at(&self, direction: Direction, node: &Ref<Self::Token>) -> Size {
        let inner = self.inner.borrow();
        let Ref::Native(id) = node else {
            return Size::exact(0);
        };
        let count = inner
            .direction_index(direction)
            .get(id)
            .map_or(0, |ids| ids.iter().filter(|qid| inner.live_quads.contains(qid)).count());
        Size::exact(count as u64)
    }

    fn stats(&self) -> StoreStats {
        let inner = self.inner.borrow();
        StoreStats {
            nodes: Size::exact(inner.live_terms.len() as u64),
            quads: Size::exact(inner.live_quads.len() as u64),
        }
    }

    fn apply_delta(
        &mut self,
        delta: &Delta,
        opts: IgnoreOpts,
    ) -> Result<(), DeltaApplyError<Self::Error>> {
        let mut inner = self.inner.borrow_mut();
        match delta.action {
            Action::Add => {
                if !inner.add_quad(&delta.quad) && !opts.ignore_duplicate {
                    return Err(DeltaApplyError::Delta(DeltaError::new(
                        DeltaErrorKind::QuadExists,
                        delta.clone(),
                    )));
                }
            }
            Action::Delete => {
                if !inner.remove_quad(&delta.quad) && !opts.ignore_missing {
                    return Err(DeltaApplyError::Delta(DeltaError::new(
                        DeltaErrorKind::QuadNotExist,
                        delta.clone(),
                    )));
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quadspan_iter::StorageContract;
    use quadspan_model::Timestamp;

    fn quad(s: &str, o: &str) -> Quad {
        Quad::new(Term::iri(s), Term::iri("p"), Term::iri(o), None).expect("valid quad")
    }

    fn delta(action: Action, q: Quad) -> Delta {
        Delta::new(q, action, Timestamp::from_micros(0), 0)
    }

    #[test]
    fn repeated_terms_intern_to_the_same_id() {
        let mut store = MemoryStore::new();
        store.insert_all([quad("a", "b"), quad("a", "c")]);
        let a1 = store.name_of(&Term::iri("a")).unwrap();
        let a2 = store.name_of(&Term::iri("a")).unwrap();
        assert_eq!(a1, a2);
    }

    #[test]
    fn clone_shares_the_same_underlying_store() {
        let mut store = MemoryStore::new();
        let mirror = store.clone();
        store.insert_all([quad("a", "b")]);
        assert!(mirror.name_of(&Term::iri("a")).is_some());
    }

    #[test]
    fn add_delta_rejects_duplicate_unless_ignored() {
        let mut store = MemoryStore::new();
        store.insert_all([quad("a", "b")]);
        let d = delta(Action::Add, quad("a", "b"));
        assert!(matches!(
            store.apply_delta(&d, IgnoreOpts::default()),
            Err(DeltaApplyError::Delta(_))
        ));
        assert!(store
            .apply_delta(&d, IgnoreOpts { ignore_duplicate: true, ..Default::default() })
            .is_ok());
    }

    #[test]
    fn delete_delta_rejects_missing_quad_unless_ignored() {
        let mut store = MemoryStore::new();
        let d = delta(Action::Delete, quad("a", "b"));
        assert!(matches!(
            store.apply_delta(&d, IgnoreOpts::default()),
            Err(DeltaApplyError::Delta(_))
        ));
        assert!(store
            .apply_delta(&d, IgnoreOpts { ignore_missing: true, ..Default::default() })
            .is_ok());
    }

    #[test]
    fn deleted_quad_drops_from_live_index_but_term_survives() {
        let mut store = MemoryStore::new();
        store.insert_all([quad("a", "b")]);
        let d = delta(Action::Delete, quad("a", "b"));
        store.apply_delta(&d, IgnoreOpts::default()).unwrap();
        let a_ref = store.name_of(&Term::iri("a"));
        assert!(a_ref.is_some(), "terms are never garbage collected");
        assert_eq!(store.quad_of(&a_ref.unwrap()), None);
        assert_eq!(store.stats().quads, Size::exact(0));
    }

    #[test]
    fn unknown_term_resolves_to_no_ref() {
        let store = MemoryStore::new();
        assert!(store.name_of(&Term::iri("nobody")).is_none());
    }
}
