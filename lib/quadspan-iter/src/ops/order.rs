use crate::base::{Base, Scanner, TagMap};
use crate::context::Context;
use crate::error::IterError;
use crate::storage::StorageContract;
use quadspan_model::Ref;
use quadspan_optimize::{Size, Stats};

/// Materializes and sorts `inner`'s results by the string form of the
/// resolved value (§4.2.10). Refs the backend can no longer resolve sort
/// last, in encounter order among themselves, rather than being dropped —
/// a missing value is still a value for ordering purposes.
pub struct OrderScanner<S: StorageContract> {
    backend: S,
    inner: Option<Box<dyn Scanner<Ref<S::Token>>>>,
    materialized: Option<Vec<(Ref<S::Token>, TagMap<Ref<S::Token>>)>>,
    position: usize,
}

impl<S: StorageContract> OrderScanner<S> {
    #[must_use]
    pub fn new(backend: S, inner: Box<dyn Scanner<Ref<S::Token>>>) -> Self {
        Self {
            backend,
            inner: Some(inner),
            materialized: None,
            position: 0,
        }
    }

    fn materialize(&mut self, ctx: &Context) -> Result<(), IterError> {
        let mut inner = self.inner.take().expect("materialize called once");
        let mut items = Vec::new();
        while inner.next(ctx)? {
            if let Some(r) = inner.result().cloned() {
                let mut tags = TagMap::default();
                inner.tag_results(&mut tags);
                items.push((r, tags));
            }
        }
        inner.close();
        items.sort_by(|(a, _), (b, _)| {
            let key_a = self.backend.value_of(a).map(|t| t.to_wire_form());
            let key_b = self.backend.value_of(b).map(|t| t.to_wire_form());
            compare_keys(&key_a, &key_b)
        });
        self.materialized = Some(items);
        Ok(())
    }
}

/// Orders two resolved sort keys, with `None` (an unresolvable ref)
/// sorting last rather than first — `Option::cmp` alone puts `None`
/// before every `Some`, so "is missing" is compared ahead of the key
/// itself to invert that for this module's "unresolvable sorts last"
/// contract.
fn compare_keys(a: &Option<String>, b: &Option<String>) -> std::cmp::Ordering {
    a.is_none().cmp(&b.is_none()).then_with(|| a.cmp(b))
}

impl<S: StorageContract> Base<Ref<S::Token>> for OrderScanner<S> {
    fn result(&self) -> Option<&Ref<S::Token>> {
        self.materialized
            .as_ref()
            .and_then(|items| self.position.checked_sub(1).and_then(|i| items.get(i)))
            .map(|(r, _)| r)
    }

    fn tag_results(&self, tags: &mut TagMap<Ref<S::Token>>) {
        let Some(items) = &self.materialized else { return };
        let Some(i) = self.position.checked_sub(1) else { return };
        if let Some((_, captured)) = items.get(i) {
            tags.extend(captured.iter().map(|(k, v)| (k.clone(), v.clone())));
        }
    }

    fn next_path(&mut self, _ctx: &Context) -> Result<bool, IterError> {
        Ok(false)
    }

    fn err(&self) -> Option<&IterError> {
        None
    }

    fn close(&mut self) {
        if let Some(items) = &mut self.materialized {
            self.position = items.len();
        }
    }
}

impl<S: StorageContract> Scanner<Ref<S::Token>> for OrderScanner<S> {
    fn next(&mut self, ctx: &Context) -> Result<bool, IterError> {
        if self.materialized.is_none() {
            self.materialize(ctx)?;
        }
        let len = self.materialized.as_ref().map_or(0, Vec::len);
        if self.position < len {
            self.position += 1;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    fn stats(&self) -> Stats {
        let size = self
            .materialized
            .as_ref()
            .map_or(Size::estimate(0), |items| Size::exact(items.len() as u64));
        Stats::new(1.0, f64::INFINITY, size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{DeltaApplyError, StoreStats};
    use quadspan_model::{Delta, IgnoreOpts, Quad, Term};
    use quadspan_optimize::Size;
    use quadspan_shape::Tag;
    use std::convert::Infallible;

    #[test]
    fn unresolvable_refs_sort_after_resolvable_ones() {
        let resolvable = Some("a".to_string());
        let unresolvable = None;
        assert_eq!(
            compare_keys(&unresolvable, &resolvable),
            std::cmp::Ordering::Greater
        );
        assert_eq!(
            compare_keys(&resolvable, &unresolvable),
            std::cmp::Ordering::Less
        );
    }

    #[test]
    fn unresolvable_refs_compare_equal_among_themselves() {
        assert_eq!(compare_keys(&None, &None), std::cmp::Ordering::Equal);
    }

    #[derive(Clone, Default)]
    struct FakeBackend {
        values: std::rc::Rc<Vec<(u64, Term)>>,
    }

    impl StorageContract for FakeBackend {
        type Token = u64;
        type Error = Infallible;

        fn value_of(&self, r: &Ref<Self::Token>) -> Option<Term> {
            let Ref::Native(id) = r else { return None };
            self.values.iter().find(|(i, _)| i == id).map(|(_, t)| t.clone())
        }
        fn name_of(&self, _term: &Term) -> Option<Ref<Self::Token>> {
            None
        }
        fn quad_of(&self, _r: &Ref<Self::Token>) -> Option<Quad> {
            None
        }
        fn quads_at(
            &self,
            _direction: quadspan_model::Direction,
            _node: &Ref<Self::Token>,
        ) -> Box<dyn Iterator<Item = Ref<Self::Token>>> {
            Box::new(std::iter::empty())
        }
        fn all_nodes(&self) -> Box<dyn Iterator<Item = Ref<Self::Token>>> {
            Box::new(std::iter::empty())
        }
        fn all_quads(&self) -> Box<dyn Iterator<Item = Ref<Self::Token>>> {
            Box::new(std::iter::empty())
        }
        fn size_at(&self, _direction: quadspan_model::Direction, _node: &Ref<Self::Token>) -> Size {
            Size::exact(0)
        }
        fn stats(&self) -> StoreStats {
            StoreStats { nodes: Size::exact(0), quads: Size::exact(0) }
        }
        fn apply_delta(
            &mut self,
            _delta: &Delta,
            _opts: IgnoreOpts,
        ) -> Result<(), DeltaApplyError<Self::Error>> {
            Ok(())
        }
    }

    /// A fixed sequence of tagged results standing in for a compiled
    /// sub-tree, the way a hand-rolled test double exercises an operator
    /// without pulling in the full shape compiler.
    struct FakeScanner {
        items: Vec<(Ref<u64>, TagMap<Ref<u64>>)>,
        pos: usize,
    }

    impl Base<Ref<u64>> for FakeScanner {
        fn result(&self) -> Option<&Ref<u64>> {
            self.pos.checked_sub(1).and_then(|i| self.items.get(i)).map(|(r, _)| r)
        }
        fn tag_results(&self, tags: &mut TagMap<Ref<u64>>) {
            if let Some(i) = self.pos.checked_sub(1) {
                if let Some((_, captured)) = self.items.get(i) {
                    tags.extend(captured.iter().map(|(k, v)| (k.clone(), v.clone())));
                }
            }
        }
        fn next_path(&mut self, _ctx: &Context) -> Result<bool, IterError> {
            Ok(false)
        }
        fn err(&self) -> Option<&IterError> {
            None
        }
        fn close(&mut self) {}
    }

    impl Scanner<Ref<u64>> for FakeScanner {
        fn next(&mut self, _ctx: &Context) -> Result<bool, IterError> {
            if self.pos < self.items.len() {
                self.pos += 1;
                Ok(true)
            } else {
                Ok(false)
            }
        }
        fn stats(&self) -> Stats {
            Stats::new(1.0, f64::INFINITY, Size::exact(self.items.len() as u64))
        }
    }

    #[test]
    fn order_threads_tags_captured_upstream() {
        let backend = FakeBackend {
            values: std::rc::Rc::new(vec![(1, Term::string("b")), (2, Term::string("a"))]),
        };
        let tag = Tag::new("who");
        let mut tags_for_1 = TagMap::default();
        tags_for_1.insert(tag.clone(), Ref::native(100u64));
        let mut tags_for_2 = TagMap::default();
        tags_for_2.insert(tag.clone(), Ref::native(200u64));
        let inner = FakeScanner {
            items: vec![
                (Ref::native(1u64), tags_for_1),
                (Ref::native(2u64), tags_for_2),
            ],
            pos: 0,
        };
        let mut order = OrderScanner::new(backend, Box::new(inner));
        let ctx = Context::new();

        assert!(order.next(&ctx).unwrap());
        assert_eq!(order.result(), Some(&Ref::native(2u64)));
        let mut tags = TagMap::default();
        order.tag_results(&mut tags);
        assert_eq!(tags.get(&tag), Some(&Ref::native(200u64)));

        assert!(order.next(&ctx).unwrap());
        assert_eq!(order.result(), Some(&Ref::native(1u64)));
        let mut tags = TagMap::default();
        order.tag_results(&mut tags);
        assert_eq!(tags.get(&tag), Some(&Ref::native(100u64)));

        assert!(!order.next(&ctx).unwrap());
    }
}
