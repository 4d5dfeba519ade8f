use crate::base::{Base, Index, Scanner, TagMap};
use crate::context::Context;
use crate::error::IterError;
use quadspan_optimize::{Size, Stats};
use std::fmt::Debug;

/// A literal, caller-supplied set (§3 `Shape::Fixed`). Scans in insertion
/// order; `contains` is a linear scan since a fixed set is expected to be
/// small (the optimizer never picks it as a scan driver over a backend
/// index for that reason).
pub struct FixedIter<R> {
    values: Vec<R>,
    position: usize,
}

impl<R> FixedIter<R> {
    #[must_use]
    pub fn new(values: Vec<R>) -> Self {
        Self {
            values,
            position: 0,
        }
    }
}

impl<R: Clone> Base<R> for FixedIter<R> {
    fn result(&self) -> Option<&R> {
        self.position
            .checked_sub(1)
            .and_then(|i| self.values.get(i))
    }

    fn tag_results(&self, _tags: &mut TagMap<R>) {}

    fn next_path(&mut self, _ctx: &Context) -> Result<bool, IterError> {
        Ok(false)
    }

    fn err(&self) -> Option<&IterError> {
        None
    }

    fn close(&mut self) {
        self.position = self.values.len();
    }
}

impl<R: Clone> Scanner<R> for FixedIter<R> {
    fn next(&mut self, _ctx: &Context) -> Result<bool, IterError> {
        if self.position < self.values.len() {
            self.position += 1;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    fn stats(&self) -> Stats {
        let n = self.values.len() as f64;
        Stats::new(1.0, n, Size::exact(self.values.len() as u64))
    }
}

impl<R: Clone + PartialEq + Debug> Index<R> for FixedIter<R> {
    fn contains(&mut self, _ctx: &Context, candidate: &R) -> Result<bool, IterError> {
        if let Some(i) = self.values.iter().position(|v| v == candidate) {
            self.position = i + 1;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    fn stats(&self) -> Stats {
        let n = self.values.len() as f64;
        Stats::new(1.0, n, Size::exact(self.values.len() as u64))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scans_in_insertion_order() {
        let mut it = FixedIter::new(vec![1, 2, 3]);
        let ctx = Context::new();
        assert!(it.next(&ctx).unwrap());
        assert_eq!(it.result(), Some(&1));
        assert!(it.next(&ctx).unwrap());
        assert_eq!(it.result(), Some(&2));
    }

    #[test]
    fn contains_finds_member() {
        let mut it = FixedIter::new(vec![1, 2, 3]);
        let ctx = Context::new();
        assert!(it.contains(&ctx, &2).unwrap());
        assert!(!it.contains(&ctx, &9).unwrap());
    }
}
