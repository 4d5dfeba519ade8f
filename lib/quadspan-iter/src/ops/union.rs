use crate::base::{Base, Index, Scanner, TagMap};
use crate::context::Context;
use crate::error::IterError;
use quadspan_optimize::{Size, Stats};

/// A set union (§4.2.4): each member scanner is exhausted in turn.
/// Members may produce overlapping refs — `Unique` is the caller's job if
/// deduplication is wanted.
pub struct UnionScanner<R> {
    members: Vec<Box<dyn Scanner<R>>>,
    active: usize,
    current: Option<R>,
}

impl<R> UnionScanner<R> {
    #[must_use]
    pub fn new(members: Vec<Box<dyn Scanner<R>>>) -> Self {
        Self {
            members,
            active: 0,
            current: None,
        }
    }
}

impl<R: Clone> Base<R> for UnionScanner<R> {
    fn result(&self) -> Option<&R> {
        self.current.as_ref()
    }

    fn tag_results(&self, tags: &mut TagMap<R>) {
        if let Some(member) = self.members.get(self.active) {
            member.tag_results(tags);
        }
    }

    fn next_path(&mut self, ctx: &Context) -> Result<bool, IterError> {
        if let Some(member) = self.members.get_mut(self.active) {
            member.next_path(ctx)
        } else {
            Ok(false)
        }
    }

    fn err(&self) -> Option<&IterError> {
        self.members.get(self.active).and_then(|m| m.err())
    }

    fn close(&mut self) {
        for member in &mut self.members {
            member.close();
        }
    }
}

impl<R: Clone> Scanner<R> for UnionScanner<R> {
    fn next(&mut self, ctx: &Context) -> Result<bool, IterError> {
        loop {
            ctx.check_cancelled()?;
            let Some(member) = self.members.get_mut(self.active) else {
                return Ok(false);
            };
            if member.next(ctx)? {
                self.current = member.result().cloned();
                return Ok(true);
            }
            self.active += 1;
        }
    }

    fn stats(&self) -> Stats {
        let mut next_cost = 0.0;
        let mut contains_cost = 0.0;
        let mut total: u64 = 0;
        let mut exact = true;
        for member in &self.members {
            let s = member.stats();
            next_cost += s.next_cost;
            contains_cost += s.contains_cost;
            total += s.size.value;
            exact &= s.size.exact;
        }
        let size = if exact {
            Size::exact(total)
        } else {
            Size::estimate(total)
        };
        Stats::new(next_cost, contains_cost, size)
    }
}

/// `contains` holds if any member accepts the candidate.
pub struct UnionIndex<R> {
    members: Vec<Box<dyn Index<R>>>,
    current: Option<R>,
    /// Which member last reported `contains`, remembered so `next_path`
    /// can continue from there (§4.2.4: "remembering which branch was the
    /// witness so nextPath can continue there").
    matched: Option<usize>,
}

impl<R> UnionIndex<R> {
    #[must_use]
    pub fn new(members: Vec<Box<dyn Index<R>>>) -> Self {
        Self {
            members,
            current: None,
            matched: None,
        }
    }
}

impl<R: Clone> Base<R> for UnionIndex<R> {
    fn result(&self) -> Option<&R> {
        self.current.as_ref()
    }

    fn tag_results(&self, tags: &mut TagMap<R>) {
        if let Some(index) = self.matched {
            self.members[index].tag_results(tags);
        }
    }

    fn next_path(&mut self, ctx: &Context) -> Result<bool, IterError> {
        let Some(index) = self.matched else {
            return Ok(false);
        };
        if self.members[index].next_path(ctx)? {
            return Ok(true);
        }
        let Some(candidate) = self.current.clone() else {
            return Ok(false);
        };
        for (next_index, member) in self.members.iter_mut().enumerate().skip(index + 1) {
            if member.contains(ctx, &candidate)? {
                self.matched = Some(next_index);
                return Ok(true);
            }
        }
        Ok(false)
    }

    fn err(&self) -> Option<&IterError> {
        None
    }

    fn close(&mut self) {
        for member in &mut self.members {
            member.close();
        }
    }
}

impl<R: Clone> Index<R> for UnionIndex<R> {
    fn contains(&mut self, ctx: &Context, candidate: &R) -> Result<bool, IterError> {
        self.matched = None;
        for (index, member) in self.members.iter_mut().enumerate() {
            if member.contains(ctx, candidate)? {
                self.current = Some(candidate.clone());
                self.matched = Some(index);
                return Ok(true);
            }
        }
        Ok(false)
    }

    fn stats(&self) -> Stats {
        let contains_cost: f64 = self.members.iter().map(|m| m.stats().contains_cost).sum();
        let size = self
            .members
            .iter()
            .map(|m| m.stats().size)
            .fold(Size::exact(0), |acc, s| Size {
                value: acc.value + s.value,
                exact: acc.exact && s.exact,
            });
        Stats::new(1.0, contains_cost, size)
    }
}
