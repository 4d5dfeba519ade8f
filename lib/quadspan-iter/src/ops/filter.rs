use crate::base::{Base, Index, Scanner, TagMap};
use crate::context::Context;
use crate::error::IterError;
use crate::storage::StorageContract;
use quadspan_model::{Ref, Term};
use quadspan_optimize::Stats;
use quadspan_shape::{ComparisonOp, FilterPredicate};
use regex::{escape, Regex};

/// Compiles a [`FilterPredicate`] against a resolved [`Term`] (§4.2.7).
/// Comparisons across term families and unresolvable refs both evaluate
/// to `false` rather than erroring — a filter is expected to quietly
/// narrow a set, never to abort a query over a single malformed value.
pub struct CompiledPredicate {
    predicate: FilterPredicate,
    pattern: Option<Regex>,
}

impl CompiledPredicate {
    #[must_use]
    pub fn compile(predicate: FilterPredicate) -> Self {
        let pattern = match &predicate {
            FilterPredicate::Wildcard(glob) => Regex::new(&wildcard_to_regex(glob)).ok(),
            FilterPredicate::Regex { pattern, .. } => Regex::new(pattern).ok(),
            FilterPredicate::Comparison(..) => None,
        };
        Self { predicate, pattern }
    }

    fn matches(&self, term: &Term) -> bool {
        match &self.predicate {
            FilterPredicate::Comparison(op, value) => compare(term, *op, value),
            FilterPredicate::Wildcard(_) => self.pattern_matches(term, false),
            FilterPredicate::Regex { includes_refs, .. } => {
                self.pattern_matches(term, *includes_refs)
            }
        }
    }

    fn pattern_matches(&self, term: &Term, includes_refs: bool) -> bool {
        let Some(pattern) = &self.pattern else {
            return false;
        };
        let text = match term {
            Term::String(v) | Term::LangString { value: v, .. } | Term::Typed { value: v, .. } => {
                Some(v.as_str())
            }
            Term::Iri(v) | Term::Blank(v) if includes_refs => Some(v.as_str()),
            _ => None,
        };
        text.is_some_and(|text| pattern.is_match(text))
    }
}

fn wildcard_to_regex(glob: &str) -> String {
    let mut out = String::from("^");
    for ch in glob.chars() {
        match ch {
            '%' => out.push_str(".*"),
            '?' => out.push('.'),
            other => out.push_str(&escape(&other.to_string())),
        }
    }
    out.push('$');
    out
}

fn compare(term: &Term, op: ComparisonOp, value: &Term) -> bool {
    let ordering = match (term, value) {
        (Term::Integer(a), Term::Integer(b)) => a.partial_cmp(b),
        (Term::Float(a), Term::Float(b)) => a.partial_cmp(b),
        (Term::Integer(a), Term::Float(b)) => (*a as f64).partial_cmp(&b.get()),
        (Term::Float(a), Term::Integer(b)) => a.get().partial_cmp(&(*b as f64)),
        (Term::Timestamp(a), Term::Timestamp(b)) => a.partial_cmp(b),
        (Term::Boolean(a), Term::Boolean(b)) => a.partial_cmp(b),
        (Term::String(a), Term::String(b)) => a.partial_cmp(b),
        _ if term == value => Some(std::cmp::Ordering::Equal),
        _ => None,
    };
    let Some(ordering) = ordering else {
        return op == ComparisonOp::NotEqual && term != value;
    };
    match op {
        ComparisonOp::Less => ordering.is_lt(),
        ComparisonOp::LessOrEqual => ordering.is_le(),
        ComparisonOp::Greater => ordering.is_gt(),
        ComparisonOp::GreaterOrEqual => ordering.is_ge(),
        ComparisonOp::Equal => ordering.is_eq(),
        ComparisonOp::NotEqual => !ordering.is_eq(),
    }
}

/// Filters `inner` by a compiled predicate over each result's resolved
/// value.
pub struct FilterScanner<S: StorageContract> {
    backend: S,
    inner: Box<dyn Scanner<Ref<S::Token>>>,
    predicate: CompiledPredicate,
}

impl<S: StorageContract> FilterScanner<S> {
    #[must_use]
    pub fn new(
        backend: S,
        inner: Box<dyn Scanner<Ref<S::Token>>>,
        predicate: FilterPredicate,
    ) -> Self {
        Self {
            backend,
            inner,
            predicate: CompiledPredicate::compile(predicate),
        }
    }
}

impl<S: StorageContract> Base<Ref<S::Token>> for FilterScanner<S> {
    fn result(&self) -> Option<&Ref<S::Token>> {
        self.inner.result()
    }

    fn tag_results(&self, tags: &mut TagMap<Ref<S::Token>>) {
        self.inner.tag_results(tags);
    }

    fn next_path(&mut self, ctx: &Context) -> Result<bool, IterError> {
        self.inner.next_path(ctx)
    }

    fn err(&self) -> Option<&IterError> {
        self.inner.err()
    }

    fn close(&mut self) {
        self.inner.close();
    }
}

impl<S: StorageContract> Scanner<Ref<S::Token>> for FilterScanner<S> {
    fn next(&mut self, ctx: &Context) -> Result<bool, IterError> {
        loop {
            ctx.check_cancelled()?;
            if !self.inner.next(ctx)? {
                return Ok(false);
            }
            let Some(candidate) = self.inner.result() else {
                continue;
            };
            let Some(value) = self.backend.value_of(candidate) else {
                continue;
            };
            if self.predicate.matches(&value) {
                return Ok(true);
            }
        }
    }

    fn stats(&self) -> Stats {
        self.inner.stats()
    }
}

/// Membership test mirroring [`FilterScanner`].
pub struct FilterIndex<S: StorageContract> {
    backend: S,
    inner: Box<dyn Index<Ref<S::Token>>>,
    predicate: CompiledPredicate,
}

impl<S: StorageContract> FilterIndex<S> {
    #[must_use]
    pub fn new(
        backend: S,
        inner: Box<dyn Index<Ref<S::Token>>>,
        predicate: FilterPredicate,
    ) -> Self {
        Self {
            backend,
            inner,
            predicate: CompiledPredicate::compile(predicate),
        }
    }
}

impl<S: StorageContract> Base<Ref<S::Token>> for FilterIndex<S> {
    fn result(&self) -> Option<&Ref<S::Token>> {
        self.inner.result()
    }

    fn tag_results(&self, tags: &mut TagMap<Ref<S::Token>>) {
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

impl<S: StorageContract> Index<Ref<S::Token>> for FilterIndex<S> {
    fn contains(&mut self, ctx: &Context, candidate: &Ref<S::Token>) -> Result<bool, IterError> {
        if !self.inner.contains(ctx, candidate)? {
            return Ok(false);
        }
        let Some(value) = self.backend.value_of(candidate) else {
            return Ok(false);
        };
        Ok(self.predicate.matches(&value))
    }

    fn stats(&self) -> Stats {
        self.inner.stats()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wildcard_translates_percent_and_question_mark() {
        let re = Regex::new(&wildcard_to_regex("a%c?")).unwrap();
        assert!(re.is_match("abbcX"));
        assert!(!re.is_match("abbc"));
    }

    #[test]
    fn comparison_across_families_is_false_not_equal() {
        assert!(!compare(&Term::Integer(1), ComparisonOp::Equal, &Term::string("1")));
    }

    #[test]
    fn comparison_orders_integers() {
        assert!(compare(&Term::Integer(1), ComparisonOp::Less, &Term::Integer(2)));
        assert!(!compare(&Term::Integer(2), ComparisonOp::Less, &Term::Integer(2)));
    }
}
