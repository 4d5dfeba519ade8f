//! The [`Shape`] algebra: a pure, immutable description of a set of refs
//! or quads. A `Shape` carries no execution state — it only becomes an
//! executable iterator tree once bound to a backend (see the `quadspan-iter`
//! crate's `IteratorShape`).

use quadspan_model::Term;
use std::fmt;

/// A named capture point in a plan. Its value at a position is recorded
/// into the tag map of every result that passes through it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Tag(pub String);

impl Tag {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for Tag {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for Tag {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

/// A comparison operator over a comparable family of terms (§4.2.7).
/// Comparing across families (e.g. a string against an integer) always
/// yields `false` rather than panicking or raising an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ComparisonOp {
    Less,
    LessOrEqual,
    Greater,
    GreaterOrEqual,
    Equal,
    NotEqual,
}

/// The three filter kinds from §4.2.7, grouped under one [`Shape::Filter`]
/// node the way the reference evaluator groups its scalar comparison,
/// `IN`-style and regex functions under a single `Expression` leaf.
#[derive(Debug, Clone, PartialEq)]
pub enum FilterPredicate {
    Comparison(ComparisonOp, Term),
    /// `?` matches one term character, `%` matches any sequence; the match
    /// is anchored to the whole value.
    Wildcard(String),
    /// Regex applied to the string form of literal terms, and also to
    /// IRI/blank-node terms when `includes_refs` is set.
    Regex {
        pattern: String,
        includes_refs: bool,
    },
}

/// A declarative description of a set of refs or quads (§3 "Shape").
///
/// `Shape` is a pure value: identical shapes compose and compare by
/// structure (`PartialEq`), and the optimizer (`quadspan-optimize`)
/// rewrites a `Shape` into an equivalent `Shape` without ever mutating one
/// in place.
///
/// `R` is the backend's ref type (typically `quadspan_model::Ref<Token>`
/// for the backend's native `Token`). It only needs to be cloned and
/// compared for [`Shape::Fixed`] to hold a concrete literal set — every
/// other variant is backend-agnostic.
#[derive(Debug, Clone, PartialEq)]
pub enum Shape<R> {
    /// Every node token the backend exposes.
    AllNodes,
    /// Every quad token the backend exposes.
    AllQuads,
    /// A finite, caller-supplied set, preserving insertion order for scan.
    Fixed(Vec<R>),
    /// Resolves a term to its ref; empty if the term is unknown to the
    /// backend.
    Lookup(Term),
    /// Projects a quad set down to the distinct nodes at `direction`
    /// (HasA, §4.2.2). Fan-in tolerant: the same node may be produced once
    /// per justifying quad.
    NodesFrom {
        direction: quadspan_model::Direction,
        quads: Box<Shape<R>>,
    },
    /// The quads for which, at each listed direction, the node lies in the
    /// paired sub-shape (LinksTo, generalized to several directions at
    /// once; §4.2.2). A single `(dir, sub)` entry is exactly `LinksTo`.
    Quads(Vec<(quadspan_model::Direction, Shape<R>)>),
    /// A set intersection (And) where every member participates in
    /// driving the scan (§4.2.3).
    Intersect(Vec<Shape<R>>),
    /// A set intersection where `checks` can only answer `contains` (they
    /// can't drive a scan — e.g. a `Not` or an `Optional` sub-shape) and
    /// so are reduced to post-filters on `required`'s driver (§4.2.3).
    IntersectOptional {
        required: Vec<Shape<R>>,
        checks: Vec<Shape<R>>,
    },
    /// A set union (Or), §4.2.4.
    Union(Vec<Shape<R>>),
    /// `base − minus` (Not/Except), §4.2.5.
    Difference {
        base: Box<Shape<R>>,
        minus: Box<Shape<R>>,
    },
    /// Tag/save and optional-join, §4.2.6 and §4.2.8. When `predicate` is
    /// `None` the ref itself is tagged; otherwise the other end of a quad
    /// following `predicate` (in `direction`, reversed when `reverse`) is
    /// tagged. When `optional` is set, a driving ref that has no witness
    /// is still emitted, with the tag absent.
    Save {
        inner: Box<Shape<R>>,
        predicate: Option<Box<Shape<R>>>,
        direction: quadspan_model::Direction,
        tag: Tag,
        reverse: bool,
        optional: bool,
    },
    /// A comparison/wildcard/regex filter over `inner`'s results, §4.2.7.
    Filter {
        inner: Box<Shape<R>>,
        predicate: FilterPredicate,
    },
    Limit {
        inner: Box<Shape<R>>,
        count: usize,
    },
    Skip {
        inner: Box<Shape<R>>,
        count: usize,
    },
    /// Deduplicates `inner`'s results by ref identity, §4.2.9.
    Unique(Box<Shape<R>>),
    /// Terminal: materializes the size of `inner`, §4.2.9.
    Count(Box<Shape<R>>),
    /// Materializes and sorts `inner`'s results by the string form of the
    /// resolved value, §4.2.10.
    Order(Box<Shape<R>>),
    /// Stands for the current frontier inside a [`Shape::Recursive`]
    /// morphism — the morphism is otherwise an ordinary `Shape` fragment,
    /// substituting `Placeholder` for the frontier at each depth. Using a
    /// plain `Shape` value (rather than a closure) keeps morphisms pure
    /// data the optimizer can inspect and rewrite like any other node.
    /// Appearing outside a `Recursive`'s morphism is a malformed shape and
    /// evaluates to `Null` (§7 "never panics on malformed Shapes").
    Placeholder,
    /// Fixed-point follow (§4.2.11). `max_depth = 0` means unbounded.
    /// `tag`, when set, records the parent ref at the previous depth for
    /// every emitted ref.
    Recursive {
        seed: Box<Shape<R>>,
        morphism: Box<Shape<R>>,
        max_depth: usize,
        tag: Option<Tag>,
    },
    /// The empty set. Never advanced; a terminal sentinel (§4.1, §4.2.12).
    Null,
}

impl<R> Shape<R> {
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Shape::Null)
    }

    /// Smart constructor for intersection: flattens nested `Intersect`
    /// nodes, collapses a singleton list to its element, and an empty list
    /// to `AllNodes` (the intersection identity), mirroring the
    /// `GraphPattern::join` style smart constructors in the reference
    /// algebra crate. Fixed-point rewriting (null propagation, `AllNodes`
    /// absorption) is the optimizer's job, not the builder's.
    #[must_use]
    pub fn intersect(subs: Vec<Shape<R>>) -> Self {
        let mut flattened = Vec::with_capacity(subs.len());
        for sub in subs {
            match sub {
                Shape::Intersect(inner) => flattened.extend(inner),
                other => flattened.push(other),
            }
        }
        match flattened.len() {
            0 => Shape::AllNodes,
            1 => flattened.pop().expect("len checked above"),
            _ => Shape::Intersect(flattened),
        }
    }

    #[must_use]
    pub fn union(subs: Vec<Shape<R>>) -> Self {
        let mut flattened = Vec::with_capacity(subs.len());
        for sub in subs {
            match sub {
                Shape::Union(inner) => flattened.extend(inner),
                other => flattened.push(other),
            }
        }
        match flattened.len() {
            0 => Shape::Null,
            1 => flattened.pop().expect("len checked above"),
            _ => Shape::Union(flattened),
        }
    }

    #[must_use]
    pub fn links_to(self, direction: quadspan_model::Direction) -> Self {
        Shape::Quads(vec![(direction, self)])
    }

    #[must_use]
    pub fn has_a(self, direction: quadspan_model::Direction) -> Self {
        Shape::NodesFrom {
            direction,
            quads: Box::new(self),
        }
    }

    #[must_use]
    pub fn tag(self, tag: impl Into<Tag>) -> Self {
        Shape::Save {
            inner: Box::new(self),
            predicate: None,
            direction: quadspan_model::Direction::Subject,
            tag: tag.into(),
            reverse: false,
            optional: false,
        }
    }

    #[must_use]
    pub fn filter(self, predicate: FilterPredicate) -> Self {
        Shape::Filter {
            inner: Box::new(self),
            predicate,
        }
    }

    #[must_use]
    pub fn limit(self, count: usize) -> Self {
        Shape::Limit {
            inner: Box::new(self),
            count,
        }
    }

    #[must_use]
    pub fn skip(self, count: usize) -> Self {
        Shape::Skip {
            inner: Box::new(self),
            count,
        }
    }

    #[must_use]
    pub fn unique(self) -> Self {
        Shape::Unique(Box::new(self))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn intersect_of_one_collapses() {
        let shape: Shape<u64> = Shape::intersect(vec![Shape::AllNodes]);
        assert_eq!(shape, Shape::AllNodes);
    }

    #[test]
    fn intersect_flattens_nested() {
        let shape: Shape<u64> = Shape::intersect(vec![
            Shape::Intersect(vec![Shape::Fixed(vec![1]), Shape::Fixed(vec![2])]),
            Shape::Fixed(vec![3]),
        ]);
        assert_eq!(
            shape,
            Shape::Intersect(vec![
                Shape::Fixed(vec![1]),
                Shape::Fixed(vec![2]),
                Shape::Fixed(vec![3]),
            ])
        );
    }

    #[test]
    fn intersect_of_none_is_all_nodes() {
        let shape: Shape<u64> = Shape::intersect(vec![]);
        assert_eq!(shape, Shape::AllNodes);
    }

    #[test]
    fn union_of_none_is_null() {
        let shape: Shape<u64> = Shape::union(vec![]);
        assert_eq!(shape, Shape::Null);
    }
}
