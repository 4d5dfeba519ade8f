use crate::context::Context;
use crate::error::IterError;
use quadspan_optimize::Stats;
use quadspan_shape::Tag;
use rustc_hash::FxHashMap;

/// Tags captured along the path that produced a result, keyed by the
/// [`Tag`] a `Shape::Save` recorded them under.
pub type TagMap<R> = FxHashMap<Tag, R>;

/// Capability shared by [`Scanner`] and [`Index`] (§4.1 "Base").
///
/// Deliberately not a supertrait either mode is required to add behavior
/// to beyond what it already needs — see [`Scanner`]/[`Index`] doc comments
/// for why the two stay disjoint rather than being unified into one trait.
pub trait Base<R> {
    /// The ref most recently confirmed by `next`/`contains`, or `None`
    /// before the first successful call.
    fn result(&self) -> Option<&R>;

    /// Merges the tags captured along the path that produced the current
    /// result into `tags`. A no-op for iterators that never tag (most
    /// leaves and combinators); only `Save` and the operators that wrap it
    /// override this meaningfully.
    fn tag_results(&self, tags: &mut TagMap<R>);

    /// Advances to the next witnessing path for the *current* result
    /// without changing the result itself (e.g. a second predicate edge
    /// that also justifies the same tagged node). Returns `false` once
    /// every path has been exhausted. Iterators with at most one path per
    /// result (the common case) implement this as `Ok(false)`.
    fn next_path(&mut self, ctx: &Context) -> Result<bool, IterError>;

    /// The error that halted this iterator, if any. Set once and sticky:
    /// an iterator that has errored stays errored.
    fn err(&self) -> Option<&IterError>;

    /// Releases any resources held by this iterator and its children.
    /// Idempotent — closing twice is a no-op (§8 "Close idempotence").
    fn close(&mut self);
}

/// A lazy, sequential producer of refs (§4.1 "Scanner"). Drives a scan
/// forward with `next`; does not answer arbitrary membership queries.
///
/// Kept as a trait distinct from [`Index`] rather than merged into one
/// "iterator" type: a scan-only operator (e.g. an unindexed regex filter)
/// has no efficient `contains`, and an index-only operator (e.g. a huge
/// `AllNodes` existence check) has no efficient `next`. Forcing both onto
/// every node would mean every leaf pays for a capability most of its
/// callers never use.
pub trait Scanner<R>: Base<R> {
    /// Advances to the next result. Returns `Ok(false)` once exhausted.
    fn next(&mut self, ctx: &Context) -> Result<bool, IterError>;

    /// The cost/size figures the optimizer uses to choose a driver and an
    /// ordering of checks (§4.3 rules 6-7).
    fn stats(&self) -> Stats;
}

/// A membership tester (§4.1 "Index"). Confirms whether a candidate
/// belongs to the set without enumerating it.
pub trait Index<R>: Base<R> {
    /// Tests whether `candidate` belongs to this iterator's set. On a
    /// match, `result()`/`tag_results()` reflect `candidate`.
    fn contains(&mut self, ctx: &Context, candidate: &R) -> Result<bool, IterError>;

    fn stats(&self) -> Stats;
}
