//! End-to-end scenarios over a fixed follows/status graph (§8), run
//! through the public `QueryEngine` facade against the `MemoryStore`
//! backend — the same two pieces a binary links against.

use quadspan_engine::{MemoryStore, QueryEngine};
use quadspan_iter::StorageContract;
use quadspan_model::{Direction, Quad, Ref, Term};
use quadspan_optimize::CostConfig;
use quadspan_shape::ComparisonOp::{Equal, Greater};
use quadspan_shape::{FilterPredicate, Shape, Tag};
use std::collections::HashSet;

mod support {
    use super::*;

    pub fn follows(s: &str, o: &str) -> Quad {
        Quad::new(Term::iri(s), Term::iri("follows"), Term::iri(o), None).expect("valid quad")
    }

    pub fn status(s: &str) -> Quad {
        Quad::new(
            Term::iri(s),
            Term::iri("status"),
            Term::iri("cool"),
            Some(Term::iri("status_graph")),
        )
        .expect("valid quad")
    }

    /// alice/charlie/dani/bob/fred/greg/emily follows edges plus a
    /// status_graph-scoped "cool" status for bob/dani/greg, matching the
    /// worked examples used throughout the traversal/recursion/tag
    /// properties.
    pub fn reference_store() -> MemoryStore {
        let mut store = MemoryStore::new();
        store.insert_all([
            follows("alice", "bob"),
            follows("charlie", "bob"),
            follows("charlie", "dani"),
            follows("dani", "bob"),
            follows("bob", "fred"),
            follows("fred", "greg"),
            follows("dani", "greg"),
            follows("emily", "fred"),
            status("bob"),
            status("dani"),
            status("greg"),
        ]);
        store
    }

    pub fn lookup(iri: &str) -> Shape<Ref<u64>> {
        Shape::Lookup(Term::iri(iri))
    }

    pub fn engine() -> QueryEngine {
        QueryEngine::new(CostConfig::default())
    }

    /// Resolves every binding's result ref back to a `Term` and collects
    /// it as a set, the natural comparison for traversal results where
    /// ordering carries no meaning.
    pub fn result_set(store: &MemoryStore, shape: Shape<Ref<u64>>) -> HashSet<Term> {
        engine()
            .collect(store, shape, 0, None)
            .expect("query succeeds")
            .into_iter()
            .map(|binding| store.value_of(&binding.result).expect("ref resolves"))
            .collect()
    }

    pub fn terms(values: impl IntoIterator<Item = &'static str>) -> HashSet<Term> {
        values.into_iter().map(Term::iri).collect()
    }
}

use support::*;

/// Scenario 1 (§8 "Simple traversal"): `out(alice, follows)` reaches
/// exactly the nodes alice directly follows.
#[test]
fn simple_traversal_reaches_direct_successor() {
    let store = reference_store();
    let shape = Shape::Quads(vec![
        (Direction::Subject, lookup("alice")),
        (Direction::Predicate, lookup("follows")),
    ])
    .has_a(Direction::Object);
    assert_eq!(result_set(&store, shape), terms(["bob"]));
}

/// Scenario 2 (§8 "Inverse traversal"): `in(bob, follows)` reaches every
/// node that follows bob, the mirror image of scenario 1's constraint
/// with subject/object swapped.
#[test]
fn inverse_traversal_reaches_predecessors() {
    let store = reference_store();
    let shape = Shape::Quads(vec![
        (Direction::Object, lookup("bob")),
        (Direction::Predicate, lookup("follows")),
    ])
    .has_a(Direction::Subject);
    assert_eq!(result_set(&store, shape), terms(["alice", "charlie", "dani"]));
}

/// Scenario 3 (§8 "Tag-Is-Back"): tag bob's predecessors under "f", then
/// continue on to whichever of them has a "cool" status. `back` itself is
/// a surface-language operator outside the shape algebra (§1 non-goal:
/// surface query languages sit above this core) — what the engine
/// contracts to preserve is the tag, so the test reads the projected
/// value straight out of the returned `Binding::tags` map rather than
/// needing a dedicated "project to tag" shape node.
#[test]
fn tag_is_preserved_back_to_the_tagged_predecessor() {
    let store = reference_store();
    let predecessors_of_bob = Shape::Quads(vec![
        (Direction::Object, lookup("bob")),
        (Direction::Predicate, lookup("follows")),
    ])
    .has_a(Direction::Subject)
    .tag("f");

    let cool_among_tagged = Shape::Quads(vec![
        (Direction::Subject, predecessors_of_bob),
        (Direction::Predicate, lookup("status")),
    ])
    .has_a(Direction::Object)
    .filter(FilterPredicate::Comparison(Equal, Term::iri("cool")));

    let bindings = engine()
        .collect(&store, cool_among_tagged, 0, None)
        .expect("query succeeds");
    assert_eq!(bindings.len(), 1);
    let tagged = bindings[0]
        .tags
        .get(&Tag::new("f"))
        .and_then(|r| store.value_of(r));
    assert_eq!(tagged, Some(Term::iri("dani")));
}

/// Scenario 4 (§8 "Recursive follow"): following `out(follows)` from
/// charlie to a fixed point reaches every node downstream of charlie, but
/// never charlie itself — a seed primes the frontier, it is not a result
/// of applying the morphism zero times.
#[test]
fn recursive_follow_excludes_the_seed_and_reaches_fixed_point() {
    let store = reference_store();
    let morphism = Shape::Quads(vec![
        (Direction::Subject, Shape::Placeholder),
        (Direction::Predicate, lookup("follows")),
    ])
    .has_a(Direction::Object);
    let shape = Shape::Recursive {
        seed: Box::new(lookup("charlie")),
        morphism: Box::new(morphism),
        max_depth: 0,
        tag: None,
    };
    assert_eq!(
        result_set(&store, shape),
        terms(["bob", "dani", "fred", "greg"])
    );
}

/// Scenario 5 ("Intersection"): nodes that follow both bob and greg.
/// dani follows bob directly and also follows greg directly; charlie
/// follows bob but not greg, fred follows greg but not bob.
#[test]
fn intersection_finds_nodes_that_follow_both_targets() {
    let store = reference_store();
    let follows_bob = Shape::Quads(vec![
        (Direction::Object, lookup("bob")),
        (Direction::Predicate, lookup("follows")),
    ])
    .has_a(Direction::Subject);
    let follows_greg = Shape::Quads(vec![
        (Direction::Object, lookup("greg")),
        (Direction::Predicate, lookup("follows")),
    ])
    .has_a(Direction::Subject);
    let shape = Shape::intersect(vec![follows_bob, follows_greg]);
    assert_eq!(result_set(&store, shape), terms(["dani"]));
}

/// Scenario 6 ("Labels scoping"): status quads are scoped under the
/// `status_graph` label; a quad constraint pinned to a different,
/// never-asserted label resolves to nothing, while the correct label
/// reaches every status subject.
#[test]
fn label_scopes_quads_to_their_asserted_graph() {
    let store = reference_store();
    let in_status_graph = Shape::Quads(vec![
        (Direction::Predicate, lookup("status")),
        (Direction::Label, lookup("status_graph")),
    ])
    .has_a(Direction::Subject);
    assert_eq!(
        result_set(&store, in_status_graph),
        terms(["bob", "dani", "greg"])
    );

    let in_other_graph = Shape::Quads(vec![
        (Direction::Predicate, lookup("status")),
        (Direction::Label, lookup("gossip_graph")),
    ])
    .has_a(Direction::Subject);
    assert_eq!(result_set(&store, in_other_graph), HashSet::new());
}

/// §7 "never panics on malformed Shapes": an empty `Fixed` and an empty
/// `Union` both behave as the empty set rather than panicking or
/// erroring; a depth-bounded `Recursive` only reaches what's within that
/// many morphism applications.
#[test]
fn degenerate_shapes_behave_as_the_empty_set() {
    let store = reference_store();
    assert_eq!(result_set(&store, Shape::Fixed(Vec::new())), HashSet::new());

    let count = engine()
        .count(&store, Shape::Union(Vec::new()))
        .expect("query succeeds");
    assert_eq!(count, 0);

    let unreachable_depth = Shape::Recursive {
        seed: Box::new(lookup("charlie")),
        morphism: Box::new(
            Shape::Quads(vec![
                (Direction::Subject, Shape::Placeholder),
                (Direction::Predicate, lookup("follows")),
            ])
            .has_a(Direction::Object),
        ),
        max_depth: 1,
        tag: None,
    };
    // At depth 1, charlie's direct successors (bob, dani) are reachable;
    // the seed itself still never is.
    assert_eq!(result_set(&store, unreachable_depth), terms(["bob", "dani"]));
}

/// §6.1 round-trip law: a term the store has interned resolves through
/// `name_of` to a ref that resolves back through `value_of` to the same
/// term; a term the store has never seen resolves to no ref at all.
#[test]
fn term_round_trips_through_the_store() {
    let store = reference_store();
    let alice_ref = store.name_of(&Term::iri("alice")).expect("alice is known");
    assert_eq!(store.value_of(&alice_ref), Some(Term::iri("alice")));
    assert!(store.name_of(&Term::iri("nobody")).is_none());
}

/// §10.4 boundary behavior: integer comparisons stay exact at the
/// extremes, where a naive float-based comparison would lose precision.
#[test]
fn integer_comparison_is_exact_at_the_boundaries() {
    let mut store = MemoryStore::new();
    let subject = |n: i64| Quad::new(Term::iri("n"), Term::iri("value"), Term::Integer(n), None)
        .expect("valid quad");
    store.insert_all([
        subject(i64::MIN),
        subject(i64::MIN + 1),
        subject(i64::MAX - 1),
        subject(i64::MAX),
    ]);
    let shape = Shape::Quads(vec![
        (Direction::Subject, lookup("n")),
        (Direction::Predicate, lookup("value")),
    ])
    .has_a(Direction::Object)
    .filter(FilterPredicate::Comparison(Greater, Term::Integer(i64::MIN)));
    let values: HashSet<Term> = engine()
        .collect(&store, shape, 0, None)
        .expect("query succeeds")
        .into_iter()
        .map(|binding| store.value_of(&binding.result).expect("ref resolves"))
        .collect();
    assert_eq!(
        values,
        HashSet::from([
            Term::Integer(i64::MIN + 1),
            Term::Integer(i64::MAX - 1),
            Term::Integer(i64::MAX),
        ])
    );
}
