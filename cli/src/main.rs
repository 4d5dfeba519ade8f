//! Command line demo: loads the reference follows/status graph into the
//! in-memory backend and runs one of a handful of canned traversals
//! against it, the way the reference corpus's CLI wires a registry and a
//! store together before handing off to its evaluator.

use anyhow::{bail, Context as _};
use clap::{Parser, Subcommand};
use quadspan_engine::{default_backend_registry, QueryEngine, MEMORY_BACKEND};
use quadspan_model::{Direction, Quad, Ref, Term};
use quadspan_optimize::CostConfig;
use quadspan_shape::Shape;

#[derive(Parser)]
#[command(about, version, name = "quadspan")]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Every node reachable by following `predicate` forward from `node`.
    Out { node: String, predicate: String },
    /// Every node that reaches `node` by following `predicate` forward.
    In { node: String, predicate: String },
    /// Runs the named end-to-end scenario from the reference graph.
    Demo {
        #[arg(default_value = "traversal")]
        scenario: String,
    },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args = Args::parse();
    let registry = default_backend_registry();
    let mut store = registry
        .build(MEMORY_BACKEND)
        .context("the default registry always carries the memory backend")?;
    store.insert_all(reference_graph());
    let engine = QueryEngine::new(CostConfig::default());

    match args.command {
        Command::Out { node, predicate } => {
            let shape = directional_traversal(&node, &predicate, Direction::Subject, Direction::Object);
            print_bindings(&engine, &store, shape)?;
        }
        Command::In { node, predicate } => {
            let shape = directional_traversal(&node, &predicate, Direction::Object, Direction::Subject);
            print_bindings(&engine, &store, shape)?;
        }
        Command::Demo { scenario } => {
            let shape = match scenario.as_str() {
                "traversal" => directional_traversal("alice", "follows", Direction::Subject, Direction::Object),
                "inverse" => directional_traversal("bob", "follows", Direction::Object, Direction::Subject),
                "recursive" => Shape::Recursive {
                    seed: Box::new(Shape::Lookup(Term::iri("charlie"))),
                    morphism: Box::new(
                        Shape::Quads(vec![
                            (Direction::Subject, Shape::Placeholder),
                            (Direction::Predicate, Shape::Lookup(Term::iri("follows"))),
                        ])
                        .has_a(Direction::Object),
                    ),
                    max_depth: 0,
                    tag: None,
                },
                other => bail!("unknown demo scenario {other:?} (try traversal, inverse, recursive)"),
            };
            print_bindings(&engine, &store, shape)?;
        }
    }
    Ok(())
}

fn directional_traversal(
    node: &str,
    predicate: &str,
    anchor: Direction,
    target: Direction,
) -> Shape<Ref<u64>> {
    Shape::Quads(vec![
        (anchor, Shape::Lookup(Term::iri(node))),
        (Direction::Predicate, Shape::Lookup(Term::iri(predicate))),
    ])
    .has_a(target)
}

fn print_bindings(
    engine: &QueryEngine,
    store: &quadspan_engine::MemoryStore,
    shape: Shape<Ref<u64>>,
) -> anyhow::Result<()> {
    use quadspan_iter::StorageContract;
    let bindings = engine.collect(store, shape, 0, None)?;
    if bindings.is_empty() {
        println!("(no results)");
    }
    for binding in bindings {
        match store.value_of(&binding.result) {
            Some(term) => println!("{term}"),
            None => println!("<unresolved ref>"),
        }
    }
    Ok(())
}

fn reference_graph() -> Vec<Quad> {
    let follows = |s: &str, o: &str| {
        Quad::new(Term::iri(s), Term::iri("follows"), Term::iri(o), None).expect("valid quad")
    };
    let status = |s: &str| {
        Quad::new(
            Term::iri(s),
            Term::iri("status"),
            Term::iri("cool"),
            Some(Term::iri("status_graph")),
        )
        .expect("valid quad")
    };
    vec![
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
    ]
}
