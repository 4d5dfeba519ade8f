//! Shape-level rewrite rules (§4.3 rules 1-3): a single bottom-up pass that
//! propagates `Null`, eliminates unit elements and absorbs `AllNodes`/
//! `AllQuads` into surrounding intersections. These rules touch only the
//! shape's structure — never a backend — so they live beside the algebra
//! rather than in the iterator crate; join reordering and check-order
//! selection (rules 6-7) need live cost figures from a compiled iterator
//! tree and are implemented there instead (see `quadspan-iter::ops::intersect`).
//!
//! The pass is expressed the way `sparopt`'s `GraphPatternOptimizer`
//! normalizes a pattern: one recursive descent that rebuilds each node from
//! its already-normalized children, rather than an explicit outer
//! fixed-point loop. Each rule's postcondition is stable under
//! re-application, so a second pass over the result is a no-op.

use quadspan_shape::Shape;

/// Rewrites `shape` into an equivalent, simplified `Shape` by applying
/// null propagation, unit elimination and `AllNodes`/`AllQuads` absorption
/// to every node, bottom-up.
pub fn normalize<R>(shape: Shape<R>) -> Shape<R> {
    match shape {
        Shape::AllNodes
        | Shape::AllQuads
        | Shape::Fixed(_)
        | Shape::Lookup(_)
        | Shape::Placeholder
        | Shape::Null => shape,

        Shape::NodesFrom { direction, quads } => {
            let quads = normalize(*quads);
            if quads.is_null() {
                Shape::Null
            } else {
                Shape::NodesFrom {
                    direction,
                    quads: Box::new(quads),
                }
            }
        }

        Shape::Quads(constraints) => {
            let mut normalized = Vec::with_capacity(constraints.len());
            for (direction, sub) in constraints {
                let sub = normalize(sub);
                if sub.is_null() {
                    return Shape::Null;
                }
                normalized.push((direction, sub));
            }
            Shape::Quads(normalized)
        }

        Shape::Intersect(subs) => normalize_intersect(subs),

        Shape::IntersectOptional { required, checks } => {
            let mut normalized_required = Vec::with_capacity(required.len());
            for sub in required {
                let sub = normalize(sub);
                if sub.is_null() {
                    return Shape::Null;
                }
                match sub {
                    Shape::AllNodes | Shape::AllQuads => {}
                    other => normalized_required.push(other),
                }
            }
            let mut normalized_checks = Vec::with_capacity(checks.len());
            for sub in checks {
                let sub = normalize(sub);
                if sub.is_null() {
                    // A check that can never hold makes every candidate fail.
                    return Shape::Null;
                }
                normalized_checks.push(sub);
            }
            if normalized_checks.is_empty() {
                return Shape::intersect(normalized_required);
            }
            if normalized_required.is_empty() {
                // Nothing left to drive the scan; the checks become the
                // driver, degrading to a plain intersection.
                return Shape::intersect(normalized_checks);
            }
            Shape::IntersectOptional {
                required: normalized_required,
                checks: normalized_checks,
            }
        }

        Shape::Union(subs) => {
            let mut normalized = Vec::with_capacity(subs.len());
            for sub in subs {
                let sub = normalize(sub);
                if !sub.is_null() {
                    normalized.push(sub);
                }
            }
            Shape::union(normalized)
        }

        Shape::Difference { base, minus } => {
            let base = normalize(*base);
            let minus = normalize(*minus);
            if base.is_null() {
                Shape::Null
            } else if minus.is_null() {
                base
            } else {
                Shape::Difference {
                    base: Box::new(base),
                    minus: Box::new(minus),
                }
            }
        }

        Shape::Save {
            inner,
            predicate,
            direction,
            tag,
            reverse,
            optional,
        } => {
            let inner = normalize(*inner);
            if inner.is_null() {
                return Shape::Null;
            }
            let predicate = predicate.map(|p| Box::new(normalize(*p)));
            Shape::Save {
                inner: Box::new(inner),
                predicate,
                direction,
                tag,
                reverse,
                optional,
            }
        }

        Shape::Filter { inner, predicate } => {
            let inner = normalize(*inner);
            if inner.is_null() {
                Shape::Null
            } else {
                Shape::Filter {
                    inner: Box::new(inner),
                    predicate,
                }
            }
        }

        Shape::Limit { inner, count } => {
            let inner = normalize(*inner);
            if count == 0 || inner.is_null() {
                Shape::Null
            } else {
                Shape::Limit {
                    inner: Box::new(inner),
                    count,
                }
            }
        }

        Shape::Skip { inner, count } => {
            let inner = normalize(*inner);
            if inner.is_null() {
                Shape::Null
            } else {
                Shape::Skip {
                    inner: Box::new(inner),
                    count,
                }
            }
        }

        Shape::Unique(inner) => {
            let inner = normalize(*inner);
            if inner.is_null() {
                Shape::Null
            } else {
                Shape::Unique(Box::new(inner))
            }
        }

        // Count's result is a single integer ref, not the inner set itself;
        // Count(Null) legitimately evaluates to zero and is not equivalent
        // to Null, so it is never propagated past this node.
        Shape::Count(inner) => Shape::Count(Box::new(normalize(*inner))),

        Shape::Order(inner) => {
            let inner = normalize(*inner);
            if inner.is_null() {
                Shape::Null
            } else {
                Shape::Order(Box::new(inner))
            }
        }

        Shape::Recursive {
            seed,
            morphism,
            max_depth,
            tag,
        } => {
            let seed = normalize(*seed);
            if seed.is_null() {
                return Shape::Null;
            }
            Shape::Recursive {
                seed: Box::new(seed),
                morphism: Box::new(normalize(*morphism)),
                max_depth,
                tag,
            }
        }
    }
}

fn normalize_intersect<R>(subs: Vec<Shape<R>>) -> Shape<R> {
    let mut flattened = Vec::with_capacity(subs.len());
    for sub in subs {
        let sub = normalize(sub);
        match sub {
            Shape::Null => return Shape::Null,
            // AllNodes/AllQuads are the intersection identity; drop them.
            Shape::AllNodes | Shape::AllQuads => {}
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

#[cfg(test)]
mod tests {
    use super::*;
    use quadspan_model::Direction;

    #[test]
    fn null_propagates_through_intersect() {
        let shape: Shape<u64> = Shape::Intersect(vec![Shape::Fixed(vec![1]), Shape::Null]);
        assert_eq!(normalize(shape), Shape::Null);
    }

    #[test]
    fn all_nodes_absorbed_out_of_intersect() {
        let shape: Shape<u64> = Shape::Intersect(vec![Shape::AllNodes, Shape::Fixed(vec![1])]);
        assert_eq!(normalize(shape), Shape::Fixed(vec![1]));
    }

    #[test]
    fn union_drops_null_members() {
        let shape: Shape<u64> = Shape::Union(vec![Shape::Null, Shape::Fixed(vec![1])]);
        assert_eq!(normalize(shape), Shape::Fixed(vec![1]));
    }

    #[test]
    fn difference_of_null_minus_collapses_to_base() {
        let shape: Shape<u64> = Shape::Difference {
            base: Box::new(Shape::Fixed(vec![1])),
            minus: Box::new(Shape::Null),
        };
        assert_eq!(normalize(shape), Shape::Fixed(vec![1]));
    }

    #[test]
    fn null_propagates_through_has_a_and_links_to() {
        let shape: Shape<u64> = Shape::Null.has_a(Direction::Subject);
        assert_eq!(normalize(shape), Shape::Null);
        let shape: Shape<u64> = Shape::Null.links_to(Direction::Predicate);
        assert_eq!(normalize(shape), Shape::Null);
    }

    #[test]
    fn count_of_null_is_not_collapsed() {
        let shape: Shape<u64> = Shape::Count(Box::new(Shape::Null));
        assert_eq!(normalize(shape), Shape::Count(Box::new(Shape::Null)));
    }

    #[test]
    fn recursive_with_null_seed_collapses() {
        let shape: Shape<u64> = Shape::Recursive {
            seed: Box::new(Shape::Null),
            morphism: Box::new(Shape::Placeholder.links_to(Direction::Object)),
            max_depth: 0,
            tag: None,
        };
        assert_eq!(normalize(shape), Shape::Null);
    }
}
