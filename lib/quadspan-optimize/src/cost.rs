//! The optimizer's tunable cost-model constants (Design Note "Cost model
//! heuristics") and the size/cost vocabulary the join-reordering and
//! check-order rules (§4.3 rules 6-7) are expressed in terms of.

/// A size estimate returned by a backend, paired with whether it is exact.
/// `exact = true` is an obligation on the backend, not a promise by the
/// engine: the optimizer treats an exact size as safe to use for
/// correctness-affecting decisions (e.g. whether a recursive fixed point
/// can use its bounded form, §4.3 rule 8), not just for ranking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Size {
    pub value: u64,
    pub exact: bool,
}

impl Size {
    #[must_use]
    pub fn exact(value: u64) -> Self {
        Self { value, exact: true }
    }

    #[must_use]
    pub fn estimate(value: u64) -> Self {
        Self {
            value,
            exact: false,
        }
    }
}

/// The three figures an [`crate::Stats`]-producing iterator reports to the
/// optimizer (§4.1 "Iterator Shape exposes `stats`").
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Stats {
    pub next_cost: f64,
    pub contains_cost: f64,
    pub size: Size,
}

impl Stats {
    #[must_use]
    pub fn new(next_cost: f64, contains_cost: f64, size: Size) -> Self {
        Self {
            next_cost,
            contains_cost,
            size,
        }
    }

    /// The projected cost of driving an `Intersect` scan with this
    /// iterator as primary, checking `others` via `contains` (§4.3 rule 6):
    /// `size · (next_cost + Σ others.contains_cost)`.
    #[must_use]
    pub fn projected_primary_cost<'a>(&self, others: impl Iterator<Item = &'a Stats>) -> f64 {
        let checks_cost: f64 = others.map(|s| s.contains_cost).sum();
        (self.size.value as f64) * (self.next_cost + checks_cost)
    }
}

/// Tunable constants driving the cost model, configured once by the
/// embedding binary and threaded through the optimizer explicitly rather
/// than read from a global (Design Note "Global registries").
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CostConfig {
    /// Multiplies the projected secondary cost of a `HasA`'s `contains`
    /// relative to its inner `LinksTo`, modeling that one node may
    /// justify many quads.
    pub fanout_factor: f64,
    /// Per-step cost charged to `LinksTo`'s `next`.
    pub next_constant_per_link: f64,
    /// Per-step cost charged to `HasA`'s `contains`.
    pub check_constant: f64,
}

impl Default for CostConfig {
    fn default() -> Self {
        Self {
            fanout_factor: 20.0,
            next_constant_per_link: 2.0,
            check_constant: 1.0,
        }
    }
}
