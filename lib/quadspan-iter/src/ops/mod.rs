//! The operator library: one `Scanner`/`Index` pair per `Shape` variant
//! (§4.2). Purely compositional operators (`Intersect`, `Union`,
//! `Difference`, `Limit`, `Skip`, `Unique`, `Count`, `Recursive`) are
//! generic over the ref type alone; leaves that touch the backend
//! (`AllNodes`/`AllQuads`, `Lookup`, `Quads`, `NodesFrom`, `Save`,
//! `Filter`, `Order`) are generic over a [`crate::StorageContract`].

pub mod all;
pub mod count;
pub mod difference;
pub mod filter;
pub mod fixed;
pub mod intersect;
pub mod limit;
pub mod lookup;
pub mod nodes_from;
pub mod null;
pub mod order;
pub mod quads;
pub mod recursive;
pub mod save;
pub mod skip;
pub mod union;
pub mod unique;
