//! The reference in-memory backend, execution driver and query engine
//! facade: the piece of the workspace a binary actually links against to
//! run queries (`quadspan-model`/`quadspan-shape`/`quadspan-iter`/
//! `quadspan-optimize` are the reusable core a backend author consumes
//! instead).

mod driver;
mod engine;
mod error;
mod memory;
mod registry;

pub use crate::driver::{Binding, Driver, ExecutionExplanation};
pub use crate::engine::QueryEngine;
pub use crate::error::{EngineError, StoreError};
pub use crate::memory::MemoryStore;
pub use crate::registry::{default_backend_registry, BackendRegistry, Registry, MEMORY_BACKEND};
