//! Reference store backends.
//!
//! Concrete drivers behind the adapter traits: a SQLite graph store and an
//! in-memory vector store, plus a seedable demo corpus. Production
//! deployments swap in their own drivers; everything above the trait
//! boundary is unchanged.

mod memory;
pub mod seed;
mod sqlite;

pub use memory::{EmbedError, Embedder, HashEmbedder, MemoryVectorDriver};
#[cfg(feature = "embeddings")]
pub use memory::FastembedEmbedder;
pub use sqlite::{NodeKind, SqliteGraphDriver};
