//! Concurrent texture cache for retex.
//!
//! The cache resolves 32-bit identifiers to loaded texture handles without
//! ever blocking the real-time consumer:
//!
//! - [`StringArena`] - process-lifetime arena for path strings
//! - [`ShardedTable`] - per-bucket-locked table with append-only chains
//! - [`HashTranslator`] - bidirectional name-space / content-space mapping
//! - [`SwapTable`] - immutable published snapshot, rebuilt and swapped
//!   atomically
//! - [`TextureCache`] - the assembled stores shared between the loading
//!   pipeline and the consumer
//!
//! # Example
//!
//! ```
//! use retex_cache::TextureCache;
//!
//! let cache = TextureCache::new();
//! cache.add_path(0xAAAA_0001, "packs/road_diffuse.dds");
//! assert_eq!(cache.path_count(), 1);
//!
//! // Nothing published yet: the consumer sees "no replacement".
//! assert!(cache.resolve(0xAAAA_0001).is_none());
//! ```

mod arena;
mod cache;
mod error;
mod swap;
mod table;
mod translate;

pub use arena::StringArena;
pub use cache::TextureCache;
pub use error::{Error, Result};
pub use swap::{RebuildOutcome, SwapSnapshot, SwapTable};
pub use table::{PathEntry, ShardedTable, DEFAULT_BUCKET_COUNT};
pub use translate::HashTranslator;
