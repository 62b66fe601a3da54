//! Retex - concurrent replacement-texture cache and loading library.
//!
//! This crate provides a unified interface to the retex crate ecosystem for
//! replacing game textures at render time.
//!
//! # Crates
//!
//! - [`retex_common`] - Identifier hashing and the host boundary traits
//! - [`retex_cache`] - Sharded tables, identifier translation, published
//!   lookup snapshot
//! - [`retex_tpf`] - TPF texture-pack archive reading (XOR layer + ZIP)
//! - [`retex_loader`] - Worker pool, job pipeline, and [`LoaderContext`]
//!
//! # Example
//!
//! ```no_run
//! use retex::prelude::*;
//! use std::sync::Arc;
//! # fn decoder() -> Arc<dyn TextureDecoder> { unimplemented!() }
//!
//! let ctx = LoaderContext::new(decoder(), LoaderConfig::default());
//! ctx.notify_device_available(DeviceContext::new(()));
//! ctx.load_archive_file("mods/pack.tpf".as_ref())?;
//!
//! // Per frame, on the render thread:
//! if let Some(texture) = ctx.resolve_display_resource(0xCAFE_BABE) {
//!     // draw the replacement
//! }
//! # Ok::<(), retex::loader::Error>(())
//! ```

// Re-export all sub-crates
pub use retex_cache as cache;
pub use retex_common as common;
pub use retex_loader as loader;
pub use retex_tpf as tpf;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use retex_cache::{RebuildOutcome, TextureCache};
    pub use retex_common::hash::{content_hash, name_hash};
    pub use retex_common::{DeviceContext, Texture, TextureDecoder, TextureHandle, TextureKind};
    pub use retex_loader::{LoaderConfig, LoaderContext};
    pub use retex_tpf::{TpfArchive, TpfEntry};
}

// Re-export the boundary object at the crate root
pub use retex_loader::{LoaderConfig, LoaderContext};

/// Version information.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
