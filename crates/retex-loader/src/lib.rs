//! Asynchronous replacement-texture loading.
//!
//! Ties the cache, the pack archive reader, and a worker pool together
//! behind [`LoaderContext`], the single object a host embeds:
//!
//! ```no_run
//! use std::sync::Arc;
//! use retex_loader::{LoaderConfig, LoaderContext};
//! # fn decoder() -> Arc<dyn retex_common::TextureDecoder> { unimplemented!() }
//!
//! let ctx = LoaderContext::new(decoder(), LoaderConfig::default());
//! ctx.add_source("tracks/road01", "mods/road01.dds".as_ref())?;
//! ctx.load_archive_file("mods/pack.tpf".as_ref())?;
//! # Ok::<(), retex_loader::Error>(())
//! ```
//!
//! The per-frame consumer calls
//! [`resolve_display_resource`](LoaderContext::resolve_display_resource),
//! which never blocks; a miss means "draw the original".

pub mod context;
pub mod device;
pub mod error;
pub mod job;
pub mod pipeline;

pub use context::{LoaderConfig, LoaderContext};
pub use device::DeviceSlot;
pub use error::{Error, Result};
pub use job::{Job, JobSource};
pub use pipeline::{Pipeline, PipelineConfig};
