//! TPF texture pack reader.
//!
//! TPF packs are XOR-wrapped ZIP archives of replacement textures, with an
//! optional `texmod.def` manifest that remaps name-space identifiers onto the
//! content-space identifiers the pack entries are named by.
//!
//! # Example
//!
//! ```no_run
//! use retex_tpf::TpfArchive;
//!
//! let archive = TpfArchive::open("road_pack.tpf")?;
//! for (name_id, content_id) in archive.mappings() {
//!     println!("{name_id:#010x} -> {content_id:#010x}");
//! }
//! for entry in archive.entries() {
//!     println!("{}: {} bytes", entry.name, entry.data.len());
//! }
//! # Ok::<(), retex_tpf::Error>(())
//! ```

mod archive;
mod crypto;
mod error;
mod filename;
mod manifest;

pub use archive::{TpfArchive, TpfEntry};
pub use crypto::{xor_layer, TPF_ZIP_KEY};
pub use error::{Error, Result};
pub use filename::{identifier_for_filename, strip_pack_prefixes};
