//! TPF container reader.
//!
//! A TPF pack is a ZIP archive behind an outer XOR layer; entries may be
//! ZipCrypto-encrypted with a fixed key and DEFLATE-compressed. The optional
//! `texmod.def` manifest is parsed *before* any texture entry is surfaced,
//! because downstream consumers need the identifier remapping in place by the
//! time texture-load jobs complete, not after.

use std::fs::File;
use std::io::{Cursor, Read};
use std::path::Path;

use memmap2::Mmap;
use tracing::{debug, info, warn};
use zip::ZipArchive;

use crate::crypto::{xor_layer, TPF_ZIP_KEY};
use crate::filename::identifier_for_filename;
use crate::manifest;
use crate::{Error, Result};

const MANIFEST_NAME: &str = "texmod.def";
const EXE_PREFIX: &str = "SPEED.EXE_";

/// One extracted texture blob. The blob is owned by the entry (and by the
/// load job it is handed to), not by the archive.
#[derive(Debug, Clone)]
pub struct TpfEntry {
    /// Content-space identifier parsed from the filename.
    pub hash: u32,
    /// Entry filename with the executable prefix stripped.
    pub name: String,
    /// Decoded image blob.
    pub data: Vec<u8>,
}

/// A fully extracted TPF texture pack.
pub struct TpfArchive {
    entries: Vec<TpfEntry>,
    mappings: Vec<(u32, u32)>,
    manifest_text: Option<String>,
}

impl TpfArchive {
    /// Open and extract a TPF file.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)?;
        let mmap = unsafe { Mmap::map(&file)? };
        info!(path = %path.display(), bytes = mmap.len(), "reading TPF");

        // The XOR layer modifies the data, so work on a copy of the mapping.
        Self::from_bytes(mmap.to_vec())
    }

    /// Extract a TPF from an in-memory container blob.
    pub fn from_bytes(mut data: Vec<u8>) -> Result<Self> {
        xor_layer(&mut data);

        if data.len() < 4 || &data[..2] != b"PK" {
            return Err(Error::NotATpf);
        }

        let mut zip = ZipArchive::new(Cursor::new(data))?;
        debug!(entries = zip.len(), "TPF ZIP opened");

        // First pass: the manifest only. Ordering matters; see module docs.
        let mut manifest_text = None;
        for index in 0..zip.len() {
            let mut file = match zip.by_index_decrypt(index, &TPF_ZIP_KEY) {
                Ok(file) => file,
                Err(err) => {
                    warn!(index, %err, "skipping unreadable TPF entry");
                    continue;
                }
            };
            if file.name() != MANIFEST_NAME {
                continue;
            }

            let mut text = String::new();
            file.read_to_string(&mut text).map_err(|err| Error::Extract {
                name: MANIFEST_NAME.to_string(),
                reason: err.to_string(),
            })?;
            debug!(bytes = text.len(), "extracted texmod.def");
            manifest_text = Some(text);
            break;
        }

        let mappings = manifest_text
            .as_deref()
            .map(manifest::parse)
            .unwrap_or_default();

        // Second pass: every texture entry.
        let mut entries = Vec::new();
        for index in 0..zip.len() {
            let mut file = match zip.by_index_decrypt(index, &TPF_ZIP_KEY) {
                Ok(file) => file,
                Err(err) => {
                    warn!(index, %err, "skipping unreadable TPF entry");
                    continue;
                }
            };
            if file.is_dir() || file.name() == MANIFEST_NAME {
                continue;
            }

            let raw_name = file.name().to_string();
            let mut data = Vec::with_capacity(file.size() as usize);
            if let Err(err) = file.read_to_end(&mut data) {
                warn!(name = %raw_name, %err, "failed to extract TPF entry");
                continue;
            }

            let name = match raw_name.strip_prefix(EXE_PREFIX) {
                Some(stripped) => stripped.to_string(),
                None => raw_name,
            };
            let hash = identifier_for_filename(&name);
            entries.push(TpfEntry { hash, name, data });
        }

        info!(
            entries = entries.len(),
            mappings = mappings.len(),
            "TPF extracted"
        );

        Ok(Self {
            entries,
            mappings,
            manifest_text,
        })
    }

    /// Number of texture entries (the manifest excluded).
    pub fn entry_count(&self) -> usize {
        self.entries.len()
    }

    pub fn entries(&self) -> &[TpfEntry] {
        &self.entries
    }

    /// Consume the archive, yielding owned entries for job submission.
    pub fn into_entries(self) -> Vec<TpfEntry> {
        self.entries
    }

    /// Identifier remappings from the manifest: (name-space id, content-space
    /// id) pairs.
    pub fn mappings(&self) -> &[(u32, u32)] {
        &self.mappings
    }

    /// Raw manifest text, if the pack carried one.
    pub fn manifest_text(&self) -> Option<&str> {
        self.manifest_text.as_deref()
    }
}

impl std::fmt::Debug for TpfArchive {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TpfArchive")
            .field("entries", &self.entries.len())
            .field("mappings", &self.mappings.len())
            .finish()
    }
}
