//! `texmod.def` manifest parsing.
//!
//! The manifest maps name-space identifiers to pack entries, one mapping per
//! line in the form `HEXHASH|filename`. `#` and `//` start comment lines.
//! Filenames are resolved to content-space identifiers with the same rules
//! as actual archive entries, so both sides of a mapping agree even when the
//! manifest says `specroad.dds` and the entry is `speed_t_specroad.dds`.

use tracing::debug;

use crate::filename::{identifier_for_filename, strip_pack_prefixes};

/// Parse manifest text into (name-space id, content-space id) pairs.
pub fn parse(def: &str) -> Vec<(u32, u32)> {
    let mut mappings = Vec::new();

    for line in def.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') || line.starts_with("//") {
            continue;
        }

        let Some((hash_part, file_part)) = line.split_once('|') else {
            continue;
        };

        let Ok(name_id) = u32::from_str_radix(hash_part.trim(), 16) else {
            continue;
        };

        let filename = strip_pack_prefixes(file_part.trim());
        let content_id = identifier_for_filename(filename);
        mappings.push((name_id, content_id));
    }

    debug!(mappings = mappings.len(), "parsed texmod.def");
    mappings
}
