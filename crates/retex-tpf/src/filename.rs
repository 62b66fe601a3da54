//! Identifier extraction from pack entry filenames.
//!
//! Pack authors encode the content-space identifier in the filename
//! (`0x12345678.dds`, `speed_t_0X12345678.dds`) or use a plain texture name
//! (`specroad.dds`), in which case the identifier is the name-hash of the
//! base name. Known packaging prefixes are stripped first so that
//! `texmod.def` references and actual entry names agree.

use retex_common::hash::name_hash;

/// Packaging prefixes stripped (case-insensitively, repeatedly) before
/// identifier extraction.
const PACK_PREFIXES: &[&str] = &["SPEED.EXE_", "speed_t_"];

/// Strip known packaging prefixes from a name.
pub fn strip_pack_prefixes(name: &str) -> &str {
    let mut base = name.trim();
    loop {
        let mut stripped = false;
        for prefix in PACK_PREFIXES {
            // Byte-wise comparison: prefixes are ASCII, filenames may not be.
            let head = base.as_bytes().get(..prefix.len());
            if head.is_some_and(|h| h.eq_ignore_ascii_case(prefix.as_bytes())) {
                base = base[prefix.len()..].trim();
                stripped = true;
                break;
            }
        }
        if !stripped {
            return base;
        }
    }
}

/// Parse the identifier encoded in an entry filename.
///
/// Preference order: an explicit `0x` followed by eight hex digits anywhere
/// in the base name, then the right-most run of eight hex digits, then the
/// name-hash of the normalized base name (extension removed, packaging
/// prefixes stripped). Zero never counts as a parsed identifier.
pub fn identifier_for_filename(filename: &str) -> u32 {
    let name = filename.trim();
    let base = match name.rfind('.') {
        Some(dot) => name[..dot].trim(),
        None => name,
    };
    let base = strip_pack_prefixes(base);
    let bytes = base.as_bytes();

    // Explicit 0x-prefixed identifier.
    if bytes.len() >= 10 {
        for i in 0..=bytes.len() - 10 {
            if bytes[i] == b'0'
                && (bytes[i + 1] == b'x' || bytes[i + 1] == b'X')
                && bytes[i + 2..i + 10].iter().all(u8::is_ascii_hexdigit)
            {
                if let Ok(value) = u32::from_str_radix(&base[i + 2..i + 10], 16) {
                    if value != 0 {
                        return value;
                    }
                }
            }
        }
    }

    // Right-most run of eight hex digits.
    if bytes.len() >= 8 {
        for i in (0..=bytes.len() - 8).rev() {
            if bytes[i..i + 8].iter().all(u8::is_ascii_hexdigit) {
                if let Ok(value) = u32::from_str_radix(&base[i..i + 8], 16) {
                    if value != 0 {
                        return value;
                    }
                }
            }
        }
    }

    name_hash(base)
}
