//! Bidirectional translator between the two identifier hash spaces.
//!
//! The game names textures in name-space; externally-authored packs name the
//! same textures in content-space. One content identifier can stand for many
//! name identifiers (the same texture reused under different material names),
//! never the reverse within a load session.
//!
//! Update frequency is low compared to the sharded tables, so a single
//! table-wide lock is enough here.

use std::collections::HashMap;
use std::path::Path;

use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::error::{Error, Result};

#[derive(Default)]
struct Maps {
    /// content-space -> every name-space identifier seen for it.
    content_to_names: FxHashMap<u32, Vec<u32>>,
    /// name-space -> content-space; last writer wins on conflict.
    name_to_content: FxHashMap<u32, u32>,
}

/// Translator between content-space and name-space identifiers.
#[derive(Default)]
pub struct HashTranslator {
    maps: Mutex<Maps>,
}

impl HashTranslator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that `name_id` refers to the texture with `content_id`.
    ///
    /// Idempotent: re-recording an existing pair changes nothing. On a
    /// conflicting name mapping the latest write wins; this is an accepted
    /// data-quality tradeoff of externally-authored manifests, logged and
    /// never treated as fatal.
    pub fn record_mapping(&self, content_id: u32, name_id: u32) {
        let mut maps = self.maps.lock();

        let names = maps.content_to_names.entry(content_id).or_default();
        if !names.contains(&name_id) {
            names.push(name_id);
        }

        if let Some(&previous) = maps.name_to_content.get(&name_id) {
            if previous != content_id {
                warn!(
                    name_id = format_args!("{name_id:#010x}"),
                    old = format_args!("{previous:#010x}"),
                    new = format_args!("{content_id:#010x}"),
                    "conflicting name mapping, keeping latest"
                );
            }
        }
        maps.name_to_content.insert(name_id, content_id);
    }

    /// Resolve a name-space identifier to its content-space identifier.
    pub fn translate_to_content(&self, name_id: u32) -> Option<u32> {
        self.maps.lock().name_to_content.get(&name_id).copied()
    }

    /// Resolve a content-space identifier to one of its name-space
    /// identifiers (the first recorded).
    pub fn translate_to_name(&self, content_id: u32) -> Option<u32> {
        let maps = self.maps.lock();
        maps.content_to_names
            .get(&content_id)
            .and_then(|names| names.first().copied())
    }

    /// All name-space identifiers recorded for a content identifier.
    pub fn all_names_for(&self, content_id: u32) -> Vec<u32> {
        let maps = self.maps.lock();
        maps.content_to_names
            .get(&content_id)
            .cloned()
            .unwrap_or_default()
    }

    /// Snapshot of every (name, content) pair, for the rebuilder's fallback
    /// pass.
    pub fn name_pairs(&self) -> Vec<(u32, u32)> {
        let maps = self.maps.lock();
        maps.name_to_content
            .iter()
            .map(|(&name, &content)| (name, content))
            .collect()
    }

    /// Number of recorded name-space identifiers.
    pub fn len(&self) -> usize {
        self.maps.lock().name_to_content.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Load a persisted mapping cache file.
    ///
    /// Supports the current format (`crc32_to_game` / `game_to_crc32`
    /// objects with decimal string keys) and the legacy flat map of hex
    /// content-identifier keys to decimal name identifiers. A missing file is
    /// not an error; the translator simply starts empty and learns from
    /// archive manifests at runtime.
    pub fn load_cache_file(&self, path: &Path) -> Result<usize> {
        let text = match std::fs::read_to_string(path) {
            Ok(text) => text,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "no mapping cache file, starting empty");
                return Ok(0);
            }
            Err(err) => return Err(Error::Io(err)),
        };

        let value: serde_json::Value = serde_json::from_str(&text)?;
        let loaded = if value.get("crc32_to_game").is_some() && value.get("game_to_crc32").is_some()
        {
            self.load_current_format(value)?
        } else {
            self.load_legacy_format(value)?
        };

        info!(
            path = %path.display(),
            mappings = loaded,
            "loaded identifier mapping cache"
        );
        Ok(loaded)
    }

    fn load_current_format(&self, value: serde_json::Value) -> Result<usize> {
        #[derive(Deserialize)]
        struct CacheFile {
            crc32_to_game: HashMap<String, Vec<u32>>,
            game_to_crc32: HashMap<String, u32>,
        }

        let file: CacheFile = serde_json::from_value(value)?;
        let mut loaded = 0;

        for (content_key, name_ids) in file.crc32_to_game {
            let content_id = parse_key(&content_key, 10)?;
            for name_id in name_ids {
                self.record_mapping(content_id, name_id);
                loaded += 1;
            }
        }
        // The reverse map may carry pairs the forward map misses.
        for (name_key, content_id) in file.game_to_crc32 {
            let name_id = parse_key(&name_key, 10)?;
            self.record_mapping(content_id, name_id);
        }

        Ok(loaded)
    }

    fn load_legacy_format(&self, value: serde_json::Value) -> Result<usize> {
        let file: HashMap<String, u32> = serde_json::from_value(value)?;
        let mut loaded = 0;

        for (content_key, name_id) in file {
            let content_id = parse_key(&content_key, 16)?;
            self.record_mapping(content_id, name_id);
            loaded += 1;
        }

        Ok(loaded)
    }
}

fn parse_key(key: &str, radix: u32) -> Result<u32> {
    let trimmed = key.trim().trim_start_matches("0x").trim_start_matches("0X");
    u32::from_str_radix(trimmed, radix).map_err(|_| Error::InvalidKey(key.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_and_translate() {
        let translator = HashTranslator::new();
        translator.record_mapping(0xCAFE_BABE, 0x1);
        translator.record_mapping(0xCAFE_BABE, 0x2);

        assert_eq!(translator.translate_to_content(0x1), Some(0xCAFE_BABE));
        assert_eq!(translator.translate_to_content(0x2), Some(0xCAFE_BABE));
        let name = translator.translate_to_name(0xCAFE_BABE).unwrap();
        assert!(name == 0x1 || name == 0x2);
        assert_eq!(translator.all_names_for(0xCAFE_BABE), vec![0x1, 0x2]);
    }

    #[test]
    fn test_record_mapping_idempotent() {
        let translator = HashTranslator::new();
        translator.record_mapping(0xCAFE_BABE, 0x1);
        translator.record_mapping(0xCAFE_BABE, 0x1);

        assert_eq!(translator.all_names_for(0xCAFE_BABE).len(), 1);
        assert_eq!(translator.translate_to_content(0x1), Some(0xCAFE_BABE));
    }

    #[test]
    fn test_conflicting_name_mapping_last_writer_wins() {
        let translator = HashTranslator::new();
        translator.record_mapping(0xAAAA_AAAA, 0x1);
        translator.record_mapping(0xBBBB_BBBB, 0x1);

        assert_eq!(translator.translate_to_content(0x1), Some(0xBBBB_BBBB));
        // The multi-value side keeps both associations.
        assert_eq!(translator.all_names_for(0xAAAA_AAAA), vec![0x1]);
        assert_eq!(translator.all_names_for(0xBBBB_BBBB), vec![0x1]);
    }

    #[test]
    fn test_translate_unknown_is_none() {
        let translator = HashTranslator::new();
        assert_eq!(translator.translate_to_content(0xDEAD), None);
        assert_eq!(translator.translate_to_name(0xDEAD), None);
        assert!(translator.all_names_for(0xDEAD).is_empty());
    }

    #[test]
    fn test_load_cache_file_current_format() {
        let dir = std::env::temp_dir().join("retex-translate-test-new");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("cache.json");
        std::fs::write(
            &path,
            r#"{
                "crc32_to_game": { "3405691582": [1, 2] },
                "game_to_crc32": { "1": 3405691582, "2": 3405691582 }
            }"#,
        )
        .unwrap();

        let translator = HashTranslator::new();
        let loaded = translator.load_cache_file(&path).unwrap();
        assert_eq!(loaded, 2);
        assert_eq!(translator.translate_to_content(1), Some(0xCAFE_BABE));
        assert_eq!(translator.translate_to_content(2), Some(0xCAFE_BABE));
    }

    #[test]
    fn test_load_cache_file_legacy_format() {
        let dir = std::env::temp_dir().join("retex-translate-test-old");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("cache.json");
        std::fs::write(&path, r#"{ "CAFEBABE": 7 }"#).unwrap();

        let translator = HashTranslator::new();
        let loaded = translator.load_cache_file(&path).unwrap();
        assert_eq!(loaded, 1);
        assert_eq!(translator.translate_to_content(7), Some(0xCAFE_BABE));
    }

    #[test]
    fn test_load_cache_file_missing_is_ok() {
        let translator = HashTranslator::new();
        let loaded = translator
            .load_cache_file(Path::new("/nonexistent/retex/cache.json"))
            .unwrap();
        assert_eq!(loaded, 0);
        assert!(translator.is_empty());
    }
}
