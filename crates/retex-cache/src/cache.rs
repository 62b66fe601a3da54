//! The assembled texture cache: three sharded tables, the translator, and
//! the published swap table, behind one owner.

use retex_common::{TextureHandle, TextureKind};

use crate::arena::StringArena;
use crate::swap::{RebuildOutcome, SwapTable};
use crate::table::{PathEntry, ShardedTable};
use crate::translate::HashTranslator;

/// Every store the loading pipeline and the real-time consumer share.
///
/// Path and texture entries are never deleted during a session; only the
/// texture handles referenced by a retired swap snapshot are ever released.
pub struct TextureCache {
    arena: &'static StringArena,
    paths: ShardedTable<PathEntry>,
    textures: ShardedTable<TextureHandle>,
    volumes: ShardedTable<TextureHandle>,
    translator: HashTranslator,
    swap: SwapTable,
}

impl TextureCache {
    pub fn new() -> Self {
        Self {
            arena: StringArena::leaked(),
            paths: ShardedTable::new(),
            textures: ShardedTable::new(),
            volumes: ShardedTable::new(),
            translator: HashTranslator::new(),
            swap: SwapTable::new(),
        }
    }

    /// Record a source path for an identifier and return the interned copy.
    /// The path string lives in the process-lifetime arena.
    pub fn add_path(&self, hash: u32, path: &str) -> &'static str {
        let interned = self.arena.intern(path);
        self.paths.insert(hash, PathEntry::new(interned));
        interned
    }

    /// Source path recorded for an identifier, if any.
    pub fn path_for(&self, hash: u32) -> Option<PathEntry> {
        self.paths.lookup(hash)
    }

    /// Back-fill the content-space identifier on a path entry after its
    /// resource was first loaded.
    pub fn set_content_hash(&self, hash: u32, content_hash: u32) -> bool {
        self.paths.update(hash, |entry| entry.content_hash = content_hash)
    }

    /// Number of recorded path entries.
    pub fn path_count(&self) -> usize {
        self.paths.len()
    }

    /// Insert a loaded texture under an identifier, routed to the plain or
    /// volume table by its kind.
    pub fn insert_texture(&self, hash: u32, handle: TextureHandle) {
        match handle.kind() {
            TextureKind::Plain => self.textures.insert(hash, handle),
            TextureKind::Volume => self.volumes.insert(hash, handle),
        }
    }

    /// Loaded plain texture for an identifier.
    pub fn texture(&self, hash: u32) -> Option<TextureHandle> {
        self.textures.lookup(hash)
    }

    /// Loaded volume texture for an identifier.
    pub fn volume_texture(&self, hash: u32) -> Option<TextureHandle> {
        self.volumes.lookup(hash)
    }

    pub fn paths(&self) -> &ShardedTable<PathEntry> {
        &self.paths
    }

    pub fn textures(&self) -> &ShardedTable<TextureHandle> {
        &self.textures
    }

    pub fn translator(&self) -> &HashTranslator {
        &self.translator
    }

    pub fn swap(&self) -> &SwapTable {
        &self.swap
    }

    /// Rebuild and publish the flattened lookup snapshot.
    pub fn rebuild(&self, force: bool) -> RebuildOutcome {
        self.swap.rebuild(&self.textures, &self.translator, force)
    }

    /// Non-blocking published-snapshot lookup for the real-time consumer.
    #[inline]
    pub fn resolve(&self, hash: u32) -> Option<TextureHandle> {
        self.swap.lookup(hash)
    }
}

impl Default for TextureCache {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use retex_common::Texture;

    struct FakeTexture {
        bytes: Vec<u8>,
        kind: TextureKind,
    }

    impl Texture for FakeTexture {
        fn bitmap(&self) -> &[u8] {
            &self.bytes
        }

        fn kind(&self) -> TextureKind {
            self.kind
        }
    }

    fn plain() -> TextureHandle {
        Arc::new(FakeTexture {
            bytes: vec![0xAB],
            kind: TextureKind::Plain,
        })
    }

    fn volume() -> TextureHandle {
        Arc::new(FakeTexture {
            bytes: vec![0xCD],
            kind: TextureKind::Volume,
        })
    }

    #[test]
    fn test_path_roundtrip_and_content_backfill() {
        let cache = TextureCache::new();
        cache.add_path(0xAAAA_0001, "packs/road.dds");

        let entry = cache.path_for(0xAAAA_0001).unwrap();
        assert_eq!(entry.path, "packs/road.dds");
        assert_eq!(entry.content_hash, 0);

        assert!(cache.set_content_hash(0xAAAA_0001, 0xCAFE_BABE));
        assert_eq!(cache.path_for(0xAAAA_0001).unwrap().content_hash, 0xCAFE_BABE);
    }

    #[test]
    fn test_textures_route_by_kind() {
        let cache = TextureCache::new();
        cache.insert_texture(0x1, plain());
        cache.insert_texture(0x2, volume());

        assert!(cache.texture(0x1).is_some());
        assert!(cache.volume_texture(0x1).is_none());
        assert!(cache.texture(0x2).is_none());
        assert!(cache.volume_texture(0x2).is_some());
    }

    #[test]
    fn test_resolve_goes_through_published_snapshot() {
        let cache = TextureCache::new();
        cache.insert_texture(0x77, plain());

        // Nothing published yet.
        assert!(cache.resolve(0x77).is_none());

        cache.rebuild(false);
        assert!(cache.resolve(0x77).is_some());
    }
}
