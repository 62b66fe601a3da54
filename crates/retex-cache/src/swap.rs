//! Published lookup table and its rebuilder.
//!
//! The real-time consumer reads an immutable snapshot through a lock-free
//! pointer load every frame. Rebuilding constructs a brand-new snapshot from
//! the sharded tables and the translator, then swaps the published pointer
//! under a short publish lock; readers see either the fully-old or the
//! fully-new table, never an intermediate state. Retiring the old snapshot is
//! just dropping its `Arc`, which releases the one counted reference it held
//! on every texture handle.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use arc_swap::ArcSwapOption;
use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use tracing::{debug, info, warn};

use retex_common::TextureHandle;

use crate::table::ShardedTable;
use crate::translate::HashTranslator;

/// Immutable flattened identifier-to-texture snapshot.
pub struct SwapSnapshot {
    map: FxHashMap<u32, TextureHandle>,
}

impl SwapSnapshot {
    pub fn get(&self, hash: u32) -> Option<&TextureHandle> {
        self.map.get(&hash)
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

/// What a rebuild pass did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RebuildOutcome {
    /// A new snapshot was published; `retired` entries from the previous one
    /// were released.
    Published { entries: usize, retired: usize },
    /// The new snapshot was empty while a populated one existed, so the old
    /// snapshot was kept.
    KeptPrevious,
    /// A snapshot was already published and the rebuild was not forced.
    Skipped,
}

/// The published lookup table.
#[derive(Default)]
pub struct SwapTable {
    current: ArcSwapOption<SwapSnapshot>,
    publish_lock: Mutex<()>,
    built: AtomicBool,
}

impl SwapTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Non-blocking snapshot lookup for the real-time consumer.
    ///
    /// Never takes a lock and never default-constructs a texture; before the
    /// first publish every lookup is a miss.
    #[inline]
    pub fn lookup(&self, hash: u32) -> Option<TextureHandle> {
        let snapshot = self.current.load();
        snapshot.as_ref().and_then(|s| s.get(hash).cloned())
    }

    /// Whether a snapshot has ever been published.
    pub fn is_published(&self) -> bool {
        self.built.load(Ordering::Acquire)
    }

    /// Entry count of the currently published snapshot.
    pub fn published_len(&self) -> usize {
        self.current.load().as_ref().map_or(0, |s| s.len())
    }

    /// Build and publish a fresh snapshot from the loaded-texture table, with
    /// the translator as identifier fallback.
    ///
    /// Unless `force` is set, a rebuild is skipped once a snapshot exists.
    pub fn rebuild(
        &self,
        textures: &ShardedTable<TextureHandle>,
        translator: &HashTranslator,
        force: bool,
    ) -> RebuildOutcome {
        if self.built.load(Ordering::Acquire) && !force {
            debug!("swap table already built, skipping rebuild");
            return RebuildOutcome::Skipped;
        }

        let mut map: FxHashMap<u32, TextureHandle> = FxHashMap::default();

        // First pass: everything the loaders have inserted, under whichever
        // identifiers they used. Chains are visited newest-first, so the most
        // recent load wins for a duplicated identifier.
        textures.for_each(|hash, handle| {
            map.entry(hash).or_insert_with(|| handle.clone());
        });

        // Second pass: name identifiers the first pass missed, resolved
        // through the translator. A texture inserted only under its content
        // identifier still becomes reachable under every game name mapped to
        // it.
        let mut added_via_translation = 0;
        for (name_id, content_id) in translator.name_pairs() {
            if map.contains_key(&name_id) {
                continue;
            }
            let resolved = textures
                .lookup(name_id)
                .or_else(|| textures.lookup(content_id));
            if let Some(handle) = resolved {
                map.insert(name_id, handle);
                added_via_translation += 1;
            }
        }

        let entries = map.len();
        debug!(
            entries,
            added_via_translation, force, "built new swap snapshot"
        );

        // Check-swap-release must be atomic with respect to lookups: the
        // pointer store is the only publication step, and the old snapshot is
        // retired only after the new one is visible.
        let _publish = self.publish_lock.lock();
        let previous = self.current.load_full();

        if map.is_empty() && previous.is_some() {
            warn!("new swap snapshot is empty, keeping previous snapshot");
            return RebuildOutcome::KeptPrevious;
        }

        self.current.store(Some(Arc::new(SwapSnapshot { map })));
        self.built.store(true, Ordering::Release);

        let retired = previous.as_ref().map_or(0, |s| s.len());
        info!(entries, retired, "published swap snapshot");
        // Dropping `previous` here releases the retired snapshot's texture
        // references.
        RebuildOutcome::Published { entries, retired }
    }
}
