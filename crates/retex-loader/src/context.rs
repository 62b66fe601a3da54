//! Host boundary: one object owning the cache, the device slot, and the
//! pipeline.
//!
//! The host drives the context with three notifications (device available,
//! source set changed, shutdown) plus the per-frame resolve call. Everything
//! else (source registration, archive loading) feeds the pipeline.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use tracing::{error, info, warn};

use retex_cache::TextureCache;
use retex_common::hash::name_hash;
use retex_common::{DeviceContext, TextureDecoder, TextureHandle};
use retex_tpf::TpfArchive;

use crate::device::DeviceSlot;
use crate::error::{Error, Result};
use crate::job::{Job, JobSource};
use crate::pipeline::{Pipeline, PipelineConfig};

/// Context construction options.
#[derive(Debug, Clone, Default)]
pub struct LoaderConfig {
    /// Persisted identifier-mapping cache from earlier sessions. Absence is
    /// not an error.
    pub mapping_cache: Option<PathBuf>,
    pub pipeline: PipelineConfig,
}

/// The loading system as the host sees it.
///
/// If the pipeline cannot be brought up the context still constructs; every
/// resolve then misses and submissions report [`Error::PipelineUnavailable`].
pub struct LoaderContext {
    cache: Arc<TextureCache>,
    device: DeviceSlot,
    pipeline: Option<Pipeline>,
    /// Set by [`notify_source_set_changed`](Self::notify_source_set_changed),
    /// consumed by the next device notification.
    sources_dirty: AtomicBool,
    resolve_calls: AtomicU64,
    resolve_hits: AtomicU64,
}

impl LoaderContext {
    pub fn new(decoder: Arc<dyn TextureDecoder>, config: LoaderConfig) -> Self {
        let cache = Arc::new(TextureCache::new());

        if let Some(path) = &config.mapping_cache {
            match cache.translator().load_cache_file(path) {
                Ok(0) => {}
                Ok(loaded) => info!(loaded, path = %path.display(), "loaded mapping cache"),
                Err(err) => warn!(%err, path = %path.display(), "ignoring mapping cache"),
            }
        }

        let device = DeviceSlot::new();
        let pipeline = match Pipeline::new(
            Arc::clone(&cache),
            decoder,
            device.clone(),
            &config.pipeline,
        ) {
            Ok(pipeline) => Some(pipeline),
            Err(err) => {
                error!(%err, "pipeline unavailable, texture replacement disabled");
                None
            }
        };

        Self {
            cache,
            device,
            pipeline,
            sources_dirty: AtomicBool::new(false),
            resolve_calls: AtomicU64::new(0),
            resolve_hits: AtomicU64::new(0),
        }
    }

    /// Per-frame replacement lookup. Never blocks and never
    /// default-constructs a texture; `None` means "use the original".
    #[inline]
    pub fn resolve_display_resource(&self, hash: u32) -> Option<TextureHandle> {
        self.resolve_calls.fetch_add(1, Ordering::Relaxed);
        let found = self.cache.resolve(hash);
        if found.is_some() {
            self.resolve_hits.fetch_add(1, Ordering::Relaxed);
        }
        found
    }

    /// Store the rendering device capability. A replaced device takes effect
    /// on the next job execution; if the source set changed since the last
    /// notification, the next drain rebuild runs forced so retired sources
    /// disappear from the published table.
    pub fn notify_device_available(&self, device: DeviceContext) {
        self.device.store(Arc::new(device));
        if self.sources_dirty.swap(false, Ordering::AcqRel) {
            if let Some(pipeline) = &self.pipeline {
                pipeline.force_next_rebuild();
            }
        }
        info!("rendering device available");
    }

    /// Mark the replacement source set dirty. Takes effect on the next device
    /// notification.
    pub fn notify_source_set_changed(&self) {
        self.sources_dirty.store(true, Ordering::Release);
    }

    /// Register a loose replacement file by name and queue it for loading.
    /// The identifier is the name-space hash of `name`.
    ///
    /// The file must exist at registration time; a missing source is reported
    /// and nothing is recorded for it.
    pub fn add_source(&self, name: &str, path: &Path) -> Result<u32> {
        if !path.is_file() {
            return Err(Error::SourceMissing(path.to_path_buf()));
        }
        self.add_source_id(name_hash(name), path)
    }

    /// Register a loose replacement file under an explicit identifier and
    /// queue it for loading.
    ///
    /// No existence check: the path entry is always recorded, and a file that
    /// turns out to be unreadable fails at decode time while its entry stays
    /// for a later forced rebuild.
    pub fn add_source_id(&self, hash: u32, path: &Path) -> Result<u32> {
        let path_str = path.to_string_lossy();
        // The interned copy outlives the job.
        let interned = self.cache.add_path(hash, &path_str);

        self.pipeline()?.submit(vec![Job {
            hash,
            source: JobSource::File { path: interned },
        }])?;
        Ok(hash)
    }

    /// Open a pack archive from disk and queue all of its textures.
    pub fn load_archive_file(&self, path: &Path) -> Result<usize> {
        let archive = TpfArchive::open(path)?;
        info!(path = %path.display(), entries = archive.entry_count(), "loading archive");
        self.queue_archive(archive)
    }

    /// Load a pack archive already held in memory.
    pub fn load_archive_bytes(&self, data: Vec<u8>) -> Result<usize> {
        let archive = TpfArchive::from_bytes(data)?;
        self.queue_archive(archive)
    }

    fn queue_archive(&self, archive: TpfArchive) -> Result<usize> {
        // Manifest mappings are recorded before any entry is queued, so a
        // worker that finishes first already sees every name identifier its
        // texture should be published under.
        for &(name_id, content_id) in archive.mappings() {
            self.cache.translator().record_mapping(content_id, name_id);
        }

        let jobs: Vec<Job> = archive
            .into_entries()
            .into_iter()
            .map(|entry| Job {
                hash: entry.hash,
                source: JobSource::Blob {
                    name: entry.name,
                    data: entry.data,
                },
            })
            .collect();

        self.pipeline()?.submit(jobs)
    }

    /// Rebuild and publish the flattened lookup table immediately.
    pub fn rebuild(&self, force: bool) {
        self.cache.rebuild(force);
    }

    /// (total submitted, completed, loaded, failed) so far this session.
    pub fn progress(&self) -> (usize, usize, usize, usize) {
        match &self.pipeline {
            Some(p) => (p.expected(), p.completed(), p.loaded(), p.failed()),
            None => (0, 0, 0, 0),
        }
    }

    /// (resolve calls, resolve hits) since construction.
    pub fn resolve_stats(&self) -> (u64, u64) {
        (
            self.resolve_calls.load(Ordering::Relaxed),
            self.resolve_hits.load(Ordering::Relaxed),
        )
    }

    pub fn cache(&self) -> &TextureCache {
        &self.cache
    }

    /// Stop the workers and release the device. Idempotent; also runs on
    /// drop.
    pub fn shutdown(&self) {
        if let Some(pipeline) = &self.pipeline {
            pipeline.shutdown();
        } else {
            self.device.clear();
        }
        let (calls, hits) = self.resolve_stats();
        info!(calls, hits, "loader context shut down");
    }

    fn pipeline(&self) -> Result<&Pipeline> {
        self.pipeline.as_ref().ok_or(Error::PipelineUnavailable)
    }
}

impl Drop for LoaderContext {
    fn drop(&mut self) {
        self.shutdown();
    }
}
