//! Asynchronous texture loading pipeline.
//!
//! A bounded job queue drained by a fixed pool of worker threads. Pickup is
//! FIFO, but with several workers pulling concurrently there is no global
//! completion-order guarantee across jobs. Workers block on the queue with a
//! bounded timeout so the stop flag is observed within one interval even when
//! no work arrives.
//!
//! Completion counting is race-free by construction: every accepted job is
//! reserved in the expected total *before* it enters the queue, every job
//! completes exactly once (success or failure), and the worker whose
//! completion makes the count reach the total triggers the rebuild. No
//! fallback bookkeeping is needed.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender, TrySendError};
use parking_lot::Mutex;
use tracing::{debug, error, info, warn};

use retex_cache::TextureCache;
use retex_common::hash::content_hash;
use retex_common::TextureDecoder;

use crate::device::DeviceSlot;
use crate::error::{Error, Result};
use crate::job::{Job, JobSource};

/// How long a worker waits on the queue before re-checking the stop flag.
const QUEUE_WAIT: Duration = Duration::from_millis(500);

/// Minimum and maximum worker pool size.
const MIN_WORKERS: usize = 2;
const MAX_WORKERS: usize = 16;

/// Pipeline tuning knobs.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Bounded job queue capacity.
    pub queue_capacity: usize,
    /// Worker count override; defaults to hardware concurrency clamped to
    /// [`MIN_WORKERS`]..=[`MAX_WORKERS`].
    pub worker_count: Option<usize>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            queue_capacity: 4096,
            worker_count: None,
        }
    }
}

enum Work {
    Load(Job),
    /// No-op used to wake blocked workers at shutdown.
    Wakeup,
}

struct Shared {
    cache: Arc<TextureCache>,
    decoder: Arc<dyn TextureDecoder>,
    device: DeviceSlot,
    /// Serializes decoder invocations; the underlying graphics API is not
    /// proven safe for concurrent texture creation.
    decode_lock: Mutex<()>,
    stop: AtomicBool,
    expected: AtomicUsize,
    completed: AtomicUsize,
    loaded: AtomicUsize,
    failed: AtomicUsize,
    blob_expected: AtomicUsize,
    blob_completed: AtomicUsize,
    /// Next drain-triggered rebuild runs forced.
    force_rebuild: AtomicBool,
}

/// The worker pool and its job queue.
pub struct Pipeline {
    shared: Arc<Shared>,
    sender: Sender<Work>,
    workers: Mutex<Vec<JoinHandle<()>>>,
}

impl Pipeline {
    /// Create the queue and spawn the worker pool.
    ///
    /// Worker creation failure is the only startup-fatal condition: the
    /// pipeline reports itself unavailable and the caller degrades to "no
    /// replacement" lookups.
    pub fn new(
        cache: Arc<TextureCache>,
        decoder: Arc<dyn TextureDecoder>,
        device: DeviceSlot,
        config: &PipelineConfig,
    ) -> Result<Self> {
        let worker_count = config
            .worker_count
            .unwrap_or_else(default_worker_count)
            .clamp(MIN_WORKERS, MAX_WORKERS);

        let (sender, receiver) = crossbeam_channel::bounded(config.queue_capacity.max(1));
        let shared = Arc::new(Shared {
            cache,
            decoder,
            device,
            decode_lock: Mutex::new(()),
            stop: AtomicBool::new(false),
            expected: AtomicUsize::new(0),
            completed: AtomicUsize::new(0),
            loaded: AtomicUsize::new(0),
            failed: AtomicUsize::new(0),
            blob_expected: AtomicUsize::new(0),
            blob_completed: AtomicUsize::new(0),
            force_rebuild: AtomicBool::new(false),
        });

        let mut workers = Vec::with_capacity(worker_count);
        for index in 0..worker_count {
            let worker_shared = Arc::clone(&shared);
            let receiver: Receiver<Work> = receiver.clone();
            let spawned = std::thread::Builder::new()
                .name(format!("retex-worker-{index}"))
                .spawn(move || worker_loop(worker_shared, receiver));
            match spawned {
                Ok(handle) => workers.push(handle),
                Err(err) => {
                    error!(%err, "failed to spawn worker thread");
                    // Undo the partially built pool before reporting failure.
                    shared.stop.store(true, Ordering::Release);
                    for _ in &workers {
                        sender.try_send(Work::Wakeup).ok();
                    }
                    for handle in workers {
                        handle.join().ok();
                    }
                    return Err(Error::PipelineUnavailable);
                }
            }
        }

        info!(worker_count, "loading pipeline started");
        Ok(Self {
            shared,
            sender,
            workers: Mutex::new(workers),
        })
    }

    /// Submit a batch of jobs.
    ///
    /// Each job is reserved in the expected totals before it enters the
    /// queue. On a saturated queue the error reports how many jobs were
    /// accepted so the caller can surface partial progress.
    pub fn submit(&self, jobs: Vec<Job>) -> Result<usize> {
        if self.shared.stop.load(Ordering::Acquire) {
            return Err(Error::PipelineUnavailable);
        }

        let mut accepted = 0;
        for job in jobs {
            let is_blob = matches!(job.source, JobSource::Blob { .. });
            self.shared.expected.fetch_add(1, Ordering::AcqRel);
            if is_blob {
                self.shared.blob_expected.fetch_add(1, Ordering::AcqRel);
            }

            match self.sender.try_send(Work::Load(job)) {
                Ok(()) => accepted += 1,
                Err(err) => {
                    // Withdraw the reservation, then re-check the drain
                    // condition: the last in-flight completion may have
                    // compared against the now-withdrawn total.
                    self.shared.expected.fetch_sub(1, Ordering::AcqRel);
                    if is_blob {
                        self.shared.blob_expected.fetch_sub(1, Ordering::AcqRel);
                    }
                    self.check_drain_after_withdrawal();

                    return match err {
                        TrySendError::Full(_) => {
                            warn!(accepted, "job queue saturated");
                            Err(Error::QueueSaturated { accepted })
                        }
                        TrySendError::Disconnected(_) => Err(Error::PipelineUnavailable),
                    };
                }
            }
        }
        Ok(accepted)
    }

    fn check_drain_after_withdrawal(&self) {
        let expected = self.shared.expected.load(Ordering::Acquire);
        if expected > 0 && self.shared.completed.load(Ordering::Acquire) == expected {
            let force = self.shared.force_rebuild.swap(false, Ordering::AcqRel);
            self.shared.cache.rebuild(force);
        }
    }

    /// Make the next drain-triggered rebuild forced.
    pub fn force_next_rebuild(&self) {
        self.shared.force_rebuild.store(true, Ordering::Release);
    }

    /// Jobs reserved so far this session.
    pub fn expected(&self) -> usize {
        self.shared.expected.load(Ordering::Acquire)
    }

    /// Jobs finished, successfully or not.
    pub fn completed(&self) -> usize {
        self.shared.completed.load(Ordering::Acquire)
    }

    /// Successfully loaded textures.
    pub fn loaded(&self) -> usize {
        self.shared.loaded.load(Ordering::Acquire)
    }

    /// Failed jobs. Their path entries remain for a later forced rebuild.
    pub fn failed(&self) -> usize {
        self.shared.failed.load(Ordering::Acquire)
    }

    /// Stop the workers, drain them out, and release the held device
    /// reference. In-flight decodes complete; queued jobs are abandoned.
    pub fn shutdown(&self) {
        let mut workers = self.workers.lock();
        if workers.is_empty() {
            return;
        }

        self.shared.stop.store(true, Ordering::Release);
        for _ in workers.iter() {
            self.sender.try_send(Work::Wakeup).ok();
        }
        for handle in workers.drain(..) {
            handle.join().ok();
        }
        self.shared.device.clear();
        info!("loading pipeline stopped");
    }
}

impl Drop for Pipeline {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn default_worker_count() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(MIN_WORKERS)
}

fn worker_loop(shared: Arc<Shared>, receiver: Receiver<Work>) {
    loop {
        if shared.stop.load(Ordering::Acquire) {
            break;
        }
        match receiver.recv_timeout(QUEUE_WAIT) {
            Ok(Work::Load(job)) => execute(&shared, job),
            Ok(Work::Wakeup) => continue,
            Err(RecvTimeoutError::Timeout) => continue,
            Err(RecvTimeoutError::Disconnected) => break,
        }
    }
}

fn execute(shared: &Shared, job: Job) {
    let is_blob = matches!(job.source, JobSource::Blob { .. });
    let hash = job.hash;

    // Resolve the device at execution time; it may have been replaced (or
    // not yet provided) since submission.
    let Some(device) = shared.device.current() else {
        warn!(hash = format_args!("{hash:#010x}"), "no device, dropping job");
        finish(shared, is_blob, false);
        return;
    };

    let decoded = {
        let _serial = shared.decode_lock.lock();
        match &job.source {
            JobSource::File { path } => shared
                .decoder
                .load_file(device.as_ref(), std::path::Path::new(path)),
            JobSource::Blob { data, .. } => shared.decoder.decode_blob(device.as_ref(), data),
        }
    };

    match decoded {
        Ok(texture) => {
            match &job.source {
                JobSource::File { .. } => {
                    // Back-fill the path entry's content identifier so later
                    // sessions can reconcile the two hash spaces.
                    let content = content_hash(texture.bitmap());
                    if content != 0 {
                        shared.cache.set_content_hash(hash, content);
                    }
                    shared.cache.insert_texture(hash, texture);
                }
                JobSource::Blob { .. } => {
                    // Insert under the content identifier and under every
                    // name identifier the manifest mapped onto it.
                    shared.cache.insert_texture(hash, texture.clone());
                    for name_id in shared.cache.translator().all_names_for(hash) {
                        shared.cache.insert_texture(name_id, texture.clone());
                    }
                }
            }
            finish(shared, is_blob, true);
        }
        Err(err) => {
            // The path entry is retained; a forced rebuild can retry it.
            warn!(
                hash = format_args!("{hash:#010x}"),
                source = ?job.source_name(),
                %err,
                "texture load failed"
            );
            finish(shared, is_blob, false);
        }
    }
}

fn finish(shared: &Shared, is_blob: bool, success: bool) {
    if success {
        shared.loaded.fetch_add(1, Ordering::AcqRel);
    } else {
        shared.failed.fetch_add(1, Ordering::AcqRel);
    }

    if is_blob {
        let done = shared.blob_completed.fetch_add(1, Ordering::AcqRel) + 1;
        let total = shared.blob_expected.load(Ordering::Acquire);
        if total > 0 && done == total {
            debug!(done, "all archive textures processed, forcing rebuild");
            shared.cache.rebuild(true);
        }
    }

    let done = shared.completed.fetch_add(1, Ordering::AcqRel) + 1;
    let total = shared.expected.load(Ordering::Acquire);
    if done % 100 == 0 || done == total {
        info!(done, total, "texture loading progress");
    }
    if total > 0 && done == total {
        let force = shared.force_rebuild.swap(false, Ordering::AcqRel);
        shared.cache.rebuild(force);
    }
}
