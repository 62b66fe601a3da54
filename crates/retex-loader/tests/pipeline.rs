//! End-to-end pipeline tests with a fake decoder.
//!
//! The decoder wraps raw bytes in a trivial texture so the whole path from
//! source registration through worker decode to published-snapshot lookup is
//! exercised without a graphics device.

use std::io::Write as _;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use retex_common::{
    DecodeError, DeviceContext, Texture, TextureDecoder, TextureHandle,
};
use retex_loader::{Error, LoaderConfig, LoaderContext, PipelineConfig};
use retex_tpf::xor_layer;

use zip::write::SimpleFileOptions;
use zip::ZipWriter;

struct FakeTexture(Vec<u8>);

impl Texture for FakeTexture {
    fn bitmap(&self) -> &[u8] {
        &self.0
    }
}

/// Decodes anything, optionally sleeping per call to hold workers busy.
struct FakeDecoder {
    delay: Duration,
}

impl FakeDecoder {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            delay: Duration::ZERO,
        })
    }

    fn slow(delay: Duration) -> Arc<Self> {
        Arc::new(Self { delay })
    }
}

impl TextureDecoder for FakeDecoder {
    fn decode_blob(
        &self,
        _device: &DeviceContext,
        bytes: &[u8],
    ) -> Result<TextureHandle, DecodeError> {
        if !self.delay.is_zero() {
            std::thread::sleep(self.delay);
        }
        Ok(Arc::new(FakeTexture(bytes.to_vec())))
    }

    fn load_file(
        &self,
        device: &DeviceContext,
        path: &std::path::Path,
    ) -> Result<TextureHandle, DecodeError> {
        let bytes = std::fs::read(path).map_err(|e| DecodeError(e.to_string()))?;
        self.decode_blob(device, &bytes)
    }
}

fn fresh_dir(tag: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("retex-pipeline-{tag}"));
    std::fs::remove_dir_all(&dir).ok();
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

fn wait_until(mut cond: impl FnMut() -> bool) {
    let deadline = Instant::now() + Duration::from_secs(10);
    while !cond() {
        assert!(Instant::now() < deadline, "timed out waiting for condition");
        std::thread::sleep(Duration::from_millis(5));
    }
}

fn new_context(decoder: Arc<dyn TextureDecoder>) -> LoaderContext {
    LoaderContext::new(decoder, LoaderConfig::default())
}

#[test]
fn test_file_sources_loaded_and_published() {
    let dir = fresh_dir("file-sources");
    let road = dir.join("road.dds");
    std::fs::write(&road, b"road pixels").unwrap();

    let ctx = new_context(FakeDecoder::new());
    ctx.notify_device_available(DeviceContext::new(()));

    ctx.add_source_id(0xAAAA_0001, &road).unwrap();
    // Registered but unreadable: decode fails at execution time.
    ctx.add_source_id(0xAAAA_0002, &dir.join("missing.dds"))
        .unwrap();

    wait_until(|| ctx.resolve_display_resource(0xAAAA_0001).is_some());

    assert!(ctx.resolve_display_resource(0xAAAA_0002).is_none());
    // The failed identifier keeps its path entry for a later forced retry.
    let entry = ctx.cache().path_for(0xAAAA_0002).unwrap();
    assert!(entry.path.ends_with("missing.dds"));

    let (expected, completed, loaded, failed) = ctx.progress();
    assert_eq!(expected, 2);
    assert_eq!(completed, 2);
    assert_eq!(loaded, 1);
    assert_eq!(failed, 1);
}

#[test]
fn test_add_source_rejects_missing_file_up_front() {
    let dir = fresh_dir("missing-up-front");
    let ctx = new_context(FakeDecoder::new());
    ctx.notify_device_available(DeviceContext::new(()));

    let err = ctx
        .add_source("tracks/road01", &dir.join("nope.dds"))
        .unwrap_err();
    assert!(matches!(err, Error::SourceMissing(_)));
    assert_eq!(ctx.cache().path_count(), 0);
}

#[test]
fn test_archive_manifest_publishes_under_both_identifiers() {
    let mut writer = ZipWriter::new(std::io::Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default();
    writer.start_file("texmod.def", options).unwrap();
    writer.write_all(b"00000055|0x00000077.dds\n").unwrap();
    writer.start_file("0x00000077.dds", options).unwrap();
    writer.write_all(b"archive pixels").unwrap();
    let mut tpf = writer.finish().unwrap().into_inner();
    xor_layer(&mut tpf);

    let ctx = new_context(FakeDecoder::new());
    ctx.notify_device_available(DeviceContext::new(()));

    let accepted = ctx.load_archive_bytes(tpf).unwrap();
    assert_eq!(accepted, 1);

    wait_until(|| ctx.resolve_display_resource(0x55).is_some());

    // The manifest name and the entry's own identifier resolve to the same
    // texture instance.
    let by_name = ctx.resolve_display_resource(0x55).unwrap();
    let by_content = ctx.resolve_display_resource(0x77).unwrap();
    assert!(Arc::ptr_eq(&by_name, &by_content));
    assert_eq!(by_name.bitmap(), b"archive pixels");
}

#[test]
fn test_without_device_jobs_fail_and_lookups_miss() {
    let dir = fresh_dir("no-device");
    let road = dir.join("road.dds");
    std::fs::write(&road, b"road pixels").unwrap();

    let ctx = new_context(FakeDecoder::new());
    // No notify_device_available.
    ctx.add_source_id(0xAAAA_0001, &road).unwrap();

    wait_until(|| ctx.progress().1 == 1);
    let (_, _, loaded, failed) = ctx.progress();
    assert_eq!(loaded, 0);
    assert_eq!(failed, 1);
    assert!(ctx.resolve_display_resource(0xAAAA_0001).is_none());
}

#[test]
fn test_saturated_queue_reports_accepted_count() {
    let dir = fresh_dir("saturation");
    let road = dir.join("road.dds");
    std::fs::write(&road, b"road pixels").unwrap();

    let config = LoaderConfig {
        mapping_cache: None,
        pipeline: PipelineConfig {
            queue_capacity: 1,
            worker_count: Some(2),
        },
    };
    let ctx = LoaderContext::new(FakeDecoder::slow(Duration::from_millis(200)), config);
    ctx.notify_device_available(DeviceContext::new(()));

    let mut saturated = None;
    for i in 0..64u32 {
        match ctx.add_source_id(0xBBBB_0000 + i, &road) {
            Ok(_) => continue,
            Err(err) => {
                saturated = Some(err);
                break;
            }
        }
    }

    match saturated {
        Some(Error::QueueSaturated { accepted }) => assert_eq!(accepted, 0),
        other => panic!("expected queue saturation, got {other:?}"),
    }

    // Rejected submissions were withdrawn from the totals; the accepted jobs
    // still drain cleanly.
    let (expected, ..) = ctx.progress();
    assert!(expected < 64);
    wait_until(|| ctx.progress().1 == ctx.progress().0);
}

#[test]
fn test_source_set_change_forces_republish() {
    let dir = fresh_dir("source-change");
    let first = dir.join("first.dds");
    let second = dir.join("second.dds");
    std::fs::write(&first, b"first pixels").unwrap();
    std::fs::write(&second, b"second pixels").unwrap();

    let ctx = new_context(FakeDecoder::new());
    ctx.notify_device_available(DeviceContext::new(()));
    ctx.add_source_id(0x1, &first).unwrap();
    wait_until(|| ctx.resolve_display_resource(0x1).is_some());

    // Without the dirty mark a later drain would leave the published table
    // as-is; with it the rebuild runs forced and picks up the new source.
    ctx.notify_source_set_changed();
    ctx.notify_device_available(DeviceContext::new(()));
    ctx.add_source_id(0x2, &second).unwrap();

    wait_until(|| ctx.resolve_display_resource(0x2).is_some());
    assert!(ctx.resolve_display_resource(0x1).is_some());
}

#[test]
fn test_shutdown_releases_device_and_is_idempotent() {
    let ctx = new_context(FakeDecoder::new());
    ctx.notify_device_available(DeviceContext::new(()));
    ctx.shutdown();
    ctx.shutdown();

    assert!(matches!(
        ctx.add_source_id(0x1, std::path::Path::new("road.dds")),
        Err(Error::PipelineUnavailable)
    ));
}
