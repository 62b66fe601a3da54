//! Opaque texture and device types at the host boundary.
//!
//! The cache never interprets texture memory itself; it stores reference
//! counted handles produced by the host's decoder. [`TextureHandle`] is an
//! `Arc`, and every handle held by a cache entry or a published snapshot is
//! one counted reference, released only when that entry or snapshot is
//! retired.

use std::any::Any;
use std::path::Path;
use std::sync::Arc;

/// Which cache table a decoded texture belongs in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextureKind {
    /// Plain 2D texture.
    Plain,
    /// Volumetric (3D) texture, kept in its own table.
    Volume,
}

/// A loaded GPU-displayable texture.
///
/// Implemented by the host's graphics layer. The raw bitmap bytes of the top
/// mip level are exposed so the cache can derive the content-space identifier.
pub trait Texture: Send + Sync + 'static {
    /// Raw bytes of the decoded level-0 bitmap.
    fn bitmap(&self) -> &[u8];

    fn kind(&self) -> TextureKind {
        TextureKind::Plain
    }
}

/// Reference-counted texture handle. Cloning takes a counted reference.
pub type TextureHandle = Arc<dyn Texture>;

/// Opaque handle to the host's graphics device.
///
/// The device may legitimately be replaced while the pipeline is running, so
/// jobs never capture a `DeviceContext` directly; they resolve the current one
/// through a `DeviceSlot` at execution time.
pub struct DeviceContext {
    inner: Box<dyn Any + Send + Sync>,
}

impl DeviceContext {
    pub fn new<T: Any + Send + Sync>(device: T) -> Self {
        Self {
            inner: Box::new(device),
        }
    }

    /// Downcast to the host's concrete device type.
    pub fn get<T: Any>(&self) -> Option<&T> {
        self.inner.downcast_ref::<T>()
    }
}

impl std::fmt::Debug for DeviceContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeviceContext").finish_non_exhaustive()
    }
}

/// The host's platform image decoder.
///
/// Success or failure is the whole contract; there is no side channel. A
/// failed decode must not leave partial state behind.
pub trait TextureDecoder: Send + Sync + 'static {
    /// Create a texture from an in-memory image blob (DDS or similar).
    fn decode_blob(
        &self,
        device: &DeviceContext,
        bytes: &[u8],
    ) -> Result<TextureHandle, DecodeError>;

    /// Create a texture from an image file on disk.
    fn load_file(&self, device: &DeviceContext, path: &Path) -> Result<TextureHandle, DecodeError>;
}

/// Decoder rejection, carried back to the pipeline for logging.
#[derive(Debug, Clone)]
pub struct DecodeError(pub String);

impl std::fmt::Display for DecodeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::error::Error for DecodeError {}
