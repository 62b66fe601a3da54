//! Common types for retex.
//!
//! This crate provides the foundations shared by the retex cache and loading
//! pipeline:
//!
//! - [`hash`] - the two identifier hash spaces (name-space and content-space)
//! - [`Texture`] / [`TextureHandle`] - opaque reference-counted GPU textures
//! - [`TextureDecoder`] - the host's platform image decoder boundary
//! - [`DeviceContext`] - opaque handle to the host's graphics device

mod texture;

pub mod hash;

pub use texture::{
    DecodeError, DeviceContext, Texture, TextureDecoder, TextureHandle, TextureKind,
};
