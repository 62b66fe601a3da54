//! The two identifier hash spaces.
//!
//! A logical texture is named in two independent 32-bit spaces:
//!
//! - **name-space**: the game derives identifiers from texture names with a
//!   multiplicative string hash (a DJB variant seeded with `0xFFFF_FFFF`).
//! - **content-space**: TexMod-style packs derive identifiers from the decoded
//!   pixel payload with CRC-32.
//!
//! The content-space CRC is the TexMod variant: polynomial `0xEDB88320`,
//! initial value `0xFFFF_FFFF`, and *no* final XOR. It therefore does not
//! match the standard CRC-32 of the same bytes; values recorded in pack
//! manifests were produced by this exact function.

const CRC32_POLY: u32 = 0xEDB8_8320;

/// Hash a texture name into the name-space identifier.
///
/// Matches the game's string hash: `h = h * 33 + byte` over the raw bytes,
/// seeded with `0xFFFF_FFFF`.
#[inline]
pub fn name_hash(name: &str) -> u32 {
    name_hash_bytes(name.as_bytes())
}

/// Hash raw name bytes into the name-space identifier.
#[inline]
pub fn name_hash_bytes(data: &[u8]) -> u32 {
    let mut hash: u32 = 0xFFFF_FFFF;
    for &byte in data {
        hash = hash.wrapping_mul(33).wrapping_add(byte as u32);
    }
    hash
}

/// Hash a decoded bitmap payload into the content-space identifier.
pub fn content_hash(data: &[u8]) -> u32 {
    let mut crc: u32 = 0xFFFF_FFFF;
    for &byte in data {
        let mut cur = byte as u32;
        for _ in 0..8 {
            crc = (crc >> 1) ^ if (crc ^ cur) & 1 != 0 { CRC32_POLY } else { 0 };
            cur >>= 1;
        }
    }
    crc
}
