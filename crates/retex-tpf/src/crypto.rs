//! TPF encryption constants and the outer XOR layer.
//!
//! A TPF container is a ZIP archive wrapped in two layers:
//!
//! 1. the whole file is XORed with a fixed 32-bit key, and
//! 2. individual entries may additionally use standard ZipCrypto with a
//!    fixed 42-byte key.
//!
//! Neither key is a secret; both are hardcoded in every tool that reads the
//! format.

/// The 32-bit key of the outer XOR layer, applied little-endian byte by byte.
const TPF_XOR_KEY: u32 = 0x3FA4_3FA4;

/// The ZipCrypto key used for encrypted entries, passed to the ZIP reader as
/// the archive password.
pub const TPF_ZIP_KEY: [u8; 42] = [
    0x73, 0x2A, 0x63, 0x7D, 0x5F, 0x0A, 0xA6, 0xBD, 0x7D, 0x65, 0x7E, 0x67, 0x61, 0x2A, 0x7F,
    0x7F, 0x74, 0x61, 0x67, 0x5B, 0x60, 0x70, 0x45, 0x74, 0x5C, 0x22, 0x74, 0x5D, 0x6E, 0x6A,
    0x73, 0x41, 0x77, 0x6E, 0x46, 0x47, 0x77, 0x49, 0x0C, 0x4B, 0x46, 0x6F,
];

/// Apply the outer XOR layer in place.
///
/// XOR is its own inverse, so the same call encrypts and decrypts.
pub fn xor_layer(data: &mut [u8]) {
    let key = TPF_XOR_KEY.to_le_bytes();
    for (i, byte) in data.iter_mut().enumerate() {
        *byte ^= key[i & 3];
    }
}
