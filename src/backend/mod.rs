//! Concrete transform backends.
//!
//! - [`Identity`] - Passthrough in either direction
//! - [`Base64Encoder`] / [`Base64Decoder`] - Streaming standard Base64 (feature `base64`)
//! - [`ChaCha20Transform`] - ChaCha20 stream cipher (feature `chacha20`)
//! - [`AesCbcTransform`] - AES-CBC block cipher with optional PKCS#7 padding (feature `aes-cbc`)

mod identity;

#[cfg(feature = "base64")]
mod base64;

#[cfg(feature = "chacha20")]
mod chacha20;

#[cfg(feature = "aes-cbc")]
mod aes_cbc;

pub use identity::Identity;

#[cfg(feature = "base64")]
pub use self::base64::{Base64Decoder, Base64Encoder};

#[cfg(feature = "chacha20")]
pub use self::chacha20::{ChaCha20Transform, KEY_SIZE, NONCE_SIZE};

#[cfg(feature = "aes-cbc")]
pub use self::aes_cbc::{AES_BLOCK_SIZE, AesCbcTransform, PaddingMode};
