//! ChaCha20 stream cipher transform.

use std::fmt;

use ::chacha20::ChaCha20;
use ::chacha20::cipher::{KeyIvInit, StreamCipher};
use zeroize::Zeroizing;

use crate::config::ChunkConfig;
use crate::error::{Result, Routine, TransformError};
use crate::transform::{Direction, Rational, Transform};

const NAME: &str = "chacha20";

/// ChaCha20 key size in bytes.
pub const KEY_SIZE: usize = 32;

/// ChaCha20 (IETF) nonce size in bytes.
pub const NONCE_SIZE: usize = 12;

/// ChaCha20 keystream XOR, forward to encrypt and inverse to decrypt.
///
/// Key and nonce lengths are checked by `init`, which also restarts the
/// keystream. This is unauthenticated encryption.
///
/// # Example
///
/// ```
/// use chunkform::{ChaCha20Transform, Pipeline, Single};
///
/// let key = [7u8; 32];
/// let nonce = [1u8; 12];
///
/// let sealed = Single::new(ChaCha20Transform::encryptor(&key, &nonce))?.transform_bytes(b"secret")?;
/// let opened = Single::new(ChaCha20Transform::decryptor(&key, &nonce))?.transform_bytes(&sealed)?;
/// assert_eq!(&opened[..], b"secret");
/// # Ok::<(), chunkform::TransformError>(())
/// ```
pub struct ChaCha20Transform {
    key: Zeroizing<Vec<u8>>,
    nonce: Vec<u8>,
    direction: Direction,
    config: ChunkConfig,
    cipher: Option<ChaCha20>,
}

impl ChaCha20Transform {
    /// Creates a cipher stage running in `direction`.
    pub fn new(key: &[u8], nonce: &[u8], direction: Direction) -> Self {
        Self {
            key: Zeroizing::new(key.to_vec()),
            nonce: nonce.to_vec(),
            direction,
            config: ChunkConfig::default(),
            cipher: None,
        }
    }

    /// Creates a forward (encrypting) stage.
    pub fn encryptor(key: &[u8], nonce: &[u8]) -> Self {
        Self::new(key, nonce, Direction::Forward)
    }

    /// Creates an inverse (decrypting) stage.
    pub fn decryptor(key: &[u8], nonce: &[u8]) -> Self {
        Self::new(key, nonce, Direction::Inverse)
    }

    /// Sets the chunk size from `config`.
    pub fn with_config(mut self, config: ChunkConfig) -> Self {
        self.config = config;
        self
    }

    fn cipher(&mut self, routine: Routine) -> Result<&mut ChaCha20> {
        self.cipher
            .as_mut()
            .ok_or_else(|| TransformError::backend(NAME, routine, "cipher not initialized"))
    }
}

impl fmt::Debug for ChaCha20Transform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChaCha20Transform")
            .field("direction", &self.direction)
            .field("chunk_size", &self.config.chunk_size())
            .field("initialized", &self.cipher.is_some())
            .finish_non_exhaustive()
    }
}

impl Transform for ChaCha20Transform {
    fn direction(&self) -> Direction {
        self.direction
    }

    fn name(&self) -> &str {
        NAME
    }

    fn chunk_size(&self) -> usize {
        self.config.chunk_size()
    }

    fn extra_size(&self) -> usize {
        0
    }

    fn expansion_factor(&self) -> Rational {
        Rational::ONE
    }

    fn init(&mut self) -> Result<()> {
        if self.key.len() != KEY_SIZE {
            return Err(TransformError::backend(
                NAME,
                Routine::Init,
                format!("invalid key length {} (expected {KEY_SIZE})", self.key.len()),
            ));
        }
        if self.nonce.len() != NONCE_SIZE {
            return Err(TransformError::backend(
                NAME,
                Routine::Init,
                format!("invalid nonce length {} (expected {NONCE_SIZE})", self.nonce.len()),
            ));
        }

        let cipher = ChaCha20::new_from_slices(&self.key, &self.nonce)
            .map_err(|e| TransformError::backend(NAME, Routine::Init, e))?;
        self.cipher = Some(cipher);
        Ok(())
    }

    fn update(&mut self, input: &[u8], output: &mut [u8]) -> Result<usize> {
        let region = &mut output[..input.len()];
        region.copy_from_slice(input);
        self.cipher(Routine::Update)?
            .try_apply_keystream(region)
            .map_err(|e| TransformError::backend(NAME, Routine::Update, e))?;
        Ok(input.len())
    }

    fn finalize(&mut self, _output: &mut [u8]) -> Result<usize> {
        self.cipher(Routine::Finalize)?;
        self.cipher = None;
        Ok(0)
    }
}
