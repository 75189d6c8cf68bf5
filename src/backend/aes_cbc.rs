//! AES in CBC mode with optional PKCS#7 padding.

use std::fmt;

use ::aes::{Aes128, Aes192, Aes256};
use ::cbc::cipher::block_padding::{Pkcs7, RawPadding};
use ::cbc::cipher::consts::U16;
use ::cbc::cipher::generic_array::GenericArray;
use ::cbc::cipher::{BlockDecryptMut, BlockEncryptMut, InvalidLength, KeyIvInit};
use zeroize::Zeroizing;

use crate::config::ChunkConfig;
use crate::error::{Result, Routine, TransformError};
use crate::transform::{Direction, Rational, Transform};

const NAME: &str = "aes-cbc";

/// AES block size in bytes.
pub const AES_BLOCK_SIZE: usize = 16;

/// Output overhead beyond the input length: carried bytes plus the padding
/// block, bounded by the largest cipher block length (32 bytes).
const MAX_BLOCK_LENGTH: usize = 32;

/// Padding applied to the last block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PaddingMode {
    /// No padding; the total input must be a multiple of the block size.
    None,
    /// PKCS#7: every message gains 1 to 16 padding bytes.
    #[default]
    Pkcs7,
}

/// One block of CBC chaining in a fixed direction.
trait BlockMode: Send {
    fn process(&mut self, block: &mut [u8]);
}

struct Encrypt<C>(C);

struct Decrypt<C>(C);

impl<C: BlockEncryptMut<BlockSize = U16> + Send> BlockMode for Encrypt<C> {
    fn process(&mut self, block: &mut [u8]) {
        self.0.encrypt_block_mut(GenericArray::from_mut_slice(block));
    }
}

impl<C: BlockDecryptMut<BlockSize = U16> + Send> BlockMode for Decrypt<C> {
    fn process(&mut self, block: &mut [u8]) {
        self.0.decrypt_block_mut(GenericArray::from_mut_slice(block));
    }
}

fn block_mode(
    key: &[u8],
    iv: &[u8],
    direction: Direction,
) -> std::result::Result<Box<dyn BlockMode>, InvalidLength> {
    let mode: Box<dyn BlockMode> = match (key.len(), direction) {
        (16, Direction::Forward) => Box::new(Encrypt(cbc::Encryptor::<Aes128>::new_from_slices(key, iv)?)),
        (24, Direction::Forward) => Box::new(Encrypt(cbc::Encryptor::<Aes192>::new_from_slices(key, iv)?)),
        (32, Direction::Forward) => Box::new(Encrypt(cbc::Encryptor::<Aes256>::new_from_slices(key, iv)?)),
        (16, Direction::Inverse) => Box::new(Decrypt(cbc::Decryptor::<Aes128>::new_from_slices(key, iv)?)),
        (24, Direction::Inverse) => Box::new(Decrypt(cbc::Decryptor::<Aes192>::new_from_slices(key, iv)?)),
        (32, Direction::Inverse) => Box::new(Decrypt(cbc::Decryptor::<Aes256>::new_from_slices(key, iv)?)),
        _ => return Err(InvalidLength),
    };
    Ok(mode)
}

/// AES-128/192/256 in CBC mode, forward to encrypt and inverse to decrypt.
///
/// The key size picks the AES variant. Partial blocks are carried between
/// `update` calls. With [`PaddingMode::Pkcs7`] the encryptor emits a padding
/// block at `finalize` and the decryptor holds back the last block until
/// `finalize` so it can strip the padding.
///
/// # Example
///
/// ```
/// use chunkform::{AesCbcTransform, PaddingMode, Pipeline, Single};
///
/// let key = [7u8; 16];
/// let iv = [1u8; 16];
///
/// let sealed = Single::new(AesCbcTransform::encryptor(&key, &iv, PaddingMode::Pkcs7))?
///     .transform_bytes(b"sixteen byte msg")?;
/// assert_eq!(sealed.len(), 32);
///
/// let opened = Single::new(AesCbcTransform::decryptor(&key, &iv, PaddingMode::Pkcs7))?
///     .transform_bytes(&sealed)?;
/// assert_eq!(&opened[..], b"sixteen byte msg");
/// # Ok::<(), chunkform::TransformError>(())
/// ```
pub struct AesCbcTransform {
    key: Zeroizing<Vec<u8>>,
    iv: Vec<u8>,
    padding: PaddingMode,
    direction: Direction,
    config: ChunkConfig,
    mode: Option<Box<dyn BlockMode>>,
    carry: Zeroizing<[u8; AES_BLOCK_SIZE]>,
    carry_len: usize,
}

impl AesCbcTransform {
    /// Creates a cipher stage running in `direction`.
    pub fn new(key: &[u8], iv: &[u8], padding: PaddingMode, direction: Direction) -> Self {
        Self {
            key: Zeroizing::new(key.to_vec()),
            iv: iv.to_vec(),
            padding,
            direction,
            config: ChunkConfig::default(),
            mode: None,
            carry: Zeroizing::new([0; AES_BLOCK_SIZE]),
            carry_len: 0,
        }
    }

    /// Creates a forward (encrypting) stage.
    pub fn encryptor(key: &[u8], iv: &[u8], padding: PaddingMode) -> Self {
        Self::new(key, iv, padding, Direction::Forward)
    }

    /// Creates an inverse (decrypting) stage.
    pub fn decryptor(key: &[u8], iv: &[u8], padding: PaddingMode) -> Self {
        Self::new(key, iv, padding, Direction::Inverse)
    }

    /// Sets the chunk size from `config`.
    pub fn with_config(mut self, config: ChunkConfig) -> Self {
        self.config = config;
        self
    }

    /// Returns the padding mode.
    pub fn padding(&self) -> PaddingMode {
        self.padding
    }

    /// A padded decryptor keeps a whole block back for `finalize`.
    fn holds_last_block(&self) -> bool {
        self.padding == PaddingMode::Pkcs7 && self.direction == Direction::Inverse
    }

    fn mode(&mut self, routine: Routine) -> Result<&mut Box<dyn BlockMode>> {
        self.mode
            .as_mut()
            .ok_or_else(|| TransformError::backend(NAME, routine, "cipher not initialized"))
    }

    fn leftover(&self, routine: Routine) -> TransformError {
        TransformError::backend(
            NAME,
            routine,
            format!(
                "input is not a multiple of the block size ({} bytes left over)",
                self.carry_len
            ),
        )
    }
}

impl fmt::Debug for AesCbcTransform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AesCbcTransform")
            .field("key_bits", &(self.key.len() * 8))
            .field("padding", &self.padding)
            .field("direction", &self.direction)
            .field("chunk_size", &self.config.chunk_size())
            .field("initialized", &self.mode.is_some())
            .finish_non_exhaustive()
    }
}

impl Transform for AesCbcTransform {
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
        MAX_BLOCK_LENGTH
    }

    fn expansion_factor(&self) -> Rational {
        Rational::ONE
    }

    fn init(&mut self) -> Result<()> {
        if !matches!(self.key.len(), 16 | 24 | 32) {
            return Err(TransformError::backend(
                NAME,
                Routine::Init,
                format!("invalid key length {} (expected 16, 24 or 32)", self.key.len()),
            ));
        }
        if self.iv.len() != AES_BLOCK_SIZE {
            return Err(TransformError::backend(
                NAME,
                Routine::Init,
                format!("invalid iv length {} (expected {AES_BLOCK_SIZE})", self.iv.len()),
            ));
        }

        let mode = block_mode(&self.key, &self.iv, self.direction)
            .map_err(|e| TransformError::backend(NAME, Routine::Init, e))?;
        self.mode = Some(mode);
        self.carry_len = 0;
        Ok(())
    }

    fn update(&mut self, input: &[u8], output: &mut [u8]) -> Result<usize> {
        let total = self.carry_len + input.len();
        let ready = if self.holds_last_block() {
            total.saturating_sub(1) / AES_BLOCK_SIZE * AES_BLOCK_SIZE
        } else {
            total / AES_BLOCK_SIZE * AES_BLOCK_SIZE
        };

        if ready == 0 {
            self.carry[self.carry_len..total].copy_from_slice(input);
            self.carry_len = total;
            return Ok(0);
        }

        let carried = self.carry_len;
        let taken = ready - carried;
        let region = &mut output[..ready];
        region[..carried].copy_from_slice(&self.carry[..carried]);
        region[carried..].copy_from_slice(&input[..taken]);

        let mode = self.mode(Routine::Update)?;
        for block in region.chunks_exact_mut(AES_BLOCK_SIZE) {
            mode.process(block);
        }

        let rest = &input[taken..];
        self.carry[..rest.len()].copy_from_slice(rest);
        self.carry_len = rest.len();
        Ok(ready)
    }

    fn finalize(&mut self, output: &mut [u8]) -> Result<usize> {
        let written = match (self.padding, self.direction) {
            (PaddingMode::None, _) => {
                if self.carry_len != 0 {
                    return Err(self.leftover(Routine::Finalize));
                }
                self.mode(Routine::Finalize)?;
                0
            }
            (PaddingMode::Pkcs7, Direction::Forward) => {
                let block = &mut output[..AES_BLOCK_SIZE];
                block[..self.carry_len].copy_from_slice(&self.carry[..self.carry_len]);
                Pkcs7::raw_pad(block, self.carry_len);
                self.mode(Routine::Finalize)?.process(block);
                AES_BLOCK_SIZE
            }
            (PaddingMode::Pkcs7, Direction::Inverse) => {
                if self.carry_len != AES_BLOCK_SIZE {
                    return Err(TransformError::backend(
                        NAME,
                        Routine::Finalize,
                        format!(
                            "truncated input: {} bytes missing from the last block",
                            AES_BLOCK_SIZE - self.carry_len
                        ),
                    ));
                }

                let mut block = self.carry.clone();
                self.mode(Routine::Finalize)?.process(&mut block[..]);
                let plain = Pkcs7::raw_unpad(&block[..])
                    .map_err(|_| TransformError::backend(NAME, Routine::Finalize, "invalid padding"))?;
                output[..plain.len()].copy_from_slice(plain);
                plain.len()
            }
        };

        self.mode = None;
        self.carry_len = 0;
        Ok(written)
    }
}
