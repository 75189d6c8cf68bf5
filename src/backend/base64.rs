//! Streaming standard-alphabet Base64 with padding.

use ::base64::Engine;
use ::base64::engine::general_purpose::STANDARD;

use crate::config::{ChunkConfig, PEM_LINE_LENGTH};
use crate::error::{Result, Routine, TransformError};
use crate::transform::{Direction, Rational, Transform};

const NAME: &str = "base64";

/// Symbols decoded per `decode_slice` call.
const DECODE_BATCH: usize = 256;

/// Base64 encoder carrying partial 3-byte groups between calls.
///
/// With line wrapping enabled, a newline follows every [`PEM_LINE_LENGTH`]
/// symbols and terminates a partial last line.
///
/// # Example
///
/// ```
/// use chunkform::{Base64Encoder, ChunkConfig, LineWrapConfig, Pipeline, Single};
///
/// let config = ChunkConfig::default().with_line_wrap(LineWrapConfig::enabled());
/// let mut pem = Single::new(Base64Encoder::with_config(config))?;
/// assert_eq!(&pem.transform_bytes(b"hi")?[..], b"aGk=\n");
/// # Ok::<(), chunkform::TransformError>(())
/// ```
#[derive(Debug, Clone)]
pub struct Base64Encoder {
    config: ChunkConfig,
    carry: [u8; 3],
    carry_len: usize,
    column: usize,
}

impl Base64Encoder {
    /// Creates an encoder with the default chunk size and no wrapping.
    pub fn new() -> Self {
        Self::with_config(ChunkConfig::default())
    }

    /// Creates an encoder from `config`.
    pub fn with_config(config: ChunkConfig) -> Self {
        Self {
            config,
            carry: [0; 3],
            carry_len: 0,
            column: 0,
        }
    }

    fn wraps(&self) -> bool {
        self.config.line_wrap().enabled
    }

    /// Encodes `input` (whole groups, or a final partial group) at the
    /// current column, inserting newlines at line ends.
    fn encode_wrapped(&mut self, mut input: &[u8], output: &mut [u8], routine: Routine) -> Result<usize> {
        let mut written = 0;

        while !input.is_empty() {
            let take = if self.wraps() {
                input.len().min((PEM_LINE_LENGTH - self.column) / 4 * 3)
            } else {
                input.len()
            };

            let n = STANDARD
                .encode_slice(&input[..take], &mut output[written..])
                .map_err(|e| TransformError::backend(NAME, routine, e))?;
            written += n;
            input = &input[take..];

            if self.wraps() {
                self.column += n;
                if self.column == PEM_LINE_LENGTH {
                    output[written] = b'\n';
                    written += 1;
                    self.column = 0;
                }
            }
        }

        Ok(written)
    }
}

impl Default for Base64Encoder {
    fn default() -> Self {
        Self::new()
    }
}

impl Transform for Base64Encoder {
    fn direction(&self) -> Direction {
        Direction::Forward
    }

    fn name(&self) -> &str {
        NAME
    }

    fn chunk_size(&self) -> usize {
        self.config.chunk_size()
    }

    fn extra_size(&self) -> usize {
        if self.wraps() { 8 } else { 4 }
    }

    fn expansion_factor(&self) -> Rational {
        if self.wraps() {
            Rational::new(65, 48)
        } else {
            Rational::new(4, 3)
        }
    }

    fn init(&mut self) -> Result<()> {
        self.carry_len = 0;
        self.column = 0;
        Ok(())
    }

    fn update(&mut self, mut input: &[u8], output: &mut [u8]) -> Result<usize> {
        let mut written = 0;

        if self.carry_len > 0 {
            let take = input.len().min(3 - self.carry_len);
            self.carry[self.carry_len..self.carry_len + take].copy_from_slice(&input[..take]);
            self.carry_len += take;
            input = &input[take..];

            if self.carry_len < 3 {
                return Ok(0);
            }

            let group = self.carry;
            written += self.encode_wrapped(&group, output, Routine::Update)?;
            self.carry_len = 0;
        }

        let whole = input.len() / 3 * 3;
        written += self.encode_wrapped(&input[..whole], &mut output[written..], Routine::Update)?;

        let rest = &input[whole..];
        self.carry[..rest.len()].copy_from_slice(rest);
        self.carry_len = rest.len();

        Ok(written)
    }

    fn finalize(&mut self, output: &mut [u8]) -> Result<usize> {
        let group = self.carry;
        let mut written = self.encode_wrapped(&group[..self.carry_len], output, Routine::Finalize)?;
        self.carry_len = 0;

        if self.wraps() && self.column > 0 {
            output[written] = b'\n';
            written += 1;
            self.column = 0;
        }

        Ok(written)
    }
}

/// Base64 decoder carrying partial 4-symbol groups between calls.
///
/// ASCII whitespace is skipped, so wrapped (PEM-style) input decodes
/// as-is. Symbols after a padded group and a dangling partial group at
/// `finalize` are errors.
#[derive(Debug, Clone)]
pub struct Base64Decoder {
    config: ChunkConfig,
    carry: [u8; 4],
    carry_len: usize,
    padded: bool,
}

impl Base64Decoder {
    /// Creates a decoder with the default chunk size.
    pub fn new() -> Self {
        Self::with_config(ChunkConfig::default())
    }

    /// Creates a decoder from `config`. Line wrapping does not apply.
    pub fn with_config(config: ChunkConfig) -> Self {
        Self {
            config,
            carry: [0; 4],
            carry_len: 0,
            padded: false,
        }
    }
}

impl Default for Base64Decoder {
    fn default() -> Self {
        Self::new()
    }
}

/// Decodes whole groups collected in `batch`.
fn decode_batch(batch: &[u8], output: &mut [u8]) -> Result<usize> {
    if batch.is_empty() {
        return Ok(0);
    }
    STANDARD
        .decode_slice(batch, output)
        .map_err(|e| TransformError::backend(NAME, Routine::Update, e))
}

impl Transform for Base64Decoder {
    fn direction(&self) -> Direction {
        Direction::Inverse
    }

    fn name(&self) -> &str {
        NAME
    }

    fn chunk_size(&self) -> usize {
        self.config.chunk_size()
    }

    fn extra_size(&self) -> usize {
        3
    }

    fn expansion_factor(&self) -> Rational {
        Rational::new(3, 4)
    }

    fn init(&mut self) -> Result<()> {
        self.carry_len = 0;
        self.padded = false;
        Ok(())
    }

    fn update(&mut self, input: &[u8], output: &mut [u8]) -> Result<usize> {
        let mut batch = [0u8; DECODE_BATCH];
        let mut batch_len = 0;
        let mut written = 0;

        for &symbol in input.iter().filter(|b| !b.is_ascii_whitespace()) {
            if self.padded {
                return Err(TransformError::backend(
                    NAME,
                    Routine::Update,
                    "data after padding",
                ));
            }

            self.carry[self.carry_len] = symbol;
            self.carry_len += 1;
            if self.carry_len < 4 {
                continue;
            }

            batch[batch_len..batch_len + 4].copy_from_slice(&self.carry);
            batch_len += 4;
            self.carry_len = 0;
            self.padded = self.carry[3] == b'=';

            if self.padded || batch_len == DECODE_BATCH {
                written += decode_batch(&batch[..batch_len], &mut output[written..])?;
                batch_len = 0;
            }
        }

        written += decode_batch(&batch[..batch_len], &mut output[written..])?;
        Ok(written)
    }

    fn finalize(&mut self, _output: &mut [u8]) -> Result<usize> {
        if self.carry_len != 0 {
            let missing = 4 - self.carry_len;
            self.carry_len = 0;
            return Err(TransformError::backend(
                NAME,
                Routine::Finalize,
                format!("truncated input: {missing} symbols missing from the last group"),
            ));
        }
        Ok(0)
    }
}
