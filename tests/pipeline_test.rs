// Integration tests for pipelines: chain validation, update and finalize
// cascades, round-trips and capacity soundness.

mod common;

use std::sync::atomic::Ordering;

use chunkform::{
    AesCbcTransform, Base64Decoder, Base64Encoder, BoxedTransform, ChaCha20Transform, Chain,
    ChunkConfig, Direction, Identity, LineWrapConfig, PaddingMode, Pipeline, Routine, Single,
    Transform, TransformError, transform_capacity,
};
use proptest::prelude::*;
use proptest::test_runner::TestCaseError;

use common::{
    Counting, Expand43Decoder, Expand43Encoder, Trailer, TrailerStrip, pattern,
    update_then_finalize,
};

const KEY: [u8; 32] = [0x11; 32];
const NONCE: [u8; 12] = [0x22; 12];
const AES_KEY: [u8; 16] = [0x33; 16];
const IV: [u8; 16] = [0x44; 16];

fn identity(direction: Direction, chunk_size: usize) -> BoxedTransform {
    Box::new(Identity::new(direction).with_config(ChunkConfig::new(chunk_size).unwrap()))
}

// ============================================================================
// Chain Validation
// ============================================================================

#[test]
fn test_chain_with_no_transforms_fails() {
    assert!(matches!(
        Chain::new(Vec::new()),
        Err(TransformError::InvalidChain { .. })
    ));
}

#[test]
fn test_chain_with_one_transform_fails() {
    assert!(matches!(
        Chain::new(vec![Expand43Encoder::boxed(64)]),
        Err(TransformError::InvalidChain { .. })
    ));
}

#[test]
fn test_chain_with_mixed_directions_fails() {
    let result = Chain::new(vec![
        Expand43Encoder::boxed(64),
        identity(Direction::Forward, 64),
        Expand43Decoder::boxed(64),
    ]);
    assert!(matches!(result, Err(TransformError::InvalidChain { .. })));
}

#[test]
fn test_chain_with_uniform_direction_succeeds() {
    let chain = Chain::new(vec![
        Expand43Decoder::boxed(64),
        identity(Direction::Inverse, 64),
    ])
    .unwrap();
    assert_eq!(chain.direction(), Direction::Inverse);
    assert_eq!(chain.len(), 2);
}

// ============================================================================
// Update Path
// ============================================================================

#[test]
fn test_empty_update_invokes_no_stage() {
    let (first, first_updates) = Counting::wrap(Expand43Encoder::boxed(64));
    let (second, second_updates) = Counting::wrap(identity(Direction::Forward, 64));
    let mut chain = Chain::new(vec![first, second]).unwrap();

    chain.init().unwrap();
    assert!(chain.update(b"").unwrap().is_empty());
    assert_eq!(first_updates.load(Ordering::SeqCst), 0);
    assert_eq!(second_updates.load(Ordering::SeqCst), 0);

    chain.update(b"abc").unwrap();
    assert_eq!(first_updates.load(Ordering::SeqCst), 1);
    assert_eq!(second_updates.load(Ordering::SeqCst), 1);
}

#[test]
fn test_update_output_matches_stage_composition() {
    let data = pattern(60);
    let mut chain = Chain::new(vec![
        Expand43Encoder::boxed(64),
        Trailer::boxed(b"#"),
        Expand43Encoder::boxed(64),
    ])
    .unwrap();

    chain.init().unwrap();
    let chained = chain.update(&data).unwrap().to_vec();

    // 60 -> 80 -> 80 -> 104, with 2 bytes carried by the last stage
    let mut buf = vec![0u8; 256];
    let mut first = Expand43Encoder::new(64);
    let n = first.update(&data, &mut buf).unwrap();
    let once = buf[..n].to_vec();
    let mut last = Expand43Encoder::new(64);
    let n = last.update(&once, &mut buf).unwrap();

    assert_eq!(chained, &buf[..n]);
    assert_eq!(chained.len(), 104);
}

// ============================================================================
// Finalize Cascade
// ============================================================================

#[test]
fn test_three_stage_finalize_matches_direct_composition() {
    let mut chain = Chain::new(vec![
        Trailer::boxed(b"<1>"),
        Expand43Encoder::boxed(64),
        Trailer::boxed(b"<3>"),
    ])
    .unwrap();
    chain.init().unwrap();
    let cascaded = chain.finalize().unwrap().to_vec();

    // S3.finalize(S3.update(S2.finalize(S2.update(S1.finalize()))))
    let g1 = update_then_finalize(&mut *Trailer::boxed(b"<1>"), b"");
    let g2 = update_then_finalize(&mut Expand43Encoder::new(64), &g1);
    let g3 = update_then_finalize(&mut *Trailer::boxed(b"<3>"), &g2);

    assert_eq!(g1, b"<1>");
    assert_eq!(cascaded, g3);
    assert_eq!(cascaded.len(), 4 + 3);
}

#[test]
fn test_two_stage_finalize_cascade() {
    let mut chain = Chain::new(vec![Trailer::boxed(b"tail!"), Expand43Encoder::boxed(64)]).unwrap();
    chain.init().unwrap();
    chain.update(b"ab").unwrap();
    let cascaded = chain.finalize().unwrap().to_vec();

    // The encoder carried "ab"; finalize sees it followed by the trailer.
    let mut encoder = Expand43Encoder::new(64);
    let mut buf = [0u8; 16];
    encoder.update(b"ab", &mut buf).unwrap();
    let direct = update_then_finalize(&mut encoder, b"tail!");

    assert_eq!(cascaded, direct);
    assert_eq!(cascaded.len(), 10);
}

#[test]
fn test_finalize_after_data_matches_whole_session_composition() {
    let data = pattern(500);
    let mut chain = Chain::new(vec![
        Trailer::boxed(b"[a]"),
        Expand43Encoder::boxed(64),
        Trailer::boxed(b"[b]"),
        Expand43Encoder::boxed(64),
    ])
    .unwrap();
    let chained = chain.transform_bytes(&data).unwrap();

    let mut direct = data.clone();
    direct = update_then_finalize(&mut *Trailer::boxed(b"[a]"), &direct);
    direct = update_then_finalize(&mut Expand43Encoder::new(64), &direct);
    direct = update_then_finalize(&mut *Trailer::boxed(b"[b]"), &direct);
    direct = update_then_finalize(&mut Expand43Encoder::new(64), &direct);

    assert_eq!(&chained[..], &direct[..]);
}

// ============================================================================
// Scenarios
// ============================================================================

#[test]
fn test_expand_then_identity_scenario() {
    let input = [0x41u8; 12];

    let mut encode = Chain::new(vec![
        Expand43Encoder::boxed(64),
        identity(Direction::Forward, 64),
    ])
    .unwrap();
    let encoded = encode.transform_bytes(&input).unwrap();
    assert_eq!(encoded.len(), 16);

    let mut decode = Chain::new(vec![
        identity(Direction::Inverse, 64),
        Expand43Decoder::boxed(64),
    ])
    .unwrap();
    let decoded = decode.transform_bytes(&encoded).unwrap();
    assert_eq!(&decoded[..], &input[..]);
}

#[test]
fn test_backend_failure_names_stage_and_poisons_chain() {
    let mut encoded = Chain::new(vec![
        Expand43Encoder::boxed(64),
        identity(Direction::Forward, 64),
    ])
    .unwrap()
    .transform_bytes(b"abcdef")
    .unwrap()
    .to_vec();
    encoded[3] ^= 0xFF;

    let mut decode = Chain::new(vec![
        identity(Direction::Inverse, 64),
        Expand43Decoder::boxed(64),
    ])
    .unwrap();
    decode.init().unwrap();

    let err = decode.update(&encoded).unwrap_err();
    assert_eq!(err.to_string(), "expand-4/3: update failed: check byte mismatch");
    assert!(matches!(
        decode.update(b"x"),
        Err(TransformError::Session { .. })
    ));
    assert!(decode.finalize().is_err());
}

#[test]
fn test_truncated_input_fails_at_finalize() {
    let mut decode = Chain::new(vec![
        Box::new(Base64Decoder::new()),
        Box::new(Base64Decoder::new()),
    ])
    .unwrap();
    decode.init().unwrap();

    // "YUdrPQ" is "aGk=" encoded with its padding cut off.
    decode.update(b"YUdrPQ").unwrap();
    let err = decode.finalize().unwrap_err();
    assert!(matches!(
        err,
        TransformError::Backend { routine: Routine::Finalize, .. }
    ));
    assert!(err.to_string().starts_with("base64: finalize failed: truncated input"));
}

#[test]
fn test_chacha_then_base64_roundtrip() {
    let data = pattern(10_000);

    let mut seal = Chain::new(vec![
        Box::new(ChaCha20Transform::encryptor(&KEY, &NONCE)),
        Box::new(Base64Encoder::new()),
    ])
    .unwrap();
    let armored = seal.transform_bytes(&data).unwrap();
    assert!(armored.iter().all(|b| b.is_ascii_alphanumeric() || b"+/=".contains(b)));

    let mut open = Chain::new(vec![
        Box::new(Base64Decoder::new()),
        Box::new(ChaCha20Transform::decryptor(&KEY, &NONCE)),
    ])
    .unwrap();
    let plain = open.transform_bytes(&armored).unwrap();
    assert_eq!(&plain[..], &data[..]);
}

#[test]
fn test_invalid_key_fails_chain_init() {
    let mut seal = Chain::new(vec![
        Box::new(ChaCha20Transform::encryptor(&KEY[..31], &NONCE)),
        Box::new(Base64Encoder::new()),
    ])
    .unwrap();
    let err = seal.init().unwrap_err();
    assert!(err.to_string().starts_with("chacha20: init failed"));
    assert!(seal.init().is_err());
}

fn aes_seal(padding: PaddingMode, chunk: usize, wrap: bool) -> Chain {
    Chain::new(vec![
        Box::new(AesCbcTransform::encryptor(&AES_KEY, &IV, padding).with_config(config(chunk, false))),
        Box::new(Base64Encoder::with_config(config(chunk, wrap))),
    ])
    .unwrap()
}

fn aes_open(padding: PaddingMode, chunk: usize) -> Chain {
    Chain::new(vec![
        Box::new(Base64Decoder::with_config(config(chunk, false))),
        Box::new(AesCbcTransform::decryptor(&AES_KEY, &IV, padding).with_config(config(chunk, false))),
    ])
    .unwrap()
}

#[test]
fn test_aes_cbc_then_base64_roundtrip() {
    let data = pattern(10_000);

    let armored = aes_seal(PaddingMode::Pkcs7, 4096, false).transform_bytes(&data).unwrap();
    // 10_000 bytes pad to 10_016, which encode to 13_356 characters.
    assert_eq!(armored.len(), 13_356);

    let plain = aes_open(PaddingMode::Pkcs7, 4096).transform_bytes(&armored).unwrap();
    assert_eq!(&plain[..], &data[..]);
}

#[test]
fn test_aes_cbc_padding_block_cascades_through_base64() {
    // Nothing is updated; the whole output is the padding block finalized
    // by the cipher and then encoded by the Base64 stage.
    let armored = aes_seal(PaddingMode::Pkcs7, 4096, false).transform_bytes(b"").unwrap();
    assert_eq!(armored.len(), 24);
    assert!(armored.ends_with(b"=="));

    let plain = aes_open(PaddingMode::Pkcs7, 4096).transform_bytes(&armored).unwrap();
    assert!(plain.is_empty());
}

#[test]
fn test_aes_cbc_truncated_ciphertext_fails_open_chain() {
    let sealed = Single::new(AesCbcTransform::encryptor(&AES_KEY, &IV, PaddingMode::Pkcs7))
        .unwrap()
        .transform_bytes(&pattern(32))
        .unwrap();
    assert_eq!(sealed.len(), 48);

    let armored = Single::new(Base64Encoder::new())
        .unwrap()
        .transform_bytes(&sealed[..40])
        .unwrap();
    let err = aes_open(PaddingMode::Pkcs7, 4096).transform_bytes(&armored).unwrap_err();
    assert!(matches!(
        err,
        TransformError::Backend { routine: Routine::Finalize, .. }
    ));
    assert_eq!(
        err.to_string(),
        "aes-cbc: finalize failed: truncated input: 8 bytes missing from the last block"
    );
}

// ============================================================================
// Round-trip Properties
// ============================================================================

fn config(chunk_size: usize, wrap: bool) -> ChunkConfig {
    ChunkConfig::new(chunk_size)
        .unwrap()
        .with_line_wrap(LineWrapConfig::new(wrap))
}

proptest! {
    #[test]
    fn prop_expand_chain_roundtrip(
        data in proptest::collection::vec(any::<u8>(), 0..1024),
        chunk in 1usize..=64,
    ) {
        let mut encode = Chain::new(vec![
            Expand43Encoder::boxed(chunk),
            identity(Direction::Forward, chunk),
        ]).unwrap();
        let mut decode = Chain::new(vec![
            identity(Direction::Inverse, chunk),
            Expand43Decoder::boxed(chunk),
        ]).unwrap();

        let encoded = encode.transform_bytes(&data).unwrap();
        prop_assert_eq!(encoded.len(), (data.len() * 4).div_ceil(3));
        let decoded = decode.transform_bytes(&encoded).unwrap();
        prop_assert_eq!(&decoded[..], &data[..]);
    }

    #[test]
    fn prop_chacha_base64_roundtrip(
        data in proptest::collection::vec(any::<u8>(), 0..2048),
        chunk in 16usize..=256,
        wrap in any::<bool>(),
    ) {
        let mut seal = Chain::new(vec![
            Box::new(ChaCha20Transform::encryptor(&KEY, &NONCE).with_config(config(chunk, false))),
            Box::new(Base64Encoder::with_config(config(chunk, wrap))),
        ]).unwrap();
        let mut open = Chain::new(vec![
            Box::new(Base64Decoder::with_config(config(chunk, false))),
            Box::new(ChaCha20Transform::decryptor(&KEY, &NONCE).with_config(config(chunk, false))),
        ]).unwrap();

        let armored = seal.transform_bytes(&data).unwrap();
        let plain = open.transform_bytes(&armored).unwrap();
        prop_assert_eq!(&plain[..], &data[..]);
    }

    #[test]
    fn prop_aes_cbc_base64_roundtrip(
        data in proptest::collection::vec(any::<u8>(), 0..2048),
        chunk in 1usize..=256,
        wrap in any::<bool>(),
        padded in any::<bool>(),
    ) {
        let (padding, data) = if padded {
            (PaddingMode::Pkcs7, data)
        } else {
            // Unpadded CBC only accepts whole blocks.
            let aligned = data.len() / 16 * 16;
            (PaddingMode::None, data[..aligned].to_vec())
        };

        let armored = aes_seal(padding, chunk, wrap).transform_bytes(&data).unwrap();
        let plain = aes_open(padding, chunk).transform_bytes(&armored).unwrap();
        prop_assert_eq!(&plain[..], &data[..]);
    }

    #[test]
    fn prop_trailer_double_base64_roundtrip(
        data in proptest::collection::vec(any::<u8>(), 0..512),
    ) {
        let mut encode = Chain::new(vec![
            Trailer::boxed(b"--end--"),
            Box::new(Base64Encoder::new()),
            Box::new(Base64Encoder::new()),
        ]).unwrap();
        let mut decode = Chain::new(vec![
            Box::new(Base64Decoder::new()),
            Box::new(Base64Decoder::new()),
            TrailerStrip::boxed(b"--end--"),
        ]).unwrap();

        let encoded = encode.transform_bytes(&data).unwrap();
        let decoded = decode.transform_bytes(&encoded).unwrap();
        prop_assert_eq!(&decoded[..], &data[..]);
    }
}

// ============================================================================
// Capacity Soundness
// ============================================================================

/// Feeds `data` in `chunk_size` pieces into an output region of exactly
/// the transform's declared capacity.
fn assert_within_capacity(stage: &mut dyn Transform, data: &[u8]) -> Result<(), TestCaseError> {
    let capacity = transform_capacity(&*stage).unwrap();
    let mut out = vec![0u8; capacity];

    stage.init().unwrap();
    for piece in data.chunks(stage.chunk_size()) {
        let written = stage.update(piece, &mut out).unwrap();
        prop_assert!(written <= capacity);
    }
    let written = stage.finalize(&mut out).unwrap();
    prop_assert!(written <= capacity);
    Ok(())
}

proptest! {
    #[test]
    fn prop_backends_stay_within_capacity(
        data in proptest::collection::vec(any::<u8>(), 0..4096),
        chunk in 1usize..=512,
        wrap in any::<bool>(),
    ) {
        assert_within_capacity(&mut Identity::forward().with_config(config(chunk, false)), &data)?;
        assert_within_capacity(&mut Expand43Encoder::new(chunk), &data)?;
        assert_within_capacity(
            &mut ChaCha20Transform::encryptor(&KEY, &NONCE).with_config(config(chunk, false)),
            &data,
        )?;
        assert_within_capacity(&mut Base64Encoder::with_config(config(chunk, wrap)), &data)?;

        let encoded = Single::new(Base64Encoder::with_config(config(4096, wrap)))
            .unwrap()
            .transform_bytes(&data)
            .unwrap();
        assert_within_capacity(&mut Base64Decoder::with_config(config(chunk, false)), &encoded)?;

        let expanded = update_then_finalize(&mut Expand43Encoder::new(4096), &data);
        assert_within_capacity(&mut Expand43Decoder::new(chunk), &expanded)?;

        for padding in [PaddingMode::Pkcs7, PaddingMode::None] {
            let plain = match padding {
                PaddingMode::Pkcs7 => &data[..],
                PaddingMode::None => &data[..data.len() / 16 * 16],
            };
            assert_within_capacity(
                &mut AesCbcTransform::encryptor(&AES_KEY, &IV, padding).with_config(config(chunk, false)),
                plain,
            )?;

            let sealed = Single::new(AesCbcTransform::encryptor(&AES_KEY, &IV, padding))
                .unwrap()
                .transform_bytes(plain)
                .unwrap();
            assert_within_capacity(
                &mut AesCbcTransform::decryptor(&AES_KEY, &IV, padding).with_config(config(chunk, false)),
                &sealed,
            )?;
        }
    }
}

#[test]
fn test_chain_capacity_covers_expanding_stages() {
    let stages: Vec<BoxedTransform> = (0..4).map(|_| Expand43Encoder::boxed(64)).collect();
    let single = transform_capacity(&Expand43Encoder::new(64)).unwrap();
    let chain = Chain::new(stages).unwrap();
    assert!(chain.capacity() > single);

    // A full chunk through four expanding stages fits without error.
    let mut chain = chain;
    chain.init().unwrap();
    assert!(chain.update(&pattern(64)).unwrap().len() > 64);
}
