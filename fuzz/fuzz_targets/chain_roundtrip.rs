#![no_main]

use libfuzzer_sys::fuzz_target;
use chunkform::{
    Base64Decoder, Base64Encoder, BoxedTransform, ChaCha20Transform, Chain, ChunkConfig, LineWrapConfig,
    Pipeline,
};

const KEY: [u8; 32] = [7; 32];
const NONCE: [u8; 12] = [9; 12];

fn seal(chunk_size: usize, wrap: bool) -> Chain {
    let config = ChunkConfig::new(chunk_size).unwrap();
    let armor = if wrap { config.with_line_wrap(LineWrapConfig::enabled()) } else { config };
    let stages: Vec<BoxedTransform> = vec![
        Box::new(ChaCha20Transform::encryptor(&KEY, &NONCE).with_config(config)),
        Box::new(Base64Encoder::with_config(armor)),
    ];
    Chain::new(stages).unwrap()
}

fn open(chunk_size: usize) -> Chain {
    let config = ChunkConfig::new(chunk_size).unwrap();
    let stages: Vec<BoxedTransform> = vec![
        Box::new(Base64Decoder::with_config(config)),
        Box::new(ChaCha20Transform::decryptor(&KEY, &NONCE).with_config(config)),
    ];
    Chain::new(stages).unwrap()
}

fuzz_target!(|input: (u8, bool, Vec<u8>)| {
    let (size, wrap, data) = input;
    let chunk_size = usize::from(size).max(1);

    let armored = seal(chunk_size, wrap).transform_bytes(&data).unwrap();
    assert!(armored.iter().all(|b| b.is_ascii()));

    // Chunking is not observable in the output.
    let reference = seal(4096, wrap).transform_bytes(&data).unwrap();
    assert_eq!(armored, reference);

    let plain = open(chunk_size).transform_bytes(&armored).unwrap();
    assert_eq!(plain.as_ref(), data.as_slice());
});
