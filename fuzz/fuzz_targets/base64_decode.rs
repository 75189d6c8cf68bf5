#![no_main]

use libfuzzer_sys::fuzz_target;
use chunkform::{Base64Decoder, ChunkConfig, Pipeline, Single};

fuzz_target!(|data: &[u8]| {
    // Arbitrary input must either decode or fail cleanly, never panic.
    for chunk_size in [1, 3, 64, 4096] {
        let config = ChunkConfig::new(chunk_size).unwrap();
        let mut decoder = Single::new(Base64Decoder::with_config(config)).unwrap();
        let split = decoder.transform_bytes(data);

        let mut whole = Single::new(Base64Decoder::new()).unwrap();
        let reference = whole.transform_bytes(data);

        match (split, reference) {
            (Ok(a), Ok(b)) => assert_eq!(a, b),
            (Err(_), Err(_)) => {}
            (a, b) => panic!("chunking changed the outcome: {a:?} vs {b:?}"),
        }
    }
});
