//! Encrypt-then-armor example.
//!
//! Streams a file through ChaCha20 and PEM-wrapped Base64, prints the
//! armored text, then decodes it back and checks the round-trip.
//!
//! Run with:
//!     cargo run --example encrypt_armor -- /path/to/file

use std::env;
use std::fs::File;
use std::io::{self, Read};

use chunkform::{
    Base64Decoder, Base64Encoder, BoxedTransform, ChaCha20Transform, Chain, ChunkConfig,
    LineWrapConfig, TransformReader, TransformWriter,
};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let path = env::args()
        .nth(1)
        .unwrap_or_else(|| "Cargo.toml".to_string());

    let key = [0x42u8; 32];
    let nonce = [0x24u8; 12];
    let config = ChunkConfig::new(16 * 1024)?.with_line_wrap(LineWrapConfig::enabled());

    let seal: Vec<BoxedTransform> = vec![
        Box::new(ChaCha20Transform::encryptor(&key, &nonce).with_config(config)),
        Box::new(Base64Encoder::with_config(config)),
    ];
    let seal = Chain::new(seal)?;
    eprintln!(
        "Sealing {} with {:?} (capacity {} bytes)\n",
        path,
        seal.names().collect::<Vec<_>>(),
        seal.capacity()
    );

    // Stream the file into the armored buffer
    let mut writer = TransformWriter::new(Vec::new(), seal)?;
    io::copy(&mut File::open(&path)?, &mut writer)?;
    let armored = writer.finish()?;
    println!("{}", String::from_utf8_lossy(&armored));

    // Pull it back through the inverse chain
    let open: Vec<BoxedTransform> = vec![
        Box::new(Base64Decoder::with_config(config)),
        Box::new(ChaCha20Transform::decryptor(&key, &nonce).with_config(config)),
    ];
    let mut reader = TransformReader::new(&armored[..], Chain::new(open)?)?;
    let mut plain = Vec::new();
    reader.read_to_end(&mut plain)?;

    let mut original = Vec::new();
    File::open(&path)?.read_to_end(&mut original)?;
    assert_eq!(plain, original, "round-trip mismatch");

    eprintln!(
        "{} bytes -> {} armored bytes -> {} bytes",
        original.len(),
        armored.len(),
        plain.len()
    );
    Ok(())
}
