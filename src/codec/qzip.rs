/// QZip stream codec
///
/// A QZip stream is a bzip2 stream with its signature rewritten and the
/// decompressed length spliced in after the block size digit:
///
/// ```text
/// bzip2: "BZh" level | body ("1AY&SY" block magic ...)
/// QZip:  "QZh" level | length: u32 BE | body
/// ```
///
/// Decoding puts the bzip2 signature back and hands the stream to libbzip2.

use crate::error::{DemodiskError, Result};
use crate::format::constants::*;
use bzip2::read::BzDecoder;
use bzip2::write::BzEncoder;
use bzip2::Compression;
use std::io::{Read, Write};

/// Cap on the up-front allocation taken from an untrusted length field
const MAX_PREALLOC: usize = 16 * 1024 * 1024;

/// Decompress a QZip stream
pub fn decompress(data: &[u8]) -> Result<Vec<u8>> {
    let declared = read_header(data)?;

    let mut stream = Vec::with_capacity(BZIP2_MAGIC.len() + 1 + data.len() - QZIP_HEADER_SIZE);
    stream.extend_from_slice(BZIP2_MAGIC);
    stream.push(data[QZIP_LEVEL_OFFSET]);
    stream.extend_from_slice(&data[QZIP_HEADER_SIZE..]);

    let mut out = Vec::with_capacity(declared.min(MAX_PREALLOC));
    BzDecoder::new(stream.as_slice())
        .read_to_end(&mut out)
        .map_err(|e| DemodiskError::corrupt(QZIP_HEADER_SIZE, format!("bzip2 body: {}", e)))?;

    if out.len() != declared {
        log::warn!(
            "qzip: header declares {} bytes, stream holds {}",
            declared,
            out.len()
        );
    }
    log::debug!("qzip: {} bytes expanded to {} bytes", data.len(), out.len());
    Ok(out)
}

/// Compress data into a QZip stream at the highest bzip2 level
pub fn compress(data: &[u8]) -> Result<Vec<u8>> {
    let declared = u32::try_from(data.len()).map_err(|_| {
        DemodiskError::config(format!("{} bytes do not fit a QZip length field", data.len()))
    })?;

    let mut encoder = BzEncoder::new(Vec::new(), Compression::best());
    encoder.write_all(data)?;
    let stream = encoder.finish()?;

    // "BZh" + level, then the body
    let (signature, body) = stream.split_at(BZIP2_MAGIC.len() + 1);
    let mut out = Vec::with_capacity(QZIP_HEADER_SIZE + body.len());
    out.extend_from_slice(QZIP_MAGIC);
    out.push(signature[QZIP_LEVEL_OFFSET]);
    out.extend_from_slice(&declared.to_be_bytes());
    out.extend_from_slice(body);

    log::debug!("qzip: {} bytes compressed to {} bytes", data.len(), out.len());
    Ok(out)
}

/// Read and check the stream header, returning the declared length
pub fn read_header(data: &[u8]) -> Result<usize> {
    if data.len() < QZIP_HEADER_SIZE + QZIP_BLOCK_MAGIC.len() {
        return Err(DemodiskError::corrupt(
            data.len(),
            format!("stream shorter than its {} byte header", QZIP_HEADER_SIZE),
        ));
    }
    if &data[..QZIP_MAGIC.len()] != QZIP_MAGIC {
        return Err(DemodiskError::corrupt(0, "not a QZip stream (bad magic)"));
    }
    let level = data[QZIP_LEVEL_OFFSET];
    if !(b'1'..=b'9').contains(&level) {
        return Err(DemodiskError::corrupt(
            QZIP_LEVEL_OFFSET,
            format!("block size byte 0x{:02X} is not '1'..'9'", level),
        ));
    }

    let body = &data[QZIP_HEADER_SIZE..QZIP_HEADER_SIZE + QZIP_BLOCK_MAGIC.len()];
    if body != QZIP_BLOCK_MAGIC && body != QZIP_END_MAGIC {
        return Err(DemodiskError::corrupt(QZIP_HEADER_SIZE, "no bzip2 block after the header"));
    }

    let length = u32::from_be_bytes([
        data[QZIP_LENGTH_OFFSET],
        data[QZIP_LENGTH_OFFSET + 1],
        data[QZIP_LENGTH_OFFSET + 2],
        data[QZIP_LENGTH_OFFSET + 3],
    ]);
    Ok(length as usize)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// `"QNX demodisk\n" * 80` written by Python's `bz2` module with the header rewritten
    const LEGACY_STREAM: [u8; 76] = [
        0x51, 0x5a, 0x68, 0x39, 0x00, 0x00, 0x04, 0x10, 0x31, 0x41, 0x59, 0x26, 0x53, 0x59, 0x31,
        0x04, 0xaa, 0x3f, 0x00, 0x00, 0x9f, 0xd7, 0x80, 0x00, 0x10, 0x40, 0x00, 0x00, 0x01, 0x20,
        0x40, 0x06, 0x2a, 0x88, 0x00, 0x20, 0x00, 0x50, 0x81, 0xa0, 0x68, 0x05, 0x2a, 0x83, 0xd4,
        0x0d, 0x3c, 0x09, 0x81, 0x30, 0x27, 0x01, 0x30, 0x26, 0x04, 0xf8, 0x27, 0x60, 0x9a, 0x09,
        0xe8, 0x4d, 0x04, 0xd0, 0x4f, 0xc5, 0xdc, 0x91, 0x4e, 0x14, 0x24, 0x0c, 0x41, 0x2a, 0x8f,
        0xc0,
    ];

    fn test_roundtrip(data: &[u8]) {
        let compressed = compress(data).unwrap();
        let decompressed = decompress(&compressed).unwrap();
        assert_eq!(data, &decompressed[..]);
    }

    #[test]
    fn test_decode_legacy_stream() {
        let expected = b"QNX demodisk\n".repeat(80);
        assert_eq!(read_header(&LEGACY_STREAM).unwrap(), 1040);
        assert_eq!(decompress(&LEGACY_STREAM).unwrap(), expected);
    }

    #[test]
    fn test_header_layout() {
        let data = vec![7u8; 0x0102];
        let compressed = compress(&data).unwrap();
        assert_eq!(&compressed[..4], b"QZh9");
        assert_eq!(&compressed[4..8], &[0, 0, 1, 2]);
        assert_eq!(&compressed[8..14], QZIP_BLOCK_MAGIC);
    }

    #[test]
    fn test_empty_data() {
        let compressed = compress(b"").unwrap();
        assert_eq!(&compressed[4..8], &[0, 0, 0, 0]);
        assert_eq!(&compressed[8..14], QZIP_END_MAGIC);
        test_roundtrip(b"");
    }

    #[test]
    fn test_single_byte() {
        test_roundtrip(b"A");
    }

    #[test]
    fn test_large_data() {
        let data: Vec<u8> = (0..100_000).map(|i| (i % 251) as u8).collect();
        test_roundtrip(&data);
    }

    #[test]
    fn test_deterministic() {
        let data: Vec<u8> = (0..5000).map(|i| ((i * 31) % 97) as u8).collect();
        assert_eq!(compress(&data).unwrap(), compress(&data).unwrap());
    }

    #[test]
    fn test_plain_bzip2_rejected() {
        let mut stream = LEGACY_STREAM.to_vec();
        stream[0] = b'B';
        stream[1] = b'Z';
        let result = decompress(&stream);
        assert!(matches!(result, Err(DemodiskError::CorruptFormat { offset: 0, .. })));
    }

    #[test]
    fn test_bad_level_byte() {
        let mut stream = LEGACY_STREAM.to_vec();
        stream[3] = b'0';
        assert!(matches!(
            decompress(&stream),
            Err(DemodiskError::CorruptFormat { offset: 3, .. })
        ));
    }

    #[test]
    fn test_missing_block_magic() {
        let mut stream = LEGACY_STREAM.to_vec();
        stream[8] = b'2';
        assert!(matches!(
            decompress(&stream),
            Err(DemodiskError::CorruptFormat { offset: 8, .. })
        ));
    }

    #[test]
    fn test_short_header() {
        assert!(matches!(decompress(b"QZh9"), Err(DemodiskError::CorruptFormat { .. })));
    }

    #[test]
    fn test_truncated_body() {
        let result = decompress(&LEGACY_STREAM[..40]);
        assert!(matches!(result, Err(DemodiskError::CorruptFormat { .. })));
    }
}
