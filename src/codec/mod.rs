/// Compression codecs found on the demodisk

/// Byte-pair expansion of the third stage loader
pub mod pairs;
/// QZip stream codec
pub mod qzip;

pub use pairs::expand;
pub use qzip::{compress, decompress};

use crate::cipher::{self, CipherKey};
use crate::error::Result;
use crate::format::FileKind;

/// Turn stored file bytes of `kind` into plain ramdisk bytes
pub fn decode(kind: FileKind, data: &[u8]) -> Result<Vec<u8>> {
    match kind {
        FileKind::Ramdisk => Ok(data.to_vec()),
        FileKind::QZip => decompress(data),
        FileKind::Extension => decompress(&cipher::transform(data, &CipherKey::demodisk())?),
    }
}

/// Turn plain ramdisk bytes into stored file bytes of `kind`
pub fn encode(kind: FileKind, data: &[u8]) -> Result<Vec<u8>> {
    match kind {
        FileKind::Ramdisk => Ok(data.to_vec()),
        FileKind::QZip => compress(data),
        FileKind::Extension => cipher::transform(&compress(data)?, &CipherKey::demodisk()),
    }
}
