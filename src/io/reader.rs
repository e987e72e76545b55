/// Readers for images and ramdisk files

use crate::codec;
use crate::error::{DemodiskError, Result};
use crate::format::{detect_kind, FileKind};
use crate::image::{DiskImage, DiskLayout};
use crate::ramdisk::Ramdisk;
use std::fs;
use std::path::Path;

/// Read a whole file
pub fn read_file<P: AsRef<Path>>(path: P) -> Result<Vec<u8>> {
    let path = path.as_ref();
    let data = fs::read(path)?;
    log::debug!("read {} bytes from {}", data.len(), path.display());
    Ok(data)
}

/// Read and split a demodisk image
pub fn read_image<P: AsRef<Path>>(path: P, layout: DiskLayout) -> Result<DiskImage> {
    DiskImage::unpack(&read_file(path)?, layout)
}

/// Work out how a ramdisk file is stored
///
/// Plain and QZip files are recognised by magic. Extension files are ciphered,
/// so they are only recognised by their `.qnxde` file extension.
pub fn identify_kind(path: &Path, data: &[u8]) -> Result<FileKind> {
    if let Some(kind) = detect_kind(data) {
        return Ok(kind);
    }
    match FileKind::from_path(path) {
        Some(FileKind::Extension) => Ok(FileKind::Extension),
        _ => Err(DemodiskError::corrupt(
            0,
            format!("{} is not a ramdisk, QZip or QNXDE file", path.display()),
        )),
    }
}

/// Open a ramdisk stored plain, QZip compressed or as an extension file
///
/// Returns the kind so the ramdisk can be written back the same way.
pub fn read_ramdisk<P: AsRef<Path>>(path: P) -> Result<(Ramdisk, FileKind)> {
    let path = path.as_ref();
    let data = read_file(path)?;
    let kind = identify_kind(path, &data)?;
    let ramdisk = Ramdisk::open(&codec::decode(kind, &data)?)?;

    log::info!("opened {} ({}, {} entries)", path.display(), kind, ramdisk.len());
    Ok((ramdisk, kind))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identify_by_magic_over_extension() {
        let kind = identify_kind(Path::new("odd.qnxde"), b"QZh9\0\0\0\0").unwrap();
        assert_eq!(kind, FileKind::QZip);
    }

    #[test]
    fn test_identify_extension_by_name() {
        let kind = identify_kind(Path::new("ext.qnxde"), &[0x4C, 0x1A, 0x09]).unwrap();
        assert_eq!(kind, FileKind::Extension);
    }

    #[test]
    fn test_identify_unknown() {
        assert!(matches!(
            identify_kind(Path::new("notes.txt"), b"hello"),
            Err(DemodiskError::CorruptFormat { .. })
        ));
    }

    #[test]
    fn test_read_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = read_file(dir.path().join("missing.dat"));
        assert!(matches!(result, Err(DemodiskError::Io(_))));
    }
}
