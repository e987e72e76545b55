/// Demodisk file kinds and constants

/// Format constants
pub mod constants;

pub use constants::*;

use std::path::Path;

/// Kind of file found in or around a demodisk
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    /// Uncompressed ramdisk (`.ramdisk`)
    Ramdisk,
    /// QZip compressed stream (`.z`)
    QZip,
    /// Ciphered QZip stream, the extension file format (`.qnxde`)
    Extension,
}

impl FileKind {
    /// Get the magic bytes for this kind, if it has any visible ones
    pub fn magic_bytes(&self) -> &'static [u8] {
        match self {
            FileKind::Ramdisk => &RAMDISK_MAGIC[..],
            FileKind::QZip => &QZIP_MAGIC[..],
            FileKind::Extension => &[], // ciphered, no visible magic
        }
    }

    /// Get a human-readable name for this kind
    pub fn name(&self) -> &'static str {
        match self {
            FileKind::Ramdisk => "Ramdisk",
            FileKind::QZip => "QZip stream",
            FileKind::Extension => "QNXDE extension",
        }
    }

    /// File extension used for this kind
    pub fn extension(&self) -> &'static str {
        match self {
            FileKind::Ramdisk => "ramdisk",
            FileKind::QZip => "z",
            FileKind::Extension => "qnxde",
        }
    }

    /// Infer the kind from a path's extension
    pub fn from_path<P: AsRef<Path>>(path: P) -> Option<Self> {
        let ext = path.as_ref().extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "ramdisk" => Some(FileKind::Ramdisk),
            "z" => Some(FileKind::QZip),
            "qnxde" => Some(FileKind::Extension),
            _ => None,
        }
    }
}

impl std::fmt::Display for FileKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Detect a file kind from its leading bytes
///
/// Extension files are ciphered and cannot be recognised this way.
pub fn detect_kind(magic: &[u8]) -> Option<FileKind> {
    [FileKind::Ramdisk, FileKind::QZip, FileKind::Extension]
        .into_iter()
        .find(|kind| !kind.magic_bytes().is_empty() && magic.starts_with(kind.magic_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_ramdisk() {
        assert_eq!(detect_kind(b"RD_v1.2\0rest"), Some(FileKind::Ramdisk));
    }

    #[test]
    fn test_detect_qzip() {
        assert_eq!(detect_kind(b"QZh9\0\0\0\0"), Some(FileKind::QZip));
    }

    #[test]
    fn test_detect_invalid() {
        assert_eq!(detect_kind(b"BZh91AY&SY"), None);
        assert_eq!(detect_kind(b""), None);
    }

    #[test]
    fn test_magic_bytes_drive_detection() {
        for kind in [FileKind::Ramdisk, FileKind::QZip] {
            assert_eq!(detect_kind(kind.magic_bytes()), Some(kind));
        }
        assert!(FileKind::Extension.magic_bytes().is_empty());
    }

    #[test]
    fn test_from_path() {
        assert_eq!(FileKind::from_path("work/xip.z"), Some(FileKind::QZip));
        assert_eq!(FileKind::from_path("ext.QNXDE"), Some(FileKind::Extension));
        assert_eq!(FileKind::from_path("boot_fs.ramdisk"), Some(FileKind::Ramdisk));
        assert_eq!(FileKind::from_path("notes.txt"), None);
        assert_eq!(FileKind::from_path("noext"), None);
    }
}
