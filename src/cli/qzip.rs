use crate::codec;
use crate::error::{DemodiskError, Result};
use crate::format::FileKind;
use crate::io::{read_file, write_atomic};
use std::path::{Path, PathBuf};

/// Which way the compress tool converts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QzipDirection {
    /// `.z` to `.ramdisk`
    Decompress,
    /// `.qnxde` to `.ramdisk`
    DecipherDecompress,
    /// `.ramdisk` to `.z`
    Compress,
    /// `.ramdisk` to `.qnxde`
    CompressCipher,
}

impl QzipDirection {
    /// Kind of file read
    pub fn source_kind(&self) -> FileKind {
        match self {
            QzipDirection::Decompress => FileKind::QZip,
            QzipDirection::DecipherDecompress => FileKind::Extension,
            QzipDirection::Compress | QzipDirection::CompressCipher => FileKind::Ramdisk,
        }
    }

    /// Kind of file written
    pub fn target_kind(&self) -> FileKind {
        match self {
            QzipDirection::Decompress | QzipDirection::DecipherDecompress => FileKind::Ramdisk,
            QzipDirection::Compress => FileKind::QZip,
            QzipDirection::CompressCipher => FileKind::Extension,
        }
    }
}

/// Options for the compress tool
#[derive(Debug, Clone)]
pub struct QzipOptions {
    /// File to convert
    pub input: PathBuf,
    /// Converted file, defaults to the input with the target extension
    pub output: Option<PathBuf>,
    /// Cipher the compressed output as an extension file
    pub extension: bool,
}

impl QzipOptions {
    /// Work out the direction from the input extension
    pub fn direction(&self) -> Result<QzipDirection> {
        match (FileKind::from_path(&self.input), self.extension) {
            (Some(FileKind::QZip), false) => Ok(QzipDirection::Decompress),
            (Some(FileKind::Extension), false) => Ok(QzipDirection::DecipherDecompress),
            (Some(FileKind::Ramdisk), false) => Ok(QzipDirection::Compress),
            (Some(FileKind::Ramdisk), true) => Ok(QzipDirection::CompressCipher),
            (Some(_), true) => Err(DemodiskError::config(
                "-e only applies when compressing a .ramdisk file",
            )),
            (None, _) => Err(DemodiskError::config(format!(
                "cannot tell what to do with {} (expected .z, .qnxde or .ramdisk)",
                self.input.display()
            ))),
        }
    }

    /// Output path for a direction
    pub fn output_path(&self, direction: QzipDirection) -> PathBuf {
        self.output
            .clone()
            .unwrap_or_else(|| self.input.with_extension(direction.target_kind().extension()))
    }
}

/// Run the compress tool, returning the output path and its size
pub fn run_qzip(options: &QzipOptions) -> Result<(PathBuf, usize)> {
    let direction = options.direction()?;
    let output = options.output_path(direction);
    if same_file(&options.input, &output) {
        return Err(DemodiskError::config("output would overwrite the input"));
    }

    let data = read_file(&options.input)?;
    let plain = codec::decode(direction.source_kind(), &data)?;
    let converted = codec::encode(direction.target_kind(), &plain)?;
    write_atomic(&output, &converted)?;

    log::info!("{:?}: {} -> {}", direction, options.input.display(), output.display());
    Ok((output, converted.len()))
}

fn same_file(a: &Path, b: &Path) -> bool {
    a == b || matches!((a.canonicalize(), b.canonicalize()), (Ok(x), Ok(y)) if x == y)
}
