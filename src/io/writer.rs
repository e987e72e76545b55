/// Atomic writers

use crate::codec;
use crate::error::Result;
use crate::format::FileKind;
use crate::ramdisk::Ramdisk;
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;

/// Write `data` to `path`, replacing it only once the bytes are on disk
///
/// The temporary file lives next to the target so the final rename stays on
/// one filesystem. On failure the target is left as it was.
pub fn write_atomic<P: AsRef<Path>>(path: P, data: &[u8]) -> Result<()> {
    let path = path.as_ref();
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };

    let mut file = NamedTempFile::new_in(parent)?;
    file.write_all(data)?;
    file.as_file().sync_all()?;
    file.persist(path).map_err(|e| e.error)?;

    log::debug!("wrote {} bytes to {}", data.len(), path.display());
    Ok(())
}

/// Save a ramdisk to `path` stored as `kind`
///
/// The ramdisk is marked unchanged only after the write succeeds.
pub fn write_ramdisk<P: AsRef<Path>>(path: P, ramdisk: &mut Ramdisk, kind: FileKind) -> Result<usize> {
    let stored = codec::encode(kind, &ramdisk.to_bytes()?)?;
    write_atomic(&path, &stored)?;
    ramdisk.changed = false;

    log::info!("saved {} as {} ({} bytes)", path.as_ref().display(), kind, stored.len());
    Ok(stored.len())
}
