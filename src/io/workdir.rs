/// Working directory mapping of image parts
///
/// Unpacking writes one file per part (named by the part table) plus the
/// decoded third stage loader for inspection. Packing reads the part files
/// back in table order.

use crate::error::{DemodiskError, Result};
use crate::format::constants::{REPACK_FILENAME, STAGE3_FILENAME};
use crate::image::{decode_stage3, DiskImage, DiskLayout};
use crate::io::reader::read_file;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Name of the part holding the third stage loader
const LOADER_PART: &str = "loader";

/// Split `image` into part files inside `dir`
///
/// All or nothing: files are staged in a temporary directory inside `dir`,
/// and replaced files are kept aside until every staged file is in place. On
/// failure the previous contents are restored, and `dir` is removed again if
/// this call created it.
pub fn unpack_to_dir<P: AsRef<Path>>(image: &[u8], layout: DiskLayout, dir: P) -> Result<DiskImage> {
    let dir = dir.as_ref();
    let disk = DiskImage::unpack(image, layout)?;

    let created = !dir.exists();
    fs::create_dir_all(dir)?;

    let count = match stage_and_commit(&disk, dir) {
        Ok(count) => count,
        Err(e) => {
            if created {
                if let Err(cleanup) = fs::remove_dir_all(dir) {
                    log::warn!("could not remove {}: {}", dir.display(), cleanup);
                }
            }
            return Err(e);
        }
    };

    log::info!("unpacked {} files into {}", count, dir.display());
    Ok(disk)
}

fn stage_and_commit(disk: &DiskImage, dir: &Path) -> Result<usize> {
    let staging = tempfile::Builder::new().prefix(".unpack").tempdir_in(dir)?;

    let mut staged = Vec::new();
    for (spec, part) in disk.layout().parts().iter().zip(disk.parts()) {
        fs::write(staging.path().join(&spec.file_name), part.data())?;
        staged.push(spec.file_name.clone());
    }

    if let Ok(loader) = disk.part(LOADER_PART) {
        match decode_stage3(loader.data()) {
            Ok(stage3) => {
                fs::write(staging.path().join(STAGE3_FILENAME), &stage3)?;
                staged.push(STAGE3_FILENAME.to_string());
            }
            Err(e) => log::warn!("third stage loader not decoded: {}", e),
        }
    }

    if let Some(name) = staged.iter().find(|name| dir.join(name).is_dir()) {
        return Err(DemodiskError::config(format!(
            "{} is a directory",
            dir.join(name).display()
        )));
    }

    let backup = tempfile::Builder::new().prefix(".backup").tempdir_in(dir)?;
    commit(&staged, staging.path(), backup.path(), dir)?;
    Ok(staged.len())
}

/// Move every staged file into `dir`, or none of them
fn commit(names: &[String], staging: &Path, backup: &Path, dir: &Path) -> Result<()> {
    // (name, whether an older file was moved to `backup`)
    let mut moved: Vec<(&str, bool)> = Vec::with_capacity(names.len());

    for name in names {
        let target = dir.join(name);
        let replaced = target.exists();
        if replaced {
            if let Err(e) = fs::rename(&target, backup.join(name)) {
                rollback(&moved, backup, dir);
                return Err(e.into());
            }
        }
        moved.push((name.as_str(), replaced));

        if let Err(e) = fs::rename(staging.join(name), &target) {
            log::error!("moving {} into place failed, restoring {}", name, dir.display());
            rollback(&moved, backup, dir);
            return Err(e.into());
        }
    }
    Ok(())
}

fn rollback(moved: &[(&str, bool)], backup: &Path, dir: &Path) {
    for &(name, replaced) in moved.iter().rev() {
        let target = dir.join(name);
        if let Err(e) = fs::remove_file(&target) {
            if e.kind() != ErrorKind::NotFound {
                log::warn!("could not remove {}: {}", target.display(), e);
            }
        }
        if replaced {
            if let Err(e) = fs::rename(backup.join(name), &target) {
                log::error!("could not restore {}: {}", target.display(), e);
            }
        }
    }
}

/// Read the part files in `dir` back into an image
pub fn pack_from_dir<P: AsRef<Path>>(dir: P, layout: DiskLayout) -> Result<DiskImage> {
    let dir = dir.as_ref();
    let contents = layout
        .parts()
        .iter()
        .map(|spec| Ok((spec.name.clone(), read_file(dir.join(&spec.file_name))?)))
        .collect::<Result<Vec<_>>>()?;

    DiskImage::from_parts(layout, contents)
}

/// Default output path for a repacked image
pub fn default_output<P: AsRef<Path>>(dir: P) -> PathBuf {
    dir.as_ref().join(REPACK_FILENAME)
}
