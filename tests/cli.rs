use demodisk::format::constants::*;
use demodisk::{Attributes, DiskImage, DiskLayout, Ramdisk};
use std::error::Error;
use std::fs;
use std::path::Path;
use std::process::{Command, Output};
use tempfile::tempdir;

fn run(bin: &str, args: &[&str]) -> Result<Output, Box<dyn Error>> {
    Ok(Command::new(bin).args(args).output()?)
}

fn path(p: &Path) -> &str {
    p.to_str().unwrap()
}

fn write_demodisk(target: &Path) -> Result<(), Box<dyn Error>> {
    let mut ramdisk = Ramdisk::new();
    ramdisk.add_entry("ksh", vec![1u8; 64], Attributes::EXECUTABLE)?;
    ramdisk.add_entry("pwm.menu", b"Shell\tksh\n".to_vec(), Attributes::CONFIG)?;
    let image = DiskImage::from_parts(
        DiskLayout::demodisk(),
        vec![
            ("boot".to_string(), vec![0xEB; BOOT_REGION_SIZE]),
            ("loader".to_string(), vec![0u8; LOADER_REGION_SIZE]),
            ("ramdisk".to_string(), ramdisk.to_bytes()?),
        ],
    )?;
    fs::write(target, image.pack()?)?;
    Ok(())
}

#[test]
fn test_split_edit_join_flow() -> Result<(), Box<dyn Error>> {
    let dir = tempdir()?;
    let disk = dir.path().join("qnxdemo.dat");
    let work = dir.path().join("work");
    write_demodisk(&disk)?;

    let unpack = run(
        env!("CARGO_BIN_EXE_qnxdd"),
        &["-m", "unpack", "-i", path(&disk), "-w", path(&work)],
    )?;
    assert!(
        unpack.status.success(),
        "unpack failed: {}",
        String::from_utf8_lossy(&unpack.stderr)
    );
    assert!(work.join(RAMDISK_FILENAME).exists());

    // compress, edit through the shell, expand again
    let ramdisk = work.join(RAMDISK_FILENAME);
    let zip = run(env!("CARGO_BIN_EXE_qzip"), &["-i", path(&ramdisk)])?;
    assert!(zip.status.success(), "qzip failed: {}", String::from_utf8_lossy(&zip.stderr));
    let compressed = work.join("boot_fs.z");
    assert!(compressed.exists());

    let script = dir.path().join("edits.txt");
    fs::write(&script, "rm ksh\nsave\n")?;
    let shell = run(
        env!("CARGO_BIN_EXE_rdsh"),
        &["-i", path(&compressed), "-s", path(&script), "--batch"],
    )?;
    assert!(
        shell.status.success(),
        "rdsh failed: {}",
        String::from_utf8_lossy(&shell.stderr)
    );
    assert!(String::from_utf8(shell.stdout)?.contains("Removed 'ksh'"));

    let expanded = work.join("edited.ramdisk");
    let unzip = run(
        env!("CARGO_BIN_EXE_qzip"),
        &["-i", path(&compressed), "-o", path(&expanded)],
    )?;
    assert!(unzip.status.success());
    fs::rename(&expanded, &ramdisk)?;

    let pack = run(env!("CARGO_BIN_EXE_qnxdd"), &["-m", "pack", "-w", path(&work)])?;
    assert!(pack.status.success(), "pack failed: {}", String::from_utf8_lossy(&pack.stderr));
    let repacked = fs::read(work.join(REPACK_FILENAME))?;

    let image = DiskImage::unpack(&repacked, DiskLayout::demodisk())?;
    let ramdisk = Ramdisk::open(image.part("ramdisk")?.data())?;
    assert_eq!(ramdisk.list_entries(), vec!["pwm.menu"]);
    Ok(())
}

#[test]
fn test_info_draws_map() -> Result<(), Box<dyn Error>> {
    let dir = tempdir()?;
    let disk = dir.path().join("qnxdemo.dat");
    write_demodisk(&disk)?;

    let info = run(env!("CARGO_BIN_EXE_qnxdd"), &["-m", "info", "-i", path(&disk)])?;
    assert!(info.status.success());
    let stdout = String::from_utf8(info.stdout)?;
    assert!(stdout.contains("Demodisk Map"));
    assert!(stdout.contains("ramdisk"));
    Ok(())
}

#[test]
fn test_reports_errors_with_failure_status() -> Result<(), Box<dyn Error>> {
    let dir = tempdir()?;
    let notes = dir.path().join("notes.txt");
    fs::write(&notes, b"not a ramdisk")?;

    let qzip = run(env!("CARGO_BIN_EXE_qzip"), &["-i", path(&notes)])?;
    assert!(!qzip.status.success());
    assert!(String::from_utf8(qzip.stderr)?.starts_with("Error:"));

    let xip = run(
        env!("CARGO_BIN_EXE_xipclean"),
        &["-i", path(&notes), "--remove", "tetris"],
    )?;
    assert!(!xip.status.success());

    let script = dir.path().join("bad.txt");
    fs::write(&script, "frobnicate\n")?;
    let ramdisk = dir.path().join("fs.ramdisk");
    fs::write(&ramdisk, Ramdisk::new().to_bytes()?)?;
    let shell = run(
        env!("CARGO_BIN_EXE_rdsh"),
        &["-i", path(&ramdisk), "-s", path(&script), "--batch"],
    )?;
    assert!(!shell.status.success());
    assert!(String::from_utf8(shell.stderr)?.contains("line 1"));
    Ok(())
}

#[test]
fn test_xipclean_blanks_cool() -> Result<(), Box<dyn Error>> {
    let dir = tempdir()?;
    let xip = dir.path().join("xip.z");
    fs::write(&xip, demodisk::codec::compress(&vec![0x11u8; 0x30000])?)?;

    let clean = run(env!("CARGO_BIN_EXE_xipclean"), &["-i", path(&xip)])?;
    assert!(clean.status.success(), "{}", String::from_utf8_lossy(&clean.stderr));

    let plain = demodisk::codec::decompress(&fs::read(&xip)?)?;
    assert!(plain[0x23000..0x28000].iter().all(|&b| b == 0));
    assert_eq!(plain[0x22FFF], 0x11);
    Ok(())
}
