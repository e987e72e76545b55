use crate::error::{DemodiskError, Result};
use crate::image::DiskLayout;
use crate::io::{read_file, read_image, unpack_to_dir, workdir::default_output, write_atomic};
use crate::map::render_map;
use std::fmt::Write;
use std::path::PathBuf;
use std::str::FromStr;

/// What the split/join tool does
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SplitMode {
    /// Image to part files
    Unpack,
    /// Part files to image
    Pack,
    /// Describe an image
    Info,
}

impl FromStr for SplitMode {
    type Err = DemodiskError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "unpack" => Ok(SplitMode::Unpack),
            "pack" => Ok(SplitMode::Pack),
            "info" => Ok(SplitMode::Info),
            other => Err(DemodiskError::config(format!(
                "unknown mode '{}' (expected unpack, pack or info)",
                other
            ))),
        }
    }
}

/// Options for the split/join tool
#[derive(Debug, Clone)]
pub struct SplitOptions {
    /// Operation to run
    pub mode: SplitMode,
    /// Demodisk image (unpack, info)
    pub input: Option<PathBuf>,
    /// Directory holding the part files
    pub workdir: PathBuf,
    /// Packed image path (pack), defaults to `qnxdemo_repack.dat` in the working directory
    pub output: Option<PathBuf>,
}

impl SplitOptions {
    /// Check the options fit the mode
    pub fn validate(&self) -> Result<()> {
        match self.mode {
            SplitMode::Unpack | SplitMode::Info if self.input.is_none() => Err(DemodiskError::config(
                "an input image (-i) is required to unpack or describe",
            )),
            SplitMode::Pack if self.input.is_some() => Err(DemodiskError::config(
                "pack reads the working directory; use -o for the output image",
            )),
            _ => Ok(()),
        }
    }
}

/// Run the split/join tool, returning a report for the terminal
pub fn run_split(options: &SplitOptions) -> Result<String> {
    options.validate()?;
    let mut report = String::new();

    match options.mode {
        SplitMode::Unpack => {
            let input = required_input(options)?;
            let image = unpack_to_dir(&read_file(input)?, DiskLayout::demodisk(), &options.workdir)?;
            for (spec, part) in image.layout().parts().iter().zip(image.parts()) {
                let _ = writeln!(
                    report,
                    "{:<24} {:#08x} {:>9} bytes{}",
                    spec.file_name,
                    part.offset(),
                    part.len(),
                    if part.needs_cipher() { " (deciphered)" } else { "" }
                );
            }
            let _ = writeln!(report, "Unpacked {} into {}", input.display(), options.workdir.display());
        }
        SplitMode::Pack => {
            let image = crate::io::pack_from_dir(&options.workdir, DiskLayout::demodisk())?;
            let bytes = image.pack()?;
            let output = options
                .output
                .clone()
                .unwrap_or_else(|| default_output(&options.workdir));
            write_atomic(&output, &bytes)?;
            let _ = writeln!(report, "Packed {} bytes into {}", bytes.len(), output.display());
        }
        SplitMode::Info => {
            let input = required_input(options)?;
            let image = read_image(input, DiskLayout::demodisk())?;
            let _ = writeln!(report, "Image: {} ({} bytes)", input.display(), image.total_size());
            report.push_str(&render_map(
                "Demodisk Map",
                &image.segments(),
                image.layout().capacity(),
                64,
            ));
        }
    }

    log::info!("{:?} finished", options.mode);
    Ok(report)
}

fn required_input(options: &SplitOptions) -> Result<&PathBuf> {
    options
        .input
        .as_ref()
        .ok_or_else(|| DemodiskError::config("an input image (-i) is required"))
}
