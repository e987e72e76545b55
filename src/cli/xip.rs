use crate::codec;
use crate::error::{DemodiskError, Result};
use crate::io::{read_file, reader::identify_kind, write_atomic};
use crate::xip::{self, DEFAULT_REMOVAL};
use std::path::PathBuf;

/// Options for the XIP program removal tool
#[derive(Debug, Clone)]
pub struct XipOptions {
    /// XIP image, usually `xip.z`
    pub input: PathBuf,
    /// Programs to remove, `cool` when empty
    pub remove: Vec<String>,
    /// Output path, defaults to rewriting the input
    pub output: Option<PathBuf>,
}

impl XipOptions {
    /// Programs to remove, after applying the default
    pub fn programs(&self) -> Vec<&str> {
        if self.remove.is_empty() {
            vec![DEFAULT_REMOVAL]
        } else {
            self.remove.iter().map(String::as_str).collect()
        }
    }

    /// Check every named program is in the catalog
    pub fn validate(&self) -> Result<()> {
        for name in self.programs() {
            xip::find_program(name).map_err(|_| {
                DemodiskError::config(format!(
                    "'{}' is not an XIP program (known: {})",
                    name,
                    xip::XIP_CATALOG.iter().map(|p| p.name).collect::<Vec<_>>().join(", ")
                ))
            })?;
        }
        Ok(())
    }
}

/// Run the removal tool, returning the output path
///
/// The image is decoded according to how it is stored, patched, and written
/// back in the same form.
pub fn run_xip(options: &XipOptions) -> Result<PathBuf> {
    options.validate()?;

    let data = read_file(&options.input)?;
    let kind = identify_kind(&options.input, &data)?;
    let plain = codec::decode(kind, &data)?;

    let mut patches = Vec::new();
    for name in options.programs() {
        patches.extend(xip::removal_patches(name)?);
    }
    let patched = xip::apply(&plain, &patches)?;

    let output = options.output.clone().unwrap_or_else(|| options.input.clone());
    write_atomic(&output, &codec::encode(kind, &patched)?)?;

    log::info!("removed {:?} from {}", options.programs(), output.display());
    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_program_is_cool() {
        let options = XipOptions {
            input: PathBuf::from("xip.z"),
            remove: Vec::new(),
            output: None,
        };
        assert_eq!(options.programs(), vec!["cool"]);
        assert!(options.validate().is_ok());
    }

    #[test]
    fn test_unknown_program_is_config_error() {
        let options = XipOptions {
            input: PathBuf::from("xip.z"),
            remove: vec!["pwm".to_string(), "tetris".to_string()],
            output: None,
        };
        assert!(matches!(options.validate(), Err(DemodiskError::Config(_))));
    }

    #[test]
    fn test_remove_cool_in_place() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("xip.z");
        let plain = vec![0xA5u8; 0x30000];
        std::fs::write(&input, codec::compress(&plain).unwrap()).unwrap();

        run_xip(&XipOptions {
            input: input.clone(),
            remove: Vec::new(),
            output: None,
        })
        .unwrap();

        let patched = codec::decompress(&std::fs::read(&input).unwrap()).unwrap();
        assert_eq!(patched.len(), plain.len());
        assert!(patched[0x80..0xC0].iter().all(|&b| b == 0));
        assert!(patched[0x23000..0x28000].iter().all(|&b| b == 0));
        assert_eq!(patched[0x40..0x80], plain[0x40..0x80]);
        assert_eq!(patched[0x28000..], plain[0x28000..]);
    }

    #[test]
    fn test_short_image_is_out_of_range() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("xip.z");
        std::fs::write(&input, codec::compress(&[1u8; 0x100]).unwrap()).unwrap();

        let result = run_xip(&XipOptions {
            input: input.clone(),
            remove: Vec::new(),
            output: None,
        });
        assert!(matches!(result, Err(DemodiskError::OutOfRange { .. })));
        // input left as it was
        assert_eq!(
            codec::decompress(&std::fs::read(&input).unwrap()).unwrap(),
            vec![1u8; 0x100]
        );
    }
}
