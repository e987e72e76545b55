use crate::error::{DemodiskError, Result};
use std::path::PathBuf;

/// Options for the interactive ramdisk shell
#[derive(Debug, Clone)]
pub struct ShellOptions {
    /// Ramdisk file (`.ramdisk`, `.z` or `.qnxde`)
    pub image: PathBuf,
    /// Commands to replay before the prompt
    pub script: Option<PathBuf>,
    /// Exit after the script instead of prompting
    pub batch: bool,
}

impl ShellOptions {
    /// Check the options before opening anything
    pub fn validate(&self) -> Result<()> {
        if self.batch && self.script.is_none() {
            return Err(DemodiskError::config("--batch needs a script (-s)"));
        }
        Ok(())
    }

    /// Read the script, if one was given
    pub fn read_script(&self) -> Result<Option<String>> {
        match &self.script {
            Some(path) => Ok(Some(std::fs::read_to_string(path)?)),
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_batch_needs_script() {
        let options = ShellOptions {
            image: PathBuf::from("boot_fs.ramdisk"),
            script: None,
            batch: true,
        };
        assert!(matches!(options.validate(), Err(DemodiskError::Config(_))));
    }

    #[test]
    fn test_read_script() {
        let dir = tempfile::tempdir().unwrap();
        let script = dir.path().join("edits.txt");
        std::fs::write(&script, "rm ksh\nsave\n").unwrap();

        let options = ShellOptions {
            image: PathBuf::from("boot_fs.ramdisk"),
            script: Some(script),
            batch: true,
        };
        assert_eq!(options.read_script().unwrap().as_deref(), Some("rm ksh\nsave\n"));
    }
}
