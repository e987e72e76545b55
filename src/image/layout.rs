/// Static part tables

use crate::cipher::CipherKey;
use crate::error::{DemodiskError, Result};
use crate::format::constants::*;
use crate::image::DiskLayoutBuilder;

/// How many bytes a part occupies
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Extent {
    /// Exactly this many bytes
    Fixed(usize),
    /// Everything up to the end of the image (last part only)
    Remainder,
}

/// One row of a part table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartSpec {
    /// Part name
    pub name: String,
    /// File name used in a working directory
    pub file_name: String,
    /// Size of the part on an unpacked image
    pub extent: Extent,
    /// Is the part stored ciphered?
    pub cipher: bool,
    /// Must the part stay at its table offset when packing?
    pub pinned: bool,
}

impl PartSpec {
    /// Create a part table row, unciphered and not pinned
    pub fn new(name: &str, file_name: &str, extent: Extent) -> Self {
        Self {
            name: name.to_string(),
            file_name: file_name.to_string(),
            extent,
            cipher: false,
            pinned: false,
        }
    }

    /// Mark the part as ciphered
    pub fn ciphered(mut self) -> Self {
        self.cipher = true;
        self
    }

    /// Mark the part as pinned to its table offset
    pub fn pinned(mut self) -> Self {
        self.pinned = true;
        self
    }
}

/// Value written into a length slot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotValue {
    /// Length of the referenced part
    Length,
    /// Image offset of the referenced part
    Offset,
}

/// A u32 LE field inside one part that records the length or offset of another
///
/// Slots are rewritten on every pack, before ciphering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LengthSlot {
    /// Part whose length or offset is recorded
    pub part: String,
    /// Part that holds the field
    pub carrier: String,
    /// Offset of the field within the carrier
    pub offset: usize,
    /// What is recorded
    pub value: SlotValue,
}

/// A complete part table for one image format
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiskLayout {
    pub(crate) parts: Vec<PartSpec>,
    pub(crate) capacity: usize,
    pub(crate) cipher_origin: usize,
    pub(crate) key: CipherKey,
    pub(crate) slots: Vec<LengthSlot>,
}

impl DiskLayout {
    /// Start building a layout
    pub fn builder() -> DiskLayoutBuilder {
        DiskLayoutBuilder::new()
    }

    /// The QNX demodisk part table
    pub fn demodisk() -> Self {
        Self {
            parts: vec![
                PartSpec::new("boot", BOOT_FILENAME, Extent::Fixed(BOOT_REGION_SIZE)).pinned(),
                PartSpec::new("loader", LOADER_FILENAME, Extent::Fixed(LOADER_REGION_SIZE))
                    .ciphered()
                    .pinned(),
                PartSpec::new("ramdisk", RAMDISK_FILENAME, Extent::Remainder)
                    .ciphered()
                    .pinned(),
            ],
            capacity: FLOPPY_CAPACITY,
            cipher_origin: CIPHER_ORIGIN,
            key: CipherKey::demodisk(),
            slots: Vec::new(),
        }
    }

    /// Get the part table rows
    pub fn parts(&self) -> &[PartSpec] {
        &self.parts
    }

    /// Look up a part table row by name
    pub fn part(&self, name: &str) -> Option<&PartSpec> {
        self.parts.iter().find(|p| p.name == name)
    }

    /// Index of a part in the table
    pub fn index_of(&self, name: &str) -> Result<usize> {
        self.parts
            .iter()
            .position(|p| p.name == name)
            .ok_or_else(|| DemodiskError::not_found(format!("part '{}'", name)))
    }

    /// Capacity of the target medium in bytes
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Image offset where the cipher stream starts
    pub fn cipher_origin(&self) -> usize {
        self.cipher_origin
    }

    /// Key schedule for ciphered parts
    pub fn key(&self) -> &CipherKey {
        &self.key
    }

    /// Length slots rewritten on pack
    pub fn slots(&self) -> &[LengthSlot] {
        &self.slots
    }

    /// Table offset of the part at `index`
    ///
    /// Every part before a remainder has a fixed extent, so offsets are static.
    pub fn offset_of(&self, index: usize) -> usize {
        self.parts[..index]
            .iter()
            .map(|p| match p.extent {
                Extent::Fixed(n) => n,
                Extent::Remainder => 0,
            })
            .sum()
    }

    /// Check the table is usable
    pub(crate) fn validate(&self) -> Result<()> {
        if self.parts.is_empty() {
            return Err(DemodiskError::config("layout has no parts"));
        }
        self.key.validate()?;

        for (index, spec) in self.parts.iter().enumerate() {
            if self.parts[..index].iter().any(|p| p.name == spec.name) {
                return Err(DemodiskError::config(format!("part '{}' listed twice", spec.name)));
            }
            if spec.extent == Extent::Remainder && index + 1 != self.parts.len() {
                return Err(DemodiskError::config(format!(
                    "remainder part '{}' is not last",
                    spec.name
                )));
            }
            if spec.cipher && self.offset_of(index) < self.cipher_origin {
                return Err(DemodiskError::config(format!(
                    "ciphered part '{}' starts before the cipher origin {:#x}",
                    spec.name, self.cipher_origin
                )));
            }
        }

        for slot in &self.slots {
            self.index_of(&slot.part)?;
            self.index_of(&slot.carrier)?;
        }
        Ok(())
    }
}

impl Default for DiskLayout {
    fn default() -> Self {
        Self::demodisk()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_demodisk_offsets() {
        let layout = DiskLayout::demodisk();
        assert!(layout.validate().is_ok());
        assert_eq!(layout.offset_of(0), 0);
        assert_eq!(layout.offset_of(1), 0xC00);
        assert_eq!(layout.offset_of(2), 0x2EC00);
        assert_eq!(layout.part("loader").unwrap().file_name, "loader.bin");
        assert!(layout.slots().is_empty());
    }

    #[test]
    fn test_index_of_missing_part() {
        let layout = DiskLayout::demodisk();
        assert!(matches!(layout.index_of("xip"), Err(DemodiskError::NotFound(_))));
    }

    #[test]
    fn test_remainder_must_be_last() {
        let mut layout = DiskLayout::demodisk();
        layout.parts.swap(1, 2);
        assert!(matches!(layout.validate(), Err(DemodiskError::Config(_))));
    }

    #[test]
    fn test_cipher_before_origin_rejected() {
        let mut layout = DiskLayout::demodisk();
        layout.parts[0].cipher = true;
        assert!(matches!(layout.validate(), Err(DemodiskError::Config(_))));
    }
}
