/// Byte-range patches for the execute-in-place image
///
/// The patcher knows nothing about what it edits; the catalog of XIP programs
/// below only turns a program name into the descriptors that blank it out.

use crate::error::{DemodiskError, Result};
use crate::format::constants::XIP_ENTRY_SIZE;

/// What to write over a patched range
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PatchAction {
    /// Write zeros
    ZeroFill,
    /// Write these bytes; must be exactly the range length
    Replace(Vec<u8>),
}

/// One byte-range edit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatchDescriptor {
    /// Start of the range
    pub offset: usize,
    /// Length of the range
    pub length: usize,
    /// What to write
    pub action: PatchAction,
}

impl PatchDescriptor {
    /// Zero-fill `length` bytes at `offset`
    pub fn zero_fill(offset: usize, length: usize) -> Self {
        Self {
            offset,
            length,
            action: PatchAction::ZeroFill,
        }
    }

    /// Replace the bytes at `offset` with `bytes`
    pub fn replace(offset: usize, bytes: Vec<u8>) -> Self {
        Self {
            offset,
            length: bytes.len(),
            action: PatchAction::Replace(bytes),
        }
    }
}

/// Apply patches in ascending offset order, returning the patched copy
///
/// Every descriptor is checked before any byte is written.
pub fn apply(buffer: &[u8], patches: &[PatchDescriptor]) -> Result<Vec<u8>> {
    for patch in patches {
        let end = patch.offset.checked_add(patch.length);
        if end.map_or(true, |end| end > buffer.len()) {
            return Err(DemodiskError::OutOfRange {
                offset: patch.offset,
                length: patch.length,
                buffer_len: buffer.len(),
            });
        }
        if let PatchAction::Replace(bytes) = &patch.action {
            if bytes.len() != patch.length {
                return Err(DemodiskError::config(format!(
                    "replacement at {:#x} is {} bytes for a {} byte range",
                    patch.offset,
                    bytes.len(),
                    patch.length
                )));
            }
        }
    }

    let mut ordered: Vec<&PatchDescriptor> = patches.iter().collect();
    ordered.sort_by_key(|p| p.offset);

    let mut out = buffer.to_vec();
    for patch in ordered {
        let range = &mut out[patch.offset..patch.offset + patch.length];
        match &patch.action {
            PatchAction::ZeroFill => range.fill(0),
            PatchAction::Replace(bytes) => range.copy_from_slice(bytes),
        }
        log::debug!("xip: patched {:#x}+{:#x}", patch.offset, patch.length);
    }
    Ok(out)
}

/// A program stored in the XIP image
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct XipProgram {
    /// Program name
    pub name: &'static str,
    /// Offset of its directory record
    pub entry_offset: usize,
    /// Offset of its data
    pub data_offset: usize,
    /// Size of its data
    pub data_size: usize,
}

const fn program(name: &'static str, entry_offset: usize, data_offset: usize, data_size: usize) -> XipProgram {
    XipProgram {
        name,
        entry_offset,
        data_offset,
        data_size,
    }
}

/// Programs in the demodisk XIP image
pub const XIP_CATALOG: [XipProgram; 13] = [
    program("Pg.vga4flat", 0x40, 0x1000, 0x22000),
    program("cool", 0x80, 0x23000, 0x5000),
    program("destaller", 0xC0, 0x28000, 0x5000),
    program("dhcpc", 0x100, 0x2D000, 0x5000),
    program("fbrowse", 0x140, 0x32000, 0x5000),
    program("installer", 0x180, 0x37000, 0x9000),
    program("netcfg", 0x1C0, 0x40000, 0xC000),
    program("note", 0x200, 0x4C000, 0xE000),
    program("phfontphf", 0x240, 0x5A000, 0xA000),
    program("phgrafx", 0x280, 0x64000, 0x8000),
    program("pwm", 0x2C0, 0x6C000, 0x16000),
    program("voyager", 0x300, 0x82000, 0x17000),
    program("voyager.server", 0x340, 0x99000, 0xB2000),
];

/// Program removed when no other is named
pub const DEFAULT_REMOVAL: &str = "cool";

/// Look up a program in the catalog
pub fn find_program(name: &str) -> Result<&'static XipProgram> {
    XIP_CATALOG
        .iter()
        .find(|p| p.name == name)
        .ok_or_else(|| DemodiskError::not_found(format!("XIP program '{}'", name)))
}

/// Patches that blank a program's directory record and data
pub fn removal_patches(name: &str) -> Result<Vec<PatchDescriptor>> {
    let program = find_program(name)?;
    Ok(vec![
        PatchDescriptor::zero_fill(program.entry_offset, XIP_ENTRY_SIZE),
        PatchDescriptor::zero_fill(program.data_offset, program.data_size),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn buffer() -> Vec<u8> {
        (0..1000).map(|i| (i % 255) as u8 + 1).collect()
    }

    #[test]
    fn test_zero_fill_range() {
        let input = buffer();
        let patches = [PatchDescriptor::zero_fill(100, 50)];
        let out = apply(&input, &patches).unwrap();

        assert!(out[100..150].iter().all(|&b| b == 0));
        assert_eq!(out[..100], input[..100]);
        assert_eq!(out[150..], input[150..]);
        assert_eq!(apply(&out, &patches).unwrap(), out);
    }

    #[test]
    fn test_replace_range() {
        let patches = [PatchDescriptor::replace(10, b"QNX".to_vec())];
        let out = apply(&buffer(), &patches).unwrap();
        assert_eq!(&out[10..13], b"QNX");
        assert_eq!(apply(&out, &patches).unwrap(), out);
    }

    #[test]
    fn test_later_offset_wins_over_order_given() {
        let patches = [
            PatchDescriptor::replace(4, vec![9, 9]),
            PatchDescriptor::zero_fill(0, 6),
        ];
        let out = apply(&buffer(), &patches).unwrap();
        assert_eq!(&out[..6], &[0, 0, 0, 0, 9, 9]);
    }

    #[test]
    fn test_out_of_range() {
        let result = apply(&buffer(), &[PatchDescriptor::zero_fill(990, 11)]);
        assert!(matches!(
            result,
            Err(DemodiskError::OutOfRange { offset: 990, length: 11, buffer_len: 1000 })
        ));
        assert!(apply(&buffer(), &[PatchDescriptor::zero_fill(usize::MAX, 2)]).is_err());
    }

    #[test]
    fn test_replace_length_mismatch() {
        let patch = PatchDescriptor {
            offset: 0,
            length: 4,
            action: PatchAction::Replace(vec![1, 2]),
        };
        assert!(matches!(apply(&buffer(), &[patch]), Err(DemodiskError::Config(_))));
    }

    #[test]
    fn test_catalog_records_are_contiguous() {
        for (i, program) in XIP_CATALOG.iter().enumerate() {
            assert_eq!(program.entry_offset, XIP_ENTRY_SIZE * (i + 1));
        }
        for pair in XIP_CATALOG.windows(2) {
            assert_eq!(pair[0].data_offset + pair[0].data_size, pair[1].data_offset);
        }
    }

    #[test]
    fn test_removal_patches_for_cool() {
        let patches = removal_patches(DEFAULT_REMOVAL).unwrap();
        assert_eq!(patches[0], PatchDescriptor::zero_fill(0x80, 0x40));
        assert_eq!(patches[1], PatchDescriptor::zero_fill(0x23000, 0x5000));
    }

    #[test]
    fn test_unknown_program() {
        assert!(matches!(removal_patches("doom"), Err(DemodiskError::NotFound(_))));
    }
}
