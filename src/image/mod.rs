/// Demodisk image container

/// Part table builder
pub mod builder;
/// Part tables
pub mod layout;

pub use builder::DiskLayoutBuilder;
pub use layout::{DiskLayout, Extent, LengthSlot, PartSpec, SlotValue};

use crate::cipher;
use crate::codec::pairs;
use crate::error::{DemodiskError, Result};
use crate::format::constants::STAGE3_OFFSET;
use crate::map::Segment;

/// One region of an unpacked image, held deciphered
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Part {
    pub(crate) name: String,
    pub(crate) offset: usize,
    pub(crate) data: Vec<u8>,
    pub(crate) cipher: bool,
}

impl Part {
    /// Get the part name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Image offset of the part as laid out now
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Length in bytes
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Is the part empty?
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Is the part stored ciphered on the image?
    pub fn needs_cipher(&self) -> bool {
        self.cipher
    }

    /// Deciphered contents
    pub fn data(&self) -> &[u8] {
        &self.data
    }
}

/// A demodisk split into its parts
#[derive(Debug, Clone)]
pub struct DiskImage {
    pub(crate) layout: DiskLayout,
    pub(crate) parts: Vec<Part>,
    /// Has a part been replaced since unpacking?
    pub(crate) changed: bool,
}

impl DiskImage {
    /// Split image bytes according to `layout`, deciphering ciphered parts
    pub fn unpack(image: &[u8], layout: DiskLayout) -> Result<Self> {
        layout.validate()?;

        let mut parts = Vec::with_capacity(layout.parts.len());
        let mut offset = 0;

        for spec in &layout.parts {
            let end = match spec.extent {
                Extent::Fixed(length) => offset + length,
                Extent::Remainder => image.len(),
            };
            let raw = image.get(offset..end).ok_or_else(|| {
                DemodiskError::corrupt(
                    image.len(),
                    format!("image ends inside part '{}' ({:#x}..{:#x})", spec.name, offset, end),
                )
            })?;

            let data = if spec.cipher {
                cipher::transform_at(raw, &layout.key, offset - layout.cipher_origin)?
            } else {
                raw.to_vec()
            };

            log::debug!("unpack: part '{}' at {:#x}, {} bytes", spec.name, offset, data.len());
            parts.push(Part {
                name: spec.name.clone(),
                offset,
                data,
                cipher: spec.cipher,
            });
            offset = end;
        }

        if offset != image.len() {
            return Err(DemodiskError::corrupt(
                offset,
                format!("{} bytes after the last part", image.len() - offset),
            ));
        }

        Ok(Self {
            layout,
            parts,
            changed: false,
        })
    }

    /// Assemble an image from deciphered part contents given in table order
    pub fn from_parts(layout: DiskLayout, contents: Vec<(String, Vec<u8>)>) -> Result<Self> {
        layout.validate()?;
        if contents.len() != layout.parts.len() {
            return Err(DemodiskError::consistency(format!(
                "layout has {} parts, {} supplied",
                layout.parts.len(),
                contents.len()
            )));
        }

        let mut parts = Vec::with_capacity(contents.len());
        let mut offset = 0;
        for (spec, (name, data)) in layout.parts.iter().zip(contents) {
            if spec.name != name {
                return Err(DemodiskError::consistency(format!(
                    "expected part '{}', got '{}'",
                    spec.name, name
                )));
            }
            let length = data.len();
            parts.push(Part {
                name,
                offset,
                data,
                cipher: spec.cipher,
            });
            offset += length;
        }

        Ok(Self {
            layout,
            parts,
            changed: true,
        })
    }

    /// Get the part table
    pub fn layout(&self) -> &DiskLayout {
        &self.layout
    }

    /// Get all parts in image order
    pub fn parts(&self) -> &[Part] {
        &self.parts
    }

    /// Look up a part by name
    pub fn part(&self, name: &str) -> Result<&Part> {
        self.parts
            .iter()
            .find(|p| p.name == name)
            .ok_or_else(|| DemodiskError::not_found(format!("part '{}'", name)))
    }

    /// Replace a part's deciphered contents; later offsets shift accordingly
    pub fn replace_part(&mut self, name: &str, data: Vec<u8>) -> Result<()> {
        let index = self.layout.index_of(name)?;
        self.parts[index].data = data;

        let mut offset = self.parts[index].offset;
        for part in &mut self.parts[index..] {
            part.offset = offset;
            offset += part.data.len();
        }
        self.changed = true;
        Ok(())
    }

    /// Current image size
    pub fn total_size(&self) -> usize {
        self.parts.iter().map(|p| p.data.len()).sum()
    }

    /// Has a part been replaced since unpacking?
    pub fn is_changed(&self) -> bool {
        self.changed
    }

    /// Reassemble the image
    ///
    /// Rewrites every length slot, checks pinned parts and capacity, then
    /// ciphers each part at its final offset.
    pub fn pack(&self) -> Result<Vec<u8>> {
        let mut contents: Vec<Vec<u8>> = self.parts.iter().map(|p| p.data.clone()).collect();
        let offsets: Vec<usize> = self.parts.iter().map(|p| p.offset).collect();

        for (index, spec) in self.layout.parts.iter().enumerate() {
            if spec.pinned && offsets[index] != self.layout.offset_of(index) {
                return Err(DemodiskError::consistency(format!(
                    "part '{}' would move from {:#x} to {:#x}",
                    spec.name,
                    self.layout.offset_of(index),
                    offsets[index]
                )));
            }
        }

        for slot in &self.layout.slots {
            let source = self.layout.index_of(&slot.part)?;
            let carrier = self.layout.index_of(&slot.carrier)?;
            let value = match slot.value {
                SlotValue::Length => contents[source].len(),
                SlotValue::Offset => offsets[source],
            };
            let value = u32::try_from(value).map_err(|_| {
                DemodiskError::consistency(format!("{:#x} does not fit a u32 slot", value))
            })?;

            let field = contents[carrier]
                .get_mut(slot.offset..slot.offset + 4)
                .ok_or_else(|| {
                    DemodiskError::consistency(format!(
                        "slot at {:#x} lies outside part '{}'",
                        slot.offset, slot.carrier
                    ))
                })?;
            field.copy_from_slice(&value.to_le_bytes());
            log::debug!(
                "pack: slot {}+{:#x} <- {:?} of '{}' = {:#x}",
                slot.carrier,
                slot.offset,
                slot.value,
                slot.part,
                value
            );
        }

        let total = self.total_size();
        if total > self.layout.capacity {
            return Err(DemodiskError::consistency(format!(
                "image is {} bytes, medium holds {}",
                total, self.layout.capacity
            )));
        }

        let mut out = Vec::with_capacity(total);
        for ((part, data), offset) in self.parts.iter().zip(&contents).zip(&offsets) {
            if part.cipher {
                let position = offset.checked_sub(self.layout.cipher_origin).ok_or_else(|| {
                    DemodiskError::consistency(format!(
                        "ciphered part '{}' would start before the cipher origin",
                        part.name
                    ))
                })?;
                out.extend(cipher::transform_at(data, &self.layout.key, position)?);
            } else {
                out.extend_from_slice(data);
            }
        }

        log::debug!("pack: {} parts, {} bytes", self.parts.len(), out.len());
        Ok(out)
    }

    /// Name, offset and length of every part, for maps and listings
    pub fn segments(&self) -> Vec<Segment> {
        self.parts
            .iter()
            .map(|p| Segment::new(p.name.clone(), p.offset, p.data.len()))
            .collect()
    }
}

/// Decode the pair-compressed third stage loader held in the loader part
pub fn decode_stage3(loader: &[u8]) -> Result<Vec<u8>> {
    let payload = loader.get(STAGE3_OFFSET..).ok_or(DemodiskError::OutOfRange {
        offset: STAGE3_OFFSET,
        length: 0,
        buffer_len: loader.len(),
    })?;
    pairs::expand(payload)
}
