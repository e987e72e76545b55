/// Builder for part tables

use crate::cipher::CipherKey;
use crate::error::Result;
use crate::format::constants::{CIPHER_ORIGIN, FLOPPY_CAPACITY};
use crate::image::{DiskLayout, LengthSlot, PartSpec, SlotValue};

/// Builder for constructing a [`DiskLayout`]
pub struct DiskLayoutBuilder {
    layout: DiskLayout,
}

impl DiskLayoutBuilder {
    /// Create a new builder with no parts, floppy capacity and the demodisk key
    pub fn new() -> Self {
        Self {
            layout: DiskLayout {
                parts: Vec::new(),
                capacity: FLOPPY_CAPACITY,
                cipher_origin: CIPHER_ORIGIN,
                key: CipherKey::demodisk(),
                slots: Vec::new(),
            },
        }
    }

    /// Append a part
    pub fn part(mut self, spec: PartSpec) -> Self {
        self.layout.parts.push(spec);
        self
    }

    /// Set the medium capacity
    pub fn capacity(mut self, capacity: usize) -> Self {
        self.layout.capacity = capacity;
        self
    }

    /// Set the image offset where the cipher stream starts
    pub fn cipher_origin(mut self, origin: usize) -> Self {
        self.layout.cipher_origin = origin;
        self
    }

    /// Set the key schedule for ciphered parts
    pub fn key(mut self, key: CipherKey) -> Self {
        self.layout.key = key;
        self
    }

    /// Record the length of `part` as u32 LE at `offset` inside `carrier`
    pub fn length_slot(self, part: &str, carrier: &str, offset: usize) -> Self {
        self.slot(part, carrier, offset, SlotValue::Length)
    }

    /// Record the image offset of `part` as u32 LE at `offset` inside `carrier`
    pub fn offset_slot(self, part: &str, carrier: &str, offset: usize) -> Self {
        self.slot(part, carrier, offset, SlotValue::Offset)
    }

    fn slot(mut self, part: &str, carrier: &str, offset: usize, value: SlotValue) -> Self {
        self.layout.slots.push(LengthSlot {
            part: part.to_string(),
            carrier: carrier.to_string(),
            offset,
            value,
        });
        self
    }

    /// Validate and build the layout
    pub fn build(self) -> Result<DiskLayout> {
        self.layout.validate()?;
        Ok(self.layout)
    }
}

impl Default for DiskLayoutBuilder {
    fn default() -> Self {
        Self::new()
    }
}
