/// RD_v1.2 ramdisk filesystem
///
/// Layout:
///
/// ```text
/// 0x00  magic "RD_v1.2\0"
/// 0x08  total size      u32 LE
/// 0x0C  entry count     u16 LE
/// 0x0E  check value     u16 LE (0x0016)
/// 0x10  directory       count x 64 byte records
///       data region     entry payloads, contiguous
/// ```
///
/// Entries live in an owned list addressed by name. Offsets are never kept:
/// every save lays the data out again in list order.
///
/// Only this flat layout is read. The sector-linked variant of `RD_v1.2`,
/// where payloads are chained through sector pointers, is not supported: its
/// records do not tile the data region and such images are refused with
/// `CorruptFormat` rather than misread.

/// Directory entries and attributes
pub mod entry;

pub use entry::{validate_name, Attributes, Entry, EntryInfo};

use crate::error::{DemodiskError, Result};
use crate::format::constants::*;
use std::collections::HashSet;

/// Ramdisk size summary
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RamdiskInfo {
    /// Number of entries
    pub entry_count: usize,
    /// Header plus directory bytes
    pub directory_size: usize,
    /// Sum of all entry sizes
    pub data_size: usize,
    /// Size of the serialized ramdisk
    pub total_size: usize,
}

/// An in-memory ramdisk
#[derive(Debug, Clone, Default)]
pub struct Ramdisk {
    pub(crate) entries: Vec<Entry>,
    /// Has the ramdisk been modified since it was opened or saved?
    pub(crate) changed: bool,
}

impl Ramdisk {
    /// Create an empty ramdisk
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            changed: false,
        }
    }

    /// Parse a serialized ramdisk
    pub fn open(data: &[u8]) -> Result<Self> {
        if data.len() < RAMDISK_HEADER_SIZE {
            return Err(DemodiskError::corrupt(
                data.len(),
                format!("ramdisk shorter than its {} byte header", RAMDISK_HEADER_SIZE),
            ));
        }
        if &data[..RAMDISK_MAGIC.len()] != RAMDISK_MAGIC {
            return Err(DemodiskError::corrupt(0, "not a ramdisk (bad magic)"));
        }

        let checkval = read_u16_le(data, RAMDISK_CHECKVAL_OFFSET);
        if checkval != RAMDISK_CHECKVAL {
            return Err(DemodiskError::corrupt(
                RAMDISK_CHECKVAL_OFFSET,
                format!("check value 0x{:04x}, expected 0x{:04x}", checkval, RAMDISK_CHECKVAL),
            ));
        }

        let total_size = read_u32_le(data, RAMDISK_SIZE_OFFSET) as usize;
        if total_size != data.len() {
            return Err(DemodiskError::corrupt(
                RAMDISK_SIZE_OFFSET,
                format!("header declares {} bytes, buffer holds {}", total_size, data.len()),
            ));
        }

        let count = read_u16_le(data, RAMDISK_COUNT_OFFSET) as usize;
        let directory_end = directory_end(count);
        if directory_end > data.len() {
            return Err(DemodiskError::corrupt(
                RAMDISK_COUNT_OFFSET,
                format!("{} directory records do not fit in {} bytes", count, data.len()),
            ));
        }

        let mut records = Vec::with_capacity(count);
        let mut names = HashSet::with_capacity(count);
        for index in 0..count {
            let position = RAMDISK_HEADER_SIZE + index * DIR_ENTRY_SIZE;
            let record = entry::decode_record(&data[position..position + DIR_ENTRY_SIZE], position)?;

            if !names.insert(record.name.clone()) {
                return Err(DemodiskError::corrupt(
                    position,
                    format!("duplicate entry name '{}'", record.name),
                ));
            }
            let in_region = record.offset >= directory_end
                && record
                    .offset
                    .checked_add(record.size)
                    .map_or(false, |end| end <= data.len());
            if !in_region {
                return Err(DemodiskError::corrupt(
                    position + DIR_OFFSET_OFFSET,
                    format!(
                        "'{}' data {:#x}+{:#x} lies outside the data region",
                        record.name, record.offset, record.size
                    ),
                ));
            }
            records.push(record);
        }

        let data_size: usize = records.iter().map(|r| r.size).sum();
        if directory_end + data_size != data.len() {
            return Err(DemodiskError::corrupt(
                directory_end,
                format!(
                    "entries hold {} bytes but the data region is {} bytes",
                    data_size,
                    data.len() - directory_end
                ),
            ));
        }

        let mut by_offset: Vec<&entry::RawRecord> = records.iter().collect();
        by_offset.sort_by_key(|r| r.offset);
        for pair in by_offset.windows(2) {
            if pair[0].offset + pair[0].size > pair[1].offset {
                return Err(DemodiskError::corrupt(
                    pair[1].offset,
                    format!("'{}' overlaps '{}'", pair[1].name, pair[0].name),
                ));
            }
        }

        let entries = records
            .into_iter()
            .map(|r| Entry {
                data: data[r.offset..r.offset + r.size].to_vec(),
                name: r.name,
                attributes: r.attributes,
            })
            .collect::<Vec<_>>();

        log::debug!("ramdisk: opened {} entries, {} bytes", entries.len(), data.len());
        Ok(Self {
            entries,
            changed: false,
        })
    }

    /// Get all entries in directory order
    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    /// List entry names in directory order
    pub fn list_entries(&self) -> Vec<&str> {
        self.entries.iter().map(|e| e.name()).collect()
    }

    /// Directory listing with the offsets a save would assign
    pub fn entry_infos(&self) -> Vec<EntryInfo> {
        let mut offset = directory_end(self.entries.len());
        self.entries
            .iter()
            .map(|e| {
                let info = EntryInfo {
                    name: e.name.clone(),
                    offset,
                    size: e.size(),
                    attributes: e.attributes,
                };
                offset += e.size();
                info
            })
            .collect()
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Is the ramdisk empty?
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Look up an entry by name
    pub fn entry(&self, name: &str) -> Option<&Entry> {
        self.entries.iter().find(|e| e.name == name)
    }

    fn index_of(&self, name: &str) -> Result<usize> {
        self.entries
            .iter()
            .position(|e| e.name == name)
            .ok_or_else(|| DemodiskError::not_found(name))
    }

    /// Read an entry's contents
    pub fn read_entry(&self, name: &str) -> Result<&[u8]> {
        let index = self.index_of(name)?;
        Ok(&self.entries[index].data)
    }

    /// Append a new entry
    pub fn add_entry<D: Into<Vec<u8>>>(&mut self, name: &str, data: D, attributes: Attributes) -> Result<()> {
        validate_name(name)?;
        if self.entry(name).is_some() {
            return Err(DemodiskError::DuplicateName(name.to_string()));
        }

        self.entries.push(Entry {
            name: name.to_string(),
            attributes,
            data: data.into(),
        });
        self.changed = true;
        Ok(())
    }

    /// Remove an entry, returning it
    pub fn remove_entry(&mut self, name: &str) -> Result<Entry> {
        let index = self.index_of(name)?;
        self.changed = true;
        Ok(self.entries.remove(index))
    }

    /// Rename an entry in place
    pub fn rename_entry(&mut self, old: &str, new: &str) -> Result<()> {
        let index = self.index_of(old)?;
        if old == new {
            return Ok(());
        }
        validate_name(new)?;
        if self.entry(new).is_some() {
            return Err(DemodiskError::DuplicateName(new.to_string()));
        }

        self.entries[index].name = new.to_string();
        self.changed = true;
        Ok(())
    }

    /// Set an entry's attribute word
    pub fn set_attributes(&mut self, name: &str, attributes: Attributes) -> Result<()> {
        let index = self.index_of(name)?;
        if self.entries[index].attributes != attributes {
            self.entries[index].attributes = attributes;
            self.changed = true;
        }
        Ok(())
    }

    /// Directory record an entry would get on save
    pub fn directory_record(&self, name: &str) -> Result<[u8; DIR_ENTRY_SIZE]> {
        let index = self.index_of(name)?;
        let offset = directory_end(self.entries.len())
            + self.entries[..index].iter().map(|e| e.size()).sum::<usize>();
        Ok(entry::encode_record(&self.entries[index], offset))
    }

    /// Size summary
    pub fn info(&self) -> RamdiskInfo {
        let directory_size = directory_end(self.entries.len());
        let data_size = self.entries.iter().map(|e| e.size()).sum();
        RamdiskInfo {
            entry_count: self.entries.len(),
            directory_size,
            data_size,
            total_size: directory_size + data_size,
        }
    }

    /// Serialize without touching the modified flag
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let info = self.info();
        let count = u16::try_from(info.entry_count).map_err(|_| {
            DemodiskError::consistency(format!("{} entries exceed the u16 entry count", info.entry_count))
        })?;
        let total = u32::try_from(info.total_size).map_err(|_| {
            DemodiskError::consistency(format!("{} bytes exceed the u32 size field", info.total_size))
        })?;

        let mut out = Vec::with_capacity(info.total_size);
        out.extend_from_slice(RAMDISK_MAGIC);
        out.extend_from_slice(&total.to_le_bytes());
        out.extend_from_slice(&count.to_le_bytes());
        out.extend_from_slice(&RAMDISK_CHECKVAL.to_le_bytes());

        let mut offset = info.directory_size;
        for entry in &self.entries {
            out.extend_from_slice(&entry::encode_record(entry, offset));
            offset += entry.size();
        }
        for entry in &self.entries {
            out.extend_from_slice(&entry.data);
        }

        debug_assert_eq!(out.len(), info.total_size);
        Ok(out)
    }

    /// Serialize, recomputing the header and every directory record, and mark unchanged
    pub fn save(&mut self) -> Result<Vec<u8>> {
        let bytes = self.to_bytes()?;
        self.changed = false;
        log::debug!("ramdisk: saved {} entries, {} bytes", self.entries.len(), bytes.len());
        Ok(bytes)
    }

    /// Has the ramdisk been modified since it was opened or saved?
    pub fn is_changed(&self) -> bool {
        self.changed
    }
}

/// Offset of the data region for `count` entries
fn directory_end(count: usize) -> usize {
    RAMDISK_HEADER_SIZE + count * DIR_ENTRY_SIZE
}
