/// Ramdisk directory entries and attribute words

use crate::error::{DemodiskError, Result};
use crate::format::constants::*;

/// A ramdisk attribute (mode) word
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Attributes(pub u16);

impl Attributes {
    /// Executable file, rwxrwxr-x
    pub const EXECUTABLE: Attributes = Attributes(0x81FD);
    /// Read/write text file, rw-r--r--
    pub const TEXT: Attributes = Attributes(0x81A4);
    /// Config file or fixed-name executable, rw-rw-r--
    pub const CONFIG: Attributes = Attributes(0x81B4);
    /// Directory, drwxrwxr-x
    pub const DIRECTORY: Attributes = Attributes(0x41FD);

    const KNOWN: [Attributes; 4] = [
        Attributes::EXECUTABLE,
        Attributes::TEXT,
        Attributes::CONFIG,
        Attributes::DIRECTORY,
    ];

    /// Raw attribute word
    pub fn bits(&self) -> u16 {
        self.0
    }

    /// Is this one of the attribute words seen on the demodisk?
    pub fn is_known(&self) -> bool {
        Self::KNOWN.contains(self)
    }

    /// Is the owner execute bit set on a regular file?
    pub fn is_executable(&self) -> bool {
        !self.is_directory() && self.0 & 0o100 != 0
    }

    /// Does the word describe a directory?
    pub fn is_directory(&self) -> bool {
        self.0 & 0xF000 == 0x4000
    }

    /// Render as an `ls -l` mode string, e.g. `-rwxrwxr-x`
    pub fn mode_string(&self) -> String {
        let kind = match self.0 & 0xF000 {
            0x4000 => 'd',
            0x8000 => '-',
            0xA000 => 'l',
            _ => '?',
        };

        let mut mode = String::with_capacity(10);
        mode.push(kind);
        for shift in [6u16, 3, 0] {
            let bits = (self.0 >> shift) & 0o7;
            mode.push(if bits & 0o4 != 0 { 'r' } else { '-' });
            mode.push(if bits & 0o2 != 0 { 'w' } else { '-' });
            mode.push(if bits & 0o1 != 0 { 'x' } else { '-' });
        }
        mode
    }

    /// Parse a flag name or a hex word (`0x81a4`, `81a4`) into a known value
    pub fn parse_known(text: &str) -> Result<Attributes> {
        let attrs = match text.to_ascii_lowercase().as_str() {
            "exe" | "executable" => Attributes::EXECUTABLE,
            "text" | "txt" => Attributes::TEXT,
            "config" | "cfg" => Attributes::CONFIG,
            "dir" | "directory" => Attributes::DIRECTORY,
            other => {
                let hex = other.trim_start_matches("0x");
                let bits = u16::from_str_radix(hex, 16).map_err(|_| {
                    DemodiskError::config(format!("'{}' is not an attribute value", text))
                })?;
                Attributes(bits)
            }
        };

        if !attrs.is_known() {
            return Err(DemodiskError::config(format!(
                "attribute 0x{:04x} is not one of 0x81fd, 0x81a4, 0x81b4, 0x41fd",
                attrs.0
            )));
        }
        Ok(attrs)
    }
}

impl Default for Attributes {
    fn default() -> Self {
        Attributes::EXECUTABLE
    }
}

impl std::fmt::Display for Attributes {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} (0x{:04x})", self.mode_string(), self.0)
    }
}

/// An entry owned by a ramdisk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    pub(crate) name: String,
    pub(crate) attributes: Attributes,
    pub(crate) data: Vec<u8>,
}

impl Entry {
    /// Get the entry name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get the attribute word
    pub fn attributes(&self) -> Attributes {
        self.attributes
    }

    /// Get the entry contents
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Get the entry size in bytes
    pub fn size(&self) -> usize {
        self.data.len()
    }
}

/// Directory listing record, with the offset the entry gets when saved
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryInfo {
    /// Entry name
    pub name: String,
    /// Offset of the data from the start of the ramdisk
    pub offset: usize,
    /// Size of the data
    pub size: usize,
    /// Attribute word
    pub attributes: Attributes,
}

/// Check that a name fits a directory record
pub fn validate_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(DemodiskError::InvalidFilename("name is empty".to_string()));
    }
    if name == "." || name == ".." {
        return Err(DemodiskError::InvalidFilename(format!(
            "'{}' names a directory, not a file",
            name
        )));
    }
    if name.len() > MAX_NAME_LENGTH {
        return Err(DemodiskError::InvalidFilename(format!(
            "'{}' is longer than {} bytes",
            name, MAX_NAME_LENGTH
        )));
    }
    if let Some(bad) = name.bytes().find(|&b| !is_valid_name_byte(b)) {
        return Err(DemodiskError::InvalidFilename(format!(
            "'{}' contains byte 0x{:02x}",
            name.escape_default(),
            bad
        )));
    }
    Ok(())
}

fn is_valid_name_byte(b: u8) -> bool {
    b.is_ascii() && b > 0x1F && b != b'/' && b != 0x7F
}

/// Encode a directory record
pub(crate) fn encode_record(entry: &Entry, offset: usize) -> [u8; DIR_ENTRY_SIZE] {
    let mut record = [0u8; DIR_ENTRY_SIZE];
    record[..entry.name.len()].copy_from_slice(entry.name.as_bytes());
    record[DIR_OFFSET_OFFSET..DIR_OFFSET_OFFSET + 4].copy_from_slice(&(offset as u32).to_le_bytes());
    record[DIR_SIZE_OFFSET..DIR_SIZE_OFFSET + 4]
        .copy_from_slice(&(entry.data.len() as u32).to_le_bytes());
    record[DIR_ATTRIBUTES_OFFSET..DIR_ATTRIBUTES_OFFSET + 2]
        .copy_from_slice(&entry.attributes.0.to_le_bytes());
    record
}

/// A decoded directory record, before its data is attached
#[derive(Debug, Clone)]
pub(crate) struct RawRecord {
    pub name: String,
    pub offset: usize,
    pub size: usize,
    pub attributes: Attributes,
}

/// Decode the 64-byte directory record found at `position`
pub(crate) fn decode_record(record: &[u8], position: usize) -> Result<RawRecord> {
    let name_field = &record[..DIR_NAME_FIELD];
    let name_len = name_field
        .iter()
        .position(|&b| b == 0)
        .ok_or_else(|| DemodiskError::corrupt(position, "name field is not NUL terminated"))?;

    let name = std::str::from_utf8(&name_field[..name_len])
        .map_err(|_| DemodiskError::corrupt(position, "name is not ASCII"))?
        .to_string();
    validate_name(&name).map_err(|e| DemodiskError::corrupt(position, e.to_string()))?;

    Ok(RawRecord {
        name,
        offset: read_u32_le(record, DIR_OFFSET_OFFSET) as usize,
        size: read_u32_le(record, DIR_SIZE_OFFSET) as usize,
        attributes: Attributes(read_u16_le(record, DIR_ATTRIBUTES_OFFSET)),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_strings() {
        assert_eq!(Attributes::EXECUTABLE.mode_string(), "-rwxrwxr-x");
        assert_eq!(Attributes::TEXT.mode_string(), "-rw-r--r--");
        assert_eq!(Attributes::CONFIG.mode_string(), "-rw-rw-r--");
        assert_eq!(Attributes::DIRECTORY.mode_string(), "drwxrwxr-x");
    }

    #[test]
    fn test_executable_flag() {
        assert!(Attributes::EXECUTABLE.is_executable());
        assert!(!Attributes::TEXT.is_executable());
        assert!(!Attributes::DIRECTORY.is_executable());
        assert!(Attributes::DIRECTORY.is_directory());
    }

    #[test]
    fn test_parse_known() {
        assert_eq!(Attributes::parse_known("0x81a4").unwrap(), Attributes::TEXT);
        assert_eq!(Attributes::parse_known("81B4").unwrap(), Attributes::CONFIG);
        assert_eq!(Attributes::parse_known("exe").unwrap(), Attributes::EXECUTABLE);
        assert!(matches!(
            Attributes::parse_known("0x1234"),
            Err(DemodiskError::Config(_))
        ));
        assert!(matches!(
            Attributes::parse_known("zz"),
            Err(DemodiskError::Config(_))
        ));
    }

    #[test]
    fn test_validate_name() {
        assert!(validate_name("pwm.menu").is_ok());
        assert!(validate_name(&"a".repeat(47)).is_ok());
        assert!(validate_name("").is_err());
        assert!(validate_name(&"a".repeat(48)).is_err());
        assert!(validate_name("bin/ksh").is_err());
        assert!(validate_name("tab\there").is_err());
        assert!(validate_name("del\x7f").is_err());
        assert!(validate_name("caf\u{e9}").is_err());
        assert!(matches!(validate_name("."), Err(DemodiskError::InvalidFilename(_))));
        assert!(matches!(validate_name(".."), Err(DemodiskError::InvalidFilename(_))));
        assert!(validate_name("...").is_ok());
        assert!(validate_name(".profile").is_ok());
    }

    #[test]
    fn test_record_roundtrip() {
        let entry = Entry {
            name: "ksh".to_string(),
            attributes: Attributes::CONFIG,
            data: vec![1; 500],
        };
        let record = encode_record(&entry, 0x90);
        assert_eq!(&record[..4], b"ksh\0");
        assert!(record[58..].iter().all(|&b| b == 0));

        let raw = decode_record(&record, 16).unwrap();
        assert_eq!(raw.name, "ksh");
        assert_eq!(raw.offset, 0x90);
        assert_eq!(raw.size, 500);
        assert_eq!(raw.attributes, Attributes::CONFIG);
    }

    #[test]
    fn test_unterminated_name_is_corrupt() {
        let record = [b'a'; DIR_ENTRY_SIZE];
        assert!(matches!(
            decode_record(&record, 16),
            Err(DemodiskError::CorruptFormat { offset: 16, .. })
        ));
    }
}
