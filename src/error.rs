use thiserror::Error;

/// Result type alias for demodisk operations
pub type Result<T> = std::result::Result<T, DemodiskError>;

/// Errors that can occur when working with demodisk images and their contents
#[derive(Debug, Error)]
pub enum DemodiskError {
    /// I/O error occurred while reading or writing
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid configuration (empty cipher key, bad tool options, ...)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Bad magic, truncated data or an undecodable stream
    #[error("Corrupt format at offset {offset}: {message}")]
    CorruptFormat {
        /// Byte offset where the problem was detected
        offset: usize,
        /// Error message
        message: String,
    },

    /// Entry not found in a ramdisk, part table or catalog
    #[error("Not found: {0}")]
    NotFound(String),

    /// An entry with this name already exists
    #[error("Duplicate name: {0}")]
    DuplicateName(String),

    /// Name cannot be stored in a ramdisk directory record
    #[error("Invalid filename: {0}")]
    InvalidFilename(String),

    /// Byte range lies outside the buffer it addresses
    #[error("Range {offset:#x}+{length:#x} is outside buffer of {buffer_len:#x} bytes")]
    OutOfRange {
        /// Start of the range
        offset: usize,
        /// Length of the range
        length: usize,
        /// Length of the buffer
        buffer_len: usize,
    },

    /// Pack-time layout or capacity violation
    #[error("Consistency error: {0}")]
    Consistency(String),

    /// A replayed script command failed
    #[error("Script line {line}: {message}")]
    Script {
        /// 1-based line number in the script
        line: usize,
        /// Error message
        message: String,
    },
}

impl DemodiskError {
    /// Create a corrupt format error with context
    pub fn corrupt<S: Into<String>>(offset: usize, message: S) -> Self {
        DemodiskError::CorruptFormat {
            offset,
            message: message.into(),
        }
    }

    /// Create a configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        DemodiskError::Config(message.into())
    }

    /// Create a consistency error
    pub fn consistency<S: Into<String>>(message: S) -> Self {
        DemodiskError::Consistency(message.into())
    }

    /// Create a not found error
    pub fn not_found<S: Into<String>>(name: S) -> Self {
        DemodiskError::NotFound(name.into())
    }
}
