/// File I/O for images, ramdisks and working directories

/// Readers for images and ramdisk files
pub mod reader;
/// Working directory mapping of image parts
pub mod workdir;
/// Atomic writers
pub mod writer;

pub use reader::{read_file, read_image, read_ramdisk};
pub use workdir::{pack_from_dir, unpack_to_dir};
pub use writer::{write_atomic, write_ramdisk};
