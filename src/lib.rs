/*!
# demodisk

A Rust library for taking apart and rebuilding the QNX 1.44 MB demo floppy.

## Features

- Split a demodisk image into its boot, loader and ramdisk parts, and join them back
- Keyed XOR cipher and the QZip compressed stream used by `.z` and `.qnxde` files
- Read and edit the `RD_v1.2` ramdisk filesystem (add, remove, rename, set attributes)
- Blank programs out of the execute-in-place (`xip`) image
- Scriptable command session behind the `rdsh` shell

## Quick Start

```rust,no_run
use demodisk::{DiskImage, DiskLayout, Ramdisk, Attributes};

// Split an image
let raw = std::fs::read("qnxdemo.dat")?;
let image = DiskImage::unpack(&raw, DiskLayout::demodisk())?;

// Edit the ramdisk
let mut ramdisk = Ramdisk::open(image.part("ramdisk")?.data())?;
ramdisk.remove_entry("ksh")?;
ramdisk.add_entry("hello", b"#!/bin/sh\necho hi\n".to_vec(), Attributes::EXECUTABLE)?;

// Put it back
let mut image = image;
image.replace_part("ramdisk", ramdisk.to_bytes()?)?;
std::fs::write("qnxdemo_repack.dat", image.pack()?)?;
# Ok::<(), demodisk::DemodiskError>(())
```

## Modules

- `format`: file kinds and format constants
- `cipher`: keyed XOR transform
- `codec`: QZip compression and the loader's pair-table decoder
- `image`: disk layout and the split/join of images
- `ramdisk`: the `RD_v1.2` filesystem
- `xip`: patching of the execute-in-place image
- `shell`: ramdisk command session
- `io`: file reading and atomic writes
- `error`: Error types and Result alias
*/

#![warn(missing_docs)]

/// Keyed XOR cipher
pub mod cipher;
/// Tool options and entry points for the binaries
pub mod cli;
/// QZip compression and pair-table expansion
pub mod codec;
/// Error types and Result alias
pub mod error;
/// File kinds and format constants
pub mod format;
/// Disk layout, split and join
pub mod image;
/// I/O operations for images, ramdisks and working directories
pub mod io;
/// Image map visualization
pub mod map;
/// RD_v1.2 ramdisk filesystem
pub mod ramdisk;
/// Ramdisk command session
pub mod shell;
/// Execute-in-place image patching
pub mod xip;

// Re-export common types
pub use cipher::CipherKey;
pub use error::{DemodiskError, Result};
pub use format::{detect_kind, FileKind};
pub use image::{
    decode_stage3, DiskImage, DiskLayout, DiskLayoutBuilder, Extent, Part, PartSpec,
};
pub use ramdisk::{Attributes, Entry, EntryInfo, Ramdisk, RamdiskInfo};
pub use shell::{Command, Flow, Session};
pub use xip::{PatchAction, PatchDescriptor, XipProgram};
