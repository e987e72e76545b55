/// Tool options and entry points shared by the binaries
///
/// Every tool builds one options value from its arguments and validates it
/// before touching the filesystem.

/// Compress/decompress tool
pub mod qzip;
/// Interactive ramdisk shell options
pub mod shell;
/// Image split/join tool
pub mod split;
/// XIP program removal tool
pub mod xip;

pub use qzip::*;
pub use shell::*;
pub use split::*;
pub use xip::*;

/// Initialise logging for a binary: warnings by default, `RUST_LOG` overrides
pub fn init_logging() {
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"))
        .format_timestamp(None)
        .try_init();
}
