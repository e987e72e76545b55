/// Demodisk magic bytes, offsets and sizes

/// XOR key: " Dan Hildebrand creator of demodisk " with every character shifted by -1
pub const DEMODISK_XOR_KEY: [u8; 36] = [
    31, 67, 96, 109, 31, 71, 104, 107, 99, 100, 97, 113, 96, 109, 99, 31, 98, 113, 100, 96, 115,
    110, 113, 31, 110, 101, 31, 99, 100, 108, 110, 99, 104, 114, 106, 31,
];

/// The key schedule restarts at every segment boundary
pub const CIPHER_SEGMENT_SIZE: usize = 512;

/// QZip stream signature
pub const QZIP_MAGIC: &[u8; 3] = b"QZh";

/// Signature of a plain bzip2 stream, which QZip rewrites to `QZIP_MAGIC`
pub const BZIP2_MAGIC: &[u8; 3] = b"BZh";

/// Offset of the bzip2 block size digit ('1'..'9')
pub const QZIP_LEVEL_OFFSET: usize = 3;

/// Size of the QZip stream header (magic, level digit, u32 BE length)
pub const QZIP_HEADER_SIZE: usize = 8;

/// Offset of the declared decompressed length in the QZip header
pub const QZIP_LENGTH_OFFSET: usize = 4;

/// bzip2 block magic, the first bytes of a non-empty body
pub const QZIP_BLOCK_MAGIC: &[u8; 6] = &[0x31, 0x41, 0x59, 0x26, 0x53, 0x59];

/// bzip2 end of stream magic, the whole body of an empty stream
pub const QZIP_END_MAGIC: &[u8; 6] = &[0x17, 0x72, 0x45, 0x38, 0x50, 0x90];

/// Ramdisk signature
pub const RAMDISK_MAGIC: &[u8; 8] = b"RD_v1.2\0";

/// Size of the ramdisk header
pub const RAMDISK_HEADER_SIZE: usize = 16;

/// Offset of the total size in the ramdisk header
pub const RAMDISK_SIZE_OFFSET: usize = 8;

/// Offset of the entry count in the ramdisk header
pub const RAMDISK_COUNT_OFFSET: usize = 12;

/// Offset of the check value in the ramdisk header
pub const RAMDISK_CHECKVAL_OFFSET: usize = 14;

/// Fixed check value stored in every ramdisk header
pub const RAMDISK_CHECKVAL: u16 = 0x0016;

/// Size of one directory record
pub const DIR_ENTRY_SIZE: usize = 64;

/// Size of the NUL padded name field in a directory record
pub const DIR_NAME_FIELD: usize = 48;

/// Longest storable name (the field keeps a terminating NUL)
pub const MAX_NAME_LENGTH: usize = DIR_NAME_FIELD - 1;

/// Offset of the data offset in a directory record
pub const DIR_OFFSET_OFFSET: usize = 48;

/// Offset of the data size in a directory record
pub const DIR_SIZE_OFFSET: usize = 52;

/// Offset of the attribute word in a directory record
pub const DIR_ATTRIBUTES_OFFSET: usize = 56;

/// Length of the boot stage 1 and 2 region at the start of the image
pub const BOOT_REGION_SIZE: usize = 0xC00;

/// Length of the ciphered loader region preceding the boot ramdisk
pub const LOADER_REGION_SIZE: usize = 0x2E000;

/// Offset of the compressed stage 3 loader inside the loader region
pub const STAGE3_OFFSET: usize = 0x80;

/// Image offset where the ciphered stream begins
pub const CIPHER_ORIGIN: usize = BOOT_REGION_SIZE;

/// Capacity of a 1.44 MB floppy
pub const FLOPPY_CAPACITY: usize = 1_474_560;

/// Working directory file names
pub const BOOT_FILENAME: &str = "boot_stage_1_and_2.bin";
/// Ciphered loader region file name
pub const LOADER_FILENAME: &str = "loader.bin";
/// Decoded third stage loader (informational only)
pub const STAGE3_FILENAME: &str = "boot_stage_3.bin";
/// Boot ramdisk file name
pub const RAMDISK_FILENAME: &str = "boot_fs.ramdisk";
/// Default repacked image name
pub const REPACK_FILENAME: &str = "qnxdemo_repack.dat";

/// Size of a directory record in the XIP image
pub const XIP_ENTRY_SIZE: usize = 0x40;

/// Read a little-endian u16 at `offset`
#[inline]
pub fn read_u16_le(data: &[u8], offset: usize) -> u16 {
    u16::from_le_bytes([data[offset], data[offset + 1]])
}

/// Read a little-endian u32 at `offset`
#[inline]
pub fn read_u32_le(data: &[u8], offset: usize) -> u32 {
    u32::from_le_bytes([
        data[offset],
        data[offset + 1],
        data[offset + 2],
        data[offset + 3],
    ])
}
