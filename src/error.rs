use std::io;

use thiserror::Error;

/// Decode failures for BSP and WAD buffers. Every variant is fatal to the
/// call that produced it; no partial document is ever returned.
#[derive(Debug, Error)]
pub enum MapError {
    #[error("unsupported BSP version {0}, expected v30 (GoldSrc)")]
    UnsupportedVersion(i32),

    #[error("invalid WAD magic 0x{0:08X}, expected \"WAD3\"")]
    InvalidMagic(u32),

    #[error("{lump} lump out of bounds (offset {offset}, length {length}, buffer size {size})")]
    CorruptLump {
        lump: &'static str,
        offset: i64,
        length: i64,
        size: usize,
    },

    #[error("truncated data while reading {lump} lump")]
    Truncated {
        lump: &'static str,
        #[source]
        source: io::Error,
    },
}
