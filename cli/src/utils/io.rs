use std::io::{self, Read, Write};
use std::path::Path;

use flate2::{read::GzDecoder, write::GzEncoder, Compression};

/// Upper bound on the decompressed size of a roll file, so a small gzip
/// payload cannot expand into an arbitrary amount of memory.
pub const DEFAULT_MAX_ROLL_BYTES: usize = 64 * 1024 * 1024; // 64 MiB

/// Limit in bytes, overridable in MiB through `BALLOT_MAX_ROLL_MB`.
pub fn max_roll_bytes() -> usize {
    std::env::var("BALLOT_MAX_ROLL_MB")
        .ok()
        .and_then(|mb| mb.parse::<usize>().ok())
        .map(|mb| mb.saturating_mul(1024 * 1024))
        .unwrap_or(DEFAULT_MAX_ROLL_BYTES)
}

pub fn read_all_with_limit<R: Read>(reader: R, max_size: usize) -> io::Result<Vec<u8>> {
    let mut out = Vec::new();
    // One extra byte tells "exactly at the limit" apart from "over it"
    reader
        .take((max_size as u64).saturating_add(1))
        .read_to_end(&mut out)?;
    if out.len() > max_size {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            format!("payload exceeds {} bytes", max_size),
        ));
    }
    Ok(out)
}

pub fn decompress_gzip_with_limit<R: Read>(reader: R, max_size: usize) -> io::Result<Vec<u8>> {
    read_all_with_limit(GzDecoder::new(reader), max_size)
}

pub fn compress_gzip(data: &[u8]) -> io::Result<Vec<u8>> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data)?;
    encoder.finish()
}

/// Files ending in `.gz` are treated as gzip-compressed.
pub fn is_gzip_path(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext.eq_ignore_ascii_case("gz"))
}
