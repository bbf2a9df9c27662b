// Copyright 2025 ReductSoftware UG
// Licensed under the Business Source License 1.1

use arcache_base::error::CacheError;
use arcache_base::{corrupt_entry, invalid_key, io_failure};
use bytes::Bytes;
use std::fs::File;
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::Path;

/// Extension of every cache file, the stem is the rank.
pub const CACHE_FILE_EXT: &str = ".arcache";

/// Highest rank a cache file can carry, ranks are signed 64-bit milliseconds on disk.
pub const MAX_RANK: u64 = i64::MAX as u64;

const HEADER_END: u8 = b'\n';

/// A cached key/payload pair as it is known to the index.
///
/// The payload itself stays on disk in `<rank>.arcache`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CacheEntry {
    key: String,
    rank: u64,
    header_len: u64,
    file_len: u64,
}

impl CacheEntry {
    pub fn new(key: String, rank: u64, header_len: u64, file_len: u64) -> Self {
        CacheEntry {
            key,
            rank,
            header_len,
            file_len,
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Last access rank, also the file name.
    pub fn rank(&self) -> u64 {
        self.rank
    }

    /// Bytes of the key line including the line break.
    pub fn header_len(&self) -> u64 {
        self.header_len
    }

    /// Size of the backing file (header + payload).
    pub fn file_len(&self) -> u64 {
        self.file_len
    }

    pub fn file_name(&self) -> String {
        file_name(self.rank)
    }

    pub(super) fn set_rank(&mut self, rank: u64) {
        self.rank = rank;
    }
}

pub fn file_name(rank: u64) -> String {
    format!("{}{}", rank, CACHE_FILE_EXT)
}

/// Parses the rank from a cache file name, `None` for foreign files.
///
/// Only canonical names up to `MAX_RANK` count, so `007.arcache` or `+7.arcache` are foreign.
pub fn parse_rank(name: &str) -> Option<u64> {
    let stem = name.strip_suffix(CACHE_FILE_EXT)?;
    if stem.is_empty() || !stem.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }

    stem.parse::<u64>()
        .ok()
        .filter(|rank| *rank <= MAX_RANK && rank.to_string() == stem)
}

/// Writes the key line and the payload.
///
/// # Returns
///
/// The length of the header in bytes, the line break included.
pub fn encode<W: Write>(writer: &mut W, key: &str, payload: &[u8]) -> Result<u64, CacheError> {
    if key.as_bytes().contains(&HEADER_END) {
        return Err(invalid_key!("Key {:?} contains a line break", key));
    }

    writer.write_all(key.as_bytes())?;
    writer.write_all(&[HEADER_END])?;
    writer.write_all(payload)?;
    Ok(key.len() as u64 + 1)
}

/// Reads the key line byte by byte.
///
/// # Returns
///
/// The key and the header length in bytes, the line break included.
///
/// # Errors
///
/// * `CorruptEntry` - If the stream ends before the line break or the key is not UTF-8.
pub fn decode_header<R: Read>(reader: &mut R) -> Result<(String, u64), CacheError> {
    let mut key = Vec::new();
    let mut byte = [0u8; 1];
    loop {
        match reader.read(&mut byte) {
            Ok(0) => {
                return Err(corrupt_entry!(
                    "No header found in {} bytes",
                    key.len()
                ))
            }
            Ok(_) if byte[0] == HEADER_END => break,
            Ok(_) => key.push(byte[0]),
            Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
            Err(err) => return Err(corrupt_entry!("Failed to read header: {}", err)),
        }
    }

    let header_len = key.len() as u64 + 1;
    let key = String::from_utf8(key).map_err(|_| corrupt_entry!("Header is not UTF-8"))?;
    Ok((key, header_len))
}

/// Skips the header and reads the rest of the stream.
///
/// # Errors
///
/// * `CorruptEntry` - If the stream is shorter than the header.
/// * `IoFailure` - If the payload can't be read.
pub fn decode_payload<R: Read>(reader: &mut R, header_len: u64) -> Result<Bytes, CacheError> {
    let skipped = io::copy(&mut reader.by_ref().take(header_len), &mut io::sink())?;
    if skipped != header_len {
        return Err(corrupt_entry!(
            "Expected a header of {} bytes, found only {}",
            header_len,
            skipped
        ));
    }

    let mut payload = Vec::new();
    reader.read_to_end(&mut payload)?;
    Ok(Bytes::from(payload))
}

/// Reads the key of a cache file.
///
/// A file which can't be opened counts as corrupt.
pub fn read_header(path: &Path) -> Result<(String, u64), CacheError> {
    let file =
        File::open(path).map_err(|err| corrupt_entry!("Failed to open {:?}: {}", path, err))?;
    decode_header(&mut BufReader::new(file))
}

/// Reads the payload of a cache file.
pub fn read_payload(path: &Path, header_len: u64) -> Result<Bytes, CacheError> {
    let file = File::open(path)?;
    decode_payload(&mut BufReader::new(file), header_len)
}

/// Creates a cache file for the key and payload.
///
/// # Returns
///
/// The header length and the file length.
pub fn write_file(path: &Path, key: &str, payload: &[u8]) -> Result<(u64, u64), CacheError> {
    let file =
        File::create(path).map_err(|err| io_failure!("Failed to create {:?}: {}", path, err))?;
    let mut writer = BufWriter::new(file);
    let header_len = encode(&mut writer, key, payload)?;
    writer.flush()?;
    Ok((header_len, header_len + payload.len() as u64))
}
