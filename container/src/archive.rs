//! Minimal ZIP structure parsing.
//!
//! Report containers are ordinary ZIP archives. This module locates the
//! end-of-central-directory record by backward scan (tolerating a trailing
//! comment), walks the central directory, and reads member data through each
//! member's local file header. Only the two compression methods the
//! producing application emits are handled: stored (0) and DEFLATE (8).
//! Central-directory sizes are authoritative; local-header sizes may be zero
//! when the writer streamed with data descriptors.

use std::io::Read;
use std::io::Write;

use flate2::Compression;
use flate2::read::DeflateDecoder;
use flate2::write::DeflateEncoder;

use crate::error::{ContainerError, Result};

const EOCD_SIGNATURE: u32 = 0x0605_4b50;
const CENTRAL_SIGNATURE: u32 = 0x0201_4b50;
const LOCAL_SIGNATURE: u32 = 0x0403_4b50;

/// Fixed size of the end-of-central-directory record, sans comment.
const EOCD_MIN: usize = 22;
/// Fixed size of a central directory file header, sans variable fields.
const CENTRAL_MIN: usize = 46;
/// Fixed size of a local file header, sans variable fields.
const LOCAL_MIN: usize = 30;

const STORED: u16 = 0;
const DEFLATED: u16 = 8;

/// One member as described by the central directory.
#[derive(Debug, Clone)]
pub(crate) struct ZipEntry {
    pub name: String,
    pub method: u16,
    pub compressed_size: u64,
    pub uncompressed_size: u64,
    pub header_offset: u64,
}

fn read_u16(data: &[u8], offset: usize) -> Option<u16> {
    let bytes = data.get(offset..offset + 2)?;
    Some(u16::from_le_bytes([bytes[0], bytes[1]]))
}

fn read_u32(data: &[u8], offset: usize) -> Option<u32> {
    let bytes = data.get(offset..offset + 4)?;
    Some(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
}

/// Locates the end-of-central-directory record.
///
/// Scans backward from the end of the buffer; the record may be followed by
/// an archive comment of up to 65535 bytes.
pub(crate) fn locate_eocd(data: &[u8]) -> Option<usize> {
    if data.len() < EOCD_MIN {
        return None;
    }
    let floor = data
        .len()
        .saturating_sub(EOCD_MIN + usize::from(u16::MAX));
    let mut offset = data.len() - EOCD_MIN;
    loop {
        if read_u32(data, offset) == Some(EOCD_SIGNATURE) {
            if let Some(comment_len) = read_u16(data, offset + 20) {
                if offset + EOCD_MIN + usize::from(comment_len) <= data.len() {
                    return Some(offset);
                }
            }
        }
        if offset == floor {
            return None;
        }
        offset -= 1;
    }
}

/// Walks the central directory starting from a located EOCD record.
pub(crate) fn parse_entries(data: &[u8], eocd: usize) -> Result<Vec<ZipEntry>> {
    let truncated = |context| ContainerError::Truncated { context };

    let total = read_u16(data, eocd + 10).ok_or_else(|| truncated("end-of-central-directory"))?;
    let cd_offset = read_u32(data, eocd + 16).ok_or_else(|| truncated("end-of-central-directory"))?;
    if total == u16::MAX || cd_offset == u32::MAX {
        return Err(ContainerError::Zip64Unsupported);
    }

    let mut entries = Vec::with_capacity(usize::from(total));
    let mut offset = cd_offset as usize;
    for _ in 0..total {
        if read_u32(data, offset) != Some(CENTRAL_SIGNATURE) {
            return Err(truncated("central directory header"));
        }
        let method = read_u16(data, offset + 10).ok_or_else(|| truncated("central directory header"))?;
        let compressed_size = read_u32(data, offset + 20)
            .ok_or_else(|| truncated("central directory header"))?;
        let uncompressed_size = read_u32(data, offset + 24)
            .ok_or_else(|| truncated("central directory header"))?;
        let name_len = read_u16(data, offset + 28)
            .ok_or_else(|| truncated("central directory header"))?;
        let extra_len = read_u16(data, offset + 30)
            .ok_or_else(|| truncated("central directory header"))?;
        let comment_len = read_u16(data, offset + 32)
            .ok_or_else(|| truncated("central directory header"))?;
        let header_offset = read_u32(data, offset + 42)
            .ok_or_else(|| truncated("central directory header"))?;

        let name_start = offset + CENTRAL_MIN;
        let name_end = name_start + usize::from(name_len);
        let name_bytes = data
            .get(name_start..name_end)
            .ok_or_else(|| truncated("central directory entry name"))?;
        entries.push(ZipEntry {
            name: String::from_utf8_lossy(name_bytes).into_owned(),
            method,
            compressed_size: u64::from(compressed_size),
            uncompressed_size: u64::from(uncompressed_size),
            header_offset: u64::from(header_offset),
        });

        offset = name_end + usize::from(extra_len) + usize::from(comment_len);
    }

    Ok(entries)
}

/// Reads and decompresses one member's bytes through its local file header.
pub(crate) fn read_entry(data: &[u8], entry: &ZipEntry) -> Result<Vec<u8>> {
    let truncated = |context| ContainerError::Truncated { context };

    let offset = entry.header_offset as usize;
    if read_u32(data, offset) != Some(LOCAL_SIGNATURE) {
        return Err(truncated("local file header"));
    }
    let name_len = read_u16(data, offset + 26).ok_or_else(|| truncated("local file header"))?;
    let extra_len = read_u16(data, offset + 28).ok_or_else(|| truncated("local file header"))?;

    let data_start = offset + LOCAL_MIN + usize::from(name_len) + usize::from(extra_len);
    let data_end = data_start + entry.compressed_size as usize;
    let raw = data
        .get(data_start..data_end)
        .ok_or_else(|| truncated("member data"))?;

    match entry.method {
        STORED => Ok(raw.to_vec()),
        DEFLATED => {
            let mut out = Vec::with_capacity(entry.uncompressed_size as usize);
            let mut decoder = DeflateDecoder::new(raw);
            decoder
                .read_to_end(&mut out)
                .map_err(|err| ContainerError::Inflate {
                    member: entry.name.clone(),
                    detail: err.to_string(),
                })?;
            Ok(out)
        }
        method => Err(ContainerError::UnsupportedCompression {
            member: entry.name.clone(),
            method,
        }),
    }
}

/// Writes minimal, well-formed containers.
///
/// Supports stored and DEFLATE members with correct CRCs, enough to
/// synthesize report containers in tests and round-trip through
/// [`ContainerReader`](crate::ContainerReader).
///
/// # Examples
///
/// ```
/// use pbix_extract_container::{ArchiveBuilder, ContainerReader};
///
/// let bytes = ArchiveBuilder::new()
///     .stored("Report/Layout", b"{}")
///     .finish();
/// let reader = ContainerReader::from_bytes(bytes).unwrap();
/// assert_eq!(reader.read_member("Report/Layout").unwrap(), b"{}");
/// ```
#[derive(Debug, Default)]
pub struct ArchiveBuilder {
    data: Vec<u8>,
    directory: Vec<DirectoryRecord>,
}

#[derive(Debug)]
struct DirectoryRecord {
    name: String,
    method: u16,
    crc: u32,
    compressed_size: u32,
    uncompressed_size: u32,
    header_offset: u32,
}

impl ArchiveBuilder {
    /// Creates an empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a member without compression.
    pub fn stored(self, name: &str, bytes: &[u8]) -> Self {
        self.append(name, STORED, bytes.to_vec(), bytes)
    }

    /// Appends a DEFLATE-compressed member.
    pub fn deflated(self, name: &str, bytes: &[u8]) -> Self {
        let mut encoder = DeflateEncoder::new(Vec::new(), Compression::default());
        // Writing to a Vec cannot fail.
        let compressed = encoder
            .write_all(bytes)
            .and_then(|_| encoder.finish())
            .unwrap_or_default();
        self.append(name, DEFLATED, compressed, bytes)
    }

    fn append(mut self, name: &str, method: u16, compressed: Vec<u8>, original: &[u8]) -> Self {
        let mut crc = flate2::Crc::new();
        crc.update(original);

        let header_offset = self.data.len() as u32;
        self.push_u32(LOCAL_SIGNATURE);
        self.push_u16(20); // version needed
        self.push_u16(0); // flags
        self.push_u16(method);
        self.push_u16(0); // mod time
        self.push_u16(0); // mod date
        self.push_u32(crc.sum());
        self.push_u32(compressed.len() as u32);
        self.push_u32(original.len() as u32);
        self.push_u16(name.len() as u16);
        self.push_u16(0); // extra length
        self.data.extend_from_slice(name.as_bytes());
        self.data.extend_from_slice(&compressed);

        self.directory.push(DirectoryRecord {
            name: name.to_string(),
            method,
            crc: crc.sum(),
            compressed_size: compressed.len() as u32,
            uncompressed_size: original.len() as u32,
            header_offset,
        });
        self
    }

    /// Writes the central directory and end record, returning the archive.
    pub fn finish(mut self) -> Vec<u8> {
        let cd_offset = self.data.len() as u32;
        let records = std::mem::take(&mut self.directory);
        for record in &records {
            self.push_u32(CENTRAL_SIGNATURE);
            self.push_u16(20); // version made by
            self.push_u16(20); // version needed
            self.push_u16(0); // flags
            self.push_u16(record.method);
            self.push_u16(0); // mod time
            self.push_u16(0); // mod date
            self.push_u32(record.crc);
            self.push_u32(record.compressed_size);
            self.push_u32(record.uncompressed_size);
            self.push_u16(record.name.len() as u16);
            self.push_u16(0); // extra length
            self.push_u16(0); // comment length
            self.push_u16(0); // disk number
            self.push_u16(0); // internal attributes
            self.push_u32(0); // external attributes
            self.push_u32(record.header_offset);
            self.data.extend_from_slice(record.name.as_bytes());
        }
        let cd_size = self.data.len() as u32 - cd_offset;

        self.push_u32(EOCD_SIGNATURE);
        self.push_u16(0); // disk number
        self.push_u16(0); // central directory disk
        self.push_u16(records.len() as u16);
        self.push_u16(records.len() as u16);
        self.push_u32(cd_size);
        self.push_u32(cd_offset);
        self.push_u16(0); // comment length

        self.data
    }

    fn push_u16(&mut self, value: u16) {
        self.data.extend_from_slice(&value.to_le_bytes());
    }

    fn push_u32(&mut self, value: u32) {
        self.data.extend_from_slice(&value.to_le_bytes());
    }
}
