//! Envelope: read/write the `zkPF` PNG ancillary chunk and compute the
//! carrier-binding hash. Chunk-stream walking is a cursor-based
//! length/type/data/CRC loop, inserting the chunk immediately before
//! `IEND`. The fixed header is parsed with `binrw`.

use std::io::Cursor;

use binrw::{BinRead, BinWrite};
use sha2::{Digest, Sha256};

use crate::chaos::Position;
use crate::error::ZkStegError;
use crate::raster::Raster;

const PNG_SIGNATURE: [u8; 8] = [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];
const CHUNK_TYPE: &[u8; 4] = b"zkPF";
const ENVELOPE_VERSION: u8 = 1;

/// The fixed envelope header: 4-byte tag, 1-byte version, 2×u16 anchor, u32
/// payload_bits, 32-byte carrier hash, u32 metadata length. The
/// variable-length metadata blob follows and is handled outside this type.
#[derive(Debug, BinRead, BinWrite)]
#[brw(big, magic = b"ZKSG")]
struct FixedHeader {
    #[brw(assert(version == ENVELOPE_VERSION))]
    version: u8,
    anchor_x: u16,
    anchor_y: u16,
    payload_bits: u32,
    carrier_sha: [u8; 32],
    meta_len: u32,
}

/// The parsed contents of a `zkPF` chunk: everything a recipient needs to
/// re-derive the position sequence and validate the carrier, plus the
/// opaque public metadata blob.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvelopeDescriptor {
    pub anchor: (u16, u16),
    pub payload_bits: u32,
    pub carrier_sha: [u8; 32],
    pub metadata: Vec<u8>,
}

impl EnvelopeDescriptor {
    fn to_chunk_data(&self) -> Vec<u8> {
        let header = FixedHeader {
            version: ENVELOPE_VERSION,
            anchor_x: self.anchor.0,
            anchor_y: self.anchor.1,
            payload_bits: self.payload_bits,
            carrier_sha: self.carrier_sha,
            meta_len: self.metadata.len() as u32,
        };

        let mut buffer = Cursor::new(Vec::new());
        header
            .write(&mut buffer)
            .expect("fixed-size header write cannot fail");
        let mut data = buffer.into_inner();
        data.extend_from_slice(&self.metadata);
        data
    }

    fn from_chunk_data(data: &[u8]) -> Result<Self, ZkStegError> {
        let mut cursor = Cursor::new(data);
        let header = FixedHeader::read(&mut cursor).map_err(|err| match err {
            binrw::Error::BadMagic { .. } | binrw::Error::AssertFail { .. } => {
                ZkStegError::UnknownEnvelope
            }
            _ => ZkStegError::MalformedPng("truncated envelope header".to_string()),
        })?;

        let header_len = cursor.position() as usize;
        let meta_len = header.meta_len as usize;
        if data.len() != header_len + meta_len {
            return Err(ZkStegError::MalformedPng(
                "envelope metadata length mismatch".to_string(),
            ));
        }

        Ok(EnvelopeDescriptor {
            anchor: (header.anchor_x, header.anchor_y),
            payload_bits: header.payload_bits,
            carrier_sha: header.carrier_sha,
            metadata: data[header_len..].to_vec(),
        })
    }
}

struct ChunkRef {
    start: usize,
    kind: [u8; 4],
    data_start: usize,
    data_len: usize,
    end: usize,
}

fn walk_chunks(png: &[u8]) -> Result<Vec<ChunkRef>, ZkStegError> {
    if png.len() < 8 || png[0..8] != PNG_SIGNATURE {
        return Err(ZkStegError::MalformedPng("missing PNG signature".to_string()));
    }

    let mut offset = 8;
    let mut chunks = Vec::new();

    loop {
        if offset + 8 > png.len() {
            return Err(ZkStegError::MalformedPng("truncated chunk header".to_string()));
        }

        let length = u32::from_be_bytes(png[offset..offset + 4].try_into().unwrap()) as usize;
        let mut kind = [0u8; 4];
        kind.copy_from_slice(&png[offset + 4..offset + 8]);

        let data_start = offset + 8;
        let data_end = data_start
            .checked_add(length)
            .ok_or_else(|| ZkStegError::MalformedPng("chunk length overflow".to_string()))?;
        let end = data_end + 4;
        if end > png.len() {
            return Err(ZkStegError::MalformedPng(
                "chunk runs past end of file".to_string(),
            ));
        }

        chunks.push(ChunkRef {
            start: offset,
            kind,
            data_start,
            data_len: length,
            end,
        });

        if &kind == b"IEND" {
            return Ok(chunks);
        }
        offset = end;
    }
}

fn write_chunk(out: &mut Vec<u8>, kind: &[u8; 4], data: &[u8]) {
    out.extend_from_slice(&(data.len() as u32).to_be_bytes());
    out.extend_from_slice(kind);
    out.extend_from_slice(data);

    let mut hasher = crc32fast::Hasher::new();
    hasher.update(kind);
    hasher.update(data);
    out.extend_from_slice(&hasher.finalize().to_be_bytes());
}

fn verify_crc(chunk: &ChunkRef, png: &[u8]) -> Result<(), ZkStegError> {
    let stored = u32::from_be_bytes(png[chunk.end - 4..chunk.end].try_into().unwrap());

    let mut hasher = crc32fast::Hasher::new();
    hasher.update(&chunk.kind);
    hasher.update(&png[chunk.data_start..chunk.data_start + chunk.data_len]);

    if hasher.finalize() != stored {
        return Err(ZkStegError::EnvelopeCorrupt);
    }
    Ok(())
}

/// Inserts a `zkPF` chunk carrying `descriptor` immediately before `IEND`,
/// removing any pre-existing `zkPF` chunks first.
pub fn write_envelope(png_bytes: &[u8], descriptor: &EnvelopeDescriptor) -> Result<Vec<u8>, ZkStegError> {
    let chunks = walk_chunks(png_bytes)?;
    let iend_start = chunks
        .last()
        .filter(|c| &c.kind == b"IEND")
        .map(|c| c.start)
        .ok_or_else(|| ZkStegError::MalformedPng("no IEND chunk".to_string()))?;

    let mut out = Vec::with_capacity(png_bytes.len() + 64 + descriptor.metadata.len());
    out.extend_from_slice(&png_bytes[..8]);

    let chunk_data = descriptor.to_chunk_data();
    for chunk in &chunks {
        if &chunk.kind == CHUNK_TYPE {
            continue;
        }
        if chunk.start == iend_start {
            write_chunk(&mut out, CHUNK_TYPE, &chunk_data);
        }
        out.extend_from_slice(&png_bytes[chunk.start..chunk.end]);
    }

    Ok(out)
}

/// Reads the last `zkPF` chunk in the file, validating its CRC, tag, and
/// version.
pub fn read_envelope(png_bytes: &[u8]) -> Result<EnvelopeDescriptor, ZkStegError> {
    let chunks = walk_chunks(png_bytes)?;
    let chunk = chunks
        .iter()
        .rev()
        .find(|c| &c.kind == CHUNK_TYPE)
        .ok_or(ZkStegError::NoEnvelope)?;

    verify_crc(chunk, png_bytes)?;
    let data = &png_bytes[chunk.data_start..chunk.data_start + chunk.data_len];
    EnvelopeDescriptor::from_chunk_data(data)
}

/// SHA-256 over `raster` with every selected position's channel LSB forced
/// to zero, streamed byte-by-byte rather than materializing a cleared copy.
pub fn normalized_carrier_hash(raster: &Raster, positions: &[Position]) -> [u8; 32] {
    let cleared: std::collections::HashSet<usize> = positions
        .iter()
        .map(|p| raster.offset(p.x, p.y, p.channel))
        .collect();

    let mut hasher = Sha256::new();
    for (offset, &byte) in raster.as_bytes().iter().enumerate() {
        if cleared.contains(&offset) {
            hasher.update([byte & 0xFE]);
        } else {
            hasher.update([byte]);
        }
    }
    hasher.finalize().into()
}
