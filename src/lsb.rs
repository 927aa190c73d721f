//! LSB codec: mutate / read the least significant bit of pixel channels at
//! a position sequence. Bit index is fixed to 0; there is no configurable
//! bit position.

use crate::chaos::Position;
use crate::error::ZkStegError;
use crate::raster::Raster;

#[inline]
fn embed_bit(carrier: u8, bit: u8) -> u8 {
    (carrier & 0xFE) | (bit & 0x01)
}

#[inline]
fn extract_bit(carrier: u8) -> u8 {
    carrier & 0x01
}

/// Embeds `bits` at `positions`, one bit per position, in order. Mutates
/// only the target channel's LSB at each position; every other bit in
/// `raster` is left untouched.
pub fn embed_bits(
    raster: &mut Raster,
    positions: &[Position],
    bits: &[u8],
) -> Result<(), ZkStegError> {
    if positions.len() != bits.len() {
        return Err(ZkStegError::LengthMismatch {
            positions: positions.len(),
            bits: bits.len(),
        });
    }

    for (pos, &bit) in positions.iter().zip(bits) {
        let current = raster.get(pos.x, pos.y, pos.channel);
        raster.set(pos.x, pos.y, pos.channel, embed_bit(current, bit));
    }

    Ok(())
}

/// Reads the LSB at each position, in order. Never mutates `raster`.
pub fn extract_bits(raster: &Raster, positions: &[Position]) -> Vec<u8> {
    positions
        .iter()
        .map(|pos| extract_bit(raster.get(pos.x, pos.y, pos.channel)))
        .collect()
}

/// Packs a byte slice into an MSB-first bit stream: `bit(8k + j) = (B >>
/// (7 - j)) & 1`.
pub fn bytes_to_bits(bytes: &[u8]) -> Vec<u8> {
    let mut bits = Vec::with_capacity(bytes.len() * 8);
    for &byte in bytes {
        for j in 0..8u8 {
            bits.push((byte >> (7 - j)) & 1);
        }
    }
    bits
}

/// Inverse of [`bytes_to_bits`]. `bits.len()` must be a multiple of 8.
pub fn bits_to_bytes(bits: &[u8]) -> Vec<u8> {
    bits.chunks_exact(8)
        .map(|chunk| chunk.iter().fold(0u8, |acc, &bit| (acc << 1) | (bit & 1)))
        .collect()
}
