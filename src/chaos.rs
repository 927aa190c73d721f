//! Chaos position generator: an Arnold cat map spatial mixer coupled with a
//! logistic map perturbation source, emitting a collision-free `Position`
//! stream, with a bounded collision retry tracked through a `HashSet`.
//!
//! Arithmetic here is written as straight-line `f64` expressions (no
//! precomputed intermediate reused across platforms in ways a compiler could
//! reassociate), so the logistic map stays IEEE-754 bit-identical across
//! platforms and is never fused into a single multiply-add.

use std::collections::HashSet;

use crate::error::ZkStegError;
use crate::keyderive::ChaosParameters;
use crate::raster::RESERVED_BYTES;

/// A single bit slot in the raster: pixel `(x, y)`, channel in `0..3`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Position {
    pub x: u16,
    pub y: u16,
    pub channel: u8,
}

/// Safety margin bounding expected rejection iterations.
const CAPACITY_MARGIN: f64 = 0.9;

/// Emits `n` unique [`Position`]s inside a `width × height` image, starting
/// from `anchor` and driven by `params`.
pub fn generate_positions(
    params: &ChaosParameters,
    anchor: (u16, u16),
    width: u16,
    height: u16,
    n: usize,
) -> Result<Vec<Position>, ZkStegError> {
    let raw_capacity = width as u64 * height as u64 * 3;
    let margin_cap = (raw_capacity as f64 * CAPACITY_MARGIN).floor() as u64;
    let reserved_cap = raw_capacity.saturating_sub(RESERVED_BYTES as u64 * 8);
    // The 0.9 margin can be tighter than the advertised `capacity_bits()` on
    // small images; it is meant as an internal retry-iteration backstop, not
    // a second public ceiling, so it never rejects an `n` that
    // `capacity_bits()` already admits.
    let max_n = margin_cap.max(reserved_cap);

    if n as u64 > max_n {
        return Err(ZkStegError::CapacityExceeded {
            requested: (n as u64).min(u32::MAX as u64) as u32,
            capacity: max_n.min(u32::MAX as u64) as u32,
        });
    }

    let retry_bound = (16usize).max(n) as u32;

    let w = width as i64;
    let h = height as i64;
    let mut cx = anchor.0 as i64;
    let mut cy = anchor.1 as i64;
    let mut x = params.logistic_x0;
    let mut ctr = params.channel_seed;

    let mut seen: HashSet<Position> = HashSet::with_capacity(n);
    let mut positions = Vec::with_capacity(n);

    for _ in 0..n {
        let mut retries = 0u32;
        loop {
            for _ in 0..params.arnold_iterations {
                let next_cx = (2 * cx + cy).rem_euclid(w);
                let next_cy = (cx + cy).rem_euclid(h);
                cx = next_cx;
                cy = next_cy;
            }

            x = params.logistic_r * x * (1.0 - x);
            let dx = (10.0 * x).floor() as i64 - 5;
            let y_prime = params.logistic_r * x * (1.0 - x);
            let dy = (10.0 * y_prime).floor() as i64 - 5;
            x = y_prime;

            let px = (cx + dx).rem_euclid(w) as u16;
            let py = (cy + dy).rem_euclid(h) as u16;
            let channel = (ctr % 3) as u8;
            ctr = ctr.wrapping_add(1);

            let candidate = Position {
                x: px,
                y: py,
                channel,
            };

            if seen.insert(candidate) {
                positions.push(candidate);
                break;
            }

            retries += 1;
            #[cfg(feature = "log")]
            log::trace!("chaos: collision at emission, retry {retries}/{retry_bound}");
            if retries > retry_bound {
                return Err(ZkStegError::CapacityExhausted(retry_bound));
            }
        }
    }

    Ok(positions)
}
