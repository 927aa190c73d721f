//! Key deriver: turns a key and an anchor coordinate into the chaos
//! parameter bundle via a single SHA-256 digest (also used by `envelope` for
//! the carrier-binding hash). Stateless and reproducible: no platform- or
//! language-specific hashing involved.

use sha2::{Digest, Sha256};

use crate::error::ZkStegError;

/// Parameters governing the Arnold cat map / logistic map position
/// generator. All four fields are pure functions of the key (see
/// [`derive_parameters`]); none depend on the payload.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChaosParameters {
    /// Logistic map growth rate, in `(3.57, 4.0]` (chaotic regime).
    pub logistic_r: f64,
    /// Logistic map initial state, strictly in `(0, 1)`.
    pub logistic_x0: f64,
    /// Arnold cat map applications per emitted position, in `[1, 10]`.
    pub arnold_iterations: u8,
    /// Seed for the running channel counter.
    pub channel_seed: u128,
}

/// `2^53`, the boundary used to keep `logistic_x0` away from the logistic
/// map's fixed points.
const X0_MODULUS: u64 = 1u64 << 53;
/// `2^32`, the divisor mapping the first digest word into `[0, 1)`.
const R_MODULUS: f64 = 4_294_967_296.0;

/// Derives [`ChaosParameters`] from `key` and the anchor coordinate.
///
/// `H = SHA256(key || be16(anchor.0) || be16(anchor.1))`; every field is
/// read big-endian out of the 32-byte digest. Fails with
/// [`ZkStegError::KeyTooShort`] if `key` is empty.
pub fn derive_parameters(key: &[u8], anchor: (u16, u16)) -> Result<ChaosParameters, ZkStegError> {
    if key.is_empty() {
        return Err(ZkStegError::KeyTooShort);
    }

    let mut hasher = Sha256::new();
    hasher.update(key);
    hasher.update(anchor.0.to_be_bytes());
    hasher.update(anchor.1.to_be_bytes());
    let digest = hasher.finalize();

    let r_bits = u32::from_be_bytes(digest[0..4].try_into().unwrap());
    let logistic_r = 3.57 + (r_bits as f64 / R_MODULUS) * 0.43;

    let x0_bits = u64::from_be_bytes(digest[4..12].try_into().unwrap());
    let numerator = (x0_bits % X0_MODULUS) + 1;
    let denominator = X0_MODULUS + 2;
    let logistic_x0 = numerator as f64 / denominator as f64;

    let arnold_iterations = (digest[12] % 10) + 1;

    let channel_seed = u128::from_be_bytes(digest[16..32].try_into().unwrap());

    Ok(ChaosParameters {
        logistic_r,
        logistic_x0,
        arnold_iterations,
        channel_seed,
    })
}
