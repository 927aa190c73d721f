//! Error types for the steganographic codec.
//!
//! Every public operation returns `Result<_, ZkStegError>`. There is no
//! silent recovery anywhere in the crate except the bounded collision retry
//! inside the chaos position generator (see [`crate::chaos`]); every other
//! failure is surfaced to the caller verbatim, and on any error path the
//! caller's input is left untouched (embed only begins mutating once every
//! pre-flight check has passed).

use thiserror::Error;

/// Comprehensive error type for embed/extract and envelope operations.
#[derive(Error, Debug)]
pub enum ZkStegError {
    /// The key supplied to the key deriver was empty.
    #[error("key must not be empty")]
    KeyTooShort,

    /// The PNG is not 8-bit truecolour (with or without alpha).
    #[error("unsupported PNG format: expected 8-bit truecolour (RGB or RGBA)")]
    UnsupportedFormat,

    /// `payload_bits` exceeds the image's capacity.
    #[error("payload requires {requested} bits but capacity is {capacity} bits")]
    CapacityExceeded {
        /// Bits the caller asked to embed.
        requested: u32,
        /// Bits available given image geometry and envelope reservation.
        capacity: u32,
    },

    /// The position generator failed to find a fresh position within the
    /// bounded retry budget for one bit.
    #[error("position generator exhausted its retry budget after {0} consecutive collisions")]
    CapacityExhausted(u32),

    /// PNG chunk parsing failed, or no terminating `IEND` chunk was found.
    #[error("malformed PNG: {0}")]
    MalformedPng(String),

    /// The `zkPF` chunk's CRC did not match its contents.
    #[error("envelope chunk CRC mismatch")]
    EnvelopeCorrupt,

    /// The `zkPF` chunk's tag or version was not recognised.
    #[error("unrecognised envelope tag or version")]
    UnknownEnvelope,

    /// Envelope fields are out of range for the accompanying image geometry.
    #[error("envelope fields inconsistent with image geometry")]
    EnvelopeInconsistent,

    /// The recomputed normalized carrier hash does not match the envelope's.
    #[error("carrier hash mismatch: image was modified outside the embedded positions")]
    CarrierMismatch,

    /// No `zkPF` chunk was present in the PNG.
    #[error("no envelope chunk present")]
    NoEnvelope,

    /// Internal invariant violation: position count and bit count disagree.
    #[error("internal error: position count and bit count disagree ({positions} vs {bits})")]
    LengthMismatch {
        /// Number of positions generated.
        positions: usize,
        /// Number of bits requested.
        bits: usize,
    },

    /// PNG decoding failed.
    #[error("PNG decoding error: {0}")]
    PngDecoding(#[from] png::DecodingError),

    /// PNG encoding failed.
    #[error("PNG encoding error: {0}")]
    PngEncoding(#[from] png::EncodingError),

    /// A buffer operation failed in a way not covered by a more specific
    /// variant.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
