//! # zksteg: chaos-driven PNG steganographic codec
//!
//! Hides an opaque payload inside a PNG raster and recovers it
//! bit-exactly, through a seeded, chaos-driven position generator, a
//! bit-level LSB codec, and a `zkPF` PNG chunk that binds the embedding to
//! its carrier image with a SHA-256 hash.
//!
//! The proving system that produces the payload, non-PNG image formats,
//! message-format generators, and CLI wrappers are all out of scope: this
//! crate consumes and emits plain byte buffers only.
//!
//! ## Quick start
//!
//! ```no_run
//! use zksteg::{embed, extract, EmbedOptions};
//!
//! let png_bytes = std::fs::read("cover.png")?;
//! let payload = b"proof artifact bytes";
//! let key = b"shared secret";
//!
//! let (stego_png, _descriptor) = embed(&png_bytes, payload, key, EmbedOptions::new())?;
//! std::fs::write("stego.png", &stego_png)?;
//!
//! let (recovered, _descriptor) = extract(&stego_png, key)?;
//! assert_eq!(recovered, payload);
//! # Ok::<(), zksteg::ZkStegError>(())
//! ```
//!
//! ## Error handling
//!
//! Every public operation returns `Result<_, ZkStegError>`. On any error
//! path the caller's input is left untouched: [`embed`] only begins
//! mutating its working raster after every pre-flight check (key,
//! capacity) has passed.

use std::io::{BufWriter, Cursor};

pub mod anchor;
pub mod chaos;
pub mod envelope;
pub mod error;
pub mod keyderive;
pub mod lsb;
pub mod raster;

pub use chaos::Position;
pub use envelope::EnvelopeDescriptor;
pub use error::ZkStegError;
pub use keyderive::ChaosParameters;
pub use raster::Raster;

/// Options controlling a single embed call. There is no on-disk or
/// environment configuration for this core; this builder-pattern struct is
/// the entire configuration surface.
#[derive(Debug, Clone, Default)]
pub struct EmbedOptions {
    anchor: Option<(u16, u16)>,
    metadata: Vec<u8>,
}

impl EmbedOptions {
    /// Default options: anchor chosen by [`anchor::extract_anchor`], no
    /// metadata blob.
    pub fn new() -> Self {
        Self::default()
    }

    /// Overrides the anchor the caller would otherwise get from the
    /// feature extractor.
    pub fn with_anchor(mut self, x: u16, y: u16) -> Self {
        self.anchor = Some((x, y));
        self
    }

    /// Attaches an opaque metadata blob, copied verbatim into the envelope
    /// and returned verbatim on extract. The core never interprets it.
    pub fn with_metadata(mut self, metadata: Vec<u8>) -> Self {
        self.metadata = metadata;
        self
    }
}

/// Embeds `payload` into `png_bytes` under `key`, returning the stego PNG
/// and the envelope descriptor written alongside it.
///
/// # Errors
///
/// - [`ZkStegError::KeyTooShort`] if `key` is empty.
/// - [`ZkStegError::UnsupportedFormat`] if the PNG is not 8-bit truecolour
///   (with or without alpha), or its dimensions fall outside `[32, 65535]`.
/// - [`ZkStegError::CapacityExceeded`] if `payload` does not fit.
/// - [`ZkStegError::CapacityExhausted`] if the position generator cannot
///   find a fresh position within its retry budget.
pub fn embed(
    png_bytes: &[u8],
    payload: &[u8],
    key: &[u8],
    options: EmbedOptions,
) -> Result<(Vec<u8>, EnvelopeDescriptor), ZkStegError> {
    let (mut raster, alpha, info) = decode_png(png_bytes)?;

    let anchor = options
        .anchor
        .unwrap_or_else(|| anchor::extract_anchor(raster.width(), raster.height(), raster.as_bytes()));

    let payload_bits = (payload.len() as u64).saturating_mul(8).min(u32::MAX as u64) as u32;
    if payload_bits > raster.capacity_bits() {
        return Err(ZkStegError::CapacityExceeded {
            requested: payload_bits,
            capacity: raster.capacity_bits(),
        });
    }

    #[cfg(feature = "log")]
    log::debug!(
        "embed: {}x{} image, {} payload bytes, anchor=({}, {})",
        raster.width(),
        raster.height(),
        payload.len(),
        anchor.0,
        anchor.1
    );

    let params = keyderive::derive_parameters(key, anchor)?;
    let positions = chaos::generate_positions(
        &params,
        anchor,
        raster.width(),
        raster.height(),
        payload_bits as usize,
    )?;

    let bits = lsb::bytes_to_bits(payload);
    lsb::embed_bits(&mut raster, &positions, &bits)?;

    let carrier_sha = envelope::normalized_carrier_hash(&raster, &positions);
    let descriptor = EnvelopeDescriptor {
        anchor,
        payload_bits,
        carrier_sha,
        metadata: options.metadata,
    };

    let stego_png = encode_png(&info, &raster, alpha.as_deref())?;
    let stego_png = envelope::write_envelope(&stego_png, &descriptor)?;

    Ok((stego_png, descriptor))
}

/// Recovers the payload and envelope descriptor from a stego PNG produced
/// by [`embed`].
///
/// # Errors
///
/// - [`ZkStegError::NoEnvelope`] if no `zkPF` chunk is present.
/// - [`ZkStegError::EnvelopeCorrupt`] / [`ZkStegError::UnknownEnvelope`] if
///   the chunk fails validation.
/// - [`ZkStegError::EnvelopeInconsistent`] if the envelope's fields do not
///   fit the accompanying image.
/// - [`ZkStegError::CarrierMismatch`] if the image was altered outside the
///   embedded positions.
pub fn extract(stego_png_bytes: &[u8], key: &[u8]) -> Result<(Vec<u8>, EnvelopeDescriptor), ZkStegError> {
    let descriptor = envelope::read_envelope(stego_png_bytes)?;
    let (raster, _alpha, _info) = decode_png(stego_png_bytes)?;

    if descriptor.payload_bits > raster.capacity_bits() {
        return Err(ZkStegError::EnvelopeInconsistent);
    }

    #[cfg(feature = "log")]
    log::debug!(
        "extract: {}x{} image, anchor=({}, {}), {} payload bits",
        raster.width(),
        raster.height(),
        descriptor.anchor.0,
        descriptor.anchor.1,
        descriptor.payload_bits
    );

    let params = keyderive::derive_parameters(key, descriptor.anchor)?;
    let positions = chaos::generate_positions(
        &params,
        descriptor.anchor,
        raster.width(),
        raster.height(),
        descriptor.payload_bits as usize,
    )?;

    let carrier_sha = envelope::normalized_carrier_hash(&raster, &positions);
    if carrier_sha != descriptor.carrier_sha {
        #[cfg(feature = "log")]
        log::warn!("extract: carrier hash mismatch, rejecting payload");
        return Err(ZkStegError::CarrierMismatch);
    }

    let bits = lsb::extract_bits(&raster, &positions);
    let payload = lsb::bits_to_bytes(&bits);

    Ok((payload, descriptor))
}

/// Returns the maximum payload size in bits for `png_bytes`, without
/// performing any embedding.
pub fn capacity_bits(png_bytes: &[u8]) -> Result<u32, ZkStegError> {
    let (raster, _alpha, _info) = decode_png(png_bytes)?;
    Ok(raster.capacity_bits())
}

// ===== PNG framing: decode/encode plus ancillary-chunk bookkeeping =====

fn decode_png(png_bytes: &[u8]) -> Result<(Raster, Option<Vec<u8>>, png::Info<'_>), ZkStegError> {
    let decoder = png::Decoder::new(Cursor::new(png_bytes));
    let mut reader = decoder.read_info()?;
    let info = reader.info().clone();

    if info.bit_depth != png::BitDepth::Eight
        || !matches!(info.color_type, png::ColorType::Rgb | png::ColorType::Rgba)
    {
        return Err(ZkStegError::UnsupportedFormat);
    }

    let mut buffer = vec![0u8; reader.output_buffer_size()];
    reader.next_frame(&mut buffer)?;

    let (pixels, alpha) = if info.color_type == png::ColorType::Rgba {
        let (rgb, alpha) = raster::split_alpha(&buffer);
        (rgb, Some(alpha))
    } else {
        (buffer, None)
    };

    let raster = Raster::new(info.width as u16, info.height as u16, pixels)?;
    Ok((raster, alpha, info))
}

fn encode_png(info: &png::Info, raster: &Raster, alpha: Option<&[u8]>) -> Result<Vec<u8>, ZkStegError> {
    let mut writer_buffer = BufWriter::new(Vec::new());
    let mut encoder = png::Encoder::new(
        &mut writer_buffer,
        raster.width() as u32,
        raster.height() as u32,
    );
    encoder.set_color(info.color_type);
    encoder.set_depth(info.bit_depth);
    encoder.set_compression(info.compression);
    encoder.set_pixel_dims(info.pixel_dims);
    copy_png_metadata(info, &mut encoder);

    let image_data = match alpha {
        Some(alpha) => raster::merge_alpha(raster.as_bytes(), alpha),
        None => raster.as_bytes().to_vec(),
    };

    let mut writer = encoder.write_header()?;
    writer.write_image_data(&image_data)?;
    writer.finish()?;

    writer_buffer
        .into_inner()
        .map_err(|err| ZkStegError::Io(std::io::Error::other(err.to_string())))
}

/// Forwards ancillary PNG properties from the decoded image to the
/// re-encoded one, generic over the encoder's writer type.
fn copy_png_metadata<W: std::io::Write>(info: &png::Info, encoder: &mut png::Encoder<'_, W>) {
    if let Some(palette) = &info.palette {
        encoder.set_palette(palette.to_vec());
    }
    if let Some(animation) = &info.animation_control {
        let _ = encoder.set_animated(animation.num_frames, animation.num_plays);
    }
    if let Some(trns) = &info.trns {
        encoder.set_trns(trns.to_vec());
    }
    if let Some(source_gamma) = &info.source_gamma {
        encoder.set_source_gamma(*source_gamma);
    }
    if let Some(source_chromaticities) = &info.source_chromaticities {
        encoder.set_source_chromaticities(*source_chromaticities);
    }
    if let Some(srgb) = &info.srgb {
        encoder.set_source_srgb(*srgb);
    }
}
