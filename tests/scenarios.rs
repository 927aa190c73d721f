//! Literal acceptance scenarios: a fixed synthetic 64x64 raster exercised
//! against each boundary case the codec is expected to handle exactly.

use std::io::Cursor;

use zksteg::{capacity_bits, embed, extract, EmbedOptions, ZkStegError};

/// `x[y,w,c] = (17*y + 31*w + 7*c) mod 256`, encoded as an 8-bit RGB PNG.
fn synthetic_raster_png(width: u32, height: u32) -> Vec<u8> {
    let mut pixels = Vec::with_capacity((width * height * 3) as usize);
    for y in 0..height {
        for w in 0..width {
            for c in 0..3u32 {
                pixels.push(((17 * y + 31 * w + 7 * c) % 256) as u8);
            }
        }
    }

    let mut png_data = Vec::new();
    {
        let mut cursor = Cursor::new(&mut png_data);
        let mut encoder = png::Encoder::new(&mut cursor, width, height);
        encoder.set_color(png::ColorType::Rgb);
        encoder.set_depth(png::BitDepth::Eight);
        let mut writer = encoder.write_header().unwrap();
        writer.write_image_data(&pixels).unwrap();
    }
    png_data
}

fn decode_pixels(png_data: &[u8]) -> Vec<u8> {
    let decoder = png::Decoder::new(Cursor::new(png_data));
    let mut reader = decoder.read_info().unwrap();
    let mut buffer = vec![0u8; reader.output_buffer_size()];
    reader.next_frame(&mut buffer).unwrap();
    buffer
}

#[test]
fn scenario_1_empty_payload() {
    let png = synthetic_raster_png(64, 64);
    let (stego, descriptor) = embed(&png, b"", b"k", EmbedOptions::new().with_anchor(10, 10)).unwrap();

    assert_eq!(descriptor.payload_bits, 0);
    assert_eq!(decode_pixels(&png), decode_pixels(&stego));

    let (recovered, _) = extract(&stego, b"k").unwrap();
    assert_eq!(recovered, b"");
}

#[test]
fn scenario_2_one_byte_payload() {
    let png = synthetic_raster_png(64, 64);
    let (stego, _descriptor) = embed(&png, &[0xA5], b"k", EmbedOptions::new().with_anchor(10, 10)).unwrap();

    let original = decode_pixels(&png);
    let mutated = decode_pixels(&stego);
    let differing: Vec<(u8, u8)> = original
        .iter()
        .zip(mutated.iter())
        .filter(|(a, b)| a != b)
        .map(|(&a, &b)| (a, b))
        .collect();

    assert_eq!(differing.len(), 8);
    for (a, b) in differing {
        assert!(a ^ b == 1, "mutated bytes must differ by exactly one bit");
    }

    let (recovered, _) = extract(&stego, b"k").unwrap();
    assert_eq!(recovered, vec![0xA5]);
}

#[test]
fn scenario_3_capacity_edge() {
    let png = synthetic_raster_png(64, 64);
    let capacity = capacity_bits(&png).unwrap();
    assert_eq!(capacity, 64 * 64 * 3 - 64 * 8);
    assert_eq!(capacity, 11776);

    let payload: Vec<u8> = (0..1472u32).map(|i| ((i * 37 + 11) % 256) as u8).collect();
    let (stego, _descriptor) = embed(&png, &payload, b"k", EmbedOptions::new().with_anchor(10, 10)).unwrap();
    let (recovered, _) = extract(&stego, b"k").unwrap();
    assert_eq!(recovered, payload);
}

#[test]
fn scenario_3b_one_bit_over_capacity_is_rejected() {
    let png = synthetic_raster_png(64, 64);
    let capacity = capacity_bits(&png).unwrap();
    let payload = vec![0u8; capacity as usize / 8 + 1];

    let result = embed(&png, &payload, b"k", EmbedOptions::new().with_anchor(10, 10));
    assert!(matches!(
        result,
        Err(ZkStegError::CapacityExceeded { .. })
    ));
}

#[test]
fn scenario_4_tamper_detection() {
    let png = synthetic_raster_png(64, 64);
    let (stego, descriptor) = embed(&png, &[0xA5], b"k", EmbedOptions::new().with_anchor(10, 10)).unwrap();

    let mut pixels = decode_pixels(&stego);
    // Flip bit 4 (not the LSB) of stego[0, 0, 0].
    pixels[0] ^= 0b0001_0000;

    let mut png_data = Vec::new();
    {
        let mut cursor = Cursor::new(&mut png_data);
        let mut encoder = png::Encoder::new(&mut cursor, 64, 64);
        encoder.set_color(png::ColorType::Rgb);
        encoder.set_depth(png::BitDepth::Eight);
        let mut writer = encoder.write_header().unwrap();
        writer.write_image_data(&pixels).unwrap();
    }

    let tampered = zksteg::envelope::write_envelope(&png_data, &descriptor).unwrap();
    assert!(matches!(
        extract(&tampered, b"k"),
        Err(ZkStegError::CarrierMismatch)
    ));
}

#[test]
fn scenario_5_key_sensitivity() {
    let png = synthetic_raster_png(64, 64);
    let payload = [0xA5u8, 0x5A];
    let anchor = EmbedOptions::new().with_anchor(10, 10);

    let (stego_k0_a, _) = embed(&png, &payload, b"k0", anchor.clone()).unwrap();
    let (stego_k0_b, _) = embed(&png, &payload, b"k0", anchor.clone()).unwrap();
    assert_eq!(stego_k0_a, stego_k0_b);

    let (stego_k1, _) = embed(&png, &payload, b"k1", anchor).unwrap();

    let original = decode_pixels(&png);
    let pixels_k0 = decode_pixels(&stego_k0_a);
    let pixels_k1 = decode_pixels(&stego_k1);

    let mutated_k0: std::collections::HashSet<usize> = original
        .iter()
        .zip(pixels_k0.iter())
        .enumerate()
        .filter(|(_, (a, b))| a != b)
        .map(|(i, _)| i)
        .collect();
    let mutated_k1: std::collections::HashSet<usize> = original
        .iter()
        .zip(pixels_k1.iter())
        .enumerate()
        .filter(|(_, (a, b))| a != b)
        .map(|(i, _)| i)
        .collect();

    assert_eq!(mutated_k0.len(), 16);
    assert_eq!(mutated_k1.len(), 16);
    let shared = mutated_k0.intersection(&mutated_k1).count();
    assert!(shared <= 2);
}

#[test]
fn scenario_6_cross_platform_determinism() {
    use sha2::{Digest, Sha256};

    let png = synthetic_raster_png(64, 64);
    let (stego_a, _) = embed(&png, &[0xA5], b"k", EmbedOptions::new().with_anchor(10, 10)).unwrap();
    let (stego_b, _) = embed(&png, &[0xA5], b"k", EmbedOptions::new().with_anchor(10, 10)).unwrap();

    let hash_a = Sha256::digest(&stego_a);
    let hash_b = Sha256::digest(&stego_b);
    assert_eq!(hash_a, hash_b);
}
