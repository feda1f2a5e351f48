//! Synthetic test images.

use heifconv::pixel::{ImgVec, Rgb, Rgba};
use heifconv::{EncodeRequest, FormatTag, PixelBuffer};
use rand::{Rng, SeedableRng, rngs::StdRng};

pub fn solid(width: usize, height: usize, color: Rgba<u8>) -> PixelBuffer {
    PixelBuffer::from_rgba8(ImgVec::new(vec![color; width * height], width, height))
        .expect("non-empty image")
}

pub fn solid_rgb(width: usize, height: usize, color: Rgb<u8>) -> PixelBuffer {
    PixelBuffer::from_rgb8(ImgVec::new(vec![color; width * height], width, height))
        .expect("non-empty image")
}

/// Black and white squares of `cell` pixels, fully opaque.
pub fn checkerboard(width: usize, height: usize, cell: usize) -> PixelBuffer {
    let buf = (0..width * height)
        .map(|i| {
            let (x, y) = (i % width, i / width);
            let v = if (x / cell + y / cell) % 2 == 0 { 0 } else { 255 };
            Rgba {
                r: v,
                g: v,
                b: v,
                a: 255,
            }
        })
        .collect();
    PixelBuffer::from_rgba8(ImgVec::new(buf, width, height)).expect("non-empty image")
}

/// Seeded random RGBA noise, including random alpha.
pub fn noise(width: usize, height: usize, seed: u64) -> PixelBuffer {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut bytes = vec![0u8; width * height * 4];
    rng.fill(bytes.as_mut_slice());
    let buf = bytes
        .chunks_exact(4)
        .map(|c| Rgba {
            r: c[0],
            g: c[1],
            b: c[2],
            a: c[3],
        })
        .collect();
    PixelBuffer::from_rgba8(ImgVec::new(buf, width, height)).expect("non-empty image")
}

/// Encode with the built-in codec for `format`.
pub fn encoded(pixels: &PixelBuffer, format: FormatTag) -> Vec<u8> {
    EncodeRequest::new(format)
        .encode(pixels)
        .expect("encode test image")
        .data
}
