//! PNG codec adapter using png crate.

use std::io::Cursor;

use crate::pixel::{ImgRef, ImgVec, PixelData, Rgb, Rgba};
use crate::{CodecError, CodecParams, DecodeOutput, EncodeOutput, FormatTag, Limits, PixelBuffer};

use super::{CodecAdapter, check_input};

/// PNG adapter. Quality is accepted and ignored; PNG is always lossless.
#[derive(Clone, Copy, Debug, Default)]
pub struct PngCodec;

impl CodecAdapter for PngCodec {
    fn name(&self) -> &'static str {
        "png"
    }

    fn formats(&self) -> &'static [FormatTag] {
        &[FormatTag::Png]
    }

    fn decode(&self, data: &[u8], limits: &Limits) -> Result<DecodeOutput, CodecError> {
        check_input(data, self.formats())?;
        let pixels = decode(data, limits)?;
        Ok(DecodeOutput {
            pixels: PixelBuffer::new(pixels)?,
            format: FormatTag::Png,
        })
    }

    fn encode(&self, pixels: &PixelBuffer, _params: &CodecParams) -> Result<EncodeOutput, CodecError> {
        let data = match pixels.data() {
            PixelData::Rgb8(img) => encode_rgb8(img.as_ref())?,
            PixelData::Rgba8(img) => encode_rgba8(img.as_ref())?,
        };
        Ok(EncodeOutput {
            data,
            format: FormatTag::Png,
        })
    }
}

/// Decode PNG to 8-bit RGB or RGBA.
///
/// Palette images are expanded and 16-bit samples stripped to 8 bits;
/// grayscale is widened to RGB (RGBA with alpha).
fn decode(data: &[u8], limits: &Limits) -> Result<PixelData, CodecError> {
    let mut decoder = png::Decoder::new(Cursor::new(data));
    decoder.set_transformations(png::Transformations::EXPAND | png::Transformations::STRIP_16);

    let mut reader = decoder
        .read_info()
        .map_err(|e| CodecError::from_codec(FormatTag::Png, e))?;

    let info = reader.info();
    let width = info.width;
    let height = info.height;
    limits.validate(width, height)?;

    let buffer_size = reader
        .output_buffer_size()
        .ok_or_else(|| CodecError::InvalidInput("cannot determine PNG output buffer size".into()))?;
    let mut raw_pixels = vec![0u8; buffer_size];

    let output_info = reader
        .next_frame(&mut raw_pixels)
        .map_err(|e| CodecError::from_codec(FormatTag::Png, e))?;

    raw_pixels.truncate(output_info.buffer_size());

    let (decoded_color_type, _bit_depth) = reader.output_color_type();
    let w = width as usize;
    let h = height as usize;

    let pixels = match decoded_color_type {
        png::ColorType::Rgba => {
            let rgba: &[Rgba<u8>] = bytemuck::cast_slice(&raw_pixels);
            PixelData::Rgba8(ImgVec::new(rgba.to_vec(), w, h))
        }
        png::ColorType::Rgb => {
            let rgb: &[Rgb<u8>] = bytemuck::cast_slice(&raw_pixels);
            PixelData::Rgb8(ImgVec::new(rgb.to_vec(), w, h))
        }
        png::ColorType::GrayscaleAlpha => {
            let rgba: Vec<Rgba<u8>> = raw_pixels
                .chunks_exact(2)
                .map(|ga| Rgba {
                    r: ga[0],
                    g: ga[0],
                    b: ga[0],
                    a: ga[1],
                })
                .collect();
            PixelData::Rgba8(ImgVec::new(rgba, w, h))
        }
        png::ColorType::Grayscale => {
            let rgb: Vec<Rgb<u8>> = raw_pixels
                .iter()
                .map(|&g| Rgb { r: g, g, b: g })
                .collect();
            PixelData::Rgb8(ImgVec::new(rgb, w, h))
        }
        png::ColorType::Indexed => {
            return Err(CodecError::InvalidInput(
                "palette was not expanded by the PNG decoder".into(),
            ));
        }
    };

    Ok(pixels)
}

fn encode_rgb8(img: ImgRef<Rgb<u8>>) -> Result<Vec<u8>, CodecError> {
    let (buf, width, height) = img.to_contiguous_buf();
    write_png(bytemuck::cast_slice(buf.as_ref()), width, height, png::ColorType::Rgb)
}

fn encode_rgba8(img: ImgRef<Rgba<u8>>) -> Result<Vec<u8>, CodecError> {
    let (buf, width, height) = img.to_contiguous_buf();
    write_png(bytemuck::cast_slice(buf.as_ref()), width, height, png::ColorType::Rgba)
}

fn write_png(
    bytes: &[u8],
    width: usize,
    height: usize,
    color: png::ColorType,
) -> Result<Vec<u8>, CodecError> {
    let mut output = Vec::new();
    let mut encoder = png::Encoder::new(&mut output, width as u32, height as u32);
    encoder.set_color(color);
    encoder.set_depth(png::BitDepth::Eight);

    let mut writer = encoder
        .write_header()
        .map_err(|e| CodecError::from_codec(FormatTag::Png, e))?;

    writer
        .write_image_data(bytes)
        .map_err(|e| CodecError::from_codec(FormatTag::Png, e))?;

    writer
        .finish()
        .map_err(|e| CodecError::from_codec(FormatTag::Png, e))?;

    Ok(output)
}
