//! JPEG codec adapter using the `image` crate's baseline JPEG codec.

use std::io::Cursor;

use image::ImageDecoder;
use image::codecs::jpeg::{JpegDecoder, JpegEncoder};

use crate::pixel::{ImgVec, Rgb};
use crate::{CodecError, CodecParams, DecodeOutput, EncodeOutput, FormatTag, Limits, PixelBuffer};

use super::{CodecAdapter, check_input};

/// JPEG adapter: decodes to RGB8, encodes RGB8 with alpha dropped.
#[derive(Clone, Copy, Debug, Default)]
pub struct JpegCodec;

impl CodecAdapter for JpegCodec {
    fn name(&self) -> &'static str {
        "jpeg"
    }

    fn formats(&self) -> &'static [FormatTag] {
        &[FormatTag::Jpeg]
    }

    fn decode(&self, data: &[u8], limits: &Limits) -> Result<DecodeOutput, CodecError> {
        check_input(data, self.formats())?;

        let decoder = JpegDecoder::new(Cursor::new(data))
            .map_err(|e| CodecError::from_codec(FormatTag::Jpeg, e))?;
        let (width, height) = decoder.dimensions();
        limits.validate(width, height)?;

        let rgb = image::DynamicImage::from_decoder(decoder)
            .map_err(|e| CodecError::from_codec(FormatTag::Jpeg, e))?
            .into_rgb8();
        let pixels: &[Rgb<u8>] = bytemuck::cast_slice(rgb.as_raw().as_slice());
        let img = ImgVec::new(pixels.to_vec(), width as usize, height as usize);

        Ok(DecodeOutput {
            pixels: PixelBuffer::from_rgb8(img)?,
            format: FormatTag::Jpeg,
        })
    }

    fn encode(&self, pixels: &PixelBuffer, params: &CodecParams) -> Result<EncodeOutput, CodecError> {
        if params.lossless {
            return Err(CodecError::UnsupportedOperation {
                format: FormatTag::Jpeg,
                detail: "lossless encoding",
            });
        }

        // JPEG has no alpha channel
        let rgb = pixels.to_rgb8();
        let (buf, width, height) = rgb.as_ref().to_contiguous_buf();
        let bytes: &[u8] = bytemuck::cast_slice(buf.as_ref());

        let mut data = Vec::new();
        JpegEncoder::new_with_quality(&mut data, params.quality.get())
            .encode(bytes, width as u32, height as u32, image::ExtendedColorType::Rgb8)
            .map_err(|e| CodecError::from_codec(FormatTag::Jpeg, e))?;

        Ok(EncodeOutput {
            data,
            format: FormatTag::Jpeg,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Quality;
    use crate::pixel::Rgba;

    fn solid(w: usize, h: usize, r: u8, g: u8, b: u8) -> PixelBuffer {
        PixelBuffer::from_rgb8(ImgVec::new(vec![Rgb { r, g, b }; w * h], w, h)).unwrap()
    }

    #[test]
    fn roundtrip_is_close() {
        let buffer = solid(16, 16, 200, 40, 90);
        let params = CodecParams::new(Quality::new(95).unwrap());
        let out = JpegCodec.encode(&buffer, &params).unwrap();
        assert_eq!(out.format, FormatTag::Jpeg);
        assert_eq!(FormatTag::detect(&out.data), FormatTag::Jpeg);

        let decoded = JpegCodec.decode(&out.data, &Limits::none()).unwrap();
        assert_eq!(decoded.pixels.width(), 16);
        assert_eq!(decoded.pixels.height(), 16);
        let p = decoded.pixels.pixel(8, 8).unwrap();
        assert!(p.r.abs_diff(200) <= 4 && p.g.abs_diff(40) <= 4 && p.b.abs_diff(90) <= 4);
    }

    #[test]
    fn alpha_is_dropped() {
        let img = ImgVec::new(
            vec![
                Rgba {
                    r: 0,
                    g: 0,
                    b: 0,
                    a: 0
                };
                4
            ],
            2,
            2,
        );
        let buffer = PixelBuffer::from_rgba8(img).unwrap();
        let out = JpegCodec.encode(&buffer, &CodecParams::default()).unwrap();
        let decoded = JpegCodec.decode(&out.data, &Limits::none()).unwrap();
        assert!(!decoded.pixels.has_alpha());
    }

    #[test]
    fn lossless_is_rejected() {
        let buffer = solid(2, 2, 1, 2, 3);
        let params = CodecParams::default().with_lossless(true);
        assert!(matches!(
            JpegCodec.encode(&buffer, &params),
            Err(CodecError::UnsupportedOperation {
                format: FormatTag::Jpeg,
                ..
            })
        ));
    }

    #[test]
    fn headerless_stream_is_codec_error() {
        // SOI immediately followed by EOI: no frame header
        let data = [0xFF, 0xD8, 0xFF, 0xD9];
        assert!(matches!(
            JpegCodec.decode(&data, &Limits::none()),
            Err(CodecError::Codec {
                format: FormatTag::Jpeg,
                ..
            })
        ));
    }
}
