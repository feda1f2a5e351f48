//! HEIF/HEIC/AVIF codec adapter using libheif-rs.
//!
//! Decodes the primary image (or any item by id) to 8-bit interleaved RGB or
//! RGBA and encodes into HEVC or AV1 containers. A fresh `LibHeif` handle is
//! created per call, so the adapter itself carries no state.

use libheif_rs::{
    Channel, ColorSpace, CompressionFormat, EncoderQuality, HeifContext, Image, ImageHandle,
    LibHeif, RgbChroma,
};

use crate::container::ItemId;
use crate::pixel::{ImgVec, PixelData, Rgb, Rgba, copy_rows};
use crate::{
    CodecError, CodecParams, ColorModel, Compression, DecodeOutput, EncodeOutput, FormatTag,
    Limits, PixelBuffer,
};

use super::{CodecAdapter, check_input};

const FORMATS: &[FormatTag] = &[FormatTag::Heif, FormatTag::Heic, FormatTag::Avif];

/// Adapter for the HEIF container family.
#[derive(Clone, Copy, Debug, Default)]
pub struct HeifCodec;

impl CodecAdapter for HeifCodec {
    fn name(&self) -> &'static str {
        "libheif"
    }

    fn formats(&self) -> &'static [FormatTag] {
        FORMATS
    }

    fn decode(&self, data: &[u8], limits: &Limits) -> Result<DecodeOutput, CodecError> {
        let format = check_input(data, FORMATS)?;
        let ctx = HeifContext::read_from_bytes(data).map_err(|e| CodecError::from_codec(format, e))?;
        let handle = ctx
            .primary_image_handle()
            .map_err(|e| CodecError::from_codec(format, e))?;

        let pixels = decode_handle(&handle, format, ColorModel::Unspecified, limits)?;
        Ok(DecodeOutput { pixels, format })
    }

    fn encode(&self, pixels: &PixelBuffer, params: &CodecParams) -> Result<EncodeOutput, CodecError> {
        let (compression, format) = match params.compression {
            Compression::Av1 => (CompressionFormat::Av1, FormatTag::Avif),
            Compression::Hevc => (CompressionFormat::Hevc, FormatTag::Heic),
        };
        let codec_err = |e| CodecError::from_codec(format, e);

        let image = to_heif_image(pixels, format)?;

        let lib = LibHeif::new();
        let mut encoder = lib.encoder_for_format(compression).map_err(codec_err)?;
        let quality = if params.lossless {
            EncoderQuality::LossLess
        } else {
            EncoderQuality::Lossy(params.quality.get())
        };
        encoder.set_quality(quality).map_err(codec_err)?;

        let mut ctx = HeifContext::new().map_err(codec_err)?;
        ctx.encode_image(&image, &mut encoder, None).map_err(codec_err)?;
        let data = ctx.write_to_bytes().map_err(codec_err)?;

        log::debug!(
            "encoded {}x{} as {} ({} bytes, lossless: {})",
            pixels.width(),
            pixels.height(),
            format,
            data.len(),
            params.lossless
        );

        Ok(EncodeOutput { data, format })
    }

    fn decode_item(
        &self,
        data: &[u8],
        item: ItemId,
        color_model: ColorModel,
        limits: &Limits,
    ) -> Result<PixelBuffer, CodecError> {
        let format = check_input(data, FORMATS)?;
        let ctx = HeifContext::read_from_bytes(data).map_err(|e| CodecError::from_codec(format, e))?;
        let handle = ctx
            .image_handle(item)
            .map_err(|e| CodecError::from_codec(format, e))?;
        decode_handle(&handle, format, color_model, limits)
    }
}

fn decode_handle(
    handle: &ImageHandle,
    format: FormatTag,
    color_model: ColorModel,
    limits: &Limits,
) -> Result<PixelBuffer, CodecError> {
    let width = handle.width();
    let height = handle.height();
    limits.validate(width, height)?;

    let alpha = color_model.wants_alpha(handle.has_alpha_channel());
    let chroma = if alpha { RgbChroma::Rgba } else { RgbChroma::Rgb };

    let lib = LibHeif::new();
    let image = lib
        .decode(handle, ColorSpace::Rgb(chroma), None)
        .map_err(|e| CodecError::from_codec(format, e))?;

    let planes = image.planes();
    let plane = planes
        .interleaved
        .ok_or_else(|| CodecError::InvalidInput("decoded image has no interleaved plane".into()))?;

    let w = width as usize;
    let h = height as usize;
    let channels = if alpha { 4 } else { 3 };
    let bytes = copy_rows(plane.data, plane.stride, w * channels, h)?;

    let data = if alpha {
        let px: &[Rgba<u8>] = bytemuck::cast_slice(&bytes);
        PixelData::Rgba8(ImgVec::new(px.to_vec(), w, h))
    } else {
        let px: &[Rgb<u8>] = bytemuck::cast_slice(&bytes);
        PixelData::Rgb8(ImgVec::new(px.to_vec(), w, h))
    };
    PixelBuffer::new(data)
}

/// Copy a buffer into a libheif interleaved image, row by row.
fn to_heif_image(pixels: &PixelBuffer, format: FormatTag) -> Result<Image, CodecError> {
    let codec_err = |e| CodecError::from_codec(format, e);
    let width = pixels.width();
    let height = pixels.height();

    let (chroma, channels, bytes): (RgbChroma, usize, Vec<u8>) = match pixels.data() {
        PixelData::Rgba8(img) => {
            let (buf, _, _) = img.as_ref().to_contiguous_buf();
            (RgbChroma::Rgba, 4, bytemuck::cast_slice(buf.as_ref()).to_vec())
        }
        PixelData::Rgb8(img) => {
            let (buf, _, _) = img.as_ref().to_contiguous_buf();
            (RgbChroma::Rgb, 3, bytemuck::cast_slice(buf.as_ref()).to_vec())
        }
    };

    let mut image = Image::new(width, height, ColorSpace::Rgb(chroma)).map_err(codec_err)?;
    image
        .create_plane(Channel::Interleaved, width, height, 8)
        .map_err(codec_err)?;

    let row_bytes = width as usize * channels;
    let planes = image.planes_mut();
    let mut plane = planes
        .interleaved
        .ok_or_else(|| CodecError::InvalidInput("allocated image has no interleaved plane".into()))?;
    let stride = plane.stride;
    for (y, row) in bytes.chunks_exact(row_bytes).enumerate() {
        let start = y * stride;
        plane.data[start..start + row_bytes].copy_from_slice(row);
    }

    Ok(image)
}
