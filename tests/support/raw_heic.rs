//! A lossless stand-in for the HEVC container codec.
//!
//! Writes real ISO-BMFF (`ftyp heic`, `meta`, `mdat`) with uncompressed
//! samples, so the pipeline and the inspector can run end to end without
//! libheif.

use heifconv::pixel::{ImgVec, Rgb, Rgba};
use heifconv::{
    CodecAdapter, CodecError, CodecParams, ColorModel, Container, DecodeOutput, EncodeOutput,
    FormatTag, ItemId, Limits, PixelBuffer, PixelData,
};

use super::bmff::{ContainerBuilder, ItemSpec, top_level_boxes};

#[derive(Clone, Copy, Debug, Default)]
pub struct RawHeicCodec;

impl CodecAdapter for RawHeicCodec {
    fn name(&self) -> &'static str {
        "raw-heic"
    }

    fn formats(&self) -> &'static [FormatTag] {
        &[FormatTag::Heic]
    }

    fn decode(&self, data: &[u8], limits: &Limits) -> Result<DecodeOutput, CodecError> {
        let container = parse(data)?;
        let primary = container
            .primary_image_id()
            .ok_or_else(|| CodecError::InvalidInput("no primary image".into()))?;
        let pixels = self.decode_item(data, primary, ColorModel::Unspecified, limits)?;
        Ok(DecodeOutput {
            pixels,
            format: FormatTag::Heic,
        })
    }

    fn encode(&self, pixels: &PixelBuffer, _params: &CodecParams) -> Result<EncodeOutput, CodecError> {
        let data = ContainerBuilder::new(b"heic")
            .item(ItemSpec::image(1, pixels.clone()))
            .primary(1)
            .build();
        Ok(EncodeOutput {
            data,
            format: FormatTag::Heic,
        })
    }

    fn decode_item(
        &self,
        data: &[u8],
        item: ItemId,
        color_model: ColorModel,
        limits: &Limits,
    ) -> Result<PixelBuffer, CodecError> {
        parse(data)?;
        let mdat = top_level_boxes(data)
            .into_iter()
            .find(|(box_type, _)| box_type == b"mdat")
            .map(|(_, content)| content)
            .ok_or_else(|| CodecError::InvalidInput("no mdat box".into()))?;

        let (channels, width, height, samples) = find_record(mdat, item)
            .ok_or_else(|| CodecError::InvalidInput(format!("no payload for item {item}")))?;
        limits
            .check_dimensions(u64::from(width), u64::from(height))
            .map_err(|msg| CodecError::LimitExceeded(msg.into()))?;

        let (w, h) = (width as usize, height as usize);
        let data = if channels == 4 {
            let px = samples
                .chunks_exact(4)
                .map(|c| Rgba {
                    r: c[0],
                    g: c[1],
                    b: c[2],
                    a: c[3],
                })
                .collect();
            PixelData::Rgba8(ImgVec::new(px, w, h))
        } else {
            let px = samples
                .chunks_exact(3)
                .map(|c| Rgb {
                    r: c[0],
                    g: c[1],
                    b: c[2],
                })
                .collect();
            PixelData::Rgb8(ImgVec::new(px, w, h))
        };

        let data = if color_model.wants_alpha(channels == 4) {
            PixelData::Rgba8(data.into_rgba8())
        } else {
            PixelData::Rgb8(data.to_rgb8())
        };
        PixelBuffer::new(data)
    }
}

fn parse(data: &[u8]) -> Result<Container, CodecError> {
    if data.is_empty() {
        return Err(CodecError::InvalidInput("empty input".into()));
    }
    if FormatTag::detect(data) != FormatTag::Heic {
        return Err(CodecError::UnrecognizedFormat);
    }
    Ok(Container::from_bytes(data.to_vec())?)
}

fn find_record(mut mdat: &[u8], item: ItemId) -> Option<(u8, u32, u32, &[u8])> {
    let be = |b: &[u8]| u32::from_be_bytes([b[0], b[1], b[2], b[3]]);
    while mdat.len() >= 13 {
        let id = be(&mdat[0..4]);
        let channels = mdat[4];
        let width = be(&mdat[5..9]);
        let height = be(&mdat[9..13]);
        let len = width as usize * height as usize * usize::from(channels);
        let samples = mdat.get(13..13 + len)?;
        if id == item {
            return Some((channels, width, height, samples));
        }
        mdat = &mdat[13 + len..];
    }
    None
}
