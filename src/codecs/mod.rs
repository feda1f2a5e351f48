//! Codec adapters for format-specific implementations.
//!
//! Each module provides a thin adapter between heifconv's unified API and
//! the format-specific codec crate. Adapters are stateless, never touch
//! storage and are looked up through a [`CodecRegistry`](crate::CodecRegistry).

use crate::container::ItemId;
use crate::{CodecError, CodecParams, ColorModel, DecodeOutput, EncodeOutput, FormatTag, Limits, PixelBuffer};

#[cfg(feature = "heif")]
pub(crate) mod heif;

#[cfg(feature = "jpeg")]
pub(crate) mod jpeg;

#[cfg(feature = "png")]
pub(crate) mod png;

#[cfg(feature = "heif")]
pub use heif::HeifCodec;
#[cfg(feature = "jpeg")]
pub use jpeg::JpegCodec;
#[cfg(feature = "png")]
pub use png::PngCodec;

/// Uniform decode/encode interface over one codec family.
///
/// Implementations must be `Send + Sync` so one registry can serve parallel
/// conversions.
pub trait CodecAdapter: Send + Sync {
    /// Short name used in logs and errors.
    fn name(&self) -> &'static str;

    /// Tags this adapter decodes and is registered under.
    fn formats(&self) -> &'static [FormatTag];

    /// Decode a complete encoded image.
    ///
    /// The returned [`DecodeOutput::format`] must be one of
    /// [`formats`](Self::formats).
    fn decode(&self, data: &[u8], limits: &Limits) -> Result<DecodeOutput, CodecError>;

    /// Encode pixels with the given parameters.
    fn encode(&self, pixels: &PixelBuffer, params: &CodecParams) -> Result<EncodeOutput, CodecError>;

    /// Decode one item of a multi-image container.
    fn decode_item(
        &self,
        data: &[u8],
        item: ItemId,
        color_model: ColorModel,
        limits: &Limits,
    ) -> Result<PixelBuffer, CodecError> {
        let _ = (data, item, color_model, limits);
        Err(CodecError::UnsupportedOperation {
            format: self.formats().first().copied().unwrap_or(FormatTag::Unknown),
            detail: "item decode",
        })
    }
}

/// Reject empty input and input whose magic doesn't belong to `formats`.
pub(crate) fn check_input(data: &[u8], formats: &[FormatTag]) -> Result<FormatTag, CodecError> {
    if data.is_empty() {
        return Err(CodecError::InvalidInput("empty input".into()));
    }
    let detected = FormatTag::detect(data);
    if formats.contains(&detected) {
        Ok(detected)
    } else {
        Err(CodecError::UnrecognizedFormat)
    }
}
