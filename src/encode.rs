//! Image encoding.

use crate::{CodecError, CodecParams, CodecRegistry, Compression, FormatTag, PixelBuffer, Quality};

/// Encoded image output.
#[derive(Clone, Debug)]
pub struct EncodeOutput {
    /// Encoded image data.
    pub data: Vec<u8>,
    /// Format actually produced (`heic` or `avif` for container encodes).
    pub format: FormatTag,
}

/// Image encode request builder.
///
/// # Example
///
/// ```no_run
/// use heifconv::{EncodeRequest, FormatTag, PixelBuffer, Quality};
/// use heifconv::pixel::{ImgVec, Rgb};
///
/// let pixels = ImgVec::new(vec![Rgb { r: 0u8, g: 0, b: 0 }; 100 * 100], 100, 100);
/// let buffer = PixelBuffer::from_rgb8(pixels)?;
/// let output = EncodeRequest::new(FormatTag::Jpeg)
///     .with_quality(Quality::new(85)?)
///     .encode(&buffer)?;
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub struct EncodeRequest<'a> {
    format: FormatTag,
    params: CodecParams,
    registry: Option<&'a CodecRegistry>,
}

impl<'a> EncodeRequest<'a> {
    /// Encode to a specific format.
    ///
    /// `avif` selects AV1 compression; `heif` and `heic` select HEVC.
    pub fn new(format: FormatTag) -> Self {
        let compression = match format {
            FormatTag::Avif => Compression::Av1,
            _ => Compression::Hevc,
        };
        Self {
            format,
            params: CodecParams::default().with_compression(compression),
            registry: None,
        }
    }

    /// Replace all parameters at once.
    pub fn with_params(mut self, params: CodecParams) -> Self {
        self.params = params;
        self
    }

    pub fn with_quality(mut self, quality: Quality) -> Self {
        self.params.quality = quality;
        self
    }

    /// Request lossless encoding.
    pub fn with_lossless(mut self, lossless: bool) -> Self {
        self.params.lossless = lossless;
        self
    }

    /// Set a codec registry to control which formats are enabled.
    pub fn with_registry(mut self, registry: &'a CodecRegistry) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Encode a pixel buffer.
    pub fn encode(self, pixels: &PixelBuffer) -> Result<EncodeOutput, CodecError> {
        let default_registry;
        let registry = match self.registry {
            Some(r) => r,
            None => {
                default_registry = CodecRegistry::all();
                &default_registry
            }
        };

        let adapter = registry.encoder(self.format)?;

        log::debug!(
            "encoding {}x{} as {} with {} (quality {}, lossless {})",
            pixels.width(),
            pixels.height(),
            self.format,
            adapter.name(),
            self.params.quality.get(),
            self.params.lossless
        );
        adapter.encode(pixels, &self.params)
    }
}
