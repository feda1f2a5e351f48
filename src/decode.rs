//! Image decoding.

use crate::{CodecError, CodecRegistry, FormatTag, Limits, PixelBuffer};

/// Decoded image output.
#[derive(Clone, Debug)]
pub struct DecodeOutput {
    /// Decoded pixels.
    pub pixels: PixelBuffer,
    /// Format reported by the adapter that decoded the image.
    pub format: FormatTag,
}

impl DecodeOutput {
    /// Image width in pixels (convenience accessor).
    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    /// Image height in pixels (convenience accessor).
    pub fn height(&self) -> u32 {
        self.pixels.height()
    }
}

/// Image decode request builder.
///
/// # Example
///
/// ```no_run
/// use heifconv::DecodeRequest;
///
/// let data: &[u8] = &[]; // your image bytes
/// let output = DecodeRequest::new(data).decode()?;
/// println!("{} {}x{}", output.format, output.width(), output.height());
/// # Ok::<(), heifconv::CodecError>(())
/// ```
pub struct DecodeRequest<'a> {
    data: &'a [u8],
    format: Option<FormatTag>,
    limits: Option<&'a Limits>,
    registry: Option<&'a CodecRegistry>,
}

impl<'a> DecodeRequest<'a> {
    /// Create a new decode request.
    ///
    /// The adapter is picked from magic bytes unless
    /// [`with_format`](Self::with_format) overrides it.
    pub fn new(data: &'a [u8]) -> Self {
        Self {
            data,
            format: None,
            limits: None,
            registry: None,
        }
    }

    /// Override format auto-detection.
    pub fn with_format(mut self, format: FormatTag) -> Self {
        self.format = Some(format);
        self
    }

    /// Set resource limits.
    pub fn with_limits(mut self, limits: &'a Limits) -> Self {
        self.limits = Some(limits);
        self
    }

    /// Set a codec registry to control which formats are enabled.
    pub fn with_registry(mut self, registry: &'a CodecRegistry) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Decode the image to pixels.
    ///
    /// The returned format is always definite and owned by the adapter that
    /// produced it; see [`CodecError::Misidentified`].
    pub fn decode(self) -> Result<DecodeOutput, CodecError> {
        let default_registry;
        let registry = match self.registry {
            Some(r) => r,
            None => {
                default_registry = CodecRegistry::all();
                &default_registry
            }
        };
        let no_limits = Limits::none();
        let limits = self.limits.unwrap_or(&no_limits);

        if self.data.is_empty() {
            return Err(CodecError::InvalidInput("empty input".into()));
        }

        let format = match self.format {
            Some(f) => f,
            None => match FormatTag::detect(self.data) {
                FormatTag::Unknown => return Err(CodecError::UnrecognizedFormat),
                f => f,
            },
        };

        let adapter = registry.decoder(format)?;

        log::debug!("decoding {} input ({} bytes) with {}", format, self.data.len(), adapter.name());
        let output = adapter.decode(self.data, limits)?;

        if output.format == FormatTag::Unknown || !adapter.formats().contains(&output.format) {
            return Err(CodecError::Misidentified {
                adapter: adapter.name(),
                reported: output.format,
            });
        }

        Ok(output)
    }
}

/// Identify an encoded image by decoding it.
///
/// Magic bytes only pick the adapter; the returned tag is the one the adapter
/// reports after a successful decode, so undecodable input is an error rather
/// than a guess.
pub fn classify(data: &[u8], registry: &CodecRegistry) -> Result<FormatTag, CodecError> {
    DecodeRequest::new(data)
        .with_registry(registry)
        .decode()
        .map(|output| output.format)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codecs::CodecAdapter;
    use crate::{CodecParams, EncodeOutput};

    #[test]
    fn builder_pattern() {
        let data = b"test";
        let request = DecodeRequest::new(data).with_format(FormatTag::Jpeg);
        assert_eq!(request.format, Some(FormatTag::Jpeg));
    }

    #[test]
    fn disabled_format_error() {
        let jpeg_data = [0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10];
        let registry = CodecRegistry::none();

        let result = DecodeRequest::new(&jpeg_data)
            .with_registry(&registry)
            .decode();

        assert!(matches!(
            result,
            Err(CodecError::UnsupportedFormat(FormatTag::Jpeg))
        ));
    }

    #[test]
    fn unknown_and_empty_input() {
        let registry = CodecRegistry::all();
        assert!(matches!(
            classify(b"plain text, not an image", &registry),
            Err(CodecError::UnrecognizedFormat)
        ));
        assert!(matches!(
            classify(&[], &registry),
            Err(CodecError::InvalidInput(_))
        ));
    }

    /// Decodes anything PNG-shaped but claims a tag it does not own.
    struct Liar(FormatTag);

    impl CodecAdapter for Liar {
        fn name(&self) -> &'static str {
            "liar"
        }
        fn formats(&self) -> &'static [FormatTag] {
            &[FormatTag::Png]
        }
        fn decode(&self, _: &[u8], _: &Limits) -> Result<DecodeOutput, CodecError> {
            let img = crate::pixel::ImgVec::new(vec![crate::pixel::Rgb { r: 0, g: 0, b: 0 }], 1, 1);
            Ok(DecodeOutput {
                pixels: PixelBuffer::from_rgb8(img)?,
                format: self.0,
            })
        }
        fn encode(&self, _: &PixelBuffer, _: &CodecParams) -> Result<EncodeOutput, CodecError> {
            Err(CodecError::UnrecognizedFormat)
        }
    }

    #[test]
    fn adapter_must_report_a_tag_it_owns() {
        let png = b"\x89PNG\r\n\x1a\n\0\0\0\0";
        for reported in [FormatTag::Unknown, FormatTag::Heic] {
            let registry = CodecRegistry::none().with_adapter(Liar(reported));
            assert!(matches!(
                classify(png, &registry),
                Err(CodecError::Misidentified { adapter: "liar", reported: r }) if r == reported
            ));
        }

        let registry = CodecRegistry::none().with_adapter(Liar(FormatTag::Png));
        assert_eq!(classify(png, &registry).unwrap(), FormatTag::Png);
    }
}
