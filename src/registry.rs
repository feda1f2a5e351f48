//! Runtime codec registry mapping format tags to adapters.

use std::fmt;
use std::sync::Arc;

use crate::codecs::CodecAdapter;
use crate::{CodecError, FormatSet, FormatTag};

/// Runtime codec registry.
///
/// Holds the adapter for each [`FormatTag`] and which tags are enabled for
/// decoding and encoding. Compile-time features determine which built-in
/// adapters are *available*, [`with_adapter`](Self::with_adapter) adds
/// others, and the enable sets control which are *used* at runtime.
///
/// Built once and passed by reference; cloning shares the adapters.
#[derive(Clone)]
pub struct CodecRegistry {
    adapters: Vec<(FormatTag, Arc<dyn CodecAdapter>)>,
    decode_enabled: FormatSet,
    encode_enabled: FormatSet,
}

impl CodecRegistry {
    /// All compiled-in adapters registered and enabled.
    #[allow(unused_mut)]
    pub fn all() -> Self {
        let mut registry = Self::none();

        #[cfg(feature = "heif")]
        {
            registry = registry.with_adapter(crate::codecs::HeifCodec);
        }
        #[cfg(feature = "jpeg")]
        {
            registry = registry.with_adapter(crate::codecs::JpegCodec);
        }
        #[cfg(feature = "png")]
        {
            registry = registry.with_adapter(crate::codecs::PngCodec);
        }

        registry
    }

    /// Nothing registered. Caller must opt in.
    pub fn none() -> Self {
        Self {
            adapters: Vec::new(),
            decode_enabled: FormatSet::EMPTY,
            encode_enabled: FormatSet::EMPTY,
        }
    }

    /// Register `adapter` for every tag in its [`formats`](CodecAdapter::formats),
    /// replacing any adapter previously registered for those tags, and enable
    /// those tags for decoding and encoding.
    pub fn with_adapter(self, adapter: impl CodecAdapter + 'static) -> Self {
        self.with_shared_adapter(Arc::new(adapter))
    }

    /// [`with_adapter`](Self::with_adapter) for an already shared adapter.
    pub fn with_shared_adapter(mut self, adapter: Arc<dyn CodecAdapter>) -> Self {
        for &format in adapter.formats() {
            self.adapters.retain(|(f, _)| *f != format);
            self.adapters.push((format, Arc::clone(&adapter)));
            self.decode_enabled.insert(format);
            self.encode_enabled.insert(format);
        }
        self
    }

    /// Enable or disable decoding for a format.
    pub fn with_decode(mut self, format: FormatTag, enabled: bool) -> Self {
        if enabled {
            self.decode_enabled.insert(format);
        } else {
            self.decode_enabled.remove(format);
        }
        self
    }

    /// Enable or disable encoding for a format.
    pub fn with_encode(mut self, format: FormatTag, enabled: bool) -> Self {
        if enabled {
            self.encode_enabled.insert(format);
        } else {
            self.encode_enabled.remove(format);
        }
        self
    }

    /// The adapter registered for `format`, regardless of enablement.
    pub fn adapter(&self, format: FormatTag) -> Option<&Arc<dyn CodecAdapter>> {
        self.adapters
            .iter()
            .find(|(f, _)| *f == format)
            .map(|(_, adapter)| adapter)
    }

    /// The adapter to decode `format` with, if registered and enabled.
    pub(crate) fn decoder(&self, format: FormatTag) -> Result<&Arc<dyn CodecAdapter>, CodecError> {
        let adapter = self
            .adapter(format)
            .ok_or(CodecError::UnsupportedFormat(format))?;
        if !self.decode_enabled.contains(format) {
            return Err(CodecError::Disabled {
                format,
                direction: "decoding",
            });
        }
        Ok(adapter)
    }

    /// The adapter to encode `format` with, if registered and enabled.
    pub(crate) fn encoder(&self, format: FormatTag) -> Result<&Arc<dyn CodecAdapter>, CodecError> {
        let adapter = self
            .adapter(format)
            .ok_or(CodecError::UnsupportedFormat(format))?;
        if !self.encode_enabled.contains(format) {
            return Err(CodecError::Disabled {
                format,
                direction: "encoding",
            });
        }
        Ok(adapter)
    }

    /// Is an adapter registered AND enabled for decoding this format?
    pub fn can_decode(&self, format: FormatTag) -> bool {
        self.decode_enabled.contains(format) && self.adapter(format).is_some()
    }

    /// Is an adapter registered AND enabled for encoding this format?
    pub fn can_encode(&self, format: FormatTag) -> bool {
        self.encode_enabled.contains(format) && self.adapter(format).is_some()
    }

    /// Formats that are both registered and enabled for decoding.
    pub fn decodable_formats(&self) -> FormatSet {
        let mut set = FormatSet::EMPTY;
        for format in self.decode_enabled.iter().filter(|&f| self.can_decode(f)) {
            set.insert(format);
        }
        set
    }

    /// Formats that are both registered and enabled for encoding.
    pub fn encodable_formats(&self) -> FormatSet {
        let mut set = FormatSet::EMPTY;
        for format in self.encode_enabled.iter().filter(|&f| self.can_encode(f)) {
            set.insert(format);
        }
        set
    }
}

impl Default for CodecRegistry {
    fn default() -> Self {
        Self::all()
    }
}

impl fmt::Debug for CodecRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CodecRegistry")
            .field(
                "adapters",
                &self
                    .adapters
                    .iter()
                    .map(|(format, adapter)| (format.name(), adapter.name()))
                    .collect::<Vec<_>>(),
            )
            .field("decode_enabled", &self.decode_enabled)
            .field("encode_enabled", &self.encode_enabled)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{CodecParams, DecodeOutput, EncodeOutput, Limits, PixelBuffer};

    struct Named(&'static str, &'static [FormatTag]);

    impl CodecAdapter for Named {
        fn name(&self) -> &'static str {
            self.0
        }
        fn formats(&self) -> &'static [FormatTag] {
            self.1
        }
        fn decode(&self, _: &[u8], _: &Limits) -> Result<DecodeOutput, CodecError> {
            Err(CodecError::UnrecognizedFormat)
        }
        fn encode(&self, _: &PixelBuffer, _: &CodecParams) -> Result<EncodeOutput, CodecError> {
            Err(CodecError::UnrecognizedFormat)
        }
    }

    #[test]
    fn all_registry() {
        let registry = CodecRegistry::all();

        // All compiled formats should be enabled
        #[cfg(feature = "jpeg")]
        assert!(registry.can_decode(FormatTag::Jpeg));
        #[cfg(feature = "png")]
        assert!(registry.can_encode(FormatTag::Png));
        #[cfg(feature = "heif")]
        for format in FormatSet::CONTAINER_FAMILY.iter() {
            assert!(registry.decodable_formats().contains(format));
        }
        assert!(!registry.can_decode(FormatTag::Unknown));
    }

    #[test]
    fn none_registry() {
        let registry = CodecRegistry::none();

        // Nothing should be enabled
        assert!(!registry.can_decode(FormatTag::Jpeg));
        assert!(!registry.can_encode(FormatTag::Jpeg));
        assert!(registry.decodable_formats().is_empty());
    }

    #[test]
    fn lookup_distinguishes_missing_from_disabled() {
        let registry = CodecRegistry::none()
            .with_adapter(Named("heic", &[FormatTag::Heic]))
            .with_decode(FormatTag::Heic, false);

        assert!(matches!(
            registry.decoder(FormatTag::Heic),
            Err(CodecError::Disabled {
                format: FormatTag::Heic,
                direction: "decoding"
            })
        ));
        assert!(registry.encoder(FormatTag::Heic).is_ok());
        assert!(matches!(
            registry.decoder(FormatTag::Png),
            Err(CodecError::UnsupportedFormat(FormatTag::Png))
        ));

        let err = registry.decoder(FormatTag::Heic).err().map(|e| e.to_string());
        assert_eq!(err.as_deref(), Some("decoding of format heic is not enabled"));
    }

    #[test]
    fn later_registration_wins() {
        let registry = CodecRegistry::none()
            .with_adapter(Named("first", &[FormatTag::Heic, FormatTag::Heif]))
            .with_adapter(Named("second", &[FormatTag::Heic]));

        assert_eq!(registry.adapter(FormatTag::Heic).map(|a| a.name()), Some("second"));
        assert_eq!(registry.adapter(FormatTag::Heif).map(|a| a.name()), Some("first"));
        assert!(registry.adapter(FormatTag::Avif).is_none());
    }

    #[test]
    fn toggle_format() {
        let registry = CodecRegistry::none()
            .with_adapter(Named("raster", &[FormatTag::Jpeg, FormatTag::Png]))
            .with_decode(FormatTag::Jpeg, false)
            .with_encode(FormatTag::Png, false);

        assert!(!registry.can_decode(FormatTag::Jpeg));
        assert!(registry.can_encode(FormatTag::Jpeg));
        assert!(registry.can_decode(FormatTag::Png));
        assert!(!registry.can_encode(FormatTag::Png));
        // The adapter stays registered while disabled
        assert!(registry.adapter(FormatTag::Jpeg).is_some());
    }

    #[test]
    fn enabling_without_adapter_is_inert() {
        let registry = CodecRegistry::none().with_decode(FormatTag::Avif, true);
        assert!(!registry.can_decode(FormatTag::Avif));
    }
}
