//! Encode-time codec parameters.
//!
//! [`CodecParams`] is the single value every encode adapter receives. Quality
//! is range-checked when the [`Quality`] is built, so an out-of-range value is
//! a caller error and never reaches a codec.

use crate::ValidationError;

/// Encoder quality in `1..=100`, higher is better fidelity.
///
/// The mapping onto a codec's native scale is adapter-specific.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Quality(u8);

impl Quality {
    pub const MIN: Quality = Quality(1);
    pub const MAX: Quality = Quality(100);

    /// Default JPEG quality when the caller gives none.
    pub const DEFAULT_JPEG: Quality = Quality(90);

    /// Validate a caller-supplied quality.
    pub fn new(value: impl Into<i64>) -> Result<Self, ValidationError> {
        let value = value.into();
        if (1..=100).contains(&value) {
            Ok(Quality(value as u8))
        } else {
            Err(ValidationError::QualityOutOfRange(value))
        }
    }

    pub fn get(self) -> u8 {
        self.0
    }
}

impl Default for Quality {
    fn default() -> Self {
        Quality::DEFAULT_JPEG
    }
}

/// Compression used inside a HEIF-family container.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum Compression {
    /// HEVC, producing `.heic`.
    #[default]
    Hevc,
    /// AV1, producing `.avif`.
    Av1,
}

/// Encode-time configuration.
///
/// `lossless` and `compression` only apply to HEIF-family encoders; the JPEG
/// adapter rejects `lossless = true` and the PNG adapter ignores quality.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct CodecParams {
    pub quality: Quality,
    pub lossless: bool,
    pub compression: Compression,
}

impl CodecParams {
    pub fn new(quality: Quality) -> Self {
        Self {
            quality,
            ..Self::default()
        }
    }

    /// The fixed parameter set used when converting into a container:
    /// quality 100, lossless, HEVC.
    pub fn container_lossless() -> Self {
        Self {
            quality: Quality::MAX,
            lossless: true,
            compression: Compression::Hevc,
        }
    }

    pub fn with_lossless(mut self, lossless: bool) -> Self {
        self.lossless = lossless;
        self
    }

    pub fn with_compression(mut self, compression: Compression) -> Self {
        self.compression = compression;
        self
    }
}
