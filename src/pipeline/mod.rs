//! File-to-file conversion pipeline: read -> decode -> gate -> encode -> write.
//!
//! [`Converter`] ties codec dispatch (through a [`CodecRegistry`]) to
//! storage. Each call reads its source fully, decodes to a [`PixelBuffer`],
//! encodes in memory and only then writes the destination, so a failure at
//! any stage leaves no destination file behind.
//!
//! # Example
//!
//! ```no_run
//! use heifconv::{CodecRegistry, Converter, RasterKind};
//!
//! let registry = CodecRegistry::all();
//! let converter = Converter::new(&registry);
//! let done = converter.to_raster(RasterKind::Jpeg, "photo.heic", "photo.jpg", Some(85))?;
//! println!("{} -> {} ({} bytes)", done.source_format, done.destination.display(), done.bytes_written);
//! # Ok::<(), heifconv::ConversionError>(())
//! ```
//!
//! [`PixelBuffer`]: crate::PixelBuffer

pub(crate) mod persist;

use std::fs;
use std::path::{Path, PathBuf};

use crate::{
    CodecParams, CodecRegistry, ConversionError, DecodeOutput, DecodeRequest, EncodeRequest,
    FormatSet, FormatTag, Limits, OpenError, Quality, ValidationError,
};

/// Raster target of [`Converter::to_raster`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RasterKind {
    Jpeg,
    Png,
}

impl RasterKind {
    pub fn format(self) -> FormatTag {
        match self {
            RasterKind::Jpeg => FormatTag::Jpeg,
            RasterKind::Png => FormatTag::Png,
        }
    }

    /// Preferred file extension, without the dot.
    pub fn extension(self) -> &'static str {
        match self {
            RasterKind::Jpeg => "jpg",
            RasterKind::Png => "png",
        }
    }
}

/// Summary of a completed conversion.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub struct Conversion {
    pub source: PathBuf,
    pub destination: PathBuf,
    /// Tag reported by the decoder.
    pub source_format: FormatTag,
    /// Tag of the written file.
    pub output_format: FormatTag,
    pub width: u32,
    pub height: u32,
    pub bytes_written: usize,
}

/// Conversion entry points bound to a registry and a policy.
///
/// Cheap to build; holds no mutable state, so one converter may serve calls
/// from several threads.
#[derive(Debug, Clone)]
pub struct Converter<'a> {
    registry: &'a CodecRegistry,
    limits: Limits,
    accepted_sources: FormatSet,
}

impl<'a> Converter<'a> {
    /// A converter accepting HEIF-family sources for raster output.
    pub fn new(registry: &'a CodecRegistry) -> Self {
        Self {
            registry,
            limits: Limits::none(),
            accepted_sources: FormatSet::CONTAINER_FAMILY,
        }
    }

    /// Set decode limits.
    pub fn with_limits(mut self, limits: Limits) -> Self {
        self.limits = limits;
        self
    }

    /// Source tags [`to_raster`](Self::to_raster) accepts. Defaults to
    /// [`FormatSet::CONTAINER_FAMILY`].
    pub fn with_accepted_sources(mut self, accepted: FormatSet) -> Self {
        self.accepted_sources = accepted;
        self
    }

    pub fn accepted_sources(&self) -> FormatSet {
        self.accepted_sources
    }

    /// Convert a HEIF-family file to JPEG or PNG.
    ///
    /// `quality` must be in `1..=100` for both targets (PNG then ignores it).
    /// JPEG uses [`Quality::DEFAULT_JPEG`] when `None`.
    pub fn to_raster(
        &self,
        kind: RasterKind,
        source: impl AsRef<Path>,
        destination: impl AsRef<Path>,
        quality: Option<i32>,
    ) -> Result<Conversion, ConversionError> {
        let source = source.as_ref();
        let destination = destination.as_ref();
        require_path(source, "source")?;
        require_path(destination, "destination")?;
        let quality = match quality {
            Some(q) => Quality::new(q)?,
            None => Quality::DEFAULT_JPEG,
        };

        let decoded = self.read_and_decode(source)?;
        if !self.accepted_sources.contains(decoded.format) {
            return Err(ConversionError::UnexpectedFormat {
                path: source.to_path_buf(),
                actual: decoded.format,
                expected: self.accepted_sources,
            });
        }

        self.encode_and_write(
            source,
            destination,
            &decoded,
            kind.format(),
            CodecParams::new(quality),
        )
    }

    /// Convert any decodable file into a lossless HEVC container.
    pub fn to_container(
        &self,
        source: impl AsRef<Path>,
        destination: impl AsRef<Path>,
    ) -> Result<Conversion, ConversionError> {
        let source = source.as_ref();
        let destination = destination.as_ref();
        require_path(source, "source")?;
        require_path(destination, "destination")?;

        let decoded = self.read_and_decode(source)?;
        self.encode_and_write(
            source,
            destination,
            &decoded,
            FormatTag::Heic,
            CodecParams::container_lossless(),
        )
    }

    fn read_and_decode(&self, source: &Path) -> Result<DecodeOutput, ConversionError> {
        let bytes = fs::read(source).map_err(|e| ConversionError::Open {
            path: source.to_path_buf(),
            source: OpenError::Io(e),
        })?;

        let decoded = DecodeRequest::new(&bytes)
            .with_registry(self.registry)
            .with_limits(&self.limits)
            .decode()
            .map_err(|e| ConversionError::Decode {
                path: source.to_path_buf(),
                source: e,
            })?;

        log::debug!(
            "decoded {} as {} ({}x{})",
            source.display(),
            decoded.format,
            decoded.width(),
            decoded.height()
        );
        Ok(decoded)
    }

    fn encode_and_write(
        &self,
        source: &Path,
        destination: &Path,
        decoded: &DecodeOutput,
        format: FormatTag,
        params: CodecParams,
    ) -> Result<Conversion, ConversionError> {
        let encoded = EncodeRequest::new(format)
            .with_params(params)
            .with_registry(self.registry)
            .encode(&decoded.pixels)
            .map_err(|e| ConversionError::Encode {
                path: destination.to_path_buf(),
                format,
                source: e,
            })?;

        persist::write_file(destination, &encoded.data).map_err(|e| ConversionError::Write {
            path: destination.to_path_buf(),
            source: e,
        })?;

        log::info!(
            "converted {} ({}) to {} ({})",
            source.display(),
            decoded.format,
            destination.display(),
            encoded.format
        );

        Ok(Conversion {
            source: source.to_path_buf(),
            destination: destination.to_path_buf(),
            source_format: decoded.format,
            output_format: encoded.format,
            width: decoded.width(),
            height: decoded.height(),
            bytes_written: encoded.data.len(),
        })
    }
}

/// Reject the empty path before any I/O.
pub(crate) fn require_path(path: &Path, role: &'static str) -> Result<(), ValidationError> {
    if path.as_os_str().is_empty() {
        Err(ValidationError::EmptyPath { role })
    } else {
        Ok(())
    }
}
