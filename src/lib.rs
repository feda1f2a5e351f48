//! # heifconv
//!
//! Convert still images between the HEIF family (HEIF, HEIC, AVIF) and JPEG/PNG.
//!
//! Each codec is feature-gated and wrapped by a [`CodecAdapter`]; a
//! [`CodecRegistry`] maps format tags to adapters and is passed explicitly to
//! every operation. Enable only what you need:
//!
//! ```toml
//! [dependencies]
//! heifconv = { version = "0.1", default-features = false, features = ["heif", "png"] }
//! ```
//!
//! ## Usage
//!
//! ```rust,no_run
//! use heifconv::{CodecRegistry, Converter, Inspector, RasterKind};
//!
//! let registry = CodecRegistry::all();
//!
//! // HEIC to JPEG at quality 85
//! Converter::new(&registry).to_raster(RasterKind::Jpeg, "in.heic", "out.jpg", Some(85))?;
//!
//! // Anything decodable to a lossless HEIC container
//! Converter::new(&registry).to_container("in.png", "out.heic")?;
//!
//! // List top-level images and write the primary one to in_lowlevel.png
//! let inspection = Inspector::new(&registry).inspect_and_extract_primary("in.heic")?;
//! println!("{:?} primary={:?}", inspection.image_ids, inspection.primary);
//! # Ok::<(), heifconv::ConversionError>(())
//! ```
//!
//! The free functions [`to_raster`], [`to_container`] and
//! [`inspect_and_extract_primary`] do the same with [`CodecRegistry::all`]
//! and default options.

#![forbid(unsafe_code)]

pub mod codecs;
mod config;
pub mod container;
mod decode;
mod encode;
mod error;
mod format;
mod inspect;
mod limits;
pub mod pipeline;
pub mod pixel;
mod registry;

use std::path::Path;

pub use codecs::CodecAdapter;
pub use config::{CodecParams, Compression, Quality};
pub use container::{Container, ImageHandle, ItemId};
pub use decode::{DecodeOutput, DecodeRequest, classify};
pub use encode::{EncodeOutput, EncodeRequest};
pub use error::{
    CodecError, ContainerError, ConversionError, ErrorKind, OpenError, ValidationError,
};
pub use format::{FormatSet, FormatTag};
pub use inspect::{Inspection, InspectionState, Inspector, PrimaryImage, lowlevel_output_path};
pub use limits::Limits;
pub use pipeline::{Conversion, Converter, RasterKind};
pub use pixel::{ColorModel, PixelBuffer, PixelData, Rect};
pub use registry::CodecRegistry;

/// [`Converter::to_raster`] with all compiled-in codecs and HEIF-family sources.
pub fn to_raster(
    kind: RasterKind,
    source: impl AsRef<Path>,
    destination: impl AsRef<Path>,
    quality: Option<i32>,
) -> Result<Conversion, ConversionError> {
    let registry = CodecRegistry::all();
    Converter::new(&registry).to_raster(kind, source, destination, quality)
}

/// [`Converter::to_container`] with all compiled-in codecs.
pub fn to_container(
    source: impl AsRef<Path>,
    destination: impl AsRef<Path>,
) -> Result<Conversion, ConversionError> {
    let registry = CodecRegistry::all();
    Converter::new(&registry).to_container(source, destination)
}

/// [`Inspector::inspect_and_extract_primary`] with all compiled-in codecs.
pub fn inspect_and_extract_primary(
    source: impl AsRef<Path>,
) -> Result<Inspection, ConversionError> {
    let registry = CodecRegistry::all();
    Inspector::new(&registry).inspect_and_extract_primary(source)
}
