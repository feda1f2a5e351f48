//! Error types.
//!
//! Two layers: [`CodecError`] is what adapters and the container parser
//! return; [`ConversionError`] is what the public operations return, with the
//! path and stage attached.

use std::io;
use std::path::PathBuf;

use crate::container::ItemId;
use crate::format::{FormatSet, FormatTag};

/// Caller errors, detected before any I/O.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum ValidationError {
    /// A required path argument was the empty string.
    #[error("{role} path must not be empty")]
    EmptyPath { role: &'static str },
    /// Quality outside `1..=100`.
    #[error("quality should be between 1 and 100, got {0}")]
    QualityOutOfRange(i64),
}

/// Structural problems found while parsing an ISO-BMFF container.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum ContainerError {
    #[error("not an ISO-BMFF file (no leading ftyp box)")]
    NotIsoBmff,
    #[error("brand {:?} is not a HEIF-family brand", String::from_utf8_lossy(.0.as_slice()))]
    UnsupportedBrand([u8; 4]),
    #[error("truncated {0} box")]
    Truncated(&'static str),
    #[error("meta handler is not 'pict'")]
    NotAnImageContainer,
    #[error("unsupported {box_type} box version {version}")]
    UnsupportedVersion { box_type: &'static str, version: u8 },
    #[error("item id {0} is declared more than once")]
    DuplicateItem(ItemId),
    #[error("primary item {0} is not a top-level image")]
    PrimaryNotTopLevel(ItemId),
    #[error("container declares no primary image")]
    NoPrimaryImage,
    #[error("no top-level image with id {0}")]
    UnknownItem(ItemId),
    #[error("item {item} has no {property} property")]
    MissingProperty {
        item: ItemId,
        property: &'static str,
    },
}

/// Unified error type for codec operations.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum CodecError {
    /// Format not recognized from magic bytes.
    #[error("unrecognized image format")]
    UnrecognizedFormat,
    /// Format recognized but no adapter is registered for it.
    #[error("format {0} not supported (no codec registered)")]
    UnsupportedFormat(FormatTag),
    /// An adapter is registered but the registry has this direction turned off.
    #[error("{direction} of format {format} is not enabled")]
    Disabled {
        format: FormatTag,
        direction: &'static str,
    },
    /// Format doesn't support requested operation.
    #[error("format {format} does not support: {detail}")]
    UnsupportedOperation {
        format: FormatTag,
        detail: &'static str,
    },
    /// Input validation failed.
    #[error("invalid input: {0}")]
    InvalidInput(String),
    /// Resource limit exceeded.
    #[error("limit exceeded: {0}")]
    LimitExceeded(String),
    /// An adapter reported a tag it does not own, or no definite tag at all.
    #[error("{adapter} adapter reported format {reported}")]
    Misidentified {
        adapter: &'static str,
        reported: FormatTag,
    },
    /// Container structure error.
    #[error(transparent)]
    Container(#[from] ContainerError),
    /// Underlying codec error.
    #[error("codec error ({format}): {source}")]
    Codec {
        format: FormatTag,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl CodecError {
    /// Wrap a codec-specific error.
    pub fn from_codec<E>(format: FormatTag, error: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        CodecError::Codec {
            format,
            source: Box::new(error),
        }
    }
}

/// Why a source could not be opened.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum OpenError {
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Container(#[from] ContainerError),
}

/// Error returned by the public conversion and inspection operations.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum ConversionError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("could not open {}: {source}", .path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: OpenError,
    },
    #[error("could not decode {}: {source}", .path.display())]
    Decode {
        path: PathBuf,
        #[source]
        source: CodecError,
    },
    #[error("the image {} isn't in {expected} format, instead it is {actual}", .path.display())]
    UnexpectedFormat {
        path: PathBuf,
        actual: FormatTag,
        expected: FormatSet,
    },
    #[error("could not encode {} as {format}: {source}", .path.display())]
    Encode {
        path: PathBuf,
        format: FormatTag,
        #[source]
        source: CodecError,
    },
    #[error("could not write {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Flat discriminant of [`ConversionError`], for retry/report decisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Validation,
    Open,
    Decode,
    UnexpectedFormat,
    Encode,
    Write,
}

impl ConversionError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ConversionError::Validation(_) => ErrorKind::Validation,
            ConversionError::Open { .. } => ErrorKind::Open,
            ConversionError::Decode { .. } => ErrorKind::Decode,
            ConversionError::UnexpectedFormat { .. } => ErrorKind::UnexpectedFormat,
            ConversionError::Encode { .. } => ErrorKind::Encode,
            ConversionError::Write { .. } => ErrorKind::Write,
        }
    }
}
