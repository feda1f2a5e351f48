//! Container inspection and primary-image extraction.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use crate::container::{Container, ItemId};
use crate::pipeline::{persist, require_path};
use crate::{
    CodecRegistry, ColorModel, ConversionError, EncodeRequest, FormatTag, Limits, OpenError, Rect,
};

/// Geometry of the primary image as declared by the container.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PrimaryImage {
    pub id: ItemId,
    pub width: u32,
    pub height: u32,
}

/// How far an inspection got.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InspectionState {
    /// Container opened and enumerated; nothing decoded.
    Inspected,
    /// Primary image decoded and written out.
    Decoded,
}

/// Result of [`Inspector::inspect_and_extract_primary`].
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub struct Inspection {
    pub source: PathBuf,
    pub format: FormatTag,
    /// Top-level image ids in container order. May be empty.
    pub image_ids: Vec<ItemId>,
    pub primary: Option<PrimaryImage>,
    /// Bounds of the decoded primary image.
    pub bounds: Option<Rect>,
    /// Where the decoded primary image was written.
    pub output: Option<PathBuf>,
}

impl Inspection {
    pub fn state(&self) -> InspectionState {
        if self.output.is_some() {
            InspectionState::Decoded
        } else {
            InspectionState::Inspected
        }
    }
}

/// Opens HEIF-family containers, lists their images and extracts the primary.
#[derive(Debug, Clone)]
pub struct Inspector<'a> {
    registry: &'a CodecRegistry,
    color_model: ColorModel,
    limits: Limits,
}

impl<'a> Inspector<'a> {
    pub fn new(registry: &'a CodecRegistry) -> Self {
        Self {
            registry,
            color_model: ColorModel::Unspecified,
            limits: Limits::none(),
        }
    }

    /// Color model requested from the decoder.
    pub fn with_color_model(mut self, color_model: ColorModel) -> Self {
        self.color_model = color_model;
        self
    }

    pub fn with_limits(mut self, limits: Limits) -> Self {
        self.limits = limits;
        self
    }

    /// Open and enumerate a container without decoding anything.
    pub fn inspect(&self, source: impl AsRef<Path>) -> Result<Inspection, ConversionError> {
        let source = source.as_ref();
        let container = open(source)?;
        self.describe(source, &container)
    }

    /// Open `source`, resolve its primary image, decode it and write it as
    /// PNG to `<stem>_lowlevel.png` next to the source.
    ///
    /// A container without images or without a primary item is not an error:
    /// the returned inspection stays in [`InspectionState::Inspected`].
    pub fn inspect_and_extract_primary(
        &self,
        source: impl AsRef<Path>,
    ) -> Result<Inspection, ConversionError> {
        let source = source.as_ref();
        let container = open(source)?;
        let mut inspection = self.describe(source, &container)?;

        log::info!(
            "{}: {} container with {} top-level image(s) {:?}",
            source.display(),
            inspection.format,
            inspection.image_ids.len(),
            inspection.image_ids
        );

        let Some(primary) = inspection.primary else {
            log::warn!("{}: no primary image, nothing to extract", source.display());
            return Ok(inspection);
        };

        let decode_err = |e| ConversionError::Decode {
            path: source.to_path_buf(),
            source: e,
        };
        let handle = container
            .image_handle(primary.id)
            .map_err(|e| decode_err(e.into()))?;
        let pixels = handle
            .decode(self.registry, self.color_model, &self.limits)
            .map_err(decode_err)?;

        let output = lowlevel_output_path(source);
        let encoded = EncodeRequest::new(FormatTag::Png)
            .with_registry(self.registry)
            .encode(&pixels)
            .map_err(|e| ConversionError::Encode {
                path: output.clone(),
                format: FormatTag::Png,
                source: e,
            })?;
        persist::write_file(&output, &encoded.data).map_err(|e| ConversionError::Write {
            path: output.clone(),
            source: e,
        })?;

        log::info!(
            "{}: primary image {} ({}x{}) written to {}",
            source.display(),
            primary.id,
            primary.width,
            primary.height,
            output.display()
        );

        inspection.bounds = Some(pixels.bounds());
        inspection.output = Some(output);
        Ok(inspection)
    }

    fn describe(
        &self,
        source: &Path,
        container: &Container,
    ) -> Result<Inspection, ConversionError> {
        let primary = match container.primary_image_id() {
            Some(id) => {
                let handle = container
                    .image_handle(id)
                    .map_err(|e| ConversionError::Decode {
                        path: source.to_path_buf(),
                        source: e.into(),
                    })?;
                Some(PrimaryImage {
                    id,
                    width: handle.width(),
                    height: handle.height(),
                })
            }
            None => None,
        };

        Ok(Inspection {
            source: source.to_path_buf(),
            format: container.format(),
            image_ids: container.top_level_image_ids().to_vec(),
            primary,
            bounds: None,
            output: None,
        })
    }
}

fn open(source: &Path) -> Result<Container, ConversionError> {
    require_path(source, "source")?;
    Container::open(source).map_err(|e: OpenError| ConversionError::Open {
        path: source.to_path_buf(),
        source: e,
    })
}

/// `<dir>/<stem>_lowlevel.png` for a source at `<dir>/<stem>.<ext>`.
pub fn lowlevel_output_path(source: &Path) -> PathBuf {
    let mut name = OsString::from(source.file_stem().unwrap_or(source.as_os_str()));
    name.push("_lowlevel.png");
    source.with_file_name(name)
}
