//! Canonical decoded image representation.
//!
//! Uses `imgref::ImgVec` for 2D pixel data with typed pixels from the `rgb` crate.
//! [`PixelBuffer`] is the only value that crosses from a decode adapter to an
//! encode adapter.

pub use imgref::{Img, ImgRef, ImgVec};
pub use rgb::{Rgb, Rgba};

use crate::CodecError;

/// Decoded pixel data in a typed buffer.
///
/// Width and height are embedded in the `ImgVec`.
#[derive(Clone, Debug, PartialEq, Eq)]
#[non_exhaustive]
pub enum PixelData {
    Rgb8(ImgVec<Rgb<u8>>),
    Rgba8(ImgVec<Rgba<u8>>),
}

impl PixelData {
    pub fn width(&self) -> u32 {
        match self {
            PixelData::Rgb8(img) => img.width() as u32,
            PixelData::Rgba8(img) => img.width() as u32,
        }
    }

    pub fn height(&self) -> u32 {
        match self {
            PixelData::Rgb8(img) => img.height() as u32,
            PixelData::Rgba8(img) => img.height() as u32,
        }
    }

    pub fn has_alpha(&self) -> bool {
        matches!(self, PixelData::Rgba8(_))
    }

    /// Copy to RGBA8, filling alpha with 255 for RGB sources.
    pub fn to_rgba8(&self) -> ImgVec<Rgba<u8>> {
        match self {
            PixelData::Rgba8(img) => img.clone(),
            PixelData::Rgb8(img) => {
                let buf = img.as_ref().pixels().map(opaque).collect();
                ImgVec::new(buf, img.width(), img.height())
            }
        }
    }

    /// Convert to RGBA8. Avoids a clone when the data is already Rgba8.
    pub fn into_rgba8(self) -> ImgVec<Rgba<u8>> {
        match self {
            PixelData::Rgba8(img) => img,
            other => other.to_rgba8(),
        }
    }

    /// Copy to RGB8, discarding alpha.
    pub fn to_rgb8(&self) -> ImgVec<Rgb<u8>> {
        match self {
            PixelData::Rgb8(img) => img.clone(),
            PixelData::Rgba8(img) => {
                let buf = img
                    .as_ref()
                    .pixels()
                    .map(|p| Rgb { r: p.r, g: p.g, b: p.b })
                    .collect();
                ImgVec::new(buf, img.width(), img.height())
            }
        }
    }
}

/// Axis-aligned rectangle. The origin is not necessarily `(0, 0)`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl Rect {
    /// Whether the absolute point `(x, y)` lies inside the rectangle.
    pub fn contains(&self, x: i32, y: i32) -> bool {
        let dx = i64::from(x) - i64::from(self.x);
        let dy = i64::from(y) - i64::from(self.y);
        dx >= 0 && dy >= 0 && dx < i64::from(self.width) && dy < i64::from(self.height)
    }
}

/// A decoded image: pixels plus the rectangle they occupy.
///
/// Invariant: width and height are both non-zero.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PixelBuffer {
    origin: (i32, i32),
    data: PixelData,
}

impl PixelBuffer {
    /// Wrap decoded pixels with the origin at `(0, 0)`.
    pub fn new(data: PixelData) -> Result<Self, CodecError> {
        Self::with_origin(data, 0, 0)
    }

    pub fn with_origin(data: PixelData, x: i32, y: i32) -> Result<Self, CodecError> {
        if data.width() == 0 || data.height() == 0 {
            return Err(CodecError::InvalidInput(format!(
                "empty image ({}x{})",
                data.width(),
                data.height()
            )));
        }
        Ok(Self {
            origin: (x, y),
            data,
        })
    }

    pub fn from_rgba8(img: ImgVec<Rgba<u8>>) -> Result<Self, CodecError> {
        Self::new(PixelData::Rgba8(img))
    }

    pub fn from_rgb8(img: ImgVec<Rgb<u8>>) -> Result<Self, CodecError> {
        Self::new(PixelData::Rgb8(img))
    }

    pub fn width(&self) -> u32 {
        self.data.width()
    }

    pub fn height(&self) -> u32 {
        self.data.height()
    }

    pub fn bounds(&self) -> Rect {
        Rect {
            x: self.origin.0,
            y: self.origin.1,
            width: self.width(),
            height: self.height(),
        }
    }

    pub fn has_alpha(&self) -> bool {
        self.data.has_alpha()
    }

    pub fn data(&self) -> &PixelData {
        &self.data
    }

    pub fn into_data(self) -> PixelData {
        self.data
    }

    /// Pixel at absolute coordinates `(x, y)`, or `None` outside [`bounds`](Self::bounds).
    pub fn pixel(&self, x: i32, y: i32) -> Option<Rgba<u8>> {
        if !self.bounds().contains(x, y) {
            return None;
        }
        let col = (i64::from(x) - i64::from(self.origin.0)) as usize;
        let row = (i64::from(y) - i64::from(self.origin.1)) as usize;
        match &self.data {
            PixelData::Rgba8(img) => Some(img[(col, row)]),
            PixelData::Rgb8(img) => Some(opaque(img[(col, row)])),
        }
    }

    pub fn to_rgba8(&self) -> ImgVec<Rgba<u8>> {
        self.data.to_rgba8()
    }

    pub fn to_rgb8(&self) -> ImgVec<Rgb<u8>> {
        self.data.to_rgb8()
    }

    pub fn into_rgba8(self) -> ImgVec<Rgba<u8>> {
        self.data.into_rgba8()
    }
}

fn opaque(p: Rgb<u8>) -> Rgba<u8> {
    Rgba {
        r: p.r,
        g: p.g,
        b: p.b,
        a: 255,
    }
}

/// Color model requested from a container decoder.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum ColorModel {
    /// Let the adapter choose: RGBA when the image carries alpha, RGB otherwise.
    #[default]
    Unspecified,
    Rgb,
    Rgba,
}

impl ColorModel {
    /// Resolve against whether the source image has an alpha plane.
    pub fn wants_alpha(self, source_has_alpha: bool) -> bool {
        match self {
            ColorModel::Unspecified => source_has_alpha,
            ColorModel::Rgb => false,
            ColorModel::Rgba => true,
        }
    }
}

/// Copy `height` rows of `row_bytes` bytes out of a strided plane.
#[cfg(feature = "heif")]
pub(crate) fn copy_rows(
    data: &[u8],
    stride: usize,
    row_bytes: usize,
    height: usize,
) -> Result<Vec<u8>, CodecError> {
    let needed = stride
        .checked_mul(height.saturating_sub(1))
        .and_then(|n| n.checked_add(row_bytes));
    match needed {
        Some(n) if stride >= row_bytes && n <= data.len() => {}
        _ => {
            return Err(CodecError::InvalidInput(format!(
                "plane too small: {} bytes for {height} rows of {row_bytes} (stride {stride})",
                data.len()
            )));
        }
    }

    let mut out = Vec::with_capacity(row_bytes * height);
    for y in 0..height {
        let start = y * stride;
        out.extend_from_slice(&data[start..start + row_bytes]);
    }
    Ok(out)
}
