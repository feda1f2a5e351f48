//! Image format classification and magic-byte detection.

use core::fmt;

/// Classification of an encoded image.
///
/// `Unknown` is only produced by [`FormatTag::detect`] for bytes that match no
/// known signature. A successful decode always yields one of the other
/// variants.
#[non_exhaustive]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FormatTag {
    Jpeg,
    Png,
    Heif,
    Heic,
    Avif,
    Unknown,
}

/// ISO-BMFF brands that identify an HEVC-coded HEIF file.
const HEIC_BRANDS: [&[u8; 4]; 6] = [b"heic", b"heix", b"heim", b"heis", b"hevc", b"hevx"];
/// ISO-BMFF brands that identify an AV1-coded HEIF file.
const AVIF_BRANDS: [&[u8; 4]; 2] = [b"avif", b"avis"];
/// Generic HEIF structural brands (codec not implied).
const HEIF_BRANDS: [&[u8; 4]; 3] = [b"mif1", b"msf1", b"miaf"];

impl FormatTag {
    /// Detect format from magic bytes. Returns `Unknown` if unrecognized.
    ///
    /// This picks the adapter to decode with; it is not the public sniffer.
    /// See [`classify`](crate::classify).
    pub fn detect(data: &[u8]) -> Self {
        // JPEG: FF D8 FF
        if data.len() >= 3 && data[0] == 0xFF && data[1] == 0xD8 && data[2] == 0xFF {
            return FormatTag::Jpeg;
        }

        // PNG: 89 50 4E 47 0D 0A 1A 0A
        if data.len() >= 8 && data[..8] == [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A] {
            return FormatTag::Png;
        }

        // ISO-BMFF: size + "ftyp" + major brand + minor version + compatible brands
        if data.len() >= 12 && &data[4..8] == b"ftyp" {
            return Self::from_ftyp(data).unwrap_or(FormatTag::Unknown);
        }

        FormatTag::Unknown
    }

    /// Classify the `ftyp` box at the start of `data`.
    ///
    /// The major brand wins; compatible brands are consulted in file order
    /// only when the major brand is not a HEIF-family brand.
    pub(crate) fn from_ftyp(data: &[u8]) -> Option<Self> {
        if data.len() < 12 || &data[4..8] != b"ftyp" {
            return None;
        }
        let size = u32::from_be_bytes([data[0], data[1], data[2], data[3]]) as usize;
        let end = size.clamp(12, data.len());

        let major = brand_at(data, 8)?;
        if let Some(tag) = Self::from_brand(major) {
            return Some(tag);
        }

        // Skip the 4-byte minor version
        let mut pos = 16;
        let mut generic = None;
        while pos + 4 <= end {
            let brand = brand_at(data, pos)?;
            match Self::from_brand(brand) {
                Some(FormatTag::Heif) => generic = generic.or(Some(FormatTag::Heif)),
                Some(tag) => return Some(tag),
                None => {}
            }
            pos += 4;
        }
        generic
    }

    fn from_brand(brand: &[u8; 4]) -> Option<Self> {
        if HEIC_BRANDS.contains(&brand) {
            Some(FormatTag::Heic)
        } else if AVIF_BRANDS.contains(&brand) {
            Some(FormatTag::Avif)
        } else if HEIF_BRANDS.contains(&brand) {
            Some(FormatTag::Heif)
        } else {
            None
        }
    }

    /// Detect format from file extension (case-insensitive).
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "jpg" | "jpeg" | "jpe" | "jfif" => Some(FormatTag::Jpeg),
            "png" => Some(FormatTag::Png),
            "heif" | "hif" => Some(FormatTag::Heif),
            "heic" => Some(FormatTag::Heic),
            "avif" => Some(FormatTag::Avif),
            _ => None,
        }
    }

    /// Lowercase name, as used in logs and error messages.
    pub fn name(self) -> &'static str {
        match self {
            FormatTag::Jpeg => "jpeg",
            FormatTag::Png => "png",
            FormatTag::Heif => "heif",
            FormatTag::Heic => "heic",
            FormatTag::Avif => "avif",
            FormatTag::Unknown => "unknown",
        }
    }

    /// MIME type string.
    pub fn mime_type(self) -> &'static str {
        match self {
            FormatTag::Jpeg => "image/jpeg",
            FormatTag::Png => "image/png",
            FormatTag::Heif => "image/heif",
            FormatTag::Heic => "image/heic",
            FormatTag::Avif => "image/avif",
            FormatTag::Unknown => "application/octet-stream",
        }
    }

    /// Common file extensions. The first entry is the one used for output.
    pub fn extensions(self) -> &'static [&'static str] {
        match self {
            FormatTag::Jpeg => &["jpg", "jpeg", "jpe", "jfif"],
            FormatTag::Png => &["png"],
            FormatTag::Heif => &["heif", "hif"],
            FormatTag::Heic => &["heic"],
            FormatTag::Avif => &["avif"],
            FormatTag::Unknown => &[],
        }
    }

    /// Whether this is an ISO-BMFF based HEIF-family format.
    pub fn is_container_family(self) -> bool {
        matches!(self, FormatTag::Heif | FormatTag::Heic | FormatTag::Avif)
    }
}

impl fmt::Display for FormatTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

fn brand_at(data: &[u8], pos: usize) -> Option<&[u8; 4]> {
    data.get(pos..pos + 4)?.try_into().ok()
}

/// Set of format tags represented as bitflags.
///
/// Used for the accepted-source policy of the conversion pipeline, so the set
/// of HEIF-family tags a raster conversion accepts is configuration rather
/// than a literal in the code.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct FormatSet(u8);

impl FormatSet {
    pub const EMPTY: Self = FormatSet(0);
    const JPEG: u8 = 1 << 0;
    const PNG: u8 = 1 << 1;
    const HEIF: u8 = 1 << 2;
    const HEIC: u8 = 1 << 3;
    const AVIF: u8 = 1 << 4;

    /// `{heif, heic, avif}`.
    pub const CONTAINER_FAMILY: Self = FormatSet(Self::HEIF | Self::HEIC | Self::AVIF);
    /// `{jpeg, png}`.
    pub const RASTER: Self = FormatSet(Self::JPEG | Self::PNG);

    fn bit(format: FormatTag) -> u8 {
        match format {
            FormatTag::Jpeg => Self::JPEG,
            FormatTag::Png => Self::PNG,
            FormatTag::Heif => Self::HEIF,
            FormatTag::Heic => Self::HEIC,
            FormatTag::Avif => Self::AVIF,
            FormatTag::Unknown => 0,
        }
    }

    /// Build a set from a slice of tags. `Unknown` is ignored.
    pub fn from_formats(formats: &[FormatTag]) -> Self {
        let mut set = Self::EMPTY;
        for &f in formats {
            set.insert(f);
        }
        set
    }

    pub fn contains(self, format: FormatTag) -> bool {
        let bit = Self::bit(format);
        bit != 0 && (self.0 & bit) != 0
    }

    pub fn insert(&mut self, format: FormatTag) {
        self.0 |= Self::bit(format);
    }

    pub fn remove(&mut self, format: FormatTag) {
        self.0 &= !Self::bit(format);
    }

    pub fn union(self, other: Self) -> Self {
        FormatSet(self.0 | other.0)
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub fn iter(self) -> impl Iterator<Item = FormatTag> {
        const ALL_FORMATS: [FormatTag; 5] = [
            FormatTag::Jpeg,
            FormatTag::Png,
            FormatTag::Heif,
            FormatTag::Heic,
            FormatTag::Avif,
        ];

        ALL_FORMATS.into_iter().filter(move |&f| self.contains(f))
    }
}

impl fmt::Display for FormatSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("{")?;
        for (i, format) in self.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            f.write_str(format.name())?;
        }
        f.write_str("}")
    }
}

impl fmt::Debug for FormatSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FormatSet{self}")
    }
}
