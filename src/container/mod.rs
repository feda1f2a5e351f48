//! HEIF-family container inspection.
//!
//! Walks `ftyp` and `meta` (`hdlr`, `pitm`, `iinf`, `iref`, `iprp`) to list
//! the top-level images, the primary item and per-item geometry. Pixel decode
//! is delegated to the adapter registered for the container's format.

mod bmff;

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use crate::{
    CodecError, CodecRegistry, ColorModel, ContainerError, FormatTag, Limits, OpenError,
    PixelBuffer,
};

use bmff::{Boxes, Reader, find_box};

/// Identifier of an item inside a container.
pub type ItemId = u32;

/// Item types that hold a coded (or derived) still image.
const IMAGE_ITEM_TYPES: [&[u8; 4]; 9] = [
    b"hvc1", b"av01", b"grid", b"iden", b"iovl", b"jpeg", b"unci", b"j2k1", b"avc1",
];

#[derive(Clone, Debug)]
struct ItemInfo {
    id: ItemId,
    item_type: [u8; 4],
    hidden: bool,
    /// From the associated `ispe` property.
    size: Option<(u32, u32)>,
}

impl ItemInfo {
    fn is_image(&self) -> bool {
        IMAGE_ITEM_TYPES.contains(&&self.item_type)
    }
}

/// An opened HEIF-family file.
///
/// Owns the file bytes; dropping the container releases everything.
#[derive(Clone, Debug)]
pub struct Container {
    data: Vec<u8>,
    format: FormatTag,
    items: Vec<ItemInfo>,
    top_level: Vec<ItemId>,
    primary: Option<ItemId>,
}

impl Container {
    /// Read and parse a container from disk.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, OpenError> {
        let data = fs::read(path.as_ref())?;
        Ok(Self::from_bytes(data)?)
    }

    /// Parse a container from its bytes.
    pub fn from_bytes(data: Vec<u8>) -> Result<Self, ContainerError> {
        let format = parse_brand(&data)?;
        let meta = parse_meta(&data)?;

        let referenced: HashSet<ItemId> = meta.auxiliary_sources;
        let top_level: Vec<ItemId> = meta
            .items
            .iter()
            .filter(|item| item.is_image() && !item.hidden && !referenced.contains(&item.id))
            .map(|item| item.id)
            .collect();

        if let Some(primary) = meta.primary {
            if !top_level.contains(&primary) {
                return Err(ContainerError::PrimaryNotTopLevel(primary));
            }
        }

        log::debug!(
            "parsed {} container: {} items, top-level {:?}, primary {:?}",
            format,
            meta.items.len(),
            top_level,
            meta.primary
        );

        Ok(Self {
            data,
            format,
            items: meta.items,
            top_level,
            primary: meta.primary,
        })
    }

    /// Brand-derived format: heif, heic or avif.
    pub fn format(&self) -> FormatTag {
        self.format
    }

    /// The raw file bytes.
    pub fn bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn number_of_top_level_images(&self) -> usize {
        self.top_level.len()
    }

    /// Top-level image ids in file order. Possibly empty.
    pub fn top_level_image_ids(&self) -> &[ItemId] {
        &self.top_level
    }

    /// The declared primary item, if any. Always one of
    /// [`top_level_image_ids`](Self::top_level_image_ids).
    pub fn primary_image_id(&self) -> Option<ItemId> {
        self.primary
    }

    /// Handle for a top-level image.
    pub fn image_handle(&self, id: ItemId) -> Result<ImageHandle<'_>, ContainerError> {
        if !self.top_level.contains(&id) {
            return Err(ContainerError::UnknownItem(id));
        }
        let item = self
            .items
            .iter()
            .find(|item| item.id == id)
            .ok_or(ContainerError::UnknownItem(id))?;
        let (width, height) = item.size.ok_or(ContainerError::MissingProperty {
            item: id,
            property: "ispe",
        })?;

        Ok(ImageHandle {
            container: self,
            id,
            item_type: item.item_type,
            width,
            height,
        })
    }

    /// Handle for the primary image.
    pub fn primary_image_handle(&self) -> Result<ImageHandle<'_>, ContainerError> {
        let id = self.primary.ok_or(ContainerError::NoPrimaryImage)?;
        self.image_handle(id)
    }
}

/// A top-level image inside a [`Container`].
#[derive(Clone, Copy, Debug)]
pub struct ImageHandle<'c> {
    container: &'c Container,
    id: ItemId,
    item_type: [u8; 4],
    width: u32,
    height: u32,
}

impl ImageHandle<'_> {
    pub fn id(&self) -> ItemId {
        self.id
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Four-character item type, e.g. `hvc1`.
    pub fn item_type(&self) -> String {
        String::from_utf8_lossy(&self.item_type).into_owned()
    }

    pub fn is_primary(&self) -> bool {
        self.container.primary == Some(self.id)
    }

    /// Decode this image through the adapter registered for the container's
    /// format.
    pub fn decode(
        &self,
        registry: &CodecRegistry,
        color_model: ColorModel,
        limits: &Limits,
    ) -> Result<PixelBuffer, CodecError> {
        limits.validate(self.width, self.height)?;
        let adapter = registry.decoder(self.container.format)?;
        adapter.decode_item(self.container.bytes(), self.id, color_model, limits)
    }
}

fn parse_brand(data: &[u8]) -> Result<FormatTag, ContainerError> {
    if data.len() < 12 || &data[4..8] != b"ftyp" {
        return Err(ContainerError::NotIsoBmff);
    }
    FormatTag::from_ftyp(data)
        .ok_or(ContainerError::UnsupportedBrand([data[8], data[9], data[10], data[11]]))
}

#[derive(Default)]
struct Meta {
    items: Vec<ItemInfo>,
    primary: Option<ItemId>,
    /// Items that are thumbnails or auxiliary images of another item.
    auxiliary_sources: HashSet<ItemId>,
}

fn parse_meta(data: &[u8]) -> Result<Meta, ContainerError> {
    let Some(meta) = find_box(data, b"meta", "file")? else {
        return Ok(Meta::default());
    };

    let mut reader = Reader::new(meta, "meta");
    let (version, _) = reader.full_box()?;
    if version != 0 {
        return Err(ContainerError::UnsupportedVersion {
            box_type: "meta",
            version,
        });
    }

    let mut out = Meta::default();
    let mut properties: Vec<Option<(u32, u32)>> = Vec::new();
    let mut associations: Vec<(ItemId, Vec<u16>)> = Vec::new();

    for child in Boxes::new(reader.rest(), "meta") {
        let child = child?;
        match &child.box_type {
            b"hdlr" => {
                let mut r = Reader::new(child.content, "hdlr");
                r.full_box()?;
                r.skip(4)?; // pre_defined
                if &r.fourcc()? != b"pict" {
                    return Err(ContainerError::NotAnImageContainer);
                }
            }
            b"pitm" => {
                let mut r = Reader::new(child.content, "pitm");
                let (version, _) = r.full_box()?;
                out.primary = Some(r.item_id(version != 0)?);
            }
            b"iinf" => out.items = parse_iinf(child.content)?,
            b"iref" => out.auxiliary_sources = parse_iref(child.content)?,
            b"iprp" => parse_iprp(child.content, &mut properties, &mut associations)?,
            _ => {}
        }
    }

    // Attach ispe geometry through ipma associations (1-based into ipco)
    for (item_id, indices) in associations {
        let Some(item) = out.items.iter_mut().find(|i| i.id == item_id) else {
            continue;
        };
        for index in indices {
            let slot = usize::from(index).checked_sub(1);
            if let Some(Some(size)) = slot.and_then(|s| properties.get(s)) {
                item.size = Some(*size);
                break;
            }
        }
    }

    Ok(out)
}

fn parse_iinf(content: &[u8]) -> Result<Vec<ItemInfo>, ContainerError> {
    let mut r = Reader::new(content, "iinf");
    let (version, _) = r.full_box()?;
    let _entry_count = if version == 0 {
        u32::from(r.u16()?)
    } else {
        r.u32()?
    };

    let mut items: Vec<ItemInfo> = Vec::new();
    let mut seen = HashSet::new();
    for entry in Boxes::new(r.rest(), "iinf") {
        let entry = entry?;
        if &entry.box_type != b"infe" {
            continue;
        }
        let mut e = Reader::new(entry.content, "infe");
        let (version, flags) = e.full_box()?;
        // Versions 0 and 1 predate item types and never describe images
        if version < 2 {
            continue;
        }
        let id = e.item_id(version >= 3)?;
        if !seen.insert(id) {
            return Err(ContainerError::DuplicateItem(id));
        }
        let _protection_index = e.u16()?;
        let item_type = e.fourcc()?;
        items.push(ItemInfo {
            id,
            item_type,
            hidden: flags & 1 != 0,
            size: None,
        });
    }
    Ok(items)
}

fn parse_iref(content: &[u8]) -> Result<HashSet<ItemId>, ContainerError> {
    let mut r = Reader::new(content, "iref");
    let (version, _) = r.full_box()?;
    let wide = version != 0;

    let mut sources = HashSet::new();
    for reference in Boxes::new(r.rest(), "iref") {
        let reference = reference?;
        let mut e = Reader::new(reference.content, "iref");
        let from = e.item_id(wide)?;
        let count = e.u16()?;
        for _ in 0..count {
            e.item_id(wide)?;
        }
        if matches!(&reference.box_type, b"thmb" | b"auxl") {
            sources.insert(from);
        }
    }
    Ok(sources)
}

fn parse_iprp(
    content: &[u8],
    properties: &mut Vec<Option<(u32, u32)>>,
    associations: &mut Vec<(ItemId, Vec<u16>)>,
) -> Result<(), ContainerError> {
    for child in Boxes::new(content, "iprp") {
        let child = child?;
        match &child.box_type {
            b"ipco" => {
                for property in Boxes::new(child.content, "ipco") {
                    let property = property?;
                    properties.push(if &property.box_type == b"ispe" {
                        let mut r = Reader::new(property.content, "ispe");
                        r.full_box()?;
                        Some((r.u32()?, r.u32()?))
                    } else {
                        None
                    });
                }
            }
            b"ipma" => {
                let mut r = Reader::new(child.content, "ipma");
                let (version, flags) = r.full_box()?;
                let entry_count = r.u32()?;
                for _ in 0..entry_count {
                    let item_id = r.item_id(version >= 1)?;
                    let count = r.u8()?;
                    let mut indices = Vec::with_capacity(usize::from(count));
                    for _ in 0..count {
                        // High bit is the 'essential' flag
                        let index = if flags & 1 != 0 {
                            r.u16()? & 0x7FFF
                        } else {
                            u16::from(r.u8()? & 0x7F)
                        };
                        indices.push(index);
                    }
                    associations.push((item_id, indices));
                }
            }
            _ => {}
        }
    }
    Ok(())
}
