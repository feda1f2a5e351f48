//! Minimal ISO-BMFF writer for building HEIF-shaped test containers.
//!
//! Pixel payloads live in `mdat` as records of
//! `[item id u32][channels u8][width u32][height u32][samples]`; the
//! test adapter reads them back by id.

use heifconv::{PixelBuffer, PixelData};

pub fn bx(box_type: &[u8; 4], content: &[u8]) -> Vec<u8> {
    let mut out = ((8 + content.len()) as u32).to_be_bytes().to_vec();
    out.extend_from_slice(box_type);
    out.extend_from_slice(content);
    out
}

pub fn full(box_type: &[u8; 4], version: u8, flags: u32, content: &[u8]) -> Vec<u8> {
    let mut body = ((u32::from(version) << 24) | flags).to_be_bytes().to_vec();
    body.extend_from_slice(content);
    bx(box_type, &body)
}

/// One item of a test container.
#[derive(Clone, Debug)]
pub struct ItemSpec {
    pub id: u16,
    pub item_type: [u8; 4],
    pub hidden: bool,
    /// Written as an `ispe` property when present.
    pub size: Option<(u32, u32)>,
    pub pixels: Option<PixelBuffer>,
}

impl ItemSpec {
    /// A visible uncompressed image item carrying `pixels`.
    pub fn image(id: u16, pixels: PixelBuffer) -> Self {
        Self {
            id,
            item_type: *b"unci",
            hidden: false,
            size: Some((pixels.width(), pixels.height())),
            pixels: Some(pixels),
        }
    }

    /// A visible image item with geometry but no payload.
    pub fn placeholder(id: u16, width: u32, height: u32) -> Self {
        Self {
            id,
            item_type: *b"hvc1",
            hidden: false,
            size: Some((width, height)),
            pixels: None,
        }
    }

    pub fn hidden(mut self) -> Self {
        self.hidden = true;
        self
    }
}

#[derive(Clone, Debug)]
pub struct ContainerBuilder {
    major: [u8; 4],
    items: Vec<ItemSpec>,
    primary: Option<u16>,
    /// `(thumbnail, master)` pairs written as `thmb` references.
    thumbnails: Vec<(u16, u16)>,
    with_meta: bool,
}

impl ContainerBuilder {
    pub fn new(major: &[u8; 4]) -> Self {
        Self {
            major: *major,
            items: Vec::new(),
            primary: None,
            thumbnails: Vec::new(),
            with_meta: true,
        }
    }

    pub fn item(mut self, item: ItemSpec) -> Self {
        self.items.push(item);
        self
    }

    pub fn primary(mut self, id: u16) -> Self {
        self.primary = Some(id);
        self
    }

    pub fn thumbnail(mut self, thumbnail: u16, master: u16) -> Self {
        self.thumbnails.push((thumbnail, master));
        self
    }

    /// Only an `ftyp` box: a container with no images at all.
    pub fn without_meta(mut self) -> Self {
        self.with_meta = false;
        self
    }

    pub fn build(&self) -> Vec<u8> {
        let mut ftyp = self.major.to_vec();
        ftyp.extend_from_slice(&0u32.to_be_bytes());
        ftyp.extend_from_slice(b"mif1");
        ftyp.extend_from_slice(&self.major);
        let mut out = bx(b"ftyp", &ftyp);

        if !self.with_meta {
            return out;
        }

        let mut meta = Vec::new();
        meta.extend(hdlr());
        if let Some(primary) = self.primary {
            meta.extend(full(b"pitm", 0, 0, &primary.to_be_bytes()));
        }
        meta.extend(self.iinf());
        if !self.thumbnails.is_empty() {
            meta.extend(self.iref());
        }
        meta.extend(self.iprp());
        out.extend(full(b"meta", 0, 0, &meta));
        out.extend(bx(b"mdat", &self.mdat()));
        out
    }

    fn iinf(&self) -> Vec<u8> {
        let mut body = (self.items.len() as u16).to_be_bytes().to_vec();
        for item in &self.items {
            let mut infe = item.id.to_be_bytes().to_vec();
            infe.extend_from_slice(&0u16.to_be_bytes());
            infe.extend_from_slice(&item.item_type);
            infe.push(0);
            body.extend(full(b"infe", 2, u32::from(item.hidden), &infe));
        }
        full(b"iinf", 0, 0, &body)
    }

    fn iref(&self) -> Vec<u8> {
        let mut body = Vec::new();
        for (thumbnail, master) in &self.thumbnails {
            let mut reference = thumbnail.to_be_bytes().to_vec();
            reference.extend_from_slice(&1u16.to_be_bytes());
            reference.extend_from_slice(&master.to_be_bytes());
            body.extend(bx(b"thmb", &reference));
        }
        full(b"iref", 0, 0, &body)
    }

    fn iprp(&self) -> Vec<u8> {
        let mut ipco = Vec::new();
        let mut ipma = Vec::new();
        let mut entries = 0u32;
        let mut index = 0u8;
        for item in &self.items {
            if let Some((w, h)) = item.size {
                let mut ispe = w.to_be_bytes().to_vec();
                ispe.extend_from_slice(&h.to_be_bytes());
                ipco.extend(full(b"ispe", 0, 0, &ispe));
                index += 1;

                ipma.extend_from_slice(&item.id.to_be_bytes());
                ipma.push(1);
                ipma.push(0x80 | index);
                entries += 1;
            }
        }
        let mut ipma_body = entries.to_be_bytes().to_vec();
        ipma_body.extend(ipma);
        bx(
            b"iprp",
            &[bx(b"ipco", &ipco), full(b"ipma", 0, 0, &ipma_body)].concat(),
        )
    }

    fn mdat(&self) -> Vec<u8> {
        let mut out = Vec::new();
        for item in &self.items {
            let Some(pixels) = &item.pixels else {
                continue;
            };
            let (channels, samples): (u8, Vec<u8>) = match pixels.data() {
                PixelData::Rgba8(img) => (
                    4,
                    img.as_ref().pixels().flat_map(|p| [p.r, p.g, p.b, p.a]).collect(),
                ),
                PixelData::Rgb8(img) => (3, img.as_ref().pixels().flat_map(|p| [p.r, p.g, p.b]).collect()),
                _ => unreachable!("test buffers are 8-bit RGB or RGBA"),
            };
            out.extend_from_slice(&u32::from(item.id).to_be_bytes());
            out.push(channels);
            out.extend_from_slice(&pixels.width().to_be_bytes());
            out.extend_from_slice(&pixels.height().to_be_bytes());
            out.extend(samples);
        }
        out
    }
}

fn hdlr() -> Vec<u8> {
    let mut body = 0u32.to_be_bytes().to_vec();
    body.extend_from_slice(b"pict");
    body.extend_from_slice(&[0; 12]);
    body.push(0);
    full(b"hdlr", 0, 0, &body)
}

/// Sibling boxes at the top level of `data`, as `(type, content)`.
pub fn top_level_boxes(data: &[u8]) -> Vec<([u8; 4], &[u8])> {
    let mut out = Vec::new();
    let mut pos = 0;
    while pos + 8 <= data.len() {
        let size = u32::from_be_bytes([data[pos], data[pos + 1], data[pos + 2], data[pos + 3]]) as usize;
        if size < 8 || pos + size > data.len() {
            break;
        }
        let box_type = [data[pos + 4], data[pos + 5], data[pos + 6], data[pos + 7]];
        out.push((box_type, &data[pos + 8..pos + size]));
        pos += size;
    }
    out
}
