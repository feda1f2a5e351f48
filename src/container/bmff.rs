//! ISO-BMFF box walking.
//!
//! Box structure: 4-byte size (BE u32) + 4-byte type. If size==1, 8-byte
//! extended size follows. If size==0, box extends to EOF.
//!
//! FullBoxes carry 1 version byte + 3 flag bytes before their payload.
//!
//! All parsing is pure byte parsing: no codec crate is involved, so the
//! container can be inspected even when the `heif` feature is off.

use crate::ContainerError;

/// One box: its four-character type and the bytes after its header.
#[derive(Clone, Copy, Debug)]
pub(crate) struct BmffBox<'a> {
    pub box_type: [u8; 4],
    pub content: &'a [u8],
}

/// Iterator over the sibling boxes contained in `data`.
///
/// Yields an error (and then stops) on a box whose header or declared size
/// runs past the end of `data`.
pub(crate) struct Boxes<'a> {
    data: &'a [u8],
    pos: usize,
    context: &'static str,
}

impl<'a> Boxes<'a> {
    /// `context` names the parent box in truncation errors.
    pub fn new(data: &'a [u8], context: &'static str) -> Self {
        Self {
            data,
            pos: 0,
            context,
        }
    }
}

impl<'a> Iterator for Boxes<'a> {
    type Item = Result<BmffBox<'a>, ContainerError>;

    fn next(&mut self) -> Option<Self::Item> {
        let data = self.data;
        let pos = self.pos;
        if pos >= data.len() {
            return None;
        }

        // Stop iteration after an error
        self.pos = data.len();

        if pos + 8 > data.len() {
            return Some(Err(ContainerError::Truncated(self.context)));
        }
        let size = u32::from_be_bytes([data[pos], data[pos + 1], data[pos + 2], data[pos + 3]]);
        let box_type = [data[pos + 4], data[pos + 5], data[pos + 6], data[pos + 7]];

        let (header_size, box_size) = if size == 1 {
            // Extended size: 64-bit
            if pos + 16 > data.len() {
                return Some(Err(ContainerError::Truncated(self.context)));
            }
            let mut ext = [0u8; 8];
            ext.copy_from_slice(&data[pos + 8..pos + 16]);
            (16usize, u64::from_be_bytes(ext))
        } else if size == 0 {
            // Box extends to end of data
            (8usize, (data.len() - pos) as u64)
        } else {
            (8usize, u64::from(size))
        };

        if box_size < header_size as u64 || box_size > (data.len() - pos) as u64 {
            return Some(Err(ContainerError::Truncated(self.context)));
        }
        let box_end = pos + box_size as usize;

        self.pos = box_end;
        Some(Ok(BmffBox {
            box_type,
            content: &data[pos + header_size..box_end],
        }))
    }
}

/// Find the first box of `box_type` among the siblings in `data`.
pub(crate) fn find_box<'a>(
    data: &'a [u8],
    box_type: &[u8; 4],
    context: &'static str,
) -> Result<Option<&'a [u8]>, ContainerError> {
    for b in Boxes::new(data, context) {
        let b = b?;
        if &b.box_type == box_type {
            return Ok(Some(b.content));
        }
    }
    Ok(None)
}

/// Big-endian cursor over a box payload.
pub(crate) struct Reader<'a> {
    data: &'a [u8],
    pos: usize,
    context: &'static str,
}

impl<'a> Reader<'a> {
    pub fn new(data: &'a [u8], context: &'static str) -> Self {
        Self {
            data,
            pos: 0,
            context,
        }
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8], ContainerError> {
        let end = self
            .pos
            .checked_add(n)
            .filter(|&end| end <= self.data.len())
            .ok_or(ContainerError::Truncated(self.context))?;
        let bytes = &self.data[self.pos..end];
        self.pos = end;
        Ok(bytes)
    }

    pub fn u8(&mut self) -> Result<u8, ContainerError> {
        Ok(self.take(1)?[0])
    }

    pub fn u16(&mut self) -> Result<u16, ContainerError> {
        let b = self.take(2)?;
        Ok(u16::from_be_bytes([b[0], b[1]]))
    }

    pub fn u32(&mut self) -> Result<u32, ContainerError> {
        let b = self.take(4)?;
        Ok(u32::from_be_bytes([b[0], b[1], b[2], b[3]]))
    }

    pub fn fourcc(&mut self) -> Result<[u8; 4], ContainerError> {
        let b = self.take(4)?;
        Ok([b[0], b[1], b[2], b[3]])
    }

    /// A 16-bit id for version 0 boxes, 32-bit otherwise.
    pub fn item_id(&mut self, wide: bool) -> Result<u32, ContainerError> {
        if wide {
            self.u32()
        } else {
            self.u16().map(u32::from)
        }
    }

    /// FullBox header: `(version, flags)`.
    pub fn full_box(&mut self) -> Result<(u8, u32), ContainerError> {
        let word = self.u32()?;
        Ok(((word >> 24) as u8, word & 0x00FF_FFFF))
    }

    pub fn skip(&mut self, n: usize) -> Result<(), ContainerError> {
        self.take(n).map(|_| ())
    }

    /// Everything not consumed yet.
    pub fn rest(&self) -> &'a [u8] {
        &self.data[self.pos.min(self.data.len())..]
    }
}
