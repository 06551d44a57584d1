//! Seekable, endianness-switchable byte cursor and its append-only inverse.
//!
//! Every decoder in this crate drives exactly one `Cursor` to completion;
//! reading past the end of the buffer is fatal for that decode (no partial
//! results). The position save/restore stack supports the "jump to an offset,
//! decode, then resume" pattern used by offset-indirected tags (TIFF sub-IFDs,
//! HEIF item extents, JPEG-XR pixel-format blobs).

use byteorder::{BigEndian, ByteOrder as _, LittleEndian};

use crate::error::{Error, Result};

/// Active byte order for multi-byte reads/writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ByteOrder {
    Little,
    Big,
}

/// Random-access read cursor over an in-memory buffer.
#[derive(Debug)]
pub struct Cursor {
    data: Vec<u8>,
    pos: usize,
    order: ByteOrder,
    saved: Vec<usize>,
}

impl Cursor {
    pub fn new(data: Vec<u8>, order: ByteOrder) -> Self {
        Cursor {
            data,
            pos: 0,
            order,
            saved: Vec::new(),
        }
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn is_eof(&self) -> bool {
        self.pos >= self.data.len()
    }

    pub fn byte_order(&self) -> ByteOrder {
        self.order
    }

    /// May change mid-stream: TIFF/EXIF switches order per embedded block.
    pub fn set_byte_order(&mut self, order: ByteOrder) {
        self.order = order;
    }

    pub fn seek(&mut self, pos: usize) -> Result<()> {
        if pos > self.data.len() {
            return Err(Error::Truncated {
                offset: pos,
                needed: 0,
                len: self.data.len(),
            });
        }
        self.pos = pos;
        Ok(())
    }

    /// Advance the position by `n` bytes without reading them.
    pub fn skip(&mut self, n: usize) -> Result<()> {
        let pos = self.pos.saturating_add(n);
        self.seek(pos)
    }

    /// Save the current position and jump to `new_pos`.
    pub fn push_position(&mut self, new_pos: usize) -> Result<()> {
        self.saved.push(self.pos);
        self.seek(new_pos)
    }

    /// Restore the position saved by the matching `push_position`.
    pub fn pop_position(&mut self) -> Result<()> {
        let pos = self
            .saved
            .pop()
            .ok_or(Error::Format("position stack underflow"))?;
        self.pos = pos;
        Ok(())
    }

    /// Run `f` with the cursor at `pos`, restoring the prior position on every
    /// exit path so indirected reads never corrupt the enclosing traversal.
    pub fn visit_at<T>(
        &mut self,
        pos: usize,
        f: impl FnOnce(&mut Cursor) -> Result<T>,
    ) -> Result<T> {
        self.push_position(pos)?;
        let out = f(self);
        self.pop_position()?;
        out
    }

    fn take(&mut self, n: usize) -> Result<&[u8]> {
        let end = self.pos.checked_add(n).ok_or(Error::Truncated {
            offset: self.pos,
            needed: n,
            len: self.data.len(),
        })?;
        if end > self.data.len() {
            return Err(Error::Truncated {
                offset: self.pos,
                needed: n,
                len: self.data.len(),
            });
        }
        let bytes = &self.data[self.pos..end];
        self.pos = end;
        Ok(bytes)
    }

    pub fn read_u8(&mut self) -> Result<u8> {
        Ok(self.take(1)?[0])
    }

    pub fn read_u16(&mut self) -> Result<u16> {
        let order = self.order;
        let b = self.take(2)?;
        Ok(match order {
            ByteOrder::Little => LittleEndian::read_u16(b),
            ByteOrder::Big => BigEndian::read_u16(b),
        })
    }

    /// 3-byte integer; MP4 full-box flags are 24 bits.
    pub fn read_u24(&mut self) -> Result<u32> {
        let order = self.order;
        let b = self.take(3)?;
        Ok(match order {
            ByteOrder::Little => LittleEndian::read_u24(b),
            ByteOrder::Big => BigEndian::read_u24(b),
        })
    }

    pub fn read_u32(&mut self) -> Result<u32> {
        let order = self.order;
        let b = self.take(4)?;
        Ok(match order {
            ByteOrder::Little => LittleEndian::read_u32(b),
            ByteOrder::Big => BigEndian::read_u32(b),
        })
    }

    pub fn read_u64(&mut self) -> Result<u64> {
        let order = self.order;
        let b = self.take(8)?;
        Ok(match order {
            ByteOrder::Little => LittleEndian::read_u64(b),
            ByteOrder::Big => BigEndian::read_u64(b),
        })
    }

    pub fn read_bytes(&mut self, n: usize) -> Result<Vec<u8>> {
        Ok(self.take(n)?.to_vec())
    }

    /// Fixed-length string, lossily decoded as UTF-8.
    pub fn read_string(&mut self, n: usize) -> Result<String> {
        Ok(String::from_utf8_lossy(self.take(n)?).into_owned())
    }

    /// Raw 4-character record identifier.
    pub fn read_fourcc(&mut self) -> Result<[u8; 4]> {
        let b = self.take(4)?;
        Ok([b[0], b[1], b[2], b[3]])
    }

    /// Read until a zero byte, consuming the terminator.
    pub fn read_nt_string(&mut self) -> Result<String> {
        let start = self.pos;
        let nul = self.data[start..]
            .iter()
            .position(|&b| b == 0)
            .ok_or(Error::Truncated {
                offset: start,
                needed: 1,
                len: self.data.len(),
            })?;
        let s = String::from_utf8_lossy(&self.data[start..start + nul]).into_owned();
        self.pos = start + nul + 1;
        Ok(s)
    }

    /// The bytes of the underlying buffer (signature sniffing, raw spans).
    pub fn data(&self) -> &[u8] {
        &self.data
    }
}

/// Append-only serializer; byte order is fixed at construction.
#[derive(Debug)]
pub struct Writer {
    data: Vec<u8>,
    order: ByteOrder,
}

impl Writer {
    pub fn new(order: ByteOrder) -> Self {
        Writer {
            data: Vec::new(),
            order,
        }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn write_u8(&mut self, v: u8) {
        self.data.push(v);
    }

    pub fn write_u16(&mut self, v: u16) {
        let mut b = [0u8; 2];
        match self.order {
            ByteOrder::Little => LittleEndian::write_u16(&mut b, v),
            ByteOrder::Big => BigEndian::write_u16(&mut b, v),
        }
        self.data.extend_from_slice(&b);
    }

    pub fn write_u32(&mut self, v: u32) {
        let mut b = [0u8; 4];
        match self.order {
            ByteOrder::Little => LittleEndian::write_u32(&mut b, v),
            ByteOrder::Big => BigEndian::write_u32(&mut b, v),
        }
        self.data.extend_from_slice(&b);
    }

    pub fn write_u64(&mut self, v: u64) {
        let mut b = [0u8; 8];
        match self.order {
            ByteOrder::Little => LittleEndian::write_u64(&mut b, v),
            ByteOrder::Big => BigEndian::write_u64(&mut b, v),
        }
        self.data.extend_from_slice(&b);
    }

    pub fn write_bytes(&mut self, bytes: &[u8]) {
        self.data.extend_from_slice(bytes);
    }

    pub fn write_str(&mut self, s: &str) {
        self.data.extend_from_slice(s.as_bytes());
    }

    pub fn into_vec(self) -> Vec<u8> {
        self.data
    }
}
