//! TIFF/EXIF reader: walks the IFD chain looking for creation-date tags.
//!
//! All offsets in a TIFF stream are relative to the position where the
//! byte-order mark was read (the IFD base), not to the start of the file.
//! That matters because EXIF blocks are routinely embedded mid-file inside
//! JPEG APP1 segments and HEIF `Exif` items; `Tiff::parse` therefore takes a
//! cursor positioned at the byte-order mark and leaves the enclosing
//! traversal's byte order untouched only if the caller restores it.

use chrono::NaiveDateTime;
use log::debug;

use crate::date;
use crate::error::{Error, Result};
use crate::stream::{ByteOrder, Cursor};

/// TIFF signature value following the byte-order mark.
const TIFF_MAGIC: u16 = 42;

/// ExifOffset: points to a nested IFD.
const TAG_EXIF_IFD: u16 = 0x8769;
/// ModifyDate.
const TAG_MODIFY_DATE: u16 = 0x0132;
/// DateTimeOriginal.
const TAG_DATE_TIME_ORIGINAL: u16 = 0x9003;
/// CreateDate.
const TAG_CREATE_DATE: u16 = 0x9004;

/// Nested-IFD recursion cap; real files are one or two levels deep.
const MAX_IFD_DEPTH: u32 = 16;

/// Decoded TIFF/EXIF model.
#[derive(Debug, Default)]
pub struct Tiff {
    image_time: Option<NaiveDateTime>,
}

impl Tiff {
    /// Parse a standalone TIFF file.
    pub fn load(data: &[u8]) -> Result<Self> {
        let mut cursor = Cursor::new(data.to_vec(), ByteOrder::Little);
        Tiff::parse(&mut cursor)
    }

    pub fn load_file(path: impl AsRef<std::path::Path>) -> Result<Self> {
        Tiff::load(&std::fs::read(path)?)
    }

    /// Parse a TIFF stream starting at the cursor's current position, which
    /// becomes the IFD base. Used directly by the JPEG and MP4/HEIF decoders
    /// for embedded EXIF blocks. Switches the cursor's byte order to the one
    /// the stream declares.
    pub fn parse(cursor: &mut Cursor) -> Result<Self> {
        let mut tiff = Tiff::default();
        let ifd_base = cursor.position();

        let mark = [cursor.read_u8()?, cursor.read_u8()?];
        match &mark {
            b"II" => cursor.set_byte_order(ByteOrder::Little),
            b"MM" => cursor.set_byte_order(ByteOrder::Big),
            _ => return Err(Error::Format("bad TIFF byte-order mark")),
        }
        if cursor.read_u16()? != TIFF_MAGIC {
            return Err(Error::Format("bad TIFF signature"));
        }

        let ifd_offset = cursor.read_u32()? as usize;
        let mut visited = vec![ifd_offset];
        cursor.seek(ifd_base + ifd_offset)?;
        let mut next_ifd = tiff.parse_ifd(cursor, ifd_base, 0)? as usize;
        while next_ifd != 0 {
            // A next-IFD offset pointing back at an earlier IFD would loop
            // the chain forever.
            if visited.contains(&next_ifd) {
                return Err(Error::Format("cyclic IFD chain"));
            }
            visited.push(next_ifd);
            cursor.seek(ifd_base + next_ifd)?;
            next_ifd = tiff.parse_ifd(cursor, ifd_base, 0)? as usize;
        }
        Ok(tiff)
    }

    /// Walk one IFD's entries; returns the next-IFD offset (0 terminates).
    fn parse_ifd(&mut self, cursor: &mut Cursor, ifd_base: usize, depth: u32) -> Result<u32> {
        if depth > MAX_IFD_DEPTH {
            return Err(Error::Format("IFD nesting too deep"));
        }
        let num_entries = cursor.read_u16()?;
        debug!("IFD at {:#x}: {num_entries} entries", cursor.position());
        for _ in 0..num_entries {
            let tag = cursor.read_u16()?;
            let _field_type = cursor.read_u16()?;
            let count = cursor.read_u32()?;
            let offset = ifd_base + cursor.read_u32()? as usize;

            match tag {
                TAG_EXIF_IFD => {
                    cursor.visit_at(offset, |c| {
                        self.parse_ifd(c, ifd_base, depth + 1).map(|_| ())
                    })?;
                }
                TAG_MODIFY_DATE | TAG_DATE_TIME_ORIGINAL | TAG_CREATE_DATE => {
                    if count > 0 {
                        // Exclude the string's NUL terminator.
                        let time_string =
                            cursor.visit_at(offset, |c| c.read_string(count as usize - 1))?;
                        if let Some(dt) = date::parse_exif_datetime(&time_string) {
                            self.image_time = Some(dt);
                        }
                    }
                }
                _ => {}
            }
        }
        cursor.read_u32()
    }

    /// Resolved creation time, if any recognized date tag parsed.
    pub fn image_time(&self) -> Option<NaiveDateTime> {
        self.image_time
    }
}
