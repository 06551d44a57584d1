//! ISO base media (MP4) and HEIF box walker.
//!
//! Box framing: 4-byte size + 4-character type, where size 0 means "extends
//! to the end of the file" and size 1 means an 8-byte extended size follows.
//! `moov`/`udta` recurse directly; `meta` is a full box, so its 4
//! version/flags bytes are skipped before recursing into its children.
//!
//! The creation timestamp comes from `mvhd` (Mac epoch) or the iTunes `©day`
//! box; HEIF images instead reference an `Exif` item through `iinf`/`infe`/
//! `iloc`, whose resolved extent is handed to the TIFF decoder.

use chrono::NaiveDateTime;
use log::debug;

use crate::date;
use crate::error::{Error, Result};
use crate::stream::{ByteOrder, Cursor};
use crate::tiff::Tiff;
use crate::walk::{records, Walk};

/// Decoded MP4/HEIF model.
#[derive(Debug, Default)]
pub struct Mp4 {
    creation_time: u32,
    time_scale: u32,
    duration: u32,
    exif_item_id: Option<u32>,
    image_time: Option<NaiveDateTime>,
}

impl Mp4 {
    pub fn load(data: &[u8]) -> Result<Self> {
        let mut mp4 = Mp4::default();
        let mut cursor = Cursor::new(data.to_vec(), ByteOrder::Big);
        let end = cursor.len();
        mp4.parse_boxes(&mut cursor, end)?;
        Ok(mp4)
    }

    pub fn load_file(path: impl AsRef<std::path::Path>) -> Result<Self> {
        Mp4::load(&std::fs::read(path)?)
    }

    fn parse_boxes(&mut self, c: &mut Cursor, end: usize) -> Result<()> {
        records(c, end, |c| self.parse_box(c))
    }

    fn parse_box(&mut self, c: &mut Cursor) -> Result<Walk> {
        let box_start = c.position();
        let mut size = c.read_u32()? as u64;
        let box_type = c.read_fourcc()?;
        if size == 1 {
            size = c.read_u64()?;
        }
        // Size 0 extends to the end of the input; no end offset is computed
        // from the size field in that case.
        let box_end = if size == 0 {
            c.len()
        } else {
            (box_start as u64 + size).min(c.len() as u64) as usize
        };
        debug!(
            "box {:?} [{box_start:#x}, {box_end:#x})",
            String::from_utf8_lossy(&box_type)
        );

        match &box_type {
            b"moov" | b"udta" => {
                self.parse_boxes(c, box_end)?;
            }
            b"meta" => {
                // Full box: version + 24-bit flags precede the children.
                c.skip(4)?;
                self.parse_boxes(c, box_end)?;
            }
            b"mvhd" => {
                let _version = c.read_u8()?;
                let _flags = c.read_u24()?;
                self.creation_time = c.read_u32()?;
                let _modification_time = c.read_u32()?;
                self.time_scale = c.read_u32()?;
                self.duration = c.read_u32()?;
                if let Some(dt) = date::from_mac_epoch(self.creation_time) {
                    self.image_time = Some(dt);
                }
            }
            b"\xa9day" => {
                let data_size = c.read_u16()? as usize;
                let _language = c.read_u16()?;
                let time_string = c.read_string(data_size)?;
                if let Some(dt) = date::parse_iso8601(&time_string) {
                    self.image_time = Some(dt);
                }
            }
            b"iinf" => {
                let version = c.read_u8()?;
                let _flags = c.read_u24()?;
                let _item_count = if version == 0 {
                    c.read_u16()? as u32
                } else {
                    c.read_u32()?
                };
                self.parse_boxes(c, box_end)?;
            }
            b"infe" => {
                let version = c.read_u8()?;
                let _flags = c.read_u24()?;
                let item_id = match version {
                    2 => c.read_u16()? as u32,
                    3 => c.read_u32()?,
                    _ => return Err(Error::UnknownTag("unsupported infe box version")),
                };
                let _protection_index = c.read_u16()?;
                let item_type = c.read_fourcc()?;
                let _item_name = c.read_nt_string()?;
                if &item_type == b"Exif" {
                    self.exif_item_id = Some(item_id);
                }
            }
            b"iloc" => {
                self.parse_iloc(c)?;
            }
            _ => {}
        }
        c.seek(box_end)?;
        Ok(Walk::Continue)
    }

    /// Item location box: maps item ids to byte extents. The field widths of
    /// offsets, lengths, base offsets and extent indices are declared by two
    /// nibble-packed size bytes (each nibble 0, 4 or 8).
    fn parse_iloc(&mut self, c: &mut Cursor) -> Result<()> {
        let version = c.read_u8()?;
        let _flags = c.read_u24()?;
        let sizes = c.read_u8()?;
        let offset_size = sizes >> 4;
        let length_size = sizes & 0x0F;
        let sizes = c.read_u8()?;
        let base_offset_size = sizes >> 4;
        let index_size = sizes & 0x0F;
        let item_count = if version < 2 {
            c.read_u16()? as u32
        } else {
            c.read_u32()?
        };

        for _ in 0..item_count {
            let item_id = if version < 2 {
                c.read_u16()? as u32
            } else {
                c.read_u32()?
            };
            if version == 1 || version == 2 {
                let _construction_method = c.read_u16()? & 0x000F;
            }
            let _data_reference_index = c.read_u16()?;
            let base_offset = read_sized(c, base_offset_size)?;
            let extent_count = c.read_u16()?;

            let mut extent_offset = 0;
            for _ in 0..extent_count {
                if (version == 1 || version == 2) && index_size > 0 {
                    let _extent_index = read_sized(c, index_size)?;
                }
                extent_offset = read_sized(c, offset_size)?;
                let _extent_length = read_sized(c, length_size)?;
            }

            if Some(item_id) == self.exif_item_id {
                self.parse_exif_item(c, base_offset + extent_offset)?;
            }
        }
        Ok(())
    }

    /// Visit a resolved `Exif` extent out of band and decode the TIFF block
    /// it wraps, resuming the iloc walk afterwards.
    fn parse_exif_item(&mut self, c: &mut Cursor, offset: u64) -> Result<()> {
        self.image_time = c.visit_at(offset as usize, |c| {
            let marker_length = c.read_u32()?;
            let marker = c.read_fourcc()?;
            if &marker != b"Exif" {
                return Err(Error::Format("missing Exif item marker"));
            }
            c.skip(marker_length.saturating_sub(4) as usize)?;
            let saved_order = c.byte_order();
            let tiff = Tiff::parse(c);
            c.set_byte_order(saved_order);
            Ok(tiff?.image_time())
        })?;
        Ok(())
    }

    pub fn image_time(&self) -> Option<NaiveDateTime> {
        self.image_time
    }

    /// Raw `mvhd` creation time in Mac-epoch seconds (0 if none was present).
    pub fn creation_time(&self) -> u32 {
        self.creation_time
    }

    pub fn time_scale(&self) -> u32 {
        self.time_scale
    }

    pub fn duration(&self) -> u32 {
        self.duration
    }
}

/// Read an iloc field whose width was declared by a size nibble.
fn read_sized(c: &mut Cursor, size: u8) -> Result<u64> {
    match size {
        0 => Ok(0),
        4 => Ok(c.read_u32()? as u64),
        8 => c.read_u64(),
        _ => Err(Error::Format("invalid iloc field size")),
    }
}
