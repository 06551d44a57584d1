//! PNG chunk walker: creation time from `tIME` or an XMP `iTXt` chunk.

use chrono::NaiveDateTime;
use log::warn;

use crate::date;
use crate::error::{Error, Result};
use crate::stream::{ByteOrder, Cursor};
use crate::walk::{records, Walk};
use crate::xmp;

const PNG_SIGNATURE_1: u32 = 0x8950_4E47;
const PNG_SIGNATURE_2: u32 = 0x0D0A_1A0A;

/// iTXt keyword under which XMP packets are stored.
const XMP_KEYWORD: &str = "XML:com.adobe.xmp";

/// Decoded PNG model.
#[derive(Debug, Default)]
pub struct Png {
    image_time: Option<NaiveDateTime>,
}

impl Png {
    pub fn load(data: &[u8]) -> Result<Self> {
        let mut png = Png::default();
        let mut cursor = Cursor::new(data.to_vec(), ByteOrder::Big);
        if cursor.read_u32()? != PNG_SIGNATURE_1 || cursor.read_u32()? != PNG_SIGNATURE_2 {
            return Err(Error::Format("missing PNG signature"));
        }
        let end = cursor.len();
        records(&mut cursor, end, |c| png.parse_chunk(c))?;
        Ok(png)
    }

    pub fn load_file(path: impl AsRef<std::path::Path>) -> Result<Self> {
        Png::load(&std::fs::read(path)?)
    }

    fn parse_chunk(&mut self, c: &mut Cursor) -> Result<Walk> {
        let length = c.read_u32()? as usize;
        let chunk_type = c.read_fourcc()?;
        match &chunk_type {
            b"tIME" => {
                let year = c.read_u16()?;
                let month = c.read_u8()?;
                let day = c.read_u8()?;
                let hour = c.read_u8()?;
                let minute = c.read_u8()?;
                let second = c.read_u8()?;
                match date::from_png_time(year, month, day, hour, minute, second) {
                    Some(dt) => self.image_time = Some(dt),
                    None => warn!("out-of-range tIME fields {year}-{month}-{day}"),
                }
            }
            b"iTXt" => {
                let chunk_start = c.position();
                let keyword = c.read_nt_string()?;
                let _compression_flag = c.read_u8()?;
                let _compression_method = c.read_u8()?;
                let _language_tag = c.read_nt_string()?;
                let _translated_keyword = c.read_nt_string()?;
                let text_length = length.saturating_sub(c.position() - chunk_start);
                let text = c.read_string(text_length)?;
                if keyword == XMP_KEYWORD {
                    if let Some(dt) = xmp::creation_date(&text) {
                        self.image_time = Some(dt);
                    }
                }
                c.seek(chunk_start + length)?;
            }
            b"IEND" => return Ok(Walk::Stop),
            // tEXt, zTXt and everything unrecognized: skip the payload.
            _ => c.skip(length)?,
        }
        let _crc = c.read_u32()?;
        Ok(Walk::Continue)
    }

    pub fn image_time(&self) -> Option<NaiveDateTime> {
        self.image_time
    }
}
