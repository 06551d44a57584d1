//! RIFF/AVI chunk walker: creation time from `ICRD` or `IDIT`.

use chrono::NaiveDateTime;

use crate::date;
use crate::error::{Error, Result};
use crate::stream::{ByteOrder, Cursor};
use crate::walk::{records, Walk};

/// Decoded AVI model.
#[derive(Debug, Default)]
pub struct Avi {
    list_type_stack: Vec<[u8; 4]>,
    image_time: Option<NaiveDateTime>,
}

impl Avi {
    pub fn load(data: &[u8]) -> Result<Self> {
        let mut avi = Avi::default();
        let mut cursor = Cursor::new(data.to_vec(), ByteOrder::Little);

        if &cursor.read_fourcc()? != b"RIFF" {
            return Err(Error::Format("missing RIFF signature"));
        }
        let file_size = cursor.read_u32()? as usize;
        if &cursor.read_fourcc()? != b"AVI " {
            return Err(Error::Format("not an AVI file"));
        }
        // The declared size counts from just past the size field; 0 means
        // the chunk list runs to the end of the input.
        let end = if file_size == 0 {
            cursor.len()
        } else {
            8 + file_size
        };
        avi.parse_chunks(&mut cursor, end)?;
        Ok(avi)
    }

    pub fn load_file(path: impl AsRef<std::path::Path>) -> Result<Self> {
        Avi::load(&std::fs::read(path)?)
    }

    fn parse_chunks(&mut self, c: &mut Cursor, end: usize) -> Result<()> {
        records(c, end, |c| {
            let chunk_id = c.read_fourcc()?;
            let chunk_size = c.read_u32()? as usize;
            match &chunk_id {
                b"LIST" => {
                    let list_type = c.read_fourcc()?;
                    let inner_end = c.position().saturating_add(chunk_size).saturating_sub(4);
                    self.list_type_stack.push(list_type);
                    let walked = self.parse_chunks(c, inner_end);
                    self.list_type_stack.pop();
                    walked?;
                    c.seek(inner_end.min(c.len()))?;
                }
                b"ICRD" => {
                    let time_string = c.read_string(chunk_size)?;
                    if let Some(dt) = date::parse_riff_icrd(&time_string) {
                        self.image_time = Some(dt);
                    }
                }
                b"IDIT" => {
                    let time_string = c.read_string(chunk_size)?;
                    if let Some(dt) = date::parse_riff_idit(&time_string) {
                        self.image_time = Some(dt);
                    }
                }
                _ => c.skip(chunk_size)?,
            }
            Ok(Walk::Continue)
        })
    }

    /// Creation time; when both `ICRD` and `IDIT` are present the
    /// later-encountered chunk wins.
    pub fn image_time(&self) -> Option<NaiveDateTime> {
        self.image_time
    }
}
