//! Adobe Image Resource Blocks (APP13) and the IPTC record stream inside them.
//!
//! Resource data lengths are padded to a 16-bit boundary, and the IPTC record
//! can be shorter than the declared resource length, so the cursor is forced
//! to each *declared* end rather than trusting the bytes actually consumed.

use chrono::NaiveDateTime;
use log::warn;

use crate::date;
use crate::error::{Error, Result};
use crate::stream::Cursor;

/// IPTC-NAA record resource type.
const RESOURCE_IPTC: u16 = 0x0404;

/// (record number, dataset number) pairs that carry a date:
/// 1:70 Date Sent, 2:30 Release Date, 2:55 Date Created, 2:62 Digital Creation Date.
const DATE_DATASETS: [(u8, u8); 4] = [(1, 70), (2, 30), (2, 55), (2, 62)];

/// Parse an APP13 payload of `length` bytes; returns the last IPTC date seen.
pub fn parse(c: &mut Cursor, length: usize) -> Result<Option<NaiveDateTime>> {
    let irb_end = c.position() + length;
    let mut image_time = None;

    let _photoshop_version = c.read_nt_string()?;
    while c.position() < irb_end {
        let signature = c.read_fourcc()?;
        if &signature != b"8BIM" {
            return Err(Error::UnknownTag("bad image resource block signature"));
        }

        let resource_type = c.read_u16()?;
        let name_length = c.read_u8()?;
        let _name = c.read_string(name_length as usize)?;
        // Name is padded to an even total including its length byte.
        if name_length & 1 == 0 {
            c.skip(1)?;
        }
        let data_length = c.read_u32()? as usize;

        if resource_type == RESOURCE_IPTC {
            let iptc_end = c.position() + data_length;
            while c.position() + 3 < iptc_end {
                let _tag_marker = c.read_u8()?;
                let record_number = c.read_u8()?;
                let data_set_number = c.read_u8()?;
                let field_count = c.read_u16()? as usize;

                if DATE_DATASETS.contains(&(record_number, data_set_number)) {
                    let date_string = c.read_string(field_count)?;
                    match date::parse_iptc_date(&date_string) {
                        Some(dt) => image_time = Some(dt),
                        None => warn!("unparseable IPTC date {date_string:?}"),
                    }
                } else {
                    c.skip(field_count)?;
                }
            }
            // The record may end short of the declared resource length.
            c.seek(iptc_end)?;
        } else {
            c.skip(data_length)?;
        }

        // Resources are padded to the next 16-bit boundary.
        if data_length & 1 == 1 {
            c.skip(1)?;
        }
    }
    Ok(image_time)
}
