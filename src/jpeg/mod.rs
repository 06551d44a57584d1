//! JPEG segment parser and re-serializer.
//!
//! Markers are dispatched by their 2-byte big-endian value. Unlike the
//! chunked container formats, an unrecognized marker is a hard error here:
//! marker boundaries cannot be located without knowing each marker's framing,
//! so a tolerant skip would desynchronize the whole parse.
//!
//! Entropy-coded data is never decoded; quantization/Huffman tables, the SOF
//! payload, and the scan span are kept verbatim so `save` can re-emit them.

mod irb;

use byteorder::{BigEndian, ByteOrder as _};
use chrono::NaiveDateTime;
use log::warn;

use crate::error::{Error, Result};
use crate::stream::{ByteOrder, Cursor, Writer};
use crate::tiff::Tiff;
use crate::walk::{records, Walk};
use crate::xmp;

const MARKER_SOI: u16 = 0xFFD8;
const MARKER_EOI: u16 = 0xFFD9;
const MARKER_APP0: u16 = 0xFFE0;
const MARKER_APP1: u16 = 0xFFE1;
const MARKER_APP2: u16 = 0xFFE2;
const MARKER_APP3: u16 = 0xFFE3;
const MARKER_APP4: u16 = 0xFFE4;
const MARKER_APP10: u16 = 0xFFEA;
const MARKER_APP12: u16 = 0xFFEC;
const MARKER_APP13: u16 = 0xFFED;
const MARKER_APP14: u16 = 0xFFEE;
const MARKER_DQT: u16 = 0xFFDB;
const MARKER_DHT: u16 = 0xFFC4;
const MARKER_SOF0: u16 = 0xFFC0;
const MARKER_SOF2: u16 = 0xFFC2;
const MARKER_DRI: u16 = 0xFFDD;
const MARKER_COM: u16 = 0xFFFE;
const MARKER_SOS: u16 = 0xFFDA;

/// 'JFIF' APP0 identifier.
const JFIF_IDENTIFIER: u32 = 0x4A46_4946;

/// 'SCRC' sentinel in the high half of an 8-byte checksum comment.
const CHECKSUM_SENTINEL: u32 = 0x5343_5243;

/// Decoded JPEG model. Raw sub-blobs (tables, SOF payload, scan span, EXIF
/// segment bytes) round-trip verbatim through `save`.
#[derive(Debug, Default)]
pub struct Jpeg {
    jfif_version: u16,
    density_units: u8,
    x_density: u16,
    y_density: u16,
    x_thumbnail: u8,
    y_thumbnail: u8,
    thumbnail: Vec<u8>,
    quantization_tables: Vec<Vec<u8>>,
    huffman_tables: Vec<Vec<u8>>,
    comments: Vec<Vec<u8>>,
    sof_marker: u16,
    frame: Option<Vec<u8>>,
    scan_header: Option<Vec<u8>>,
    scan_data: Option<Vec<u8>>,
    exif: Option<Vec<u8>>,
    image_time: Option<NaiveDateTime>,
}

impl Jpeg {
    pub fn load(data: &[u8]) -> Result<Self> {
        let mut jpeg = Jpeg::default();
        let mut cursor = Cursor::new(data.to_vec(), ByteOrder::Big);
        let end = cursor.len();
        records(&mut cursor, end, |c| jpeg.parse_marker(c))?;
        Ok(jpeg)
    }

    pub fn load_file(path: impl AsRef<std::path::Path>) -> Result<Self> {
        Jpeg::load(&std::fs::read(path)?)
    }

    fn parse_marker(&mut self, c: &mut Cursor) -> Result<Walk> {
        let marker = c.read_u16()?;
        match marker {
            MARKER_SOI => {}

            MARKER_APP0 => {
                // The segment length field includes its own 2 bytes.
                let _length = c.read_u16()?.saturating_sub(2) as usize;
                let identifier = c.read_u32()?;
                let _terminator = c.read_u8()?;
                if identifier != JFIF_IDENTIFIER {
                    return Err(Error::Format("unsupported APP0 identifier"));
                }
                self.jfif_version = c.read_u16()?;
                self.density_units = c.read_u8()?;
                self.x_density = c.read_u16()?;
                self.y_density = c.read_u16()?;
                self.x_thumbnail = c.read_u8()?;
                self.y_thumbnail = c.read_u8()?;
                let thumb_len = self.x_thumbnail as usize * self.y_thumbnail as usize * 3;
                self.thumbnail = c.read_bytes(thumb_len)?;
            }

            MARKER_APP1 | MARKER_APP3 => {
                let length = c.read_u16()?.saturating_sub(2) as usize;
                let seg_start = c.position();
                let signature = c.read_string(4)?;
                match signature.as_str() {
                    "Exif" | "Meta" => {
                        c.skip(2)?;
                        if signature == "Exif" {
                            self.exif = Some(c.data()[seg_start..seg_start + length].to_vec());
                        }
                        // The embedded TIFF declares its own byte order.
                        let saved_order = c.byte_order();
                        let tiff = Tiff::parse(c);
                        c.set_byte_order(saved_order);
                        let tiff = tiff?;
                        if self.image_time.is_none() {
                            self.image_time = tiff.image_time();
                        }
                    }
                    "http" | "XMP\0" => {
                        let url = c.read_nt_string()?;
                        let text_length = length.saturating_sub(url.len() + 5);
                        let text = c.read_string(text_length)?;
                        let text = text.trim_matches([' ', '\r', '\n', '\0']);
                        if let Some(dt) = xmp::creation_date(text) {
                            self.image_time = Some(dt);
                        }
                    }
                    _ => return Err(Error::Format("unrecognized APP1/APP3 signature")),
                }
                c.seek(seg_start + length)?;
            }

            MARKER_APP13 => {
                let length = c.read_u16()?.saturating_sub(2) as usize;
                if let Some(dt) = irb::parse(c, length)? {
                    self.image_time = Some(dt);
                }
            }

            // ICC profile, FlashPix, PhoTags, Ducky, Adobe DCT, restart interval.
            MARKER_APP2 | MARKER_APP4 | MARKER_APP10 | MARKER_APP12 | MARKER_APP14
            | MARKER_DRI => {
                let length = c.read_u16()?.saturating_sub(2) as usize;
                c.skip(length)?;
            }

            MARKER_DQT => {
                let length = c.read_u16()?.saturating_sub(2) as usize;
                self.quantization_tables.push(c.read_bytes(length)?);
            }

            MARKER_DHT => {
                let length = c.read_u16()?.saturating_sub(2) as usize;
                self.huffman_tables.push(c.read_bytes(length)?);
            }

            MARKER_SOF0 | MARKER_SOF2 => {
                let length = c.read_u16()?.saturating_sub(2) as usize;
                self.sof_marker = marker;
                self.frame = Some(c.read_bytes(length)?);
            }

            MARKER_COM => {
                let length = c.read_u16()?.saturating_sub(2) as usize;
                self.comments.push(c.read_bytes(length)?);
            }

            MARKER_SOS => {
                let length = c.read_u16()?.saturating_sub(2) as usize;
                self.scan_header = Some(c.read_bytes(length)?);
                // No further markers are assumed before the end-of-image
                // marker; the rest of the input is one raw scan span.
                let scan_length = c.len().saturating_sub(c.position() + 2);
                self.scan_data = Some(c.read_bytes(scan_length)?);
                return Ok(Walk::Stop);
            }

            MARKER_EOI => return Ok(Walk::Stop),

            _ => return Err(Error::Format("unrecognized JPEG marker")),
        }
        Ok(Walk::Continue)
    }

    pub fn image_time(&self) -> Option<NaiveDateTime> {
        self.image_time
    }

    /// Frame width from the retained SOF payload.
    pub fn width(&self) -> Option<u32> {
        self.frame
            .as_deref()
            .filter(|f| f.len() >= 5)
            .map(|f| BigEndian::read_u16(&f[3..5]) as u32)
    }

    /// Frame height from the retained SOF payload.
    pub fn height(&self) -> Option<u32> {
        self.frame
            .as_deref()
            .filter(|f| f.len() >= 5)
            .map(|f| BigEndian::read_u16(&f[1..3]) as u32)
    }

    /// Source checksum, stored as an 8-byte big-endian comment whose high
    /// 32 bits are the 'SCRC' sentinel.
    pub fn source_checksum(&self) -> Option<u32> {
        for comment in &self.comments {
            if comment.len() == 8 {
                let value = BigEndian::read_u64(comment);
                if (value >> 32) as u32 == CHECKSUM_SENTINEL {
                    return Some(value as u32);
                }
            }
        }
        None
    }

    /// Replace all comments with a single checksum comment.
    pub fn set_source_checksum(&mut self, checksum: u32) {
        let value = ((CHECKSUM_SENTINEL as u64) << 32) | checksum as u64;
        self.comments = vec![value.to_be_bytes().to_vec()];
    }

    /// Re-serialize the model. Header scalars are re-derived; raw sub-blobs
    /// are emitted verbatim.
    pub fn save(&self) -> Vec<u8> {
        let mut w = Writer::new(ByteOrder::Big);
        w.write_u16(MARKER_SOI);

        w.write_u16(MARKER_APP0);
        w.write_u16(16 + self.thumbnail.len() as u16);
        w.write_u32(JFIF_IDENTIFIER);
        w.write_u8(0);
        w.write_u16(self.jfif_version);
        w.write_u8(self.density_units);
        w.write_u16(self.x_density);
        w.write_u16(self.y_density);
        w.write_u8(self.x_thumbnail);
        w.write_u8(self.y_thumbnail);
        w.write_bytes(&self.thumbnail);

        if let Some(exif) = &self.exif {
            w.write_u16(MARKER_APP1);
            w.write_u16(exif.len() as u16 + 2);
            w.write_bytes(exif);
        }

        for comment in &self.comments {
            w.write_u16(MARKER_COM);
            w.write_u16(comment.len() as u16 + 2);
            w.write_bytes(comment);
        }

        for table in &self.quantization_tables {
            w.write_u16(MARKER_DQT);
            w.write_u16(table.len() as u16 + 2);
            w.write_bytes(table);
        }

        if let Some(frame) = &self.frame {
            let marker = if self.sof_marker != 0 {
                self.sof_marker
            } else {
                MARKER_SOF0
            };
            w.write_u16(marker);
            w.write_u16(frame.len() as u16 + 2);
            w.write_bytes(frame);
        }

        for table in &self.huffman_tables {
            w.write_u16(MARKER_DHT);
            w.write_u16(table.len() as u16 + 2);
            w.write_bytes(table);
        }

        if let (Some(header), Some(data)) = (&self.scan_header, &self.scan_data) {
            w.write_u16(MARKER_SOS);
            w.write_u16(header.len() as u16 + 2);
            w.write_bytes(header);
            w.write_bytes(data);
        } else {
            warn!("saving JPEG without a scan segment");
        }

        w.write_u16(MARKER_EOI);
        w.into_vec()
    }

    pub fn save_file(&self, path: impl AsRef<std::path::Path>) -> Result<()> {
        std::fs::write(path, self.save())?;
        Ok(())
    }
}
