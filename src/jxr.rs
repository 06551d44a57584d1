//! JPEG-XR: flat IFD-style tag list, no recursion.
//!
//! Entries use the TIFF 2+2+4+4 layout. The pixel format tag points at a
//! 16-byte GUID whose first 15 bytes are fixed; only the final byte selects
//! the format. A private tag (0xCFC5) carries the source-image checksum.

use crate::error::{Error, Result};
use crate::stream::{ByteOrder, Cursor, Writer};

/// 'II' + 0xBC01, little-endian.
const JXR_SIGNATURE: u32 = 0x01BC_4949;

const TAG_PIXEL_FORMAT: u16 = 0xBC01;
const TAG_IMAGE_WIDTH: u16 = 0xBC80;
const TAG_IMAGE_HEIGHT: u16 = 0xBC81;
const TAG_IMAGE_OFFSET: u16 = 0xBCC0;
const TAG_IMAGE_BYTE_COUNT: u16 = 0xBCC1;
/// Private tag for the source-image checksum.
const TAG_SOURCE_CHECKSUM: u16 = 0xCFC5;

/// Per-element byte sizes indexed by IFD element type.
const ELEMENT_TYPE_SIZES: [usize; 13] = [0, 1, 1, 2, 4, 8, 1, 1, 2, 4, 8, 4, 8];

/// Fixed prefix of the pixel-format GUID; the 16th byte is the format code.
const PIXEL_FORMAT_GUID_PREFIX: [u8; 15] = [
    0x24, 0xC3, 0xDD, 0x6F, 0x03, 0x4E, 0xFE, 0x4B, 0xB1, 0x85, 0x3D, 0x77, 0x76, 0x8D, 0xC9,
];

/// Decoded JPEG-XR model.
#[derive(Debug, Default)]
pub struct Jxr {
    pixel_format: u8,
    image_width: u32,
    image_height: u32,
    image_data: Vec<u8>,
    source_checksum: Option<u32>,
}

impl Jxr {
    pub fn load(data: &[u8]) -> Result<Self> {
        let mut jxr = Jxr::default();
        let mut c = Cursor::new(data.to_vec(), ByteOrder::Little);
        if c.read_u32()? != JXR_SIGNATURE {
            return Err(Error::Format("missing JPEG-XR signature"));
        }

        let mut image_offset = 0u32;
        let mut image_byte_count = 0u32;
        let mut visited = Vec::new();
        let mut next_ifd_offset = c.read_u32()?;
        while next_ifd_offset != 0 {
            if visited.contains(&next_ifd_offset) {
                return Err(Error::Format("cyclic IFD chain"));
            }
            visited.push(next_ifd_offset);
            c.seek(next_ifd_offset as usize)?;
            let num_entries = c.read_u16()?;
            for _ in 0..num_entries {
                let field_tag = c.read_u16()?;
                let element_type = c.read_u16()? as usize;
                let num_elements = c.read_u32()?;
                let unit = *ELEMENT_TYPE_SIZES
                    .get(element_type)
                    .filter(|&&s| s != 0)
                    .ok_or(Error::Format("unknown IFD element type"))?;
                let element_size = unit * num_elements as usize;

                // The value field is always 4 bytes; larger payloads are
                // reached through an offset stored in it.
                let value_end = c.position() + 4;
                match field_tag {
                    TAG_PIXEL_FORMAT => {
                        let offset = c.read_u32()? as usize;
                        // Skip the fixed GUID prefix; only the last byte matters.
                        jxr.pixel_format =
                            c.visit_at(offset + PIXEL_FORMAT_GUID_PREFIX.len(), |c| {
                                c.read_u8()
                            })?;
                    }
                    TAG_IMAGE_WIDTH => jxr.image_width = read_element(&mut c, element_size)?,
                    TAG_IMAGE_HEIGHT => jxr.image_height = read_element(&mut c, element_size)?,
                    TAG_IMAGE_OFFSET => image_offset = read_element(&mut c, element_size)?,
                    TAG_IMAGE_BYTE_COUNT => {
                        image_byte_count = read_element(&mut c, element_size)?
                    }
                    TAG_SOURCE_CHECKSUM => jxr.source_checksum = Some(c.read_u32()?),
                    _ => {}
                }
                c.seek(value_end)?;
            }
            next_ifd_offset = c.read_u32()?;
        }

        c.seek(image_offset as usize)?;
        jxr.image_data = c.read_bytes(image_byte_count as usize)?;
        Ok(jxr)
    }

    pub fn load_file(path: impl AsRef<std::path::Path>) -> Result<Self> {
        Jxr::load(&std::fs::read(path)?)
    }

    pub fn width(&self) -> u32 {
        self.image_width
    }

    pub fn height(&self) -> u32 {
        self.image_height
    }

    pub fn pixel_format_code(&self) -> u8 {
        self.pixel_format
    }

    pub fn pixel_format_name(&self) -> Result<&'static str> {
        pixel_format_name(self.pixel_format)
            .ok_or(Error::UnknownFormatCode(self.pixel_format as u64))
    }

    pub fn source_checksum(&self) -> Option<u32> {
        self.source_checksum
    }

    pub fn set_source_checksum(&mut self, checksum: u32) {
        self.source_checksum = Some(checksum);
    }

    /// Re-serialize: header, one IFD (five entries, six with a checksum),
    /// the pixel-format GUID, then the image data verbatim.
    pub fn save(&self) -> Vec<u8> {
        let mut w = Writer::new(ByteOrder::Little);
        let num_entries: u32 = if self.source_checksum.is_some() { 6 } else { 5 };
        let ifd_length = 2 + 12 * num_entries + 4;

        w.write_u32(JXR_SIGNATURE);
        w.write_u32(8); // IFD follows the header immediately

        w.write_u16(num_entries as u16);

        w.write_u16(TAG_PIXEL_FORMAT);
        w.write_u16(0x01); // BYTE
        w.write_u32(0x10); // 16-byte GUID
        w.write_u32(8 + ifd_length); // GUID follows the IFD

        w.write_u16(TAG_IMAGE_WIDTH);
        w.write_u16(0x04); // ULONG
        w.write_u32(0x01);
        w.write_u32(self.image_width);

        w.write_u16(TAG_IMAGE_HEIGHT);
        w.write_u16(0x04);
        w.write_u32(0x01);
        w.write_u32(self.image_height);

        w.write_u16(TAG_IMAGE_OFFSET);
        w.write_u16(0x04);
        w.write_u32(0x01);
        w.write_u32(8 + ifd_length + 16); // image data follows the GUID

        w.write_u16(TAG_IMAGE_BYTE_COUNT);
        w.write_u16(0x04);
        w.write_u32(0x01);
        w.write_u32(self.image_data.len() as u32);

        if let Some(checksum) = self.source_checksum {
            w.write_u16(TAG_SOURCE_CHECKSUM);
            w.write_u16(0x01);
            w.write_u32(0x04);
            w.write_u32(checksum);
        }

        w.write_u32(0); // IFD terminator

        w.write_bytes(&PIXEL_FORMAT_GUID_PREFIX);
        w.write_u8(self.pixel_format);
        w.write_bytes(&self.image_data);
        w.into_vec()
    }

    pub fn save_file(&self, path: impl AsRef<std::path::Path>) -> Result<()> {
        std::fs::write(path, self.save())?;
        Ok(())
    }
}

/// Inline IFD values are 1, 2 or 4 bytes wide depending on the element type.
fn read_element(c: &mut Cursor, element_size: usize) -> Result<u32> {
    match element_size {
        1 => Ok(c.read_u8()? as u32),
        2 => Ok(c.read_u16()? as u32),
        _ => c.read_u32(),
    }
}

fn pixel_format_name(code: u8) -> Option<&'static str> {
    Some(match code {
        0x05 => "BlackWhite",
        0x08 => "8bppGray",
        0x09 => "16bppBGR555",
        0x0A => "16bppBGR565",
        0x0B => "16bppGray",
        0x0C => "24bppBGR",
        0x0D => "24bppRGB",
        0x0E => "32bppBGR",
        0x0F => "32bppBGRA",
        0x10 => "32bppPBGRA",
        0x11 => "32bppGrayFloat",
        0x12 => "48bppRGBFixedPoint",
        0x13 => "16bppGrayFixedPoint",
        0x14 => "32bppBGR101010",
        0x15 => "48bppRGB",
        0x16 => "64bppRGBA",
        0x17 => "64bppPRGBA",
        0x18 => "96bppRGBFixedPoint",
        0x19 => "128bppRGBAFloat",
        0x1A => "128bppPRGBAFloat",
        0x1B => "128bppRGBFloat",
        0x1C => "32bppCMYK",
        0x1D => "64bppRGBAFixedPoint",
        0x1E => "128bppRGBAFixedPoint",
        0x1F => "64bppCMYK",
        0x20 => "24bpp3Channels",
        0x21 => "32bpp4Channels",
        0x22 => "40bpp5Channels",
        0x23 => "48bpp6Channels",
        0x24 => "56bpp7Channels",
        0x25 => "64bpp8Channels",
        0x26 => "48bpp3Channels",
        0x27 => "64bpp4Channels",
        0x28 => "80bpp5Channels",
        0x29 => "96bpp6Channels",
        0x2A => "112bpp7Channels",
        0x2B => "128bpp8Channels",
        0x2C => "40bppCMYKAlpha",
        0x2D => "80bppCMYKAlpha",
        0x2E => "32bpp3ChannelsAlpha",
        0x2F => "40bpp4ChannelsAlpha",
        0x30 => "48bpp5ChannelsAlpha",
        0x31 => "56bpp6ChannelsAlpha",
        0x32 => "64bpp7ChannelsAlpha",
        0x33 => "72bpp8ChannelsAlpha",
        0x34 => "64bpp3ChannelsAlpha",
        0x35 => "80bpp4ChannelsAlpha",
        0x36 => "96bpp5ChannelsAlpha",
        0x37 => "112bpp6ChannelsAlpha",
        0x38 => "128bpp7ChannelsAlpha",
        0x39 => "144bpp8ChannelsAlpha",
        0x3A => "64bppRGBAHalf",
        0x3B => "48bppRGBHalf",
        0x3D => "32bppRGBE",
        0x3E => "16bppGrayHalf",
        0x3F => "32bppGrayFixedPoint",
        0x40 => "64bppRGBFixedPoint",
        0x41 => "128bppRGBFixedPoint",
        0x42 => "64bppRGBHalf",
        0x43 => "80bppCMYKDIRECTAlpha",
        0x44 => "12bppYCC420",
        0x45 => "16bppYCC422",
        0x46 => "20bppYCC422",
        0x47 => "32bppYCC422",
        0x48 => "24bppYCC444",
        0x49 => "30bppYCC444",
        0x4A => "48bppYCC444",
        0x4B => "48bppYCC444FixedPoint",
        0x4C => "20bppYCC420Alpha",
        0x4D => "24bppYCC422Alpha",
        0x4E => "30bppYCC422Alpha",
        0x4F => "48bppYCC422Alpha",
        0x50 => "32bppYCC444Alpha",
        0x51 => "40bppYCC444Alpha",
        0x52 => "64bppYCC444Alpha",
        0x53 => "64bppYCC444AlphaFixedPoint",
        0x54 => "32bppCMYKDIRECT",
        0x55 => "64bppCMYKDIRECT",
        0x56 => "40bppCMYKDIRECTAlpha",
        _ => return None,
    })
}
