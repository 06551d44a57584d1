//! PVR3 texture container: 52-byte header, FourCC metadata blocks, image data.
//!
//! Known `PVR\x03` metadata blocks (keys 0-5) are kept verbatim for save;
//! the `'SCRC'` block carries the source-image checksum. The header's
//! declared metadata size is recomputed from the retained blocks at save time.

use crate::error::{Error, Result};
use crate::stream::{ByteOrder, Cursor, Writer};
use crate::walk::{records, Walk};

/// 'PVR\x03' read by a little-endian cursor.
const PVR_VERSION: u32 = 0x0352_5650;
/// Version word as read when the file was written big-endian.
const PVR_VERSION_SWAPPED: u32 = 0x5056_5203;

/// FourCC of the PVR3 standard metadata blocks.
const FOURCC_PVR3: u32 = 0x0352_5650;
/// FourCC of the custom source-checksum block.
const FOURCC_CHECKSUM: u32 = 0x4352_4353;

/// (name, bits per pixel, min width, min height) indexed by format code.
/// A bits-per-pixel of 0 marks formats whose packing has not been specified.
const PIXEL_FORMATS: &[(&str, u32, u32, u32)] = &[
    ("PVRTC1_2_RGB", 2, 16, 8),
    ("PVRTC1_2", 2, 16, 8),
    ("PVRTC1_4_RGB", 4, 8, 8),
    ("PVRTC1_4", 4, 8, 8),
    ("PVRTC2_2", 2, 8, 4),
    ("PVRTC2_4", 4, 4, 4),
    ("ETC1", 4, 4, 4),
    ("DXT1", 4, 4, 4),
    ("DXT2", 4, 4, 4),
    ("DXT3", 4, 4, 4),
    ("DXT4", 4, 4, 4),
    ("DXT5", 8, 4, 4),
    ("BC4", 8, 4, 4),
    ("BC5", 0, 4, 4),
    ("BC6", 0, 1, 1),
    ("BC7", 0, 1, 1),
    ("UYVY", 8, 2, 1),
    ("YUY2", 8, 2, 1),
    ("1BPP", 1, 8, 1),
    ("RGBE9995", 32, 1, 1),
    ("RGBG8888", 32, 2, 1),
    ("GRGB8888", 32, 2, 1),
    ("ETC2_RGB", 4, 1, 1),
    ("ETC2_RGBA", 4, 1, 1),
    ("ETC2_RGB A1", 4, 1, 1),
    ("EAC_R11", 0, 1, 1),
    ("EAC_RG11", 0, 1, 1),
    ("ASTC_4x4", 0, 1, 1),
    ("ASTC_5x4", 0, 1, 1),
    ("ASTC_5x5", 0, 1, 1),
    ("ASTC_6x5", 0, 1, 1),
    ("ASTC_6x6", 0, 1, 1),
    ("ASTC_8x5", 0, 1, 1),
    ("ASTC_8x6", 0, 1, 1),
    ("ASTC_8x8", 0, 1, 1),
    ("ASTC_10x5", 0, 1, 1),
    ("ASTC_10x6", 0, 1, 1),
    ("ASTC_10x8", 0, 1, 1),
    ("ASTC_10x10", 0, 1, 1),
    ("ASTC_12x10", 0, 1, 1),
    ("ASTC_12x12", 0, 1, 1),
    ("ASTC_3x3x3", 0, 1, 1),
    ("ASTC_4x3x3", 0, 1, 1),
    ("ASTC_4x4x3", 0, 1, 1),
    ("ASTC_4x4x4", 0, 1, 1),
    ("ASTC_5x4x4", 0, 1, 1),
    ("ASTC_5x5x4", 0, 1, 1),
    ("ASTC_5x5x5", 0, 1, 1),
    ("ASTC_6x5x5", 0, 1, 1),
    ("ASTC_6x6x5", 0, 1, 1),
    ("ASTC_6x6x6", 0, 1, 1),
];

/// Decoded PVR model.
#[derive(Debug, Default)]
pub struct Pvr {
    flags: u32,
    pixel_format: u64,
    color_space: u32,
    channel_type: u32,
    height: u32,
    width: u32,
    depth: u32,
    num_surfaces: u32,
    num_faces: u32,
    num_mipmaps: u32,
    image_data: Vec<u8>,
    source_checksum: Option<u32>,
    meta_texture_atlas: Option<Vec<u8>>,
    meta_normal_map: Option<Vec<u8>>,
    meta_cube_map_order: Option<Vec<u8>>,
    meta_texture_orientation: Option<Vec<u8>>,
    meta_texture_border: Option<Vec<u8>>,
    meta_padding: Option<Vec<u8>>,
}

impl Pvr {
    pub fn load(data: &[u8]) -> Result<Self> {
        let mut pvr = Pvr::default();
        let mut c = Cursor::new(data.to_vec(), ByteOrder::Little);

        match c.read_u32()? {
            PVR_VERSION => {}
            PVR_VERSION_SWAPPED => c.set_byte_order(ByteOrder::Big),
            _ => return Err(Error::Format("missing PVR version word")),
        }
        pvr.flags = c.read_u32()?;
        pvr.pixel_format = c.read_u64()?;
        pvr.color_space = c.read_u32()?;
        pvr.channel_type = c.read_u32()?;
        pvr.height = c.read_u32()?;
        pvr.width = c.read_u32()?;
        pvr.depth = c.read_u32()?;
        pvr.num_surfaces = c.read_u32()?;
        pvr.num_faces = c.read_u32()?;
        pvr.num_mipmaps = c.read_u32()?;
        let metadata_size = c.read_u32()? as usize;

        let metadata_end = c.position() + metadata_size;
        records(&mut c, metadata_end, |c| {
            let fourcc = c.read_u32()?;
            let key = c.read_u32()?;
            let size = c.read_u32()? as usize;
            let block_end = c.position() + size;
            if fourcc == FOURCC_PVR3 {
                let slot = match key {
                    0 => Some(&mut pvr.meta_texture_atlas),
                    1 => Some(&mut pvr.meta_normal_map),
                    2 => Some(&mut pvr.meta_cube_map_order),
                    3 => Some(&mut pvr.meta_texture_orientation),
                    4 => Some(&mut pvr.meta_texture_border),
                    5 => Some(&mut pvr.meta_padding),
                    _ => None,
                };
                match slot {
                    Some(slot) => *slot = Some(c.read_bytes(size)?),
                    None => c.skip(size)?,
                }
            } else if fourcc == FOURCC_CHECKSUM {
                pvr.source_checksum = Some(c.read_u32()?);
                // Honor the declared block size even if it is not 4.
                c.seek(block_end.min(c.len()))?;
            } else {
                c.skip(size)?;
            }
            Ok(Walk::Continue)
        })?;

        let remaining = c.len() - c.position();
        pvr.image_data = c.read_bytes(remaining)?;
        Ok(pvr)
    }

    pub fn load_file(path: impl AsRef<std::path::Path>) -> Result<Self> {
        Pvr::load(&std::fs::read(path)?)
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn num_mipmaps(&self) -> u32 {
        self.num_mipmaps
    }

    pub fn pixel_format_code(&self) -> u64 {
        self.pixel_format
    }

    /// Format name: a table lookup for enumerated codes, or a synthesized
    /// channel string (e.g. "r8g8b8a8") for channel-packed formats where the
    /// high word names the channels and the low word gives their bit counts.
    pub fn pixel_format_name(&self) -> Result<String> {
        if self.pixel_format >> 32 == 0 {
            let (name, _, _, _) = PIXEL_FORMATS
                .get(self.pixel_format as usize)
                .ok_or(Error::UnknownFormatCode(self.pixel_format))?;
            return Ok((*name).to_string());
        }
        let channel_names = (self.pixel_format >> 32) as u32;
        let channel_bits = self.pixel_format as u32;
        let mut name = String::new();
        for shift in [24u32, 16, 8, 0] {
            let channel_name = (channel_names >> shift) & 0xFF;
            let bit_count = (channel_bits >> shift) & 0xFF;
            if channel_name != 0 && bit_count != 0 {
                name.push(channel_name as u8 as char);
                name.push_str(&bit_count.to_string());
            }
        }
        Ok(name)
    }

    /// Bits per pixel: from the format table, or the sum of channel bit
    /// counts for channel-packed formats.
    pub fn bits_per_pixel(&self) -> Result<u32> {
        if self.pixel_format >> 32 == 0 {
            let (_, bpp, _, _) = PIXEL_FORMATS
                .get(self.pixel_format as usize)
                .ok_or(Error::UnknownFormatCode(self.pixel_format))?;
            return Ok(*bpp);
        }
        let channel_bits = self.pixel_format as u32;
        Ok((0..4).map(|i| (channel_bits >> (i * 8)) & 0xFF).sum())
    }

    pub fn source_checksum(&self) -> Option<u32> {
        self.source_checksum
    }

    pub fn set_source_checksum(&mut self, checksum: u32) {
        self.source_checksum = Some(checksum);
    }

    /// Re-serialize; the declared metadata size is derived from the blocks
    /// actually present.
    pub fn save(&self) -> Vec<u8> {
        let mut w = Writer::new(ByteOrder::Little);
        w.write_u32(PVR_VERSION);
        w.write_u32(self.flags);
        w.write_u64(self.pixel_format);
        w.write_u32(self.color_space);
        w.write_u32(self.channel_type);
        w.write_u32(self.height);
        w.write_u32(self.width);
        w.write_u32(self.depth);
        w.write_u32(self.num_surfaces);
        w.write_u32(self.num_faces);
        w.write_u32(self.num_mipmaps);

        let pvr3_blocks = [
            &self.meta_texture_atlas,
            &self.meta_normal_map,
            &self.meta_cube_map_order,
            &self.meta_texture_orientation,
            &self.meta_texture_border,
            &self.meta_padding,
        ];
        let mut metadata_size: usize = pvr3_blocks
            .iter()
            .filter_map(|b| b.as_ref().map(|v| 12 + v.len()))
            .sum();
        if self.source_checksum.is_some() {
            metadata_size += 16;
        }
        w.write_u32(metadata_size as u32);

        for (key, block) in pvr3_blocks.into_iter().enumerate() {
            if let Some(value) = block {
                w.write_u32(FOURCC_PVR3);
                w.write_u32(key as u32);
                w.write_u32(value.len() as u32);
                w.write_bytes(value);
            }
        }
        if let Some(checksum) = self.source_checksum {
            w.write_u32(FOURCC_CHECKSUM);
            w.write_u32(0);
            w.write_u32(4);
            w.write_u32(checksum);
        }

        w.write_bytes(&self.image_data);
        w.into_vec()
    }

    pub fn save_file(&self, path: impl AsRef<std::path::Path>) -> Result<()> {
        std::fs::write(path, self.save())?;
        Ok(())
    }
}
