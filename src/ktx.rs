//! KTX 1.1 texture container: flat header, ordered key/value metadata, mips.
//!
//! The metadata region is a length-delimited sequence of 4-byte-padded
//! key/value entries whose insertion order is preserved on save. The header's
//! declared metadata size is recomputed from the final map at save time.

use byteorder::{ByteOrder as _, LittleEndian};
use indexmap::IndexMap;

use crate::error::{Error, Result};
use crate::stream::{ByteOrder, Cursor, Writer};
use crate::walk::{records, Walk};

const KTX_IDENTIFIER: [u8; 12] = [
    0xAB, b'K', b'T', b'X', b' ', b'1', b'1', 0xBB, 0x0D, 0x0A, 0x1A, 0x0A,
];

/// Endianness word as read when the file's byte order differs from ours.
const ENDIANNESS_SWAPPED: u32 = 0x0102_0304;
/// Endianness word a little-endian writer emits.
const ENDIANNESS_NATIVE: u32 = 0x0403_0201;

/// Metadata key for the source-image checksum.
const CHECKSUM_KEY: &str = "SCRC";

/// Decoded KTX model.
#[derive(Debug, Default)]
pub struct Ktx {
    gl_type: u32,
    gl_type_size: u32,
    gl_format: u32,
    gl_internal_format: u32,
    gl_base_internal_format: u32,
    pixel_width: u32,
    pixel_height: u32,
    pixel_depth: u32,
    num_array_elements: u32,
    num_faces: u32,
    num_mipmaps: u32,
    metadata: IndexMap<String, Vec<u8>>,
    mip_images: Vec<Vec<u8>>,
}

impl Ktx {
    pub fn load(data: &[u8]) -> Result<Self> {
        let mut ktx = Ktx::default();
        let mut c = Cursor::new(data.to_vec(), ByteOrder::Little);

        if c.read_bytes(12)? != KTX_IDENTIFIER {
            return Err(Error::Format("missing KTX identifier"));
        }
        let endianness = c.read_u32()?;
        if endianness == ENDIANNESS_SWAPPED {
            c.set_byte_order(ByteOrder::Big);
        } else if endianness != ENDIANNESS_NATIVE {
            return Err(Error::Format("bad KTX endianness word"));
        }
        ktx.gl_type = c.read_u32()?;
        ktx.gl_type_size = c.read_u32()?;
        ktx.gl_format = c.read_u32()?;
        ktx.gl_internal_format = c.read_u32()?;
        ktx.gl_base_internal_format = c.read_u32()?;
        ktx.pixel_width = c.read_u32()?;
        ktx.pixel_height = c.read_u32()?;
        ktx.pixel_depth = c.read_u32()?;
        ktx.num_array_elements = c.read_u32()?;
        ktx.num_faces = c.read_u32()?;
        ktx.num_mipmaps = c.read_u32()?;
        let metadata_size = c.read_u32()? as usize;

        // Key/value metadata: each entry is a declared byte count, a
        // NUL-terminated key, the value bytes, then padding to 4 bytes
        // computed from the declared count.
        let metadata_end = c.position() + metadata_size;
        records(&mut c, metadata_end, |c| {
            let kv_pair_size = c.read_u32()? as usize;
            let kv_pair_end = c.position() + kv_pair_size;
            let key = c.read_nt_string()?;
            let value = c.read_bytes(kv_pair_end.saturating_sub(c.position()))?;
            c.skip(entry_padding(kv_pair_size))?;
            ktx.metadata.insert(key, value);
            Ok(Walk::Continue)
        })?;

        for _ in 0..ktx.num_mipmaps {
            let mip_size = c.read_u32()? as usize;
            // Mip levels are padded to 4 bytes.
            let mip_size = (mip_size + 3) & !3;
            ktx.mip_images.push(c.read_bytes(mip_size)?);
        }
        Ok(ktx)
    }

    pub fn load_file(path: impl AsRef<std::path::Path>) -> Result<Self> {
        Ktx::load(&std::fs::read(path)?)
    }

    pub fn width(&self) -> u32 {
        self.pixel_width
    }

    pub fn height(&self) -> u32 {
        self.pixel_height
    }

    pub fn num_mipmaps(&self) -> u32 {
        self.num_mipmaps
    }

    pub fn pixel_format_code(&self) -> u32 {
        self.gl_internal_format
    }

    pub fn pixel_format_name(&self) -> Result<&'static str> {
        match self.gl_internal_format {
            0x8C92 => Ok("ATC_RGB"),
            0x8C93 => Ok("ATC_RGBA"),    // explicit alpha
            0x87EE => Ok("ATC_RGBA_IA"), // interpolated alpha
            0x83F0 => Ok("RGB_DXT1"),
            0x83F1 => Ok("RGBA_DXT1"),
            0x83F2 => Ok("RGBA_DXT3"),
            0x83F3 => Ok("RGBA_DXT5"),
            _ => Err(Error::UnknownFormatCode(self.gl_internal_format as u64)),
        }
    }

    /// Ordered vendor metadata map.
    pub fn metadata(&self) -> &IndexMap<String, Vec<u8>> {
        &self.metadata
    }

    pub fn source_checksum(&self) -> Option<u32> {
        self.metadata
            .get(CHECKSUM_KEY)
            .filter(|v| v.len() >= 4)
            .map(|v| LittleEndian::read_u32(v))
    }

    pub fn set_source_checksum(&mut self, checksum: u32) {
        self.metadata
            .insert(CHECKSUM_KEY.to_string(), checksum.to_le_bytes().to_vec());
    }

    /// Re-serialize; the declared metadata size is derived from the final
    /// metadata map, never patched incrementally.
    pub fn save(&self) -> Vec<u8> {
        let mut w = Writer::new(ByteOrder::Little);
        w.write_bytes(&KTX_IDENTIFIER);
        w.write_u32(ENDIANNESS_NATIVE);
        w.write_u32(self.gl_type);
        w.write_u32(self.gl_type_size);
        w.write_u32(self.gl_format);
        w.write_u32(self.gl_internal_format);
        w.write_u32(self.gl_base_internal_format);
        w.write_u32(self.pixel_width);
        w.write_u32(self.pixel_height);
        w.write_u32(self.pixel_depth);
        w.write_u32(self.num_array_elements);
        w.write_u32(self.num_faces);
        w.write_u32(self.num_mipmaps);

        let metadata_size: usize = self
            .metadata
            .iter()
            .map(|(key, value)| {
                let entry = key.len() + 1 + value.len();
                4 + entry + entry_padding(entry)
            })
            .sum();
        w.write_u32(metadata_size as u32);

        for (key, value) in &self.metadata {
            let entry = key.len() + 1 + value.len();
            w.write_u32(entry as u32);
            w.write_str(key);
            w.write_u8(0);
            w.write_bytes(value);
            for _ in 0..entry_padding(entry) {
                w.write_u8(0);
            }
        }

        for mip in &self.mip_images {
            w.write_u32(mip.len() as u32);
            w.write_bytes(mip);
        }
        w.into_vec()
    }

    pub fn save_file(&self, path: impl AsRef<std::path::Path>) -> Result<()> {
        std::fs::write(path, self.save())?;
        Ok(())
    }
}

/// Padding to the next 4-byte boundary, from the declared entry size.
fn entry_padding(declared_size: usize) -> usize {
    3 - ((declared_size + 3) % 4)
}
