//! Photoshop PSD: fixed big-endian file header, no recursion.

use crate::error::{Error, Result};
use crate::stream::{ByteOrder, Cursor};

/// '8BPS'.
const PSD_SIGNATURE: u32 = 0x3842_5053;

const COLOR_MODE_NAMES: &[&str] = &[
    "Bitmap",
    "Grayscale",
    "Indexed",
    "RGB",
    "CMYK",
    "Multichannel",
    "Duotone",
    "Lab",
];

/// Decoded PSD header.
#[derive(Debug, Default)]
pub struct Psd {
    version: u16,
    num_channels: u16,
    height: u32,
    width: u32,
    depth: u16,
    color_mode: u16,
}

impl Psd {
    pub fn load(data: &[u8]) -> Result<Self> {
        let mut c = Cursor::new(data.to_vec(), ByteOrder::Big);
        if c.read_u32()? != PSD_SIGNATURE {
            return Err(Error::Format("missing PSD signature"));
        }
        let version = c.read_u16()?;
        c.skip(6)?; // reserved
        Ok(Psd {
            version,
            num_channels: c.read_u16()?,
            height: c.read_u32()?,
            width: c.read_u32()?,
            depth: c.read_u16()?,
            color_mode: c.read_u16()?,
        })
    }

    pub fn load_file(path: impl AsRef<std::path::Path>) -> Result<Self> {
        Psd::load(&std::fs::read(path)?)
    }

    pub fn version(&self) -> u16 {
        self.version
    }

    pub fn num_channels(&self) -> u16 {
        self.num_channels
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Bits per channel.
    pub fn depth(&self) -> u16 {
        self.depth
    }

    pub fn color_mode(&self) -> u16 {
        self.color_mode
    }

    pub fn color_mode_name(&self) -> Result<&'static str> {
        COLOR_MODE_NAMES
            .get(self.color_mode as usize)
            .copied()
            .ok_or(Error::UnknownFormatCode(self.color_mode as u64))
    }
}
