//! # whence
//!
//! Library for pulling embedded creation timestamps and structural metadata
//! (dimensions, pixel/channel format, mip counts) out of chunk- and
//! box-structured container formats, and for round-tripping a 32-bit
//! "source checksum" through format-native metadata slots so a derived
//! texture can be traced back to the image it was generated from.
//!
//! ## Supported formats
//!
//! - **JPEG** — EXIF (APP1/APP3), XMP, IPTC (APP13 Adobe IRB) dates;
//!   checksum in an `'SCRC'` comment segment; re-serialization.
//! - **TIFF/EXIF** — IFD chain dates, also used for EXIF blocks embedded in
//!   JPEG and HEIF.
//! - **MP4/HEIF** — `mvhd` creation time, iTunes `©day`, HEIF `Exif` item
//!   resolved through `iinf`/`infe`/`iloc`.
//! - **RIFF/AVI** — `ICRD`/`IDIT` chunks.
//! - **PNG** — `tIME` chunk, XMP in `iTXt`.
//! - **JPEG-XR / KTX / PVR** — texture headers (dimensions, pixel format,
//!   mip counts), checksum in a private IFD tag / metadata key / FourCC
//!   block; re-serialization.
//! - **PSD** — header fields only.
//!
//! Decoding is synchronous and single-pass: one in-memory buffer, one cursor.
//! Each decode owns its cursor, so independent files can be processed
//! concurrently without shared state.
//!
//! ## Example
//!
//! ```no_run
//! use whence::ktx::Ktx;
//!
//! let bytes = std::fs::read("albedo.ktx").unwrap();
//! let mut ktx = Ktx::load(&bytes).unwrap();
//! ktx.set_source_checksum(0xDEAD_BEEF);
//! std::fs::write("albedo.ktx", ktx.save()).unwrap();
//! ```

pub mod date;
mod error;
pub mod jpeg;
pub mod jxr;
pub mod ktx;
pub mod mp4;
pub mod png;
pub mod psd;
pub mod pvr;
mod report;
pub mod riff;
pub mod stream;
pub mod tiff;
pub mod walk;
pub mod xmp;

pub use error::{Error, Result};
pub use report::{inspect, MediaReport};

/// File type hint for routing (by magic bytes).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum FileType {
    Jpeg,
    Tiff,
    Png,
    Mp4,
    Avi,
    Jxr,
    Ktx,
    Pvr,
    Psd,
    Unknown,
}

impl FileType {
    /// Preferred extension for this type; `None` for Unknown.
    pub fn extension(self) -> Option<&'static str> {
        match self {
            FileType::Jpeg => Some("jpg"),
            FileType::Tiff => Some("tif"),
            FileType::Png => Some("png"),
            FileType::Mp4 => Some("mp4"),
            FileType::Avi => Some("avi"),
            FileType::Jxr => Some("jxr"),
            FileType::Ktx => Some("ktx"),
            FileType::Pvr => Some("pvr"),
            FileType::Psd => Some("psd"),
            FileType::Unknown => None,
        }
    }

    /// Short label for display.
    pub fn label(self) -> &'static str {
        match self {
            FileType::Jpeg => "JPEG",
            FileType::Tiff => "TIFF",
            FileType::Png => "PNG",
            FileType::Mp4 => "MP4/HEIF",
            FileType::Avi => "RIFF/AVI",
            FileType::Jxr => "JPEG-XR",
            FileType::Ktx => "KTX",
            FileType::Pvr => "PVR",
            FileType::Psd => "PSD",
            FileType::Unknown => "unknown",
        }
    }
}

/// Detect file type from magic bytes (no extension needed).
#[inline]
pub fn detect_file_type(data: &[u8]) -> FileType {
    if data.starts_with(&[0xFF, 0xD8, 0xFF]) {
        return FileType::Jpeg;
    }
    if data.starts_with(&[0x89, b'P', b'N', b'G']) {
        return FileType::Png;
    }
    // JPEG-XR shares TIFF's 'II' prefix but follows it with 0xBC01, not 42.
    if data.starts_with(&[0x49, 0x49, 0xBC, 0x01]) {
        return FileType::Jxr;
    }
    if data.starts_with(b"II*\0") || data.starts_with(b"MM\0*") {
        return FileType::Tiff;
    }
    if data.len() >= 12 && &data[4..8] == b"ftyp" {
        return FileType::Mp4;
    }
    if data.starts_with(b"RIFF") && data.len() >= 12 && &data[8..12] == b"AVI " {
        return FileType::Avi;
    }
    if data.starts_with(&[0xAB, b'K', b'T', b'X', b' ', b'1', b'1', 0xBB]) {
        return FileType::Ktx;
    }
    if data.starts_with(b"PVR\x03") || data.starts_with(b"\x03RVP") {
        return FileType::Pvr;
    }
    if data.starts_with(b"8BPS") {
        return FileType::Psd;
    }
    FileType::Unknown
}
