//! One-shot inspection: detect the format, decode it, and flatten the
//! interesting fields into a single report record.

use chrono::NaiveDateTime;
#[cfg(feature = "serde")]
use serde::Serialize;

use crate::error::Result;
use crate::jpeg::Jpeg;
use crate::jxr::Jxr;
use crate::ktx::Ktx;
use crate::mp4::Mp4;
use crate::png::Png;
use crate::psd::Psd;
use crate::pvr::Pvr;
use crate::riff::Avi;
use crate::tiff::Tiff;
use crate::{detect_file_type, FileType};

/// Flat summary of one decoded file. Fields a format does not carry stay
/// `None`; an unknown pixel-format code leaves only the name absent.
#[derive(Debug, Clone, Default)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct MediaReport {
    /// Format label (e.g. "JPEG", "KTX").
    pub format: String,
    pub width: Option<u32>,
    pub height: Option<u32>,
    /// Numeric pixel-format code, where the format declares one.
    pub pixel_format_code: Option<u64>,
    /// Pixel-format name, when the code is in the format's known table.
    pub pixel_format: Option<String>,
    /// Resolved creation timestamp.
    pub image_time: Option<NaiveDateTime>,
    /// Round-trip source-image checksum, for formats with a defined slot.
    pub source_checksum: Option<u32>,
    /// Size of the input in bytes.
    pub size_bytes: usize,
}

/// Detect the format of `data`, decode it, and summarize.
pub fn inspect(data: &[u8]) -> Result<MediaReport> {
    let file_type = detect_file_type(data);
    let mut report = MediaReport {
        format: file_type.label().to_string(),
        size_bytes: data.len(),
        ..Default::default()
    };
    match file_type {
        FileType::Jpeg => {
            let jpeg = Jpeg::load(data)?;
            report.width = jpeg.width();
            report.height = jpeg.height();
            report.image_time = jpeg.image_time();
            report.source_checksum = jpeg.source_checksum();
        }
        FileType::Tiff => {
            report.image_time = Tiff::load(data)?.image_time();
        }
        FileType::Png => {
            report.image_time = Png::load(data)?.image_time();
        }
        FileType::Mp4 => {
            report.image_time = Mp4::load(data)?.image_time();
        }
        FileType::Avi => {
            report.image_time = Avi::load(data)?.image_time();
        }
        FileType::Jxr => {
            let jxr = Jxr::load(data)?;
            report.width = Some(jxr.width());
            report.height = Some(jxr.height());
            report.pixel_format_code = Some(jxr.pixel_format_code() as u64);
            report.pixel_format = jxr.pixel_format_name().ok().map(str::to_string);
            report.source_checksum = jxr.source_checksum();
        }
        FileType::Ktx => {
            let ktx = Ktx::load(data)?;
            report.width = Some(ktx.width());
            report.height = Some(ktx.height());
            report.pixel_format_code = Some(ktx.pixel_format_code() as u64);
            report.pixel_format = ktx.pixel_format_name().ok().map(str::to_string);
            report.source_checksum = ktx.source_checksum();
        }
        FileType::Pvr => {
            let pvr = Pvr::load(data)?;
            report.width = Some(pvr.width());
            report.height = Some(pvr.height());
            report.pixel_format_code = Some(pvr.pixel_format_code());
            report.pixel_format = pvr.pixel_format_name().ok();
            report.source_checksum = pvr.source_checksum();
        }
        FileType::Psd => {
            let psd = Psd::load(data)?;
            report.width = Some(psd.width());
            report.height = Some(psd.height());
            report.pixel_format_code = Some(psd.color_mode() as u64);
            report.pixel_format = psd.color_mode_name().ok().map(str::to_string);
        }
        FileType::Unknown => {}
    }
    Ok(report)
}
