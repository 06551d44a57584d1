//! Tests for file type detection and top-level inspect().

use whence::{detect_file_type, inspect, FileType};

#[test]
fn detect_jpeg() {
    assert_eq!(detect_file_type(&[0xFF, 0xD8, 0xFF, 0xE0]), FileType::Jpeg);
}

#[test]
fn detect_tiff_both_orders() {
    assert_eq!(detect_file_type(b"II*\x00\x08\x00\x00\x00"), FileType::Tiff);
    assert_eq!(detect_file_type(b"MM\x00*\x00\x00\x00\x08"), FileType::Tiff);
}

#[test]
fn detect_jxr_before_tiff() {
    // JPEG-XR shares the 'II' prefix with little-endian TIFF.
    assert_eq!(
        detect_file_type(&[0x49, 0x49, 0xBC, 0x01, 8, 0, 0, 0]),
        FileType::Jxr
    );
}

#[test]
fn detect_png() {
    assert_eq!(
        detect_file_type(&[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A]),
        FileType::Png
    );
}

#[test]
fn detect_mp4_by_ftyp() {
    let mut data = vec![0, 0, 0, 0x18];
    data.extend_from_slice(b"ftypisom");
    data.extend_from_slice(&[0; 8]);
    assert_eq!(detect_file_type(&data), FileType::Mp4);
}

#[test]
fn detect_avi_not_other_riff() {
    let mut avi = b"RIFF\x00\x00\x00\x00AVI ".to_vec();
    avi.extend_from_slice(&[0; 4]);
    assert_eq!(detect_file_type(&avi), FileType::Avi);
    let wav = b"RIFF\x00\x00\x00\x00WAVEfmt ";
    assert_eq!(detect_file_type(wav), FileType::Unknown);
}

#[test]
fn detect_textures() {
    assert_eq!(
        detect_file_type(&[0xAB, b'K', b'T', b'X', b' ', b'1', b'1', 0xBB]),
        FileType::Ktx
    );
    assert_eq!(detect_file_type(b"PVR\x03\x00\x00\x00\x00"), FileType::Pvr);
    assert_eq!(detect_file_type(b"\x03RVP\x00\x00\x00\x00"), FileType::Pvr);
    assert_eq!(detect_file_type(b"8BPS\x00\x01"), FileType::Psd);
}

#[test]
fn detect_unknown() {
    assert_eq!(detect_file_type(&[0u8; 8]), FileType::Unknown);
    assert_eq!(detect_file_type(&[]), FileType::Unknown);
}

#[test]
fn extensions_and_labels() {
    assert_eq!(FileType::Jpeg.extension(), Some("jpg"));
    assert_eq!(FileType::Unknown.extension(), None);
    assert_eq!(FileType::Ktx.label(), "KTX");
}

#[test]
fn inspect_unknown_input() {
    let report = inspect(&[0u8; 16]).unwrap();
    assert_eq!(report.format, "unknown");
    assert_eq!(report.size_bytes, 16);
    assert_eq!(report.width, None);
    assert_eq!(report.image_time, None);
}

#[test]
fn inspect_psd() {
    let mut v = Vec::new();
    v.extend_from_slice(b"8BPS");
    v.extend_from_slice(&1u16.to_be_bytes());
    v.extend_from_slice(&[0; 6]);
    v.extend_from_slice(&3u16.to_be_bytes());
    v.extend_from_slice(&480u32.to_be_bytes());
    v.extend_from_slice(&640u32.to_be_bytes());
    v.extend_from_slice(&8u16.to_be_bytes());
    v.extend_from_slice(&3u16.to_be_bytes());
    let report = inspect(&v).unwrap();
    assert_eq!(report.format, "PSD");
    assert_eq!(report.width, Some(640));
    assert_eq!(report.height, Some(480));
    assert_eq!(report.pixel_format.as_deref(), Some("RGB"));
}

#[test]
fn inspect_propagates_decode_errors() {
    // A JPEG magic prefix with nothing behind it must fail, not report.
    assert!(inspect(&[0xFF, 0xD8, 0xFF]).is_err());
}
