//! JPEG segment parsing, metadata dates, and checksum round-trip tests.

use chrono::{NaiveDate, NaiveDateTime};
use whence::jpeg::Jpeg;

fn dt(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(y, mo, d)
        .unwrap()
        .and_hms_opt(h, mi, s)
        .unwrap()
}

/// Marker segment: marker, length (payload + 2), payload.
fn seg(marker: u16, payload: &[u8]) -> Vec<u8> {
    let mut v = Vec::new();
    v.extend_from_slice(&marker.to_be_bytes());
    v.extend_from_slice(&(payload.len() as u16 + 2).to_be_bytes());
    v.extend_from_slice(payload);
    v
}

fn app0_payload() -> Vec<u8> {
    let mut p = Vec::new();
    p.extend_from_slice(b"JFIF\0");
    p.extend_from_slice(&0x0102u16.to_be_bytes());
    p.push(0); // density units
    p.extend_from_slice(&72u16.to_be_bytes());
    p.extend_from_slice(&72u16.to_be_bytes());
    p.push(0); // no thumbnail
    p.push(0);
    p
}

/// 32x16 baseline JPEG with `inserts` spliced in after APP0.
fn base_jpeg(inserts: &[Vec<u8>]) -> Vec<u8> {
    let mut v = vec![0xFF, 0xD8];
    v.extend_from_slice(&seg(0xFFE0, &app0_payload()));
    for insert in inserts {
        v.extend_from_slice(insert);
    }
    v.extend_from_slice(&seg(0xFFDB, &[0, 1, 2, 3]));
    v.extend_from_slice(&seg(0xFFC0, &[8, 0, 16, 0, 32, 1, 1, 0x11, 0]));
    v.extend_from_slice(&seg(0xFFC4, &[0, 1, 2, 3]));
    v.extend_from_slice(&seg(0xFFDA, &[1, 1, 0, 0, 63, 0]));
    v.extend_from_slice(&[0xAA, 0xBB, 0xCC]);
    v.extend_from_slice(&[0xFF, 0xD9]);
    v
}

/// Minimal little-endian TIFF with a DateTimeOriginal string.
fn exif_tiff(date: &str) -> Vec<u8> {
    let mut v = Vec::new();
    v.extend_from_slice(b"II");
    v.extend_from_slice(&42u16.to_le_bytes());
    v.extend_from_slice(&8u32.to_le_bytes());
    v.extend_from_slice(&1u16.to_le_bytes());
    v.extend_from_slice(&0x9003u16.to_le_bytes());
    v.extend_from_slice(&2u16.to_le_bytes());
    v.extend_from_slice(&(date.len() as u32 + 1).to_le_bytes());
    v.extend_from_slice(&26u32.to_le_bytes());
    v.extend_from_slice(&0u32.to_le_bytes());
    v.extend_from_slice(date.as_bytes());
    v.push(0);
    v
}

#[test]
fn reports_frame_dimensions() {
    let jpeg = Jpeg::load(&base_jpeg(&[])).unwrap();
    assert_eq!(jpeg.width(), Some(32));
    assert_eq!(jpeg.height(), Some(16));
    assert_eq!(jpeg.image_time(), None);
    assert_eq!(jpeg.source_checksum(), None);
}

#[test]
fn checksum_comment_is_read() {
    let value = (0x5343_5243u64 << 32) | 0xDEAD_BEEF;
    let jpeg = Jpeg::load(&base_jpeg(&[seg(0xFFFE, &value.to_be_bytes())])).unwrap();
    assert_eq!(jpeg.source_checksum(), Some(0xDEAD_BEEF));
}

#[test]
fn plain_comment_is_not_a_checksum() {
    let jpeg = Jpeg::load(&base_jpeg(&[seg(0xFFFE, b"hello123")])).unwrap();
    assert_eq!(jpeg.source_checksum(), None);
    let jpeg = Jpeg::load(&base_jpeg(&[seg(0xFFFE, b"hi")])).unwrap();
    assert_eq!(jpeg.source_checksum(), None);
}

#[test]
fn checksum_survives_save_and_reload() {
    let mut jpeg = Jpeg::load(&base_jpeg(&[])).unwrap();
    jpeg.set_source_checksum(7);
    let reloaded = Jpeg::load(&jpeg.save()).unwrap();
    assert_eq!(reloaded.source_checksum(), Some(7));
    assert_eq!(reloaded.width(), Some(32));
    assert_eq!(reloaded.height(), Some(16));
}

#[test]
fn checksum_extremes_round_trip() {
    for value in [0u32, u32::MAX] {
        let mut jpeg = Jpeg::load(&base_jpeg(&[])).unwrap();
        jpeg.set_source_checksum(value);
        let reloaded = Jpeg::load(&jpeg.save()).unwrap();
        assert_eq!(reloaded.source_checksum(), Some(value));
    }
}

#[test]
fn unrecognized_marker_fails() {
    assert!(Jpeg::load(&base_jpeg(&[seg(0xFFC5, &[0, 1])])).is_err());
}

#[test]
fn exif_date_survives_save() {
    let mut payload = b"Exif\0\0".to_vec();
    payload.extend_from_slice(&exif_tiff("2024:04:05 06:07:08"));
    let jpeg = Jpeg::load(&base_jpeg(&[seg(0xFFE1, &payload)])).unwrap();
    assert_eq!(jpeg.image_time(), Some(dt(2024, 4, 5, 6, 7, 8)));
    // The raw EXIF segment is carried through re-serialization.
    let reloaded = Jpeg::load(&jpeg.save()).unwrap();
    assert_eq!(reloaded.image_time(), Some(dt(2024, 4, 5, 6, 7, 8)));
}

#[test]
fn xmp_date_is_read() {
    let xmp = r#"<rdf:RDF xmlns:rdf="http://www.w3.org/1999/02/22-rdf-syntax-ns#"><rdf:Description xmlns:exif="http://ns.adobe.com/exif/1.0/" exif:DateTimeOriginal="2018-09-10T11:12:13"/></rdf:RDF>"#;
    let mut payload = b"http://ns.adobe.com/xap/1.0/\0".to_vec();
    payload.extend_from_slice(xmp.as_bytes());
    let jpeg = Jpeg::load(&base_jpeg(&[seg(0xFFE1, &payload)])).unwrap();
    assert_eq!(jpeg.image_time(), Some(dt(2018, 9, 10, 11, 12, 13)));
}

#[test]
fn iptc_date_is_read() {
    let mut payload = Vec::new();
    payload.extend_from_slice(b"Photoshop 3.0\0");
    payload.extend_from_slice(b"8BIM");
    payload.extend_from_slice(&0x0404u16.to_be_bytes());
    payload.push(0); // empty resource name
    payload.push(0); // name padding
    let mut record = vec![0x1C, 2, 55]; // Date Created
    record.extend_from_slice(&8u16.to_be_bytes());
    record.extend_from_slice(b"20230115");
    payload.extend_from_slice(&(record.len() as u32).to_be_bytes());
    payload.extend_from_slice(&record);
    payload.push(0); // odd data length padding
    let jpeg = Jpeg::load(&base_jpeg(&[seg(0xFFED, &payload)])).unwrap();
    assert_eq!(jpeg.image_time(), Some(dt(2023, 1, 15, 0, 0, 0)));
}

#[test]
fn malformed_iptc_date_is_tolerated() {
    let mut payload = Vec::new();
    payload.extend_from_slice(b"Photoshop 3.0\0");
    payload.extend_from_slice(b"8BIM");
    payload.extend_from_slice(&0x0404u16.to_be_bytes());
    payload.push(0); // empty resource name
    payload.push(0); // name padding
    let mut record = vec![0x1C, 2, 55];
    record.extend_from_slice(&8u16.to_be_bytes());
    record.extend_from_slice(b"2023013X"); // not a date
    payload.extend_from_slice(&(record.len() as u32).to_be_bytes());
    payload.extend_from_slice(&record);
    payload.push(0); // odd data length padding
    let jpeg = Jpeg::load(&base_jpeg(&[seg(0xFFED, &payload)])).unwrap();
    assert_eq!(jpeg.image_time(), None);
}

#[test]
fn bad_irb_signature_fails() {
    let mut payload = Vec::new();
    payload.extend_from_slice(b"Photoshop 3.0\0");
    payload.extend_from_slice(b"8BIN");
    payload.extend_from_slice(&[0u8; 8]);
    assert!(Jpeg::load(&base_jpeg(&[seg(0xFFED, &payload)])).is_err());
}
