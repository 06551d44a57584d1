//! PNG chunk walking and date extraction tests.

use chrono::{NaiveDate, NaiveDateTime};
use whence::png::Png;

fn dt(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(y, mo, d)
        .unwrap()
        .and_hms_opt(h, mi, s)
        .unwrap()
}

fn chunk(chunk_type: &[u8; 4], data: &[u8]) -> Vec<u8> {
    let mut v = Vec::new();
    v.extend_from_slice(&(data.len() as u32).to_be_bytes());
    v.extend_from_slice(chunk_type);
    v.extend_from_slice(data);
    v.extend_from_slice(&0u32.to_be_bytes()); // CRC is not verified
    v
}

fn png_file(chunks: &[u8]) -> Vec<u8> {
    let mut v = vec![0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];
    v.extend_from_slice(chunks);
    v.extend_from_slice(&chunk(b"IEND", &[]));
    v
}

fn time_chunk(year: u16, rest: &[u8; 5]) -> Vec<u8> {
    let mut data = year.to_be_bytes().to_vec();
    data.extend_from_slice(rest);
    chunk(b"tIME", &data)
}

#[test]
fn time_chunk_is_read() {
    let png = Png::load(&png_file(&time_chunk(2022, &[6, 15, 9, 30, 0]))).unwrap();
    assert_eq!(png.image_time(), Some(dt(2022, 6, 15, 9, 30, 0)));
}

#[test]
fn out_of_range_time_is_absent() {
    let png = Png::load(&png_file(&time_chunk(2022, &[13, 1, 0, 0, 0]))).unwrap();
    assert_eq!(png.image_time(), None);
}

#[test]
fn bad_signature_fails() {
    assert!(Png::load(b"\x88PNG\x0D\x0A\x1A\x0Axxxxxxxx").is_err());
}

#[test]
fn unknown_chunks_are_skipped() {
    let mut chunks = chunk(b"IHDR", &[0; 13]);
    chunks.extend_from_slice(&chunk(b"sRGB", &[0]));
    chunks.extend_from_slice(&time_chunk(2001, &[2, 3, 4, 5, 6]));
    let png = Png::load(&png_file(&chunks)).unwrap();
    assert_eq!(png.image_time(), Some(dt(2001, 2, 3, 4, 5, 6)));
}

#[test]
fn walk_stops_at_iend() {
    // Garbage after IEND must never be parsed.
    let mut file = png_file(&time_chunk(2010, &[1, 1, 0, 0, 0]));
    file.extend_from_slice(&[0xFF; 3]);
    let png = Png::load(&file).unwrap();
    assert_eq!(png.image_time(), Some(dt(2010, 1, 1, 0, 0, 0)));
}

#[test]
fn xmp_itxt_date() {
    let xmp = r#"<x:xmpmeta xmlns:x="adobe:ns:meta/"><rdf:RDF xmlns:rdf="http://www.w3.org/1999/02/22-rdf-syntax-ns#"><rdf:Description xmlns:photoshop="http://ns.adobe.com/photoshop/1.0/"><photoshop:DateCreated>2021-05-06T07:08:09</photoshop:DateCreated></rdf:Description></rdf:RDF></x:xmpmeta>"#;
    let mut data = b"XML:com.adobe.xmp\0".to_vec();
    data.extend_from_slice(&[0, 0]); // compression flag + method
    data.extend_from_slice(&[0, 0]); // language tag + translated keyword
    data.extend_from_slice(xmp.as_bytes());
    let png = Png::load(&png_file(&chunk(b"iTXt", &data))).unwrap();
    assert_eq!(png.image_time(), Some(dt(2021, 5, 6, 7, 8, 9)));
}

#[test]
fn non_xmp_itxt_is_ignored() {
    let mut data = b"Comment\0".to_vec();
    data.extend_from_slice(&[0, 0, 0, 0]);
    data.extend_from_slice(b"hello");
    let png = Png::load(&png_file(&chunk(b"iTXt", &data))).unwrap();
    assert_eq!(png.image_time(), None);
}
