//! TIFF/EXIF date extraction tests.

use chrono::{NaiveDate, NaiveDateTime};
use whence::tiff::Tiff;

fn dt(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(y, mo, d)
        .unwrap()
        .and_hms_opt(h, mi, s)
        .unwrap()
}

fn entry_le(tag: u16, typ: u16, count: u32, value: u32) -> Vec<u8> {
    let mut v = Vec::new();
    v.extend_from_slice(&tag.to_le_bytes());
    v.extend_from_slice(&typ.to_le_bytes());
    v.extend_from_slice(&count.to_le_bytes());
    v.extend_from_slice(&value.to_le_bytes());
    v
}

/// Minimal little-endian TIFF: one IFD, one ASCII date entry, the string
/// placed right after the IFD terminator.
fn tiff_with_date_le(tag: u16, date: &str) -> Vec<u8> {
    let mut v = Vec::new();
    v.extend_from_slice(b"II");
    v.extend_from_slice(&42u16.to_le_bytes());
    v.extend_from_slice(&8u32.to_le_bytes());
    v.extend_from_slice(&1u16.to_le_bytes());
    let string_off = 8 + 2 + 12 + 4;
    v.extend_from_slice(&entry_le(tag, 2, date.len() as u32 + 1, string_off));
    v.extend_from_slice(&0u32.to_le_bytes());
    v.extend_from_slice(date.as_bytes());
    v.push(0);
    v
}

#[test]
fn modify_date_little_endian() {
    let tiff = Tiff::load(&tiff_with_date_le(0x0132, "2023:01:15 10:30:00")).unwrap();
    assert_eq!(tiff.image_time(), Some(dt(2023, 1, 15, 10, 30, 0)));
}

#[test]
fn create_date_big_endian() {
    let date = "2020:12:31 23:59:59";
    let mut v = Vec::new();
    v.extend_from_slice(b"MM");
    v.extend_from_slice(&42u16.to_be_bytes());
    v.extend_from_slice(&8u32.to_be_bytes());
    v.extend_from_slice(&1u16.to_be_bytes());
    v.extend_from_slice(&0x9004u16.to_be_bytes());
    v.extend_from_slice(&2u16.to_be_bytes());
    v.extend_from_slice(&(date.len() as u32 + 1).to_be_bytes());
    v.extend_from_slice(&26u32.to_be_bytes());
    v.extend_from_slice(&0u32.to_be_bytes());
    v.extend_from_slice(date.as_bytes());
    v.push(0);
    let tiff = Tiff::load(&v).unwrap();
    assert_eq!(tiff.image_time(), Some(dt(2020, 12, 31, 23, 59, 59)));
}

#[test]
fn zero_date_is_absent() {
    let tiff = Tiff::load(&tiff_with_date_le(0x0132, "0000:00:00 00:00:00")).unwrap();
    assert_eq!(tiff.image_time(), None);
}

#[test]
fn leap_day_parses_directly() {
    let tiff = Tiff::load(&tiff_with_date_le(0x9003, "2024:02:29 10:00:00")).unwrap();
    assert_eq!(tiff.image_time(), Some(dt(2024, 2, 29, 10, 0, 0)));
}

#[test]
fn out_of_range_day_recovers() {
    // Feb 29 in a non-leap year lands on March 1, time dropped.
    let tiff = Tiff::load(&tiff_with_date_le(0x9003, "2023:02:29 10:00:00")).unwrap();
    assert_eq!(tiff.image_time(), Some(dt(2023, 3, 1, 0, 0, 0)));
}

#[test]
fn unknown_tags_are_skipped() {
    let date = "2019:06:01 08:00:00";
    let mut v = Vec::new();
    v.extend_from_slice(b"II");
    v.extend_from_slice(&42u16.to_le_bytes());
    v.extend_from_slice(&8u32.to_le_bytes());
    v.extend_from_slice(&2u16.to_le_bytes());
    let string_off = 8 + 2 + 24 + 4;
    v.extend_from_slice(&entry_le(0x0100, 3, 1, 640)); // ImageWidth, inline
    v.extend_from_slice(&entry_le(0x0132, 2, date.len() as u32 + 1, string_off));
    v.extend_from_slice(&0u32.to_le_bytes());
    v.extend_from_slice(date.as_bytes());
    v.push(0);
    let tiff = Tiff::load(&v).unwrap();
    assert_eq!(tiff.image_time(), Some(dt(2019, 6, 1, 8, 0, 0)));
}

#[test]
fn date_in_exif_sub_ifd() {
    let date = "2024:04:05 06:07:08";
    let sub_off = 8 + 2 + 12 + 4;
    let string_off = sub_off + 2 + 12 + 4;
    let mut v = Vec::new();
    v.extend_from_slice(b"II");
    v.extend_from_slice(&42u16.to_le_bytes());
    v.extend_from_slice(&8u32.to_le_bytes());
    v.extend_from_slice(&1u16.to_le_bytes());
    v.extend_from_slice(&entry_le(0x8769, 4, 1, sub_off));
    v.extend_from_slice(&0u32.to_le_bytes());
    v.extend_from_slice(&1u16.to_le_bytes());
    v.extend_from_slice(&entry_le(0x9003, 2, date.len() as u32 + 1, string_off));
    v.extend_from_slice(&0u32.to_le_bytes());
    v.extend_from_slice(date.as_bytes());
    v.push(0);
    let tiff = Tiff::load(&v).unwrap();
    assert_eq!(tiff.image_time(), Some(dt(2024, 4, 5, 6, 7, 8)));
}

#[test]
fn cyclic_ifd_chain_fails() {
    // Zero-entry IFD whose next-IFD offset points back at itself.
    let mut v = Vec::new();
    v.extend_from_slice(b"II");
    v.extend_from_slice(&42u16.to_le_bytes());
    v.extend_from_slice(&8u32.to_le_bytes());
    v.extend_from_slice(&0u16.to_le_bytes());
    v.extend_from_slice(&8u32.to_le_bytes());
    assert!(Tiff::load(&v).is_err());
}

#[test]
fn backward_ifd_chain_fails() {
    // Two IFDs where the second chains back to the first.
    let mut v = Vec::new();
    v.extend_from_slice(b"II");
    v.extend_from_slice(&42u16.to_le_bytes());
    v.extend_from_slice(&8u32.to_le_bytes());
    v.extend_from_slice(&0u16.to_le_bytes());
    v.extend_from_slice(&14u32.to_le_bytes());
    v.extend_from_slice(&0u16.to_le_bytes());
    v.extend_from_slice(&8u32.to_le_bytes());
    assert!(Tiff::load(&v).is_err());
}

#[test]
fn bad_byte_order_mark_fails() {
    assert!(Tiff::load(b"XX\x2A\x00\x08\x00\x00\x00").is_err());
}

#[test]
fn truncated_header_fails() {
    assert!(Tiff::load(b"II*\x00").is_err());
}
