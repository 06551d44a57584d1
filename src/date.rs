//! Normalization of the date encodings embedded in each container.
//!
//! All of these are best-effort: a date-shaped field that matches no expected
//! pattern yields `None` and the caller leaves its timestamp unchanged.

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime};
use log::warn;

/// Seconds between the Mac (1904) and Unix (1970) epochs.
const MAC_UNIX_EPOCH_DIFF: i64 = 2_082_844_800;

/// EXIF `"YYYY:MM:DD HH:MM:SS"`. A string beginning with `"0000"` is treated
/// as absent. A string with a malformed day (e.g. Feb 29 in a non-leap year)
/// recovers by parsing the year-month prefix and adding `day - 1` days.
pub fn parse_exif_datetime(s: &str) -> Option<NaiveDateTime> {
    if s.len() < 4 || &s[0..4] == "0000" {
        return None;
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(s, "%Y:%m:%d %H:%M:%S") {
        return Some(dt);
    }
    // Malformed-day recovery: "2023:02:29" becomes Feb 1 plus 28 days.
    let recovered = recover_exif_date(s);
    if recovered.is_none() {
        warn!("unparseable EXIF date {s:?}");
    }
    recovered
}

fn recover_exif_date(s: &str) -> Option<NaiveDateTime> {
    if s.len() < 10 || !s.is_char_boundary(10) {
        return None;
    }
    let year: i32 = s[0..4].parse().ok()?;
    let month: u32 = s[5..7].parse().ok()?;
    let day: i64 = s[8..10].parse().ok()?;
    let first = NaiveDate::from_ymd_opt(year, month, 1)?.and_hms_opt(0, 0, 0)?;
    first.checked_add_signed(Duration::days(day - 1))
}

/// First 19 characters as `"YYYY-MM-DDTHH:MM:SS"` (XMP, iTunes `©day`).
pub fn parse_iso8601(s: &str) -> Option<NaiveDateTime> {
    let s = if s.len() > 19 {
        if !s.is_char_boundary(19) {
            return None;
        }
        &s[..19]
    } else {
        s
    };
    NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S").ok()
}

/// IPTC `"YYYYMMDD"`, midnight.
pub fn parse_iptc_date(s: &str) -> Option<NaiveDateTime> {
    NaiveDate::parse_from_str(s, "%Y%m%d")
        .ok()?
        .and_hms_opt(0, 0, 0)
}

/// RIFF `ICRD` `"YYYY-MM-DD"`, midnight.
pub fn parse_riff_icrd(s: &str) -> Option<NaiveDateTime> {
    NaiveDate::parse_from_str(trim_field(s), "%Y-%m-%d")
        .ok()?
        .and_hms_opt(0, 0, 0)
}

/// RIFF `IDIT` `"Ddd Mon DD HH:MM:SS YYYY"`.
pub fn parse_riff_idit(s: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(trim_field(s), "%a %b %d %H:%M:%S %Y").ok()
}

/// Mac-epoch seconds (MP4 `mvhd`); 0 means no recorded time.
pub fn from_mac_epoch(seconds: u32) -> Option<NaiveDateTime> {
    if seconds == 0 {
        return None;
    }
    DateTime::from_timestamp(seconds as i64 - MAC_UNIX_EPOCH_DIFF, 0).map(|dt| dt.naive_utc())
}

/// PNG `tIME` fields; out-of-range components leave the timestamp absent.
pub fn from_png_time(
    year: u16,
    month: u8,
    day: u8,
    hour: u8,
    minute: u8,
    second: u8,
) -> Option<NaiveDateTime> {
    NaiveDate::from_ymd_opt(year as i32, month as u32, day as u32)?.and_hms_opt(
        hour as u32,
        minute as u32,
        second as u32,
    )
}

/// Chunk text fields carry trailing padding and line endings.
fn trim_field(s: &str) -> &str {
    s.trim_matches([' ', '\r', '\n', '\0'])
}
