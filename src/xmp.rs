//! Creation-date lookup inside embedded XMP packets.
//!
//! Only two spellings are consulted: the `exif:DateTimeOriginal` attribute of
//! an `rdf:Description` element (JPEG APP1/APP3) and the text of a
//! `photoshop:DateCreated` element (PNG `iTXt`). Anything else in the packet,
//! including XML errors, is ignored.

use chrono::NaiveDateTime;
use quick_xml::events::Event;
use quick_xml::name::{Namespace, ResolveResult};
use quick_xml::reader::NsReader;

use crate::date;

const EXIF_NS: &[u8] = b"http://ns.adobe.com/exif/1.0/";
const PHOTOSHOP_NS: &[u8] = b"http://ns.adobe.com/photoshop/1.0/";

/// Extract the creation date from an XMP packet, if one is present.
pub fn creation_date(text: &str) -> Option<NaiveDateTime> {
    let mut reader = NsReader::from_str(text);
    reader.config_mut().trim_text(true);

    let mut date_created: Option<NaiveDateTime> = None;
    let mut in_date_created = false;
    loop {
        match reader.read_resolved_event() {
            Ok((_, Event::Start(ref e))) | Ok((_, Event::Empty(ref e))) => {
                for attr in e.attributes().flatten() {
                    let (rr, local) = reader.resolve_attribute(attr.key);
                    if let ResolveResult::Bound(Namespace(ns)) = rr {
                        if ns == EXIF_NS && local.as_ref() == b"DateTimeOriginal" {
                            if let Ok(value) = attr.unescape_value() {
                                if let Some(dt) = date::parse_iso8601(&value) {
                                    return Some(dt);
                                }
                            }
                        }
                    }
                }
                let (rr, local) = reader.resolve_element(e.name());
                if let ResolveResult::Bound(Namespace(ns)) = rr {
                    in_date_created = ns == PHOTOSHOP_NS && local.as_ref() == b"DateCreated";
                }
            }
            Ok((_, Event::Text(ref t))) if in_date_created && date_created.is_none() => {
                if let Ok(value) = t.unescape() {
                    date_created = date::parse_iso8601(&value);
                }
            }
            Ok((_, Event::End(_))) => in_date_created = false,
            Ok((_, Event::Eof)) | Err(_) => break,
            _ => {}
        }
    }
    date_created
}
