//! Generic record-traversal loop shared by the chunked formats.
//!
//! Every chunk/box/segment walker in this crate is the same algorithm: read a
//! record header, dispatch on its identifier (recurse into a nested list,
//! decode a known payload, or skip an unknown payload by its declared length),
//! stop when the position reaches a declared end. Only the header shape and
//! the tag table differ per format, so those live in the `step` closure.

use crate::error::Result;
use crate::stream::Cursor;

/// Outcome of decoding one record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Walk {
    Continue,
    /// A terminal record was seen (PNG `IEND`, JPEG SOS/EOI).
    Stop,
}

/// Invoke `step` once per record while the cursor is before `end`.
///
/// `end` comes from a declared length embedded in the container, so it is
/// capped to the actual input length to bound work on malformed input.
pub fn records(
    cursor: &mut Cursor,
    end: usize,
    mut step: impl FnMut(&mut Cursor) -> Result<Walk>,
) -> Result<()> {
    let end = end.min(cursor.len());
    while cursor.position() < end {
        if step(cursor)? == Walk::Stop {
            break;
        }
    }
    Ok(())
}
