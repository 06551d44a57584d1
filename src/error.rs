//! Error taxonomy shared by all format decoders.
//!
//! Structural errors (bad magic, unreliable offsets) abort a load; content
//! errors confined to one optional field (dates, checksums) are swallowed at
//! the point of failure and leave the field absent.

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Bad signature/magic or an unrecoverable structural mismatch.
    #[error("malformed container: {0}")]
    Format(&'static str),

    /// A read would exceed the available bytes.
    #[error("truncated input: {needed} bytes at offset {offset}, only {len} available")]
    Truncated {
        offset: usize,
        needed: usize,
        len: usize,
    },

    /// A recognized-but-unsupported record whose parsing is structurally
    /// required to continue (e.g. an IRB signature mismatch).
    #[error("unsupported record: {0}")]
    UnknownTag(&'static str),

    /// Pixel-format code not present in the format's known table.
    /// Surfaced only when the name accessor is invoked, never during load.
    #[error("unknown pixel format code {0:#x}")]
    UnknownFormatCode(u64),

    /// File I/O from the `load_file`/`save_file` conveniences.
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}
