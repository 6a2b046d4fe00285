//! Error types for harness runs
//!
//! Every condition a harness can recover from is represented here. Defects
//! inside the wrapped libraries (panics, out-of-bounds access, hangs) are
//! not represented; they must reach the fuzzing engine untouched.
//!
//! # Error Codes
//!
//! Error codes follow the pattern: `E<category><number>`
//!
//! Categories:
//! - **E1xxx**: I/O and archive errors
//! - **E2xxx**: XML parsing errors
//! - **E3xxx**: Input rejected by the size gate
//! - **E4xxx**: Setup failures
//!
//! ## Error Codes
//!
//! - `E1001`: I/O error from the memory stream
//! - `E1002`: ZIP archive format error
//! - `E2001`: XML parsing error
//! - `E2002`: XML attribute error
//! - `E3001`: Input shorter than the minimum length
//! - `E3002`: Input longer than the maximum length
//! - `E4001`: Session or configuration could not be set up

use std::io;
use thiserror::Error;

/// Result type for harness operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while running a harness
#[derive(Error, Debug)]
pub enum Error {
    /// IO error raised by the memory stream
    ///
    /// **Error Code**: E1001
    ///
    /// **Common Causes**:
    /// - Seek outside the input buffer
    /// - Truncated payload reported by a wrapped reader
    #[error("[E1001] I/O error: {0}")]
    Io(#[from] io::Error),

    /// ZIP archive error
    ///
    /// **Error Code**: E1002
    ///
    /// **Common Causes**:
    /// - Corrupted or truncated archive
    /// - Unsupported compression method
    /// - Declared sizes that do not match the available bytes
    #[error("[E1002] ZIP error: {0}")]
    Zip(#[from] zip::result::ZipError),

    /// XML parsing error
    ///
    /// **Error Code**: E2001
    ///
    /// **Common Causes**:
    /// - Malformed XML syntax
    /// - Mismatched end tags
    /// - Unexpected end of input
    #[error("[E2001] XML parsing error: {0}")]
    Xml(#[from] quick_xml::Error),

    /// XML attribute error
    ///
    /// **Error Code**: E2002
    ///
    /// **Common Causes**:
    /// - Duplicate attribute
    /// - Attribute without a value or quotes
    #[error("[E2002] XML attribute error: {0}")]
    XmlAttr(String),

    /// Input rejected for being too short to be meaningful
    ///
    /// **Error Code**: E3001
    #[error("[E3001] Input too short: {len} bytes (minimum {min})")]
    InputTooShort {
        /// Length of the rejected input
        len: usize,
        /// Configured minimum length
        min: usize,
    },

    /// Input rejected for exceeding the resource bound
    ///
    /// **Error Code**: E3002
    #[error("[E3002] Input too large: {len} bytes (maximum {max})")]
    InputTooLarge {
        /// Length of the rejected input
        len: usize,
        /// Configured maximum length
        max: usize,
    },

    /// Session, stream or configuration could not be created
    ///
    /// **Error Code**: E4001
    ///
    /// **Common Causes**:
    /// - Invalid limits (zero chunk size)
    /// - Resource acquisition refused
    #[error("[E4001] Setup failure: {0}")]
    Setup(String),
}

impl From<quick_xml::events::attributes::AttrError> for Error {
    fn from(err: quick_xml::events::attributes::AttrError) -> Self {
        Error::XmlAttr(format!("Attribute parsing failed: {}", err))
    }
}

impl Error {
    /// Create a Setup error
    pub fn setup(message: impl Into<String>) -> Self {
        Error::Setup(message.into())
    }

    /// The bracketed error code, e.g. `"E1002"`
    pub fn code(&self) -> &'static str {
        match self {
            Error::Io(_) => "E1001",
            Error::Zip(_) => "E1002",
            Error::Xml(_) => "E2001",
            Error::XmlAttr(_) => "E2002",
            Error::InputTooShort { .. } => "E3001",
            Error::InputTooLarge { .. } => "E3002",
            Error::Setup(_) => "E4001",
        }
    }

    /// Whether this error came from the size gate
    pub fn is_rejection(&self) -> bool {
        matches!(self, Error::InputTooShort { .. } | Error::InputTooLarge { .. })
    }

    /// Whether the wrapped library reported malformed input
    pub fn is_parse_error(&self) -> bool {
        matches!(
            self,
            Error::Io(_) | Error::Zip(_) | Error::Xml(_) | Error::XmlAttr(_)
        )
    }
}
