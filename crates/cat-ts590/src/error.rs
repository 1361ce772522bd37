//! Error types for CAT protocol decoding and encoding

use thiserror::Error;

/// Errors that can occur while decoding a CAT command
///
/// Decode errors are advisory: the engine logs them at debug level and moves
/// on. No error here ever aborts the decode worker or corrupts shared state.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// Command is shorter than the family's fixed layout requires
    #[error("command too short: {got} chars, need {need}")]
    TooShort { got: usize, need: usize },

    /// Command length matches none of the family's valid layouts
    #[error("invalid length {0} for {1}")]
    BadLength(usize, &'static str),

    /// A fixed-width numeric field contained a non-digit
    #[error("non-digit in numeric field: {0:?}")]
    BadDigits(String),

    /// Frequency field was not exactly 11 digits
    #[error("invalid frequency field: {0:?}")]
    InvalidFrequency(String),

    /// Single-character field held a value outside its enumerated range
    #[error("value out of range for {field}: {value:?}")]
    OutOfRange { field: &'static str, value: char },

    /// Prefix has no decoder mapped to it
    #[error("unknown command: {0}")]
    UnknownCommand(String),

    /// Outbound command would exceed the wire length limit
    #[error("command too long: {0} bytes")]
    CommandTooLong(usize),
}
