//! Typed failures with byte offsets.
//!
//! Every parse error carries the absolute input byte offset of the first
//! offending byte. Errors are plain values; nothing in the library panics on
//! malformed input.

use core::fmt;

use crate::facade::Mode;

/// Kinds of minification failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    // Parse errors
    /// Container nesting exceeded the fixed depth limit.
    NestingTooDeep { limit: usize },
    /// `\` in a string followed by a byte outside `" \ / b f n r t u`.
    InvalidEscape { byte: u8 },
    /// Non-hex byte inside a `\uXXXX` escape.
    InvalidUnicodeEscape { byte: u8 },
    /// A byte the grammar disallows at the current position.
    UnexpectedByte { byte: u8, expected: &'static str },
    /// Input ended with an open container or unterminated string/literal.
    Truncated { expected: &'static str },

    // Configuration errors
    /// The requested mode is not usable on this hardware or build.
    ModeUnavailable { mode: Mode },

    // I/O and resource errors
    /// The borrowed reader or writer reported an I/O error.
    WriterFailed { message: String },
    /// An internal buffer could not be allocated.
    OutOfMemory,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NestingTooDeep { limit } => {
                write!(f, "nesting deeper than {} containers", limit)
            }
            Self::InvalidEscape { byte } => {
                write!(f, "invalid escape '\\{}' (0x{:02X})", printable(*byte), byte)
            }
            Self::InvalidUnicodeEscape { byte } => {
                write!(
                    f,
                    "invalid unicode escape: expected hex digit, found 0x{:02X}",
                    byte
                )
            }
            Self::UnexpectedByte { byte, expected } => {
                write!(f, "unexpected byte 0x{:02X}, expected {}", byte, expected)
            }
            Self::Truncated { expected } => {
                write!(f, "unexpected end of input, expected {}", expected)
            }
            Self::ModeUnavailable { mode } => {
                write!(f, "mode {} is not available on this platform", mode)
            }
            Self::WriterFailed { message } => write!(f, "I/O failed: {}", message),
            Self::OutOfMemory => write!(f, "out of memory"),
        }
    }
}

fn printable(byte: u8) -> char {
    if byte.is_ascii_graphic() {
        byte as char
    } else {
        '?'
    }
}

/// A minification error with the absolute input byte offset where it was
/// detected.
///
/// For non-parse kinds (`ModeUnavailable`, `WriterFailed`, `OutOfMemory`) the
/// offset reports how far the input had been consumed when the failure
/// surfaced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Error {
    /// The kind of failure.
    pub kind: ErrorKind,
    /// Absolute byte offset into the input.
    pub offset: usize,
}

impl Error {
    pub(crate) fn new(kind: ErrorKind, offset: usize) -> Self {
        Self { kind, offset }
    }

    pub(crate) fn writer(err: &std::io::Error, offset: usize) -> Self {
        Self {
            kind: ErrorKind::WriterFailed {
                message: err.to_string(),
            },
            offset,
        }
    }

    pub(crate) fn oom(offset: usize) -> Self {
        Self {
            kind: ErrorKind::OutOfMemory,
            offset,
        }
    }

    /// True for grammar-level failures (the input itself is at fault).
    pub fn is_parse(&self) -> bool {
        matches!(
            self.kind,
            ErrorKind::NestingTooDeep { .. }
                | ErrorKind::InvalidEscape { .. }
                | ErrorKind::InvalidUnicodeEscape { .. }
                | ErrorKind::UnexpectedByte { .. }
                | ErrorKind::Truncated { .. }
        )
    }

}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} at offset {}", self.kind, self.offset)
    }
}

impl std::error::Error for Error {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_unexpected_byte() {
        let err = Error::new(
            ErrorKind::UnexpectedByte {
                byte: b'}',
                expected: "string key",
            },
            17,
        );
        assert_eq!(
            err.to_string(),
            "unexpected byte 0x7D, expected string key at offset 17"
        );
    }

    #[test]
    fn test_display_truncated() {
        let err = Error::new(
            ErrorKind::Truncated {
                expected: "'}' or ']'",
            },
            1,
        );
        assert_eq!(
            err.to_string(),
            "unexpected end of input, expected '}' or ']' at offset 1"
        );
    }

    #[test]
    fn test_display_invalid_escape() {
        let err = Error::new(ErrorKind::InvalidEscape { byte: b'q' }, 3);
        assert_eq!(err.to_string(), "invalid escape '\\q' (0x71) at offset 3");
    }

    #[test]
    fn test_parse_classification() {
        assert!(Error::new(ErrorKind::NestingTooDeep { limit: 128 }, 0).is_parse());
        assert!(!Error::new(ErrorKind::OutOfMemory, 0).is_parse());
        assert!(!Error::new(
            ErrorKind::WriterFailed {
                message: "broken pipe".into()
            },
            0
        )
        .is_parse());
    }

}
