//! Runtime (guest) and codec error types: a plain enum, a `From` impl per
//! wrapped error, and manual `Display`/`Error` impls.

use std::fmt;
use std::io;

/// An error raised while executing a guest program: every failure mode
/// here is bounds-checked and reported rather than left undefined.
#[derive(Debug)]
pub enum RuntimeError {
    /// A memory or instruction-stream access fell outside `MEM[0..MEMORY_LIMIT)`.
    OutOfBounds(u16),
    /// `DIV` with a zero divisor.
    DivideByZero,
    /// `READ` failed to read or parse a hex token from standard input.
    Io(io::Error),
    ReadHex(std::num::ParseIntError),
}

impl fmt::Display for RuntimeError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            RuntimeError::OutOfBounds(addr) => {
                write!(f, "memory access out of bounds: {}", addr)
            }
            RuntimeError::DivideByZero => write!(f, "division by zero"),
            RuntimeError::Io(err) => write!(f, "I/O error: {}", err),
            RuntimeError::ReadHex(err) => write!(f, "could not parse hex input: {}", err),
        }
    }
}

impl std::error::Error for RuntimeError {}

impl From<io::Error> for RuntimeError {
    fn from(err: io::Error) -> Self {
        RuntimeError::Io(err)
    }
}

impl From<std::num::ParseIntError> for RuntimeError {
    fn from(err: std::num::ParseIntError) -> Self {
        RuntimeError::ReadHex(err)
    }
}

/// An error raised while reading or writing an object record or executable
/// image.
#[derive(Debug)]
pub enum CodecError {
    Io(io::Error),
    /// A string field (`fullText`/`id`/`opA`/`opB`) exceeded the 128-byte
    /// fixed-width slot for its record: reported rather than truncated, so
    /// a record never decodes back unequal to what was encoded.
    FieldTooLong { field: &'static str, len: usize },
    /// An enumerant value read back from a record did not correspond to
    /// any known variant.
    UnknownEnumValue { field: &'static str, value: i32 },
    /// An operand string wasn't the shape its operand-type code promised —
    /// e.g. `opType = R` but `opA` isn't a known register name.
    Malformed { field: &'static str, value: String },
}

impl fmt::Display for CodecError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            CodecError::Io(err) => write!(f, "I/O error: {}", err),
            CodecError::FieldTooLong { field, len } => write!(
                f,
                "field '{}' is {} bytes, exceeds the 128-byte record slot",
                field, len
            ),
            CodecError::UnknownEnumValue { field, value } => {
                write!(f, "field '{}' has unrecognized value {}", field, value)
            }
            CodecError::Malformed { field, value } => {
                write!(f, "field '{}' has malformed value '{}'", field, value)
            }
        }
    }
}

impl std::error::Error for CodecError {}

impl From<io::Error> for CodecError {
    fn from(err: io::Error) -> Self {
        CodecError::Io(err)
    }
}
