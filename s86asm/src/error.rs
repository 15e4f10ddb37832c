use std::fmt;
use std::io;

use s86::error::CodecError;

/// Errors the assembler binary can surface: a plain enum with a `From`
/// impl per wrapped error and a manual `Display`.
#[derive(Debug)]
pub enum Error {
    Io(io::Error),
    Codec(CodecError),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Io(err) => write!(f, "I/O error: {}", err),
            Error::Codec(err) => write!(f, "could not emit object record: {}", err),
        }
    }
}

impl std::error::Error for Error {}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Error {
        Error::Io(err)
    }
}

impl From<CodecError> for Error {
    fn from(err: CodecError) -> Error {
        Error::Codec(err)
    }
}
