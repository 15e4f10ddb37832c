//! Small pieces shared by every crate in the workspace: the byte order used
//! for on-disk layouts, and the string<->enum parsing error/trait pair that
//! `s86-util-derive`'s `EnumFromStr` generates impls for.

use std::error::Error;
use std::fmt;

/// Byte order used by every on-disk layout in this workspace (object
/// records, executable images).
pub type Endian = byteorder::LittleEndian;

/// A string did not match any variant of the named enum.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ParseEnumError {
    pub value: String,
    pub enum_name: &'static str,
}

impl fmt::Display for ParseEnumError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "'{}' is not a valid {}", self.value, self.enum_name)
    }
}

impl Error for ParseEnumError {}

/// Implemented by `#[derive(EnumFromStr)]`. Kept distinct from
/// `std::str::FromStr` (which is also generated) so callers can name the
/// trait explicitly when both a mnemonic table and a register table are in
/// scope at once.
pub trait EnumFromStr: Sized {
    fn enum_from_str(s: &str) -> Result<Self, ParseEnumError>;
}
