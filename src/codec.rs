//! Binary codec: object-record serialization and the executable image
//! format, using `byteorder`'s extension-trait pattern to read and write
//! both fixed-layout formats.
//!
//! The object record's three enumerant fields are an explicit 4-byte
//! little-endian integer rather than a platform-width `int` — everything
//! else matches the documented layout bit-for-bit.

use std::io::{self, Read, Write};

use byteorder::{ReadBytesExt, WriteBytesExt};
use num_traits::{FromPrimitive, ToPrimitive};
use s86_util::{Endian, EnumFromStr};

use crate::error::CodecError;
use crate::isa::{Mnemonic, OperandType, RegisterCode};
use crate::record::{ObjectRecord, RecordKind};

const STRING_FIELD_LEN: usize = 128;

fn parse_hex_literal(field: &'static str, token: &str) -> Result<u16, CodecError> {
    let digits = token
        .strip_prefix("0x")
        .or_else(|| token.strip_prefix("0X"))
        .unwrap_or(token);
    u16::from_str_radix(digits, 16).map_err(|_| CodecError::Malformed {
        field,
        value: token.to_string(),
    })
}

fn parse_decimal_address(field: &'static str, token: &str) -> Result<u16, CodecError> {
    token.parse::<u16>().map_err(|_| CodecError::Malformed {
        field,
        value: token.to_string(),
    })
}

fn parse_register(field: &'static str, token: &str) -> Result<RegisterCode, CodecError> {
    RegisterCode::enum_from_str(token).map_err(|_| CodecError::Malformed {
        field,
        value: token.to_string(),
    })
}

/// Extension methods for writing the two on-disk layouts this crate owns:
/// a blanket impl over any `Write`r, so callers just import the trait and
/// call the methods.
pub trait WriteS86Ext: Write {
    fn write_fixed_string(&mut self, field: &'static str, value: &str) -> Result<(), CodecError> {
        let bytes = value.as_bytes();
        if bytes.len() > STRING_FIELD_LEN {
            return Err(CodecError::FieldTooLong {
                field,
                len: bytes.len(),
            });
        }
        self.write_all(bytes)?;
        let padding = [0u8; STRING_FIELD_LEN];
        self.write_all(&padding[bytes.len()..])?;
        Ok(())
    }

    /// Writes one object record.
    fn write_object_record(&mut self, record: &ObjectRecord) -> Result<(), CodecError> {
        self.write_fixed_string("fullText", &record.full_text)?;
        self.write_fixed_string("id", &record.id)?;
        self.write_fixed_string("opA", &record.op_a)?;
        self.write_fixed_string("opB", &record.op_b)?;
        self.write_i32::<Endian>(record.kind.to_i32().unwrap())?;
        self.write_i32::<Endian>(record.mnemonic.to_i32().unwrap())?;
        self.write_i32::<Endian>(record.op_type.to_i32().unwrap())?;
        self.write_u16::<Endian>(record.address)?;
        self.write_u16::<Endian>(record.size)?;
        Ok(())
    }

    /// Writes the operand-A word of one INSTRUCTION record's encoding.
    /// `N`-type instructions (`RET`, `DUMP`, `HALT`) carry no operand word
    /// at all.
    fn write_operand_a(&mut self, record: &ObjectRecord) -> Result<(), CodecError> {
        match record.op_type {
            OperandType::N => Ok(()),
            OperandType::R | OperandType::Rr | OperandType::Rm | OperandType::Ri => {
                let code = parse_register("opA", &record.op_a)?;
                self.write_u8(code.to_u8().unwrap())?;
                self.write_u8(0)?;
                Ok(())
            }
            OperandType::I => {
                let value = parse_hex_literal("opA", &record.op_a)?;
                self.write_u16::<Endian>(value)?;
                Ok(())
            }
            OperandType::M | OperandType::Mi | OperandType::Mr => {
                let value = parse_decimal_address("opA", &record.op_a)?;
                self.write_u16::<Endian>(value)?;
                Ok(())
            }
        }
    }

    /// Writes the operand-B word of a 48-bit INSTRUCTION record, derived
    /// from `opB` (not `opA`, which only the operand-A word reads).
    fn write_operand_b(&mut self, record: &ObjectRecord) -> Result<(), CodecError> {
        match record.op_type {
            OperandType::Rr | OperandType::Mr => {
                let code = parse_register("opB", &record.op_b)?;
                self.write_u8(code.to_u8().unwrap())?;
                self.write_u8(0)?;
                Ok(())
            }
            OperandType::Mi | OperandType::Ri => {
                let value = parse_hex_literal("opB", &record.op_b)?;
                self.write_u16::<Endian>(value)?;
                Ok(())
            }
            OperandType::Rm => {
                let value = parse_decimal_address("opB", &record.op_b)?;
                self.write_u16::<Endian>(value)?;
                Ok(())
            }
            _ => Ok(()),
        }
    }
}

impl<W: Write + ?Sized> WriteS86Ext for W {}

/// Extension methods for reading the two on-disk layouts this crate owns.
pub trait ReadS86Ext: Read {
    fn read_fixed_string(&mut self, field: &'static str) -> Result<String, CodecError> {
        let mut buf = [0u8; STRING_FIELD_LEN];
        self.read_exact(&mut buf)?;
        let end = buf.iter().position(|&b| b == 0).unwrap_or(buf.len());
        String::from_utf8(buf[..end].to_vec()).map_err(|_| CodecError::Malformed {
            field,
            value: String::from_utf8_lossy(&buf[..end]).into_owned(),
        })
    }

    /// Reads one object record.
    fn read_object_record(&mut self) -> Result<ObjectRecord, CodecError> {
        let full_text = self.read_fixed_string("fullText")?;
        let id = self.read_fixed_string("id")?;
        let op_a = self.read_fixed_string("opA")?;
        let op_b = self.read_fixed_string("opB")?;

        let kind_value = self.read_i32::<Endian>()?;
        let kind = RecordKind::from_i32(kind_value).ok_or(CodecError::UnknownEnumValue {
            field: "type",
            value: kind_value,
        })?;
        let mnemonic_value = self.read_i32::<Endian>()?;
        let mnemonic =
            Mnemonic::from_i32(mnemonic_value).ok_or(CodecError::UnknownEnumValue {
                field: "code",
                value: mnemonic_value,
            })?;
        let op_type_value = self.read_i32::<Endian>()?;
        let op_type =
            OperandType::from_i32(op_type_value).ok_or(CodecError::UnknownEnumValue {
                field: "opType",
                value: op_type_value,
            })?;
        let address = self.read_u16::<Endian>()?;
        let size = self.read_u16::<Endian>()?;

        Ok(ObjectRecord {
            full_text,
            id,
            op_a,
            op_b,
            kind,
            mnemonic,
            op_type,
            address,
            size,
        })
    }
}

impl<R: Read + ?Sized> ReadS86Ext for R {}

/// Writes a full object module: every record in `records`, back-to-back,
/// with no header — the layout the assembler emits and the linker reads.
pub fn write_object_module<W: Write>(
    writer: &mut W,
    records: &[ObjectRecord],
) -> Result<(), CodecError> {
    for record in records {
        writer.write_object_record(record)?;
    }
    Ok(())
}

/// Reads every record out of an object module stream until EOF.
pub fn read_object_module<R: Read>(reader: &mut R) -> Result<Vec<ObjectRecord>, CodecError> {
    let mut records = Vec::new();
    loop {
        match reader.read_object_record() {
            Ok(record) => records.push(record),
            Err(CodecError::Io(err)) if err.kind() == io::ErrorKind::UnexpectedEof => break,
            Err(err) => return Err(err),
        }
    }
    Ok(records)
}

/// Writes the executable image: a zero 2-byte header (entry point IP = 0,
/// never loaded into memory itself), followed by every INSTRUCTION
/// record's encoding in program order. LABEL/VAR records contribute no
/// bytes here — they've already done their job resolving operands.
pub fn write_executable<W: Write>(
    writer: &mut W,
    records: &[ObjectRecord],
) -> Result<(), CodecError> {
    writer.write_u16::<Endian>(0)?;
    for record in records.iter().filter(|r| r.kind == RecordKind::Instruction) {
        writer.write_u8(record.op_type.to_u8().unwrap())?;
        writer.write_u8(record.mnemonic.to_u8().unwrap())?;
        writer.write_operand_a(record)?;
        if record.mnemonic.size_bits() == 48 {
            writer.write_operand_b(record)?;
        }
    }
    Ok(())
}

/// Reads an executable image, discards its header, and returns the
/// remaining words to load into `MEM[0..]` as-is — each word is already
/// exactly the value the fetch/decode loop expects to see at that memory
/// cell, so no further interpretation happens here.
pub fn read_executable<R: Read>(reader: &mut R) -> Result<Vec<u16>, CodecError> {
    let mut words = Vec::new();
    loop {
        match reader.read_u16::<Endian>() {
            Ok(word) => words.push(word),
            Err(err) if err.kind() == io::ErrorKind::UnexpectedEof => break,
            Err(err) => return Err(err.into()),
        }
    }
    if !words.is_empty() {
        words.remove(0);
    }
    Ok(words)
}
