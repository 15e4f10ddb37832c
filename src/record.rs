//! Instruction record and the two-pass assembler, shared by `s86asm` and
//! `s86link`: the linker concatenates every module's records and runs the
//! same layout/symbol-resolution pass the assembler does.

use crate::isa::{Mnemonic, OperandType};
use crate::line::Line;

/// Which of the three line shapes a record came from. Numbered to match
/// the wire `type` field in the object record.
#[derive(
    Clone, Copy, PartialEq, Eq, Debug, Hash, num_derive::ToPrimitive, num_derive::FromPrimitive,
)]
pub enum RecordKind {
    Label = 0,
    Instruction = 1,
    Var = 2,
}

/// The common currency of the assembler and linker, stringly-typed to
/// match the two-pass algorithm's own substitution strategy: pass 2
/// overwrites `op_a`/`op_b` in place with the decimal text of a resolved
/// address, which only makes sense if they're text to begin with.
/// `op_a`/`op_b` are empty strings rather than `Option<String>` so that
/// substitution is a plain string compare against an always-present,
/// possibly-empty field.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ObjectRecord {
    pub full_text: String,
    pub id: String,
    pub op_a: String,
    pub op_b: String,
    pub kind: RecordKind,
    pub mnemonic: Mnemonic,
    pub op_type: OperandType,
    pub address: u16,
    /// Encoded length in bits (0 for LABEL/VAR).
    pub size: u16,
}

/// Lowers one parsed `Line` into its wire-ready `ObjectRecord`, rendering
/// any typed `Operand`s back to the stringly-typed form the record
/// requires. `address` is left at 0; `layout` assigns it. Use
/// `crate::line::parse_line` first — a single source line can produce more
/// than one `Line` (a labeled instruction), hence more than one record.
pub fn from_line(line: &Line) -> ObjectRecord {
    match line {
        Line::Label { name } => ObjectRecord {
            full_text: format!("{}:", name),
            id: name.clone(),
            op_a: String::new(),
            op_b: String::new(),
            kind: RecordKind::Label,
            mnemonic: Mnemonic::Nope,
            op_type: OperandType::N,
            address: 0,
            size: 0,
        },
        // `id` stays "dw" until pass 2 renames it to the variable's own
        // name, so that an INSTRUCTION referencing the variable by name
        // can match it by `id`.
        Line::Var { name } => ObjectRecord {
            full_text: format!("dw {}", name),
            id: "dw".to_string(),
            op_a: name.clone(),
            op_b: String::new(),
            kind: RecordKind::Var,
            mnemonic: Mnemonic::Nope,
            op_type: OperandType::N,
            address: 0,
            size: 0,
        },
        Line::Instruction {
            text,
            id,
            mnemonic,
            op_type,
            op_a,
            op_b,
        } => ObjectRecord {
            full_text: text.clone(),
            id: id.clone(),
            op_a: op_a.as_ref().map(|o| o.render()).unwrap_or_default(),
            op_b: op_b.as_ref().map(|o| o.render()).unwrap_or_default(),
            kind: RecordKind::Instruction,
            mnemonic: *mnemonic,
            op_type: *op_type,
            address: 0,
            size: mnemonic.size_bits(),
        },
    }
}

/// Parses every line of `source` into `ObjectRecord`s, preserving a
/// labeled instruction's two-record shape.
pub fn read_program(source: &str) -> Vec<ObjectRecord> {
    source
        .lines()
        .flat_map(crate::line::parse_line)
        .map(|line| from_line(&line))
        .collect()
}

/// Pass 1: assigns a word address to every record in source order,
/// advancing a running byte counter that only INSTRUCTION records move.
/// Returns the final byte count, which is also where pass 2 picks up when
/// it lays out VAR records after the code image.
pub fn layout(records: &mut [ObjectRecord]) -> u16 {
    let mut bytes: u16 = 0;
    for record in records.iter_mut() {
        record.address = bytes / 2;
        if record.kind == RecordKind::Instruction {
            bytes += record.size / 8;
        }
    }
    bytes
}

/// Pass 2. `program_bytes` is the byte count left by `layout` (or, for the
/// linker, by re-layout across concatenated modules) — VAR records are
/// addressed consecutively starting there, so they land after every
/// INSTRUCTION regardless of where `dw` appeared in source order.
///
/// For every LABEL or VAR record `S` encountered (VARs are additionally
/// addressed and renamed in place first), every INSTRUCTION record whose
/// `op_a`/`op_b` equals `S.id` has that operand overwritten with the
/// decimal text of `S.address`. This is a literal string substitution, not
/// a symbol-table lookup at use sites, run once per symbol.
pub fn resolve_symbols(records: &mut [ObjectRecord], program_bytes: u16) {
    let mut bytes = program_bytes;
    let len = records.len();

    for i in 0..len {
        if records[i].kind == RecordKind::Var {
            let address = bytes / 2;
            records[i].address = address;
            records[i].id = records[i].op_a.clone();
            bytes += 2;
        } else if records[i].kind != RecordKind::Label {
            continue;
        }

        let symbol_id = records[i].id.clone();
        let symbol_address = records[i].address.to_string();

        for other in records.iter_mut() {
            if other.kind != RecordKind::Instruction {
                continue;
            }
            if other.op_a == symbol_id {
                other.op_a = symbol_address.clone();
            }
            if other.op_b == symbol_id {
                other.op_b = symbol_address.clone();
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    const LOOP_PROGRAM: &str = "mov cx, 0x0003\n\
         _top: sub cx, 0x0001\n\
         jz _end\n\
         jmp _top\n\
         _end: dump\n\
         hlt\n";

    #[test]
    fn layout_assigns_word_addresses_and_skips_labels() {
        let mut records = read_program(LOOP_PROGRAM);
        // mov(3) + sub(3) + jz(2) + jmp(2) + dump(1) + hlt(1) = 12 words.
        let total_bytes = layout(&mut records);
        assert_eq!(total_bytes, 24);

        let sub = records
            .iter()
            .find(|r| r.mnemonic == Mnemonic::Sub)
            .unwrap();
        assert_eq!(sub.address, 3); // after the 3-word MOV
        let top_label = records.iter().find(|r| r.id == "_top").unwrap();
        assert_eq!(top_label.address, 3); // label shares its instruction's address
    }

    #[test]
    fn resolve_symbols_substitutes_label_and_forward_reference() {
        let mut records = read_program(LOOP_PROGRAM);
        let total = layout(&mut records);
        resolve_symbols(&mut records, total);

        let top_addr = records
            .iter()
            .find(|r| r.id == "_top")
            .unwrap()
            .address
            .to_string();
        let end_addr = records
            .iter()
            .find(|r| r.id == "_end")
            .unwrap()
            .address
            .to_string();

        let jz = records.iter().find(|r| r.mnemonic == Mnemonic::Jz).unwrap();
        assert_eq!(jz.op_a, end_addr);
        let jmp = records
            .iter()
            .find(|r| r.mnemonic == Mnemonic::Jmp)
            .unwrap();
        assert_eq!(jmp.op_a, top_addr);
    }

    #[test]
    fn var_is_addressed_after_the_code_image() {
        // MOV AX, _x ; DUMP ; HALT ; dw _x — scenario 4.
        let source = "mov ax, _x\ndump\nhlt\ndw _x\n";
        let mut records = read_program(source);
        let total = layout(&mut records);
        resolve_symbols(&mut records, total);

        let mov = records
            .iter()
            .find(|r| r.mnemonic == Mnemonic::Mov)
            .unwrap();
        // Three instructions: MOV (3 words) + DUMP (1 word) + HALT (1 word) = 5 words.
        assert_eq!(mov.op_b, "5");
        let var = records.iter().find(|r| r.kind == RecordKind::Var).unwrap();
        assert_eq!(var.address, 5);
        assert_eq!(var.id, "_x");
    }

    #[test]
    fn labeled_instruction_line_yields_two_records() {
        let records = read_program("_top: sub cx, 0x0001\n");
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].kind, RecordKind::Label);
        assert_eq!(records[1].kind, RecordKind::Instruction);
    }
}
