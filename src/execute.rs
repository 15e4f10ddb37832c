//! Execute: one dispatch arm per ISA mnemonic, called by the fetch/decode
//! loop with already-fetched operand words.

use std::io::{BufRead, Read, Write};

use num_traits::FromPrimitive;

use crate::error::RuntimeError;
use crate::isa::{Mnemonic, OperandType, RegisterCode};
use crate::memory::{Memory, Reg, MEMORY_LIMIT};

/// Which of the three operand shapes a raw instruction-stream word encodes.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
enum Kind {
    Register,
    Memory,
    Immediate,
}

/// Maps an `OperandType` to the kind of its (opA, opB) pair. `None` for an
/// absent operand.
fn letters(op_type: OperandType) -> (Option<Kind>, Option<Kind>) {
    use Kind::*;
    use OperandType::*;
    match op_type {
        N => (None, None),
        R => (Some(Register), None),
        M => (Some(Memory), None),
        I => (Some(Immediate), None),
        Rr => (Some(Register), Some(Register)),
        Rm => (Some(Register), Some(Memory)),
        Mr => (Some(Memory), Some(Register)),
        Mi => (Some(Memory), Some(Immediate)),
        Ri => (Some(Register), Some(Immediate)),
    }
}

fn reg_of(word: u16) -> Result<Reg, RuntimeError> {
    RegisterCode::from_u16(word)
        .map(Reg::from)
        .ok_or(RuntimeError::OutOfBounds(word))
}

/// Resolves an operand's value from its raw instruction-stream word. A
/// `Memory`-kind operand's word is the symbol's resolved address used
/// directly as a value — not a dereference through that address — the one
/// place this machine indexes through a memory-operand address is `MUL`'s
/// and `DIV`'s opM path, which read `Memory` cells themselves rather than
/// going through this helper.
fn read_operand(kind: Kind, word: u16, memory: &Memory) -> Result<u16, RuntimeError> {
    match kind {
        Kind::Register => Ok(memory.registers.get(reg_of(word)?)),
        Kind::Memory | Kind::Immediate => Ok(word),
    }
}

/// Writes `value` back to the location `word` names. A `Memory`-kind
/// destination carries no real location (see `read_operand`) and so, like
/// an `Immediate` destination, is a no-op.
fn write_operand(
    kind: Kind,
    word: u16,
    memory: &mut Memory,
    value: u16,
) -> Result<(), RuntimeError> {
    match kind {
        Kind::Register => {
            memory.registers.set(reg_of(word)?, value);
            Ok(())
        }
        Kind::Memory | Kind::Immediate => Ok(()),
    }
}

/// Reads one whitespace-delimited token from `input`: skips any leading
/// whitespace, then accumulates bytes up to (but not including) the next
/// whitespace byte or EOF, leaving the remainder of the stream buffered
/// for the next call rather than draining a whole line.
fn read_whitespace_token<R: BufRead>(input: &mut R) -> Result<String, RuntimeError> {
    let mut token = Vec::new();
    let mut started = false;
    for byte in input.bytes() {
        let byte = byte?;
        if byte.is_ascii_whitespace() {
            if started {
                break;
            }
            continue;
        }
        started = true;
        token.push(byte);
    }
    Ok(String::from_utf8_lossy(&token).into_owned())
}

/// Sets ZF/SF from a computed 16-bit result, per the documented flag rule:
/// ZF on a zero result, SF on a negative signed 16-bit result.
fn update_flags(memory: &mut Memory, result: u16) {
    memory.registers.set(Reg::Zf, (result == 0) as u16);
    memory.registers.set(Reg::Sf, (result as i16).is_negative() as u16);
}

/// Runs one already-fetched instruction. `op1`/`op2` are the raw words the
/// fetch/decode loop already read from `MEM[IP+1]`/`MEM[IP+2]`.
pub fn execute<R: BufRead, W: Write>(
    mnemonic: Mnemonic,
    op_type: OperandType,
    op1: u16,
    op2: u16,
    memory: &mut Memory,
    input: &mut R,
    output: &mut W,
) -> Result<(), RuntimeError> {
    let (a_kind, b_kind) = letters(op_type);

    match mnemonic {
        Mnemonic::Nope => {}
        Mnemonic::Mov => {
            let src = read_operand(b_kind.unwrap(), op2, memory)?;
            write_operand(a_kind.unwrap(), op1, memory, src)?;
        }
        Mnemonic::Add => {
            let dst = read_operand(a_kind.unwrap(), op1, memory)?;
            let src = read_operand(b_kind.unwrap(), op2, memory)?;
            let result = dst.wrapping_add(src);
            write_operand(a_kind.unwrap(), op1, memory, result)?;
            update_flags(memory, result);
        }
        Mnemonic::Sub => {
            let dst = read_operand(a_kind.unwrap(), op1, memory)?;
            let src = read_operand(b_kind.unwrap(), op2, memory)?;
            let result = dst.wrapping_sub(src);
            write_operand(a_kind.unwrap(), op1, memory, result)?;
            update_flags(memory, result);
        }
        Mnemonic::And => {
            let dst = read_operand(a_kind.unwrap(), op1, memory)?;
            let src = read_operand(b_kind.unwrap(), op2, memory)?;
            let result = dst & src;
            write_operand(a_kind.unwrap(), op1, memory, result)?;
            update_flags(memory, result);
        }
        Mnemonic::Or => {
            let dst = read_operand(a_kind.unwrap(), op1, memory)?;
            let src = read_operand(b_kind.unwrap(), op2, memory)?;
            let result = dst | src;
            write_operand(a_kind.unwrap(), op1, memory, result)?;
            update_flags(memory, result);
        }
        Mnemonic::Not => {
            let dst = read_operand(a_kind.unwrap(), op1, memory)?;
            let result = !dst;
            write_operand(a_kind.unwrap(), op1, memory, result)?;
            update_flags(memory, result);
        }
        Mnemonic::Cmp => {
            let a = read_operand(a_kind.unwrap(), op1, memory)?;
            let b = read_operand(b_kind.unwrap(), op2, memory)?;
            update_flags(memory, a.wrapping_sub(b));
        }
        Mnemonic::Mul => {
            let ax = memory.registers.get(Reg::Ax);
            let result = match a_kind.unwrap() {
                Kind::Register => ax.wrapping_mul(read_operand(Kind::Register, op1, memory)?),
                Kind::Memory => {
                    let al = memory.registers.get(Reg::Al);
                    al.wrapping_mul(memory.read(op1)?)
                }
                Kind::Immediate => ax.wrapping_mul(op1),
            };
            memory.registers.set(Reg::Ax, result);
        }
        Mnemonic::Div => {
            let is_indirect = a_kind.unwrap() == Kind::Memory;
            let src = if is_indirect {
                memory.read(op1)?
            } else {
                read_operand(a_kind.unwrap(), op1, memory)?
            };
            if src == 0 {
                return Err(RuntimeError::DivideByZero);
            }
            if is_indirect {
                let ax = memory.registers.get(Reg::Ax);
                memory.registers.set(Reg::Al, ax / src);
                memory.registers.set(Reg::Ah, ax % src);
            } else {
                let ax = memory.registers.get(Reg::Ax);
                memory.registers.set(Reg::Ax, ax / src);
                memory.registers.set(Reg::Bx, ax % src);
            }
        }
        Mnemonic::Jmp => {
            let target = read_operand(a_kind.unwrap(), op1, memory)?;
            memory.registers.set(Reg::Ip, target);
        }
        Mnemonic::Jz => {
            if memory.registers.get(Reg::Zf) == 1 {
                let target = read_operand(a_kind.unwrap(), op1, memory)?;
                memory.registers.set(Reg::Ip, target);
            }
        }
        Mnemonic::Js => {
            if memory.registers.get(Reg::Sf) == 1 {
                let target = read_operand(a_kind.unwrap(), op1, memory)?;
                memory.registers.set(Reg::Ip, target);
            }
        }
        Mnemonic::Call => {
            let target = read_operand(a_kind.unwrap(), op1, memory)?;
            let ip = memory.registers.get(Reg::Ip);
            let sp = memory.registers.get(Reg::Sp).wrapping_sub(1);
            memory.write(sp, ip)?;
            memory.registers.set(Reg::Sp, sp);
            memory.registers.set(Reg::Ip, target);
        }
        Mnemonic::Ret => {
            let sp = memory.registers.get(Reg::Sp);
            let target = memory.read(sp)?;
            memory.registers.set(Reg::Sp, sp.wrapping_add(1));
            memory.registers.set(Reg::Ip, target);
        }
        Mnemonic::Push => {
            let value = read_operand(a_kind.unwrap(), op1, memory)?;
            let sp = memory.registers.get(Reg::Sp).wrapping_sub(1);
            memory.write(sp, value)?;
            memory.registers.set(Reg::Sp, sp);
        }
        Mnemonic::Pop => {
            let sp = memory.registers.get(Reg::Sp);
            let value = memory.read(sp)?;
            write_operand(a_kind.unwrap(), op1, memory, value)?;
            memory.registers.set(Reg::Sp, sp.wrapping_add(1));
        }
        Mnemonic::Read => {
            let token = read_whitespace_token(input)?;
            let value = u16::from_str_radix(&token, 16)?;
            write_operand(a_kind.unwrap(), op1, memory, value)?;
            update_flags(memory, value);
        }
        Mnemonic::Write => {
            let value = read_operand(a_kind.unwrap(), op1, memory)?;
            writeln!(output, "{:04x}  ", value)?;
        }
        Mnemonic::Dump => {
            const COLUMNS: [&str; 8] = ["AX", "BX", "CX", "SP", "BP", "IP", "ZF", "SF"];
            let header: String = COLUMNS.iter().map(|name| format!("{:<6}", name)).collect();
            writeln!(output, "{}", header)?;

            let values = [
                memory.registers.get(Reg::Ax),
                memory.registers.get(Reg::Bx),
                memory.registers.get(Reg::Cx),
                memory.registers.get(Reg::Sp),
                memory.registers.get(Reg::Bp),
                memory.registers.get(Reg::Ip),
                memory.registers.get(Reg::Zf),
                memory.registers.get(Reg::Sf),
            ];
            let row: String = values.iter().map(|v| format!("{:04x}  ", v)).collect();
            writeln!(output, "{}", row)?;
        }
        Mnemonic::Halt => {
            memory.registers.set(Reg::Ip, MEMORY_LIMIT + 1);
        }
    }

    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;
    use std::io::Cursor;

    fn run(mnemonic: Mnemonic, op_type: OperandType, op1: u16, op2: u16, memory: &mut Memory) {
        let mut input = Cursor::new(Vec::new());
        let mut output = Vec::new();
        execute(mnemonic, op_type, op1, op2, memory, &mut input, &mut output).unwrap();
    }

    #[test]
    fn mov_immediate_into_register() {
        let mut memory = Memory::new();
        run(Mnemonic::Mov, OperandType::Ri, RegisterCode::Ax as u16, 0x00ff, &mut memory);
        assert_eq!(memory.registers.get(Reg::Ax), 0x00ff);
    }

    #[test]
    fn sub_self_zeroes_and_sets_zf() {
        let mut memory = Memory::new();
        memory.registers.set(Reg::Ax, 5);
        run(Mnemonic::Sub, OperandType::Rr, RegisterCode::Ax as u16, RegisterCode::Ax as u16, &mut memory);
        assert_eq!(memory.registers.get(Reg::Ax), 0);
        assert_eq!(memory.registers.get(Reg::Zf), 1);
        assert_eq!(memory.registers.get(Reg::Sf), 0);
    }

    #[test]
    fn push_then_pop_round_trips_and_restores_sp() {
        let mut memory = Memory::new();
        let sp_before = memory.registers.get(Reg::Sp);
        memory.registers.set(Reg::Ax, 0x1234);
        run(Mnemonic::Push, OperandType::R, RegisterCode::Ax as u16, 0, &mut memory);
        run(Mnemonic::Pop, OperandType::R, RegisterCode::Bx as u16, 0, &mut memory);
        assert_eq!(memory.registers.get(Reg::Bx), 0x1234);
        assert_eq!(memory.registers.get(Reg::Sp), sp_before);
    }

    #[test]
    fn call_then_ret_restores_ip_and_sp() {
        let mut memory = Memory::new();
        let sp_before = memory.registers.get(Reg::Sp);
        memory.registers.set(Reg::Ip, 0x0003);
        run(Mnemonic::Call, OperandType::M, 0x0042, 0, &mut memory);
        assert_eq!(memory.registers.get(Reg::Ip), 0x0042);
        run(Mnemonic::Ret, OperandType::N, 0, 0, &mut memory);
        assert_eq!(memory.registers.get(Reg::Ip), 0x0003);
        assert_eq!(memory.registers.get(Reg::Sp), sp_before);
    }

    #[test]
    fn div_by_zero_is_reported_not_undefined() {
        let mut memory = Memory::new();
        memory.registers.set(Reg::Ax, 10);
        memory.registers.set(Reg::Bx, 0);
        let mut input = Cursor::new(Vec::new());
        let mut output = Vec::new();
        let result = execute(
            Mnemonic::Div,
            OperandType::R,
            RegisterCode::Bx as u16,
            0,
            &mut memory,
            &mut input,
            &mut output,
        );
        assert!(matches!(result, Err(RuntimeError::DivideByZero)));
    }

    #[test]
    fn write_prints_four_hex_digits_and_two_trailing_spaces() {
        let mut memory = Memory::new();
        memory.registers.set(Reg::Ax, 0x1a2b);
        let mut input = Cursor::new(Vec::new());
        let mut output = Vec::new();
        execute(
            Mnemonic::Write,
            OperandType::R,
            RegisterCode::Ax as u16,
            0,
            &mut memory,
            &mut input,
            &mut output,
        )
        .unwrap();
        assert_eq!(String::from_utf8(output).unwrap(), "1a2b  \n");
    }

    #[test]
    fn halt_sets_ip_past_memory_limit() {
        let mut memory = Memory::new();
        run(Mnemonic::Halt, OperandType::N, 0, 0, &mut memory);
        assert!(memory.registers.get(Reg::Ip) > MEMORY_LIMIT);
    }

    #[test]
    fn dump_header_and_values_share_six_char_columns() {
        let mut memory = Memory::new();
        memory.registers.set(Reg::Ax, 0x00ff);
        let mut input = Cursor::new(Vec::new());
        let mut output = Vec::new();
        execute(
            Mnemonic::Dump,
            OperandType::N,
            0,
            0,
            &mut memory,
            &mut input,
            &mut output,
        )
        .unwrap();
        let text = String::from_utf8(output).unwrap();
        let mut lines = text.lines();
        assert_eq!(
            lines.next().unwrap(),
            "AX    BX    CX    SP    BP    IP    ZF    SF    "
        );
        assert_eq!(
            lines.next().unwrap(),
            "00ff  0000  0000  03e8  03e8  0000  0000  0000  "
        );
    }

    #[test]
    fn read_consumes_one_whitespace_delimited_token_at_a_time() {
        let mut memory = Memory::new();
        let mut input = Cursor::new(b"1 2\n".to_vec());
        let mut output = Vec::new();

        execute(
            Mnemonic::Read,
            OperandType::R,
            RegisterCode::Ax as u16,
            0,
            &mut memory,
            &mut input,
            &mut output,
        )
        .unwrap();
        assert_eq!(memory.registers.get(Reg::Ax), 0x1);

        execute(
            Mnemonic::Read,
            OperandType::R,
            RegisterCode::Bx as u16,
            0,
            &mut memory,
            &mut input,
            &mut output,
        )
        .unwrap();
        assert_eq!(memory.registers.get(Reg::Bx), 0x2);
    }
}
