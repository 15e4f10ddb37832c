//! Fetch/decode loop: read the opcode word, read the operand words
//! unconditionally (bounded), advance IP by the opcode's word length,
//! dispatch, then re-read IP since executing the instruction may have
//! changed it.

use std::io::{BufRead, Write};

use log::trace;
use num_traits::FromPrimitive;

use crate::error::RuntimeError;
use crate::execute::execute;
use crate::isa::{Mnemonic, OperandType};
use crate::memory::{Memory, Reg, MEMORY_LIMIT};

/// Decodes the opcode/operand-type word at `MEM[ip]`. The high byte is the
/// opcode, the low byte the operand-type code.
fn decode_head(word: u16) -> Result<(Mnemonic, OperandType), RuntimeError> {
    let op_type_code = (word & 0x00ff) as i32;
    let opcode = (word >> 8) as i32;
    let mnemonic = Mnemonic::from_i32(opcode).ok_or(RuntimeError::OutOfBounds(word))?;
    let op_type = OperandType::from_i32(op_type_code).ok_or(RuntimeError::OutOfBounds(word))?;
    Ok((mnemonic, op_type))
}

/// Runs one fetch/decode/execute step. Returns `Ok(true)` if the loop
/// should continue (IP still in range after the step), `Ok(false)` when
/// it's time to stop.
pub fn step<R: BufRead, W: Write>(
    memory: &mut Memory,
    input: &mut R,
    output: &mut W,
) -> Result<bool, RuntimeError> {
    let ip = memory.registers.get(Reg::Ip);
    if ip >= MEMORY_LIMIT {
        return Ok(false);
    }

    let head = memory.read(ip)?;
    let (mnemonic, op_type) = decode_head(head)?;

    let op1 = memory.read((ip + 1).min(MEMORY_LIMIT.saturating_sub(1)))?;
    let op2 = memory.read((ip + 2).min(MEMORY_LIMIT.saturating_sub(1)))?;

    trace!(
        "ip={:04} {:?} {:?} op1={:#06x} op2={:#06x}",
        ip, mnemonic, op_type, op1, op2
    );

    memory.registers.set(Reg::Ip, ip + mnemonic.size_words());

    execute(mnemonic, op_type, op1, op2, memory, input, output)?;

    Ok(memory.registers.get(Reg::Ip) < MEMORY_LIMIT)
}

/// Runs the fetch/decode loop to completion: while `IP < MEMORY_LIMIT`,
/// step once; stop on `HALT` (which parks IP past `MEMORY_LIMIT`) or when
/// IP otherwise leaves memory.
pub fn run<R: BufRead, W: Write>(
    memory: &mut Memory,
    input: &mut R,
    output: &mut W,
) -> Result<(), RuntimeError> {
    while memory.registers.get(Reg::Ip) < MEMORY_LIMIT {
        if !step(memory, input, output)? {
            break;
        }
    }
    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::codec::read_executable;
    use crate::record::{from_line, layout, resolve_symbols};
    use std::io::Cursor;

    fn assemble(source: &str) -> Vec<u16> {
        let mut records: Vec<_> = source
            .lines()
            .flat_map(crate::line::parse_line)
            .map(|l| from_line(&l))
            .collect();
        let total = layout(&mut records);
        resolve_symbols(&mut records, total);
        let mut bytes = Vec::new();
        crate::codec::write_executable(&mut bytes, &records).unwrap();
        read_executable(&mut Cursor::new(bytes)).unwrap()
    }

    /// End-to-end scenario 1: immediate move and dump.
    #[test]
    fn scenario_immediate_move_and_dump() {
        let words = assemble("mov ax, 0x00ff\ndump\nhlt\n");
        let mut memory = Memory::new();
        memory.load_image(&words).unwrap();

        let mut input = Cursor::new(Vec::new());
        let mut output = Vec::new();
        run(&mut memory, &mut input, &mut output).unwrap();

        let text = String::from_utf8(output).unwrap();
        let header_row = text.lines().next().unwrap();
        let value_row = text.lines().nth(1).unwrap();
        // IP reads 0004 here: MOV (3 words, address 0) is followed by DUMP
        // (1 word, address 3), and IP is advanced to the next instruction's
        // address (4, HALT) before DUMP's own body runs.
        assert_eq!(
            header_row,
            "AX    BX    CX    SP    BP    IP    ZF    SF    "
        );
        assert_eq!(
            value_row,
            "00ff  0000  0000  03e8  03e8  0004  0000  0000  "
        );
    }

    /// End-to-end scenario 2: add with flags.
    #[test]
    fn scenario_add_with_flags() {
        let words = assemble(
            "mov ax, 0x0001\nmov bx, 0xffff\nadd ax, bx\ndump\nhlt\n",
        );
        let mut memory = Memory::new();
        memory.load_image(&words).unwrap();
        run(&mut memory, &mut Cursor::new(Vec::new()), &mut Vec::new()).unwrap();
        assert_eq!(memory.registers.get(Reg::Ax), 0x0000);
        assert_eq!(memory.registers.get(Reg::Zf), 1);
        assert_eq!(memory.registers.get(Reg::Sf), 0);
    }

    /// End-to-end scenario 3: loop with JZ.
    #[test]
    fn scenario_loop_with_jz() {
        let words = assemble(
            "mov cx, 0x0003\n_top: sub cx, 0x0001\njz _end\njmp _top\n_end: dump\nhlt\n",
        );
        let mut memory = Memory::new();
        memory.load_image(&words).unwrap();
        run(&mut memory, &mut Cursor::new(Vec::new()), &mut Vec::new()).unwrap();
        assert_eq!(memory.registers.get(Reg::Cx), 0);
        assert_eq!(memory.registers.get(Reg::Zf), 1);
    }

    /// End-to-end scenario 5: READ/WRITE.
    #[test]
    fn scenario_read_write() {
        let words = assemble("read ax\nwrite ax\nhlt\n");
        let mut memory = Memory::new();
        memory.load_image(&words).unwrap();
        let mut input = Cursor::new(b"1a2b\n".to_vec());
        let mut output = Vec::new();
        run(&mut memory, &mut input, &mut output).unwrap();
        assert_eq!(String::from_utf8(output).unwrap(), "1a2b  \n");
    }

    /// End-to-end scenario 6: CALL/RET.
    #[test]
    fn scenario_call_ret() {
        let words = assemble("call _f\nhlt\n_f: mov bx, 0x0042\nret\n");
        let mut memory = Memory::new();
        memory.load_image(&words).unwrap();
        run(&mut memory, &mut Cursor::new(Vec::new()), &mut Vec::new()).unwrap();
        assert_eq!(memory.registers.get(Reg::Bx), 0x0042);
        assert_eq!(memory.registers.get(Reg::Sp), MEMORY_LIMIT);
    }
}
