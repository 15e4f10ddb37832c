//! The instruction set contract: mnemonic table, operand-type codes, and
//! register codes, per the opcode table and operand/register code tables.
//!
//! Plain enums with `ToPrimitive`/`FromPrimitive` for wire encoding and
//! `EnumFromStr` for parsing the source mnemonic/register-name tokens.

use num_derive::{FromPrimitive, ToPrimitive};
use s86_util_derive::EnumFromStr;

/// One ISA mnemonic, or `Nope` for a token the lexer didn't recognize.
///
/// `Nope` carries opcode value 0 and size 0: an unknown mnemonic is
/// silently encoded rather than rejected; callers are expected to
/// `log::warn!` when they see it.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash, ToPrimitive, FromPrimitive)]
pub enum Mnemonic {
    Nope = 0,
    Mov = 1,
    Add = 2,
    Sub = 3,
    Mul = 4,
    Div = 5,
    And = 6,
    Not = 7,
    Or = 8,
    Cmp = 9,
    Jmp = 10,
    Jz = 11,
    Js = 12,
    Call = 13,
    Ret = 14,
    Push = 15,
    Pop = 16,
    Dump = 17,
    Read = 18,
    Write = 19,
    Halt = 20,
}

impl Mnemonic {
    /// Looks up a lowercased source token, honoring the `extern` alias for
    /// `call`. Returns `Mnemonic::Nope` for anything else — unknowns
    /// silently become NOPE, and callers decide whether that warrants a
    /// warning.
    pub fn from_token(token: &str) -> Mnemonic {
        if token == "extern" {
            return Mnemonic::Call;
        }
        match token {
            "mov" => Mnemonic::Mov,
            "add" => Mnemonic::Add,
            "sub" => Mnemonic::Sub,
            "mul" => Mnemonic::Mul,
            "div" => Mnemonic::Div,
            "and" => Mnemonic::And,
            "not" => Mnemonic::Not,
            "or" => Mnemonic::Or,
            "cmp" => Mnemonic::Cmp,
            "jmp" => Mnemonic::Jmp,
            "jz" => Mnemonic::Jz,
            "js" => Mnemonic::Js,
            "call" => Mnemonic::Call,
            "ret" => Mnemonic::Ret,
            "push" => Mnemonic::Push,
            "pop" => Mnemonic::Pop,
            "dump" => Mnemonic::Dump,
            "read" => Mnemonic::Read,
            "write" => Mnemonic::Write,
            "hlt" => Mnemonic::Halt,
            _ => Mnemonic::Nope,
        }
    }

    /// Encoded instruction length in bits: 16, 32, or 48 (0 for `Nope`).
    pub fn size_bits(self) -> u16 {
        use Mnemonic::*;
        match self {
            Mov | Add | Sub | And | Or | Cmp => 48,
            Mul | Div | Not | Jmp | Jz | Js | Call | Push | Pop | Read | Write => 32,
            Ret | Dump | Halt => 16,
            Nope => 0,
        }
    }

    /// Encoded instruction length in words (1, 2, or 3).
    pub fn size_words(self) -> u16 {
        self.size_bits() / 16
    }
}

/// Combined arity+kind tag for an instruction's operand pair.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash, ToPrimitive, FromPrimitive)]
pub enum OperandType {
    N = 0,
    R = 1,
    M = 2,
    Rm = 3,
    Mr = 4,
    Rr = 5,
    Mi = 6,
    Ri = 7,
    I = 8,
}

/// One letter in the per-operand classification used to derive
/// `OperandType` from a parsed `(opA, opB)` pair (see `classify`).
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
enum OperandLetter {
    None,
    Register,
    Memory,
    Immediate,
}

fn letter_of(token: Option<&str>) -> OperandLetter {
    match token.and_then(|t| t.chars().next()) {
        None => OperandLetter::None,
        Some('0') => OperandLetter::Immediate,
        Some('_') => OperandLetter::Memory,
        Some(_) => OperandLetter::Register,
    }
}

/// Classifies an operand pair into an `OperandType`: empty `opA` forces
/// `N` outright (opB is never inspected when opA is absent); otherwise the
/// two operands' letters (`R`/`M`/`I`, or none for absent `opB`) compose
/// into a nine-way table. An unrecognized combination — which can only
/// arise from an absent `opA` paired with a present `opB`, a shape the
/// grammar never produces — degrades to `N`.
pub fn classify(op_a: Option<&str>, op_b: Option<&str>) -> OperandType {
    if op_a.is_none() {
        return OperandType::N;
    }
    use OperandLetter::*;
    match (letter_of(op_a), letter_of(op_b)) {
        (Immediate, None) => OperandType::I,
        (Memory, None) => OperandType::M,
        (Register, None) => OperandType::R,
        (Register, Immediate) => OperandType::Ri,
        (Memory, Immediate) => OperandType::Mi,
        (Memory, Register) => OperandType::Mr,
        (Register, Memory) => OperandType::Rm,
        (Register, Register) => OperandType::Rr,
        _ => OperandType::N,
    }
}

/// One of the nine register operand codes an instruction can reference
/// directly (the machine's other named registers — `BP`, `SP`, `IP`, `ZF`,
/// `SF` — are never instruction operands, only implicit targets of specific
/// opcodes).
#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash, ToPrimitive, FromPrimitive, EnumFromStr)]
pub enum RegisterCode {
    Al = 0,
    Ah = 1,
    Ax = 2,
    Bh = 3,
    Bl = 4,
    Bx = 5,
    Cl = 6,
    Ch = 7,
    Cx = 8,
}
