//! A typed operand representation used by the lexical parser in place of
//! stringly-typed `opA`/`opB` fields.

/// One parsed operand: a register mnemonic, a hex literal, or a symbolic
/// name. Register tokens are kept as text rather than an already-resolved
/// `isa::RegisterCode`, since a register name is only validated at
/// emission time — the lexer itself never rejects a malformed register
/// name, warning rather than failing the parse.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Operand {
    Register(String),
    Immediate(u16),
    Symbol(String),
}

impl Operand {
    /// Canonical string rendering used for the object record's `opA`/`opB`
    /// fields — the stringly-typed wire format both the assembler's
    /// two-pass symbol resolution and the linker operate on.
    pub fn render(&self) -> String {
        match self {
            Operand::Register(name) => name.clone(),
            Operand::Immediate(value) => format!("0{:x}", value),
            Operand::Symbol(name) => name.clone(),
        }
    }
}
