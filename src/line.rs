//! Lexical line parser: turns one raw source line into one or two typed
//! `Line`s, with fields split and operands classified by shape. Modeled
//! as a tagged enum instead of one struct with fields that are
//! meaningless outside their record kind.

use crate::isa::{classify, Mnemonic, OperandType};
use crate::operand::Operand;

/// First-character classification of a raw operand token: `I` for a hex
/// literal (leading `'0'`), `M` for a symbolic name (leading `'_'`), `R`
/// otherwise.
fn parse_operand(token: &str) -> Operand {
    if token.starts_with('_') {
        Operand::Symbol(token.to_string())
    } else if token.starts_with('0') {
        // Accepts both a bare hex form (`0a5f`) and an `0x`-prefixed form
        // (`0x00ff`); both parse to the same value under base 16.
        let digits = token
            .strip_prefix("0x")
            .or_else(|| token.strip_prefix("0X"))
            .unwrap_or(token);
        let value = u16::from_str_radix(digits, 16).unwrap_or(0);
        Operand::Immediate(value)
    } else {
        Operand::Register(token.to_string())
    }
}

/// A fully parsed source line.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Line {
    /// `_name:` with nothing else on the line.
    Label { name: String },
    /// `dw _name`.
    Var { name: String },
    /// Any other non-blank line.
    Instruction {
        /// The line with its comment stripped and lowercased, as it will be
        /// carried into the object record's `fullText` field.
        text: String,
        /// The mnemonic token as written (honoring the `extern` alias),
        /// carried into the object record's `id` field.
        id: String,
        mnemonic: Mnemonic,
        op_type: OperandType,
        op_a: Option<Operand>,
        op_b: Option<Operand>,
    },
}

/// Strips a `;`-delimited trailing comment and lowercases the rest.
fn strip_comment_and_lowercase(raw: &str) -> String {
    let before_comment = raw.split(';').next().unwrap_or("");
    before_comment.to_lowercase()
}

/// Splits `text` into `(id, opA, opB)`: `id` up to the first space, `opA`
/// up to the first comma, `opB` the remainder. Each field is trimmed of
/// whitespace. Absent fields come back empty.
fn split_fields(text: &str) -> (String, String, String) {
    let text = text.trim();
    let (id, rest) = match text.split_once(' ') {
        Some((id, rest)) => (id.trim(), rest.trim()),
        None => (text, ""),
    };
    let (op_a, op_b) = match rest.split_once(',') {
        Some((a, b)) => (a.trim(), b.trim()),
        None => (rest, ""),
    };
    (id.to_string(), op_a.to_string(), op_b.to_string())
}

fn parse_instruction_fields(text: &str) -> Line {
    let (id, op_a_tok, op_b_tok) = split_fields(text);

    if id == "dw" {
        return Line::Var { name: op_a_tok };
    }

    let op_type = classify(non_empty(&op_a_tok), non_empty(&op_b_tok));
    let op_a = non_empty(&op_a_tok).map(parse_operand);
    let op_b = non_empty(&op_b_tok).map(parse_operand);

    Line::Instruction {
        text: text.to_string(),
        mnemonic: Mnemonic::from_token(&id),
        id,
        op_type,
        op_a,
        op_b,
    }
}

fn non_empty(s: &str) -> Option<&str> {
    if s.is_empty() {
        None
    } else {
        Some(s)
    }
}

/// Parses one source line (without its trailing newline) into one or two
/// `Line`s: almost always one, but a `_label: instruction` line produces a
/// label record followed by the instruction record for its remainder, so
/// both get their own address once layout runs.
///
/// A line whose `id` is an unrecognized token still becomes a
/// `Line::Instruction` with `mnemonic: Mnemonic::Nope` rather than an
/// error; a caller building a strict pipeline should `log::warn!` when it
/// sees one.
pub fn parse_line(raw: &str) -> Vec<Line> {
    let text = strip_comment_and_lowercase(raw);
    let trimmed = text.trim();

    if trimmed.starts_with('_') {
        // `_label:` or `_label: instruction ...`. Split on the first `:`;
        // re-parse the remainder (if any) as an instruction.
        if let Some((label_part, rest)) = trimmed.split_once(':') {
            let name = label_part.trim().to_string();
            let rest = rest.trim();
            if rest.is_empty() {
                return vec![Line::Label { name }];
            }
            return vec![Line::Label { name }, parse_instruction_fields(rest)];
        }
        // A `_`-prefixed id with no `:` at all only happens for a bare
        // `dw`-less memory-symbol token on its own line, which the grammar
        // does not otherwise produce; treat it as an (unresolved) label.
        return vec![Line::Label {
            name: trimmed.to_string(),
        }];
    }

    vec![parse_instruction_fields(trimmed)]
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn parses_label_only_line() {
        assert_eq!(
            parse_line("_top:"),
            vec![Line::Label {
                name: "_top".to_string()
            }]
        );
    }

    #[test]
    fn parses_dw_variable() {
        assert_eq!(
            parse_line("dw _x"),
            vec![Line::Var {
                name: "_x".to_string()
            }]
        );
    }

    #[test]
    fn parses_instruction_with_two_operands() {
        let lines = parse_line("MOV AX, 0x00ff ; comment");
        assert_eq!(lines.len(), 1);
        match &lines[0] {
            Line::Instruction {
                text,
                mnemonic,
                op_type,
                op_a,
                op_b,
                ..
            } => {
                assert_eq!(text, "mov ax, 0x00ff");
                assert_eq!(*mnemonic, Mnemonic::Mov);
                assert_eq!(*op_type, OperandType::Ri);
                assert_eq!(*op_a, Some(Operand::Register("ax".to_string())));
                assert_eq!(*op_b, Some(Operand::Immediate(0x00ff)));
            }
            other => panic!("expected Instruction, got {:?}", other),
        }
    }

    #[test]
    fn parses_labeled_instruction_line_as_two_records() {
        let lines = parse_line("_top: sub cx, 0001");
        assert_eq!(
            lines[0],
            Line::Label {
                name: "_top".to_string()
            }
        );
        match &lines[1] {
            Line::Instruction {
                mnemonic, op_a, op_b, ..
            } => {
                assert_eq!(*mnemonic, Mnemonic::Sub);
                assert_eq!(*op_a, Some(Operand::Register("cx".to_string())));
                assert_eq!(*op_b, Some(Operand::Immediate(1)));
            }
            other => panic!("expected Instruction, got {:?}", other),
        }
    }

    #[test]
    fn unknown_mnemonic_becomes_nope() {
        match &parse_line("bogus ax")[0] {
            Line::Instruction { mnemonic, .. } => assert_eq!(*mnemonic, Mnemonic::Nope),
            other => panic!("expected Instruction, got {:?}", other),
        }
    }

    #[test]
    fn extern_is_an_alias_for_call() {
        match &parse_line("extern _f")[0] {
            Line::Instruction { mnemonic, .. } => assert_eq!(*mnemonic, Mnemonic::Call),
            other => panic!("expected Instruction, got {:?}", other),
        }
    }

    #[test]
    fn symbolic_memory_operand_is_classified_as_memory() {
        match &parse_line("mov ax, _x")[0] {
            Line::Instruction { op_type, op_b, .. } => {
                assert_eq!(*op_type, OperandType::Rm);
                assert_eq!(*op_b, Some(Operand::Symbol("_x".to_string())));
            }
            other => panic!("expected Instruction, got {:?}", other),
        }
    }
}
