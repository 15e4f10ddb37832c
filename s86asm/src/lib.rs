//! Assembler for the Simple86 toolchain: turns source text into a
//! resolved stream of `ObjectRecord`s ready for
//! `s86::codec::write_object_module`.
//!
//! A library exposing one entry point (`assemble`) the binary's `main.rs`
//! drives, with `#[cfg(test)] mod test` colocated here rather than in the
//! binary crate.

pub mod error;

use log::{debug, warn};

use s86::isa::Mnemonic;
use s86::record::{layout, read_program, resolve_symbols, ObjectRecord, RecordKind};

pub use error::Error;

/// Runs both assembler passes over `source` and returns the resolved
/// record stream in source order, ready for emission.
///
/// Warns (rather than fails) on a token the lexer didn't recognize: an
/// unknown mnemonic is silently encoded as `Mnemonic::Nope`/size 0 rather
/// than rejected.
pub fn assemble(source: &str) -> Vec<ObjectRecord> {
    let mut records = read_program(source);

    for record in &records {
        if record.kind == RecordKind::Instruction && record.mnemonic == Mnemonic::Nope {
            warn!(
                "unrecognized mnemonic in line {:?}; encoded as NOPE (size 0)",
                record.full_text
            );
        }
    }

    let program_bytes = layout(&mut records);
    debug!(
        "pass 1 complete: {} records, program image is {} bytes ({} words)",
        records.len(),
        program_bytes,
        program_bytes / 2
    );
    for record in &records {
        if record.kind == RecordKind::Instruction {
            debug!(
                "  {:>4} {:<6} opA={:<8} opB={:<8}",
                record.address, record.id, record.op_a, record.op_b
            );
        }
    }

    resolve_symbols(&mut records, program_bytes);
    debug!("pass 2 complete: symbols resolved");
    for record in &records {
        if record.kind == RecordKind::Label || record.kind == RecordKind::Var {
            debug!("  symbol {:<12} -> address {}", record.id, record.address);
        }
    }

    records
}
