//! Linker for the Simple86 toolchain: concatenates object modules,
//! re-addresses every record against a single running byte counter, and
//! re-runs symbol resolution across the combined stream so both intra-
//! and inter-module references resolve uniformly.
//!
//! Structured as a library entry point the binary's `main.rs` drives, with
//! `#[cfg(test)] mod test` colocated here.

pub mod error;

use log::debug;

use s86::record::{layout, resolve_symbols, ObjectRecord, RecordKind};

pub use error::Error;

/// Concatenates `modules` (each already the record stream of one assembled
/// object module, in the order the modules were named on the command
/// line) into a single link unit, rebases every record's address against
/// one running byte counter that carries across module boundaries, and
/// re-resolves every symbol across the combined list.
///
/// The assembler has already substituted each module's purely local
/// references; this pass additionally catches any reference — local or
/// cross-module — that still names a symbol, since label/var records
/// carry their `id` into the link unit unchanged.
pub fn link(modules: Vec<Vec<ObjectRecord>>) -> Vec<ObjectRecord> {
    let mut records: Vec<ObjectRecord> = modules.into_iter().flatten().collect();

    let program_bytes = layout(&mut records);
    debug!(
        "linked {} records from all modules, program image is {} bytes",
        records.len(),
        program_bytes
    );

    resolve_symbols(&mut records, program_bytes);
    for record in &records {
        if record.kind == RecordKind::Label || record.kind == RecordKind::Var {
            debug!("  symbol {:<12} -> address {}", record.id, record.address);
        }
    }

    records
}
