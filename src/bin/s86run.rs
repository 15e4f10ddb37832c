//! Emulator CLI: loads a linked executable image into a fresh `Memory`
//! and runs the fetch/decode loop to completion. A thin binary over the
//! library crate.

use std::fs::File;
use std::io::{self, BufReader};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use s86::codec::read_executable;
use s86::cpu::run;
use s86::memory::Memory;

#[derive(Debug)]
enum Error {
    Io(io::Error, &'static str, PathBuf),
    Codec(s86::error::CodecError),
    Runtime(s86::error::RuntimeError),
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::Io(err, context, path) => {
                write!(f, "{} \"{}\" failed: {}", context, path.display(), err)
            }
            Error::Codec(err) => write!(f, "could not load executable image: {}", err),
            Error::Runtime(err) => write!(f, "{}", err),
        }
    }
}

/// Runs a linked Simple86 executable image.
#[derive(Parser, Debug)]
#[command(name = "s86run", version, about)]
struct Args {
    /// Linked executable image to run.
    input: PathBuf,

    /// Emit a per-instruction fetch/decode trace to stderr.
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> ExitCode {
    let args = Args::parse();

    let mut builder = env_logger::Builder::from_default_env();
    if args.verbose {
        builder.filter_level(log::LevelFilter::Trace);
    }
    builder.init();

    match run_emulator(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{}", err);
            ExitCode::FAILURE
        }
    }
}

fn run_emulator(args: &Args) -> Result<(), Error> {
    let file = File::open(&args.input)
        .map_err(|err| Error::Io(err, "reading input", args.input.clone()))?;
    let words =
        read_executable(&mut BufReader::new(file)).map_err(Error::Codec)?;

    let mut memory = Memory::new();
    memory
        .load_image(&words)
        .map_err(Error::Runtime)?;

    let stdin = io::stdin();
    let mut input = stdin.lock();
    let mut output = io::stdout().lock();

    run(&mut memory, &mut input, &mut output).map_err(Error::Runtime)
}
