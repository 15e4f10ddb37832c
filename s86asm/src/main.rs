use std::fs::File;
use std::io::{BufReader, BufWriter, Read};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

#[derive(Debug)]
enum Error {
    Asm(s86asm::Error),
    Io(std::io::Error, &'static str, PathBuf),
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::Io(err, context, path) => {
                write!(f, "{} \"{}\" failed: {}", context, path.display(), err)
            }
            Error::Asm(err) => write!(f, "{}", err),
        }
    }
}

/// Assembles a Simple86 source file into an object module.
#[derive(Parser, Debug)]
#[command(name = "s86asm", version, about)]
struct Args {
    /// Source file to assemble.
    input: PathBuf,

    /// Object module file to write.
    #[arg(short, long, default_value = "exec.sa")]
    output: PathBuf,

    /// Emit per-line and symbol-table trace to stderr.
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> ExitCode {
    let args = Args::parse();

    let mut builder = env_logger::Builder::from_default_env();
    if args.verbose {
        builder.filter_level(log::LevelFilter::Debug);
    }
    builder.init();

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{}", err);
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args) -> Result<(), Error> {
    let mut source = String::new();
    BufReader::new(
        File::open(&args.input)
            .map_err(|err| Error::Io(err, "reading input", args.input.clone()))?,
    )
    .read_to_string(&mut source)
    .map_err(|err| Error::Io(err, "reading input", args.input.clone()))?;

    let records = s86asm::assemble(&source);

    let mut writer = BufWriter::new(
        File::create(&args.output)
            .map_err(|err| Error::Io(err, "creating output", args.output.clone()))?,
    );
    s86::codec::write_object_module(&mut writer, &records)
        .map_err(|err| Error::Asm(s86asm::Error::from(err)))?;

    Ok(())
}
