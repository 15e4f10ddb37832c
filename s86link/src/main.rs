use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use log::error;

use s86::record::ObjectRecord;

#[derive(Debug)]
enum Error {
    Link(s86link::Error),
    Io(std::io::Error, &'static str, PathBuf),
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::Io(err, context, path) => {
                write!(f, "{} \"{}\" failed: {}", context, path.display(), err)
            }
            Error::Link(err) => write!(f, "{}", err),
        }
    }
}

/// Links one or more Simple86 object modules into an executable image.
#[derive(Parser, Debug)]
#[command(name = "s86link", version, about)]
struct Args {
    /// Executable image to write.
    output: PathBuf,

    /// Object modules to link, in the order given.
    modules: Vec<PathBuf>,

    /// Emit per-symbol trace to stderr.
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

/// Reads one module file's records. A missing or malformed module is
/// logged to stderr and skipped rather than treated as fatal; the
/// resulting executable image may itself be malformed as a result.
fn read_module(path: &std::path::Path) -> Option<Vec<ObjectRecord>> {
    let file = match File::open(path) {
        Ok(file) => file,
        Err(err) => {
            error!("skipping module \"{}\": {}", path.display(), err);
            return None;
        }
    };
    match s86::codec::read_object_module(&mut BufReader::new(file)) {
        Ok(records) => Some(records),
        Err(err) => {
            error!("skipping module \"{}\": {}", path.display(), err);
            None
        }
    }
}

fn run(args: &Args) -> Result<(), Error> {
    let modules: Vec<Vec<ObjectRecord>> = args
        .modules
        .iter()
        .filter_map(|path| read_module(path))
        .collect();

    let records = s86link::link(modules);

    let mut writer = BufWriter::new(
        File::create(&args.output)
            .map_err(|err| Error::Io(err, "creating output", args.output.clone()))?,
    );
    s86::codec::write_executable(&mut writer, &records)
        .map_err(|err| Error::Link(s86link::Error::from(err)))?;

    Ok(())
}
