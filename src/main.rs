//! mobi-inspect - MOBI debug inspector

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use log::{Level, LevelFilter, Log, Metadata, Record};

use mobi_inspect::mobi::report;
use mobi_inspect::{InspectOptions, MobiFile, MobiSummary, inspect_mobi};

#[derive(Parser)]
#[command(name = "mobi-inspect")]
#[command(version, about = "Decode a MOBI file and dump its structures", long_about = None)]
#[command(after_help = "EXAMPLES:
    mobi-inspect book.mobi              Dump into decompiled_book/
    mobi-inspect book.mobi -o out       Dump into out/
    mobi-inspect --no-dump book.mobi    Print the header report only
    mobi-inspect --json book.mobi       Print a JSON summary")]
struct Cli {
    /// MOBI, AZW or PRC file
    #[arg(value_name = "FILE")]
    input: PathBuf,

    /// Dump directory (default: decompiled_<name> beside the input)
    #[arg(short, long, value_name = "DIR")]
    output: Option<PathBuf>,

    /// Print a JSON summary to stdout
    #[arg(long)]
    json: bool,

    /// Do not write a dump directory, print the header report instead
    #[arg(long)]
    no_dump: bool,

    /// Skip pretty.html
    #[arg(long)]
    no_pretty: bool,

    /// More log output (repeat for more)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Only log errors
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

/// Logger writing `level: message` lines to stderr.
struct StderrLogger;

impl Log for StderrLogger {
    fn enabled(&self, metadata: &Metadata<'_>) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record<'_>) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let level = match record.level() {
            Level::Error => "error",
            Level::Warn => "warning",
            Level::Info => "info",
            Level::Debug => "debug",
            Level::Trace => "trace",
        };
        eprintln!("{level}: {}", record.args());
    }

    fn flush(&self) {}
}

static LOGGER: StderrLogger = StderrLogger;

fn init_logging(verbose: u8, quiet: bool) {
    let level = match (quiet, verbose) {
        (true, _) => LevelFilter::Error,
        (false, 0) => LevelFilter::Warn,
        (false, 1) => LevelFilter::Info,
        (false, 2) => LevelFilter::Debug,
        (false, _) => LevelFilter::Trace,
    };
    if log::set_logger(&LOGGER).is_ok() {
        log::set_max_level(level);
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.quiet);

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<(), String> {
    if cli.json || cli.no_dump {
        let data = std::fs::read(&cli.input).map_err(|e| e.to_string())?;
        let file = MobiFile::parse(&data).map_err(|e| e.to_string())?;
        if cli.json {
            let summary = MobiSummary::from_file(&file);
            let json = serde_json::to_string_pretty(&summary).map_err(|e| e.to_string())?;
            println!("{json}");
        } else {
            print!("{}", report::header_report(&file));
        }
        if cli.no_dump {
            return Ok(());
        }
    }

    let options = InspectOptions {
        output_dir: cli.output.clone(),
        pretty: !cli.no_pretty,
    };
    let dir = inspect_mobi(&cli.input, &options).map_err(|e| e.to_string())?;
    if !cli.json && !cli.quiet {
        println!("Debug data saved to: {}", dir.display());
    }
    Ok(())
}
