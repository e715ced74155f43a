//! Demo entry point for the selection synchronizer.
//!
//! # Responsibility
//! - Map command-line flags onto logging configuration.
//! - Run a command script against the sample session and print every
//!   delivered event as one JSON line.
//!
//! Exit status is non-zero when any script line failed.

mod demo;
mod script;

use clap::Parser;
use demo::Session;
use log::{info, warn};
use script::{parse_line, ScriptError};
use std::io::{self, BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use treeselect_core::{core_version, default_log_level, init_logging, LoggingConfig};

#[derive(Parser, Debug)]
#[command(author, version, about = "Drive a shared tree selection from several views")]
struct Cli {
    /// Script file to run; reads stdin when omitted.
    #[arg(long)]
    script: Option<PathBuf>,
    /// Log level for the file logger.
    #[arg(long, default_value_t = default_log_level().to_string())]
    log_level: String,
    /// Directory for rotated log files; logging stays off when omitted.
    #[arg(long)]
    log_dir: Option<PathBuf>,
    /// Echo log records to stderr.
    #[arg(long)]
    stderr_log: bool,
    /// Also print position-level events.
    #[arg(long)]
    positions: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(&cli) {
        Ok(0) => ExitCode::SUCCESS,
        Ok(failures) => {
            eprintln!("{failures} script line(s) failed");
            ExitCode::FAILURE
        }
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::from(2)
        }
    }
}

fn run(cli: &Cli) -> Result<usize, ScriptError> {
    if let Some(log_dir) = &cli.log_dir {
        let config = LoggingConfig::new(absolute(log_dir)?)
            .with_level(cli.log_level.as_str())
            .with_stderr(cli.stderr_log);
        init_logging(&config)?;
    }
    info!(
        "event=cli_start module=cli status=ok core_version={} script={}",
        core_version(),
        cli.script
            .as_deref()
            .map_or_else(|| "stdin".to_string(), |path| path.display().to_string())
    );

    let input: Box<dyn BufRead> = match &cli.script {
        Some(path) => Box::new(BufReader::new(std::fs::File::open(path)?)),
        None => Box::new(io::stdin().lock()),
    };
    let session = Session::new(cli.positions)?;
    let stdout = io::stdout();
    let mut out = stdout.lock();

    let mut executed = 0usize;
    let mut failures = 0usize;
    for (index, line) in input.lines().enumerate() {
        let line = line?;
        let outcome = parse_line(&line).and_then(|parsed| match parsed {
            Some(parsed) => session.execute(&parsed).map(|()| true),
            None => Ok(false),
        });
        match outcome {
            Ok(true) => executed += 1,
            Ok(false) => {}
            Err(err) => {
                failures += 1;
                warn!(
                    "event=cli_line module=cli status=error line={} error={}",
                    index + 1,
                    err
                );
                eprintln!("line {}: {err}", index + 1);
            }
        }
        for rendered in session.drain_output() {
            writeln!(out, "{rendered}")?;
        }
    }
    out.flush()?;

    info!(
        "event=cli_finish module=cli status=ok executed={} failures={}",
        executed, failures
    );
    Ok(failures)
}

fn absolute(path: &Path) -> Result<PathBuf, ScriptError> {
    if path.is_absolute() {
        return Ok(path.to_path_buf());
    }
    Ok(std::env::current_dir()?.join(path))
}
