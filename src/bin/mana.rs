//! Manascript command-line.
//!
//! When called without path it drops into an interactive read-evaluate-print loop.
//!
//! When called with paths, it interprets the corresponding files in a single interpreter
//! session (so data sharing is possible).

use std::fs::File;
use std::io;
use std::io::prelude::*;
use std::io::BufReader;
use std::path::PathBuf;

use anyhow::{self, Context};
use clap::Parser;
use tracing::{debug, Level};

use manascript::config::Config;
use manascript::interpreter::{Interpreter, ManaError};
use manascript::value::Value;

/// Run Manascript programs.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Fail when assigning to a variable that was never declared.
    #[arg(long)]
    strict: bool,

    /// Print the syntax tree of each file instead of running it.
    #[arg(long)]
    dump_ast: bool,

    /// Log to stderr.  Repeat for more details.
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Scripts to run in order.
    paths: Vec<PathBuf>,
}

fn main() -> Result<(), anyhow::Error> {
    let args = Args::parse();
    init_logging(args.verbose);

    let config = Config::default().with_strict_assignment(args.strict);
    if args.paths.is_empty() {
        run_prompt(config)?;
    } else {
        run_all_files(&args.paths, config, args.dump_ast)?;
    }
    Ok(())
}

fn init_logging(verbosity: u8) {
    let level = match verbosity {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_target(false)
        .with_max_level(level)
        .init();
}

fn run_all_files(paths: &[PathBuf], config: Config, dump_ast: bool) -> Result<(), anyhow::Error> {
    let mut interp_stdout = io::stdout();
    let mut interp = Interpreter::with_config(&mut interp_stdout, config);

    for p in paths {
        let reader = BufReader::new(
            File::open(p).with_context(|| format!("failed to open {}", p.display()))?,
        );
        interp.set_file_name(p.display().to_string());
        let config = interp.config();
        debug!(
            file = %config.file_name,
            strict = config.strict_assignment,
            "running"
        );
        let result = if dump_ast {
            print_ast(&interp, reader)
        } else {
            interp.eval(reader)
        };
        result.with_context(|| format!("failed to run {}", p.display()))?;
    }

    Ok(())
}

fn print_ast<W: Write, R: BufRead>(
    interp: &Interpreter<'_, W>,
    input: R,
) -> Result<(), ManaError> {
    let (prg, diagnostics) = interp.parse(input)?;
    for stmt in &prg {
        println!("{}", stmt);
    }
    if diagnostics.has_errors() {
        return Err(ManaError::Syntax(diagnostics));
    }
    Ok(())
}

fn run_prompt(config: Config) -> Result<(), io::Error> {
    let stdin = io::stdin();
    let mut repl_stdout = io::stdout();
    let mut interp_stdout = io::stdout();

    let mut interp = Interpreter::with_config(&mut interp_stdout, config.with_file_name("<stdin>"));

    let mut input = String::new();
    loop {
        repl_stdout.write_all(b"> ")?;
        repl_stdout.flush()?;

        input.clear();
        let nbytes = stdin.read_line(&mut input)?;
        if nbytes == 0 {
            break;
        }

        match interp.eval(input.as_bytes()) {
            Ok(()) if *interp.last_value() != Value::Nil => {
                writeln!(repl_stdout, "{}", interp.last_value())?;
            }
            Ok(()) => (),
            Err(e) => eprintln!("{}", e),
        }
    }

    Ok(())
}
