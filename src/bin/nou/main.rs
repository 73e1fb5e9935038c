//! # Nou
//!
//! Command-line entry point for the nougaro interpreter: runs a script file
//! to completion, or drops into a line-reading REPL when none is given.

mod cli;

use cli::Cli;

use std::io::Write as _;
use std::path::PathBuf;
use std::process::ExitCode;

use colored::Colorize;
use log::info;
use nou::config::InterpreterConfig;

fn main() -> ExitCode {
    let args = Cli::init();

    simple_logger::init_with_level((&args.verbosity).into()).unwrap();

    match &args.file {
        Some(path) => run_file(path, &args),
        None => run_repl(&args),
    }
}

fn run_file(path: &PathBuf, args: &Cli) -> ExitCode {
    let text = match std::fs::read_to_string(path) {
        Ok(t) => t,
        Err(e) => {
            eprintln!("{}: cannot read '{}': {e}", "error".red().bold(), path.display());
            return ExitCode::from(2);
        }
    };

    let entry_dir = path.parent().map(PathBuf::from).unwrap_or_else(|| PathBuf::from("."));
    let mut config = InterpreterConfig::discover(&entry_dir);
    config.apply_cli_overrides(args.lib_root.clone(), args.no_color);

    info!("running {}", path.display());
    let name = path.to_string_lossy().into_owned();
    match nou::run_source(name, text, &config.lib_root) {
        Ok(outcome) => ExitCode::from(outcome.exit_code.unwrap_or(0).clamp(0, 255) as u8),
        Err(e) => {
            print_error(&e, config.color);
            ExitCode::from(1)
        }
    }
}

fn run_repl(args: &Cli) -> ExitCode {
    let entry_dir = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    let mut config = InterpreterConfig::discover(&entry_dir);
    config.apply_cli_overrides(args.lib_root.clone(), args.no_color);

    println!("nougaro REPL. Ctrl-D to exit.");
    let stdin = std::io::stdin();
    let mut line_no: usize = 0;
    loop {
        line_no += 1;
        print!(">>> ");
        let _ = std::io::stdout().flush();

        let mut line = String::new();
        match stdin.read_line(&mut line) {
            Ok(0) => break,
            Ok(_) => {}
            Err(e) => {
                eprintln!("{}: {e}", "error".red().bold());
                break;
            }
        }
        if line.trim().is_empty() {
            continue;
        }

        match nou::run_source(format!("<repl:{line_no}>"), line, &config.lib_root) {
            Ok(outcome) => {
                if let Some(code) = outcome.exit_code {
                    return ExitCode::from(code.clamp(0, 255) as u8);
                }
                println!("{}", outcome.value);
            }
            Err(e) => print_error(&e, config.color),
        }
    }
    ExitCode::from(0)
}

fn print_error(e: &nou::error::NougaroError, color: bool) {
    let rendered = e.to_string();
    if color {
        eprintln!("{}", rendered.red());
    } else {
        eprintln!("{rendered}");
    }
}
