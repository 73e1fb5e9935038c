//! # Cli
//!
//! This module contains everything needed for parsing the CLI arguments for
//! nou.

use clap::{Parser, ValueEnum};

/// Struct containing the CLI configuration for nou.
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// The path to the script to run. Omit to start a REPL.
    #[arg(index = 1)]
    pub file: Option<std::path::PathBuf>,

    /// Override the library root used to resolve `import`s (defaults to the
    /// script's directory, or the current directory for the REPL).
    #[arg(long)]
    pub lib_root: Option<std::path::PathBuf>,

    /// Disable colored error output.
    #[arg(long)]
    pub no_color: bool,

    /// Specify the log level of the interpreter.
    #[arg(value_enum, short, long, default_value_t = LogLevel::default())]
    pub verbosity: LogLevel,
}

impl Cli {
    pub fn init() -> Self {
        Cli::parse()
    }
}

/// Enum for specifying the log level of nou.
#[derive(ValueEnum, Clone, Default, Debug)]
pub enum LogLevel {
    /// The default log level. Only critical errors will be logged.
    #[default]
    #[value(alias("0"))]
    Error,

    /// A log level where warnings (e.g. a malformed config file) are logged too.
    #[value(alias("1"))]
    Warn,

    /// Also log information about module resolution and script startup.
    #[value(alias("2"))]
    Info,

    /// Log everything which happens internally in the interpreter.
    #[value(alias("3"))]
    Debug,

    /// Log extra information, including per-token lexer/parser tracing.
    #[value(alias("4"))]
    Trace,
}

impl From<&LogLevel> for log::Level {
    fn from(value: &LogLevel) -> Self {
        match value {
            LogLevel::Error => log::Level::Error,
            LogLevel::Warn => log::Level::Warn,
            LogLevel::Info => log::Level::Info,
            LogLevel::Debug => log::Level::Debug,
            LogLevel::Trace => log::Level::Trace,
        }
    }
}
