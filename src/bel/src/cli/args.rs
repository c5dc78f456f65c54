use crate::cli::config::ColorMode;
use crate::cli::errors::CliError;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "bel")]
#[command(version = "0.1.0")]
#[command(about = "Parser, type checker and interpreter for the BEL language")]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,

    #[arg(
        short = 'c',
        long,
        global = true,
        value_name = "FILE",
        help = "Path to configuration file (TOML format)"
    )]
    pub config: Option<PathBuf>,

    #[arg(long, global = true, value_enum, help = "When to color diagnostics")]
    pub color: Option<ColorMode>,

    #[arg(long, global = true, value_name = "DEPTH", help = "Maximum function call depth")]
    pub max_call_depth: Option<usize>,

    #[arg(
        long,
        global = true,
        value_name = "STEPS",
        help = "Abort after executing this many statements and loop iterations"
    )]
    pub max_steps: Option<u64>,

    #[arg(
        long,
        global = true,
        value_name = "FILTER",
        help = "Log filter used when RUST_LOG is unset"
    )]
    pub log_level: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    #[command(about = "Check and execute a program")]
    Run(SourceArgs),

    #[command(about = "Parse, typecheck and lint a program without executing")]
    Check(CheckArgs),

    #[command(about = "Print a program in canonical form")]
    Fmt(FmtArgs),

    #[command(about = "Dump the syntax tree of a program as JSON")]
    Parse(SourceArgs),
}

#[derive(Parser, Debug, Clone)]
pub struct SourceArgs {
    #[arg(value_name = "FILE", conflicts_with = "inline")]
    pub file: Option<PathBuf>,

    #[arg(short = 'i', long, value_name = "CODE", conflicts_with = "file")]
    pub inline: Option<String>,
}

#[derive(Parser, Debug, Clone)]
pub struct CheckArgs {
    #[command(flatten)]
    pub source: SourceArgs,

    #[arg(long, help = "Treat lint warnings as errors")]
    pub deny_warnings: bool,
}

#[derive(Parser, Debug, Clone)]
pub struct FmtArgs {
    #[command(flatten)]
    pub source: SourceArgs,

    #[arg(long, requires = "file", help = "Rewrite the file in place")]
    pub write: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ProgramSource {
    File(PathBuf),
    Inline(String),
}

impl ProgramSource {
    /// Display name and source text.
    pub fn load(&self) -> Result<(String, String), CliError> {
        match self {
            ProgramSource::File(path) => {
                let source = std::fs::read_to_string(path).map_err(|e| CliError::Io {
                    path: path.clone(),
                    source: e,
                })?;
                Ok((path.display().to_string(), source))
            }
            ProgramSource::Inline(code) => Ok(("<inline>".to_string(), code.clone())),
        }
    }
}

impl SourceArgs {
    pub fn program_source(&self) -> Result<ProgramSource, CliError> {
        match (&self.file, &self.inline) {
            (_, Some(code)) => Ok(ProgramSource::Inline(code.clone())),
            (Some(path), None) => Ok(ProgramSource::File(path.clone())),
            (None, None) => Err(CliError::NoProgram),
        }
    }
}
