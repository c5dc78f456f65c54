mod app;
mod args;
pub mod config;
mod errors;
pub mod logging;

pub use app::App;
pub use args::{Args, CheckArgs, Command, FmtArgs, ProgramSource, SourceArgs};
pub use config::{ColorMode, Config, FileConfig, LogFormat};
pub use errors::CliError;
