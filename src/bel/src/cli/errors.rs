use std::error::Error;
use std::fmt;
use std::io;
use std::path::PathBuf;

#[derive(Debug)]
pub enum CliError {
    Io { path: PathBuf, source: io::Error },
    Config { path: PathBuf, message: String },
    NoProgram,
    Logging(String),
    Serialize(serde_json::Error),
    Report(String),
    /// The program failed to parse, check or run. Diagnostics have already
    /// been written.
    Program,
    DeniedWarnings(usize),
}

impl CliError {
    /// 2 for problems with how the tool was invoked, 1 for problems with the
    /// program itself.
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::Config { .. } | CliError::NoProgram | CliError::Logging(_) => 2,
            _ => 1,
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::Io { path, source } => {
                write!(f, "File I/O error on {}: {}", path.display(), source)
            }
            CliError::Config { path, message } => {
                write!(f, "Invalid configuration in {}: {}", path.display(), message)
            }
            CliError::NoProgram => write!(
                f,
                "No program specified. Pass a FILE or use --inline to provide a program."
            ),
            CliError::Logging(message) => write!(f, "Failed to initialize logging: {}", message),
            CliError::Serialize(e) => write!(f, "Failed to serialize syntax tree: {}", e),
            CliError::Report(message) => write!(f, "Failed to report diagnostics: {}", message),
            CliError::Program => write!(f, "Program failed"),
            CliError::DeniedWarnings(count) => {
                write!(f, "{} warning(s) reported and warnings are denied", count)
            }
        }
    }
}

impl Error for CliError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            CliError::Io { source, .. } => Some(source),
            CliError::Serialize(e) => Some(e),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for CliError {
    fn from(err: serde_json::Error) -> Self {
        CliError::Serialize(err)
    }
}

impl From<Box<dyn Error>> for CliError {
    fn from(err: Box<dyn Error>) -> Self {
        CliError::Report(err.to_string())
    }
}
