use crate::cli::args::Args;
use crate::cli::errors::CliError;
use crate::runtime::DEFAULT_MAX_CALL_DEPTH;
use codespan_reporting::term::termcolor::ColorChoice;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::debug;

pub const LOCAL_CONFIG_FILE: &str = "bel.toml";

#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ColorMode {
    #[default]
    Auto,
    Always,
    Never,
}

impl ColorMode {
    pub fn to_color_choice(self) -> ColorChoice {
        match self {
            ColorMode::Auto => ColorChoice::Auto,
            ColorMode::Always => ColorChoice::Always,
            ColorMode::Never => ColorChoice::Never,
        }
    }
}

#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// Settings as written in a TOML file. Every field is optional.
#[derive(Deserialize, Debug, Default, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    pub max_call_depth: Option<usize>,
    pub max_steps: Option<u64>,
    pub deny_warnings: Option<bool>,
    pub disabled_lints: Option<Vec<String>>,
    pub color: Option<ColorMode>,
    pub log_level: Option<String>,
    pub log_format: Option<LogFormat>,
}

impl FileConfig {
    pub fn load(path: &Path) -> Result<Self, CliError> {
        let text = std::fs::read_to_string(path).map_err(|e| CliError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        toml::from_str(&text).map_err(|e| CliError::Config {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    /// An explicit path must exist. Otherwise the first of
    /// `<dir>/bel.toml` and `<config_dir>/bel/config.toml` that exists wins.
    pub fn discover(
        explicit: Option<&Path>,
        dir: &Path,
        config_dir: Option<PathBuf>,
    ) -> Result<Option<(PathBuf, FileConfig)>, CliError> {
        if let Some(path) = explicit {
            return Ok(Some((path.to_path_buf(), Self::load(path)?)));
        }

        let candidates = std::iter::once(dir.join(LOCAL_CONFIG_FILE))
            .chain(config_dir.map(|base| base.join("bel").join("config.toml")));
        for candidate in candidates {
            if candidate.is_file() {
                let config = Self::load(&candidate)?;
                return Ok(Some((candidate, config)));
            }
        }
        Ok(None)
    }
}

/// Resolved settings for one invocation.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub max_call_depth: usize,
    pub max_steps: Option<u64>,
    pub deny_warnings: bool,
    pub disabled_lints: Vec<String>,
    pub color: ColorMode,
    pub log_level: String,
    pub log_format: LogFormat,
    pub source: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_call_depth: DEFAULT_MAX_CALL_DEPTH,
            max_steps: None,
            deny_warnings: false,
            disabled_lints: Vec::new(),
            color: ColorMode::Auto,
            log_level: "warn".to_string(),
            log_format: LogFormat::Text,
            source: None,
        }
    }
}

impl Config {
    pub fn from_args(args: &Args) -> Result<Self, CliError> {
        let dir = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
        let file = FileConfig::discover(args.config.as_deref(), &dir, dirs::config_dir())?;
        Ok(Self::resolve(file, args))
    }

    /// Defaults, then the file, then command line flags.
    pub fn resolve(file: Option<(PathBuf, FileConfig)>, args: &Args) -> Self {
        let mut config = Config::default();

        if let Some((path, file)) = file {
            debug!(path = %path.display(), "loaded configuration");
            config.source = Some(path);
            if let Some(depth) = file.max_call_depth {
                config.max_call_depth = depth;
            }
            config.max_steps = file.max_steps.or(config.max_steps);
            config.deny_warnings = file.deny_warnings.unwrap_or(config.deny_warnings);
            if let Some(lints) = file.disabled_lints {
                config.disabled_lints = lints;
            }
            config.color = file.color.unwrap_or(config.color);
            if let Some(level) = file.log_level {
                config.log_level = level;
            }
            config.log_format = file.log_format.unwrap_or(config.log_format);
        }

        if let Some(depth) = args.max_call_depth {
            config.max_call_depth = depth;
        }
        if args.max_steps.is_some() {
            config.max_steps = args.max_steps;
        }
        if let Some(color) = args.color {
            config.color = color;
        }
        if let Some(level) = &args.log_level {
            config.log_level = level.clone();
        }
        config
    }
}
