use crate::analysis::{AnalysisRunner, Warning};
use crate::ast::{Module, pretty};
use crate::cli::args::{CheckArgs, Command, FmtArgs, ProgramSource, SourceArgs};
use crate::cli::config::Config;
use crate::cli::errors::CliError;
use crate::compiler::{CompilationUnit, Compiler};
use crate::diagnostics::DiagnosticManager;
use crate::runtime::{CheckedProgram, Output, ProgramError, Runtime};
use crate::types::FileId;
use std::cell::RefCell;
use std::io::Write;
use std::rc::Rc;
use tracing::info;

pub struct App {
    config: Config,
    diagnostics: DiagnosticManager,
    output: Output,
}

impl App {
    pub fn new(config: Config) -> Self {
        Self::with_output(config, Rc::new(RefCell::new(std::io::stdout())))
    }

    /// Program output and status messages go to `output`; diagnostics
    /// always go to stderr.
    pub fn with_output(config: Config, output: Output) -> Self {
        let diagnostics = DiagnosticManager::new(config.color.to_color_choice());
        Self {
            config,
            diagnostics,
            output,
        }
    }

    pub async fn run(&mut self, command: &Command) -> Result<(), CliError> {
        match command {
            Command::Run(source) => self.run_program(source).await,
            Command::Check(check) => self.check_program(check),
            Command::Fmt(fmt) => self.format_program(fmt),
            Command::Parse(source) => self.dump_program(source),
        }
    }

    fn load(&mut self, source: &SourceArgs) -> Result<(FileId, CompilationUnit), CliError> {
        let (name, text) = source.program_source()?.load()?;
        info!(source = %name, "loading program");
        let file_id = self.diagnostics.add_file(name.clone(), text.clone());
        Ok((file_id, CompilationUnit::new(name, text)))
    }

    fn runtime(&self) -> Runtime {
        Runtime::builder()
            .from_config(&self.config)
            .output(self.output.clone())
            .build()
    }

    fn report(&self, file_id: FileId, error: &ProgramError) -> CliError {
        match self
            .diagnostics
            .reporter()
            .emit_program_error(file_id, error)
        {
            Ok(()) => CliError::Program,
            Err(e) => CliError::from(e),
        }
    }

    fn check_and_lint(
        &self,
        runtime: &Runtime,
        file_id: FileId,
        unit: &CompilationUnit,
        deny_warnings: bool,
    ) -> Result<CheckedProgram, CliError> {
        let checked = runtime
            .check(unit)
            .map_err(|error| self.report(file_id, &error))?;

        let warnings = self.lint(&checked.module, file_id);
        self.diagnostics.reporter().emit_warnings(&warnings)?;
        if deny_warnings && !warnings.is_empty() {
            return Err(CliError::DeniedWarnings(warnings.len()));
        }
        Ok(checked)
    }

    fn lint(&self, module: &Module, file_id: FileId) -> Vec<Warning> {
        AnalysisRunner::with_defaults(&self.config.disabled_lints).run(module, file_id)
    }

    async fn run_program(&mut self, source: &SourceArgs) -> Result<(), CliError> {
        let (file_id, unit) = self.load(source)?;
        let runtime = self.runtime();
        let checked = self.check_and_lint(&runtime, file_id, &unit, self.config.deny_warnings)?;

        runtime
            .execute(&checked)
            .await
            .map_err(|error| self.report(file_id, &error))?;
        Ok(())
    }

    fn check_program(&mut self, check: &CheckArgs) -> Result<(), CliError> {
        let (file_id, unit) = self.load(&check.source)?;
        let runtime = self.runtime();
        let deny_warnings = check.deny_warnings || self.config.deny_warnings;
        self.check_and_lint(&runtime, file_id, &unit, deny_warnings)?;

        self.write_line("All checks passed")
    }

    fn parse(&mut self, source: &SourceArgs) -> Result<Module, CliError> {
        let (file_id, unit) = self.load(source)?;
        Compiler::new()
            .parse(&unit)
            .map_err(|error| self.report(file_id, &ProgramError::Parse(error)))
    }

    fn format_program(&mut self, fmt: &FmtArgs) -> Result<(), CliError> {
        let module = self.parse(&fmt.source)?;
        let formatted = pretty::format_module(&module);

        match (fmt.write, fmt.source.program_source()?) {
            (true, ProgramSource::File(path)) => {
                std::fs::write(&path, formatted).map_err(|e| CliError::Io {
                    path: path.clone(),
                    source: e,
                })?;
                info!(path = %path.display(), "formatted in place");
                Ok(())
            }
            _ => {
                let mut output = self.output.borrow_mut();
                write!(output, "{}", formatted).map_err(|e| self.output_error(e))
            }
        }
    }

    fn dump_program(&mut self, source: &SourceArgs) -> Result<(), CliError> {
        let module = self.parse(source)?;
        let json = serde_json::to_string_pretty(&module)?;
        self.write_line(&json)
    }

    fn write_line(&self, line: &str) -> Result<(), CliError> {
        let mut output = self.output.borrow_mut();
        writeln!(output, "{}", line).map_err(|e| self.output_error(e))
    }

    fn output_error(&self, error: std::io::Error) -> CliError {
        CliError::Io {
            path: "<stdout>".into(),
            source: error,
        }
    }
}
