use crate::analysis::Warning;
use crate::runtime::ProgramError;
use crate::types::{FileId, SourceFiles};
use codespan_reporting::diagnostic::Diagnostic;
use codespan_reporting::term::termcolor::{ColorChoice, NoColor, StandardStream, WriteColor};
use codespan_reporting::term::{self, Config};

#[derive(Clone)]
pub struct DiagnosticReporter {
    files: SourceFiles,
    config: Config,
    color: ColorChoice,
}

impl DiagnosticReporter {
    pub fn new(files: SourceFiles) -> Self {
        Self {
            files,
            config: Config::default(),
            color: ColorChoice::Auto,
        }
    }

    pub fn with_color(mut self, color: ColorChoice) -> Self {
        self.color = color;
        self
    }

    pub fn emit_program_error(
        &self,
        file_id: FileId,
        error: &ProgramError,
    ) -> Result<(), Box<dyn std::error::Error>> {
        for diagnostic in error.to_diagnostics(file_id) {
            self.emit_diagnostic(&diagnostic)?;
        }
        Ok(())
    }

    pub fn emit_warnings(&self, warnings: &[Warning]) -> Result<(), Box<dyn std::error::Error>> {
        for warning in warnings {
            self.emit_diagnostic(&warning.to_diagnostic())?;
        }
        Ok(())
    }

    pub fn emit_diagnostic(
        &self,
        diagnostic: &Diagnostic<FileId>,
    ) -> Result<(), Box<dyn std::error::Error>> {
        let writer = StandardStream::stderr(self.color);
        self.emit_to(&mut writer.lock(), diagnostic)
    }

    pub fn emit_to(
        &self,
        writer: &mut dyn WriteColor,
        diagnostic: &Diagnostic<FileId>,
    ) -> Result<(), Box<dyn std::error::Error>> {
        let files = self.files.files();
        term::emit(writer, &self.config, &*files.borrow(), diagnostic)
            .map_err(|e| Box::new(e) as Box<dyn std::error::Error>)
    }

    /// Renders `diagnostic` without color, as it would appear on a terminal.
    pub fn render(&self, diagnostic: &Diagnostic<FileId>) -> Result<String, Box<dyn std::error::Error>> {
        let mut buffer = NoColor::new(Vec::new());
        self.emit_to(&mut buffer, diagnostic)?;
        Ok(String::from_utf8_lossy(&buffer.into_inner()).into_owned())
    }

    pub fn files(&self) -> &SourceFiles {
        &self.files
    }
}

impl Default for DiagnosticReporter {
    fn default() -> Self {
        Self::new(SourceFiles::new())
    }
}
