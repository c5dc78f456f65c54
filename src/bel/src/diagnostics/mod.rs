pub mod reporter;

pub use reporter::DiagnosticReporter;

use crate::types::{FileId, SourceFiles};
use codespan_reporting::term::termcolor::ColorChoice;

/// Owns the source files of one session and a reporter that renders
/// against them.
pub struct DiagnosticManager {
    files: SourceFiles,
    reporter: DiagnosticReporter,
}

impl DiagnosticManager {
    pub fn new(color: ColorChoice) -> Self {
        let files = SourceFiles::new();
        let reporter = DiagnosticReporter::new(files.clone()).with_color(color);
        Self { files, reporter }
    }

    pub fn add_file(&mut self, name: String, source: String) -> FileId {
        self.files.add(name, source)
    }

    pub fn files(&self) -> &SourceFiles {
        &self.files
    }

    pub fn reporter(&self) -> &DiagnosticReporter {
        &self.reporter
    }
}

impl Default for DiagnosticManager {
    fn default() -> Self {
        Self::new(ColorChoice::Auto)
    }
}
