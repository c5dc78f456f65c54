use crate::analysis::{Analyzer, Warning, child_blocks};
use crate::ast::{Module, Statement};
use crate::types::FileId;

/// Expression statements that compute a value and discard it. Anything
/// containing a call is assumed to be run for its effect.
pub struct UnusedExpressionAnalyzer {
    warnings: Vec<Warning>,
    file_id: FileId,
}

impl UnusedExpressionAnalyzer {
    pub fn new() -> Self {
        Self {
            warnings: Vec::new(),
            file_id: 0,
        }
    }

    fn analyze_statements<'a>(&mut self, statements: impl IntoIterator<Item = &'a Statement>) {
        for statement in statements {
            if let Statement::Expression { expression, span } = statement {
                if !expression.has_side_effects() {
                    self.warnings.push(Warning::UnusedExpression {
                        span: *span,
                        file_id: self.file_id,
                    });
                }
            }
            for block in child_blocks(statement) {
                self.analyze_statements(&block.statements);
            }
        }
    }
}

impl Default for UnusedExpressionAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

impl Analyzer for UnusedExpressionAnalyzer {
    fn name(&self) -> &str {
        "unused-expressions"
    }

    fn analyze_module(&mut self, module: &Module, file_id: FileId) -> Vec<Warning> {
        self.warnings.clear();
        self.file_id = file_id;

        for function in module.functions() {
            self.analyze_statements(&function.body.statements);
        }
        self.analyze_statements(module.top_level_statements());

        std::mem::take(&mut self.warnings)
    }
}
