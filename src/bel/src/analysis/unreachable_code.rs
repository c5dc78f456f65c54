use crate::analysis::{Analyzer, Warning, child_blocks};
use crate::ast::{ElseBranch, Module, Statement};
use crate::types::{FileId, Span, Spanned};

/// Flags statements that follow a `return`, `break` or `continue` in the
/// same block. Each block produces at most one warning spanning every dead
/// statement.
pub struct ReachabilityAnalyzer {
    warnings: Vec<Warning>,
}

impl ReachabilityAnalyzer {
    pub fn new() -> Self {
        Self {
            warnings: Vec::new(),
        }
    }

    /// Returns whether control can fall off the end of `statements`.
    fn analyze_statements<'a>(
        &mut self,
        statements: impl IntoIterator<Item = &'a Statement>,
        file_id: FileId,
    ) -> bool {
        let mut reachable = true;
        let mut dead: Option<Span> = None;

        for statement in statements {
            if !reachable {
                dead = Some(match dead {
                    Some(span) => span.merge(statement.span()),
                    None => statement.span(),
                });
                continue;
            }
            for block in child_blocks(statement) {
                self.analyze_statements(&block.statements, file_id);
            }
            reachable = !Self::diverges(statement);
        }

        if let Some(span) = dead {
            self.warnings
                .push(Warning::UnreachableCode { span, file_id });
        }
        reachable
    }

    fn diverges(statement: &Statement) -> bool {
        match statement {
            Statement::Return { .. } | Statement::Break { .. } | Statement::Continue { .. } => {
                true
            }
            Statement::Block(block) => block.statements.iter().any(Self::diverges),
            Statement::If {
                then_block,
                else_branch: Some(else_branch),
                ..
            } => {
                let then_diverges = then_block.statements.iter().any(Self::diverges);
                let else_diverges = match else_branch {
                    ElseBranch::Block(block) => block.statements.iter().any(Self::diverges),
                    ElseBranch::If(nested) => Self::diverges(nested),
                };
                then_diverges && else_diverges
            }
            _ => false,
        }
    }
}

impl Analyzer for ReachabilityAnalyzer {
    fn name(&self) -> &str {
        "unreachable-code"
    }

    fn analyze_module(&mut self, module: &Module, file_id: FileId) -> Vec<Warning> {
        self.warnings.clear();

        for function in module.functions() {
            self.analyze_statements(&function.body.statements, file_id);
        }
        self.analyze_statements(module.top_level_statements(), file_id);

        let mut warnings = std::mem::take(&mut self.warnings);
        warnings.sort_by_key(|warning| warning.span().start);
        warnings
    }
}

impl Default for ReachabilityAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}
