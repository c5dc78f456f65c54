use crate::analysis::{Analyzer, Warning, child_blocks};
use crate::ast::{ElseBranch, Expression, Module, Statement};
use crate::types::{FileId, Spanned};

/// `if` and `while` conditions that are boolean literals. `while true` is
/// left to the infinite loop lint.
pub struct ConstantConditionAnalyzer;

impl ConstantConditionAnalyzer {
    pub fn new() -> Self {
        Self
    }

    fn literal(condition: &Expression) -> Option<bool> {
        match condition {
            Expression::Boolean { value, .. } => Some(*value),
            _ => None,
        }
    }

    fn check_condition(
        condition: &Expression,
        construct: &'static str,
        file_id: FileId,
        warnings: &mut Vec<Warning>,
    ) {
        if let Some(value) = Self::literal(condition) {
            if construct == "while" && value {
                return;
            }
            warnings.push(Warning::ConstantCondition {
                value,
                construct,
                span: condition.span(),
                file_id,
            });
        }
    }

    fn check_statement(statement: &Statement, file_id: FileId, warnings: &mut Vec<Warning>) {
        match statement {
            Statement::If {
                condition,
                else_branch,
                ..
            } => {
                Self::check_condition(condition, "if", file_id, warnings);
                if let Some(ElseBranch::If(nested)) = else_branch {
                    Self::check_statement(nested, file_id, warnings);
                }
            }
            Statement::While { condition, .. } => {
                Self::check_condition(condition, "while", file_id, warnings);
            }
            _ => {}
        }
    }

    fn analyze_statements<'a>(
        &self,
        statements: impl IntoIterator<Item = &'a Statement>,
        file_id: FileId,
        warnings: &mut Vec<Warning>,
    ) {
        for statement in statements {
            Self::check_statement(statement, file_id, warnings);
            for block in child_blocks(statement) {
                self.analyze_statements(&block.statements, file_id, warnings);
            }
        }
    }
}

impl Default for ConstantConditionAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

impl Analyzer for ConstantConditionAnalyzer {
    fn name(&self) -> &str {
        "constant-conditions"
    }

    fn analyze_module(&mut self, module: &Module, file_id: FileId) -> Vec<Warning> {
        let mut warnings = Vec::new();

        for function in module.functions() {
            self.analyze_statements(&function.body.statements, file_id, &mut warnings);
        }
        self.analyze_statements(module.top_level_statements(), file_id, &mut warnings);

        warnings
    }
}
