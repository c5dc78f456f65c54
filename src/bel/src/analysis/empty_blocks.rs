use crate::analysis::{Analyzer, Warning, child_blocks};
use crate::ast::{Block, ElseBranch, Module, Statement};
use crate::types::FileId;

pub struct EmptyBlockAnalyzer;

impl EmptyBlockAnalyzer {
    pub fn new() -> Self {
        Self
    }

    fn check_block(
        block: &Block,
        block_type: &'static str,
        file_id: FileId,
        warnings: &mut Vec<Warning>,
    ) {
        if block.statements.is_empty() {
            warnings.push(Warning::EmptyBlock {
                block_type,
                span: block.span,
                file_id,
            });
        }
    }

    fn analyze_statements<'a>(
        &self,
        statements: impl IntoIterator<Item = &'a Statement>,
        file_id: FileId,
        warnings: &mut Vec<Warning>,
    ) {
        for statement in statements {
            self.check_statement(statement, file_id, warnings);
            for block in child_blocks(statement) {
                self.analyze_statements(&block.statements, file_id, warnings);
            }
        }
    }

    fn check_statement(&self, statement: &Statement, file_id: FileId, warnings: &mut Vec<Warning>) {
        match statement {
            Statement::If {
                then_block,
                else_branch,
                ..
            } => {
                Self::check_block(then_block, "if", file_id, warnings);
                match else_branch {
                    Some(ElseBranch::Block(block)) => {
                        Self::check_block(block, "else", file_id, warnings)
                    }
                    Some(ElseBranch::If(nested)) => self.check_statement(nested, file_id, warnings),
                    None => {}
                }
            }
            Statement::While { body, .. } => Self::check_block(body, "while", file_id, warnings),
            Statement::For { body, .. } => Self::check_block(body, "for", file_id, warnings),
            _ => {}
        }
    }
}

impl Default for EmptyBlockAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

impl Analyzer for EmptyBlockAnalyzer {
    fn name(&self) -> &str {
        "empty-blocks"
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
