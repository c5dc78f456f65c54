use crate::analysis::{Analyzer, Warning};
use crate::ast::{ElseBranch, Module, Statement};
use crate::types::{FileId, Span};
use std::collections::HashMap;

/// Warns when a `let` hides a variable declared in an enclosing block.
/// Redeclaring in the same block is an intentional rebinding and is allowed.
pub struct VariableShadowingAnalyzer;

impl VariableShadowingAnalyzer {
    pub fn new() -> Self {
        Self
    }

    fn analyze_block<'a>(
        &self,
        statements: impl IntoIterator<Item = &'a Statement>,
        file_id: FileId,
        scopes: &mut Vec<HashMap<String, Span>>,
        warnings: &mut Vec<Warning>,
    ) {
        scopes.push(HashMap::new());
        for statement in statements {
            self.analyze_statement(statement, file_id, scopes, warnings);
        }
        scopes.pop();
    }

    fn declare(
        name: &str,
        span: Span,
        file_id: FileId,
        scopes: &mut [HashMap<String, Span>],
        warnings: &mut Vec<Warning>,
    ) {
        let Some((current, outer)) = scopes.split_last_mut() else {
            return;
        };
        if let Some(&outer_span) = outer.iter().rev().find_map(|scope| scope.get(name)) {
            warnings.push(Warning::VariableShadowing {
                name: name.to_string(),
                inner_span: span,
                outer_span,
                file_id,
            });
        }
        current.insert(name.to_string(), span);
    }

    fn analyze_statement(
        &self,
        statement: &Statement,
        file_id: FileId,
        scopes: &mut Vec<HashMap<String, Span>>,
        warnings: &mut Vec<Warning>,
    ) {
        match statement {
            Statement::Let { name, span, .. } => {
                Self::declare(name, *span, file_id, scopes, warnings);
            }
            Statement::If {
                then_block,
                else_branch,
                ..
            } => {
                self.analyze_block(&then_block.statements, file_id, scopes, warnings);
                match else_branch {
                    Some(ElseBranch::Block(block)) => {
                        self.analyze_block(&block.statements, file_id, scopes, warnings)
                    }
                    Some(ElseBranch::If(nested)) => {
                        self.analyze_statement(nested, file_id, scopes, warnings)
                    }
                    None => {}
                }
            }
            Statement::While { body, .. } => {
                self.analyze_block(&body.statements, file_id, scopes, warnings);
            }
            Statement::For {
                variable,
                body,
                span,
                ..
            } => {
                scopes.push(HashMap::new());
                Self::declare(variable, *span, file_id, scopes, warnings);
                for statement in &body.statements {
                    self.analyze_statement(statement, file_id, scopes, warnings);
                }
                scopes.pop();
            }
            Statement::Block(block) => {
                self.analyze_block(&block.statements, file_id, scopes, warnings);
            }
            _ => {}
        }
    }
}

impl Default for VariableShadowingAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

impl Analyzer for VariableShadowingAnalyzer {
    fn name(&self) -> &str {
        "variable-shadowing"
    }

    fn analyze_module(&mut self, module: &Module, file_id: FileId) -> Vec<Warning> {
        let mut warnings = Vec::new();

        for function in module.functions() {
            let mut scopes: Vec<HashMap<String, Span>> = vec![HashMap::new()];
            for parameter in &function.parameters {
                Self::declare(&parameter.name, parameter.span, file_id, &mut scopes, &mut warnings);
            }
            self.analyze_block(&function.body.statements, file_id, &mut scopes, &mut warnings);
        }

        let mut scopes = Vec::new();
        self.analyze_block(
            module.top_level_statements(),
            file_id,
            &mut scopes,
            &mut warnings,
        );

        warnings
    }
}
