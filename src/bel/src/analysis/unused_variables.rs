use crate::analysis::{Analyzer, Warning};
use crate::ast::{ElseBranch, Expression, Module, Statement};
use crate::types::{FileId, Span};

#[derive(Debug, Clone)]
struct VariableInfo {
    name: String,
    declaration_span: Span,
    read: bool,
}

/// Reports `let` bindings whose value is never read before they go out of
/// scope or are shadowed. Names starting with `_` are exempt.
pub struct UnusedVariableAnalyzer {
    scopes: Vec<Vec<VariableInfo>>,
    unused: Vec<VariableInfo>,
}

impl UnusedVariableAnalyzer {
    pub fn new() -> Self {
        Self {
            scopes: Vec::new(),
            unused: Vec::new(),
        }
    }

    fn enter_scope(&mut self) {
        self.scopes.push(Vec::new());
    }

    fn exit_scope(&mut self) {
        if let Some(scope) = self.scopes.pop() {
            self.unused.extend(
                scope
                    .into_iter()
                    .filter(|info| !info.read && !info.name.starts_with('_')),
            );
        }
    }

    fn track_declaration(&mut self, name: &str, span: Span) {
        if let Some(scope) = self.scopes.last_mut() {
            scope.push(VariableInfo {
                name: name.to_string(),
                declaration_span: span,
                read: false,
            });
        }
    }

    /// Loop variables and parameters shadow like `let` but are never reported.
    fn track_binding(&mut self, name: &str, span: Span) {
        self.track_declaration(name, span);
        if let Some(info) = self.scopes.last_mut().and_then(|scope| scope.last_mut()) {
            info.read = true;
        }
    }

    fn track_read(&mut self, name: &str) {
        let declaration = self
            .scopes
            .iter_mut()
            .rev()
            .find_map(|scope| scope.iter_mut().rev().find(|info| info.name == name));
        if let Some(info) = declaration {
            info.read = true;
        }
    }

    fn analyze_statements<'a>(&mut self, statements: impl IntoIterator<Item = &'a Statement>) {
        for statement in statements {
            self.analyze_statement(statement);
        }
    }

    fn analyze_block<'a>(&mut self, statements: impl IntoIterator<Item = &'a Statement>) {
        self.enter_scope();
        self.analyze_statements(statements);
        self.exit_scope();
    }

    fn analyze_statement(&mut self, statement: &Statement) {
        match statement {
            Statement::Let {
                name, value, span, ..
            } => {
                if let Some(value) = value {
                    self.analyze_expression(value);
                }
                self.track_declaration(name, *span);
            }
            Statement::Assign { value, .. } => self.analyze_expression(value),
            Statement::If {
                condition,
                then_block,
                else_branch,
                ..
            } => {
                self.analyze_expression(condition);
                self.analyze_block(&then_block.statements);
                match else_branch {
                    Some(ElseBranch::Block(block)) => self.analyze_block(&block.statements),
                    Some(ElseBranch::If(nested)) => self.analyze_statement(nested),
                    None => {}
                }
            }
            Statement::While {
                condition, body, ..
            } => {
                self.analyze_expression(condition);
                self.analyze_block(&body.statements);
            }
            Statement::For {
                variable,
                start,
                end,
                body,
                span,
                ..
            } => {
                self.analyze_expression(start);
                self.analyze_expression(end);
                self.enter_scope();
                self.track_binding(variable, *span);
                self.analyze_statements(&body.statements);
                self.exit_scope();
            }
            Statement::Return {
                value: Some(value), ..
            } => self.analyze_expression(value),
            Statement::Expression { expression, .. } => self.analyze_expression(expression),
            Statement::Block(block) => self.analyze_block(&block.statements),
            Statement::Return { value: None, .. }
            | Statement::Break { .. }
            | Statement::Continue { .. } => {}
        }
    }

    fn analyze_expression(&mut self, expression: &Expression) {
        match expression {
            Expression::Variable { name, .. } => self.track_read(name),
            Expression::Call { arguments, .. } => {
                for argument in arguments {
                    self.analyze_expression(argument);
                }
            }
            Expression::Unary { operand, .. } => self.analyze_expression(operand),
            Expression::Binary { left, right, .. } => {
                self.analyze_expression(left);
                self.analyze_expression(right);
            }
            Expression::Cast { expression, .. } => self.analyze_expression(expression),
            Expression::Integer { .. } | Expression::Boolean { .. } | Expression::Char { .. } => {}
        }
    }

    fn take_warnings(&mut self, file_id: FileId) -> Vec<Warning> {
        let mut unused = std::mem::take(&mut self.unused);
        unused.sort_by_key(|info| info.declaration_span.start);
        unused
            .into_iter()
            .map(|info| Warning::UnusedVariable {
                name: info.name,
                span: info.declaration_span,
                file_id,
            })
            .collect()
    }
}

impl Analyzer for UnusedVariableAnalyzer {
    fn name(&self) -> &str {
        "unused-variables"
    }

    fn analyze_module(&mut self, module: &Module, file_id: FileId) -> Vec<Warning> {
        self.scopes.clear();
        self.unused.clear();

        for function in module.functions() {
            self.enter_scope();
            for parameter in &function.parameters {
                self.track_binding(&parameter.name, parameter.span);
            }
            self.analyze_block(&function.body.statements);
            self.exit_scope();
        }

        self.analyze_block(module.top_level_statements());

        self.take_warnings(file_id)
    }
}

impl Default for UnusedVariableAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}
