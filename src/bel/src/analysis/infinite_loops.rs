use crate::analysis::{Analyzer, Warning, child_blocks};
use crate::ast::{Block, Expression, Module, Statement};
use crate::types::{FileId, Spanned};
use std::collections::HashMap;

/// Reports `while` loops whose condition can never become false and whose
/// body has no `break` or `return` to leave them.
pub struct InfiniteLoopAnalyzer {
    constant_true: HashMap<String, bool>,
}

impl InfiniteLoopAnalyzer {
    pub fn new() -> Self {
        Self {
            constant_true: HashMap::new(),
        }
    }

    /// Records every variable that is initialized with `true` and never
    /// assigned afterwards.
    fn collect_assignments<'a>(&mut self, statements: impl IntoIterator<Item = &'a Statement>) {
        for statement in statements {
            match statement {
                Statement::Let { name, value, .. } => {
                    let is_true = matches!(value, Some(Expression::Boolean { value: true, .. }));
                    let previous = self.constant_true.insert(name.clone(), is_true);
                    if previous.is_some() {
                        self.constant_true.insert(name.clone(), false);
                    }
                }
                Statement::Assign { target, .. } => {
                    self.constant_true.insert(target.clone(), false);
                }
                _ => {}
            }
            for block in child_blocks(statement) {
                self.collect_assignments(&block.statements);
            }
        }
    }

    fn is_constant_true(&self, condition: &Expression) -> bool {
        match condition {
            Expression::Boolean { value, .. } => *value,
            Expression::Variable { name, .. } => {
                self.constant_true.get(name).copied().unwrap_or(false)
            }
            _ => false,
        }
    }

    fn analyze_statements<'a>(
        &self,
        statements: impl IntoIterator<Item = &'a Statement>,
        file_id: FileId,
        warnings: &mut Vec<Warning>,
    ) {
        for statement in statements {
            if let Statement::While {
                condition, body, ..
            } = statement
            {
                if self.is_constant_true(condition) && !Self::exits(body, false) {
                    warnings.push(Warning::PotentialInfiniteLoop {
                        span: condition.span(),
                        file_id,
                    });
                }
            }
            for block in child_blocks(statement) {
                self.analyze_statements(&block.statements, file_id, warnings);
            }
        }
    }

    /// Whether `block` contains a `return`, or a `break` that targets the
    /// loop being examined rather than a nested one.
    fn exits(block: &Block, nested: bool) -> bool {
        block.statements.iter().any(|statement| match statement {
            Statement::Return { .. } => true,
            Statement::Break { .. } => !nested,
            Statement::While { body, .. } | Statement::For { body, .. } => Self::exits(body, true),
            other => child_blocks(other)
                .into_iter()
                .any(|inner| Self::exits(inner, nested)),
        })
    }

    fn check<'a>(
        &mut self,
        statements: impl IntoIterator<Item = &'a Statement> + Clone,
        file_id: FileId,
        warnings: &mut Vec<Warning>,
    ) {
        self.constant_true.clear();
        self.collect_assignments(statements.clone());
        self.analyze_statements(statements, file_id, warnings);
    }
}

impl Analyzer for InfiniteLoopAnalyzer {
    fn name(&self) -> &str {
        "infinite-loops"
    }

    fn analyze_module(&mut self, module: &Module, file_id: FileId) -> Vec<Warning> {
        let mut warnings = Vec::new();

        for function in module.functions() {
            self.check(&function.body.statements, file_id, &mut warnings);
        }
        let script: Vec<&Statement> = module.top_level_statements().collect();
        self.check(script.iter().copied(), file_id, &mut warnings);

        warnings
    }
}

impl Default for InfiniteLoopAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}
