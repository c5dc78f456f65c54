mod constant_conditions;
mod empty_blocks;
mod infinite_loops;
mod unreachable_code;
mod unused_expressions;
mod unused_variables;
mod variable_shadowing;






#[cfg(test)]
mod unused_variables_test;


pub use constant_conditions::ConstantConditionAnalyzer;
pub use empty_blocks::EmptyBlockAnalyzer;
pub use infinite_loops::InfiniteLoopAnalyzer;
pub use unreachable_code::ReachabilityAnalyzer;
pub use unused_expressions::UnusedExpressionAnalyzer;
pub use unused_variables::UnusedVariableAnalyzer;
pub use variable_shadowing::VariableShadowingAnalyzer;

use crate::ast::{Block, ElseBranch, Module, Statement};
use crate::types::{FileId, Span};
use codespan_reporting::diagnostic::Diagnostic;
use tracing::debug;

pub trait Analyzer {
    fn name(&self) -> &str;
    fn analyze_module(&mut self, module: &Module, file_id: FileId) -> Vec<Warning>;
}

#[derive(Debug, Clone, PartialEq)]
pub enum Warning {
    UnusedVariable {
        name: String,
        span: Span,
        file_id: FileId,
    },
    UnreachableCode {
        span: Span,
        file_id: FileId,
    },
    PotentialInfiniteLoop {
        span: Span,
        file_id: FileId,
    },
    EmptyBlock {
        block_type: &'static str,
        span: Span,
        file_id: FileId,
    },
    VariableShadowing {
        name: String,
        inner_span: Span,
        outer_span: Span,
        file_id: FileId,
    },
    ConstantCondition {
        value: bool,
        construct: &'static str,
        span: Span,
        file_id: FileId,
    },
    UnusedExpression {
        span: Span,
        file_id: FileId,
    },
}

impl Warning {
    pub fn span(&self) -> Span {
        match self {
            Warning::UnusedVariable { span, .. }
            | Warning::UnreachableCode { span, .. }
            | Warning::PotentialInfiniteLoop { span, .. }
            | Warning::EmptyBlock { span, .. }
            | Warning::ConstantCondition { span, .. }
            | Warning::UnusedExpression { span, .. } => *span,
            Warning::VariableShadowing { inner_span, .. } => *inner_span,
        }
    }

    pub fn to_diagnostic(&self) -> Diagnostic<FileId> {
        use codespan_reporting::diagnostic::Label;

        match self {
            Warning::UnusedVariable {
                name,
                span,
                file_id,
            } => Diagnostic::warning()
                .with_message(format!("unused variable `{}`", name))
                .with_labels(vec![
                    Label::primary(*file_id, span.to_byte_range())
                        .with_message("variable declared but never read"),
                ]),
            Warning::UnreachableCode { span, file_id } => Diagnostic::warning()
                .with_message("unreachable code")
                .with_labels(vec![
                    Label::primary(*file_id, span.to_byte_range())
                        .with_message("this code will never execute"),
                ]),
            Warning::PotentialInfiniteLoop { span, file_id } => Diagnostic::warning()
                .with_message("potential infinite loop")
                .with_labels(vec![
                    Label::primary(*file_id, span.to_byte_range())
                        .with_message("loop condition is always true and the body never exits"),
                ]),
            Warning::EmptyBlock {
                block_type,
                span,
                file_id,
            } => Diagnostic::warning()
                .with_message(format!("empty {} block", block_type))
                .with_labels(vec![
                    Label::primary(*file_id, span.to_byte_range())
                        .with_message("block contains no statements"),
                ]),
            Warning::VariableShadowing {
                name,
                inner_span,
                outer_span,
                file_id,
            } => Diagnostic::warning()
                .with_message(format!("variable `{}` shadows an outer variable", name))
                .with_labels(vec![
                    Label::primary(*file_id, inner_span.to_byte_range())
                        .with_message("shadowing declaration"),
                    Label::secondary(*file_id, outer_span.to_byte_range())
                        .with_message("outer declaration"),
                ]),
            Warning::ConstantCondition {
                value,
                construct,
                span,
                file_id,
            } => Diagnostic::warning()
                .with_message(format!("constant `{}` condition", construct))
                .with_labels(vec![
                    Label::primary(*file_id, span.to_byte_range())
                        .with_message(format!("condition is always {}", value)),
                ]),
            Warning::UnusedExpression { span, file_id } => Diagnostic::warning()
                .with_message("unused expression")
                .with_labels(vec![
                    Label::primary(*file_id, span.to_byte_range())
                        .with_message("this expression has no effect"),
                ]),
        }
    }
}

/// Every lint this crate ships, in reporting order.
pub fn default_analyzers() -> Vec<Box<dyn Analyzer>> {
    vec![
        Box::new(UnusedVariableAnalyzer::new()),
        Box::new(ReachabilityAnalyzer::new()),
        Box::new(InfiniteLoopAnalyzer::new()),
        Box::new(EmptyBlockAnalyzer::new()),
        Box::new(VariableShadowingAnalyzer::new()),
        Box::new(ConstantConditionAnalyzer::new()),
        Box::new(UnusedExpressionAnalyzer::new()),
    ]
}

pub struct AnalysisRunner {
    analyzers: Vec<Box<dyn Analyzer>>,
}

impl AnalysisRunner {
    pub fn new() -> Self {
        Self {
            analyzers: Vec::new(),
        }
    }

    /// The default lint set minus the analyzers named in `disabled`.
    pub fn with_defaults(disabled: &[String]) -> Self {
        let analyzers = default_analyzers()
            .into_iter()
            .filter(|analyzer| !disabled.iter().any(|name| name == analyzer.name()))
            .collect();
        Self { analyzers }
    }

    pub fn with_analyzer(mut self, analyzer: Box<dyn Analyzer>) -> Self {
        self.analyzers.push(analyzer);
        self
    }

    pub fn analyzer_names(&self) -> Vec<&str> {
        self.analyzers.iter().map(|a| a.name()).collect()
    }

    pub fn run(&mut self, module: &Module, file_id: FileId) -> Vec<Warning> {
        let mut all_warnings = Vec::new();
        for analyzer in &mut self.analyzers {
            let warnings = analyzer.analyze_module(module, file_id);
            debug!(analyzer = analyzer.name(), warnings = warnings.len(), "lint_pass");
            all_warnings.extend(warnings);
        }
        all_warnings
    }
}

impl Default for AnalysisRunner {
    fn default() -> Self {
        Self::new()
    }
}

/// Blocks nested directly in `statement`, in source order.
pub(crate) fn child_blocks(statement: &Statement) -> Vec<&Block> {
    match statement {
        Statement::If {
            then_block,
            else_branch,
            ..
        } => {
            let mut blocks = vec![then_block];
            match else_branch {
                Some(ElseBranch::Block(block)) => blocks.push(block),
                Some(ElseBranch::If(nested)) => blocks.extend(child_blocks(nested)),
                None => {}
            }
            blocks
        }
        Statement::While { body, .. } | Statement::For { body, .. } => vec![body],
        Statement::Block(block) => vec![block],
        _ => Vec::new(),
    }
}

#[cfg(test)]
pub(crate) fn parse_module(source: &str) -> Module {
    use crate::compiler::{CompilationUnit, Compiler};

    Compiler::new()
        .parse(&CompilationUnit::from_string(source.to_string()))
        .unwrap()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn runner_skips_disabled_lints() {
        let runner = AnalysisRunner::with_defaults(&["empty-blocks".to_string()]);

        let names = runner.analyzer_names();
        assert_eq!(names.len(), 6);
        assert!(!names.contains(&"empty-blocks"));
        assert!(names.contains(&"unused-variables"));
    }

    #[test]
    fn runner_collects_from_every_analyzer() {
        let module = parse_module("let x: i32 = 1;\nif true {}\n");
        let mut runner = AnalysisRunner::with_defaults(&[]);

        let warnings = runner.run(&module, 0);

        assert!(warnings.iter().any(|w| matches!(w, Warning::UnusedVariable { .. })));
        assert!(warnings.iter().any(|w| matches!(w, Warning::EmptyBlock { .. })));
        assert!(warnings.iter().any(|w| matches!(w, Warning::ConstantCondition { .. })));
    }

    #[test]
    fn shadowing_warning_points_at_both_declarations() {
        let warning = Warning::VariableShadowing {
            name: "x".to_string(),
            inner_span: Span::new(20, 30),
            outer_span: Span::new(0, 10),
            file_id: 0,
        };

        let diagnostic = warning.to_diagnostic();
        assert_eq!(diagnostic.labels.len(), 2);
        assert_eq!(warning.span(), Span::new(20, 30));
    }
}
