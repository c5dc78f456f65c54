use crate::types::{FileId, IntType, Span, Type};
use codespan_reporting::diagnostic::{Diagnostic, Label};
use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum TypeError {
    UnknownType {
        name: String,
        span: Span,
    },
    UnknownVariable {
        name: String,
        span: Span,
    },
    UnknownFunction {
        name: String,
        span: Span,
    },
    DuplicateFunction {
        name: String,
        span: Span,
    },
    UnknownModule {
        name: String,
        span: Span,
    },
    DuplicateModule {
        name: String,
        span: Span,
    },
    /// A path segment names an item that is neither `pub` nor declared in
    /// a module enclosing the call.
    PrivateItem {
        kind: &'static str,
        name: String,
        span: Span,
    },
    /// More `super::` segments than there are enclosing modules.
    PathBeyondRoot {
        path: String,
        span: Span,
    },
    DuplicateParameter {
        function: String,
        name: String,
        span: Span,
    },
    TypeMismatch {
        expected: String,
        found: String,
        span: Span,
    },
    ArgumentCountMismatch {
        function: String,
        expected: usize,
        found: usize,
        span: Span,
    },
    InvalidOperands {
        operator: &'static str,
        found: String,
        span: Span,
    },
    InvalidCast {
        from: Type,
        to: Type,
        span: Span,
    },
    LiteralOutOfRange {
        value: i128,
        ty: IntType,
        span: Span,
    },
    PossiblyUninitialized {
        name: String,
        span: Span,
    },
    AssignToLoopVariable {
        name: String,
        span: Span,
    },
    LoopControlOutsideLoop {
        keyword: &'static str,
        span: Span,
    },
    ReturnOutsideFunction {
        span: Span,
    },
    MissingReturn {
        function: String,
        expected: Type,
        span: Span,
    },
    InvalidMain {
        span: Span,
    },
}

impl TypeError {
    pub fn span(&self) -> Span {
        match self {
            TypeError::UnknownType { span, .. }
            | TypeError::UnknownVariable { span, .. }
            | TypeError::UnknownFunction { span, .. }
            | TypeError::DuplicateFunction { span, .. }
            | TypeError::UnknownModule { span, .. }
            | TypeError::DuplicateModule { span, .. }
            | TypeError::PrivateItem { span, .. }
            | TypeError::PathBeyondRoot { span, .. }
            | TypeError::DuplicateParameter { span, .. }
            | TypeError::TypeMismatch { span, .. }
            | TypeError::ArgumentCountMismatch { span, .. }
            | TypeError::InvalidOperands { span, .. }
            | TypeError::InvalidCast { span, .. }
            | TypeError::LiteralOutOfRange { span, .. }
            | TypeError::PossiblyUninitialized { span, .. }
            | TypeError::AssignToLoopVariable { span, .. }
            | TypeError::LoopControlOutsideLoop { span, .. }
            | TypeError::ReturnOutsideFunction { span }
            | TypeError::MissingReturn { span, .. }
            | TypeError::InvalidMain { span } => *span,
        }
    }

    fn label(&self) -> String {
        match self {
            TypeError::UnknownType { .. } => "not a BEL type".to_string(),
            TypeError::UnknownVariable { .. } => "not found in this scope".to_string(),
            TypeError::UnknownFunction { .. } => "no function with this name".to_string(),
            TypeError::DuplicateFunction { .. } => "redefined here".to_string(),
            TypeError::UnknownModule { .. } => "no module with this name".to_string(),
            TypeError::DuplicateModule { .. } => "redefined here".to_string(),
            TypeError::PrivateItem { kind, .. } => format!("private {}", kind),
            TypeError::PathBeyondRoot { .. } => "too many `super` segments".to_string(),
            TypeError::DuplicateParameter { .. } => "used more than once".to_string(),
            TypeError::TypeMismatch { expected, .. } => format!("expected {}", expected),
            TypeError::ArgumentCountMismatch { expected, .. } => {
                format!("expected {} arguments", expected)
            }
            TypeError::InvalidOperands { found, .. } => format!("operands are {}", found),
            TypeError::InvalidCast { .. } => "unsupported cast".to_string(),
            TypeError::LiteralOutOfRange { ty, .. } => {
                format!("the range of {} is {}..={}", ty, ty.min(), ty.max())
            }
            TypeError::PossiblyUninitialized { .. } => "used here".to_string(),
            TypeError::AssignToLoopVariable { .. } => "loop variables are immutable".to_string(),
            TypeError::LoopControlOutsideLoop { .. } => "not inside a loop".to_string(),
            TypeError::ReturnOutsideFunction { .. } => "not inside a function".to_string(),
            TypeError::MissingReturn { expected, .. } => {
                format!("declared to return {}", expected)
            }
            TypeError::InvalidMain { .. } => "main must not take parameters".to_string(),
        }
    }

    pub fn to_diagnostic(&self, file_id: FileId) -> Diagnostic<FileId> {
        Diagnostic::error()
            .with_message(self.to_string())
            .with_labels(vec![
                Label::primary(file_id, self.span().to_byte_range()).with_message(self.label()),
            ])
    }
}

impl fmt::Display for TypeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeError::UnknownType { name, .. } => write!(f, "Unknown type: {}", name),
            TypeError::UnknownVariable { name, .. } => write!(f, "Unknown variable: {}", name),
            TypeError::UnknownFunction { name, .. } => write!(f, "Unknown function: {}", name),
            TypeError::DuplicateFunction { name, .. } => {
                write!(f, "Function {} is defined more than once", name)
            }
            TypeError::UnknownModule { name, .. } => write!(f, "Unknown module: {}", name),
            TypeError::DuplicateModule { name, .. } => {
                write!(f, "Module {} is defined more than once", name)
            }
            TypeError::PrivateItem { kind, name, .. } => {
                write!(f, "{} {} is private", capitalize(kind), name)
            }
            TypeError::PathBeyondRoot { path, .. } => {
                write!(f, "Path {} goes above the crate root", path)
            }
            TypeError::DuplicateParameter { function, name, .. } => {
                write!(f, "Function {} has duplicate parameter {}", function, name)
            }
            TypeError::TypeMismatch {
                expected, found, ..
            } => write!(f, "Type mismatch: expected {}, found {}", expected, found),
            TypeError::ArgumentCountMismatch {
                function,
                expected,
                found,
                ..
            } => write!(
                f,
                "Function {} expects {} arguments, found {}",
                function, expected, found
            ),
            TypeError::InvalidOperands {
                operator, found, ..
            } => write!(f, "Operator {} cannot be applied to {}", operator, found),
            TypeError::InvalidCast { from, to, .. } => {
                write!(f, "Cannot cast {} to {}", from, to)
            }
            TypeError::LiteralOutOfRange { value, ty, .. } => {
                write!(f, "Literal {} does not fit in {}", value, ty)
            }
            TypeError::PossiblyUninitialized { name, .. } => {
                write!(f, "Variable {} may be used before it is assigned", name)
            }
            TypeError::AssignToLoopVariable { name, .. } => {
                write!(f, "Cannot assign to loop variable {}", name)
            }
            TypeError::LoopControlOutsideLoop { keyword, .. } => {
                write!(f, "`{}` outside of a loop", keyword)
            }
            TypeError::ReturnOutsideFunction { .. } => write!(f, "`return` outside of a function"),
            TypeError::MissingReturn { function, .. } => {
                write!(f, "Function {} does not return on every path", function)
            }
            TypeError::InvalidMain { .. } => write!(f, "Function main must take no parameters"),
        }
    }
}

impl std::error::Error for TypeError {}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
