use crate::compiler::ParseError;
use crate::typecheck::TypeError;
use crate::types::{FileId, IntType, Span, Type};
use codespan_reporting::diagnostic::{Diagnostic, Label};
use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum RuntimeError {
    Overflow {
        operation: &'static str,
        ty: IntType,
        span: Span,
    },
    DivisionByZero {
        span: Span,
    },
    RemainderByZero {
        span: Span,
    },
    ShiftOutOfRange {
        amount: i128,
        ty: IntType,
        span: Span,
    },
    UndefinedVariable {
        name: String,
        span: Span,
    },
    UninitializedVariable {
        name: String,
        span: Span,
    },
    ImmutableAssignment {
        name: String,
        span: Span,
    },
    UnknownFunction {
        name: String,
        span: Span,
    },
    ArgumentCountMismatch {
        function: String,
        expected: usize,
        found: usize,
        span: Span,
    },
    TypeMismatch {
        expected: String,
        found: Type,
        span: Span,
    },
    InvalidCast {
        from: Type,
        to: Type,
        span: Span,
    },
    StackOverflow {
        depth: usize,
        span: Span,
    },
    StepLimitExceeded {
        limit: u64,
    },
    AssertionFailed {
        span: Span,
    },
    NativeError {
        function: String,
        message: String,
        span: Span,
    },
    MisplacedControlFlow {
        keyword: &'static str,
    },
}

impl RuntimeError {
    pub fn span(&self) -> Option<Span> {
        match self {
            RuntimeError::Overflow { span, .. }
            | RuntimeError::DivisionByZero { span }
            | RuntimeError::RemainderByZero { span }
            | RuntimeError::ShiftOutOfRange { span, .. }
            | RuntimeError::UndefinedVariable { span, .. }
            | RuntimeError::UninitializedVariable { span, .. }
            | RuntimeError::ImmutableAssignment { span, .. }
            | RuntimeError::UnknownFunction { span, .. }
            | RuntimeError::ArgumentCountMismatch { span, .. }
            | RuntimeError::TypeMismatch { span, .. }
            | RuntimeError::InvalidCast { span, .. }
            | RuntimeError::StackOverflow { span, .. }
            | RuntimeError::AssertionFailed { span }
            | RuntimeError::NativeError { span, .. } => Some(*span),
            RuntimeError::StepLimitExceeded { .. } | RuntimeError::MisplacedControlFlow { .. } => {
                None
            }
        }
    }

    pub fn to_diagnostic(&self, file_id: FileId) -> Diagnostic<FileId> {
        let diagnostic = Diagnostic::error().with_message(format!("runtime error: {}", self));
        match self.span() {
            Some(span) => diagnostic.with_labels(vec![
                Label::primary(file_id, span.to_byte_range()).with_message("raised here"),
            ]),
            None => diagnostic,
        }
    }
}

impl fmt::Display for RuntimeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RuntimeError::Overflow { operation, ty, .. } => {
                write!(f, "attempt to {} with overflow in {}", operation, ty)
            }
            RuntimeError::DivisionByZero { .. } => write!(f, "attempt to divide by zero"),
            RuntimeError::RemainderByZero { .. } => write!(
                f,
                "attempt to calculate the remainder with a divisor of zero"
            ),
            RuntimeError::ShiftOutOfRange { amount, ty, .. } => write!(
                f,
                "shift amount {} is out of range for {} (0..{})",
                amount,
                ty,
                ty.bits()
            ),
            RuntimeError::UndefinedVariable { name, .. } => {
                write!(f, "Variable '{}' not found", name)
            }
            RuntimeError::UninitializedVariable { name, .. } => {
                write!(f, "Variable '{}' read before it was assigned", name)
            }
            RuntimeError::ImmutableAssignment { name, .. } => {
                write!(f, "cannot assign to immutable variable '{}'", name)
            }
            RuntimeError::UnknownFunction { name, .. } => write!(f, "Unknown function: {}", name),
            RuntimeError::ArgumentCountMismatch {
                function,
                expected,
                found,
                ..
            } => write!(
                f,
                "Function {} expects {} arguments, got {}",
                function, expected, found
            ),
            RuntimeError::TypeMismatch {
                expected, found, ..
            } => write!(f, "expected {}, found {}", expected, found),
            RuntimeError::InvalidCast { from, to, .. } => {
                write!(f, "cannot cast {} to {}", from, to)
            }
            RuntimeError::StackOverflow { depth, .. } => {
                write!(f, "call depth exceeded the limit of {}", depth)
            }
            RuntimeError::StepLimitExceeded { limit } => {
                write!(f, "program exceeded the step limit of {}", limit)
            }
            RuntimeError::AssertionFailed { .. } => write!(f, "assertion failed"),
            RuntimeError::NativeError {
                function, message, ..
            } => write!(f, "{}: {}", function, message),
            RuntimeError::MisplacedControlFlow { keyword } => {
                write!(f, "`{}` escaped every enclosing construct", keyword)
            }
        }
    }
}

impl std::error::Error for RuntimeError {}

/// Any failure between reading source text and finishing execution.
#[derive(Debug, Clone)]
pub enum ProgramError {
    Parse(ParseError),
    Type(Vec<TypeError>),
    Runtime(RuntimeError),
}

impl ProgramError {
    pub fn to_diagnostics(&self, file_id: FileId) -> Vec<Diagnostic<FileId>> {
        match self {
            ProgramError::Parse(error) => vec![error.to_diagnostic(file_id)],
            ProgramError::Type(errors) => errors
                .iter()
                .map(|error| error.to_diagnostic(file_id))
                .collect(),
            ProgramError::Runtime(error) => vec![error.to_diagnostic(file_id)],
        }
    }
}

impl fmt::Display for ProgramError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProgramError::Parse(error) => write!(f, "{}", error),
            ProgramError::Type(errors) => {
                let messages: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
                write!(f, "{}", messages.join("; "))
            }
            ProgramError::Runtime(error) => write!(f, "Runtime error: {}", error),
        }
    }
}

impl std::error::Error for ProgramError {}

impl From<ParseError> for ProgramError {
    fn from(error: ParseError) -> Self {
        ProgramError::Parse(error)
    }
}

impl From<Vec<TypeError>> for ProgramError {
    fn from(errors: Vec<TypeError>) -> Self {
        ProgramError::Type(errors)
    }
}

impl From<RuntimeError> for ProgramError {
    fn from(error: RuntimeError) -> Self {
        ProgramError::Runtime(error)
    }
}
