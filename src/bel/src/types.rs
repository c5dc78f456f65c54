use crate::runtime::{Context, RuntimeError, Value};
use async_trait::async_trait;
use codespan_reporting::files::SimpleFiles;
use serde::Serialize;
use std::any::Any;
use std::cell::RefCell;
use std::fmt;
use std::ops::Range;
use std::rc::Rc;
use std::sync::Arc;

pub type FileId = usize;

/// Byte range into a source file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn dummy() -> Self {
        Self { start: 0, end: 0 }
    }

    pub fn merge(self, other: Span) -> Span {
        Span {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }

    pub fn to_byte_range(self) -> Range<usize> {
        self.start..self.end
    }
}

pub trait Spanned {
    fn span(&self) -> Span;
}

#[derive(Clone)]
pub struct SourceFiles {
    files: Rc<RefCell<SimpleFiles<String, String>>>,
}

impl SourceFiles {
    pub fn new() -> Self {
        Self {
            files: Rc::new(RefCell::new(SimpleFiles::new())),
        }
    }

    pub fn add(&mut self, name: String, source: String) -> FileId {
        self.files.borrow_mut().add(name, source)
    }

    pub fn files(&self) -> Rc<RefCell<SimpleFiles<String, String>>> {
        self.files.clone()
    }
}

impl Default for SourceFiles {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum IntType {
    I8,
    U8,
    I16,
    U16,
    I32,
    U32,
    I64,
    U64,
}

impl IntType {
    pub const ALL: [IntType; 8] = [
        IntType::I8,
        IntType::U8,
        IntType::I16,
        IntType::U16,
        IntType::I32,
        IntType::U32,
        IntType::I64,
        IntType::U64,
    ];

    pub fn from_name(name: &str) -> Option<IntType> {
        IntType::ALL.into_iter().find(|ty| ty.name() == name)
    }

    pub fn name(self) -> &'static str {
        match self {
            IntType::I8 => "i8",
            IntType::U8 => "u8",
            IntType::I16 => "i16",
            IntType::U16 => "u16",
            IntType::I32 => "i32",
            IntType::U32 => "u32",
            IntType::I64 => "i64",
            IntType::U64 => "u64",
        }
    }

    pub fn bits(self) -> u32 {
        match self {
            IntType::I8 | IntType::U8 => 8,
            IntType::I16 | IntType::U16 => 16,
            IntType::I32 | IntType::U32 => 32,
            IntType::I64 | IntType::U64 => 64,
        }
    }

    pub fn is_signed(self) -> bool {
        matches!(
            self,
            IntType::I8 | IntType::I16 | IntType::I32 | IntType::I64
        )
    }

    pub fn min(self) -> i128 {
        if self.is_signed() {
            -(1i128 << (self.bits() - 1))
        } else {
            0
        }
    }

    pub fn max(self) -> i128 {
        if self.is_signed() {
            (1i128 << (self.bits() - 1)) - 1
        } else {
            (1i128 << self.bits()) - 1
        }
    }

    pub fn contains(self, value: i128) -> bool {
        value >= self.min() && value <= self.max()
    }

    /// Two's complement truncation of `value` to this width.
    pub fn wrap(self, value: i128) -> i128 {
        let bits = self.bits();
        let modulus = 1i128 << bits;
        let truncated = value.rem_euclid(modulus);
        if self.is_signed() && truncated >= (1i128 << (bits - 1)) {
            truncated - modulus
        } else {
            truncated
        }
    }
}

impl fmt::Display for IntType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Type {
    Unit,
    Bool,
    Char,
    Int(IntType),
}

impl Type {
    pub fn from_name(name: &str) -> Option<Type> {
        match name {
            "bool" => Some(Type::Bool),
            "char" => Some(Type::Char),
            other => IntType::from_name(other).map(Type::Int),
        }
    }

    pub fn unit() -> Self {
        Type::Unit
    }

    pub fn boolean() -> Self {
        Type::Bool
    }

    /// Storage width of a value of this type.
    pub fn bit_width(&self) -> u32 {
        match self {
            Type::Unit => 0,
            Type::Bool => 8,
            Type::Char => 32,
            Type::Int(int) => int.bits(),
        }
    }

    pub fn as_int(&self) -> Option<IntType> {
        match self {
            Type::Int(int) => Some(*int),
            _ => None,
        }
    }

    pub fn is_integer(&self) -> bool {
        matches!(self, Type::Int(_))
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Unit => write!(f, "()"),
            Type::Bool => write!(f, "bool"),
            Type::Char => write!(f, "char"),
            Type::Int(int) => write!(f, "{}", int),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Parameter {
    pub name: String,
    pub param_type: Type,
}

impl Parameter {
    pub fn new(name: String, param_type: Type) -> Self {
        Self { name, param_type }
    }
}

#[async_trait(?Send)]
pub trait Expression: std::fmt::Debug {
    async fn evaluate(&self, context: Arc<Context>) -> Result<Value, RuntimeError>;
    fn return_type(&self) -> Type;
    fn as_any(&self) -> &dyn Any;
}

/// A function implemented by the host rather than in BEL source.
#[async_trait(?Send)]
pub trait NativeFunction: std::fmt::Debug {
    fn name(&self) -> &str;
    fn parameters(&self) -> &[Parameter];
    fn return_type(&self) -> &Type;

    /// Whether an argument of type `ty` may be passed at `index`.
    fn accepts(&self, index: usize, ty: &Type) -> bool {
        self.parameters()
            .get(index)
            .is_some_and(|param| param.param_type == *ty)
    }

    async fn execute(&self, context: &Context, args: Vec<Value>) -> Result<Value, String>;
}
