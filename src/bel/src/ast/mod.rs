pub mod pretty;

use crate::types::{FileId, IntType, Span, Spanned};
use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Module {
    pub items: Vec<Item>,
    pub span: Span,
    #[serde(skip)]
    pub file_id: FileId,
}

impl Module {
    /// Every function in the file, nested modules included.
    pub fn functions(&self) -> impl Iterator<Item = &Function> {
        self.qualified_functions().into_iter().map(|(_, function)| function)
    }

    /// Every function paired with the path of the module declaring it,
    /// empty for the file root. Declaration order is preserved.
    pub fn qualified_functions(&self) -> Vec<(Vec<String>, &Function)> {
        let mut out = Vec::new();
        collect_functions(&self.items, &mut Vec::new(), &mut out);
        out
    }

    pub fn top_level_statements(&self) -> impl Iterator<Item = &Statement> {
        self.items.iter().filter_map(|item| match item {
            Item::Statement(statement) => Some(statement),
            Item::Function(_) | Item::Module(_) => None,
        })
    }
}

fn collect_functions<'a>(
    items: &'a [Item],
    path: &mut Vec<String>,
    out: &mut Vec<(Vec<String>, &'a Function)>,
) {
    for item in items {
        match item {
            Item::Function(function) => out.push((path.clone(), function)),
            Item::Module(module) => {
                path.push(module.name.clone());
                collect_functions(&module.items, path, out);
                path.pop();
            }
            Item::Statement(_) => {}
        }
    }
}

/// Joins a module path and an item name with `::`.
pub fn qualified_name(module: &[String], name: &str) -> String {
    module
        .iter()
        .map(String::as_str)
        .chain(std::iter::once(name))
        .collect::<Vec<_>>()
        .join("::")
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "item", rename_all = "snake_case")]
pub enum Item {
    Function(Function),
    Module(ModuleDecl),
    Statement(Statement),
}

impl Spanned for Item {
    fn span(&self) -> Span {
        match self {
            Item::Function(function) => function.span,
            Item::Module(module) => module.span,
            Item::Statement(statement) => statement.span(),
        }
    }
}

/// `mod name { ... }`. Holds functions and further modules only.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModuleDecl {
    pub name: String,
    pub name_span: Span,
    pub public: bool,
    pub items: Vec<Item>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Function {
    pub name: String,
    pub name_span: Span,
    pub public: bool,
    pub parameters: Vec<Parameter>,
    pub return_type: Option<TypeName>,
    pub body: Block,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Parameter {
    pub name: String,
    pub type_name: TypeName,
    pub span: Span,
}

/// A type as written in source. Resolved by the type checker.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TypeName {
    pub name: String,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Block {
    pub statements: Vec<Statement>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "statement", rename_all = "snake_case")]
pub enum Statement {
    Let {
        name: String,
        type_name: TypeName,
        value: Option<Expression>,
        span: Span,
    },
    Assign {
        target: String,
        operator: AssignOp,
        value: Expression,
        span: Span,
    },
    If {
        condition: Expression,
        then_block: Block,
        else_branch: Option<ElseBranch>,
        span: Span,
    },
    While {
        condition: Expression,
        body: Block,
        span: Span,
    },
    For {
        variable: String,
        start: Expression,
        end: Expression,
        inclusive: bool,
        body: Block,
        span: Span,
    },
    Break {
        span: Span,
    },
    Continue {
        span: Span,
    },
    Return {
        value: Option<Expression>,
        span: Span,
    },
    Expression {
        expression: Expression,
        span: Span,
    },
    Block(Block),
}

impl Spanned for Statement {
    fn span(&self) -> Span {
        match self {
            Statement::Let { span, .. }
            | Statement::Assign { span, .. }
            | Statement::If { span, .. }
            | Statement::While { span, .. }
            | Statement::For { span, .. }
            | Statement::Break { span }
            | Statement::Continue { span }
            | Statement::Return { span, .. }
            | Statement::Expression { span, .. } => *span,
            Statement::Block(block) => block.span,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ElseBranch {
    Block(Block),
    If(Box<Statement>),
}

impl Spanned for ElseBranch {
    fn span(&self) -> Span {
        match self {
            ElseBranch::Block(block) => block.span,
            ElseBranch::If(statement) => statement.span(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Expression {
    Integer {
        value: i128,
        suffix: Option<IntType>,
        span: Span,
    },
    Boolean {
        value: bool,
        span: Span,
    },
    Char {
        value: char,
        span: Span,
    },
    Variable {
        name: String,
        span: Span,
    },
    Call {
        function: CallPath,
        arguments: Vec<Expression>,
        span: Span,
    },
    Unary {
        operator: UnaryOp,
        operand: Box<Expression>,
        span: Span,
    },
    Binary {
        operator: BinaryOp,
        left: Box<Expression>,
        right: Box<Expression>,
        span: Span,
    },
    Cast {
        expression: Box<Expression>,
        target: TypeName,
        span: Span,
    },
}

impl Expression {
    /// True for calls and for anything containing one.
    pub fn has_side_effects(&self) -> bool {
        match self {
            Expression::Call { .. } => true,
            Expression::Unary { operand, .. } => operand.has_side_effects(),
            Expression::Binary { left, right, .. } => {
                left.has_side_effects() || right.has_side_effects()
            }
            Expression::Cast { expression, .. } => expression.has_side_effects(),
            Expression::Integer { .. }
            | Expression::Boolean { .. }
            | Expression::Char { .. }
            | Expression::Variable { .. } => false,
        }
    }

    pub fn calls(&self, name: &str) -> bool {
        match self {
            Expression::Call {
                function,
                arguments,
                ..
            } => function.is_root_function(name) || arguments.iter().any(|arg| arg.calls(name)),
            Expression::Unary { operand, .. } => operand.calls(name),
            Expression::Binary { left, right, .. } => left.calls(name) || right.calls(name),
            Expression::Cast { expression, .. } => expression.calls(name),
            _ => false,
        }
    }
}

impl Spanned for Expression {
    fn span(&self) -> Span {
        match self {
            Expression::Integer { span, .. }
            | Expression::Boolean { span, .. }
            | Expression::Char { span, .. }
            | Expression::Variable { span, .. }
            | Expression::Call { span, .. }
            | Expression::Unary { span, .. }
            | Expression::Binary { span, .. }
            | Expression::Cast { span, .. } => *span,
        }
    }
}

/// Where a call path starts resolving.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PathAnchor {
    /// The module containing the call.
    Local,
    /// `crate::`, the file root.
    Crate,
    /// `super::` repeated this many times.
    Super(usize),
}

/// The callee of a call such as `f`, `util::f` or `super::super::f`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CallPath {
    pub anchor: PathAnchor,
    /// Module names followed by the function name; never empty.
    pub segments: Vec<String>,
}

impl CallPath {
    pub fn local(name: impl Into<String>) -> Self {
        Self {
            anchor: PathAnchor::Local,
            segments: vec![name.into()],
        }
    }

    /// The function name, without its modules.
    pub fn name(&self) -> &str {
        self.segments.last().map_or("", String::as_str)
    }

    pub fn modules(&self) -> &[String] {
        match self.segments.split_last() {
            Some((_, modules)) => modules,
            None => &[],
        }
    }

    /// A plain `name` or `crate::name`, as written at the file root.
    pub fn is_root_function(&self, name: &str) -> bool {
        matches!(self.anchor, PathAnchor::Local | PathAnchor::Crate)
            && self.segments.len() == 1
            && self.name() == name
    }
}

impl fmt::Display for CallPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.anchor {
            PathAnchor::Local => {}
            PathAnchor::Crate => write!(f, "crate::")?,
            PathAnchor::Super(count) => {
                for _ in 0..count {
                    write!(f, "super::")?;
                }
            }
        }
        write!(f, "{}", self.segments.join("::"))
    }
}

impl Statement {
    pub fn calls(&self, name: &str) -> bool {
        let block_calls = |block: &Block| block.statements.iter().any(|s| s.calls(name));
        match self {
            Statement::Let { value, .. } => value.as_ref().is_some_and(|v| v.calls(name)),
            Statement::Assign { value, .. } => value.calls(name),
            Statement::If {
                condition,
                then_block,
                else_branch,
                ..
            } => {
                condition.calls(name)
                    || block_calls(then_block)
                    || match else_branch {
                        Some(ElseBranch::Block(block)) => block_calls(block),
                        Some(ElseBranch::If(statement)) => statement.calls(name),
                        None => false,
                    }
            }
            Statement::While {
                condition, body, ..
            } => condition.calls(name) || block_calls(body),
            Statement::For {
                start, end, body, ..
            } => start.calls(name) || end.calls(name) || block_calls(body),
            Statement::Return { value, .. } => value.as_ref().is_some_and(|v| v.calls(name)),
            Statement::Expression { expression, .. } => expression.calls(name),
            Statement::Block(block) => block_calls(block),
            Statement::Break { .. } | Statement::Continue { .. } => false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UnaryOp {
    Neg,
    Not,
}

impl UnaryOp {
    pub fn symbol(self) -> &'static str {
        match self {
            UnaryOp::Neg => "-",
            UnaryOp::Not => "!",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BinaryOp {
    Mul,
    Div,
    Rem,
    Add,
    Sub,
    Shl,
    Shr,
    BitAnd,
    BitXor,
    BitOr,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    And,
    Or,
}

impl BinaryOp {
    pub fn symbol(self) -> &'static str {
        match self {
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Rem => "%",
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Shl => "<<",
            BinaryOp::Shr => ">>",
            BinaryOp::BitAnd => "&",
            BinaryOp::BitXor => "^",
            BinaryOp::BitOr => "|",
            BinaryOp::Eq => "==",
            BinaryOp::Ne => "!=",
            BinaryOp::Lt => "<",
            BinaryOp::Le => "<=",
            BinaryOp::Gt => ">",
            BinaryOp::Ge => ">=",
            BinaryOp::And => "&&",
            BinaryOp::Or => "||",
        }
    }

    /// Binding strength; larger binds tighter.
    pub fn precedence(self) -> u8 {
        match self {
            BinaryOp::Mul | BinaryOp::Div | BinaryOp::Rem => 10,
            BinaryOp::Add | BinaryOp::Sub => 9,
            BinaryOp::Shl | BinaryOp::Shr => 8,
            BinaryOp::BitAnd => 7,
            BinaryOp::BitXor => 6,
            BinaryOp::BitOr => 5,
            BinaryOp::Eq
            | BinaryOp::Ne
            | BinaryOp::Lt
            | BinaryOp::Le
            | BinaryOp::Gt
            | BinaryOp::Ge => 4,
            BinaryOp::And => 3,
            BinaryOp::Or => 2,
        }
    }

    pub fn is_comparison(self) -> bool {
        self.precedence() == 4
    }

    pub fn is_logical(self) -> bool {
        matches!(self, BinaryOp::And | BinaryOp::Or)
    }

    pub fn is_shift(self) -> bool {
        matches!(self, BinaryOp::Shl | BinaryOp::Shr)
    }

    pub fn is_bitwise(self) -> bool {
        matches!(self, BinaryOp::BitAnd | BinaryOp::BitXor | BinaryOp::BitOr)
    }

    pub fn is_arithmetic(self) -> bool {
        matches!(
            self,
            BinaryOp::Mul | BinaryOp::Div | BinaryOp::Rem | BinaryOp::Add | BinaryOp::Sub
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AssignOp {
    Assign,
    Add,
    Sub,
    Mul,
    Div,
    Rem,
}

impl AssignOp {
    pub fn symbol(self) -> &'static str {
        match self {
            AssignOp::Assign => "=",
            AssignOp::Add => "+=",
            AssignOp::Sub => "-=",
            AssignOp::Mul => "*=",
            AssignOp::Div => "/=",
            AssignOp::Rem => "%=",
        }
    }

    /// The arithmetic applied by a compound assignment.
    pub fn binary(self) -> Option<BinaryOp> {
        match self {
            AssignOp::Assign => None,
            AssignOp::Add => Some(BinaryOp::Add),
            AssignOp::Sub => Some(BinaryOp::Sub),
            AssignOp::Mul => Some(BinaryOp::Mul),
            AssignOp::Div => Some(BinaryOp::Div),
            AssignOp::Rem => Some(BinaryOp::Rem),
        }
    }
}

impl fmt::Display for Module {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", pretty::format_module(self))
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", pretty::format_expression(self))
    }
}

impl fmt::Display for TypeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}
