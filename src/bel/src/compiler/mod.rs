pub mod parser;

use crate::ast::{self, ElseBranch, Module, qualified_name};
use crate::expressions::{
    AssignmentExpr, BinaryExpr, BlockExpr, BreakExpr, CallExpr, CastExpr, ContinueExpr, ForExpr,
    FunctionExpr, IfExpr, LetExpr, LiteralExpr, ReturnExpr, UnaryExpr, VariableExpr, WhileExpr,
};
use crate::runtime::Value;
use crate::typecheck::{TypeError, TypeInfo};
use crate::types::{Expression, FileId, IntType, Parameter, Span, Spanned, Type};
use codespan_reporting::diagnostic::{Diagnostic, Label};
use combine::stream::position::Positioner;
use std::fmt;
use std::rc::Rc;

#[derive(Debug, Clone)]
pub struct CompilationUnit {
    source: String,
    name: String,
}

impl CompilationUnit {
    pub fn new(name: String, source: String) -> Self {
        Self { name, source }
    }

    pub fn from_string(source: String) -> Self {
        Self {
            name: "main.bel".to_string(),
            source,
        }
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

/// Tracks the byte offset of the next character so that every span the
/// parser records indexes directly into the source string.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BytePositioner(usize);

impl Positioner<char> for BytePositioner {
    type Position = usize;
    type Checkpoint = Self;

    fn position(&self) -> usize {
        self.0
    }

    fn update(&mut self, token: &char) {
        self.0 += token.len_utf8();
    }

    fn checkpoint(&self) -> Self {
        *self
    }

    fn reset(&mut self, checkpoint: Self) {
        *self = checkpoint;
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParseError {
    pub message: String,
    pub span: Span,
    pub line: usize,
    pub column: usize,
}

impl ParseError {
    pub fn to_diagnostic(&self, file_id: FileId) -> Diagnostic<FileId> {
        Diagnostic::error()
            .with_message("syntax error")
            .with_labels(vec![
                Label::primary(file_id, self.span.to_byte_range()).with_message(&self.message),
            ])
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Parse error at line {}, column {}: {}",
            self.line, self.column, self.message
        )
    }
}

impl std::error::Error for ParseError {}

pub trait Parser {
    fn parse(&self, program: &CompilationUnit) -> Result<Module, ParseError>;
}

pub struct DefaultParser;

impl Parser for DefaultParser {
    fn parse(&self, program: &CompilationUnit) -> Result<Module, ParseError> {
        use combine::{EasyParser, stream::position};

        let input = program.source();
        let stream = position::Stream::with_positioner(input, BytePositioner::default());

        match parser::parse_program().easy_parse(stream) {
            Ok((items, _)) => Ok(Module {
                items,
                span: Span::new(0, input.len()),
                file_id: 0,
            }),
            Err(e) => Err(parse_error_with_position(&e, input)),
        }
    }
}

fn parse_error_with_position(
    error: &combine::easy::Errors<char, &str, usize>,
    source: &str,
) -> ParseError {
    let position = error.position.min(source.len());
    let (line, column) = calculate_line_column(source, position);
    let end = source[position..]
        .chars()
        .next()
        .map_or(position, |c| position + c.len_utf8());

    ParseError {
        message: clean_combine_error(&error.to_string()),
        span: Span::new(position, end),
        line,
        column,
    }
}

fn clean_combine_error(error_text: &str) -> String {
    let mut messages = Vec::new();

    for line in error_text.lines() {
        if line.starts_with("Unexpected") {
            messages.push(line.replace("Unexpected `", "unexpected ").replace('`', ""));
        } else if line.starts_with("Expected") {
            messages.push(line.replace("Expected `", "expected ").replace('`', ""));
        } else if !line.starts_with("Parse error at") && !line.trim().is_empty() {
            messages.push(line.to_string());
        }
    }

    if messages.is_empty() {
        "syntax error".to_string()
    } else {
        messages.join(", ")
    }
}

fn calculate_line_column(source: &str, position: usize) -> (usize, usize) {
    let mut line = 1;
    let mut column = 1;

    for (i, ch) in source.char_indices() {
        if i >= position {
            break;
        }
        if ch == '\n' {
            line += 1;
            column = 1;
        } else {
            column += 1;
        }
    }

    (line, column)
}

/// Executable form of a module: function bodies and top-level statements
/// lowered to expression trees.
#[derive(Debug)]
pub struct CompiledProgram {
    pub functions: Vec<FunctionExpr>,
    pub statements: Vec<Box<dyn Expression>>,
    /// Span of `fn main` when the driver should call it after the script.
    pub entry_point: Option<Span>,
}

#[derive(Clone)]
pub struct Compiler {
    parser: Rc<dyn Parser>,
}

impl Default for Compiler {
    fn default() -> Self {
        Self::new()
    }
}

impl Compiler {
    pub fn new() -> Self {
        Self {
            parser: Rc::new(DefaultParser),
        }
    }

    pub fn with_parser(parser: Rc<dyn Parser>) -> Self {
        Self { parser }
    }

    pub fn parse(&self, program: &CompilationUnit) -> Result<Module, ParseError> {
        self.parser.parse(program)
    }

    /// Lowers a type checked module. The checker has already rejected
    /// everything lowering could fail on, so errors here mean the side
    /// table and the tree disagree.
    pub fn lower(&self, module: &Module, types: &TypeInfo) -> Result<CompiledProgram, Vec<TypeError>> {
        let lowering = Lowering { types };
        let mut functions = Vec::new();
        let mut statements = Vec::new();
        let mut errors = Vec::new();

        for (path, function) in module.qualified_functions() {
            match lowering.function(&path, function) {
                Ok(compiled) => functions.push(compiled),
                Err(error) => errors.push(error),
            }
        }
        for statement in module.top_level_statements() {
            match lowering.statement(statement) {
                Ok(compiled) => statements.push(compiled),
                Err(error) => errors.push(error),
            }
        }

        if !errors.is_empty() {
            return Err(errors);
        }

        let calls_main = module.top_level_statements().any(|s| s.calls("main"));
        let entry_point = module
            .items
            .iter()
            .find_map(|item| match item {
                ast::Item::Function(function) if function.name == "main" => Some(function),
                _ => None,
            })
            .filter(|_| !calls_main)
            .map(|f| f.name_span);

        Ok(CompiledProgram {
            functions,
            statements,
            entry_point,
        })
    }
}

impl fmt::Debug for Compiler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Compiler").finish_non_exhaustive()
    }
}

struct Lowering<'a> {
    types: &'a TypeInfo,
}

impl Lowering<'_> {
    fn resolve(&self, type_name: &ast::TypeName) -> Result<Type, TypeError> {
        Type::from_name(&type_name.name).ok_or_else(|| TypeError::UnknownType {
            name: type_name.name.clone(),
            span: type_name.span,
        })
    }

    fn type_of(&self, expression: &ast::Expression) -> Type {
        self.types.type_of(expression.span()).unwrap_or(Type::Unit)
    }

    fn function(&self, module: &[String], function: &ast::Function) -> Result<FunctionExpr, TypeError> {
        let parameters = function
            .parameters
            .iter()
            .map(|p| Ok(Parameter::new(p.name.clone(), self.resolve(&p.type_name)?)))
            .collect::<Result<Vec<_>, TypeError>>()?;
        let return_type = match &function.return_type {
            Some(type_name) => self.resolve(type_name)?,
            None => Type::Unit,
        };

        Ok(FunctionExpr {
            name: qualified_name(module, &function.name),
            parameters,
            return_type,
            body: self.statements(&function.body.statements)?,
            span: function.span,
        })
    }

    fn statements(&self, statements: &[ast::Statement]) -> Result<Vec<Box<dyn Expression>>, TypeError> {
        statements.iter().map(|s| self.statement(s)).collect()
    }

    fn block(&self, block: &ast::Block) -> Result<Box<dyn Expression>, TypeError> {
        Ok(Box::new(BlockExpr {
            statements: self.statements(&block.statements)?,
        }))
    }

    fn statement(&self, statement: &ast::Statement) -> Result<Box<dyn Expression>, TypeError> {
        match statement {
            ast::Statement::Let {
                name,
                type_name,
                value,
                span,
            } => Ok(Box::new(LetExpr {
                name: name.clone(),
                ty: self.types.variable_type(*span).ok_or_else(|| TypeError::UnknownType {
                    name: type_name.name.clone(),
                    span: type_name.span,
                })?,
                value: value.as_ref().map(|v| self.expression(v)).transpose()?,
                span: *span,
            })),
            ast::Statement::Assign {
                target,
                operator,
                value,
                span,
            } => Ok(Box::new(AssignmentExpr {
                target: target.clone(),
                operator: operator.binary(),
                value: self.expression(value)?,
                span: *span,
            })),
            ast::Statement::If {
                condition,
                then_block,
                else_branch,
                ..
            } => {
                let else_branch = match else_branch {
                    Some(ElseBranch::Block(block)) => Some(self.block(block)?),
                    Some(ElseBranch::If(statement)) => Some(self.statement(statement)?),
                    None => None,
                };
                Ok(Box::new(IfExpr {
                    condition: self.expression(condition)?,
                    then_branch: self.block(then_block)?,
                    else_branch,
                    span: condition.span(),
                }))
            }
            ast::Statement::While {
                condition, body, ..
            } => Ok(Box::new(WhileExpr {
                condition: self.expression(condition)?,
                body: self.statements(&body.statements)?,
                span: condition.span(),
            })),
            ast::Statement::For {
                variable,
                start,
                end,
                inclusive,
                body,
                span,
            } => Ok(Box::new(ForExpr {
                variable: variable.clone(),
                ty: self.types.loop_type(*span).unwrap_or(IntType::I32),
                start: self.expression(start)?,
                end: self.expression(end)?,
                inclusive: *inclusive,
                body: self.statements(&body.statements)?,
                span: start.span().merge(end.span()),
            })),
            ast::Statement::Break { .. } => Ok(Box::new(BreakExpr)),
            ast::Statement::Continue { .. } => Ok(Box::new(ContinueExpr)),
            ast::Statement::Return { value, .. } => Ok(Box::new(ReturnExpr {
                value: value.as_ref().map(|v| self.expression(v)).transpose()?,
            })),
            ast::Statement::Expression { expression, .. } => self.expression(expression),
            ast::Statement::Block(block) => self.block(block),
        }
    }

    fn expression(&self, expression: &ast::Expression) -> Result<Box<dyn Expression>, TypeError> {
        match expression {
            ast::Expression::Integer { value, suffix, span } => {
                let ty = suffix
                    .or_else(|| self.types.literal_type(*span))
                    .unwrap_or(IntType::I32);
                Ok(Box::new(LiteralExpr {
                    value: Value::int(ty, *value),
                }))
            }
            ast::Expression::Boolean { value, .. } => Ok(Box::new(LiteralExpr {
                value: Value::Bool(*value),
            })),
            ast::Expression::Char { value, .. } => Ok(Box::new(LiteralExpr {
                value: Value::Char(*value),
            })),
            ast::Expression::Variable { name, span } => Ok(Box::new(VariableExpr {
                name: name.clone(),
                ty: self.type_of(expression),
                span: *span,
            })),
            ast::Expression::Call {
                function,
                arguments,
                span,
            } => Ok(Box::new(CallExpr {
                function: self
                    .types
                    .call_target(*span)
                    .ok_or_else(|| TypeError::UnknownFunction {
                        name: function.to_string(),
                        span: *span,
                    })?
                    .to_string(),
                arguments: arguments
                    .iter()
                    .map(|arg| self.expression(arg))
                    .collect::<Result<Vec<_>, TypeError>>()?,
                ty: self.type_of(expression),
                span: *span,
            })),
            ast::Expression::Unary {
                operator,
                operand,
                span,
            } => Ok(Box::new(UnaryExpr {
                operator: *operator,
                operand: self.expression(operand)?,
                ty: self.type_of(expression),
                span: *span,
            })),
            ast::Expression::Binary {
                operator,
                left,
                right,
                span,
            } => Ok(Box::new(BinaryExpr {
                operator: *operator,
                left: self.expression(left)?,
                right: self.expression(right)?,
                ty: self.type_of(expression),
                span: *span,
            })),
            ast::Expression::Cast {
                expression: inner,
                target,
                span,
            } => Ok(Box::new(CastExpr {
                expression: self.expression(inner)?,
                target: self.resolve(target)?,
                span: *span,
            })),
        }
    }
}
