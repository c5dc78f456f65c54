mod checker;
mod error;
mod items;



pub use checker::TypeChecker;
pub use error::TypeError;

use crate::ast::Module;
use crate::functions;
use crate::types::{IntType, Span, Type};
use std::collections::HashMap;

/// Facts the checker resolved that the tree alone does not carry.
#[derive(Debug, Clone, Default)]
pub struct TypeInfo {
    literal_types: HashMap<Span, IntType>,
    loop_types: HashMap<Span, IntType>,
    expression_types: HashMap<Span, Type>,
    variable_types: HashMap<Span, Type>,
    call_targets: HashMap<Span, String>,
}

impl TypeInfo {
    /// Resolved type of the integer literal at `span`.
    pub fn literal_type(&self, span: Span) -> Option<IntType> {
        self.literal_types.get(&span).copied()
    }

    /// Integer type of the `for` loop at `span`.
    pub fn loop_type(&self, span: Span) -> Option<IntType> {
        self.loop_types.get(&span).copied()
    }

    pub fn type_of(&self, span: Span) -> Option<Type> {
        self.expression_types.get(&span).copied()
    }

    /// Declared type of the `let` at `span`.
    pub fn variable_type(&self, span: Span) -> Option<Type> {
        self.variable_types.get(&span).copied()
    }

    /// Qualified name of the function the call at `span` resolved to.
    pub fn call_target(&self, span: Span) -> Option<&str> {
        self.call_targets.get(&span).map(String::as_str)
    }

    pub(crate) fn record_literal(&mut self, span: Span, ty: IntType) {
        self.literal_types.insert(span, ty);
    }

    pub(crate) fn record_loop(&mut self, span: Span, ty: IntType) {
        self.loop_types.insert(span, ty);
    }

    pub(crate) fn record_expression(&mut self, span: Span, ty: Type) {
        self.expression_types.insert(span, ty);
    }

    pub(crate) fn record_variable(&mut self, span: Span, ty: Type) {
        self.variable_types.insert(span, ty);
    }

    pub(crate) fn record_call(&mut self, span: Span, target: String) {
        self.call_targets.insert(span, target);
    }
}

/// Checks `module` against the built-in functions.
pub fn check_module(module: &Module) -> Result<TypeInfo, Vec<TypeError>> {
    TypeChecker::new()
        .with_native_functions(functions::default_functions())
        .check_module(module)
}
