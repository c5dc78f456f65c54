use crate::ast::{
    AssignOp, BinaryOp, Block, CallPath, ElseBranch, Expression, Function, Item, Module,
    ModuleDecl, PathAnchor, Statement, TypeName, UnaryOp, qualified_name,
};
use crate::typecheck::TypeInfo;
use crate::typecheck::error::TypeError;
use crate::typecheck::items::ItemTable;
use crate::types::{IntType, NativeFunction, Span, Spanned, Type};
use std::collections::HashMap;
use std::rc::Rc;

#[derive(Debug, Clone)]
struct FunctionSignature {
    parameters: Vec<Option<Type>>,
    return_type: Option<Type>,
}

#[derive(Debug, Clone)]
struct Variable {
    /// `None` when the declared type was invalid; uses are then unchecked
    /// so one bad annotation does not cascade.
    ty: Option<Type>,
    initialized: bool,
    loop_variable: bool,
}

type Scope = HashMap<String, Variable>;

/// How control leaves a statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Normal,
    /// `break` or `continue`: leaves the block but stays in the function.
    Jumps,
    /// `return`, or a loop that never exits.
    Returns,
}

impl Flow {
    fn join(self, other: Flow) -> Flow {
        match (self, other) {
            (Flow::Normal, _) | (_, Flow::Normal) => Flow::Normal,
            (Flow::Returns, Flow::Returns) => Flow::Returns,
            _ => Flow::Jumps,
        }
    }
}

pub struct TypeChecker {
    items: ItemTable<FunctionSignature>,
    /// Module containing the function being checked; empty at the root.
    module_path: Vec<String>,
    native_functions: HashMap<String, Rc<dyn NativeFunction>>,
    scopes: Vec<Scope>,
    /// One entry per enclosing loop: whether it contains a `break`.
    loops: Vec<bool>,
    /// Declared return type of the function being checked; `None` at top level.
    return_type: Option<Option<Type>>,
    info: TypeInfo,
    errors: Vec<TypeError>,
}

impl Default for TypeChecker {
    fn default() -> Self {
        Self::new()
    }
}

impl TypeChecker {
    pub fn new() -> Self {
        Self {
            items: ItemTable::default(),
            module_path: Vec::new(),
            native_functions: HashMap::new(),
            scopes: Vec::new(),
            loops: Vec::new(),
            return_type: None,
            info: TypeInfo::default(),
            errors: Vec::new(),
        }
    }

    pub fn with_native_functions<I>(mut self, functions: I) -> Self
    where
        I: IntoIterator<Item = Rc<dyn NativeFunction>>,
    {
        for function in functions {
            self.native_functions
                .insert(function.name().to_string(), function);
        }
        self
    }

    /// Checks every function and top-level statement, collecting all
    /// errors instead of stopping at the first.
    pub fn check_module(mut self, module: &Module) -> Result<TypeInfo, Vec<TypeError>> {
        self.collect_items(&module.items, &mut Vec::new());

        let mut globals = vec![Scope::new()];
        for item in &module.items {
            match item {
                Item::Function(function) => self.check_function(function),
                Item::Module(declaration) => self.check_nested_module(declaration),
                Item::Statement(statement) => {
                    std::mem::swap(&mut self.scopes, &mut globals);
                    self.check_statement(statement);
                    std::mem::swap(&mut self.scopes, &mut globals);
                }
            }
        }

        if self.errors.is_empty() {
            Ok(self.info)
        } else {
            Err(self.errors)
        }
    }

    fn error(&mut self, error: TypeError) {
        self.errors.push(error);
    }

    fn resolve(&mut self, type_name: &TypeName) -> Option<Type> {
        let resolved = Type::from_name(&type_name.name);
        if resolved.is_none() {
            self.error(TypeError::UnknownType {
                name: type_name.name.clone(),
                span: type_name.span,
            });
        }
        resolved
    }

    /// Declares every module and function signature so that calls can
    /// refer to items defined later in the file.
    fn collect_items(&mut self, items: &[Item], path: &mut Vec<String>) {
        for item in items {
            match item {
                Item::Function(function) => self.declare_function(path, function),
                Item::Module(declaration) => {
                    if !self
                        .items
                        .declare_module(path, &declaration.name, declaration.public)
                    {
                        self.error(TypeError::DuplicateModule {
                            name: qualified_name(path, &declaration.name),
                            span: declaration.name_span,
                        });
                    }
                    path.push(declaration.name.clone());
                    self.collect_items(&declaration.items, path);
                    path.pop();
                }
                Item::Statement(_) => {}
            }
        }
    }

    fn declare_function(&mut self, path: &[String], function: &Function) {
        if self.native_functions.contains_key(&function.name)
            || self.items.has_function(path, &function.name)
        {
            self.error(TypeError::DuplicateFunction {
                name: qualified_name(path, &function.name),
                span: function.name_span,
            });
            return;
        }

        let parameters = function
            .parameters
            .iter()
            .map(|p| self.resolve(&p.type_name))
            .collect();
        let return_type = match &function.return_type {
            Some(type_name) => self.resolve(type_name),
            None => Some(Type::Unit),
        };

        if path.is_empty() && function.name == "main" && !function.parameters.is_empty() {
            self.error(TypeError::InvalidMain {
                span: function.name_span,
            });
        }

        self.items.declare_function(
            path,
            &function.name,
            function.public,
            FunctionSignature {
                parameters,
                return_type,
            },
        );
    }

    fn check_nested_module(&mut self, declaration: &ModuleDecl) {
        self.module_path.push(declaration.name.clone());
        for item in &declaration.items {
            match item {
                Item::Function(function) => self.check_function(function),
                Item::Module(nested) => self.check_nested_module(nested),
                Item::Statement(_) => {}
            }
        }
        self.module_path.pop();
    }

    fn check_function(&mut self, function: &Function) {
        let mut parameters = Scope::new();
        for parameter in &function.parameters {
            if parameters.contains_key(&parameter.name) {
                self.error(TypeError::DuplicateParameter {
                    function: function.name.clone(),
                    name: parameter.name.clone(),
                    span: parameter.span,
                });
            }
            parameters.insert(
                parameter.name.clone(),
                Variable {
                    ty: Type::from_name(&parameter.type_name.name),
                    initialized: true,
                    loop_variable: false,
                },
            );
        }

        let return_type = match &function.return_type {
            Some(type_name) => Type::from_name(&type_name.name),
            None => Some(Type::Unit),
        };

        let saved_scopes = std::mem::replace(&mut self.scopes, vec![parameters]);
        let saved_loops = std::mem::take(&mut self.loops);
        let saved_return = self.return_type.replace(return_type);

        let flow = self.check_statements(&function.body.statements);

        if let Some(expected) = return_type {
            if expected != Type::Unit && flow != Flow::Returns {
                self.error(TypeError::MissingReturn {
                    function: function.name.clone(),
                    expected,
                    span: function.name_span,
                });
            }
        }

        self.scopes = saved_scopes;
        self.loops = saved_loops;
        self.return_type = saved_return;
    }

    fn check_block(&mut self, block: &Block) -> Flow {
        self.scopes.push(Scope::new());
        let flow = self.check_statements(&block.statements);
        self.scopes.pop();
        flow
    }

    fn check_statements(&mut self, statements: &[Statement]) -> Flow {
        let mut flow = Flow::Normal;
        for statement in statements {
            let next = self.check_statement(statement);
            if flow == Flow::Normal {
                flow = next;
            }
        }
        flow
    }

    fn lookup(&self, name: &str) -> Option<&Variable> {
        self.scopes.iter().rev().find_map(|scope| scope.get(name))
    }

    fn lookup_mut(&mut self, name: &str) -> Option<&mut Variable> {
        self.scopes
            .iter_mut()
            .rev()
            .find_map(|scope| scope.get_mut(name))
    }

    fn declare(&mut self, name: &str, variable: Variable) {
        if let Some(scope) = self.scopes.last_mut() {
            scope.insert(name.to_string(), variable);
        }
    }

    fn expect_type(&mut self, expected: Type, found: Option<Type>, span: Span) {
        if let Some(found) = found {
            if found != expected {
                self.error(TypeError::TypeMismatch {
                    expected: expected.to_string(),
                    found: found.to_string(),
                    span,
                });
            }
        }
    }

    fn check_statement(&mut self, statement: &Statement) -> Flow {
        match statement {
            Statement::Let {
                name,
                type_name,
                value,
                span,
            } => {
                let ty = self.resolve(type_name);
                if let Some(value) = value {
                    let found = self.check_expression(value, ty);
                    if let Some(ty) = ty {
                        self.expect_type(ty, found, value.span());
                    }
                }
                if let Some(ty) = ty {
                    self.info.record_variable(*span, ty);
                }
                self.declare(
                    name,
                    Variable {
                        ty,
                        initialized: value.is_some(),
                        loop_variable: false,
                    },
                );
                Flow::Normal
            }
            Statement::Assign {
                target,
                operator,
                value,
                span,
            } => {
                self.check_assignment(target, *operator, value, *span);
                Flow::Normal
            }
            Statement::If {
                condition,
                then_block,
                else_branch,
                ..
            } => {
                let found = self.check_expression(condition, Some(Type::Bool));
                self.expect_type(Type::Bool, found, condition.span());
                self.check_if(then_block, else_branch.as_ref())
            }
            Statement::While {
                condition, body, ..
            } => {
                let found = self.check_expression(condition, Some(Type::Bool));
                self.expect_type(Type::Bool, found, condition.span());

                let before = self.scopes.clone();
                self.loops.push(false);
                self.check_block(body);
                let has_break = self.loops.pop().unwrap_or(false);
                self.scopes = before;

                if is_true_literal(condition) && !has_break {
                    Flow::Returns
                } else {
                    Flow::Normal
                }
            }
            Statement::For {
                variable,
                start,
                end,
                body,
                span,
                ..
            } => {
                let ty = self.check_operand_pair(start, end, None);
                let int_ty = match ty {
                    Some(Type::Int(int_ty)) => Some(int_ty),
                    Some(other) => {
                        self.error(TypeError::TypeMismatch {
                            expected: "integer".to_string(),
                            found: other.to_string(),
                            span: start.span().merge(end.span()),
                        });
                        None
                    }
                    None => None,
                };
                if let Some(int_ty) = int_ty {
                    self.info.record_loop(*span, int_ty);
                }

                let before = self.scopes.clone();
                self.loops.push(false);
                self.scopes.push(Scope::new());
                self.declare(
                    variable,
                    Variable {
                        ty: int_ty.map(Type::Int),
                        initialized: true,
                        loop_variable: true,
                    },
                );
                self.check_statements(&body.statements);
                self.scopes.pop();
                self.loops.pop();
                self.scopes = before;
                Flow::Normal
            }
            Statement::Break { span } => {
                match self.loops.last_mut() {
                    Some(has_break) => *has_break = true,
                    None => self.error(TypeError::LoopControlOutsideLoop {
                        keyword: "break",
                        span: *span,
                    }),
                }
                Flow::Jumps
            }
            Statement::Continue { span } => {
                if self.loops.is_empty() {
                    self.error(TypeError::LoopControlOutsideLoop {
                        keyword: "continue",
                        span: *span,
                    });
                }
                Flow::Jumps
            }
            Statement::Return { value, span } => {
                match self.return_type {
                    None => {
                        self.error(TypeError::ReturnOutsideFunction { span: *span });
                        if let Some(value) = value {
                            self.check_expression(value, None);
                        }
                    }
                    Some(expected) => match value {
                        Some(value) => {
                            let found = self.check_expression(value, expected);
                            if let Some(expected) = expected {
                                self.expect_type(expected, found, value.span());
                            }
                        }
                        None => {
                            if let Some(expected) = expected {
                                self.expect_type(expected, Some(Type::Unit), *span);
                            }
                        }
                    },
                }
                Flow::Returns
            }
            Statement::Expression { expression, .. } => {
                self.check_expression(expression, None);
                Flow::Normal
            }
            Statement::Block(block) => self.check_block(block),
        }
    }

    fn check_assignment(&mut self, target: &str, operator: AssignOp, value: &Expression, span: Span) {
        let Some(variable) = self.lookup(target).cloned() else {
            self.error(TypeError::UnknownVariable {
                name: target.to_string(),
                span,
            });
            self.check_expression(value, None);
            return;
        };

        if variable.loop_variable {
            self.error(TypeError::AssignToLoopVariable {
                name: target.to_string(),
                span,
            });
        }

        if operator != AssignOp::Assign {
            if !variable.initialized {
                self.error(TypeError::PossiblyUninitialized {
                    name: target.to_string(),
                    span,
                });
            }
            if let Some(ty) = variable.ty {
                if !ty.is_integer() {
                    self.error(TypeError::InvalidOperands {
                        operator: operator.symbol(),
                        found: ty.to_string(),
                        span,
                    });
                }
            }
        }

        let found = self.check_expression(value, variable.ty);
        if let Some(ty) = variable.ty {
            self.expect_type(ty, found, value.span());
        }

        if let Some(slot) = self.lookup_mut(target) {
            slot.initialized = true;
        }
    }

    /// Checks both branches and keeps a variable initialized afterwards only
    /// when every branch that falls through initialized it.
    fn check_if(&mut self, then_block: &Block, else_branch: Option<&ElseBranch>) -> Flow {
        let before = self.scopes.clone();

        let then_flow = self.check_block(then_block);
        let after_then = std::mem::replace(&mut self.scopes, before);

        let else_flow = match else_branch {
            Some(ElseBranch::Block(block)) => self.check_block(block),
            Some(ElseBranch::If(statement)) => self.check_statement(statement),
            None => Flow::Normal,
        };

        match (then_flow == Flow::Normal, else_flow == Flow::Normal) {
            (true, true) => {
                for (scope, then_scope) in self.scopes.iter_mut().zip(&after_then) {
                    for (name, variable) in scope.iter_mut() {
                        let then_initialized = then_scope.get(name).is_some_and(|v| v.initialized);
                        variable.initialized &= then_initialized;
                    }
                }
            }
            (true, false) => self.scopes = after_then,
            _ => {}
        }

        then_flow.join(else_flow)
    }

    /// Types two operands that must agree. An unsuffixed literal on the
    /// left takes its type from the right operand instead.
    fn check_operand_pair(
        &mut self,
        left: &Expression,
        right: &Expression,
        expected: Option<Type>,
    ) -> Option<Type> {
        if is_untyped_literal(left) && !is_untyped_literal(right) {
            let right_ty = self.check_expression(right, expected);
            let left_ty = self.check_expression(left, right_ty.or(expected));
            self.agree(left_ty, right_ty, left.span())
        } else {
            let left_ty = self.check_expression(left, expected);
            let right_ty = self.check_expression(right, left_ty.or(expected));
            self.agree(left_ty, right_ty, right.span())
        }
    }

    fn agree(&mut self, left: Option<Type>, right: Option<Type>, span: Span) -> Option<Type> {
        match (left, right) {
            (Some(l), Some(r)) if l == r => Some(l),
            (Some(l), Some(r)) => {
                self.error(TypeError::TypeMismatch {
                    expected: l.to_string(),
                    found: r.to_string(),
                    span,
                });
                None
            }
            _ => None,
        }
    }

    fn check_expression(&mut self, expression: &Expression, expected: Option<Type>) -> Option<Type> {
        let ty = self.infer_expression(expression, expected);
        if let Some(ty) = ty {
            self.info.record_expression(expression.span(), ty);
        }
        ty
    }

    fn infer_expression(&mut self, expression: &Expression, expected: Option<Type>) -> Option<Type> {
        match expression {
            Expression::Integer {
                value,
                suffix,
                span,
            } => {
                let ty = suffix
                    .or_else(|| expected.and_then(|t| t.as_int()))
                    .unwrap_or(IntType::I32);
                self.info.record_literal(*span, ty);
                if !ty.contains(*value) {
                    self.error(TypeError::LiteralOutOfRange {
                        value: *value,
                        ty,
                        span: *span,
                    });
                }
                Some(Type::Int(ty))
            }
            Expression::Boolean { .. } => Some(Type::Bool),
            Expression::Char { .. } => Some(Type::Char),
            Expression::Variable { name, span } => match self.lookup(name) {
                Some(variable) => {
                    let variable = variable.clone();
                    if !variable.initialized {
                        self.error(TypeError::PossiblyUninitialized {
                            name: name.clone(),
                            span: *span,
                        });
                    }
                    variable.ty
                }
                None => {
                    self.error(TypeError::UnknownVariable {
                        name: name.clone(),
                        span: *span,
                    });
                    None
                }
            },
            Expression::Call {
                function,
                arguments,
                span,
            } => self.check_call(function, arguments, *span),
            Expression::Unary {
                operator,
                operand,
                span,
            } => {
                let ty = self.check_expression(operand, expected)?;
                let valid = match operator {
                    UnaryOp::Neg => ty.as_int().is_some_and(|int| int.is_signed()),
                    UnaryOp::Not => ty == Type::Bool || ty.is_integer(),
                };
                if valid {
                    Some(ty)
                } else {
                    self.error(TypeError::InvalidOperands {
                        operator: operator.symbol(),
                        found: ty.to_string(),
                        span: *span,
                    });
                    None
                }
            }
            Expression::Binary {
                operator,
                left,
                right,
                span,
            } => self.check_binary(*operator, left, right, expected, *span),
            Expression::Cast {
                expression: inner,
                target,
                span,
            } => {
                let from = self.check_expression(inner, None);
                let to = self.resolve(target)?;
                let from = from?;
                let valid = from == to
                    || matches!(
                        (from, to),
                        (Type::Int(_) | Type::Bool | Type::Char, Type::Int(_))
                            | (Type::Int(IntType::U8), Type::Char)
                    );
                if valid {
                    Some(to)
                } else {
                    self.error(TypeError::InvalidCast {
                        from,
                        to,
                        span: *span,
                    });
                    None
                }
            }
        }
    }

    fn check_binary(
        &mut self,
        operator: BinaryOp,
        left: &Expression,
        right: &Expression,
        expected: Option<Type>,
        span: Span,
    ) -> Option<Type> {
        if operator.is_logical() {
            let left_ty = self.check_expression(left, Some(Type::Bool));
            self.expect_type(Type::Bool, left_ty, left.span());
            let right_ty = self.check_expression(right, Some(Type::Bool));
            self.expect_type(Type::Bool, right_ty, right.span());
            return Some(Type::Bool);
        }

        if operator.is_shift() {
            let left_ty = self.check_expression(left, expected);
            let right_ty = self.check_expression(right, None);
            return match (left_ty, right_ty) {
                (Some(Type::Int(_)), Some(Type::Int(_))) => left_ty,
                (Some(l), Some(r)) => {
                    self.error(TypeError::InvalidOperands {
                        operator: operator.symbol(),
                        found: format!("{} and {}", l, r),
                        span,
                    });
                    None
                }
                _ => None,
            };
        }

        if operator.is_comparison() {
            let ty = self.check_operand_pair(left, right, None)?;
            if ty == Type::Unit {
                self.error(TypeError::InvalidOperands {
                    operator: operator.symbol(),
                    found: ty.to_string(),
                    span,
                });
            }
            return Some(Type::Bool);
        }

        let expected = expected.filter(|t| t.is_integer() || operator.is_bitwise());
        let ty = self.check_operand_pair(left, right, expected)?;
        let valid = ty.is_integer() || (operator.is_bitwise() && ty == Type::Bool);
        if valid {
            Some(ty)
        } else {
            self.error(TypeError::InvalidOperands {
                operator: operator.symbol(),
                found: ty.to_string(),
                span,
            });
            None
        }
    }

    fn check_call(&mut self, path: &CallPath, arguments: &[Expression], span: Span) -> Option<Type> {
        if path.anchor == PathAnchor::Local && path.segments.len() == 1 {
            if let Some(native) = self.native_functions.get(path.name()).cloned() {
                self.info.record_call(span, native.name().to_string());
                return self.check_native_call(native.as_ref(), arguments, span);
            }
        }

        let resolved = self
            .items
            .resolve(&self.module_path, path, span)
            .map(|(name, signature)| (name, signature.clone()));
        let (qualified, signature) = match resolved {
            Ok(resolved) => resolved,
            Err(error) => {
                self.error(error);
                for argument in arguments {
                    self.check_expression(argument, None);
                }
                return None;
            }
        };
        self.info.record_call(span, qualified);

        if signature.parameters.len() != arguments.len() {
            self.error(TypeError::ArgumentCountMismatch {
                function: path.to_string(),
                expected: signature.parameters.len(),
                found: arguments.len(),
                span,
            });
        }
        for (index, argument) in arguments.iter().enumerate() {
            let expected = signature.parameters.get(index).copied().flatten();
            let found = self.check_expression(argument, expected);
            if let Some(expected) = expected {
                self.expect_type(expected, found, argument.span());
            }
        }
        signature.return_type
    }

    fn check_native_call(
        &mut self,
        native: &dyn NativeFunction,
        arguments: &[Expression],
        span: Span,
    ) -> Option<Type> {
        let parameters = native.parameters();
        if parameters.len() != arguments.len() {
            self.error(TypeError::ArgumentCountMismatch {
                function: native.name().to_string(),
                expected: parameters.len(),
                found: arguments.len(),
                span,
            });
        }
        for (index, argument) in arguments.iter().enumerate() {
            let hint = parameters.get(index).map(|p| p.param_type);
            let found = self.check_expression(argument, hint);
            if let (Some(found), Some(hint)) = (found, hint) {
                if !native.accepts(index, &found) {
                    self.error(TypeError::TypeMismatch {
                        expected: hint.to_string(),
                        found: found.to_string(),
                        span: argument.span(),
                    });
                }
            }
        }
        Some(*native.return_type())
    }
}

/// An integer literal, or arithmetic over them, whose type comes from context.
fn is_untyped_literal(expression: &Expression) -> bool {
    match expression {
        Expression::Integer { suffix, .. } => suffix.is_none(),
        Expression::Unary { operand, .. } => is_untyped_literal(operand),
        Expression::Binary {
            operator,
            left,
            right,
            ..
        } => {
            (operator.is_arithmetic() || operator.is_bitwise())
                && is_untyped_literal(left)
                && is_untyped_literal(right)
        }
        _ => false,
    }
}

fn is_true_literal(expression: &Expression) -> bool {
    matches!(expression, Expression::Boolean { value: true, .. })
}
