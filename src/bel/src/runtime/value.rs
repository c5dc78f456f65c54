use crate::ast::{BinaryOp, UnaryOp};
use crate::runtime::RuntimeError;
use crate::types::{IntType, Span, Type};
use std::cmp::Ordering;
use std::fmt;

/// A BEL runtime value. Every value is a scalar, so values are `Copy` and
/// never outlive the scope that holds them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Value {
    Unit,
    Bool(bool),
    Char(char),
    Int { ty: IntType, value: i128 },
}

impl Value {
    pub fn int(ty: IntType, value: i128) -> Self {
        Value::Int { ty, value }
    }

    pub fn ty(&self) -> Type {
        match self {
            Value::Unit => Type::Unit,
            Value::Bool(_) => Type::Bool,
            Value::Char(_) => Type::Char,
            Value::Int { ty, .. } => Type::Int(*ty),
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<(IntType, i128)> {
        match self {
            Value::Int { ty, value } => Some((*ty, *value)),
            _ => None,
        }
    }

    pub fn expect_bool(&self, span: Span) -> Result<bool, RuntimeError> {
        self.as_bool().ok_or(RuntimeError::TypeMismatch {
            expected: Type::Bool.to_string(),
            found: self.ty(),
            span,
        })
    }

    pub fn expect_int(&self, span: Span) -> Result<(IntType, i128), RuntimeError> {
        self.as_int().ok_or(RuntimeError::TypeMismatch {
            expected: "integer".to_string(),
            found: self.ty(),
            span,
        })
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Unit => write!(f, "()"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Char(c) => write!(f, "{}", c),
            Value::Int { value, .. } => write!(f, "{}", value),
        }
    }
}

fn checked(ty: IntType, result: Option<i128>, operation: &'static str, span: Span) -> Result<Value, RuntimeError> {
    match result {
        Some(value) if ty.contains(value) => Ok(Value::int(ty, value)),
        _ => Err(RuntimeError::Overflow {
            operation,
            ty,
            span,
        }),
    }
}

pub fn apply_unary(operator: UnaryOp, operand: Value, span: Span) -> Result<Value, RuntimeError> {
    match (operator, operand) {
        (UnaryOp::Neg, Value::Int { ty, value }) if ty.is_signed() => {
            checked(ty, value.checked_neg(), "negate", span)
        }
        (UnaryOp::Not, Value::Bool(b)) => Ok(Value::Bool(!b)),
        (UnaryOp::Not, Value::Int { ty, value }) => {
            let inverted = if ty.is_signed() { !value } else { ty.max() - value };
            Ok(Value::int(ty, inverted))
        }
        (UnaryOp::Neg, other) => Err(RuntimeError::TypeMismatch {
            expected: "signed integer".to_string(),
            found: other.ty(),
            span,
        }),
        (UnaryOp::Not, other) => Err(RuntimeError::TypeMismatch {
            expected: "bool or integer".to_string(),
            found: other.ty(),
            span,
        }),
    }
}

pub fn apply_binary(
    operator: BinaryOp,
    left: Value,
    right: Value,
    span: Span,
) -> Result<Value, RuntimeError> {
    if operator.is_comparison() {
        return compare(operator, left, right, span);
    }

    if operator.is_shift() {
        let (ty, value) = left.expect_int(span)?;
        let (_, amount) = right.expect_int(span)?;
        if amount < 0 || amount >= ty.bits() as i128 {
            return Err(RuntimeError::ShiftOutOfRange { amount, ty, span });
        }
        let amount = amount as u32;
        let shifted = match operator {
            BinaryOp::Shl => ty.wrap((value as u128).wrapping_shl(amount) as i128),
            _ => value >> amount,
        };
        return Ok(Value::int(ty, shifted));
    }

    match (left, right) {
        (Value::Bool(l), Value::Bool(r)) => match operator {
            BinaryOp::BitAnd | BinaryOp::And => Ok(Value::Bool(l & r)),
            BinaryOp::BitOr | BinaryOp::Or => Ok(Value::Bool(l | r)),
            BinaryOp::BitXor => Ok(Value::Bool(l ^ r)),
            _ => Err(RuntimeError::TypeMismatch {
                expected: "integer".to_string(),
                found: Type::Bool,
                span,
            }),
        },
        (Value::Int { ty, value: l }, Value::Int { ty: rty, value: r }) if ty == rty => {
            integer_arithmetic(operator, ty, l, r, span)
        }
        (Value::Int { ty, .. }, other) => Err(RuntimeError::TypeMismatch {
            expected: ty.to_string(),
            found: other.ty(),
            span,
        }),
        (other, _) => Err(RuntimeError::TypeMismatch {
            expected: "integer".to_string(),
            found: other.ty(),
            span,
        }),
    }
}

fn integer_arithmetic(
    operator: BinaryOp,
    ty: IntType,
    l: i128,
    r: i128,
    span: Span,
) -> Result<Value, RuntimeError> {
    match operator {
        BinaryOp::Add => checked(ty, l.checked_add(r), "add", span),
        BinaryOp::Sub => checked(ty, l.checked_sub(r), "subtract", span),
        BinaryOp::Mul => checked(ty, l.checked_mul(r), "multiply", span),
        BinaryOp::Div => {
            if r == 0 {
                return Err(RuntimeError::DivisionByZero { span });
            }
            checked(ty, l.checked_div(r), "divide", span)
        }
        BinaryOp::Rem => {
            if r == 0 {
                return Err(RuntimeError::RemainderByZero { span });
            }
            if ty.is_signed() && l == ty.min() && r == -1 {
                return Err(RuntimeError::Overflow {
                    operation: "take the remainder of",
                    ty,
                    span,
                });
            }
            Ok(Value::int(ty, l % r))
        }
        BinaryOp::BitAnd => Ok(Value::int(ty, l & r)),
        BinaryOp::BitOr => Ok(Value::int(ty, l | r)),
        BinaryOp::BitXor => Ok(Value::int(ty, l ^ r)),
        _ => Err(RuntimeError::TypeMismatch {
            expected: Type::Bool.to_string(),
            found: Type::Int(ty),
            span,
        }),
    }
}

fn compare(operator: BinaryOp, left: Value, right: Value, span: Span) -> Result<Value, RuntimeError> {
    let ordering = match (left, right) {
        (Value::Int { ty, value: l }, Value::Int { ty: rty, value: r }) if ty == rty => l.cmp(&r),
        (Value::Bool(l), Value::Bool(r)) => l.cmp(&r),
        (Value::Char(l), Value::Char(r)) => l.cmp(&r),
        (left, right) => {
            return Err(RuntimeError::TypeMismatch {
                expected: left.ty().to_string(),
                found: right.ty(),
                span,
            });
        }
    };

    let result = match operator {
        BinaryOp::Eq => ordering == Ordering::Equal,
        BinaryOp::Ne => ordering != Ordering::Equal,
        BinaryOp::Lt => ordering == Ordering::Less,
        BinaryOp::Le => ordering != Ordering::Greater,
        BinaryOp::Gt => ordering == Ordering::Greater,
        _ => ordering != Ordering::Less,
    };
    Ok(Value::Bool(result))
}

pub fn apply_cast(value: Value, target: Type, span: Span) -> Result<Value, RuntimeError> {
    match (value, target) {
        (value, target) if value.ty() == target => Ok(value),
        (Value::Int { value, .. }, Type::Int(ty)) => Ok(Value::int(ty, ty.wrap(value))),
        (Value::Bool(b), Type::Int(ty)) => Ok(Value::int(ty, b as i128)),
        (Value::Char(c), Type::Int(ty)) => Ok(Value::int(ty, ty.wrap(c as i128))),
        (
            Value::Int {
                ty: IntType::U8,
                value,
            },
            Type::Char,
        ) => Ok(Value::Char(char::from(value as u8))),
        (value, target) => Err(RuntimeError::InvalidCast {
            from: value.ty(),
            to: target,
            span,
        }),
    }
}
