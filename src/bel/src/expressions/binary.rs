use crate::ast::BinaryOp;
use crate::runtime::{Context, RuntimeError, Value, apply_binary};
use crate::types::{Expression, Span, Type};
use async_trait::async_trait;
use std::any::Any;
use std::sync::Arc;

#[derive(Debug)]
pub struct BinaryExpr {
    pub operator: BinaryOp,
    pub left: Box<dyn Expression>,
    pub right: Box<dyn Expression>,
    pub ty: Type,
    pub span: Span,
}

#[async_trait(?Send)]
impl Expression for BinaryExpr {
    async fn evaluate(&self, context: Arc<Context>) -> Result<Value, RuntimeError> {
        let left = self.left.evaluate(context.clone()).await?;

        // && and || skip the right operand once the left decides the result.
        match (self.operator, left) {
            (BinaryOp::And, Value::Bool(false)) => return Ok(Value::Bool(false)),
            (BinaryOp::Or, Value::Bool(true)) => return Ok(Value::Bool(true)),
            _ => {}
        }

        let right = self.right.evaluate(context).await?;
        apply_binary(self.operator, left, right, self.span)
    }

    fn return_type(&self) -> Type {
        self.ty
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expressions::{CallExpr, LiteralExpr};
    use crate::runtime::Runtime;
    use crate::types::IntType;
    use std::rc::Rc;

    fn context() -> Arc<Context> {
        Arc::new(Context::with_runtime(Rc::new(Runtime::new())))
    }

    fn literal(value: Value) -> Box<dyn Expression> {
        Box::new(LiteralExpr { value })
    }

    /// A call to a function that does not exist: evaluating it fails.
    fn poison() -> Box<dyn Expression> {
        Box::new(CallExpr {
            function: "does_not_exist".to_string(),
            arguments: vec![],
            ty: Type::Bool,
            span: Span::dummy(),
        })
    }

    #[tokio::test]
    async fn test_arithmetic() {
        let expr = BinaryExpr {
            operator: BinaryOp::Sub,
            left: literal(Value::int(IntType::I32, 10)),
            right: literal(Value::int(IntType::I32, 4)),
            ty: Type::Int(IntType::I32),
            span: Span::dummy(),
        };

        let result = expr.evaluate(context()).await.unwrap();
        assert_eq!(result, Value::int(IntType::I32, 6));
    }

    #[tokio::test]
    async fn test_and_short_circuits() {
        let expr = BinaryExpr {
            operator: BinaryOp::And,
            left: literal(Value::Bool(false)),
            right: poison(),
            ty: Type::Bool,
            span: Span::dummy(),
        };

        assert_eq!(expr.evaluate(context()).await, Ok(Value::Bool(false)));
    }

    #[tokio::test]
    async fn test_or_short_circuits() {
        let expr = BinaryExpr {
            operator: BinaryOp::Or,
            left: literal(Value::Bool(true)),
            right: poison(),
            ty: Type::Bool,
            span: Span::dummy(),
        };

        assert_eq!(expr.evaluate(context()).await, Ok(Value::Bool(true)));
    }

    #[tokio::test]
    async fn test_division_by_zero_carries_operator_span() {
        let expr = BinaryExpr {
            operator: BinaryOp::Div,
            left: literal(Value::int(IntType::U8, 1)),
            right: literal(Value::int(IntType::U8, 0)),
            ty: Type::Int(IntType::U8),
            span: Span::new(3, 8),
        };

        let error = expr.evaluate(context()).await.unwrap_err();
        assert_eq!(error, RuntimeError::DivisionByZero { span: Span::new(3, 8) });
    }
}
