use crate::ast::UnaryOp;
use crate::runtime::{Context, RuntimeError, Value, apply_unary};
use crate::types::{Expression, Span, Type};
use async_trait::async_trait;
use std::any::Any;
use std::sync::Arc;

#[derive(Debug)]
pub struct UnaryExpr {
    pub operator: UnaryOp,
    pub operand: Box<dyn Expression>,
    pub ty: Type,
    pub span: Span,
}

#[async_trait(?Send)]
impl Expression for UnaryExpr {
    async fn evaluate(&self, context: Arc<Context>) -> Result<Value, RuntimeError> {
        let operand = self.operand.evaluate(context).await?;
        apply_unary(self.operator, operand, self.span)
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
    use crate::expressions::LiteralExpr;
    use crate::runtime::Runtime;
    use crate::types::IntType;
    use std::rc::Rc;

    async fn evaluate(operator: UnaryOp, value: Value) -> Result<Value, RuntimeError> {
        let expr = UnaryExpr {
            operator,
            operand: Box::new(LiteralExpr { value }),
            ty: value.ty(),
            span: Span::new(0, 2),
        };
        let context = Arc::new(Context::with_runtime(Rc::new(Runtime::new())));
        expr.evaluate(context).await
    }

    #[tokio::test]
    async fn test_not_bool() {
        assert_eq!(
            evaluate(UnaryOp::Not, Value::Bool(false)).await,
            Ok(Value::Bool(true))
        );
    }

    #[tokio::test]
    async fn test_negate_minimum_overflows() {
        let result = evaluate(UnaryOp::Neg, Value::int(IntType::I16, -32768)).await;
        assert!(matches!(result, Err(RuntimeError::Overflow { .. })));
    }
}
