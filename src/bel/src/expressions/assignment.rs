use crate::ast::BinaryOp;
use crate::runtime::{Context, RuntimeError, Value, apply_binary};
use crate::types::{Expression, Span, Type};
use async_trait::async_trait;
use std::any::Any;
use std::sync::Arc;

/// `target = value;` or a compound form such as `target += value;`.
#[derive(Debug)]
pub struct AssignmentExpr {
    pub target: String,
    /// Arithmetic applied before storing, for compound assignments.
    pub operator: Option<BinaryOp>,
    pub value: Box<dyn Expression>,
    pub span: Span,
}

#[async_trait(?Send)]
impl Expression for AssignmentExpr {
    async fn evaluate(&self, context: Arc<Context>) -> Result<Value, RuntimeError> {
        let value = self.value.evaluate(context.clone()).await?;
        let value = match self.operator {
            Some(operator) => {
                let current = context.read_variable(&self.target, self.span)?;
                apply_binary(operator, current, value, self.span)?
            }
            None => value,
        };

        context.assign_variable(&self.target, value, self.span)?;
        Ok(Value::Unit)
    }

    fn return_type(&self) -> Type {
        Type::unit()
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

    fn context() -> Arc<Context> {
        Arc::new(Context::with_runtime(Rc::new(Runtime::new())))
    }

    fn assign(operator: Option<BinaryOp>, value: Value) -> AssignmentExpr {
        AssignmentExpr {
            target: "x".to_string(),
            operator,
            value: Box::new(LiteralExpr { value }),
            span: Span::new(0, 6),
        }
    }

    #[tokio::test]
    async fn test_plain_assignment() {
        let context = context();
        context.declare_variable("x".to_string(), Value::int(IntType::I32, 1));

        assign(None, Value::int(IntType::I32, 42))
            .evaluate(context.clone())
            .await
            .unwrap();

        assert_eq!(context.get_variable("x"), Some(Value::int(IntType::I32, 42)));
    }

    #[tokio::test]
    async fn test_compound_assignment() {
        let context = context();
        context.declare_variable("x".to_string(), Value::int(IntType::U8, 10));

        assign(Some(BinaryOp::Mul), Value::int(IntType::U8, 3))
            .evaluate(context.clone())
            .await
            .unwrap();

        assert_eq!(context.get_variable("x"), Some(Value::int(IntType::U8, 30)));
    }

    #[tokio::test]
    async fn test_compound_assignment_overflow() {
        let context = context();
        context.declare_variable("x".to_string(), Value::int(IntType::U8, 200));

        let result = assign(Some(BinaryOp::Add), Value::int(IntType::U8, 100))
            .evaluate(context.clone())
            .await;

        assert!(matches!(result, Err(RuntimeError::Overflow { .. })));
        assert_eq!(context.get_variable("x"), Some(Value::int(IntType::U8, 200)));
    }

    #[tokio::test]
    async fn test_assignment_to_undeclared_variable() {
        let result = assign(None, Value::Bool(true)).evaluate(context()).await;
        assert!(matches!(
            result,
            Err(RuntimeError::UndefinedVariable { name, .. }) if name == "x"
        ));
    }
}
