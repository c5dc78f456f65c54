use crate::runtime::{Context, RuntimeError, Value};
use crate::types::{Expression, Span, Type};
use async_trait::async_trait;
use std::any::Any;
use std::sync::Arc;

/// `if condition { ... } else ...`. Both branches are blocks, or a nested
/// `IfExpr` for `else if`.
#[derive(Debug)]
pub struct IfExpr {
    pub condition: Box<dyn Expression>,
    pub then_branch: Box<dyn Expression>,
    pub else_branch: Option<Box<dyn Expression>>,
    /// Span of the condition.
    pub span: Span,
}

#[async_trait(?Send)]
impl Expression for IfExpr {
    async fn evaluate(&self, context: Arc<Context>) -> Result<Value, RuntimeError> {
        let condition = self
            .condition
            .evaluate(context.clone())
            .await?
            .expect_bool(self.span)?;

        if condition {
            self.then_branch.evaluate(context).await?;
        } else if let Some(else_branch) = &self.else_branch {
            else_branch.evaluate(context).await?;
        }

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
    use crate::expressions::{AssignmentExpr, BlockExpr, LiteralExpr};
    use crate::runtime::Runtime;
    use crate::types::IntType;
    use std::rc::Rc;

    fn set_x(value: i128) -> Box<dyn Expression> {
        Box::new(BlockExpr {
            statements: vec![Box::new(AssignmentExpr {
                target: "x".to_string(),
                operator: None,
                value: Box::new(LiteralExpr {
                    value: Value::int(IntType::I32, value),
                }),
                span: Span::dummy(),
            })],
        })
    }

    fn condition(value: bool) -> Box<dyn Expression> {
        Box::new(LiteralExpr {
            value: Value::Bool(value),
        })
    }

    async fn run(if_expr: IfExpr) -> Option<Value> {
        let context = Arc::new(Context::with_runtime(Rc::new(Runtime::new())));
        context.declare_variable("x".to_string(), Value::int(IntType::I32, 0));
        if_expr.evaluate(context.clone()).await.unwrap();
        context.get_variable("x")
    }

    #[tokio::test]
    async fn test_if_true_condition() {
        let result = run(IfExpr {
            condition: condition(true),
            then_branch: set_x(1),
            else_branch: Some(set_x(2)),
            span: Span::dummy(),
        })
        .await;
        assert_eq!(result, Some(Value::int(IntType::I32, 1)));
    }

    #[tokio::test]
    async fn test_if_false_takes_else() {
        let result = run(IfExpr {
            condition: condition(false),
            then_branch: set_x(1),
            else_branch: Some(set_x(2)),
            span: Span::dummy(),
        })
        .await;
        assert_eq!(result, Some(Value::int(IntType::I32, 2)));
    }

    #[tokio::test]
    async fn test_else_if_chain() {
        let result = run(IfExpr {
            condition: condition(false),
            then_branch: set_x(1),
            else_branch: Some(Box::new(IfExpr {
                condition: condition(true),
                then_branch: set_x(3),
                else_branch: None,
                span: Span::dummy(),
            })),
            span: Span::dummy(),
        })
        .await;
        assert_eq!(result, Some(Value::int(IntType::I32, 3)));
    }

    #[tokio::test]
    async fn test_if_non_boolean_condition() {
        let if_expr = IfExpr {
            condition: Box::new(LiteralExpr {
                value: Value::int(IntType::I32, 1),
            }),
            then_branch: set_x(1),
            else_branch: None,
            span: Span::dummy(),
        };

        let context = Arc::new(Context::with_runtime(Rc::new(Runtime::new())));
        let result = if_expr.evaluate(context).await;
        assert!(matches!(result, Err(RuntimeError::TypeMismatch { .. })));
    }
}
