use crate::runtime::{Context, RuntimeError, Value};
use crate::types::{Expression, Type};
use async_trait::async_trait;
use std::any::Any;
use std::sync::Arc;

/// Evaluates `statements` in order, counting each against the step budget
/// and stopping early once a `break`, `continue` or `return` is pending.
pub async fn run_statements(
    statements: &[Box<dyn Expression>],
    context: &Arc<Context>,
) -> Result<(), RuntimeError> {
    for statement in statements {
        context.runtime().tick()?;
        statement.evaluate(context.clone()).await?;
        if context.has_signal() {
            break;
        }
    }
    Ok(())
}

#[derive(Debug)]
pub struct BlockExpr {
    pub statements: Vec<Box<dyn Expression>>,
}

#[async_trait(?Send)]
impl Expression for BlockExpr {
    async fn evaluate(&self, context: Arc<Context>) -> Result<Value, RuntimeError> {
        let block_context = Arc::new(Context::create_child(context, false));
        run_statements(&self.statements, &block_context).await?;
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
    use crate::expressions::{LetExpr, LiteralExpr, ReturnExpr};
    use crate::runtime::{Runtime, Signal};
    use crate::types::{IntType, Span};
    use std::rc::Rc;

    fn int(value: i128) -> Value {
        Value::int(IntType::I32, value)
    }

    fn literal(value: Value) -> Box<dyn Expression> {
        Box::new(LiteralExpr { value })
    }

    #[tokio::test]
    async fn test_block_declarations_do_not_leak() {
        let runtime = Rc::new(Runtime::new());
        let context = Arc::new(Context::with_runtime(runtime));

        let block = BlockExpr {
            statements: vec![Box::new(LetExpr {
                name: "inner".to_string(),
                ty: Type::Int(IntType::I32),
                value: Some(literal(int(1))),
                span: Span::dummy(),
            })],
        };

        block.evaluate(context.clone()).await.unwrap();
        assert_eq!(context.get_variable("inner"), None);
    }

    #[tokio::test]
    async fn test_block_stops_after_return() {
        let runtime = Rc::new(Runtime::new());
        let context = Arc::new(Context::with_runtime(runtime));

        let block = BlockExpr {
            statements: vec![
                Box::new(ReturnExpr {
                    value: Some(literal(int(7))),
                }),
                Box::new(LetExpr {
                    name: "after".to_string(),
                    ty: Type::Int(IntType::I32),
                    value: Some(literal(int(1))),
                    span: Span::dummy(),
                }),
            ],
        };

        block.evaluate(context.clone()).await.unwrap();
        assert_eq!(context.take_signal(), Some(Signal::Return(int(7))));
        assert_eq!(context.runtime().steps(), 1);
    }

    #[tokio::test]
    async fn test_step_limit_is_enforced() {
        let runtime = Rc::new(Runtime::builder().max_steps(Some(2)).build());
        let context = Arc::new(Context::with_runtime(runtime));

        let statements: Vec<Box<dyn Expression>> =
            (0..3).map(|i| literal(int(i))).collect();
        let result = run_statements(&statements, &context).await;

        assert_eq!(result, Err(RuntimeError::StepLimitExceeded { limit: 2 }));
    }
}
