use crate::runtime::{Context, RuntimeError, Signal, Value};
use crate::types::{Expression, Type};
use async_trait::async_trait;
use std::any::Any;
use std::sync::Arc;

#[derive(Debug)]
pub struct ReturnExpr {
    pub value: Option<Box<dyn Expression>>,
}

#[async_trait(?Send)]
impl Expression for ReturnExpr {
    async fn evaluate(&self, context: Arc<Context>) -> Result<Value, RuntimeError> {
        let value = match &self.value {
            Some(expression) => expression.evaluate(context.clone()).await?,
            None => Value::Unit,
        };
        context.set_signal(Signal::Return(value));
        Ok(value)
    }

    fn return_type(&self) -> Type {
        self.value
            .as_ref()
            .map_or(Type::unit(), |expression| expression.return_type())
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

    #[tokio::test]
    async fn test_return_sets_signal_on_function_frame() {
        let root = Arc::new(Context::with_runtime(Rc::new(Runtime::new())));
        let frame = Arc::new(Context::create_child(root.clone(), true));
        let block = Arc::new(Context::create_child(frame.clone(), false));

        let return_expr = ReturnExpr {
            value: Some(Box::new(LiteralExpr {
                value: Value::int(IntType::U64, 9),
            })),
        };
        return_expr.evaluate(block).await.unwrap();

        assert_eq!(
            frame.take_signal(),
            Some(Signal::Return(Value::int(IntType::U64, 9)))
        );
        assert!(!root.has_signal());
        assert_eq!(return_expr.return_type(), Type::Int(IntType::U64));
    }

    #[tokio::test]
    async fn test_bare_return_yields_unit() {
        let context = Arc::new(Context::with_runtime(Rc::new(Runtime::new())));
        ReturnExpr { value: None }
            .evaluate(context.clone())
            .await
            .unwrap();

        assert_eq!(context.take_signal(), Some(Signal::Return(Value::Unit)));
    }
}
