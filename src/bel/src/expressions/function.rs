use crate::expressions::run_statements;
use crate::runtime::{Context, RuntimeError, Signal, Value};
use crate::types::{Expression, Parameter, Span, Type};
use async_trait::async_trait;
use std::any::Any;
use std::sync::Arc;

pub struct FunctionExpr {
    pub name: String,
    pub parameters: Vec<Parameter>,
    pub return_type: Type,
    pub body: Vec<Box<dyn Expression>>,
    pub span: Span,
}

impl std::fmt::Debug for FunctionExpr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FunctionExpr")
            .field("name", &self.name)
            .field("parameters", &self.parameters)
            .field("return_type", &self.return_type)
            .field("body", &format!("[{} statements]", self.body.len()))
            .finish()
    }
}

#[async_trait(?Send)]
impl Expression for FunctionExpr {
    /// Runs the body in `context`, which must be a fresh frame holding the
    /// parameters. Yields the returned value, or unit on fall-through.
    async fn evaluate(&self, context: Arc<Context>) -> Result<Value, RuntimeError> {
        run_statements(&self.body, &context).await?;

        match context.take_signal() {
            Some(Signal::Return(value)) => Ok(value),
            Some(signal) => Err(RuntimeError::MisplacedControlFlow {
                keyword: signal.keyword(),
            }),
            None => Ok(Value::Unit),
        }
    }

    fn return_type(&self) -> Type {
        self.return_type
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expressions::{LiteralExpr, ReturnExpr};
    use crate::runtime::Runtime;
    use crate::types::IntType;
    use std::rc::Rc;

    fn frame() -> Arc<Context> {
        let root = Arc::new(Context::with_runtime(Rc::new(Runtime::new())));
        Arc::new(Context::create_child(root, true))
    }

    #[tokio::test]
    async fn test_function_returns_value() {
        let function = FunctionExpr {
            name: "seven".to_string(),
            parameters: vec![],
            return_type: Type::Int(IntType::I32),
            body: vec![
                Box::new(ReturnExpr {
                    value: Some(Box::new(LiteralExpr {
                        value: Value::int(IntType::I32, 7),
                    })),
                }),
                Box::new(LiteralExpr {
                    value: Value::Bool(false),
                }),
            ],
            span: Span::dummy(),
        };

        let result = function.evaluate(frame()).await.unwrap();
        assert_eq!(result, Value::int(IntType::I32, 7));
        assert_eq!(function.return_type(), Type::Int(IntType::I32));
    }

    #[tokio::test]
    async fn test_function_falls_through_to_unit() {
        let function = FunctionExpr {
            name: "noop".to_string(),
            parameters: vec![],
            return_type: Type::unit(),
            body: vec![],
            span: Span::dummy(),
        };

        let result = function.evaluate(frame()).await.unwrap();
        assert_eq!(result, Value::Unit);
    }

    #[test]
    fn test_debug_summarises_body() {
        let function = FunctionExpr {
            name: "noop".to_string(),
            parameters: vec![Parameter::new("flag".to_string(), Type::Bool)],
            return_type: Type::unit(),
            body: vec![],
            span: Span::dummy(),
        };

        let debug = format!("{:?}", function);
        assert!(debug.contains("noop"));
        assert!(debug.contains("[0 statements]"));
    }
}
