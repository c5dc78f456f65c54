use crate::runtime::{Context, RuntimeError, Slot, Value};
use crate::types::{Expression, Span, Type};
use async_trait::async_trait;
use std::any::Any;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context as TaskContext, Poll};
use tracing::{Instrument, debug, info_span};

const STACK_RED_ZONE: usize = 128 * 1024;
const STACK_SEGMENT: usize = 2 * 1024 * 1024;

/// Polls a callee body on a fresh stack segment whenever the current one
/// runs low. Every nested call is polled from inside its caller's poll, so
/// without this the thread stack, not `max_call_depth`, bounds recursion.
struct GrowStack<F>(F);

impl<F: Future + Unpin> Future for GrowStack<F> {
    type Output = F::Output;

    fn poll(mut self: Pin<&mut Self>, cx: &mut TaskContext<'_>) -> Poll<Self::Output> {
        let inner = &mut self.0;
        stacker::maybe_grow(STACK_RED_ZONE, STACK_SEGMENT, || Pin::new(inner).poll(cx))
    }
}

pub struct CallExpr {
    pub function: String,
    pub arguments: Vec<Box<dyn Expression>>,
    pub ty: Type,
    pub span: Span,
}

impl std::fmt::Debug for CallExpr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CallExpr")
            .field("function", &self.function)
            .field("arguments", &format!("[{} args]", self.arguments.len()))
            .finish()
    }
}

impl CallExpr {
    async fn evaluate_arguments(&self, context: &Arc<Context>) -> Result<Vec<Value>, RuntimeError> {
        let mut args = Vec::with_capacity(self.arguments.len());
        for argument in &self.arguments {
            args.push(argument.evaluate(context.clone()).await?);
        }
        Ok(args)
    }

    fn check_arity(&self, expected: usize) -> Result<(), RuntimeError> {
        if self.arguments.len() != expected {
            return Err(RuntimeError::ArgumentCountMismatch {
                function: self.function.clone(),
                expected,
                found: self.arguments.len(),
                span: self.span,
            });
        }
        Ok(())
    }
}

#[async_trait(?Send)]
impl Expression for CallExpr {
    async fn evaluate(&self, context: Arc<Context>) -> Result<Value, RuntimeError> {
        let runtime = context.runtime_rc();

        if let Some(function) = runtime.get_function(&self.function) {
            self.check_arity(function.parameters.len())?;

            if context.depth() >= runtime.max_call_depth() {
                return Err(RuntimeError::StackOverflow {
                    depth: runtime.max_call_depth(),
                    span: self.span,
                });
            }

            let args = self.evaluate_arguments(&context).await?;
            let frame = Arc::new(Context::create_child(context.clone(), true));
            for (parameter, value) in function.parameters.iter().zip(args) {
                frame.declare(
                    parameter.name.clone(),
                    Slot {
                        ty: parameter.param_type,
                        value: Some(value),
                        mutable: true,
                    },
                );
            }

            let span = info_span!("call", function = %self.function, depth = frame.depth());
            return GrowStack(function.evaluate(frame)).instrument(span).await;
        }

        if let Some(native) = runtime.get_native_function(&self.function) {
            self.check_arity(native.parameters().len())?;
            let args = self.evaluate_arguments(&context).await?;

            debug!(function = %self.function, args = args.len(), "native_call");
            return native.execute(&context, args).await.map_err(|message| {
                if native.name() == "assert" {
                    RuntimeError::AssertionFailed { span: self.span }
                } else {
                    RuntimeError::NativeError {
                        function: self.function.clone(),
                        message,
                        span: self.span,
                    }
                }
            });
        }

        Err(RuntimeError::UnknownFunction {
            name: self.function.clone(),
            span: self.span,
        })
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
    use crate::expressions::{BinaryExpr, FunctionExpr, LiteralExpr, ReturnExpr, VariableExpr};
    use crate::ast::BinaryOp;
    use crate::runtime::Runtime;
    use crate::types::{IntType, Parameter};
    use std::rc::Rc;

    fn int(value: i128) -> Value {
        Value::int(IntType::I32, value)
    }

    fn call(function: &str, arguments: Vec<Box<dyn Expression>>) -> CallExpr {
        CallExpr {
            function: function.to_string(),
            arguments,
            ty: Type::Int(IntType::I32),
            span: Span::new(0, 10),
        }
    }

    fn double_function() -> FunctionExpr {
        FunctionExpr {
            name: "double".to_string(),
            parameters: vec![Parameter::new("n".to_string(), Type::Int(IntType::I32))],
            return_type: Type::Int(IntType::I32),
            body: vec![Box::new(ReturnExpr {
                value: Some(Box::new(BinaryExpr {
                    operator: BinaryOp::Mul,
                    left: Box::new(VariableExpr {
                        name: "n".to_string(),
                        ty: Type::Int(IntType::I32),
                        span: Span::dummy(),
                    }),
                    right: Box::new(LiteralExpr { value: int(2) }),
                    ty: Type::Int(IntType::I32),
                    span: Span::dummy(),
                })),
            })],
            span: Span::dummy(),
        }
    }

    #[tokio::test]
    async fn test_unknown_function() {
        let runtime = Rc::new(Runtime::new());
        let context = Arc::new(Context::with_runtime(runtime));
        let result = call("unknown_method", vec![]).evaluate(context).await;

        assert!(
            result
                .unwrap_err()
                .to_string()
                .contains("Unknown function: unknown_method")
        );
    }

    #[tokio::test]
    async fn test_call_with_registry() {
        let mut runtime = Runtime::new();
        runtime.register_function(double_function());

        let context = Arc::new(Context::with_runtime(Rc::new(runtime)));
        let expr = call("double", vec![Box::new(LiteralExpr { value: int(21) })]);

        assert_eq!(expr.evaluate(context).await, Ok(int(42)));
    }

    #[tokio::test]
    async fn test_argument_count_mismatch() {
        let mut runtime = Runtime::new();
        runtime.register_function(double_function());

        let context = Arc::new(Context::with_runtime(Rc::new(runtime)));
        let result = call("double", vec![]).evaluate(context).await;

        assert_eq!(
            result.unwrap_err().to_string(),
            "Function double expects 1 arguments, got 0"
        );
    }

    #[tokio::test]
    async fn test_callee_cannot_see_caller_variables() {
        let mut runtime = Runtime::new();
        runtime.register_function(FunctionExpr {
            name: "peek".to_string(),
            parameters: vec![],
            return_type: Type::Int(IntType::I32),
            body: vec![Box::new(ReturnExpr {
                value: Some(Box::new(VariableExpr {
                    name: "secret".to_string(),
                    ty: Type::Int(IntType::I32),
                    span: Span::dummy(),
                })),
            })],
            span: Span::dummy(),
        });

        let context = Arc::new(Context::with_runtime(Rc::new(runtime)));
        context.declare_variable("secret".to_string(), int(1));

        let result = call("peek", vec![]).evaluate(context).await;
        assert!(matches!(result, Err(RuntimeError::UndefinedVariable { .. })));
    }

    #[tokio::test]
    async fn test_call_depth_limit() {
        let mut runtime = Runtime::builder().max_call_depth(3).build();
        runtime.register_function(FunctionExpr {
            name: "recurse".to_string(),
            parameters: vec![],
            return_type: Type::unit(),
            body: vec![Box::new(call("recurse", vec![]))],
            span: Span::dummy(),
        });

        let context = Arc::new(Context::with_runtime(Rc::new(runtime)));
        let result = call("recurse", vec![]).evaluate(context).await;

        assert!(matches!(
            result,
            Err(RuntimeError::StackOverflow { depth: 3, .. })
        ));
    }

    #[tokio::test]
    async fn test_failed_assert_is_reported_at_call() {
        let runtime = Rc::new(Runtime::new());
        let context = Arc::new(Context::with_runtime(runtime));
        let expr = call(
            "assert",
            vec![Box::new(LiteralExpr {
                value: Value::Bool(false),
            })],
        );

        let result = expr.evaluate(context).await;
        assert_eq!(
            result,
            Err(RuntimeError::AssertionFailed {
                span: Span::new(0, 10)
            })
        );
    }
}
