use crate::expressions::run_statements;
use crate::runtime::{Context, RuntimeError, Signal, Value};
use crate::types::{Expression, Span, Type};
use async_trait::async_trait;
use std::any::Any;
use std::sync::Arc;

/// What a loop does after its body ran once.
pub(crate) enum LoopStep {
    Next,
    Exit,
}

/// Consumes a pending `break` or `continue` aimed at the innermost loop.
/// A pending `return` is left in place for the enclosing function.
pub(crate) fn after_iteration(context: &Context) -> LoopStep {
    match context.signal() {
        Some(Signal::Break) => {
            context.take_signal();
            LoopStep::Exit
        }
        Some(Signal::Continue) => {
            context.take_signal();
            LoopStep::Next
        }
        Some(Signal::Return(_)) => LoopStep::Exit,
        None => LoopStep::Next,
    }
}

#[derive(Debug)]
pub struct WhileExpr {
    pub condition: Box<dyn Expression>,
    pub body: Vec<Box<dyn Expression>>,
    /// Span of the condition.
    pub span: Span,
}

#[async_trait(?Send)]
impl Expression for WhileExpr {
    async fn evaluate(&self, context: Arc<Context>) -> Result<Value, RuntimeError> {
        loop {
            context.runtime().tick()?;

            let condition = self
                .condition
                .evaluate(context.clone())
                .await?
                .expect_bool(self.span)?;
            if !condition {
                break;
            }

            let iteration = Arc::new(Context::create_child(context.clone(), false));
            run_statements(&self.body, &iteration).await?;

            if let LoopStep::Exit = after_iteration(&context) {
                break;
            }
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
    use crate::ast::BinaryOp;
    use crate::expressions::{
        AssignmentExpr, BinaryExpr, BreakExpr, IfExpr, LetExpr, LiteralExpr, VariableExpr,
    };
    use crate::runtime::Runtime;
    use crate::types::IntType;
    use std::rc::Rc;

    fn int(value: i128) -> Value {
        Value::int(IntType::I32, value)
    }

    fn variable(name: &str) -> Box<dyn Expression> {
        Box::new(VariableExpr {
            name: name.to_string(),
            ty: Type::Int(IntType::I32),
            span: Span::dummy(),
        })
    }

    fn literal(value: Value) -> Box<dyn Expression> {
        Box::new(LiteralExpr { value })
    }

    fn compare(operator: BinaryOp, name: &str, value: i128) -> Box<dyn Expression> {
        Box::new(BinaryExpr {
            operator,
            left: variable(name),
            right: literal(int(value)),
            ty: Type::Bool,
            span: Span::dummy(),
        })
    }

    fn increment(name: &str) -> Box<dyn Expression> {
        Box::new(AssignmentExpr {
            target: name.to_string(),
            operator: Some(BinaryOp::Add),
            value: literal(int(1)),
            span: Span::dummy(),
        })
    }

    fn context() -> Arc<Context> {
        Arc::new(Context::with_runtime(Rc::new(Runtime::new())))
    }

    #[tokio::test]
    async fn test_while_false_condition() {
        let context = context();
        let while_expr = WhileExpr {
            condition: literal(Value::Bool(false)),
            body: vec![increment("never_declared")],
            span: Span::dummy(),
        };

        let result = while_expr.evaluate(context).await.unwrap();
        assert_eq!(result, Value::Unit);
    }

    #[tokio::test]
    async fn test_while_counts_up() {
        let context = context();
        context.declare_variable("i".to_string(), int(0));

        let while_expr = WhileExpr {
            condition: compare(BinaryOp::Lt, "i", 5),
            body: vec![increment("i")],
            span: Span::dummy(),
        };

        while_expr.evaluate(context.clone()).await.unwrap();
        assert_eq!(context.get_variable("i"), Some(int(5)));
    }

    #[tokio::test]
    async fn test_while_break() {
        let context = context();
        context.declare_variable("i".to_string(), int(0));

        let while_expr = WhileExpr {
            condition: literal(Value::Bool(true)),
            body: vec![
                increment("i"),
                Box::new(IfExpr {
                    condition: compare(BinaryOp::Eq, "i", 3),
                    then_branch: Box::new(BreakExpr),
                    else_branch: None,
                    span: Span::dummy(),
                }),
            ],
            span: Span::dummy(),
        };

        while_expr.evaluate(context.clone()).await.unwrap();
        assert_eq!(context.get_variable("i"), Some(int(3)));
        assert!(!context.has_signal());
    }

    #[tokio::test]
    async fn test_while_variable_scoping() {
        let context = context();
        context.declare_variable("i".to_string(), int(0));

        let while_expr = WhileExpr {
            condition: compare(BinaryOp::Lt, "i", 2),
            body: vec![
                Box::new(LetExpr {
                    name: "inner_var".to_string(),
                    ty: Type::Int(IntType::I32),
                    value: Some(literal(int(9))),
                    span: Span::dummy(),
                }),
                increment("i"),
            ],
            span: Span::dummy(),
        };

        while_expr.evaluate(context.clone()).await.unwrap();
        assert_eq!(context.get_variable("inner_var"), None);
    }

    #[tokio::test]
    async fn test_while_non_boolean_condition() {
        let while_expr = WhileExpr {
            condition: literal(int(1)),
            body: vec![],
            span: Span::dummy(),
        };

        let result = while_expr.evaluate(context()).await;
        assert!(matches!(result, Err(RuntimeError::TypeMismatch { .. })));
    }

    #[tokio::test]
    async fn test_infinite_loop_hits_step_limit() {
        let runtime = Rc::new(Runtime::builder().max_steps(Some(100)).build());
        let context = Arc::new(Context::with_runtime(runtime));

        let while_expr = WhileExpr {
            condition: literal(Value::Bool(true)),
            body: vec![],
            span: Span::dummy(),
        };

        let result = while_expr.evaluate(context).await;
        assert_eq!(result, Err(RuntimeError::StepLimitExceeded { limit: 100 }));
    }
}
