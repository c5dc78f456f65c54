use crate::expressions::run_statements;
use crate::expressions::while_stmt::{LoopStep, after_iteration};
use crate::runtime::{Context, RuntimeError, Slot, Value};
use crate::types::{Expression, IntType, Span, Type};
use async_trait::async_trait;
use std::any::Any;
use std::sync::Arc;

/// `for variable in start..end` (or `..=`). Bounds are evaluated once; the
/// counter never steps past `end`, so `..=MAX` ends without overflow.
#[derive(Debug)]
pub struct ForExpr {
    pub variable: String,
    pub ty: IntType,
    pub start: Box<dyn Expression>,
    pub end: Box<dyn Expression>,
    pub inclusive: bool,
    pub body: Vec<Box<dyn Expression>>,
    /// Span of the range.
    pub span: Span,
}

impl ForExpr {
    async fn bound(&self, expression: &dyn Expression, context: &Arc<Context>) -> Result<i128, RuntimeError> {
        match expression.evaluate(context.clone()).await? {
            Value::Int { ty, value } if ty == self.ty => Ok(value),
            other => Err(RuntimeError::TypeMismatch {
                expected: self.ty.to_string(),
                found: other.ty(),
                span: self.span,
            }),
        }
    }
}

#[async_trait(?Send)]
impl Expression for ForExpr {
    async fn evaluate(&self, context: Arc<Context>) -> Result<Value, RuntimeError> {
        let start = self.bound(self.start.as_ref(), &context).await?;
        let end = self.bound(self.end.as_ref(), &context).await?;
        let last = if self.inclusive { end } else { end - 1 };

        let mut current = start;
        while current <= last {
            context.runtime().tick()?;

            let iteration = Arc::new(Context::create_child(context.clone(), false));
            iteration.declare(
                self.variable.clone(),
                Slot {
                    ty: Type::Int(self.ty),
                    value: Some(Value::int(self.ty, current)),
                    mutable: false,
                },
            );
            run_statements(&self.body, &iteration).await?;

            if let LoopStep::Exit = after_iteration(&context) {
                break;
            }
            if current == last {
                break;
            }
            current += 1;
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
