use crate::runtime::{Context, RuntimeError, Value, apply_cast};
use crate::types::{Expression, Span, Type};
use async_trait::async_trait;
use std::any::Any;
use std::sync::Arc;

#[derive(Debug)]
pub struct CastExpr {
    pub expression: Box<dyn Expression>,
    pub target: Type,
    pub span: Span,
}

#[async_trait(?Send)]
impl Expression for CastExpr {
    async fn evaluate(&self, context: Arc<Context>) -> Result<Value, RuntimeError> {
        let value = self.expression.evaluate(context).await?;
        apply_cast(value, self.target, self.span)
    }

    fn return_type(&self) -> Type {
        self.target
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
