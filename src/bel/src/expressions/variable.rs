use crate::runtime::{Context, RuntimeError, Value};
use crate::types::{Expression, Span, Type};
use async_trait::async_trait;
use std::any::Any;
use std::sync::Arc;

#[derive(Debug)]
pub struct VariableExpr {
    pub name: String,
    pub ty: Type,
    pub span: Span,
}

#[async_trait(?Send)]
impl Expression for VariableExpr {
    async fn evaluate(&self, context: Arc<Context>) -> Result<Value, RuntimeError> {
        context.read_variable(&self.name, self.span)
    }

    fn return_type(&self) -> Type {
        self.ty
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
