use crate::runtime::{Context, RuntimeError, Value};
use crate::types::{Expression, Type};
use async_trait::async_trait;
use std::any::Any;
use std::sync::Arc;

#[derive(Debug)]
pub struct LiteralExpr {
    pub value: Value,
}

#[async_trait(?Send)]
impl Expression for LiteralExpr {
    async fn evaluate(&self, _context: Arc<Context>) -> Result<Value, RuntimeError> {
        Ok(self.value)
    }

    fn return_type(&self) -> Type {
        self.value.ty()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
