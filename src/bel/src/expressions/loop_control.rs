use crate::runtime::{Context, RuntimeError, Signal, Value};
use crate::types::{Expression, Type};
use async_trait::async_trait;
use std::any::Any;
use std::sync::Arc;

#[derive(Debug)]
pub struct BreakExpr;

#[async_trait(?Send)]
impl Expression for BreakExpr {
    async fn evaluate(&self, context: Arc<Context>) -> Result<Value, RuntimeError> {
        context.set_signal(Signal::Break);
        Ok(Value::Unit)
    }

    fn return_type(&self) -> Type {
        Type::unit()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[derive(Debug)]
pub struct ContinueExpr;

#[async_trait(?Send)]
impl Expression for ContinueExpr {
    async fn evaluate(&self, context: Arc<Context>) -> Result<Value, RuntimeError> {
        context.set_signal(Signal::Continue);
        Ok(Value::Unit)
    }

    fn return_type(&self) -> Type {
        Type::unit()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
