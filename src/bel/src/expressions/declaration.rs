use crate::runtime::{Context, RuntimeError, Slot, Value};
use crate::types::{Expression, Span, Type};
use async_trait::async_trait;
use std::any::Any;
use std::sync::Arc;

/// `let name: ty [= value];`. Declares into the current scope, replacing
/// any earlier variable of the same name there.
#[derive(Debug)]
pub struct LetExpr {
    pub name: String,
    pub ty: Type,
    pub value: Option<Box<dyn Expression>>,
    pub span: Span,
}

#[async_trait(?Send)]
impl Expression for LetExpr {
    async fn evaluate(&self, context: Arc<Context>) -> Result<Value, RuntimeError> {
        let value = match &self.value {
            Some(expression) => {
                let value = expression.evaluate(context.clone()).await?;
                if value.ty() != self.ty {
                    return Err(RuntimeError::TypeMismatch {
                        expected: self.ty.to_string(),
                        found: value.ty(),
                        span: self.span,
                    });
                }
                Some(value)
            }
            None => None,
        };

        context.declare(
            self.name.clone(),
            Slot {
                ty: self.ty,
                value,
                mutable: true,
            },
        );
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
    use crate::expressions::{LiteralExpr, VariableExpr};
    use crate::runtime::Runtime;
    use crate::types::IntType;
    use std::rc::Rc;

    fn context() -> Arc<Context> {
        Arc::new(Context::with_runtime(Rc::new(Runtime::new())))
    }

    #[tokio::test]
    async fn test_let_with_value() {
        let context = context();
        let expr = LetExpr {
            name: "x".to_string(),
            ty: Type::Int(IntType::U16),
            value: Some(Box::new(LiteralExpr {
                value: Value::int(IntType::U16, 500),
            })),
            span: Span::dummy(),
        };

        expr.evaluate(context.clone()).await.unwrap();
        assert_eq!(context.get_variable("x"), Some(Value::int(IntType::U16, 500)));
    }

    #[tokio::test]
    async fn test_let_without_value_is_uninitialized() {
        let context = context();
        let expr = LetExpr {
            name: "later".to_string(),
            ty: Type::Bool,
            value: None,
            span: Span::dummy(),
        };

        expr.evaluate(context.clone()).await.unwrap();
        let slot = context.lookup("later").unwrap();
        assert_eq!(slot.ty, Type::Bool);
        assert_eq!(slot.value, None);
    }

    #[tokio::test]
    async fn test_redeclaration_reads_previous_value() {
        let context = context();
        context.declare_variable("x".to_string(), Value::int(IntType::I32, 1));

        let expr = LetExpr {
            name: "x".to_string(),
            ty: Type::Int(IntType::I32),
            value: Some(Box::new(VariableExpr {
                name: "x".to_string(),
                ty: Type::Int(IntType::I32),
                span: Span::dummy(),
            })),
            span: Span::dummy(),
        };

        expr.evaluate(context.clone()).await.unwrap();
        assert_eq!(context.get_variable("x"), Some(Value::int(IntType::I32, 1)));
    }
}
