use crate::runtime::{Context, Value};
use crate::types::{NativeFunction, Parameter, Type};
use async_trait::async_trait;

#[derive(Debug)]
pub struct AssertFunction {
    parameters: Vec<Parameter>,
    return_type: Type,
}

impl Default for AssertFunction {
    fn default() -> Self {
        Self::new()
    }
}

impl AssertFunction {
    pub fn new() -> Self {
        Self {
            parameters: vec![Parameter::new("condition".to_string(), Type::boolean())],
            return_type: Type::unit(),
        }
    }
}

#[async_trait(?Send)]
impl NativeFunction for AssertFunction {
    fn name(&self) -> &str {
        "assert"
    }

    fn parameters(&self) -> &[Parameter] {
        &self.parameters
    }

    fn return_type(&self) -> &Type {
        &self.return_type
    }

    async fn execute(&self, _context: &Context, args: Vec<Value>) -> Result<Value, String> {
        match args.as_slice() {
            [Value::Bool(true)] => Ok(Value::Unit),
            [Value::Bool(false)] => Err("assertion failed".to_string()),
            [other] => Err(format!("assert expects a bool, got {}", other.ty())),
            _ => Err(format!("assert expects 1 argument, got {}", args.len())),
        }
    }
}
