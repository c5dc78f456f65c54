use crate::runtime::{Context, Value};
use crate::types::{IntType, NativeFunction, Parameter, Type};
use async_trait::async_trait;
use std::io::Write;

/// `print(value)`: writes any scalar and a newline to the runtime's output.
#[derive(Debug)]
pub struct PrintFunction {
    parameters: Vec<Parameter>,
    return_type: Type,
}

impl Default for PrintFunction {
    fn default() -> Self {
        Self::new()
    }
}

impl PrintFunction {
    pub fn new() -> Self {
        Self {
            // The declared type only guides literal inference; `accepts`
            // admits every scalar.
            parameters: vec![Parameter::new(
                "value".to_string(),
                Type::Int(IntType::I32),
            )],
            return_type: Type::unit(),
        }
    }
}

#[async_trait(?Send)]
impl NativeFunction for PrintFunction {
    fn name(&self) -> &str {
        "print"
    }

    fn parameters(&self) -> &[Parameter] {
        &self.parameters
    }

    fn return_type(&self) -> &Type {
        &self.return_type
    }

    fn accepts(&self, index: usize, ty: &Type) -> bool {
        index == 0 && *ty != Type::Unit
    }

    async fn execute(&self, context: &Context, args: Vec<Value>) -> Result<Value, String> {
        let [value] = args.as_slice() else {
            return Err(format!("print expects 1 argument, got {}", args.len()));
        };

        let mut output = context.runtime().output().borrow_mut();
        writeln!(output, "{}", value).map_err(|e| format!("failed to write output: {}", e))?;
        Ok(Value::Unit)
    }
}
