use super::*;
use crate::compiler::CompilationUnit;
use crate::types::{IntType, NativeFunction, Parameter, Type};
use async_trait::async_trait;
use std::cell::RefCell;
use std::rc::Rc;

fn capturing_runtime() -> (Runtime, Rc<RefCell<Vec<u8>>>) {
    let buffer = Rc::new(RefCell::new(Vec::new()));
    let runtime = Runtime::builder().output(buffer.clone()).build();
    (runtime, buffer)
}

fn written(buffer: &Rc<RefCell<Vec<u8>>>) -> String {
    String::from_utf8(buffer.borrow().clone()).unwrap()
}

#[test]
fn test_new_runtime_registers_builtins() {
    let runtime = Runtime::new();

    assert!(runtime.get_native_function("print").is_some());
    assert!(runtime.get_native_function("assert").is_some());
    assert!(runtime.get_function("print").is_none());
    assert_eq!(runtime.list_functions(), vec!["assert", "print"]);
    assert_eq!(runtime.max_call_depth(), DEFAULT_MAX_CALL_DEPTH);
}

#[test]
fn test_builder_without_default_functions() {
    let runtime = Runtime::builder().without_default_functions().build();
    assert!(runtime.list_functions().is_empty());
}

#[derive(Debug)]
struct DoubleFunction {
    parameters: Vec<Parameter>,
    return_type: Type,
}

#[async_trait(?Send)]
impl NativeFunction for DoubleFunction {
    fn name(&self) -> &str {
        "double"
    }

    fn parameters(&self) -> &[Parameter] {
        &self.parameters
    }

    fn return_type(&self) -> &Type {
        &self.return_type
    }

    async fn execute(&self, _context: &Context, args: Vec<Value>) -> Result<Value, String> {
        match args.as_slice() {
            [Value::Int { ty, value }] => Ok(Value::int(*ty, value * 2)),
            _ => Err("double expects an integer".to_string()),
        }
    }
}

#[tokio::test]
async fn test_custom_native_function_is_callable() {
    let buffer = Rc::new(RefCell::new(Vec::new()));
    let runtime = Runtime::builder()
        .output(buffer.clone())
        .with_native_function(Rc::new(DoubleFunction {
            parameters: vec![Parameter::new("x".to_string(), Type::Int(IntType::I64))],
            return_type: Type::Int(IntType::I64),
        }))
        .build();

    let program = CompilationUnit::from_string("print(double(21));".to_string());
    runtime.run(&program).await.unwrap();

    assert_eq!(written(&buffer), "42\n");
}

#[tokio::test]
async fn test_main_runs_after_top_level_statements() {
    let (runtime, buffer) = capturing_runtime();
    let program = CompilationUnit::from_string(
        r#"
fn main() -> i32 {
    print(2);
    return 7;
}
print(1);
"#
        .to_string(),
    );

    let result = runtime.run(&program).await.unwrap();

    assert_eq!(result, Value::int(IntType::I32, 7));
    assert_eq!(written(&buffer), "1\n2\n");
}

#[tokio::test]
async fn test_main_called_explicitly_runs_once() {
    let (runtime, buffer) = capturing_runtime();
    let program = CompilationUnit::from_string(
        r#"
fn main() {
    print('m');
}
main();
"#
        .to_string(),
    );

    let result = runtime.run(&program).await.unwrap();

    assert_eq!(result, Value::Unit);
    assert_eq!(written(&buffer), "m\n");
}

#[tokio::test]
async fn test_check_rejects_type_errors_without_running() {
    let (runtime, buffer) = capturing_runtime();
    let program = CompilationUnit::from_string("print(1);\nlet x: bool = 3;".to_string());

    let result = runtime.run(&program).await;

    assert!(matches!(result, Err(ProgramError::Type(ref errors)) if errors.len() == 1));
    assert_eq!(written(&buffer), "");
}

#[tokio::test]
async fn test_parse_errors_surface_as_program_errors() {
    let runtime = Runtime::new();
    let program = CompilationUnit::from_string("let x: i32 = ;".to_string());

    assert!(matches!(
        runtime.run(&program).await,
        Err(ProgramError::Parse(_))
    ));
}

#[tokio::test]
async fn test_step_limit_stops_runaway_loops() {
    let runtime = Runtime::builder().max_steps(Some(100)).build();
    let program = CompilationUnit::from_string(
        "let x: i32 = 0;\nwhile x < 1000 { x += 1; }".to_string(),
    );

    let result = runtime.run(&program).await;

    assert!(matches!(
        result,
        Err(ProgramError::Runtime(RuntimeError::StepLimitExceeded { limit: 100 }))
    ));
}

#[tokio::test]
async fn test_runtime_error_keeps_earlier_output() {
    let (runtime, buffer) = capturing_runtime();
    let program = CompilationUnit::from_string(
        "print(1);\nlet x: u8 = 255;\nx += 1;\nprint(2);".to_string(),
    );

    let result = runtime.run(&program).await;

    assert!(matches!(
        result,
        Err(ProgramError::Runtime(RuntimeError::Overflow { ty: IntType::U8, .. }))
    ));
    assert_eq!(written(&buffer), "1\n");
}

#[tokio::test]
async fn test_failed_assert_reports_assertion_failure() {
    let runtime = Runtime::new();
    let program = CompilationUnit::from_string("assert(1 + 1 == 3);".to_string());

    let result = runtime.run(&program).await;

    match result {
        Err(ProgramError::Runtime(RuntimeError::AssertionFailed { span })) => {
            assert_eq!(span.start, 0);
        }
        other => panic!("expected assertion failure, got {:?}", other),
    }
}

#[test]
fn test_runtime_clone_keeps_configuration() {
    let runtime = Runtime::builder().max_call_depth(12).max_steps(Some(5)).build();
    runtime.tick().unwrap();

    let cloned = runtime.clone();

    assert_eq!(cloned.max_call_depth(), 12);
    assert_eq!(cloned.steps(), 0);
    assert_eq!(runtime.steps(), 1);
}
