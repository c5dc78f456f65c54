use super::*;
use crate::compiler::CompilationUnit;
use crate::types::{IntType, Span, Type};
use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;

async fn output_of(source: &str) -> String {
    let buffer = Rc::new(RefCell::new(Vec::new()));
    let runtime = Runtime::builder().output(buffer.clone()).build();
    runtime
        .run(&CompilationUnit::from_string(source.to_string()))
        .await
        .unwrap();
    let output = String::from_utf8(buffer.borrow().clone()).unwrap();
    output
}

fn root() -> Arc<Context> {
    Arc::new(Context::with_runtime(Rc::new(Runtime::new())))
}

#[test]
fn test_child_scope_sees_parent_variables() {
    let root = root();
    root.declare_variable("x".to_string(), Value::int(IntType::I32, 1));
    let block = Arc::new(Context::create_child(root.clone(), false));

    assert_eq!(block.get_variable("x"), Some(Value::int(IntType::I32, 1)));
    assert_eq!(block.depth(), 0);
}

#[test]
fn test_function_frame_hides_caller_variables() {
    let root = root();
    root.declare_variable("x".to_string(), Value::int(IntType::I32, 1));
    let frame = Arc::new(Context::create_child(root.clone(), true));

    assert_eq!(frame.get_variable("x"), None);
    assert_eq!(frame.depth(), 1);
    assert!(matches!(
        frame.read_variable("x", Span::new(4, 5)),
        Err(RuntimeError::UndefinedVariable { .. })
    ));
}

#[test]
fn test_assignment_updates_declaring_scope() {
    let root = root();
    root.declare_variable("x".to_string(), Value::int(IntType::I32, 1));
    let block = Arc::new(Context::create_child(root.clone(), false));

    block
        .assign_variable("x", Value::int(IntType::I32, 5), Span::dummy())
        .unwrap();

    assert_eq!(root.get_variable("x"), Some(Value::int(IntType::I32, 5)));
}

#[test]
fn test_immutable_slot_rejects_assignment() {
    let root = root();
    root.declare(
        "i".to_string(),
        Slot {
            ty: Type::Int(IntType::U8),
            value: Some(Value::int(IntType::U8, 0)),
            mutable: false,
        },
    );

    assert!(matches!(
        root.assign_variable("i", Value::int(IntType::U8, 1), Span::dummy()),
        Err(RuntimeError::ImmutableAssignment { .. })
    ));
}

#[test]
fn test_uninitialized_slot_read_is_an_error() {
    let root = root();
    root.declare(
        "later".to_string(),
        Slot {
            ty: Type::Char,
            value: None,
            mutable: true,
        },
    );

    assert!(matches!(
        root.read_variable("later", Span::dummy()),
        Err(RuntimeError::UninitializedVariable { .. })
    ));
}

#[tokio::test]
async fn test_inner_block_shadowing_is_scoped() {
    let output = output_of(
        r#"
let x: i32 = 1;
{
    let x: bool = true;
    print(x);
}
print(x);
"#,
    )
    .await;

    assert_eq!(output, "true\n1\n");
}

#[tokio::test]
async fn test_redeclaration_in_same_block_replaces() {
    let output = output_of(
        r#"
let x: i32 = 1;
let x: char = 'c';
print(x);
"#,
    )
    .await;

    assert_eq!(output, "c\n");
}

#[tokio::test]
async fn test_loop_body_gets_fresh_scope_each_iteration() {
    let output = output_of(
        r#"
for i in 0..3 {
    let seen: i32 = i;
    print(seen);
}
"#,
    )
    .await;

    assert_eq!(output, "0\n1\n2\n");
}

#[tokio::test]
async fn test_deferred_initialization_on_every_branch() {
    let output = output_of(
        r#"
let sign: i8;
let n: i8 = -4;
if n < 0 {
    sign = -1;
} else {
    sign = 1;
}
print(sign);
"#,
    )
    .await;

    assert_eq!(output, "-1\n");
}

#[tokio::test]
async fn test_assignment_in_block_persists_outside() {
    let output = output_of(
        r#"
let total: u16 = 0;
{
    total += 40;
    {
        total += 2;
    }
}
print(total);
"#,
    )
    .await;

    assert_eq!(output, "42\n");
}
