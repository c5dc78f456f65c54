use super::*;
use crate::compiler::CompilationUnit;
use std::cell::RefCell;
use std::rc::Rc;

async fn run_source(source: &str) -> Result<String, ProgramError> {
    let buffer = Rc::new(RefCell::new(Vec::new()));
    let runtime = Runtime::builder().output(buffer.clone()).build();
    runtime
        .run(&CompilationUnit::from_string(source.to_string()))
        .await?;
    let output = String::from_utf8(buffer.borrow().clone()).unwrap();
    Ok(output)
}

#[tokio::test]
async fn test_if_else_chain_takes_first_true_branch() {
    let output = run_source(
        r#"
for n in 0..4 {
    if n == 0 {
        print('z');
    } else if n % 2 == 1 {
        print('o');
    } else {
        print('e');
    }
}
"#,
    )
    .await
    .unwrap();

    assert_eq!(output, "z\no\ne\no\n");
}

#[tokio::test]
async fn test_while_reevaluates_condition() {
    let output = run_source(
        r#"
let i: u8 = 3;
while i > 0 {
    print(i);
    i -= 1;
}
"#,
    )
    .await
    .unwrap();

    assert_eq!(output, "3\n2\n1\n");
}

#[tokio::test]
async fn test_break_leaves_innermost_loop_only() {
    let output = run_source(
        r#"
for i in 0..3 {
    for j in 0..10 {
        if j == 2 {
            break;
        }
        print(i * 10 + j);
    }
}
"#,
    )
    .await
    .unwrap();

    assert_eq!(output, "0\n1\n10\n11\n20\n21\n");
}

#[tokio::test]
async fn test_continue_skips_rest_of_body() {
    let output = run_source(
        r#"
let i: i32 = 0;
while i < 5 {
    i += 1;
    if i % 2 == 0 {
        continue;
    }
    print(i);
}
"#,
    )
    .await
    .unwrap();

    assert_eq!(output, "1\n3\n5\n");
}

#[tokio::test]
async fn test_break_inside_nested_block() {
    let output = run_source(
        r#"
let n: i32 = 0;
while true {
    {
        n += 1;
        if n == 3 {
            break;
        }
    }
}
print(n);
"#,
    )
    .await
    .unwrap();

    assert_eq!(output, "3\n");
}

#[tokio::test]
async fn test_return_unwinds_loops() {
    let output = run_source(
        r#"
fn first_multiple(of: i32) -> i32 {
    for n in 1..100 {
        while true {
            if n % of == 0 {
                return n;
            }
            break;
        }
    }
    return -1;
}
print(first_multiple(7));
print(first_multiple(200));
"#,
    )
    .await
    .unwrap();

    assert_eq!(output, "7\n-1\n");
}

#[tokio::test]
async fn test_exclusive_and_inclusive_ranges() {
    let output = run_source(
        r#"
for i in 0..3 { print(i); }
for i in 5..=5 { print(i); }
for i in 3..3 { print(i); }
for i in 4..=3 { print(i); }
"#,
    )
    .await
    .unwrap();

    assert_eq!(output, "0\n1\n2\n5\n");
}

#[tokio::test]
async fn test_inclusive_range_to_type_maximum_terminates() {
    let output = run_source(
        r#"
let count: u32 = 0;
for b in 250u8..=255 {
    count += 1;
}
print(count);
"#,
    )
    .await
    .unwrap();

    assert_eq!(output, "6\n");
}

#[tokio::test]
async fn test_range_bounds_are_evaluated_once() {
    let output = run_source(
        r#"
let end: i32 = 3;
for i in 0..end {
    end = 10;
    print(i);
}
"#,
    )
    .await
    .unwrap();

    assert_eq!(output, "0\n1\n2\n");
}

#[tokio::test]
async fn test_logical_operators_short_circuit() {
    let output = run_source(
        r#"
fn noisy(value: bool) -> bool {
    print(value);
    return value;
}
let a: bool = false && noisy(true);
let b: bool = true || noisy(false);
print(a);
print(b);
"#,
    )
    .await
    .unwrap();

    assert_eq!(output, "false\ntrue\n");
}

#[tokio::test]
async fn test_division_by_zero_inside_loop_is_reported() {
    let result = run_source(
        r#"
let total: i32 = 0;
for d in -2..2 {
    total += 10 / d;
}
"#,
    )
    .await;

    assert!(matches!(
        result,
        Err(ProgramError::Runtime(RuntimeError::DivisionByZero { .. }))
    ));
}

#[tokio::test]
async fn test_remainder_by_zero_has_its_own_message() {
    let result = run_source("let r: u16 = 7;\nlet zero: u16 = 0;\nr %= zero;\n").await;

    match result {
        Err(ProgramError::Runtime(error @ RuntimeError::RemainderByZero { .. })) => assert_eq!(
            error.to_string(),
            "attempt to calculate the remainder with a divisor of zero"
        ),
        other => panic!("expected remainder by zero, got {:?}", other),
    }
}
