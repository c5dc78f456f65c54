use bel::analysis::AnalysisRunner;
use bel::ast::pretty::format_module;
use bel::compiler::{CompilationUnit, Compiler};
use bel::runtime::{ProgramError, Runtime, RuntimeError, Value};
use bel::typecheck::TypeError;
use bel::types::IntType;
use rstest::rstest;
use std::cell::RefCell;
use std::path::PathBuf;
use std::rc::Rc;

async fn run(source: &str) -> (Result<Value, ProgramError>, String) {
    let buffer = Rc::new(RefCell::new(Vec::new()));
    let runtime = Runtime::builder()
        .output(buffer.clone())
        .max_call_depth(64)
        .build();
    let result = runtime
        .run(&CompilationUnit::from_string(source.to_string()))
        .await;
    let output = String::from_utf8(buffer.borrow().clone()).unwrap();
    (result, output)
}

fn demo(name: &str) -> String {
    let path: PathBuf = [env!("CARGO_MANIFEST_DIR"), "demos", name].iter().collect();
    std::fs::read_to_string(path).unwrap()
}

#[rstest]
#[case("fizzbuzz.bel", "1\n2\nf\n4\nb\nf\n7\n8\nf\nb\n11\nf\n13\n14\nB\n")]
#[case("primes.bel", "15\n")]
#[case("bits.bel", "10\n5\n90\ntrue\nA\n25\n44\n18446744073709551615\n")]
#[case("geometry.bel", "12\n24\n27\n15\n")]
#[tokio::test]
async fn test_demo_programs(#[case] name: &str, #[case] expected: &str) {
    let (result, output) = run(&demo(name)).await;

    assert!(result.is_ok(), "{} failed: {:?}", name, result);
    assert_eq!(output, expected);
}

#[rstest]
#[case("fizzbuzz.bel")]
#[case("primes.bel")]
#[case("bits.bel")]
#[case("geometry.bel")]
fn test_demo_formatting_is_idempotent(#[case] name: &str) {
    let compiler = Compiler::new();
    let once = format_module(
        &compiler
            .parse(&CompilationUnit::from_string(demo(name)))
            .unwrap(),
    );
    let twice = format_module(
        &compiler
            .parse(&CompilationUnit::from_string(once.clone()))
            .unwrap(),
    );

    assert_eq!(once, twice);
}

#[tokio::test]
async fn test_demo_programs_are_lint_clean() {
    for name in ["fizzbuzz.bel", "primes.bel", "bits.bel", "geometry.bel"] {
        let checked = Runtime::new()
            .check(&CompilationUnit::from_string(demo(name)))
            .unwrap();
        let warnings = AnalysisRunner::with_defaults(&[]).run(&checked.module, 0);
        assert!(warnings.is_empty(), "{}: {:?}", name, warnings);
    }
}

#[tokio::test]
async fn test_primes_main_result_is_returned() {
    let (result, _) = run(&demo("primes.bel")).await;
    assert_eq!(result.unwrap(), Value::int(IntType::U32, 15));
}

#[rstest]
#[case("let x: i8 = 127;\nx += 1;", IntType::I8)]
#[case("let x: u32 = 0;\nx -= 1;", IntType::U32)]
#[case("let x: i64 = -9223372036854775808;\nlet y: i64 = -x;", IntType::I64)]
#[case("let x: u16 = 300;\nx *= 300;", IntType::U16)]
#[tokio::test]
async fn test_arithmetic_overflow_is_a_runtime_error(#[case] source: &str, #[case] ty: IntType) {
    let (result, _) = run(source).await;

    match result {
        Err(ProgramError::Runtime(RuntimeError::Overflow { ty: found, .. })) => {
            assert_eq!(found, ty)
        }
        other => panic!("expected overflow, got {:?}", other),
    }
}

#[tokio::test]
async fn test_shift_out_of_range_is_a_runtime_error() {
    let (result, _) = run("let n: u32 = 8;\nprint(1u8 << n);").await;

    assert!(matches!(
        result,
        Err(ProgramError::Runtime(RuntimeError::ShiftOutOfRange { amount: 8, .. }))
    ));
}

#[tokio::test]
async fn test_type_checker_collects_all_errors() {
    let (result, output) = run(
        r#"
print(1);
let a: bool = 1;
let b: i32 = true;
let c: u8 = 256;
undefined();
"#,
    )
    .await;

    match result {
        Err(ProgramError::Type(errors)) => {
            assert_eq!(errors.len(), 4);
            assert!(matches!(errors[0], TypeError::TypeMismatch { .. }));
            assert!(matches!(errors[2], TypeError::LiteralOutOfRange { .. }));
            assert!(matches!(errors[3], TypeError::UnknownFunction { .. }));
        }
        other => panic!("expected type errors, got {:?}", other),
    }
    assert_eq!(output, "");
}

#[tokio::test]
async fn test_uninitialized_read_is_rejected_statically() {
    let (result, _) = run("let x: i32;\nif true { x = 1; }\nprint(x);").await;

    match result {
        Err(ProgramError::Type(errors)) => {
            assert!(matches!(errors[0], TypeError::PossiblyUninitialized { .. }))
        }
        other => panic!("expected type error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_char_literals_and_escapes() {
    let (result, output) = run(r"print('\u{1F600}');
print('\n' as u8);
print('\'');").await;

    result.unwrap();
    assert_eq!(output, "😀\n10\n'\n");
}

#[tokio::test]
async fn test_mutual_recursion() {
    let (result, output) = run(
        r#"
fn even(n: u32) -> bool {
    if n == 0 {
        return true;
    }
    return odd(n - 1);
}
fn odd(n: u32) -> bool {
    if n == 0 {
        return false;
    }
    return even(n - 1);
}
print(even(10));
print(odd(7));
"#,
    )
    .await;

    result.unwrap();
    assert_eq!(output, "true\ntrue\n");
}

#[tokio::test]
async fn test_module_functions_share_names_across_modules() {
    let source = r#"
mod a {
    pub fn id() -> char {
        return 'a';
    }
}

mod b {
    pub fn id() -> char {
        return 'b';
    }

    pub fn both() {
        print(crate::a::id());
        print(id());
    }
}

fn id() -> char {
    return 'r';
}

b::both();
print(id());
"#;
    let (result, output) = run(source).await;

    assert!(result.is_ok(), "{:?}", result);
    assert_eq!(output, "a\nb\nr\n");
}

#[tokio::test]
async fn test_runtime_errors_name_the_qualified_function() {
    let source = "mod m {\n    pub fn spin(n: i32) -> i32 {\n        return spin(n);\n    }\n}\nm::spin(0);\n";
    let (result, _) = run(source).await;

    match result {
        Err(ProgramError::Runtime(RuntimeError::StackOverflow { depth, span })) => {
            assert_eq!(depth, 64);
            assert_eq!(&source[span.to_byte_range()], "spin(n)");
        }
        other => panic!("expected stack overflow, got {:?}", other),
    }
}
