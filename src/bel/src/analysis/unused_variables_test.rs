use crate::analysis::{Analyzer, UnusedVariableAnalyzer, Warning, parse_module};

fn unused_names(source: &str) -> Vec<String> {
    let module = parse_module(source);
    UnusedVariableAnalyzer::new()
        .analyze_module(&module, 0)
        .into_iter()
        .map(|warning| match warning {
            Warning::UnusedVariable { name, .. } => name,
            other => panic!("unexpected warning {:?}", other),
        })
        .collect()
}

#[test]
fn test_unused_let_detected() {
    assert_eq!(unused_names("let unused: i32 = 1;"), vec!["unused"]);
}

#[test]
fn test_read_variable_not_reported() {
    assert!(unused_names("let x: i32 = 1;\nprint(x);").is_empty());
}

#[test]
fn test_assignment_alone_is_not_a_read() {
    assert_eq!(
        unused_names("let x: i32 = 1;\nx = 2;\nx += 3;"),
        vec!["x"]
    );
}

#[test]
fn test_shadowed_binding_reported_separately() {
    let source = r#"
let x: i32 = 1;
{
    let x: i32 = 2;
    print(x);
}
"#;
    assert_eq!(unused_names(source), vec!["x"]);
}

#[test]
fn test_underscore_prefix_is_exempt() {
    assert!(unused_names("let _ignored: bool = true;").is_empty());
}

#[test]
fn test_parameters_and_loop_variables_not_reported() {
    let source = r#"
fn f(a: i32) {
    for i in 0..3 {
        print('.');
    }
}
"#;
    assert!(unused_names(source).is_empty());
}

#[test]
fn test_function_locals_are_isolated() {
    let source = r#"
fn f() {
    let local: u8 = 1;
}
let local: u8 = 2;
print(local);
"#;
    let module = parse_module(source);
    let warnings = UnusedVariableAnalyzer::new().analyze_module(&module, 0);

    assert_eq!(warnings.len(), 1);
    assert_eq!(&source[warnings[0].span().to_byte_range()], "let local: u8 = 1;");
}
