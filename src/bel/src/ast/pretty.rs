//! Canonical source rendering used by `bel fmt`.
//!
//! Output uses four space indentation and the fewest parentheses that keep
//! the tree unchanged when parsed again. Comments are not part of the tree
//! and are therefore not reproduced.

use crate::ast::{
    Block, ElseBranch, Expression, Function, Item, Module, ModuleDecl, Statement, UnaryOp,
};

const INDENT: &str = "    ";
const CAST_PRECEDENCE: u8 = 11;
const UNARY_PRECEDENCE: u8 = 12;
const PRIMARY_PRECEDENCE: u8 = 13;

pub fn format_module(module: &Module) -> String {
    let mut out = String::new();
    format_items(&module.items, 0, &mut out);
    out
}

/// Declarations get a blank line on either side; runs of statements do not.
fn format_items(items: &[Item], depth: usize, out: &mut String) {
    let mut previous_was_declaration = None;

    for item in items {
        let is_declaration = !matches!(item, Item::Statement(_));
        if let Some(previous) = previous_was_declaration {
            if previous || is_declaration {
                out.push('\n');
            }
        }
        match item {
            Item::Function(function) => format_function(function, depth, out),
            Item::Module(module) => format_module_declaration(module, depth, out),
            Item::Statement(statement) => format_statement(statement, depth, out),
        }
        previous_was_declaration = Some(is_declaration);
    }
}

pub fn format_expression(expression: &Expression) -> String {
    let mut out = String::new();
    write_expression(expression, &mut out);
    out
}

fn format_module_declaration(module: &ModuleDecl, depth: usize, out: &mut String) {
    indent(depth, out);
    if module.public {
        out.push_str("pub ");
    }
    out.push_str("mod ");
    out.push_str(&module.name);
    if module.items.is_empty() {
        out.push_str(" {}\n");
        return;
    }
    out.push_str(" {\n");
    format_items(&module.items, depth + 1, out);
    indent(depth, out);
    out.push_str("}\n");
}

fn format_function(function: &Function, depth: usize, out: &mut String) {
    indent(depth, out);
    if function.public {
        out.push_str("pub ");
    }
    out.push_str("fn ");
    out.push_str(&function.name);
    out.push('(');
    for (i, parameter) in function.parameters.iter().enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        out.push_str(&parameter.name);
        out.push_str(": ");
        out.push_str(&parameter.type_name.name);
    }
    out.push(')');
    if let Some(return_type) = &function.return_type {
        out.push_str(" -> ");
        out.push_str(&return_type.name);
    }
    out.push(' ');
    format_block(&function.body, depth, out);
    out.push('\n');
}

fn format_block(block: &Block, depth: usize, out: &mut String) {
    if block.statements.is_empty() {
        out.push_str("{}");
        return;
    }
    out.push_str("{\n");
    for statement in &block.statements {
        format_statement(statement, depth + 1, out);
    }
    indent(depth, out);
    out.push('}');
}

fn indent(depth: usize, out: &mut String) {
    for _ in 0..depth {
        out.push_str(INDENT);
    }
}

fn format_statement(statement: &Statement, depth: usize, out: &mut String) {
    indent(depth, out);
    format_statement_inline(statement, depth, out);
    out.push('\n');
}

fn format_statement_inline(statement: &Statement, depth: usize, out: &mut String) {
    match statement {
        Statement::Let {
            name,
            type_name,
            value,
            ..
        } => {
            out.push_str(&format!("let {}: {}", name, type_name.name));
            if let Some(value) = value {
                out.push_str(" = ");
                write_expression(value, out);
            }
            out.push(';');
        }
        Statement::Assign {
            target,
            operator,
            value,
            ..
        } => {
            out.push_str(&format!("{} {} ", target, operator.symbol()));
            write_expression(value, out);
            out.push(';');
        }
        Statement::If {
            condition,
            then_block,
            else_branch,
            ..
        } => {
            out.push_str("if ");
            write_expression(condition, out);
            out.push(' ');
            format_block(then_block, depth, out);
            match else_branch {
                Some(ElseBranch::Block(block)) => {
                    out.push_str(" else ");
                    format_block(block, depth, out);
                }
                Some(ElseBranch::If(nested)) => {
                    out.push_str(" else ");
                    format_statement_inline(nested, depth, out);
                }
                None => {}
            }
        }
        Statement::While {
            condition, body, ..
        } => {
            out.push_str("while ");
            write_expression(condition, out);
            out.push(' ');
            format_block(body, depth, out);
        }
        Statement::For {
            variable,
            start,
            end,
            inclusive,
            body,
            ..
        } => {
            out.push_str(&format!("for {} in ", variable));
            write_expression(start, out);
            out.push_str(if *inclusive { "..=" } else { ".." });
            write_expression(end, out);
            out.push(' ');
            format_block(body, depth, out);
        }
        Statement::Break { .. } => out.push_str("break;"),
        Statement::Continue { .. } => out.push_str("continue;"),
        Statement::Return { value, .. } => {
            out.push_str("return");
            if let Some(value) = value {
                out.push(' ');
                write_expression(value, out);
            }
            out.push(';');
        }
        Statement::Expression { expression, .. } => {
            write_expression(expression, out);
            out.push(';');
        }
        Statement::Block(block) => format_block(block, depth, out),
    }
}

fn precedence(expression: &Expression) -> u8 {
    match expression {
        Expression::Binary { operator, .. } => operator.precedence(),
        Expression::Cast { .. } => CAST_PRECEDENCE,
        Expression::Unary { .. } => UNARY_PRECEDENCE,
        Expression::Integer { value, .. } if *value < 0 => UNARY_PRECEDENCE,
        _ => PRIMARY_PRECEDENCE,
    }
}

fn write_operand(expression: &Expression, needs_parens: bool, out: &mut String) {
    if needs_parens {
        out.push('(');
        write_expression(expression, out);
        out.push(')');
    } else {
        write_expression(expression, out);
    }
}

fn write_expression(expression: &Expression, out: &mut String) {
    match expression {
        Expression::Integer { value, suffix, .. } => {
            out.push_str(&value.to_string());
            if let Some(suffix) = suffix {
                out.push_str(suffix.name());
            }
        }
        Expression::Boolean { value, .. } => out.push_str(if *value { "true" } else { "false" }),
        Expression::Char { value, .. } => {
            out.push('\'');
            out.push_str(&escape_char(*value));
            out.push('\'');
        }
        Expression::Variable { name, .. } => out.push_str(name),
        Expression::Call {
            function,
            arguments,
            ..
        } => {
            out.push_str(&function.to_string());
            out.push('(');
            for (i, argument) in arguments.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                write_expression(argument, out);
            }
            out.push(')');
        }
        Expression::Unary {
            operator, operand, ..
        } => {
            out.push_str(operator.symbol());
            let negative_literal = *operator == UnaryOp::Neg
                && matches!(**operand, Expression::Integer { value, .. } if value < 0);
            let needs_parens = precedence(operand) < UNARY_PRECEDENCE || negative_literal;
            write_operand(operand, needs_parens, out);
        }
        Expression::Binary {
            operator,
            left,
            right,
            ..
        } => {
            let own = operator.precedence();
            let left_parens = if operator.is_comparison() {
                precedence(left) <= own
            } else {
                precedence(left) < own
            };
            write_operand(left, left_parens, out);
            out.push(' ');
            out.push_str(operator.symbol());
            out.push(' ');
            write_operand(right, precedence(right) <= own, out);
        }
        Expression::Cast {
            expression, target, ..
        } => {
            write_operand(expression, precedence(expression) < CAST_PRECEDENCE, out);
            out.push_str(" as ");
            out.push_str(&target.name);
        }
    }
}

fn escape_char(value: char) -> String {
    match value {
        '\'' => "\\'".to_string(),
        '\\' => "\\\\".to_string(),
        '\n' => "\\n".to_string(),
        '\r' => "\\r".to_string(),
        '\t' => "\\t".to_string(),
        '\0' => "\\0".to_string(),
        c if c.is_control() => format!("\\u{{{:x}}}", c as u32),
        c => c.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::{CompilationUnit, DefaultParser, Parser};

    fn parse(source: &str) -> Module {
        DefaultParser
            .parse(&CompilationUnit::from_string(source.to_string()))
            .unwrap()
    }

    fn format(source: &str) -> String {
        format_module(&parse(source))
    }

    #[test]
    fn formats_declarations_and_control_flow() {
        let source = "let x:i32=5;if x>3{x+=1;}else{x=0;}while x<10{x=x+1;}";
        let expected = "\
let x: i32 = 5;
if x > 3 {
    x += 1;
} else {
    x = 0;
}
while x < 10 {
    x = x + 1;
}
";
        assert_eq!(format(source), expected);
    }

    #[test]
    fn formats_functions_with_blank_line_separation() {
        let source = "fn add(a: i32, b: i32) -> i32 { return a + b; } fn noop() {} print(add(1, 2));";
        let expected = "\
fn add(a: i32, b: i32) -> i32 {
    return a + b;
}

fn noop() {}

print(add(1, 2));
";
        assert_eq!(format(source), expected);
    }

    #[test]
    fn keeps_only_required_parentheses() {
        assert_eq!(format("let a: i32 = (1 + 2) * 3;"), "let a: i32 = (1 + 2) * 3;\n");
        assert_eq!(format("let a: i32 = 1 + (2 * 3);"), "let a: i32 = 1 + 2 * 3;\n");
        assert_eq!(format("let a: i32 = 1 - (2 - 3);"), "let a: i32 = 1 - (2 - 3);\n");
        assert_eq!(format("let a: i32 = (1 - 2) - 3;"), "let a: i32 = 1 - 2 - 3;\n");
        assert_eq!(
            format("let b: bool = (1 < 2) == true;"),
            "let b: bool = (1 < 2) == true;\n"
        );
        assert_eq!(
            format("let c: u8 = (300 + 1) as u8;"),
            "let c: u8 = (300 + 1) as u8;\n"
        );
    }

    #[test]
    fn formats_else_if_chains_and_for_loops() {
        let source = "for i in 0..=3 { if i == 0 { continue; } else if i == 2 { break; } }";
        let expected = "\
for i in 0..=3 {
    if i == 0 {
        continue;
    } else if i == 2 {
        break;
    }
}
";
        assert_eq!(format(source), expected);
    }

    #[test]
    fn escapes_char_literals() {
        assert_eq!(
            format("let c: char = '\\n'; let q: char = '\\'';"),
            "let c: char = '\\n';\nlet q: char = '\\'';\n"
        );
    }

    #[test]
    fn formats_nested_modules_and_paths() {
        let source = "mod geo{pub fn area(w:u32,h:u32)->u32{return w*h;} pub mod unit{pub fn one()->u32{return super::area(1,1);}} mod empty{}} print(geo::unit::one()+crate::geo::area(2,3));";
        let expected = "\
mod geo {
    pub fn area(w: u32, h: u32) -> u32 {
        return w * h;
    }

    pub mod unit {
        pub fn one() -> u32 {
            return super::area(1, 1);
        }
    }

    mod empty {}
}

print(geo::unit::one() + crate::geo::area(2, 3));
";
        assert_eq!(format(source), expected);
        assert_eq!(format(expected), expected);
    }

    #[test]
    fn formatting_is_idempotent() {
        let source = "
            // comment is dropped
            fn fib(n: u64) -> u64 { if n < 2 { return n; } return fib(n - 1) + fib(n - 2); }
            let total: u64 = 0; for i in 0u64..10 { total += fib(i); }
            let neg: i8 = -128i8; let flag: bool = !(1 < 2) || 3 >= 4 && true;
            { let inner: char = 'x'; print(inner as u32); }
        ";
        let once = format(source);
        let twice = format(&once);
        assert_eq!(once, twice);
    }
}
