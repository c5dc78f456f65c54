use crate::ast::{
    AssignOp, BinaryOp, Block, CallPath, ElseBranch, Expression, Function, Item, ModuleDecl,
    Parameter, PathAnchor, Statement, TypeName, UnaryOp,
};
use crate::types::{IntType, Span, Spanned};
use combine::error::StreamError;
use combine::parser::char::{char, digit, space, string};
use combine::parser::repeat::skip_until;
use combine::stream::StreamErrorFor;
use combine::{
    Parser, Stream, attempt, between, chainl1, choice, eof, many, many1, not_followed_by, one_of,
    optional, position, satisfy, sep_by, skip_many,
};
use std::num::IntErrorKind;

pub const KEYWORDS: &[&str] = &[
    "let", "fn", "if", "else", "while", "for", "in", "break", "continue", "return", "true",
    "false", "as", "mod", "pub", "crate", "super",
];

fn skip_trivia<Input>() -> impl Parser<Input, Output = ()>
where
    Input: Stream<Token = char>,
    Input::Error: combine::ParseError<Input::Token, Input::Range, Input::Position>,
{
    let line_comment = attempt(string("//")).with(skip_many(satisfy(|c: char| c != '\n')));
    let block_comment = attempt(string("/*"))
        .with(skip_until(attempt(string("*/"))))
        .with(string("*/"))
        .map(|_| ());

    skip_many(choice((space().map(|_| ()), line_comment, block_comment))).silent()
}

/// Runs `parser`, records the bytes it consumed, then skips trailing trivia.
fn lexeme<Input, P>(parser: P) -> impl Parser<Input, Output = (P::Output, Span)>
where
    Input: Stream<Token = char, Position = usize>,
    Input::Error: combine::ParseError<Input::Token, Input::Range, Input::Position>,
    P: Parser<Input>,
{
    (position(), parser, position())
        .map(|(start, value, end)| (value, Span::new(start, end)))
        .skip(skip_trivia())
}

fn punct<Input>(symbol: &'static str) -> impl Parser<Input, Output = Span>
where
    Input: Stream<Token = char, Position = usize>,
    Input::Error: combine::ParseError<Input::Token, Input::Range, Input::Position>,
{
    lexeme(attempt(string(symbol))).map(|(_, span)| span)
}

/// An operator that must not be followed by any character of `forbidden_next`,
/// so that `<` does not match the start of `<=` or `<<`.
fn operator<Input>(symbol: &'static str, forbidden_next: &'static str) -> impl Parser<Input, Output = Span>
where
    Input: Stream<Token = char, Position = usize>,
    Input::Error: combine::ParseError<Input::Token, Input::Range, Input::Position>,
{
    lexeme(attempt(
        string(symbol).skip(not_followed_by(one_of(forbidden_next.chars()))),
    ))
    .map(|(_, span)| span)
}

fn keyword<Input>(word: &'static str) -> impl Parser<Input, Output = Span>
where
    Input: Stream<Token = char, Position = usize>,
    Input::Error: combine::ParseError<Input::Token, Input::Range, Input::Position>,
{
    lexeme(attempt(string(word).skip(not_followed_by(satisfy(
        |c: char| c.is_ascii_alphanumeric() || c == '_',
    )))))
    .map(|(_, span)| span)
}

fn identifier<Input>() -> impl Parser<Input, Output = (String, Span)>
where
    Input: Stream<Token = char, Position = usize>,
    Input::Error: combine::ParseError<Input::Token, Input::Range, Input::Position>,
{
    lexeme(
        (
            satisfy(|c: char| c.is_ascii_alphabetic() || c == '_'),
            many(satisfy(|c: char| c.is_ascii_alphanumeric() || c == '_')),
        )
            .map(|(first, rest): (char, String)| {
                let mut result = String::new();
                result.push(first);
                result.push_str(&rest);
                result
            })
            .and_then(|name: String| {
                if KEYWORDS.contains(&name.as_str()) {
                    Err(StreamErrorFor::<Input>::unexpected_format(format!(
                        "keyword `{}`",
                        name
                    )))
                } else {
                    Ok(name)
                }
            }),
    )
}

fn type_name<Input>() -> impl Parser<Input, Output = TypeName>
where
    Input: Stream<Token = char, Position = usize>,
    Input::Error: combine::ParseError<Input::Token, Input::Range, Input::Position>,
{
    identifier().map(|(name, span)| TypeName { name, span })
}

pub fn parse_program<Input>() -> impl Parser<Input, Output = Vec<Item>>
where
    Input: Stream<Token = char, Position = usize>,
    Input::Error: combine::ParseError<Input::Token, Input::Range, Input::Position>,
{
    skip_trivia()
        .with(many(choice((
            declaration(),
            statement().map(Item::Statement),
        ))))
        .skip(eof())
}

/// Marks `item` public and widens its span over the `pub` keyword.
fn with_visibility(item: Item, public: Option<Span>) -> Item {
    let Some(pub_span) = public else {
        return item;
    };
    match item {
        Item::Function(mut function) => {
            function.public = true;
            function.span = pub_span.merge(function.span);
            Item::Function(function)
        }
        Item::Module(mut module) => {
            module.public = true;
            module.span = pub_span.merge(module.span);
            Item::Module(module)
        }
        Item::Statement(statement) => Item::Statement(statement),
    }
}

combine::parser! {
    fn declaration[Input]()(Input) -> Item
    where [Input: Stream<Token = char, Position = usize>]
    {
        (
            optional(keyword("pub")),
            choice((
                function().map(Item::Function),
                module_declaration().map(Item::Module),
            )),
        )
            .map(|(public, item): (Option<Span>, Item)| with_visibility(item, public))
    }
}

combine::parser! {
    fn module_declaration[Input]()(Input) -> ModuleDecl
    where [Input: Stream<Token = char, Position = usize>]
    {
        (
            keyword("mod"),
            identifier(),
            punct("{"),
            many(declaration()),
            punct("}"),
        )
            .map(
                |(mod_span, (name, name_span), _, items, close): (
                    Span,
                    (String, Span),
                    Span,
                    Vec<Item>,
                    Span,
                )| ModuleDecl {
                    name,
                    name_span,
                    public: false,
                    items,
                    span: mod_span.merge(close),
                },
            )
    }
}

fn function<Input>() -> impl Parser<Input, Output = Function>
where
    Input: Stream<Token = char, Position = usize>,
    Input::Error: combine::ParseError<Input::Token, Input::Range, Input::Position>,
{
    (
        keyword("fn"),
        identifier(),
        between(
            punct("("),
            punct(")"),
            sep_by(parameter(), punct(",")),
        ),
        optional(punct("->").with(type_name())),
        block(),
    )
        .map(
            |(fn_span, (name, name_span), parameters, return_type, body): (
                Span,
                (String, Span),
                Vec<Parameter>,
                Option<TypeName>,
                Block,
            )| {
                let span = fn_span.merge(body.span);
                Function {
                    name,
                    name_span,
                    public: false,
                    parameters,
                    return_type,
                    body,
                    span,
                }
            },
        )
}

fn parameter<Input>() -> impl Parser<Input, Output = Parameter>
where
    Input: Stream<Token = char, Position = usize>,
    Input::Error: combine::ParseError<Input::Token, Input::Range, Input::Position>,
{
    (identifier(), punct(":"), type_name()).map(|((name, name_span), _, type_name)| {
        let span = name_span.merge(type_name.span);
        Parameter {
            name,
            type_name,
            span,
        }
    })
}

fn block<Input>() -> impl Parser<Input, Output = Block>
where
    Input: Stream<Token = char, Position = usize>,
    Input::Error: combine::ParseError<Input::Token, Input::Range, Input::Position>,
{
    (punct("{"), many(statement()), punct("}")).map(
        |(open, statements, close): (Span, Vec<Statement>, Span)| Block {
            statements,
            span: open.merge(close),
        },
    )
}

combine::parser! {
    fn statement[Input]()(Input) -> Statement
    where [Input: Stream<Token = char, Position = usize>]
    {
        choice((
            let_statement(),
            if_statement(),
            while_statement(),
            for_statement(),
            jump_statement(),
            return_statement(),
            block().map(Statement::Block),
            assignment_statement(),
            expression_statement(),
        ))
    }
}

fn let_statement<Input>() -> impl Parser<Input, Output = Statement>
where
    Input: Stream<Token = char, Position = usize>,
    Input::Error: combine::ParseError<Input::Token, Input::Range, Input::Position>,
{
    (
        keyword("let"),
        identifier(),
        punct(":"),
        type_name(),
        optional(operator("=", "=").with(expression())),
        punct(";"),
    )
        .map(|(let_span, (name, _), _, type_name, value, semi)| Statement::Let {
            name,
            type_name,
            value,
            span: let_span.merge(semi),
        })
}

fn assign_operator<Input>() -> impl Parser<Input, Output = AssignOp>
where
    Input: Stream<Token = char, Position = usize>,
    Input::Error: combine::ParseError<Input::Token, Input::Range, Input::Position>,
{
    choice((
        operator("+=", "").map(|_| AssignOp::Add),
        operator("-=", "").map(|_| AssignOp::Sub),
        operator("*=", "").map(|_| AssignOp::Mul),
        operator("/=", "").map(|_| AssignOp::Div),
        operator("%=", "").map(|_| AssignOp::Rem),
        operator("=", "=").map(|_| AssignOp::Assign),
    ))
}

fn assignment_statement<Input>() -> impl Parser<Input, Output = Statement>
where
    Input: Stream<Token = char, Position = usize>,
    Input::Error: combine::ParseError<Input::Token, Input::Range, Input::Position>,
{
    (
        attempt((identifier(), assign_operator())),
        expression(),
        punct(";"),
    )
        .map(|(((target, target_span), operator), value, semi)| Statement::Assign {
            target,
            operator,
            value,
            span: target_span.merge(semi),
        })
}

fn expression_statement<Input>() -> impl Parser<Input, Output = Statement>
where
    Input: Stream<Token = char, Position = usize>,
    Input::Error: combine::ParseError<Input::Token, Input::Range, Input::Position>,
{
    (expression(), punct(";")).map(|(expression, semi)| {
        let span = expression.span().merge(semi);
        Statement::Expression { expression, span }
    })
}

combine::parser! {
    fn if_statement[Input]()(Input) -> Statement
    where [Input: Stream<Token = char, Position = usize>]
    {
        (
            keyword("if"),
            expression(),
            block(),
            optional(keyword("else").with(choice((
                if_statement().map(|nested| ElseBranch::If(Box::new(nested))),
                block().map(ElseBranch::Block),
            )))),
        )
            .map(|(if_span, condition, then_block, else_branch)| {
                let end = else_branch
                    .as_ref()
                    .map(|branch: &ElseBranch| branch.span())
                    .unwrap_or(then_block.span);
                Statement::If {
                    condition,
                    then_block,
                    else_branch,
                    span: if_span.merge(end),
                }
            })
    }
}

fn while_statement<Input>() -> impl Parser<Input, Output = Statement>
where
    Input: Stream<Token = char, Position = usize>,
    Input::Error: combine::ParseError<Input::Token, Input::Range, Input::Position>,
{
    (keyword("while"), expression(), block()).map(|(while_span, condition, body)| {
        let span = while_span.merge(body.span);
        Statement::While {
            condition,
            body,
            span,
        }
    })
}

fn for_statement<Input>() -> impl Parser<Input, Output = Statement>
where
    Input: Stream<Token = char, Position = usize>,
    Input::Error: combine::ParseError<Input::Token, Input::Range, Input::Position>,
{
    (
        keyword("for"),
        identifier(),
        keyword("in"),
        expression(),
        choice((punct("..=").map(|_| true), punct("..").map(|_| false))),
        expression(),
        block(),
    )
        .map(
            |(for_span, (variable, _), _, start, inclusive, end, body)| {
                let span = for_span.merge(body.span);
                Statement::For {
                    variable,
                    start,
                    end,
                    inclusive,
                    body,
                    span,
                }
            },
        )
}

fn jump_statement<Input>() -> impl Parser<Input, Output = Statement>
where
    Input: Stream<Token = char, Position = usize>,
    Input::Error: combine::ParseError<Input::Token, Input::Range, Input::Position>,
{
    choice((
        (keyword("break"), punct(";")).map(|(start, semi)| Statement::Break {
            span: start.merge(semi),
        }),
        (keyword("continue"), punct(";")).map(|(start, semi)| Statement::Continue {
            span: start.merge(semi),
        }),
    ))
}

fn return_statement<Input>() -> impl Parser<Input, Output = Statement>
where
    Input: Stream<Token = char, Position = usize>,
    Input::Error: combine::ParseError<Input::Token, Input::Range, Input::Position>,
{
    (keyword("return"), optional(expression()), punct(";")).map(|(start, value, semi)| {
        Statement::Return {
            value,
            span: start.merge(semi),
        }
    })
}

fn make_binary(operator: BinaryOp, left: Expression, right: Expression) -> Expression {
    let span = left.span().merge(right.span());
    Expression::Binary {
        operator,
        left: Box::new(left),
        right: Box::new(right),
        span,
    }
}

fn make_unary(operator: UnaryOp, operator_span: Span, operand: Expression) -> Expression {
    match (operator, operand) {
        (UnaryOp::Neg, Expression::Integer { value, suffix, span }) => Expression::Integer {
            value: -value,
            suffix,
            span: operator_span.merge(span),
        },
        (operator, operand) => {
            let span = operator_span.merge(operand.span());
            Expression::Unary {
                operator,
                operand: Box::new(operand),
                span,
            }
        }
    }
}

/// One left-associative precedence level.
fn binary_level<Input, P, O>(operand: P, operators: O) -> impl Parser<Input, Output = Expression>
where
    Input: Stream<Token = char, Position = usize>,
    Input::Error: combine::ParseError<Input::Token, Input::Range, Input::Position>,
    P: Parser<Input, Output = Expression>,
    O: Parser<Input, Output = BinaryOp>,
{
    chainl1(
        operand,
        operators.map(|operator| {
            move |left: Expression, right: Expression| make_binary(operator, left, right)
        }),
    )
}

combine::parser! {
    pub fn expression[Input]()(Input) -> Expression
    where [Input: Stream<Token = char, Position = usize>]
    {
        binary_level(
            logical_and(),
            operator("||", "").map(|_| BinaryOp::Or),
        )
    }
}

fn logical_and<Input>() -> impl Parser<Input, Output = Expression>
where
    Input: Stream<Token = char, Position = usize>,
    Input::Error: combine::ParseError<Input::Token, Input::Range, Input::Position>,
{
    binary_level(comparison(), operator("&&", "").map(|_| BinaryOp::And))
}

fn comparison<Input>() -> impl Parser<Input, Output = Expression>
where
    Input: Stream<Token = char, Position = usize>,
    Input::Error: combine::ParseError<Input::Token, Input::Range, Input::Position>,
{
    let comparison_operator = choice((
        operator("==", "").map(|_| BinaryOp::Eq),
        operator("!=", "").map(|_| BinaryOp::Ne),
        operator("<=", "").map(|_| BinaryOp::Le),
        operator(">=", "").map(|_| BinaryOp::Ge),
        operator("<", "<=").map(|_| BinaryOp::Lt),
        operator(">", ">=").map(|_| BinaryOp::Gt),
    ));

    (bit_or(), optional((comparison_operator, bit_or()))).map(|(left, rest)| match rest {
        Some((operator, right)) => make_binary(operator, left, right),
        None => left,
    })
}

fn bit_or<Input>() -> impl Parser<Input, Output = Expression>
where
    Input: Stream<Token = char, Position = usize>,
    Input::Error: combine::ParseError<Input::Token, Input::Range, Input::Position>,
{
    binary_level(bit_xor(), operator("|", "|=").map(|_| BinaryOp::BitOr))
}

fn bit_xor<Input>() -> impl Parser<Input, Output = Expression>
where
    Input: Stream<Token = char, Position = usize>,
    Input::Error: combine::ParseError<Input::Token, Input::Range, Input::Position>,
{
    binary_level(bit_and(), operator("^", "=").map(|_| BinaryOp::BitXor))
}

fn bit_and<Input>() -> impl Parser<Input, Output = Expression>
where
    Input: Stream<Token = char, Position = usize>,
    Input::Error: combine::ParseError<Input::Token, Input::Range, Input::Position>,
{
    binary_level(shift(), operator("&", "&=").map(|_| BinaryOp::BitAnd))
}

fn shift<Input>() -> impl Parser<Input, Output = Expression>
where
    Input: Stream<Token = char, Position = usize>,
    Input::Error: combine::ParseError<Input::Token, Input::Range, Input::Position>,
{
    binary_level(
        additive(),
        choice((
            operator("<<", "=").map(|_| BinaryOp::Shl),
            operator(">>", "=").map(|_| BinaryOp::Shr),
        )),
    )
}

fn additive<Input>() -> impl Parser<Input, Output = Expression>
where
    Input: Stream<Token = char, Position = usize>,
    Input::Error: combine::ParseError<Input::Token, Input::Range, Input::Position>,
{
    binary_level(
        multiplicative(),
        choice((
            operator("+", "=").map(|_| BinaryOp::Add),
            operator("-", "=>").map(|_| BinaryOp::Sub),
        )),
    )
}

fn multiplicative<Input>() -> impl Parser<Input, Output = Expression>
where
    Input: Stream<Token = char, Position = usize>,
    Input::Error: combine::ParseError<Input::Token, Input::Range, Input::Position>,
{
    binary_level(
        cast(),
        choice((
            operator("*", "=").map(|_| BinaryOp::Mul),
            operator("/", "=").map(|_| BinaryOp::Div),
            operator("%", "=").map(|_| BinaryOp::Rem),
        )),
    )
}

fn cast<Input>() -> impl Parser<Input, Output = Expression>
where
    Input: Stream<Token = char, Position = usize>,
    Input::Error: combine::ParseError<Input::Token, Input::Range, Input::Position>,
{
    (unary(), many(keyword("as").with(type_name()))).map(
        |(operand, targets): (Expression, Vec<TypeName>)| {
            targets.into_iter().fold(operand, |expression, target| {
                let span = expression.span().merge(target.span);
                Expression::Cast {
                    expression: Box::new(expression),
                    target,
                    span,
                }
            })
        },
    )
}

combine::parser! {
    fn unary[Input]()(Input) -> Expression
    where [Input: Stream<Token = char, Position = usize>]
    {
        choice((
            (unary_operator(), unary())
                .map(|((operator, span), operand)| make_unary(operator, span, operand)),
            primary(),
        ))
    }
}

fn unary_operator<Input>() -> impl Parser<Input, Output = (UnaryOp, Span)>
where
    Input: Stream<Token = char, Position = usize>,
    Input::Error: combine::ParseError<Input::Token, Input::Range, Input::Position>,
{
    choice((
        operator("-", "=").map(|span| (UnaryOp::Neg, span)),
        operator("!", "=").map(|span| (UnaryOp::Not, span)),
    ))
}

fn primary<Input>() -> impl Parser<Input, Output = Expression>
where
    Input: Stream<Token = char, Position = usize>,
    Input::Error: combine::ParseError<Input::Token, Input::Range, Input::Position>,
{
    choice((
        integer_literal(),
        char_literal(),
        keyword("true").map(|span| Expression::Boolean { value: true, span }),
        keyword("false").map(|span| Expression::Boolean { value: false, span }),
        call_or_variable(),
        between(punct("("), punct(")"), expression()),
    ))
}

/// `crate::` or one or more `super::` in front of a call path.
fn path_anchor<Input>() -> impl Parser<Input, Output = (PathAnchor, Span)>
where
    Input: Stream<Token = char, Position = usize>,
    Input::Error: combine::ParseError<Input::Token, Input::Range, Input::Position>,
{
    choice((
        keyword("crate")
            .skip(punct("::"))
            .map(|span| (PathAnchor::Crate, span)),
        (
            keyword("super"),
            many(attempt(punct("::").with(keyword("super")))),
            punct("::"),
        )
            .map(|(first, rest, _): (Span, Vec<Span>, Span)| {
                (PathAnchor::Super(1 + rest.len()), first)
            }),
    ))
}

fn call_or_variable<Input>() -> impl Parser<Input, Output = Expression>
where
    Input: Stream<Token = char, Position = usize>,
    Input::Error: combine::ParseError<Input::Token, Input::Range, Input::Position>,
{
    (
        optional(path_anchor()),
        identifier(),
        many(attempt(punct("::").with(identifier()))),
        optional((
            punct("("),
            sep_by(expression(), punct(",")),
            punct(")"),
        )),
    )
        .and_then(
            |(anchor, (name, name_span), rest, call): (
                Option<(PathAnchor, Span)>,
                (String, Span),
                Vec<(String, Span)>,
                Option<(Span, Vec<Expression>, Span)>,
            )| {
                let start = anchor.map_or(name_span, |(_, span)| span);
                let mut segments = vec![name];
                segments.extend(rest.into_iter().map(|(segment, _)| segment));
                let path = CallPath {
                    anchor: anchor.map_or(PathAnchor::Local, |(anchor, _)| anchor),
                    segments,
                };

                match call {
                    Some((_, arguments, close)) => Ok(Expression::Call {
                        function: path,
                        arguments,
                        span: start.merge(close),
                    }),
                    None if path.anchor == PathAnchor::Local && path.segments.len() == 1 => {
                        Ok(Expression::Variable {
                            name: path.name().to_string(),
                            span: name_span,
                        })
                    }
                    None => Err(StreamErrorFor::<Input>::message_format(format!(
                        "path `{}` must be called",
                        path
                    ))),
                }
            },
        )
}

fn integer_literal<Input>() -> impl Parser<Input, Output = Expression>
where
    Input: Stream<Token = char, Position = usize>,
    Input::Error: combine::ParseError<Input::Token, Input::Range, Input::Position>,
{
    lexeme(
        (
            digit(),
            many(satisfy(|c: char| c.is_ascii_alphanumeric() || c == '_')),
        )
            .map(|(first, rest): (char, String)| format!("{}{}", first, rest))
            .and_then(|text: String| {
                parse_integer(&text).map_err(|message| StreamErrorFor::<Input>::message_format(message))
            }),
    )
    .map(|((value, suffix), span)| Expression::Integer {
        value,
        suffix,
        span,
    })
}

/// Splits a literal such as `0xffu8` into its magnitude and optional suffix.
pub fn parse_integer(text: &str) -> Result<(i128, Option<IntType>), String> {
    let (body, suffix) = IntType::ALL
        .into_iter()
        .find_map(|ty| text.strip_suffix(ty.name()).map(|body| (body, Some(ty))))
        .unwrap_or((text, None));

    let (digits, radix) = if let Some(rest) = body.strip_prefix("0x") {
        (rest, 16)
    } else if let Some(rest) = body.strip_prefix("0o") {
        (rest, 8)
    } else if let Some(rest) = body.strip_prefix("0b") {
        (rest, 2)
    } else {
        (body, 10)
    };

    let cleaned: String = digits.chars().filter(|c| *c != '_').collect();
    if cleaned.is_empty() {
        return Err(format!("integer literal `{}` has no digits", text));
    }

    let value = u64::from_str_radix(&cleaned, radix).map_err(|err| match err.kind() {
        IntErrorKind::PosOverflow => format!("integer literal `{}` is too large", text),
        _ => format!("invalid digit in integer literal `{}`", text),
    })?;

    Ok((value as i128, suffix))
}

fn char_literal<Input>() -> impl Parser<Input, Output = Expression>
where
    Input: Stream<Token = char, Position = usize>,
    Input::Error: combine::ParseError<Input::Token, Input::Range, Input::Position>,
{
    lexeme(between(
        char('\''),
        char('\''),
        choice((
            char('\\').with(escape_sequence()),
            satisfy(|c: char| c != '\'' && c != '\\' && c != '\n'),
        )),
    ))
    .map(|(value, span)| Expression::Char { value, span })
}

fn escape_sequence<Input>() -> impl Parser<Input, Output = char>
where
    Input: Stream<Token = char>,
    Input::Error: combine::ParseError<Input::Token, Input::Range, Input::Position>,
{
    choice((
        char('n').map(|_| '\n'),
        char('r').map(|_| '\r'),
        char('t').map(|_| '\t'),
        char('0').map(|_| '\0'),
        char('\\'),
        char('\''),
        char('"'),
        char('u')
            .with(between(
                char('{'),
                char('}'),
                many1(satisfy(|c: char| c.is_ascii_hexdigit())),
            ))
            .and_then(|digits: String| {
                u32::from_str_radix(&digits, 16)
                    .ok()
                    .and_then(char::from_u32)
                    .ok_or_else(|| {
                        StreamErrorFor::<Input>::message_format(format!(
                            "`\\u{{{}}}` is not a Unicode scalar value",
                            digits
                        ))
                    })
            }),
    ))
}
