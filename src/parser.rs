//! Parser for the expression language, built from `nom` combinators.
//!
//! The grammar, from loosest to tightest binding:
//!
//! ```text
//! program     := unary_tests (';' unary_tests)*
//! unary_tests := test (',' test)*
//! test        := ('<' | '<=' | '>' | '>=' | '=' | '!=') simple_value | expression
//! expression  := disjunction ('in' disjunction)*
//! disjunction := conjunction ('or' conjunction)*
//! conjunction := comparison ('and' comparison)*
//! comparison  := additive (('<' | '<=' | '>' | '>=' | '=' | '!=') additive)*
//! additive    := multiplicative (('+' | '-') multiplicative)*
//! multiplicative := postfix (('*' | '/' | '%') postfix)*
//! postfix     := primary ('(' args ')' | '[' expression ']' | '.' name)*
//! ```
//!
//! Names may span several words (`string length`, `insert before`); a keyword ends
//! a name. Whitespace, `// line` and `/* block */` comments may appear between any
//! two tokens.

use std::cmp::Ordering;
use std::sync::Arc;

use nom::{
    IResult,
    branch::alt,
    bytes::complete::{tag, take_while},
    character::complete::{char, digit1, satisfy},
    combinator::{cut, map, not, opt, peek, recognize, value, verify},
    error::{ContextError, ErrorKind, ParseError as NomParseError, context},
    multi::{many0, separated_list0, separated_list1},
    sequence::{pair, preceded, terminated},
};

use crate::ParseError;
use crate::ast::{BinOp, CallArgs, Expr, Literal, Node, Span};
use crate::number::Number;

const KEYWORDS: &[&str] = &[
    "true",
    "false",
    "null",
    "and",
    "or",
    "function",
    "if",
    "then",
    "else",
    "for",
    "some",
    "every",
    "in",
    "return",
    "satisfies",
];

/// Error carried through the combinators: the furthest failure position, what would
/// have been accepted there, and the grammar rules that were active.
#[derive(Debug, Clone, PartialEq)]
struct SyntaxError<'a> {
    input: &'a str,
    expected: Vec<String>,
    trace: Vec<&'static str>,
}

impl<'a> NomParseError<&'a str> for SyntaxError<'a> {
    fn from_error_kind(input: &'a str, _kind: ErrorKind) -> Self {
        SyntaxError {
            input,
            expected: Vec::new(),
            trace: Vec::new(),
        }
    }

    fn append(_input: &'a str, _kind: ErrorKind, other: Self) -> Self {
        other
    }

    fn from_char(input: &'a str, c: char) -> Self {
        SyntaxError {
            input,
            expected: vec![format!("'{c}'")],
            trace: Vec::new(),
        }
    }

    /// Keeps whichever alternative got further, merging expectations on a tie.
    fn or(self, other: Self) -> Self {
        match self.input.len().cmp(&other.input.len()) {
            Ordering::Less => self,
            Ordering::Greater => other,
            Ordering::Equal => {
                let mut merged = other;
                for expected in self.expected {
                    if !merged.expected.contains(&expected) {
                        merged.expected.push(expected);
                    }
                }
                merged
            }
        }
    }
}

impl<'a> ContextError<&'a str> for SyntaxError<'a> {
    fn add_context(_input: &'a str, ctx: &'static str, mut other: Self) -> Self {
        other.trace.push(ctx);
        other
    }
}

type PResult<'a, T> = IResult<&'a str, T, SyntaxError<'a>>;

fn failure<'a, T>(input: &'a str, expected: &str) -> PResult<'a, T> {
    Err(nom::Err::Failure(SyntaxError {
        input,
        expected: vec![expected.to_string()],
        trace: Vec::new(),
    }))
}

/// Skips whitespace and comments. An unterminated block comment runs to the end.
fn ws(mut input: &str) -> PResult<'_, ()> {
    loop {
        let trimmed = input.trim_start();
        if let Some(rest) = trimmed.strip_prefix("//") {
            input = rest.find('\n').map_or("", |at| &rest[at + 1..]);
        } else if let Some(rest) = trimmed.strip_prefix("/*") {
            input = rest.find("*/").map_or("", |at| &rest[at + 2..]);
        } else {
            return Ok((trimmed, ()));
        }
    }
}

/// Labels a failure that happens before `parser` consumed anything with `label`.
fn expecting<'a, O>(
    label: &'static str,
    mut parser: impl FnMut(&'a str) -> PResult<'a, O>,
) -> impl FnMut(&'a str) -> PResult<'a, O> {
    move |input: &'a str| {
        let start = ws(input).map_or(input, |(rest, _)| rest);
        parser(input).map_err(|err| match err {
            nom::Err::Error(mut e) if e.input.len() >= start.len() => {
                e.expected = vec![label.to_string()];
                nom::Err::Error(e)
            }
            other => other,
        })
    }
}

fn sym<'a>(c: char) -> impl FnMut(&'a str) -> PResult<'a, char> {
    preceded(ws, char(c))
}

fn op<'a>(token: &'static str) -> impl FnMut(&'a str) -> PResult<'a, &'a str> {
    preceded(ws, tag(token))
}

fn is_word_start(c: char) -> bool {
    c.is_alphabetic() || c == '_' || c == '$'
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '$'
}

fn keyword<'a>(kw: &'static str) -> impl FnMut(&'a str) -> PResult<'a, &'a str> {
    preceded(ws, terminated(tag(kw), not(satisfy(is_word_char))))
}

fn expect_keyword<'a>(kw: &'static str) -> impl FnMut(&'a str) -> PResult<'a, &'a str> {
    expecting(kw, keyword(kw))
}

fn word(input: &str) -> PResult<'_, &str> {
    recognize(pair(satisfy(is_word_start), take_while(is_word_char)))(input)
}

fn plain_word(input: &str) -> PResult<'_, &str> {
    preceded(ws, verify(word, |w: &str| !KEYWORDS.contains(&w)))(input)
}

/// One or more non-keyword words joined by single spaces.
fn name(input: &str) -> PResult<'_, String> {
    let (input, _) = ws(input)?;
    let date_and_time: PResult<'_, &str> =
        terminated(tag("date and time"), not(satisfy(is_word_char)))(input);
    if let Ok((rest, _)) = date_and_time {
        return Ok((rest, "date and time".to_string()));
    }
    let (mut input, first) = expecting("name", plain_word)(input)?;
    let mut words = vec![first];
    while let Ok((rest, next)) = plain_word(input) {
        words.push(next);
        input = rest;
    }
    Ok((input, words.join(" ")))
}

fn number(input: &str) -> PResult<'_, Number> {
    let (rest, digits) = recognize(pair(digit1, opt(pair(char('.'), digit1))))(input)?;
    match digits.parse() {
        Ok(n) => Ok((rest, n)),
        Err(_) => failure(input, "number"),
    }
}

/// Body of a double-quoted string, with `\n \t \r \" \\` escapes.
fn string_literal(input: &str) -> PResult<'_, String> {
    let (rest, _) = char('"')(input)?;
    let mut text = String::new();
    let mut chars = rest.char_indices();
    while let Some((at, c)) = chars.next() {
        match c {
            '"' => return Ok((&rest[at + 1..], text)),
            '\\' => match chars.next() {
                Some((_, escaped)) => text.push(match escaped {
                    'n' => '\n',
                    't' => '\t',
                    'r' => '\r',
                    other => other,
                }),
                None => break,
            },
            c => text.push(c),
        }
    }
    failure(&rest[rest.len()..], "'\"'")
}

fn comparison_op(input: &str) -> PResult<'_, BinOp> {
    alt((
        value(BinOp::Le, tag("<=")),
        value(BinOp::Ge, tag(">=")),
        value(BinOp::Ne, tag("!=")),
        value(BinOp::Lt, tag("<")),
        value(BinOp::Gt, tag(">")),
        value(BinOp::Eq, terminated(tag("="), not(char('>')))),
    ))(input)
}

fn fold_binops(first: Node, rest: Vec<(BinOp, Node)>) -> Node {
    rest.into_iter().fold(first, |left, (op, right)| {
        let span = Span {
            start: left.span.start,
            end: right.span.end,
        };
        Node::new(
            Expr::Binop {
                op,
                left: left.boxed(),
                right: right.boxed(),
            },
            span,
        )
    })
}

fn first_duplicate(names: &[String]) -> Option<&String> {
    names
        .iter()
        .enumerate()
        .find(|(i, name)| names[..*i].contains(name))
        .map(|(_, name)| name)
}

struct Grammar<'a> {
    source: &'a str,
}

impl<'a> Grammar<'a> {
    fn offset(&self, rest: &str) -> usize {
        self.source.len() - rest.len()
    }

    fn span(&self, start: &str, end: &str) -> Span {
        Span {
            start: self.offset(start),
            end: self.offset(end),
        }
    }

    fn line_column(&self, rest: &str) -> (usize, usize) {
        let before = self.source.get(..self.offset(rest)).unwrap_or(self.source);
        let line = before.matches('\n').count() + 1;
        let column = before.rsplit('\n').next().map_or(0, |l| l.chars().count()) + 1;
        (line, column)
    }

    fn unexpected(&self, err: SyntaxError<'a>) -> ParseError {
        let (line, column) = self.line_column(err.input);
        let found = match err.input.chars().next() {
            None => "end of input".to_string(),
            Some(c) if is_word_start(c) => {
                format!("'{}'", word(err.input).map_or(err.input, |(_, w)| w))
            }
            Some(c) if c.is_ascii_digit() => {
                let digits = err.input.bytes().take_while(u8::is_ascii_digit).count();
                format!("'{}'", &err.input[..digits])
            }
            Some(c) => format!("'{c}'"),
        };
        ParseError::UnexpectedToken {
            found,
            line,
            column,
            expected: err.expected,
            trace: err.trace.iter().map(|rule| rule.to_string()).collect(),
        }
    }

    fn program(&self, input: &'a str) -> PResult<'a, Node> {
        let (input, _) = ws(input)?;
        let start = input;
        let (input, mut tests) = separated_list0(sym(';'), |i: &'a str| self.unary_tests(i))(input)?;
        let (input, _) = opt(sym(';'))(input)?;
        let (input, _) = ws(input)?;
        let node = if tests.len() == 1 {
            tests.remove(0)
        } else {
            Node::new(Expr::ExprList(tests), self.span(start, input))
        };
        Ok((input, node))
    }

    fn unary_tests(&self, input: &'a str) -> PResult<'a, Node> {
        let (input, _) = ws(input)?;
        let start = input;
        let (input, first) = self.test(input)?;
        let (input, rest) = many0(preceded(sym(','), cut(|i: &'a str| self.test(i))))(input)?;
        if rest.is_empty() {
            return Ok((input, first));
        }
        let mut tests = vec![first];
        tests.extend(rest);
        Ok((input, Node::new(Expr::MultiTests(tests), self.span(start, input))))
    }

    /// A comparison with an implicit left operand (`> 5` is `? > 5`), or an expression.
    fn test(&self, input: &'a str) -> PResult<'a, Node> {
        let (input, _) = ws(input)?;
        let start = input;
        let Ok((rest, op)) = comparison_op(input) else {
            return self.expression(input);
        };
        let (rest, right) = context("unary test", cut(|i: &'a str| self.simple_value(i)))(rest)?;
        let implicit = Node::new(Expr::Var("?".to_string()), self.span(start, start));
        let node = Node::new(
            Expr::Binop {
                op,
                left: implicit.boxed(),
                right: right.boxed(),
            },
            self.span(start, rest),
        );
        Ok((rest, node))
    }

    fn simple_value(&self, input: &'a str) -> PResult<'a, Node> {
        let (input, _) = ws(input)?;
        let start = input;
        let (rest, expr) = expecting(
            "value",
            alt((|i: &'a str| self.literal(i), map(name, Expr::Var))),
        )(input)?;
        Ok((rest, Node::new(expr, self.span(start, rest))))
    }

    fn expression(&self, input: &'a str) -> PResult<'a, Node> {
        let (input, first) = self.disjunction(input)?;
        let (input, rest) = many0(pair(
            value(BinOp::In, keyword("in")),
            cut(|i: &'a str| self.disjunction(i)),
        ))(input)?;
        Ok((input, fold_binops(first, rest)))
    }

    fn disjunction(&self, input: &'a str) -> PResult<'a, Node> {
        let (input, first) = self.conjunction(input)?;
        let (input, rest) = many0(pair(
            value(BinOp::Or, keyword("or")),
            cut(|i: &'a str| self.conjunction(i)),
        ))(input)?;
        Ok((input, fold_binops(first, rest)))
    }

    fn conjunction(&self, input: &'a str) -> PResult<'a, Node> {
        let (input, first) = self.comparison(input)?;
        let (input, rest) = many0(pair(
            value(BinOp::And, keyword("and")),
            cut(|i: &'a str| self.comparison(i)),
        ))(input)?;
        Ok((input, fold_binops(first, rest)))
    }

    fn comparison(&self, input: &'a str) -> PResult<'a, Node> {
        let (input, first) = self.additive(input)?;
        let (input, rest) = many0(pair(
            preceded(ws, comparison_op),
            cut(|i: &'a str| self.additive(i)),
        ))(input)?;
        Ok((input, fold_binops(first, rest)))
    }

    fn additive(&self, input: &'a str) -> PResult<'a, Node> {
        let (input, first) = self.multiplicative(input)?;
        let (input, rest) = many0(pair(
            alt((value(BinOp::Add, op("+")), value(BinOp::Sub, op("-")))),
            cut(|i: &'a str| self.multiplicative(i)),
        ))(input)?;
        Ok((input, fold_binops(first, rest)))
    }

    fn multiplicative(&self, input: &'a str) -> PResult<'a, Node> {
        let (input, first) = self.postfix(input)?;
        let (input, rest) = many0(pair(
            alt((
                value(BinOp::Mul, op("*")),
                value(BinOp::Div, op("/")),
                value(BinOp::Mod, op("%")),
            )),
            cut(|i: &'a str| self.postfix(i)),
        ))(input)?;
        Ok((input, fold_binops(first, rest)))
    }

    /// Calls, indexing and attribute access, applied left to right.
    fn postfix(&self, input: &'a str) -> PResult<'a, Node> {
        let (mut input, mut node) = self.primary(input)?;
        loop {
            let start = node.span.start;
            let (rest, expr) = if let Ok((rest, _)) = sym('(')(input) {
                let (rest, args) = context("call arguments", cut(|i: &'a str| self.call_args(i)))(rest)?;
                let expr = Expr::Call {
                    callee: node.boxed(),
                    args,
                };
                (rest, expr)
            } else if let Ok((rest, _)) = sym('[')(input) {
                let (rest, index) = context(
                    "index",
                    cut(terminated(|i: &'a str| self.expression(i), sym(']'))),
                )(rest)?;
                let expr = Expr::Binop {
                    op: BinOp::Index,
                    left: node.boxed(),
                    right: index.boxed(),
                };
                (rest, expr)
            } else if let Ok((rest, _)) = terminated(sym('.'), not(char('.')))(input) {
                let (rest, attr) = cut(name)(rest)?;
                let expr = Expr::Dot {
                    left: node.boxed(),
                    attr,
                };
                (rest, expr)
            } else {
                return Ok((input, node));
            };
            node = Node::new(
                expr,
                Span {
                    start,
                    end: self.offset(rest),
                },
            );
            input = rest;
        }
    }

    /// Arguments after the opening parenthesis, through the closing one.
    fn call_args(&self, input: &'a str) -> PResult<'a, CallArgs> {
        let start = ws(input).map_or(input, |(rest, _)| rest);
        if let Ok((input, _)) = sym(')')(input) {
            return Ok((input, CallArgs::Positional(Vec::new())));
        }
        let (input, args) = separated_list1(
            sym(','),
            cut(alt((
                map(
                    pair(terminated(name, sym(':')), |i: &'a str| self.expression(i)),
                    |(key, arg)| (Some(key), arg),
                ),
                map(|i: &'a str| self.expression(i), |arg| (None, arg)),
            ))),
        )(input)?;
        let (input, _) = sym(')')(input)?;

        let keyword_count = args.iter().filter(|(key, _)| key.is_some()).count();
        if keyword_count == 0 {
            let args = args.into_iter().map(|(_, arg)| arg).collect();
            Ok((input, CallArgs::Positional(args)))
        } else if keyword_count == args.len() {
            let args = args
                .into_iter()
                .filter_map(|(key, arg)| key.map(|key| (key, arg)))
                .collect();
            Ok((input, CallArgs::Keyword(args)))
        } else {
            failure(start, "all positional or all keyword arguments")
        }
    }

    fn primary(&self, input: &'a str) -> PResult<'a, Node> {
        let (input, _) = ws(input)?;
        let start = input;
        let (rest, expr) = expecting(
            "expression",
            alt((
                |i: &'a str| self.literal(i),
                |i: &'a str| self.if_expr(i),
                |i: &'a str| self.for_expr(i),
                |i: &'a str| self.quantified(i),
                |i: &'a str| self.fun_def(i),
                |i: &'a str| self.lambda(i),
                |i: &'a str| self.bracket_or_range(i),
                |i: &'a str| self.array_or_range(i),
                |i: &'a str| self.context_literal(i),
                value(Expr::Var("?".to_string()), char('?')),
                map(
                    terminated(alt((keyword("and"), keyword("or"))), peek(sym('('))),
                    |kw: &str| Expr::Var(kw.to_string()),
                ),
                map(name, Expr::Var),
            )),
        )(input)?;
        Ok((rest, Node::new(expr, self.span(start, rest))))
    }

    fn literal(&self, input: &'a str) -> PResult<'a, Expr> {
        map(
            alt((
                map(number, Literal::Number),
                map(preceded(char('-'), number), |n| Literal::Number(n.neg())),
                map(string_literal, Literal::String),
                map(preceded(char('@'), cut(string_literal)), Literal::Temporal),
                value(Literal::Bool(true), keyword("true")),
                value(Literal::Bool(false), keyword("false")),
                value(Literal::Null, keyword("null")),
            )),
            Expr::Literal,
        )(input)
    }

    fn if_expr(&self, input: &'a str) -> PResult<'a, Expr> {
        let (input, _) = keyword("if")(input)?;
        context(
            "if expression",
            cut(|i: &'a str| {
                let (i, cond) = self.expression(i)?;
                let (i, then) = preceded(expect_keyword("then"), |i: &'a str| self.expression(i))(i)?;
                let (i, otherwise) = preceded(expect_keyword("else"), |i: &'a str| self.expression(i))(i)?;
                let expr = Expr::If {
                    cond: cond.boxed(),
                    then: then.boxed(),
                    otherwise: otherwise.boxed(),
                };
                Ok((i, expr))
            }),
        )(input)
    }

    fn iteration_binding(&self, input: &'a str) -> PResult<'a, (String, Node)> {
        pair(
            name,
            preceded(expect_keyword("in"), |i: &'a str| self.expression(i)),
        )(input)
    }

    fn for_expr(&self, input: &'a str) -> PResult<'a, Expr> {
        let (input, _) = keyword("for")(input)?;
        context(
            "for expression",
            cut(|i: &'a str| {
                let (i, (var, list)) = self.iteration_binding(i)?;
                let (i, more) = many0(preceded(sym(','), |i: &'a str| self.iteration_binding(i)))(i)?;
                let (i, body) = preceded(expect_keyword("return"), |i: &'a str| self.expression(i))(i)?;
                let body = more.into_iter().rev().fold(body, |body, (var, list)| {
                    let span = Span {
                        start: list.span.start,
                        end: body.span.end,
                    };
                    let expr = Expr::For {
                        var,
                        list: list.boxed(),
                        body: body.boxed(),
                    };
                    Node::new(expr, span)
                });
                let expr = Expr::For {
                    var,
                    list: list.boxed(),
                    body: body.boxed(),
                };
                Ok((i, expr))
            }),
        )(input)
    }

    /// `some x in l satisfies e` and `every x in l satisfies e`.
    fn quantified(&self, input: &'a str) -> PResult<'a, Expr> {
        let (input, is_some) = alt((value(true, keyword("some")), value(false, keyword("every"))))(input)?;
        context(
            "quantified expression",
            cut(|i: &'a str| {
                let (i, (var, list)) = self.iteration_binding(i)?;
                let (i, filter) = preceded(expect_keyword("satisfies"), |i: &'a str| self.expression(i))(i)?;
                let (list, filter) = (list.boxed(), filter.boxed());
                let expr = if is_some {
                    Expr::Some { var, list, filter }
                } else {
                    Expr::Every { var, list, filter }
                };
                Ok((i, expr))
            }),
        )(input)
    }

    fn params(&self, input: &'a str) -> PResult<'a, Vec<String>> {
        let (input, _) = sym('(')(input)?;
        let (input, params) = separated_list0(sym(','), name)(input)?;
        let (input, _) = sym(')')(input)?;
        Ok((input, params))
    }

    fn function_value(&self, params: Vec<String>, at: &'a str, body: Node) -> PResult<'a, Expr> {
        if let Some(duplicate) = first_duplicate(&params) {
            let position = at.find(duplicate.as_str()).map_or(at, |i| &at[i..]);
            return failure(position, "distinct parameter names");
        }
        Ok((
            at,
            Expr::FunDef {
                params,
                body: Arc::new(body),
            },
        ))
    }

    fn fun_def(&self, input: &'a str) -> PResult<'a, Expr> {
        let (input, _) = keyword("function")(input)?;
        context(
            "function definition",
            cut(|i: &'a str| {
                let (rest, params) = self.params(i)?;
                let (rest, body) = self.expression(rest)?;
                let (_, expr) = self.function_value(params, i, body)?;
                Ok((rest, expr))
            }),
        )(input)
    }

    /// `(a, b) => body` or `a => body`.
    fn lambda(&self, input: &'a str) -> PResult<'a, Expr> {
        let (rest, params) = alt((|i: &'a str| self.params(i), map(name, |n| vec![n])))(input)?;
        let (rest, _) = op("=>")(rest)?;
        let (rest, body) = context("function definition", cut(|i: &'a str| self.expression(i)))(rest)?;
        let (_, expr) = self.function_value(params, input, body)?;
        Ok((rest, expr))
    }

    /// `(expr)`, `(a..b)` or `(a..b]`.
    fn bracket_or_range(&self, input: &'a str) -> PResult<'a, Expr> {
        let (input, _) = char('(')(input)?;
        context(
            "parenthesis",
            cut(|i: &'a str| {
                let (i, first) = self.expression(i)?;
                if let Ok((i, _)) = op("..")(i) {
                    return self.range_rest(i, first, true);
                }
                let (i, _) = sym(')')(i)?;
                Ok((i, first.expr))
            }),
        )(input)
    }

    fn range_rest(&self, input: &'a str, start: Node, start_open: bool) -> PResult<'a, Expr> {
        let (input, end) = self.expression(input)?;
        let (input, close) = alt((sym(')'), sym(']')))(input)?;
        let expr = Expr::Range {
            start: start.boxed(),
            start_open,
            end: end.boxed(),
            end_open: close == ')',
        };
        Ok((input, expr))
    }

    /// `[]`, `[a, b, ...]`, `[a..b]` or `[a..b)`.
    fn array_or_range(&self, input: &'a str) -> PResult<'a, Expr> {
        let (input, _) = char('[')(input)?;
        context(
            "list",
            cut(|i: &'a str| {
                if let Ok((i, _)) = sym(']')(i) {
                    return Ok((i, Expr::Array(Vec::new())));
                }
                let (i, first) = self.expression(i)?;
                if let Ok((i, _)) = op("..")(i) {
                    return self.range_rest(i, first, false);
                }
                let (i, rest) = many0(preceded(sym(','), cut(|i: &'a str| self.expression(i))))(i)?;
                let (i, _) = sym(']')(i)?;
                let mut items = vec![first];
                items.extend(rest);
                Ok((i, Expr::Array(items)))
            }),
        )(input)
    }

    /// `{key: expr, "quoted key": expr}`.
    fn context_literal(&self, input: &'a str) -> PResult<'a, Expr> {
        let (input, _) = char('{')(input)?;
        context(
            "context",
            cut(|i: &'a str| {
                let key = expecting("key", alt((preceded(ws, string_literal), name)));
                let entry = pair(key, preceded(sym(':'), |i: &'a str| self.expression(i)));
                if let Ok((i, _)) = sym('}')(i) {
                    return Ok((i, Expr::Context(Vec::new())));
                }
                let (i, entries) = separated_list1(sym(','), cut(entry))(i)?;
                let (i, _) = sym('}')(i)?;
                Ok((i, Expr::Context(entries)))
            }),
        )(input)
    }
}

/// Parses a complete program. Empty input (or only comments) yields an empty
/// expression list, which evaluates to null.
pub fn parse(source: &str) -> Result<Node, ParseError> {
    let grammar = Grammar { source };
    match grammar.program(source) {
        Ok(("", node)) => Ok(node),
        Ok((rest, _)) => {
            let (line, column) = grammar.line_column(rest);
            Err(ParseError::TrailingInput { line, column })
        }
        Err(nom::Err::Error(e) | nom::Err::Failure(e)) => Err(grammar.unexpected(e)),
        Err(nom::Err::Incomplete(_)) => Err(grammar.unexpected(SyntaxError {
            input: &source[source.len()..],
            expected: Vec::new(),
            trace: Vec::new(),
        })),
    }
}
