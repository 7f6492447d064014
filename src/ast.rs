//! Syntax tree produced by [`crate::parser`].
//!
//! `Display` renders a node in a compact prefix notation, e.g. `a + 3 * b` prints
//! as `(+ a (* 3 b))`. The rendering is stable and is what `feel --ast` shows.

use std::fmt;
use std::sync::Arc;

use crate::number::Number;
use crate::value::write_quoted;

/// Byte offsets of a node in its source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Number(Number),
    Bool(bool),
    Null,
    String(String),
    /// Body of an `@"..."` literal, parsed when evaluated.
    Temporal(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Lt,
    Le,
    Gt,
    Ge,
    Eq,
    Ne,
    And,
    Or,
    Index,
    In,
}

impl BinOp {
    pub fn as_str(self) -> &'static str {
        match self {
            BinOp::Add => "+",
            BinOp::Sub => "-",
            BinOp::Mul => "*",
            BinOp::Div => "/",
            BinOp::Mod => "%",
            BinOp::Lt => "<",
            BinOp::Le => "<=",
            BinOp::Gt => ">",
            BinOp::Ge => ">=",
            BinOp::Eq => "=",
            BinOp::Ne => "!=",
            BinOp::And => "and",
            BinOp::Or => "or",
            BinOp::Index => "[]",
            BinOp::In => "in",
        }
    }
}

/// Call arguments are either all positional or all keyword.
#[derive(Debug, Clone, PartialEq)]
pub enum CallArgs {
    Positional(Vec<Node>),
    Keyword(Vec<(String, Node)>),
}

impl CallArgs {
    pub fn len(&self) -> usize {
        match self {
            CallArgs::Positional(args) => args.len(),
            CallArgs::Keyword(args) => args.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Literal(Literal),
    Var(String),
    Binop {
        op: BinOp,
        left: Box<Node>,
        right: Box<Node>,
    },
    Dot {
        left: Box<Node>,
        attr: String,
    },
    Call {
        callee: Box<Node>,
        args: CallArgs,
    },
    /// The body is shared with every function value created from this definition.
    FunDef {
        params: Vec<String>,
        body: Arc<Node>,
    },
    If {
        cond: Box<Node>,
        then: Box<Node>,
        otherwise: Box<Node>,
    },
    /// `for a in x, b in y return e` nests as `For(a, x, For(b, y, e))`.
    For {
        var: String,
        list: Box<Node>,
        body: Box<Node>,
    },
    Some {
        var: String,
        list: Box<Node>,
        filter: Box<Node>,
    },
    Every {
        var: String,
        list: Box<Node>,
        filter: Box<Node>,
    },
    Range {
        start: Box<Node>,
        start_open: bool,
        end: Box<Node>,
        end_open: bool,
    },
    Array(Vec<Node>),
    Context(Vec<(String, Node)>),
    ExprList(Vec<Node>),
    MultiTests(Vec<Node>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub expr: Expr,
    pub span: Span,
}

impl Node {
    pub fn new(expr: Expr, span: Span) -> Self {
        Node { expr, span }
    }

    pub fn boxed(self) -> Box<Node> {
        Box::new(self)
    }
}

fn write_joined(f: &mut fmt::Formatter<'_>, nodes: &[Node], sep: &str) -> fmt::Result {
    for (i, node) in nodes.iter().enumerate() {
        if i > 0 {
            write!(f, "{sep}")?;
        }
        write!(f, "{node}")?;
    }
    Ok(())
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Literal::Number(n) => write!(f, "{n}"),
            Literal::Bool(b) => write!(f, "{b}"),
            Literal::Null => write!(f, "null"),
            Literal::String(s) => write_quoted(f, s),
            Literal::Temporal(s) => {
                write!(f, "@")?;
                write_quoted(f, s)
            }
        }
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.expr {
            Expr::Literal(literal) => write!(f, "{literal}"),
            Expr::Var(name) if name.contains(' ') => write!(f, "`{name}`"),
            Expr::Var(name) => write!(f, "{name}"),
            Expr::Binop { op, left, right } => write!(f, "({} {left} {right})", op.as_str()),
            Expr::Dot { left, attr } => write!(f, "(. {left} {attr})"),
            Expr::Call { callee, args } => {
                write!(f, "(call {callee} [")?;
                match args {
                    CallArgs::Positional(args) => write_joined(f, args, ", ")?,
                    CallArgs::Keyword(args) => {
                        for (i, (name, arg)) in args.iter().enumerate() {
                            if i > 0 {
                                write!(f, ", ")?;
                            }
                            write!(f, "({name} {arg})")?;
                        }
                    }
                }
                write!(f, "])")
            }
            Expr::FunDef { params, body } => write!(f, "(function [{}] {body})", params.join(", ")),
            Expr::If {
                cond,
                then,
                otherwise,
            } => write!(f, "(if {cond} {then} {otherwise})"),
            Expr::For { var, list, body } => write!(f, "(for {var} {list} {body})"),
            Expr::Some { var, list, filter } => write!(f, "(some \"{var}\" {list} {filter})"),
            Expr::Every { var, list, filter } => write!(f, "(every \"{var}\" {list} {filter})"),
            Expr::Range {
                start,
                start_open,
                end,
                end_open,
            } => {
                let open = if *start_open { '(' } else { '[' };
                let close = if *end_open { ')' } else { ']' };
                write!(f, "{open}{start}..{end}{close}")
            }
            Expr::Array(items) => {
                write!(f, "[")?;
                write_joined(f, items, ", ")?;
                write!(f, "]")
            }
            Expr::Context(entries) => {
                write!(f, "(map")?;
                for (key, value) in entries {
                    write!(f, " (")?;
                    write_quoted(f, key)?;
                    write!(f, " {value})")?;
                }
                write!(f, ")")
            }
            Expr::ExprList(nodes) => {
                write!(f, "(explist ")?;
                write_joined(f, nodes, " ")?;
                write!(f, ")")
            }
            Expr::MultiTests(nodes) => {
                write!(f, "(multitests ")?;
                write_joined(f, nodes, " ")?;
                write!(f, ")")
            }
        }
    }
}
