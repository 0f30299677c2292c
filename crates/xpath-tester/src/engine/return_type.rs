//! Static result type of an XPath 1.0 expression.
//!
//! `sxd-xpath` does not report what a compiled expression will return, so the
//! adapter judges it from the outermost operator or primary expression, the
//! same way a compiler assigns a return type before evaluation. Only the token
//! structure is inspected; anything that does not tokenize is reported as
//! [`ResultType::Any`] and left for the real compiler to reject.

use super::ResultType;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Op {
    Or,
    And,
    Equality,
    Relational,
    Add,
    Sub,
    Mul,
    Neg,
    Union,
    Slash,
}

impl Op {
    fn precedence(self) -> u8 {
        match self {
            Op::Or => 1,
            Op::And => 2,
            Op::Equality => 3,
            Op::Relational => 4,
            Op::Add | Op::Sub => 5,
            Op::Mul => 6,
            Op::Neg => 7,
            Op::Union => 8,
            Op::Slash => 9,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Tok<'a> {
    Literal,
    Number,
    Variable,
    Name(&'a str),
    Open(char),
    Close(char),
    Op(Op),
    Punct(&'a str),
}

/// Infers the declared result type of `expression`.
pub fn infer(expression: &str) -> ResultType {
    match tokenize(expression) {
        Some(tokens) => infer_tokens(&tokens),
        None => ResultType::Any,
    }
}

fn infer_tokens(tokens: &[Tok<'_>]) -> ResultType {
    if tokens.is_empty() {
        return ResultType::Any;
    }
    let mut depth = 0usize;
    let mut lowest: Option<Op> = None;
    for tok in tokens {
        match tok {
            Tok::Open(_) => depth += 1,
            Tok::Close(_) => depth = depth.saturating_sub(1),
            Tok::Op(op) if depth == 0 => {
                if lowest.is_none_or(|current| op.precedence() < current.precedence()) {
                    lowest = Some(*op);
                }
            }
            _ => {}
        }
    }
    match lowest {
        Some(Op::Or | Op::And | Op::Equality | Op::Relational) => ResultType::Boolean,
        Some(Op::Add | Op::Sub | Op::Mul | Op::Neg) => ResultType::Number,
        Some(Op::Union | Op::Slash) => ResultType::NodeSet,
        None => infer_primary(tokens),
    }
}

fn infer_primary(tokens: &[Tok<'_>]) -> ResultType {
    match tokens {
        [Tok::Literal] => ResultType::String,
        [Tok::Number] => ResultType::Number,
        [Tok::Variable] => ResultType::Any,
        [Tok::Open('('), inner @ .., Tok::Close(')')] if group_spans_all(tokens) => infer_tokens(inner),
        [Tok::Name(name), rest @ ..] if !is_node_type(name) && group_spans_all(rest) => function_type(name),
        _ => ResultType::NodeSet,
    }
}

/// True when `tokens` is a single parenthesized group.
fn group_spans_all(tokens: &[Tok<'_>]) -> bool {
    if tokens.first() != Some(&Tok::Open('(')) {
        return false;
    }
    let mut depth = 0usize;
    for (index, tok) in tokens.iter().enumerate() {
        match tok {
            Tok::Open(_) => depth += 1,
            Tok::Close(_) => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return index == tokens.len() - 1;
                }
            }
            _ => {}
        }
    }
    false
}

fn is_node_type(name: &str) -> bool {
    matches!(name, "node" | "text" | "comment" | "processing-instruction")
}

fn function_type(name: &str) -> ResultType {
    match name {
        "last" | "position" | "count" | "string-length" | "number" | "sum" | "floor"
        | "ceiling" | "round" => ResultType::Number,
        "local-name" | "namespace-uri" | "name" | "string" | "concat" | "substring-before"
        | "substring-after" | "substring" | "normalize-space" | "translate" => ResultType::String,
        "starts-with" | "contains" | "boolean" | "not" | "true" | "false" | "lang" => {
            ResultType::Boolean
        }
        "id" => ResultType::NodeSet,
        _ => ResultType::Any,
    }
}

/// A `*` or an operator name is an operator only after a token that can end an operand.
fn operator_allowed(prev: Option<&Tok<'_>>) -> bool {
    match prev {
        None | Some(Tok::Op(_) | Tok::Open(_)) => false,
        Some(Tok::Punct(p)) => !matches!(*p, "@" | "::" | ","),
        Some(_) => true,
    }
}

fn is_name_start(ch: char) -> bool {
    ch.is_alphabetic() || ch == '_'
}

fn is_name_char(ch: char) -> bool {
    ch.is_alphanumeric() || matches!(ch, '_' | '-' | '.')
}

/// Length in bytes of the (optionally prefixed) name at the start of `input`.
fn name_len(input: &str) -> usize {
    let local = |s: &str| s.char_indices().find(|&(_, c)| !is_name_char(c)).map_or(s.len(), |(i, _)| i);
    let mut len = local(input);
    let rest = &input[len..];
    if let Some(after) = rest.strip_prefix(':')
        && !after.starts_with(':')
    {
        if after.starts_with('*') {
            len += 2;
        } else if after.chars().next().is_some_and(is_name_start) {
            len += 1 + local(after);
        }
    }
    len
}

fn tokenize(expression: &str) -> Option<Vec<Tok<'_>>> {
    let mut tokens: Vec<Tok<'_>> = Vec::new();
    let mut rest = expression;
    loop {
        rest = rest.trim_start();
        let Some(ch) = rest.chars().next() else { break };
        let operator_position = operator_allowed(tokens.last());
        let (tok, len) = match ch {
            '\'' | '"' => {
                let end = rest[1..].find(ch)?;
                (Tok::Literal, end + 2)
            }
            '0'..='9' => (Tok::Number, number_len(rest)),
            '.' if rest[1..].starts_with(|c: char| c.is_ascii_digit()) => {
                (Tok::Number, number_len(rest))
            }
            '.' if rest.starts_with("..") => (Tok::Punct(".."), 2),
            '.' => (Tok::Punct("."), 1),
            '$' => {
                let len = name_len(&rest[1..]);
                if len == 0 {
                    return None;
                }
                (Tok::Variable, len + 1)
            }
            '(' | '[' => (Tok::Open(ch), 1),
            ')' | ']' => (Tok::Close(ch), 1),
            ',' => (Tok::Punct(","), 1),
            '@' => (Tok::Punct("@"), 1),
            ':' if rest.starts_with("::") => (Tok::Punct("::"), 2),
            '/' if rest.starts_with("//") => (Tok::Op(Op::Slash), 2),
            '/' => (Tok::Op(Op::Slash), 1),
            '|' => (Tok::Op(Op::Union), 1),
            '+' => (Tok::Op(Op::Add), 1),
            '-' if operator_position => (Tok::Op(Op::Sub), 1),
            '-' => (Tok::Op(Op::Neg), 1),
            '=' => (Tok::Op(Op::Equality), 1),
            '!' if rest.starts_with("!=") => (Tok::Op(Op::Equality), 2),
            '<' | '>' if rest[1..].starts_with('=') => (Tok::Op(Op::Relational), 2),
            '<' | '>' => (Tok::Op(Op::Relational), 1),
            '*' if operator_position => (Tok::Op(Op::Mul), 1),
            '*' => (Tok::Punct("*"), 1),
            c if is_name_start(c) => {
                let len = name_len(rest);
                let name = &rest[..len];
                let tok = match name {
                    "or" if operator_position => Tok::Op(Op::Or),
                    "and" if operator_position => Tok::Op(Op::And),
                    "div" | "mod" if operator_position => Tok::Op(Op::Mul),
                    _ => Tok::Name(name),
                };
                (tok, len)
            }
            _ => return None,
        };
        tokens.push(tok);
        rest = &rest[len..];
    }
    Some(tokens)
}

fn number_len(input: &str) -> usize {
    input.char_indices().find(|&(_, c)| !(c.is_ascii_digit() || c == '.')).map_or(input.len(), |(i, _)| i)
}
