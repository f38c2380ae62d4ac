//! Documentation type-expression parser.
//!
//! Turns the annotation mini-grammar used in `:type` / `:rtype:` directives into a [`TypeExpr`]:
//! dotted names, `iter(...)` / `list(...)` / `tuple(...)` generics, and alternation with `or`
//! or `|`. Shapes outside that grammar go through a small fallback expression parser that
//! understands subscriptions such as `Dict[str, int]`.

use std::fmt;

use crate::error::{Result, StubError};
use crate::types::{Generic, Namespaces, Resolved, TypeExpr};

// ---------------------------------------------------------------------------
// Tokenizer
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
enum Token {
    /// Maximal run of ASCII letters and dots.
    Name(String),
    Open,
    Close,
    /// `or` / `|`
    Union,
    Other(char),
}

impl Token {
    fn text(&self) -> String {
        match self {
            Token::Name(n) => n.clone(),
            Token::Open => "(".to_string(),
            Token::Close => ")".to_string(),
            Token::Union => "|".to_string(),
            Token::Other(c) => c.to_string(),
        }
    }
}

fn tokenize(input: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut current = String::new();

    let flush = |current: &mut String, tokens: &mut Vec<Token>| {
        if current.is_empty() {
            return;
        }
        let word = std::mem::take(current);
        tokens.push(if word == "or" { Token::Union } else { Token::Name(word) });
    };

    for c in input.chars() {
        if c.is_ascii_alphabetic() || c == '.' {
            current.push(c);
            continue;
        }
        flush(&mut current, &mut tokens);
        match c {
            '(' => tokens.push(Token::Open),
            ')' => tokens.push(Token::Close),
            '|' => tokens.push(Token::Union),
            c if c.is_whitespace() => {}
            c => tokens.push(Token::Other(c)),
        }
    }
    flush(&mut current, &mut tokens);
    tokens
}

// ---------------------------------------------------------------------------
// Parenthesis grouping
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
enum Node {
    Tok(Token),
    Group(Vec<Node>),
}

fn group(tokens: Vec<Token>, input: &str) -> Result<Vec<Node>> {
    let mut stack: Vec<Vec<Node>> = vec![Vec::new()];
    for token in tokens {
        match token {
            Token::Open => stack.push(Vec::new()),
            Token::Close => {
                if stack.len() == 1 {
                    return Err(StubError::malformed(input, "unmatched ')'"));
                }
                let inner = stack.pop().unwrap_or_default();
                if let Some(parent) = stack.last_mut() {
                    parent.push(Node::Group(inner));
                }
            }
            other => {
                if let Some(top) = stack.last_mut() {
                    top.push(Node::Tok(other));
                }
            }
        }
    }
    if stack.len() != 1 {
        return Err(StubError::malformed(input, "unclosed '('"));
    }
    Ok(stack.pop().unwrap_or_default())
}

// ---------------------------------------------------------------------------
// Public entry point
// ---------------------------------------------------------------------------

/// Parse a documentation type annotation.
///
/// The returned namespaces are the first segments of every dotted reference, which the stub
/// has to import.
pub fn parse_type(input: &str) -> Result<Resolved<TypeExpr>> {
    let input = input.trim();
    let nodes = group(tokenize(input), input)?;
    let mut namespaces = Namespaces::new();
    let expr = parse_sequence(&nodes, input, &mut namespaces)?;
    Ok(Resolved::new(expr, namespaces))
}

fn parse_sequence(nodes: &[Node], input: &str, ns: &mut Namespaces) -> Result<TypeExpr> {
    let alternatives: Vec<&[Node]> =
        nodes.split(|n| matches!(n, Node::Tok(Token::Union))).collect();
    if alternatives.iter().any(|alt| alt.is_empty()) {
        return Err(StubError::malformed(input, "empty alternative"));
    }

    let mut parsed = alternatives
        .into_iter()
        .map(|alt| parse_alternative(alt, input, ns))
        .collect::<Result<Vec<_>>>()?;

    if parsed.len() == 1 {
        Ok(parsed.remove(0))
    } else {
        Ok(TypeExpr::Union(parsed))
    }
}

fn parse_alternative(alt: &[Node], input: &str, ns: &mut Namespaces) -> Result<TypeExpr> {
    match alt {
        [Node::Tok(Token::Name(name))] => dotted_name(name, input, ns),
        [Node::Tok(Token::Name(name)), Node::Group(inner)] => {
            let ctor = Generic::from_doc_name(name).ok_or_else(|| {
                StubError::malformed(input, format!("constructor {name} is not supported"))
            })?;
            if ctor == Generic::Iter {
                ns.insert("typing");
            }
            let args = split_arguments(inner)
                .into_iter()
                .map(|arg| parse_sequence(arg, input, ns))
                .collect::<Result<Vec<_>>>()?;
            match (ctor, args.len()) {
                (Generic::Iter | Generic::List, 1) | (Generic::Tuple, _) => {}
                (_, n) => {
                    return Err(StubError::malformed(
                        input,
                        format!("{} takes exactly one argument, got {n}", ctor.doc_name()),
                    ))
                }
            }
            Ok(TypeExpr::Generic { ctor, args })
        }
        [Node::Group(inner)] => parse_sequence(inner, input, ns),
        _ => {
            let mut text = String::new();
            for node in alt {
                match node {
                    Node::Tok(t) => text.push_str(&t.text()),
                    Node::Group(_) => {
                        return Err(StubError::malformed(input, "unexpected parenthesized group"))
                    }
                }
            }
            fallback::parse(&text, input, ns)
        }
    }
}

/// Split a generic's argument group on commas outside `[...]`.
fn split_arguments(nodes: &[Node]) -> Vec<&[Node]> {
    let mut args = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    for (i, node) in nodes.iter().enumerate() {
        match node {
            Node::Tok(Token::Other('[')) => depth += 1,
            Node::Tok(Token::Other(']')) => depth = depth.saturating_sub(1),
            Node::Tok(Token::Other(',')) if depth == 0 => {
                args.push(&nodes[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    args.push(&nodes[start..]);
    args
}

fn dotted_name(name: &str, input: &str, ns: &mut Namespaces) -> Result<TypeExpr> {
    let parts: Vec<&str> = name.split('.').collect();
    if parts.iter().any(|p| p.is_empty()) {
        return Err(StubError::malformed(input, format!("empty path segment in {name}")));
    }
    if parts.len() > 1 {
        ns.insert(parts[0]);
    }
    Ok(TypeExpr::Name(name.to_string()))
}

// ---------------------------------------------------------------------------
// Fallback expression parser
// ---------------------------------------------------------------------------

mod fallback {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    enum Lexeme {
        Ident(String),
        Literal(String),
        LBracket,
        RBracket,
        Comma,
    }

    fn lex(text: &str, input: &str) -> Result<Vec<Lexeme>> {
        let chars: Vec<char> = text.chars().collect();
        let mut out = Vec::new();
        let mut i = 0;
        while i < chars.len() {
            let c = chars[i];
            match c {
                '[' => {
                    out.push(Lexeme::LBracket);
                    i += 1;
                }
                ']' => {
                    out.push(Lexeme::RBracket);
                    i += 1;
                }
                ',' => {
                    out.push(Lexeme::Comma);
                    i += 1;
                }
                '.' if chars.get(i + 1) == Some(&'.') && chars.get(i + 2) == Some(&'.') => {
                    out.push(Lexeme::Literal("...".to_string()));
                    i += 3;
                }
                '\'' | '"' => {
                    let end = chars[i + 1..].iter().position(|&q| q == c).ok_or_else(|| {
                        StubError::malformed(input, "unterminated string literal")
                    })?;
                    let lit: String = chars[i..i + end + 2].iter().collect();
                    out.push(Lexeme::Literal(lit));
                    i += end + 2;
                }
                c if c.is_ascii_digit() => {
                    let start = i;
                    while i < chars.len() && (chars[i].is_ascii_digit() || chars[i] == '.') {
                        i += 1;
                    }
                    out.push(Lexeme::Literal(chars[start..i].iter().collect()));
                }
                c if c.is_ascii_alphabetic() || c == '_' => {
                    let start = i;
                    while i < chars.len()
                        && (chars[i].is_ascii_alphanumeric() || chars[i] == '_' || chars[i] == '.')
                    {
                        if chars[i] == '.' && chars.get(i + 1) == Some(&'.') {
                            break;
                        }
                        i += 1;
                    }
                    out.push(Lexeme::Ident(chars[start..i].iter().collect()));
                }
                other => {
                    return Err(StubError::malformed(input, format!("unexpected character '{other}'")))
                }
            }
        }
        Ok(out)
    }

    struct Parser<'a> {
        lexemes: Vec<Lexeme>,
        pos: usize,
        input: &'a str,
    }

    impl Parser<'_> {
        fn peek(&self) -> Option<&Lexeme> {
            self.lexemes.get(self.pos)
        }

        fn next(&mut self) -> Option<Lexeme> {
            let l = self.lexemes.get(self.pos).cloned();
            self.pos += 1;
            l
        }

        fn expr(&mut self, ns: &mut Namespaces) -> Result<TypeExpr> {
            let mut expr = match self.next() {
                Some(Lexeme::Ident(name)) => {
                    let parts: Vec<&str> = name.split('.').collect();
                    if parts.iter().any(|p| p.is_empty()) {
                        return Err(StubError::malformed(self.input, format!("invalid name {name}")));
                    }
                    if parts.len() > 1 {
                        ns.insert(parts[0]);
                    }
                    TypeExpr::Name(name)
                }
                Some(Lexeme::Literal(lit)) => TypeExpr::Literal(lit),
                Some(other) => {
                    return Err(StubError::malformed(self.input, format!("unexpected {other:?}")))
                }
                None => return Err(StubError::malformed(self.input, "expected an expression")),
            };

            while self.peek() == Some(&Lexeme::LBracket) {
                self.pos += 1;
                let mut args = vec![self.expr(ns)?];
                loop {
                    match self.next() {
                        Some(Lexeme::Comma) if self.peek() == Some(&Lexeme::RBracket) => {
                            self.pos += 1;
                            break;
                        }
                        Some(Lexeme::Comma) => args.push(self.expr(ns)?),
                        Some(Lexeme::RBracket) => break,
                        _ => return Err(StubError::malformed(self.input, "unclosed '['")),
                    }
                }
                expr = TypeExpr::Subscript { base: Box::new(expr), args };
            }
            Ok(expr)
        }
    }

    /// Parse `text` as exactly one value expression.
    pub(super) fn parse(text: &str, input: &str, ns: &mut Namespaces) -> Result<TypeExpr> {
        let mut parser = Parser { lexemes: lex(text, input)?, pos: 0, input };
        let mut found = Namespaces::new();
        let expr = parser.expr(&mut found)?;
        if parser.pos != parser.lexemes.len() {
            return Err(StubError::malformed(input, "expected a single expression"));
        }
        ns.merge(found);
        Ok(expr)
    }
}

// ---------------------------------------------------------------------------
// Rendering
// ---------------------------------------------------------------------------

fn join(args: &[TypeExpr], f: impl Fn(&TypeExpr) -> String) -> String {
    args.iter().map(f).collect::<Vec<_>>().join(", ")
}

impl TypeExpr {
    /// Render back into the documentation mini-grammar, so that
    /// `parse_type(&expr.to_doc())` yields `expr` again.
    pub fn to_doc(&self) -> String {
        match self {
            TypeExpr::Name(n) | TypeExpr::Literal(n) => n.clone(),
            TypeExpr::Generic { ctor, args } => {
                format!("{}({})", ctor.doc_name(), join(args, TypeExpr::to_doc))
            }
            TypeExpr::Union(alts) => alts
                .iter()
                .map(|a| match a {
                    TypeExpr::Union(_) => format!("({})", a.to_doc()),
                    _ => a.to_doc(),
                })
                .collect::<Vec<_>>()
                .join(" or "),
            TypeExpr::Subscript { base, args } => {
                format!("{}[{}]", base.to_doc(), join(args, TypeExpr::to_doc))
            }
        }
    }
}

/// Stub-source rendering (`typing.Iterator[int]`, `list[int | str]`).
impl fmt::Display for TypeExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeExpr::Name(n) | TypeExpr::Literal(n) => f.write_str(n),
            TypeExpr::Generic { ctor, args } => {
                write!(f, "{}[{}]", ctor.stub_name(), join(args, ToString::to_string))
            }
            TypeExpr::Union(alts) => {
                let parts: Vec<String> = alts.iter().map(ToString::to_string).collect();
                f.write_str(&parts.join(" | "))
            }
            TypeExpr::Subscript { base, args } => {
                write!(f, "{}[{}]", base, join(args, ToString::to_string))
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
