//! Routine model and expression syntax.
//!
//! A routine is a topologically ordered sequence of nodes. Each node
//! names a subroutine and carries one input wire followed by its
//! parameter wires. A wire is either a static integer or a back-reference
//! to an earlier value: `(dyn 0)` is the overall input, `(dyn j)` for
//! `j ≥ 1` is the output of node `j`.
//!
//! Routines cross the protocol as text:
//!
//! ```text
//! (index-k (dyn 0) (static 3)) (add-k (dyn 0) (dyn 1))
//! ```
//!
//! A bare integer wire is shorthand for `static`. A routine consisting of
//! a single bare subroutine name denotes the one-node routine wired to
//! the overall input with that subroutine's example parameters.

use thiserror::Error;

use ravel_core::{ParamName, Params};

use super::registry::Registry;

// ── Model ───────────────────────────────────────────────────────────

/// A value source for one subroutine slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Wire {
    /// A constant.
    Static(i64),
    /// Back-reference: the overall input (0) or an earlier node's output.
    Dyn(usize),
}

/// One subroutine invocation. `wires[0]` feeds the input slot; the rest
/// feed parameter slots in order (`k`, then `n`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    pub name: String,
    pub wires: Vec<Wire>,
}

impl Node {
    pub fn input(&self) -> Option<&Wire> {
        self.wires.first()
    }

    pub fn param_wires(&self) -> &[Wire] {
        self.wires.get(1..).unwrap_or(&[])
    }

    /// The statically known parameter bindings of this node.
    pub fn static_params(&self) -> Params {
        let mut params = Params::none();
        for (i, wire) in self.param_wires().iter().enumerate() {
            if let (Some(name), Wire::Static(v)) = (ParamName::for_slot(i), wire) {
                params.set(name, *v);
            }
        }
        params
    }
}

/// A topologically ordered pipeline of subroutine invocations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Routine {
    pub nodes: Vec<Node>,
}

impl Routine {
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

// ── Parsing ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("unexpected character `{0}`")]
    UnexpectedChar(char),
    #[error("unexpected end of input")]
    UnexpectedEnd,
    #[error("number out of range")]
    BadNumber,
    #[error("expected `(`")]
    ExpectedNode,
    #[error("expected a subroutine name")]
    ExpectedName,
    #[error("expected a wire")]
    ExpectedWire,
    #[error("dynamic wire index must be non-negative")]
    BadIndex,
    #[error("empty routine")]
    Empty,
    #[error("unknown subroutine `{0}`")]
    UnknownSubroutine(String),
    #[error("subroutine `{0}` declares no example parameter for slot `{1}`")]
    MissingExampleParam(String, ParamName),
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    LParen,
    RParen,
    Word(String),
    Int(i64),
}

fn tokenize(text: &str) -> Result<Vec<Token>, ParseError> {
    let mut tokens = Vec::new();
    let mut chars = text.chars().peekable();
    while let Some(&c) = chars.peek() {
        match c {
            '(' => {
                chars.next();
                tokens.push(Token::LParen);
            }
            ')' => {
                chars.next();
                tokens.push(Token::RParen);
            }
            c if c.is_whitespace() => {
                chars.next();
            }
            c if c.is_ascii_digit() || c == '-' => {
                let mut text = String::new();
                text.push(c);
                chars.next();
                while let Some(&d) = chars.peek() {
                    if d.is_ascii_digit() {
                        text.push(d);
                        chars.next();
                    } else {
                        break;
                    }
                }
                if text == "-" {
                    return Err(ParseError::UnexpectedChar('-'));
                }
                let n = text.parse::<i64>().map_err(|_| ParseError::BadNumber)?;
                tokens.push(Token::Int(n));
            }
            c if c.is_ascii_alphabetic() => {
                let mut word = String::new();
                while let Some(&d) = chars.peek() {
                    if d.is_ascii_alphanumeric() || d == '-' || d == '_' {
                        word.push(d);
                        chars.next();
                    } else {
                        break;
                    }
                }
                tokens.push(Token::Word(word));
            }
            other => return Err(ParseError::UnexpectedChar(other)),
        }
    }
    Ok(tokens)
}

impl Routine {
    /// Parse a routine expression. The registry is consulted only for the
    /// bare-name shorthand, which needs the subroutine's example
    /// parameters; full node forms parse without lookups (unknown names
    /// are the checker's concern).
    pub fn parse(text: &str, registry: &Registry) -> Result<Routine, ParseError> {
        let tokens = tokenize(text)?;
        if tokens.is_empty() {
            return Err(ParseError::Empty);
        }

        // Bare name: one node over the overall input, statics from the
        // subroutine's example parameters.
        if let [Token::Word(name)] = tokens.as_slice() {
            let sub = registry
                .get(name)
                .ok_or_else(|| ParseError::UnknownSubroutine(name.clone()))?;
            let mut wires = vec![Wire::Dyn(0)];
            for slot in &sub.params {
                let value = sub
                    .example_params
                    .get(slot.name)
                    .ok_or_else(|| ParseError::MissingExampleParam(name.clone(), slot.name))?;
                wires.push(Wire::Static(value));
            }
            return Ok(Routine {
                nodes: vec![Node {
                    name: name.clone(),
                    wires,
                }],
            });
        }

        let mut nodes = Vec::new();
        let mut pos = 0;
        while pos < tokens.len() {
            let (node, next) = parse_node(&tokens, pos)?;
            nodes.push(node);
            pos = next;
        }
        Ok(Routine { nodes })
    }
}

fn parse_node(tokens: &[Token], mut pos: usize) -> Result<(Node, usize), ParseError> {
    match tokens.get(pos) {
        Some(Token::LParen) => pos += 1,
        Some(_) => return Err(ParseError::ExpectedNode),
        None => return Err(ParseError::UnexpectedEnd),
    }
    let name = match tokens.get(pos) {
        Some(Token::Word(w)) => {
            pos += 1;
            w.clone()
        }
        Some(_) => return Err(ParseError::ExpectedName),
        None => return Err(ParseError::UnexpectedEnd),
    };
    let mut wires = Vec::new();
    loop {
        match tokens.get(pos) {
            Some(Token::RParen) => {
                pos += 1;
                break;
            }
            Some(_) => {
                let (wire, next) = parse_wire(tokens, pos)?;
                wires.push(wire);
                pos = next;
            }
            None => return Err(ParseError::UnexpectedEnd),
        }
    }
    if wires.is_empty() {
        return Err(ParseError::ExpectedWire);
    }
    Ok((Node { name, wires }, pos))
}

fn parse_wire(tokens: &[Token], mut pos: usize) -> Result<(Wire, usize), ParseError> {
    match tokens.get(pos) {
        Some(Token::Int(v)) => Ok((Wire::Static(*v), pos + 1)),
        Some(Token::LParen) => {
            pos += 1;
            let kind = match tokens.get(pos) {
                Some(Token::Word(w)) => w.as_str(),
                Some(_) => return Err(ParseError::ExpectedWire),
                None => return Err(ParseError::UnexpectedEnd),
            };
            pos += 1;
            let value = match tokens.get(pos) {
                Some(Token::Int(v)) => *v,
                Some(_) => return Err(ParseError::ExpectedWire),
                None => return Err(ParseError::UnexpectedEnd),
            };
            pos += 1;
            match tokens.get(pos) {
                Some(Token::RParen) => pos += 1,
                Some(_) => return Err(ParseError::ExpectedWire),
                None => return Err(ParseError::UnexpectedEnd),
            }
            match kind {
                "dyn" => {
                    let index = usize::try_from(value).map_err(|_| ParseError::BadIndex)?;
                    Ok((Wire::Dyn(index), pos))
                }
                "static" => Ok((Wire::Static(value), pos)),
                _ => Err(ParseError::ExpectedWire),
            }
        }
        Some(_) => Err(ParseError::ExpectedWire),
        None => Err(ParseError::UnexpectedEnd),
    }
}

// ── Rendering ───────────────────────────────────────────────────────

impl std::fmt::Display for Wire {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Wire::Static(v) => write!(f, "(static {})", v),
            Wire::Dyn(j) => write!(f, "(dyn {})", j),
        }
    }
}

impl std::fmt::Display for Node {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}", self.name)?;
        for wire in &self.wires {
            write!(f, " {}", wire)?;
        }
        write!(f, ")")
    }
}

impl std::fmt::Display for Routine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (i, node) in self.nodes.iter().enumerate() {
            if i > 0 {
                write!(f, " ")?;
            }
            write!(f, "{}", node)?;
        }
        Ok(())
    }
}

// ── Tests ───────────────────────────────────────────────────────────
