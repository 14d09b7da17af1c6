//! Tokenizer and recursive-descent parser for arithmetic expressions.
//!
//! Grammar (lowest to highest precedence):
//!
//! ```text
//! expr    := term (('+' | '-') term)*
//! term    := unary (('*' | '/') unary)*
//! unary   := ('-' | '+') unary | power
//! power   := primary (('^' | '**') unary)?
//! primary := number | ident '(' expr ')' | ident | '(' expr ')'
//! ```
//!
//! `^` is right associative and binds tighter than unary minus, so
//! `-x^2` parses as `-(x^2)` and `2^-1` is accepted.

use super::functions::Function;
use super::{BinOp, Node};
use crate::error::{MathError, MathResult};

/// Deepest nesting of parentheses, calls and prefix signs accepted.
pub const MAX_NESTING: usize = 256;

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Number(f64),
    Ident(String),
    Plus,
    Minus,
    Star,
    Slash,
    Caret,
    LParen,
    RParen,
}

#[derive(Debug, Clone)]
struct Spanned {
    token: Token,
    position: usize,
}

fn tokenize(src: &str) -> MathResult<Vec<Spanned>> {
    let bytes = src.as_bytes();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < bytes.len() {
        let c = bytes[i];
        let start = i;
        let token = match c {
            b' ' | b'\t' | b'\n' | b'\r' => {
                i += 1;
                continue;
            }
            b'+' => Token::Plus,
            b'-' => Token::Minus,
            b'*' if bytes.get(i + 1) == Some(&b'*') => {
                i += 1;
                Token::Caret
            }
            b'*' => Token::Star,
            b'/' => Token::Slash,
            b'^' => Token::Caret,
            b'(' => Token::LParen,
            b')' => Token::RParen,
            b'0'..=b'9' | b'.' => {
                let end = scan_number(bytes, i);
                let text = &src[i..end];
                let value = text.parse::<f64>().map_err(|_| MathError::Parse {
                    position: start,
                    what: format!("invalid number literal '{text}'"),
                })?;
                i = end;
                tokens.push(Spanned {
                    token: Token::Number(value),
                    position: start,
                });
                continue;
            }
            c if c.is_ascii_alphabetic() || c == b'_' => {
                let mut end = i;
                while end < bytes.len() && (bytes[end].is_ascii_alphanumeric() || bytes[end] == b'_')
                {
                    end += 1;
                }
                let name = src[i..end].to_string();
                i = end;
                tokens.push(Spanned {
                    token: Token::Ident(name),
                    position: start,
                });
                continue;
            }
            _ => {
                let ch = src[i..].chars().next().unwrap_or('?');
                return Err(MathError::Parse {
                    position: start,
                    what: format!("unexpected character '{ch}'"),
                });
            }
        };
        i += 1;
        tokens.push(Spanned {
            token,
            position: start,
        });
    }

    Ok(tokens)
}

/// End index of the numeric literal starting at `start`.
fn scan_number(bytes: &[u8], start: usize) -> usize {
    let mut i = start;
    while i < bytes.len() && bytes[i].is_ascii_digit() {
        i += 1;
    }
    if i < bytes.len() && bytes[i] == b'.' {
        i += 1;
        while i < bytes.len() && bytes[i].is_ascii_digit() {
            i += 1;
        }
    }
    if i < bytes.len() && (bytes[i] == b'e' || bytes[i] == b'E') {
        let mut j = i + 1;
        if j < bytes.len() && (bytes[j] == b'+' || bytes[j] == b'-') {
            j += 1;
        }
        if j < bytes.len() && bytes[j].is_ascii_digit() {
            while j < bytes.len() && bytes[j].is_ascii_digit() {
                j += 1;
            }
            i = j;
        }
    }
    i
}

pub(super) struct Parser {
    tokens: Vec<Spanned>,
    pos: usize,
    end: usize,
    depth: usize,
}

impl Parser {
    pub(super) fn new(src: &str) -> MathResult<Self> {
        Ok(Self {
            tokens: tokenize(src)?,
            pos: 0,
            end: src.len(),
            depth: 0,
        })
    }

    pub(super) fn parse(mut self) -> MathResult<Node> {
        if self.tokens.is_empty() {
            return Err(MathError::Parse {
                position: 0,
                what: "empty expression".to_string(),
            });
        }
        let node = self.expr()?;
        if let Some(tok) = self.tokens.get(self.pos) {
            return Err(MathError::Parse {
                position: tok.position,
                what: format!("unexpected token {:?}", tok.token),
            });
        }
        Ok(node)
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos).map(|t| &t.token)
    }

    fn position(&self) -> usize {
        self.tokens.get(self.pos).map(|t| t.position).unwrap_or(self.end)
    }

    fn bump(&mut self) -> Option<Token> {
        let tok = self.tokens.get(self.pos).map(|t| t.token.clone());
        if tok.is_some() {
            self.pos += 1;
        }
        tok
    }

    fn expect(&mut self, want: Token) -> MathResult<()> {
        let position = self.position();
        match self.bump() {
            Some(tok) if tok == want => Ok(()),
            Some(tok) => Err(MathError::Parse {
                position,
                what: format!("expected {want:?}, found {tok:?}"),
            }),
            None => Err(MathError::Parse {
                position,
                what: format!("expected {want:?}, found end of input"),
            }),
        }
    }

    fn expr(&mut self) -> MathResult<Node> {
        let mut lhs = self.term()?;
        loop {
            let op = match self.peek() {
                Some(Token::Plus) => BinOp::Add,
                Some(Token::Minus) => BinOp::Sub,
                _ => break,
            };
            self.pos += 1;
            let rhs = self.term()?;
            lhs = Node::Binary {
                op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            };
        }
        Ok(lhs)
    }

    fn term(&mut self) -> MathResult<Node> {
        let mut lhs = self.unary()?;
        loop {
            let op = match self.peek() {
                Some(Token::Star) => BinOp::Mul,
                Some(Token::Slash) => BinOp::Div,
                _ => break,
            };
            self.pos += 1;
            let rhs = self.unary()?;
            lhs = Node::Binary {
                op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            };
        }
        Ok(lhs)
    }

    // Every recursive path of the grammar passes through here.
    fn unary(&mut self) -> MathResult<Node> {
        if self.depth >= MAX_NESTING {
            return Err(MathError::Parse {
                position: self.position(),
                what: format!("expression nested deeper than {MAX_NESTING} levels"),
            });
        }
        self.depth += 1;
        let node = self.signed();
        self.depth -= 1;
        node
    }

    fn signed(&mut self) -> MathResult<Node> {
        match self.peek() {
            Some(Token::Minus) => {
                self.pos += 1;
                Ok(Node::Neg(Box::new(self.unary()?)))
            }
            Some(Token::Plus) => {
                self.pos += 1;
                self.unary()
            }
            _ => self.power(),
        }
    }

    fn power(&mut self) -> MathResult<Node> {
        let base = self.primary()?;
        if self.peek() == Some(&Token::Caret) {
            self.pos += 1;
            let exponent = self.unary()?;
            return Ok(Node::Binary {
                op: BinOp::Pow,
                lhs: Box::new(base),
                rhs: Box::new(exponent),
            });
        }
        Ok(base)
    }

    fn primary(&mut self) -> MathResult<Node> {
        let position = self.position();
        match self.bump() {
            Some(Token::Number(v)) => Ok(Node::Number(v)),
            Some(Token::Ident(name)) => {
                if self.peek() == Some(&Token::LParen) {
                    let func = Function::lookup(&name).ok_or_else(|| MathError::Parse {
                        position,
                        what: format!("unknown function '{name}'"),
                    })?;
                    self.pos += 1;
                    let arg = self.expr()?;
                    self.expect(Token::RParen)?;
                    Ok(Node::Call {
                        func,
                        arg: Box::new(arg),
                    })
                } else {
                    Ok(Node::Var(name))
                }
            }
            Some(Token::LParen) => {
                let inner = self.expr()?;
                self.expect(Token::RParen)?;
                Ok(inner)
            }
            Some(tok) => Err(MathError::Parse {
                position,
                what: format!("unexpected token {tok:?}"),
            }),
            None => Err(MathError::Parse {
                position,
                what: "unexpected end of input".to_string(),
            }),
        }
    }
}
