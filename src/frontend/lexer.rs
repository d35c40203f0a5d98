use std::iter::Peekable;
use std::str::CharIndices;

use anyhow::{bail, Result};

#[derive(Copy, Clone, Debug, PartialEq, Eq, Default)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub const fn to(self, other: Span) -> Span {
        Span {
            start: self.start,
            end: other.end,
        }
    }
}

pub enum TokenKind {
    LeftParen,
    RightParen,
    Symbol(String),
    Integer(i64),
}

pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
}

fn skip_comment(stream: &mut Peekable<CharIndices<'_>>) {
    while let Some((_, c)) = stream.next() {
        if c == '\n' {
            break;
        }
    }
}

pub fn tokenize(source: &str) -> Result<Vec<Token>> {
    let mut stream = source.char_indices().peekable();
    let mut out = vec![];

    let token_ends = "();";

    loop {
        // single-char tokens
        match stream.peek().copied() {
            Some((start, '(')) => {
                stream.next();
                out.push(Token {
                    kind: TokenKind::LeftParen,
                    span: Span {
                        start,
                        end: start + 1,
                    },
                });
            }
            Some((start, ')')) => {
                stream.next();
                out.push(Token {
                    kind: TokenKind::RightParen,
                    span: Span {
                        start,
                        end: start + 1,
                    },
                });
            }
            Some((_, ';')) => skip_comment(&mut stream),
            Some((_, d)) if d.is_whitespace() => {
                stream.next();
            }
            Some((start, d)) if d.is_ascii() => {
                let mut s = String::new();
                let mut end = start;
                while let Some(&(pos, d)) = stream.peek() {
                    if token_ends.contains(d) || d.is_whitespace() {
                        break;
                    }
                    s.push(d);
                    end = pos + d.len_utf8();
                    stream.next();
                }
                let kind = match s.parse() {
                    Ok(val) => TokenKind::Integer(val),
                    Err(_) => TokenKind::Symbol(s),
                };
                out.push(Token {
                    kind,
                    span: Span { start, end },
                });
            }
            Some((pos, d)) => {
                bail!("invalid character {:?} at byte {}", d, pos)
            }
            None => {
                break;
            }
        }
    }

    Ok(out)
}
