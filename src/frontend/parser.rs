use std::fmt::{Display, Formatter};
use std::iter::Peekable;

use anyhow::{bail, Context, Result};

use super::lexer::{Span, Token, TokenKind};

#[derive(Debug)]
pub enum ParseExpr {
    List(Box<[ParseExpr]>, Span),
    Symbol(String, Span),
    Integer(i64, Span),
}

impl ParseExpr {
    pub fn span(&self) -> Span {
        match self {
            ParseExpr::List(_, span) | ParseExpr::Symbol(_, span) | ParseExpr::Integer(_, span) => {
                *span
            }
        }
    }
}

impl Display for ParseExpr {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ParseExpr::List(exprs, _) => {
                write!(f, "(")?;
                let mut exprs = exprs.iter().peekable();
                while let Some(expr) = exprs.next() {
                    expr.fmt(f)?;
                    if exprs.peek().is_some() {
                        write!(f, " ")?;
                    }
                }
                write!(f, ")")?;
                Ok(())
            }
            ParseExpr::Symbol(val, _) => val.fmt(f),
            ParseExpr::Integer(val, _) => val.fmt(f),
        }
    }
}

pub fn read_expr(tokens: &mut Peekable<impl Iterator<Item = Token>>) -> Result<ParseExpr> {
    let Token { kind, span } = tokens.next().context("input ended unexpectedly")?;
    match kind {
        TokenKind::LeftParen => {
            // reading tail
            let mut contents = vec![];
            loop {
                match tokens.peek() {
                    Some(Token {
                        kind: TokenKind::RightParen,
                        span: close,
                    }) => {
                        let span = span.to(*close);
                        tokens.next();
                        break Ok(ParseExpr::List(contents.into_boxed_slice(), span));
                    }
                    Some(_) => contents.push(read_expr(tokens)?),
                    None => bail!("unclosed parenthesis opened at byte {}", span.start),
                }
            }
        }
        TokenKind::RightParen => {
            bail!("unexpected right parenthesis at byte {}", span.start)
        }
        TokenKind::Integer(val) => Ok(ParseExpr::Integer(val, span)),
        TokenKind::Symbol(val) => Ok(ParseExpr::Symbol(val, span)),
    }
}
