use anyhow::Result;

mod lexer;
mod parser;

use self::lexer::tokenize;
pub use self::lexer::Span;
use self::parser::read_expr;
pub use self::parser::ParseExpr;

pub fn parse(source: &str) -> Result<Box<[ParseExpr]>> {
    let mut tokens = tokenize(source)?.into_iter().peekable();
    let mut out = vec![];
    while tokens.peek().is_some() {
        out.push(read_expr(&mut tokens)?);
    }
    Ok(out.into_boxed_slice())
}
