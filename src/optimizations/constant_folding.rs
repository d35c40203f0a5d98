use tracing::trace;

use crate::ir::{
    walk_expr, BinaryOperator, Body, Expr, ExprKind, ExprTransformer, Literal, Stmt,
    UnaryOperator,
};

/// Evaluates constant sub-expressions of a body in place.
///
/// Implementations must leave non-constant expressions unchanged and must not
/// change anything when nothing is foldable.
pub trait ConstantFolder {
    fn fold(&mut self, body: &mut Body);
}

impl<F: FnMut(&mut Body)> ConstantFolder for F {
    fn fold(&mut self, body: &mut Body) {
        self(body)
    }
}

#[derive(Debug, Default)]
pub struct ArithmeticFolder {
    folded: usize,
}

impl ArithmeticFolder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn folded(&self) -> usize {
        self.folded
    }
}

impl ConstantFolder for ArithmeticFolder {
    fn fold(&mut self, body: &mut Body) {
        let before = self.folded;
        body.transform_children(self);
        trace!(folded = self.folded - before, "folded constants");
    }
}

impl ExprTransformer for ArithmeticFolder {
    fn visit_expr(&mut self, expr: &mut Expr) {
        walk_expr(self, expr);
        if let Some(literal) = evaluate(&expr.kind) {
            expr.kind = ExprKind::Const(literal);
            self.folded += 1;
        }
    }
}

fn evaluate(kind: &ExprKind) -> Option<Literal> {
    let literal = |expr: &Expr| expr.literal().cloned();
    match kind {
        ExprKind::Unary { operator, arg } => match (operator, literal(arg)?) {
            (UnaryOperator::Not, Literal::Bool(value)) => Some(Literal::Bool(!value)),
            (UnaryOperator::Neg, Literal::Int(value)) => Some(Literal::Int(value.wrapping_neg())),
            _ => None,
        },
        ExprKind::Binary { operator, lhs, rhs } => {
            evaluate_binary(*operator, literal(lhs)?, literal(rhs)?)
        }
        ExprKind::If { pred, conseq, alt } => match literal(pred)? {
            Literal::Bool(true) => literal(conseq),
            Literal::Bool(false) => literal(alt.as_deref()?),
            _ => None,
        },
        // (begin <placeholders>... <literal>)
        ExprKind::Block(stmts) => match stmts.split_last()? {
            (Stmt::Expr(last), rest) if rest.iter().all(Stmt::is_empty) => literal(last),
            _ => None,
        },
        _ => None,
    }
}

fn evaluate_binary(operator: BinaryOperator, lhs: Literal, rhs: Literal) -> Option<Literal> {
    use BinaryOperator::*;

    Some(match (lhs, rhs) {
        (Literal::Int(x), Literal::Int(y)) => match operator {
            Add => Literal::Int(x.wrapping_add(y)),
            Sub => Literal::Int(x.wrapping_sub(y)),
            Mul => Literal::Int(x.wrapping_mul(y)),
            Div if y != 0 => Literal::Int(x.wrapping_div(y)),
            Rem if y != 0 => Literal::Int(x.wrapping_rem(y)),
            Div | Rem => return None,
            Lt => Literal::Bool(x < y),
            Le => Literal::Bool(x <= y),
            Gt => Literal::Bool(x > y),
            Ge => Literal::Bool(x >= y),
            Eq => Literal::Bool(x == y),
            Ne => Literal::Bool(x != y),
        },
        (Literal::Bool(x), Literal::Bool(y)) => match operator {
            Eq => Literal::Bool(x == y),
            Ne => Literal::Bool(x != y),
            _ => return None,
        },
        (Literal::Null, Literal::Null) => match operator {
            Eq => Literal::Bool(true),
            Ne => Literal::Bool(false),
            _ => return None,
        },
        _ => return None,
    })
}
