use super::{Body, Expr, ExprKind, Stmt};

pub trait ExprTransformer {
    fn visit_expr(&mut self, expr: &mut Expr) {
        walk_expr(self, expr);
    }

    fn visit_stmt(&mut self, stmt: &mut Stmt) {
        walk_stmt(self, stmt);
    }
}

pub fn walk_stmt<T: ExprTransformer + ?Sized>(transformer: &mut T, stmt: &mut Stmt) {
    match stmt {
        Stmt::Decl(decl) => {
            if let Some(init) = &mut decl.initializer {
                transformer.visit_expr(init);
            }
        }
        Stmt::Expr(expr) => transformer.visit_expr(expr),
        Stmt::Empty(_) => {}
    }
}

pub fn walk_expr<T: ExprTransformer + ?Sized>(transformer: &mut T, expr: &mut Expr) {
    match &mut expr.kind {
        ExprKind::Const(_) | ExprKind::GetValue(_) => {}
        ExprKind::SetValue { value, .. } => transformer.visit_expr(value),
        ExprKind::Unary { arg, .. } => transformer.visit_expr(arg),
        ExprKind::Binary { lhs, rhs, .. } => {
            transformer.visit_expr(lhs);
            transformer.visit_expr(rhs);
        }
        ExprKind::If { pred, conseq, alt } => {
            transformer.visit_expr(pred);
            transformer.visit_expr(conseq);
            if let Some(alt) = alt {
                transformer.visit_expr(alt);
            }
        }
        ExprKind::Block(stmts) => {
            for stmt in stmts {
                transformer.visit_stmt(stmt);
            }
        }
        ExprKind::Call { args, .. } => {
            for arg in args {
                transformer.visit_expr(arg);
            }
        }
        ExprKind::Return(value) => {
            if let Some(value) = value {
                transformer.visit_expr(value);
            }
        }
    }
}

impl Body {
    pub fn transform_children<T: ExprTransformer + ?Sized>(&mut self, transformer: &mut T) {
        for stmt in &mut self.stmts {
            transformer.visit_stmt(stmt);
        }
    }
}
