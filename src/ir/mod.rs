pub use self::transform::{walk_expr, walk_stmt, ExprTransformer};
pub use self::tree::{
    BinaryOperator, Body, DeclId, Expr, ExprKind, FunctionBody, Literal, Offsets, Stmt,
    UnaryOperator, ValueDecl,
};

mod transform;
mod tree;
