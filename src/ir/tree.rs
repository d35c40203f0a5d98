use std::fmt::{self, Display, Formatter};

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DeclId(u32);

impl DeclId {
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Default)]
pub struct Offsets {
    pub start: usize,
    pub end: usize,
}

impl Offsets {
    pub const fn new(start: usize, end: usize) -> Self {
        Offsets { start, end }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Literal {
    Int(i64),
    Bool(bool),
    Null,
}

impl Display for Literal {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Literal::Int(value) => write!(f, "{value}"),
            Literal::Bool(value) => write!(f, "{value}"),
            Literal::Null => write!(f, "null"),
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum BinaryOperator {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    Lt,
    Le,
    Gt,
    Ge,
    Eq,
    Ne,
}

impl BinaryOperator {
    pub const fn symbol(self) -> &'static str {
        match self {
            BinaryOperator::Add => "+",
            BinaryOperator::Sub => "-",
            BinaryOperator::Mul => "*",
            BinaryOperator::Div => "/",
            BinaryOperator::Rem => "%",
            BinaryOperator::Lt => "<",
            BinaryOperator::Le => "<=",
            BinaryOperator::Gt => ">",
            BinaryOperator::Ge => ">=",
            BinaryOperator::Eq => "==",
            BinaryOperator::Ne => "!=",
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum UnaryOperator {
    Not,
    Neg,
}

impl UnaryOperator {
    pub const fn symbol(self) -> &'static str {
        match self {
            UnaryOperator::Not => "not",
            UnaryOperator::Neg => "neg",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Expr {
    pub kind: ExprKind,
    pub offsets: Offsets,
}

impl Expr {
    pub fn new(kind: ExprKind, offsets: Offsets) -> Self {
        Expr { kind, offsets }
    }

    pub fn literal(&self) -> Option<&Literal> {
        match &self.kind {
            ExprKind::Const(literal) => Some(literal),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ExprKind {
    Const(Literal),
    GetValue(DeclId),
    SetValue {
        decl: DeclId,
        value: Box<Expr>,
    },
    Unary {
        operator: UnaryOperator,
        arg: Box<Expr>,
    },
    Binary {
        operator: BinaryOperator,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    If {
        pred: Box<Expr>,
        conseq: Box<Expr>,
        alt: Option<Box<Expr>>,
    },
    Block(Vec<Stmt>),
    Call {
        callee: String,
        args: Vec<Expr>,
    },
    Return(Option<Box<Expr>>),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ValueDecl {
    pub id: DeclId,
    pub mutable: bool,
    pub initializer: Option<Expr>,
    pub offsets: Offsets,
}

impl ValueDecl {
    /// The literal this declaration always holds: set for immutable
    /// declarations whose initializer is already a literal node.
    pub fn constant_value(&self) -> Option<&Literal> {
        if self.mutable {
            return None;
        }
        self.initializer.as_ref()?.literal()
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Stmt {
    Decl(ValueDecl),
    Expr(Expr),
    /// Unit-typed placeholder left where a statement was removed.
    Empty(Offsets),
}

impl Stmt {
    pub const fn is_empty(&self) -> bool {
        matches!(self, Stmt::Empty(_))
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Body {
    pub stmts: Vec<Stmt>,
}

impl Body {
    pub fn live_stmts(&self) -> impl Iterator<Item = &Stmt> + '_ {
        self.stmts.iter().filter(|stmt| !stmt.is_empty())
    }
}

#[derive(Clone, Debug)]
pub struct FunctionBody {
    pub owner: String,
    pub name: String,
    pub body: Body,
    decl_names: Vec<String>,
}

impl FunctionBody {
    pub fn new(owner: impl Into<String>, name: impl Into<String>) -> Self {
        FunctionBody {
            owner: owner.into(),
            name: name.into(),
            body: Body::default(),
            decl_names: vec![],
        }
    }

    pub fn new_decl(&mut self, name: &str) -> DeclId {
        self.decl_names.push(name.to_owned());
        DeclId(self.decl_names.len() as u32 - 1)
    }

    pub fn decl_name(&self, id: DeclId) -> Option<&str> {
        self.decl_names.get(id.index()).map(String::as_str)
    }

    pub fn qualified_name(&self) -> String {
        if self.owner.is_empty() {
            self.name.clone()
        } else {
            format!("{}.{}", self.owner, self.name)
        }
    }
}

impl Display for FunctionBody {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let printer = Printer { func: self };
        write!(f, "(func {}", self.qualified_name())?;
        for stmt in &self.body.stmts {
            write!(f, "\n  ")?;
            printer.stmt(f, stmt, 1)?;
        }
        writeln!(f, ")")
    }
}

struct Printer<'a> {
    func: &'a FunctionBody,
}

impl Printer<'_> {
    fn name(&self, id: DeclId) -> String {
        self.func
            .decl_name(id)
            .map_or_else(|| format!("${}", id.index()), str::to_owned)
    }

    fn stmt(&self, f: &mut Formatter<'_>, stmt: &Stmt, depth: usize) -> fmt::Result {
        match stmt {
            Stmt::Decl(decl) => {
                let keyword = if decl.mutable { "var" } else { "val" };
                write!(f, "({keyword} {}", self.name(decl.id))?;
                if let Some(init) = &decl.initializer {
                    write!(f, " ")?;
                    self.expr(f, init, depth)?;
                }
                write!(f, ")")
            }
            Stmt::Expr(expr) => self.expr(f, expr, depth),
            Stmt::Empty(_) => write!(f, "(begin)"),
        }
    }

    fn expr(&self, f: &mut Formatter<'_>, expr: &Expr, depth: usize) -> fmt::Result {
        match &expr.kind {
            ExprKind::Const(literal) => write!(f, "{literal}"),
            ExprKind::GetValue(id) => write!(f, "{}", self.name(*id)),
            ExprKind::SetValue { decl, value } => {
                write!(f, "(set {} ", self.name(*decl))?;
                self.expr(f, value, depth)?;
                write!(f, ")")
            }
            ExprKind::Unary { operator, arg } => {
                write!(f, "({} ", operator.symbol())?;
                self.expr(f, arg, depth)?;
                write!(f, ")")
            }
            ExprKind::Binary { operator, lhs, rhs } => {
                write!(f, "({} ", operator.symbol())?;
                self.expr(f, lhs, depth)?;
                write!(f, " ")?;
                self.expr(f, rhs, depth)?;
                write!(f, ")")
            }
            ExprKind::If { pred, conseq, alt } => {
                write!(f, "(if ")?;
                self.expr(f, pred, depth)?;
                write!(f, " ")?;
                self.expr(f, conseq, depth)?;
                if let Some(alt) = alt {
                    write!(f, " ")?;
                    self.expr(f, alt, depth)?;
                }
                write!(f, ")")
            }
            ExprKind::Block(stmts) => {
                write!(f, "(begin")?;
                for stmt in stmts {
                    write!(f, "\n{}", "  ".repeat(depth + 1))?;
                    self.stmt(f, stmt, depth + 1)?;
                }
                write!(f, ")")
            }
            ExprKind::Call { callee, args } => {
                write!(f, "(call {callee}")?;
                for arg in args {
                    write!(f, " ")?;
                    self.expr(f, arg, depth)?;
                }
                write!(f, ")")
            }
            ExprKind::Return(value) => {
                write!(f, "(return")?;
                if let Some(value) = value {
                    write!(f, " ")?;
                    self.expr(f, value, depth)?;
                }
                write!(f, ")")
            }
        }
    }
}
