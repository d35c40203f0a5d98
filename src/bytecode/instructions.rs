use std::fmt::{self, Display, Formatter};

use super::InsnHandle;
use crate::error::{OptimizationError, Result};

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Condition {
    Eq,
    Ne,
    Lt,
    Ge,
    Gt,
    Le,
    ICmpEq,
    ICmpNe,
    ICmpLt,
    ICmpGe,
    ICmpGt,
    ICmpLe,
    ACmpEq,
    ACmpNe,
    Null,
    NonNull,
}

impl Condition {
    pub const ALL: [Condition; 16] = [
        Condition::Eq,
        Condition::Ne,
        Condition::Lt,
        Condition::Ge,
        Condition::Gt,
        Condition::Le,
        Condition::ICmpEq,
        Condition::ICmpNe,
        Condition::ICmpLt,
        Condition::ICmpGe,
        Condition::ICmpGt,
        Condition::ICmpLe,
        Condition::ACmpEq,
        Condition::ACmpNe,
        Condition::Null,
        Condition::NonNull,
    ];

    pub const fn negate(self) -> Self {
        match self {
            Condition::Eq => Condition::Ne,
            Condition::Ne => Condition::Eq,
            Condition::Lt => Condition::Ge,
            Condition::Ge => Condition::Lt,
            Condition::Gt => Condition::Le,
            Condition::Le => Condition::Gt,
            Condition::ICmpEq => Condition::ICmpNe,
            Condition::ICmpNe => Condition::ICmpEq,
            Condition::ICmpLt => Condition::ICmpGe,
            Condition::ICmpGe => Condition::ICmpLt,
            Condition::ICmpGt => Condition::ICmpLe,
            Condition::ICmpLe => Condition::ICmpGt,
            Condition::ACmpEq => Condition::ACmpNe,
            Condition::ACmpNe => Condition::ACmpEq,
            Condition::Null => Condition::NonNull,
            Condition::NonNull => Condition::Null,
        }
    }

    pub const fn operands(self) -> usize {
        match self {
            Condition::Eq
            | Condition::Ne
            | Condition::Lt
            | Condition::Ge
            | Condition::Gt
            | Condition::Le
            | Condition::Null
            | Condition::NonNull => 1,
            Condition::ICmpEq
            | Condition::ICmpNe
            | Condition::ICmpLt
            | Condition::ICmpGe
            | Condition::ICmpGt
            | Condition::ICmpLe
            | Condition::ACmpEq
            | Condition::ACmpNe => 2,
        }
    }

    pub const fn mnemonic(self) -> &'static str {
        match self {
            Condition::Eq => "ifeq",
            Condition::Ne => "ifne",
            Condition::Lt => "iflt",
            Condition::Ge => "ifge",
            Condition::Gt => "ifgt",
            Condition::Le => "ifle",
            Condition::ICmpEq => "if_icmpeq",
            Condition::ICmpNe => "if_icmpne",
            Condition::ICmpLt => "if_icmplt",
            Condition::ICmpGe => "if_icmpge",
            Condition::ICmpGt => "if_icmpgt",
            Condition::ICmpLe => "if_icmple",
            Condition::ACmpEq => "if_acmpeq",
            Condition::ACmpNe => "if_acmpne",
            Condition::Null => "ifnull",
            Condition::NonNull => "ifnonnull",
        }
    }

    pub fn from_mnemonic(mnemonic: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|cond| cond.mnemonic() == mnemonic)
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum JumpOp {
    Goto,
    If(Condition),
}

impl JumpOp {
    pub fn negate(self) -> Result<Self> {
        match self {
            JumpOp::If(cond) => Ok(JumpOp::If(cond.negate())),
            JumpOp::Goto => Err(OptimizationError::UnsupportedOpcode(self)),
        }
    }

    pub const fn mnemonic(self) -> &'static str {
        match self {
            JumpOp::Goto => "goto",
            JumpOp::If(cond) => cond.mnemonic(),
        }
    }
}

impl Display for JumpOp {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.mnemonic())
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Constant {
    Int(i32),
    Null,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum VarKind {
    Int,
    Ref,
}

impl VarKind {
    const fn prefix(self) -> char {
        match self {
            VarKind::Int => 'i',
            VarKind::Ref => 'a',
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ArithOp {
    Add,
    Sub,
    Mul,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Insn {
    Label,
    Jump {
        op: JumpOp,
        target: InsnHandle,
    },
    Load {
        kind: VarKind,
        slot: u16,
    },
    Store {
        kind: VarKind,
        slot: u16,
    },
    Push(Constant),
    Increment {
        slot: u16,
        delta: i16,
    },
    Arith(ArithOp),
    Return {
        value: bool,
    },
    Nop,
    Other(String),
}

impl Insn {
    pub const fn is_label(&self) -> bool {
        matches!(self, Insn::Label)
    }

    pub const fn is_load(&self) -> bool {
        matches!(self, Insn::Load { .. })
    }

    pub const fn is_store(&self) -> bool {
        matches!(self, Insn::Store { .. })
    }

    pub const fn is_conditional_test(&self) -> bool {
        matches!(
            self,
            Insn::Jump {
                op: JumpOp::If(_),
                ..
            }
        )
    }

    pub const fn slot(&self) -> Option<u16> {
        match *self {
            Insn::Load { slot, .. } | Insn::Store { slot, .. } | Insn::Increment { slot, .. } => {
                Some(slot)
            }
            _ => None,
        }
    }

    pub const fn int_constant(&self) -> Option<i32> {
        match *self {
            Insn::Push(Constant::Int(value)) => Some(value),
            _ => None,
        }
    }

    pub const fn target(&self) -> Option<InsnHandle> {
        match *self {
            Insn::Jump { target, .. } => Some(target),
            _ => None,
        }
    }
}

impl Display for Insn {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Insn::Label => write!(f, "(label)"),
            Insn::Jump { op, target } => write!(f, "({op} L{})", target.index()),
            Insn::Load { kind, slot } => write!(f, "({}load {slot})", kind.prefix()),
            Insn::Store { kind, slot } => write!(f, "({}store {slot})", kind.prefix()),
            Insn::Push(Constant::Int(value)) => write!(f, "(iconst {value})"),
            Insn::Push(Constant::Null) => write!(f, "(aconst_null)"),
            Insn::Increment { slot, delta } => write!(f, "(iinc {slot} {delta})"),
            Insn::Arith(ArithOp::Add) => write!(f, "(iadd)"),
            Insn::Arith(ArithOp::Sub) => write!(f, "(isub)"),
            Insn::Arith(ArithOp::Mul) => write!(f, "(imul)"),
            Insn::Return { value: false } => write!(f, "(return)"),
            Insn::Return { value: true } => write!(f, "(ireturn)"),
            Insn::Nop => write!(f, "(nop)"),
            Insn::Other(text) => write!(f, "(other {text})"),
        }
    }
}
