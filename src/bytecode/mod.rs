use std::fmt::{self, Display, Formatter};

pub use self::insn_list::{Handles, InsnHandle, InsnList};
pub use self::instructions::{ArithOp, Condition, Constant, Insn, JumpOp, VarKind};

mod insn_list;
mod instructions;

#[derive(Debug, Clone)]
pub struct MethodBody {
    pub owner: String,
    pub name: String,
    pub instructions: InsnList,
}

impl MethodBody {
    pub fn new(owner: impl Into<String>, name: impl Into<String>, instructions: InsnList) -> Self {
        MethodBody {
            owner: owner.into(),
            name: name.into(),
            instructions,
        }
    }

    pub fn qualified_name(&self) -> String {
        if self.owner.is_empty() {
            self.name.clone()
        } else {
            format!("{}.{}", self.owner, self.name)
        }
    }
}

impl Display for MethodBody {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        writeln!(f, "(method {}", self.qualified_name())?;
        write!(f, "{}", self.instructions)?;
        writeln!(f, ")")
    }
}
