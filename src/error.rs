use thiserror::Error;

use crate::bytecode::{InsnHandle, JumpOp};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum OptimizationError {
    #[error("`{0}` is not a conditional test and has no negation")]
    UnsupportedOpcode(JumpOp),

    #[error("jump {jump} targets {target}, which is not a label of this method")]
    DanglingJump { jump: InsnHandle, target: InsnHandle },

    #[error("{0} does not name a live instruction")]
    StaleHandle(InsnHandle),

    #[error("label {label} is still targeted by jump {jump}")]
    LabelInUse { label: InsnHandle, jump: InsnHandle },

    #[error("cannot move {from}..={to} before {before}")]
    InvalidMove {
        from: InsnHandle,
        to: InsnHandle,
        before: InsnHandle,
    },
}

pub type Result<T, E = OptimizationError> = std::result::Result<T, E>;
