use std::collections::HashSet;

use tracing::debug;

use crate::bytecode::{Insn, InsnHandle, InsnList, JumpOp};
use crate::error::{OptimizationError, Result};

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
struct LoopShape {
    goto: InsnHandle,
    post_label: InsnHandle,
    branch_label: InsnHandle,
    branch: InsnHandle,
}

fn match_loop(insns: &InsnList, goto: InsnHandle) -> Option<LoopShape> {
    let Some(&Insn::Jump {
        op: JumpOp::Goto,
        target: branch_label,
    }) = insns.get(goto)
    else {
        return None;
    };
    let post_label = insns.next(goto).filter(|&next| insns.is_label(next))?;

    let exits_loop = |handle: InsnHandle| {
        insns.get(handle).map_or(false, |insn| {
            insn.is_conditional_test() && insn.target() == Some(post_label)
        })
    };

    // the test must sit strictly before the goto, so the walk has to reach it
    let mut branch = None;
    for handle in insns.handles_from(branch_label) {
        if handle == goto {
            return Some(LoopShape {
                goto,
                post_label,
                branch_label,
                branch: branch?,
            });
        }
        if branch.is_none() && exits_loop(handle) {
            branch = Some(handle);
        }
    }
    None
}

fn invert(insns: &mut InsnList, shape: LoopShape) -> Result<()> {
    let LoopShape {
        goto,
        post_label,
        branch_label,
        branch,
    } = shape;

    let op = match insns.get(branch) {
        Some(&Insn::Jump { op, .. }) => op,
        _ => return Err(OptimizationError::StaleHandle(branch)),
    };
    // fail before touching anything
    let negated = op.negate()?;

    let code_label = match insns.next(branch) {
        Some(next) if insns.is_label(next) => next,
        _ => insns.insert_after(branch, Insn::Label)?,
    };

    insns.move_range(goto, goto, branch_label)?;
    insns.move_range(branch_label, branch, post_label)?;
    insns.set(
        branch,
        Insn::Jump {
            op: negated,
            target: code_label,
        },
    )?;

    debug!(
        %goto,
        %branch,
        from = %op,
        to = %negated,
        %code_label,
        "inverted loop"
    );
    Ok(())
}

pub fn invert_loops(insns: &mut InsnList) -> Result<usize> {
    let mut inverted = HashSet::new();
    loop {
        let shape = insns
            .handles()
            .filter(|goto| !inverted.contains(goto))
            .find_map(|goto| match_loop(insns, goto));
        let Some(shape) = shape else {
            break;
        };
        invert(insns, shape)?;
        inverted.insert(shape.goto);
    }
    Ok(inverted.len())
}
