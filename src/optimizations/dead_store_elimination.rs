use std::collections::HashSet;

use itertools::Itertools;
use tracing::debug;

use crate::bytecode::{Insn, InsnList};
use crate::error::Result;

pub fn remove_dead_stores(insns: &mut InsnList) -> Result<usize> {
    // iinc is not a load
    let loaded_slots: HashSet<u16> = insns
        .iter()
        .filter(|(_, insn)| insn.is_load())
        .filter_map(|(_, insn)| insn.slot())
        .collect();

    let dead_stores = insns
        .iter()
        .filter(|(_, insn)| insn.is_store())
        .filter_map(|(store, insn)| {
            let slot = insn.slot()?;
            if loaded_slots.contains(&slot) {
                return None;
            }
            let push = insns.prev(store)?;
            let value = insns.get(push)?.int_constant()?;
            Some((push, store, slot, value))
        })
        .collect_vec();

    for &(push, store, slot, value) in &dead_stores {
        insns.set(push, Insn::Nop)?;
        insns.remove(store)?;
        debug!(slot, value, %store, "removed store to unused local");
    }
    Ok(dead_stores.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::semantics::tests::method_from_source;

    fn stores_to(insns: &InsnList, slot: u16) -> usize {
        insns
            .iter()
            .filter(|(_, insn)| insn.is_store() && insn.slot() == Some(slot))
            .count()
    }

    #[test]
    fn removes_constant_store_to_unread_slot() {
        let mut method = method_from_source(
            "(method A.f (iconst 5) (istore 2) (iconst 1) (istore 1) (iload 1) (ireturn))",
        );
        let before = method.instructions.len();
        assert_eq!(remove_dead_stores(&mut method.instructions).unwrap(), 1);
        assert_eq!(stores_to(&method.instructions, 2), 0);
        assert_eq!(stores_to(&method.instructions, 1), 1);
        assert_eq!(method.instructions.len(), before - 1);
        assert_eq!(
            method.instructions.first().and_then(|h| method.instructions.get(h)),
            Some(&Insn::Nop)
        );
        assert!(!method
            .instructions
            .iter()
            .any(|(_, insn)| insn.int_constant() == Some(5)));
    }

    #[test]
    fn keeps_stores_fed_by_expressions() {
        let mut method = method_from_source(
            "(method A.f (iload 0) (istore 3) (iconst 2) (iconst 3) (iadd) (istore 3) (return))",
        );
        assert_eq!(remove_dead_stores(&mut method.instructions).unwrap(), 0);
        assert_eq!(stores_to(&method.instructions, 3), 2);
    }

    #[test]
    fn a_load_anywhere_keeps_the_slot_alive() {
        // the load precedes the store in program order
        let mut method = method_from_source(
            "(method A.f (iload 4) (istore 0) (iconst 7) (istore 4) (return))",
        );
        assert_eq!(remove_dead_stores(&mut method.instructions).unwrap(), 0);
    }

    #[test]
    fn increments_do_not_keep_a_slot_alive() {
        let mut method =
            method_from_source("(method A.f (iconst 5) (istore 2) (iinc 2 1) (return))");
        assert_eq!(remove_dead_stores(&mut method.instructions).unwrap(), 1);
        assert_eq!(stores_to(&method.instructions, 2), 0);
        assert_eq!(
            method.instructions.to_string(),
            "  (nop)\n  (iinc 2 1)\n  (return)\n"
        );
    }

    #[test]
    fn null_constants_are_not_tracked() {
        let mut method = method_from_source("(method A.f (aconst_null) (astore 1) (return))");
        assert_eq!(remove_dead_stores(&mut method.instructions).unwrap(), 0);
    }
}
