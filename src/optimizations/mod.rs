use std::fmt::{self, Display, Formatter};

use tracing::{info, trace};

pub use self::constant_folding::{ArithmeticFolder, ConstantFolder};
pub use self::constant_propagation::ConstantPropagator;
pub use self::dead_store_elimination::remove_dead_stores;
pub use self::loop_inversion::invert_loops;
use crate::bytecode::MethodBody;
use crate::config::OptimizationConfig;
use crate::error::Result;
use crate::ir::FunctionBody;

mod constant_folding;
mod constant_propagation;
mod dead_store_elimination;
mod loop_inversion;

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct PassStats {
    pub stores_removed: usize,
    pub loops_inverted: usize,
    pub constants_inlined: usize,
    pub declarations_removed: usize,
    pub rounds: usize,
}

impl PassStats {
    pub fn total(&self) -> usize {
        self.stores_removed + self.loops_inverted + self.constants_inlined
    }
}

impl Display for PassStats {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} stores removed, {} loops inverted, {} constants inlined over {} rounds",
            self.stores_removed, self.loops_inverted, self.constants_inlined, self.rounds
        )
    }
}

#[derive(Copy, Clone, Debug, Default)]
pub struct BytecodeOptimizationPass {
    config: OptimizationConfig,
}

impl BytecodeOptimizationPass {
    pub fn new(config: OptimizationConfig) -> Self {
        BytecodeOptimizationPass { config }
    }

    pub fn transform(&self, method: &mut MethodBody) -> Result<PassStats> {
        let name = method.qualified_name();
        let insns = &mut method.instructions;
        trace!(method = %name, len = insns.len(), "optimizing method");
        insns.verify()?;

        let mut stats = PassStats::default();
        if self.config.remove_unused_stores {
            stats.stores_removed = remove_dead_stores(insns)?;
        }
        if self.config.invert_loops {
            stats.loops_inverted = invert_loops(insns)?;
        }

        insns.verify()?;
        info!(method = %name, "{stats}");
        Ok(stats)
    }
}

pub fn propagate_constants(func: &mut FunctionBody) -> PassStats {
    let name = func.qualified_name();
    let stats = ConstantPropagator::new(ArithmeticFolder::new()).lower(&mut func.body, &name);
    info!(function = %name, "{stats}");
    stats
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::semantics::tests::method_from_source;

    const SOURCE: &str = "
        (method A.f
          (iconst 5) (istore 2)
          (label head) (iload 0) (ifle exit)
          (iinc 0 -1)
          (goto head)
          (label exit) (return))";

    #[test]
    fn default_pipeline_only_inverts_loops() {
        let mut method = method_from_source(SOURCE);
        let stats = BytecodeOptimizationPass::default()
            .transform(&mut method)
            .unwrap();
        assert_eq!(stats.stores_removed, 0);
        assert_eq!(stats.loops_inverted, 1);
    }

    #[test]
    fn switches_select_the_passes() {
        let mut method = method_from_source(SOURCE);
        let pass = BytecodeOptimizationPass::new(OptimizationConfig {
            remove_unused_stores: true,
            invert_loops: false,
        });
        let stats = pass.transform(&mut method).unwrap();
        assert_eq!(stats.stores_removed, 1);
        assert_eq!(stats.loops_inverted, 0);
        assert_eq!(stats.total(), 1);

        let untouched = method.instructions.to_string();
        let pass = BytecodeOptimizationPass::new(OptimizationConfig {
            remove_unused_stores: false,
            invert_loops: false,
        });
        assert_eq!(pass.transform(&mut method).unwrap(), PassStats::default());
        assert_eq!(method.instructions.to_string(), untouched);
    }
}
