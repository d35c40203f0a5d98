use std::collections::{HashMap, HashSet};

use tracing::debug;

use super::constant_folding::ConstantFolder;
use super::PassStats;
use crate::ir::{
    walk_expr, walk_stmt, Body, DeclId, Expr, ExprKind, ExprTransformer, Literal, Stmt,
};
use crate::utils::{run_to_fixpoint, Progress};

pub struct ConstantPropagator<F> {
    folder: F,
}

impl<F: ConstantFolder> ConstantPropagator<F> {
    pub fn new(folder: F) -> Self {
        ConstantPropagator { folder }
    }

    /// Every changing round removes at least one constant declaration that
    /// still had a read, so the loop ends after at most as many changing
    /// rounds as there are such declarations.
    pub fn lower(&mut self, body: &mut Body, container: &str) -> PassStats {
        let mut stats = PassStats::default();
        let rounds = run_to_fixpoint(|round| {
            let mut inliner = Inliner::default();
            body.transform_children(&mut inliner);

            let mut remover = DeclRemover {
                inlined: &inliner.inlined,
                removed: 0,
            };
            body.transform_children(&mut remover);

            if inliner.inlined.is_empty() {
                return Progress::Stable;
            }
            debug!(
                container,
                round,
                reads = inliner.reads,
                declarations = remover.removed,
                "inlined constant values"
            );
            stats.constants_inlined += inliner.reads;
            stats.declarations_removed += remover.removed;

            self.folder.fold(body);
            Progress::Changed
        });
        stats.rounds = rounds;
        stats
    }
}

#[derive(Default)]
struct Inliner {
    known: HashMap<DeclId, Literal>,
    inlined: HashSet<DeclId>,
    reads: usize,
}

impl ExprTransformer for Inliner {
    fn visit_stmt(&mut self, stmt: &mut Stmt) {
        walk_stmt(self, stmt);
        // the initializer has just been rewritten and may have become a literal
        if let Stmt::Decl(decl) = stmt {
            if let Some(value) = decl.constant_value() {
                self.known.insert(decl.id, value.clone());
            }
        }
    }

    fn visit_expr(&mut self, expr: &mut Expr) {
        let ExprKind::GetValue(id) = expr.kind else {
            walk_expr(self, expr);
            return;
        };
        if let Some(value) = self.known.get(&id) {
            // the literal takes the position of the read, not of the declaration
            *expr = Expr::new(ExprKind::Const(value.clone()), expr.offsets);
            self.inlined.insert(id);
            self.reads += 1;
        }
    }
}

struct DeclRemover<'a> {
    inlined: &'a HashSet<DeclId>,
    removed: usize,
}

impl ExprTransformer for DeclRemover<'_> {
    fn visit_stmt(&mut self, stmt: &mut Stmt) {
        match stmt {
            Stmt::Decl(decl) if self.inlined.contains(&decl.id) => {
                let offsets = decl.offsets;
                *stmt = Stmt::Empty(offsets);
                self.removed += 1;
            }
            _ => walk_stmt(self, stmt),
        }
    }
}
