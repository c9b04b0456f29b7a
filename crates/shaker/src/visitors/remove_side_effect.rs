use swc_core::common::DUMMY_SP;
use swc_core::ecma::ast::{Callee, EmptyStmt, Expr, ExprStmt, Module, ModuleItem, Stmt};
use swc_core::ecma::visit::{noop_visit_mut_type, VisitMut, VisitMutWith};
use tracing::debug;

use crate::config::RemovalTargets;
use crate::error::ShakeError;
use crate::scope::{unparen, ScopeGraph};

/// Deletes the statements of `module` that only call one of `targets`.
/// Returns how many statements were removed.
pub fn remove_side_effects(
    module: &mut Module,
    targets: &RemovalTargets,
) -> Result<usize, ShakeError> {
    let graph = ScopeGraph::build(module)?;
    let mut remover = SideEffectRemover::new(&graph, targets);
    module.visit_mut_with(&mut remover);
    Ok(remover.removed)
}

/// Statements in a list are dropped. A statement in a single statement
/// position, like the body of `if (x) useEffect(f)`, becomes `;`.
pub struct SideEffectRemover<'a> {
    graph: &'a ScopeGraph,
    targets: &'a RemovalTargets,
    pub removed: usize,
}

impl<'a> SideEffectRemover<'a> {
    pub fn new(graph: &'a ScopeGraph, targets: &'a RemovalTargets) -> Self {
        Self {
            graph,
            targets,
            removed: 0,
        }
    }

    fn is_target_call(&self, stmt: &Stmt) -> bool {
        // useEffect(f); React.useEffect(f); (useEffect)(f);
        let Stmt::Expr(ExprStmt { expr, span }) = stmt else {
            return false;
        };
        let Expr::Call(call) = unparen(expr) else {
            return false;
        };
        let Callee::Expr(callee) = &call.callee else {
            return false;
        };
        match self.graph.imported_name(callee) {
            Some(imported) if self.targets.matches(imported.src, &imported.name) => {
                debug!(
                    "remove call of {}#{} at {:?}",
                    imported.src, imported.name, span
                );
                true
            }
            _ => false,
        }
    }

    fn retain_stmts<T, F>(&mut self, items: &mut Vec<T>, as_stmt: F)
    where
        F: Fn(&T) -> Option<&Stmt>,
    {
        let before = items.len();
        items.retain(|item| !as_stmt(item).is_some_and(|stmt| self.is_target_call(stmt)));
        self.removed += before - items.len();
    }
}

impl VisitMut for SideEffectRemover<'_> {
    noop_visit_mut_type!();

    fn visit_mut_module_items(&mut self, items: &mut Vec<ModuleItem>) {
        self.retain_stmts(items, |item| item.as_stmt());
        items.visit_mut_children_with(self);
    }

    fn visit_mut_stmts(&mut self, stmts: &mut Vec<Stmt>) {
        self.retain_stmts(stmts, |stmt| Some(stmt));
        stmts.visit_mut_children_with(self);
    }

    fn visit_mut_stmt(&mut self, stmt: &mut Stmt) {
        if self.is_target_call(stmt) {
            self.removed += 1;
            *stmt = Stmt::Empty(EmptyStmt { span: DUMMY_SP });
            return;
        }
        stmt.visit_mut_children_with(self);
    }
}
