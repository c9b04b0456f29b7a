mod pattern;
mod reachability;
mod remove_useless_stmts;
mod used_bindings_collector;

use swc_core::ecma::ast::Module;
use tracing::debug;

use crate::config::RootSet;
use crate::error::ShakeError;
use crate::scope::ScopeGraph;
use crate::tree_shaking::remove_useless_stmts::{remove_useless_stmts, ExportFilter};

/// Shrinks `module` to what the exports named in `roots` need.
pub fn keep_exports(module: &mut Module, roots: &RootSet) -> Result<(), ShakeError> {
    let graph = ScopeGraph::build(module)?;
    let live = reachability::live_bindings(module, &graph, roots)?;
    debug!(
        "{} of {} bindings are live for {:?}",
        live.len(),
        graph.bindings().count(),
        roots
    );
    remove_useless_stmts(module, &graph, &live, ExportFilter::Keep(roots))
}

/// Drops the exports named in `names` together with the code only they
/// use. Everything else, top level statements included, stays.
pub fn remove_exports(module: &mut Module, names: &RootSet) -> Result<(), ShakeError> {
    let graph = ScopeGraph::build(module)?;
    let live = reachability::surviving_bindings(module, &graph, names)?;
    debug!(
        "{} of {} bindings survive removing {:?}",
        live.len(),
        graph.bindings().count(),
        names
    );
    remove_useless_stmts(module, &graph, &live, ExportFilter::Remove(names))
}
