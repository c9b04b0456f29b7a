use indexmap::IndexSet;
use swc_core::ecma::ast::Ident;
use swc_core::ecma::visit::{noop_visit_type, Visit, VisitWith};

use crate::scope::{BindingId, ScopeGraph};

/// Module level bindings referenced anywhere inside the visited node.
pub struct UsedBindingsCollector<'a> {
    graph: &'a ScopeGraph,
    pub used_bindings: IndexSet<BindingId>,
}

impl<'a> UsedBindingsCollector<'a> {
    pub fn new(graph: &'a ScopeGraph) -> Self {
        Self {
            graph,
            used_bindings: IndexSet::new(),
        }
    }

    pub fn collect<N: VisitWith<Self>>(graph: &'a ScopeGraph, node: &N) -> IndexSet<BindingId> {
        let mut collector = Self::new(graph);
        node.visit_with(&mut collector);
        collector.used_bindings
    }
}

impl Visit for UsedBindingsCollector<'_> {
    noop_visit_type!();

    fn visit_ident(&mut self, ident: &Ident) {
        if let Some(binding) = self.graph.resolve_ident(ident).binding() {
            if self.graph.is_module_level(binding) {
                self.used_bindings.insert(binding);
            }
        }
    }
}

/// Module level bindings declared inside the visited node, e.g. a `var`
/// nested in a top level `if`.
pub struct DefinedBindingsCollector<'a> {
    graph: &'a ScopeGraph,
    pub defined_bindings: IndexSet<BindingId>,
}

impl<'a> DefinedBindingsCollector<'a> {
    pub fn collect<N: VisitWith<Self>>(graph: &'a ScopeGraph, node: &N) -> IndexSet<BindingId> {
        let mut collector = Self {
            graph,
            defined_bindings: IndexSet::new(),
        };
        node.visit_with(&mut collector);
        collector.defined_bindings
    }
}

impl Visit for DefinedBindingsCollector<'_> {
    noop_visit_type!();

    fn visit_ident(&mut self, ident: &Ident) {
        if let Some(binding) = self.graph.declared_at(ident) {
            if self.graph.is_module_level(binding) {
                self.defined_bindings.insert(binding);
            }
        }
    }
}
