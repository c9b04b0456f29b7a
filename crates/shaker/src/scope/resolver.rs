use swc_core::ecma::ast::{Expr, Ident, Lit, MemberExpr, MemberProp};
use swc_core::ecma::atoms::Atom;

use super::{BindingId, ImportOrigin, ScopeGraph, ScopeId};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    Bound(BindingId),
    /// Free or global identifier.
    Unresolved,
}

impl Resolution {
    pub fn binding(self) -> Option<BindingId> {
        match self {
            Resolution::Bound(id) => Some(id),
            Resolution::Unresolved => None,
        }
    }
}

/// An external name of an imported module, as seen by a use site.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportedName<'a> {
    pub src: &'a Atom,
    pub name: Atom,
}

impl ScopeGraph {
    /// Walks from `scope` up to the module scope and returns the first
    /// binding named `name`. A block scoped binding claims its whole scope,
    /// so a use before a later `const` in the same block resolves to that
    /// `const`, never to an outer binding of the same name.
    pub fn resolve(&self, name: &Atom, scope: ScopeId) -> Resolution {
        let mut current = Some(scope);
        while let Some(id) = current {
            let scope = self.scope(id);
            if let Some(binding) = scope.get(name) {
                return Resolution::Bound(binding);
            }
            current = scope.parent;
        }
        Resolution::Unresolved
    }

    pub fn resolve_ident(&self, ident: &Ident) -> Resolution {
        match self.reference_at(ident) {
            Some(reference) => self.resolve(&reference.name, reference.scope),
            None => Resolution::Unresolved,
        }
    }

    /// `React.useEffect` or `React["useEffect"]` where `React` is a default
    /// or namespace import reads like a named import of `useEffect`.
    pub fn resolve_member(&self, member: &MemberExpr) -> Option<ImportedName<'_>> {
        let Expr::Ident(obj) = unparen(&member.obj) else {
            return None;
        };
        let record = self.import_record(self.resolve_ident(obj).binding()?)?;
        if !matches!(record.origin, ImportOrigin::Namespace | ImportOrigin::Default) {
            return None;
        }
        let name = match &member.prop {
            MemberProp::Ident(prop) => prop.sym.clone(),
            MemberProp::Computed(computed) => match unparen(&computed.expr) {
                Expr::Lit(Lit::Str(s)) => s.value.clone(),
                _ => return None,
            },
            _ => return None,
        };
        Some(ImportedName {
            src: &record.src,
            name,
        })
    }

    /// The imported name an expression denotes, either through an imported
    /// identifier or through a member of a namespace/default import.
    pub fn imported_name(&self, expr: &Expr) -> Option<ImportedName<'_>> {
        match unparen(expr) {
            Expr::Ident(ident) => {
                let record = self.import_record(self.resolve_ident(ident).binding()?)?;
                let name = match &record.origin {
                    ImportOrigin::Named(name) => name.clone(),
                    ImportOrigin::Default => "default".into(),
                    ImportOrigin::Namespace | ImportOrigin::Opaque => return None,
                };
                Some(ImportedName {
                    src: &record.src,
                    name,
                })
            }
            Expr::Member(member) => self.resolve_member(member),
            _ => None,
        }
    }
}

pub(crate) fn unparen(mut expr: &Expr) -> &Expr {
    while let Expr::Paren(paren) = expr {
        expr = &paren.expr;
    }
    expr
}

#[cfg(test)]
mod tests {
    use swc_core::ecma::ast::{CallExpr, Callee, Ident};
    use swc_core::ecma::visit::{Visit, VisitWith};

    use crate::ast::tests::TestUtils;
    use crate::scope::{BindingKind, ScopeGraph};

    #[derive(Default)]
    struct Collector {
        idents: Vec<Ident>,
        calls: Vec<CallExpr>,
    }

    impl Visit for Collector {
        fn visit_ident(&mut self, ident: &Ident) {
            self.idents.push(ident.clone());
        }

        fn visit_call_expr(&mut self, call: &CallExpr) {
            self.calls.push(call.clone());
            call.visit_children_with(self);
        }
    }

    fn collect(code: &str) -> (ScopeGraph, Collector) {
        let test_utils = TestUtils::gen_js_ast(code);
        let graph = ScopeGraph::build(&test_utils.ast.ast).unwrap();
        let mut collector = Collector::default();
        test_utils.ast.ast.visit_with(&mut collector);
        (graph, collector)
    }

    fn kinds_of(code: &str, name: &str) -> Vec<Option<BindingKind>> {
        let (graph, collector) = collect(code);
        collector
            .idents
            .iter()
            .filter(|ident| &*ident.sym == name && graph.reference_at(ident).is_some())
            .map(|ident| {
                graph
                    .resolve_ident(ident)
                    .binding()
                    .map(|id| graph.binding(id).kind)
            })
            .collect()
    }

    #[test]
    fn test_later_const_shadows_whole_block() {
        let code = r#"
import { useEffect } from "react";
function C() {
  useEffect();
  const useEffect = () => {};
  useEffect();
}
useEffect();
"#;
        assert_eq!(
            kinds_of(code, "useEffect"),
            vec![
                Some(BindingKind::LetOrConst),
                Some(BindingKind::LetOrConst),
                Some(BindingKind::ImportNamed),
            ]
        );
    }

    #[test]
    fn test_inner_block_does_not_leak() {
        let code = r#"
import { useEffect } from "react";
{
  const useEffect = 1;
}
useEffect();
"#;
        assert_eq!(
            kinds_of(code, "useEffect"),
            vec![Some(BindingKind::ImportNamed)]
        );
    }

    #[test]
    fn test_param_and_catch_shadow() {
        let code = r#"
import { a } from "x";
function f(a) { a; }
try {} catch (a) { a; }
a;
"#;
        assert_eq!(
            kinds_of(code, "a"),
            vec![
                Some(BindingKind::Param),
                Some(BindingKind::CatchParam),
                Some(BindingKind::ImportNamed),
            ]
        );
    }

    #[test]
    fn test_global_is_unresolved() {
        assert_eq!(kinds_of("console.log(1);", "console"), vec![None]);
    }

    #[test]
    fn test_member_of_default_import() {
        let (graph, collector) = collect(
            r#"import React from 'react'; import * as R from 'react'; React.useEffect(); R["useLayoutEffect"](); obj.useEffect();"#,
        );
        let names = collector
            .calls
            .iter()
            .map(|call| match &call.callee {
                Callee::Expr(callee) => graph
                    .imported_name(callee)
                    .map(|imported| (imported.src.to_string(), imported.name.to_string())),
                _ => None,
            })
            .collect::<Vec<_>>();
        assert_eq!(
            names,
            vec![
                Some(("react".to_string(), "useEffect".to_string())),
                Some(("react".to_string(), "useLayoutEffect".to_string())),
                None,
            ]
        );
    }
}
