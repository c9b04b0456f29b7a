use std::collections::HashMap;

use indexmap::IndexSet;
use swc_core::common::Spanned;
use swc_core::ecma::ast::*;
use swc_core::ecma::atoms::Atom;
use swc_core::ecma::visit::VisitWith;
use tracing::trace;

use super::used_bindings_collector::{DefinedBindingsCollector, UsedBindingsCollector};
use crate::config::RootSet;
use crate::error::ShakeError;
use crate::scope::{BindingId, ScopeGraph};

enum ExportTarget {
    /// A local binding, including imports re-exported by `export { x }`.
    Binding(BindingId),
    /// `export default <expr>` and anonymous default declarations; the
    /// bindings they reference.
    Anonymous(IndexSet<BindingId>),
    /// Re-exports and type declarations, with no local dependencies.
    Foreign,
}

struct ExportEntry {
    name: Atom,
    target: ExportTarget,
}

impl ExportTarget {
    fn seed(&self, live: &mut IndexSet<BindingId>) {
        match self {
            ExportTarget::Binding(binding) => {
                live.insert(*binding);
            }
            ExportTarget::Anonymous(used) => live.extend(used.iter().copied()),
            ExportTarget::Foreign => {}
        }
    }
}

/// Records, for every module level binding, the module level bindings its
/// declaration needs, and the export entries of the module.
struct DependencyAnalyzer<'a> {
    graph: &'a ScopeGraph,
    deps: HashMap<BindingId, IndexSet<BindingId>>,
    exports: Vec<ExportEntry>,
    /// Bindings referenced by top level statements that declare nothing,
    /// e.g. `track("load");`.
    statement_uses: IndexSet<BindingId>,
}

/// Returns the module level bindings reachable from `roots`.
pub(super) fn live_bindings(
    module: &Module,
    graph: &ScopeGraph,
    roots: &RootSet,
) -> Result<IndexSet<BindingId>, ShakeError> {
    let analyzer = DependencyAnalyzer::analyze(module, graph)?;

    let mut live = IndexSet::new();
    for root in roots.iter() {
        let mut found = false;
        for entry in analyzer.exports.iter().filter(|entry| &*entry.name == root) {
            found = true;
            entry.target.seed(&mut live);
        }
        if !found {
            return Err(ShakeError::RootNotFound {
                name: root.to_string(),
            });
        }
    }
    Ok(analyzer.close(live))
}

/// Returns the module level bindings that survive dropping the exports named
/// in `removed`: everything except what only those exports reach. Names the
/// module does not export are ignored.
pub(super) fn surviving_bindings(
    module: &Module,
    graph: &ScopeGraph,
    removed: &RootSet,
) -> Result<IndexSet<BindingId>, ShakeError> {
    let analyzer = DependencyAnalyzer::analyze(module, graph)?;

    let mut doomed = IndexSet::new();
    let mut kept = analyzer.statement_uses.clone();
    for entry in &analyzer.exports {
        if removed.contains(&entry.name) {
            entry.target.seed(&mut doomed);
        } else {
            entry.target.seed(&mut kept);
        }
    }
    let doomed = analyzer.close(doomed);
    kept.extend(
        graph
            .bindings()
            .map(|(binding, _)| binding)
            .filter(|binding| graph.is_module_level(*binding) && !doomed.contains(binding)),
    );
    Ok(analyzer.close(kept))
}

impl<'a> DependencyAnalyzer<'a> {
    fn analyze(module: &Module, graph: &'a ScopeGraph) -> Result<Self, ShakeError> {
        let mut analyzer = DependencyAnalyzer {
            graph,
            deps: HashMap::new(),
            exports: vec![],
            statement_uses: IndexSet::new(),
        };
        for item in &module.body {
            analyzer.analyze_item(item)?;
        }
        Ok(analyzer)
    }

    /// Grows `live` to its dependency closure. The set only grows, so cycles
    /// end on their own.
    fn close(&self, mut live: IndexSet<BindingId>) -> IndexSet<BindingId> {
        let mut queue = live.iter().copied().collect::<Vec<_>>();
        while let Some(binding) = queue.pop() {
            let Some(deps) = self.deps.get(&binding) else {
                continue;
            };
            for dep in deps {
                if live.insert(*dep) {
                    trace!(
                        "{} is live through {}",
                        self.graph.binding(*dep).name,
                        self.graph.binding(binding).name
                    );
                    queue.push(*dep);
                }
            }
        }
        live
    }
}

impl DependencyAnalyzer<'_> {
    fn used<N>(&self, node: &N) -> IndexSet<BindingId>
    where
        N: for<'b> VisitWith<UsedBindingsCollector<'b>>,
    {
        UsedBindingsCollector::collect(self.graph, node)
    }

    fn add_deps(&mut self, ident: &Ident, deps: impl IntoIterator<Item = BindingId>) {
        if let Some(binding) = self.graph.declared_at(ident) {
            self.deps.entry(binding).or_default().extend(deps);
        }
    }

    fn export(&mut self, name: Atom, target: ExportTarget) {
        self.exports.push(ExportEntry { name, target });
    }

    fn analyze_item(&mut self, item: &ModuleItem) -> Result<(), ShakeError> {
        match item {
            ModuleItem::ModuleDecl(module_decl) => match module_decl {
                ModuleDecl::Import(_) | ModuleDecl::ExportAll(_) => {}
                // export function a() {}
                // export const { a, b: [c] } = d;
                ModuleDecl::ExportDecl(export_decl) => {
                    self.analyze_decl(&export_decl.decl)?;
                    match &export_decl.decl {
                        Decl::TsInterface(decl) => {
                            self.export(decl.id.sym.clone(), ExportTarget::Foreign)
                        }
                        Decl::TsTypeAlias(decl) => {
                            self.export(decl.id.sym.clone(), ExportTarget::Foreign)
                        }
                        decl => {
                            for binding in DefinedBindingsCollector::collect(self.graph, decl) {
                                let name = self.graph.binding(binding).name.clone();
                                self.export(name, ExportTarget::Binding(binding));
                            }
                        }
                    }
                }
                // export { a, b as c };
                // export { a as b, default } from "m";
                // export * as ns from "m";
                ModuleDecl::ExportNamed(named) => {
                    for specifier in &named.specifiers {
                        let (name, target) = match specifier {
                            ExportSpecifier::Named(ExportNamedSpecifier {
                                orig, exported, ..
                            }) => {
                                let name = module_export_name(exported.as_ref().unwrap_or(orig));
                                let target = match (orig, &named.src) {
                                    (ModuleExportName::Ident(orig), None) => {
                                        match self.graph.resolve_ident(orig).binding() {
                                            Some(binding) => ExportTarget::Binding(binding),
                                            None => ExportTarget::Foreign,
                                        }
                                    }
                                    _ => ExportTarget::Foreign,
                                };
                                (name, target)
                            }
                            ExportSpecifier::Namespace(namespace) => {
                                (module_export_name(&namespace.name), ExportTarget::Foreign)
                            }
                            ExportSpecifier::Default(default) => {
                                (default.exported.sym.clone(), ExportTarget::Foreign)
                            }
                        };
                        self.export(name, target);
                    }
                }
                ModuleDecl::ExportDefaultDecl(export_default) => {
                    let target = match &export_default.decl {
                        DefaultDecl::Fn(FnExpr { ident, function }) => {
                            let used = self.used(function);
                            self.default_target(ident.as_ref(), used)
                        }
                        DefaultDecl::Class(ClassExpr { ident, class }) => {
                            let used = self.used(class);
                            self.default_target(ident.as_ref(), used)
                        }
                        DefaultDecl::TsInterfaceDecl(_) => ExportTarget::Foreign,
                    };
                    self.export("default".into(), target);
                }
                ModuleDecl::ExportDefaultExpr(export_default) => {
                    let used = self.used(&export_default.expr);
                    self.export("default".into(), ExportTarget::Anonymous(used));
                }
                other => {
                    return Err(ShakeError::unsupported(
                        "TypeScript module item",
                        other.span(),
                    ))
                }
            },
            ModuleItem::Stmt(Stmt::Decl(decl)) => self.analyze_decl(decl)?,
            // if (x) { var a = 1; }
            ModuleItem::Stmt(stmt) => {
                let defined = DefinedBindingsCollector::collect(self.graph, stmt);
                let used = self.used(stmt);
                if defined.is_empty() {
                    self.statement_uses.extend(used);
                } else {
                    for binding in defined {
                        self.deps
                            .entry(binding)
                            .or_default()
                            .extend(used.iter().copied());
                    }
                }
            }
        }
        Ok(())
    }

    fn default_target(&mut self, ident: Option<&Ident>, used: IndexSet<BindingId>) -> ExportTarget {
        match ident.and_then(|ident| self.graph.declared_at(ident)) {
            Some(binding) => {
                self.deps.entry(binding).or_default().extend(used);
                ExportTarget::Binding(binding)
            }
            None => ExportTarget::Anonymous(used),
        }
    }

    fn analyze_decl(&mut self, decl: &Decl) -> Result<(), ShakeError> {
        match decl {
            Decl::Fn(fn_decl) => {
                let used = self.used(&fn_decl.function);
                self.add_deps(&fn_decl.ident, used);
            }
            Decl::Class(class_decl) => {
                let used = self.used(&class_decl.class);
                self.add_deps(&class_decl.ident, used);
            }
            Decl::Var(var_decl) => {
                for decl in &var_decl.decls {
                    let init = match &decl.init {
                        Some(init) => self.used(init),
                        None => IndexSet::new(),
                    };
                    self.analyze_pat(&decl.name, &init)?;
                }
            }
            Decl::TsInterface(_) | Decl::TsTypeAlias(_) => {}
            Decl::Using(using) => {
                return Err(ShakeError::unsupported(
                    "top level using declaration",
                    using.span,
                ))
            }
            Decl::TsEnum(decl) => return Err(ShakeError::unsupported("enum", decl.span)),
            Decl::TsModule(decl) => return Err(ShakeError::unsupported("namespace", decl.span)),
        }
        Ok(())
    }

    /// Every leaf of a declaration pattern depends on the initializer and on
    /// the default values and computed keys along its own path.
    fn analyze_pat(&mut self, pat: &Pat, inherited: &IndexSet<BindingId>) -> Result<(), ShakeError> {
        match pat {
            Pat::Ident(binding) => self.add_deps(&binding.id, inherited.iter().copied()),
            Pat::Assign(assign) => {
                let mut deps = inherited.clone();
                deps.extend(self.used(&assign.right));
                self.analyze_pat(&assign.left, &deps)?;
            }
            Pat::Array(array) => {
                for elem in array.elems.iter().flatten() {
                    self.analyze_pat(elem, inherited)?;
                }
            }
            Pat::Rest(rest) => self.analyze_pat(&rest.arg, inherited)?,
            Pat::Object(object) => {
                for (index, prop) in object.props.iter().enumerate() {
                    let mut deps = inherited.clone();
                    match prop {
                        ObjectPatProp::KeyValue(kv) => {
                            if let PropName::Computed(computed) = &kv.key {
                                deps.extend(self.used(&computed.expr));
                            }
                            self.analyze_pat(&kv.value, &deps)?;
                        }
                        ObjectPatProp::Assign(assign) => {
                            if let Some(value) = &assign.value {
                                deps.extend(self.used(value));
                            }
                            self.add_deps(&assign.key.id, deps);
                        }
                        // the rest object is whatever its siblings leave behind
                        ObjectPatProp::Rest(rest) => {
                            for (sibling_index, sibling) in object.props.iter().enumerate() {
                                if sibling_index != index {
                                    deps.extend(DefinedBindingsCollector::collect(
                                        self.graph, sibling,
                                    ));
                                }
                            }
                            self.analyze_pat(&rest.arg, &deps)?;
                        }
                    }
                }
            }
            Pat::Expr(expr) => {
                return Err(ShakeError::unsupported(
                    "expression in declaration pattern",
                    expr.span(),
                ))
            }
            Pat::Invalid(invalid) => {
                return Err(ShakeError::unsupported("invalid pattern", invalid.span))
            }
        }
        Ok(())
    }
}

pub(super) fn module_export_name(name: &ModuleExportName) -> Atom {
    match name {
        ModuleExportName::Ident(ident) => ident.sym.clone(),
        ModuleExportName::Str(s) => s.value.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::{live_bindings, surviving_bindings};
    use crate::ast::tests::TestUtils;
    use crate::config::RootSet;
    use crate::error::ShakeError;
    use crate::scope::ScopeGraph;

    fn live(code: &str, roots: &[&str]) -> Result<Vec<String>, ShakeError> {
        let test_utils = TestUtils::gen_js_ast(code);
        let graph = ScopeGraph::build(&test_utils.ast.ast)?;
        let live = live_bindings(&test_utils.ast.ast, &graph, &RootSet::new(roots.iter().copied()))?;
        let mut names = live
            .into_iter()
            .map(|binding| graph.binding(binding).name.to_string())
            .collect::<Vec<_>>();
        names.sort();
        Ok(names)
    }

    fn surviving(code: &str, removed: &[&str]) -> Vec<String> {
        let test_utils = TestUtils::gen_js_ast(code);
        let graph = ScopeGraph::build(&test_utils.ast.ast).unwrap();
        let live = surviving_bindings(
            &test_utils.ast.ast,
            &graph,
            &RootSet::new(removed.iter().copied()),
        )
        .unwrap();
        let mut names = live
            .into_iter()
            .map(|binding| graph.binding(binding).name.to_string())
            .collect::<Vec<_>>();
        names.sort();
        names
    }

    #[test]
    fn test_transitive_and_cyclic() {
        let code = r#"
function a() { return b(); }
function b() { return a() + c; }
const c = 1;
const d = c;
export { a as main };
"#;
        assert_eq!(live(code, &["main"]).unwrap(), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_shadowed_names_are_not_dependencies() {
        let code = r#"
const x = 1;
export function f(x) { return x; }
"#;
        assert_eq!(live(code, &["f"]).unwrap(), vec!["f"]);
    }

    #[test]
    fn test_pattern_leaf_dependencies() {
        let code = r#"
import fs from "fs";
const fallback = 1;
const other = 2;
const [a, { b = fallback }, ...rest] = fs.promises;
const { x, y = other, ...others } = obj;
export const getA = () => a;
export const getB = () => b;
export const getOthers = () => others;
"#;
        assert_eq!(live(code, &["getA"]).unwrap(), vec!["a", "fs", "getA"]);
        assert_eq!(
            live(code, &["getB"]).unwrap(),
            vec!["b", "fallback", "fs", "getB"]
        );
        assert_eq!(
            live(code, &["getOthers"]).unwrap(),
            vec!["getOthers", "other", "others", "x", "y"]
        );
    }

    #[test]
    fn test_default_export_roots() {
        let code = r#"
const a = 1;
const b = 2;
export default a + 1;
export const c = b;
"#;
        assert_eq!(live(code, &["default"]).unwrap(), vec!["a"]);
    }

    #[test]
    fn test_var_in_top_level_statement() {
        let code = r#"
const cond = true;
if (cond) { var a = 1; }
export const b = a;
"#;
        assert_eq!(live(code, &["b"]).unwrap(), vec!["a", "b", "cond"]);
    }

    #[test]
    fn test_re_exports_have_no_dependencies() {
        let code = r#"
import { x } from "m";
export { a as b } from "m";
export * as ns from "n";
export { x };
"#;
        assert_eq!(live(code, &["b", "ns"]).unwrap(), Vec::<String>::new());
        assert_eq!(live(code, &["x"]).unwrap(), vec!["x"]);
    }

    #[test]
    fn test_root_not_found() {
        let err = live("export const a = 1;", &["a", "missing"]).unwrap_err();
        assert_eq!(
            err,
            ShakeError::RootNotFound {
                name: "missing".to_string()
            }
        );
    }

    #[test]
    fn test_unsupported_top_level_using() {
        let err = live("using a = b(); export const c = 1;", &["c"]).unwrap_err();
        assert!(matches!(err, ShakeError::UnsupportedConstruct { .. }));
    }

    #[test]
    fn test_surviving_drops_only_what_removed_exports_reach() {
        let code = r#"
import { a, b, c, unused } from "m";
const shared = a;
const onlyData = b;
track(c);
export function getData() { return shared + onlyData; }
export default function Page() { return shared; }
"#;
        assert_eq!(
            surviving(code, &["getData"]),
            vec!["Page", "a", "c", "shared", "unused"]
        );
        assert_eq!(
            surviving(code, &["getData", "default"]),
            vec!["c", "unused"]
        );
    }

    #[test]
    fn test_surviving_keeps_removed_export_used_locally() {
        let code = r#"
export function getData() { return helper(); }
function helper() { return 1; }
export const useData = () => getData();
"#;
        assert_eq!(
            surviving(code, &["getData", "missing"]),
            vec!["getData", "helper", "useData"]
        );
    }
}
