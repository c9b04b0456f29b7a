use std::collections::HashSet;

use indexmap::IndexSet;
use swc_core::common::{Spanned, DUMMY_SP};
use swc_core::ecma::ast::*;
use swc_core::ecma::atoms::Atom;
use swc_core::ecma::visit::{Visit, VisitWith};
use tracing::debug;

use super::pattern::shrink_pat;
use super::reachability::module_export_name;
use super::used_bindings_collector::DefinedBindingsCollector;
use crate::config::RootSet;
use crate::error::ShakeError;
use crate::scope::{BindingId, ScopeGraph};

/// Which exports a sweep keeps.
#[derive(Debug, Clone, Copy)]
pub(super) enum ExportFilter<'a> {
    /// Only these; everything else in the module must serve them.
    Keep(&'a RootSet),
    /// All but these; the rest of the module is left alone.
    Remove(&'a RootSet),
}

impl ExportFilter<'_> {
    fn keeps(&self, name: &str) -> bool {
        match self {
            ExportFilter::Keep(roots) => roots.contains(name),
            ExportFilter::Remove(names) => !names.contains(name),
        }
    }

    /// Whether statements that declare nothing, `import "x"` and
    /// `export * from "x"` stay.
    fn keeps_statements(&self) -> bool {
        matches!(self, ExportFilter::Remove(_))
    }
}

/// Sweeps the module body: dead declarations, imports and statements go
/// away, live exports the filter drops lose their `export`, and export
/// clauses keep the specifiers the filter keeps.
pub(super) fn remove_useless_stmts(
    module: &mut Module,
    graph: &ScopeGraph,
    live: &IndexSet<BindingId>,
    filter: ExportFilter<'_>,
) -> Result<(), ShakeError> {
    let sweeper = StmtSweeper {
        graph,
        live,
        filter,
    };
    let body = std::mem::take(&mut module.body);
    let mut kept = Vec::with_capacity(body.len());
    let mut imports = vec![];
    for (index, item) in body.into_iter().enumerate() {
        if matches!(item, ModuleItem::ModuleDecl(ModuleDecl::Import(_))) {
            imports.push((index, item));
            continue;
        }
        let span = item.span();
        match sweeper.sweep(item)? {
            Some(item) => kept.push((index, item)),
            None => debug!("remove unused module item at {:?}", span),
        }
    }

    // imports go last, once the type annotations that survive are known
    let type_names = TypeNamesCollector::collect(&kept);
    for (index, item) in imports {
        let span = item.span();
        match sweeper.sweep_import(item, &type_names) {
            Some(item) => kept.push((index, item)),
            None => debug!("remove unused import at {:?}", span),
        }
    }
    kept.sort_by_key(|(index, _)| *index);
    let mut kept = kept.into_iter().map(|(_, item)| item).collect::<Vec<_>>();

    // keep it an es module
    if kept.is_empty() {
        kept.push(ModuleItem::ModuleDecl(ModuleDecl::ExportNamed(NamedExport {
            span: DUMMY_SP,
            specifiers: vec![],
            src: None,
            type_only: false,
            with: None,
        })));
    }
    module.body = kept;
    Ok(())
}

struct StmtSweeper<'a> {
    graph: &'a ScopeGraph,
    live: &'a IndexSet<BindingId>,
    filter: ExportFilter<'a>,
}

impl StmtSweeper<'_> {
    fn is_live(&self, ident: &Ident) -> bool {
        self.graph
            .declared_at(ident)
            .is_some_and(|binding| self.live.contains(&binding))
    }

    fn is_root(&self, ident: &Ident) -> bool {
        self.filter.keeps(&ident.sym)
    }

    /// A specifier stays when its binding is live or when a kept type
    /// annotation names it.
    fn sweep_import(&self, item: ModuleItem, type_names: &HashSet<Atom>) -> Option<ModuleItem> {
        let mut import = match item {
            ModuleItem::ModuleDecl(ModuleDecl::Import(import)) => import,
            item => return Some(item),
        };
        // import "x";
        if import.specifiers.is_empty() {
            return self
                .filter
                .keeps_statements()
                .then(|| ModuleItem::ModuleDecl(ModuleDecl::Import(import)));
        }
        import.specifiers.retain(|specifier| {
            let local = match specifier {
                ImportSpecifier::Named(named) => &named.local,
                ImportSpecifier::Default(default) => &default.local,
                ImportSpecifier::Namespace(namespace) => &namespace.local,
            };
            self.is_live(local) || type_names.contains(&local.sym)
        });
        (!import.specifiers.is_empty()).then(|| ModuleItem::ModuleDecl(ModuleDecl::Import(import)))
    }

    fn sweep(&self, item: ModuleItem) -> Result<Option<ModuleItem>, ShakeError> {
        let item = match item {
            ModuleItem::ModuleDecl(module_decl) => match module_decl {
                ModuleDecl::Import(import) => {
                    return Ok(self.sweep_import(
                        ModuleItem::ModuleDecl(ModuleDecl::Import(import)),
                        &HashSet::new(),
                    ))
                }
                ModuleDecl::ExportDecl(ExportDecl { span, decl }) => {
                    let is_root = match &decl {
                        Decl::Fn(fn_decl) => self.is_root(&fn_decl.ident),
                        Decl::Class(class_decl) => self.is_root(&class_decl.ident),
                        Decl::TsInterface(interface) => self.is_root(&interface.id),
                        Decl::TsTypeAlias(alias) => self.is_root(&alias.id),
                        _ => false,
                    };
                    let Some(decl) = self.sweep_decl(decl)? else {
                        return Ok(None);
                    };
                    let is_root = is_root
                        || DefinedBindingsCollector::collect(self.graph, &decl)
                            .into_iter()
                            .any(|binding| self.filter.keeps(&self.graph.binding(binding).name));
                    if is_root {
                        Some(ModuleItem::ModuleDecl(ModuleDecl::ExportDecl(
                            ExportDecl { span, decl },
                        )))
                    } else {
                        Some(ModuleItem::Stmt(Stmt::Decl(decl)))
                    }
                }
                // export { a, b as c };
                // export { a as b } from "m";
                ModuleDecl::ExportNamed(mut named) => {
                    named.specifiers.retain(|specifier| {
                        let name = match specifier {
                            ExportSpecifier::Named(ExportNamedSpecifier {
                                orig, exported, ..
                            }) => module_export_name(exported.as_ref().unwrap_or(orig)),
                            ExportSpecifier::Namespace(namespace) => {
                                module_export_name(&namespace.name)
                            }
                            ExportSpecifier::Default(default) => default.exported.sym.clone(),
                        };
                        self.filter.keeps(&name)
                    });
                    (!named.specifiers.is_empty())
                        .then(|| ModuleItem::ModuleDecl(ModuleDecl::ExportNamed(named)))
                }
                ModuleDecl::ExportDefaultDecl(export_default) => {
                    if self.filter.keeps("default") {
                        Some(ModuleItem::ModuleDecl(ModuleDecl::ExportDefaultDecl(
                            export_default,
                        )))
                    } else {
                        // export default function a() {} where a is used locally
                        match export_default.decl {
                            DefaultDecl::Fn(FnExpr {
                                ident: Some(ident),
                                function,
                            }) if self.is_live(&ident) => {
                                Some(ModuleItem::Stmt(Stmt::Decl(Decl::Fn(FnDecl {
                                    ident,
                                    declare: false,
                                    function,
                                }))))
                            }
                            DefaultDecl::Class(ClassExpr {
                                ident: Some(ident),
                                class,
                            }) if self.is_live(&ident) => {
                                Some(ModuleItem::Stmt(Stmt::Decl(Decl::Class(ClassDecl {
                                    ident,
                                    declare: false,
                                    class,
                                }))))
                            }
                            _ => None,
                        }
                    }
                }
                ModuleDecl::ExportDefaultExpr(export_default) => self
                    .filter
                    .keeps("default")
                    .then(|| ModuleItem::ModuleDecl(ModuleDecl::ExportDefaultExpr(export_default))),
                ModuleDecl::ExportAll(export_all) => self
                    .filter
                    .keeps_statements()
                    .then(|| ModuleItem::ModuleDecl(ModuleDecl::ExportAll(export_all))),
                other => {
                    return Err(ShakeError::unsupported(
                        "TypeScript module item",
                        other.span(),
                    ))
                }
            },
            ModuleItem::Stmt(Stmt::Decl(decl)) => self
                .sweep_decl(decl)?
                .map(|decl| ModuleItem::Stmt(Stmt::Decl(decl))),
            // a top level statement stays whole when it hoists a live `var`
            ModuleItem::Stmt(stmt) => (self.filter.keeps_statements()
                || DefinedBindingsCollector::collect(self.graph, &stmt)
                    .iter()
                    .any(|binding| self.live.contains(binding)))
            .then_some(ModuleItem::Stmt(stmt)),
        };
        Ok(item)
    }

    fn sweep_decl(&self, decl: Decl) -> Result<Option<Decl>, ShakeError> {
        let decl = match decl {
            Decl::Fn(fn_decl) => self.is_live(&fn_decl.ident).then_some(Decl::Fn(fn_decl)),
            Decl::Class(class_decl) => self
                .is_live(&class_decl.ident)
                .then_some(Decl::Class(class_decl)),
            Decl::Var(mut var) => {
                let is_live = |ident: &Ident| self.is_live(ident);
                let mut decls = Vec::with_capacity(var.decls.len());
                for mut declarator in var.decls.drain(..) {
                    if shrink_pat(&mut declarator.name, &is_live)? {
                        decls.push(declarator);
                    } else {
                        debug!("remove unused declarator at {:?}", declarator.span);
                    }
                }
                var.decls = decls;
                (!var.decls.is_empty()).then_some(Decl::Var(var))
            }
            decl @ (Decl::TsInterface(_) | Decl::TsTypeAlias(_)) => Some(decl),
            Decl::Using(using) => {
                return Err(ShakeError::unsupported(
                    "top level using declaration",
                    using.span,
                ))
            }
            Decl::TsEnum(decl) => return Err(ShakeError::unsupported("enum", decl.span)),
            Decl::TsModule(decl) => return Err(ShakeError::unsupported("namespace", decl.span)),
        };
        Ok(decl)
    }
}

/// Names used in type positions. Types have no bindings in the scope graph,
/// so an import that only names a type is matched by its local name.
#[derive(Default)]
struct TypeNamesCollector {
    names: HashSet<Atom>,
}

impl TypeNamesCollector {
    fn collect(items: &[(usize, ModuleItem)]) -> HashSet<Atom> {
        let mut collector = Self::default();
        for (_, item) in items {
            item.visit_with(&mut collector);
        }
        collector.names
    }
}

impl Visit for TypeNamesCollector {
    // Props, React.FC, typeof config
    fn visit_ts_entity_name(&mut self, name: &TsEntityName) {
        match name {
            TsEntityName::Ident(ident) => {
                self.names.insert(ident.sym.clone());
            }
            TsEntityName::TsQualifiedName(qualified) => qualified.left.visit_with(self),
        }
    }

    // class A implements Base, ns.Base {}
    fn visit_ts_expr_with_type_args(&mut self, expr: &TsExprWithTypeArgs) {
        let mut object = &*expr.expr;
        while let Expr::Member(member) = object {
            object = &*member.obj;
        }
        if let Expr::Ident(ident) = object {
            self.names.insert(ident.sym.clone());
        }
        expr.type_args.visit_with(self);
    }
}
