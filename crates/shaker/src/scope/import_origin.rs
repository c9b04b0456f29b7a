use swc_core::ecma::ast::{ImportDecl, ImportSpecifier, ModuleExportName};

use super::builder::{DeclKind, ScopeGraphBuilder};
use super::{BindingKind, ImportOrigin, ImportRecord};

impl ScopeGraphBuilder {
    /// Registers the bindings of an import declaration together with the
    /// module specifier and external name each of them comes from.
    pub(super) fn track_import(&mut self, import: &ImportDecl) {
        let src = &import.src.value;
        for specifier in &import.specifiers {
            let (local, kind, origin) = match specifier {
                // 1. import { a } from 'x';
                // 2. import { a as b } from 'x';
                // 3. import { 'a' as b } from 'x';
                ImportSpecifier::Named(named) => {
                    let imported = match &named.imported {
                        Some(ModuleExportName::Ident(ident)) => ident.sym.clone(),
                        Some(ModuleExportName::Str(s)) => s.value.clone(),
                        None => named.local.sym.clone(),
                    };
                    let origin = if import.type_only || named.is_type_only {
                        ImportOrigin::Opaque
                    } else {
                        ImportOrigin::Named(imported)
                    };
                    (&named.local, BindingKind::ImportNamed, origin)
                }
                // import a from 'x';
                ImportSpecifier::Default(default) => {
                    let origin = if import.type_only {
                        ImportOrigin::Opaque
                    } else {
                        ImportOrigin::Default
                    };
                    (&default.local, BindingKind::ImportDefault, origin)
                }
                // import * as a from 'x';
                ImportSpecifier::Namespace(namespace) => {
                    let origin = if import.type_only {
                        ImportOrigin::Opaque
                    } else {
                        ImportOrigin::Namespace
                    };
                    (&namespace.local, BindingKind::ImportNamespace, origin)
                }
            };

            if let Some(binding) = self.declare(local, DeclKind::Import(kind), None) {
                self.graph.add_import(ImportRecord {
                    binding,
                    src: src.clone(),
                    origin,
                });
            }
        }
    }
}
