use swc_core::common::{Span, Spanned};
use swc_core::ecma::ast::*;
use swc_core::ecma::atoms::Atom;
use swc_core::ecma::visit::{noop_visit_type, Visit, VisitWith};

use super::{
    Binding, BindingId, BindingKind, PathSegment, PatternSlot, ScopeGraph, ScopeId, ScopeKind,
};
use crate::error::ShakeError;

/// How a declaring identifier was introduced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum DeclKind {
    Var,
    Lexical,
    Function,
    Class,
    Param,
    CatchParam,
    Import(BindingKind),
}

impl DeclKind {
    fn binding_kind(self) -> BindingKind {
        match self {
            DeclKind::Var => BindingKind::Var,
            DeclKind::Lexical => BindingKind::LetOrConst,
            DeclKind::Function => BindingKind::Function,
            DeclKind::Class => BindingKind::Class,
            DeclKind::Param => BindingKind::Param,
            DeclKind::CatchParam => BindingKind::CatchParam,
            DeclKind::Import(kind) => kind,
        }
    }
}

/// Single pass over a module that creates the scope tree, registers every
/// binding-introducing construct and records every reference site.
pub(crate) struct ScopeGraphBuilder {
    pub(super) graph: ScopeGraph,
    stack: Vec<ScopeId>,
    error: Option<ShakeError>,
}

impl ScopeGraphBuilder {
    pub(crate) fn build(module: &Module) -> Result<ScopeGraph, ShakeError> {
        let mut builder = Self {
            graph: ScopeGraph::new(module.span),
            stack: vec![ScopeGraph::MODULE],
            error: None,
        };
        module.visit_with(&mut builder);
        match builder.error {
            Some(err) => Err(err),
            None => Ok(builder.graph),
        }
    }

    fn current(&self) -> ScopeId {
        self.stack.last().copied().unwrap_or(ScopeGraph::MODULE)
    }

    fn hoist_target(&self) -> ScopeId {
        self.stack
            .iter()
            .rev()
            .copied()
            .find(|id| {
                matches!(
                    self.graph.scope(*id).kind,
                    ScopeKind::Function | ScopeKind::Module
                )
            })
            .unwrap_or(ScopeGraph::MODULE)
    }

    fn param_named(&self, body: ScopeId, name: &Atom) -> Option<BindingId> {
        let scope = self.graph.scope(body);
        if scope.kind != ScopeKind::Function {
            return None;
        }
        let params = self.graph.scope(scope.parent?);
        if params.kind != ScopeKind::Params {
            return None;
        }
        params.get(name)
    }

    fn with_scope<F>(&mut self, kind: ScopeKind, span: Span, f: F)
    where
        F: FnOnce(&mut Self),
    {
        let id = self.graph.add_scope(kind, self.current(), span);
        self.stack.push(id);
        f(self);
        self.stack.pop();
    }

    pub(super) fn declare(
        &mut self,
        ident: &Ident,
        kind: DeclKind,
        pattern: Option<PatternSlot>,
    ) -> Option<BindingId> {
        // function declarations go to the scope whose statement list holds
        // them, which is the function scope itself for direct body children
        let scope = match kind {
            DeclKind::Var => self.hoist_target(),
            _ => self.current(),
        };
        // function f(a) { var a; } declares the parameter again
        if kind == DeclKind::Var && self.graph.scope(scope).get(&ident.sym).is_none() {
            if let Some(param) = self.param_named(scope, &ident.sym) {
                self.graph.redeclare(ident.span, param);
                return Some(param);
            }
        }
        let binding = Binding {
            scope,
            name: ident.sym.clone(),
            kind: if pattern.is_some() {
                BindingKind::PatternElement
            } else {
                kind.binding_kind()
            },
            hoisted: matches!(kind, DeclKind::Var | DeclKind::Function),
            block_scoped: matches!(kind, DeclKind::Lexical | DeclKind::Class),
            span: ident.span,
            pattern,
        };
        match self.graph.add_binding(binding) {
            Ok(id) => Some(id),
            Err(err) => {
                self.error.get_or_insert(err);
                None
            }
        }
    }

    fn declare_pat(&mut self, pat: &Pat, kind: DeclKind) {
        let mut path = vec![];
        self.declare_pat_at(pat, kind, pat.span(), &mut path);
    }

    fn declare_pat_at(&mut self, pat: &Pat, kind: DeclKind, root: Span, path: &mut Vec<PathSegment>) {
        match pat {
            Pat::Ident(binding) => {
                let slot = (!path.is_empty()).then(|| PatternSlot {
                    pattern: root,
                    path: path.clone(),
                });
                self.declare(&binding.id, kind, slot);
            }
            // const [x, , y] = arr;
            Pat::Array(array) => {
                for (index, elem) in array.elems.iter().enumerate() {
                    match elem {
                        // the rest element pushes its own segment
                        Some(elem @ Pat::Rest(_)) => self.declare_pat_at(elem, kind, root, path),
                        Some(elem) => {
                            path.push(PathSegment::Index(index));
                            self.declare_pat_at(elem, kind, root, path);
                            path.pop();
                        }
                        None => {}
                    }
                }
            }
            // const [x, ...rest] = arr;
            Pat::Rest(rest) => {
                path.push(PathSegment::Rest);
                self.declare_pat_at(&rest.arg, kind, root, path);
                path.pop();
            }
            // const { x, y: z = 1, ...rest } = obj;
            Pat::Object(object) => {
                for prop in &object.props {
                    match prop {
                        ObjectPatProp::KeyValue(kv) => {
                            kv.key.visit_with(self);
                            path.push(PathSegment::from_prop_name(&kv.key));
                            self.declare_pat_at(&kv.value, kind, root, path);
                            path.pop();
                        }
                        ObjectPatProp::Assign(assign) => {
                            path.push(PathSegment::Key(assign.key.sym.clone()));
                            let slot = PatternSlot {
                                pattern: root,
                                path: path.clone(),
                            };
                            self.declare(&assign.key.id, kind, Some(slot));
                            path.pop();
                            assign.value.visit_with(self);
                        }
                        ObjectPatProp::Rest(rest) => {
                            path.push(PathSegment::Rest);
                            self.declare_pat_at(&rest.arg, kind, root, path);
                            path.pop();
                        }
                    }
                }
            }
            Pat::Assign(assign) => {
                self.declare_pat_at(&assign.left, kind, root, path);
                assign.right.visit_with(self);
            }
            Pat::Invalid(_) => {}
            Pat::Expr(expr) => expr.visit_with(self),
        }
    }

    /// Declares the parameters in the current `Params` scope and visits the
    /// body in a child `Function` scope.
    fn bind_function(&mut self, function: &Function) {
        function.decorators.visit_with(self);
        for param in &function.params {
            param.decorators.visit_with(self);
            self.declare_pat(&param.pat, DeclKind::Param);
        }
        if let Some(body) = &function.body {
            self.bind_body(body);
        }
    }

    fn bind_body(&mut self, body: &BlockStmt) {
        self.with_scope(ScopeKind::Function, body.span, |this| {
            body.stmts.visit_with(this);
        });
    }
}

impl PathSegment {
    fn from_prop_name(key: &PropName) -> Self {
        match key {
            PropName::Ident(ident) => PathSegment::Key(ident.sym.clone()),
            PropName::Str(s) => PathSegment::Key(s.value.clone()),
            PropName::Num(n) => PathSegment::Key(n.value.to_string().into()),
            PropName::Computed(_) | PropName::BigInt(_) => PathSegment::Computed,
        }
    }
}

fn is_component_name(name: &str) -> bool {
    !name.starts_with(|c: char| c.is_ascii_lowercase())
}

impl Visit for ScopeGraphBuilder {
    noop_visit_type!();

    fn visit_ident(&mut self, ident: &Ident) {
        let scope = self.current();
        self.graph.add_reference(ident, scope);
    }

    fn visit_import_decl(&mut self, import: &ImportDecl) {
        self.track_import(import);
    }

    fn visit_named_export(&mut self, export: &NamedExport) {
        // export { a as b } from "x" names nothing local
        if export.src.is_some() {
            return;
        }
        for specifier in &export.specifiers {
            if let ExportSpecifier::Named(ExportNamedSpecifier {
                orig: ModuleExportName::Ident(orig),
                ..
            }) = specifier
            {
                self.visit_ident(orig);
            }
        }
    }

    fn visit_export_all(&mut self, _: &ExportAll) {}

    fn visit_export_default_decl(&mut self, export: &ExportDefaultDecl) {
        match &export.decl {
            DefaultDecl::Fn(f) => {
                if let Some(ident) = &f.ident {
                    self.declare(ident, DeclKind::Function, None);
                }
                f.function.visit_with(self);
            }
            DefaultDecl::Class(c) => {
                if let Some(ident) = &c.ident {
                    self.declare(ident, DeclKind::Class, None);
                }
                c.class.visit_with(self);
            }
            DefaultDecl::TsInterfaceDecl(_) => {}
        }
    }

    fn visit_labeled_stmt(&mut self, stmt: &LabeledStmt) {
        stmt.body.visit_with(self);
    }

    fn visit_break_stmt(&mut self, _: &BreakStmt) {}

    fn visit_continue_stmt(&mut self, _: &ContinueStmt) {}

    fn visit_var_decl(&mut self, var: &VarDecl) {
        let kind = match var.kind {
            VarDeclKind::Var => DeclKind::Var,
            VarDeclKind::Let | VarDeclKind::Const => DeclKind::Lexical,
        };
        for decl in &var.decls {
            self.declare_pat(&decl.name, kind);
            decl.init.visit_with(self);
        }
    }

    fn visit_using_decl(&mut self, using: &UsingDecl) {
        for decl in &using.decls {
            self.declare_pat(&decl.name, DeclKind::Lexical);
            decl.init.visit_with(self);
        }
    }

    fn visit_fn_decl(&mut self, f: &FnDecl) {
        self.declare(&f.ident, DeclKind::Function, None);
        f.function.visit_with(self);
    }

    fn visit_class_decl(&mut self, c: &ClassDecl) {
        self.declare(&c.ident, DeclKind::Class, None);
        c.class.visit_with(self);
    }

    fn visit_fn_expr(&mut self, f: &FnExpr) {
        self.with_scope(ScopeKind::Params, f.function.span, |this| {
            if let Some(ident) = &f.ident {
                this.declare(ident, DeclKind::Function, None);
            }
            this.bind_function(&f.function);
        });
    }

    fn visit_class_expr(&mut self, c: &ClassExpr) {
        self.with_scope(ScopeKind::Class, c.class.span, |this| {
            if let Some(ident) = &c.ident {
                this.declare(ident, DeclKind::Class, None);
            }
            c.class.visit_children_with(this);
        });
    }

    fn visit_class(&mut self, class: &Class) {
        self.with_scope(ScopeKind::Class, class.span, |this| {
            class.visit_children_with(this);
        });
    }

    fn visit_function(&mut self, function: &Function) {
        self.with_scope(ScopeKind::Params, function.span, |this| {
            this.bind_function(function);
        });
    }

    fn visit_arrow_expr(&mut self, arrow: &ArrowExpr) {
        self.with_scope(ScopeKind::Params, arrow.span, |this| {
            for param in &arrow.params {
                this.declare_pat(param, DeclKind::Param);
            }
            match &*arrow.body {
                BlockStmtOrExpr::BlockStmt(block) => this.bind_body(block),
                BlockStmtOrExpr::Expr(expr) => expr.visit_with(this),
            }
        });
    }

    fn visit_constructor(&mut self, constructor: &Constructor) {
        constructor.key.visit_with(self);
        self.with_scope(ScopeKind::Params, constructor.span, |this| {
            for param in &constructor.params {
                match param {
                    ParamOrTsParamProp::Param(param) => {
                        param.decorators.visit_with(this);
                        this.declare_pat(&param.pat, DeclKind::Param);
                    }
                    ParamOrTsParamProp::TsParamProp(prop) => {
                        prop.decorators.visit_with(this);
                        match &prop.param {
                            TsParamPropParam::Ident(binding) => {
                                this.declare(&binding.id, DeclKind::Param, None);
                            }
                            TsParamPropParam::Assign(assign) => {
                                this.declare_pat(&assign.left, DeclKind::Param);
                                assign.right.visit_with(this);
                            }
                        }
                    }
                }
            }
            if let Some(body) = &constructor.body {
                this.bind_body(body);
            }
        });
    }

    fn visit_getter_prop(&mut self, getter: &GetterProp) {
        getter.key.visit_with(self);
        self.with_scope(ScopeKind::Function, getter.span, |this| {
            if let Some(body) = &getter.body {
                body.stmts.visit_with(this);
            }
        });
    }

    fn visit_setter_prop(&mut self, setter: &SetterProp) {
        setter.key.visit_with(self);
        self.with_scope(ScopeKind::Params, setter.span, |this| {
            this.declare_pat(&setter.param, DeclKind::Param);
            if let Some(body) = &setter.body {
                this.bind_body(body);
            }
        });
    }

    fn visit_block_stmt(&mut self, block: &BlockStmt) {
        self.with_scope(ScopeKind::Block, block.span, |this| {
            block.stmts.visit_with(this);
        });
    }

    fn visit_catch_clause(&mut self, clause: &CatchClause) {
        self.with_scope(ScopeKind::Catch, clause.span, |this| {
            if let Some(param) = &clause.param {
                this.declare_pat(param, DeclKind::CatchParam);
            }
            clause.body.stmts.visit_with(this);
        });
    }

    fn visit_for_stmt(&mut self, stmt: &ForStmt) {
        self.with_scope(ScopeKind::Block, stmt.span, |this| {
            stmt.visit_children_with(this);
        });
    }

    fn visit_for_in_stmt(&mut self, stmt: &ForInStmt) {
        self.with_scope(ScopeKind::Block, stmt.span, |this| {
            stmt.visit_children_with(this);
        });
    }

    fn visit_for_of_stmt(&mut self, stmt: &ForOfStmt) {
        self.with_scope(ScopeKind::Block, stmt.span, |this| {
            stmt.visit_children_with(this);
        });
    }

    fn visit_switch_stmt(&mut self, stmt: &SwitchStmt) {
        stmt.discriminant.visit_with(self);
        self.with_scope(ScopeKind::Block, stmt.span, |this| {
            stmt.cases.visit_with(this);
        });
    }

    fn visit_jsx_element_name(&mut self, name: &JSXElementName) {
        match name {
            // <div /> is an intrinsic element, <Foo /> a component binding
            JSXElementName::Ident(ident) => {
                if is_component_name(&ident.sym) {
                    self.visit_ident(ident);
                }
            }
            JSXElementName::JSXMemberExpr(member) => member.visit_with(self),
            JSXElementName::JSXNamespacedName(_) => {}
        }
    }
}
