//! Lexical scope graph of a single module.
//!
//! The graph is built once per module by [`builder::ScopeGraphBuilder`] and is
//! immutable afterwards. Every declaring identifier and every identifier
//! reference is indexed by its source span, so transforms walking the same
//! AST can map an [`Ident`] back to its [`Binding`] without another builder
//! pass.

pub(crate) mod builder;
mod import_origin;
mod resolver;

use std::collections::HashMap;
use std::fmt;

use swc_core::common::Span;
use swc_core::ecma::ast::{Ident, Module};
use swc_core::ecma::atoms::Atom;

pub(crate) use self::resolver::unparen;
pub use self::resolver::{ImportedName, Resolution};
use crate::error::ShakeError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ScopeId(u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BindingId(u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ReferenceId(u32);

impl ScopeId {
    fn index(self) -> usize {
        self.0 as usize
    }
}

impl BindingId {
    fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopeKind {
    Module,
    /// Parameters and the name of a function expression. The body is a
    /// child `Function` scope, so parameter defaults never see body
    /// declarations.
    Params,
    Function,
    Block,
    Catch,
    Class,
}

#[derive(Debug, Clone)]
pub struct Scope {
    pub parent: Option<ScopeId>,
    pub kind: ScopeKind,
    pub span: Span,
    bindings: HashMap<Atom, BindingId>,
}

impl Scope {
    pub fn get(&self, name: &Atom) -> Option<BindingId> {
        self.bindings.get(name).copied()
    }

    pub fn bindings(&self) -> impl Iterator<Item = (&Atom, BindingId)> {
        self.bindings.iter().map(|(name, id)| (name, *id))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindingKind {
    Var,
    LetOrConst,
    Function,
    Class,
    Param,
    ImportNamed,
    ImportNamespace,
    ImportDefault,
    CatchParam,
    PatternElement,
}

impl BindingKind {
    pub fn is_import(&self) -> bool {
        matches!(
            self,
            BindingKind::ImportNamed | BindingKind::ImportNamespace | BindingKind::ImportDefault
        )
    }
}

/// One step from a destructuring pattern root down to a leaf.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PathSegment {
    Index(usize),
    Key(Atom),
    Computed,
    Rest,
}

/// Where a pattern element lives inside its destructuring pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatternSlot {
    /// Span of the root pattern node, e.g. the declarator's `name`.
    pub pattern: Span,
    pub path: Vec<PathSegment>,
}

#[derive(Debug, Clone)]
pub struct Binding {
    pub scope: ScopeId,
    pub name: Atom,
    pub kind: BindingKind,
    /// `var` and function declarations.
    pub hoisted: bool,
    /// `let`, `const` and class declarations; the binding claims its whole
    /// scope, including positions before the declaration.
    pub block_scoped: bool,
    pub span: Span,
    pub pattern: Option<PatternSlot>,
}

#[derive(Debug, Clone)]
pub struct Reference {
    pub name: Atom,
    pub scope: ScopeId,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImportOrigin {
    /// `import { imported as local }`
    Named(Atom),
    /// `import local from`
    Default,
    /// `import * as local from`
    Namespace,
    /// Type-only imports and anything else that never names a runtime value.
    Opaque,
}

#[derive(Debug, Clone)]
pub struct ImportRecord {
    pub binding: BindingId,
    pub src: Atom,
    pub origin: ImportOrigin,
}

pub struct ScopeGraph {
    scopes: Vec<Scope>,
    bindings: Vec<Binding>,
    references: Vec<Reference>,
    imports: Vec<ImportRecord>,
    declarations: HashMap<Span, BindingId>,
    reference_sites: HashMap<Span, ReferenceId>,
    import_index: HashMap<BindingId, usize>,
}

impl fmt::Debug for ScopeGraph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScopeGraph")
            .field("scopes", &self.scopes.len())
            .field("bindings", &self.bindings.len())
            .field("references", &self.references.len())
            .field("imports", &self.imports.len())
            .finish()
    }
}

impl ScopeGraph {
    pub const MODULE: ScopeId = ScopeId(0);

    pub fn build(module: &Module) -> Result<Self, ShakeError> {
        builder::ScopeGraphBuilder::build(module)
    }

    fn new(module_span: Span) -> Self {
        Self {
            scopes: vec![Scope {
                parent: None,
                kind: ScopeKind::Module,
                span: module_span,
                bindings: HashMap::new(),
            }],
            bindings: vec![],
            references: vec![],
            imports: vec![],
            declarations: HashMap::new(),
            reference_sites: HashMap::new(),
            import_index: HashMap::new(),
        }
    }

    pub fn scope(&self, id: ScopeId) -> &Scope {
        &self.scopes[id.index()]
    }

    pub fn binding(&self, id: BindingId) -> &Binding {
        &self.bindings[id.index()]
    }

    pub fn bindings(&self) -> impl Iterator<Item = (BindingId, &Binding)> {
        self.bindings
            .iter()
            .enumerate()
            .map(|(index, binding)| (BindingId(index as u32), binding))
    }

    pub fn references(&self) -> &[Reference] {
        &self.references
    }

    pub fn imports(&self) -> &[ImportRecord] {
        &self.imports
    }

    pub fn import_record(&self, binding: BindingId) -> Option<&ImportRecord> {
        self.import_index
            .get(&binding)
            .map(|index| &self.imports[*index])
    }

    /// The binding introduced by a declaring identifier.
    pub fn declared_at(&self, ident: &Ident) -> Option<BindingId> {
        self.declarations.get(&ident.span).copied()
    }

    /// The reference recorded for an identifier use site.
    pub fn reference_at(&self, ident: &Ident) -> Option<&Reference> {
        self.reference_sites
            .get(&ident.span)
            .map(|id| &self.references[id.0 as usize])
    }

    pub fn is_module_level(&self, binding: BindingId) -> bool {
        self.binding(binding).scope == Self::MODULE
    }

    fn add_scope(&mut self, kind: ScopeKind, parent: ScopeId, span: Span) -> ScopeId {
        let id = ScopeId(self.scopes.len() as u32);
        self.scopes.push(Scope {
            parent: Some(parent),
            kind,
            span,
            bindings: HashMap::new(),
        });
        id
    }

    fn add_binding(&mut self, binding: Binding) -> Result<BindingId, ShakeError> {
        let scope = &self.scopes[binding.scope.index()];
        if let Some(existing) = scope.get(&binding.name) {
            let previous = &self.bindings[existing.index()];
            // module code is strict: a function may not share its name with
            // another hoisted declaration of the module scope
            if scope.kind == ScopeKind::Module
                && previous.hoisted
                && binding.hoisted
                && (previous.kind == BindingKind::Function || binding.kind == BindingKind::Function)
            {
                return Err(ShakeError::DuplicateBinding {
                    name: binding.name.to_string(),
                    first: previous.span,
                    second: binding.span,
                });
            }
            self.declarations.insert(binding.span, existing);
            return Ok(existing);
        }

        let id = BindingId(self.bindings.len() as u32);
        self.scopes[binding.scope.index()]
            .bindings
            .insert(binding.name.clone(), id);
        self.declarations.insert(binding.span, id);
        self.bindings.push(binding);
        Ok(id)
    }

    /// Indexes another declaring site of an existing binding, e.g. a body
    /// `var` naming a parameter.
    fn redeclare(&mut self, span: Span, binding: BindingId) {
        self.declarations.insert(span, binding);
    }

    fn add_reference(&mut self, ident: &Ident, scope: ScopeId) {
        let id = ReferenceId(self.references.len() as u32);
        self.references.push(Reference {
            name: ident.sym.clone(),
            scope,
            span: ident.span,
        });
        self.reference_sites.insert(ident.span, id);
    }

    fn add_import(&mut self, record: ImportRecord) {
        self.import_index.insert(record.binding, self.imports.len());
        self.imports.push(record);
    }
}
