//! Lexical scopes.
//!
//! A [`LibraryScope`] is the root: the library's own top-level names and
//! prefixes, then the names of its unprefixed imports. Nested scopes are
//! frames on a [`ScopeStack`] pushed and popped in strict stack order by the
//! visitors. Label scopes are a separate chain ([`LabelScope`]).

use crate::namespace::{Namespace, NamespaceBuilder};
use dres_common::diagnostics::diagnostic_codes;
use dres_common::{Diagnostic, DiagnosticSink};
use dres_element::{Element, ElementId, ElementKind, ElementModel};
use dres_syntax::NodeIndex;
use rustc_hash::FxHashMap;
use smallvec::SmallVec;
use tracing::trace;

/// Result of a name lookup.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Lookup {
    Found(ElementId),
    /// A local declared later in an enclosing block.
    Hidden(ElementId),
    /// Distinct elements contributed by several imports.
    Ambiguous(SmallVec<[ElementId; 2]>),
    NotFound,
}

impl Lookup {
    /// The element found, including hidden ones; `NONE` otherwise.
    pub fn element(&self) -> ElementId {
        match self {
            Lookup::Found(e) | Lookup::Hidden(e) => *e,
            _ => ElementId::NONE,
        }
    }

    pub fn is_found(&self) -> bool {
        matches!(self, Lookup::Found(_))
    }
}

#[derive(Clone, Debug)]
pub struct LibraryScope {
    pub library: ElementId,
    definitions: Namespace,
    imports: Vec<Namespace>,
}

impl LibraryScope {
    /// Build the scope of `library`, reporting clashing top-level names.
    #[tracing::instrument(level = "debug", skip(model, sink), fields(library = library.0))]
    pub fn new(model: &ElementModel, library: ElementId, sink: &mut dyn DiagnosticSink) -> Self {
        let namespaces = NamespaceBuilder::new(model);
        let mut definitions = Namespace::new();
        let mut declared: Vec<ElementId> = Vec::new();
        for unit in model.library_units(library) {
            declared.extend(namespaces.top_level_elements(unit));
        }
        if let Some(data) = model.element(library).and_then(Element::as_library) {
            declared.extend(data.prefixes.iter().copied());
        }
        for element in declared {
            let name = model.name(element).to_string();
            if definitions.define(name.clone(), element).is_some() {
                report_duplicate(model, element, library, sink);
            }
        }
        let imports = namespaces
            .unprefixed_imports(library)
            .into_iter()
            .map(|i| namespaces.import_namespace(i))
            .collect();
        Self {
            library,
            definitions,
            imports,
        }
    }

    /// Scope with explicit contents, for hosts and tests.
    pub fn from_parts(library: ElementId, definitions: Namespace, imports: Vec<Namespace>) -> Self {
        Self {
            library,
            definitions,
            imports,
        }
    }

    pub fn definitions(&self) -> &Namespace {
        &self.definitions
    }

    pub fn lookup(&self, model: &ElementModel, name: &str) -> Lookup {
        if let Some(element) = self.definitions.get(name) {
            return Lookup::Found(element);
        }
        let mut found: SmallVec<[ElementId; 2]> = SmallVec::new();
        for namespace in &self.imports {
            if let Some(element) = namespace.get(name)
                && !found.contains(&element)
            {
                found.push(element);
            }
        }
        match found.len() {
            0 => Lookup::NotFound,
            1 => Lookup::Found(found[0]),
            _ => {
                // Elements of user libraries shadow platform ones.
                let user: SmallVec<[ElementId; 2]> = found
                    .iter()
                    .copied()
                    .filter(|&e| !is_sdk_element(model, e))
                    .collect();
                match user.len() {
                    1 => Lookup::Found(user[0]),
                    0 => Lookup::Ambiguous(found),
                    _ => Lookup::Ambiguous(user),
                }
            }
        }
    }
}

fn is_sdk_element(model: &ElementModel, element: ElementId) -> bool {
    let library = model.elements.library_of(element);
    model.library_source(library).is_some_and(|s| s.is_dart_uri())
}

fn report_duplicate(
    model: &ElementModel,
    element: ElementId,
    library: ElementId,
    sink: &mut dyn DiagnosticSink,
) {
    let Some(e) = model.element(element) else {
        return;
    };
    let source = model
        .source_of(element)
        .or_else(|| model.library_source(library))
        .cloned();
    if let Some(source) = source {
        sink.report(Diagnostic::new(
            source,
            e.name_offset,
            e.display_name().len() as u32,
            diagnostic_codes::DUPLICATE_DEFINITION,
            vec![e.display_name().to_string()],
        ));
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ScopeKind {
    /// Members declared in a class body.
    Class,
    TypeParameters,
    /// Parameters of a function, method or constructor.
    Function,
    /// Type parameters and parameters of a function type alias.
    FunctionType,
    Block,
    Catch,
    /// Loop variables of `for` and `for-in`.
    Loop,
}

#[derive(Clone, Debug)]
pub struct Scope {
    pub kind: ScopeKind,
    /// Class, executable or alias the scope belongs to, if any.
    pub owner: ElementId,
    names: FxHashMap<String, ElementId>,
    hidden: FxHashMap<String, ElementId>,
}

impl Scope {
    pub fn new(kind: ScopeKind, owner: ElementId) -> Self {
        Self {
            kind,
            owner,
            names: FxHashMap::default(),
            hidden: FxHashMap::default(),
        }
    }

    /// Bind `name`; returns the element it already named, if different.
    pub fn define(&mut self, name: impl Into<String>, element: ElementId) -> Option<ElementId> {
        let name = name.into();
        self.hidden.remove(&name);
        match self.names.get(&name) {
            Some(&existing) if existing != element => Some(existing),
            Some(_) => None,
            None => {
                self.names.insert(name, element);
                None
            }
        }
    }

    /// Mark `name` as declared later in this block.
    pub fn hide(&mut self, name: impl Into<String>, element: ElementId) {
        let name = name.into();
        if !self.names.contains_key(&name) {
            self.hidden.insert(name, element);
        }
    }

    pub fn get(&self, name: &str) -> Option<Lookup> {
        if let Some(&e) = self.names.get(name) {
            return Some(Lookup::Found(e));
        }
        self.hidden.get(name).map(|&e| Lookup::Hidden(e))
    }

    pub fn names(&self) -> impl Iterator<Item = (&str, ElementId)> {
        self.names.iter().map(|(k, &v)| (k.as_str(), v))
    }
}

#[derive(Clone, Debug, Default)]
pub struct ScopeStack {
    frames: Vec<Scope>,
}

impl ScopeStack {
    pub fn new() -> Self {
        Self::default()
    }

    /// Push `scope` and return the depth to restore with [`truncate`](Self::truncate).
    pub fn push(&mut self, scope: Scope) -> usize {
        trace!(kind = ?scope.kind, depth = self.frames.len(), "push scope");
        let depth = self.frames.len();
        self.frames.push(scope);
        depth
    }

    pub fn pop(&mut self) -> Option<Scope> {
        self.frames.pop()
    }

    pub fn truncate(&mut self, depth: usize) {
        self.frames.truncate(depth);
    }

    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    pub fn frames(&self) -> &[Scope] {
        &self.frames
    }

    pub fn innermost_mut(&mut self) -> Option<&mut Scope> {
        self.frames.last_mut()
    }

    /// Define in the innermost frame; returns a clashing earlier element.
    pub fn define(&mut self, name: impl Into<String>, element: ElementId) -> Option<ElementId> {
        self.frames.last_mut()?.define(name, element)
    }

    pub fn lookup(&self, library: &LibraryScope, model: &ElementModel, name: &str) -> Lookup {
        for frame in self.frames.iter().rev() {
            if let Some(found) = frame.get(name) {
                return found;
            }
        }
        library.lookup(model, name)
    }

    /// Lookup restricted to the nested frames.
    pub fn lookup_local(&self, name: &str) -> Option<Lookup> {
        self.frames.iter().rev().find_map(|f| f.get(name))
    }

    /// Nearest frame owner of kind `kind`.
    pub fn enclosing_owner(&self, model: &ElementModel, kind: ElementKind) -> ElementId {
        self.frames
            .iter()
            .rev()
            .map(|f| f.owner)
            .find(|&o| model.kind(o) == Some(kind))
            .unwrap_or(ElementId::NONE)
    }
}

/// Result of resolving a `break`/`continue` label.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LabelLookup {
    Target { element: ElementId, node: NodeIndex },
    /// Declared by an enclosing function.
    OuterFunction(ElementId),
    Undefined,
    /// No enclosing loop or switch for an unlabeled statement.
    NoEnclosingTarget,
}

#[derive(Clone, Debug)]
struct LabelEntry {
    /// Empty for the implicit target of a loop or switch.
    name: String,
    element: ElementId,
    node: NodeIndex,
    function: u32,
}

#[derive(Clone, Debug, Default)]
pub struct LabelScope {
    entries: Vec<LabelEntry>,
    function: u32,
}

impl LabelScope {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enter a function body; labels outside it become unreachable targets.
    pub fn enter_function(&mut self) {
        self.function += 1;
    }

    pub fn exit_function(&mut self) {
        self.function = self.function.saturating_sub(1);
    }

    pub fn push(&mut self, name: impl Into<String>, element: ElementId, node: NodeIndex) -> usize {
        let depth = self.entries.len();
        self.entries.push(LabelEntry {
            name: name.into(),
            element,
            node,
            function: self.function,
        });
        depth
    }

    /// Loops and switches are targets of unlabeled `break`/`continue`.
    pub fn push_implicit(&mut self, node: NodeIndex) -> usize {
        self.push("", ElementId::NONE, node)
    }

    pub fn truncate(&mut self, depth: usize) {
        self.entries.truncate(depth);
    }

    pub fn depth(&self) -> usize {
        self.entries.len()
    }

    pub fn lookup(&self, name: Option<&str>) -> LabelLookup {
        match name {
            None => self
                .entries
                .iter()
                .rev()
                .take_while(|e| e.function == self.function)
                .find(|e| e.name.is_empty())
                .map_or(LabelLookup::NoEnclosingTarget, |e| LabelLookup::Target {
                    element: e.element,
                    node: e.node,
                }),
            Some(name) => match self.entries.iter().rev().find(|e| e.name == name) {
                Some(e) if e.function == self.function => LabelLookup::Target {
                    element: e.element,
                    node: e.node,
                },
                Some(e) => LabelLookup::OuterFunction(e.element),
                None => LabelLookup::Undefined,
            },
        }
    }
}

#[cfg(test)]
#[path = "../tests/scope_tests.rs"]
mod tests;
