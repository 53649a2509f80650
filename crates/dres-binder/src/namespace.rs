//! Public, export and import namespaces of libraries.

use dres_common::limits::MAX_EXPORT_DEPTH;
use dres_element::{Combinator, Element, ElementId, ElementKind, ElementModel};
use indexmap::IndexMap;
use rustc_hash::FxHashSet;
use tracing::trace;

/// Name to element mapping in insertion order. Setters are keyed `x=`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Namespace {
    definitions: IndexMap<String, ElementId>,
}

impl Namespace {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<ElementId> {
        self.definitions.get(name).copied()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.definitions.contains_key(name)
    }

    /// Insert unless `name` is already bound; returns the existing element
    /// when it differs from `element`.
    pub fn define(&mut self, name: impl Into<String>, element: ElementId) -> Option<ElementId> {
        let name = name.into();
        match self.definitions.get(&name) {
            Some(&existing) if existing != element => Some(existing),
            Some(_) => None,
            None => {
                self.definitions.insert(name, element);
                None
            }
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, ElementId)> {
        self.definitions.iter().map(|(k, &v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }

    /// Apply `show`/`hide` combinators in order. A combinator name covers
    /// both the getter `x` and the setter `x=`.
    pub fn filtered(&self, combinators: &[Combinator]) -> Namespace {
        let mut definitions = self.definitions.clone();
        for combinator in combinators {
            match combinator {
                Combinator::Show(names) => {
                    definitions.retain(|k, _| names.iter().any(|n| base_name(k) == n));
                }
                Combinator::Hide(names) => {
                    definitions.retain(|k, _| !names.iter().any(|n| base_name(k) == n));
                }
            }
        }
        Namespace { definitions }
    }
}

fn base_name(name: &str) -> &str {
    name.strip_suffix('=').unwrap_or(name)
}

pub struct NamespaceBuilder<'a> {
    model: &'a ElementModel,
}

impl<'a> NamespaceBuilder<'a> {
    pub fn new(model: &'a ElementModel) -> Self {
        Self { model }
    }

    /// Top-level declarations of every unit of `library`, private names
    /// included when `include_private` is set. Duplicates keep the first.
    pub fn definitions(&self, library: ElementId, include_private: bool) -> Namespace {
        let mut namespace = Namespace::new();
        for unit in self.model.library_units(library) {
            for element in self.top_level_elements(unit) {
                let Some(e) = self.model.element(element) else {
                    continue;
                };
                if !include_private && e.is_private() {
                    continue;
                }
                namespace.define(e.name.clone(), element);
            }
        }
        namespace
    }

    /// Elements declared at the top of `unit`, as the namespace sees them:
    /// variables contribute their accessors.
    pub fn top_level_elements(&self, unit: ElementId) -> Vec<ElementId> {
        let Some(data) = self.model.element(unit).and_then(Element::as_unit) else {
            return Vec::new();
        };
        data.classes
            .iter()
            .chain(data.function_type_aliases.iter())
            .chain(data.functions.iter())
            .chain(data.accessors.iter())
            .copied()
            .collect()
    }

    pub fn public_namespace(&self, library: ElementId) -> Namespace {
        self.definitions(library, false)
    }

    /// Public namespace plus everything re-exported, following export
    /// cycles at most once per library.
    pub fn export_namespace(&self, library: ElementId) -> Namespace {
        let mut visited = FxHashSet::default();
        self.export_namespace_inner(library, &mut visited, 0)
    }

    fn export_namespace_inner(
        &self,
        library: ElementId,
        visited: &mut FxHashSet<ElementId>,
        depth: usize,
    ) -> Namespace {
        let mut namespace = self.public_namespace(library);
        if depth >= MAX_EXPORT_DEPTH || !visited.insert(library) {
            return namespace;
        }
        let Some(data) = self.model.element(library).and_then(Element::as_library) else {
            return namespace;
        };
        for &export in &data.exports {
            let Some(export) = self.model.element(export).and_then(Element::as_export) else {
                continue;
            };
            if export.exported_library.is_none() {
                continue;
            }
            let exported = self
                .export_namespace_inner(export.exported_library, visited, depth + 1)
                .filtered(&export.combinators);
            for (name, element) in exported.iter() {
                namespace.define(name, element);
            }
        }
        visited.remove(&library);
        namespace
    }

    /// Names `import` makes visible, before any prefix is applied.
    pub fn import_namespace(&self, import: ElementId) -> Namespace {
        let Some(data) = self.model.element(import).and_then(Element::as_import) else {
            return Namespace::new();
        };
        if data.imported_library.is_none() {
            return Namespace::new();
        }
        let namespace = self
            .export_namespace(data.imported_library)
            .filtered(&data.combinators);
        trace!(import = import.0, names = namespace.len(), "import namespace");
        namespace
    }

    /// Union of the namespaces of every import that uses `prefix`.
    pub fn prefixed_namespace(&self, prefix: ElementId) -> Vec<(ElementId, Namespace)> {
        let Some(data) = self.model.element(prefix).and_then(Element::as_prefix) else {
            return Vec::new();
        };
        data.imports
            .iter()
            .map(|&import| (import, self.import_namespace(import)))
            .collect()
    }

    /// Imports of `library` without a prefix, in declaration order.
    pub fn unprefixed_imports(&self, library: ElementId) -> Vec<ElementId> {
        let Some(data) = self.model.element(library).and_then(Element::as_library) else {
            return Vec::new();
        };
        data.imports
            .iter()
            .copied()
            .filter(|&i| {
                self.model
                    .element(i)
                    .and_then(Element::as_import)
                    .is_some_and(|d| d.prefix.is_none())
            })
            .collect()
    }

    /// The library providing an imported element.
    pub fn defining_library(&self, element: ElementId) -> ElementId {
        self.model.elements.enclosing_of_kind(element, ElementKind::Library)
    }
}
