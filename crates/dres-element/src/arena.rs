//! Element storage.

use crate::element::{Element, ElementData, ElementId, ElementKind};
use smallvec::SmallVec;

/// Child list returned by [`ElementArena::children`].
pub type ElementChildren = SmallVec<[ElementId; 8]>;

#[derive(Clone, Debug, Default)]
pub struct ElementArena {
    elements: Vec<Element>,
}

impl ElementArena {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `element` inside `enclosing` and return its id. The caller is
    /// responsible for listing it in the container's child vector.
    pub fn add(&mut self, mut element: Element, enclosing: ElementId) -> ElementId {
        let id = ElementId(self.elements.len() as u32);
        element.enclosing = enclosing;
        self.elements.push(element);
        id
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    #[inline]
    pub fn get(&self, id: ElementId) -> Option<&Element> {
        if id.is_none() {
            return None;
        }
        self.elements.get(id.0 as usize)
    }

    #[inline]
    pub fn get_mut(&mut self, id: ElementId) -> Option<&mut Element> {
        if id.is_none() {
            return None;
        }
        self.elements.get_mut(id.0 as usize)
    }

    pub fn kind(&self, id: ElementId) -> Option<ElementKind> {
        self.get(id).map(Element::kind)
    }

    pub fn name(&self, id: ElementId) -> &str {
        self.get(id).map_or("", |e| e.name.as_str())
    }

    pub fn enclosing(&self, id: ElementId) -> ElementId {
        self.get(id).map_or(ElementId::NONE, |e| e.enclosing)
    }

    /// Enclosing elements of `id`, nearest first, excluding `id`.
    pub fn ancestors(&self, id: ElementId) -> impl Iterator<Item = ElementId> + '_ {
        let mut current = self.enclosing(id);
        std::iter::from_fn(move || {
            let out = current.to_option()?;
            current = self.enclosing(out);
            Some(out)
        })
    }

    /// Nearest element (`id` included) of kind `kind`.
    pub fn enclosing_of_kind(&self, id: ElementId, kind: ElementKind) -> ElementId {
        std::iter::once(id)
            .chain(self.ancestors(id))
            .find(|&e| self.kind(e) == Some(kind))
            .unwrap_or(ElementId::NONE)
    }

    pub fn library_of(&self, id: ElementId) -> ElementId {
        self.enclosing_of_kind(id, ElementKind::Library)
    }

    pub fn unit_of(&self, id: ElementId) -> ElementId {
        self.enclosing_of_kind(id, ElementKind::CompilationUnit)
    }

    pub fn class_of(&self, id: ElementId) -> ElementId {
        self.enclosing_of_kind(id, ElementKind::Class)
    }

    /// Direct children in declaration order, grouped by kind.
    pub fn children(&self, id: ElementId) -> ElementChildren {
        let mut out = ElementChildren::new();
        let Some(element) = self.get(id) else {
            return out;
        };
        match &element.data {
            ElementData::Library(d) => {
                out.push(d.defining_unit);
                out.extend(d.parts.iter().copied());
                out.extend(d.imports.iter().copied());
                out.extend(d.exports.iter().copied());
                out.extend(d.prefixes.iter().copied());
                out.push(d.load_library);
            }
            ElementData::CompilationUnit(d) => {
                out.extend(d.classes.iter().copied());
                out.extend(d.function_type_aliases.iter().copied());
                out.extend(d.functions.iter().copied());
                out.extend(d.top_level_variables.iter().copied());
                out.extend(d.accessors.iter().copied());
            }
            ElementData::Class(d) => {
                out.extend(d.type_parameters.iter().copied());
                out.extend(d.constructors.iter().copied());
                out.extend(d.fields.iter().copied());
                out.extend(d.accessors.iter().copied());
                out.extend(d.methods.iter().copied());
            }
            ElementData::Executable(d) => {
                out.extend(d.parameters.iter().copied());
                out.extend(d.labels.iter().copied());
                out.extend(d.local_variables.iter().copied());
                out.extend(d.local_functions.iter().copied());
            }
            ElementData::Parameter(d) => out.extend(d.parameters.iter().copied()),
            ElementData::Variable(d) => out.push(d.initializer),
            ElementData::FunctionTypeAlias(d) => {
                out.extend(d.type_parameters.iter().copied());
                out.extend(d.parameters.iter().copied());
            }
            ElementData::TypeParameter(_)
            | ElementData::Label(_)
            | ElementData::Import(_)
            | ElementData::Export(_)
            | ElementData::Prefix(_) => {}
        }
        out.retain(|c| c.is_some());
        out
    }

    /// All elements strictly below `root`, in pre-order.
    pub fn descendants(&self, root: ElementId) -> Vec<ElementId> {
        let mut out = Vec::new();
        let mut stack: Vec<ElementId> = self.children(root).into_iter().rev().collect();
        while let Some(id) = stack.pop() {
            out.push(id);
            stack.extend(self.children(id).into_iter().rev());
        }
        out
    }

    pub fn iter(&self) -> impl Iterator<Item = (ElementId, &Element)> {
        self.elements
            .iter()
            .enumerate()
            .map(|(i, e)| (ElementId(i as u32), e))
    }
}
