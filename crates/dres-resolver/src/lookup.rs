//! Name lookups shared by the resolution passes.

use dres_binder::{LOAD_LIBRARY_NAME, Lookup, NamespaceBuilder};
use dres_common::Diagnostic;
use dres_element::{Element, ElementFlags, ElementId, ElementKind, ElementModel};
use dres_syntax::{NodeArena, NodeIndex};
use smallvec::SmallVec;

/// Look `name` up among the imports that use `prefix`. For a deferred
/// prefix, `loadLibrary` names the load function of the imported library.
pub(crate) fn prefixed_lookup(model: &ElementModel, prefix: ElementId, name: &str) -> Lookup {
    let namespaces = NamespaceBuilder::new(model);
    let mut found: SmallVec<[ElementId; 2]> = SmallVec::new();
    for (import, namespace) in namespaces.prefixed_namespace(prefix) {
        let element = match namespace.get(name) {
            Some(element) => element,
            None if name == LOAD_LIBRARY_NAME && model.has_flag(import, ElementFlags::DEFERRED) => {
                load_library_of(model, import)
            }
            None => continue,
        };
        if element.is_some() && !found.contains(&element) {
            found.push(element);
        }
    }
    match found.len() {
        0 => Lookup::NotFound,
        1 => Lookup::Found(found[0]),
        _ => Lookup::Ambiguous(found),
    }
}

fn load_library_of(model: &ElementModel, import: ElementId) -> ElementId {
    let Some(data) = model.element(import).and_then(Element::as_import) else {
        return ElementId::NONE;
    };
    model
        .element(data.imported_library)
        .and_then(Element::as_library)
        .map_or(ElementId::NONE, |l| l.load_library)
}

/// Names of the libraries that contribute the elements of an ambiguous
/// lookup, for `AMBIGUOUS_IMPORT`.
pub(crate) fn library_names(model: &ElementModel, elements: &[ElementId]) -> String {
    elements
        .iter()
        .map(|&e| {
            let library = model.elements.library_of(e);
            model
                .library_source(library)
                .map_or_else(|| model.name(library).to_string(), |s| s.uri().to_string())
        })
        .collect::<Vec<_>>()
        .join(", ")
}

/// True for elements a `TypeName` may denote.
pub(crate) fn is_type_element(model: &ElementModel, element: ElementId) -> bool {
    matches!(
        model.kind(element),
        Some(ElementKind::Class | ElementKind::TypeParameter | ElementKind::FunctionTypeAlias)
    )
}

/// Diagnostic spanning `node`.
pub(crate) fn diagnostic_at(
    source: &dres_common::Source,
    arena: &NodeArena,
    node: NodeIndex,
    code: u32,
    args: Vec<String>,
) -> Diagnostic {
    Diagnostic::new(source.clone(), arena.offset(node), arena.length(node), code, args)
}
