//! Library elements: units, parts and directives.
//!
//! Building a library happens in two phases so that every library of an
//! import cycle exists before any directive is linked:
//!
//! 1. [`LibraryElementBuilder::build`] creates the library, its units and its
//!    import/export/prefix elements with unresolved targets.
//! 2. [`LibraryElementBuilder::link`] resolves directive URIs to the library
//!    elements built in phase 1.

use crate::annotations::UnitAnnotations;
use crate::builder::ElementBuilder;
use dres_common::diagnostics::diagnostic_codes;
use dres_common::{Diagnostic, DiagnosticSink, Source, SourceFactory};
use dres_element::{
    Combinator, Element, ElementData, ElementFlags, ElementId, ExecutableData, ExecutableKind,
    ExportData, ImportData, LibraryData, ElementModel, PrefixData,
};
use dres_syntax::{NodeArena, NodeIndex, NodeKind, ParsedUnit};
use rustc_hash::FxHashMap;
use tracing::{debug, trace};

pub const CORE_LIBRARY_URI: &str = "dart:core";
pub const LOAD_LIBRARY_NAME: &str = "loadLibrary";

/// Parsed units by source. Hosts own the trees; the resolver only reads them.
pub trait UnitProvider {
    fn unit(&self, source: &Source) -> Option<&ParsedUnit>;
}

impl UnitProvider for FxHashMap<Source, ParsedUnit> {
    fn unit(&self, source: &Source) -> Option<&ParsedUnit> {
        self.get(source)
    }
}

pub struct LibraryElementBuilder<'a> {
    model: &'a mut ElementModel,
    factory: &'a dyn SourceFactory,
    units: &'a dyn UnitProvider,
    sink: &'a mut dyn DiagnosticSink,
    enable_deferred_loading: bool,
}

impl<'a> LibraryElementBuilder<'a> {
    pub fn new(
        model: &'a mut ElementModel,
        factory: &'a dyn SourceFactory,
        units: &'a dyn UnitProvider,
        sink: &'a mut dyn DiagnosticSink,
    ) -> Self {
        Self {
            model,
            factory,
            units,
            sink,
            enable_deferred_loading: true,
        }
    }

    pub fn with_deferred_loading(mut self, enabled: bool) -> Self {
        self.enable_deferred_loading = enabled;
        self
    }

    /// Build the library whose defining unit is `source`, replacing the
    /// annotations of each of its units. Returns `None` when the unit is not
    /// available.
    #[tracing::instrument(level = "debug", skip(self, annotations), fields(source = %source))]
    pub fn build(
        &mut self,
        source: &Source,
        annotations: &mut FxHashMap<Source, UnitAnnotations>,
    ) -> Option<ElementId> {
        let units = self.units;
        let parsed = units.unit(source)?;
        let (name, name_offset) = library_name(parsed);
        let library = self.model.elements.add(
            Element::new(
                name.clone(),
                name_offset,
                ElementData::Library(LibraryData {
                    source: source.clone(),
                    defining_unit: ElementId::NONE,
                    parts: Vec::new(),
                    imports: Vec::new(),
                    exports: Vec::new(),
                    prefixes: Vec::new(),
                    load_library: ElementId::NONE,
                }),
            ),
            ElementId::NONE,
        );

        let mut defining = UnitAnnotations::new();
        let unit = ElementBuilder::build_unit(self.model, parsed, &mut defining, library);
        if let Some(data) = self.model.element_mut(library).and_then(Element::as_library_mut) {
            data.defining_unit = unit;
        }

        for &directive in parsed.directives() {
            match parsed.arena.kind(directive) {
                Some(NodeKind::LibraryDirective { .. }) => defining.declare(directive, library),
                Some(NodeKind::PartDirective { uri, .. }) => {
                    let uri = *uri;
                    if let Some(part) = self.build_part(parsed, uri, &name, library, annotations) {
                        defining.declare(directive, part);
                    }
                }
                Some(NodeKind::ImportDirective { .. }) => {
                    let import = self.build_import(parsed, directive, library, &mut defining);
                    defining.declare(directive, import);
                }
                Some(NodeKind::ExportDirective { uri, combinators, .. }) => {
                    let export = self.model.add_child(
                        Element::new(
                            "",
                            parsed.arena.offset(directive),
                            ElementData::Export(ExportData {
                                uri: parsed.arena.string_value(*uri).unwrap_or_default(),
                                exported_library: ElementId::NONE,
                                combinators: combinators_of(&parsed.arena, combinators.nodes.as_slice()),
                            }),
                        ),
                        library,
                    );
                    defining.declare(directive, export);
                }
                _ => {}
            }
        }

        if source.uri() != CORE_LIBRARY_URI && !self.imports_core(library) {
            let mut implicit = Element::new(
                "",
                0,
                ElementData::Import(ImportData {
                    uri: CORE_LIBRARY_URI.to_string(),
                    imported_library: ElementId::NONE,
                    prefix: ElementId::NONE,
                    combinators: Vec::new(),
                    uri_span: (0, 0),
                }),
            );
            implicit.flags |= ElementFlags::SYNTHETIC;
            self.model.add_child(implicit, library);
        }

        if self.enable_deferred_loading {
            let mut load = Element::new(
                LOAD_LIBRARY_NAME,
                0,
                ElementData::Executable(ExecutableData::new(ExecutableKind::Function)),
            );
            load.flags |= ElementFlags::SYNTHETIC | ElementFlags::STATIC;
            self.model.add_child(load, library);
        }

        annotations.insert(source.clone(), defining);
        self.model.register_library(source.clone(), library);
        debug!(library = library.0, name = %name, "library built");
        Some(library)
    }

    fn imports_core(&self, library: ElementId) -> bool {
        let Some(data) = self.model.element(library).and_then(Element::as_library) else {
            return false;
        };
        data.imports.iter().any(|&i| {
            self.model
                .element(i)
                .and_then(Element::as_import)
                .is_some_and(|d| d.uri == CORE_LIBRARY_URI)
        })
    }

    fn build_part(
        &mut self,
        parsed: &ParsedUnit,
        uri_node: NodeIndex,
        library_name: &str,
        library: ElementId,
        annotations: &mut FxHashMap<Source, UnitAnnotations>,
    ) -> Option<ElementId> {
        let uri = parsed.arena.string_value(uri_node).unwrap_or_default();
        let units = self.units;
        let part = self
            .factory
            .resolve_uri(&parsed.source, &uri)
            .and_then(|s| units.unit(&s));
        let Some(part) = part else {
            self.report(parsed, uri_node, diagnostic_codes::URI_DOES_NOT_EXIST, vec![uri]);
            return None;
        };
        let Some(part_of) = part.part_of_name() else {
            self.report(parsed, uri_node, diagnostic_codes::PART_OF_NON_PART, vec![uri]);
            return None;
        };
        if !part_of.is_empty() && !library_name.is_empty() && part_of != library_name {
            self.report(
                parsed,
                uri_node,
                diagnostic_codes::PART_OF_DIFFERENT_LIBRARY,
                vec![library_name.to_string(), part_of],
            );
            return None;
        }
        let mut part_annotations = UnitAnnotations::new();
        let unit = ElementBuilder::build_unit(self.model, part, &mut part_annotations, library);
        self.model.attach(library, unit);
        if let Some(&directive) = part.directives().first() {
            part_annotations.declare(directive, library);
        }
        annotations.insert(part.source.clone(), part_annotations);
        trace!(part = %part.source, "part built");
        Some(unit)
    }

    fn build_import(
        &mut self,
        parsed: &ParsedUnit,
        directive: NodeIndex,
        library: ElementId,
        annotations: &mut UnitAnnotations,
    ) -> ElementId {
        let arena = &parsed.arena;
        let Some(NodeKind::ImportDirective {
            uri,
            deferred,
            prefix,
            combinators,
            ..
        }) = arena.kind(directive)
        else {
            return ElementId::NONE;
        };
        let mut element = Element::new(
            "",
            arena.offset(directive),
            ElementData::Import(ImportData {
                uri: arena.string_value(*uri).unwrap_or_default(),
                imported_library: ElementId::NONE,
                prefix: ElementId::NONE,
                combinators: combinators_of(arena, combinators.nodes.as_slice()),
                uri_span: (arena.offset(*uri), arena.length(*uri)),
            }),
        );
        if *deferred {
            element.flags |= ElementFlags::DEFERRED;
        }
        let import = self.model.add_child(element, library);
        if let Some(prefix_name) = arena.identifier_name(*prefix) {
            let prefix_element = self.prefix_element(library, prefix_name, arena.offset(*prefix));
            annotations.declare(*prefix, prefix_element);
            annotations.set_static_element(*prefix, prefix_element);
            if let Some(data) = self.model.element_mut(prefix_element).and_then(Element::as_prefix_mut) {
                data.imports.push(import);
            }
            if let Some(data) = self.model.element_mut(import).and_then(Element::as_import_mut) {
                data.prefix = prefix_element;
            }
        }
        import
    }

    fn prefix_element(&mut self, library: ElementId, name: &str, offset: u32) -> ElementId {
        let existing = self
            .model
            .element(library)
            .and_then(Element::as_library)
            .and_then(|d| d.prefixes.iter().copied().find(|&p| self.model.name(p) == name));
        match existing {
            Some(prefix) => prefix,
            None => self.model.add_child(
                Element::new(name, offset, ElementData::Prefix(PrefixData::default())),
                library,
            ),
        }
    }

    /// Resolve the targets of the imports and exports of `library`. Every
    /// library they can reach must have been built.
    #[tracing::instrument(level = "debug", skip(self), fields(library = library.0))]
    pub fn link(&mut self, library: ElementId) {
        let Some(data) = self.model.element(library).and_then(Element::as_library) else {
            return;
        };
        let base = data.source.clone();
        let directives: Vec<ElementId> = data.imports.iter().chain(data.exports.iter()).copied().collect();
        let units = self.units;
        let defining = units.unit(&base);
        for directive in directives {
            let Some(element) = self.model.element(directive) else {
                continue;
            };
            let is_import = element.as_import().is_some();
            let is_synthetic = element.is_synthetic();
            let is_deferred = element.flags.contains(ElementFlags::DEFERRED);
            let (uri, span) = match &element.data {
                ElementData::Import(d) => (d.uri.clone(), d.uri_span),
                ElementData::Export(d) => (d.uri.clone(), (element.name_offset, 0)),
                _ => continue,
            };
            let target_source = self.factory.resolve_uri(&base, &uri);
            let target = target_source.as_ref().and_then(|s| self.model.library(s));
            let Some(target) = target else {
                if !is_synthetic {
                    let code = match target_source.as_ref().and_then(|s| units.unit(s)) {
                        Some(unit) if unit.is_part() => {
                            if is_import {
                                diagnostic_codes::IMPORT_OF_NON_LIBRARY
                            } else {
                                diagnostic_codes::EXPORT_OF_NON_LIBRARY
                            }
                        }
                        _ => diagnostic_codes::URI_DOES_NOT_EXIST,
                    };
                    self.sink
                        .report(Diagnostic::new(base.clone(), span.0, span.1, code, vec![uri]));
                }
                continue;
            };
            if is_deferred && !self.enable_deferred_loading {
                let offset = self.model.element(directive).map_or(0, |e| e.name_offset);
                let length = defining
                    .map(|u| directive_length(u, offset))
                    .unwrap_or(0);
                self.sink.report(Diagnostic::new(
                    base.clone(),
                    offset,
                    length,
                    diagnostic_codes::DEFERRED_LOADING_DISABLED,
                    vec![uri.clone()],
                ));
            }
            match self.model.element_mut(directive).map(|e| &mut e.data) {
                Some(ElementData::Import(d)) => d.imported_library = target,
                Some(ElementData::Export(d)) => d.exported_library = target,
                _ => {}
            }
        }
    }

    fn report(&mut self, parsed: &ParsedUnit, node: NodeIndex, code: u32, args: Vec<String>) {
        self.sink.report(Diagnostic::new(
            parsed.source.clone(),
            parsed.arena.offset(node),
            parsed.arena.length(node),
            code,
            args,
        ));
    }
}

/// Name and name offset from the `library` directive, or `("", 0)`.
fn library_name(parsed: &ParsedUnit) -> (String, u32) {
    let offset = parsed
        .directives()
        .iter()
        .find_map(|&d| match parsed.arena.kind(d) {
            Some(NodeKind::LibraryDirective { name, .. }) => name.first(),
            _ => None,
        })
        .map_or(0, |n| parsed.arena.offset(n));
    (parsed.library_name().unwrap_or_default(), offset)
}

fn directive_length(unit: &ParsedUnit, offset: u32) -> u32 {
    unit.directives()
        .iter()
        .find(|&&d| unit.arena.offset(d) == offset)
        .map_or(0, |&d| unit.arena.length(d))
}

pub fn combinators_of(arena: &NodeArena, nodes: &[NodeIndex]) -> Vec<Combinator> {
    nodes
        .iter()
        .filter_map(|&c| match arena.kind(c) {
            Some(NodeKind::Combinator { show, names }) => {
                let names: Vec<String> = names
                    .iter()
                    .filter_map(|n| arena.identifier_name(n).map(str::to_string))
                    .collect();
                Some(if *show {
                    Combinator::Show(names)
                } else {
                    Combinator::Hide(names)
                })
            }
            _ => None,
        })
        .collect()
}
