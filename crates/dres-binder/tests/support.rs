//! Shared fixture: parsed sources, a source factory and a built model.

#![allow(dead_code)]

use dres_binder::{LibraryElementBuilder, UnitAnnotations};
use dres_common::{DiagnosticCollector, SimpleSourceFactory, Source};
use dres_element::{Element, ElementId, ElementKind, ElementModel};
use dres_parser::parse_unit;
use dres_syntax::{NodeIndex, NodeKind, ParsedUnit};
use rustc_hash::FxHashMap;

#[derive(Default)]
pub struct Fixture {
    pub model: ElementModel,
    pub units: FxHashMap<Source, ParsedUnit>,
    pub factory: SimpleSourceFactory,
    pub annotations: FxHashMap<Source, UnitAnnotations>,
    pub diagnostics: DiagnosticCollector,
    pub deferred_loading: bool,
}

impl Fixture {
    pub fn new() -> Self {
        Self {
            deferred_loading: true,
            ..Self::default()
        }
    }

    pub fn add(&mut self, uri: &str, text: &str) -> Source {
        let source = Source::new(uri);
        let unit = parse_unit(source.clone(), text).expect("fixture should parse");
        self.factory.register(source.clone());
        self.units.insert(source.clone(), unit);
        source
    }

    /// Build every listed library, then link them all.
    pub fn build(&mut self, uris: &[&str]) -> Vec<ElementId> {
        let mut builder = LibraryElementBuilder::new(
            &mut self.model,
            &self.factory,
            &self.units,
            &mut self.diagnostics,
        )
        .with_deferred_loading(self.deferred_loading);
        let libraries: Vec<ElementId> = uris
            .iter()
            .map(|uri| {
                builder
                    .build(&Source::new(uri), &mut self.annotations)
                    .expect("library source registered")
            })
            .collect();
        for &library in &libraries {
            builder.link(library);
        }
        libraries
    }

    pub fn build_one(&mut self, uri: &str, text: &str) -> ElementId {
        self.add(uri, text);
        self.build(&[uri])[0]
    }

    pub fn unit(&self, uri: &str) -> &ParsedUnit {
        &self.units[&Source::new(uri)]
    }

    pub fn annotations(&self, uri: &str) -> &UnitAnnotations {
        &self.annotations[&Source::new(uri)]
    }

    pub fn defining_unit(&self, library: ElementId) -> ElementId {
        self.model
            .element(library)
            .and_then(Element::as_library)
            .expect("library element")
            .defining_unit
    }

    /// First top-level class named `name` in any unit of `library`.
    pub fn class(&self, library: ElementId, name: &str) -> ElementId {
        self.model
            .library_units(library)
            .into_iter()
            .flat_map(|u| {
                self.model
                    .element(u)
                    .and_then(Element::as_unit)
                    .map(|d| d.classes.clone())
                    .unwrap_or_default()
            })
            .find(|&c| self.model.name(c) == name)
            .expect("class declared")
    }

    pub fn children_of_kind(&self, container: ElementId, kind: ElementKind) -> Vec<ElementId> {
        self.model
            .elements
            .children(container)
            .into_iter()
            .filter(|&c| self.model.kind(c) == Some(kind))
            .collect()
    }

    pub fn names(&self, ids: &[ElementId]) -> Vec<String> {
        ids.iter().map(|&id| self.model.name(id).to_string()).collect()
    }
}

/// First node in preorder satisfying `pred`.
pub fn find(unit: &ParsedUnit, pred: impl Fn(&NodeKind) -> bool) -> NodeIndex {
    unit.arena
        .descendants(unit.root)
        .into_iter()
        .find(|&idx| unit.arena.kind(idx).is_some_and(&pred))
        .expect("node present")
}
