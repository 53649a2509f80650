//! Library-cycle orchestration.
//!
//! A library is resolved together with every library it reaches through
//! imports and exports. The reachable graph is split into strongly connected
//! components that are processed dependencies first. Within one component:
//!
//! 1. every library is built (no directive linked yet);
//! 2. every library is linked;
//! 3. types are resolved across the whole component, headers first;
//! 4. variables and references are resolved unit by unit.

use crate::error::LibraryResolutionError;
use crate::inheritance::InheritanceManager;
use crate::options::ResolverOptions;
use crate::oracle::{ConstantOracle, DeclaredConstantOracle};
use crate::resolver::ResolverVisitor;
use crate::type_resolver::{TypeResolver, break_inheritance_cycles, build_forwarding_constructors};
use crate::unit::ResolutionUnit;
use crate::variable_resolver::VariableResolver;
use dres_binder::{CORE_LIBRARY_URI, LibraryElementBuilder, LibraryScope, UnitAnnotations, UnitProvider};
use dres_common::{Diagnostic, DiagnosticSink, Source, SourceFactory};
use dres_element::{Element, ElementId, ElementModel, TypeProvider};
use rustc_hash::FxHashMap;
use tracing::{debug, info};

static DECLARED_CONSTANTS: DeclaredConstantOracle = DeclaredConstantOracle;

/// Diagnostics grouped by the unit they were reported in.
#[derive(Debug, Default, Clone)]
pub struct DiagnosticMap {
    by_source: FxHashMap<Source, Vec<Diagnostic>>,
}

impl DiagnosticMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn for_source(&self, source: &Source) -> &[Diagnostic] {
        self.by_source.get(source).map_or(&[][..], Vec::as_slice)
    }

    pub fn replace(&mut self, source: Source, diagnostics: Vec<Diagnostic>) {
        self.by_source.insert(source, diagnostics);
    }

    pub fn take(&mut self, source: &Source) -> Vec<Diagnostic> {
        self.by_source.remove(source).unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.by_source.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.by_source.values().flatten()
    }
}

impl DiagnosticSink for DiagnosticMap {
    fn report(&mut self, diagnostic: Diagnostic) {
        self.by_source
            .entry(diagnostic.source.clone())
            .or_default()
            .push(diagnostic);
    }
}

/// What later passes over a resolved library reuse.
#[derive(Debug)]
pub struct ResolvedLibrary {
    pub library: ElementId,
    pub scope: LibraryScope,
    pub inheritance: InheritanceManager,
    /// Defining unit first, then the parts.
    pub units: Vec<Source>,
}

impl ResolvedLibrary {
    pub fn contains_unit(&self, source: &Source) -> bool {
        self.units.contains(source)
    }
}

/// Everything resolution produces, kept across calls.
#[derive(Debug, Default)]
pub struct ResolutionState {
    pub model: ElementModel,
    pub provider: Option<TypeProvider>,
    pub annotations: FxHashMap<Source, UnitAnnotations>,
    pub diagnostics: DiagnosticMap,
    /// Keyed by the source of the defining unit.
    pub libraries: FxHashMap<Source, ResolvedLibrary>,
}

impl ResolutionState {
    pub fn new() -> Self {
        Self::default()
    }

    /// The resolved library one of whose units is `unit`.
    pub fn library_of_unit(&self, unit: &Source) -> Option<&ResolvedLibrary> {
        self.libraries.values().find(|l| l.contains_unit(unit))
    }

    /// Provider of the core types, created on first use once the core
    /// library has been built.
    fn ensure_provider(&mut self) -> Result<TypeProvider, LibraryResolutionError> {
        if let Some(provider) = &self.provider {
            return Ok(provider.clone());
        }
        let core = self
            .model
            .library(&Source::new(CORE_LIBRARY_URI))
            .ok_or_else(|| LibraryResolutionError::MissingCoreLibrary {
                reason: format!("{CORE_LIBRARY_URI} has not been built"),
            })?;
        let provider = TypeProvider::from_core_library(&self.model, core).map_err(|e| {
            LibraryResolutionError::MissingCoreLibrary {
                reason: e.to_string(),
            }
        })?;
        self.provider = Some(provider.clone());
        Ok(provider)
    }
}

/// Libraries reachable from a root, with import and export edges.
#[derive(Debug, Default)]
struct LibraryGraph {
    nodes: Vec<Source>,
    index: FxHashMap<Source, usize>,
    edges: Vec<Vec<usize>>,
}

impl LibraryGraph {
    fn add(&mut self, source: Source) -> usize {
        if let Some(&i) = self.index.get(&source) {
            return i;
        }
        let i = self.nodes.len();
        self.index.insert(source.clone(), i);
        self.nodes.push(source);
        self.edges.push(Vec::new());
        i
    }

    /// Strongly connected components, each one after every component it
    /// depends on (Tarjan).
    fn cycles(&self) -> Vec<Vec<Source>> {
        let mut tarjan = Tarjan {
            graph: self,
            index_counter: 0,
            stack: Vec::new(),
            on_stack: vec![false; self.nodes.len()],
            indices: vec![None; self.nodes.len()],
            lowlinks: vec![0; self.nodes.len()],
            components: Vec::new(),
        };
        for v in 0..self.nodes.len() {
            if tarjan.indices[v].is_none() {
                tarjan.strongconnect(v);
            }
        }
        tarjan
            .components
            .into_iter()
            .map(|component| component.into_iter().map(|i| self.nodes[i].clone()).collect())
            .collect()
    }
}

struct Tarjan<'g> {
    graph: &'g LibraryGraph,
    index_counter: u32,
    stack: Vec<usize>,
    on_stack: Vec<bool>,
    indices: Vec<Option<u32>>,
    lowlinks: Vec<u32>,
    components: Vec<Vec<usize>>,
}

impl Tarjan<'_> {
    fn strongconnect(&mut self, v: usize) {
        self.indices[v] = Some(self.index_counter);
        self.lowlinks[v] = self.index_counter;
        self.index_counter += 1;
        self.stack.push(v);
        self.on_stack[v] = true;

        let graph = self.graph;
        for &w in &graph.edges[v] {
            match self.indices[w] {
                None => {
                    self.strongconnect(w);
                    self.lowlinks[v] = self.lowlinks[v].min(self.lowlinks[w]);
                }
                Some(w_index) if self.on_stack[w] => {
                    self.lowlinks[v] = self.lowlinks[v].min(w_index);
                }
                Some(_) => {}
            }
        }

        // Root of a component
        if Some(self.lowlinks[v]) == self.indices[v] {
            let mut component = Vec::new();
            while let Some(w) = self.stack.pop() {
                self.on_stack[w] = false;
                component.push(w);
                if w == v {
                    break;
                }
            }
            // Keep discovery order inside a component.
            component.reverse();
            self.components.push(component);
        }
    }
}

pub struct LibraryResolver<'a> {
    state: &'a mut ResolutionState,
    factory: &'a dyn SourceFactory,
    units: &'a dyn UnitProvider,
    options: &'a ResolverOptions,
    oracle: &'a dyn ConstantOracle,
}

impl<'a> LibraryResolver<'a> {
    pub fn new(
        state: &'a mut ResolutionState,
        factory: &'a dyn SourceFactory,
        units: &'a dyn UnitProvider,
        options: &'a ResolverOptions,
    ) -> Self {
        Self {
            state,
            factory,
            units,
            options,
            oracle: &DECLARED_CONSTANTS,
        }
    }

    pub fn with_oracle(mut self, oracle: &'a dyn ConstantOracle) -> Self {
        self.oracle = oracle;
        self
    }

    /// Resolve the library whose defining unit is `source`, and every
    /// library it depends on that has not been resolved yet.
    #[tracing::instrument(level = "info", skip(self), fields(source = %source))]
    pub fn resolve_library(&mut self, source: &Source) -> Result<ElementId, LibraryResolutionError> {
        if let Some(resolved) = self.state.libraries.get(source) {
            return Ok(resolved.library);
        }
        if self.units.unit(source).is_none() {
            return Err(LibraryResolutionError::MissingSource(source.clone()));
        }
        let graph = self.discover(source)?;
        let cycles = graph.cycles();
        info!(
            libraries = graph.nodes.len(),
            cycles = cycles.len(),
            "library graph discovered"
        );
        for cycle in &cycles {
            self.resolve_cycle(cycle)?;
        }
        self.state
            .libraries
            .get(source)
            .map(|resolved| resolved.library)
            .ok_or_else(|| LibraryResolutionError::MissingSource(source.clone()))
    }

    /// Unresolved libraries reachable from `root`. Targets that are missing
    /// or are parts stay out of the graph; linking reports them.
    fn discover(&self, root: &Source) -> Result<LibraryGraph, LibraryResolutionError> {
        let core = Source::new(CORE_LIBRARY_URI);
        let mut graph = LibraryGraph::default();
        graph.add(root.clone());
        let mut next = 0;
        while next < graph.nodes.len() {
            let library = graph.nodes[next].clone();
            let Some(parsed) = self.units.unit(&library) else {
                next += 1;
                continue;
            };
            let mut targets: Vec<Source> = parsed
                .referenced_library_uris()
                .into_iter()
                .filter_map(|(_, uri)| self.factory.resolve_uri(&library, &uri))
                .collect();
            if library != core {
                targets.push(core.clone());
            }
            for target in targets {
                if self.state.libraries.contains_key(&target) {
                    continue;
                }
                match self.units.unit(&target) {
                    Some(unit) if !unit.is_part() => {
                        let to = graph.add(target);
                        if !graph.edges[next].contains(&to) {
                            graph.edges[next].push(to);
                        }
                    }
                    Some(_) => {}
                    None if target == core => {
                        return Err(LibraryResolutionError::MissingCoreLibrary {
                            reason: format!("no parsed unit for {CORE_LIBRARY_URI}"),
                        });
                    }
                    None => {}
                }
            }
            next += 1;
        }
        Ok(graph)
    }

    fn resolve_cycle(&mut self, cycle: &[Source]) -> Result<(), LibraryResolutionError> {
        let state = &mut *self.state;
        let deferred = self.options.enable_deferred_loading;

        let mut libraries = Vec::with_capacity(cycle.len());
        for source in cycle {
            let library = LibraryElementBuilder::new(
                &mut state.model,
                self.factory,
                self.units,
                &mut state.diagnostics,
            )
            .with_deferred_loading(deferred)
            .build(source, &mut state.annotations)
            .ok_or_else(|| LibraryResolutionError::MissingSource(source.clone()))?;
            libraries.push(library);
        }
        for &library in &libraries {
            LibraryElementBuilder::new(
                &mut state.model,
                self.factory,
                self.units,
                &mut state.diagnostics,
            )
            .with_deferred_loading(deferred)
            .link(library);
        }

        let provider = state.ensure_provider()?;
        let scopes: Vec<LibraryScope> = libraries
            .iter()
            .map(|&library| LibraryScope::new(&state.model, library, &mut state.diagnostics))
            .collect();
        let units: Vec<Vec<(ElementId, Source)>> = libraries
            .iter()
            .map(|&library| library_unit_sources(&state.model, library))
            .collect();
        let classes: Vec<ElementId> = units
            .iter()
            .flatten()
            .filter_map(|(unit, _)| state.model.element(*unit).and_then(Element::as_unit))
            .flat_map(|data| data.classes.iter().copied())
            .collect();

        for (scope, library_units) in scopes.iter().zip(&units) {
            for (_, source) in library_units {
                let Some(parsed) = self.units.unit(source) else {
                    continue;
                };
                let annotations = state.annotations.entry(source.clone()).or_default();
                TypeResolver::new(
                    &mut state.model,
                    &provider,
                    ResolutionUnit::new(parsed, scope),
                    annotations,
                    &mut state.diagnostics,
                )
                .resolve_headers();
            }
        }
        break_inheritance_cycles(&mut state.model, &provider, &classes, &mut state.diagnostics);
        for (scope, library_units) in scopes.iter().zip(&units) {
            for (_, source) in library_units {
                let Some(parsed) = self.units.unit(source) else {
                    continue;
                };
                let annotations = state.annotations.entry(source.clone()).or_default();
                TypeResolver::new(
                    &mut state.model,
                    &provider,
                    ResolutionUnit::new(parsed, scope),
                    annotations,
                    &mut state.diagnostics,
                )
                .resolve_members();
            }
        }
        build_forwarding_constructors(&mut state.model, &provider, &classes);

        for ((scope, library_units), library) in scopes.into_iter().zip(units).zip(libraries) {
            let inheritance = InheritanceManager::new(library);
            for (_, source) in &library_units {
                let Some(parsed) = self.units.unit(source) else {
                    continue;
                };
                let annotations = state.annotations.entry(source.clone()).or_default();
                let unit = ResolutionUnit::new(parsed, &scope);
                VariableResolver::new(&mut state.model, unit, annotations).resolve_unit();
                ResolverVisitor::new(
                    &mut state.model,
                    &provider,
                    unit,
                    annotations,
                    &mut state.diagnostics,
                    &inheritance,
                    self.options,
                )
                .with_oracle(self.oracle)
                .resolve_unit();
            }
            let sources: Vec<Source> = library_units.into_iter().map(|(_, s)| s).collect();
            let Some(defining) = sources.first().cloned() else {
                continue;
            };
            debug!(library = library.0, units = sources.len(), source = %defining, "library resolved");
            state.libraries.insert(
                defining,
                ResolvedLibrary {
                    library,
                    scope,
                    inheritance,
                    units: sources,
                },
            );
        }
        Ok(())
    }
}

/// Unit elements of `library` with their sources, defining unit first.
pub(crate) fn library_unit_sources(model: &ElementModel, library: ElementId) -> Vec<(ElementId, Source)> {
    model
        .library_units(library)
        .into_iter()
        .filter_map(|unit| {
            model
                .element(unit)
                .and_then(Element::as_unit)
                .map(|data| (unit, data.source.clone()))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn graph(edges: &[(&str, &str)]) -> LibraryGraph {
        let mut graph = LibraryGraph::default();
        for &(from, to) in edges {
            let from = graph.add(Source::new(from));
            let to = graph.add(Source::new(to));
            graph.edges[from].push(to);
        }
        graph
    }

    fn names(cycles: &[Vec<Source>]) -> Vec<Vec<&str>> {
        cycles
            .iter()
            .map(|c| c.iter().map(Source::uri).collect())
            .collect()
    }

    #[test]
    fn test_dependencies_come_first() {
        let g = graph(&[("a", "b"), ("b", "c")]);
        assert_eq!(names(&g.cycles()), vec![vec!["c"], vec!["b"], vec!["a"]]);
    }

    #[test]
    fn test_import_cycle_is_one_component() {
        let g = graph(&[("a", "b"), ("b", "a"), ("b", "core")]);
        let cycles = g.cycles();
        assert_eq!(cycles.len(), 2);
        assert_eq!(names(&cycles)[0], vec!["core"]);
        let mut cycle = names(&cycles)[1].clone();
        cycle.sort_unstable();
        assert_eq!(cycle, vec!["a", "b"]);
    }

    #[test]
    fn test_diagnostic_map_groups_by_source() {
        let mut map = DiagnosticMap::new();
        let a = Source::new("a.dart");
        let b = Source::new("b.dart");
        map.report(Diagnostic::new(a.clone(), 0, 1, 1001, Vec::new()));
        map.report(Diagnostic::new(b.clone(), 2, 1, 1001, Vec::new()));
        map.report(Diagnostic::new(a.clone(), 4, 1, 1001, Vec::new()));
        assert_eq!(map.for_source(&a).len(), 2);
        assert_eq!(map.len(), 3);
        assert_eq!(map.take(&b).len(), 1);
        assert!(map.for_source(&b).is_empty());
    }
}
