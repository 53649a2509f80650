//! Owning front door for hosts: parsed units in, resolved libraries out.

use crate::error::{IncrementalError, LibraryResolutionError};
use crate::incremental::{IncrementalOutcome, IncrementalResolver};
use crate::library_resolver::{LibraryResolver, ResolutionState, ResolvedLibrary};
use crate::options::ResolverOptions;
use anyhow::Result;
use dres_binder::{CORE_LIBRARY_URI, SourceEdit, UnitAnnotations};
use dres_common::{Diagnostic, SimpleSourceFactory, Source, SourceFactory};
use dres_element::{Element, ElementId, ElementModel, TypeProvider};
use dres_syntax::ParsedUnit;
use rustc_hash::{FxHashMap, FxHashSet};
use std::path::Path;
use tracing::{debug, info};

pub struct AnalysisContext {
    options: ResolverOptions,
    /// Knows every source added with [`AnalysisContext::add_unit`].
    sources: SimpleSourceFactory,
    factory: Option<Box<dyn SourceFactory>>,
    units: FxHashMap<Source, ParsedUnit>,
    state: ResolutionState,
}

impl AnalysisContext {
    pub fn new(options: ResolverOptions) -> Self {
        Self {
            options,
            sources: SimpleSourceFactory::new(),
            factory: None,
            units: FxHashMap::default(),
            state: ResolutionState::new(),
        }
    }

    /// Context configured from a JSON options file.
    pub fn from_options_file(path: &Path) -> Result<Self> {
        Ok(Self::new(ResolverOptions::load(path)?))
    }

    /// Resolve directive URIs with `factory` instead of the registry of
    /// added units.
    pub fn with_source_factory(mut self, factory: Box<dyn SourceFactory>) -> Self {
        self.factory = Some(factory);
        self
    }

    pub fn options(&self) -> &ResolverOptions {
        &self.options
    }

    /// Add or replace a parsed unit. Libraries resolved against a replaced
    /// unit keep their results until [`AnalysisContext::invalidate_library`].
    pub fn add_unit(&mut self, unit: ParsedUnit) -> Option<ParsedUnit> {
        self.sources.register(unit.source.clone());
        self.units.insert(unit.source.clone(), unit)
    }

    pub fn unit(&self, source: &Source) -> Option<&ParsedUnit> {
        self.units.get(source)
    }

    pub fn resolve_library(&mut self, source: &Source) -> Result<ElementId, LibraryResolutionError> {
        let factory: &dyn SourceFactory = match &self.factory {
            Some(factory) => factory.as_ref(),
            None => &self.sources,
        };
        LibraryResolver::new(&mut self.state, factory, &self.units, &self.options)
            .resolve_library(source)
    }

    /// Re-resolve the declaration of `new_unit` that `edit` touched and
    /// install `new_unit` in place of the unit it replaces. On error
    /// nothing is installed; the caller falls back to
    /// [`AnalysisContext::invalidate_library`] and a full resolution.
    pub fn resolve_incrementally(
        &mut self,
        new_unit: ParsedUnit,
        edit: SourceEdit,
    ) -> Result<IncrementalOutcome, IncrementalError> {
        let source = new_unit.source.clone();
        let old_unit = self
            .units
            .get(&source)
            .ok_or_else(|| IncrementalError::UnitNotResolved(source.clone()))?;
        let outcome =
            IncrementalResolver::new(&mut self.state, &self.options).resolve(old_unit, &new_unit, edit)?;
        self.units.insert(source, new_unit);
        Ok(outcome)
    }

    /// Drop the results of the library defined by `source` and of every
    /// resolved library that imports or exports it, directly or not.
    /// Returns the defining sources of the dropped libraries.
    pub fn invalidate_library(&mut self, source: &Source) -> Vec<Source> {
        let Some(first) = self.state.libraries.get(source).map(|l| l.library) else {
            return Vec::new();
        };
        let mut dropped: FxHashSet<ElementId> = FxHashSet::default();
        dropped.insert(first);
        loop {
            let dependents: Vec<ElementId> = self
                .state
                .libraries
                .values()
                .map(|l| l.library)
                .filter(|l| !dropped.contains(l))
                .filter(|&l| depends_on_any(&self.state.model, l, &dropped))
                .collect();
            if dependents.is_empty() {
                break;
            }
            dropped.extend(dependents);
        }

        let sources: Vec<Source> = self
            .state
            .libraries
            .iter()
            .filter(|(_, l)| dropped.contains(&l.library))
            .map(|(s, _)| s.clone())
            .collect();
        for defining in &sources {
            let Some(resolved) = self.state.libraries.remove(defining) else {
                continue;
            };
            for unit in &resolved.units {
                self.state.annotations.remove(unit);
                self.state.diagnostics.take(unit);
            }
            self.state.model.forget_library(defining);
            if defining.uri() == CORE_LIBRARY_URI {
                self.state.provider = None;
            }
        }
        info!(dropped = sources.len(), source = %source, "libraries invalidated");
        sources
    }

    // =========================================================================
    // Results
    // =========================================================================

    pub fn model(&self) -> &ElementModel {
        &self.state.model
    }

    pub fn provider(&self) -> Option<&TypeProvider> {
        self.state.provider.as_ref()
    }

    pub fn library(&self, source: &Source) -> Option<&ResolvedLibrary> {
        self.state.libraries.get(source)
    }

    pub fn annotations(&self, unit: &Source) -> Option<&UnitAnnotations> {
        self.state.annotations.get(unit)
    }

    pub fn diagnostics(&self, unit: &Source) -> &[Diagnostic] {
        self.state.diagnostics.for_source(unit)
    }

    /// Every diagnostic of every unit, ordered by source then offset.
    pub fn all_diagnostics(&self) -> Vec<&Diagnostic> {
        let mut all: Vec<&Diagnostic> = self.state.diagnostics.iter().collect();
        all.sort_by(|a, b| (&a.source, a.start, a.code).cmp(&(&b.source, b.start, b.code)));
        debug!(count = all.len(), "diagnostics collected");
        all
    }
}

/// True when `library` imports or exports one of `targets`.
fn depends_on_any(model: &ElementModel, library: ElementId, targets: &FxHashSet<ElementId>) -> bool {
    let Some(data) = model.element(library).and_then(Element::as_library) else {
        return false;
    };
    let imported = data.imports.iter().filter_map(|&i| {
        model
            .element(i)
            .and_then(Element::as_import)
            .map(|d| d.imported_library)
    });
    let exported = data.exports.iter().filter_map(|&e| {
        model
            .element(e)
            .and_then(Element::as_export)
            .map(|d| d.exported_library)
    });
    imported.chain(exported).any(|target| targets.contains(&target))
}
