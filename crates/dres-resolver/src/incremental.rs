//! Re-resolution of a single declaration after an edit.
//!
//! The resolver moves through
//! `Start → FindRoot → VerifyUnchanged → ResolveTypes → ResolveVariables →
//! ResolveReferences → Done`, ending in `Failed` on the first error. Until
//! the declaration match is committed nothing in the state changes, so a
//! failed attempt leaves the previous resolution intact for the caller to
//! replace with a full one.

use crate::error::IncrementalError;
use crate::library_resolver::ResolutionState;
use crate::options::ResolverOptions;
use crate::oracle::{ConstantOracle, DeclaredConstantOracle};
use crate::resolver::ResolverVisitor;
use crate::type_resolver::TypeResolver;
use crate::unit::ResolutionUnit;
use crate::variable_resolver::VariableResolver;
use dres_binder::{DeclarationMatcher, ScopeBuilder, SourceEdit, UnitAnnotations};
use dres_common::Diagnostic;
use dres_element::ElementId;
use dres_syntax::{NodeArena, NodeIndex, NodeKind, ParsedUnit};
use tracing::{debug, trace, warn};

static DECLARED_CONSTANTS: DeclaredConstantOracle = DeclaredConstantOracle;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum IncrementalPhase {
    Start,
    FindRoot,
    VerifyUnchanged,
    ResolveTypes,
    ResolveVariables,
    ResolveReferences,
    Done,
    Failed,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IncrementalOutcome {
    /// Declaration node of the new tree that was re-resolved.
    pub root: NodeIndex,
    pub root_element: ElementId,
    /// Diagnostics reported inside the root.
    pub diagnostics: usize,
}

/// True for declarations that can be resolved without their siblings.
pub fn is_resolution_root(arena: &NodeArena, node: NodeIndex) -> bool {
    match arena.kind(node) {
        Some(
            NodeKind::ClassDeclaration { .. }
            | NodeKind::ClassTypeAlias { .. }
            | NodeKind::FunctionTypeAlias { .. }
            | NodeKind::ConstructorDeclaration { .. }
            | NodeKind::MethodDeclaration { .. },
        ) => true,
        // Local functions are resolved with their enclosing body.
        Some(NodeKind::FunctionDeclaration { .. }) => matches!(
            arena.kind(arena.parent(node)),
            Some(NodeKind::CompilationUnit { .. })
        ),
        _ => false,
    }
}

/// Innermost resolution root enclosing `node`, or `node` itself.
pub fn find_resolution_root(arena: &NodeArena, node: NodeIndex) -> Option<NodeIndex> {
    std::iter::once(node)
        .chain(arena.ancestors(node))
        .find(|&n| is_resolution_root(arena, n))
}

fn enter(phase: &mut IncrementalPhase, next: IncrementalPhase) {
    trace!(from = ?*phase, to = ?next, "incremental phase");
    *phase = next;
}

pub struct IncrementalResolver<'a> {
    state: &'a mut ResolutionState,
    options: &'a ResolverOptions,
    oracle: &'a dyn ConstantOracle,
    phase: IncrementalPhase,
}

impl<'a> IncrementalResolver<'a> {
    pub fn new(state: &'a mut ResolutionState, options: &'a ResolverOptions) -> Self {
        Self {
            state,
            options,
            oracle: &DECLARED_CONSTANTS,
            phase: IncrementalPhase::Start,
        }
    }

    pub fn with_oracle(mut self, oracle: &'a dyn ConstantOracle) -> Self {
        self.oracle = oracle;
        self
    }

    pub fn phase(&self) -> IncrementalPhase {
        self.phase
    }

    /// Re-resolve the declaration of `new_unit` that encloses `edit`.
    /// `old_unit` is the tree the state was last resolved against. On
    /// success the annotations and diagnostics of the unit are replaced.
    #[tracing::instrument(level = "debug", skip_all, fields(source = %new_unit.source, offset = edit.offset))]
    pub fn resolve(
        &mut self,
        old_unit: &ParsedUnit,
        new_unit: &ParsedUnit,
        edit: SourceEdit,
    ) -> Result<IncrementalOutcome, IncrementalError> {
        let result = self.run(old_unit, new_unit, edit);
        match &result {
            Ok(outcome) => {
                enter(&mut self.phase, IncrementalPhase::Done);
                debug!(root = outcome.root.0, element = outcome.root_element.0, "declaration re-resolved");
            }
            Err(error) => {
                enter(&mut self.phase, IncrementalPhase::Failed);
                warn!(%error, "incremental resolution failed");
            }
        }
        result
    }

    fn run(
        &mut self,
        old_unit: &ParsedUnit,
        new_unit: &ParsedUnit,
        edit: SourceEdit,
    ) -> Result<IncrementalOutcome, IncrementalError> {
        let source = &new_unit.source;
        let state = &mut *self.state;
        let not_resolved = || IncrementalError::UnitNotResolved(source.clone());
        let library = state
            .libraries
            .values()
            .find(|l| l.contains_unit(source))
            .ok_or_else(not_resolved)?;
        let provider = state.provider.clone().ok_or_else(not_resolved)?;
        let old_annotations = state.annotations.get(source).ok_or_else(not_resolved)?;

        enter(&mut self.phase, IncrementalPhase::FindRoot);
        let covering =
            new_unit
                .arena
                .covering_node(new_unit.root, edit.offset, edit.offset + edit.new_length);
        let root = find_resolution_root(&new_unit.arena, covering)
            .ok_or(IncrementalError::NoResolvableRoot { offset: edit.offset })?;
        debug!(root = root.0, kind = new_unit.arena.kind(root).map_or("", NodeKind::name), "resolution root");

        enter(&mut self.phase, IncrementalPhase::VerifyUnchanged);
        let unit_element = old_annotations.declared_element(old_unit.root);
        let matched = DeclarationMatcher::new(&state.model, Some(edit)).match_subtree(
            &new_unit.arena,
            root,
            unit_element,
        )?;
        let mut annotations = UnitAnnotations::new();
        let old_root = transfer_outside(old_unit, old_annotations, new_unit, root, &mut annotations)?;
        let root_element = matched.root_element;
        matched.commit(&mut state.model, &new_unit.arena, &mut annotations);
        if matches!(
            new_unit.arena.kind(root),
            Some(NodeKind::ClassDeclaration { .. } | NodeKind::ClassTypeAlias { .. })
        ) {
            library.inheritance.clear();
        }

        let unit = ResolutionUnit::new(new_unit, &library.scope);
        let mut diagnostics: Vec<Diagnostic> = Vec::new();

        enter(&mut self.phase, IncrementalPhase::ResolveTypes);
        let frames = ScopeBuilder::new(&state.model).scopes_for(&new_unit.arena, &annotations, root);
        TypeResolver::new(&mut state.model, &provider, unit, &mut annotations, &mut diagnostics)
            .resolve_subtree(root, frames);

        enter(&mut self.phase, IncrementalPhase::ResolveVariables);
        let frames = ScopeBuilder::new(&state.model).scopes_for(&new_unit.arena, &annotations, root);
        VariableResolver::new(&mut state.model, unit, &mut annotations).resolve_subtree(root, frames);

        enter(&mut self.phase, IncrementalPhase::ResolveReferences);
        let frames = ScopeBuilder::new(&state.model).scopes_for(&new_unit.arena, &annotations, root);
        ResolverVisitor::new(
            &mut state.model,
            &provider,
            unit,
            &mut annotations,
            &mut diagnostics,
            &library.inheritance,
            self.options,
        )
        .with_oracle(self.oracle)
        .resolve_subtree(root, frames);

        let reported = diagnostics.len();
        let old_start = old_unit.arena.offset(old_root);
        let old_end = old_unit.arena.end(old_root);
        let edit_end = edit.offset + edit.old_length;
        let mut merged: Vec<Diagnostic> = state
            .diagnostics
            .for_source(source)
            .iter()
            .filter(|d| d.end() <= old_start || d.start >= old_end)
            .map(|d| {
                if d.start >= edit_end {
                    d.clone().shifted(edit.delta())
                } else {
                    d.clone()
                }
            })
            .collect();
        merged.extend(diagnostics);
        merged.sort_by_key(|d| (d.start, d.code));
        state.diagnostics.replace(source.clone(), merged);
        state.annotations.insert(source.clone(), annotations);

        Ok(IncrementalOutcome {
            root,
            root_element,
            diagnostics: reported,
        })
    }
}

/// Walk the old and new trees in lockstep outside `root`, copying the
/// annotations of every node. Returns the old node standing where `root`
/// stands.
fn transfer_outside(
    old: &ParsedUnit,
    old_annotations: &UnitAnnotations,
    new: &ParsedUnit,
    root: NodeIndex,
    annotations: &mut UnitAnnotations,
) -> Result<NodeIndex, IncrementalError> {
    let mut old_root = None;
    let mut stack = vec![(old.root, new.root)];
    while let Some((old_node, new_node)) = stack.pop() {
        let (Some(old_kind), Some(new_kind)) = (old.arena.kind(old_node), new.arena.kind(new_node))
        else {
            return Err(IncrementalError::StructureChangedOutsideRoot { node: "missing node" });
        };
        if old_kind.name() != new_kind.name() {
            return Err(IncrementalError::StructureChangedOutsideRoot {
                node: new_kind.name(),
            });
        }
        if new_node == root {
            old_root = Some(old_node);
            continue;
        }
        annotations.copy_node(old_annotations, old_node, new_node);
        let old_children = old.arena.children(old_node);
        let new_children = new.arena.children(new_node);
        if old_children.len() != new_children.len() {
            return Err(IncrementalError::StructureChangedOutsideRoot {
                node: new_kind.name(),
            });
        }
        stack.extend(old_children.into_iter().zip(new_children));
    }
    old_root.ok_or(IncrementalError::StructureChangedOutsideRoot { node: "root" })
}
