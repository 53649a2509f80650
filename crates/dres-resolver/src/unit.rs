//! Read-only inputs shared by the passes over one compilation unit.

use dres_binder::LibraryScope;
use dres_common::Source;
use dres_element::ElementId;
use dres_syntax::{NodeArena, NodeIndex, ParsedUnit};

#[derive(Clone, Copy)]
pub struct ResolutionUnit<'a> {
    pub source: &'a Source,
    pub arena: &'a NodeArena,
    /// The `CompilationUnit` node.
    pub root: NodeIndex,
    pub library: ElementId,
    pub library_scope: &'a LibraryScope,
}

impl<'a> ResolutionUnit<'a> {
    pub fn new(parsed: &'a ParsedUnit, library_scope: &'a LibraryScope) -> Self {
        Self {
            source: &parsed.source,
            arena: &parsed.arena,
            root: parsed.root,
            library: library_scope.library,
            library_scope,
        }
    }

    /// Top-level declarations of the unit.
    pub fn declarations(&self) -> Vec<NodeIndex> {
        match self.arena.kind(self.root) {
            Some(dres_syntax::NodeKind::CompilationUnit { declarations, .. }) => {
                declarations.iter().collect()
            }
            _ => Vec::new(),
        }
    }
}
