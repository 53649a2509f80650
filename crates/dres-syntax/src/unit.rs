//! A parsed compilation unit: its source key, arena and root node.

use crate::arena::NodeArena;
use crate::base::NodeIndex;
use crate::node::NodeKind;
use dres_common::Source;

#[derive(Clone, Debug)]
pub struct ParsedUnit {
    pub source: Source,
    pub arena: NodeArena,
    pub root: NodeIndex,
}

impl ParsedUnit {
    /// Wrap an arena whose `root` is a `CompilationUnit`, linking parents.
    pub fn new(source: Source, mut arena: NodeArena, root: NodeIndex) -> Self {
        arena.link_parents(root);
        Self {
            source,
            arena,
            root,
        }
    }

    pub fn directives(&self) -> &[NodeIndex] {
        match self.arena.kind(self.root) {
            Some(NodeKind::CompilationUnit { directives, .. }) => &directives.nodes,
            _ => &[],
        }
    }

    pub fn declarations(&self) -> &[NodeIndex] {
        match self.arena.kind(self.root) {
            Some(NodeKind::CompilationUnit { declarations, .. }) => &declarations.nodes,
            _ => &[],
        }
    }

    /// True when the unit starts with `part of`.
    pub fn is_part(&self) -> bool {
        self.directives().iter().any(|&d| {
            matches!(self.arena.kind(d), Some(NodeKind::PartOfDirective { .. }))
        })
    }

    /// Name written in the `library` directive, if any.
    pub fn library_name(&self) -> Option<String> {
        self.directives().iter().find_map(|&d| match self.arena.kind(d) {
            Some(NodeKind::LibraryDirective { name, .. }) => Some(self.dotted_name(&name.nodes)),
            _ => None,
        })
    }

    /// Name written in the `part of` directive, if any.
    pub fn part_of_name(&self) -> Option<String> {
        self.directives().iter().find_map(|&d| match self.arena.kind(d) {
            Some(NodeKind::PartOfDirective { library_name, .. }) => {
                Some(self.dotted_name(&library_name.nodes))
            }
            _ => None,
        })
    }

    fn dotted_name(&self, parts: &[NodeIndex]) -> String {
        parts
            .iter()
            .filter_map(|&p| self.arena.identifier_name(p))
            .collect::<Vec<_>>()
            .join(".")
    }

    /// URIs of `import` and `export` directives, in order.
    pub fn referenced_library_uris(&self) -> Vec<(NodeIndex, String)> {
        self.directives()
            .iter()
            .filter_map(|&d| match self.arena.kind(d) {
                Some(NodeKind::ImportDirective { uri, .. })
                | Some(NodeKind::ExportDirective { uri, .. }) => {
                    Some((d, self.arena.string_value(*uri)?))
                }
                _ => None,
            })
            .collect()
    }

    /// URIs of `part` directives, in order.
    pub fn part_uris(&self) -> Vec<(NodeIndex, String)> {
        self.directives()
            .iter()
            .filter_map(|&d| match self.arena.kind(d) {
                Some(NodeKind::PartDirective { uri, .. }) => {
                    Some((d, self.arena.string_value(*uri)?))
                }
                _ => None,
            })
            .collect()
    }
}
