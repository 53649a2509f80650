//! Declaration matcher: checks that a re-parsed subtree declares exactly
//! the elements already in the model, without creating any.
//!
//! Every declaration node's `(kind, name, offset)` key must name a child of
//! the element matched for its nearest enclosing declaration, and every
//! non-synthetic element under the root must be rediscovered. Offsets of
//! nodes after an edit are mapped back to the old text before comparing.

use crate::annotations::UnitAnnotations;
use crate::naming::{DeclarationKey, declaration_key, declared_nodes};
use dres_element::{ElementId, ElementKind, ElementModel};
use dres_syntax::{NodeArena, NodeIndex, NodeKind};
use rustc_hash::{FxHashMap, FxHashSet};
use std::fmt;
use tracing::{debug, trace};

/// A replaced range of text: `old_length` bytes at `offset` became
/// `new_length` bytes.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct SourceEdit {
    pub offset: u32,
    pub old_length: u32,
    pub new_length: u32,
}

impl SourceEdit {
    pub fn new(offset: u32, old_length: u32, new_length: u32) -> Self {
        Self {
            offset,
            old_length,
            new_length,
        }
    }

    pub fn delta(&self) -> i64 {
        i64::from(self.new_length) - i64::from(self.old_length)
    }

    /// Old-text offset of a position in the new text.
    pub fn old_offset(&self, new_offset: u32) -> u32 {
        if new_offset >= self.offset + self.new_length {
            shift(new_offset, -self.delta())
        } else {
            new_offset
        }
    }

    /// New-text offset of a position in the old text.
    pub fn new_offset(&self, old_offset: u32) -> u32 {
        if old_offset >= self.offset + self.old_length {
            shift(old_offset, self.delta())
        } else {
            old_offset
        }
    }
}

fn shift(offset: u32, delta: i64) -> u32 {
    (i64::from(offset) + delta).max(0) as u32
}

/// Why a subtree does not match the element model.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DeclarationMismatch {
    /// A declaration has no element with its key.
    ElementNotFound {
        kind: ElementKind,
        name: String,
        offset: u32,
    },
    /// Elements of the old model that no declaration matched.
    UnmatchedElements {
        count: usize,
        kind: ElementKind,
        name: String,
    },
    /// A declaration enclosing the root has no element.
    ContextNotFound { node: &'static str },
}

impl fmt::Display for DeclarationMismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeclarationMismatch::ElementNotFound { kind, name, offset } => {
                write!(f, "no {kind:?} element named '{name}' at offset {offset}")
            }
            DeclarationMismatch::UnmatchedElements { count, kind, name } => write!(
                f,
                "{count} element(s) no longer declared, first {kind:?} '{name}'"
            ),
            DeclarationMismatch::ContextNotFound { node } => {
                write!(f, "enclosing {node} has no element")
            }
        }
    }
}

impl std::error::Error for DeclarationMismatch {}

/// Outcome of a successful match, not yet applied.
#[derive(Clone, Debug)]
pub struct DeclarationMatch {
    pub root_element: ElementId,
    bindings: Vec<(NodeIndex, ElementId)>,
    unit_element: ElementId,
    edit: Option<SourceEdit>,
}

impl DeclarationMatch {
    pub fn element_for(&self, node: NodeIndex) -> ElementId {
        self.bindings
            .iter()
            .find(|(n, _)| *n == node)
            .map_or(ElementId::NONE, |&(_, e)| e)
    }

    pub fn binding_count(&self) -> usize {
        self.bindings.len()
    }

    /// Record the matched declarations in `annotations` and move element
    /// offsets after the edit.
    pub fn commit(self, model: &mut ElementModel, arena: &NodeArena, annotations: &mut UnitAnnotations) {
        for &(node, element) in &self.bindings {
            for n in declared_nodes(arena, node) {
                annotations.declare(n, element);
                if arena.identifier_name(n).is_some() {
                    annotations.set_static_element(n, element);
                }
            }
        }
        let Some(edit) = self.edit else {
            return;
        };
        if edit.delta() == 0 {
            return;
        }
        let mut moved = 0usize;
        for id in model.elements.descendants(self.unit_element) {
            if let Some(element) = model.element_mut(id)
                && element.name_offset >= edit.offset + edit.old_length
            {
                element.name_offset = edit.new_offset(element.name_offset);
                moved += 1;
            }
        }
        debug!(moved, delta = edit.delta(), "element offsets shifted");
    }
}

pub struct DeclarationMatcher<'a> {
    model: &'a ElementModel,
    edit: Option<SourceEdit>,
}

impl<'a> DeclarationMatcher<'a> {
    pub fn new(model: &'a ElementModel, edit: Option<SourceEdit>) -> Self {
        Self { model, edit }
    }

    fn expected_offset(&self, new_offset: u32) -> u32 {
        match self.edit {
            Some(edit) => edit.old_offset(new_offset),
            None => new_offset,
        }
    }

    /// Child of `container` identified by `key` (key offset in new text).
    fn find_child(&self, container: ElementId, key: &DeclarationKey) -> ElementId {
        let offset = self.expected_offset(key.offset);
        self.model
            .elements
            .children(container)
            .into_iter()
            .find(|&c| {
                self.model.element(c).is_some_and(|e| {
                    e.kind() == key.kind && e.name == key.name && e.name_offset == offset
                })
            })
            .unwrap_or(ElementId::NONE)
    }

    /// Match the declarations of the subtree at `root` (in a tree whose
    /// unit element is `unit_element`) against the model.
    #[tracing::instrument(level = "debug", skip(self, arena), fields(root = root.0))]
    pub fn match_subtree(
        &self,
        arena: &NodeArena,
        root: NodeIndex,
        unit_element: ElementId,
    ) -> Result<DeclarationMatch, DeclarationMismatch> {
        let mut bound: FxHashMap<NodeIndex, ElementId> = FxHashMap::default();
        let mut bindings = Vec::new();

        // Elements of the declarations enclosing the root.
        let mut context = unit_element;
        let mut path: Vec<NodeIndex> = arena.ancestors(root).collect();
        path.reverse();
        for ancestor in path {
            if matches!(arena.kind(ancestor), Some(NodeKind::CompilationUnit { .. })) {
                bound.insert(ancestor, unit_element);
                continue;
            }
            let Some(key) = declaration_key(arena, ancestor) else {
                continue;
            };
            let container = self.container_for(context, key.kind);
            let element = self.find_child(container, &key);
            if element.is_none() {
                return Err(DeclarationMismatch::ContextNotFound {
                    node: arena.kind(ancestor).map_or("node", NodeKind::name),
                });
            }
            bound.insert(ancestor, element);
            context = element;
        }

        let root_element = if matches!(arena.kind(root), Some(NodeKind::CompilationUnit { .. })) {
            unit_element
        } else {
            let key = declaration_key(arena, root).ok_or(DeclarationMismatch::ContextNotFound {
                node: arena.kind(root).map_or("node", NodeKind::name),
            })?;
            let found = self.find_child(self.container_for(context, key.kind), &key);
            if found.is_none() {
                return Err(DeclarationMismatch::ElementNotFound {
                    kind: key.kind,
                    name: key.name,
                    offset: key.offset,
                });
            }
            found
        };
        bound.insert(root, root_element);
        bindings.push((root, root_element));

        let mut unmatched: FxHashSet<ElementId> = self
            .model
            .elements
            .descendants(root_element)
            .into_iter()
            .filter(|&e| self.model.element(e).is_some_and(|e| !e.is_synthetic()))
            .collect();
        trace!(elements = unmatched.len(), "elements to rediscover");

        for node in arena.descendants(root).into_iter().skip(1) {
            let Some(key) = declaration_key(arena, node) else {
                continue;
            };
            let parent_element = arena
                .ancestors(node)
                .find_map(|a| bound.get(&a).copied().filter(|&e| self.is_container(e)))
                .unwrap_or(root_element);
            let container = self.container_for(parent_element, key.kind);
            let element = self.find_child(container, &key);
            if element.is_none() || !unmatched.remove(&element) {
                debug!(kind = ?key.kind, name = %key.name, offset = key.offset, "declaration not found");
                return Err(DeclarationMismatch::ElementNotFound {
                    kind: key.kind,
                    name: key.name,
                    offset: key.offset,
                });
            }
            bound.insert(node, element);
            bindings.push((node, element));
        }

        if let Some(&first) = unmatched.iter().min() {
            let kind = self.model.kind(first).unwrap_or(ElementKind::Library);
            return Err(DeclarationMismatch::UnmatchedElements {
                count: unmatched.len(),
                kind,
                name: self.model.name(first).to_string(),
            });
        }
        debug!(bindings = bindings.len(), "declarations match");
        Ok(DeclarationMatch {
            root_element,
            bindings,
            unit_element,
            edit: self.edit,
        })
    }

    /// Elements that can hold the declarations nested under their node.
    fn is_container(&self, element: ElementId) -> bool {
        !matches!(
            self.model.kind(element),
            Some(ElementKind::LocalVariable | ElementKind::Label) | None
        )
    }

    /// Fields and top-level variables hold closures through their
    /// initializer function.
    fn container_for(&self, element: ElementId, kind: ElementKind) -> ElementId {
        match self.model.element(element).and_then(|e| e.as_variable()) {
            Some(data) if kind == ElementKind::Function && data.initializer.is_some() => {
                data.initializer
            }
            _ => element,
        }
    }
}
