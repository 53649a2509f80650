//! Side tables holding everything the resolver writes onto a syntax tree.
//!
//! Nodes are never mutated. Each unit gets one [`UnitAnnotations`] whose
//! tables are keyed by [`NodeIndex`] of that unit's arena.

use dres_element::{ElementId, TypeId};
use dres_syntax::NodeIndex;
use rustc_hash::FxHashMap;

/// Getter half of a combined get/set reference (`a[i] += 1`, `x++`).
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct AuxiliaryElements {
    pub static_element: ElementId,
    pub propagated_element: ElementId,
}

#[derive(Clone, Debug, Default)]
pub struct UnitAnnotations {
    /// Declaration node (and its name identifier) to the declared element.
    declared: FxHashMap<NodeIndex, ElementId>,
    static_elements: FxHashMap<NodeIndex, ElementId>,
    propagated_elements: FxHashMap<NodeIndex, ElementId>,
    auxiliary: FxHashMap<NodeIndex, AuxiliaryElements>,
    static_types: FxHashMap<NodeIndex, TypeId>,
    propagated_types: FxHashMap<NodeIndex, TypeId>,
    /// Argument expression to the parameter it is passed to.
    static_parameters: FxHashMap<NodeIndex, ElementId>,
    propagated_parameters: FxHashMap<NodeIndex, ElementId>,
}

impl UnitAnnotations {
    pub fn new() -> Self {
        Self::default()
    }

    // =========================================================================
    // Declarations
    // =========================================================================

    pub fn declare(&mut self, node: NodeIndex, element: ElementId) {
        if node.is_some() && element.is_some() {
            self.declared.insert(node, element);
        }
    }

    /// Element declared by a declaration node, `NONE` for other nodes.
    pub fn declared_element(&self, node: NodeIndex) -> ElementId {
        self.declared.get(&node).copied().unwrap_or(ElementId::NONE)
    }

    pub fn declarations(&self) -> impl Iterator<Item = (NodeIndex, ElementId)> + '_ {
        self.declared.iter().map(|(&n, &e)| (n, e))
    }

    // =========================================================================
    // Bound elements
    // =========================================================================

    pub fn set_static_element(&mut self, node: NodeIndex, element: ElementId) {
        set_or_clear(&mut self.static_elements, node, element);
    }

    pub fn set_propagated_element(&mut self, node: NodeIndex, element: ElementId) {
        set_or_clear(&mut self.propagated_elements, node, element);
    }

    pub fn static_element(&self, node: NodeIndex) -> ElementId {
        self.static_elements.get(&node).copied().unwrap_or(ElementId::NONE)
    }

    pub fn propagated_element(&self, node: NodeIndex) -> ElementId {
        self.propagated_elements
            .get(&node)
            .copied()
            .unwrap_or(ElementId::NONE)
    }

    /// Propagated element if any, else the static one.
    pub fn best_element(&self, node: NodeIndex) -> ElementId {
        let propagated = self.propagated_element(node);
        if propagated.is_some() {
            propagated
        } else {
            self.static_element(node)
        }
    }

    pub fn set_auxiliary(&mut self, node: NodeIndex, aux: AuxiliaryElements) {
        if aux.static_element.is_none() && aux.propagated_element.is_none() {
            self.auxiliary.remove(&node);
        } else {
            self.auxiliary.insert(node, aux);
        }
    }

    pub fn auxiliary(&self, node: NodeIndex) -> Option<AuxiliaryElements> {
        self.auxiliary.get(&node).copied()
    }

    // =========================================================================
    // Types
    // =========================================================================

    pub fn set_static_type(&mut self, node: NodeIndex, ty: TypeId) {
        if node.is_some() {
            self.static_types.insert(node, ty);
        }
    }

    /// Record a propagated type. Callers check that it refines the static
    /// type before calling.
    pub fn set_propagated_type(&mut self, node: NodeIndex, ty: Option<TypeId>) {
        match ty {
            Some(ty) if node.is_some() => {
                self.propagated_types.insert(node, ty);
            }
            _ => {
                self.propagated_types.remove(&node);
            }
        }
    }

    pub fn static_type(&self, node: NodeIndex) -> Option<TypeId> {
        self.static_types.get(&node).copied()
    }

    pub fn propagated_type(&self, node: NodeIndex) -> Option<TypeId> {
        self.propagated_types.get(&node).copied()
    }

    /// Propagated type if any, else the static type, else `dynamic`.
    pub fn best_type(&self, node: NodeIndex) -> TypeId {
        self.propagated_type(node)
            .or_else(|| self.static_type(node))
            .unwrap_or(TypeId::DYNAMIC)
    }

    // =========================================================================
    // Argument correspondence
    // =========================================================================

    pub fn set_static_parameter(&mut self, argument: NodeIndex, parameter: ElementId) {
        set_or_clear(&mut self.static_parameters, argument, parameter);
    }

    pub fn set_propagated_parameter(&mut self, argument: NodeIndex, parameter: ElementId) {
        set_or_clear(&mut self.propagated_parameters, argument, parameter);
    }

    pub fn static_parameter(&self, argument: NodeIndex) -> ElementId {
        self.static_parameters
            .get(&argument)
            .copied()
            .unwrap_or(ElementId::NONE)
    }

    pub fn propagated_parameter(&self, argument: NodeIndex) -> ElementId {
        self.propagated_parameters
            .get(&argument)
            .copied()
            .unwrap_or(ElementId::NONE)
    }

    // =========================================================================
    // Bulk operations
    // =========================================================================

    /// Drop everything recorded for `nodes` except declarations.
    pub fn clear_resolution(&mut self, nodes: &[NodeIndex]) {
        for node in nodes {
            self.static_elements.remove(node);
            self.propagated_elements.remove(node);
            self.auxiliary.remove(node);
            self.static_types.remove(node);
            self.propagated_types.remove(node);
            self.static_parameters.remove(node);
            self.propagated_parameters.remove(node);
        }
    }

    /// Copy every annotation of `from_node` in `from` onto `to_node`.
    pub fn copy_node(&mut self, from: &UnitAnnotations, from_node: NodeIndex, to_node: NodeIndex) {
        fn copy<V: Copy>(
            dst: &mut FxHashMap<NodeIndex, V>,
            src: &FxHashMap<NodeIndex, V>,
            from: NodeIndex,
            to: NodeIndex,
        ) {
            match src.get(&from) {
                Some(&v) => {
                    dst.insert(to, v);
                }
                None => {
                    dst.remove(&to);
                }
            }
        }
        copy(&mut self.declared, &from.declared, from_node, to_node);
        copy(&mut self.static_elements, &from.static_elements, from_node, to_node);
        copy(&mut self.propagated_elements, &from.propagated_elements, from_node, to_node);
        copy(&mut self.auxiliary, &from.auxiliary, from_node, to_node);
        copy(&mut self.static_types, &from.static_types, from_node, to_node);
        copy(&mut self.propagated_types, &from.propagated_types, from_node, to_node);
        copy(&mut self.static_parameters, &from.static_parameters, from_node, to_node);
        copy(
            &mut self.propagated_parameters,
            &from.propagated_parameters,
            from_node,
            to_node,
        );
    }

    pub fn resolved_node_count(&self) -> usize {
        self.static_elements.len() + self.static_types.len()
    }
}

fn set_or_clear(map: &mut FxHashMap<NodeIndex, ElementId>, node: NodeIndex, element: ElementId) {
    if node.is_none() {
        return;
    }
    if element.is_some() {
        map.insert(node, element);
    } else {
        map.remove(&node);
    }
}
