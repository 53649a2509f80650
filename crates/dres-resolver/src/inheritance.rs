//! Inherited member lookup with per-class caches.
//!
//! Two maps are kept for every class that has been queried:
//! - the class chain: members inherited through the superclass chain and
//!   mixins, later mixins overriding earlier ones;
//! - the interface map: members inherited through the superclass, mixins
//!   and interfaces, with same-named candidates resolved to the most
//!   specific one.
//!
//! Neither map contains the class's own members. Caches are filled on demand
//! and live until [`InheritanceManager::clear`].

use dres_common::diagnostics::diagnostic_codes;
use dres_common::limits::MAX_INHERITANCE_DEPTH;
use dres_element::{Element, ElementId, ElementKind, TypeId, TypeSystem};
use indexmap::IndexMap;
use rustc_hash::{FxHashMap, FxHashSet};
use std::cell::RefCell;
use std::collections::VecDeque;
use tracing::{debug, trace};

/// Member name (setters end in `=`) to member.
pub type MemberMap = IndexMap<String, ElementId>;

/// Inherited candidates that could not be reconciled.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InheritanceConflict {
    pub name: String,
    /// `INCONSISTENT_METHOD_INHERITANCE` or the getter/method variant.
    pub code: u32,
    pub members: Vec<ElementId>,
}

#[derive(Debug, Default)]
pub struct InheritanceManager {
    library: ElementId,
    class_chain: RefCell<FxHashMap<ElementId, MemberMap>>,
    interfaces: RefCell<FxHashMap<ElementId, MemberMap>>,
    conflicts: RefCell<FxHashMap<ElementId, Vec<InheritanceConflict>>>,
}

impl InheritanceManager {
    pub fn new(library: ElementId) -> Self {
        Self {
            library,
            ..Self::default()
        }
    }

    pub fn library(&self) -> ElementId {
        self.library
    }

    /// Drop every cached map, e.g. after the library's elements changed.
    pub fn clear(&self) {
        self.class_chain.borrow_mut().clear();
        self.interfaces.borrow_mut().clear();
        self.conflicts.borrow_mut().clear();
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// Member named `name` visible on instances of `class`: declared
    /// directly, else inherited through the class chain, else through the
    /// interfaces.
    pub fn lookup_member(&self, ts: &TypeSystem<'_>, class: ElementId, name: &str) -> ElementId {
        let direct = ts.model.get_member(class, name);
        if direct.is_some() {
            return direct;
        }
        self.lookup_inherited(ts, class, name)
    }

    /// Member named `name` inherited by `class`, ignoring its own members.
    /// This is the lookup behind `super.name`.
    pub fn lookup_inherited(&self, ts: &TypeSystem<'_>, class: ElementId, name: &str) -> ElementId {
        self.fill_class_chain(ts, class);
        let chained = self
            .class_chain
            .borrow()
            .get(&class)
            .and_then(|map| map.get(name))
            .copied();
        if let Some(member) = chained {
            return member;
        }
        self.fill_interface_map(ts, class);
        self.interfaces
            .borrow()
            .get(&class)
            .and_then(|map| map.get(name))
            .copied()
            .unwrap_or(ElementId::NONE)
    }

    /// Member named `name` of `receiver` together with its type, with type
    /// parameters replaced along the inheritance path from `receiver` down
    /// to the declaring class.
    pub fn lookup_member_type(
        &self,
        ts: &TypeSystem<'_>,
        receiver: TypeId,
        name: &str,
    ) -> Option<(ElementId, TypeId)> {
        let class = ts.model.class_of_type(receiver);
        if class.is_none() {
            return None;
        }
        let member = self.lookup_member(ts, class, name);
        if member.is_none() {
            return None;
        }
        Some((member, self.substitute_member_type(ts, receiver, member)))
    }

    /// Type of `member` as seen through `receiver`.
    pub fn substitute_member_type(&self, ts: &TypeSystem<'_>, receiver: TypeId, member: ElementId) -> TypeId {
        let declared = ts.model.element_type(member);
        let name = ts.model.name(member).to_string();
        let mut path = Vec::new();
        if !inheritance_path(ts, receiver, &name, &mut path, 0) {
            return ts.substitute_from(declared, receiver);
        }
        trace!(member = member.0, path = path.len(), "inheritance path");
        path.iter().rev().fold(declared, |ty, &step| {
            let class = ts.model.class_of_type(step);
            let params = ts.model.type_parameter_types(class);
            let args = ts.model.types.type_arguments(step);
            ts.substitute(ty, &params, &args)
        })
    }

    /// Members of supertypes of `class` that a member named `name` in
    /// `class` overrides, nearest first.
    pub fn lookup_overrides(&self, ts: &TypeSystem<'_>, class: ElementId, name: &str) -> Vec<ElementId> {
        let mut out = Vec::new();
        let mut visited: FxHashSet<ElementId> = FxHashSet::default();
        visited.insert(class);
        let mut queue: VecDeque<ElementId> = direct_supertype_classes(ts, class).into();
        while let Some(current) = queue.pop_front() {
            if !visited.insert(current) || visited.len() > MAX_INHERITANCE_DEPTH {
                continue;
            }
            let member = ts.model.get_member(current, name);
            if member.is_some() && !ts.model.element(member).is_some_and(Element::is_static) {
                out.push(member);
            }
            queue.extend(direct_supertype_classes(ts, current));
        }
        out
    }

    pub fn members_inherited_from_classes(&self, ts: &TypeSystem<'_>, class: ElementId) -> MemberMap {
        self.fill_class_chain(ts, class);
        self.class_chain
            .borrow()
            .get(&class)
            .cloned()
            .unwrap_or_default()
    }

    pub fn members_inherited_from_interfaces(&self, ts: &TypeSystem<'_>, class: ElementId) -> MemberMap {
        self.fill_interface_map(ts, class);
        self.interfaces
            .borrow()
            .get(&class)
            .cloned()
            .unwrap_or_default()
    }

    /// Conflicts found while building the interface map of `class`.
    pub fn conflicts(&self, ts: &TypeSystem<'_>, class: ElementId) -> Vec<InheritanceConflict> {
        self.fill_interface_map(ts, class);
        self.conflicts
            .borrow()
            .get(&class)
            .cloned()
            .unwrap_or_default()
    }

    // =========================================================================
    // Class chain
    // =========================================================================

    fn fill_class_chain(&self, ts: &TypeSystem<'_>, class: ElementId) {
        if self.class_chain.borrow().contains_key(&class) {
            return;
        }
        let mut visiting = FxHashSet::default();
        self.compute_class_chain(ts, class, &mut visiting);
    }

    fn compute_class_chain(
        &self,
        ts: &TypeSystem<'_>,
        class: ElementId,
        visiting: &mut FxHashSet<ElementId>,
    ) -> MemberMap {
        if let Some(map) = self.class_chain.borrow().get(&class) {
            return map.clone();
        }
        let Some(data) = ts.model.element(class).and_then(Element::as_class) else {
            return MemberMap::new();
        };
        if visiting.len() > MAX_INHERITANCE_DEPTH || !visiting.insert(class) {
            return MemberMap::new();
        }
        let mut map = MemberMap::new();
        if let Some(supertype) = data.supertype {
            let superclass = ts.model.class_of_type(supertype);
            if superclass.is_some() {
                map = self.compute_class_chain(ts, superclass, visiting);
                for member in instance_members(ts, superclass) {
                    map.insert(ts.model.name(member).to_string(), member);
                }
            }
        }
        for &mixin in &data.mixins {
            if ts.is_object(mixin) {
                continue;
            }
            let mixin_class = ts.model.class_of_type(mixin);
            for member in instance_members(ts, mixin_class) {
                let name = ts.model.name(member);
                if map.contains_key(name) && ts.model.element(member).is_some_and(Element::is_abstract) {
                    continue;
                }
                map.insert(name.to_string(), member);
            }
        }
        visiting.remove(&class);
        trace!(class = class.0, members = map.len(), "class chain map");
        self.class_chain.borrow_mut().insert(class, map.clone());
        map
    }

    // =========================================================================
    // Interface map
    // =========================================================================

    fn fill_interface_map(&self, ts: &TypeSystem<'_>, class: ElementId) {
        if self.interfaces.borrow().contains_key(&class) {
            return;
        }
        let mut visiting = FxHashSet::default();
        self.compute_interface_map(ts, class, &mut visiting);
    }

    fn compute_interface_map(
        &self,
        ts: &TypeSystem<'_>,
        class: ElementId,
        visiting: &mut FxHashSet<ElementId>,
    ) -> MemberMap {
        if let Some(map) = self.interfaces.borrow().get(&class) {
            return map.clone();
        }
        if ts.model.element(class).and_then(Element::as_class).is_none() {
            return MemberMap::new();
        }
        if visiting.len() > MAX_INHERITANCE_DEPTH || !visiting.insert(class) {
            return MemberMap::new();
        }

        let mut candidates: IndexMap<String, Vec<ElementId>> = IndexMap::new();
        for parent in direct_supertype_classes(ts, class) {
            let mut view = self.compute_interface_map(ts, parent, visiting);
            for member in instance_members(ts, parent) {
                view.insert(ts.model.name(member).to_string(), member);
            }
            for (name, member) in view {
                let entry = candidates.entry(name).or_default();
                if !entry.contains(&member) {
                    entry.push(member);
                }
            }
        }

        let mut map = MemberMap::new();
        let mut conflicts = Vec::new();
        for (name, members) in candidates {
            if let [only] = members.as_slice() {
                map.insert(name, *only);
                continue;
            }
            if mixes_methods_and_getters(ts, &members) {
                conflicts.push(InheritanceConflict {
                    name,
                    code: diagnostic_codes::INCONSISTENT_METHOD_INHERITANCE_GETTER_AND_METHOD,
                    members,
                });
                continue;
            }
            match most_specific(ts, class, &members) {
                Some(member) => {
                    map.insert(name, member);
                }
                None => {
                    debug!(class = class.0, name = %name, "inconsistent inheritance");
                    conflicts.push(InheritanceConflict {
                        name,
                        code: diagnostic_codes::INCONSISTENT_METHOD_INHERITANCE,
                        members,
                    });
                }
            }
        }
        visiting.remove(&class);
        if !conflicts.is_empty() {
            self.conflicts.borrow_mut().insert(class, conflicts);
        }
        self.interfaces.borrow_mut().insert(class, map.clone());
        map
    }
}

/// Non-static methods and accessors declared directly in `class`.
fn instance_members(ts: &TypeSystem<'_>, class: ElementId) -> Vec<ElementId> {
    ts.model
        .class_members(class)
        .into_iter()
        .filter(|&m| !ts.model.element(m).is_some_and(Element::is_static))
        .collect()
}

/// Classes of the superclass, mixins and interfaces of `class`, in that order.
fn direct_supertype_classes(ts: &TypeSystem<'_>, class: ElementId) -> Vec<ElementId> {
    let Some(data) = ts.model.element(class).and_then(Element::as_class) else {
        return Vec::new();
    };
    data.supertype
        .iter()
        .chain(data.mixins.iter())
        .chain(data.interfaces.iter())
        .map(|&ty| ts.model.class_of_type(ty))
        .filter(|c| c.is_some())
        .collect()
}

fn mixes_methods_and_getters(ts: &TypeSystem<'_>, members: &[ElementId]) -> bool {
    let has = |kind: ElementKind| members.iter().any(|&m| ts.model.kind(m) == Some(kind));
    has(ElementKind::Method) && has(ElementKind::Getter)
}

/// The first candidate whose type, seen from `class`, is a subtype of the
/// type of every other candidate.
fn most_specific(ts: &TypeSystem<'_>, class: ElementId, members: &[ElementId]) -> Option<ElementId> {
    let this_type = ts.model.element_type(class);
    let supertypes = ts.all_supertypes(this_type);
    let types: Vec<TypeId> = members
        .iter()
        .map(|&member| {
            let declaring = ts.model.elements.class_of(member);
            let declared = ts.model.element_type(member);
            supertypes
                .iter()
                .copied()
                .find(|&s| ts.model.class_of_type(s) == declaring)
                .map_or(declared, |s| ts.substitute_from(declared, s))
        })
        .collect();
    types.iter().enumerate().find_map(|(i, &candidate)| {
        types
            .iter()
            .enumerate()
            .all(|(j, &other)| i == j || ts.is_subtype(candidate, other))
            .then_some(members[i])
    })
}

/// Path of declared supertypes from `ty` to the type whose class declares
/// `name`: mixins first (last declared first), then the superclass, then
/// the interfaces.
fn inheritance_path(
    ts: &TypeSystem<'_>,
    ty: TypeId,
    name: &str,
    path: &mut Vec<TypeId>,
    depth: usize,
) -> bool {
    if depth > MAX_INHERITANCE_DEPTH {
        return false;
    }
    let class = ts.model.class_of_type(ty);
    let Some(data) = ts.model.element(class).and_then(Element::as_class) else {
        return false;
    };
    path.push(ty);
    if ts.model.get_member(class, name).is_some() {
        return true;
    }
    for &mixin in data.mixins.iter().rev() {
        if ts.model.get_member(ts.model.class_of_type(mixin), name).is_some() {
            path.push(mixin);
            return true;
        }
    }
    let mark = path.len();
    if let Some(supertype) = data.supertype {
        if inheritance_path(ts, supertype, name, path, depth + 1) {
            return true;
        }
        path.truncate(mark);
    }
    for &interface in &data.interfaces {
        if inheritance_path(ts, interface, name, path, depth + 1) {
            return true;
        }
        path.truncate(mark);
    }
    path.truncate(mark - 1);
    false
}
