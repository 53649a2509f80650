//! Subtyping, specificity, least upper bounds and substitution.
//!
//! The rules are the optional-typing rules of the language: `dynamic` is
//! both a top and a bottom type for assignability, type arguments are
//! covariant, and function types are compared by mutual assignability of
//! their parameters. "More specific" is the stricter relation used to decide
//! whether a flow-derived type actually refines a declared one.

use crate::element::{Element, ElementId};
use crate::model::ElementModel;
use crate::provider::TypeProvider;
use crate::types::{FunctionParam, TypeData, TypeId};
use dres_common::limits::{MAX_INHERITANCE_DEPTH, MAX_TYPE_DEPTH, MAX_UNION_MEMBERS};
use dres_syntax::ParameterKind;
use rustc_hash::{FxHashMap, FxHashSet};
use smallvec::SmallVec;

/// Supertypes of an interface type, already substituted.
pub type Supertypes = SmallVec<[TypeId; 4]>;

#[derive(Copy, Clone)]
pub struct TypeSystem<'a> {
    pub model: &'a ElementModel,
    pub provider: &'a TypeProvider,
    /// A union is more specific than `T` only when every member is.
    pub strict_unions: bool,
}

impl<'a> TypeSystem<'a> {
    pub fn new(model: &'a ElementModel, provider: &'a TypeProvider) -> Self {
        Self {
            model,
            provider,
            strict_unions: false,
        }
    }

    pub fn with_strict_unions(mut self, strict: bool) -> Self {
        self.strict_unions = strict;
        self
    }

    #[inline]
    fn lookup(&self, ty: TypeId) -> TypeData {
        self.model.types.lookup(ty).unwrap_or(TypeData::Dynamic)
    }

    /// True for the root class type (`Object`).
    pub fn is_object(&self, ty: TypeId) -> bool {
        match self.lookup(ty) {
            TypeData::Interface { element, .. } => self
                .model
                .element(element)
                .and_then(Element::as_class)
                .is_some_and(|c| c.supertype.is_none()),
            _ => false,
        }
    }

    // =========================================================================
    // Substitution
    // =========================================================================

    /// Replace each type-parameter type in `params` with the corresponding
    /// entry of `args`. Parameters without an argument become `dynamic`.
    pub fn substitute(&self, ty: TypeId, params: &[TypeId], args: &[TypeId]) -> TypeId {
        if params.is_empty() {
            return ty;
        }
        self.substitute_at(ty, params, args, 0)
    }

    fn substitute_at(&self, ty: TypeId, params: &[TypeId], args: &[TypeId], depth: usize) -> TypeId {
        if depth > MAX_TYPE_DEPTH {
            return TypeId::DYNAMIC;
        }
        let types = &self.model.types;
        match self.lookup(ty) {
            TypeData::TypeParameter { .. } => match params.iter().position(|&p| p == ty) {
                Some(i) => args.get(i).copied().unwrap_or(TypeId::DYNAMIC),
                None => ty,
            },
            TypeData::Interface { element, args: own } => {
                if own.is_empty() {
                    return ty;
                }
                let mapped: SmallVec<[TypeId; 2]> = own
                    .iter()
                    .map(|&a| self.substitute_at(a, params, args, depth + 1))
                    .collect();
                if mapped == own {
                    return ty;
                }
                types.interface(element, mapped)
            }
            TypeData::Function {
                element,
                params: fparams,
                return_type,
            } => {
                let mapped: SmallVec<[FunctionParam; 4]> = fparams
                    .iter()
                    .map(|p| FunctionParam {
                        kind: p.kind,
                        name: p.name.clone(),
                        ty: self.substitute_at(p.ty, params, args, depth + 1),
                    })
                    .collect();
                let ret = self.substitute_at(return_type, params, args, depth + 1);
                if ret == return_type && mapped == fparams {
                    return ty;
                }
                types.function(element, mapped, ret)
            }
            TypeData::Union(members) => {
                let mapped: Vec<TypeId> = members
                    .iter()
                    .map(|&m| self.substitute_at(m, params, args, depth + 1))
                    .collect();
                types.union(mapped)
            }
            TypeData::Dynamic | TypeData::Bottom | TypeData::Void => ty,
        }
    }

    /// Substitute the type parameters of the class of `receiver` with its
    /// type arguments inside `ty`.
    pub fn substitute_from(&self, ty: TypeId, receiver: TypeId) -> TypeId {
        let TypeData::Interface { element, args } = self.lookup(receiver) else {
            return ty;
        };
        let params = self.model.type_parameter_types(element);
        self.substitute(ty, &params, &args)
    }

    // =========================================================================
    // Hierarchy
    // =========================================================================

    /// Superclass type of an interface type, instantiated for its arguments.
    pub fn superclass(&self, ty: TypeId) -> Option<TypeId> {
        let TypeData::Interface { element, .. } = self.lookup(ty) else {
            return None;
        };
        let sup = self.model.supertype(element)?;
        Some(self.substitute_from(sup, ty))
    }

    /// Superclass, mixins and interfaces of an interface type.
    pub fn supertypes(&self, ty: TypeId) -> Supertypes {
        let mut out = Supertypes::new();
        let TypeData::Interface { element, .. } = self.lookup(ty) else {
            return out;
        };
        let Some(class) = self.model.element(element).and_then(Element::as_class) else {
            return out;
        };
        out.extend(class.supertype.iter().map(|&s| self.substitute_from(s, ty)));
        out.extend(class.mixins.iter().map(|&m| self.substitute_from(m, ty)));
        out.extend(class.interfaces.iter().map(|&i| self.substitute_from(i, ty)));
        out
    }

    /// Bound of a type parameter, `Object` when unbounded.
    pub fn bound_of(&self, ty: TypeId) -> TypeId {
        if let TypeData::TypeParameter { element } = self.lookup(ty) {
            return self
                .model
                .element(element)
                .and_then(Element::as_type_parameter)
                .and_then(|d| d.bound)
                .unwrap_or(self.provider.object_type);
        }
        ty
    }

    /// Type of the `call` method of an interface type, if any.
    pub fn call_method_type(&self, ty: TypeId) -> Option<TypeId> {
        self.find_method_type(ty, "call", 0)
    }

    fn find_method_type(&self, ty: TypeId, name: &str, depth: usize) -> Option<TypeId> {
        if depth > MAX_INHERITANCE_DEPTH {
            return None;
        }
        let element = self.model.class_of_type(ty);
        if element.is_none() {
            return None;
        }
        let method = self.model.get_method(element, name);
        if method.is_some() && !self.model.element(method).is_some_and(Element::is_static) {
            return Some(self.substitute_from(self.model.element_type(method), ty));
        }
        self.supertypes(ty)
            .into_iter()
            .find_map(|sup| self.find_method_type(sup, name, depth + 1))
    }

    // =========================================================================
    // Subtyping
    // =========================================================================

    pub fn is_subtype(&self, s: TypeId, t: TypeId) -> bool {
        self.subtype_at(s, t, 0)
    }

    /// `s` can be assigned to `t`: either is a subtype of the other.
    pub fn is_assignable(&self, s: TypeId, t: TypeId) -> bool {
        self.is_subtype(s, t) || self.is_subtype(t, s)
    }

    fn mutually_assignable(&self, s: TypeId, t: TypeId, depth: usize) -> bool {
        self.subtype_at(s, t, depth) || self.subtype_at(t, s, depth)
    }

    fn subtype_at(&self, s: TypeId, t: TypeId, depth: usize) -> bool {
        if s == t || s.is_dynamic() || t.is_dynamic() || s.is_bottom() {
            return true;
        }
        if depth > MAX_TYPE_DEPTH || t.is_bottom() || s.is_void() || t.is_void() {
            return false;
        }
        let sd = self.lookup(s);
        let td = self.lookup(t);
        if let TypeData::Union(members) = &sd {
            return members.iter().all(|&m| self.subtype_at(m, t, depth + 1));
        }
        if let TypeData::Union(members) = &td {
            return members.iter().any(|&m| self.subtype_at(s, m, depth + 1));
        }
        if self.is_object(t) {
            return true;
        }
        match (sd, td) {
            (TypeData::TypeParameter { .. }, _) => {
                let bound = self.bound_of(s);
                bound != s && self.subtype_at(bound, t, depth + 1)
            }
            (_, TypeData::TypeParameter { .. }) => false,
            (TypeData::Interface { element: se, args: sa }, TypeData::Interface { element: te, args: ta }) => {
                if se == te {
                    return sa.len() != ta.len()
                        || sa
                            .iter()
                            .zip(ta.iter())
                            .all(|(&a, &b)| self.subtype_at(a, b, depth + 1));
                }
                self.supertypes(s)
                    .into_iter()
                    .any(|sup| self.subtype_at(sup, t, depth + 1))
            }
            (TypeData::Function { .. }, TypeData::Interface { .. }) => t == self.provider.function_type,
            (TypeData::Interface { .. }, TypeData::Function { .. }) => self
                .call_method_type(s)
                .is_some_and(|call| self.subtype_at(call, t, depth + 1)),
            (
                TypeData::Function { params: sp, return_type: sr, .. },
                TypeData::Function { params: tp, return_type: tr, .. },
            ) => {
                (tr.is_void() || self.mutually_assignable(sr, tr, depth + 1))
                    && self.parameters_compatible(&sp, &tp, depth)
            }
            _ => false,
        }
    }

    /// Parameter rule shared by subtyping and specificity: equal required
    /// counts, at least as many positional parameters, a superset of named
    /// parameters, and mutually assignable parameter types.
    fn parameters_compatible(
        &self,
        s: &[FunctionParam],
        t: &[FunctionParam],
        depth: usize,
    ) -> bool {
        let required = |ps: &[FunctionParam]| {
            ps.iter().filter(|p| p.kind == ParameterKind::Required).count()
        };
        let positional = |ps: &[FunctionParam]| -> Vec<TypeId> {
            ps.iter()
                .filter(|p| p.kind != ParameterKind::Named)
                .map(|p| p.ty)
                .collect()
        };
        if required(s) != required(t) {
            return false;
        }
        let (s_pos, t_pos) = (positional(s), positional(t));
        if s_pos.len() < t_pos.len() {
            return false;
        }
        if !s_pos
            .iter()
            .zip(t_pos.iter())
            .all(|(&a, &b)| self.mutually_assignable(a, b, depth + 1))
        {
            return false;
        }
        let s_named: FxHashMap<&str, TypeId> = s
            .iter()
            .filter(|p| p.kind == ParameterKind::Named)
            .map(|p| (p.name.as_str(), p.ty))
            .collect();
        t.iter()
            .filter(|p| p.kind == ParameterKind::Named)
            .all(|p| {
                s_named
                    .get(p.name.as_str())
                    .is_some_and(|&sty| self.mutually_assignable(sty, p.ty, depth + 1))
            })
    }

    // =========================================================================
    // Specificity
    // =========================================================================

    /// `s << t`: `s` is at least as precise as `t`. Unlike subtyping,
    /// `dynamic` is more specific only than itself.
    pub fn is_more_specific(&self, s: TypeId, t: TypeId) -> bool {
        self.more_specific_at(s, t, 0)
    }

    fn more_specific_at(&self, s: TypeId, t: TypeId, depth: usize) -> bool {
        if s == t || t.is_dynamic() || s.is_bottom() {
            return true;
        }
        if depth > MAX_TYPE_DEPTH || s.is_dynamic() || t.is_bottom() || s.is_void() || t.is_void() {
            return false;
        }
        let sd = self.lookup(s);
        let td = self.lookup(t);
        if let TypeData::Union(members) = &sd {
            let mut each = members.iter().map(|&m| self.more_specific_at(m, t, depth + 1));
            return if self.strict_unions {
                each.all(|b| b)
            } else {
                each.any(|b| b)
            };
        }
        if let TypeData::Union(members) = &td {
            return members.iter().any(|&m| self.more_specific_at(s, m, depth + 1));
        }
        if self.is_object(t) {
            return true;
        }
        match (sd, td) {
            (TypeData::TypeParameter { .. }, _) => {
                let bound = self.bound_of(s);
                bound != s && self.more_specific_at(bound, t, depth + 1)
            }
            (_, TypeData::TypeParameter { .. }) => false,
            (TypeData::Interface { element: se, args: sa }, TypeData::Interface { element: te, args: ta }) => {
                if se == te {
                    return sa.len() != ta.len()
                        || sa
                            .iter()
                            .zip(ta.iter())
                            .all(|(&a, &b)| self.more_specific_at(a, b, depth + 1));
                }
                self.supertypes(s)
                    .into_iter()
                    .any(|sup| self.more_specific_at(sup, t, depth + 1))
            }
            (TypeData::Function { .. }, TypeData::Interface { .. }) => t == self.provider.function_type,
            (TypeData::Interface { .. }, TypeData::Function { .. }) => self
                .call_method_type(s)
                .is_some_and(|call| self.more_specific_at(call, t, depth + 1)),
            (
                TypeData::Function { params: sp, return_type: sr, .. },
                TypeData::Function { params: tp, return_type: tr, .. },
            ) => {
                (tr.is_void() || self.more_specific_at(sr, tr, depth + 1))
                    && self.parameters_compatible(&sp, &tp, depth)
            }
            _ => false,
        }
    }

    // =========================================================================
    // Least upper bound
    // =========================================================================

    pub fn least_upper_bound(&self, a: TypeId, b: TypeId) -> TypeId {
        if a == b {
            return a;
        }
        if a.is_dynamic() || b.is_dynamic() {
            return TypeId::DYNAMIC;
        }
        if a.is_bottom() {
            return b;
        }
        if b.is_bottom() {
            return a;
        }
        if a.is_void() || b.is_void() {
            return TypeId::DYNAMIC;
        }
        let ad = self.lookup(a);
        let bd = self.lookup(b);
        if matches!(ad, TypeData::TypeParameter { .. }) {
            return self.least_upper_bound(self.bound_of(a), b);
        }
        if matches!(bd, TypeData::TypeParameter { .. }) {
            return self.least_upper_bound(a, self.bound_of(b));
        }
        if let TypeData::Union(members) = ad {
            return members
                .iter()
                .fold(b, |acc, &m| self.least_upper_bound(acc, m));
        }
        if let TypeData::Union(members) = bd {
            return members
                .iter()
                .fold(a, |acc, &m| self.least_upper_bound(acc, m));
        }
        match (self.is_subtype(a, b), self.is_subtype(b, a)) {
            (true, true) => return if self.is_more_specific(a, b) { b } else { a },
            (true, false) => return b,
            (false, true) => return a,
            (false, false) => {}
        }
        match (self.lookup(a), self.lookup(b)) {
            (TypeData::Function { .. }, TypeData::Function { .. }) => self.provider.function_type,
            (TypeData::Function { .. }, TypeData::Interface { .. }) => {
                self.least_upper_bound(self.provider.function_type, b)
            }
            (TypeData::Interface { .. }, TypeData::Function { .. }) => {
                self.least_upper_bound(a, self.provider.function_type)
            }
            (TypeData::Interface { .. }, TypeData::Interface { .. }) => self.interface_lub(a, b),
            _ => TypeId::DYNAMIC,
        }
    }

    /// The unique common supertype of maximal depth, else `Object`.
    fn interface_lub(&self, a: TypeId, b: TypeId) -> TypeId {
        let sa = self.all_supertypes(a);
        let sb = self.all_supertypes(b);
        let mut by_depth: FxHashMap<usize, Vec<TypeId>> = FxHashMap::default();
        for &ty in sa.iter().filter(|ty| sb.contains(ty)) {
            let depth = self.class_depth(self.model.class_of_type(ty), 0);
            by_depth.entry(depth).or_default().push(ty);
        }
        let mut depths: Vec<usize> = by_depth.keys().copied().collect();
        depths.sort_unstable_by(|x, y| y.cmp(x));
        depths
            .into_iter()
            .find_map(|d| match by_depth.get(&d).map(Vec::as_slice) {
                Some([only]) => Some(*only),
                _ => None,
            })
            .unwrap_or(self.provider.object_type)
    }

    /// `ty` and all of its transitive supertypes.
    pub fn all_supertypes(&self, ty: TypeId) -> FxHashSet<TypeId> {
        let mut seen = FxHashSet::default();
        let mut stack = vec![(ty, 0usize)];
        while let Some((current, depth)) = stack.pop() {
            if depth > MAX_INHERITANCE_DEPTH || !seen.insert(current) {
                continue;
            }
            stack.extend(self.supertypes(current).into_iter().map(|s| (s, depth + 1)));
        }
        seen
    }

    /// Length of the longest supertype path from `class` to the root class.
    pub fn class_depth(&self, class: ElementId, depth: usize) -> usize {
        if depth > MAX_INHERITANCE_DEPTH {
            return 0;
        }
        let Some(data) = self.model.element(class).and_then(Element::as_class) else {
            return 0;
        };
        data.supertype
            .iter()
            .chain(data.mixins.iter())
            .chain(data.interfaces.iter())
            .map(|&s| 1 + self.class_depth(self.model.class_of_type(s), depth + 1))
            .max()
            .unwrap_or(0)
    }

    // =========================================================================
    // Unions
    // =========================================================================

    /// Union of two types, collapsing to `dynamic` past the member limit.
    pub fn union(&self, a: TypeId, b: TypeId) -> TypeId {
        if a.is_dynamic() || b.is_dynamic() {
            return TypeId::DYNAMIC;
        }
        let ty = self.model.types.union([a, b]);
        match self.model.types.union_members(ty) {
            Some(members) if members.len() > MAX_UNION_MEMBERS => TypeId::DYNAMIC,
            _ => ty,
        }
    }
}

#[cfg(test)]
#[path = "../tests/type_system_tests.rs"]
mod tests;
