//! Member lookup on union types.
//!
//! A member is found on a union only when every member type has one and
//! all of them share the same parameter shape: count, kinds, order and
//! names. The result is then a synthetic member whose parameter and return
//! types are the unions of the originals. Shapes that differ give no member.

use super::ResolverVisitor;
use dres_element::{
    Element, ElementData, ElementFlags, ElementId, ExecutableData, FunctionParam, ParameterData,
    TypeData, TypeId,
};
use smallvec::SmallVec;
use tracing::trace;

impl ResolverVisitor<'_> {
    pub(crate) fn lookup_in_union(&mut self, union: TypeId, name: &str) -> ElementId {
        let key = (union, name.to_string());
        if let Some(&merged) = self.merged_members.get(&key) {
            return merged;
        }
        let merged = self.merge_union_members(union, name);
        self.merged_members.insert(key, merged);
        merged
    }

    fn merge_union_members(&mut self, union: TypeId, name: &str) -> ElementId {
        let Some(members) = self.model.types.union_members(union) else {
            return ElementId::NONE;
        };
        let mut found: SmallVec<[(ElementId, TypeId); 4]> = SmallVec::new();
        for member in members {
            match self.lookup_on_type(member, name) {
                Some(entry) => found.push(entry),
                None => return ElementId::NONE,
            }
        }
        let Some(&(first, first_type)) = found.first() else {
            return ElementId::NONE;
        };
        if found.iter().all(|&(e, t)| e == first && t == first_type) {
            return first;
        }
        let kind = self.model.kind(first);
        if found.iter().any(|&(e, _)| self.model.kind(e) != kind) {
            trace!(name, "union members differ in kind");
            return ElementId::NONE;
        }
        let Some(executable_kind) = self
            .model
            .element(first)
            .and_then(Element::as_executable)
            .map(|d| d.kind)
        else {
            return ElementId::NONE;
        };

        let mut signatures: SmallVec<[(SmallVec<[FunctionParam; 4]>, TypeId); 4]> = SmallVec::new();
        for &(_, ty) in &found {
            match self.model.types.lookup(ty) {
                Some(TypeData::Function {
                    params,
                    return_type,
                    ..
                }) => signatures.push((params, return_type)),
                _ => return ElementId::NONE,
            }
        }
        let (shape, _) = &signatures[0];
        let same_shape = signatures.iter().all(|(params, _)| {
            params.len() == shape.len()
                && params
                    .iter()
                    .zip(shape.iter())
                    .all(|(a, b)| a.kind == b.kind && a.name == b.name)
        });
        if !same_shape {
            trace!(name, "union members differ in shape");
            return ElementId::NONE;
        }

        let ts = self.ts();
        let return_type = signatures
            .iter()
            .map(|(_, r)| *r)
            .reduce(|a, b| ts.union(a, b))
            .unwrap_or(TypeId::DYNAMIC);
        let params: SmallVec<[FunctionParam; 4]> = (0..shape.len())
            .map(|i| {
                let ty = signatures
                    .iter()
                    .map(|(p, _)| p[i].ty)
                    .reduce(|a, b| ts.union(a, b))
                    .unwrap_or(TypeId::DYNAMIC);
                FunctionParam {
                    kind: shape[i].kind,
                    name: shape[i].name.clone(),
                    ty,
                }
            })
            .collect();

        let mut element = Element::new(
            name,
            0,
            ElementData::Executable(ExecutableData::new(executable_kind)),
        );
        element.flags |= ElementFlags::SYNTHETIC;
        let merged = self.model.elements.add(element, ElementId::NONE);
        let mut parameter_ids = Vec::with_capacity(params.len());
        for (i, param) in params.iter().enumerate() {
            let mut data = ParameterData::new(param.kind);
            data.ty = param.ty;
            let param_name = if param.name.is_empty() {
                format!("p{i}")
            } else {
                param.name.clone()
            };
            let mut element = Element::new(param_name, 0, ElementData::Parameter(data));
            element.flags |= ElementFlags::SYNTHETIC;
            parameter_ids.push(self.model.elements.add(element, merged));
        }
        let ty = self.model.types.function(merged, params, return_type);
        if let Some(data) = self
            .model
            .element_mut(merged)
            .and_then(Element::as_executable_mut)
        {
            data.parameters = parameter_ids;
            data.return_type = return_type;
            data.ty = ty;
        }
        trace!(name, merged = merged.0, "merged union member");
        merged
    }
}
