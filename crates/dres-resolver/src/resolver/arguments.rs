//! Argument to parameter correspondence.
//!
//! Positional arguments match required, then optional positional
//! parameters in order; named arguments match named parameters by name.
//! Mismatches are reported and every argument that did match stays bound.

use super::ResolverVisitor;
use dres_common::diagnostics::diagnostic_codes;
use dres_element::{Element, ElementId, ElementKind, TypeData, TypeId};
use dres_syntax::{NodeIndex, NodeKind, ParameterKind};
use smallvec::SmallVec;
use tracing::trace;

/// Which side table the correspondence goes to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Correspondence {
    Static,
    Propagated,
}

impl ResolverVisitor<'_> {
    /// Parameters a call to `callee` (of type `ty`) takes, when known.
    /// Getters and variables holding functions take the parameters of the
    /// element behind their function type.
    pub(crate) fn callee_parameters(&self, callee: ElementId, ty: TypeId) -> Option<Vec<ElementId>> {
        if matches!(
            self.model.kind(callee),
            Some(ElementKind::Method | ElementKind::Function | ElementKind::Constructor)
        ) {
            return Some(self.model.parameters(callee).to_vec());
        }
        let ty = self.ts().call_method_type(ty).unwrap_or(ty);
        match self.model.types.lookup(ty) {
            Some(TypeData::Function { element, .. }) if element.is_some() => {
                Some(self.model.parameters(element).to_vec())
            }
            _ => None,
        }
    }

    pub(crate) fn resolve_arguments(
        &mut self,
        argument_list: NodeIndex,
        parameters: &[ElementId],
        correspondence: Correspondence,
    ) {
        let arena = self.unit.arena;
        let Some(NodeKind::ArgumentList { arguments }) = arena.kind(argument_list) else {
            return;
        };
        let report = correspondence == Correspondence::Static;

        let mut required: SmallVec<[ElementId; 4]> = SmallVec::new();
        let mut optional: SmallVec<[ElementId; 4]> = SmallVec::new();
        let mut named: SmallVec<[ElementId; 4]> = SmallVec::new();
        for &parameter in parameters {
            match self.model.element(parameter).and_then(Element::as_parameter) {
                Some(data) if data.kind == ParameterKind::Required => required.push(parameter),
                Some(data) if data.kind == ParameterKind::Positional => optional.push(parameter),
                Some(_) => named.push(parameter),
                None => {}
            }
        }
        let positional: SmallVec<[ElementId; 8]> =
            required.iter().chain(optional.iter()).copied().collect();
        let positional_arguments = arguments
            .iter()
            .filter(|&a| !matches!(arena.kind(a), Some(NodeKind::NamedExpression { .. })))
            .count();

        let mut index = 0;
        let mut used_names: SmallVec<[String; 4]> = SmallVec::new();
        for argument in arguments.iter() {
            if let Some(NodeKind::NamedExpression { name, expression }) = arena.kind(argument) {
                let label = self.identifier_text(*name);
                if used_names.contains(&label) {
                    if report {
                        self.report(
                            *name,
                            diagnostic_codes::DUPLICATE_NAMED_ARGUMENT,
                            vec![label.clone()],
                        );
                    }
                } else {
                    used_names.push(label.clone());
                }
                let parameter = named
                    .iter()
                    .copied()
                    .find(|&p| self.model.name(p) == label);
                match parameter {
                    Some(parameter) => {
                        self.bind_argument(*expression, parameter, correspondence);
                        if report {
                            self.annotations.set_static_element(*name, parameter);
                        }
                    }
                    None if report => {
                        self.report(*name, diagnostic_codes::UNDEFINED_NAMED_PARAMETER, vec![label]);
                    }
                    None => {}
                }
                continue;
            }
            if let Some(&parameter) = positional.get(index) {
                self.bind_argument(argument, parameter, correspondence);
            } else if index == positional.len() && report {
                self.report(
                    argument,
                    diagnostic_codes::EXTRA_POSITIONAL_ARGUMENTS,
                    vec![positional.len().to_string(), positional_arguments.to_string()],
                );
            }
            index += 1;
        }
        if report && index < required.len() {
            self.report(
                argument_list,
                diagnostic_codes::NOT_ENOUGH_REQUIRED_ARGUMENTS,
                vec![required.len().to_string(), index.to_string()],
            );
        }
        trace!(
            arguments = arguments.len(),
            parameters = parameters.len(),
            ?correspondence,
            "arguments matched"
        );
    }

    fn bind_argument(&mut self, argument: NodeIndex, parameter: ElementId, correspondence: Correspondence) {
        match correspondence {
            Correspondence::Static => self.annotations.set_static_parameter(argument, parameter),
            Correspondence::Propagated => self.annotations.set_propagated_parameter(argument, parameter),
        }
    }
}
