//! Type resolution pass.
//!
//! Resolves every `TypeName` of a unit to a type and fills in the declared
//! types of elements: class headers (supertype, mixins, interfaces), return
//! and parameter types, variable types and function types. The pass runs in
//! phases across a library cycle:
//!
//! 1. class headers of every unit ([`TypeResolver::resolve_headers`]);
//! 2. [`break_inheritance_cycles`] over all classes of the cycle;
//! 3. member types of every unit ([`TypeResolver::resolve_members`]);
//! 4. [`build_forwarding_constructors`] for mixin applications.

mod state_headers;
mod state_members;

pub use state_headers::{break_inheritance_cycles, build_forwarding_constructors};

use crate::lookup::{diagnostic_at, is_type_element, library_names, prefixed_lookup};
use crate::unit::ResolutionUnit;
use dres_binder::{Lookup, Scope, ScopeStack, UnitAnnotations};
use dres_common::diagnostics::diagnostic_codes;
use dres_common::DiagnosticSink;
use dres_element::{
    Element, ElementId, ElementKind, ElementModel, FunctionParam, TypeId, TypeProvider, TypeSystem,
};
use dres_syntax::{NodeIndex, NodeKind, ParameterKind};
use smallvec::SmallVec;
use tracing::trace;

pub struct TypeResolver<'a> {
    pub(crate) model: &'a mut ElementModel,
    pub(crate) provider: &'a TypeProvider,
    pub(crate) unit: ResolutionUnit<'a>,
    pub(crate) annotations: &'a mut UnitAnnotations,
    pub(crate) sink: &'a mut dyn DiagnosticSink,
    pub(crate) scopes: ScopeStack,
    /// Resolving the type of an instance creation or a redirection.
    pub(crate) in_constructor_name: bool,
}

impl<'a> TypeResolver<'a> {
    pub fn new(
        model: &'a mut ElementModel,
        provider: &'a TypeProvider,
        unit: ResolutionUnit<'a>,
        annotations: &'a mut UnitAnnotations,
        sink: &'a mut dyn DiagnosticSink,
    ) -> Self {
        Self {
            model,
            provider,
            unit,
            annotations,
            sink,
            scopes: ScopeStack::new(),
            in_constructor_name: false,
        }
    }

    /// Re-resolve the types of the declaration at `root` whose enclosing
    /// frames are `frames`.
    #[tracing::instrument(level = "debug", skip(self, frames), fields(root = root.0))]
    pub fn resolve_subtree(&mut self, root: NodeIndex, frames: Vec<Scope>) {
        let depth = self.scopes.depth();
        for frame in frames {
            self.scopes.push(frame);
        }
        if matches!(
            self.unit.arena.kind(root),
            Some(NodeKind::ClassDeclaration { .. } | NodeKind::ClassTypeAlias { .. })
        ) {
            self.resolve_class_header(root);
        }
        self.resolve_declaration(root);
        self.scopes.truncate(depth);
    }

    pub(crate) fn report(&mut self, node: NodeIndex, code: u32, args: Vec<String>) {
        self.sink
            .report(diagnostic_at(self.unit.source, self.unit.arena, node, code, args));
    }

    pub(crate) fn lookup(&self, name: &str) -> Lookup {
        self.scopes.lookup(self.unit.library_scope, self.model, name)
    }

    // =========================================================================
    // Type names
    // =========================================================================

    /// Resolve the `TypeName` at `node` (and its type arguments), record
    /// the type on the node and return it. Absent nodes are `dynamic`.
    pub(crate) fn resolve_type_name(&mut self, node: NodeIndex) -> TypeId {
        let arena = self.unit.arena;
        let Some(NodeKind::TypeName {
            name,
            type_arguments,
        }) = arena.kind(node)
        else {
            return TypeId::DYNAMIC;
        };
        let constructor_context = std::mem::replace(&mut self.in_constructor_name, false);
        let args: SmallVec<[TypeId; 2]> = type_arguments
            .iter()
            .map(|arg| self.resolve_type_name(arg))
            .collect();
        self.in_constructor_name = constructor_context;
        let ty = self.type_for_name(*name, &args);
        trace!(node = node.0, ty = ty.0, "type name");
        self.annotations.set_static_type(node, ty);
        ty
    }

    fn type_for_name(&mut self, name: NodeIndex, args: &[TypeId]) -> TypeId {
        let arena = self.unit.arena;
        let (lookup, ident, text) = match arena.kind(name) {
            Some(NodeKind::SimpleIdentifier { name: text }) => {
                if text == "void" {
                    return TypeId::VOID;
                }
                let lookup = self.lookup(text);
                if text == "dynamic" && lookup == Lookup::NotFound {
                    return TypeId::DYNAMIC;
                }
                (lookup, name, text.clone())
            }
            Some(NodeKind::PrefixedIdentifier { prefix, identifier }) => {
                let Some(prefix_name) = arena.identifier_name(*prefix) else {
                    return TypeId::DYNAMIC;
                };
                let Some(text) = arena.identifier_name(*identifier) else {
                    return TypeId::DYNAMIC;
                };
                let prefix_element = self.lookup(prefix_name).element();
                match self.model.kind(prefix_element) {
                    Some(ElementKind::Prefix) => {
                        self.annotations.set_static_element(*prefix, prefix_element);
                        (
                            prefixed_lookup(self.model, prefix_element, text),
                            *identifier,
                            format!("{prefix_name}.{text}"),
                        )
                    }
                    // `new C.named()`: the prefix is the class.
                    Some(ElementKind::Class) if self.in_constructor_name => {
                        self.annotations.set_static_element(*prefix, prefix_element);
                        return self.instantiate(prefix_element, args, name);
                    }
                    _ => (Lookup::NotFound, name, format!("{prefix_name}.{text}")),
                }
            }
            _ => return TypeId::DYNAMIC,
        };

        let element = match lookup {
            Lookup::Found(element) => element,
            Lookup::Ambiguous(elements) => {
                let libraries = library_names(self.model, &elements);
                self.report(name, diagnostic_codes::AMBIGUOUS_IMPORT, vec![text, libraries]);
                return TypeId::DYNAMIC;
            }
            Lookup::Hidden(_) | Lookup::NotFound => {
                self.report(name, diagnostic_codes::UNDEFINED_CLASS, vec![text]);
                return TypeId::DYNAMIC;
            }
        };
        self.annotations.set_static_element(ident, element);
        if !is_type_element(self.model, element) {
            let code = if self.in_constructor_name {
                diagnostic_codes::NEW_WITH_NON_TYPE
            } else {
                diagnostic_codes::NOT_A_TYPE
            };
            self.report(name, code, vec![text]);
            return TypeId::DYNAMIC;
        }
        match self.model.kind(element) {
            Some(ElementKind::Class) => self.instantiate(element, args, name),
            Some(ElementKind::FunctionTypeAlias) => {
                let ty = self.model.element_type(element);
                let params = self.model.type_parameter_types(element);
                if args.is_empty() || params.is_empty() {
                    return ty;
                }
                if args.len() != params.len() {
                    self.report_type_argument_count(name, element, params.len(), args.len());
                    return ty;
                }
                TypeSystem::new(self.model, self.provider).substitute(ty, &params, args)
            }
            _ => self.model.element_type(element),
        }
    }

    /// `class<args>`, with `dynamic` for every parameter of a raw type.
    fn instantiate(&mut self, class: ElementId, args: &[TypeId], node: NodeIndex) -> TypeId {
        let params = self.model.type_parameters(class).len();
        if !args.is_empty() && args.len() != params {
            self.report_type_argument_count(node, class, params, args.len());
            return self.model.types.interface(class, vec![TypeId::DYNAMIC; params]);
        }
        if args.is_empty() {
            return self.model.types.interface(class, vec![TypeId::DYNAMIC; params]);
        }
        self.model.types.interface(class, args.iter().copied())
    }

    fn report_type_argument_count(&mut self, node: NodeIndex, element: ElementId, params: usize, args: usize) {
        let name = self.model.name(element).to_string();
        self.report(
            node,
            diagnostic_codes::WRONG_NUMBER_OF_TYPE_ARGUMENTS,
            vec![name, params.to_string(), args.to_string()],
        );
    }

    // =========================================================================
    // Element types
    // =========================================================================

    /// Function type of `element` from its parameters and `return_type`.
    pub(crate) fn function_type(&self, element: ElementId, return_type: TypeId) -> TypeId {
        let params: SmallVec<[FunctionParam; 4]> = self
            .model
            .parameters(element)
            .iter()
            .filter_map(|&p| {
                let data = self.model.element(p).and_then(Element::as_parameter)?;
                let name = if data.kind == ParameterKind::Named {
                    self.model.name(p).to_string()
                } else {
                    String::new()
                };
                Some(FunctionParam {
                    kind: data.kind,
                    name,
                    ty: data.ty,
                })
            })
            .collect();
        self.model.types.function(element, params, return_type)
    }

    /// Set the return type and function type of an executable.
    pub(crate) fn set_executable_type(&mut self, executable: ElementId, return_type: TypeId) {
        let ty = self.function_type(executable, return_type);
        if let Some(data) = self
            .model
            .element_mut(executable)
            .and_then(Element::as_executable_mut)
        {
            data.return_type = return_type;
            data.ty = ty;
        }
    }

    /// Set the type of a field or top-level variable and of its synthetic
    /// accessors.
    pub(crate) fn set_variable_type(&mut self, variable: ElementId, ty: TypeId) {
        let Some(data) = self
            .model
            .element_mut(variable)
            .and_then(Element::as_variable_mut)
        else {
            return;
        };
        data.ty = ty;
        let (getter, setter) = (data.getter, data.setter);
        if self.model.element(getter).is_some_and(Element::is_synthetic) {
            self.set_executable_type(getter, ty);
        }
        if self.model.element(setter).is_some_and(Element::is_synthetic) {
            if let Some(&param) = self.model.parameters(setter).first() {
                self.set_parameter_type(param, ty);
            }
            self.set_executable_type(setter, TypeId::VOID);
        }
    }

    pub(crate) fn set_parameter_type(&mut self, parameter: ElementId, ty: TypeId) {
        if let Some(data) = self
            .model
            .element_mut(parameter)
            .and_then(Element::as_parameter_mut)
        {
            data.ty = ty;
        }
    }
}
