//! Class headers: supertypes, mixins, interfaces and type parameter bounds.

use super::TypeResolver;
use dres_binder::ScopeBuilder;
use dres_common::diagnostics::diagnostic_codes;
use dres_common::limits::MAX_INHERITANCE_DEPTH;
use dres_common::{Diagnostic, DiagnosticSink};
use dres_element::{
    Element, ElementData, ElementFlags, ElementId, ElementKind, ElementModel, ExecutableData,
    ExecutableKind, FunctionParam, ParameterData, TypeId, TypeProvider, TypeSystem,
};
use dres_syntax::{NodeIndex, NodeKind};
use rustc_hash::FxHashSet;
use smallvec::SmallVec;
use tracing::debug;

struct ClassHeader {
    type_parameters: Vec<NodeIndex>,
    extends: NodeIndex,
    with: Vec<NodeIndex>,
    implements: Vec<NodeIndex>,
    metadata: Vec<NodeIndex>,
}

impl TypeResolver<'_> {
    /// Resolve the headers of every class declared in the unit.
    pub fn resolve_headers(&mut self) {
        for decl in self.unit.declarations() {
            if matches!(
                self.unit.arena.kind(decl),
                Some(NodeKind::ClassDeclaration { .. } | NodeKind::ClassTypeAlias { .. })
            ) {
                self.resolve_class_header(decl);
            }
        }
        let load_library = self
            .model
            .element(self.unit.library)
            .and_then(Element::as_library)
            .map_or(ElementId::NONE, |l| l.load_library);
        if load_library.is_some() {
            self.set_executable_type(load_library, TypeId::DYNAMIC);
        }
    }

    pub(crate) fn resolve_class_header(&mut self, decl: NodeIndex) {
        let class = self.annotations.declared_element(decl);
        if self.model.kind(class) != Some(ElementKind::Class) {
            return;
        }
        let Some(header) = self.class_header(decl) else {
            return;
        };
        let frame = ScopeBuilder::new(self.model).type_parameter_scope(class);
        let depth = self.scopes.push(frame);

        for &node in &header.type_parameters {
            self.resolve_type_parameter(node);
        }

        let is_root = class == self.provider.object_class(self.model);
        let supertype = if header.extends.is_some() {
            self.resolve_supertype(header.extends, diagnostic_codes::EXTENDS_NON_CLASS)
        } else {
            None
        };
        let supertype = match supertype {
            Some(ty) => Some(ty),
            None if is_root => None,
            None => Some(self.provider.object_type),
        };
        let mixins: Vec<TypeId> = header
            .with
            .iter()
            .filter_map(|&node| self.resolve_supertype(node, diagnostic_codes::MIXIN_OF_NON_CLASS))
            .collect();
        let interfaces: Vec<TypeId> = header
            .implements
            .iter()
            .filter_map(|&node| {
                self.resolve_supertype(node, diagnostic_codes::IMPLEMENTS_NON_CLASS)
            })
            .collect();
        let proxy = header.metadata.iter().any(|&a| self.is_proxy_annotation(a));

        debug!(
            class = self.model.name(class),
            mixins = mixins.len(),
            interfaces = interfaces.len(),
            proxy,
            "class header"
        );
        if let Some(element) = self.model.element_mut(class) {
            if proxy {
                element.flags |= ElementFlags::PROXY;
            }
            if let Some(data) = element.as_class_mut() {
                data.supertype = supertype;
                data.mixins = mixins;
                data.interfaces = interfaces;
            }
        }
        self.scopes.truncate(depth);
    }

    fn class_header(&self, decl: NodeIndex) -> Option<ClassHeader> {
        let header = match self.unit.arena.kind(decl)? {
            NodeKind::ClassDeclaration {
                metadata,
                type_parameters,
                extends,
                with,
                implements,
                ..
            } => ClassHeader {
                type_parameters: type_parameters.iter().collect(),
                extends: *extends,
                with: with.iter().collect(),
                implements: implements.iter().collect(),
                metadata: metadata.iter().collect(),
            },
            NodeKind::ClassTypeAlias {
                metadata,
                type_parameters,
                superclass,
                with,
                implements,
                ..
            } => ClassHeader {
                type_parameters: type_parameters.iter().collect(),
                extends: *superclass,
                with: with.iter().collect(),
                implements: implements.iter().collect(),
                metadata: metadata.iter().collect(),
            },
            _ => return None,
        };
        Some(header)
    }

    pub(crate) fn resolve_type_parameter(&mut self, node: NodeIndex) {
        let Some(NodeKind::TypeParameter { bound, .. }) = self.unit.arena.kind(node) else {
            return;
        };
        let bound = *bound;
        let element = self.annotations.declared_element(node);
        let bound = bound.is_some().then(|| self.resolve_type_name(bound));
        if let Some(data) = self
            .model
            .element_mut(element)
            .and_then(Element::as_type_parameter_mut)
        {
            data.bound = bound;
        }
    }

    /// Resolve a supertype clause; only class types are kept.
    fn resolve_supertype(&mut self, node: NodeIndex, code: u32) -> Option<TypeId> {
        let ty = self.resolve_type_name(node);
        if self.model.class_of_type(ty).is_some() {
            return Some(ty);
        }
        // Unresolved names were reported already and come back as `dynamic`.
        if !ty.is_dynamic() {
            let name = match self.unit.arena.kind(node) {
                Some(NodeKind::TypeName { name, .. }) => {
                    self.unit.arena.qualified_name(*name).unwrap_or_default()
                }
                _ => String::new(),
            };
            self.report(node, code, vec![name]);
        }
        None
    }

    fn is_proxy_annotation(&self, annotation: NodeIndex) -> bool {
        let Some(NodeKind::Annotation {
            name,
            constructor_name,
            ..
        }) = self.unit.arena.kind(annotation)
        else {
            return false;
        };
        if constructor_name.is_some() {
            return false;
        }
        let Some(text) = self.unit.arena.identifier_name(*name) else {
            return false;
        };
        let element = self.lookup(text).element();
        self.model.name(element) == "proxy"
            && self.model.is_core_library(self.model.elements.library_of(element))
    }
}

// =============================================================================
// Hierarchy fixes across a library cycle
// =============================================================================

/// Report every class that is its own superclass or superinterface, then
/// cut the cycle: such classes extend `Object` and lose their mixins and
/// interfaces.
pub fn break_inheritance_cycles(
    model: &mut ElementModel,
    provider: &TypeProvider,
    classes: &[ElementId],
    sink: &mut dyn DiagnosticSink,
) {
    let cyclic: Vec<ElementId> = classes
        .iter()
        .copied()
        .filter(|&class| reaches_itself(model, class))
        .collect();
    let object_class = provider.object_class(model);
    for class in cyclic {
        let Some(element) = model.element(class) else {
            continue;
        };
        let name = element.name.clone();
        let offset = element.name_offset;
        if let Some(source) = model.source_of(class) {
            sink.report(Diagnostic::new(
                source.clone(),
                offset,
                name.len() as u32,
                diagnostic_codes::RECURSIVE_INTERFACE_INHERITANCE,
                vec![name.clone()],
            ));
        }
        debug!(class = %name, "inheritance cycle");
        if let Some(data) = model.element_mut(class).and_then(Element::as_class_mut) {
            data.supertype = (class != object_class).then_some(provider.object_type);
            data.mixins.clear();
            data.interfaces.clear();
        }
    }
}

fn direct_supertype_classes(model: &ElementModel, class: ElementId) -> SmallVec<[ElementId; 4]> {
    let Some(data) = model.element(class).and_then(Element::as_class) else {
        return SmallVec::new();
    };
    data.supertype
        .iter()
        .chain(&data.mixins)
        .chain(&data.interfaces)
        .map(|&ty| model.class_of_type(ty))
        .filter(|c| c.is_some())
        .collect()
}

fn reaches_itself(model: &ElementModel, class: ElementId) -> bool {
    let mut visited = FxHashSet::default();
    let mut stack: Vec<ElementId> = direct_supertype_classes(model, class).into_vec();
    while let Some(current) = stack.pop() {
        if current == class {
            return true;
        }
        if visited.insert(current) {
            stack.extend(direct_supertype_classes(model, current));
        }
    }
    false
}

// =============================================================================
// Forwarding constructors
// =============================================================================

/// Give every mixin application without constructors a synthetic copy of
/// each generative constructor of its superclass. Superclasses that are
/// mixin applications themselves are handled first.
pub fn build_forwarding_constructors(
    model: &mut ElementModel,
    provider: &TypeProvider,
    classes: &[ElementId],
) {
    let mut done = FxHashSet::default();
    for &class in classes {
        forward_constructors(model, provider, class, &mut done, 0);
    }
}

struct ForwardedParameter {
    name: String,
    data: ParameterData,
}

fn forward_constructors(
    model: &mut ElementModel,
    provider: &TypeProvider,
    class: ElementId,
    done: &mut FxHashSet<ElementId>,
    depth: usize,
) {
    if depth > MAX_INHERITANCE_DEPTH || !done.insert(class) {
        return;
    }
    if !model.has_flag(class, ElementFlags::MIXIN_APPLICATION) {
        return;
    }
    let Some(element) = model.element(class) else {
        return;
    };
    let offset = element.name_offset;
    let Some(data) = element.as_class() else {
        return;
    };
    if !data.constructors.is_empty() {
        return;
    }
    let Some(supertype) = data.supertype else {
        return;
    };
    let this_type = data.this_type;
    let superclass = model.class_of_type(supertype);
    forward_constructors(model, provider, superclass, done, depth + 1);

    let super_constructors: Vec<ElementId> = model
        .element(superclass)
        .and_then(Element::as_class)
        .map(|d| d.constructors.clone())
        .unwrap_or_default()
        .into_iter()
        .filter(|&c| !model.has_flag(c, ElementFlags::FACTORY))
        .collect();

    for constructor in super_constructors {
        let parameters = forwarded_parameters(model, provider, constructor, supertype);
        let mut exec = ExecutableData::new(ExecutableKind::Constructor);
        exec.return_type = this_type;
        exec.redirected_constructor = constructor;
        let mut forwarding = Element::new(
            model.name(constructor).to_string(),
            offset,
            ElementData::Executable(exec),
        );
        forwarding.flags = ElementFlags::SYNTHETIC
            | (model.element(constructor).map_or(ElementFlags::empty(), |e| {
                e.flags & ElementFlags::CONST
            }));
        let forwarding = model.add_child(forwarding, class);

        let mut signature: SmallVec<[FunctionParam; 4]> = SmallVec::new();
        for parameter in parameters {
            signature.push(FunctionParam {
                kind: parameter.data.kind,
                name: if parameter.data.kind == dres_syntax::ParameterKind::Named {
                    parameter.name.clone()
                } else {
                    String::new()
                },
                ty: parameter.data.ty,
            });
            let mut copy = Element::new(parameter.name, offset, ElementData::Parameter(parameter.data));
            copy.flags = ElementFlags::SYNTHETIC;
            model.add_child(copy, forwarding);
        }
        let ty = model.types.function(forwarding, signature, this_type);
        if let Some(exec) = model
            .element_mut(forwarding)
            .and_then(Element::as_executable_mut)
        {
            exec.ty = ty;
        }
        debug!(
            class = model.name(class),
            constructor = model.name(constructor),
            "forwarding constructor"
        );
    }
}

/// Parameters of `constructor` with the superclass type arguments of
/// `supertype` substituted in.
fn forwarded_parameters(
    model: &ElementModel,
    provider: &TypeProvider,
    constructor: ElementId,
    supertype: TypeId,
) -> Vec<ForwardedParameter> {
    let ts = TypeSystem::new(model, provider);
    model
        .parameters(constructor)
        .iter()
        .filter_map(|&p| {
            let source = model.element(p)?;
            let data = source.as_parameter()?;
            let mut copy = ParameterData::new(data.kind);
            copy.ty = ts.substitute_from(data.ty, supertype);
            copy.has_default = data.has_default;
            Some(ForwardedParameter {
                name: source.name.clone(),
                data: copy,
            })
        })
        .collect()
}
