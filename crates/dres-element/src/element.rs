//! Elements: persistent symbol-table entries, one per declaration.
//!
//! Elements live in an [`ElementArena`](crate::ElementArena) and refer to
//! each other by [`ElementId`]. Containment is recorded twice: each element
//! knows its `enclosing` element, and each container lists its children in
//! declaration order in kind-specific vectors. The enclosing link is purely
//! navigational.

use crate::types::TypeId;
use bitflags::bitflags;
use dres_common::Source;
use dres_syntax::ParameterKind;
use serde::Serialize;

/// Index of an element in the arena.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct ElementId(pub u32);

impl ElementId {
    pub const NONE: ElementId = ElementId(u32::MAX);

    #[inline]
    pub fn is_none(self) -> bool {
        self == ElementId::NONE
    }

    #[inline]
    pub fn is_some(self) -> bool {
        self != ElementId::NONE
    }

    #[inline]
    pub fn to_option(self) -> Option<ElementId> {
        if self.is_none() { None } else { Some(self) }
    }
}

impl Default for ElementId {
    fn default() -> Self {
        ElementId::NONE
    }
}

bitflags! {
    #[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
    pub struct ElementFlags: u32 {
        /// Compiler-generated rather than written by the user.
        const SYNTHETIC = 1 << 0;
        const STATIC = 1 << 1;
        const ABSTRACT = 1 << 2;
        const FINAL = 1 << 3;
        const CONST = 1 << 4;
        const FACTORY = 1 << 5;
        const EXTERNAL = 1 << 6;
        const OPERATOR = 1 << 7;
        /// Deferred import.
        const DEFERRED = 1 << 8;
        /// Assigned somewhere in the scope that declares it.
        const POTENTIALLY_MUTATED_IN_SCOPE = 1 << 9;
        /// Assigned inside a closure nested in its declaring scope.
        const POTENTIALLY_MUTATED_IN_CLOSURE = 1 << 10;
        /// Class carries the `@proxy` marker.
        const PROXY = 1 << 11;
        /// Class is a mixin application (`class C = S with M;`).
        const MIXIN_APPLICATION = 1 << 12;
        /// Local function or closure.
        const LOCAL = 1 << 13;
        /// Read inside a closure nested in its declaring scope.
        const ACCESSED_IN_CLOSURE = 1 << 14;
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum ElementKind {
    Library,
    CompilationUnit,
    Class,
    Constructor,
    Method,
    Function,
    Getter,
    Setter,
    Field,
    TopLevelVariable,
    LocalVariable,
    Parameter,
    TypeParameter,
    Label,
    Import,
    Export,
    Prefix,
    FunctionTypeAlias,
}

impl ElementKind {
    pub fn is_executable(self) -> bool {
        matches!(
            self,
            ElementKind::Constructor
                | ElementKind::Method
                | ElementKind::Function
                | ElementKind::Getter
                | ElementKind::Setter
        )
    }

    pub fn is_accessor(self) -> bool {
        matches!(self, ElementKind::Getter | ElementKind::Setter)
    }

    pub fn is_variable(self) -> bool {
        matches!(
            self,
            ElementKind::Field
                | ElementKind::TopLevelVariable
                | ElementKind::LocalVariable
                | ElementKind::Parameter
        )
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ExecutableKind {
    Function,
    Method,
    Constructor,
    Getter,
    Setter,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum VariableKind {
    Field,
    TopLevel,
    Local,
}

/// `show`/`hide` filter on an import or export.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Combinator {
    Show(Vec<String>),
    Hide(Vec<String>),
}

#[derive(Clone, Debug)]
pub struct LibraryData {
    pub source: Source,
    pub defining_unit: ElementId,
    pub parts: Vec<ElementId>,
    pub imports: Vec<ElementId>,
    pub exports: Vec<ElementId>,
    pub prefixes: Vec<ElementId>,
    /// Synthetic `loadLibrary` function, present once the library is
    /// imported with `deferred`.
    pub load_library: ElementId,
}

#[derive(Clone, Debug)]
pub struct UnitData {
    pub source: Source,
    pub classes: Vec<ElementId>,
    pub function_type_aliases: Vec<ElementId>,
    pub functions: Vec<ElementId>,
    pub top_level_variables: Vec<ElementId>,
    /// Getters and setters, explicit and synthetic.
    pub accessors: Vec<ElementId>,
}

#[derive(Clone, Debug, Default)]
pub struct ClassData {
    /// `None` only for the root class.
    pub supertype: Option<TypeId>,
    pub mixins: Vec<TypeId>,
    pub interfaces: Vec<TypeId>,
    pub type_parameters: Vec<ElementId>,
    pub constructors: Vec<ElementId>,
    pub methods: Vec<ElementId>,
    pub accessors: Vec<ElementId>,
    pub fields: Vec<ElementId>,
    /// `C<T1..Tn>` with the class's own type parameters as arguments.
    pub this_type: TypeId,
}

#[derive(Clone, Debug)]
pub struct ExecutableData {
    pub kind: ExecutableKind,
    pub parameters: Vec<ElementId>,
    pub return_type: TypeId,
    /// The function type of this executable.
    pub ty: TypeId,
    /// Target of a redirecting factory (`= D.named`) or a redirecting
    /// generative constructor (`: this.named()`).
    pub redirected_constructor: ElementId,
    /// Field or top-level variable behind an accessor.
    pub variable: ElementId,
    pub labels: Vec<ElementId>,
    pub local_variables: Vec<ElementId>,
    /// Local functions and closures declared directly in the body.
    pub local_functions: Vec<ElementId>,
}

impl ExecutableData {
    pub fn new(kind: ExecutableKind) -> Self {
        Self {
            kind,
            parameters: Vec::new(),
            return_type: TypeId::DYNAMIC,
            ty: TypeId::DYNAMIC,
            redirected_constructor: ElementId::NONE,
            variable: ElementId::NONE,
            labels: Vec::new(),
            local_variables: Vec::new(),
            local_functions: Vec::new(),
        }
    }
}

#[derive(Clone, Debug)]
pub struct VariableData {
    pub kind: VariableKind,
    pub ty: TypeId,
    pub getter: ElementId,
    pub setter: ElementId,
    pub has_initializer: bool,
    /// Type of the initializer of a final or const variable, when more
    /// specific than the declared type.
    pub propagated_type: Option<TypeId>,
    /// Synthetic function owning closures written in the initializer of a
    /// field or top-level variable.
    pub initializer: ElementId,
}

impl VariableData {
    pub fn new(kind: VariableKind) -> Self {
        Self {
            kind,
            ty: TypeId::DYNAMIC,
            getter: ElementId::NONE,
            setter: ElementId::NONE,
            has_initializer: false,
            propagated_type: None,
            initializer: ElementId::NONE,
        }
    }
}

#[derive(Clone, Debug)]
pub struct ParameterData {
    pub kind: ParameterKind,
    pub ty: TypeId,
    /// Parameters of a function-typed parameter.
    pub parameters: Vec<ElementId>,
    /// Field initialized by a `this.x` parameter.
    pub field: ElementId,
    pub is_initializing_formal: bool,
    pub has_default: bool,
}

impl ParameterData {
    pub fn new(kind: ParameterKind) -> Self {
        Self {
            kind,
            ty: TypeId::DYNAMIC,
            parameters: Vec::new(),
            field: ElementId::NONE,
            is_initializing_formal: false,
            has_default: false,
        }
    }
}

#[derive(Clone, Debug)]
pub struct TypeParameterData {
    pub bound: Option<TypeId>,
    pub ty: TypeId,
}

#[derive(Clone, Debug, Default)]
pub struct LabelData {
    /// Label on a `case`/`default` rather than on a statement.
    pub on_switch_member: bool,
}

#[derive(Clone, Debug)]
pub struct ImportData {
    pub uri: String,
    pub imported_library: ElementId,
    pub prefix: ElementId,
    pub combinators: Vec<Combinator>,
    /// Offset and length of the URI literal.
    pub uri_span: (u32, u32),
}

#[derive(Clone, Debug)]
pub struct ExportData {
    pub uri: String,
    pub exported_library: ElementId,
    pub combinators: Vec<Combinator>,
}

#[derive(Clone, Debug, Default)]
pub struct PrefixData {
    pub imports: Vec<ElementId>,
}

#[derive(Clone, Debug)]
pub struct FunctionTypeAliasData {
    pub type_parameters: Vec<ElementId>,
    pub parameters: Vec<ElementId>,
    pub return_type: TypeId,
    pub ty: TypeId,
}

#[derive(Clone, Debug)]
pub enum ElementData {
    Library(LibraryData),
    CompilationUnit(UnitData),
    Class(ClassData),
    Executable(ExecutableData),
    Variable(VariableData),
    Parameter(ParameterData),
    TypeParameter(TypeParameterData),
    Label(LabelData),
    Import(ImportData),
    Export(ExportData),
    Prefix(PrefixData),
    FunctionTypeAlias(FunctionTypeAliasData),
}

#[derive(Clone, Debug)]
pub struct Element {
    pub name: String,
    /// Offset of the declaring name; with `name` this identifies the
    /// element among same-kind siblings. Synthetic elements copy the offset
    /// of the declaration that implies them.
    pub name_offset: u32,
    pub enclosing: ElementId,
    pub flags: ElementFlags,
    /// Elements the attached annotations resolve to.
    pub metadata: Vec<ElementId>,
    pub data: ElementData,
}

impl Element {
    pub fn new(name: impl Into<String>, name_offset: u32, data: ElementData) -> Self {
        Self {
            name: name.into(),
            name_offset,
            enclosing: ElementId::NONE,
            flags: ElementFlags::empty(),
            metadata: Vec::new(),
            data,
        }
    }

    pub fn kind(&self) -> ElementKind {
        match &self.data {
            ElementData::Library(_) => ElementKind::Library,
            ElementData::CompilationUnit(_) => ElementKind::CompilationUnit,
            ElementData::Class(_) => ElementKind::Class,
            ElementData::Executable(e) => match e.kind {
                ExecutableKind::Function => ElementKind::Function,
                ExecutableKind::Method => ElementKind::Method,
                ExecutableKind::Constructor => ElementKind::Constructor,
                ExecutableKind::Getter => ElementKind::Getter,
                ExecutableKind::Setter => ElementKind::Setter,
            },
            ElementData::Variable(v) => match v.kind {
                VariableKind::Field => ElementKind::Field,
                VariableKind::TopLevel => ElementKind::TopLevelVariable,
                VariableKind::Local => ElementKind::LocalVariable,
            },
            ElementData::Parameter(_) => ElementKind::Parameter,
            ElementData::TypeParameter(_) => ElementKind::TypeParameter,
            ElementData::Label(_) => ElementKind::Label,
            ElementData::Import(_) => ElementKind::Import,
            ElementData::Export(_) => ElementKind::Export,
            ElementData::Prefix(_) => ElementKind::Prefix,
            ElementData::FunctionTypeAlias(_) => ElementKind::FunctionTypeAlias,
        }
    }

    /// Name without the trailing `=` of setters.
    pub fn display_name(&self) -> &str {
        if crate::model::is_setter_name(&self.name) {
            &self.name[..self.name.len() - 1]
        } else {
            &self.name
        }
    }

    #[inline]
    pub fn is_synthetic(&self) -> bool {
        self.flags.contains(ElementFlags::SYNTHETIC)
    }

    #[inline]
    pub fn is_static(&self) -> bool {
        self.flags.contains(ElementFlags::STATIC)
    }

    #[inline]
    pub fn is_final(&self) -> bool {
        self.flags.contains(ElementFlags::FINAL)
    }

    #[inline]
    pub fn is_const(&self) -> bool {
        self.flags.contains(ElementFlags::CONST)
    }

    #[inline]
    pub fn is_abstract(&self) -> bool {
        self.flags.contains(ElementFlags::ABSTRACT)
    }

    #[inline]
    pub fn is_factory(&self) -> bool {
        self.flags.contains(ElementFlags::FACTORY)
    }

    pub fn is_private(&self) -> bool {
        self.name.starts_with('_')
    }

    pub fn as_library(&self) -> Option<&LibraryData> {
        match &self.data {
            ElementData::Library(d) => Some(d),
            _ => None,
        }
    }

    pub fn as_library_mut(&mut self) -> Option<&mut LibraryData> {
        match &mut self.data {
            ElementData::Library(d) => Some(d),
            _ => None,
        }
    }

    pub fn as_unit(&self) -> Option<&UnitData> {
        match &self.data {
            ElementData::CompilationUnit(d) => Some(d),
            _ => None,
        }
    }

    pub fn as_unit_mut(&mut self) -> Option<&mut UnitData> {
        match &mut self.data {
            ElementData::CompilationUnit(d) => Some(d),
            _ => None,
        }
    }

    pub fn as_class(&self) -> Option<&ClassData> {
        match &self.data {
            ElementData::Class(d) => Some(d),
            _ => None,
        }
    }

    pub fn as_class_mut(&mut self) -> Option<&mut ClassData> {
        match &mut self.data {
            ElementData::Class(d) => Some(d),
            _ => None,
        }
    }

    pub fn as_executable(&self) -> Option<&ExecutableData> {
        match &self.data {
            ElementData::Executable(d) => Some(d),
            _ => None,
        }
    }

    pub fn as_executable_mut(&mut self) -> Option<&mut ExecutableData> {
        match &mut self.data {
            ElementData::Executable(d) => Some(d),
            _ => None,
        }
    }

    pub fn as_variable(&self) -> Option<&VariableData> {
        match &self.data {
            ElementData::Variable(d) => Some(d),
            _ => None,
        }
    }

    pub fn as_variable_mut(&mut self) -> Option<&mut VariableData> {
        match &mut self.data {
            ElementData::Variable(d) => Some(d),
            _ => None,
        }
    }

    pub fn as_parameter(&self) -> Option<&ParameterData> {
        match &self.data {
            ElementData::Parameter(d) => Some(d),
            _ => None,
        }
    }

    pub fn as_parameter_mut(&mut self) -> Option<&mut ParameterData> {
        match &mut self.data {
            ElementData::Parameter(d) => Some(d),
            _ => None,
        }
    }

    pub fn as_type_parameter(&self) -> Option<&TypeParameterData> {
        match &self.data {
            ElementData::TypeParameter(d) => Some(d),
            _ => None,
        }
    }

    pub fn as_type_parameter_mut(&mut self) -> Option<&mut TypeParameterData> {
        match &mut self.data {
            ElementData::TypeParameter(d) => Some(d),
            _ => None,
        }
    }

    pub fn as_import(&self) -> Option<&ImportData> {
        match &self.data {
            ElementData::Import(d) => Some(d),
            _ => None,
        }
    }

    pub fn as_import_mut(&mut self) -> Option<&mut ImportData> {
        match &mut self.data {
            ElementData::Import(d) => Some(d),
            _ => None,
        }
    }

    pub fn as_export(&self) -> Option<&ExportData> {
        match &self.data {
            ElementData::Export(d) => Some(d),
            _ => None,
        }
    }

    pub fn as_export_mut(&mut self) -> Option<&mut ExportData> {
        match &mut self.data {
            ElementData::Export(d) => Some(d),
            _ => None,
        }
    }

    pub fn as_prefix(&self) -> Option<&PrefixData> {
        match &self.data {
            ElementData::Prefix(d) => Some(d),
            _ => None,
        }
    }

    pub fn as_prefix_mut(&mut self) -> Option<&mut PrefixData> {
        match &mut self.data {
            ElementData::Prefix(d) => Some(d),
            _ => None,
        }
    }

    pub fn as_alias(&self) -> Option<&FunctionTypeAliasData> {
        match &self.data {
            ElementData::FunctionTypeAlias(d) => Some(d),
            _ => None,
        }
    }

    pub fn as_alias_mut(&mut self) -> Option<&mut FunctionTypeAliasData> {
        match &mut self.data {
            ElementData::FunctionTypeAlias(d) => Some(d),
            _ => None,
        }
    }
}
