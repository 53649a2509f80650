//! Symbol model for the dres resolver.
//!
//! This crate holds the passive data the resolver passes produce and consume:
//! - Elements, one per declaration (`Element`, `ElementData`, `ElementArena`)
//! - Interned types (`TypeId`, `TypeData`, `TypeInterner`)
//! - The owning model with the library index (`ElementModel`)
//! - Type relations (`TypeSystem`) and well-known core types (`TypeProvider`)

pub mod element;
pub use element::{
    ClassData, Combinator, Element, ElementData, ElementFlags, ElementId, ElementKind,
    ExecutableData, ExecutableKind, ExportData, FunctionTypeAliasData, ImportData, LabelData,
    LibraryData, ParameterData, PrefixData, TypeParameterData, UnitData, VariableData,
    VariableKind,
};

pub mod types;
pub use types::{FunctionParam, TypeData, TypeId, TypeInterner};

pub mod arena;
pub use arena::{ElementArena, ElementChildren};

pub mod model;
pub use model::{ElementModel, is_setter_name};

pub mod provider;
pub use provider::{MissingCoreClass, TypeProvider, find_class};

pub mod type_system;
pub use type_system::TypeSystem;

pub mod display;
pub use display::display_type;
