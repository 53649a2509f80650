//! Declaration binding for the dres resolver.
//!
//! - `builder`: one element per declaration of a unit, plus implicit elements
//! - `library`: library, part and directive elements, in build and link phases
//! - `matcher`: structural check of a re-parsed subtree against the model
//! - `namespace` / `scope` / `scope_builder`: name visibility
//! - `annotations`: side tables the resolver writes onto syntax nodes

pub mod annotations;
pub use annotations::{AuxiliaryElements, UnitAnnotations};

pub mod naming;
pub use naming::{DeclarationKey, UNARY_MINUS, declaration_key, method_name, setter_name};

pub mod builder;
pub use builder::ElementBuilder;

pub mod library;
pub use library::{CORE_LIBRARY_URI, LOAD_LIBRARY_NAME, LibraryElementBuilder, UnitProvider};

pub mod namespace;
pub use namespace::{Namespace, NamespaceBuilder};

pub mod scope;
pub use scope::{LabelLookup, LabelScope, LibraryScope, Lookup, Scope, ScopeKind, ScopeStack};

pub mod scope_builder;
pub use scope_builder::ScopeBuilder;

pub mod matcher;
pub use matcher::{DeclarationMatch, DeclarationMatcher, DeclarationMismatch, SourceEdit};
