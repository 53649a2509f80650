//! Resolution passes for the dres front end.
//!
//! - `library_resolver`: import cycles, build/link barriers, pass order
//! - `type_resolver`: declared types and class headers
//! - `variable_resolver`: locals, parameters and their usage flags
//! - `resolver`: references, elements and static/propagated types
//! - `inheritance`: inherited member lookup per class
//! - `incremental`: re-resolution of one declaration after an edit
//! - `context`: owning driver for hosts

pub mod error;
pub use error::{IncrementalError, LibraryResolutionError};

pub mod options;
pub use options::ResolverOptions;

pub mod oracle;
pub use oracle::{ConstantOracle, DeclaredConstantOracle};

pub mod unit;
pub use unit::ResolutionUnit;

pub mod inheritance;
pub use inheritance::{InheritanceConflict, InheritanceManager, MemberMap};

mod html;
mod lookup;

pub mod type_resolver;
pub use type_resolver::{TypeResolver, break_inheritance_cycles, build_forwarding_constructors};

pub mod variable_resolver;
pub use variable_resolver::{VariableResolver, clear_usage_flags};

pub mod resolver;
pub use resolver::{EnclosingContext, OverrideManager, PromotionManager, ResolverVisitor};

pub mod library_resolver;
pub use library_resolver::{
    DiagnosticMap, LibraryResolver, ResolutionState, ResolvedLibrary,
};

pub mod incremental;
pub use incremental::{
    IncrementalOutcome, IncrementalPhase, IncrementalResolver, find_resolution_root,
    is_resolution_root,
};

pub mod context;
pub use context::AnalysisContext;
