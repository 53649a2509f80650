//! Syntax tree consumed by the dres resolver.
//!
//! Trees are built by a front end (see `dres-parser`) and only annotated by
//! the resolver: nodes are never created or destroyed during resolution.
//! Annotations (bound elements, static and propagated types) live in side
//! tables keyed by [`NodeIndex`].

pub mod base;
pub use base::{NodeIndex, NodeList};

pub mod node;
pub use node::{Node, NodeKind, Operator, ParameterKind, ParameterShape, PropertyKind, VarKeyword};

pub mod arena;
pub use arena::{Children, NodeArena};

pub mod unit;
pub use unit::ParsedUnit;
