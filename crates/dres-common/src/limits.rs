//! Centralized limits and thresholds for the resolver.
//!
//! Class hierarchies, export chains and type structures written by users may
//! be cyclic or pathologically deep. Every recursive walk over them is bounded
//! by one of the constants below so a malformed program degrades into a
//! diagnostic or a `dynamic` fallback instead of a stack overflow.

/// Maximum depth when walking a superclass/mixin/interface hierarchy.
///
/// Cyclic hierarchies are reported separately; this bound protects the
/// inheritance caches while that diagnostic has not been produced yet.
pub const MAX_INHERITANCE_DEPTH: usize = 256;

/// Maximum depth for structural type operations (substitution, subtyping).
pub const MAX_TYPE_DEPTH: usize = 64;

/// Maximum number of re-export hops followed when computing a namespace.
pub const MAX_EXPORT_DEPTH: usize = 128;

/// Maximum nesting of expressions visited by the reference resolver.
pub const MAX_EXPRESSION_DEPTH: usize = 1_000;

/// Maximum number of members of a union type before it collapses to `dynamic`.
pub const MAX_UNION_MEMBERS: usize = 32;
