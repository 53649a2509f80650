//! Structural faults that abort a resolution attempt.
//!
//! Semantic problems are diagnostics and never show up here. These errors
//! tell the caller to fall back to a coarser re-resolution.

use dres_binder::DeclarationMismatch;
use dres_common::Source;
use std::fmt;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum IncrementalError {
    /// No ancestor of the edited node can be resolved in isolation.
    NoResolvableRoot { offset: u32 },
    /// A declaration of the new tree has no element in the old model.
    ElementNotFound(DeclarationMismatch),
    /// The old model declares elements the new tree no longer has.
    ElementModelChanged(DeclarationMismatch),
    /// Nodes outside the resolution root do not line up with the old tree.
    StructureChangedOutsideRoot { node: &'static str },
    /// The unit has no resolved library to re-resolve against.
    UnitNotResolved(Source),
}

impl fmt::Display for IncrementalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IncrementalError::NoResolvableRoot { offset } => {
                write!(f, "no resolvable declaration encloses offset {offset}")
            }
            IncrementalError::ElementNotFound(mismatch) => {
                write!(f, "declaration not found in element model: {mismatch}")
            }
            IncrementalError::ElementModelChanged(mismatch) => {
                write!(f, "element model changed: {mismatch}")
            }
            IncrementalError::StructureChangedOutsideRoot { node } => {
                write!(f, "tree structure changed outside the resolution root at {node}")
            }
            IncrementalError::UnitNotResolved(source) => {
                write!(f, "unit {source} has not been resolved")
            }
        }
    }
}

impl std::error::Error for IncrementalError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            IncrementalError::ElementNotFound(m) | IncrementalError::ElementModelChanged(m) => Some(m),
            _ => None,
        }
    }
}

impl From<DeclarationMismatch> for IncrementalError {
    fn from(mismatch: DeclarationMismatch) -> Self {
        match mismatch {
            DeclarationMismatch::UnmatchedElements { .. } => {
                IncrementalError::ElementModelChanged(mismatch)
            }
            _ => IncrementalError::ElementNotFound(mismatch),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LibraryResolutionError {
    /// The requested library, or a part it names, has no parsed unit.
    MissingSource(Source),
    /// `dart:core` is unavailable, or lacks a class the type provider needs.
    MissingCoreLibrary { reason: String },
}

impl fmt::Display for LibraryResolutionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LibraryResolutionError::MissingSource(source) => {
                write!(f, "no parsed unit for {source}")
            }
            LibraryResolutionError::MissingCoreLibrary { reason } => {
                write!(f, "core library unavailable: {reason}")
            }
        }
    }
}

impl std::error::Error for LibraryResolutionError {}
