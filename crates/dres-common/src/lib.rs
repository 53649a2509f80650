//! Common types and utilities for the dres semantic resolver.
//!
//! This crate provides foundational types used across all dres crates:
//! - Source keys and the URI-resolution collaborator (`Source`, `SourceFactory`)
//! - Structured diagnostics (`Diagnostic`, `DiagnosticSink`, codes and templates)
//! - Resolver limits and thresholds
//! - Tracing initialisation for debug builds of host tools

// Source keys and URI resolution
pub mod source;
pub use source::{SimpleSourceFactory, Source, SourceFactory};

// Structured diagnostics
pub mod diagnostics;
pub use diagnostics::{
    Diagnostic, DiagnosticCategory, DiagnosticCollector, DiagnosticMessage, DiagnosticSink,
    NullSink, diagnostic_codes, diagnostic_messages, format_message,
};

// Centralized limits and thresholds
pub mod limits;

// Opt-in tracing subscriber
pub mod tracing_config;
