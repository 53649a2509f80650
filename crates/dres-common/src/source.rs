//! Source keys and the URI-resolution collaborator.
//!
//! A [`Source`] is an opaque, cheaply clonable key naming one compilation
//! unit. The resolver never reads file content through it; it only compares,
//! hashes and orders sources, and asks a [`SourceFactory`] to resolve the URIs
//! written in `import`, `export` and `part` directives.

use rustc_hash::FxHashSet;
use serde::Serialize;
use std::fmt;
use std::sync::Arc;

/// Canonical key for a compilation unit, usually its URI.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct Source(Arc<str>);

impl Source {
    pub fn new(uri: impl AsRef<str>) -> Self {
        Source(Arc::from(uri.as_ref()))
    }

    #[inline]
    pub fn uri(&self) -> &str {
        &self.0
    }

    /// True for SDK sources (`dart:core`, `dart:html`, ...).
    pub fn is_dart_uri(&self) -> bool {
        self.0.starts_with("dart:")
    }

    /// The final path segment, used in trace output.
    pub fn short_name(&self) -> &str {
        match self.0.rfind(['/', ':']) {
            Some(pos) => &self.0[pos + 1..],
            None => &self.0,
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Source {
    fn from(uri: &str) -> Self {
        Source::new(uri)
    }
}

/// Resolves directive URIs against the source that contains them.
pub trait SourceFactory {
    /// Returns the canonical source for `uri` relative to `base`, or `None`
    /// when the URI does not name an existing source.
    fn resolve_uri(&self, base: &Source, uri: &str) -> Option<Source>;
}

/// A `SourceFactory` over a fixed set of known sources.
///
/// URIs with a scheme (`dart:`, `package:`, `file:`) are absolute; anything
/// else is joined to the directory of the base source and normalized.
#[derive(Debug, Default, Clone)]
pub struct SimpleSourceFactory {
    known: FxHashSet<Source>,
}

impl SimpleSourceFactory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, source: Source) {
        self.known.insert(source);
    }

    pub fn contains(&self, source: &Source) -> bool {
        self.known.contains(source)
    }

    /// Resolve `uri` without checking existence.
    pub fn join(base: &Source, uri: &str) -> Option<String> {
        if uri.is_empty() {
            return None;
        }
        if has_scheme(uri) {
            return Some(uri.to_string());
        }
        let base_uri = base.uri();
        let (prefix, path) = match base_uri.find(':') {
            Some(pos) if has_scheme(base_uri) => (&base_uri[..=pos], &base_uri[pos + 1..]),
            _ => ("", base_uri),
        };
        let dir = match path.rfind('/') {
            Some(pos) => &path[..=pos],
            None => "",
        };
        let joined = if uri.starts_with('/') {
            uri.to_string()
        } else {
            format!("{dir}{uri}")
        };
        Some(format!("{prefix}{}", normalize_path(&joined)))
    }
}

impl SourceFactory for SimpleSourceFactory {
    fn resolve_uri(&self, base: &Source, uri: &str) -> Option<Source> {
        let resolved = Source::new(Self::join(base, uri)?);
        self.known.contains(&resolved).then_some(resolved)
    }
}

fn has_scheme(uri: &str) -> bool {
    match uri.find(':') {
        Some(pos) if pos > 0 => uri[..pos]
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '+' || c == '-' || c == '.'),
        _ => false,
    }
}

fn normalize_path(path: &str) -> String {
    let absolute = path.starts_with('/');
    let mut segments: Vec<&str> = Vec::new();
    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                if matches!(segments.last(), Some(last) if *last != "..") {
                    segments.pop();
                } else if !absolute {
                    segments.push("..");
                }
            }
            other => segments.push(other),
        }
    }
    let joined = segments.join("/");
    if absolute { format!("/{joined}") } else { joined }
}

#[cfg(test)]
#[path = "../tests/source_tests.rs"]
mod tests;
