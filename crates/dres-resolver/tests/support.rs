//! Shared fixture: a small `dart:core`, an analysis context and lookups of
//! nodes by the text around them.

#![allow(dead_code)]

use dres_binder::{SourceEdit, UnitAnnotations};
use dres_common::Source;
use dres_element::{ElementId, ElementModel, TypeId, display_type};
use dres_parser::parse_unit;
use dres_resolver::{AnalysisContext, IncrementalError, IncrementalOutcome, ResolverOptions};
use dres_syntax::{NodeIndex, NodeKind, ParsedUnit};
use rustc_hash::FxHashMap;

pub const MAIN: &str = "/app/main.dart";

pub const CORE: &str = r#"library dart.core;

class Object {
  const Object();
  bool operator ==(other) => true;
  int get hashCode => 0;
  String toString() => '';
}
class bool {}
abstract class num {
  num operator +(num other);
  num operator -(num other);
  num operator *(num other);
  num operator -();
  bool operator <(num other);
  bool operator >(num other);
  int toInt();
}
abstract class int extends num {
  bool get isEven;
}
abstract class double extends num {}
abstract class String {
  int get length;
  String operator +(String other);
  String substring(int start, [int end]);
}
class Symbol {}
class Type {}
class Function {}
class Null {}
abstract class Iterator<E> {
  E get current;
  bool moveNext();
}
abstract class Iterable<E> {
  Iterator<E> get iterator;
}
abstract class List<E> implements Iterable<E> {
  E operator [](int index);
  void operator []=(int index, E value);
  int get length;
  void add(E value);
}
abstract class Map<K, V> {
  V operator [](K key);
  void operator []=(K key, V value);
}
class _Proxy {
  const _Proxy();
}
const Object proxy = const _Proxy();
"#;

pub const HTML: &str = r#"library dart.html;

class Element {
  Element querySelector(String selectors) => null;
}
class DivElement extends Element {
  bool get hidden => false;
}
class AnchorElement extends Element {
  String get href => '';
}
class Document extends Element {}
Document get document => null;
"#;

/// Route resolver events to the test writer when `DRES_LOG` is set.
fn init_test_tracing() {
    if let Some(directive) = dres_common::tracing_config::requested_filter() {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::new(directive))
            .with_test_writer()
            .try_init();
    }
}

pub struct Harness {
    pub context: AnalysisContext,
    texts: FxHashMap<Source, String>,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_options(ResolverOptions::default())
    }

    pub fn with_options(options: ResolverOptions) -> Self {
        init_test_tracing();
        let mut harness = Self {
            context: AnalysisContext::new(options),
            texts: FxHashMap::default(),
        };
        harness.add("dart:core", CORE);
        harness
    }

    pub fn with_html(mut self) -> Self {
        self.add("dart:html", HTML);
        self
    }

    pub fn add(&mut self, uri: &str, text: &str) -> Source {
        let source = Source::new(uri);
        let unit = parse_unit(source.clone(), text).expect("fixture should parse");
        self.context.add_unit(unit);
        self.texts.insert(source.clone(), text.to_string());
        source
    }

    pub fn resolve(&mut self, uri: &str) -> ElementId {
        self.context
            .resolve_library(&Source::new(uri))
            .expect("library resolves")
    }

    /// Replace the first occurrence of `old` with `new` and re-resolve
    /// incrementally. The recorded text follows only successful edits.
    pub fn edit(&mut self, uri: &str, old: &str, new: &str) -> Result<IncrementalOutcome, IncrementalError> {
        let source = Source::new(uri);
        let text = self.text(uri);
        let offset = text.find(old).expect("edited text in source");
        let edited = format!("{}{}{}", &text[..offset], new, &text[offset + old.len()..]);
        let unit = parse_unit(source.clone(), &edited).expect("edited text should parse");
        let edit = SourceEdit::new(offset as u32, old.len() as u32, new.len() as u32);
        let outcome = self.context.resolve_incrementally(unit, edit)?;
        self.texts.insert(source, edited);
        Ok(outcome)
    }

    pub fn text(&self, uri: &str) -> &str {
        &self.texts[&Source::new(uri)]
    }

    pub fn unit(&self, uri: &str) -> &ParsedUnit {
        self.context.unit(&Source::new(uri)).expect("unit added")
    }

    pub fn annotations(&self, uri: &str) -> &UnitAnnotations {
        self.context
            .annotations(&Source::new(uri))
            .expect("unit resolved")
    }

    pub fn model(&self) -> &ElementModel {
        self.context.model()
    }

    pub fn codes(&self, uri: &str) -> Vec<u32> {
        self.context
            .diagnostics(&Source::new(uri))
            .iter()
            .map(|d| d.code)
            .collect()
    }

    pub fn count(&self, uri: &str, code: u32) -> usize {
        self.codes(uri).into_iter().filter(|&c| c == code).count()
    }

    /// Innermost node covering `name` inside the first occurrence of
    /// `context` in the source text.
    pub fn node_in(&self, uri: &str, context: &str, name: &str) -> NodeIndex {
        let text = self.text(uri);
        let start = text.find(context).expect("context in source");
        let offset = start + context.find(name).expect("name in context");
        let unit = self.unit(uri);
        let node = unit.arena.covering_node(
            unit.root,
            offset as u32,
            (offset + name.len()) as u32,
        );
        assert!(node.is_some(), "no node covers '{name}' in '{context}'");
        node
    }

    /// Nearest node at or above `name` in `context` satisfying `pred`.
    pub fn enclosing(
        &self,
        uri: &str,
        context: &str,
        name: &str,
        pred: impl Fn(&NodeKind) -> bool,
    ) -> NodeIndex {
        let node = self.node_in(uri, context, name);
        let found = self.unit(uri).arena.find_ancestor_or_self(node, pred);
        assert!(found.is_some(), "no matching ancestor of '{name}'");
        found
    }

    pub fn element_at(&self, uri: &str, context: &str, name: &str) -> ElementId {
        let node = self.node_in(uri, context, name);
        self.annotations(uri).static_element(node)
    }

    pub fn type_name(&self, ty: TypeId) -> String {
        display_type(self.model(), ty)
    }

    pub fn static_type_at(&self, uri: &str, node: NodeIndex) -> String {
        let ty = self
            .annotations(uri)
            .static_type(node)
            .unwrap_or(TypeId::DYNAMIC);
        self.type_name(ty)
    }

    pub fn propagated_type_at(&self, uri: &str, node: NodeIndex) -> Option<String> {
        self.annotations(uri)
            .propagated_type(node)
            .map(|ty| self.type_name(ty))
    }

    pub fn best_type_at(&self, uri: &str, node: NodeIndex) -> String {
        self.type_name(self.annotations(uri).best_type(node))
    }

    /// Qualified name `Class.member` (or just `member`) of an element.
    pub fn qualified(&self, element: ElementId) -> String {
        let model = self.model();
        let owner = model.elements.enclosing(element);
        match model.kind(owner) {
            Some(dres_element::ElementKind::Class) => {
                format!("{}.{}", model.name(owner), model.name(element))
            }
            _ => model.name(element).to_string(),
        }
    }
}

/// Resolve `text` as the library `/app/main.dart`.
pub fn resolve_main(text: &str) -> Harness {
    let mut harness = Harness::new();
    harness.add(MAIN, text);
    harness.resolve(MAIN);
    harness
}

pub fn resolve_main_with(options: ResolverOptions, text: &str) -> Harness {
    let mut harness = Harness::with_options(options);
    harness.add(MAIN, text);
    harness.resolve(MAIN);
    harness
}
