use super::*;
use crate::namespace::Namespace;

fn library_scope() -> LibraryScope {
    let mut definitions = Namespace::new();
    definitions.define("top", ElementId(10));
    let mut import = Namespace::new();
    import.define("imported", ElementId(20));
    LibraryScope::from_parts(ElementId(0), definitions, vec![import])
}

#[test]
fn test_inner_frames_shadow_outer_ones() {
    let model = ElementModel::new();
    let library = library_scope();
    let mut stack = ScopeStack::new();
    let outer = stack.push(Scope::new(ScopeKind::Function, ElementId::NONE));
    stack.define("top", ElementId(1));
    assert_eq!(stack.lookup(&library, &model, "top"), Lookup::Found(ElementId(1)));

    let inner = stack.push(Scope::new(ScopeKind::Block, ElementId::NONE));
    stack.define("top", ElementId(2));
    assert_eq!(stack.lookup(&library, &model, "top"), Lookup::Found(ElementId(2)));
    stack.truncate(inner);
    assert_eq!(stack.lookup(&library, &model, "top"), Lookup::Found(ElementId(1)));
    stack.truncate(outer);

    assert_eq!(stack.depth(), 0);
    assert_eq!(stack.lookup(&library, &model, "top"), Lookup::Found(ElementId(10)));
    assert_eq!(stack.lookup(&library, &model, "imported"), Lookup::Found(ElementId(20)));
    assert_eq!(stack.lookup(&library, &model, "nothing"), Lookup::NotFound);
}

#[test]
fn test_hidden_names_until_declared() {
    let model = ElementModel::new();
    let library = library_scope();
    let mut stack = ScopeStack::new();
    let mut block = Scope::new(ScopeKind::Block, ElementId::NONE);
    block.hide("v", ElementId(5));
    stack.push(block);
    assert_eq!(stack.lookup(&library, &model, "v"), Lookup::Hidden(ElementId(5)));
    stack.define("v", ElementId(5));
    assert_eq!(stack.lookup(&library, &model, "v"), Lookup::Found(ElementId(5)));
}

#[test]
fn test_duplicate_definition_in_one_frame() {
    let mut scope = Scope::new(ScopeKind::Block, ElementId::NONE);
    assert_eq!(scope.define("a", ElementId(1)), None);
    assert_eq!(scope.define("a", ElementId(1)), None);
    assert_eq!(scope.define("a", ElementId(2)), Some(ElementId(1)));
}

#[test]
fn test_unlabeled_break_targets_innermost_loop() {
    let mut labels = LabelScope::new();
    assert_eq!(labels.lookup(None), LabelLookup::NoEnclosingTarget);
    labels.push_implicit(NodeIndex(1));
    let depth = labels.push_implicit(NodeIndex(2));
    assert_eq!(
        labels.lookup(None),
        LabelLookup::Target {
            element: ElementId::NONE,
            node: NodeIndex(2)
        }
    );
    labels.truncate(depth);
    assert_eq!(
        labels.lookup(None),
        LabelLookup::Target {
            element: ElementId::NONE,
            node: NodeIndex(1)
        }
    );
}

#[test]
fn test_labels_do_not_cross_functions() {
    let mut labels = LabelScope::new();
    labels.push("outer", ElementId(7), NodeIndex(3));
    labels.push_implicit(NodeIndex(3));
    labels.enter_function();
    assert_eq!(labels.lookup(Some("outer")), LabelLookup::OuterFunction(ElementId(7)));
    assert_eq!(labels.lookup(None), LabelLookup::NoEnclosingTarget);
    assert_eq!(labels.lookup(Some("missing")), LabelLookup::Undefined);
    labels.exit_function();
    assert_eq!(
        labels.lookup(Some("outer")),
        LabelLookup::Target {
            element: ElementId(7),
            node: NodeIndex(3)
        }
    );
}
