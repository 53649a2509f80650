use super::*;
use crate::node::{Operator, ParameterKind, ParameterShape, VarKeyword};

fn ident(arena: &mut NodeArena, name: &str, pos: u32) -> NodeIndex {
    arena.add(
        NodeKind::SimpleIdentifier {
            name: name.to_string(),
        },
        pos,
        pos + name.len() as u32,
    )
}

/// Builds `a + b;` wrapped in a block.
fn sample() -> (NodeArena, NodeIndex, NodeIndex, NodeIndex, NodeIndex) {
    let mut arena = NodeArena::new();
    let a = ident(&mut arena, "a", 2);
    let b = ident(&mut arena, "b", 6);
    let bin = arena.add(
        NodeKind::BinaryExpression {
            operator: Operator::Plus,
            left: a,
            right: b,
        },
        2,
        7,
    );
    let stmt = arena.add(NodeKind::ExpressionStatement { expression: bin }, 2, 8);
    let block = arena.add(
        NodeKind::Block {
            statements: NodeList::from_vec(vec![stmt]),
        },
        0,
        10,
    );
    arena.link_parents(block);
    (arena, block, bin, a, b)
}

#[test]
fn test_children_are_in_source_order() {
    let (arena, _, bin, a, b) = sample();
    let children = arena.children(bin);
    assert_eq!(children.as_slice(), &[a, b]);
}

#[test]
fn test_parameter_annotations_come_first() {
    // `@deprecated a`
    let mut arena = NodeArena::new();
    let annotation_name = ident(&mut arena, "deprecated", 1);
    let annotation = arena.add(
        NodeKind::Annotation {
            name: annotation_name,
            constructor_name: NodeIndex::NONE,
            arguments: NodeIndex::NONE,
        },
        0,
        11,
    );
    let name = ident(&mut arena, "a", 12);
    let parameter = arena.add(
        NodeKind::FormalParameter {
            metadata: NodeList::from_vec(vec![annotation]),
            kind: ParameterKind::Required,
            shape: ParameterShape::Simple,
            keyword: VarKeyword::None,
            type_name: NodeIndex::NONE,
            name,
            parameters: NodeIndex::NONE,
            default_value: NodeIndex::NONE,
        },
        12,
        13,
    );
    arena.link_parents(parameter);
    assert_eq!(arena.children(parameter).as_slice(), &[annotation, name]);
    assert_eq!(arena.parent(annotation), parameter);
    assert_eq!(arena.children(annotation).as_slice(), &[annotation_name]);
}

#[test]
fn test_link_parents_and_ancestors() {
    let (arena, block, bin, a, _) = sample();
    assert_eq!(arena.parent(a), bin);
    let chain: Vec<NodeIndex> = arena.ancestors(a).collect();
    assert_eq!(chain.len(), 3);
    assert_eq!(chain.last().copied(), Some(block));
    assert!(arena.is_within(a, block));
    assert!(!arena.is_within(block, a));
}

#[test]
fn test_covering_node_finds_innermost() {
    let (arena, block, bin, _, b) = sample();
    assert_eq!(arena.covering_node(block, 6, 7), b);
    assert_eq!(arena.covering_node(block, 3, 6), bin);
    assert_eq!(arena.covering_node(block, 0, 10), block);
    assert!(arena.covering_node(block, 0, 20).is_none());
}

#[test]
fn test_descendants_preorder() {
    let (arena, block, bin, a, b) = sample();
    let all = arena.descendants(block);
    assert_eq!(all.len(), 5);
    assert_eq!(all[0], block);
    let pos_bin = all.iter().position(|&n| n == bin).expect("bin present");
    let pos_a = all.iter().position(|&n| n == a).expect("a present");
    let pos_b = all.iter().position(|&n| n == b).expect("b present");
    assert!(pos_bin < pos_a && pos_a < pos_b);
}

#[test]
fn test_absent_slots_are_skipped() {
    let mut arena = NodeArena::new();
    let name = ident(&mut arena, "x", 4);
    let decl = arena.add(
        NodeKind::VariableDeclaration {
            name,
            initializer: NodeIndex::NONE,
        },
        4,
        5,
    );
    assert_eq!(arena.children(decl).as_slice(), &[name]);
    assert!(arena.kind(NodeIndex::NONE).is_none());
    assert_eq!(arena.identifier_name(name), Some("x"));
}

#[test]
fn test_compound_operator_expansion() {
    assert_eq!(Operator::PlusEq.compound_binary(), Some(Operator::Plus));
    assert_eq!(Operator::Eq.compound_binary(), None);
    assert!(Operator::Eq.is_assignment());
    assert!(Operator::TildeSlashEq.is_assignment());
    assert!(!Operator::EqEq.is_assignment());
}
