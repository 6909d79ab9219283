use metapath::simple::{Datatype, SimpleNode, assembly, doc, field, flag};
use metapath::{
    AtomicValue, DynamicContext, Item, NodeItem, NodeKind, Sequence, compile,
};
use rstest::rstest;

/// `root` with children `field1` and `field2`, where `field2` carries a
/// `flag` flag.
fn sample() -> SimpleNode {
    doc()
        .child(
            assembly("root")
                .child(field("field1", Datatype::String, "value1"))
                .child(field("field2", Datatype::String, "value2").flag(flag(
                    "flag",
                    Datatype::String,
                    "field2-flag",
                ))),
        )
        .build()
}

fn eval_from(expr: &str, item: &SimpleNode) -> Sequence<SimpleNode> {
    let ctx = DynamicContext::default();
    compile(expr)
        .unwrap_or_else(|e| panic!("'{expr}' should compile: {e}"))
        .evaluate(Some(Item::Node(item.clone())), &ctx)
        .unwrap_or_else(|e| panic!("'{expr}' should evaluate: {e}"))
}

fn names(seq: &Sequence<SimpleNode>) -> Vec<String> {
    seq.iter()
        .map(|item| match item {
            Item::Node(n) => n.name().unwrap_or_default().to_string(),
            Item::Atomic(a) => panic!("expected nodes, got {a:?}"),
        })
        .collect()
}

#[test]
fn root_child_from_document() {
    let document = sample();
    let result = eval_from("./root", &document);
    assert_eq!(names(&result), ["root"]);
    let Some(Item::Node(root)) = result.first() else {
        panic!("expected a node");
    };
    assert_eq!(root.kind(), NodeKind::RootAssembly);
}

#[test]
fn child_wildcard_preserves_declaration_order() {
    let document = sample();
    let root = document.children()[0].clone();
    let result = eval_from("child::*", &root);
    assert_eq!(names(&result), ["field1", "field2"]);
}

#[test]
fn flags_are_reached_only_via_the_flag_axis() {
    let document = sample();
    let root = document.children()[0].clone();
    let field2 = root.children()[1].clone();
    let result = eval_from("./@flag", &field2);
    assert_eq!(names(&result), ["flag"]);
    // `child::*` never yields flags.
    assert!(eval_from("child::*", &field2).is_empty());
    assert_eq!(names(&eval_from("flag::*", &field2)), ["flag"]);
}

#[test]
fn sibling_navigation_through_parent() {
    let document = sample();
    let root = document.children()[0].clone();
    let field1 = root.children()[0].clone();
    assert_eq!(names(&eval_from("../field2", &field1)), ["field2"]);
}

#[rstest]
#[case("parent::root", 1)]
#[case("parent::other", 0)]
fn parent_axis_with_name_test(#[case] expr: &str, #[case] expected: usize) {
    let document = sample();
    let root = document.children()[0].clone();
    let field1 = root.children()[0].clone();
    assert_eq!(eval_from(expr, &field1).len(), expected);
}

#[test]
fn parent_of_the_document_is_empty() {
    let document = sample();
    assert!(eval_from("parent::other", &document).is_empty());
    assert!(eval_from("..", &document).is_empty());
}

#[test]
fn rooted_paths_start_at_the_document() {
    let document = sample();
    let root = document.children()[0].clone();
    let field1 = root.children()[0].clone();
    // Rooted navigation works from anywhere in the tree.
    assert_eq!(names(&eval_from("/root/field2", &field1)), ["field2"]);
    assert_eq!(
        names(&eval_from("//field2", &field1)),
        ["field2"]
    );
}

#[test]
fn descendant_axes() {
    let document = sample();
    assert_eq!(
        names(&eval_from("descendant::*", &document)),
        ["root", "field1", "field2"]
    );
    assert_eq!(
        names(&eval_from("descendant-or-self::node()", &document)).len(),
        4
    );
    assert_eq!(
        names(&eval_from("ancestor-or-self::root", &document.children()[0].children()[0])),
        ["root"]
    );
}

#[test]
fn positional_predicates() {
    let document = sample();
    let root = document.children()[0].clone();
    assert_eq!(names(&eval_from("child::*[1]", &root)), ["field1"]);
    assert_eq!(names(&eval_from("child::*[2]", &root)), ["field2"]);
    assert!(eval_from("child::*[3]", &root).is_empty());
}

#[test]
fn value_predicates_filter_by_effective_boolean_value() {
    let document = sample();
    assert_eq!(
        names(&eval_from("./root/field2[@flag = 'field2-flag']", &document)),
        ["field2"]
    );
    assert!(eval_from("./root/field2[@flag = 'other']", &document).is_empty());
    // A predicate over a missing flag compares against the empty sequence,
    // which is an empty (falsy) result.
    assert!(eval_from("./root/field1[@flag = 'x']", &document).is_empty());
}

#[test]
fn disabled_predicates_are_never_iterated() {
    let document = sample();
    let ctx: DynamicContext<SimpleNode> = DynamicContext::builder()
        .disable_predicate_evaluation()
        .build();
    // The predicate would error if evaluated (value comparison between
    // incomparable types); with predicates disabled all candidates pass.
    let expr = compile("./root/*[1 eq 'one']").unwrap();
    let result = expr
        .evaluate(Some(Item::Node(document.clone())), &ctx)
        .unwrap();
    assert_eq!(names(&result), ["field1", "field2"]);
    // Predicate-free steps are unchanged by the toggle.
    let plain = compile("./root/*").unwrap();
    assert_eq!(
        plain.evaluate(Some(Item::Node(document)), &ctx).unwrap(),
        result
    );
}

#[test]
fn variable_bound_nodes_can_start_a_path() {
    let document = sample();
    let root = document.children()[0].clone();
    let ctx: DynamicContext<SimpleNode> = DynamicContext::builder()
        .variable("root", Item::Node(root))
        .build();
    let expr = compile("$root/field1").unwrap();
    let result = expr.evaluate(None, &ctx).unwrap();
    assert_eq!(names(&result), ["field1"]);
}

#[test]
fn atomized_field_values_compare_by_declared_type() {
    let document = doc()
        .child(
            assembly("root")
                .child(field("n", Datatype::Integer, "7"))
                .child(field("n", Datatype::Integer, "9")),
        )
        .build();
    let result = eval_from("./root/n[. = 9]", &document);
    assert_eq!(result.len(), 1);
    let expr = compile("./root/n = 7").unwrap();
    let ctx = DynamicContext::default();
    let b = expr
        .evaluate(Some(Item::Node(document)), &ctx)
        .unwrap();
    assert_eq!(
        b.as_singleton(),
        Some(&Item::Atomic(AtomicValue::Boolean(true)))
    );
}

#[test]
fn uuid_flags_compare_by_value() {
    let id = "b7e9a7a0-3f64-4be1-9d9a-6a2f0c6d1f2e";
    let other = "00000000-0000-0000-0000-000000000000";
    let document = doc()
        .child(
            assembly("root")
                .child(field("a", Datatype::String, "x").flag(flag("id", Datatype::Uuid, id)))
                .child(field("b", Datatype::String, "y").flag(flag("id", Datatype::Uuid, id)))
                .child(field("c", Datatype::String, "z").flag(flag("id", Datatype::Uuid, other))),
        )
        .build();
    let same = eval_from("./root/a/@id = ./root/b/@id", &document);
    assert_eq!(
        same.as_singleton(),
        Some(&Item::Atomic(AtomicValue::Boolean(true)))
    );
    let different = eval_from("./root/a/@id = ./root/c/@id", &document);
    assert_eq!(
        different.as_singleton(),
        Some(&Item::Atomic(AtomicValue::Boolean(false)))
    );
}

#[test]
fn evaluate_one_node_enforces_shape() {
    let document = sample();
    let ctx = DynamicContext::default();
    let node = compile("./root/field1")
        .unwrap()
        .evaluate_one_node(Some(Item::Node(document.clone())), &ctx)
        .unwrap();
    assert_eq!(node.name(), Some("field1"));
    let err = compile("./root/*")
        .unwrap()
        .evaluate_one_node(Some(Item::Node(document)), &ctx)
        .unwrap_err();
    assert_eq!(err.kind, metapath::ErrorKind::InvalidType);
}
