use std::sync::Arc;

use metapath::simple::{Datatype, SimpleNode, assembly, doc, field};
use metapath::{
    AtomicValue, DocumentLoader, DynamicContext, Error, ErrorKind, Item, NodeItem, Sequence,
    StaticContext, compile, compile_with_context,
};
use rstest::rstest;
use url::Url;

fn eval(expr: &str) -> Sequence<SimpleNode> {
    let ctx = DynamicContext::default();
    compile(expr)
        .unwrap_or_else(|e| panic!("'{expr}' should compile: {e}"))
        .evaluate(None, &ctx)
        .unwrap_or_else(|e| panic!("'{expr}' should evaluate: {e}"))
}

fn eval_err(expr: &str) -> Error {
    let ctx: DynamicContext<SimpleNode> = DynamicContext::default();
    compile(expr)
        .unwrap_or_else(|e| panic!("'{expr}' should compile: {e}"))
        .evaluate(None, &ctx)
        .unwrap_err()
}

fn atomic(expr: &str) -> AtomicValue {
    match eval(expr).as_singleton() {
        Some(Item::Atomic(a)) => a.clone(),
        other => panic!("'{expr}' should yield one atomic value, got {other:?}"),
    }
}

#[rstest]
#[case("concat('un', 'grateful')", "ungrateful")]
#[case("concat('Ciao!', ())", "Ciao!")]
#[case("concat('a', 1, 2.5)", "a12.5")]
fn concat_fixtures(#[case] expr: &str, #[case] expected: &str) {
    assert_eq!(atomic(expr), AtomicValue::String(expected.to_string()));
}

#[test]
fn concat_requires_two_arguments() {
    let err = compile("concat('a')")
        .unwrap()
        .evaluate(None, &DynamicContext::<SimpleNode>::default())
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::FunctionNotFound);
}

#[test]
fn unknown_function_is_not_found() {
    assert_eq!(eval_err("no-such-fn(1)").kind, ErrorKind::FunctionNotFound);
}

#[test]
fn string_accessor() {
    assert_eq!(atomic("string(3.0)"), AtomicValue::String("3".to_string()));
    assert_eq!(atomic("string(())"), AtomicValue::String(String::new()));
    assert_eq!(
        atomic("string('already')"),
        AtomicValue::String("already".to_string())
    );
}

#[rstest]
#[case("starts-with('metapath', 'meta')", true)]
#[case("starts-with('metapath', 'path')", false)]
#[case("ends-with('metapath', 'path')", true)]
#[case("contains('metapath', 'tap')", true)]
#[case("contains('metapath', 'xyz')", false)]
fn substring_predicates(#[case] expr: &str, #[case] expected: bool) {
    assert_eq!(atomic(expr), AtomicValue::Boolean(expected));
}

#[test]
fn normalize_space_and_length() {
    assert_eq!(
        atomic("normalize-space('  a   b  ')"),
        AtomicValue::String("a b".to_string())
    );
    assert_eq!(atomic("string-length('abc')"), AtomicValue::Integer(3));
}

#[test]
fn avg_of_numbers_is_decimal() {
    assert_eq!(atomic("avg((3, 4, 5))"), AtomicValue::Decimal(4.0));
    assert!(eval("avg(())").is_empty());
}

#[test]
fn avg_of_year_month_durations() {
    let document = doc()
        .child(
            assembly("root")
                .child(field("d", Datatype::YearMonthDuration, "P20Y"))
                .child(field("d", Datatype::YearMonthDuration, "P10M")),
        )
        .build();
    let expr = compile("avg(./root/d)").unwrap();
    let ctx = DynamicContext::default();
    let result = expr
        .evaluate(Some(Item::Node(document)), &ctx)
        .unwrap();
    let Some(Item::Atomic(value)) = result.as_singleton() else {
        panic!("expected one atomic value");
    };
    assert_eq!(value.string_value(), "P10Y5M");
}

#[test]
fn avg_of_mixed_types_is_an_argument_error() {
    assert_eq!(
        eval_err("avg((3, 'text'))").kind,
        ErrorKind::InvalidArgumentType
    );
}

#[test]
fn min_keeps_the_first_operand_on_a_numeric_tie() {
    // integer 5 and decimal 5.0 are numerically equal; the integer comes
    // first and wins, keeping its concrete type.
    assert_eq!(atomic("min((5, 5.0, 10.0))"), AtomicValue::Integer(5));
    assert_eq!(atomic("min((5.0, 5, 10.0))"), AtomicValue::Decimal(5.0));
    assert_eq!(atomic("max((1, 2.0, 2))"), AtomicValue::Decimal(2.0));
}

#[test]
fn min_max_over_strings_and_errors() {
    assert_eq!(
        atomic("min(('b', 'a', 'c'))"),
        AtomicValue::String("a".to_string())
    );
    assert!(eval("max(())").is_empty());
    assert_eq!(
        eval_err("min((3, 'text'))").kind,
        ErrorKind::InvalidArgumentType
    );
}

#[test]
fn sum_and_count() {
    assert_eq!(atomic("sum((1, 2, 3))"), AtomicValue::Integer(6));
    assert_eq!(atomic("sum((1, 2.5))"), AtomicValue::Decimal(3.5));
    assert_eq!(atomic("sum(())"), AtomicValue::Integer(0));
    assert_eq!(atomic("count((1, 'a', 2.0))"), AtomicValue::Integer(3));
    assert_eq!(atomic("count(())"), AtomicValue::Integer(0));
}

#[test]
fn empty_and_exists() {
    assert_eq!(atomic("empty(())"), AtomicValue::Boolean(true));
    assert_eq!(atomic("exists((1))"), AtomicValue::Boolean(true));
    assert_eq!(atomic("exists(())"), AtomicValue::Boolean(false));
}

#[test]
fn number_coerces_or_yields_nan() {
    assert_eq!(atomic("number('4.5')"), AtomicValue::Decimal(4.5));
    assert_eq!(atomic("number(true())"), AtomicValue::Decimal(1.0));
    let AtomicValue::Decimal(nan) = atomic("number('not a number')") else {
        panic!("expected a decimal");
    };
    assert!(nan.is_nan());
}

#[test]
fn data_atomizes_nodes() {
    let document = doc()
        .child(assembly("root").child(field("n", Datatype::Integer, "7")))
        .build();
    let expr = compile("data(./root/n)").unwrap();
    let ctx = DynamicContext::default();
    let result = expr
        .evaluate(Some(Item::Node(document)), &ctx)
        .unwrap();
    assert_eq!(
        result.as_singleton(),
        Some(&Item::Atomic(AtomicValue::Integer(7)))
    );
}

#[test]
fn name_of_the_context_node() {
    let document = doc()
        .child(assembly("root").child(field("f", Datatype::String, "v")))
        .build();
    let root = document.children()[0].clone();
    let expr = compile("name()").unwrap();
    let ctx = DynamicContext::default();
    let result = expr
        .evaluate(Some(Item::Node(root)), &ctx)
        .unwrap();
    assert_eq!(
        result.as_singleton(),
        Some(&Item::Atomic(AtomicValue::String("root".to_string())))
    );
}

// ---------------------------------------------------------------------------
// doc() / doc-available() / resolve-uri()
// ---------------------------------------------------------------------------

struct StubLoader {
    known: Url,
    tree: SimpleNode,
}

impl DocumentLoader<SimpleNode> for StubLoader {
    fn load(&self, uri: &Url) -> Result<SimpleNode, Error> {
        if *uri == self.known {
            Ok(self.tree.clone())
        } else {
            Err(Error::new(
                ErrorKind::DocumentResolution,
                format!("unknown document '{uri}'"),
            ))
        }
    }
}

fn loader_fixture() -> (Url, DynamicContext<SimpleNode>) {
    let known = Url::parse("https://example.com/docs/catalog.xml").unwrap();
    let tree = doc()
        .child(assembly("catalog").child(field("id", Datatype::String, "c1")))
        .build();
    let ctx = DynamicContext::builder()
        .document_loader(Arc::new(StubLoader {
            known: known.clone(),
            tree,
        }))
        .build();
    (known, ctx)
}

#[test]
fn doc_resolves_relative_references_against_the_base_uri() {
    let (known, ctx) = loader_fixture();
    let static_ctx = StaticContext::builder()
        .base_uri(Url::parse("https://example.com/docs/").unwrap())
        .build();
    let expr = compile_with_context("doc('catalog.xml')/catalog/id", &static_ctx).unwrap();
    let result = expr.evaluate(None, &ctx).unwrap();
    assert_eq!(result.len(), 1);
    let absolute = compile_with_context(&format!("doc('{known}')"), &static_ctx).unwrap();
    assert_eq!(absolute.evaluate(None, &ctx).unwrap().len(), 1);
}

#[test]
fn doc_without_a_loader_fails() {
    let ctx: DynamicContext<SimpleNode> = DynamicContext::default();
    let err = compile("doc('https://example.com/x.xml')")
        .unwrap()
        .evaluate(None, &ctx)
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::DocumentResolution);
}

#[test]
fn doc_available_reports_without_failing() {
    let (known, ctx) = loader_fixture();
    let ok = compile(&format!("doc-available('{known}')")).unwrap();
    assert_eq!(
        ok.evaluate(None, &ctx).unwrap().as_singleton(),
        Some(&Item::Atomic(AtomicValue::Boolean(true)))
    );
    let missing = compile("doc-available('https://example.com/other.xml')").unwrap();
    assert_eq!(
        missing.evaluate(None, &ctx).unwrap().as_singleton(),
        Some(&Item::Atomic(AtomicValue::Boolean(false)))
    );
    // A relative reference with no base URI is simply unavailable.
    let relative = compile("doc-available('nowhere.xml')").unwrap();
    assert_eq!(
        relative.evaluate(None, &ctx).unwrap().as_singleton(),
        Some(&Item::Atomic(AtomicValue::Boolean(false)))
    );
}

#[test]
fn resolve_uri_against_static_and_explicit_bases() {
    let static_ctx = StaticContext::builder()
        .base_uri(Url::parse("https://example.com/a/").unwrap())
        .build();
    let ctx: DynamicContext<SimpleNode> = DynamicContext::default();
    let expr = compile_with_context("resolve-uri('b/c.xml')", &static_ctx).unwrap();
    assert_eq!(
        expr.evaluate(None, &ctx).unwrap().as_singleton(),
        Some(&Item::Atomic(AtomicValue::AnyUri(
            "https://example.com/a/b/c.xml".to_string()
        )))
    );
    let explicit = compile("resolve-uri('x', 'https://other.example/base/')").unwrap();
    assert_eq!(
        explicit.evaluate(None, &ctx).unwrap().as_singleton(),
        Some(&Item::Atomic(AtomicValue::AnyUri(
            "https://other.example/base/x".to_string()
        )))
    );
}

#[test]
fn resolve_uri_without_a_base_is_an_error() {
    assert_eq!(
        eval_err("resolve-uri('relative.xml')").kind,
        ErrorKind::UriResolution
    );
}
