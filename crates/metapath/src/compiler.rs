//! CST→AST builder and the compiled expression handle.
//!
//! [`compile`] parses the expression text (producing the pest concrete
//! syntax tree) and lowers it production by production into the typed AST.
//! The build is pure and deterministic for a given CST shape and never
//! partially succeeds: any grammar production without an AST counterpart
//! fails with [`ErrorKind::UnsupportedConstruct`].

use std::sync::{Arc, OnceLock};

use pest::iterators::Pair;

use crate::evaluator;
use crate::item::{Item, Sequence};
use crate::model::NodeItem;
use crate::parser::{Rule, ast, parse_metapath};
use crate::runtime::{DynamicContext, Error, StaticContext};

static DEFAULT_STATIC_CONTEXT: OnceLock<StaticContext> = OnceLock::new();

fn default_static_ctx() -> &'static StaticContext {
    DEFAULT_STATIC_CONTEXT.get_or_init(StaticContext::default)
}

/// Compile using a lazily initialized default static context.
pub fn compile(expr: &str) -> Result<MetapathExpression, Error> {
    compile_with_context(expr, default_static_ctx())
}

/// Compile with an explicitly provided static context. The context is
/// snapshotted into the compiled expression.
pub fn compile_with_context(
    expr: &str,
    static_ctx: &StaticContext,
) -> Result<MetapathExpression, Error> {
    tracing::trace!(source = expr, "compiling metapath expression");
    let mut pairs = parse_metapath(expr)?;
    let root = pairs
        .next()
        .ok_or_else(|| Error::syntax("empty parse result"))?;
    let inner = root
        .into_inner()
        .next()
        .ok_or_else(|| Error::syntax("missing expression body"))?;
    let ast = build_expr(inner)?;
    Ok(MetapathExpression {
        ast,
        static_ctx: Arc::new(static_ctx.clone()),
        source: expr.to_string(),
    })
}

/// A Metapath expression compiled once and evaluated repeatedly. Immutable;
/// safe to share across threads provided each evaluation uses its own
/// dynamic context.
#[derive(Debug, Clone)]
pub struct MetapathExpression {
    ast: ast::Expr,
    static_ctx: Arc<StaticContext>,
    source: String,
}

impl MetapathExpression {
    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn ast(&self) -> &ast::Expr {
        &self.ast
    }

    pub fn static_context(&self) -> &StaticContext {
        &self.static_ctx
    }

    /// Evaluate against an optional focus item, yielding a result sequence.
    pub fn evaluate<N: NodeItem>(
        &self,
        focus: Option<Item<N>>,
        dyn_ctx: &DynamicContext<N>,
    ) -> Result<Sequence<N>, Error> {
        tracing::trace!(source = self.source.as_str(), "evaluating");
        evaluator::evaluate(&self.ast, &self.static_ctx, dyn_ctx, focus)
    }

    /// Evaluate and coerce the result through the effective boolean value.
    pub fn evaluate_as_boolean<N: NodeItem>(
        &self,
        focus: Option<Item<N>>,
        dyn_ctx: &DynamicContext<N>,
    ) -> Result<bool, Error> {
        let seq = self.evaluate(focus, dyn_ctx)?;
        evaluator::effective_boolean_value(&seq)
    }

    /// Evaluate and render the result as its string form (concatenated item
    /// string values; the empty sequence yields the empty string).
    pub fn evaluate_as_string<N: NodeItem>(
        &self,
        focus: Option<Item<N>>,
        dyn_ctx: &DynamicContext<N>,
    ) -> Result<String, Error> {
        let seq = self.evaluate(focus, dyn_ctx)?;
        let mut out = String::new();
        for item in &seq {
            out.push_str(&item.string_value()?);
        }
        Ok(out)
    }

    /// Evaluate and require exactly one node item as the result.
    pub fn evaluate_one_node<N: NodeItem>(
        &self,
        focus: Option<Item<N>>,
        dyn_ctx: &DynamicContext<N>,
    ) -> Result<N, Error> {
        let seq = self.evaluate(focus, dyn_ctx)?;
        match seq.as_singleton() {
            Some(Item::Node(n)) => Ok(n.clone()),
            Some(Item::Atomic(a)) => Err(Error::invalid_type(format!(
                "expected a single node, got an atomic {} value",
                a.type_name()
            ))),
            None => Err(Error::invalid_type(format!(
                "expected exactly one node, got a sequence of {}",
                seq.len()
            ))),
        }
    }
}

type BResult = Result<ast::Expr, Error>;

fn build_expr(pair: Pair<'_, Rule>) -> BResult {
    match pair.as_rule() {
        Rule::expr => {
            let mut items = Vec::new();
            for p in pair.into_inner() {
                items.push(build_expr(p)?);
            }
            if items.len() == 1 {
                Ok(items.pop().unwrap_or(ast::Expr::Sequence(Vec::new())))
            } else {
                Ok(ast::Expr::Sequence(items))
            }
        }
        Rule::expr_single => build_only_child(pair),
        Rule::or_expr => build_boolean_chain(pair, true),
        Rule::and_expr => build_boolean_chain(pair, false),
        Rule::comparison_expr => build_comparison(pair),
        Rule::string_concat_expr => build_string_concat(pair),
        Rule::range_expr => {
            let mut inner = pair.into_inner();
            let first = inner
                .next()
                .ok_or_else(|| Error::syntax("empty range expression"))?;
            if inner.next().is_some() {
                return Err(Error::unsupported("range expression ('to')"));
            }
            build_expr(first)
        }
        Rule::additive_expr | Rule::multiplicative_expr => build_arithmetic_chain(pair),
        Rule::union_expr => build_rejected_chain(pair, "union expression ('|'/'union')"),
        Rule::intersect_except_expr => {
            build_rejected_chain(pair, "intersect/except expression")
        }
        Rule::unary_expr => build_unary(pair),
        Rule::path_expr => build_only_child(pair),
        Rule::root_descendant_path | Rule::root_path | Rule::relative_path_expr => {
            build_path(pair)
        }
        Rule::postfix_expr => build_postfix(pair),
        Rule::primary_expr => build_only_child(pair),
        Rule::literal => build_only_child(pair),
        Rule::string_literal => Ok(ast::Expr::Literal(ast::Literal::String(
            unescape_string(pair),
        ))),
        Rule::integer_literal => {
            let v = pair
                .as_str()
                .parse::<i64>()
                .map_err(|_| Error::syntax("integer literal out of range"))?;
            Ok(ast::Expr::Literal(ast::Literal::Integer(v)))
        }
        Rule::decimal_literal => {
            let v = pair
                .as_str()
                .parse::<f64>()
                .map_err(|_| Error::syntax("invalid decimal literal"))?;
            Ok(ast::Expr::Literal(ast::Literal::Decimal(v)))
        }
        Rule::var_ref => {
            let name = pair
                .into_inner()
                .next()
                .ok_or_else(|| Error::syntax("variable reference without a name"))?;
            Ok(ast::Expr::VarRef(ast::Name::parse(name.as_str())))
        }
        Rule::parenthesized_expr => match pair.into_inner().next() {
            Some(inner) => build_expr(inner),
            None => Ok(ast::Expr::Sequence(Vec::new())),
        },
        Rule::context_item_expr => Ok(ast::Expr::ContextItem),
        Rule::function_call => {
            let mut inner = pair.into_inner();
            let name = inner
                .next()
                .ok_or_else(|| Error::syntax("function call without a name"))?;
            let name = ast::Name::parse(name.as_str());
            let mut args = Vec::new();
            for arg in inner {
                args.push(build_expr(arg)?);
            }
            Ok(ast::Expr::FunctionCall { name, args })
        }
        other => Err(Error::unsupported(format!("{other:?}"))),
    }
}

fn build_only_child(pair: Pair<'_, Rule>) -> BResult {
    let inner = pair
        .into_inner()
        .next()
        .ok_or_else(|| Error::syntax("empty production"))?;
    build_expr(inner)
}

fn build_boolean_chain(pair: Pair<'_, Rule>, is_or: bool) -> BResult {
    let mut operands = Vec::new();
    for p in pair.into_inner() {
        match p.as_rule() {
            Rule::K_OR | Rule::K_AND => {}
            _ => operands.push(build_expr(p)?),
        }
    }
    if operands.len() == 1 {
        return Ok(operands
            .pop()
            .unwrap_or(ast::Expr::Sequence(Vec::new())));
    }
    Ok(if is_or {
        ast::Expr::Or(operands)
    } else {
        ast::Expr::And(operands)
    })
}

fn build_comparison(pair: Pair<'_, Rule>) -> BResult {
    let mut inner = pair.into_inner();
    let left = build_expr(
        inner
            .next()
            .ok_or_else(|| Error::syntax("empty comparison"))?,
    )?;
    let Some(op_pair) = inner.next() else {
        return Ok(left);
    };
    let right = build_expr(
        inner
            .next()
            .ok_or_else(|| Error::syntax("comparison without right operand"))?,
    )?;
    let is_value = op_pair.as_rule() == Rule::value_comp;
    let op_token = op_pair
        .into_inner()
        .next()
        .ok_or_else(|| Error::syntax("comparison without operator"))?;
    let op = match op_token.as_rule() {
        Rule::OP_EQ | Rule::VC_EQ => ast::CompOp::Eq,
        Rule::OP_NE | Rule::VC_NE => ast::CompOp::Ne,
        Rule::OP_LT | Rule::VC_LT => ast::CompOp::Lt,
        Rule::OP_LE | Rule::VC_LE => ast::CompOp::Le,
        Rule::OP_GT | Rule::VC_GT => ast::CompOp::Gt,
        Rule::OP_GE | Rule::VC_GE => ast::CompOp::Ge,
        other => return Err(Error::unsupported(format!("comparison operator {other:?}"))),
    };
    Ok(if is_value {
        ast::Expr::ValueComparison {
            left: Box::new(left),
            op,
            right: Box::new(right),
        }
    } else {
        ast::Expr::GeneralComparison {
            left: Box::new(left),
            op,
            right: Box::new(right),
        }
    })
}

fn build_string_concat(pair: Pair<'_, Rule>) -> BResult {
    let mut operands = Vec::new();
    for p in pair.into_inner() {
        match p.as_rule() {
            Rule::OP_CONCAT => {}
            _ => operands.push(build_expr(p)?),
        }
    }
    if operands.len() == 1 {
        return Ok(operands
            .pop()
            .unwrap_or(ast::Expr::Sequence(Vec::new())));
    }
    Ok(ast::Expr::StringConcat(operands))
}

fn build_arithmetic_chain(pair: Pair<'_, Rule>) -> BResult {
    let mut inner = pair.into_inner();
    let mut acc = build_expr(
        inner
            .next()
            .ok_or_else(|| Error::syntax("empty arithmetic expression"))?,
    )?;
    while let Some(op_pair) = inner.next() {
        let op = match op_pair.as_rule() {
            Rule::OP_PLUS => ast::ArithOp::Add,
            Rule::OP_MINUS => ast::ArithOp::Sub,
            Rule::OP_MUL => ast::ArithOp::Mul,
            Rule::K_DIV => ast::ArithOp::Div,
            Rule::K_IDIV => ast::ArithOp::IDiv,
            Rule::K_MOD => ast::ArithOp::Mod,
            other => {
                return Err(Error::unsupported(format!(
                    "arithmetic operator {other:?}"
                )));
            }
        };
        let rhs = build_expr(
            inner
                .next()
                .ok_or_else(|| Error::syntax("arithmetic without right operand"))?,
        )?;
        acc = ast::Expr::Arithmetic {
            left: Box::new(acc),
            op,
            right: Box::new(rhs),
        };
    }
    Ok(acc)
}

/// Chains whose operators have no AST counterpart: a single operand passes
/// through, any actual use of the operator fails the build.
fn build_rejected_chain(pair: Pair<'_, Rule>, what: &str) -> BResult {
    let mut operands = Vec::new();
    for p in pair.into_inner() {
        match p.as_rule() {
            Rule::K_UNION | Rule::OP_UNION | Rule::K_INTERSECT | Rule::K_EXCEPT => {}
            _ => operands.push(p),
        }
    }
    if operands.len() != 1 {
        return Err(Error::unsupported(what));
    }
    build_expr(operands.remove(0))
}

fn build_unary(pair: Pair<'_, Rule>) -> BResult {
    let mut negate = false;
    let mut operand = None;
    for p in pair.into_inner() {
        match p.as_rule() {
            Rule::OP_MINUS => negate = !negate,
            Rule::OP_PLUS => {}
            _ => operand = Some(p),
        }
    }
    let expr = build_expr(operand.ok_or_else(|| Error::syntax("unary without operand"))?)?;
    if negate {
        // Desugar to `0 - expr`.
        Ok(ast::Expr::Arithmetic {
            left: Box::new(ast::Expr::Literal(ast::Literal::Integer(0))),
            op: ast::ArithOp::Sub,
            right: Box::new(expr),
        })
    } else {
        Ok(expr)
    }
}

fn descendant_or_self_step() -> ast::Step {
    ast::Step {
        axis: ast::Axis::DescendantOrSelf,
        test: ast::NodeTest::AnyNode,
        predicates: Vec::new(),
    }
}

fn build_path(pair: Pair<'_, Rule>) -> BResult {
    let rule = pair.as_rule();
    match rule {
        Rule::root_descendant_path | Rule::root_path => {
            let mut steps = Vec::new();
            if rule == Rule::root_descendant_path {
                steps.push(descendant_or_self_step());
            }
            for p in pair.into_inner() {
                match p.as_rule() {
                    Rule::SLASH | Rule::SLASH_SLASH => {}
                    Rule::relative_path_expr => {
                        let (rel_input, rel_steps) = build_relative(p)?;
                        if rel_input.is_some() {
                            return Err(Error::unsupported(
                                "filter expression after a rooted path",
                            ));
                        }
                        steps.extend(rel_steps);
                    }
                    other => return Err(Error::unsupported(format!("{other:?}"))),
                }
            }
            Ok(ast::Expr::Path(ast::PathExpr {
                start: ast::PathStart::Root,
                input: None,
                steps,
            }))
        }
        Rule::relative_path_expr => {
            let (input, steps) = build_relative(pair)?;
            match (input, steps) {
                (Some(expr), steps) if steps.is_empty() => Ok(expr),
                (input, steps) => Ok(ast::Expr::Path(ast::PathExpr {
                    start: ast::PathStart::Relative,
                    input: input.map(Box::new),
                    steps,
                })),
            }
        }
        other => Err(Error::unsupported(format!("{other:?}"))),
    }
}

/// Lower a relative path into an optional leading input expression plus its
/// steps. `//` separators become explicit descendant-or-self steps.
fn build_relative(
    pair: Pair<'_, Rule>,
) -> Result<(Option<ast::Expr>, Vec<ast::Step>), Error> {
    let mut input = None;
    let mut steps: Vec<ast::Step> = Vec::new();
    let mut first = true;
    for p in pair.into_inner() {
        match p.as_rule() {
            Rule::SLASH => {}
            Rule::SLASH_SLASH => steps.push(descendant_or_self_step()),
            Rule::step_expr => {
                let component = p
                    .into_inner()
                    .next()
                    .ok_or_else(|| Error::syntax("empty path step"))?;
                match component.as_rule() {
                    Rule::axis_step => steps.push(build_step(component)?),
                    Rule::postfix_expr => match build_postfix_component(component)? {
                        PathComponent::Step(step) => steps.push(step),
                        PathComponent::Expr(expr) => {
                            if first {
                                input = Some(expr);
                            } else {
                                return Err(Error::unsupported(
                                    "filter expression as a non-initial path step",
                                ));
                            }
                        }
                    },
                    other => return Err(Error::unsupported(format!("{other:?}"))),
                }
                first = false;
            }
            other => return Err(Error::unsupported(format!("{other:?}"))),
        }
    }
    Ok((input, steps))
}

enum PathComponent {
    Step(ast::Step),
    Expr(ast::Expr),
}

/// A postfix expression in step position. `.` (with optional predicates)
/// becomes a self step so `./child` and `.[...]` need no special casing.
fn build_postfix_component(pair: Pair<'_, Rule>) -> Result<PathComponent, Error> {
    let mut inner = pair.into_inner();
    let primary = inner
        .next()
        .ok_or_else(|| Error::syntax("empty postfix expression"))?;
    let mut predicates = Vec::new();
    for p in inner {
        predicates.push(build_predicate(p)?);
    }
    let is_context_item = primary.as_rule() == Rule::primary_expr
        && primary
            .clone()
            .into_inner()
            .next()
            .is_some_and(|p| p.as_rule() == Rule::context_item_expr);
    if is_context_item {
        return Ok(PathComponent::Step(ast::Step {
            axis: ast::Axis::SelfAxis,
            test: ast::NodeTest::AnyNode,
            predicates,
        }));
    }
    let base = build_expr(primary)?;
    if predicates.is_empty() {
        Ok(PathComponent::Expr(base))
    } else {
        Ok(PathComponent::Expr(ast::Expr::Predicate {
            base: Box::new(base),
            predicates,
        }))
    }
}

fn build_postfix(pair: Pair<'_, Rule>) -> BResult {
    match build_postfix_component(pair)? {
        PathComponent::Expr(e) => Ok(e),
        PathComponent::Step(step) => Ok(ast::Expr::Path(ast::PathExpr {
            start: ast::PathStart::Relative,
            input: None,
            steps: vec![step],
        })),
    }
}

fn build_predicate(pair: Pair<'_, Rule>) -> BResult {
    let inner = pair
        .into_inner()
        .next()
        .ok_or_else(|| Error::syntax("empty predicate"))?;
    build_expr(inner)
}

fn build_step(pair: Pair<'_, Rule>) -> Result<ast::Step, Error> {
    let mut inner = pair.into_inner();
    let head = inner
        .next()
        .ok_or_else(|| Error::syntax("empty axis step"))?;
    let mut step = match head.as_rule() {
        Rule::forward_step => build_forward_step(head)?,
        Rule::reverse_step => build_reverse_step(head)?,
        other => return Err(Error::unsupported(format!("{other:?}"))),
    };
    for p in inner {
        step.predicates.push(build_predicate(p)?);
    }
    Ok(step)
}

fn build_forward_step(pair: Pair<'_, Rule>) -> Result<ast::Step, Error> {
    let mut inner = pair.into_inner();
    let head = inner
        .next()
        .ok_or_else(|| Error::syntax("empty forward step"))?;
    match head.as_rule() {
        Rule::forward_axis => {
            let axis = match axis_keyword(head.as_str()) {
                "child" => ast::Axis::Child,
                "descendant" => ast::Axis::Descendant,
                "descendant-or-self" => ast::Axis::DescendantOrSelf,
                "self" => ast::Axis::SelfAxis,
                "flag" => ast::Axis::Flag,
                other => return Err(Error::unsupported(format!("axis '{other}'"))),
            };
            let test = build_node_test(
                inner
                    .next()
                    .ok_or_else(|| Error::syntax("axis without node test"))?,
            )?;
            Ok(ast::Step {
                axis,
                test,
                predicates: Vec::new(),
            })
        }
        Rule::abbrev_forward_step => {
            let mut abbrev = head.into_inner();
            let first = abbrev
                .next()
                .ok_or_else(|| Error::syntax("empty abbreviated step"))?;
            if first.as_rule() == Rule::AT {
                let test = build_node_test(
                    abbrev
                        .next()
                        .ok_or_else(|| Error::syntax("'@' without node test"))?,
                )?;
                Ok(ast::Step {
                    axis: ast::Axis::Flag,
                    test,
                    predicates: Vec::new(),
                })
            } else {
                Ok(ast::Step {
                    axis: ast::Axis::Child,
                    test: build_node_test(first)?,
                    predicates: Vec::new(),
                })
            }
        }
        other => Err(Error::unsupported(format!("{other:?}"))),
    }
}

fn build_reverse_step(pair: Pair<'_, Rule>) -> Result<ast::Step, Error> {
    let mut inner = pair.into_inner();
    let head = inner
        .next()
        .ok_or_else(|| Error::syntax("empty reverse step"))?;
    match head.as_rule() {
        Rule::reverse_axis => {
            let axis = match axis_keyword(head.as_str()) {
                "parent" => ast::Axis::Parent,
                "ancestor" => ast::Axis::Ancestor,
                "ancestor-or-self" => ast::Axis::AncestorOrSelf,
                other => return Err(Error::unsupported(format!("axis '{other}'"))),
            };
            let test = build_node_test(
                inner
                    .next()
                    .ok_or_else(|| Error::syntax("axis without node test"))?,
            )?;
            Ok(ast::Step {
                axis,
                test,
                predicates: Vec::new(),
            })
        }
        Rule::abbrev_parent => Ok(ast::Step {
            axis: ast::Axis::Parent,
            test: ast::NodeTest::AnyNode,
            predicates: Vec::new(),
        }),
        other => Err(Error::unsupported(format!("{other:?}"))),
    }
}

fn axis_keyword(text: &str) -> &str {
    match text.find(':') {
        Some(idx) => text[..idx].trim(),
        None => text.trim(),
    }
}

fn build_node_test(pair: Pair<'_, Rule>) -> Result<ast::NodeTest, Error> {
    let inner = pair
        .into_inner()
        .next()
        .ok_or_else(|| Error::syntax("empty node test"))?;
    match inner.as_rule() {
        Rule::kind_test => Ok(ast::NodeTest::AnyNode),
        Rule::name_test => {
            let t = inner
                .into_inner()
                .next()
                .ok_or_else(|| Error::syntax("empty name test"))?;
            match t.as_rule() {
                Rule::wildcard => Ok(ast::NodeTest::Wildcard),
                Rule::qname => Ok(ast::NodeTest::Name(ast::Name::parse(t.as_str()))),
                other => Err(Error::unsupported(format!("{other:?}"))),
            }
        }
        other => Err(Error::unsupported(format!("{other:?}"))),
    }
}

fn unescape_string(pair: Pair<'_, Rule>) -> String {
    match pair.into_inner().next() {
        Some(content) => {
            let raw = content.as_str();
            match content.as_rule() {
                Rule::dbl_string_inner => raw.replace("\"\"", "\""),
                Rule::sgl_string_inner => raw.replace("''", "'"),
                _ => raw.to_string(),
            }
        }
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::ast::{Axis, CompOp, Expr, Literal, NodeTest, PathStart};
    use crate::runtime::ErrorKind;

    fn ast_of(expr: &str) -> Expr {
        compile(expr)
            .unwrap_or_else(|e| panic!("'{expr}' should compile: {e}"))
            .ast
    }

    #[test]
    fn literal_forms() {
        assert_eq!(ast_of("42"), Expr::Literal(Literal::Integer(42)));
        assert_eq!(ast_of("4.5"), Expr::Literal(Literal::Decimal(4.5)));
        assert_eq!(
            ast_of("'it''s'"),
            Expr::Literal(Literal::String("it's".to_string()))
        );
        assert_eq!(ast_of("()"), Expr::Sequence(Vec::new()));
    }

    #[test]
    fn comparison_kinds_are_distinguished() {
        match ast_of("1 = 2") {
            Expr::GeneralComparison { op, .. } => assert_eq!(op, CompOp::Eq),
            other => panic!("expected general comparison, got {other:?}"),
        }
        match ast_of("1 eq 2") {
            Expr::ValueComparison { op, .. } => assert_eq!(op, CompOp::Eq),
            other => panic!("expected value comparison, got {other:?}"),
        }
    }

    #[test]
    fn abbreviations_resolve_to_axes() {
        match ast_of("./@flag") {
            Expr::Path(p) => {
                assert_eq!(p.start, PathStart::Relative);
                assert_eq!(p.steps.len(), 2);
                assert_eq!(p.steps[0].axis, Axis::SelfAxis);
                assert_eq!(p.steps[1].axis, Axis::Flag);
            }
            other => panic!("expected path, got {other:?}"),
        }
        match ast_of("../field2") {
            Expr::Path(p) => {
                assert_eq!(p.steps[0].axis, Axis::Parent);
                assert_eq!(p.steps[0].test, NodeTest::AnyNode);
                assert_eq!(p.steps[1].axis, Axis::Child);
            }
            other => panic!("expected path, got {other:?}"),
        }
    }

    #[test]
    fn double_slash_desugars_to_descendant_or_self() {
        match ast_of("//field") {
            Expr::Path(p) => {
                assert_eq!(p.start, PathStart::Root);
                assert_eq!(p.steps[0].axis, Axis::DescendantOrSelf);
                assert_eq!(p.steps[0].test, NodeTest::AnyNode);
                assert_eq!(p.steps[1].axis, Axis::Child);
            }
            other => panic!("expected path, got {other:?}"),
        }
    }

    #[test]
    fn unary_minus_desugars_to_subtraction() {
        match ast_of("-5") {
            Expr::Arithmetic { left, .. } => {
                assert_eq!(*left, Expr::Literal(Literal::Integer(0)));
            }
            other => panic!("expected arithmetic, got {other:?}"),
        }
    }

    #[test]
    fn unsupported_productions_fail_loudly() {
        for expr in ["1 to 5", "a | b", "a union b", "a intersect b", "a except b"] {
            let err = compile(expr).unwrap_err();
            assert_eq!(
                err.kind,
                ErrorKind::UnsupportedConstruct,
                "'{expr}' should be rejected as unsupported, got {err}"
            );
        }
    }

    #[test]
    fn function_calls_keep_name_and_arity_unresolved() {
        match ast_of("fn:does-not-exist-yet(1, 2)") {
            Expr::FunctionCall { name, args } => {
                assert_eq!(name.prefix.as_deref(), Some("fn"));
                assert_eq!(name.local, "does-not-exist-yet");
                assert_eq!(args.len(), 2);
            }
            other => panic!("expected function call, got {other:?}"),
        }
    }
}
