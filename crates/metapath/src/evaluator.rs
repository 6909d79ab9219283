//! Recursive tree-walking interpreter.
//!
//! Evaluation of any expression against a focus and a dynamic context yields
//! a result sequence. The focus is an explicit parameter on every call; a
//! nested predicate or path evaluation builds its own focus and the caller's
//! frame is untouched. Failures abort the whole evaluation call; there is no
//! retry and no partial result.

use std::cmp::Ordering;

use crate::item::{AtomicValue, Item, Sequence};
use crate::model::NodeItem;
use crate::parser::ast::{ArithOp, Axis, CompOp, Expr, Literal, NodeTest, PathExpr, PathStart, Step};
use crate::runtime::{CallCtx, DynamicContext, Error, ErrorKind, Focus, StaticContext};

/// Entry point used by [`crate::MetapathExpression::evaluate`].
pub(crate) fn evaluate<N: NodeItem>(
    expr: &Expr,
    static_ctx: &StaticContext,
    dyn_ctx: &DynamicContext<N>,
    focus_item: Option<Item<N>>,
) -> Result<Sequence<N>, Error> {
    let ctx = EvalCtx {
        static_ctx,
        dyn_ctx,
    };
    let focus = focus_item.map(|item| Focus::new(item, 1, 1));
    eval_expr(expr, &ctx, focus.as_ref())
}

struct EvalCtx<'a, N: NodeItem> {
    static_ctx: &'a StaticContext,
    dyn_ctx: &'a DynamicContext<N>,
}

fn eval_expr<N: NodeItem>(
    expr: &Expr,
    ctx: &EvalCtx<'_, N>,
    focus: Option<&Focus<N>>,
) -> Result<Sequence<N>, Error> {
    match expr {
        Expr::Literal(lit) => Ok(Sequence::from(literal_value(lit))),
        Expr::VarRef(name) => {
            let key = name.local.as_str();
            ctx.dyn_ctx.variables.get(key).cloned().ok_or_else(|| {
                Error::new(
                    ErrorKind::UndefinedVariable,
                    format!("variable '${key}' is not bound"),
                )
            })
        }
        Expr::ContextItem => {
            let focus = require_focus(focus)?;
            Ok(Sequence::singleton(focus.item.clone()))
        }
        Expr::Sequence(exprs) => {
            let mut out = Sequence::empty();
            for e in exprs {
                out.extend(eval_expr(e, ctx, focus)?);
            }
            Ok(out)
        }
        Expr::And(operands) => {
            for op in operands {
                let value = eval_expr(op, ctx, focus)?;
                if !effective_boolean_value(&value)? {
                    return Ok(Sequence::from(AtomicValue::Boolean(false)));
                }
            }
            Ok(Sequence::from(AtomicValue::Boolean(true)))
        }
        Expr::Or(operands) => {
            for op in operands {
                let value = eval_expr(op, ctx, focus)?;
                if effective_boolean_value(&value)? {
                    return Ok(Sequence::from(AtomicValue::Boolean(true)));
                }
            }
            Ok(Sequence::from(AtomicValue::Boolean(false)))
        }
        Expr::GeneralComparison { left, op, right } => {
            let lhs = eval_expr(left, ctx, focus)?;
            let rhs = eval_expr(right, ctx, focus)?;
            // Either operand empty: the comparison itself is empty, not false.
            if lhs.is_empty() || rhs.is_empty() {
                return Ok(Sequence::empty());
            }
            for l in &lhs {
                let lv = atomize(l)?;
                for r in &rhs {
                    let rv = atomize(r)?;
                    if apply_comp_op(*op, compare_atomic(&lv, &rv)?) {
                        return Ok(Sequence::from(AtomicValue::Boolean(true)));
                    }
                }
            }
            Ok(Sequence::from(AtomicValue::Boolean(false)))
        }
        Expr::ValueComparison { left, op, right } => {
            let lhs = eval_expr(left, ctx, focus)?;
            let rhs = eval_expr(right, ctx, focus)?;
            if lhs.is_empty() || rhs.is_empty() {
                return Ok(Sequence::empty());
            }
            let (Some(l), Some(r)) = (lhs.as_singleton(), rhs.as_singleton()) else {
                return Err(Error::invalid_type(
                    "value comparison requires singleton operands",
                ));
            };
            let ord = compare_atomic(&atomize(l)?, &atomize(r)?)?;
            Ok(Sequence::from(AtomicValue::Boolean(apply_comp_op(*op, ord))))
        }
        Expr::Arithmetic { left, op, right } => {
            let lhs = eval_expr(left, ctx, focus)?;
            let rhs = eval_expr(right, ctx, focus)?;
            if lhs.is_empty() || rhs.is_empty() {
                return Ok(Sequence::empty());
            }
            let (Some(l), Some(r)) = (lhs.as_singleton(), rhs.as_singleton()) else {
                return Err(Error::invalid_type(
                    "arithmetic requires singleton operands",
                ));
            };
            let value = apply_arith_op(*op, &atomize(l)?, &atomize(r)?)?;
            Ok(Sequence::from(value))
        }
        Expr::StringConcat(operands) => {
            let mut out = String::new();
            for op in operands {
                let value = eval_expr(op, ctx, focus)?;
                for item in &value {
                    out.push_str(&item.string_value()?);
                }
            }
            Ok(Sequence::from(AtomicValue::String(out)))
        }
        Expr::FunctionCall { name, args } => {
            let f = ctx.dyn_ctx.functions.resolve(&name.local, args.len())?;
            let mut arg_values = Vec::with_capacity(args.len());
            for arg in args {
                arg_values.push(eval_expr(arg, ctx, focus)?);
            }
            let call_ctx = CallCtx {
                static_ctx: ctx.static_ctx,
                dyn_ctx: ctx.dyn_ctx,
                focus,
            };
            tracing::trace!(function = name.local.as_str(), arity = args.len(), "calling");
            f(&call_ctx, &arg_values)
        }
        Expr::Path(path) => eval_path(path, ctx, focus),
        Expr::Predicate { base, predicates } => {
            let input = eval_expr(base, ctx, focus)?;
            apply_predicates(input, predicates, ctx)
        }
    }
}

fn literal_value(lit: &Literal) -> AtomicValue {
    match lit {
        Literal::Integer(i) => AtomicValue::Integer(*i),
        Literal::Decimal(d) => AtomicValue::Decimal(*d),
        Literal::String(s) => AtomicValue::String(s.clone()),
    }
}

fn require_focus<'a, N>(focus: Option<&'a Focus<N>>) -> Result<&'a Focus<N>, Error> {
    focus.ok_or_else(|| {
        Error::new(
            ErrorKind::ContextAbsent,
            "the context item is absent here",
        )
    })
}

// ---------------------------------------------------------------------------
// Paths, axes, predicates
// ---------------------------------------------------------------------------

fn eval_path<N: NodeItem>(
    path: &PathExpr,
    ctx: &EvalCtx<'_, N>,
    focus: Option<&Focus<N>>,
) -> Result<Sequence<N>, Error> {
    let mut current = match (&path.start, &path.input) {
        (_, Some(input)) => eval_expr(input, ctx, focus)?,
        (PathStart::Root, None) => {
            let focus = require_focus(focus)?;
            let Item::Node(node) = &focus.item else {
                return Err(Error::invalid_type(
                    "a rooted path requires a node context item",
                ));
            };
            Sequence::singleton(Item::Node(document_root(node)))
        }
        (PathStart::Relative, None) => {
            let focus = require_focus(focus)?;
            Sequence::singleton(focus.item.clone())
        }
    };
    for step in &path.steps {
        current = eval_step(&current, step, ctx)?;
        if current.is_empty() {
            break;
        }
    }
    Ok(current)
}

fn document_root<N: NodeItem>(node: &N) -> N {
    let mut current = node.clone();
    while let Some(parent) = current.parent() {
        current = parent;
    }
    current
}

/// Apply one step to every context node, preserving axis order per context
/// node and concatenating the per-node results.
fn eval_step<N: NodeItem>(
    context: &Sequence<N>,
    step: &Step,
    ctx: &EvalCtx<'_, N>,
) -> Result<Sequence<N>, Error> {
    let mut out = Sequence::empty();
    for item in context {
        let Item::Node(node) = item else {
            return Err(Error::invalid_type(
                "a path step cannot be applied to an atomic value",
            ));
        };
        let candidates: Vec<Item<N>> = axis_nodes(node, step.axis)
            .into_iter()
            .filter(|n| matches_test(n, &step.test))
            .map(Item::Node)
            .collect();
        let filtered = apply_predicates(Sequence::of(candidates), &step.predicates, ctx)?;
        out.extend(filtered);
    }
    Ok(out)
}

fn axis_nodes<N: NodeItem>(node: &N, axis: Axis) -> Vec<N> {
    match axis {
        Axis::Child => node.children(),
        Axis::Descendant => {
            let mut out = Vec::new();
            collect_descendants(node, &mut out);
            out
        }
        Axis::DescendantOrSelf => {
            let mut out = vec![node.clone()];
            collect_descendants(node, &mut out);
            out
        }
        Axis::Parent => node.parent().into_iter().collect(),
        Axis::Ancestor => {
            let mut out = Vec::new();
            let mut current = node.parent();
            while let Some(p) = current {
                current = p.parent();
                out.push(p);
            }
            out
        }
        Axis::AncestorOrSelf => {
            let mut out = vec![node.clone()];
            let mut current = node.parent();
            while let Some(p) = current {
                current = p.parent();
                out.push(p);
            }
            out
        }
        Axis::SelfAxis => vec![node.clone()],
        Axis::Flag => node.flags(),
    }
}

fn collect_descendants<N: NodeItem>(node: &N, out: &mut Vec<N>) {
    for child in node.children() {
        out.push(child.clone());
        collect_descendants(&child, out);
    }
}

fn matches_test<N: NodeItem>(node: &N, test: &NodeTest) -> bool {
    match test {
        NodeTest::AnyNode => true,
        NodeTest::Wildcard => node.name().is_some(),
        NodeTest::Name(name) => node.name() == Some(name.local.as_str()),
    }
}

/// Filter a candidate sequence through predicate expressions. Each predicate
/// sees a fresh focus per candidate (1-based position, total size); a
/// singleton numeric result is the positional shorthand, anything else goes
/// through the effective boolean value. Skipped wholesale when predicate
/// evaluation is disabled.
fn apply_predicates<N: NodeItem>(
    input: Sequence<N>,
    predicates: &[Expr],
    ctx: &EvalCtx<'_, N>,
) -> Result<Sequence<N>, Error> {
    if predicates.is_empty() || ctx.dyn_ctx.predicates_disabled() {
        return Ok(input);
    }
    let mut current: Vec<Item<N>> = input.into_iter().collect();
    for predicate in predicates {
        let size = current.len();
        let mut kept = Vec::with_capacity(size);
        for (idx, item) in current.into_iter().enumerate() {
            let position = idx + 1;
            let focus = Focus::new(item.clone(), position, size);
            let value = eval_expr(predicate, ctx, Some(&focus))?;
            if predicate_keeps(&value, position)? {
                kept.push(item);
            }
        }
        current = kept;
    }
    Ok(Sequence::of(current))
}

fn predicate_keeps<N: NodeItem>(value: &Sequence<N>, position: usize) -> Result<bool, Error> {
    if let Some(Item::Atomic(atomic)) = value.as_singleton() {
        match atomic {
            AtomicValue::Integer(n) => return Ok(*n == position as i64),
            AtomicValue::Decimal(d) => return Ok(*d == position as f64),
            _ => {}
        }
    }
    effective_boolean_value(value)
}

// ---------------------------------------------------------------------------
// Coercion and comparison
// ---------------------------------------------------------------------------

/// Effective boolean value of a sequence: empty is false; a sequence whose
/// first item is a node is true; a single atomic decides by its own rule;
/// everything else is a type error.
pub(crate) fn effective_boolean_value<N: NodeItem>(seq: &Sequence<N>) -> Result<bool, Error> {
    match seq.first() {
        None => Ok(false),
        Some(Item::Node(_)) => Ok(true),
        Some(Item::Atomic(atomic)) => {
            if seq.len() > 1 {
                return Err(Error::invalid_type(
                    "effective boolean value of a multi-item atomic sequence",
                ));
            }
            atomic.boolean_value()
        }
    }
}

pub(crate) fn atomize<N: NodeItem>(item: &Item<N>) -> Result<AtomicValue, Error> {
    match item {
        Item::Atomic(a) => Ok(a.clone()),
        Item::Node(n) => n.to_atomic(),
    }
}

fn apply_comp_op(op: CompOp, ord: Ordering) -> bool {
    match op {
        CompOp::Eq => ord == Ordering::Equal,
        CompOp::Ne => ord != Ordering::Equal,
        CompOp::Lt => ord == Ordering::Less,
        CompOp::Le => ord != Ordering::Greater,
        CompOp::Gt => ord == Ordering::Greater,
        CompOp::Ge => ord != Ordering::Less,
    }
}

/// Datatype-directed ordering of two atomic values. Numeric operands compare
/// on promoted decimal values; untyped atomics coerce to the other side's
/// family; incomparable pairs are a type error.
pub(crate) fn compare_atomic(a: &AtomicValue, b: &AtomicValue) -> Result<Ordering, Error> {
    if a.is_numeric() || b.is_numeric() {
        if let (Some(x), Some(y)) = (a.as_decimal(), b.as_decimal()) {
            return x.partial_cmp(&y).ok_or_else(|| {
                Error::invalid_type("NaN is not comparable")
            });
        }
        return Err(incomparable(a, b));
    }
    match (a, b) {
        (AtomicValue::Boolean(x), AtomicValue::Boolean(y)) => Ok(x.cmp(y)),
        (AtomicValue::Uuid(x), AtomicValue::Uuid(y)) => Ok(x.cmp(y)),
        (AtomicValue::Date { date: x, .. }, AtomicValue::Date { date: y, .. }) => Ok(x.cmp(y)),
        (AtomicValue::DateTime(x), AtomicValue::DateTime(y)) => Ok(x.cmp(y)),
        (AtomicValue::YearMonthDuration(x), AtomicValue::YearMonthDuration(y)) => Ok(x.cmp(y)),
        (AtomicValue::DayTimeDuration(x), AtomicValue::DayTimeDuration(y)) => Ok(x.cmp(y)),
        (
            AtomicValue::String(_) | AtomicValue::AnyUri(_) | AtomicValue::UntypedAtomic(_),
            AtomicValue::String(_) | AtomicValue::AnyUri(_) | AtomicValue::UntypedAtomic(_),
        ) => Ok(a.string_value().cmp(&b.string_value())),
        // Untyped meets a typed non-numeric value: compare on string forms.
        (AtomicValue::UntypedAtomic(x), other) => Ok(x.cmp(&other.string_value())),
        (other, AtomicValue::UntypedAtomic(y)) => Ok(other.string_value().cmp(y)),
        _ => Err(incomparable(a, b)),
    }
}

fn incomparable(a: &AtomicValue, b: &AtomicValue) -> Error {
    Error::invalid_type(format!(
        "cannot compare {} to {}",
        a.type_name(),
        b.type_name()
    ))
}

fn apply_arith_op(op: ArithOp, a: &AtomicValue, b: &AtomicValue) -> Result<AtomicValue, Error> {
    let (Some(x), Some(y)) = (a.as_decimal(), b.as_decimal()) else {
        return Err(Error::invalid_type(format!(
            "arithmetic is not defined between {} and {}",
            a.type_name(),
            b.type_name()
        )));
    };
    let both_integers = matches!(a, AtomicValue::Integer(_)) && matches!(b, AtomicValue::Integer(_));
    match op {
        // Division always yields a decimal, even between integers.
        ArithOp::Div => {
            if y == 0.0 {
                return Err(Error::invalid_type("division by zero"));
            }
            Ok(AtomicValue::Decimal(x / y))
        }
        ArithOp::IDiv => {
            if y == 0.0 {
                return Err(Error::invalid_type("division by zero"));
            }
            Ok(AtomicValue::Integer((x / y).trunc() as i64))
        }
        ArithOp::Mod => {
            if y == 0.0 {
                return Err(Error::invalid_type("division by zero"));
            }
            if both_integers {
                Ok(AtomicValue::Integer((x % y) as i64))
            } else {
                Ok(AtomicValue::Decimal(x % y))
            }
        }
        ArithOp::Add | ArithOp::Sub | ArithOp::Mul => {
            if both_integers {
                let (AtomicValue::Integer(i), AtomicValue::Integer(j)) = (a, b) else {
                    return Err(Error::invalid_type("integer operands expected"));
                };
                let result = match op {
                    ArithOp::Add => i.checked_add(*j),
                    ArithOp::Sub => i.checked_sub(*j),
                    _ => i.checked_mul(*j),
                };
                result.map(AtomicValue::Integer).ok_or_else(|| {
                    Error::invalid_type("integer overflow")
                })
            } else {
                let result = match op {
                    ArithOp::Add => x + y,
                    ArithOp::Sub => x - y,
                    _ => x * y,
                };
                Ok(AtomicValue::Decimal(result))
            }
        }
    }
}
