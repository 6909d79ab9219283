//! String family: `concat`, `string`, `starts-with`, `ends-with`,
//! `contains`, `string-length`, `normalize-space`.

use itertools::Itertools;

use crate::item::{AtomicValue, Sequence};
use crate::model::NodeItem;
use crate::runtime::{CallCtx, Error, FunctionRegistry};

use super::{arg_or_context, boolean_result, item_to_string, zero_or_one};

pub(super) fn register<N: NodeItem>(reg: &mut FunctionRegistry<N>) {
    // Each operand contributes its string form; an empty operand sequence
    // contributes nothing.
    reg.register_variadic("concat", 2, |_ctx, args| {
        let mut out = String::new();
        for arg in args {
            out.push_str(&item_to_string(arg)?);
        }
        Ok(Sequence::from(AtomicValue::String(out)))
    });

    reg.register_range("string", 0, Some(1), |ctx, args| {
        Ok(Sequence::from(AtomicValue::String(string_default(
            ctx, args,
        )?)))
    });

    reg.register("starts-with", 2, |_ctx, args| {
        let s = item_to_string(&args[0])?;
        let sub = item_to_string(&args[1])?;
        boolean_result(s.starts_with(&sub))
    });
    reg.register("ends-with", 2, |_ctx, args| {
        let s = item_to_string(&args[0])?;
        let sub = item_to_string(&args[1])?;
        boolean_result(s.ends_with(&sub))
    });
    reg.register("contains", 2, |_ctx, args| {
        let s = item_to_string(&args[0])?;
        let sub = item_to_string(&args[1])?;
        boolean_result(s.contains(&sub))
    });

    reg.register_range("string-length", 0, Some(1), |ctx, args| {
        let s = string_default(ctx, args)?;
        Ok(Sequence::from(AtomicValue::Integer(
            s.chars().count() as i64
        )))
    });

    reg.register_range("normalize-space", 0, Some(1), |ctx, args| {
        let s = string_default(ctx, args)?;
        let normalized = s.split_whitespace().join(" ");
        Ok(Sequence::from(AtomicValue::String(normalized)))
    });
}

/// `string()` semantics shared by the accessors: the explicit argument or
/// the context item; empty becomes the empty string, more than one item is
/// an error.
fn string_default<N: NodeItem>(
    ctx: &CallCtx<'_, N>,
    args: &[Sequence<N>],
) -> Result<String, Error> {
    let seq = arg_or_context(ctx, args)?;
    match zero_or_one(&seq, "string()")? {
        Some(item) => item.string_value(),
        None => Ok(String::new()),
    }
}
