//! Built-in function library.
//!
//! Registration conventions:
//! - One registration per function using arity ranges; dispatch inside the
//!   closure on `args.len()` for optional parameters.
//! - `register_variadic` for truly variadic families (`concat`).
//! - Helpers suffixed `_default` share logic across arities.

mod boolean;
mod documents;
mod numeric;
mod sequences;
mod strings;

use crate::item::{AtomicValue, Item, Sequence};
use crate::model::NodeItem;
use crate::runtime::{CallCtx, Error, ErrorKind, FunctionRegistry};

/// The table every fresh dynamic context starts from. Assembled once per
/// context, never mutated afterwards.
pub fn default_function_registry<N: NodeItem>() -> FunctionRegistry<N> {
    let mut reg: FunctionRegistry<N> = FunctionRegistry::new();
    boolean::register(&mut reg);
    strings::register(&mut reg);
    numeric::register(&mut reg);
    sequences::register(&mut reg);
    documents::register(&mut reg);
    reg
}

/// String form of a whole argument sequence: item string values concatenated,
/// the empty sequence contributing nothing.
pub(crate) fn item_to_string<N: NodeItem>(seq: &Sequence<N>) -> Result<String, Error> {
    let mut out = String::new();
    for item in seq {
        out.push_str(&item.string_value()?);
    }
    Ok(out)
}

/// Zero-or-one argument sequences: empty passes through as `None`, anything
/// longer than one item is an argument type error.
pub(crate) fn zero_or_one<'a, N: NodeItem>(
    seq: &'a Sequence<N>,
    what: &str,
) -> Result<Option<&'a Item<N>>, Error> {
    match seq.len() {
        0 => Ok(None),
        1 => Ok(seq.first()),
        n => Err(Error::new(
            ErrorKind::InvalidArgumentType,
            format!("{what} expects at most one item, got {n}"),
        )),
    }
}

/// The implicit argument of the zero-arity string accessors: the argument
/// sequence when present, otherwise the context item.
pub(crate) fn arg_or_context<N: NodeItem>(
    ctx: &CallCtx<'_, N>,
    args: &[Sequence<N>],
) -> Result<Sequence<N>, Error> {
    match args.first() {
        Some(seq) => Ok(seq.clone()),
        None => {
            let focus = ctx.focus.ok_or_else(|| {
                Error::new(
                    ErrorKind::ContextAbsent,
                    "the context item is absent here",
                )
            })?;
            Ok(Sequence::singleton(focus.item.clone()))
        }
    }
}

pub(crate) fn boolean_result<N: NodeItem>(b: bool) -> Result<Sequence<N>, Error> {
    Ok(Sequence::from(AtomicValue::Boolean(b)))
}
