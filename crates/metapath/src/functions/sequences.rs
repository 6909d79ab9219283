//! Sequence and node accessors: `count`, `empty`, `exists`, `data`, `name`.

use crate::evaluator::atomize;
use crate::item::{AtomicValue, Item, Sequence};
use crate::model::NodeItem;
use crate::runtime::{Error, ErrorKind, FunctionRegistry};

use super::{arg_or_context, boolean_result, zero_or_one};

pub(super) fn register<N: NodeItem>(reg: &mut FunctionRegistry<N>) {
    reg.register("count", 1, |_ctx, args| {
        Ok(Sequence::from(AtomicValue::Integer(args[0].len() as i64)))
    });
    reg.register("empty", 1, |_ctx, args| boolean_result(args[0].is_empty()));
    reg.register("exists", 1, |_ctx, args| boolean_result(!args[0].is_empty()));

    // data() / data($seq): atomize every item.
    reg.register_range("data", 0, Some(1), |ctx, args| {
        let seq = arg_or_context(ctx, args)?;
        let mut out = Sequence::empty();
        for item in &seq {
            out.push(Item::Atomic(atomize(item)?));
        }
        Ok(out)
    });

    // name() / name($node): the effective name, or the empty string for
    // unnamed nodes.
    reg.register_range("name", 0, Some(1), |ctx, args| {
        let seq = arg_or_context(ctx, args)?;
        let name = match zero_or_one(&seq, "name()")? {
            None => String::new(),
            Some(Item::Node(node)) => node.name().unwrap_or_default().to_string(),
            Some(Item::Atomic(a)) => {
                return Err(Error::new(
                    ErrorKind::InvalidArgumentType,
                    format!("name() requires a node, got {}", a.type_name()),
                ));
            }
        };
        Ok(Sequence::from(AtomicValue::String(name)))
    });
}
