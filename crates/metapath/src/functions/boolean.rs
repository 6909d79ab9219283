//! Boolean family: `true`, `false`, `boolean`, `not`.

use crate::evaluator::effective_boolean_value;
use crate::item::AtomicValue;
use crate::item::Sequence;
use crate::model::NodeItem;
use crate::runtime::FunctionRegistry;

use super::boolean_result;

pub(super) fn register<N: NodeItem>(reg: &mut FunctionRegistry<N>) {
    reg.register("true", 0, |_ctx, _args| {
        Ok(Sequence::from(AtomicValue::Boolean(true)))
    });
    reg.register("false", 0, |_ctx, _args| {
        Ok(Sequence::from(AtomicValue::Boolean(false)))
    });
    reg.register("boolean", 1, |_ctx, args| {
        boolean_result(effective_boolean_value(&args[0])?)
    });
    reg.register("not", 1, |_ctx, args| {
        boolean_result(!effective_boolean_value(&args[0])?)
    });
}
