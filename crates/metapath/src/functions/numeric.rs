//! Numeric and aggregation family: `avg`, `min`, `max`, `sum`, `number`.

use std::cmp::Ordering;

use crate::evaluator::{atomize, compare_atomic};
use crate::item::{AtomicValue, Sequence};
use crate::model::NodeItem;
use crate::runtime::{Error, ErrorKind, FunctionRegistry};

use super::{arg_or_context, zero_or_one};

pub(super) fn register<N: NodeItem>(reg: &mut FunctionRegistry<N>) {
    reg.register("min", 1, |_ctx, args| extremum(&args[0], Ordering::Less));
    reg.register("max", 1, |_ctx, args| extremum(&args[0], Ordering::Greater));

    reg.register("avg", 1, |_ctx, args| {
        let values = atomized(&args[0])?;
        if values.is_empty() {
            return Ok(Sequence::empty());
        }
        let avg = match aggregate(&values)? {
            Aggregate::Numeric(sum) => AtomicValue::Decimal(sum / values.len() as f64),
            Aggregate::Months(sum) => {
                AtomicValue::YearMonthDuration((sum / values.len() as i64) as i32)
            }
            Aggregate::Millis(sum) => {
                AtomicValue::DayTimeDuration(sum / values.len() as i64)
            }
        };
        Ok(Sequence::from(avg))
    });

    reg.register("sum", 1, |_ctx, args| {
        let values = atomized(&args[0])?;
        if values.is_empty() {
            return Ok(Sequence::from(AtomicValue::Integer(0)));
        }
        // An all-integer input keeps the integer type.
        if values
            .iter()
            .all(|v| matches!(v, AtomicValue::Integer(_)))
        {
            let mut total: i64 = 0;
            for v in &values {
                if let AtomicValue::Integer(i) = v {
                    total = total.checked_add(*i).ok_or_else(|| {
                        Error::new(ErrorKind::InvalidArgumentType, "integer overflow in sum()")
                    })?;
                }
            }
            return Ok(Sequence::from(AtomicValue::Integer(total)));
        }
        let sum = match aggregate(&values)? {
            Aggregate::Numeric(sum) => AtomicValue::Decimal(sum),
            Aggregate::Months(sum) => AtomicValue::YearMonthDuration(sum as i32),
            Aggregate::Millis(sum) => AtomicValue::DayTimeDuration(sum),
        };
        Ok(Sequence::from(sum))
    });

    reg.register_range("number", 0, Some(1), |ctx, args| {
        let seq = arg_or_context(ctx, args)?;
        let value = match zero_or_one(&seq, "number()")? {
            None => f64::NAN,
            Some(item) => match atomize(item)? {
                AtomicValue::Boolean(b) => {
                    if b {
                        1.0
                    } else {
                        0.0
                    }
                }
                other => other
                    .as_decimal()
                    .or_else(|| other.string_value().trim().parse::<f64>().ok())
                    .unwrap_or(f64::NAN),
            },
        };
        Ok(Sequence::from(AtomicValue::Decimal(value)))
    });
}

fn atomized<N: NodeItem>(seq: &Sequence<N>) -> Result<Vec<AtomicValue>, Error> {
    seq.iter().map(atomize).collect()
}

/// Shared `min`/`max` scan. Values compare on promoted decimals; the result
/// keeps the concrete type of the first operand achieving the extremum, so
/// only a strict improvement replaces the current best.
fn extremum<N: NodeItem>(
    seq: &Sequence<N>,
    wanted: Ordering,
) -> Result<Sequence<N>, Error> {
    let values = atomized(seq)?;
    let Some(first) = values.first() else {
        return Ok(Sequence::empty());
    };
    let mut best = first.clone();
    for candidate in &values[1..] {
        let ord = compare_atomic(candidate, &best).map_err(as_argument_error)?;
        if ord == wanted {
            best = candidate.clone();
        }
    }
    Ok(Sequence::from(best))
}

enum Aggregate {
    Numeric(f64),
    Months(i64),
    Millis(i64),
}

/// Sum a homogeneous value class; a mixed or non-additive input is an
/// argument type error.
fn aggregate(values: &[AtomicValue]) -> Result<Aggregate, Error> {
    let mut acc = match &values[0] {
        AtomicValue::YearMonthDuration(m) => Aggregate::Months(i64::from(*m)),
        AtomicValue::DayTimeDuration(ms) => Aggregate::Millis(*ms),
        other => Aggregate::Numeric(numeric_value(other)?),
    };
    for value in &values[1..] {
        match (&mut acc, value) {
            (Aggregate::Months(total), AtomicValue::YearMonthDuration(m)) => {
                *total += i64::from(*m);
            }
            (Aggregate::Millis(total), AtomicValue::DayTimeDuration(ms)) => {
                *total += ms;
            }
            (Aggregate::Numeric(total), other) => {
                *total += numeric_value(other)?;
            }
            _ => {
                return Err(Error::new(
                    ErrorKind::InvalidArgumentType,
                    format!(
                        "cannot aggregate {} with the preceding values",
                        value.type_name()
                    ),
                ));
            }
        }
    }
    Ok(acc)
}

fn numeric_value(value: &AtomicValue) -> Result<f64, Error> {
    value.as_decimal().ok_or_else(|| {
        Error::new(
            ErrorKind::InvalidArgumentType,
            format!("{} is not a numeric value", value.type_name()),
        )
    })
}

fn as_argument_error(err: Error) -> Error {
    Error::new(ErrorKind::InvalidArgumentType, err.message.clone())
}
