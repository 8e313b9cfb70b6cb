//! Named column transforms such as `rollingAverage day entityName cases 7`.
//!
//! A row whose operand is a sentinel gets that sentinel as its result. The
//! per-entity transforms expect rows sorted by entity then time.

mod arithmetic;
mod condition;
mod expression;
mod grouped;
mod operand;

pub use condition::{Comparison, Condition};
pub use expression::{TransformExpression, TransformName};

use chartable_model::{CellValue, ColumnStore, Result, TableError};

use crate::operand::{check_lengths, column};

fn invalid(expr: &TransformExpression, message: String) -> TableError {
    TableError::InvalidTransform {
        expression: expr.to_string(),
        message,
    }
}

fn parse_window(expr: &TransformExpression, raw: &str) -> Result<usize> {
    raw.parse()
        .map_err(|_| invalid(expr, format!("window size `{raw}` is not a non-negative integer")))
}

/// Evaluate `expr` against `store`.
///
/// Faults (missing column, malformed argument, columns of unequal length)
/// are errors; bad data becomes sentinels in the returned cells.
pub fn apply_transform(store: &ColumnStore, expr: &TransformExpression) -> Result<Vec<CellValue>> {
    let args: Vec<&str> = expr.args().iter().map(String::as_str).collect();
    tracing::trace!(transform = %expr, "applying transform");

    let out = match expr.name() {
        TransformName::DivideBy | TransformName::Subtract | TransformName::AsPercentageOf => {
            let left = column(store, args[0])?;
            let right = column(store, args[1])?;
            check_lengths(&[(args[0], left), (args[1], right)])?;
            let op = match expr.name() {
                TransformName::DivideBy => arithmetic::divide,
                TransformName::Subtract => arithmetic::subtract,
                _ => arithmetic::percentage_of,
            };
            arithmetic::binary(left, right, op)
        }
        TransformName::MultiplyBy => {
            let values = column(store, args[0])?;
            match args[1].parse::<f64>() {
                Ok(factor) => arithmetic::scale(values, factor),
                Err(_) => {
                    let factors = column(store, args[1])?;
                    check_lengths(&[(args[0], values), (args[1], factors)])?;
                    arithmetic::binary(values, factors, arithmetic::multiply)
                }
            }
        }
        TransformName::PercentChange
        | TransformName::RollingAverage
        | TransformName::TimeSinceEntityExceededThreshold => {
            let times = column(store, args[0])?;
            let entities = column(store, args[1])?;
            let values = column(store, args[2])?;
            check_lengths(&[(args[0], times), (args[1], entities), (args[2], values)])?;
            match expr.name() {
                TransformName::PercentChange => {
                    grouped::percent_change(times, entities, values, parse_window(expr, args[3])?)
                }
                TransformName::RollingAverage => {
                    grouped::rolling_average(times, entities, values, parse_window(expr, args[3])?)
                }
                _ => {
                    let threshold: f64 = args[3].parse().map_err(|_| {
                        invalid(expr, format!("threshold `{}` is not a number", args[3]))
                    })?;
                    grouped::time_since_threshold(times, entities, values, threshold)
                }
            }
        }
        TransformName::Where => {
            let values = column(store, args[0])?;
            let conditions = column(store, args[1])?;
            check_lengths(&[(args[0], values), (args[1], conditions)])?;
            let condition = Condition::parse(&expr.to_string(), args[2], &expr.args()[3..])?;
            condition::filter_where(values, conditions, &condition)
        }
        TransformName::Duplicate => column(store, args[0])?.to_vec(),
        TransformName::CumulativeSum => {
            let entities = column(store, args[0])?;
            let values = column(store, args[1])?;
            check_lengths(&[(args[0], entities), (args[1], values)])?;
            grouped::cumulative_sum(entities, values)
        }
    };
    Ok(out)
}

/// Parse `expression` and evaluate it against `store`.
pub fn apply_expression(store: &ColumnStore, expression: &str) -> Result<Vec<CellValue>> {
    apply_transform(store, &TransformExpression::parse(expression)?)
}
