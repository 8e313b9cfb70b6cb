//! Row-wise arithmetic between columns.

use chartable_model::{CellValue, ErrorValue};

use crate::operand::numeric;

/// Combine two columns row by row. The first non-numeric operand of a row is
/// the result for that row.
pub(crate) fn binary<F>(left: &[CellValue], right: &[CellValue], op: F) -> Vec<CellValue>
where
    F: Fn(f64, f64) -> CellValue,
{
    left.iter()
        .zip(right)
        .map(|(a, b)| match (numeric(a), numeric(b)) {
            (Err(sentinel), _) | (_, Err(sentinel)) => sentinel,
            (Ok(a), Ok(b)) => op(a, b),
        })
        .collect()
}

pub(crate) fn divide(a: f64, b: f64) -> CellValue {
    if b == 0.0 {
        ErrorValue::DivideByZero.into()
    } else {
        CellValue::Number(a / b)
    }
}

pub(crate) fn percentage_of(a: f64, b: f64) -> CellValue {
    match divide(a, b) {
        CellValue::Number(ratio) => CellValue::Number(ratio * 100.0),
        other => other,
    }
}

pub(crate) fn subtract(a: f64, b: f64) -> CellValue {
    CellValue::Number(a - b)
}

pub(crate) fn multiply(a: f64, b: f64) -> CellValue {
    CellValue::Number(a * b)
}

/// Multiply every cell by a constant.
pub(crate) fn scale(values: &[CellValue], factor: f64) -> Vec<CellValue> {
    values
        .iter()
        .map(|cell| match numeric(cell) {
            Ok(v) => CellValue::Number(v * factor),
            Err(sentinel) => sentinel,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cells(values: &[f64]) -> Vec<CellValue> {
        values.iter().copied().map(CellValue::Number).collect()
    }

    #[test]
    fn test_divide_by_zero_is_a_sentinel() {
        let out = binary(&cells(&[1.0, 4.0]), &cells(&[0.0, 2.0]), divide);
        assert_eq!(out, vec![CellValue::Error(ErrorValue::DivideByZero), CellValue::Number(2.0)]);
    }

    #[test]
    fn test_first_sentinel_wins() {
        let left = vec![CellValue::Error(ErrorValue::ValueTooLow)];
        let right = vec![CellValue::Error(ErrorValue::FilteredOut)];
        assert_eq!(binary(&left, &right, subtract), left);
        assert_eq!(
            binary(&cells(&[1.0]), &right, subtract),
            right
        );
    }

    #[test]
    fn test_percentage_of() {
        assert_eq!(percentage_of(1.0, 4.0), CellValue::Number(25.0));
        assert_eq!(percentage_of(1.0, 0.0), CellValue::Error(ErrorValue::DivideByZero));
    }

    #[test]
    fn test_scale_passes_sentinels_through() {
        let input = vec![CellValue::Number(2.0), CellValue::Null];
        assert_eq!(
            scale(&input, 1.5),
            vec![CellValue::Number(3.0), CellValue::Error(ErrorValue::NullButShouldBeNumber)]
        );
    }
}
