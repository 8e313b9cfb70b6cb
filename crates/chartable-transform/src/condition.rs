//! The `where` transform: keep a value only when a condition column passes.

use std::str::FromStr;

use chartable_model::{CellValue, ErrorValue, Result, TableError};

use crate::operand::numeric;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparison {
    IsGreaterThan,
    IsGreaterThanOrEqual,
    IsLessThan,
    IsLessThanOrEqual,
    Is,
    IsNot,
}

impl FromStr for Comparison {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(match s {
            "isGreaterThan" => Comparison::IsGreaterThan,
            "isGreaterThanOrEqual" => Comparison::IsGreaterThanOrEqual,
            "isLessThan" => Comparison::IsLessThan,
            "isLessThanOrEqual" => Comparison::IsLessThanOrEqual,
            "is" => Comparison::Is,
            "isNot" => Comparison::IsNot,
            other => return Err(format!("unknown comparison operator `{other}`")),
        })
    }
}

/// A comparison against a literal operand.
#[derive(Debug, Clone, PartialEq)]
pub struct Condition {
    pub comparison: Comparison,
    pub operand: String,
    numeric_operand: Option<f64>,
}

impl Condition {
    /// Build a condition from `operator operand...`. Ordering comparisons
    /// require a numeric operand.
    pub fn parse(expression: &str, operator: &str, operand: &[String]) -> Result<Self> {
        let invalid = |message: String| TableError::InvalidTransform {
            expression: expression.to_string(),
            message,
        };
        let comparison: Comparison = operator.parse().map_err(invalid)?;
        let operand = operand.join(" ");
        let numeric_operand = operand.parse::<f64>().ok();
        let ordered = !matches!(comparison, Comparison::Is | Comparison::IsNot);
        if ordered && numeric_operand.is_none() {
            return Err(invalid(format!("`{operator}` needs a numeric operand, got `{operand}`")));
        }
        Ok(Self {
            comparison,
            operand,
            numeric_operand,
        })
    }

    /// Test a condition cell. A sentinel condition cell is returned as the error.
    fn test(&self, cell: &CellValue) -> std::result::Result<bool, CellValue> {
        match self.comparison {
            Comparison::Is | Comparison::IsNot => {
                if cell.is_error() {
                    return Err(cell.clone());
                }
                let equal = match (cell.as_number(), self.numeric_operand) {
                    (Some(value), Some(operand)) => value == operand,
                    _ => cell.to_plain_string() == self.operand,
                };
                Ok(equal == (self.comparison == Comparison::Is))
            }
            ordered => {
                let value = numeric(cell)?;
                let operand = self.numeric_operand.unwrap_or(f64::NAN);
                Ok(match ordered {
                    Comparison::IsGreaterThan => value > operand,
                    Comparison::IsGreaterThanOrEqual => value >= operand,
                    Comparison::IsLessThan => value < operand,
                    _ => value <= operand,
                })
            }
        }
    }
}

/// Values from `values` where the condition holds; [`ErrorValue::FilteredOut`]
/// elsewhere. A sentinel value or condition cell propagates unchanged.
pub(crate) fn filter_where(
    values: &[CellValue],
    conditions: &[CellValue],
    condition: &Condition,
) -> Vec<CellValue> {
    values
        .iter()
        .zip(conditions)
        .map(|(value, cell)| {
            if value.is_error() {
                return value.clone();
            }
            match condition.test(cell) {
                Ok(true) => value.clone(),
                Ok(false) => CellValue::Error(ErrorValue::FilteredOut),
                Err(sentinel) => sentinel,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn condition(op: &str, operand: &str) -> Condition {
        Condition::parse("where", op, &[operand.to_string()]).unwrap()
    }

    #[test]
    fn test_ordered_comparisons() {
        let values = vec![CellValue::from("x"), CellValue::from("y"), CellValue::from("z")];
        let years = vec![CellValue::from(1999), CellValue::from(2000), CellValue::from(2001)];
        let filtered = CellValue::Error(ErrorValue::FilteredOut);

        assert_eq!(
            filter_where(&values, &years, &condition("isGreaterThan", "2000")),
            vec![filtered.clone(), filtered.clone(), CellValue::from("z")]
        );
        assert_eq!(
            filter_where(&values, &years, &condition("isLessThanOrEqual", "2000")),
            vec![CellValue::from("x"), CellValue::from("y"), filtered]
        );
    }

    #[test]
    fn test_is_and_is_not_compare_text() {
        let values = vec![CellValue::from(1), CellValue::from(2)];
        let regions = vec![CellValue::from("Europe"), CellValue::from("Asia")];
        assert_eq!(
            filter_where(&values, &regions, &condition("is", "Asia")),
            vec![CellValue::Error(ErrorValue::FilteredOut), CellValue::from(2)]
        );
        assert_eq!(
            filter_where(&values, &regions, &condition("isNot", "Asia")),
            vec![CellValue::from(1), CellValue::Error(ErrorValue::FilteredOut)]
        );
    }

    #[test]
    fn test_sentinels_propagate() {
        let values = vec![CellValue::Error(ErrorValue::ValueTooLow), CellValue::from(5)];
        let conditions = vec![CellValue::from(10), CellValue::Error(ErrorValue::DivideByZero)];
        assert_eq!(
            filter_where(&values, &conditions, &condition("isGreaterThan", "0")),
            vec![
                CellValue::Error(ErrorValue::ValueTooLow),
                CellValue::Error(ErrorValue::DivideByZero),
            ]
        );
    }

    #[test]
    fn test_invalid_conditions() {
        assert!(Condition::parse("e", "isAbout", &["1".to_string()]).is_err());
        assert!(Condition::parse("e", "isGreaterThan", &["abc".to_string()]).is_err());
        assert!(Condition::parse("e", "is", &["abc".to_string()]).is_ok());
    }
}
