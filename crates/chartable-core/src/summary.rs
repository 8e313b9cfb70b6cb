//! Summary statistics for a column.

use std::collections::HashMap;

use serde::Serialize;

use chartable_model::CellValue;

/// Statistics over a column's cells, computed once per column.
///
/// Numeric statistics are `None` when the column holds no real numbers.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnSummary {
    /// Cells with a real value.
    pub count: usize,
    /// Cells holding a sentinel.
    pub error_count: usize,
    pub unique_count: usize,
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub sum: Option<f64>,
    pub mean: Option<f64>,
    pub median: Option<f64>,
    /// Most frequent real value; ties go to the value seen first.
    pub mode: Option<CellValue>,
    /// p10 through p90, linearly interpolated.
    pub deciles: Vec<f64>,
    pub is_all_integers: bool,
}

/// Quantile of sorted values with linear interpolation between ranks.
pub fn quantile_sorted(sorted: &[f64], p: f64) -> Option<f64> {
    let (&first, &last) = (sorted.first()?, sorted.last()?);
    if p <= 0.0 || sorted.len() == 1 {
        return Some(first);
    }
    if p >= 1.0 {
        return Some(last);
    }
    let rank = (sorted.len() - 1) as f64 * p;
    let lower = rank.floor() as usize;
    let lower_value = sorted[lower];
    let upper_value = sorted[(lower + 1).min(sorted.len() - 1)];
    Some(lower_value + (upper_value - lower_value) * (rank - lower as f64))
}

impl ColumnSummary {
    pub fn from_cells(cells: &[CellValue]) -> Self {
        let mut summary = Self::default();
        let mut counts: HashMap<String, (usize, usize)> = HashMap::new();
        let mut numbers: Vec<f64> = Vec::new();

        for (index, cell) in cells.iter().enumerate() {
            if cell.is_error() {
                summary.error_count += 1;
                continue;
            }
            if !cell.is_real() {
                continue;
            }
            summary.count += 1;
            if let Some(n) = cell.as_number() {
                numbers.push(n);
            }
            let entry = counts.entry(cell.to_plain_string()).or_insert((0, index));
            entry.0 += 1;
        }

        summary.unique_count = counts.len();
        summary.mode = counts
            .values()
            .max_by(|(count_a, first_a), (count_b, first_b)| {
                count_a.cmp(count_b).then(first_b.cmp(first_a))
            })
            .map(|&(_, first)| cells[first].clone());

        if numbers.is_empty() {
            return summary;
        }
        numbers.sort_by(f64::total_cmp);
        let sum: f64 = numbers.iter().sum();
        summary.min = numbers.first().copied();
        summary.max = numbers.last().copied();
        summary.sum = Some(sum);
        summary.mean = Some(sum / numbers.len() as f64);
        summary.median = quantile_sorted(&numbers, 0.5);
        summary.deciles = (1..=9)
            .filter_map(|decile| quantile_sorted(&numbers, f64::from(decile) / 10.0))
            .collect();
        summary.is_all_integers = numbers.iter().all(|n| n.fract() == 0.0);
        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chartable_model::ErrorValue;

    #[test]
    fn test_numeric_summary() {
        let cells: Vec<CellValue> = [3.0, 1.0, 2.0, 2.0, 4.0]
            .into_iter()
            .map(CellValue::Number)
            .chain([CellValue::Error(ErrorValue::DivideByZero)])
            .collect();
        let summary = ColumnSummary::from_cells(&cells);
        assert_eq!(summary.count, 5);
        assert_eq!(summary.error_count, 1);
        assert_eq!(summary.unique_count, 4);
        assert_eq!(summary.min, Some(1.0));
        assert_eq!(summary.max, Some(4.0));
        assert_eq!(summary.sum, Some(12.0));
        assert_eq!(summary.mean, Some(2.4));
        assert_eq!(summary.median, Some(2.0));
        assert_eq!(summary.mode, Some(CellValue::Number(2.0)));
        assert_eq!(summary.deciles.len(), 9);
        assert!(summary.is_all_integers);
    }

    #[test]
    fn test_quantile_interpolates() {
        let sorted = [1.0, 2.0, 3.0, 4.0];
        assert_eq!(quantile_sorted(&sorted, 0.5), Some(2.5));
        assert_eq!(quantile_sorted(&sorted, 0.25), Some(1.75));
        assert_eq!(quantile_sorted(&[], 0.5), None);
    }

    #[test]
    fn test_text_summary_has_mode_only() {
        let cells = vec![CellValue::from("a"), CellValue::from("b"), CellValue::from("b")];
        let summary = ColumnSummary::from_cells(&cells);
        assert_eq!(summary.mode, Some(CellValue::from("b")));
        assert_eq!(summary.min, None);
        assert!(!summary.is_all_integers);
        assert!(summary.deciles.is_empty());
    }

    #[test]
    fn test_mode_ties_go_to_first_seen() {
        let cells = vec![CellValue::from("x"), CellValue::from("y")];
        assert_eq!(ColumnSummary::from_cells(&cells).mode, Some(CellValue::from("x")));
    }
}
