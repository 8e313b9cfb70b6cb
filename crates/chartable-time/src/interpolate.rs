//! Tolerance-bounded gap filling.

use chartable_model::{CellValue, ErrorValue, Row, Time};

fn has_value(row: &Row, value_key: &str) -> bool {
    row.get(value_key).is_some_and(CellValue::is_real)
}

fn time_of(row: &Row, time_key: &str) -> Option<Time> {
    row.get(time_key)
        .and_then(CellValue::as_number)
        .map(|t| t as Time)
}

/// Fill missing values in `rows` (sorted by time ascending, one entity) from
/// the nearest row with a real value no more than `tolerance` time units away.
///
/// A filled row takes the neighbour's value and the neighbour's time under
/// `time_key`, so the value keeps pointing at where it came from. When the
/// previous and next candidates are equally far away the later one wins.
/// Rows with nothing in range get [`ErrorValue::NoValueWithinTolerance`].
/// A tolerance of zero disables filling and returns the rows unchanged.
pub fn interpolate_row_values_with_tolerance(
    rows: &[Row],
    value_key: &str,
    time_key: &str,
    tolerance: Time,
) -> Vec<Row> {
    let mut out = rows.to_vec();
    if tolerance <= 0 || rows.is_empty() {
        return out;
    }
    let tolerance = tolerance.unsigned_abs();

    let mut prev: Option<usize> = None;
    let mut next: Option<usize> = None;
    let mut filled = 0usize;

    for (index, row) in rows.iter().enumerate() {
        if has_value(row, value_key) {
            prev = Some(index);
            continue;
        }
        let Some(current_time) = time_of(row, time_key) else {
            continue;
        };
        if next.is_some_and(|n| n <= index) {
            next = None;
        }
        if next.is_none() {
            next = (index + 1..rows.len()).find(|&i| has_value(&rows[i], value_key));
        }

        let distance = |candidate: Option<usize>| {
            candidate
                .and_then(|i| time_of(&rows[i], time_key))
                .map(|t| t.abs_diff(current_time))
        };
        let prev_distance = distance(prev);
        let next_distance = distance(next);

        let source = match (prev_distance, next_distance) {
            (_, Some(nd)) if nd <= tolerance && prev_distance.is_none_or(|pd| nd <= pd) => next,
            (Some(pd), _) if pd <= tolerance => prev,
            _ => None,
        };

        let target = &mut out[index];
        match source {
            Some(source) => {
                let neighbour = &rows[source];
                if let Some(value) = neighbour.get(value_key) {
                    target.insert(value_key.to_string(), value.clone());
                }
                if let Some(time) = neighbour.get(time_key) {
                    target.insert(time_key.to_string(), time.clone());
                }
                filled += 1;
            }
            None => {
                target.insert(
                    value_key.to_string(),
                    CellValue::Error(ErrorValue::NoValueWithinTolerance),
                );
            }
        }
    }

    tracing::trace!(value_key, filled, rows = rows.len(), "interpolated with tolerance");
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chartable_model::row;

    fn series(points: &[(i64, Option<f64>)]) -> Vec<Row> {
        points
            .iter()
            .map(|&(time, value)| {
                row([
                    ("time", CellValue::from(time)),
                    (
                        "value",
                        value.map_or(CellValue::Error(ErrorValue::NullButShouldBeNumber), CellValue::Number),
                    ),
                ])
            })
            .collect()
    }

    fn num(v: f64) -> CellValue {
        CellValue::Number(v)
    }

    fn values(rows: &[Row]) -> Vec<CellValue> {
        rows.iter().map(|r| r["value"].clone()).collect()
    }

    fn times(rows: &[Row]) -> Vec<CellValue> {
        rows.iter().map(|r| r["time"].clone()).collect()
    }

    #[test]
    fn test_fills_from_nearest_neighbour_and_carries_time() {
        let rows = series(&[(2000, Some(1.0)), (2001, None), (2004, Some(4.0))]);
        let out = interpolate_row_values_with_tolerance(&rows, "value", "time", 2);
        assert_eq!(values(&out), vec![num(1.0), num(1.0), num(4.0)]);
        assert_eq!(times(&out), vec![num(2000.0), num(2000.0), num(2004.0)]);
    }

    #[test]
    fn test_equal_distance_prefers_later_value() {
        let rows = series(&[(2000, Some(1.0)), (2001, None), (2002, Some(2.0))]);
        let out = interpolate_row_values_with_tolerance(&rows, "value", "time", 1);
        assert_eq!(out[1]["value"], CellValue::Number(2.0));
        assert_eq!(out[1]["time"], CellValue::from(2002));
    }

    #[test]
    fn test_out_of_tolerance_gets_sentinel() {
        let rows = series(&[(2000, Some(1.0)), (2005, None), (2010, Some(2.0))]);
        let out = interpolate_row_values_with_tolerance(&rows, "value", "time", 2);
        assert_eq!(out[1]["value"], CellValue::Error(ErrorValue::NoValueWithinTolerance));
        assert_eq!(out[1]["time"], CellValue::from(2005));
    }

    #[test]
    fn test_zero_tolerance_leaves_rows_unchanged() {
        let rows = series(&[(2000, Some(1.0)), (2001, None)]);
        let out = interpolate_row_values_with_tolerance(&rows, "value", "time", 0);
        assert_eq!(out, rows);
    }

    #[test]
    fn test_leading_and_trailing_gaps() {
        let rows = series(&[(2000, None), (2001, Some(5.0)), (2002, None), (2003, None)]);
        let out = interpolate_row_values_with_tolerance(&rows, "value", "time", 1);
        assert_eq!(
            values(&out),
            vec![
                num(5.0),
                num(5.0),
                num(5.0),
                CellValue::Error(ErrorValue::NoValueWithinTolerance),
            ]
        );
    }
}
