//! Transforms that keep running state per entity.
//!
//! Rows are assumed sorted by entity then time. State resets whenever the
//! entity value changes between consecutive rows.

use std::collections::BTreeMap;

use chartable_model::{CellValue, ErrorValue, Time};

use crate::operand::{entity_runs, normalized, numeric};

fn time_at(times: &[CellValue], index: usize) -> Option<Time> {
    times[index].as_number().map(|t| t as Time)
}

/// One entity's values keyed by time. A later row at the same time wins.
struct Series(BTreeMap<Time, CellValue>);

impl Series {
    fn new(times: &[CellValue], values: &[CellValue], run: std::ops::Range<usize>) -> Self {
        Self(
            run.filter_map(|index| time_at(times, index).map(|t| (t, normalized(&values[index]))))
                .collect(),
        )
    }

    /// Mean of the real values observed in `time - (window_size - 1) ..= time`,
    /// so the window counts time units rather than rows. `None` when nothing
    /// was observed at `time`; a sentinel observed there is returned as is.
    fn rolled_at(&self, time: Time, window_size: usize) -> Option<CellValue> {
        let current = self.0.get(&time)?;
        if !current.is_number() {
            return Some(current.clone());
        }
        let reach = Time::try_from(window_size.saturating_sub(1)).unwrap_or(Time::MAX);
        let (sum, count) = self
            .0
            .range(time.saturating_sub(reach)..=time)
            .filter_map(|(_, cell)| cell.as_number())
            .fold((0.0, 0usize), |(sum, count), v| (sum + v, count + 1));
        Some(CellValue::Number(sum / count as f64))
    }
}

pub(crate) fn rolling_average(
    times: &[CellValue],
    entities: &[CellValue],
    values: &[CellValue],
    window_size: usize,
) -> Vec<CellValue> {
    let mut out = Vec::with_capacity(values.len());
    for run in entity_runs(entities) {
        let series = Series::new(times, values, run.clone());
        for index in run {
            let cell = time_at(times, index)
                .and_then(|time| series.rolled_at(time, window_size))
                .unwrap_or(CellValue::Error(ErrorValue::TypeMismatch));
            out.push(cell);
        }
    }
    out
}

/// Percent change of the rolling average against its value `window_size`
/// time units earlier for the same entity. A window of zero compares each
/// value with itself.
pub(crate) fn percent_change(
    times: &[CellValue],
    entities: &[CellValue],
    values: &[CellValue],
    window_size: usize,
) -> Vec<CellValue> {
    if window_size == 0 {
        return values
            .iter()
            .map(|cell| match numeric(cell) {
                Ok(_) => CellValue::Number(0.0),
                Err(sentinel) => sentinel,
            })
            .collect();
    }
    let lag = Time::try_from(window_size).unwrap_or(Time::MAX);
    let mut out = Vec::with_capacity(values.len());
    for run in entity_runs(entities) {
        let series = Series::new(times, values, run.clone());
        for index in run {
            let Some(time) = time_at(times, index) else {
                out.push(CellValue::Error(ErrorValue::TypeMismatch));
                continue;
            };
            let current = series
                .rolled_at(time, window_size)
                .unwrap_or(CellValue::Error(ErrorValue::TypeMismatch));
            let previous = time
                .checked_sub(lag)
                .and_then(|t| series.rolled_at(t, window_size));
            out.push(change(&current, previous.as_ref()));
        }
    }
    out
}

fn change(current: &CellValue, previous: Option<&CellValue>) -> CellValue {
    let current = match numeric(current) {
        Ok(v) => v,
        Err(sentinel) => return sentinel,
    };
    let previous = match previous {
        None => return ErrorValue::NoPriorValueForComparison.into(),
        Some(cell) => match numeric(cell) {
            Ok(v) => v,
            Err(sentinel) => return sentinel,
        },
    };
    if previous == 0.0 {
        return ErrorValue::DivideByZero.into();
    }
    CellValue::Number(100.0 * (current - previous) / previous)
}

/// Time elapsed since the entity's value first reached `threshold`. Rows
/// before that point get [`ErrorValue::ValueTooLow`].
pub(crate) fn time_since_threshold(
    times: &[CellValue],
    entities: &[CellValue],
    values: &[CellValue],
    threshold: f64,
) -> Vec<CellValue> {
    let mut out = Vec::with_capacity(values.len());
    for run in entity_runs(entities) {
        let mut crossed_at: Option<Time> = None;
        for index in run {
            let Some(time) = time_at(times, index) else {
                out.push(CellValue::Error(ErrorValue::TypeMismatch));
                continue;
            };
            if let Some(origin) = crossed_at {
                out.push(CellValue::from(time.saturating_sub(origin)));
                continue;
            }
            let cell = match numeric(&values[index]) {
                Err(sentinel) => sentinel,
                Ok(v) if v < threshold => ErrorValue::ValueTooLow.into(),
                Ok(_) => {
                    crossed_at = Some(time);
                    CellValue::from(0)
                }
            };
            out.push(cell);
        }
    }
    out
}

/// Running total per entity. Sentinels pass through and add nothing.
pub(crate) fn cumulative_sum(entities: &[CellValue], values: &[CellValue]) -> Vec<CellValue> {
    let mut out = Vec::with_capacity(values.len());
    for run in entity_runs(entities) {
        let mut total = 0.0;
        for cell in &values[run] {
            out.push(match numeric(cell) {
                Ok(v) => {
                    total += v;
                    CellValue::Number(total)
                }
                Err(sentinel) => sentinel,
            });
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cells<T: Into<CellValue> + Copy>(values: &[T]) -> Vec<CellValue> {
        values.iter().map(|&v| v.into()).collect()
    }

    #[test]
    fn test_rolling_average_resets_per_entity() {
        let entities = cells(&["a", "a", "a", "b", "b"]);
        let times = cells(&[1, 2, 3, 1, 2]);
        let values = cells(&[2.0, 4.0, 6.0, 10.0, 20.0]);
        assert_eq!(
            rolling_average(&times, &entities, &values, 2),
            cells(&[2.0, 3.0, 5.0, 10.0, 15.0])
        );
    }

    #[test]
    fn test_rolling_average_windows_over_time_not_rows() {
        let entities = cells(&["a", "a"]);
        let times = cells(&[1, 5]);
        let values = cells(&[2.0, 4.0]);
        assert_eq!(rolling_average(&times, &entities, &values, 2), cells(&[2.0, 4.0]));
    }

    #[test]
    fn test_rolling_average_keeps_sentinels() {
        let entities = cells(&["a", "a"]);
        let times = cells(&[1, 2]);
        let values = vec![CellValue::Number(1.0), CellValue::Null];
        assert_eq!(
            rolling_average(&times, &entities, &values, 3),
            vec![CellValue::Number(1.0), CellValue::Error(ErrorValue::NullButShouldBeNumber)]
        );
    }

    #[test]
    fn test_percent_change() {
        let entities = cells(&["a", "a", "a", "b", "b"]);
        let times = cells(&[1, 2, 3, 1, 2]);
        let values = cells(&[10.0, 15.0, 0.0, 4.0, 2.0]);
        let out = percent_change(&times, &entities, &values, 1);
        assert_eq!(
            out,
            vec![
                CellValue::Error(ErrorValue::NoPriorValueForComparison),
                CellValue::Number(50.0),
                CellValue::Number(-100.0),
                CellValue::Error(ErrorValue::NoPriorValueForComparison),
                CellValue::Number(-50.0),
            ]
        );
    }

    #[test]
    fn test_extreme_times_do_not_overflow() {
        let entities = cells(&["a", "a"]);
        let times = vec![CellValue::Number(-9e18), CellValue::Number(9e18)];
        let values = cells(&[2.0, 4.0]);
        assert_eq!(rolling_average(&times, &entities, &values, 2), cells(&[2.0, 4.0]));
        assert_eq!(
            rolling_average(&times, &entities, &values, usize::MAX),
            cells(&[2.0, 4.0])
        );
        assert_eq!(
            percent_change(&times, &entities, &values, 2),
            vec![
                CellValue::Error(ErrorValue::NoPriorValueForComparison),
                CellValue::Error(ErrorValue::NoPriorValueForComparison),
            ]
        );
    }

    #[test]
    fn test_percent_change_with_zero_window_is_zero() {
        let entities = cells(&["a", "a", "a"]);
        let times = cells(&[1, 2, 3]);
        let values = vec![CellValue::Number(10.0), CellValue::Number(10.0), CellValue::Null];
        assert_eq!(
            percent_change(&times, &entities, &values, 0),
            vec![
                CellValue::Number(0.0),
                CellValue::Number(0.0),
                CellValue::Error(ErrorValue::NullButShouldBeNumber),
            ]
        );
    }

    #[test]
    fn test_percent_change_from_zero_is_divide_by_zero() {
        let entities = cells(&["a", "a"]);
        let times = cells(&[1, 2]);
        let values = cells(&[0.0, 5.0]);
        assert_eq!(
            percent_change(&times, &entities, &values, 1)[1],
            CellValue::Error(ErrorValue::DivideByZero)
        );
    }

    #[test]
    fn test_time_since_threshold() {
        let entities = cells(&["a", "a", "a", "a", "b"]);
        let times = cells(&[10, 11, 12, 13, 10]);
        let values = cells(&[1.0, 5.0, 2.0, 9.0, 7.0]);
        let out = time_since_threshold(&times, &entities, &values, 5.0);
        assert_eq!(
            out,
            vec![
                CellValue::Error(ErrorValue::ValueTooLow),
                CellValue::from(0),
                CellValue::from(1),
                CellValue::from(2),
                CellValue::from(0),
            ]
        );
    }

    #[test]
    fn test_cumulative_sum_resets_per_entity() {
        let entities = cells(&["a", "a", "a", "b"]);
        let values = vec![
            CellValue::Number(1.0),
            CellValue::Error(ErrorValue::FilteredOut),
            CellValue::Number(2.0),
            CellValue::Number(5.0),
        ];
        assert_eq!(
            cumulative_sum(&entities, &values),
            vec![
                CellValue::Number(1.0),
                CellValue::Error(ErrorValue::FilteredOut),
                CellValue::Number(3.0),
                CellValue::Number(5.0),
            ]
        );
    }
}
