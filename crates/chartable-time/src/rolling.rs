//! Windowed rolling averages over cell sequences.

use chartable_model::{CellValue, ErrorValue, Time};

/// Where the averaging window sits relative to the current sample.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RollingAlign {
    /// Window spans `[i - (size - 1), i]`.
    #[default]
    Right,
    /// Window is centred on `i`; uneven expansion favours the past.
    Center,
}

/// Rolling average of `values` with a window of `window_size` samples.
///
/// A window size of 1 (or 0) returns the input unchanged. Cells that are not
/// numbers are passed through as they are and excluded from every window's
/// sum and count. An average with nothing to average is `NaN`, which callers
/// must treat as absent.
///
/// ```
/// use chartable_model::CellValue;
/// use chartable_time::{RollingAlign, compute_rolling_average};
///
/// let values: Vec<CellValue> = [0.0, 2.0, 4.0, 0.0].into_iter().map(CellValue::from).collect();
/// let out = compute_rolling_average(&values, 3, RollingAlign::Center);
/// assert_eq!(out, [1.0, 2.0, 2.0, 2.0].map(CellValue::from).to_vec());
/// ```
pub fn compute_rolling_average(
    values: &[CellValue],
    window_size: usize,
    align: RollingAlign,
) -> Vec<CellValue> {
    let expand = window_size.saturating_sub(1);
    let (expand_left, expand_right) = match align {
        RollingAlign::Right => (expand, 0),
        RollingAlign::Center => (expand.div_ceil(2), expand / 2),
    };
    let last = values.len().saturating_sub(1);

    values
        .iter()
        .enumerate()
        .map(|(index, current)| {
            if !current.is_number() {
                return current.clone();
            }
            let start = index.saturating_sub(expand_left);
            let end = (index + expand_right).min(last);
            let (sum, count) = values[start..=end]
                .iter()
                .filter_map(CellValue::as_number)
                .fold((0.0, 0usize), |(sum, count), v| (sum + v, count + 1));
            CellValue::Number(sum / count as f64)
        })
        .collect()
}

/// Longest time axis [`insert_missing_value_placeholders`] will lay out.
pub const MAX_DENSE_SPAN: usize = 1 << 24;

/// Expand `values` (observed at `times`, sorted ascending) to one cell per
/// time unit from the first to the last time, filling gaps with
/// [`ErrorValue::MissingValuePlaceholder`].
///
/// The output is aligned to `times[0]..=times[last]`; times outside that
/// range are ignored. Spans longer than [`MAX_DENSE_SPAN`] are not expanded
/// and the values come back unchanged.
pub fn insert_missing_value_placeholders(values: &[CellValue], times: &[Time]) -> Vec<CellValue> {
    let (Some(&start), Some(&end)) = (times.first(), times.last()) else {
        return Vec::new();
    };
    let span = end
        .checked_sub(start)
        .and_then(|diff| usize::try_from(diff).ok())
        .and_then(|diff| diff.checked_add(1))
        .filter(|&len| len <= MAX_DENSE_SPAN);
    let Some(span) = span else {
        tracing::warn!(start, end, "time span too wide to expand; leaving values as they are");
        return values.to_vec();
    };
    let mut filled = vec![CellValue::Error(ErrorValue::MissingValuePlaceholder); span];
    for (value, &time) in values.iter().zip(times) {
        let slot = usize::try_from(time - start)
            .ok()
            .and_then(|offset| filled.get_mut(offset));
        if let Some(slot) = slot {
            *slot = value.clone();
        }
    }
    filled
}
