//! Closest-time lookup. Equidistant candidates resolve to the later time.

use chartable_model::Time;

/// Target of a closest-time lookup, allowing the open ends of a time range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeBound {
    NegativeInfinity,
    PositiveInfinity,
    At(Time),
}

impl From<Time> for TimeBound {
    fn from(value: Time) -> Self {
        Self::At(value)
    }
}

/// Index of the element of `times` closest to `target`.
///
/// `times` need not be sorted. An exact match returns immediately. Candidates
/// further than `tolerance` are skipped; equidistant candidates resolve to the
/// later time. A negative tolerance matches nothing.
pub fn find_closest_time_index(times: &[Time], target: Time, tolerance: Option<Time>) -> Option<usize> {
    if tolerance.is_some_and(|tol| tol < 0) {
        return None;
    }
    let mut closest: Option<(usize, Time)> = None;
    for (index, &time) in times.iter().enumerate() {
        let distance = time.abs_diff(target);
        if distance == 0 {
            return Some(index);
        }
        if tolerance.is_some_and(|tol| distance > tol.unsigned_abs()) {
            continue;
        }
        let better = match closest {
            None => true,
            Some((_, best)) => {
                let best_distance = best.abs_diff(target);
                best_distance > distance || (best_distance == distance && time > target)
            }
        };
        if better {
            closest = Some((index, time));
        }
    }
    closest.map(|(index, _)| index)
}

/// Element of `times` closest to `target`.
///
/// `NegativeInfinity` returns the minimum and `PositiveInfinity` the maximum,
/// regardless of tolerance.
///
/// ```
/// use chartable_time::find_closest_time;
///
/// let times = [2010, 2012, 2013, 2017];
/// assert_eq!(find_closest_time(&times, 2011, Some(3)), Some(2012));
/// assert_eq!(find_closest_time(&times, 2015, Some(3)), Some(2017));
/// ```
pub fn find_closest_time(
    times: &[Time],
    target: impl Into<TimeBound>,
    tolerance: Option<Time>,
) -> Option<Time> {
    match target.into() {
        TimeBound::NegativeInfinity => times.iter().copied().min(),
        TimeBound::PositiveInfinity => times.iter().copied().max(),
        TimeBound::At(target) => {
            find_closest_time_index(times, target, tolerance).map(|index| times[index])
        }
    }
}

/// Index of the element of a sorted slice closest to `target`, searching
/// `sorted[start..]` by bisection.
///
/// Ties resolve to the later element, matching [`find_closest_time`].
pub fn sorted_find_closest_index(sorted: &[Time], target: Time, start: usize) -> Option<usize> {
    if start >= sorted.len() {
        return None;
    }
    let window = &sorted[start..];
    // First index with value >= target.
    let upper = window.partition_point(|&t| t < target);
    let index = if upper == 0 {
        0
    } else if upper == window.len() {
        window.len() - 1
    } else {
        let below = window[upper - 1];
        let above = window[upper];
        if target.abs_diff(below) < above.abs_diff(target) {
            upper - 1
        } else {
            upper
        }
    };
    Some(start + index)
}

/// Element of a sorted slice closest to `target`.
pub fn sorted_find_closest(sorted: &[Time], target: Time) -> Option<Time> {
    sorted_find_closest_index(sorted, target, 0).map(|index| sorted[index])
}

#[cfg(test)]
mod tests {
    use super::*;

    const TIMES: [Time; 4] = [2010, 2012, 2013, 2017];

    #[test]
    fn test_ties_break_toward_later_time() {
        assert_eq!(find_closest_time(&TIMES, 2011, Some(3)), Some(2012));
        assert_eq!(find_closest_time(&TIMES, 2015, Some(3)), Some(2017));
    }

    #[test]
    fn test_zero_tolerance_requires_exact_match() {
        assert_eq!(find_closest_time(&[2010, 2015, 2017], 2014, Some(0)), None);
        assert_eq!(find_closest_time(&[2010, 2015, 2017], 2015, Some(0)), Some(2015));
    }

    #[test]
    fn test_negative_tolerance_matches_nothing() {
        assert_eq!(find_closest_time(&TIMES, 2012, Some(-1)), None);
        assert_eq!(find_closest_time_index(&TIMES, 2011, Some(-5)), None);
    }

    #[test]
    fn test_tolerance_excludes_far_candidates() {
        assert_eq!(find_closest_time(&TIMES, 2000, Some(5)), None);
        assert_eq!(find_closest_time(&TIMES, 2000, None), Some(2010));
    }

    #[test]
    fn test_infinite_targets_return_extremes() {
        assert_eq!(find_closest_time(&TIMES, TimeBound::NegativeInfinity, Some(0)), Some(2010));
        assert_eq!(find_closest_time(&TIMES, TimeBound::PositiveInfinity, None), Some(2017));
        assert_eq!(find_closest_time(&[], TimeBound::PositiveInfinity, None), None);
    }

    #[test]
    fn test_unsorted_input() {
        assert_eq!(find_closest_time(&[2017, 2010, 2013], 2012, None), Some(2013));
    }

    #[test]
    fn test_sorted_find_closest() {
        assert_eq!(sorted_find_closest(&TIMES, 2011), Some(2012));
        assert_eq!(sorted_find_closest(&TIMES, 1900), Some(2010));
        assert_eq!(sorted_find_closest(&TIMES, 3000), Some(2017));
        assert_eq!(sorted_find_closest(&TIMES, 2016), Some(2017));
        assert_eq!(sorted_find_closest(&[], 2016), None);
    }

    #[test]
    fn test_sorted_find_closest_index_honours_start() {
        assert_eq!(sorted_find_closest_index(&TIMES, 2010, 2), Some(2));
        assert_eq!(sorted_find_closest_index(&TIMES, 2010, 4), None);
    }
}
