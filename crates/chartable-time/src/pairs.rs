//! Greedy nearest-pair matching between two sorted time sequences.

use chartable_model::Time;

#[derive(Debug, Clone, Copy)]
struct Candidate {
    index_a: usize,
    index_b: usize,
    diff: u64,
}

/// Pair up times from two sorted sequences so that each element of either
/// sequence is used at most once.
///
/// For every `a`, the straddling neighbours in `sorted_b` (greatest `b <= a`
/// and least `b >= a`) are found with a pointer that only moves forward, so
/// the scan is linear. An exact match, or a single strictly closer neighbour,
/// is a decided pair; two equidistant neighbours are both kept as undecided
/// candidates. Decided pairs are accepted first, then undecided ones, each
/// group in order of increasing distance, skipping pairs whose endpoint is
/// already taken. Pairs further apart than `max_diff` are dropped, and a
/// negative `max_diff` pairs nothing.
///
/// The result is sorted by the `a` time.
///
/// ```
/// use chartable_time::get_closest_time_pairs;
///
/// assert_eq!(get_closest_time_pairs(&[0, 1], &[2, 3], Some(1)), vec![(1, 2)]);
/// ```
pub fn get_closest_time_pairs(
    sorted_a: &[Time],
    sorted_b: &[Time],
    max_diff: Option<Time>,
) -> Vec<(Time, Time)> {
    if sorted_a.is_empty() || sorted_b.is_empty() || max_diff.is_some_and(|max| max < 0) {
        return Vec::new();
    }
    let within = |diff: u64| max_diff.is_none_or(|max| diff <= max.unsigned_abs());

    let mut decided: Vec<Candidate> = Vec::new();
    let mut undecided: Vec<Candidate> = Vec::new();
    let mut index_b = 0usize;

    for (index_a, &time_a) in sorted_a.iter().enumerate() {
        while index_b + 1 < sorted_b.len() && sorted_b[index_b + 1] <= time_a {
            index_b += 1;
        }
        let (lower, upper) = if sorted_b[index_b] <= time_a {
            if sorted_b[index_b] == time_a {
                (Some(index_b), Some(index_b))
            } else {
                let next = index_b + 1;
                (Some(index_b), (next < sorted_b.len()).then_some(next))
            }
        } else {
            (None, Some(index_b))
        };

        let candidate = |ib: usize| Candidate {
            index_a,
            index_b: ib,
            diff: time_a.abs_diff(sorted_b[ib]),
        };

        match (lower, upper) {
            (Some(lo), Some(hi)) if lo == hi => decided.push(candidate(lo)),
            (Some(lo), Some(hi)) => {
                let below = candidate(lo);
                let above = candidate(hi);
                if below.diff < above.diff {
                    if within(below.diff) {
                        decided.push(below);
                    }
                } else if above.diff < below.diff {
                    if within(above.diff) {
                        decided.push(above);
                    }
                } else if within(below.diff) {
                    undecided.push(below);
                    undecided.push(above);
                }
            }
            (Some(only), None) | (None, Some(only)) => {
                let c = candidate(only);
                if within(c.diff) {
                    decided.push(c);
                }
            }
            (None, None) => {}
        }
    }

    let mut used_a = vec![false; sorted_a.len()];
    let mut used_b = vec![false; sorted_b.len()];
    let mut accepted: Vec<Candidate> = Vec::new();

    for mut group in [decided, undecided] {
        group.sort_by_key(|c| c.diff);
        for c in group {
            if used_a[c.index_a] || used_b[c.index_b] {
                continue;
            }
            used_a[c.index_a] = true;
            used_b[c.index_b] = true;
            accepted.push(c);
        }
    }

    accepted.sort_by_key(|c| (c.index_a, c.index_b));
    tracing::trace!(pairs = accepted.len(), "matched closest time pairs");
    accepted
        .into_iter()
        .map(|c| (sorted_a[c.index_a], sorted_b[c.index_b]))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_and_nearest_pairs() {
        let pairs = get_closest_time_pairs(&[0, 4], &[3, 4], None);
        assert!(pairs.contains(&(0, 3)));
        assert!(pairs.contains(&(4, 4)));
    }

    #[test]
    fn test_max_diff_limits_pairs() {
        assert_eq!(get_closest_time_pairs(&[0, 1], &[2, 3], Some(1)), vec![(1, 2)]);
        assert_eq!(get_closest_time_pairs(&[0, 1], &[3, 4], Some(1)), vec![]);
    }

    #[test]
    fn test_exact_match_beats_earlier_near_match() {
        assert_eq!(get_closest_time_pairs(&[3, 4], &[4], None), vec![(4, 4)]);
    }

    #[test]
    fn test_equidistant_neighbours_resolved_without_reuse() {
        // 2 sits between 1 and 3; 1 is taken by the exact match.
        let pairs = get_closest_time_pairs(&[1, 2], &[1, 3], None);
        assert_eq!(pairs, vec![(1, 1), (2, 3)]);
    }

    #[test]
    fn test_negative_max_diff_pairs_nothing() {
        assert!(get_closest_time_pairs(&[1, 2], &[1, 2], Some(-1)).is_empty());
    }

    #[test]
    fn test_empty_inputs() {
        assert!(get_closest_time_pairs(&[], &[1], None).is_empty());
        assert!(get_closest_time_pairs(&[1], &[], None).is_empty());
    }

    #[test]
    fn test_identical_sequences_pair_exactly() {
        let times = [2000, 2001, 2005];
        assert_eq!(
            get_closest_time_pairs(&times, &times, Some(0)),
            vec![(2000, 2000), (2001, 2001), (2005, 2005)]
        );
    }
}
