//! Weighted target allocation.
//!
//! Converts a weight map into integer per-key counts that sum exactly to a
//! requested total: floor each share of `total`, then hand out the
//! difference one unit at a time with draws from the attempt's seeded RNG.

use std::collections::BTreeMap;

use crate::rng::SeededRng;

/// Allocate `total` units across the keys of `weights`.
///
/// Negative or non-finite weights count as zero. Weights summing above 1
/// are scaled down to proportions first, so percent-style maps behave like
/// their fractional equivalents. Remainder units go to keys with a positive
/// weight (any key when none is positive). An empty weight map yields an
/// empty allocation.
pub fn allocate<K: Ord + Clone>(
    weights: &BTreeMap<K, f64>,
    total: usize,
    rng: &mut SeededRng,
) -> BTreeMap<K, usize> {
    if weights.is_empty() {
        return BTreeMap::new();
    }

    let shares = shares(weights);
    let mut counts = BTreeMap::new();
    let mut assigned = 0usize;

    for (key, share) in &shares {
        // The epsilon keeps products like 0.35 * 20 from flooring one short.
        let count = ((share * total as f64 + 1e-9).floor() as usize).min(total - assigned);
        counts.insert(key.clone(), count);
        assigned = assigned.saturating_add(count);
    }

    let positive: Vec<K> = shares
        .iter()
        .filter(|(_, share)| *share > 0.0)
        .map(|(k, _)| k.clone())
        .collect();
    let eligible: Vec<K> = if positive.is_empty() {
        weights.keys().cloned().collect()
    } else {
        positive
    };

    while assigned < total {
        let Ok(key) = rng.pick(&eligible) else { break };
        if let Some(count) = counts.get_mut(key) {
            *count += 1;
            assigned += 1;
        }
    }

    counts
}

/// Per-key shares of the total, each in `0..=1` and summing to at most 1.
fn shares<K: Ord + Clone>(weights: &BTreeMap<K, f64>) -> Vec<(K, f64)> {
    let sanitized: Vec<(K, f64)> = weights
        .iter()
        .map(|(k, w)| (k.clone(), sanitize(*w)))
        .collect();

    let sum: f64 = sanitized.iter().map(|(_, w)| w).sum();
    if sum <= 1.0 {
        return sanitized;
    }
    if sum.is_finite() {
        return sanitized.into_iter().map(|(k, w)| (k, w / sum)).collect();
    }

    // The sum overflowed: rescale against the largest weight first.
    let max = sanitized.iter().map(|(_, w)| *w).fold(0.0, f64::max);
    let scaled_sum: f64 = sanitized.iter().map(|(_, w)| w / max).sum();
    sanitized
        .into_iter()
        .map(|(k, w)| (k, (w / max / scaled_sum).clamp(0.0, 1.0)))
        .collect()
}

fn sanitize(weight: f64) -> f64 {
    if weight.is_finite() && weight > 0.0 {
        weight
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Difficulty, Domain};

    fn sum<K>(counts: &BTreeMap<K, usize>) -> usize {
        counts.values().sum()
    }

    #[test]
    fn exact_split_needs_no_remainder() {
        let weights: BTreeMap<Difficulty, f64> = [
            (Difficulty::Easy, 0.5),
            (Difficulty::Medium, 0.25),
            (Difficulty::Hard, 0.25),
        ]
        .into_iter()
        .collect();
        let counts = allocate(&weights, 20, &mut SeededRng::new("exact"));
        assert_eq!(counts[&Difficulty::Easy], 10);
        assert_eq!(counts[&Difficulty::Medium], 5);
        assert_eq!(counts[&Difficulty::Hard], 5);
    }

    #[test]
    fn counts_always_sum_to_total() {
        let weight_sets: Vec<Vec<f64>> = vec![
            vec![0.2, 0.35, 0.2, 0.15, 0.1],
            vec![0.0, 0.0, 0.0, 0.0, 0.0],
            vec![1.0, 0.0, 0.0, 0.0, 0.0],
            vec![0.5, 0.5, 0.5, 0.5, 0.5],
            vec![0.01, 0.02, 0.03, 0.0, 0.0],
            vec![3.0, -1.0, f64::NAN, 0.7, 0.1],
        ];
        for (i, set) in weight_sets.iter().enumerate() {
            let weights: BTreeMap<Domain, f64> =
                Domain::ALL.into_iter().zip(set.iter().copied()).collect();
            for total in [0usize, 1, 7, 20, 30, 101] {
                let counts = allocate(&weights, total, &mut SeededRng::new(format!("{i}-{total}")));
                assert_eq!(sum(&counts), total, "set {i} total {total}");
            }
        }
    }

    #[test]
    fn remainder_avoids_zero_weight_keys() {
        let weights: BTreeMap<Domain, f64> = [
            (Domain::Fundamentals, 0.0),
            (Domain::Calculations, 0.3),
            (Domain::Compliance, 0.3),
        ]
        .into_iter()
        .collect();
        for i in 0..20 {
            let counts = allocate(&weights, 10, &mut SeededRng::new(format!("zero-{i}")));
            assert_eq!(counts[&Domain::Fundamentals], 0);
            assert_eq!(sum(&counts), 10);
        }
    }

    #[test]
    fn remainder_is_reproducible() {
        let weights: BTreeMap<Domain, f64> =
            Domain::ALL.into_iter().map(|d| (d, 0.13)).collect();
        let a = allocate(&weights, 23, &mut SeededRng::new("repro"));
        let b = allocate(&weights, 23, &mut SeededRng::new("repro"));
        assert_eq!(a, b);
    }

    #[test]
    fn percent_scale_weights_keep_proportions() {
        let percent: BTreeMap<Domain, f64> = Domain::ALL
            .into_iter()
            .zip([20.0, 35.0, 20.0, 15.0, 10.0])
            .collect();
        for seed in ["a", "b", "c"] {
            let counts = allocate(&percent, 20, &mut SeededRng::new(seed));
            assert_eq!(counts.values().copied().collect::<Vec<_>>(), vec![4, 7, 4, 3, 2]);
        }
    }

    #[test]
    fn equal_weights_above_one_split_evenly() {
        let focus: BTreeMap<Domain, f64> = [(Domain::Compliance, 1.0), (Domain::ReportingEthics, 1.0)]
            .into_iter()
            .collect();
        for seed in ["a", "b", "c", "d"] {
            let counts = allocate(&focus, 20, &mut SeededRng::new(seed));
            assert_eq!(counts[&Domain::Compliance], 10);
            assert_eq!(counts[&Domain::ReportingEthics], 10);
        }
    }

    #[test]
    fn huge_weights_do_not_overflow() {
        let weights: BTreeMap<Domain, f64> = [
            (Domain::Fundamentals, 1e300),
            (Domain::Calculations, 1e300),
            (Domain::Compliance, f64::MAX),
        ]
        .into_iter()
        .collect();
        let counts = allocate(&weights, 20, &mut SeededRng::new("huge"));
        assert_eq!(sum(&counts), 20);
        assert!(counts[&Domain::Compliance] >= 19);

        let single: BTreeMap<Domain, f64> = [(Domain::Fundamentals, 1e300)].into_iter().collect();
        assert_eq!(allocate(&single, 20, &mut SeededRng::new("huge"))[&Domain::Fundamentals], 20);
    }

    #[test]
    fn empty_weights_yield_empty_allocation() {
        let weights: BTreeMap<Domain, f64> = BTreeMap::new();
        assert!(allocate(&weights, 5, &mut SeededRng::new("empty")).is_empty());
    }
}
