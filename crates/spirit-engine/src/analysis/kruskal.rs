//! Kruskal-Wallis omnibus test.

use statrs::distribution::{ChiSquared, ContinuousCDF};

/// Outcome of the Kruskal-Wallis test across the groups of one column.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KruskalWallis {
    /// Tie-corrected H statistic.
    pub h: f64,
    /// Probability of an H at least this large under the null hypothesis
    /// that all groups share the same distribution.
    pub p_value: f64,
    /// Number of groups that contributed observations.
    pub groups: usize,
}

/// Runs the test over per-group observation lists.
///
/// Returns `None` when the test is undefined: fewer than two groups carry
/// an observation, or every pooled observation is tied (the tie-correction
/// denominator vanishes). Undefined is not zero — callers skip the column.
pub fn kruskal_wallis(groups: &[Vec<f64>]) -> Option<KruskalWallis> {
    let groups: Vec<&Vec<f64>> = groups.iter().filter(|g| !g.is_empty()).collect();
    let k = groups.len();
    if k < 2 {
        return None;
    }

    let n_total: usize = groups.iter().map(|g| g.len()).sum();
    let mut pooled: Vec<(f64, usize)> = Vec::with_capacity(n_total);
    for (group_idx, group) in groups.iter().enumerate() {
        for &value in group.iter() {
            if !value.is_finite() {
                return None;
            }
            pooled.push((value, group_idx));
        }
    }
    pooled.sort_by(|a, b| a.0.total_cmp(&b.0));

    // Midrank assignment: tied runs share the average of their positions.
    let n = pooled.len();
    let mut rank_sums = vec![0.0_f64; k];
    let mut tie_term = 0.0_f64;
    let mut i = 0;
    while i < n {
        let mut j = i + 1;
        while j < n && pooled[j].0 == pooled[i].0 {
            j += 1;
        }
        let run = (j - i) as f64;
        // Ranks are 1-based; the midrank of positions i+1 ..= j is their mean.
        let midrank = (i + 1 + j) as f64 / 2.0;
        for &(_, group_idx) in &pooled[i..j] {
            rank_sums[group_idx] += midrank;
        }
        tie_term += run * run * run - run;
        i = j;
    }

    let n_f = n as f64;
    let mut h = 0.0_f64;
    for (group_idx, group) in groups.iter().enumerate() {
        let n_i = group.len() as f64;
        h += rank_sums[group_idx] * rank_sums[group_idx] / n_i;
    }
    h = 12.0 / (n_f * (n_f + 1.0)) * h - 3.0 * (n_f + 1.0);

    // Correction for ties; degenerates to zero when every value is tied.
    let correction = 1.0 - tie_term / (n_f * n_f * n_f - n_f);
    if correction <= 0.0 {
        return None;
    }
    h /= correction;
    if !h.is_finite() {
        return None;
    }
    // Floating error can push a tie-free uniform sample epsilon below zero.
    if h < 0.0 {
        h = 0.0;
    }

    let df = (k - 1) as f64;
    let dist = ChiSquared::new(df).ok()?;
    let p_value = (1.0 - dist.cdf(h)).clamp(0.0, 1.0);

    Some(KruskalWallis {
        h,
        p_value,
        groups: k,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn undefined_below_two_groups() {
        assert_eq!(kruskal_wallis(&[]), None);
        assert_eq!(kruskal_wallis(&[vec![1.0, 2.0, 3.0]]), None);
        assert_eq!(kruskal_wallis(&[vec![1.0, 2.0], vec![]]), None);
    }

    #[test]
    fn undefined_when_every_value_is_tied() {
        assert_eq!(kruskal_wallis(&[vec![5.0, 5.0], vec![5.0, 5.0]]), None);
    }

    #[test]
    fn separated_groups_give_large_h_small_p() {
        // No overlap between the two samples: ranks are 1..3 vs 4..6 and
        // H = 12/(6*7) * (6^2/3 + 15^2/3) - 3*7 = 3.857...
        let kw = kruskal_wallis(&[vec![10.0, 20.0, 30.0], vec![100.0, 110.0, 120.0]]).unwrap();
        assert_eq!(kw.groups, 2);
        assert!((kw.h - 27.0 / 7.0).abs() < 1e-12, "h = {}", kw.h);
        assert!(kw.p_value < 0.05, "p = {}", kw.p_value);
        assert!(kw.p_value > 0.0);
    }

    #[test]
    fn tied_ranks_use_midranks() {
        // Pooled: [1, 2, 2, 3]; the tied 2s share rank 2.5.
        let kw = kruskal_wallis(&[vec![1.0, 2.0], vec![2.0, 3.0]]).unwrap();
        // Rank sums: group 0 = 1 + 2.5, group 1 = 2.5 + 4.
        let raw_h = 12.0 / (4.0 * 5.0) * (3.5_f64.powi(2) / 2.0 + 6.5_f64.powi(2) / 2.0) - 15.0;
        let correction = 1.0 - (2.0_f64.powi(3) - 2.0) / (4.0_f64.powi(3) - 4.0);
        assert!((kw.h - raw_h / correction).abs() < 1e-12);
    }

    #[test]
    fn identical_distributions_give_high_p() {
        let kw = kruskal_wallis(&[
            vec![1.0, 3.0, 5.0, 7.0, 9.0],
            vec![2.0, 4.0, 6.0, 8.0, 10.0],
        ])
        .unwrap();
        assert!(kw.p_value > 0.5, "p = {}", kw.p_value);
    }
}
