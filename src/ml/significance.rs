// ============================================================
// Layer 5 — Wilcoxon Signed-Rank Test
// ============================================================
// Paired, non-parametric comparison of two per-fold score sets
// (for example NDCG@3 with URIEL distances vs. URIEL+ distances,
// fold for fold).
//
//   d_i    = a_i − b_i, zero differences dropped
//   rank |d_i| (ties get the average rank)
//   R+     = Σ ranks where d_i > 0,  R− likewise
//   T      = min(R+, R−)
//
// p-value (two-sided):
//   - n ≤ 50, no tied |d_i| and no zero difference was dropped:
//     exact, from the distribution of rank sums over all 2ⁿ sign
//     assignments
//   - otherwise: normal approximation with tie correction, on the
//     n non-zero differences
//
//       μ = n(n+1)/4
//       σ² = n(n+1)(2n+1)/24 − Σ (t³ − t)/48
//       p = 2 · Φ(−|T − μ| / σ)

use anyhow::{bail, ensure, Result};
use serde::{Deserialize, Serialize};

/// Largest sample that gets the exact null distribution.
const EXACT_MAX_N: usize = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PValueMethod {
    Exact,
    Normal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WilcoxonResult {
    /// min(R+, R−)
    pub statistic: f64,
    pub p_value:   f64,
    /// Number of non-zero differences actually ranked
    pub n:         usize,
    pub method:    PValueMethod,
}

/// Two-sided Wilcoxon signed-rank test on paired samples.
pub fn wilcoxon_signed_rank(a: &[f64], b: &[f64]) -> Result<WilcoxonResult> {
    ensure!(!a.is_empty(), "Wilcoxon test needs at least one pair of scores");
    ensure!(
        a.len() == b.len(),
        "Wilcoxon test needs paired samples: got {} and {} scores",
        a.len(),
        b.len()
    );
    ensure!(
        a.iter().chain(b).all(|v| v.is_finite()),
        "Wilcoxon test scores must be finite"
    );

    let diffs: Vec<f64> = a
        .iter()
        .zip(b)
        .map(|(x, y)| x - y)
        .filter(|d| *d != 0.0)
        .collect();
    let n      = diffs.len();
    let n_zero = a.len() - n;
    if n == 0 {
        bail!("All paired differences are zero; the test is undefined");
    }

    let abs: Vec<f64> = diffs.iter().map(|d| d.abs()).collect();
    let (ranks, tie_sizes) = average_ranks(&abs);

    let r_plus: f64 = diffs
        .iter()
        .zip(&ranks)
        .filter(|(d, _)| **d > 0.0)
        .map(|(_, r)| r)
        .sum();
    let r_minus   = (n * (n + 1)) as f64 / 2.0 - r_plus;
    let statistic = r_plus.min(r_minus);
    let has_ties  = tie_sizes.iter().any(|&t| t > 1);

    let (p_value, method) = if n <= EXACT_MAX_N && !has_ties && n_zero == 0 {
        (exact_p_value(n, statistic), PValueMethod::Exact)
    } else {
        (normal_p_value(n, statistic, &tie_sizes)?, PValueMethod::Normal)
    };

    Ok(WilcoxonResult { statistic, p_value, n, method })
}

/// 1-based average ranks, plus the size of every tie group.
fn average_ranks(values: &[f64]) -> (Vec<f64>, Vec<usize>) {
    let mut order: Vec<usize> = (0..values.len()).collect();
    order.sort_by(|&a, &b| values[a].total_cmp(&values[b]));

    let mut ranks = vec![0.0; values.len()];
    let mut ties  = Vec::new();
    let mut start = 0;
    while start < order.len() {
        let mut end = start + 1;
        while end < order.len() && values[order[end]] == values[order[start]] {
            end += 1;
        }
        // positions start..end hold ranks start+1 ..= end
        let avg = (start + 1 + end) as f64 / 2.0;
        for &i in &order[start..end] {
            ranks[i] = avg;
        }
        ties.push(end - start);
        start = end;
    }
    (ranks, ties)
}

/// 2 · P(W ≤ T) under the null, W = rank sum of the positive signs.
fn exact_p_value(n: usize, statistic: f64) -> f64 {
    let max_sum = n * (n + 1) / 2;

    // counts[s] = number of subsets of {1..n} whose ranks sum to s
    let mut counts = vec![0.0f64; max_sum + 1];
    counts[0] = 1.0;
    for rank in 1..=n {
        for s in (rank..=max_sum).rev() {
            counts[s] += counts[s - rank];
        }
    }

    let total = 2f64.powi(n as i32);
    let upto  = statistic.floor() as usize;
    let lower: f64 = counts[..=upto.min(max_sum)].iter().sum();
    (2.0 * lower / total).min(1.0)
}

fn normal_p_value(n: usize, statistic: f64, tie_sizes: &[usize]) -> Result<f64> {
    let n = n as f64;
    let mean = n * (n + 1.0) / 4.0;
    let tie_correction: f64 = tie_sizes
        .iter()
        .map(|&t| {
            let t = t as f64;
            t * t * t - t
        })
        .sum::<f64>()
        / 48.0;
    let variance = n * (n + 1.0) * (2.0 * n + 1.0) / 24.0 - tie_correction;
    ensure!(variance > 0.0, "Wilcoxon test: zero variance under the null");

    let z = (statistic - mean) / variance.sqrt();
    // 2·Φ(−|z|) = erfc(|z|/√2)
    Ok(erfc(z.abs() / std::f64::consts::SQRT_2).min(1.0))
}

/// Complementary error function, fractional error below 1.2e-7.
/// Chebyshev fit from Numerical Recipes (erfcc).
fn erfc(x: f64) -> f64 {
    let z = x.abs();
    let t = 1.0 / (1.0 + 0.5 * z);
    let poly = -z * z - 1.265_512_23
        + t * (1.000_023_68
            + t * (0.374_091_96
                + t * (0.096_784_18
                    + t * (-0.186_288_06
                        + t * (0.278_868_07
                            + t * (-1.135_203_98
                                + t * (1.488_515_87
                                    + t * (-0.822_152_23 + t * 0.170_872_77))))))));
    let r = t * poly.exp();
    if x >= 0.0 {
        r
    } else {
        2.0 - r
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_all_positive() {
        let a: Vec<f64> = (1..=10).map(|i| i as f64).collect();
        let b = vec![0.0; 10];
        let r = wilcoxon_signed_rank(&a, &b).unwrap();
        assert_eq!(r.statistic, 0.0);
        assert_eq!(r.method, PValueMethod::Exact);
        assert!((r.p_value - 2.0 / 1024.0).abs() < 1e-15);
    }

    #[test]
    fn test_exact_mixed_signs() {
        // ranks 1..5, only rank 4 negative → T = 4; 7 of 32 subsets sum to ≤ 4
        let a = [1.0, 2.0, 3.0, -4.0, 5.0];
        let b = [0.0; 5];
        let r = wilcoxon_signed_rank(&a, &b).unwrap();
        assert_eq!(r.statistic, 4.0);
        assert!((r.p_value - 14.0 / 32.0).abs() < 1e-15);
    }

    #[test]
    fn test_zero_differences_are_dropped() {
        let a = [0.5, 0.6, 0.7, 0.8];
        let b = [0.5, 0.5, 0.5, 0.5];
        let r = wilcoxon_signed_rank(&a, &b).unwrap();
        assert_eq!(r.n, 3);
    }

    #[test]
    fn test_dropped_zero_forces_normal_approximation() {
        // the last fold scores the same in both runs
        let a = [0.9, 0.8, 0.7, 0.6, 1.0];
        let b = [0.5, 0.5, 0.5, 0.5, 1.0];
        let r = wilcoxon_signed_rank(&a, &b).unwrap();
        assert_eq!(r.n, 4);
        assert_eq!(r.statistic, 0.0);
        assert_eq!(r.method, PValueMethod::Normal);
        // z = (0 − 5) / √7.5
        assert!((r.p_value - 0.067_889_150).abs() < 1e-6, "{}", r.p_value);

        // without the zero the same four differences are tested exactly
        let r = wilcoxon_signed_rank(&a[..4], &b[..4]).unwrap();
        assert_eq!(r.method, PValueMethod::Exact);
        assert!((r.p_value - 0.125).abs() < 1e-15);
    }

    #[test]
    fn test_symmetric_differences_give_p_one() {
        // R+ = 1 + 4 = R− = 2 + 3
        let a = [1.0, -2.0, -3.0, 4.0];
        let b = [0.0; 4];
        let r = wilcoxon_signed_rank(&a, &b).unwrap();
        assert_eq!(r.statistic, 5.0);
        assert_eq!(r.p_value, 1.0);
    }

    #[test]
    fn test_ties_switch_to_normal_approximation() {
        let a = [1.0, 1.0, 2.0, -3.0, 4.0, 5.0];
        let b = [0.0; 6];
        let r = wilcoxon_signed_rank(&a, &b).unwrap();
        assert_eq!(r.method, PValueMethod::Normal);
        assert!(r.p_value > 0.0 && r.p_value < 1.0);
    }

    #[test]
    fn test_large_sample_uses_normal() {
        let a: Vec<f64> = (1..=60).map(|i| i as f64 / 100.0).collect();
        let b = vec![0.0; 60];
        let r = wilcoxon_signed_rank(&a, &b).unwrap();
        assert_eq!(r.method, PValueMethod::Normal);
        assert!(r.p_value < 1e-8, "{}", r.p_value);
    }

    #[test]
    fn test_invalid_inputs() {
        assert!(wilcoxon_signed_rank(&[], &[]).is_err());
        assert!(wilcoxon_signed_rank(&[0.1], &[0.1, 0.2]).is_err());
        assert!(wilcoxon_signed_rank(&[0.3, 0.4], &[0.3, 0.4]).is_err());
        assert!(wilcoxon_signed_rank(&[f64::NAN], &[0.1]).is_err());
    }

    #[test]
    fn test_erfc_reference_points() {
        assert!((erfc(0.0) - 1.0).abs() < 1e-7);
        assert!((erfc(1.0) - 0.157_299_207).abs() < 1e-7);
        assert!((erfc(-1.0) - 1.842_700_793).abs() < 1e-7);
    }
}
