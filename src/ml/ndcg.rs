// ============================================================
// Layer 5 — NDCG@k
// ============================================================
// The one ranking metric every task is scored with.
//
//   DCG@k  = Σ gain[i] / log₂(i + 2)     for positions i < k
//   NDCG@k = DCG@k(predicted order) / DCG@k(ideal order)
//
// Gains are the relevance labels themselves (linear gain).
// When several rows receive the SAME predicted score their order
// is undefined, so instead of picking one arbitrarily their gains
// are averaged across the positions they jointly occupy. A ranker
// that predicts a constant therefore gets the expected score of a
// random order, not a lucky one.
//
// Edge cases:
//   - empty list                → 0.0
//   - every true label is zero  → 0.0 (ideal DCG is zero)
//   - a NaN prediction          → error
//
// Result is always in [0, 1]; a prediction that orders rows
// exactly like their true relevance scores 1.0.

use anyhow::{ensure, Result};

/// NDCG over the top `k` predicted positions.
pub fn ndcg_at_k(relevance: &[f64], predicted: &[f64], k: usize) -> Result<f64> {
    ensure!(
        relevance.len() == predicted.len(),
        "NDCG: {} labels but {} predictions",
        relevance.len(),
        predicted.len()
    );
    ensure!(
        relevance.iter().all(|r| *r >= 0.0),
        "NDCG: relevance labels must be non-negative"
    );
    ensure!(
        predicted.iter().all(|p| !p.is_nan()),
        "NDCG: predicted scores must not be NaN"
    );

    let ideal = ideal_dcg(relevance, k);
    if ideal <= 0.0 {
        return Ok(0.0);
    }
    Ok(tie_averaged_dcg(relevance, predicted, k) / ideal)
}

fn discount(position: usize, k: usize) -> f64 {
    if position < k {
        1.0 / ((position + 2) as f64).log2()
    } else {
        0.0
    }
}

fn ideal_dcg(relevance: &[f64], k: usize) -> f64 {
    let mut sorted = relevance.to_vec();
    sorted.sort_by(|a, b| b.total_cmp(a));
    sorted
        .iter()
        .enumerate()
        .map(|(i, g)| g * discount(i, k))
        .sum()
}

fn tie_averaged_dcg(relevance: &[f64], predicted: &[f64], k: usize) -> f64 {
    let mut order: Vec<usize> = (0..predicted.len()).collect();
    order.sort_by(|&a, &b| predicted[b].total_cmp(&predicted[a]));

    let mut dcg   = 0.0;
    let mut start = 0usize;
    while start < order.len() {
        // [start, end) share one predicted score
        let score = predicted[order[start]];
        let end   = start
            + order[start..]
                .iter()
                .take_while(|&&i| predicted[i] == score)
                .count();

        let mean_gain: f64 =
            order[start..end].iter().map(|&i| relevance[i]).sum::<f64>() / (end - start) as f64;
        let discounts: f64 = (start..end).map(|p| discount(p, k)).sum();

        dcg  += mean_gain * discounts;
        start = end;
    }
    dcg
}
