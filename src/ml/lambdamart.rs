// ============================================================
// Layer 5 — LambdaMART Ranker
// ============================================================
// Gradient-boosted regression trees trained with the lambdarank
// objective: the list-wise ranker behind every fold of the
// evaluator.
//
// One boosting round:
//
//   1. For every query list, compare every pair (hi, lo) with
//      label[hi] > label[lo]. The pair pushes hi up and lo down
//      with a force ("lambda") proportional to how much NDCG would
//      change if the two swapped places:
//
//        ρ      = 1 / (1 + exp(σ · (s_hi − s_lo)))
//        λ      = σ · ρ · |ΔNDCG|
//        grad  -= λ for hi, += λ for lo
//        hess  += σ² · ρ(1 − ρ) · |ΔNDCG| for both
//
//      Gains are 2^label − 1, discounts 1 / log₂(rank + 2).
//
//   2. Grow one regression tree on (grad, hess), leaf-wise: always
//      split the leaf with the largest gain until `num_leaves`
//      leaves exist or no split is worth making.
//
//        gain = G_L²/(H_L+λ₂) + G_R²/(H_R+λ₂) − G²/(H+λ₂)
//        leaf = −G / (H + λ₂)
//
//   3. Add learning_rate × tree to every row's score.
//
// Reference: Burges (2010) From RankNet to LambdaRank to LambdaMART
//            Ke et al. (2017) LightGBM

use anyhow::{bail, ensure, Result};
use rand::{rngs::StdRng, seq::SliceRandom, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::domain::task::Task;
use crate::domain::traits::Ranker;

// ─── Configuration ────────────────────────────────────────────────────────────
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LambdaMartConfig {
    /// Number of boosting rounds (trees)
    pub n_estimators:            usize,
    /// Shrinkage applied to every tree's output
    pub learning_rate:           f64,
    /// Maximum leaves per tree
    pub num_leaves:              usize,
    /// A split is rejected if either side gets fewer rows
    pub min_data_in_leaf:        usize,
    /// A split is rejected if either side's hessian sum is smaller
    pub min_sum_hessian_in_leaf: f64,
    /// L2 regularisation on leaf values
    pub lambda_l2:               f64,
    /// Fraction of features sampled per tree (1.0 = all)
    pub feature_fraction:        f64,
    /// Steepness of the pairwise sigmoid
    pub sigmoid:                 f64,
    /// Seed for feature sampling
    pub seed:                    u64,
}

impl Default for LambdaMartConfig {
    fn default() -> Self {
        Self {
            n_estimators:            100,
            learning_rate:           0.1,
            num_leaves:              31,
            min_data_in_leaf:        20,
            min_sum_hessian_in_leaf: 1e-3,
            lambda_l2:               0.0,
            feature_fraction:        1.0,
            sigmoid:                 1.0,
            seed:                    0,
        }
    }
}

impl LambdaMartConfig {
    /// Hyper-parameters used by each task's published experiment.
    pub fn for_task(task: Task) -> Self {
        let base = Self {
            num_leaves:       16,
            min_data_in_leaf: 5,
            ..Self::default()
        };
        match task {
            Task::Mt => Self {
                feature_fraction: 0.8,
                seed:             50,
                ..base
            },
            _ => base,
        }
    }
}

// ─── Trees ────────────────────────────────────────────────────────────────────
#[derive(Debug, Clone)]
enum Node {
    Leaf {
        value: f64,
    },
    Split {
        feature:   usize,
        threshold: f64,
        left:      usize,
        right:     usize,
    },
}

#[derive(Debug, Clone)]
struct Tree {
    nodes: Vec<Node>,
}

impl Tree {
    fn predict(&self, row: &[f64]) -> f64 {
        let mut i = 0;
        loop {
            match &self.nodes[i] {
                Node::Leaf { value } => return *value,
                Node::Split { feature, threshold, left, right } => {
                    i = if row[*feature] <= *threshold { *left } else { *right };
                }
            }
        }
    }

    fn leaf_count(&self) -> usize {
        self.nodes.iter().filter(|n| matches!(n, Node::Leaf { .. })).count()
    }
}

#[derive(Debug, Clone, Copy)]
struct SplitCandidate {
    feature:   usize,
    threshold: f64,
    gain:      f64,
}

/// A leaf that may still be split.
struct OpenLeaf {
    node:  usize,
    rows:  Vec<usize>,
    sum_g: f64,
    sum_h: f64,
    best:  Option<SplitCandidate>,
}

// ─── LambdaMart ───────────────────────────────────────────────────────────────
pub struct LambdaMart {
    config:     LambdaMartConfig,
    trees:      Vec<Tree>,
    n_features: Option<usize>,
}

impl LambdaMart {
    pub fn new(config: LambdaMartConfig) -> Self {
        Self { config, trees: Vec::new(), n_features: None }
    }

    pub fn tree_count(&self) -> usize {
        self.trees.len()
    }

    fn raw_score(&self, row: &[f64]) -> f64 {
        self.trees.iter().map(|t| t.predict(row)).sum()
    }

    /// Lambda gradients and hessians for the current scores.
    fn lambdas(
        &self,
        labels:  &[f64],
        scores:  &[f64],
        queries: &[(usize, usize)],
    ) -> (Vec<f64>, Vec<f64>) {
        let sigma    = self.config.sigmoid;
        let mut grad = vec![0.0; labels.len()];
        let mut hess = vec![0.0; labels.len()];

        for &(start, end) in queries {
            let q_labels = &labels[start..end];
            let q_scores = &scores[start..end];

            let max_dcg = max_dcg(q_labels);
            if max_dcg <= 0.0 {
                continue;
            }

            // Current position of every row in the list
            let mut order: Vec<usize> = (0..q_labels.len()).collect();
            order.sort_by(|&a, &b| q_scores[b].total_cmp(&q_scores[a]));
            let mut position = vec![0usize; q_labels.len()];
            for (pos, &i) in order.iter().enumerate() {
                position[i] = pos;
            }

            let best  = q_scores[order[0]];
            let worst = q_scores[order[order.len() - 1]];

            let mut sum_lambdas = 0.0;
            for hi in 0..q_labels.len() {
                for lo in 0..q_labels.len() {
                    if q_labels[hi] <= q_labels[lo] {
                        continue;
                    }
                    let delta_score = q_scores[hi] - q_scores[lo];
                    let gap = label_gain(q_labels[hi]) - label_gain(q_labels[lo]);
                    let paired_discount =
                        (rank_discount(position[hi]) - rank_discount(position[lo])).abs();

                    let mut delta_ndcg = gap * paired_discount / max_dcg;
                    // Pairs that are already far apart matter less
                    if best != worst {
                        delta_ndcg /= 0.01 + delta_score.abs();
                    }

                    let rho     = 1.0 / (1.0 + (sigma * delta_score).exp());
                    let lambda  = sigma * rho * delta_ndcg;
                    let hessian = sigma * sigma * rho * (1.0 - rho) * delta_ndcg;

                    grad[start + hi] -= lambda;
                    grad[start + lo] += lambda;
                    hess[start + hi] += hessian;
                    hess[start + lo] += hessian;
                    sum_lambdas += 2.0 * lambda;
                }
            }

            if sum_lambdas > 0.0 {
                let norm = (1.0 + sum_lambdas).log2() / sum_lambdas;
                for i in start..end {
                    grad[i] *= norm;
                    hess[i] *= norm;
                }
            }
        }

        (grad, hess)
    }

    fn sample_features(&self, rng: &mut StdRng, n_features: usize) -> Vec<usize> {
        let mut all: Vec<usize> = (0..n_features).collect();
        if self.config.feature_fraction >= 1.0 {
            return all;
        }
        let keep = ((n_features as f64 * self.config.feature_fraction).round() as usize)
            .clamp(1, n_features);
        all.shuffle(rng);
        all.truncate(keep);
        all.sort_unstable();
        all
    }

    /// Grow one tree leaf-wise on the given gradients.
    fn grow_tree(
        &self,
        features:  &[Vec<f64>],
        grad:      &[f64],
        hess:      &[f64],
        candidates: &[usize],
    ) -> Tree {
        let cfg  = &self.config;
        let rows: Vec<usize> = (0..features.len()).collect();

        let mut nodes = vec![Node::Leaf { value: 0.0 }];
        let mut root  = OpenLeaf {
            node:  0,
            sum_g: rows.iter().map(|&r| grad[r]).sum(),
            sum_h: rows.iter().map(|&r| hess[r]).sum(),
            rows,
            best:  None,
        };
        root.best = self.best_split(features, grad, hess, &root, candidates);
        let mut open = vec![root];

        while open.len() < cfg.num_leaves.max(1) {
            // Leaf with the largest positive gain
            let pick = open
                .iter()
                .enumerate()
                .filter_map(|(i, leaf)| leaf.best.map(|b| (i, b.gain)))
                .filter(|(_, gain)| *gain > 0.0)
                .max_by(|a, b| a.1.total_cmp(&b.1))
                .map(|(i, _)| i);
            let Some(pick) = pick else { break };

            let leaf  = open.swap_remove(pick);
            let Some(split) = leaf.best else { break };
            let (left_rows, right_rows): (Vec<usize>, Vec<usize>) = leaf
                .rows
                .iter()
                .partition(|&&r| features[r][split.feature] <= split.threshold);

            let left_id  = nodes.len();
            let right_id = left_id + 1;
            nodes.push(Node::Leaf { value: 0.0 });
            nodes.push(Node::Leaf { value: 0.0 });
            nodes[leaf.node] = Node::Split {
                feature:   split.feature,
                threshold: split.threshold,
                left:      left_id,
                right:     right_id,
            };

            for (node, rows) in [(left_id, left_rows), (right_id, right_rows)] {
                let mut child = OpenLeaf {
                    node,
                    sum_g: rows.iter().map(|&r| grad[r]).sum(),
                    sum_h: rows.iter().map(|&r| hess[r]).sum(),
                    rows,
                    best:  None,
                };
                child.best = self.best_split(features, grad, hess, &child, candidates);
                open.push(child);
            }
        }

        for leaf in &open {
            let denom = leaf.sum_h + cfg.lambda_l2;
            let value = if denom > f64::EPSILON {
                -leaf.sum_g / denom * cfg.learning_rate
            } else {
                0.0
            };
            nodes[leaf.node] = Node::Leaf { value };
        }

        Tree { nodes }
    }

    /// Best threshold over the candidate features for one leaf.
    fn best_split(
        &self,
        features:   &[Vec<f64>],
        grad:       &[f64],
        hess:       &[f64],
        leaf:       &OpenLeaf,
        candidates: &[usize],
    ) -> Option<SplitCandidate> {
        let cfg = &self.config;
        let n   = leaf.rows.len();
        if n < 2 * cfg.min_data_in_leaf.max(1) || leaf.sum_h < 2.0 * cfg.min_sum_hessian_in_leaf {
            return None;
        }

        let parent = leaf.sum_g * leaf.sum_g / (leaf.sum_h + cfg.lambda_l2);
        let mut best: Option<SplitCandidate> = None;
        let mut sorted = leaf.rows.clone();

        for &f in candidates {
            sorted.sort_by(|&a, &b| features[a][f].total_cmp(&features[b][f]));

            let mut left_g = 0.0;
            let mut left_h = 0.0;
            for pos in 0..n - 1 {
                let r = sorted[pos];
                left_g += grad[r];
                left_h += hess[r];

                let here = features[r][f];
                let next = features[sorted[pos + 1]][f];
                if here == next {
                    continue;
                }

                let n_left  = pos + 1;
                let n_right = n - n_left;
                let right_g = leaf.sum_g - left_g;
                let right_h = leaf.sum_h - left_h;
                if n_left < cfg.min_data_in_leaf
                    || n_right < cfg.min_data_in_leaf
                    || left_h < cfg.min_sum_hessian_in_leaf
                    || right_h < cfg.min_sum_hessian_in_leaf
                {
                    continue;
                }

                let gain = left_g * left_g / (left_h + cfg.lambda_l2)
                    + right_g * right_g / (right_h + cfg.lambda_l2)
                    - parent;
                if best.map_or(true, |b| gain > b.gain) {
                    best = Some(SplitCandidate {
                        feature:   f,
                        threshold: (here + next) / 2.0,
                        gain,
                    });
                }
            }
        }

        best
    }
}

impl Ranker for LambdaMart {
    fn fit(&mut self, features: &[Vec<f64>], labels: &[f64], group_sizes: &[usize]) -> Result<()> {
        ensure!(!features.is_empty(), "Cannot fit a ranker on zero rows");
        ensure!(
            features.len() == labels.len(),
            "{} feature rows but {} labels",
            features.len(),
            labels.len()
        );
        let total: usize = group_sizes.iter().sum();
        ensure!(
            total == features.len(),
            "Group sizes sum to {total} but there are {} rows",
            features.len()
        );
        let width = features[0].len();
        ensure!(width > 0, "Cannot fit a ranker without features");
        if let Some(bad) = features.iter().position(|r| r.len() != width) {
            bail!("Row {bad} has {} features, expected {width}", features[bad].len());
        }
        if let Some(bad) = features.iter().flatten().find(|v| v.is_nan()) {
            bail!("Feature matrix contains {bad}");
        }

        // Consecutive [start, end) ranges, empty lists skipped
        let mut queries = Vec::with_capacity(group_sizes.len());
        let mut start   = 0usize;
        for &size in group_sizes {
            if size > 0 {
                queries.push((start, start + size));
            }
            start += size;
        }

        self.trees.clear();
        self.n_features = Some(width);

        let mut rng    = StdRng::seed_from_u64(self.config.seed);
        let mut scores = vec![0.0; features.len()];

        for round in 0..self.config.n_estimators {
            let (grad, hess) = self.lambdas(labels, &scores, &queries);
            let candidates   = self.sample_features(&mut rng, width);
            let tree         = self.grow_tree(features, &grad, &hess, &candidates);

            for (score, row) in scores.iter_mut().zip(features) {
                *score += tree.predict(row);
            }
            if round == 0 {
                tracing::trace!("First tree has {} leaves", tree.leaf_count());
            }
            self.trees.push(tree);
        }

        tracing::debug!(
            "LambdaMART fitted: {} rows, {} lists, {} trees",
            features.len(),
            queries.len(),
            self.tree_count()
        );
        Ok(())
    }

    fn predict(&self, features: &[Vec<f64>]) -> Result<Vec<f64>> {
        let Some(width) = self.n_features else {
            bail!("Ranker has not been fitted");
        };
        features
            .iter()
            .enumerate()
            .map(|(i, row)| {
                ensure!(row.len() == width, "Row {i} has {} features, expected {width}", row.len());
                Ok(self.raw_score(row))
            })
            .collect()
    }
}

fn label_gain(label: f64) -> f64 {
    2f64.powf(label) - 1.0
}

fn rank_discount(position: usize) -> f64 {
    1.0 / ((position + 2) as f64).log2()
}

fn max_dcg(labels: &[f64]) -> f64 {
    let mut sorted = labels.to_vec();
    sorted.sort_by(|a, b| b.total_cmp(a));
    sorted
        .iter()
        .enumerate()
        .map(|(i, &l)| label_gain(l) * rank_discount(i))
        .sum()
}
