//! Random forest classifier
//!
//! Bagged ensemble of Gini decision trees with random feature subsets at
//! every split. Trees are stored as flat node arenas so arbitrarily deep
//! trees serialize without nesting.

use super::Classifier;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::debug;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ForestError {
    #[error("cannot fit on an empty training set")]
    EmptyTrainingSet,

    #[error("feature rows ({rows}) and labels ({labels}) differ in length")]
    LengthMismatch { rows: usize, labels: usize },

    #[error("row {row} has {found} features, expected {expected}")]
    RaggedRow {
        row: usize,
        expected: usize,
        found: usize,
    },

    #[error("label {label} is outside 0..{n_classes}")]
    LabelOutOfRange { label: usize, n_classes: usize },

    #[error("n_estimators must be at least 1")]
    NoEstimators,
}

/// Forest hyperparameters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForestParams {
    pub n_estimators: usize,
    /// None grows trees until leaves are pure
    pub max_depth: Option<usize>,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
    pub random_state: u64,
}

impl Default for ForestParams {
    fn default() -> Self {
        Self {
            n_estimators: 100,
            max_depth: None,
            min_samples_split: 2,
            min_samples_leaf: 1,
            random_state: 0,
        }
    }
}

impl ForestParams {
    pub fn with_random_state(mut self, random_state: u64) -> Self {
        self.random_state = random_state;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
enum TreeNode {
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    /// Per-class sample counts reaching this leaf
    Leaf { counts: Vec<u32> },
}

/// A single decision tree; node 0 is the root
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionTree {
    nodes: Vec<TreeNode>,
}

impl DecisionTree {
    fn leaf_counts(&self, row: &[f64]) -> &[u32] {
        let mut idx = 0;
        loop {
            match &self.nodes[idx] {
                TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    idx = if row[*feature] <= *threshold { *left } else { *right };
                }
                TreeNode::Leaf { counts } => return counts,
            }
        }
    }

    pub fn n_nodes(&self) -> usize {
        self.nodes.len()
    }

    pub fn n_leaves(&self) -> usize {
        self.nodes
            .iter()
            .filter(|n| matches!(n, TreeNode::Leaf { .. }))
            .count()
    }

    /// Depth of the deepest leaf (a single leaf has depth 0)
    pub fn depth(&self) -> usize {
        let mut max_depth = 0;
        let mut stack = vec![(0usize, 0usize)];
        while let Some((idx, depth)) = stack.pop() {
            match &self.nodes[idx] {
                TreeNode::Split { left, right, .. } => {
                    stack.push((*left, depth + 1));
                    stack.push((*right, depth + 1));
                }
                TreeNode::Leaf { .. } => max_depth = max_depth.max(depth),
            }
        }
        max_depth
    }
}

/// Work item for iterative tree growth: a node and its sample range
struct Pending {
    node: usize,
    start: usize,
    end: usize,
    depth: usize,
}

struct SplitCandidate {
    feature: usize,
    threshold: f64,
    impurity: f64,
}

/// Grows one tree over a bootstrap sample
struct TreeBuilder<'a> {
    x: &'a [Vec<f64>],
    y: &'a [usize],
    n_classes: usize,
    max_features: usize,
    params: &'a ForestParams,
}

impl<'a> TreeBuilder<'a> {
    fn build(&self, mut samples: Vec<usize>, rng: &mut StdRng) -> DecisionTree {
        let mut nodes = vec![TreeNode::Leaf { counts: Vec::new() }];
        let mut stack = vec![Pending {
            node: 0,
            start: 0,
            end: samples.len(),
            depth: 0,
        }];
        let mut features: Vec<usize> = (0..self.x[0].len()).collect();

        while let Some(item) = stack.pop() {
            let slice = &mut samples[item.start..item.end];
            let counts = self.class_counts(slice);

            if !self.should_split(&counts, slice.len(), item.depth) {
                nodes[item.node] = TreeNode::Leaf { counts };
                continue;
            }

            let Some(split) = self.best_split(slice, &mut features, rng) else {
                nodes[item.node] = TreeNode::Leaf { counts };
                continue;
            };

            let n_left = partition(slice, |&i| self.x[i][split.feature] <= split.threshold);
            let left = nodes.len();
            let right = left + 1;
            nodes.push(TreeNode::Leaf { counts: Vec::new() });
            nodes.push(TreeNode::Leaf { counts: Vec::new() });
            nodes[item.node] = TreeNode::Split {
                feature: split.feature,
                threshold: split.threshold,
                left,
                right,
            };

            let mid = item.start + n_left;
            stack.push(Pending {
                node: right,
                start: mid,
                end: item.end,
                depth: item.depth + 1,
            });
            stack.push(Pending {
                node: left,
                start: item.start,
                end: mid,
                depth: item.depth + 1,
            });
        }

        DecisionTree { nodes }
    }

    fn class_counts(&self, samples: &[usize]) -> Vec<u32> {
        let mut counts = vec![0u32; self.n_classes];
        for &i in samples {
            counts[self.y[i]] += 1;
        }
        counts
    }

    fn should_split(&self, counts: &[u32], n_samples: usize, depth: usize) -> bool {
        let pure = counts.iter().filter(|&&c| c > 0).count() <= 1;
        let depth_reached = self.params.max_depth.is_some_and(|d| depth >= d);
        !pure && !depth_reached && n_samples >= self.params.min_samples_split
    }

    /// Draw features in random order; look at `max_features` of them, and
    /// past that only until a valid split exists.
    fn best_split(
        &self,
        samples: &[usize],
        features: &mut [usize],
        rng: &mut StdRng,
    ) -> Option<SplitCandidate> {
        let mut best: Option<SplitCandidate> = None;
        let mut sorted: Vec<(f64, usize)> = Vec::with_capacity(samples.len());

        for drawn in 0..features.len() {
            if drawn >= self.max_features && best.is_some() {
                break;
            }
            let pick = rng.gen_range(drawn..features.len());
            features.swap(drawn, pick);
            let feature = features[drawn];

            sorted.clear();
            sorted.extend(samples.iter().map(|&i| (self.x[i][feature], self.y[i])));
            sorted.sort_by(|a, b| a.0.total_cmp(&b.0));

            if let Some(candidate) = self.scan_feature(feature, &sorted) {
                if best.as_ref().map_or(true, |b| candidate.impurity < b.impurity) {
                    best = Some(candidate);
                }
            }
        }

        best
    }

    /// Sweep sorted values and return the lowest weighted Gini threshold
    fn scan_feature(&self, feature: usize, sorted: &[(f64, usize)]) -> Option<SplitCandidate> {
        let n = sorted.len();
        let min_leaf = self.params.min_samples_leaf.max(1);
        if n < 2 * min_leaf || sorted[0].0 == sorted[n - 1].0 {
            return None;
        }

        let mut right = vec![0u32; self.n_classes];
        for &(_, label) in sorted {
            right[label] += 1;
        }
        let mut left = vec![0u32; self.n_classes];
        let mut best: Option<SplitCandidate> = None;

        for pos in 0..n - 1 {
            let label = sorted[pos].1;
            left[label] += 1;
            right[label] -= 1;

            let n_left = pos + 1;
            let n_right = n - n_left;
            if sorted[pos].0 == sorted[pos + 1].0 || n_left < min_leaf || n_right < min_leaf {
                continue;
            }

            let impurity = (n_left as f64 * gini(&left, n_left)
                + n_right as f64 * gini(&right, n_right))
                / n as f64;

            if best.as_ref().map_or(true, |b| impurity < b.impurity) {
                let lo = sorted[pos].0;
                let hi = sorted[pos + 1].0;
                let mut threshold = lo + (hi - lo) / 2.0;
                if threshold >= hi {
                    threshold = lo;
                }
                best = Some(SplitCandidate {
                    feature,
                    threshold,
                    impurity,
                });
            }
        }

        best
    }
}

fn gini(counts: &[u32], total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    let n = total as f64;
    1.0 - counts
        .iter()
        .map(|&c| {
            let p = c as f64 / n;
            p * p
        })
        .sum::<f64>()
}

/// In-place partition; returns the number of elements satisfying `pred`
fn partition<F: Fn(&usize) -> bool>(slice: &mut [usize], pred: F) -> usize {
    let mut next = 0;
    for i in 0..slice.len() {
        if pred(&slice[i]) {
            slice.swap(next, i);
            next += 1;
        }
    }
    next
}

/// Bagged ensemble of decision trees
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RandomForestClassifier {
    params: ForestParams,
    n_features: usize,
    n_classes: usize,
    trees: Vec<DecisionTree>,
}

impl RandomForestClassifier {
    pub fn new(params: ForestParams) -> Self {
        Self {
            params,
            n_features: 0,
            n_classes: 0,
            trees: Vec::new(),
        }
    }

    /// Fit the forest on encoded rows and class labels in `0..n_classes`
    pub fn fit(
        &mut self,
        x: &[Vec<f64>],
        y: &[usize],
        n_classes: usize,
    ) -> Result<(), ForestError> {
        if self.params.n_estimators == 0 {
            return Err(ForestError::NoEstimators);
        }
        if x.is_empty() {
            return Err(ForestError::EmptyTrainingSet);
        }
        if x.len() != y.len() {
            return Err(ForestError::LengthMismatch {
                rows: x.len(),
                labels: y.len(),
            });
        }
        let n_features = x[0].len();
        if let Some((row, r)) = x.iter().enumerate().find(|(_, r)| r.len() != n_features) {
            return Err(ForestError::RaggedRow {
                row,
                expected: n_features,
                found: r.len(),
            });
        }
        if let Some(&label) = y.iter().find(|&&l| l >= n_classes) {
            return Err(ForestError::LabelOutOfRange { label, n_classes });
        }

        let n_samples = x.len();
        let max_features = ((n_features as f64).sqrt() as usize).max(1);
        let builder = TreeBuilder {
            x,
            y,
            n_classes,
            max_features,
            params: &self.params,
        };

        let mut seeder = StdRng::seed_from_u64(self.params.random_state);
        let mut trees = Vec::with_capacity(self.params.n_estimators);
        for _ in 0..self.params.n_estimators {
            let mut rng = StdRng::seed_from_u64(seeder.gen());
            let bootstrap: Vec<usize> = (0..n_samples)
                .map(|_| rng.gen_range(0..n_samples))
                .collect();
            trees.push(builder.build(bootstrap, &mut rng));
        }

        debug!(
            n_trees = trees.len(),
            n_samples,
            n_features,
            max_features,
            avg_depth = trees.iter().map(|t| t.depth()).sum::<usize>() as f64 / trees.len() as f64,
            "Random forest fitted"
        );

        self.trees = trees;
        self.n_features = n_features;
        self.n_classes = n_classes;
        Ok(())
    }

    pub fn predict_proba(&self, x: &[Vec<f64>]) -> Vec<Vec<f64>> {
        x.iter().map(|row| self.predict_proba_row(row)).collect()
    }

    pub fn predict(&self, x: &[Vec<f64>]) -> Vec<usize> {
        x.iter().map(|row| self.predict_row(row)).collect()
    }

    /// Classification accuracy on labelled rows
    pub fn score(&self, x: &[Vec<f64>], y: &[usize]) -> f64 {
        if y.is_empty() {
            return 0.0;
        }
        let correct = self
            .predict(x)
            .iter()
            .zip(y)
            .filter(|(pred, truth)| pred == truth)
            .count();
        correct as f64 / y.len() as f64
    }

    pub fn params(&self) -> &ForestParams {
        &self.params
    }

    pub fn trees(&self) -> &[DecisionTree] {
        &self.trees
    }

    pub fn is_fitted(&self) -> bool {
        !self.trees.is_empty()
    }
}

impl Classifier for RandomForestClassifier {
    fn n_features(&self) -> usize {
        self.n_features
    }

    fn n_classes(&self) -> usize {
        self.n_classes
    }

    /// Mean of per-tree leaf class frequencies
    fn predict_proba_row(&self, row: &[f64]) -> Vec<f64> {
        let mut proba = vec![0.0; self.n_classes];
        if self.trees.is_empty() {
            return proba;
        }

        for tree in &self.trees {
            let counts = tree.leaf_counts(row);
            let total: u32 = counts.iter().sum();
            if total == 0 {
                continue;
            }
            for (p, &c) in proba.iter_mut().zip(counts) {
                *p += c as f64 / total as f64;
            }
        }

        let n_trees = self.trees.len() as f64;
        proba.iter_mut().for_each(|p| *p /= n_trees);
        proba
    }
}
