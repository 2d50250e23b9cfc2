use rand::seq::index::sample;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;

use crate::config::{ModelConfig, ModelType};
use crate::data_handling::Frame;
use crate::error::{ClassifierError, Result};
use crate::math::Array2;
use crate::models::classifier_trait::{single_class_prediction, ClassifierModel, Prediction};
use crate::models::tree::{split_threshold, Node, Tree};

/// Bagged CART classification trees with per-split feature subsampling.
pub struct RandomForestClassifier {
    params: ModelConfig,
}

#[derive(Debug, Clone, Copy)]
struct ForestSettings {
    n_trees: usize,
    mtry: usize,
    max_depth: Option<usize>,
    min_samples_leaf: usize,
}

impl RandomForestClassifier {
    pub fn new(params: ModelConfig) -> Self {
        RandomForestClassifier { params }
    }

    fn settings(&self, n_features: usize) -> Result<ForestSettings> {
        match &self.params.model_type {
            ModelType::RandomForest {
                n_trees,
                max_features,
                max_depth,
                min_samples_leaf,
            } => {
                if *n_trees == 0 {
                    return Err(ClassifierError::InvalidParameter(
                        "a forest needs at least one tree".to_string(),
                    ));
                }
                let default_mtry = (n_features as f64).sqrt().floor() as usize;
                Ok(ForestSettings {
                    n_trees: *n_trees,
                    mtry: max_features.unwrap_or(default_mtry).clamp(1, n_features.max(1)),
                    max_depth: *max_depth,
                    min_samples_leaf: (*min_samples_leaf).max(1),
                })
            }
            other => Err(ClassifierError::InvalidParameter(format!(
                "Expected ModelType::RandomForest params, got {}",
                other.name()
            ))),
        }
    }

    /// Grow every tree of the forest on bootstrap samples of `x`.
    pub fn fit(&self, x: &Array2<f64>, is_cancer: &[bool]) -> Result<Vec<Tree>> {
        let settings = self.settings(x.ncols())?;
        let n = x.nrows();
        if n == 0 {
            return Err(ClassifierError::Data("cannot grow trees without records".to_string()));
        }

        let base_seed = self.params.seed;
        let trees = (0..settings.n_trees)
            .into_par_iter()
            .map(|tree_idx| {
                let mut rng = ChaCha8Rng::seed_from_u64(base_seed.wrapping_add(tree_idx as u64));
                let rows: Vec<usize> = (0..n).map(|_| rng.gen_range(0..n)).collect();
                let mut nodes = Vec::new();
                grow(x, is_cancer, rows, 0, &settings, &mut rng, &mut nodes);
                Tree::from_nodes(nodes)
            })
            .collect::<Vec<_>>();

        log::debug!(
            "Grew {} trees (mtry {}, mean {:.1} leaves)",
            trees.len(),
            settings.mtry,
            trees.iter().map(Tree::n_leaves).sum::<usize>() as f64 / trees.len() as f64
        );
        Ok(trees)
    }
}

impl ClassifierModel for RandomForestClassifier {
    fn fit_predict(&self, train: &Frame, test: &Frame) -> Result<Prediction> {
        if let Some(prediction) = single_class_prediction(train, test) {
            return Ok(prediction);
        }
        let is_cancer: Vec<bool> = train.y.iter().map(|d| d.is_cancer()).collect();
        let trees = self.fit(&train.x, &is_cancer)?;

        // share of trees voting Cancer
        let scores = test
            .x
            .rows()
            .map(|row| {
                let votes = trees.iter().filter(|t| t.predict(row) > 0.5).count();
                votes as f64 / trees.len() as f64
            })
            .collect();
        Ok(Prediction::from_scores(scores))
    }

    fn name(&self) -> &str {
        "RandomForest"
    }
}

/// Grow the subtree for `rows` and return its node index.
fn grow(
    x: &Array2<f64>,
    is_cancer: &[bool],
    rows: Vec<usize>,
    depth: usize,
    settings: &ForestSettings,
    rng: &mut ChaCha8Rng,
    nodes: &mut Vec<Node>,
) -> usize {
    let n = rows.len();
    let n_cancer = rows.iter().filter(|&&r| is_cancer[r]).count();
    let idx = nodes.len();
    nodes.push(Node::Leaf {
        value: n_cancer as f64 / n as f64,
    });

    let pure = n_cancer == 0 || n_cancer == n;
    let too_deep = settings.max_depth.map_or(false, |d| depth >= d);
    if pure || too_deep || n < 2 * settings.min_samples_leaf {
        return idx;
    }

    let Some((feature, threshold)) = best_gini_split(x, is_cancer, &rows, settings, rng) else {
        return idx;
    };
    let (left_rows, right_rows): (Vec<usize>, Vec<usize>) =
        rows.into_iter().partition(|&r| x[(r, feature)] <= threshold);
    if left_rows.is_empty() || right_rows.is_empty() {
        return idx;
    }

    let left = grow(x, is_cancer, left_rows, depth + 1, settings, rng, nodes);
    let right = grow(x, is_cancer, right_rows, depth + 1, settings, rng, nodes);
    nodes[idx] = Node::Split {
        feature,
        threshold,
        left,
        right,
    };
    idx
}

fn gini(cancer: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    let p = cancer as f64 / total as f64;
    2.0 * p * (1.0 - p)
}

/// Best Gini split among `mtry` randomly drawn features, if any split
/// lowers the impurity.
fn best_gini_split(
    x: &Array2<f64>,
    is_cancer: &[bool],
    rows: &[usize],
    settings: &ForestSettings,
    rng: &mut ChaCha8Rng,
) -> Option<(usize, f64)> {
    let n = rows.len();
    let n_cancer = rows.iter().filter(|&&r| is_cancer[r]).count();
    let parent = gini(n_cancer, n);

    let mut best: Option<(usize, f64, f64)> = None;
    for feature in sample(rng, x.ncols(), settings.mtry).into_iter() {
        let mut pairs: Vec<(f64, bool)> = rows.iter().map(|&r| (x[(r, feature)], is_cancer[r])).collect();
        pairs.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(std::cmp::Ordering::Equal));

        let mut left_cancer = 0usize;
        for i in 0..n - 1 {
            if pairs[i].1 {
                left_cancer += 1;
            }
            let n_left = i + 1;
            let n_right = n - n_left;
            if pairs[i].0 >= pairs[i + 1].0
                || n_left < settings.min_samples_leaf
                || n_right < settings.min_samples_leaf
            {
                continue;
            }
            let weighted = (n_left as f64 * gini(left_cancer, n_left)
                + n_right as f64 * gini(n_cancer - left_cancer, n_right))
                / n as f64;
            let gain = parent - weighted;
            if gain > best.map_or(1e-12, |b| b.2) {
                best = Some((feature, split_threshold(pairs[i].0, pairs[i + 1].0), gain));
            }
        }
    }

    best.map(|(feature, threshold, _)| (feature, threshold))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gini_of_pure_and_mixed_nodes() {
        assert_eq!(gini(0, 4), 0.0);
        assert_eq!(gini(4, 4), 0.0);
        assert!((gini(2, 4) - 0.5).abs() < 1e-12);
    }

    #[test]
    fn single_tree_separates_one_feature() {
        let x = Array2::from_shape_vec((6, 1), vec![0.0, 1.0, 2.0, 10.0, 11.0, 12.0]).unwrap();
        let is_cancer = [false, false, false, true, true, true];
        let settings = ForestSettings {
            n_trees: 1,
            mtry: 1,
            max_depth: None,
            min_samples_leaf: 1,
        };
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let mut nodes = Vec::new();
        grow(&x, &is_cancer, (0..6).collect(), 0, &settings, &mut rng, &mut nodes);
        let tree = Tree::from_nodes(nodes);
        assert_eq!(tree.n_leaves(), 2);
        assert_eq!(tree.predict(&[-100.0]), 0.0);
        assert_eq!(tree.predict(&[100.0]), 1.0);
    }
}
