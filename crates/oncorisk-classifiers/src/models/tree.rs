//! Binary decision tree stored as a flat node arena.
//!
//! Shared by the random forest (class-fraction leaves) and gradient boosting
//! (Newton-step leaves). Rows go left when `row[feature] <= threshold`, so
//! any finite value, seen during training or not, reaches a leaf.

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Node {
    Leaf {
        value: f64,
    },
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Tree {
    nodes: Vec<Node>,
}

impl Tree {
    /// Wrap an arena whose root is node 0.
    pub fn from_nodes(nodes: Vec<Node>) -> Self {
        assert!(!nodes.is_empty(), "a tree needs at least a root node");
        Tree { nodes }
    }

    pub fn predict(&self, row: &[f64]) -> f64 {
        let mut idx = 0;
        loop {
            match self.nodes[idx] {
                Node::Leaf { value } => return value,
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    idx = if row[feature] <= threshold { left } else { right };
                }
            }
        }
    }

    pub fn n_nodes(&self) -> usize {
        self.nodes.len()
    }

    pub fn n_leaves(&self) -> usize {
        self.nodes
            .iter()
            .filter(|n| matches!(n, Node::Leaf { .. }))
            .count()
    }
}

/// Threshold between two consecutive distinct sorted values `a < b`.
///
/// Always satisfies `a <= t < b`, even when the midpoint rounds up to `b`.
pub fn split_threshold(a: f64, b: f64) -> f64 {
    let mid = a + (b - a) / 2.0;
    if mid < b {
        mid
    } else {
        a
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn routes_rows_by_threshold() {
        let tree = Tree::from_nodes(vec![
            Node::Split {
                feature: 1,
                threshold: 0.5,
                left: 1,
                right: 2,
            },
            Node::Leaf { value: -1.0 },
            Node::Leaf { value: 1.0 },
        ]);
        assert_eq!(tree.predict(&[9.0, 0.5]), -1.0);
        assert_eq!(tree.predict(&[9.0, 0.6]), 1.0);
        // far outside anything seen in training
        assert_eq!(tree.predict(&[0.0, 1e300]), 1.0);
        assert_eq!(tree.n_leaves(), 2);
    }

    #[test]
    fn threshold_separates_adjacent_values() {
        let a = 1.0f64;
        let b = f64::from_bits(a.to_bits() + 1);
        let t = split_threshold(a, b);
        assert!(a <= t && t < b);
        assert_eq!(split_threshold(1.0, 3.0), 2.0);
    }
}
