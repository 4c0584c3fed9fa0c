//! Decision tree nodes.
//!
//! A tree is an owning recursive structure: every [`Split`] exclusively owns
//! its two children, so trees are acyclic and every leaf is reachable from
//! the root. The serde representation is the wire format of a tree node:
//! `{"type": "leaf", ...}` or `{"type": "split", ...}`.

use crate::sample::{FeatureVector, RiskLevel};

/// A terminal node summarizing the training samples that reached it.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Leaf {
    /// Majority risk level.
    pub prediction: RiskLevel,
    /// Mean failure probability.
    pub probability: f64,
    /// Mean estimated days to failure.
    pub days: f64,
    /// Number of training samples in this leaf.
    #[serde(rename = "samples")]
    pub sample_count: usize,
}

impl Leaf {
    /// Leaf emitted when a branch receives no samples at all.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            prediction: RiskLevel::Medium,
            probability: 0.5,
            days: 100.0,
            sample_count: 0,
        }
    }
}

/// An interior node routing on a single numeric feature.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Split {
    /// Feature name.
    pub feature: String,
    /// Samples with `value < threshold` go left, all others go right.
    pub threshold: f64,
    /// Subtree for `value < threshold`.
    pub left: Box<TreeNode>,
    /// Subtree for `value >= threshold`, including missing values read as 0.
    pub right: Box<TreeNode>,
}

impl Split {
    /// Return `true` if `value` is routed to the left child.
    #[must_use]
    pub fn goes_left(&self, value: f64) -> bool {
        value < self.threshold
    }
}

/// A node of a decision tree.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum TreeNode {
    /// A terminal node.
    Leaf(Leaf),
    /// An interior decision node.
    Split(Split),
}

impl TreeNode {
    /// Return `true` if this node is a leaf.
    #[must_use]
    pub fn is_leaf(&self) -> bool {
        matches!(self, TreeNode::Leaf(_))
    }

    /// Follow the decision path for `features` and return the leaf reached.
    #[must_use]
    pub fn route(&self, features: &FeatureVector) -> &Leaf {
        let mut node = self;
        loop {
            match node {
                TreeNode::Leaf(leaf) => return leaf,
                TreeNode::Split(split) => {
                    node = if split.goes_left(features.value(&split.feature)) {
                        &*split.left
                    } else {
                        &*split.right
                    };
                }
            }
        }
    }

    /// Collect every leaf in left-to-right order.
    #[must_use]
    pub fn leaves(&self) -> Vec<&Leaf> {
        let mut out = Vec::new();
        let mut stack = vec![self];
        while let Some(node) = stack.pop() {
            match node {
                TreeNode::Leaf(leaf) => out.push(leaf),
                TreeNode::Split(split) => {
                    stack.push(&*split.right);
                    stack.push(&*split.left);
                }
            }
        }
        out
    }

    /// Return the number of leaves.
    #[must_use]
    pub fn n_leaves(&self) -> usize {
        self.leaves().len()
    }

    /// Return the number of split nodes.
    #[must_use]
    pub fn n_splits(&self) -> usize {
        match self {
            TreeNode::Leaf(_) => 0,
            TreeNode::Split(split) => 1 + split.left.n_splits() + split.right.n_splits(),
        }
    }

    /// Return the maximum depth. A lone leaf has depth 0.
    #[must_use]
    pub fn depth(&self) -> usize {
        match self {
            TreeNode::Leaf(_) => 0,
            TreeNode::Split(split) => 1 + split.left.depth().max(split.right.depth()),
        }
    }
}
