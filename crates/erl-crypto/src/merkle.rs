use erl_types::Hash256;
use serde::{Deserialize, Serialize};

use crate::hasher::HashScheme;

/// Side of a sibling in a Merkle proof path.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Left,
    Right,
}

/// One level of an inclusion proof, walking from leaf to root.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "step", rename_all = "lowercase")]
pub enum PathStep {
    /// Combine with this sibling; `side` says where the sibling sits.
    Sibling { hash: Hash256, side: Side },
    /// The node was the unpaired last node of its level and moved up unchanged.
    Promoted,
}

/// Binary Merkle tree with odd-node promotion.
///
/// Level 0 holds the leaves in the order given. Each level pairs nodes left
/// to right; an unpaired last node is carried to the next level as-is (never
/// duplicated or hashed with itself). An empty tree has the all-zero root and
/// a single leaf is its own root.
#[derive(Clone, Debug)]
pub struct MerkleTree {
    scheme: HashScheme,
    /// Level 0 = leaves, last level = `[root]`. Empty for an empty tree.
    levels: Vec<Vec<Hash256>>,
}

impl MerkleTree {
    /// Build a tree from leaf digests, keeping every level for proof generation.
    pub fn from_leaves(leaves: Vec<Hash256>, scheme: HashScheme) -> Self {
        if leaves.is_empty() {
            return Self {
                scheme,
                levels: vec![],
            };
        }

        let mut levels = vec![leaves];
        while let Some(current) = levels.last().filter(|level| level.len() > 1) {
            let next = next_level(current, scheme);
            levels.push(next);
        }
        Self { scheme, levels }
    }

    /// The root digest; [`Hash256::ZERO`] for an empty tree.
    pub fn root(&self) -> Hash256 {
        self.levels
            .last()
            .and_then(|top| top.first())
            .copied()
            .unwrap_or(Hash256::ZERO)
    }

    pub fn scheme(&self) -> HashScheme {
        self.scheme
    }

    /// Number of leaves.
    pub fn leaf_count(&self) -> usize {
        self.levels.first().map_or(0, Vec::len)
    }

    /// Number of levels above the leaves.
    pub fn height(&self) -> usize {
        self.levels.len().saturating_sub(1)
    }

    /// Leaf digest at `index`.
    pub fn leaf(&self, index: usize) -> Option<Hash256> {
        self.levels.first().and_then(|leaves| leaves.get(index)).copied()
    }

    /// Generate an inclusion proof for the leaf at `index`.
    pub fn proof(&self, index: usize) -> Option<MerkleProof> {
        let leaf_count = self.leaf_count();
        if index >= leaf_count {
            return None;
        }

        let mut path = Vec::with_capacity(self.height());
        let mut idx = index;
        for level in &self.levels[..self.levels.len() - 1] {
            let step = if idx % 2 == 1 {
                PathStep::Sibling {
                    hash: level[idx - 1],
                    side: Side::Left,
                }
            } else if let Some(right) = level.get(idx + 1) {
                PathStep::Sibling {
                    hash: *right,
                    side: Side::Right,
                }
            } else {
                PathStep::Promoted
            };
            path.push(step);
            idx /= 2;
        }

        Some(MerkleProof {
            leaf_index: index,
            leaf_count,
            path,
        })
    }
}

/// Compute only the root, folding levels in place.
pub fn compute_root(mut nodes: Vec<Hash256>, scheme: HashScheme) -> Hash256 {
    while nodes.len() > 1 {
        nodes = next_level(&nodes, scheme);
    }
    nodes.first().copied().unwrap_or(Hash256::ZERO)
}

fn next_level(level: &[Hash256], scheme: HashScheme) -> Vec<Hash256> {
    level
        .chunks(2)
        .map(|pair| match pair {
            [left, right] => scheme.hash_pair(left, right),
            _ => pair[0],
        })
        .collect()
}

/// Merkle inclusion proof for one leaf.
///
/// `leaf_index` and `leaf_count` fix the shape of the tree, so the verifier
/// knows at every level whether the node is a left child, a right child, or
/// the promoted odd node, and rejects paths that disagree.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MerkleProof {
    pub leaf_index: usize,
    pub leaf_count: usize,
    /// Steps from leaf to root.
    pub path: Vec<PathStep>,
}

impl MerkleProof {
    /// Replay the path from `leaf`, returning the derived root.
    ///
    /// Returns `None` if the path is inconsistent with the tree shape.
    pub fn compute_root(&self, leaf: Hash256, scheme: HashScheme) -> Option<Hash256> {
        if self.leaf_index >= self.leaf_count {
            return None;
        }

        let mut steps = self.path.iter();
        let mut current = leaf;
        let mut idx = self.leaf_index;
        let mut width = self.leaf_count;

        while width > 1 {
            let step = steps.next()?;
            let is_right_child = idx % 2 == 1;
            let is_promoted = !is_right_child && idx + 1 == width;
            current = match (step, is_promoted) {
                (PathStep::Promoted, true) => current,
                (PathStep::Sibling { hash, side: Side::Left }, false) if is_right_child => {
                    scheme.hash_pair(hash, &current)
                }
                (PathStep::Sibling { hash, side: Side::Right }, false) if !is_right_child => {
                    scheme.hash_pair(&current, hash)
                }
                _ => return None,
            };
            idx /= 2;
            width = width.div_ceil(2);
        }

        if steps.next().is_some() {
            return None;
        }
        Some(current)
    }

    /// Verify that `leaf` reaches `root` through this path.
    pub fn verify(&self, leaf: Hash256, root: &Hash256, scheme: HashScheme) -> bool {
        self.compute_root(leaf, scheme)
            .is_some_and(|derived| derived == *root)
    }

    /// Number of sibling hashes carried.
    pub fn sibling_count(&self) -> usize {
        self.path
            .iter()
            .filter(|step| matches!(step, PathStep::Sibling { .. }))
            .count()
    }
}
