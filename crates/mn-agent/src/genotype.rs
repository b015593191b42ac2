//! Architecture encodings for the two search spaces.
//!
//! Both spaces use a fixed-length vector of operation indices. TSS encodes
//! the operation on each of the 6 edges of the 4-node cell DAG; SSS encodes
//! the channel-width choice of each of the 5 stages.

use rand::Rng;
use serde::{Deserialize, Serialize};

use mn_types::SearchSpace;

/// TSS cell edges in genotype order, as `(dst, src)` node pairs.
const TSS_EDGES: [(usize, usize); 6] = [(1, 0), (2, 0), (2, 1), (3, 0), (3, 1), (3, 2)];

/// Operation index 0 is the `none` op in the TSS operation set.
const TSS_NONE: u8 = 0;

/// Encoding dimensions of a search space.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpaceDims {
    /// Number of genes.
    pub length: usize,
    /// Choices per gene.
    pub choices: u8,
}

pub fn space_dims(space: SearchSpace) -> SpaceDims {
    match space {
        // 6 edges, ops: none / skip / conv1x1 / conv3x3 / avgpool
        SearchSpace::Tss => SpaceDims {
            length: 6,
            choices: 5,
        },
        // 5 stages, 8 channel-width choices
        SearchSpace::Sss => SpaceDims {
            length: 5,
            choices: 8,
        },
    }
}

/// A candidate architecture encoding.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Genotype {
    pub ops: Vec<u8>,
}

impl Genotype {
    /// Uniform random sample from the search space.
    pub fn sample<R: Rng>(space: SearchSpace, rng: &mut R) -> Self {
        let dims = space_dims(space);
        let ops = (0..dims.length).map(|_| rng.gen_range(0..dims.choices)).collect();
        Self { ops }
    }

    /// Uniform crossover: each gene comes from either parent with equal
    /// probability.
    pub fn crossover<R: Rng>(&self, other: &Self, rng: &mut R) -> Self {
        let ops = self
            .ops
            .iter()
            .zip(&other.ops)
            .map(|(&a, &b)| if rng.gen_bool(0.5) { a } else { b })
            .collect();
        Self { ops }
    }

    /// Point mutation: each gene is re-drawn with probability `prob`.
    pub fn mutate<R: Rng>(&mut self, space: SearchSpace, prob: f64, rng: &mut R) {
        let dims = space_dims(space);
        for op in &mut self.ops {
            if rng.gen_bool(prob) {
                *op = rng.gen_range(0..dims.choices);
            }
        }
    }

    /// Comparison key under the structural duplicate-elimination strategy.
    ///
    /// With `isomorphic` set, TSS edges whose source node is unreachable
    /// (cut off by `none` ops) are normalized to `none`: two encodings that
    /// differ only on dead edges describe the same computation. SSS encodings
    /// have no graph structure; their canonical form is the raw vector.
    pub fn canonical(&self, space: SearchSpace, isomorphic: bool) -> Vec<u8> {
        if space != SearchSpace::Tss || !isomorphic {
            return self.ops.clone();
        }

        let mut reachable = [false; 4];
        reachable[0] = true;
        for (edge, &(dst, src)) in TSS_EDGES.iter().enumerate() {
            if reachable[src] && self.ops[edge] != TSS_NONE {
                reachable[dst] = true;
            }
        }

        TSS_EDGES
            .iter()
            .enumerate()
            .map(|(edge, &(_, src))| {
                if reachable[src] {
                    self.ops[edge]
                } else {
                    TSS_NONE
                }
            })
            .collect()
    }
}
