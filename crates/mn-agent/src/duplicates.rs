//! Duplicate elimination over candidate encodings.

use std::collections::HashSet;

use mn_config::DuplicateEliminationConfig;
use mn_types::SearchSpace;

use crate::genotype::Genotype;

/// Tracks every encoding admitted into the search so far and rejects
/// duplicates under the resolved strategy.
#[derive(Debug)]
pub struct DuplicateEliminator {
    strategy: DuplicateEliminationConfig,
    space: SearchSpace,
    seen: HashSet<Vec<u8>>,
}

impl DuplicateEliminator {
    pub fn new(strategy: DuplicateEliminationConfig, space: SearchSpace) -> Self {
        Self {
            strategy,
            space,
            seen: HashSet::new(),
        }
    }

    /// Comparison key for a genotype under the active strategy.
    pub fn key(&self, genotype: &Genotype) -> Vec<u8> {
        match self.strategy {
            DuplicateEliminationConfig::Default => genotype.ops.clone(),
            DuplicateEliminationConfig::Structural { isomorphic } => {
                genotype.canonical(self.space, isomorphic)
            }
        }
    }

    /// Admit `genotype` if its key is new; returns false for a duplicate.
    pub fn admit(&mut self, genotype: &Genotype) -> bool {
        self.seen.insert(self.key(genotype))
    }

    pub fn admitted(&self) -> usize {
        self.seen.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_strategy_compares_raw_encodings() {
        let mut elim =
            DuplicateEliminator::new(DuplicateEliminationConfig::Default, SearchSpace::Tss);
        // Same computation, different dead-edge ops: distinct raw encodings.
        let a = Genotype {
            ops: vec![0, 2, 3, 1, 4, 2],
        };
        let b = Genotype {
            ops: vec![0, 2, 1, 1, 2, 2],
        };
        assert!(elim.admit(&a));
        assert!(elim.admit(&b));
        assert!(!elim.admit(&a));
        assert_eq!(elim.admitted(), 2);
    }

    #[test]
    fn structural_strategy_folds_isomorphic_encodings() {
        let mut elim = DuplicateEliminator::new(
            DuplicateEliminationConfig::Structural { isomorphic: true },
            SearchSpace::Tss,
        );
        let a = Genotype {
            ops: vec![0, 2, 3, 1, 4, 2],
        };
        let b = Genotype {
            ops: vec![0, 2, 1, 1, 2, 2],
        };
        assert!(elim.admit(&a));
        assert!(!elim.admit(&b)); // same canonical form
        assert_eq!(elim.admitted(), 1);
    }

    #[test]
    fn structural_without_isomorphic_flag_compares_raw() {
        let mut elim = DuplicateEliminator::new(
            DuplicateEliminationConfig::Structural { isomorphic: false },
            SearchSpace::Tss,
        );
        let a = Genotype {
            ops: vec![0, 2, 3, 1, 4, 2],
        };
        let b = Genotype {
            ops: vec![0, 2, 1, 1, 2, 2],
        };
        assert!(elim.admit(&a));
        assert!(elim.admit(&b));
    }
}
