// progression/tie_break.rs

use crate::catalog::Catalog;
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use std::cmp::Reverse;

/// Preference among levels that are ready at the same step
///
/// The generator always takes the first ready level in this order, so every
/// mode is deterministic. With no explicit preference, ties resolve in
/// catalog declaration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TieBreak {
    #[default]
    Declaration,
    ReverseDeclaration,
    /// Fewest layout cells first
    SmallerFirst,
    LargerFirst,
    /// Levels that more of the catalog builds on, directly or transitively, come first
    Frontload,
    Backload,
    /// Reproducible pseudo-random order
    Shuffled { seed: u64 },
}

impl TieBreak {
    /// Sort catalog indices into preference order
    pub(crate) fn arrange(&self, catalog: &Catalog, levels: &mut Vec<usize>) {
        levels.sort_unstable();
        match *self {
            TieBreak::Declaration => {}
            TieBreak::ReverseDeclaration => levels.reverse(),
            TieBreak::SmallerFirst => levels.sort_by_key(|&l| catalog.level_at(l).size()),
            TieBreak::LargerFirst => {
                levels.sort_by_key(|&l| Reverse(catalog.level_at(l).size()))
            }
            TieBreak::Frontload => {
                let graph = catalog.graph();
                levels.sort_by_cached_key(|&l| Reverse(graph.usages(l)))
            }
            TieBreak::Backload => {
                let graph = catalog.graph();
                levels.sort_by_cached_key(|&l| graph.usages(l))
            }
            TieBreak::Shuffled { seed } => {
                let mut rng = StdRng::seed_from_u64(seed);
                levels.shuffle(&mut rng);
            }
        }
    }
}
