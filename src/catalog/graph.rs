// catalog/graph.rs

use super::level::{Concept, Level};
use std::collections::BTreeSet;

/// One required concept and the levels that could satisfy it
///
/// Candidates never include the requiring level itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Requirement {
    pub concept: Concept,
    pub candidates: Vec<usize>,
}

impl Requirement {
    /// Is this requirement met by any level in `placed`?
    pub fn satisfied_by(&self, placed: &[bool]) -> bool {
        self.candidates.iter().any(|&c| placed[c])
    }
}

/// Possible-predecessor structure derived from a catalog
///
/// An edge A -> B exists when B requires a concept A introduces. Because a
/// concept can have several introducers, each requirement keeps its whole
/// candidate set rather than a single edge.
#[derive(Debug, Clone)]
pub struct DependencyGraph {
    requirements: Vec<Vec<Requirement>>,
    dependents: Vec<BTreeSet<usize>>,
    depths: Vec<Option<usize>>,
}

impl DependencyGraph {
    /// Build from validated levels (every requirement has at least one candidate)
    pub(crate) fn build(levels: &[Level]) -> Self {
        let n = levels.len();
        let mut requirements = Vec::with_capacity(n);
        let mut dependents = vec![BTreeSet::new(); n];

        for (idx, level) in levels.iter().enumerate() {
            let reqs: Vec<Requirement> = level
                .requires
                .iter()
                .map(|concept| {
                    let candidates: Vec<usize> = levels
                        .iter()
                        .enumerate()
                        .filter(|&(other, l)| other != idx && l.introduces(concept))
                        .map(|(other, _)| other)
                        .collect();
                    for &c in &candidates {
                        dependents[c].insert(idx);
                    }
                    Requirement {
                        concept: concept.clone(),
                        candidates,
                    }
                })
                .collect();
            requirements.push(reqs);
        }

        let depths = grounded_depths(&requirements);

        DependencyGraph {
            requirements,
            dependents,
            depths,
        }
    }

    pub fn len(&self) -> usize {
        self.requirements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.requirements.is_empty()
    }

    /// Requirements of a level, in concept order
    pub fn requirements(&self, level: usize) -> &[Requirement] {
        &self.requirements[level]
    }

    /// Levels that list `level` as a candidate predecessor
    pub fn dependents(&self, level: usize) -> &BTreeSet<usize> {
        &self.dependents[level]
    }

    /// Number of distinct levels that build on `level` directly or through other levels
    pub fn usages(&self, level: usize) -> usize {
        let mut seen = BTreeSet::new();
        let mut stack: Vec<usize> = self.dependents[level].iter().copied().collect();
        while let Some(next) = stack.pop() {
            if next != level && seen.insert(next) {
                stack.extend(self.dependents[next].iter().copied());
            }
        }
        seen.len()
    }

    /// Shortest grounded prerequisite chain length
    ///
    /// Zero for levels without requirements. `None` when every way of
    /// satisfying some requirement runs back into a cycle.
    pub fn depth(&self, level: usize) -> Option<usize> {
        self.depths[level]
    }

    /// Are all of `level`'s requirements met by `placed`?
    pub fn is_ready(&self, level: usize, placed: &[bool]) -> bool {
        self.requirements[level].iter().all(|r| r.satisfied_by(placed))
    }

    /// Requirements of `level` that nothing in `placed` satisfies
    pub fn missing(&self, level: usize, placed: &[bool]) -> Vec<&Requirement> {
        self.requirements[level]
            .iter()
            .filter(|r| !r.satisfied_by(placed))
            .collect()
    }
}

/// depth(l) = 1 + max over requirements of the shallowest candidate, iterated to a fixpoint
fn grounded_depths(requirements: &[Vec<Requirement>]) -> Vec<Option<usize>> {
    let mut depths: Vec<Option<usize>> = vec![None; requirements.len()];

    loop {
        let mut changed = false;
        for (idx, reqs) in requirements.iter().enumerate() {
            let mut depth = Some(0);
            for req in reqs {
                let shallowest = req.candidates.iter().filter_map(|&c| depths[c]).min();
                depth = match (depth, shallowest) {
                    (Some(d), Some(s)) => Some(d.max(s + 1)),
                    _ => None,
                };
            }
            let better = match (depth, depths[idx]) {
                (Some(new), Some(old)) => new < old,
                (Some(_), None) => true,
                _ => false,
            };
            if better {
                depths[idx] = depth;
                changed = true;
            }
        }
        if !changed {
            break;
        }
    }

    depths
}
