// progression/stepper.rs

use super::Progression;
use crate::catalog::{Catalog, LevelId, Requirement};
use crate::error::{Blocked, Error, Result, Violation};
use crate::selection::Selection;

/// Step-by-step placement of a selection
///
/// At any point `ready()` is the full set of unplaced levels whose
/// requirements are met by levels already placed, so a caller can pick
/// the next level interactively.
#[derive(Debug, Clone)]
pub struct ProgressionStepper<'c> {
    catalog: &'c Catalog,
    /// Selected levels in tie-break order
    members: Vec<usize>,
    selected: Vec<bool>,
    placed: Vec<bool>,
    order: Vec<usize>,
}

impl<'c> ProgressionStepper<'c> {
    pub(crate) fn new(catalog: &'c Catalog, members: Vec<usize>) -> Self {
        let mut selected = vec![false; catalog.len()];
        for &m in &members {
            selected[m] = true;
        }
        ProgressionStepper {
            catalog,
            members,
            selected,
            placed: vec![false; catalog.len()],
            order: Vec::with_capacity(catalog.len()),
        }
    }

    /// Stepper over a selection, ties in declaration order
    pub fn for_selection(selection: &Selection<'c>) -> Self {
        Self::new(selection.catalog(), selection.members().iter().copied().collect())
    }

    /// Unplaced levels that can go next, in tie-break order
    pub fn ready(&self) -> Vec<&'c LevelId> {
        self.ready_indices()
            .into_iter()
            .map(|l| &self.catalog.level_at(l).id)
            .collect()
    }

    /// Levels placed so far
    pub fn placed(&self) -> Vec<&'c LevelId> {
        self.order
            .iter()
            .map(|&l| &self.catalog.level_at(l).id)
            .collect()
    }

    pub fn remaining(&self) -> usize {
        self.members.len() - self.order.len()
    }

    pub fn is_complete(&self) -> bool {
        self.order.len() == self.members.len()
    }

    /// Place a chosen level next
    pub fn place(&mut self, id: &LevelId) -> Result<()> {
        let level = self.catalog.index_of(id)?;
        let violation = if !self.selected[level] {
            Some(Violation::NotSelected)
        } else if self.placed[level] {
            Some(Violation::Repeated)
        } else {
            let missing = self.catalog.graph().missing(level, &self.placed);
            if missing.is_empty() {
                None
            } else {
                Some(Violation::Missing(
                    missing.into_iter().map(|r| r.concept.clone()).collect(),
                ))
            }
        };

        if let Some(violation) = violation {
            return Err(Error::InvalidProgression {
                position: self.order.len(),
                level: id.clone(),
                violation,
            });
        }

        self.place_index(level);
        Ok(())
    }

    /// Place whatever is left in tie-break order and return the full progression
    pub fn finish(mut self) -> Result<Progression> {
        while self.step().is_some() {}
        if !self.is_complete() {
            return Err(Error::UnsatisfiableProgression {
                blocked: self.blocked(),
            });
        }
        Ok(self.progression())
    }

    pub(crate) fn ready_indices(&self) -> Vec<usize> {
        let graph = self.catalog.graph();
        self.members
            .iter()
            .copied()
            .filter(|&l| !self.placed[l] && graph.is_ready(l, &self.placed))
            .collect()
    }

    /// Place the preferred ready level, if any
    pub(crate) fn step(&mut self) -> Option<usize> {
        let next = self.ready_indices().into_iter().next()?;
        self.place_index(next);
        Some(next)
    }

    pub(crate) fn place_index(&mut self, level: usize) {
        self.placed[level] = true;
        self.order.push(level);
    }

    pub(crate) fn unplace_last(&mut self) {
        if let Some(level) = self.order.pop() {
            self.placed[level] = false;
        }
    }

    /// Unplaced levels with the requirements nothing placed satisfies
    pub(crate) fn unmet(&self) -> Vec<(usize, Vec<&'c Requirement>)> {
        let graph = self.catalog.graph();
        self.members
            .iter()
            .copied()
            .filter(|&l| !self.placed[l])
            .map(|l| (l, graph.missing(l, &self.placed)))
            .collect()
    }

    pub(crate) fn blocked(&self) -> Vec<Blocked> {
        self.unmet()
            .into_iter()
            .map(|(l, reqs)| Blocked {
                level: self.catalog.level_at(l).id.clone(),
                missing: reqs.into_iter().map(|r| r.concept.clone()).collect(),
            })
            .collect()
    }

    pub(crate) fn progression(&self) -> Progression {
        Progression::new(
            self.order
                .iter()
                .map(|&l| self.catalog.level_at(l).id.clone())
                .collect(),
        )
    }
}
