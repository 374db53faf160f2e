// progression/mod.rs

mod generator;
mod stepper;
mod tie_break;

pub use generator::{Frontier, FrontierStep, ProgressionGenerator, Tiers};
pub use stepper::ProgressionStepper;
pub use tie_break::TieBreak;

use crate::catalog::{Catalog, Concept, LevelId};
use crate::error::{Error, Result, Violation};
use crate::selection::Selection;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Ordered level sequence where every level comes after the introducers
/// of everything it requires
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Progression(Vec<LevelId>);

impl Progression {
    pub fn new(levels: Vec<LevelId>) -> Self {
        Progression(levels)
    }

    pub fn levels(&self) -> &[LevelId] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn position(&self, id: &LevelId) -> Option<usize> {
        self.0.iter().position(|l| l == id)
    }

    /// Check ordering constraints against a catalog
    ///
    /// Every level must be known, appear once, and have each required
    /// concept introduced by some strictly earlier level.
    pub fn check(&self, catalog: &Catalog) -> Result<()> {
        let mut seen: BTreeSet<&LevelId> = BTreeSet::new();
        let mut introduced: BTreeSet<&Concept> = BTreeSet::new();

        for (position, id) in self.0.iter().enumerate() {
            let level = catalog.level(id)?;
            if !seen.insert(id) {
                return Err(invalid(position, id, Violation::Repeated));
            }

            let missing: Vec<Concept> = level
                .requires
                .iter()
                .filter(|c| !introduced.contains(c))
                .cloned()
                .collect();
            if !missing.is_empty() {
                return Err(invalid(position, id, Violation::Missing(missing)));
            }

            introduced.extend(level.introduces.iter());
        }

        Ok(())
    }

    /// Check that this is a complete, valid ordering of `selection`
    pub fn verify(&self, selection: &Selection) -> Result<()> {
        for (position, id) in self.0.iter().enumerate() {
            if !selection.contains(id) {
                selection.catalog().index_of(id)?;
                return Err(invalid(position, id, Violation::NotSelected));
            }
        }
        self.check(selection.catalog())?;

        if let Some(omitted) = selection.ids().into_iter().find(|id| self.position(id).is_none()) {
            return Err(Error::InvalidProgression {
                position: self.0.len(),
                level: omitted,
                violation: Violation::Omitted,
            });
        }
        Ok(())
    }

    /// One `name (size)` line per level
    pub fn report(&self, catalog: &Catalog) -> Result<String> {
        let mut out = String::new();
        for id in &self.0 {
            let level = catalog.level(id)?;
            out.push_str(&format!("{} ({})\n", level.id, level.size()));
        }
        Ok(out)
    }
}

fn invalid(position: usize, id: &LevelId, violation: Violation) -> Error {
    Error::InvalidProgression {
        position,
        level: id.clone(),
        violation,
    }
}

impl fmt::Display for Progression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.0.iter().map(LevelId::as_str).collect();
        write!(f, "{}", names.join(" -> "))
    }
}

impl FromIterator<LevelId> for Progression {
    fn from_iter<T: IntoIterator<Item = LevelId>>(iter: T) -> Self {
        Progression(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a Progression {
    type Item = &'a LevelId;
    type IntoIter = std::slice::Iter<'a, LevelId>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
