// catalog/level.rs

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Unique level identifier (the level's display name)
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LevelId(pub String);

impl LevelId {
    pub fn new(id: impl Into<String>) -> Self {
        LevelId(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LevelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for LevelId {
    fn from(id: &str) -> Self {
        LevelId(id.to_string())
    }
}

/// A game mechanic a level can introduce or require
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Concept(pub String);

impl Concept {
    pub fn new(name: impl Into<String>) -> Self {
        Concept(name.into())
    }
}

impl fmt::Display for Concept {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Concept {
    fn from(name: &str) -> Self {
        Concept(name.to_string())
    }
}

/// One catalog entry
///
/// JSON shape: `{ "id": "...", "introduces": [...], "requires": [...], "layout": [...] }`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Level {
    pub id: LevelId,
    #[serde(default)]
    pub introduces: BTreeSet<Concept>,
    #[serde(default)]
    pub requires: BTreeSet<Concept>,
    /// Grid rows, top to bottom
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub layout: Vec<String>,
}

impl Level {
    pub fn new<I, R>(id: impl Into<String>, introduces: I, requires: R) -> Self
    where
        I: IntoIterator,
        I::Item: Into<String>,
        R: IntoIterator,
        R::Item: Into<String>,
    {
        Level {
            id: LevelId::new(id),
            introduces: introduces.into_iter().map(|c| Concept(c.into())).collect(),
            requires: requires.into_iter().map(|c| Concept(c.into())).collect(),
            layout: Vec::new(),
        }
    }

    /// Attach a layout given as newline-separated rows
    pub fn with_layout(mut self, layout: &str) -> Self {
        self.layout = layout.lines().map(str::to_string).collect();
        self
    }

    /// Layout cells, not counting line breaks. Zero for marker levels without a grid.
    pub fn size(&self) -> usize {
        self.layout.iter().map(|row| row.chars().count()).sum()
    }

    /// Layout as a single newline-joined block
    pub fn layout_text(&self) -> String {
        self.layout.join("\n")
    }

    pub fn introduces(&self, concept: &Concept) -> bool {
        self.introduces.contains(concept)
    }

    pub fn requires(&self, concept: &Concept) -> bool {
        self.requires.contains(concept)
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.requires.is_empty() {
            return write!(f, "{}", self.id);
        }
        let deps: Vec<&str> = self.requires.iter().map(|c| c.0.as_str()).collect();
        write!(f, "{} <- [{}]", self.id, deps.join(", "))
    }
}
