use crate::catalog::{Concept, LevelId};
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("malformed catalog: {0}")]
    MalformedCatalog(CatalogDefect),

    #[error("unknown level `{0}`")]
    UnknownLevel(LevelId),

    #[error("unsatisfiable selection: {0}")]
    UnsatisfiableSelection(SelectionConflict),

    #[error("no valid progression, blocked: {}", list(.blocked))]
    UnsatisfiableProgression { blocked: Vec<Blocked> },

    #[error("more than {cap} valid progressions")]
    CombinatorialLimitExceeded { cap: usize },

    #[error("invalid progression at position {position}: `{level}` {violation}")]
    InvalidProgression {
        position: usize,
        level: LevelId,
        violation: Violation,
    },

    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid catalog JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("publish failed: {0}")]
    Publish(String),
}

/// What is wrong with static catalog data
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CatalogDefect {
    Empty,
    DuplicateLevel(LevelId),
    /// No other level introduces a concept this level requires
    UnintroducedConcept { level: LevelId, concept: Concept },
}

impl fmt::Display for CatalogDefect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CatalogDefect::Empty => write!(f, "catalog has no levels"),
            CatalogDefect::DuplicateLevel(id) => write!(f, "level `{}` is declared twice", id),
            CatalogDefect::UnintroducedConcept { level, concept } => write!(
                f,
                "level `{}` requires `{}` but no other level introduces it",
                level, concept
            ),
        }
    }
}

/// Why a selection request cannot be made self-consistent
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectionConflict {
    /// Every introducer of `concept` sits on a dependency cycle
    Unreachable { level: LevelId, concept: Concept },
    /// Selected levels wait on each other and no outside level can break the cycle
    Deadlock { levels: Vec<LevelId> },
    /// Coverage cannot be reached for these concepts
    Uncoverable { concepts: Vec<Concept> },
    ExceedsLimit { required: usize, limit: usize },
}

impl fmt::Display for SelectionConflict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SelectionConflict::Unreachable { level, concept } => write!(
                f,
                "`{}` requires `{}` and no introducer of it can be ordered",
                level, concept
            ),
            SelectionConflict::Deadlock { levels } => {
                write!(f, "levels depend on each other: {}", list(levels))
            }
            SelectionConflict::Uncoverable { concepts } => {
                write!(f, "cannot cover concepts: {}", list(concepts))
            }
            SelectionConflict::ExceedsLimit { required, limit } => write!(
                f,
                "needs {} levels but at most {} are allowed",
                required, limit
            ),
        }
    }
}

/// A level that never became ready, with the concepts nothing placed introduces
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Blocked {
    pub level: LevelId,
    pub missing: Vec<Concept>,
}

impl fmt::Display for Blocked {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "`{}` (missing {})", self.level, list(&self.missing))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Violation {
    Repeated,
    NotSelected,
    /// A selected level never appears
    Omitted,
    Missing(Vec<Concept>),
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Violation::Repeated => write!(f, "appears more than once"),
            Violation::NotSelected => write!(f, "is not part of the selection"),
            Violation::Omitted => write!(f, "is selected but never placed"),
            Violation::Missing(concepts) => {
                write!(f, "comes before anything introduces {}", list(concepts))
            }
        }
    }
}

fn list<T: fmt::Display>(items: &[T]) -> String {
    items
        .iter()
        .map(|item| item.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}
