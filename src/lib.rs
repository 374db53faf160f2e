//! Concept-ordered level progressions for puzzle games.
//!
//! A [`Catalog`] lists levels with the concepts each introduces and requires.
//! [`Selector`] narrows it to a self-consistent [`Selection`], and
//! [`ProgressionGenerator`] orders that selection so every level comes after
//! something that introduces each concept it needs.

pub mod catalog;
pub mod error;
pub mod game;
pub mod progression;
pub mod render;
pub mod selection;

pub use catalog::{Catalog, Concept, DependencyGraph, Level, LevelId};
pub use error::{Error, Result};
pub use progression::{Frontier, Progression, ProgressionGenerator, ProgressionStepper, TieBreak, Tiers};
pub use selection::{Selection, SelectionRequest, Selector};
