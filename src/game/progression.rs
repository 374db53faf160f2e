// game/progression.rs

use crate::catalog::LevelId;
use crate::progression::Progression;
use bevy::prelude::*;

/// Resource tracking the player's place in a generated progression
#[derive(Resource, Debug)]
pub struct ProgressionTracker {
    progression: Progression,
    /// Index into the progression (0-based)
    current: usize,
    /// Levels finished since the tracker was created
    pub completed: usize,
}

impl ProgressionTracker {
    pub fn new(progression: Progression) -> Self {
        ProgressionTracker {
            progression,
            current: 0,
            completed: 0,
        }
    }

    /// The level being played, `None` for an empty progression
    pub fn current_level(&self) -> Option<&LevelId> {
        self.progression.levels().get(self.current)
    }

    /// 1-based position of the current level
    pub fn level_number(&self) -> usize {
        self.current + 1
    }

    /// Advance to next level, wrapping around if at end
    pub fn advance_level(&mut self) {
        if self.progression.is_empty() {
            return;
        }
        self.current = if self.is_final_level() {
            0
        } else {
            self.current + 1
        };
        self.completed += 1;
    }

    /// Get progress as a percentage (0.0 to 100.0)
    pub fn progress_percentage(&self) -> f32 {
        if self.progression.is_empty() {
            return 100.0;
        }
        (self.level_number() as f32 / self.len() as f32) * 100.0
    }

    /// Check if this is the final level
    pub fn is_final_level(&self) -> bool {
        self.current + 1 >= self.len()
    }

    pub fn len(&self) -> usize {
        self.progression.len()
    }

    pub fn is_empty(&self) -> bool {
        self.progression.is_empty()
    }

    pub fn progression(&self) -> &Progression {
        &self.progression
    }
}
