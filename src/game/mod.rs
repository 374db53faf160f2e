// game/mod.rs

pub mod progression;

pub use progression::ProgressionTracker;

use crate::catalog::Catalog;
use crate::error::Result;
use crate::progression::{ProgressionGenerator, TieBreak};
use crate::selection::{Selection, SelectionRequest, Selector};
use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// How the game builds its progression at startup
#[derive(Resource, Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProgressionSettings {
    /// Catalog JSON file; the bundled Lasers catalog when unset
    pub catalog: Option<PathBuf>,
    /// An empty request plays the whole catalog
    pub request: SelectionRequest,
    pub tie_break: TieBreak,
}

impl ProgressionSettings {
    fn load_catalog(&self) -> Result<Catalog> {
        match &self.catalog {
            Some(path) => Catalog::load(path),
            None => Catalog::lasers(),
        }
    }
}

/// Loads the catalog and a generated progression into the app as resources
#[derive(Default)]
pub struct ProgressionPlugin {
    pub settings: ProgressionSettings,
}

impl Plugin for ProgressionPlugin {
    fn build(&self, app: &mut App) {
        app.insert_resource(self.settings.clone())
            .add_systems(Startup, (setup_catalog, setup_progression).chain());
    }
}

/// System to load the level catalog
pub fn setup_catalog(mut commands: Commands, settings: Res<ProgressionSettings>) {
    match settings.load_catalog() {
        Ok(catalog) => {
            info!(
                "Catalog {} loaded: {} levels, {} concepts",
                catalog.name().unwrap_or("(unnamed)"),
                catalog.len(),
                catalog.concepts().len()
            );
            commands.insert_resource(catalog);
        }
        Err(e) => error!("Failed to load level catalog: {}", e),
    }
}

/// System to generate the progression and start tracking it
pub fn setup_progression(
    mut commands: Commands,
    catalog: Option<Res<Catalog>>,
    settings: Res<ProgressionSettings>,
) {
    let Some(catalog) = catalog else {
        return;
    };

    let progression = build_selection(&catalog, &settings.request).and_then(|selection| {
        ProgressionGenerator::with_tie_break(&selection, settings.tie_break).generate()
    });

    match progression {
        Ok(progression) => {
            info!("Progression ready: {} levels", progression.len());
            commands.insert_resource(ProgressionTracker::new(progression));
        }
        Err(e) => error!("Failed to build progression: {}", e),
    }
}

fn build_selection<'c>(catalog: &'c Catalog, request: &SelectionRequest) -> Result<Selection<'c>> {
    if *request == SelectionRequest::default() {
        return Ok(Selection::all(catalog));
    }
    Selector::new(catalog).select(request)
}
