// catalog/mod.rs

mod graph;
mod level;

pub use graph::{DependencyGraph, Requirement};
pub use level::{Concept, Level, LevelId};

use crate::error::{CatalogDefect, Error, Result};
use bevy::prelude::Resource;
use serde::Deserialize;
use std::collections::{BTreeSet, HashMap};
use std::path::Path;
use std::sync::OnceLock;

const LASERS_JSON: &str = include_str!("../../assets/lasers_catalog.json");

/// Static level table, validated once and read-only afterwards
#[derive(Debug, Clone, Resource)]
pub struct Catalog {
    name: Option<String>,
    levels: Vec<Level>,
    index: HashMap<LevelId, usize>,
    /// Derived on first use
    graph: OnceLock<DependencyGraph>,
}

#[derive(Deserialize)]
struct CatalogFile {
    #[serde(default)]
    name: Option<String>,
    levels: Vec<Level>,
}

impl Catalog {
    /// Validate levels into a catalog
    ///
    /// Fails on duplicate ids and on any required concept that no other
    /// level introduces.
    pub fn new(levels: Vec<Level>) -> Result<Self> {
        if levels.is_empty() {
            return Err(Error::MalformedCatalog(CatalogDefect::Empty));
        }

        let mut index = HashMap::with_capacity(levels.len());
        for (idx, level) in levels.iter().enumerate() {
            if index.insert(level.id.clone(), idx).is_some() {
                return Err(Error::MalformedCatalog(CatalogDefect::DuplicateLevel(
                    level.id.clone(),
                )));
            }
        }

        for (idx, level) in levels.iter().enumerate() {
            for concept in &level.requires {
                let introduced_elsewhere = levels
                    .iter()
                    .enumerate()
                    .any(|(other, l)| other != idx && l.introduces(concept));
                if !introduced_elsewhere {
                    return Err(Error::MalformedCatalog(
                        CatalogDefect::UnintroducedConcept {
                            level: level.id.clone(),
                            concept: concept.clone(),
                        },
                    ));
                }
            }
        }

        Ok(Catalog {
            name: None,
            levels,
            index,
            graph: OnceLock::new(),
        })
    }

    /// Parse a JSON catalog: `{ "name": ..., "levels": [...] }`
    pub fn from_json(json: &str) -> Result<Self> {
        let file: CatalogFile = serde_json::from_str(json)?;
        let mut catalog = Self::new(file.levels)?;
        catalog.name = file.name;
        log::debug!(
            "Catalog {:?} loaded: {} levels, {} concepts",
            catalog.name,
            catalog.len(),
            catalog.concepts().len()
        );
        Ok(catalog)
    }

    /// Read and parse a JSON catalog file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| Error::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&json)
    }

    /// The Lasers level set shipped with the crate
    pub fn lasers() -> Result<Self> {
        Self::from_json(LASERS_JSON)
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// All levels in declaration order
    pub fn all_levels(&self) -> &[Level] {
        &self.levels
    }

    pub fn len(&self) -> usize {
        self.levels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    pub fn level(&self, id: &LevelId) -> Result<&Level> {
        Ok(&self.levels[self.index_of(id)?])
    }

    /// Declaration position of a level
    pub fn index_of(&self, id: &LevelId) -> Result<usize> {
        self.index
            .get(id)
            .copied()
            .ok_or_else(|| Error::UnknownLevel(id.clone()))
    }

    pub(crate) fn level_at(&self, idx: usize) -> &Level {
        &self.levels[idx]
    }

    pub fn concepts_introduced_by(&self, id: &LevelId) -> Result<&BTreeSet<Concept>> {
        Ok(&self.level(id)?.introduces)
    }

    pub fn concepts_required_by(&self, id: &LevelId) -> Result<&BTreeSet<Concept>> {
        Ok(&self.level(id)?.requires)
    }

    /// Every concept any level introduces or requires
    pub fn concepts(&self) -> BTreeSet<&Concept> {
        self.levels
            .iter()
            .flat_map(|l| l.introduces.iter().chain(l.requires.iter()))
            .collect()
    }

    /// Levels introducing `concept`, in declaration order
    pub fn introducers(&self, concept: &Concept) -> Vec<&Level> {
        self.levels.iter().filter(|l| l.introduces(concept)).collect()
    }

    /// Possible-predecessor graph, built on first call
    pub fn graph(&self) -> &DependencyGraph {
        self.graph.get_or_init(|| DependencyGraph::build(&self.levels))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::three_levels;
    use std::io::Write;

    #[test]
    fn test_accessors() {
        let catalog = three_levels();

        assert_eq!(catalog.len(), 3);
        assert_eq!(catalog.all_levels()[1].id, LevelId::from("L2"));
        assert_eq!(
            catalog.concepts_required_by(&"L3".into()).unwrap().len(),
            2
        );
        assert!(catalog
            .concepts_introduced_by(&"L1".into())
            .unwrap()
            .contains(&Concept::from("push")));
        assert_eq!(catalog.concepts().len(), 2);
        assert_eq!(catalog.introducers(&"laser".into())[0].id, LevelId::from("L2"));
    }

    #[test]
    fn test_unknown_level() {
        let catalog = three_levels();
        assert!(matches!(
            catalog.concepts_introduced_by(&"L9".into()),
            Err(Error::UnknownLevel(id)) if id.as_str() == "L9"
        ));
    }

    #[test]
    fn test_duplicate_id_is_malformed() {
        let result = Catalog::new(vec![
            Level::new("L1", ["push"], Vec::<String>::new()),
            Level::new("L1", ["laser"], Vec::<String>::new()),
        ]);
        assert!(matches!(
            result,
            Err(Error::MalformedCatalog(CatalogDefect::DuplicateLevel(id))) if id.as_str() == "L1"
        ));
    }

    #[test]
    fn test_unintroduced_concept_is_malformed() {
        let result = Catalog::new(vec![
            Level::new("L1", ["push"], Vec::<String>::new()),
            Level::new("L2", Vec::<String>::new(), ["teleport"]),
        ]);
        match result {
            Err(Error::MalformedCatalog(CatalogDefect::UnintroducedConcept { level, concept })) => {
                assert_eq!(level.as_str(), "L2");
                assert_eq!(concept, Concept::from("teleport"));
            }
            other => panic!("expected malformed catalog, got {:?}", other),
        }
    }

    #[test]
    fn test_self_satisfaction_is_malformed() {
        let result = Catalog::new(vec![Level::new("Loop", ["spin"], ["spin"])]);
        assert!(matches!(
            result,
            Err(Error::MalformedCatalog(CatalogDefect::UnintroducedConcept { .. }))
        ));

        // Fine once another level also introduces it
        let result = Catalog::new(vec![
            Level::new("Loop", ["spin"], ["spin"]),
            Level::new("Spin", ["spin"], Vec::<String>::new()),
        ]);
        assert!(result.is_ok());
    }

    #[test]
    fn test_empty_catalog() {
        assert!(matches!(
            Catalog::new(Vec::new()),
            Err(Error::MalformedCatalog(CatalogDefect::Empty))
        ));
    }

    #[test]
    fn test_from_json() {
        let catalog = Catalog::from_json(
            r#"{
                "name": "Mini",
                "levels": [
                    { "id": "L1", "introduces": ["push"], "layout": ["p.!"] },
                    { "id": "L2", "requires": ["push"] }
                ]
            }"#,
        )
        .unwrap();

        assert_eq!(catalog.name(), Some("Mini"));
        assert_eq!(catalog.level(&"L1".into()).unwrap().size(), 3);
    }

    #[test]
    fn test_invalid_json() {
        assert!(matches!(Catalog::from_json("{ levels: 3 }"), Err(Error::Json(_))));
    }

    #[test]
    fn test_load_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{ "levels": [ {{ "id": "Only", "introduces": ["push"] }} ] }}"#
        )
        .unwrap();

        let catalog = Catalog::load(file.path()).unwrap();
        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog.name(), None);
    }

    #[test]
    fn test_load_missing_file() {
        assert!(matches!(
            Catalog::load("/definitely/not/here.json"),
            Err(Error::Io { .. })
        ));
    }

    #[test]
    fn test_lasers_catalog() {
        let catalog = Catalog::lasers().unwrap();

        assert_eq!(catalog.name(), Some("Lasers"));
        assert_eq!(catalog.len(), 31);
        assert_eq!(catalog.level(&"First Steps".into()).unwrap().size(), 54);
        assert_eq!(catalog.level(&"All Objectives Complete".into()).unwrap().size(), 0);
        assert_eq!(catalog.introducers(&"func_wires".into()).len(), 3);
    }

    #[test]
    fn test_graph_is_cached() {
        let catalog = three_levels();
        let first = catalog.graph() as *const DependencyGraph;
        let second = catalog.graph() as *const DependencyGraph;
        assert_eq!(first, second);
    }
}
