// progression/generator.rs

use super::{Progression, ProgressionStepper, TieBreak};
use crate::catalog::{Catalog, LevelId};
use crate::error::{Error, Result};
use crate::selection::Selection;
use serde::Serialize;

/// One position of a generated progression with every level that could have gone there
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FrontierStep {
    /// Ready levels in tie-break order
    pub ready: Vec<LevelId>,
    pub chosen: LevelId,
}

/// Ready sets along one progression
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Frontier {
    pub steps: Vec<FrontierStep>,
}

impl Frontier {
    pub fn progression(&self) -> Progression {
        self.steps.iter().map(|s| s.chosen.clone()).collect()
    }

    /// Positions where more than one level was ready
    pub fn choice_points(&self) -> usize {
        self.steps.iter().filter(|s| s.ready.len() > 1).count()
    }
}

/// Levels grouped by the round in which they first become ready
///
/// Placing the tiers in order, each tier's levels in any order, always gives
/// a valid progression.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Tiers(pub Vec<Vec<LevelId>>);

impl Tiers {
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn flatten(&self) -> Progression {
        self.0.iter().flatten().cloned().collect()
    }
}

/// Orders a selection so every level follows the introducers of what it requires
///
/// Ties among ready levels are resolved by the generator's [`TieBreak`]
/// (declaration order unless told otherwise). Every mode fails with
/// `UnsatisfiableProgression` when some level can never become ready.
pub struct ProgressionGenerator<'c> {
    catalog: &'c Catalog,
    members: Vec<usize>,
    tie_break: TieBreak,
}

impl<'c> ProgressionGenerator<'c> {
    pub fn new(selection: &Selection<'c>) -> Self {
        Self::with_tie_break(selection, TieBreak::default())
    }

    pub fn with_tie_break(selection: &Selection<'c>, tie_break: TieBreak) -> Self {
        let catalog = selection.catalog();
        let mut members: Vec<usize> = selection.members().iter().copied().collect();
        tie_break.arrange(catalog, &mut members);
        ProgressionGenerator {
            catalog,
            members,
            tie_break,
        }
    }

    pub fn tie_break(&self) -> TieBreak {
        self.tie_break
    }

    /// Interactive placement with this generator's tie-break order
    pub fn stepper(&self) -> ProgressionStepper<'c> {
        ProgressionStepper::new(self.catalog, self.members.clone())
    }

    /// A single valid progression, always taking the preferred ready level
    pub fn generate(&self) -> Result<Progression> {
        let progression = self.stepper().finish()?;
        log::debug!(
            "Generated {}-level progression ({:?})",
            progression.len(),
            self.tie_break
        );
        Ok(progression)
    }

    /// Every distinct valid progression, in tie-break order
    ///
    /// Fails with `CombinatorialLimitExceeded` as soon as more than `cap`
    /// progressions exist.
    pub fn enumerate(&self, cap: usize) -> Result<Vec<Progression>> {
        let mut found = Vec::new();
        self.walk(&mut |stepper: &ProgressionStepper<'c>| {
            if found.len() == cap {
                return Err(Error::CombinatorialLimitExceeded { cap });
            }
            found.push(stepper.progression());
            Ok(())
        })?;
        log::debug!("Enumerated {} progressions", found.len());
        Ok(found)
    }

    /// Number of distinct valid progressions, up to `cap`
    pub fn count(&self, cap: usize) -> Result<usize> {
        let mut count = 0;
        self.walk(&mut |_: &ProgressionStepper<'c>| {
            if count == cap {
                return Err(Error::CombinatorialLimitExceeded { cap });
            }
            count += 1;
            Ok(())
        })?;
        Ok(count)
    }

    /// The full ready set at each position of the generated progression
    pub fn frontier(&self) -> Result<Frontier> {
        let mut stepper = self.stepper();
        let mut steps = Vec::with_capacity(self.members.len());

        while !stepper.is_complete() {
            let ready: Vec<LevelId> = stepper.ready().into_iter().cloned().collect();
            let Some(next) = stepper.step() else {
                return Err(Error::UnsatisfiableProgression {
                    blocked: stepper.blocked(),
                });
            };
            steps.push(FrontierStep {
                ready,
                chosen: self.catalog.level_at(next).id.clone(),
            });
        }

        Ok(Frontier { steps })
    }

    /// Levels grouped into successive ready rounds
    pub fn tiers(&self) -> Result<Tiers> {
        let mut stepper = self.stepper();
        let mut tiers = Vec::new();

        while !stepper.is_complete() {
            let round = stepper.ready_indices();
            if round.is_empty() {
                return Err(Error::UnsatisfiableProgression {
                    blocked: stepper.blocked(),
                });
            }
            for &level in &round {
                stepper.place_index(level);
            }
            tiers.push(
                round
                    .into_iter()
                    .map(|l| self.catalog.level_at(l).id.clone())
                    .collect(),
            );
        }

        Ok(Tiers(tiers))
    }

    /// Depth-first over every ready choice, calling `visit` on each complete placement
    fn walk<F>(&self, visit: &mut F) -> Result<()>
    where
        F: FnMut(&ProgressionStepper<'c>) -> Result<()>,
    {
        // Any valid prefix extends to a full progression once one exists,
        // so this single check rules out dead ends below.
        self.generate()?;

        let mut stepper = self.stepper();
        descend(&mut stepper, visit)
    }
}

fn descend<'c, F>(stepper: &mut ProgressionStepper<'c>, visit: &mut F) -> Result<()>
where
    F: FnMut(&ProgressionStepper<'c>) -> Result<()>,
{
    if stepper.is_complete() {
        return visit(stepper);
    }
    for next in stepper.ready_indices() {
        stepper.place_index(next);
        let result = descend(stepper, visit);
        stepper.unplace_last();
        result?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Level;
    use crate::test_support::{ids, mutual_pair, three_levels};

    /// Two independent intros feeding one finale
    fn fork() -> Catalog {
        Catalog::new(vec![
            Level::new("Spin", ["spin"], Vec::<String>::new()).with_layout("#####\n#####"),
            Level::new("Move", ["move"], Vec::<String>::new()).with_layout("###"),
            Level::new("Finale", Vec::<String>::new(), ["spin", "move"]),
        ])
        .unwrap()
    }

    #[test]
    fn test_generate_three_levels() {
        let catalog = three_levels();
        let selection = Selection::all(&catalog);
        let progression = ProgressionGenerator::new(&selection).generate().unwrap();

        assert_eq!(progression, ids(&["L1", "L2", "L3"]));
        assert!(progression.verify(&selection).is_ok());
    }

    #[test]
    fn test_mutual_dependency_is_unsatisfiable() {
        let catalog = mutual_pair();
        let selection = Selection::of(&catalog, ["A", "B"]).unwrap();
        let generator = ProgressionGenerator::new(&selection);

        match generator.generate() {
            Err(Error::UnsatisfiableProgression { blocked }) => {
                let names: Vec<&str> = blocked.iter().map(|b| b.level.as_str()).collect();
                assert_eq!(names, vec!["A", "B"]);
                assert_eq!(blocked[0].missing, vec!["y".into()]);
            }
            other => panic!("expected unsatisfiable progression, got {:?}", other),
        }
        assert!(matches!(generator.enumerate(10), Err(Error::UnsatisfiableProgression { .. })));
        assert!(matches!(generator.frontier(), Err(Error::UnsatisfiableProgression { .. })));
        assert!(matches!(generator.tiers(), Err(Error::UnsatisfiableProgression { .. })));
    }

    #[test]
    fn test_missing_predecessor_in_selection_is_unsatisfiable() {
        let catalog = three_levels();
        let selection = Selection::of(&catalog, ["L1", "L3"]).unwrap();

        assert!(matches!(
            ProgressionGenerator::new(&selection).generate(),
            Err(Error::UnsatisfiableProgression { blocked }) if blocked.len() == 1
        ));
    }

    #[test]
    fn test_tie_break_changes_order() {
        let catalog = fork();
        let selection = Selection::all(&catalog);

        let declared = ProgressionGenerator::new(&selection).generate().unwrap();
        assert_eq!(declared, ids(&["Spin", "Move", "Finale"]));

        let smaller = ProgressionGenerator::with_tie_break(&selection, TieBreak::SmallerFirst)
            .generate()
            .unwrap();
        assert_eq!(smaller, ids(&["Move", "Spin", "Finale"]));
    }

    #[test]
    fn test_reverse_declaration_still_respects_dependencies() {
        let catalog = three_levels();
        let selection = Selection::all(&catalog);
        let progression = ProgressionGenerator::with_tie_break(&selection, TieBreak::ReverseDeclaration)
            .generate()
            .unwrap();

        assert_eq!(progression, ids(&["L1", "L2", "L3"]));
    }

    #[test]
    fn test_enumerate_all_orderings() {
        let catalog = fork();
        let selection = Selection::all(&catalog);
        let all = ProgressionGenerator::new(&selection).enumerate(10).unwrap();

        assert_eq!(
            all,
            vec![ids(&["Spin", "Move", "Finale"]), ids(&["Move", "Spin", "Finale"])]
        );
    }

    #[test]
    fn test_enumerate_cap_exceeded() {
        let catalog = fork();
        let selection = Selection::all(&catalog);
        let generator = ProgressionGenerator::new(&selection);

        assert!(matches!(
            generator.enumerate(1),
            Err(Error::CombinatorialLimitExceeded { cap: 1 })
        ));
        assert_eq!(generator.enumerate(2).unwrap().len(), 2);
    }

    #[test]
    fn test_enumerated_orderings_all_verify() {
        let catalog = Catalog::new(vec![
            Level::new("A", ["a"], Vec::<String>::new()),
            Level::new("B", ["b"], Vec::<String>::new()),
            Level::new("A2", ["a"], Vec::<String>::new()),
            Level::new("C", ["c"], ["a"]),
            Level::new("D", Vec::<String>::new(), ["b", "c"]),
            Level::new("E", Vec::<String>::new(), ["a"]),
        ])
        .unwrap();
        let selection = Selection::all(&catalog);
        let generator = ProgressionGenerator::new(&selection);

        let all = generator.enumerate(10_000).unwrap();
        assert_eq!(all.len(), generator.count(10_000).unwrap());
        assert!(all.len() > 1);
        for progression in &all {
            assert!(progression.verify(&selection).is_ok(), "{}", progression);
        }

        let distinct: std::collections::HashSet<_> = all.iter().collect();
        assert_eq!(distinct.len(), all.len());
    }

    #[test]
    fn test_count() {
        let catalog = fork();
        let selection = Selection::all(&catalog);
        let generator = ProgressionGenerator::new(&selection);

        assert_eq!(generator.count(5).unwrap(), 2);
        assert!(matches!(
            generator.count(1),
            Err(Error::CombinatorialLimitExceeded { .. })
        ));

        let chain = three_levels();
        let selection = Selection::all(&chain);
        assert_eq!(ProgressionGenerator::new(&selection).count(1).unwrap(), 1);
    }

    #[test]
    fn test_frontier() {
        let catalog = fork();
        let selection = Selection::all(&catalog);
        let frontier = ProgressionGenerator::new(&selection).frontier().unwrap();

        assert_eq!(frontier.steps.len(), 3);
        assert_eq!(frontier.steps[0].ready, vec![LevelId::from("Spin"), LevelId::from("Move")]);
        assert_eq!(frontier.steps[0].chosen, LevelId::from("Spin"));
        assert_eq!(frontier.steps[1].ready, vec![LevelId::from("Move")]);
        assert_eq!(frontier.steps[2].ready, vec![LevelId::from("Finale")]);
        assert_eq!(frontier.choice_points(), 1);
        assert_eq!(frontier.progression(), ids(&["Spin", "Move", "Finale"]));
    }

    #[test]
    fn test_tiers() {
        let catalog = fork();
        let selection = Selection::all(&catalog);
        let tiers = ProgressionGenerator::new(&selection).tiers().unwrap();

        assert_eq!(
            tiers,
            Tiers(vec![
                vec![LevelId::from("Spin"), LevelId::from("Move")],
                vec![LevelId::from("Finale")],
            ])
        );
        assert!(tiers.flatten().verify(&selection).is_ok());
    }

    #[test]
    fn test_empty_selection() {
        let catalog = three_levels();
        let selection = Selection::of(&catalog, Vec::<&str>::new()).unwrap();
        let generator = ProgressionGenerator::new(&selection);

        assert!(generator.generate().unwrap().is_empty());
        assert_eq!(generator.count(1).unwrap(), 1);
        assert!(generator.tiers().unwrap().is_empty());
    }

    #[test]
    fn test_lasers_progression() {
        let catalog = Catalog::lasers().unwrap();
        let selection = Selection::all(&catalog);

        for tie_break in [
            TieBreak::Declaration,
            TieBreak::ReverseDeclaration,
            TieBreak::SmallerFirst,
            TieBreak::LargerFirst,
            TieBreak::Frontload,
            TieBreak::Backload,
            TieBreak::Shuffled { seed: 42 },
        ] {
            let progression = ProgressionGenerator::with_tie_break(&selection, tie_break)
                .generate()
                .unwrap();
            assert!(progression.verify(&selection).is_ok(), "{:?}", tie_break);
            if tie_break == TieBreak::Declaration {
                assert_eq!(
                    progression.levels().last(),
                    Some(&LevelId::from("All Objectives Complete"))
                );
            }
        }

        assert!(matches!(
            ProgressionGenerator::new(&selection).count(1000),
            Err(Error::CombinatorialLimitExceeded { cap: 1000 })
        ));
    }
}
