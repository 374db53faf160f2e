use crate::catalog::{Catalog, Concept, Level, LevelId};
use crate::error::{Error, Result, SelectionConflict};
use crate::progression::ProgressionStepper;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet};

/// Subset of a catalog chosen for one progression request
#[derive(Debug, Clone)]
pub struct Selection<'c> {
    catalog: &'c Catalog,
    members: BTreeSet<usize>,
}

impl<'c> Selection<'c> {
    /// Every level in the catalog
    pub fn all(catalog: &'c Catalog) -> Self {
        Selection {
            catalog,
            members: (0..catalog.len()).collect(),
        }
    }

    /// Exactly the named levels, with no predecessors added
    pub fn of<I, S>(catalog: &'c Catalog, ids: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<LevelId>,
    {
        let members = ids
            .into_iter()
            .map(|id| catalog.index_of(&id.into()))
            .collect::<Result<BTreeSet<_>>>()?;
        Ok(Selection { catalog, members })
    }

    fn from_members(catalog: &'c Catalog, members: BTreeSet<usize>) -> Self {
        Selection { catalog, members }
    }

    pub fn catalog(&self) -> &'c Catalog {
        self.catalog
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn contains(&self, id: &LevelId) -> bool {
        self.catalog
            .index_of(id)
            .is_ok_and(|idx| self.members.contains(&idx))
    }

    /// Selected levels in declaration order
    pub fn levels(&self) -> impl Iterator<Item = &'c Level> + '_ {
        self.members.iter().map(|&m| self.catalog.level_at(m))
    }

    pub fn ids(&self) -> Vec<LevelId> {
        self.levels().map(|l| l.id.clone()).collect()
    }

    pub(crate) fn members(&self) -> &BTreeSet<usize> {
        &self.members
    }
}

/// Constraints for narrowing a catalog
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectionRequest {
    pub must_include: Vec<LevelId>,
    /// Introduce every concept, and exercise every concept some level requires
    pub cover_all_concepts: bool,
    pub max_levels: Option<usize>,
    /// Pull in every grounded introducer of a missing concept, not just the shallowest
    pub all_introducers: bool,
}

impl SelectionRequest {
    pub fn including<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<LevelId>,
    {
        SelectionRequest {
            must_include: ids.into_iter().map(Into::into).collect(),
            ..Default::default()
        }
    }

    pub fn covering_all() -> Self {
        SelectionRequest {
            cover_all_concepts: true,
            ..Default::default()
        }
    }

    pub fn with_max_levels(mut self, max: usize) -> Self {
        self.max_levels = Some(max);
        self
    }

    pub fn with_all_introducers(mut self) -> Self {
        self.all_introducers = true;
        self
    }
}

/// Something a covering selection has to contain
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Need<'c> {
    Introduce(&'c Concept),
    Exercise(&'c Concept),
}

/// Narrows a catalog to a self-consistent selection
pub struct Selector<'c> {
    catalog: &'c Catalog,
}

impl<'c> Selector<'c> {
    pub fn new(catalog: &'c Catalog) -> Self {
        Selector { catalog }
    }

    /// Build the smallest selection that satisfies `request`
    ///
    /// Must-include levels pull in predecessors transitively, preferring the
    /// introducer with the shortest prerequisite chain (or every grounded
    /// introducer with `all_introducers`). Coverage then searches for the
    /// fewest extra levels, each added together with its predecessors.
    pub fn select(&self, request: &SelectionRequest) -> Result<Selection<'c>> {
        let mut members = request
            .must_include
            .iter()
            .map(|id| self.catalog.index_of(id))
            .collect::<Result<BTreeSet<_>>>()?;

        members = self.close(members, request.all_introducers)?;

        if request.cover_all_concepts {
            members = self.cover(members, request.all_introducers)?;
        }

        if let Some(limit) = request.max_levels {
            if members.len() > limit {
                return Err(Error::UnsatisfiableSelection(
                    SelectionConflict::ExceedsLimit {
                        required: members.len(),
                        limit,
                    },
                ));
            }
        }

        log::info!(
            "Selected {} of {} levels",
            members.len(),
            self.catalog.len()
        );
        Ok(Selection::from_members(self.catalog, members))
    }

    /// Add predecessors until the members can be fully ordered
    fn close(&self, mut members: BTreeSet<usize>, all_introducers: bool) -> Result<BTreeSet<usize>> {
        let graph = self.catalog.graph();

        loop {
            let mut stepper = ProgressionStepper::new(self.catalog, members.iter().copied().collect());
            while stepper.step().is_some() {}
            if stepper.is_complete() {
                return Ok(members);
            }

            let unmet = stepper.unmet();
            let mut added = false;

            for (level, reqs) in &unmet {
                for req in reqs {
                    if req.candidates.iter().any(|c| members.contains(c)) {
                        continue;
                    }
                    let picks = if all_introducers {
                        self.grounded(&req.candidates, &members)
                    } else {
                        self.shallowest(&req.candidates, &members).into_iter().collect()
                    };
                    if picks.is_empty() {
                        return Err(Error::UnsatisfiableSelection(
                            SelectionConflict::Unreachable {
                                level: self.catalog.level_at(*level).id.clone(),
                                concept: req.concept.clone(),
                            },
                        ));
                    }
                    for pick in picks {
                        log::debug!(
                            "Adding `{}` to introduce `{}` for `{}`",
                            self.catalog.level_at(pick).id,
                            req.concept,
                            self.catalog.level_at(*level).id
                        );
                        members.insert(pick);
                    }
                    added = true;
                }
            }

            if added {
                continue;
            }

            // Every missing concept has an introducer among the members, but
            // those introducers wait on each other. Break in with the
            // shallowest outside introducer.
            let breaker = unmet
                .iter()
                .flat_map(|(_, reqs)| reqs.iter())
                .filter_map(|req| self.shallowest(&req.candidates, &members))
                .min_by_key(|&c| (graph.depth(c), c));

            match breaker {
                Some(pick) => {
                    members.insert(pick);
                }
                None => {
                    return Err(Error::UnsatisfiableSelection(
                        SelectionConflict::Deadlock {
                            levels: unmet
                                .iter()
                                .map(|(l, _)| self.catalog.level_at(*l).id.clone())
                                .collect(),
                        },
                    ));
                }
            }
        }
    }

    /// Grounded candidate outside `members` with the shortest prerequisite chain
    fn shallowest(&self, candidates: &[usize], members: &BTreeSet<usize>) -> Option<usize> {
        let graph = self.catalog.graph();
        candidates
            .iter()
            .copied()
            .filter(|c| !members.contains(c))
            .filter_map(|c| graph.depth(c).map(|d| (d, c)))
            .min()
            .map(|(_, c)| c)
    }

    /// Every candidate outside `members` that has a grounded prerequisite chain
    fn grounded(&self, candidates: &[usize], members: &BTreeSet<usize>) -> Vec<usize> {
        let graph = self.catalog.graph();
        candidates
            .iter()
            .copied()
            .filter(|c| !members.contains(c) && graph.depth(*c).is_some())
            .collect()
    }

    fn needs(&self) -> BTreeSet<Need<'c>> {
        let mut needs = BTreeSet::new();
        for level in self.catalog.all_levels() {
            needs.extend(level.introduces.iter().map(Need::Introduce));
            needs.extend(level.requires.iter().map(Need::Exercise));
        }
        needs
    }

    fn meets(&self, need: Need<'c>, level: usize) -> bool {
        let level = self.catalog.level_at(level);
        match need {
            Need::Introduce(concept) => level.introduces(concept),
            Need::Exercise(concept) => level.requires(concept),
        }
    }

    fn met(&self, need: Need<'c>, members: &BTreeSet<usize>) -> bool {
        members.iter().any(|&m| self.meets(need, m))
    }

    /// Smallest closed superset of `members` that meets every need
    ///
    /// Branch and bound. The greedy cover gives the first bound, then each
    /// branch takes the unmet need with the fewest levels able to meet it and
    /// tries each of those levels together with its predecessors.
    fn cover(&self, members: BTreeSet<usize>, all_introducers: bool) -> Result<BTreeSet<usize>> {
        let needs = self.needs();
        let mut best = self.greedy_cover(members.clone(), &needs, all_introducers)?;

        // No level meets more needs than it introduces and requires
        let widest = self
            .catalog
            .all_levels()
            .iter()
            .map(|l| l.introduces.len() + l.requires.len())
            .max()
            .unwrap_or(1)
            .max(1);

        let greedy_len = best.len();
        let mut search = CoverSearch {
            needs: &needs,
            widest,
            all_introducers,
            seen: HashSet::new(),
            best: &mut best,
        };
        self.branch(members, &mut search);

        log::debug!(
            "Covering search: {} levels (greedy {})",
            best.len(),
            greedy_len
        );
        Ok(best)
    }

    fn branch(&self, members: BTreeSet<usize>, search: &mut CoverSearch<'_, 'c>) {
        let outstanding: Vec<Need<'c>> = search
            .needs
            .iter()
            .copied()
            .filter(|&need| !self.met(need, &members))
            .collect();

        if outstanding.is_empty() {
            if members.len() < search.best.len() {
                *search.best = members;
            }
            return;
        }

        if members.len() + outstanding.len().div_ceil(search.widest) >= search.best.len() {
            return;
        }
        if !search.seen.insert(members.clone()) {
            return;
        }

        let able = outstanding
            .iter()
            .map(|&need| {
                (0..self.catalog.len())
                    .filter(|l| !members.contains(l) && self.meets(need, *l))
                    .collect::<Vec<_>>()
            })
            .min_by_key(Vec::len)
            .unwrap_or_default();

        for candidate in able {
            let mut trial = members.clone();
            trial.insert(candidate);
            if let Ok(trial) = self.close(trial, search.all_introducers) {
                self.branch(trial, search);
            }
        }
    }

    /// Grow `members` by best gain per added level until every need is met
    fn greedy_cover(
        &self,
        mut members: BTreeSet<usize>,
        needs: &BTreeSet<Need<'c>>,
        all_introducers: bool,
    ) -> Result<BTreeSet<usize>> {
        let mut outstanding: BTreeSet<Need<'c>> = needs
            .iter()
            .copied()
            .filter(|&need| !self.met(need, &members))
            .collect();

        while !outstanding.is_empty() {
            // (gain, added, trial)
            let mut best: Option<(usize, usize, BTreeSet<usize>)> = None;

            for candidate in 0..self.catalog.len() {
                if members.contains(&candidate) {
                    continue;
                }
                let mut trial = members.clone();
                trial.insert(candidate);
                let Ok(trial) = self.close(trial, all_introducers) else {
                    continue;
                };
                let gain = outstanding
                    .iter()
                    .filter(|&&need| self.met(need, &trial))
                    .count();
                if gain == 0 {
                    continue;
                }
                let added = trial.len() - members.len();
                let better = match &best {
                    None => true,
                    // Compare gain / added without division; fewer additions win ties
                    Some((best_gain, best_added, _)) => {
                        let lhs = gain * best_added;
                        let rhs = best_gain * added;
                        lhs > rhs || (lhs == rhs && added < *best_added)
                    }
                };
                if better {
                    best = Some((gain, added, trial));
                }
            }

            let Some((_, _, trial)) = best else {
                let concepts: BTreeSet<Concept> = outstanding
                    .iter()
                    .map(|need| match need {
                        Need::Introduce(c) | Need::Exercise(c) => (*c).clone(),
                    })
                    .collect();
                return Err(Error::UnsatisfiableSelection(
                    SelectionConflict::Uncoverable {
                        concepts: concepts.into_iter().collect(),
                    },
                ));
            };

            members = trial;
            outstanding.retain(|&need| !self.met(need, &members));
        }

        Ok(members)
    }
}

struct CoverSearch<'a, 'c> {
    needs: &'a BTreeSet<Need<'c>>,
    widest: usize,
    all_introducers: bool,
    seen: HashSet<BTreeSet<usize>>,
    best: &'a mut BTreeSet<usize>,
}
