//! Tick schedule and cycle detection.
//!
//! A tick starts with every lagged actor publishing its previous outputs.
//! The remaining work is ordered by edges whose producer is not lagged: a
//! consumer runs in a later level than every such producer. A cycle made only
//! of non-lagged producers can never be scheduled and is reported instead of
//! deadlocking at run time.

use std::collections::BTreeSet;
use std::fmt::{Display, Formatter};

/// Actors that could not be ordered because they sit on a cycle with no lagged member
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CycleError {
    /// Names of the actors left unscheduled
    pub involved: Vec<String>,
}

impl Display for CycleError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "cycle without a lagged actor among [{}]", self.involved.join(", "))
    }
}

impl std::error::Error for CycleError {}

/// Execution order of one tick
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Schedule {
    lagged: Vec<usize>,
    levels: Vec<Vec<usize>>,
    level_of: Vec<usize>,
}

impl Schedule {
    /// Order `names.len()` actors given their lag flags and the
    /// `(producer, consumer)` index pairs of every wiring edge.
    pub fn build(
        names: &[String],
        lagged: &[bool],
        edges: &[(usize, usize)],
    ) -> Result<Self, CycleError> {
        let n = names.len();
        let mut in_degree = vec![0usize; n];
        let mut dependents: Vec<Vec<usize>> = vec![Vec::new(); n];

        // Duplicate producer/consumer pairs (fan-in from one actor) count once
        let deps: BTreeSet<(usize, usize)> = edges
            .iter()
            .copied()
            .filter(|&(producer, _)| !lagged.get(producer).copied().unwrap_or(false))
            .collect();
        for &(producer, consumer) in &deps {
            in_degree[consumer] += 1;
            dependents[producer].push(consumer);
        }

        let mut levels = Vec::new();
        let mut level_of = vec![usize::MAX; n];
        let mut current: Vec<usize> = (0..n).filter(|&i| in_degree[i] == 0).collect();
        let mut processed = 0;

        while !current.is_empty() {
            current.sort_unstable();
            let mut next = Vec::new();
            for &i in &current {
                level_of[i] = levels.len();
                for &d in &dependents[i] {
                    in_degree[d] -= 1;
                    if in_degree[d] == 0 {
                        next.push(d);
                    }
                }
            }
            processed += current.len();
            levels.push(current);
            current = next;
        }

        if processed != n {
            let involved = (0..n)
                .filter(|&i| in_degree[i] > 0)
                .map(|i| names[i].clone())
                .collect();
            return Err(CycleError { involved });
        }

        Ok(Self {
            lagged: (0..n).filter(|&i| lagged.get(i).copied().unwrap_or(false)).collect(),
            levels,
            level_of,
        })
    }

    /// Indices of lagged actors, emitted at the start of every tick
    pub fn lagged(&self) -> &[usize] {
        &self.lagged
    }

    /// Receive/compute levels in execution order
    pub fn levels(&self) -> &[Vec<usize>] {
        &self.levels
    }

    /// Level index of actor `i`
    pub fn level_of(&self, i: usize) -> Option<usize> {
        self.level_of.get(i).copied()
    }
}
