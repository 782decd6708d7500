//! All-pairs hop distances over the raw structure graph.

use std::collections::VecDeque;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Directed hop count between two pages.
///
/// `Hops` orders before `Unreachable`, so an unreachable page compares as
/// farther away than any reachable one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Distance {
    /// Reachable in this many links
    Hops(u32),
    /// No directed path exists
    Unreachable,
}

impl Distance {
    /// Hop count, if reachable.
    pub fn hops(self) -> Option<u32> {
        match self {
            Distance::Hops(h) => Some(h),
            Distance::Unreachable => None,
        }
    }

    /// True if a directed path exists.
    pub fn is_reachable(self) -> bool {
        matches!(self, Distance::Hops(_))
    }
}

impl fmt::Display for Distance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Distance::Hops(h) => write!(f, "{}", h),
            Distance::Unreachable => write!(f, "unreachable"),
        }
    }
}

/// Dense distance matrix indexed by arena index: `rows[source][target]`.
#[derive(Debug, Clone, Default)]
pub struct DistanceIndex {
    rows: Vec<Vec<Option<u32>>>,
}

impl DistanceIndex {
    /// Run one breadth-first search per source over `adjacency`.
    ///
    /// Each row is written only by its own search, so rows are computed in
    /// parallel when the `parallel` feature is enabled.
    pub fn compute(adjacency: &[&[usize]]) -> Self {
        let n = adjacency.len();

        #[cfg(feature = "parallel")]
        let rows = {
            use rayon::prelude::*;
            (0..n)
                .into_par_iter()
                .map(|source| bfs_row(adjacency, source))
                .collect()
        };

        #[cfg(not(feature = "parallel"))]
        let rows = sequential_rows(adjacency);

        Self { rows }
    }

    /// Distance from `from` to `to`; out-of-range indices are unreachable.
    pub fn get(&self, from: usize, to: usize) -> Distance {
        match self.rows.get(from).and_then(|row| row.get(to)) {
            Some(Some(h)) => Distance::Hops(*h),
            _ => Distance::Unreachable,
        }
    }

    /// Number of source rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// True if no rows were computed.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

#[cfg(any(test, not(feature = "parallel")))]
fn sequential_rows(adjacency: &[&[usize]]) -> Vec<Vec<Option<u32>>> {
    (0..adjacency.len())
        .map(|source| bfs_row(adjacency, source))
        .collect()
}

fn bfs_row(adjacency: &[&[usize]], source: usize) -> Vec<Option<u32>> {
    let mut row = vec![None; adjacency.len()];
    let mut queue = VecDeque::new();

    row[source] = Some(0);
    queue.push_back(source);

    while let Some(node) = queue.pop_front() {
        let next = row[node].map_or(0, |d| d + 1);
        for &child in adjacency[node] {
            if row[child].is_none() {
                row[child] = Some(next);
                queue.push_back(child);
            }
        }
    }

    row
}
