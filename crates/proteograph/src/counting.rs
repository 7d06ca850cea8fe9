//! Counting paths through the graph, and how those paths are distributed along some axis, without enumerating them

// Standard Library Imports
use std::{mem, slice};

// External Crate Imports
use log::warn;

// Local Crate Imports
use crate::{Edge, FeatureKind, Graph, Qualifier, Result};

// Public API ==========================================================================================================

/// Counts of paths, indexed by how much of some quantity they've accumulated: `distribution[k]` paths have `k`
pub type Distribution = Vec<u128>;

/// How alternative annotation histories (`OrGroup`s) are counted when they disagree
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug)]
pub enum Combinator {
    Min,
    Max,
}

/// What a path accumulates as it crosses each edge
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum Axis {
    /// Nothing, so every path is counted at index 0
    Plain,
    /// Cleaved edges that were read through
    Miscleavages,
    /// Nodes visited between the sentinels, or one fewer than the edges crossed
    Hops,
    /// Features of a kind referenced by edge qualifiers
    Feature(FeatureKind, Combinator),
}

impl Graph {
    /// The number of paths from the start sentinel to the end sentinel. Saturates at `u128::MAX`
    pub fn path_count(&self) -> Result<u128> {
        let distribution = self.distribution(Axis::Plain)?;
        Ok(distribution.into_iter().fold(0, u128::saturating_add))
    }

    /// Counts every path from the start sentinel to the end sentinel by how much it accumulates along `axis`. Counts
    /// saturate at `u128::MAX`, logging a warning when they do
    pub fn distribution(&self, axis: Axis) -> Result<Distribution> {
        let mut distributions: Vec<Distribution> = vec![Vec::new(); self.nodes.len()];
        distributions[self.start.0] = vec![1];
        let mut saturated = false;

        for node in self.topological_order()? {
            if node == self.end {
                continue;
            }
            let distribution = mem::take(&mut distributions[node.0]);
            if distribution.is_empty() {
                continue;
            }
            for &edge in self.outgoing(node) {
                let edge = &self[edge];
                let shift = self.shift(axis, edge);
                saturated |= add_shifted(&mut distributions[edge.to.0], &distribution, shift);
            }
        }

        if saturated {
            warn!("{}: counts of paths along {axis:?} exceeded u128::MAX and were saturated", self.accession);
        }
        Ok(mem::take(&mut distributions[self.end.0]))
    }
}

impl Combinator {
    #[must_use]
    pub fn combine(self, a: usize, b: usize) -> usize {
        match self {
            Self::Min => a.min(b),
            Self::Max => a.max(b),
        }
    }
}

// Private Functions ===================================================================================================

impl Graph {
    fn shift(&self, axis: Axis, edge: &Edge) -> usize {
        match axis {
            Axis::Plain => 0,
            Axis::Miscleavages => usize::from(edge.cleaved == Some(true)),
            // NOTE: The edge into the end sentinel doesn't lead to another node, so it's not a hop
            Axis::Hops => usize::from(edge.to != self.end),
            Axis::Feature(kind, combinator) => edge
                .qualifiers()
                .map_or(0, |qualifiers| count_features(qualifiers, kind, combinator)),
        }
    }
}

/// Adds `source`, shifted right by `shift`, onto `target`. Returns `true` if any count saturated
fn add_shifted(target: &mut Distribution, source: &[u128], shift: usize) -> bool {
    let len = source.len() + shift;
    if target.len() < len {
        target.resize(len, 0);
    }

    let mut saturated = false;
    for (total, &count) in target[shift..].iter_mut().zip(source) {
        *total = total.checked_add(count).unwrap_or_else(|| {
            saturated = true;
            u128::MAX
        });
    }
    saturated
}

enum Frame<'q> {
    List(slice::Iter<'q, Qualifier>, usize),
    Group(slice::Iter<'q, Vec<Qualifier>>, Option<usize>),
}

/// Counts the features of `kind` in `qualifiers`, using `combinator` to pick between the alternatives of each
/// `OrGroup`. Nested groups are resolved with an explicit stack
fn count_features(qualifiers: &[Qualifier], kind: FeatureKind, combinator: Combinator) -> usize {
    let mut stack = vec![Frame::List(qualifiers.iter(), 0)];
    let mut count = 0;

    while let Some(frame) = stack.last_mut() {
        let finished = match frame {
            Frame::List(qualifiers, total) => match qualifiers.next() {
                Some(Qualifier::Feature(feature)) => {
                    *total += usize::from(feature.kind == kind);
                    None
                }
                Some(Qualifier::Or(group)) => {
                    stack.push(Frame::Group(group.alternatives().iter(), None));
                    None
                }
                None => Some(*total),
            },
            Frame::Group(alternatives, best) => match alternatives.next() {
                Some(alternative) => {
                    stack.push(Frame::List(alternative.iter(), 0));
                    None
                }
                None => Some(best.unwrap_or_default()),
            },
        };

        if let Some(finished) = finished {
            stack.pop();
            match stack.last_mut() {
                None => count = finished,
                Some(Frame::List(_, total)) => *total += finished,
                Some(Frame::Group(_, best)) => {
                    *best = Some(best.map_or(finished, |best| combinator.combine(best, finished)));
                }
            }
        }
    }

    count
}

// Module Tests ========================================================================================================
