//! A* search over token configurations.

use std::cmp::Reverse;
use std::collections::BinaryHeap;

use rustc_hash::FxHashMap;
use tracing::{debug, info};

use super::{TokenSwapProblem, TokenSwapper};
use crate::cancel::CancellationToken;
use crate::device::Device;
use crate::error::{MapError, MapResult};

const DEFAULT_MAX_EXPANSIONS: usize = 1_000_000;

/// Stands in for every free token, so configurations that differ only in
/// where free tokens sit are one search state.
const FREE: u32 = u32::MAX;

/// Expansions between two cancellation checks.
const CANCEL_INTERVAL: usize = 1024;

/// Exact (or, non-admissible, greedy) token swapping by A* search.
///
/// A state is the vertex-to-token assignment of the pinned tokens. The
/// heuristic is the total distance of misplaced pinned tokens to their
/// targets; halved and rounded up it never overestimates, since one SWAP
/// moves two tokens by one hop each.
#[derive(Debug, Clone, Copy)]
pub struct AStarTokenSwap {
    admissible: bool,
    max_expansions: usize,
}

impl Default for AStarTokenSwap {
    fn default() -> Self {
        Self {
            admissible: true,
            max_expansions: DEFAULT_MAX_EXPANSIONS,
        }
    }
}

impl AStarTokenSwap {
    /// Admissible search with the default expansion cap.
    pub fn new() -> Self {
        Self::default()
    }

    /// Use the full distance sum as heuristic. Faster, not optimal.
    pub fn inadmissible(mut self) -> Self {
        self.admissible = false;
        self
    }

    /// Cap the number of expanded states.
    pub fn with_max_expansions(mut self, max_expansions: usize) -> Self {
        self.max_expansions = max_expansions;
        self
    }

    fn heuristic(&self, device: &Device, tokens: &[u32], goal: &[u32]) -> MapResult<u32> {
        let mut total = 0;
        for (v, &token) in (0u32..).zip(tokens) {
            if token != FREE {
                total += device.distance(v, goal[token as usize])?;
            }
        }
        Ok(if self.admissible { total.div_ceil(2) } else { total })
    }
}

struct Node {
    tokens: Vec<u32>,
    parent: Option<usize>,
    swap: (u32, u32),
    g: u32,
}

impl TokenSwapper for AStarTokenSwap {
    fn name(&self) -> &'static str {
        "astar"
    }

    fn solve(
        &self,
        device: &Device,
        problem: &TokenSwapProblem,
        cancel: &CancellationToken,
    ) -> MapResult<Vec<(u32, u32)>> {
        let goal = problem.target_positions();
        let pinned_only = |tokens: &[u32]| -> Vec<u32> {
            tokens
                .iter()
                .map(|&t| if problem.is_pinned(t) { t } else { FREE })
                .collect()
        };
        let start = pinned_only(problem.init());
        let target = pinned_only(problem.target());

        let mut nodes = vec![Node {
            tokens: start.clone(),
            parent: None,
            swap: (0, 0),
            g: 0,
        }];
        let mut best_g: FxHashMap<Vec<u32>, u32> = FxHashMap::default();
        best_g.insert(start.clone(), 0);
        let mut open = BinaryHeap::new();
        open.push(Reverse((self.heuristic(device, &start, &goal)?, 0usize)));

        let mut expansions = 0usize;
        while let Some(Reverse((_, idx))) = open.pop() {
            let g = nodes[idx].g;
            if best_g
                .get(&nodes[idx].tokens)
                .is_some_and(|&best| best < g)
            {
                continue;
            }
            if nodes[idx].tokens == target {
                let swaps = trace_swaps(&nodes, idx);
                info!(swaps = swaps.len(), expansions, "A* token swap solved");
                return Ok(swaps);
            }

            expansions += 1;
            if expansions % CANCEL_INTERVAL == 0 {
                cancel.check()?;
            }
            if expansions > self.max_expansions {
                return Err(MapError::NoSolutionFound(format!(
                    "A* token swap exceeded {} expansions",
                    self.max_expansions
                )));
            }

            for &(a, b) in device.edges() {
                let mut next = nodes[idx].tokens.clone();
                next.swap(a as usize, b as usize);
                let next_g = g + 1;
                if best_g.get(&next).is_some_and(|&best| best <= next_g) {
                    continue;
                }
                let h = self.heuristic(device, &next, &goal)?;
                best_g.insert(next.clone(), next_g);
                nodes.push(Node {
                    tokens: next,
                    parent: Some(idx),
                    swap: (a, b),
                    g: next_g,
                });
                open.push(Reverse((next_g + h, nodes.len() - 1)));
            }
        }

        debug!(expansions, "A* open list exhausted");
        Err(MapError::NoSolutionFound(
            "token configuration is unreachable".into(),
        ))
    }
}

fn trace_swaps(nodes: &[Node], mut idx: usize) -> Vec<(u32, u32)> {
    let mut swaps = Vec::new();
    while let Some(parent) = nodes[idx].parent {
        swaps.push(nodes[idx].swap);
        idx = parent;
    }
    swaps.reverse();
    swaps
}
