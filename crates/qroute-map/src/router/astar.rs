//! Layer-by-layer routing with an A* search over SWAP sequences.

use std::cmp::Reverse;
use std::collections::BinaryHeap;

use qroute_ir::{CircuitDag, Instruction, QubitId};
use rustc_hash::FxHashMap;
use tracing::{debug, info, instrument};

use super::state::MapState;
use super::{Router, RoutingResult, default_swap_limit};
use crate::cancel::CancellationToken;
use crate::device::Device;
use crate::error::{MapError, MapResult};
use crate::layers::asap_layers;
use crate::placement::Placement;

/// Node expansions allowed per search unless configured.
const DEFAULT_MAX_EXPANSIONS: usize = 100_000;

/// Router that resolves each circuit layer with a shortest SWAP sequence.
///
/// For every ASAP layer, executable gates are emitted first. While some
/// two-qubit gates remain blocked, an A* search over SWAPs touching their
/// qubits finds the fewest SWAPs after which at least one of them becomes
/// executable.
#[derive(Debug, Clone)]
pub struct AStarRouter {
    max_expansions: usize,
    max_swaps: Option<usize>,
}

impl Default for AStarRouter {
    fn default() -> Self {
        Self {
            max_expansions: DEFAULT_MAX_EXPANSIONS,
            max_swaps: None,
        }
    }
}

impl AStarRouter {
    /// Create a router with default limits.
    pub fn new() -> Self {
        Self::default()
    }

    /// Cap the number of nodes each search may expand.
    pub fn with_max_expansions(mut self, max_expansions: usize) -> Self {
        self.max_expansions = max_expansions;
        self
    }

    /// Cap the total number of inserted SWAPs.
    pub fn with_max_swaps(mut self, max_swaps: usize) -> Self {
        self.max_swaps = Some(max_swaps);
        self
    }

    fn search(&self, state: &MapState<'_>, blocked: &[&Instruction]) -> MapResult<Vec<(u32, u32)>> {
        let device = state.device();
        let involved: Vec<QubitId> = blocked.iter().flat_map(|i| i.qubits.iter().copied()).collect();
        let start = involved
            .iter()
            .map(|&v| state.placement().v_to_phy(v).ok_or(MapError::MissingPlacement))
            .collect::<MapResult<Vec<u32>>>()?;

        // Involved qubits come in gate pairs: positions[2i], positions[2i + 1].
        // A SWAP brings each pair at most one hop closer, so the smallest
        // excess distance never overestimates the SWAPs still needed.
        let excess = |positions: &[u32]| -> MapResult<u32> {
            let mut least = u32::MAX;
            for pair in positions.chunks_exact(2) {
                least = least.min(device.distance(pair[0], pair[1])? - 1);
            }
            Ok(if least == u32::MAX { 0 } else { least })
        };

        let mut nodes = vec![SearchNode {
            positions: start.clone(),
            parent: None,
            swap: (0, 0),
            g: 0,
        }];
        let mut best_g: FxHashMap<Vec<u32>, u32> = FxHashMap::default();
        best_g.insert(start.clone(), 0);
        let mut open = BinaryHeap::new();
        open.push(Reverse((excess(&start)?, 0usize)));

        let mut expansions = 0usize;
        while let Some(Reverse((_, idx))) = open.pop() {
            let (positions, g) = (nodes[idx].positions.clone(), nodes[idx].g);
            if best_g.get(&positions).is_some_and(|&best| best < g) {
                continue;
            }
            if excess(&positions)? == 0 {
                return Ok(trace_swaps(&nodes, idx));
            }

            expansions += 1;
            if expansions > self.max_expansions {
                return Err(MapError::NoSolutionFound(format!(
                    "A* routing search exceeded {} expansions",
                    self.max_expansions
                )));
            }

            for &(a, b) in device.edges() {
                if !positions.iter().any(|&p| p == a || p == b) {
                    continue;
                }
                let next: Vec<u32> = positions
                    .iter()
                    .map(|&p| match p {
                        p if p == a => b,
                        p if p == b => a,
                        p => p,
                    })
                    .collect();
                let next_g = g + 1;
                if best_g.get(&next).is_some_and(|&best| best <= next_g) {
                    continue;
                }
                best_g.insert(next.clone(), next_g);
                let h = excess(&next)?;
                nodes.push(SearchNode {
                    positions: next,
                    parent: Some(idx),
                    swap: (a, b),
                    g: next_g,
                });
                open.push(Reverse((next_g + h, nodes.len() - 1)));
            }
        }

        Err(MapError::NoSolutionFound(
            "blocked gates cannot be brought together".into(),
        ))
    }
}

struct SearchNode {
    positions: Vec<u32>,
    parent: Option<usize>,
    swap: (u32, u32),
    g: u32,
}

fn trace_swaps(nodes: &[SearchNode], mut idx: usize) -> Vec<(u32, u32)> {
    let mut swaps = Vec::new();
    while let Some(parent) = nodes[idx].parent {
        swaps.push(nodes[idx].swap);
        idx = parent;
    }
    swaps.reverse();
    swaps
}

impl Router for AStarRouter {
    fn name(&self) -> &'static str {
        "astar"
    }

    #[instrument(skip_all, fields(qubits = dag.num_qubits(), ops = dag.num_ops()))]
    fn route(
        &self,
        dag: &CircuitDag,
        device: &Device,
        placement: Placement,
        cancel: &CancellationToken,
    ) -> MapResult<RoutingResult> {
        let mut state = MapState::new(dag, device, placement, true)?;
        let limit = self
            .max_swaps
            .unwrap_or_else(|| default_swap_limit(dag, device));

        for (depth, layer) in asap_layers(dag).into_iter().enumerate() {
            let mut pending: Vec<&Instruction> = layer
                .into_iter()
                .filter_map(|node| dag.get_instruction(node))
                .collect();

            loop {
                cancel.check()?;
                let mut blocked = Vec::with_capacity(pending.len());
                for inst in pending {
                    if !state.try_add(inst)? {
                        blocked.push(inst);
                    }
                }
                if blocked.is_empty() {
                    break;
                }

                let swaps = self.search(&state, &blocked)?;
                debug!(layer = depth, blocked = blocked.len(), swaps = swaps.len(), "layer search");
                for (a, b) in swaps {
                    if state.num_swaps() >= limit {
                        return Err(MapError::RoutingDidNotConverge {
                            swaps: state.num_swaps(),
                            limit,
                        });
                    }
                    state.add_swap(a, b)?;
                }
                pending = blocked;
            }
        }

        state.finish()?;
        let (circuit, init_placement, final_placement, swaps) = state.into_parts()?;
        info!(swaps = swaps.len(), "A* routing finished");
        Ok(RoutingResult {
            circuit: circuit.ok_or(MapError::MissingPlacement)?,
            init_placement,
            final_placement,
            swaps,
        })
    }
}
