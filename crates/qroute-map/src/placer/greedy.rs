//! Layer-based placement on a maximum swap layer of the device.

use std::cmp::Reverse;

use qroute_ir::CircuitDag;
use tracing::{debug, warn};

use super::{Placer, empty_placement};
use crate::device::Device;
use crate::error::MapResult;
use crate::layers::two_qubit_layers;
use crate::placement::Placement;

/// Search steps spent enumerating matchings unless configured.
const DEFAULT_MAX_STEPS: usize = 20_000;

/// Place the first layer of two-qubit gates on the edges of the largest
/// swap layer (inclusion-maximal matching) of the device, then fill the
/// rest in ascending order.
#[derive(Debug, Clone, Copy)]
pub struct GreedyPlacer {
    max_steps: usize,
}

impl Default for GreedyPlacer {
    fn default() -> Self {
        Self {
            max_steps: DEFAULT_MAX_STEPS,
        }
    }
}

impl GreedyPlacer {
    /// Create a placer with the default enumeration budget.
    pub fn new() -> Self {
        Self::default()
    }

    /// Bound the backtracking search over matchings.
    pub fn with_max_steps(mut self, max_steps: usize) -> Self {
        self.max_steps = max_steps.max(1);
        self
    }
}

/// Enumerate inclusion-maximal matchings of `device`, in the order a
/// include-first backtracking search over the edge list finds them.
///
/// Stops after `max_steps` search steps; the greedy matching (found first)
/// is always returned.
pub fn swap_layers(device: &Device, max_steps: usize) -> Vec<Vec<(u32, u32)>> {
    let mut search = MatchingSearch {
        edges: device.edges(),
        used: vec![false; device.num_qubits() as usize],
        current: Vec::new(),
        found: Vec::new(),
        steps_left: max_steps.max(1),
    };
    search.visit(0);
    search.found
}

struct MatchingSearch<'a> {
    edges: &'a [(u32, u32)],
    used: Vec<bool>,
    current: Vec<(u32, u32)>,
    found: Vec<Vec<(u32, u32)>>,
    steps_left: usize,
}

impl MatchingSearch<'_> {
    fn visit(&mut self, i: usize) {
        if i == self.edges.len() {
            let maximal = self
                .edges
                .iter()
                .all(|&(u, v)| self.used[u as usize] || self.used[v as usize]);
            if maximal {
                self.found.push(self.current.clone());
            }
            return;
        }
        if self.steps_left == 0 && !self.found.is_empty() {
            return;
        }
        self.steps_left = self.steps_left.saturating_sub(1);

        let (u, v) = self.edges[i];
        let free = !self.used[u as usize] && !self.used[v as usize];
        if free {
            self.used[u as usize] = true;
            self.used[v as usize] = true;
            self.current.push((u, v));
            self.visit(i + 1);
            self.current.pop();
            self.used[u as usize] = false;
            self.used[v as usize] = false;
        }
        self.visit(i + 1);
    }
}

impl Placer for GreedyPlacer {
    fn name(&self) -> &'static str {
        "greedy"
    }

    fn place(&self, dag: &CircuitDag, device: &Device) -> MapResult<Placement> {
        let mut placement = empty_placement(dag, device)?;
        let layers = swap_layers(device, self.max_steps);
        // First of the largest layers.
        let best = layers
            .iter()
            .min_by_key(|layer| Reverse(layer.len()))
            .cloned()
            .unwrap_or_default();
        if best.is_empty() {
            warn!("device has no edges, falling back to ascending placement");
        }
        debug!(candidates = layers.len(), edges = best.len(), "selected swap layer");

        let first_layer = two_qubit_layers(dag).into_iter().next().unwrap_or_default();
        let mut edges = best.iter();
        for node in first_layer {
            let Some(inst) = dag.get_instruction(node) else {
                continue;
            };
            let (c, t) = (inst.qubits[0], inst.qubits[1]);
            if placement.v_to_phy(c).is_some() || placement.v_to_phy(t).is_some() {
                continue;
            }
            let Some(&(u, v)) = edges.next() else {
                break;
            };
            placement.map_v_phy(c, u)?;
            placement.map_v_phy(t, v)?;
        }

        placement.complete_with_free()?;
        Ok(placement)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use qroute_ir::{Circuit, QubitId};

    #[test]
    fn test_swap_layers_of_path() {
        let layers = swap_layers(&Device::path(4), 1000);
        // {01, 23} and {12} are the maximal matchings of a 4-path.
        assert_eq!(layers.len(), 2);
        assert!(layers.contains(&vec![(0, 1), (2, 3)]));
        assert!(layers.contains(&vec![(1, 2)]));
    }

    #[test]
    fn test_swap_layers_are_matchings() {
        let device = Device::grid(3, 3);
        for layer in swap_layers(&device, 5000) {
            let mut seen = vec![false; 9];
            for (u, v) in layer {
                assert!(!seen[u as usize] && !seen[v as usize]);
                seen[u as usize] = true;
                seen[v as usize] = true;
            }
        }
    }

    #[test]
    fn test_budget_still_yields_greedy_matching() {
        let layers = swap_layers(&Device::grid(4, 4), 1);
        assert_eq!(layers.len(), 1);
        assert!(!layers[0].is_empty());
    }

    #[test]
    fn test_first_layer_gates_are_adjacent() {
        let mut c = Circuit::with_size("c", 4, 0);
        c.cx(QubitId(0), QubitId(3))
            .unwrap()
            .cx(QubitId(1), QubitId(2))
            .unwrap()
            .cx(QubitId(0), QubitId(1))
            .unwrap();
        let device = Device::path(4);
        let placement = GreedyPlacer::new().place(c.dag(), &device).unwrap();

        assert!(placement.is_complete());
        let p = |q| placement.v_to_phy(QubitId(q)).unwrap();
        assert!(device.are_connected(p(0), p(3)));
        assert!(device.are_connected(p(1), p(2)));
    }

    #[test]
    fn test_edgeless_device() {
        let c = Circuit::with_size("c", 2, 0);
        let placement = GreedyPlacer::new().place(c.dag(), &Device::new(3)).unwrap();
        assert_eq!(placement.v_to_phy(QubitId(1)), Some(1));
    }
}
