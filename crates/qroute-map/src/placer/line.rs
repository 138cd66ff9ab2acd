//! Placement of interaction chains along device paths.

use qroute_ir::{CircuitDag, QubitId};
use tracing::debug;

use super::{Placer, empty_placement};
use crate::device::Device;
use crate::error::MapResult;
use crate::layers::two_qubit_layers;
use crate::placement::Placement;

/// Lay chains of interacting qubits along device paths.
///
/// Walking the two-qubit gates layer by layer, a pair joins the interaction
/// graph if both qubits have fewer than two partners and it closes no
/// cycle. The resulting chains are placed longest first, each starting on
/// the free qubit with the most free neighbours. Qubits in no chain, and
/// chain tails that run into a dead end, stay unplaced.
#[derive(Debug, Clone, Copy, Default)]
pub struct LinePlacer;

impl LinePlacer {
    pub fn new() -> Self {
        Self
    }
}

/// Chains of virtual qubits, longest first.
fn extract_lines(dag: &CircuitDag) -> Vec<Vec<u32>> {
    let n = dag.num_qubits();
    let mut parent: Vec<usize> = (0..n).collect();
    let mut degree = vec![0u8; n];
    let mut partners: Vec<Vec<usize>> = vec![Vec::new(); n];

    fn root(parent: &mut [usize], mut i: usize) -> usize {
        while parent[i] != i {
            parent[i] = parent[parent[i]];
            i = parent[i];
        }
        i
    }

    for layer in two_qubit_layers(dag) {
        for node in layer {
            let Some(inst) = dag.get_instruction(node) else {
                continue;
            };
            let (a, b) = (inst.qubits[0].index(), inst.qubits[1].index());
            if degree[a] >= 2 || degree[b] >= 2 {
                continue;
            }
            let (ra, rb) = (root(&mut parent, a), root(&mut parent, b));
            if ra == rb {
                continue;
            }
            parent[ra] = rb;
            degree[a] += 1;
            degree[b] += 1;
            partners[a].push(b);
            partners[b].push(a);
        }
    }

    let mut visited = vec![false; n];
    let mut lines = Vec::new();
    for start in 0..n {
        if degree[start] != 1 || visited[start] {
            continue;
        }
        let mut line = Vec::new();
        let mut current = Some(start);
        while let Some(q) = current {
            visited[q] = true;
            #[allow(clippy::cast_possible_truncation)]
            line.push(q as u32);
            current = partners[q].iter().copied().find(|&p| !visited[p]);
        }
        lines.push(line);
    }
    // Stable: equal lengths keep ascending start qubit.
    lines.sort_by(|a, b| b.len().cmp(&a.len()));
    lines
}

fn free_degree(device: &Device, placement: &Placement, phy: u32) -> usize {
    device
        .neighbors(phy)
        .iter()
        .filter(|&&n| placement.phy_to_v(n).is_none())
        .count()
}

impl Placer for LinePlacer {
    fn name(&self) -> &'static str {
        "line"
    }

    fn place(&self, dag: &CircuitDag, device: &Device) -> MapResult<Placement> {
        let mut placement = empty_placement(dag, device)?;
        let lines = extract_lines(dag);
        debug!(lines = lines.len(), "interaction chains");

        for line in &lines {
            // Most free neighbours first, lowest index on ties.
            let start = placement
                .free_phy()
                .max_by_key(|&p| (free_degree(device, &placement, p), std::cmp::Reverse(p)));
            let Some(mut phy) = start else {
                break;
            };
            placement.map_v_phy(QubitId(line[0]), phy)?;

            for &v in &line[1..] {
                let next = device
                    .neighbors(phy)
                    .iter()
                    .copied()
                    .filter(|&n| placement.phy_to_v(n).is_none())
                    .max_by_key(|&n| (free_degree(device, &placement, n), std::cmp::Reverse(n)));
                let Some(next) = next else {
                    break;
                };
                placement.map_v_phy(QubitId(v), next)?;
                phy = next;
            }
        }
        Ok(placement)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use qroute_ir::Circuit;

    #[test]
    fn test_extract_lines() {
        let mut c = Circuit::with_size("c", 5, 0);
        c.cx(QubitId(0), QubitId(1))
            .unwrap()
            .cx(QubitId(1), QubitId(2))
            .unwrap()
            .cx(QubitId(2), QubitId(0))
            .unwrap()
            .cx(QubitId(3), QubitId(4))
            .unwrap();
        let lines = extract_lines(c.dag());
        assert_eq!(lines, vec![vec![0, 1, 2], vec![3, 4]]);
    }

    #[test]
    fn test_chain_lands_on_a_path() {
        let mut c = Circuit::with_size("c", 4, 0);
        for i in 0..3 {
            c.cx(QubitId(i), QubitId(i + 1)).unwrap();
        }
        let device = Device::grid(3, 3);
        let placement = LinePlacer::new().place(c.dag(), &device).unwrap();
        assert!(placement.is_complete());
        for i in 0..3 {
            let a = placement.v_to_phy(QubitId(i)).unwrap();
            let b = placement.v_to_phy(QubitId(i + 1)).unwrap();
            assert!(device.are_connected(a, b));
        }
    }

    #[test]
    fn test_isolated_qubits_stay_unplaced() {
        let mut c = Circuit::with_size("c", 3, 0);
        c.cx(QubitId(0), QubitId(1)).unwrap().h(QubitId(2)).unwrap();
        let placement = LinePlacer::new().place(c.dag(), &Device::path(4)).unwrap();
        assert_eq!(placement.num_mapped(), 2);
        assert_eq!(placement.v_to_phy(QubitId(2)), None);
    }
}
