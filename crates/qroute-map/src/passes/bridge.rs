//! Bridge decomposition.
//!
//! A Bridge gate is a CX between two physical qubits that need not be
//! adjacent. On a path `q0 .. qk` it is realised with nearest-neighbour CX
//! gates: a ladder that XORs `q0 .. q(k-1)` into `qk`, followed by a ladder
//! that XORs `q1 .. q(k-1)` into `qk` again. Both ladders restore the inner
//! qubits, so only `q0` remains on the target. A path of length `k` costs
//! `4k - 4` CX gates.

use qroute_ir::{CircuitDag, CircuitLevel, Instruction, QubitId, StandardGate};
use tracing::debug;

use crate::device::Device;
use crate::error::{MapError, MapResult};
use crate::pass::{Pass, PassKind};
use crate::property::PropertySet;

/// CX gates along `path` computing `path[last] ^= path[first]`.
///
/// Each pair is `(control, target)` and acts on neighbouring path entries.
pub fn bridge_cx_sequence(path: &[u32]) -> Vec<(u32, u32)> {
    let mut gates = Vec::new();
    if path.len() < 2 {
        return gates;
    }
    for start in 0..2.min(path.len() - 1) {
        ladder(&path[start..], &mut gates);
    }
    gates
}

/// XOR every entry but the last into the last one, leaving the others as
/// they were.
fn ladder(path: &[u32], gates: &mut Vec<(u32, u32)>) {
    let last = path.len() - 1;
    gates.extend((0..last).map(|i| (path[i], path[i + 1])));
    gates.extend((0..last.saturating_sub(1)).rev().map(|i| (path[i], path[i + 1])));
}

/// Copy `dag`, replacing every Bridge gate by CX gates along the shortest
/// device path between its qubits.
pub fn decompose_bridges(dag: &CircuitDag, device: &Device) -> MapResult<CircuitDag> {
    let mut out = CircuitDag::with_size(
        qubit_count(dag.num_qubits())?,
        qubit_count(dag.num_clbits())?,
    );
    out.set_level(dag.level());

    let mut bridges = 0usize;
    for (_, inst) in dag.topological_ops() {
        if !inst.is_bridge() {
            out.apply(inst.clone())?;
            continue;
        }
        let (control, target) = (inst.qubits[0].0, inst.qubits[1].0);
        let path = device.shortest_path(control, target)?;
        for (c, t) in bridge_cx_sequence(&path) {
            out.apply(Instruction::two_qubit_gate(
                StandardGate::CX,
                QubitId(c),
                QubitId(t),
            ))?;
        }
        bridges += 1;
    }
    debug!(bridges, ops = out.num_ops(), "bridges decomposed");
    Ok(out)
}

fn qubit_count(n: usize) -> MapResult<u32> {
    u32::try_from(n).map_err(|_| MapError::InvalidConfiguration(format!("{n} wires")))
}

/// Replaces Bridge gates with nearest-neighbour CX gates.
pub struct BridgeDecomposition;

impl Pass for BridgeDecomposition {
    fn name(&self) -> &'static str {
        "BridgeDecomposition"
    }

    fn kind(&self) -> PassKind {
        PassKind::Transformation
    }

    fn run(&self, dag: &mut CircuitDag, properties: &mut PropertySet) -> MapResult<()> {
        let device = properties.device.as_ref().ok_or(MapError::MissingDevice)?;
        if dag.level() != CircuitLevel::Physical {
            return Err(MapError::InvalidConfiguration(
                "bridge decomposition needs a routed circuit".into(),
            ));
        }
        *dag = decompose_bridges(dag, device)?;
        Ok(())
    }

    fn should_run(&self, dag: &CircuitDag, _properties: &PropertySet) -> bool {
        dag.topological_ops().any(|(_, inst)| inst.is_bridge())
    }
}
