//! Checks that a mapped circuit respects the device and computes the same
//! function as the original.

mod pathsum;
mod statevector;
mod unitary;

pub use pathsum::check_pathsum;
pub use statevector::{MAX_SIMULATED_QUBITS, StateVector, check_statevector};
pub use unitary::Unitary2x2;

use qroute_ir::CircuitDag;
use tracing::debug;

use crate::device::Device;
use crate::error::{MapError, MapResult};
use crate::placement::Placement;
use crate::router::RoutingResult;

/// Every multi-qubit gate of `dag` acts on connected physical qubits.
///
/// Bridge gates are exempt: they are realised along a path later.
pub fn check_connectivity(dag: &CircuitDag, device: &Device) -> MapResult<()> {
    for (_, inst) in dag.topological_ops() {
        for q in &inst.qubits {
            device.check_qubit(q.0)?;
        }
        if !inst.is_gate() || inst.num_qubits() < 2 || inst.is_bridge() {
            continue;
        }
        if inst.num_qubits() > 2 {
            return Err(MapError::MappingViolation(format!(
                "{} acts on {} qubits",
                inst.name(),
                inst.num_qubits()
            )));
        }
        let (a, b) = (inst.qubits[0].0, inst.qubits[1].0);
        if !device.are_connected(a, b) {
            return Err(MapError::MappingViolation(format!(
                "{} on unconnected physical qubits {a} and {b}",
                inst.name()
            )));
        }
    }
    Ok(())
}

/// Run every applicable check on a routing result.
pub fn verify_routing(
    original: &CircuitDag,
    result: &RoutingResult,
    device: &Device,
) -> MapResult<()> {
    verify_mapping(
        original,
        &result.circuit,
        &result.init_placement,
        &result.final_placement,
        device,
    )
}

/// Check `mapped` against `original` on `device`.
///
/// Connectivity and path sums always; the state-vector comparison when the
/// device is small enough to simulate.
pub fn verify_mapping(
    original: &CircuitDag,
    mapped: &CircuitDag,
    init: &Placement,
    fin: &Placement,
    device: &Device,
) -> MapResult<()> {
    check_connectivity(mapped, device)?;
    check_pathsum(original, mapped, init, fin)?;
    if device.num_qubits() as usize <= MAX_SIMULATED_QUBITS {
        check_statevector(original, mapped, init, fin)?;
    } else {
        debug!(qubits = device.num_qubits(), "skipping state-vector check");
    }
    Ok(())
}
