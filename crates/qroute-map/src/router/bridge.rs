//! Routing without remapping: long-range CX gates become Bridge gates.

use qroute_ir::{CircuitDag, StandardGate};
use tracing::{info, instrument};

use super::state::MapState;
use super::{Router, RoutingResult};
use crate::cancel::CancellationToken;
use crate::device::Device;
use crate::error::{MapError, MapResult};
use crate::placement::Placement;

/// Router that never moves qubits.
///
/// A CX between non-adjacent physical qubits is emitted as a single
/// [`StandardGate::Bridge`], to be expanded along a shortest path by the
/// bridge decomposition pass. Other long-range two-qubit gates are
/// rejected.
#[derive(Debug, Clone, Copy, Default)]
pub struct BridgeRouter;

impl BridgeRouter {
    /// Create a bridge router.
    pub fn new() -> Self {
        Self
    }
}

impl Router for BridgeRouter {
    fn name(&self) -> &'static str {
        "bridge"
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
        let mut bridges = 0usize;

        for (_, inst) in dag.topological_ops() {
            cancel.check()?;
            if state.try_add(inst)? {
                continue;
            }
            // Blocked: a two-qubit gate whose qubits are now placed.
            if inst.standard_gate() != Some(StandardGate::CX) {
                return Err(MapError::UnsupportedInstruction {
                    name: inst.name().to_string(),
                    num_qubits: inst.num_qubits(),
                    reason: "only CX can be bridged between non-adjacent qubits".into(),
                });
            }
            let placement = state.placement();
            let (Some(c), Some(t)) = (
                placement.v_to_phy(inst.qubits[0]),
                placement.v_to_phy(inst.qubits[1]),
            ) else {
                return Err(MapError::MissingPlacement);
            };
            state.emit_physical(StandardGate::Bridge, c, t)?;
            bridges += 1;
        }

        state.finish()?;
        let (circuit, init_placement, final_placement, swaps) = state.into_parts()?;
        info!(bridges, "bridge routing finished");
        Ok(RoutingResult {
            circuit: circuit.ok_or(MapError::MissingPlacement)?,
            init_placement,
            final_placement,
            swaps,
        })
    }
}
