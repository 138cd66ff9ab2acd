//! Initial placement strategies.
//!
//! A [`Placer`] chooses where virtual qubits start on the device before
//! routing. Placements may be partial; routers place the remaining qubits
//! on demand.

mod greedy;
mod line;
mod random;
mod sabre;
mod sat;

pub use greedy::GreedyPlacer;
pub use line::LinePlacer;
pub use random::RandomPlacer;
pub use sabre::SabrePlacer;
pub use sat::{SatPlacementMode, SatPlacer};

use qroute_ir::CircuitDag;

use crate::device::Device;
use crate::error::{MapError, MapResult};
use crate::placement::Placement;

/// A strategy producing an initial placement.
pub trait Placer {
    /// Short identifier used in logs.
    fn name(&self) -> &'static str;

    /// Place the virtual qubits of `dag` on `device`.
    fn place(&self, dag: &CircuitDag, device: &Device) -> MapResult<Placement>;
}

/// Fail early when the circuit has more qubits than the device.
#[allow(clippy::cast_possible_truncation)]
pub(crate) fn empty_placement(dag: &CircuitDag, device: &Device) -> MapResult<Placement> {
    let num_v = dag.num_qubits();
    if num_v > device.num_qubits() as usize {
        return Err(MapError::CircuitTooLarge {
            required: num_v,
            available: device.num_qubits(),
        });
    }
    Ok(Placement::new(num_v as u32, device.num_qubits()))
}
