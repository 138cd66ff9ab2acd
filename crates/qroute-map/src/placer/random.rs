//! Uniformly random placement.

use qroute_ir::{CircuitDag, QubitId};
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use tracing::debug;

use super::{Placer, empty_placement};
use crate::device::Device;
use crate::error::MapResult;
use crate::placement::Placement;

/// Shuffle the physical qubits and assign them to virtual qubits in order.
///
/// Deterministic when a seed is given.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomPlacer {
    seed: Option<u64>,
}

impl RandomPlacer {
    /// Create a placer; `None` draws the seed from the OS.
    pub fn new(seed: Option<u64>) -> Self {
        Self { seed }
    }

    /// Create a deterministic placer.
    pub fn seeded(seed: u64) -> Self {
        Self { seed: Some(seed) }
    }
}

impl Placer for RandomPlacer {
    fn name(&self) -> &'static str {
        "random"
    }

    fn place(&self, dag: &CircuitDag, device: &Device) -> MapResult<Placement> {
        let mut placement = empty_placement(dag, device)?;
        let mut rng = match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let mut phys: Vec<u32> = (0..device.num_qubits()).collect();
        phys.shuffle(&mut rng);

        for (v, &phy) in (0..placement.num_v()).zip(&phys) {
            placement.map_v_phy(QubitId(v), phy)?;
        }
        debug!(seed = ?self.seed, "random placement");
        Ok(placement)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use qroute_ir::Circuit;

    #[test]
    fn test_seeded_is_deterministic() {
        let c = Circuit::with_size("c", 4, 0);
        let device = Device::grid(3, 3);
        let a = RandomPlacer::seeded(7).place(c.dag(), &device).unwrap();
        let b = RandomPlacer::seeded(7).place(c.dag(), &device).unwrap();
        assert_eq!(a, b);
        assert!(a.is_complete());
        assert!(a.is_consistent());
        assert_eq!(a.free_phy().count(), 5);
    }

    #[test]
    fn test_too_many_qubits() {
        let c = Circuit::with_size("c", 4, 0);
        let device = Device::path(3);
        assert!(RandomPlacer::seeded(0).place(c.dag(), &device).is_err());
    }
}
