//! SABRE re-placement: refine a placement with a forward and a backward
//! routing pass.

use qroute_ir::{CircuitDag, Direction};
use tracing::debug;

use super::{GreedyPlacer, Placer};
use crate::cancel::CancellationToken;
use crate::device::Device;
use crate::error::MapResult;
use crate::placement::Placement;
use crate::router::{RouterConfig, SabreEngine};

/// Refine a seed placement by routing the circuit forwards and then
/// backwards, keeping only where the qubits end up.
///
/// Qubits that interact often end up close together, which makes the
/// result a better starting point for the real routing run than the seed.
#[derive(Debug, Clone, Default)]
pub struct SabrePlacer {
    config: RouterConfig,
    seed: Option<Placement>,
    cancel: CancellationToken,
}

impl SabrePlacer {
    /// Create a re-placer seeded by [`GreedyPlacer`].
    pub fn new(config: RouterConfig) -> Self {
        Self {
            config,
            seed: None,
            cancel: CancellationToken::new(),
        }
    }

    /// Start from `placement` instead of a greedy placement.
    pub fn with_seed(mut self, placement: Placement) -> Self {
        self.seed = Some(placement);
        self
    }

    /// Check `cancel` once per scheduling round.
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }
}

impl Placer for SabrePlacer {
    fn name(&self) -> &'static str {
        "sabre"
    }

    fn place(&self, dag: &CircuitDag, device: &Device) -> MapResult<Placement> {
        let seed = match &self.seed {
            Some(placement) => placement.clone(),
            None => GreedyPlacer::new().place(dag, device)?,
        };
        let engine = SabreEngine::new(dag, device, &self.config);
        let forward = engine.simulate(seed, Direction::Outgoing, &self.cancel)?;
        let backward = engine.simulate(forward, Direction::Incoming, &self.cancel)?;
        debug!(mapped = backward.num_mapped(), "sabre re-placement");
        Ok(backward)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::router::{Router, SabreRouter};
    use qroute_ir::{Circuit, QubitId};

    fn ladder() -> Circuit {
        let mut c = Circuit::with_size("ladder", 5, 0);
        for _ in 0..3 {
            c.cx(QubitId(0), QubitId(4))
                .unwrap()
                .cx(QubitId(1), QubitId(3))
                .unwrap()
                .cx(QubitId(2), QubitId(4))
                .unwrap();
        }
        c
    }

    #[test]
    fn test_refined_placement_is_complete() {
        let c = ladder();
        let device = Device::path(5);
        let placement = SabrePlacer::default().place(c.dag(), &device).unwrap();
        assert!(placement.is_complete());
        assert!(placement.is_consistent());
    }

    #[test]
    fn test_refined_placement_is_deterministic_and_routable() {
        let c = ladder();
        let device = Device::ring(6);
        let seed = Placement::from_v_to_phy(&[0, 1, 2, 3, 4], 6).unwrap();
        let placer = SabrePlacer::default().with_seed(seed);
        let a = placer.place(c.dag(), &device).unwrap();
        let b = placer.place(c.dag(), &device).unwrap();
        assert_eq!(a, b);

        let result = SabreRouter::default()
            .route(c.dag(), &device, a, &CancellationToken::new())
            .unwrap();
        for (_, inst) in result.circuit.topological_ops() {
            assert!(device.are_connected(inst.qubits[0].0, inst.qubits[1].0));
        }
    }
}
