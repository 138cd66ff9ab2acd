//! Routers: emit a device-compliant circuit, inserting SWAP or Bridge
//! operations where a two-qubit gate acts on non-adjacent qubits.

mod astar;
mod bridge;
mod sabre;
mod state;

pub use astar::AStarRouter;
pub use bridge::BridgeRouter;
pub use sabre::SabreRouter;
pub(crate) use sabre::SabreEngine;
pub(crate) use state::MapState;

use qroute_ir::CircuitDag;
use serde::{Deserialize, Serialize};

use crate::cancel::CancellationToken;
use crate::device::Device;
use crate::error::{MapError, MapResult};
use crate::placement::Placement;

/// Tuning knobs of the SABRE-style router.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RouterConfig {
    /// Maximum number of two-qubit gates in the look-ahead layer.
    pub e_set_size: usize,
    /// Weight of the look-ahead cost relative to the front-layer cost.
    pub e_score_weight: f64,
    /// Decay increment for qubits involved in a SWAP.
    pub decay_delta: f64,
    /// Reset all decay factors every this many SWAP searches.
    pub num_rounds_decay_reset: u32,
    /// Start from a random placement when none is supplied.
    pub randomize_initial_map: bool,
    /// Include the look-ahead layer in the SWAP cost.
    pub use_look_ahead: bool,
    /// Seed for randomized choices.
    pub seed: Option<u64>,
    /// Explicit cap on inserted SWAPs; derived from the circuit when unset.
    pub max_swaps: Option<usize>,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            e_set_size: 200,
            e_score_weight: 0.8,
            decay_delta: 0.001,
            num_rounds_decay_reset: 5,
            randomize_initial_map: false,
            use_look_ahead: true,
            seed: None,
            max_swaps: None,
        }
    }
}

impl RouterConfig {
    /// Reject parameter combinations the router cannot work with.
    pub fn validate(&self) -> MapResult<()> {
        if self.num_rounds_decay_reset == 0 {
            return Err(MapError::InvalidConfiguration(
                "num_rounds_decay_reset must be at least 1".into(),
            ));
        }
        if !self.e_score_weight.is_finite() || self.e_score_weight < 0.0 {
            return Err(MapError::InvalidConfiguration(format!(
                "e_score_weight must be a non-negative number, got {}",
                self.e_score_weight
            )));
        }
        if !self.decay_delta.is_finite() || self.decay_delta < 0.0 {
            return Err(MapError::InvalidConfiguration(format!(
                "decay_delta must be a non-negative number, got {}",
                self.decay_delta
            )));
        }
        Ok(())
    }

    /// SWAP budget for routing `dag` on `device`.
    pub fn swap_limit(&self, dag: &CircuitDag, device: &Device) -> usize {
        self.max_swaps
            .unwrap_or_else(|| default_swap_limit(dag, device))
    }
}

/// `16 + 4 * diameter * two-qubit gates`, each factor at least one.
pub fn default_swap_limit(dag: &CircuitDag, device: &Device) -> usize {
    let diameter = device.diameter().unwrap_or(device.num_qubits()).max(1) as usize;
    let gates = dag.num_two_qubit_gates().max(1);
    16 + 4 * diameter * gates
}

/// Output of a routing run.
#[derive(Debug, Clone)]
pub struct RoutingResult {
    /// The routed circuit over physical qubits.
    pub circuit: CircuitDag,
    /// Where each virtual qubit starts.
    pub init_placement: Placement,
    /// Where each virtual qubit ends.
    pub final_placement: Placement,
    /// SWAPs inserted, in circuit order.
    pub swaps: Vec<(u32, u32)>,
}

impl RoutingResult {
    /// Number of SWAPs inserted.
    pub fn num_swaps(&self) -> usize {
        self.swaps.len()
    }
}

/// A routing strategy.
pub trait Router {
    /// Short identifier used in logs.
    fn name(&self) -> &'static str;

    /// Route `dag` onto `device`.
    ///
    /// `placement` may be complete, partial or empty; unmapped virtual
    /// qubits are placed on demand.
    fn route(
        &self,
        dag: &CircuitDag,
        device: &Device,
        placement: Placement,
        cancel: &CancellationToken,
    ) -> MapResult<RoutingResult>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use qroute_ir::{Circuit, QubitId};

    #[test]
    fn test_default_config() {
        let config = RouterConfig::default();
        assert_eq!(config.e_set_size, 200);
        assert!((config.e_score_weight - 0.8).abs() < f64::EPSILON);
        assert_eq!(config.num_rounds_decay_reset, 5);
        assert!(config.use_look_ahead);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_zero_reset() {
        let config = RouterConfig {
            num_rounds_decay_reset: 0,
            ..RouterConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(MapError::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn test_swap_limit() {
        let mut c = Circuit::with_size("c", 3, 0);
        c.cx(QubitId(0), QubitId(2)).unwrap();
        let device = Device::path(3);
        assert_eq!(default_swap_limit(c.dag(), &device), 16 + 4 * 2);

        let capped = RouterConfig {
            max_swaps: Some(3),
            ..RouterConfig::default()
        };
        assert_eq!(capped.swap_limit(c.dag(), &device), 3);
    }

    #[test]
    fn test_partial_yaml_like_json_uses_defaults() {
        let config: RouterConfig = serde_json::from_str(r#"{"e_set_size": 20}"#).unwrap();
        assert_eq!(config.e_set_size, 20);
        assert_eq!(config.num_rounds_decay_reset, 5);
    }
}
