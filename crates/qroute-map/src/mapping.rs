//! End-to-end mapping entry points.
//!
//! Each function pairs an initial placement strategy with a router:
//!
//! | Function | Placement | Routing |
//! |----------|-----------|---------|
//! | [`sabre_map`] | greedy, refined by forward/backward SABRE passes | SABRE |
//! | [`jit_map`] | none, qubits placed on first use | SABRE |
//! | [`bridge_map`] | none, qubits placed on first use | Bridge |
//! | [`sat_map`] | SAT | SABRE |
//! | [`astar_map`] | greedy | A* |
//!
//! [`map`] selects one of them from [`MapOptions`]. [`remap`] moves qubits
//! between two placements with token swapping.

use std::fmt;
use std::str::FromStr;

use qroute_ir::{CircuitDag, CircuitLevel, Instruction, QubitId};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};

use crate::cancel::CancellationToken;
use crate::device::Device;
use crate::error::{MapError, MapResult};
use crate::passes::decompose_bridges;
use crate::placement::Placement;
use crate::placer::{
    GreedyPlacer, Placer, SabrePlacer, SatPlacementMode, SatPlacer, empty_placement,
};
use crate::router::{
    AStarRouter, BridgeRouter, Router, RouterConfig, RoutingResult, SabreRouter,
};
use crate::synthesis::{
    AStarTokenSwap, SatTokenSwap, SwapObjective, TokenSwapProblem, TokenSwapper,
};
use crate::verify::verify_routing;

/// A placement and routing combination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MapMethod {
    /// Greedy placement refined by SABRE, then SABRE routing.
    #[default]
    Sabre,
    /// SABRE routing with lazy placement.
    Jit,
    /// Bridge routing with lazy placement.
    Bridge,
    /// SAT placement, then SABRE routing.
    Sat,
    /// Greedy placement, then A* routing.
    AStar,
}

impl MapMethod {
    /// All methods, in declaration order.
    pub const ALL: [MapMethod; 5] = [
        MapMethod::Sabre,
        MapMethod::Jit,
        MapMethod::Bridge,
        MapMethod::Sat,
        MapMethod::AStar,
    ];

    /// Lowercase identifier, as accepted by [`FromStr`].
    pub fn as_str(self) -> &'static str {
        match self {
            MapMethod::Sabre => "sabre",
            MapMethod::Jit => "jit",
            MapMethod::Bridge => "bridge",
            MapMethod::Sat => "sat",
            MapMethod::AStar => "astar",
        }
    }

    /// The placer this method runs before routing, if any.
    pub fn placer(
        self,
        config: &RouterConfig,
        sat_mode: SatPlacementMode,
        cancel: &CancellationToken,
    ) -> Option<Box<dyn Placer + Send + Sync>> {
        match self {
            MapMethod::Sabre => Some(Box::new(
                SabrePlacer::new(config.clone()).with_cancellation(cancel.clone()),
            )),
            MapMethod::Sat => Some(Box::new(
                SatPlacer::new(sat_mode).with_cancellation(cancel.clone()),
            )),
            MapMethod::AStar => Some(Box::new(GreedyPlacer::new())),
            MapMethod::Jit | MapMethod::Bridge => None,
        }
    }

    /// The router this method uses.
    pub fn router(self, config: &RouterConfig) -> Box<dyn Router + Send + Sync> {
        match self {
            MapMethod::Sabre | MapMethod::Jit | MapMethod::Sat => {
                Box::new(SabreRouter::new(config.clone()))
            }
            MapMethod::Bridge => Box::new(BridgeRouter::new()),
            MapMethod::AStar => {
                let router = AStarRouter::new();
                match config.max_swaps {
                    Some(limit) => Box::new(router.with_max_swaps(limit)),
                    None => Box::new(router),
                }
            }
        }
    }
}

impl fmt::Display for MapMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MapMethod {
    type Err = MapError;

    fn from_str(s: &str) -> MapResult<Self> {
        let lower = s.trim().to_ascii_lowercase();
        MapMethod::ALL
            .into_iter()
            .find(|m| m.as_str() == lower)
            .ok_or_else(|| {
                MapError::InvalidConfiguration(format!(
                    "unknown mapping method '{s}' (expected sabre, jit, bridge, sat or astar)"
                ))
            })
    }
}

/// Options for [`map`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MapOptions {
    /// Placement and routing combination.
    pub method: MapMethod,
    /// SABRE router tuning.
    pub router: RouterConfig,
    /// SAT placement strategy for [`MapMethod::Sat`].
    pub sat_mode: SatPlacementMode,
    /// Check the result against the input circuit.
    pub verify: bool,
    /// Replace Bridge gates with nearest-neighbour CX gates.
    pub decompose_bridges: bool,
}

/// Greedy placement refined by forward and backward SABRE passes, then
/// SABRE routing.
#[instrument(skip_all, fields(qubits = dag.num_qubits(), device = device.name()))]
pub fn sabre_map(
    dag: &CircuitDag,
    device: &Device,
    config: &RouterConfig,
    cancel: &CancellationToken,
) -> MapResult<RoutingResult> {
    config.validate()?;
    let placement = SabrePlacer::new(config.clone())
        .with_cancellation(cancel.clone())
        .place(dag, device)?;
    SabreRouter::new(config.clone()).route(dag, device, placement, cancel)
}

/// SABRE routing from an empty placement; qubits are placed when their
/// first gate is scheduled.
#[instrument(skip_all, fields(qubits = dag.num_qubits(), device = device.name()))]
pub fn jit_map(
    dag: &CircuitDag,
    device: &Device,
    config: &RouterConfig,
    cancel: &CancellationToken,
) -> MapResult<RoutingResult> {
    config.validate()?;
    let placement = empty_placement(dag, device)?;
    SabreRouter::new(config.clone()).route(dag, device, placement, cancel)
}

/// Bridge routing from an empty placement. Never inserts SWAPs.
#[instrument(skip_all, fields(qubits = dag.num_qubits(), device = device.name()))]
pub fn bridge_map(
    dag: &CircuitDag,
    device: &Device,
    cancel: &CancellationToken,
) -> MapResult<RoutingResult> {
    let placement = empty_placement(dag, device)?;
    BridgeRouter::new().route(dag, device, placement, cancel)
}

/// SAT placement, then SABRE routing.
///
/// When no placement satisfies every interaction exactly, incremental mode
/// retries with activation literals so the most frequent pairs still land
/// on device edges.
#[instrument(
    skip_all,
    fields(qubits = dag.num_qubits(), device = device.name(), mode = ?mode)
)]
pub fn sat_map(
    dag: &CircuitDag,
    device: &Device,
    mode: SatPlacementMode,
    config: &RouterConfig,
    cancel: &CancellationToken,
) -> MapResult<RoutingResult> {
    config.validate()?;
    let placement = match SatPlacer::new(mode)
        .with_cancellation(cancel.clone())
        .place(dag, device)
    {
        Err(MapError::NoSolutionFound(reason)) if mode == SatPlacementMode::Incremental => {
            warn!(%reason, "exact placement is unsatisfiable, retrying with activation literals");
            SatPlacer::new(SatPlacementMode::Activation)
                .with_cancellation(cancel.clone())
                .place(dag, device)?
        }
        other => other?,
    };
    SabreRouter::new(config.clone()).route(dag, device, placement, cancel)
}

/// Greedy placement, then A* routing.
#[instrument(skip_all, fields(qubits = dag.num_qubits(), device = device.name()))]
pub fn astar_map(
    dag: &CircuitDag,
    device: &Device,
    cancel: &CancellationToken,
) -> MapResult<RoutingResult> {
    let placement = GreedyPlacer::new().place(dag, device)?;
    AStarRouter::new().route(dag, device, placement, cancel)
}

/// Map `dag` onto `device` as `options` describe.
#[instrument(skip_all, fields(method = %options.method))]
pub fn map(
    dag: &CircuitDag,
    device: &Device,
    options: &MapOptions,
    cancel: &CancellationToken,
) -> MapResult<RoutingResult> {
    options.router.validate()?;
    let mut result = match options.method {
        MapMethod::Sabre => sabre_map(dag, device, &options.router, cancel)?,
        MapMethod::Jit => jit_map(dag, device, &options.router, cancel)?,
        MapMethod::Bridge => bridge_map(dag, device, cancel)?,
        MapMethod::Sat => sat_map(dag, device, options.sat_mode, &options.router, cancel)?,
        MapMethod::AStar => {
            let placement = GreedyPlacer::new().place(dag, device)?;
            options
                .method
                .router(&options.router)
                .route(dag, device, placement, cancel)?
        }
    };

    if options.decompose_bridges {
        result.circuit = decompose_bridges(&result.circuit, device)?;
    }
    if options.verify {
        verify_routing(dag, &result, device)?;
    }

    info!(
        swaps = result.num_swaps(),
        ops = result.circuit.num_ops(),
        depth = result.circuit.depth(),
        "mapping finished"
    );
    Ok(result)
}

/// Token-swapping algorithm for [`remap`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SwapMethod {
    /// A* search with an admissible heuristic.
    #[default]
    AStar,
    /// SAT search minimizing the given objective.
    Sat(SwapObjective),
}

impl SwapMethod {
    /// The solver behind this method.
    pub fn solver(self) -> Box<dyn TokenSwapper> {
        match self {
            SwapMethod::AStar => Box::new(AStarTokenSwap::new()),
            SwapMethod::Sat(objective) => Box::new(SatTokenSwap::new(objective)),
        }
    }
}

/// A physical circuit of SWAPs that moves every virtual qubit from its
/// position in `from` to its position in `to`.
#[instrument(skip_all, fields(device = device.name(), method = ?method))]
pub fn remap(
    device: &Device,
    from: &Placement,
    to: &Placement,
    method: SwapMethod,
    cancel: &CancellationToken,
) -> MapResult<CircuitDag> {
    let problem = TokenSwapProblem::from_placements(device, from, to)?;
    let solver = method.solver();
    let swaps = solver.solve(device, &problem, cancel)?;

    let mut circuit = CircuitDag::with_size(device.num_qubits(), 0);
    circuit.set_level(CircuitLevel::Physical);
    for &(a, b) in &swaps {
        circuit.apply(Instruction::swap(QubitId(a), QubitId(b)))?;
    }
    info!(solver = solver.name(), swaps = swaps.len(), "remap finished");
    Ok(circuit)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::verify::check_connectivity;
    use qroute_ir::Circuit;

    fn spread_cx() -> Circuit {
        let mut c = Circuit::with_size("spread", 5, 0);
        c.h(QubitId(0)).unwrap();
        for (a, b) in [(0, 4), (1, 3), (2, 4), (0, 2), (3, 1)] {
            c.cx(QubitId(a), QubitId(b)).unwrap();
        }
        c
    }

    #[test]
    fn test_method_round_trips_through_strings() {
        for method in MapMethod::ALL {
            assert_eq!(method.to_string().parse::<MapMethod>().unwrap(), method);
        }
        assert_eq!("SABRE".parse::<MapMethod>().unwrap(), MapMethod::Sabre);
        assert!("qmap".parse::<MapMethod>().is_err());
    }

    #[test]
    fn test_options_from_json() {
        let options: MapOptions =
            serde_json::from_str(r#"{"method": "astar", "verify": true}"#).unwrap();
        assert_eq!(options.method, MapMethod::AStar);
        assert!(options.verify);
        assert_eq!(options.router, RouterConfig::default());
    }

    #[test]
    fn test_every_method_maps_and_verifies() {
        let circuit = spread_cx();
        let device = Device::path(5);
        let cancel = CancellationToken::new();
        for method in MapMethod::ALL {
            let options = MapOptions {
                method,
                verify: true,
                decompose_bridges: true,
                ..MapOptions::default()
            };
            let result = map(circuit.dag(), &device, &options, &cancel)
                .unwrap_or_else(|e| panic!("{method}: {e}"));
            check_connectivity(&result.circuit, &device).unwrap();
            assert!(
                result
                    .circuit
                    .topological_ops()
                    .all(|(_, inst)| !inst.is_bridge()),
                "{method} left a bridge"
            );
        }
    }

    #[test]
    fn test_bridge_map_inserts_no_swaps() {
        let circuit = spread_cx();
        let result =
            bridge_map(circuit.dag(), &Device::path(5), &CancellationToken::new()).unwrap();
        assert_eq!(result.num_swaps(), 0);
        assert_eq!(result.init_placement, result.final_placement);
    }

    #[test]
    fn test_map_rejects_invalid_config() {
        let options = MapOptions {
            router: RouterConfig {
                num_rounds_decay_reset: 0,
                ..RouterConfig::default()
            },
            ..MapOptions::default()
        };
        let result = map(
            spread_cx().dag(),
            &Device::path(5),
            &options,
            &CancellationToken::new(),
        );
        assert!(matches!(result, Err(MapError::InvalidConfiguration(_))));
    }

    #[test]
    fn test_cancelled_before_start() {
        let cancel = CancellationToken::new();
        cancel.cancel();
        let result = jit_map(
            spread_cx().dag(),
            &Device::path(5),
            &RouterConfig::default(),
            &cancel,
        );
        assert!(matches!(result, Err(MapError::Cancelled)));
    }

    #[test]
    fn test_sat_map_relaxes_unsatisfiable_placement() {
        // A triangle of interactions cannot be embedded in a path.
        let mut c = Circuit::with_size("triangle", 3, 0);
        c.cx(QubitId(0), QubitId(1)).unwrap();
        c.cx(QubitId(1), QubitId(2)).unwrap();
        c.cx(QubitId(0), QubitId(2)).unwrap();
        let device = Device::path(3);

        let result = sat_map(
            c.dag(),
            &device,
            SatPlacementMode::Incremental,
            &RouterConfig::default(),
            &CancellationToken::new(),
        )
        .unwrap();
        assert_eq!(result.num_swaps(), 1);
        verify_routing(c.dag(), &result, &device).unwrap();
    }

    #[test]
    fn test_remap_reverses_a_path() {
        let device = Device::path(4);
        let from = Placement::identity(4);
        let to = Placement::from_v_to_phy(&[3, 2, 1, 0], 4).unwrap();
        let cancel = CancellationToken::new();

        for method in [
            SwapMethod::AStar,
            SwapMethod::Sat(SwapObjective::SwapCount),
        ] {
            let circuit = remap(&device, &from, &to, method, &cancel).unwrap();
            assert_eq!(circuit.num_ops(), 6);
            check_connectivity(&circuit, &device).unwrap();

            let mut tokens: Vec<u32> = (0..4).collect();
            let swaps: Vec<(u32, u32)> = circuit
                .topological_ops()
                .map(|(_, inst)| (inst.qubits[0].0, inst.qubits[1].0))
                .collect();
            crate::synthesis::apply_swaps(&mut tokens, &swaps);
            assert_eq!(tokens, vec![3, 2, 1, 0]);
        }
    }

    #[test]
    fn test_remap_leaves_free_qubits_anywhere() {
        let device = Device::star(4);
        let from = Placement::from_v_to_phy(&[1], 4).unwrap();
        let to = Placement::from_v_to_phy(&[2], 4).unwrap();
        let cancel = CancellationToken::new();

        for method in [
            SwapMethod::AStar,
            SwapMethod::Sat(SwapObjective::SwapCount),
        ] {
            let circuit = remap(&device, &from, &to, method, &cancel).unwrap();
            assert_eq!(circuit.num_ops(), 2);

            let mut placement = from.clone();
            for (_, inst) in circuit.topological_ops() {
                placement
                    .swap_qubits(inst.qubits[0].0, inst.qubits[1].0)
                    .unwrap();
            }
            assert_eq!(placement.v_to_phy(QubitId(0)), Some(2));
        }
    }

    #[test]
    fn test_remap_same_placement_is_empty() {
        let device = Device::ring(5);
        let placement = Placement::from_v_to_phy(&[4, 0, 2], 5).unwrap();
        let circuit = remap(
            &device,
            &placement,
            &placement,
            SwapMethod::default(),
            &CancellationToken::new(),
        )
        .unwrap();
        assert_eq!(circuit.num_ops(), 0);
    }
}
