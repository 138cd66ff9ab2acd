//! SABRE-style SWAP routing with just-in-time placement.

use qroute_ir::{CircuitDag, Direction, NodeIndex, QubitId};
use tracing::{debug, info, instrument, trace};

use super::state::MapState;
use super::{Router, RouterConfig, RoutingResult};
use crate::cancel::CancellationToken;
use crate::device::Device;
use crate::error::{MapError, MapResult};
use crate::layers::DependencyTracker;
use crate::placement::Placement;
use crate::placer::{Placer, RandomPlacer};

/// The front-layer scheduler shared by [`SabreRouter`] and the SABRE
/// re-placer.
pub(crate) struct SabreEngine<'a> {
    dag: &'a CircuitDag,
    device: &'a Device,
    config: &'a RouterConfig,
}

impl<'a> SabreEngine<'a> {
    pub fn new(dag: &'a CircuitDag, device: &'a Device, config: &'a RouterConfig) -> Self {
        Self {
            dag,
            device,
            config,
        }
    }

    /// Route forwards and emit the physical circuit.
    pub fn route(
        &self,
        placement: Placement,
        cancel: &CancellationToken,
    ) -> MapResult<RoutingResult> {
        let mut state = self.run(placement, Direction::Outgoing, true, cancel)?;
        state.finish()?;
        let (circuit, init_placement, final_placement, swaps) = state.into_parts()?;
        Ok(RoutingResult {
            circuit: circuit.ok_or(MapError::MissingPlacement)?,
            init_placement,
            final_placement,
            swaps,
        })
    }

    /// Walk the circuit in `direction` without emitting anything and return
    /// the placement reached at the end.
    pub fn simulate(
        &self,
        placement: Placement,
        direction: Direction,
        cancel: &CancellationToken,
    ) -> MapResult<Placement> {
        let mut state = self.run(placement, direction, false, cancel)?;
        state.finish()?;
        Ok(state.placement().clone())
    }

    fn run(
        &self,
        placement: Placement,
        direction: Direction,
        emit: bool,
        cancel: &CancellationToken,
    ) -> MapResult<MapState<'a>> {
        self.config.validate()?;
        let mut state = MapState::new(self.dag, self.device, placement, emit)?;
        let mut tracker = DependencyTracker::new(self.dag, direction);
        let mut front = tracker.initial_front();

        let num_phy = self.device.num_qubits() as usize;
        let mut decay = vec![1.0_f64; num_phy];
        let mut involved = vec![false; num_phy];
        let limit = self.config.swap_limit(self.dag, self.device);
        let mut num_searches = 0u32;

        while !front.is_empty() {
            cancel.check()?;

            let mut executed = false;
            let mut blocked = Vec::with_capacity(front.len());
            let mut ready = Vec::new();
            for node in front.drain(..) {
                let Some(inst) = self.dag.get_instruction(node) else {
                    continue;
                };
                if state.try_add(inst)? {
                    executed = true;
                    tracker.release_into(node, &mut ready);
                } else {
                    for &v in &inst.qubits {
                        if let Some(phy) = state.placement().v_to_phy(v) {
                            involved[phy as usize] = true;
                        }
                    }
                    blocked.push(node);
                }
            }
            front = blocked;
            front.append(&mut ready);
            if executed {
                continue;
            }

            if state.num_swaps() >= limit {
                return Err(MapError::RoutingDidNotConverge {
                    swaps: state.num_swaps(),
                    limit,
                });
            }

            num_searches += 1;
            let (phy0, phy1) = self.find_swap(&state, &mut tracker, &front, &involved, &decay)?;
            if num_searches % self.config.num_rounds_decay_reset == 0 {
                debug!(num_searches, "resetting decay");
                decay.fill(1.0);
            } else {
                decay[phy0 as usize] += self.config.decay_delta;
                decay[phy1 as usize] += self.config.decay_delta;
            }
            state.add_swap(phy0, phy1)?;
            involved.fill(false);
        }

        Ok(state)
    }

    fn find_swap(
        &self,
        state: &MapState<'_>,
        tracker: &mut DependencyTracker<'_>,
        front: &[NodeIndex],
        involved: &[bool],
        decay: &[f64],
    ) -> MapResult<(u32, u32)> {
        let extended = if self.config.use_look_ahead {
            tracker.extended_layer(front, self.config.e_set_size)
        } else {
            Vec::new()
        };

        let placement = state.placement();
        let mut v_to_phy = placement.v_to_phy_slice().to_vec();
        let mut best: Option<(f64, (u32, u32))> = None;

        for &(phy0, phy1) in self.device.edges() {
            if !involved[phy0 as usize] && !involved[phy1 as usize] {
                continue;
            }
            let (v0, v1) = (placement.phy_to_v(phy0), placement.phy_to_v(phy1));
            relocate(&mut v_to_phy, (v0, phy1), (v1, phy0));

            let front_cost = self.layer_cost(&v_to_phy, front, true)?;
            let max_decay = decay[phy0 as usize].max(decay[phy1 as usize]);
            let score = if extended.is_empty() {
                max_decay * front_cost
            } else {
                let ext_cost = self.layer_cost(&v_to_phy, &extended, false)?;
                max_decay
                    * (front_cost / front.len() as f64
                        + self.config.e_score_weight * ext_cost / extended.len() as f64)
            };
            trace!(phy0, phy1, score, "swap candidate");

            relocate(&mut v_to_phy, (v0, phy0), (v1, phy1));
            if best.is_none_or(|(s, _)| score < s) {
                best = Some((score, (phy0, phy1)));
            }
        }

        best.map(|(_, swap)| swap).ok_or_else(|| {
            MapError::NoSolutionFound("no device edge touches a blocked gate".into())
        })
    }

    /// Sum of excess distances of the two-qubit gates in `nodes` under
    /// `v_to_phy`. Gates with an unplaced qubit are skipped unless `strict`.
    fn layer_cost(
        &self,
        v_to_phy: &[Option<u32>],
        nodes: &[NodeIndex],
        strict: bool,
    ) -> MapResult<f64> {
        let mut cost = 0u64;
        for &node in nodes {
            let Some(inst) = self.dag.get_instruction(node) else {
                continue;
            };
            if !inst.is_two_qubit_gate() {
                continue;
            }
            let p0 = v_to_phy[inst.qubits[0].index()];
            let p1 = v_to_phy[inst.qubits[1].index()];
            match (p0, p1) {
                (Some(p0), Some(p1)) if strict => {
                    cost += u64::from(self.device.distance(p0, p1)?.saturating_sub(1));
                }
                (Some(p0), Some(p1)) => {
                    if let Some(d) = self.device.try_distance(p0, p1) {
                        cost += u64::from(d.saturating_sub(1));
                    }
                }
                _ if strict => return Err(MapError::MissingPlacement),
                _ => {}
            }
        }
        Ok(cost as f64)
    }
}

/// Put `v0` on `to0` and `v1` on `to1`, skipping absent qubits.
fn relocate(
    v_to_phy: &mut [Option<u32>],
    (v0, to0): (Option<QubitId>, u32),
    (v1, to1): (Option<QubitId>, u32),
) {
    if let Some(v) = v0 {
        v_to_phy[v.index()] = Some(to0);
    }
    if let Some(v) = v1 {
        v_to_phy[v.index()] = Some(to1);
    }
}

/// The SABRE router.
///
/// Blocked two-qubit gates are resolved by inserting the SWAP that
/// minimizes the distance of the front layer plus a weighted look-ahead
/// term, scaled by a per-qubit decay that discourages SWAPs in series.
#[derive(Debug, Clone, Default)]
pub struct SabreRouter {
    config: RouterConfig,
}

impl SabreRouter {
    /// Create a router with the given configuration.
    pub fn new(config: RouterConfig) -> Self {
        Self { config }
    }

    /// The router's configuration.
    pub fn config(&self) -> &RouterConfig {
        &self.config
    }
}

impl Router for SabreRouter {
    fn name(&self) -> &'static str {
        "sabre"
    }

    #[instrument(skip_all, fields(qubits = dag.num_qubits(), ops = dag.num_ops()))]
    fn route(
        &self,
        dag: &CircuitDag,
        device: &Device,
        placement: Placement,
        cancel: &CancellationToken,
    ) -> MapResult<RoutingResult> {
        let placement = if self.config.randomize_initial_map && placement.num_mapped() == 0 {
            RandomPlacer::new(self.config.seed).place(dag, device)?
        } else {
            placement
        };

        let result = SabreEngine::new(dag, device, &self.config).route(placement, cancel)?;
        info!(
            swaps = result.num_swaps(),
            depth = result.circuit.depth(),
            "sabre routing finished"
        );
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use qroute_ir::{Circuit, QubitId};

    fn assert_connected(result: &RoutingResult, device: &Device) {
        for (_, inst) in result.circuit.topological_ops() {
            if inst.is_two_qubit_gate() {
                assert!(
                    device.are_connected(inst.qubits[0].0, inst.qubits[1].0),
                    "{} on {:?}",
                    inst.name(),
                    inst.qubits
                );
            }
        }
    }

    #[test]
    fn test_ring_needs_one_swap() {
        let mut c = Circuit::with_size("c", 4, 0);
        c.cx(QubitId(0), QubitId(2)).unwrap();
        let device = Device::ring(4);

        let result = SabreRouter::default()
            .route(c.dag(), &device, Placement::identity(4), &CancellationToken::new())
            .unwrap();

        assert_eq!(result.num_swaps(), 1);
        assert_eq!(result.init_placement, Placement::identity(4));
        assert_eq!(result.circuit.num_ops(), 2);
        assert_connected(&result, &device);
    }

    #[test]
    fn test_single_qubit_circuit_needs_no_swaps() {
        let mut c = Circuit::with_size("c", 5, 0);
        for q in 0..5 {
            c.h(QubitId(q)).unwrap().t(QubitId(q)).unwrap();
        }
        let device = Device::path(5);
        let result = SabreRouter::default()
            .route(c.dag(), &device, Placement::new(5, 5), &CancellationToken::new())
            .unwrap();
        assert_eq!(result.num_swaps(), 0);
        assert_eq!(result.circuit.num_ops(), 10);
        assert!(result.final_placement.is_complete());
    }

    #[test]
    fn test_jit_placement_routes_all_pairs() {
        let mut c = Circuit::with_size("c", 4, 0);
        for a in 0..4 {
            for b in 0..4 {
                if a != b {
                    c.cx(QubitId(a), QubitId(b)).unwrap();
                }
            }
        }
        let device = Device::path(4);
        let result = SabreRouter::default()
            .route(c.dag(), &device, Placement::new(4, 4), &CancellationToken::new())
            .unwrap();
        assert!(result.num_swaps() > 0);
        assert_eq!(result.circuit.num_ops(), 12 + result.num_swaps());
        assert_connected(&result, &device);

        // Undoing the SWAPs of the final placement gives the initial one.
        let mut replay = result.init_placement.clone();
        for &(a, b) in &result.swaps {
            replay.swap_qubits(a, b).unwrap();
        }
        assert_eq!(replay, result.final_placement);
    }

    #[test]
    fn test_without_look_ahead() {
        let mut c = Circuit::with_size("c", 3, 0);
        c.cx(QubitId(0), QubitId(2))
            .unwrap()
            .cx(QubitId(1), QubitId(2))
            .unwrap();
        let device = Device::path(3);
        let router = SabreRouter::new(RouterConfig {
            use_look_ahead: false,
            ..RouterConfig::default()
        });
        let result = router
            .route(c.dag(), &device, Placement::identity(3), &CancellationToken::new())
            .unwrap();
        assert!(result.num_swaps() >= 1);
        assert_connected(&result, &device);
    }

    #[test]
    fn test_swap_cap() {
        let mut c = Circuit::with_size("c", 3, 0);
        c.cx(QubitId(0), QubitId(2)).unwrap();
        let device = Device::path(3);
        let router = SabreRouter::new(RouterConfig {
            max_swaps: Some(0),
            ..RouterConfig::default()
        });
        assert!(matches!(
            router.route(c.dag(), &device, Placement::identity(3), &CancellationToken::new()),
            Err(MapError::RoutingDidNotConverge { limit: 0, .. })
        ));
    }

    #[test]
    fn test_cancelled_before_start() {
        let c = Circuit::bell().unwrap();
        let device = Device::path(2);
        let cancel = CancellationToken::new();
        cancel.cancel();
        assert!(matches!(
            SabreRouter::default().route(c.dag(), &device, Placement::new(2, 2), &cancel),
            Err(MapError::Cancelled)
        ));
    }

    #[test]
    fn test_randomized_initial_map_is_seeded() {
        let c = Circuit::ghz(4).unwrap();
        let device = Device::ring(6);
        let router = SabreRouter::new(RouterConfig {
            randomize_initial_map: true,
            seed: Some(3),
            ..RouterConfig::default()
        });
        let cancel = CancellationToken::new();
        let a = router.route(c.dag(), &device, Placement::new(4, 6), &cancel).unwrap();
        let b = router.route(c.dag(), &device, Placement::new(4, 6), &cancel).unwrap();
        assert_eq!(a.init_placement, b.init_placement);
        assert_eq!(a.swaps, b.swaps);
        assert_connected(&a, &device);
    }

    #[test]
    fn test_simulate_backwards_keeps_placement_complete() {
        let mut c = Circuit::with_size("c", 3, 0);
        c.cx(QubitId(0), QubitId(2))
            .unwrap()
            .cx(QubitId(0), QubitId(1))
            .unwrap();
        let device = Device::path(3);
        let config = RouterConfig::default();
        let engine = SabreEngine::new(c.dag(), &device, &config);
        let placement = engine
            .simulate(Placement::identity(3), Direction::Incoming, &CancellationToken::new())
            .unwrap();
        assert!(placement.is_complete());
        assert!(placement.is_consistent());
    }
}
