//! Property-based tests for devices, placements and routers.

use proptest::prelude::*;
use qroute_ir::{Circuit, QubitId};
use qroute_map::verify::{check_connectivity, check_pathsum};
use qroute_map::{
    AStarRouter, BridgeRouter, CancellationToken, Device, GreedyPlacer, Placement, Placer,
    Router, RouterConfig, SabreRouter, jit_map, sabre_map,
};

/// A connected random device with 3 to 8 qubits.
fn arb_device() -> impl Strategy<Value = Device> {
    (3_u32..=8).prop_flat_map(|n| {
        let max_edges = (n * (n - 1) / 2) as usize;
        ((n as usize - 1)..=max_edges, any::<u64>())
            .prop_map(move |(edges, seed)| Device::random(n, edges, seed))
    })
}

/// Two-qubit gates as `(control, target)` pairs over `num_qubits` qubits.
fn arb_pairs(num_qubits: u32) -> impl Strategy<Value = Vec<(u32, u32)>> {
    let pair = (0..num_qubits, 1..num_qubits)
        .prop_map(move |(a, off)| (a, (a + off) % num_qubits));
    prop::collection::vec(pair, 0..=15)
}

/// A device and a circuit that fits on it, mixing H and CX gates.
fn arb_routing_case() -> impl Strategy<Value = (Device, Circuit)> {
    arb_device().prop_flat_map(|device| {
        let n = device.num_qubits();
        (2_u32..=n).prop_flat_map(move |num_v| {
            let device = device.clone();
            (arb_pairs(num_v), prop::collection::vec(0..num_v, 0..=5)).prop_map(
                move |(pairs, singles)| {
                    let mut circuit = Circuit::with_size("prop", num_v, 0);
                    for (i, &(c, t)) in pairs.iter().enumerate() {
                        if let Some(&q) = singles.get(i) {
                            circuit.h(QubitId(q)).unwrap();
                        }
                        circuit.cx(QubitId(c), QubitId(t)).unwrap();
                    }
                    (device.clone(), circuit)
                },
            )
        })
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn distances_are_a_metric(device in arb_device()) {
        let n = device.num_qubits();
        prop_assert!(device.is_connected());
        for u in 0..n {
            prop_assert_eq!(device.distance(u, u).unwrap(), 0);
            for v in 0..n {
                let duv = device.distance(u, v).unwrap();
                prop_assert_eq!(duv, device.distance(v, u).unwrap());
                prop_assert_eq!(duv == 1, device.are_connected(u, v));
                prop_assert_eq!(device.shortest_path(u, v).unwrap().len(), duv as usize + 1);
                for w in 0..n {
                    prop_assert!(
                        device.distance(u, w).unwrap() <= duv + device.distance(v, w).unwrap()
                    );
                }
            }
        }
    }

    #[test]
    fn placement_stays_a_bijection(
        v_to_phy in Just((0..6_u32).collect::<Vec<_>>()).prop_shuffle(),
        swaps in prop::collection::vec((0..8_u32, 0..8_u32), 0..20),
    ) {
        let num_v = 4usize;
        let mut placement = Placement::from_v_to_phy(&v_to_phy[..num_v], 8).unwrap();
        prop_assert!(placement.is_consistent());
        for (a, b) in swaps {
            placement.swap_qubits(a, b).unwrap();
            prop_assert!(placement.is_consistent());
            prop_assert_eq!(placement.num_mapped(), num_v);
            for v in 0..num_v as u32 {
                let phy = placement.v_to_phy(QubitId(v)).unwrap();
                prop_assert_eq!(placement.phy_to_v(phy), Some(QubitId(v)));
            }
        }
    }

    #[test]
    fn jit_routing_is_connected_and_equivalent((device, circuit) in arb_routing_case()) {
        let result = jit_map(
            circuit.dag(),
            &device,
            &RouterConfig::default(),
            &CancellationToken::new(),
        )
        .unwrap();
        prop_assert!(check_connectivity(&result.circuit, &device).is_ok());
        prop_assert!(check_pathsum(
            circuit.dag(),
            &result.circuit,
            &result.init_placement,
            &result.final_placement,
        )
        .is_ok());
    }

    #[test]
    fn sabre_routing_is_connected_and_equivalent((device, circuit) in arb_routing_case()) {
        let result = sabre_map(
            circuit.dag(),
            &device,
            &RouterConfig::default(),
            &CancellationToken::new(),
        )
        .unwrap();
        prop_assert!(check_connectivity(&result.circuit, &device).is_ok());
        prop_assert!(check_pathsum(
            circuit.dag(),
            &result.circuit,
            &result.init_placement,
            &result.final_placement,
        )
        .is_ok());
    }

    #[test]
    fn astar_routing_is_connected_and_equivalent((device, circuit) in arb_routing_case()) {
        let placement = GreedyPlacer::new().place(circuit.dag(), &device).unwrap();
        let result = AStarRouter::new()
            .route(circuit.dag(), &device, placement, &CancellationToken::new())
            .unwrap();
        prop_assert!(check_connectivity(&result.circuit, &device).is_ok());
        prop_assert!(check_pathsum(
            circuit.dag(),
            &result.circuit,
            &result.init_placement,
            &result.final_placement,
        )
        .is_ok());
    }

    #[test]
    fn bridge_routing_never_moves_qubits((device, circuit) in arb_routing_case()) {
        let placement = Placement::new(
            circuit.num_qubits() as u32,
            device.num_qubits(),
        );
        let result = BridgeRouter::new()
            .route(circuit.dag(), &device, placement, &CancellationToken::new())
            .unwrap();
        prop_assert_eq!(result.num_swaps(), 0);
        prop_assert_eq!(&result.init_placement, &result.final_placement);
        prop_assert!(check_pathsum(
            circuit.dag(),
            &result.circuit,
            &result.init_placement,
            &result.final_placement,
        )
        .is_ok());
    }

    #[test]
    fn single_qubit_circuits_need_no_swaps(
        device in arb_device(),
        gates in prop::collection::vec(0_u32..3, 0..20),
    ) {
        let mut circuit = Circuit::with_size("singles", 3, 0);
        for q in gates {
            circuit.t(QubitId(q)).unwrap();
        }
        let result = SabreRouter::default()
            .route(
                circuit.dag(),
                &device,
                Placement::new(3, device.num_qubits()),
                &CancellationToken::new(),
            )
            .unwrap();
        prop_assert_eq!(result.num_swaps(), 0);
    }
}
