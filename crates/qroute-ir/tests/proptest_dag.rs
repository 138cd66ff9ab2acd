//! Property-based tests for the append-only circuit DAG.

use proptest::prelude::*;
use qroute_ir::{Circuit, QubitId};

/// Gate operations that can be applied to a circuit.
#[derive(Debug, Clone)]
enum GateOp {
    H(u32),
    T(u32),
    CX(u32, u32),
    CZ(u32, u32),
}

impl GateOp {
    fn apply(self, circuit: &mut Circuit) {
        match self {
            GateOp::H(q) => {
                let _ = circuit.h(QubitId(q));
            }
            GateOp::T(q) => {
                let _ = circuit.t(QubitId(q));
            }
            GateOp::CX(a, b) => {
                let _ = circuit.cx(QubitId(a), QubitId(b));
            }
            GateOp::CZ(a, b) => {
                let _ = circuit.cz(QubitId(a), QubitId(b));
            }
        }
    }
}

fn arb_gate_op(num_qubits: u32) -> impl Strategy<Value = GateOp> {
    let pair = (0..num_qubits, 1..num_qubits)
        .prop_map(move |(a, off)| (a, (a + off) % num_qubits));
    prop_oneof![
        (0..num_qubits).prop_map(GateOp::H),
        (0..num_qubits).prop_map(GateOp::T),
        pair.clone().prop_map(|(a, b)| GateOp::CX(a, b)),
        pair.prop_map(|(a, b)| GateOp::CZ(a, b)),
    ]
}

fn arb_circuit() -> impl Strategy<Value = Circuit> {
    (2_u32..=6).prop_flat_map(|num_qubits| {
        prop::collection::vec(arb_gate_op(num_qubits), 0..=30).prop_map(move |ops| {
            let mut circuit = Circuit::with_size("prop", num_qubits, 0);
            for op in ops {
                op.apply(&mut circuit);
            }
            circuit
        })
    })
}

proptest! {
    #[test]
    fn dag_integrity_holds(circuit in arb_circuit()) {
        prop_assert!(circuit.dag().verify_integrity().is_ok());
        prop_assert!(circuit.depth() <= circuit.dag().num_ops());
    }

    #[test]
    fn every_predecessor_comes_first(circuit in arb_circuit()) {
        let dag = circuit.dag();
        for (node, inst) in dag.topological_ops() {
            prop_assert_eq!(dag.num_wires(node), inst.num_qubits());
            for pred in dag.predecessors(node) {
                prop_assert!(dag.is_meta(pred) || pred.index() < node.index());
            }
        }
    }

    #[test]
    fn json_preserves_op_count(circuit in arb_circuit()) {
        let json = serde_json::to_string(&circuit).unwrap();
        let back: Circuit = serde_json::from_str(&json).unwrap();
        prop_assert_eq!(back.dag().num_ops(), circuit.dag().num_ops());
        prop_assert_eq!(back.depth(), circuit.depth());
    }
}
