//! High-level circuit builder API.

use serde::{Deserialize, Serialize};

use crate::dag::{CircuitDag, CircuitLevel};
use crate::error::{IrError, IrResult};
use crate::gate::{Gate, StandardGate};
use crate::instruction::Instruction;
use crate::qubit::{ClbitId, QubitId};

/// A quantum circuit.
///
/// This provides a high-level API for building quantum circuits,
/// with convenient methods for common gates and operations.
///
/// Circuits serialize as a flat instruction list:
///
/// ```json
/// { "name": "bell", "num_qubits": 2, "num_clbits": 0,
///   "instructions": [ { "kind": { "Gate": { "kind": { "Standard": "H" } } }, "qubits": [0] } ] }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "CircuitRepr", into = "CircuitRepr")]
pub struct Circuit {
    name: String,
    dag: CircuitDag,
}

#[derive(Serialize, Deserialize)]
struct CircuitRepr {
    #[serde(default = "default_name")]
    name: String,
    num_qubits: u32,
    #[serde(default)]
    num_clbits: u32,
    #[serde(default)]
    level: CircuitLevel,
    #[serde(default)]
    instructions: Vec<Instruction>,
}

fn default_name() -> String {
    "circuit".into()
}

impl TryFrom<CircuitRepr> for Circuit {
    type Error = IrError;

    fn try_from(repr: CircuitRepr) -> IrResult<Self> {
        let mut circuit = Circuit::with_size(repr.name, repr.num_qubits, repr.num_clbits);
        circuit.dag.set_level(repr.level);
        for inst in repr.instructions {
            circuit.dag.apply(inst)?;
        }
        Ok(circuit)
    }
}

impl From<Circuit> for CircuitRepr {
    #[allow(clippy::cast_possible_truncation)]
    fn from(circuit: Circuit) -> Self {
        CircuitRepr {
            num_qubits: circuit.dag.num_qubits() as u32,
            num_clbits: circuit.dag.num_clbits() as u32,
            level: circuit.dag.level(),
            instructions: circuit
                .dag
                .topological_ops()
                .map(|(_, inst)| inst.clone())
                .collect(),
            name: circuit.name,
        }
    }
}

impl Circuit {
    /// Create a new empty circuit.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            dag: CircuitDag::new(),
        }
    }

    /// Create a circuit with a given number of qubits and classical bits.
    pub fn with_size(name: impl Into<String>, num_qubits: u32, num_clbits: u32) -> Self {
        Self {
            name: name.into(),
            dag: CircuitDag::with_size(num_qubits, num_clbits),
        }
    }

    /// Add a single qubit to the circuit.
    pub fn add_qubit(&mut self) -> QubitId {
        self.dag.add_qubit()
    }

    /// Add a single classical bit to the circuit.
    pub fn add_clbit(&mut self) -> ClbitId {
        self.dag.add_clbit()
    }

    fn one(&mut self, gate: StandardGate, qubit: QubitId) -> IrResult<&mut Self> {
        self.dag.apply(Instruction::single_qubit_gate(gate, qubit))?;
        Ok(self)
    }

    fn two(&mut self, gate: StandardGate, q1: QubitId, q2: QubitId) -> IrResult<&mut Self> {
        self.dag.apply(Instruction::two_qubit_gate(gate, q1, q2))?;
        Ok(self)
    }

    // =========================================================================
    // Single-qubit gates
    // =========================================================================

    /// Apply Hadamard gate.
    pub fn h(&mut self, qubit: QubitId) -> IrResult<&mut Self> {
        self.one(StandardGate::H, qubit)
    }

    /// Apply Pauli-X gate.
    pub fn x(&mut self, qubit: QubitId) -> IrResult<&mut Self> {
        self.one(StandardGate::X, qubit)
    }

    /// Apply Pauli-Y gate.
    pub fn y(&mut self, qubit: QubitId) -> IrResult<&mut Self> {
        self.one(StandardGate::Y, qubit)
    }

    /// Apply Pauli-Z gate.
    pub fn z(&mut self, qubit: QubitId) -> IrResult<&mut Self> {
        self.one(StandardGate::Z, qubit)
    }

    /// Apply S gate.
    pub fn s(&mut self, qubit: QubitId) -> IrResult<&mut Self> {
        self.one(StandardGate::S, qubit)
    }

    /// Apply S-dagger gate.
    pub fn sdg(&mut self, qubit: QubitId) -> IrResult<&mut Self> {
        self.one(StandardGate::Sdg, qubit)
    }

    /// Apply T gate.
    pub fn t(&mut self, qubit: QubitId) -> IrResult<&mut Self> {
        self.one(StandardGate::T, qubit)
    }

    /// Apply T-dagger gate.
    pub fn tdg(&mut self, qubit: QubitId) -> IrResult<&mut Self> {
        self.one(StandardGate::Tdg, qubit)
    }

    /// Apply sqrt(X) gate.
    pub fn sx(&mut self, qubit: QubitId) -> IrResult<&mut Self> {
        self.one(StandardGate::SX, qubit)
    }

    /// Apply Rx rotation gate.
    pub fn rx(&mut self, theta: f64, qubit: QubitId) -> IrResult<&mut Self> {
        self.one(StandardGate::Rx(theta), qubit)
    }

    /// Apply Ry rotation gate.
    pub fn ry(&mut self, theta: f64, qubit: QubitId) -> IrResult<&mut Self> {
        self.one(StandardGate::Ry(theta), qubit)
    }

    /// Apply Rz rotation gate.
    pub fn rz(&mut self, theta: f64, qubit: QubitId) -> IrResult<&mut Self> {
        self.one(StandardGate::Rz(theta), qubit)
    }

    /// Apply phase gate.
    pub fn p(&mut self, theta: f64, qubit: QubitId) -> IrResult<&mut Self> {
        self.one(StandardGate::P(theta), qubit)
    }

    // =========================================================================
    // Two-qubit gates
    // =========================================================================

    /// Apply CNOT gate.
    pub fn cx(&mut self, control: QubitId, target: QubitId) -> IrResult<&mut Self> {
        self.two(StandardGate::CX, control, target)
    }

    /// Apply controlled-Y gate.
    pub fn cy(&mut self, control: QubitId, target: QubitId) -> IrResult<&mut Self> {
        self.two(StandardGate::CY, control, target)
    }

    /// Apply controlled-Z gate.
    pub fn cz(&mut self, control: QubitId, target: QubitId) -> IrResult<&mut Self> {
        self.two(StandardGate::CZ, control, target)
    }

    /// Apply controlled phase gate.
    pub fn cp(&mut self, theta: f64, control: QubitId, target: QubitId) -> IrResult<&mut Self> {
        self.two(StandardGate::CP(theta), control, target)
    }

    /// Apply SWAP gate.
    pub fn swap(&mut self, q1: QubitId, q2: QubitId) -> IrResult<&mut Self> {
        self.two(StandardGate::Swap, q1, q2)
    }

    /// Apply a long-range CX that is realised along a device path later.
    pub fn bridge(&mut self, control: QubitId, target: QubitId) -> IrResult<&mut Self> {
        self.two(StandardGate::Bridge, control, target)
    }

    // =========================================================================
    // Three-qubit gates
    // =========================================================================

    /// Apply Toffoli gate.
    pub fn ccx(&mut self, c1: QubitId, c2: QubitId, target: QubitId) -> IrResult<&mut Self> {
        self.dag
            .apply(Instruction::gate(StandardGate::CCX, [c1, c2, target]))?;
        Ok(self)
    }

    /// Apply a Toffoli gate expanded into H, T, T-dagger and CX gates.
    ///
    /// Useful as input to routing, which only handles gates of up to two qubits.
    pub fn ccx_decomposed(
        &mut self,
        c1: QubitId,
        c2: QubitId,
        target: QubitId,
    ) -> IrResult<&mut Self> {
        self.h(target)?
            .cx(c2, target)?
            .tdg(target)?
            .cx(c1, target)?
            .t(target)?
            .cx(c2, target)?
            .tdg(target)?
            .cx(c1, target)?
            .t(c2)?
            .t(target)?
            .h(target)?
            .cx(c1, c2)?
            .t(c1)?
            .tdg(c2)?
            .cx(c1, c2)
    }

    // =========================================================================
    // Other operations
    // =========================================================================

    /// Apply an arbitrary gate.
    pub fn gate(
        &mut self,
        gate: impl Into<Gate>,
        qubits: impl IntoIterator<Item = QubitId>,
    ) -> IrResult<&mut Self> {
        self.dag.apply(Instruction::gate(gate, qubits))?;
        Ok(self)
    }

    /// Measure a qubit into a classical bit.
    pub fn measure(&mut self, qubit: QubitId, clbit: ClbitId) -> IrResult<&mut Self> {
        self.dag.apply(Instruction::measure(qubit, clbit))?;
        Ok(self)
    }

    /// Measure every qubit into the classical bit of the same index.
    pub fn measure_all(&mut self) -> IrResult<&mut Self> {
        while self.dag.num_clbits() < self.dag.num_qubits() {
            self.dag.add_clbit();
        }
        let qubits: Vec<_> = self.dag.qubits().collect();
        let clbits: Vec<_> = self.dag.clbits().take(qubits.len()).collect();
        self.dag.apply(Instruction::measure_all(qubits, clbits)?)?;
        Ok(self)
    }

    /// Reset a qubit.
    pub fn reset(&mut self, qubit: QubitId) -> IrResult<&mut Self> {
        self.dag.apply(Instruction::reset(qubit))?;
        Ok(self)
    }

    /// Add a barrier across the given qubits.
    pub fn barrier(&mut self, qubits: impl IntoIterator<Item = QubitId>) -> IrResult<&mut Self> {
        self.dag.apply(Instruction::barrier(qubits))?;
        Ok(self)
    }

    /// Add a delay on a qubit.
    pub fn delay(&mut self, qubit: QubitId, duration: u64) -> IrResult<&mut Self> {
        self.dag.apply(Instruction::delay(qubit, duration))?;
        Ok(self)
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// Name of the circuit.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of qubits.
    pub fn num_qubits(&self) -> usize {
        self.dag.num_qubits()
    }

    /// Number of classical bits.
    pub fn num_clbits(&self) -> usize {
        self.dag.num_clbits()
    }

    /// Circuit depth.
    pub fn depth(&self) -> usize {
        self.dag.depth()
    }

    /// The underlying DAG.
    pub fn dag(&self) -> &CircuitDag {
        &self.dag
    }

    /// Mutable access to the underlying DAG.
    pub fn dag_mut(&mut self) -> &mut CircuitDag {
        &mut self.dag
    }

    /// Consume the circuit, returning its DAG.
    pub fn into_dag(self) -> CircuitDag {
        self.dag
    }

    /// Wrap a DAG in a circuit.
    pub fn from_dag(name: impl Into<String>, dag: CircuitDag) -> Self {
        Self {
            name: name.into(),
            dag,
        }
    }

    // =========================================================================
    // Pre-built circuits
    // =========================================================================

    /// Two-qubit Bell state preparation with measurement.
    pub fn bell() -> IrResult<Self> {
        let mut circuit = Self::with_size("bell", 2, 2);
        circuit
            .h(QubitId(0))?
            .cx(QubitId(0), QubitId(1))?
            .measure(QubitId(0), ClbitId(0))?
            .measure(QubitId(1), ClbitId(1))?;
        Ok(circuit)
    }

    /// `n`-qubit GHZ state preparation with a CX chain.
    pub fn ghz(n: u32) -> IrResult<Self> {
        if n == 0 {
            return Ok(Self::new("ghz_0"));
        }

        let mut circuit = Self::with_size("ghz", n, n);
        circuit.h(QubitId(0))?;
        for i in 0..n - 1 {
            circuit.cx(QubitId(i), QubitId(i + 1))?;
        }
        for i in 0..n {
            circuit.measure(QubitId(i), ClbitId(i))?;
        }
        Ok(circuit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_circuit() {
        let circuit = Circuit::new("test");
        assert_eq!(circuit.name(), "test");
        assert_eq!(circuit.num_qubits(), 0);
    }

    #[test]
    fn test_bell() {
        let circuit = Circuit::bell().unwrap();
        assert_eq!(circuit.num_qubits(), 2);
        assert_eq!(circuit.dag().num_ops(), 4);
        assert_eq!(circuit.depth(), 3);
    }

    #[test]
    fn test_ghz() {
        let circuit = Circuit::ghz(5).unwrap();
        assert_eq!(circuit.dag().num_two_qubit_gates(), 4);
        assert_eq!(Circuit::ghz(0).unwrap().num_qubits(), 0);
    }

    #[test]
    fn test_ccx_decomposed_uses_only_small_gates() {
        let mut circuit = Circuit::with_size("toffoli", 3, 0);
        circuit
            .ccx_decomposed(QubitId(0), QubitId(1), QubitId(2))
            .unwrap();
        assert_eq!(circuit.dag().num_ops(), 15);
        assert_eq!(circuit.dag().num_two_qubit_gates(), 6);
        assert!(
            circuit
                .dag()
                .topological_ops()
                .all(|(_, inst)| inst.num_qubits() <= 2)
        );
    }

    #[test]
    fn test_measure_all_adds_clbits() {
        let mut circuit = Circuit::with_size("m", 3, 0);
        circuit.measure_all().unwrap();
        assert_eq!(circuit.num_clbits(), 3);
    }

    #[test]
    fn test_json_roundtrip_preserves_instructions() {
        let mut circuit = Circuit::with_size("json", 3, 1);
        circuit
            .h(QubitId(0))
            .unwrap()
            .cx(QubitId(0), QubitId(2))
            .unwrap()
            .rz(0.5, QubitId(1))
            .unwrap()
            .measure(QubitId(2), ClbitId(0))
            .unwrap();

        let json = serde_json::to_string(&circuit).unwrap();
        let back: Circuit = serde_json::from_str(&json).unwrap();
        assert_eq!(back.name(), "json");
        let a: Vec<_> = circuit.dag().topological_ops().map(|(_, i)| i.clone()).collect();
        let b: Vec<_> = back.dag().topological_ops().map(|(_, i)| i.clone()).collect();
        assert_eq!(a, b);
    }

    #[test]
    fn test_json_rejects_out_of_range_qubit() {
        let json = r#"{"num_qubits": 1, "instructions": [
            {"kind": {"Gate": {"kind": {"Standard": "CX"}}}, "qubits": [0, 1]}
        ]}"#;
        assert!(serde_json::from_str::<Circuit>(json).is_err());
    }
}
