//! Circuit instructions combining gates with operands.

use serde::{Deserialize, Serialize};

use crate::error::{IrError, IrResult};
use crate::gate::{Gate, StandardGate};
use crate::qubit::{ClbitId, QubitId};

/// The kind of instruction in a circuit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum InstructionKind {
    /// A quantum gate operation.
    Gate(Gate),
    /// Measurement operation.
    Measure,
    /// Reset qubit to |0⟩.
    Reset,
    /// Barrier (synchronization point).
    Barrier,
    /// Delay instruction.
    Delay {
        /// Duration in device-specific units.
        duration: u64,
    },
}

/// A complete instruction with operands.
///
/// Qubit order is significant: for controlled two-qubit gates `qubits[0]`
/// is the control and `qubits[1]` the target.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Instruction {
    /// The kind of instruction.
    pub kind: InstructionKind,
    /// Qubits this instruction operates on.
    pub qubits: Vec<QubitId>,
    /// Classical bits this instruction operates on (for measure).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub clbits: Vec<ClbitId>,
}

impl Instruction {
    /// Create a gate instruction.
    pub fn gate(gate: impl Into<Gate>, qubits: impl IntoIterator<Item = QubitId>) -> Self {
        Self {
            kind: InstructionKind::Gate(gate.into()),
            qubits: qubits.into_iter().collect(),
            clbits: vec![],
        }
    }

    /// Create a single-qubit gate instruction.
    pub fn single_qubit_gate(gate: StandardGate, qubit: QubitId) -> Self {
        Self::gate(gate, [qubit])
    }

    /// Create a two-qubit gate instruction.
    pub fn two_qubit_gate(gate: StandardGate, q1: QubitId, q2: QubitId) -> Self {
        Self::gate(gate, [q1, q2])
    }

    /// Create a SWAP instruction.
    pub fn swap(q1: QubitId, q2: QubitId) -> Self {
        Self::two_qubit_gate(StandardGate::Swap, q1, q2)
    }

    /// Create a measurement instruction.
    pub fn measure(qubit: QubitId, clbit: ClbitId) -> Self {
        Self {
            kind: InstructionKind::Measure,
            qubits: vec![qubit],
            clbits: vec![clbit],
        }
    }

    /// Create a multi-qubit measurement instruction.
    pub fn measure_all(
        qubits: impl IntoIterator<Item = QubitId>,
        clbits: impl IntoIterator<Item = ClbitId>,
    ) -> IrResult<Self> {
        let qubits: Vec<_> = qubits.into_iter().collect();
        let clbits: Vec<_> = clbits.into_iter().collect();
        if qubits.len() != clbits.len() {
            return Err(IrError::MeasureArity {
                qubits: qubits.len(),
                clbits: clbits.len(),
            });
        }
        Ok(Self {
            kind: InstructionKind::Measure,
            qubits,
            clbits,
        })
    }

    /// Create a reset instruction.
    pub fn reset(qubit: QubitId) -> Self {
        Self {
            kind: InstructionKind::Reset,
            qubits: vec![qubit],
            clbits: vec![],
        }
    }

    /// Create a barrier instruction.
    pub fn barrier(qubits: impl IntoIterator<Item = QubitId>) -> Self {
        Self {
            kind: InstructionKind::Barrier,
            qubits: qubits.into_iter().collect(),
            clbits: vec![],
        }
    }

    /// Create a delay instruction.
    pub fn delay(qubit: QubitId, duration: u64) -> Self {
        Self {
            kind: InstructionKind::Delay { duration },
            qubits: vec![qubit],
            clbits: vec![],
        }
    }

    /// Check if this is a gate instruction.
    pub fn is_gate(&self) -> bool {
        matches!(self.kind, InstructionKind::Gate(_))
    }

    /// Check if this is a measurement.
    pub fn is_measure(&self) -> bool {
        matches!(self.kind, InstructionKind::Measure)
    }

    /// Check if this is a reset.
    pub fn is_reset(&self) -> bool {
        matches!(self.kind, InstructionKind::Reset)
    }

    /// Check if this is a barrier.
    pub fn is_barrier(&self) -> bool {
        matches!(self.kind, InstructionKind::Barrier)
    }

    /// Get the gate if this is a gate instruction.
    pub fn as_gate(&self) -> Option<&Gate> {
        match &self.kind {
            InstructionKind::Gate(g) => Some(g),
            _ => None,
        }
    }

    /// Get the standard gate if this is a standard gate instruction.
    pub fn standard_gate(&self) -> Option<StandardGate> {
        self.as_gate().and_then(Gate::as_standard)
    }

    /// Number of qubit operands.
    #[inline]
    pub fn num_qubits(&self) -> usize {
        self.qubits.len()
    }

    /// The `i`-th qubit operand.
    #[inline]
    pub fn qubit(&self, i: usize) -> Option<QubitId> {
        self.qubits.get(i).copied()
    }

    /// The control of a controlled gate: the first qubit operand.
    pub fn control(&self) -> Option<QubitId> {
        if self.qubits.len() > 1 {
            self.qubits.first().copied()
        } else {
            None
        }
    }

    /// The target of a gate: the last qubit operand.
    pub fn target(&self) -> Option<QubitId> {
        self.qubits.last().copied()
    }

    /// Whether this is a gate acting on exactly one qubit.
    pub fn is_one_qubit_gate(&self) -> bool {
        self.is_gate() && self.qubits.len() == 1
    }

    /// Whether this is a gate acting on exactly two qubits.
    ///
    /// These are the instructions that connectivity constraints apply to.
    pub fn is_two_qubit_gate(&self) -> bool {
        self.is_gate() && self.qubits.len() == 2
    }

    /// Check if this is a SWAP gate.
    pub fn is_swap(&self) -> bool {
        self.standard_gate() == Some(StandardGate::Swap)
    }

    /// Check if this is a Bridge gate.
    pub fn is_bridge(&self) -> bool {
        self.standard_gate() == Some(StandardGate::Bridge)
    }

    /// Return a copy with every qubit operand replaced by `f(qubit)`.
    #[must_use]
    pub fn map_qubits(&self, mut f: impl FnMut(QubitId) -> QubitId) -> Self {
        Self {
            kind: self.kind.clone(),
            qubits: self.qubits.iter().map(|&q| f(q)).collect(),
            clbits: self.clbits.clone(),
        }
    }

    /// Get the name of the instruction.
    pub fn name(&self) -> &str {
        match &self.kind {
            InstructionKind::Gate(g) => g.name(),
            InstructionKind::Measure => "measure",
            InstructionKind::Reset => "reset",
            InstructionKind::Barrier => "barrier",
            InstructionKind::Delay { .. } => "delay",
        }
    }
}
