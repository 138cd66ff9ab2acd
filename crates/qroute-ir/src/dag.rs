//! DAG-based circuit representation.

use petgraph::Direction;
use petgraph::graph::{DiGraph, NodeIndex as PetNodeIndex};
use petgraph::visit::EdgeRef;
use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};

use crate::error::{IrError, IrResult};
use crate::instruction::{Instruction, InstructionKind};
use crate::qubit::{ClbitId, QubitId};

/// Node index type for the circuit DAG.
pub type NodeIndex = PetNodeIndex<u32>;

/// A node in the circuit DAG.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum DagNode {
    /// Input node for a wire.
    In(WireId),
    /// Output node for a wire.
    Out(WireId),
    /// Operation node containing an instruction.
    Op(Instruction),
}

impl DagNode {
    /// Check if this is an input node.
    #[inline]
    pub fn is_input(&self) -> bool {
        matches!(self, DagNode::In(_))
    }

    /// Check if this is an output node.
    #[inline]
    pub fn is_output(&self) -> bool {
        matches!(self, DagNode::Out(_))
    }

    /// Check if this is an operation node.
    #[inline]
    pub fn is_op(&self) -> bool {
        matches!(self, DagNode::Op(_))
    }

    /// Get the instruction if this is an operation node.
    #[inline]
    pub fn instruction(&self) -> Option<&Instruction> {
        match self {
            DagNode::Op(inst) => Some(inst),
            _ => None,
        }
    }
}

/// Identifier for a wire in the DAG.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WireId {
    /// A quantum wire.
    Qubit(QubitId),
    /// A classical wire.
    Clbit(ClbitId),
}

impl From<QubitId> for WireId {
    fn from(q: QubitId) -> Self {
        WireId::Qubit(q)
    }
}

impl From<ClbitId> for WireId {
    fn from(c: ClbitId) -> Self {
        WireId::Clbit(c)
    }
}

/// An edge in the circuit DAG representing a wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DagEdge {
    /// The wire this edge represents.
    pub wire: WireId,
}

/// The abstraction level of a circuit.
///
/// Circuits start at the `Logical` level (virtual qubits) and are lowered to
/// the `Physical` level by placement and routing, after which qubit ids are
/// device qubit indices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CircuitLevel {
    /// Logical level: qubits are virtual.
    #[default]
    Logical,
    /// Physical level: qubits are device positions.
    Physical,
}

#[derive(Debug, Clone, Copy)]
struct WireEnds {
    input: NodeIndex,
    output: NodeIndex,
    /// Last node before the output node.
    front: NodeIndex,
}

/// DAG-based circuit representation.
///
/// - Nodes are input nodes, output nodes, or operation nodes
/// - Edges represent wires (quantum or classical), one edge per wire segment
/// - Each wire has exactly one input and one output node
///
/// Operations are only ever appended, so ascending node index is a
/// topological order of the operation nodes. Traversals rely on this
/// instead of running a topological sort.
///
/// Qubit and classical bit ids are dense: the `n`-th added qubit is
/// `QubitId(n)`.
#[derive(Debug, Clone, Default)]
pub struct CircuitDag {
    graph: DiGraph<DagNode, DagEdge, u32>,
    qubits: Vec<WireEnds>,
    clbits: Vec<WireEnds>,
    num_ops: usize,
    level: CircuitLevel,
}

impl CircuitDag {
    /// Create a new empty circuit DAG.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a DAG with the given number of qubit and classical wires.
    pub fn with_size(num_qubits: u32, num_clbits: u32) -> Self {
        let mut dag = Self::new();
        for _ in 0..num_qubits {
            dag.add_qubit();
        }
        for _ in 0..num_clbits {
            dag.add_clbit();
        }
        dag
    }

    fn add_wire(&mut self, wire: WireId) -> WireEnds {
        let input = self.graph.add_node(DagNode::In(wire));
        let output = self.graph.add_node(DagNode::Out(wire));
        self.graph.add_edge(input, output, DagEdge { wire });
        WireEnds {
            input,
            output,
            front: input,
        }
    }

    /// Add a qubit wire and return its id.
    #[allow(clippy::cast_possible_truncation)]
    pub fn add_qubit(&mut self) -> QubitId {
        let id = QubitId(self.qubits.len() as u32);
        let ends = self.add_wire(WireId::Qubit(id));
        self.qubits.push(ends);
        id
    }

    /// Add a classical wire and return its id.
    #[allow(clippy::cast_possible_truncation)]
    pub fn add_clbit(&mut self) -> ClbitId {
        let id = ClbitId(self.clbits.len() as u32);
        let ends = self.add_wire(WireId::Clbit(id));
        self.clbits.push(ends);
        id
    }

    fn validate(&self, instruction: &Instruction) -> IrResult<()> {
        let gate_name = match &instruction.kind {
            InstructionKind::Gate(gate) => Some(gate.name().to_string()),
            _ => None,
        };

        if let InstructionKind::Gate(gate) = &instruction.kind {
            let expected = gate.num_qubits();
            let got = u32::try_from(instruction.qubits.len()).unwrap_or(u32::MAX);
            if expected != got {
                return Err(IrError::QubitCountMismatch {
                    gate_name: gate.name().to_string(),
                    expected,
                    got,
                });
            }
        }

        for &qubit in &instruction.qubits {
            if qubit.index() >= self.qubits.len() {
                return Err(IrError::QubitNotFound {
                    qubit,
                    gate_name: gate_name.clone(),
                });
            }
        }

        for &clbit in &instruction.clbits {
            if clbit.index() >= self.clbits.len() {
                return Err(IrError::ClbitNotFound {
                    clbit,
                    gate_name: gate_name.clone(),
                });
            }
        }

        let mut seen = FxHashSet::default();
        for &qubit in &instruction.qubits {
            if !seen.insert(qubit) {
                return Err(IrError::DuplicateQubit { qubit, gate_name });
            }
        }

        if instruction.is_measure() && instruction.qubits.len() != instruction.clbits.len() {
            return Err(IrError::MeasureArity {
                qubits: instruction.qubits.len(),
                clbits: instruction.clbits.len(),
            });
        }

        Ok(())
    }

    fn splice(&mut self, ends: WireEnds, wire: WireId, op_node: NodeIndex) -> IrResult<()> {
        let edge = self
            .graph
            .edges_directed(ends.front, Direction::Outgoing)
            .find(|e| e.weight().wire == wire && e.target() == ends.output)
            .map(|e| e.id())
            .ok_or_else(|| {
                IrError::InvalidDag(format!("Missing edge into output node for wire {wire:?}"))
            })?;
        self.graph.remove_edge(edge);
        self.graph.add_edge(ends.front, op_node, DagEdge { wire });
        self.graph.add_edge(op_node, ends.output, DagEdge { wire });
        Ok(())
    }

    /// Append an instruction at the end of its wires.
    pub fn apply(&mut self, instruction: Instruction) -> IrResult<NodeIndex> {
        self.validate(&instruction)?;

        let qubits = instruction.qubits.clone();
        let clbits = instruction.clbits.clone();
        let op_node = self.graph.add_node(DagNode::Op(instruction));

        for qubit in qubits {
            let ends = self.qubits[qubit.index()];
            self.splice(ends, WireId::Qubit(qubit), op_node)?;
            self.qubits[qubit.index()].front = op_node;
        }
        for clbit in clbits {
            let ends = self.clbits[clbit.index()];
            self.splice(ends, WireId::Clbit(clbit), op_node)?;
            self.clbits[clbit.index()].front = op_node;
        }

        self.num_ops += 1;
        Ok(op_node)
    }

    /// Iterate over operations in topological order.
    pub fn topological_ops(&self) -> impl DoubleEndedIterator<Item = (NodeIndex, &Instruction)> {
        self.graph
            .node_indices()
            .filter_map(|idx| self.graph[idx].instruction().map(|inst| (idx, inst)))
    }

    /// Iterate over operations in reverse topological order.
    pub fn reverse_ops(&self) -> impl Iterator<Item = (NodeIndex, &Instruction)> {
        self.topological_ops().rev()
    }

    /// Get a node by index.
    #[inline]
    pub fn node(&self, node: NodeIndex) -> Option<&DagNode> {
        self.graph.node_weight(node)
    }

    /// Get an instruction by node index.
    #[inline]
    pub fn get_instruction(&self, node: NodeIndex) -> Option<&Instruction> {
        self.graph.node_weight(node).and_then(DagNode::instruction)
    }

    /// Whether a node is an input or output marker rather than an operation.
    #[inline]
    pub fn is_meta(&self, node: NodeIndex) -> bool {
        self.graph
            .node_weight(node)
            .is_some_and(|n| !n.is_op())
    }

    /// Nodes following `node`, one entry per wire.
    ///
    /// A successor sharing two wires with `node` is yielded twice, which is
    /// what dependency counting against [`CircuitDag::num_wires`] expects.
    pub fn successors(&self, node: NodeIndex) -> impl Iterator<Item = NodeIndex> + '_ {
        self.neighbors(node, Direction::Outgoing)
    }

    /// Nodes preceding `node`, one entry per wire.
    pub fn predecessors(&self, node: NodeIndex) -> impl Iterator<Item = NodeIndex> + '_ {
        self.neighbors(node, Direction::Incoming)
    }

    /// Neighbours in the given direction, one entry per wire.
    pub fn neighbors(
        &self,
        node: NodeIndex,
        direction: Direction,
    ) -> impl Iterator<Item = NodeIndex> + '_ {
        self.graph
            .edges_directed(node, direction)
            .map(move |e| match direction {
                Direction::Outgoing => e.target(),
                Direction::Incoming => e.source(),
            })
    }

    /// Number of wires that pass through `node`.
    pub fn num_wires(&self, node: NodeIndex) -> usize {
        match self.graph.node_weight(node) {
            Some(DagNode::In(_)) => self.graph.edges_directed(node, Direction::Outgoing).count(),
            Some(_) => self.graph.edges_directed(node, Direction::Incoming).count(),
            None => 0,
        }
    }

    /// Input nodes of all wires, qubits first.
    pub fn input_nodes(&self) -> impl Iterator<Item = NodeIndex> + '_ {
        self.qubits.iter().chain(&self.clbits).map(|w| w.input)
    }

    /// Output nodes of all wires, qubits first.
    pub fn output_nodes(&self) -> impl Iterator<Item = NodeIndex> + '_ {
        self.qubits.iter().chain(&self.clbits).map(|w| w.output)
    }

    /// Get the input node for a qubit.
    #[inline]
    pub fn qubit_input_node(&self, qubit: QubitId) -> Option<NodeIndex> {
        self.qubits.get(qubit.index()).map(|w| w.input)
    }

    /// Get the output node for a qubit.
    #[inline]
    pub fn qubit_output_node(&self, qubit: QubitId) -> Option<NodeIndex> {
        self.qubits.get(qubit.index()).map(|w| w.output)
    }

    /// Get the number of qubits.
    #[inline]
    pub fn num_qubits(&self) -> usize {
        self.qubits.len()
    }

    /// Get the number of classical bits.
    #[inline]
    pub fn num_clbits(&self) -> usize {
        self.clbits.len()
    }

    /// Get the number of operations.
    #[inline]
    pub fn num_ops(&self) -> usize {
        self.num_ops
    }

    /// Number of gates acting on exactly two qubits.
    pub fn num_two_qubit_gates(&self) -> usize {
        self.topological_ops()
            .filter(|(_, inst)| inst.is_two_qubit_gate())
            .count()
    }

    /// Iterate over qubits.
    #[allow(clippy::cast_possible_truncation)]
    pub fn qubits(&self) -> impl Iterator<Item = QubitId> + '_ {
        (0..self.qubits.len() as u32).map(QubitId)
    }

    /// Iterate over classical bits.
    #[allow(clippy::cast_possible_truncation)]
    pub fn clbits(&self) -> impl Iterator<Item = ClbitId> + '_ {
        (0..self.clbits.len() as u32).map(ClbitId)
    }

    /// Calculate the circuit depth.
    pub fn depth(&self) -> usize {
        let mut depths = vec![0usize; self.graph.node_count()];
        let mut max_depth = 0usize;

        for (node, _) in self.topological_ops() {
            let node_depth = self
                .predecessors(node)
                .map(|p| depths[p.index()])
                .max()
                .unwrap_or(0)
                + 1;
            depths[node.index()] = node_depth;
            max_depth = max_depth.max(node_depth);
        }

        max_depth
    }

    /// Get the abstraction level of this circuit.
    pub fn level(&self) -> CircuitLevel {
        self.level
    }

    /// Set the abstraction level of this circuit.
    pub fn set_level(&mut self, level: CircuitLevel) {
        self.level = level;
    }

    /// Get a reference to the underlying graph.
    pub fn graph(&self) -> &DiGraph<DagNode, DagEdge, u32> {
        &self.graph
    }

    /// Verify the structural integrity of the DAG.
    ///
    /// Checks that every wire is an unbroken path from its input node to its
    /// output node and that every operation only depends on operations
    /// appended before it.
    pub fn verify_integrity(&self) -> IrResult<()> {
        let qubit_wires = self
            .qubits
            .iter()
            .zip(self.qubits())
            .map(|(ends, q)| (*ends, WireId::Qubit(q)));
        let clbit_wires = self
            .clbits
            .iter()
            .zip(self.clbits())
            .map(|(ends, c)| (*ends, WireId::Clbit(c)));

        for (ends, wire) in qubit_wires.chain(clbit_wires) {
            let mut current = ends.input;
            let mut steps = 0;
            while current != ends.output {
                let next = self
                    .graph
                    .edges_directed(current, Direction::Outgoing)
                    .find(|e| e.weight().wire == wire)
                    .map(|e| e.target());
                current = next.ok_or_else(|| {
                    IrError::InvalidDag(format!(
                        "Wire {wire:?} is broken: no outgoing edge from node {current:?}"
                    ))
                })?;
                steps += 1;
                if steps > self.graph.node_count() {
                    return Err(IrError::InvalidDag(format!(
                        "Wire {wire:?} does not terminate"
                    )));
                }
            }
        }

        for (node, _) in self.topological_ops() {
            for pred in self.predecessors(node) {
                if self.graph[pred].is_op() && pred.index() >= node.index() {
                    return Err(IrError::InvalidDag(format!(
                        "Operation {node:?} depends on later operation {pred:?}"
                    )));
                }
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gate::StandardGate;

    fn cx(c: u32, t: u32) -> Instruction {
        Instruction::two_qubit_gate(StandardGate::CX, QubitId(c), QubitId(t))
    }

    #[test]
    fn test_empty_dag() {
        let dag = CircuitDag::new();
        assert_eq!(dag.num_qubits(), 0);
        assert_eq!(dag.num_clbits(), 0);
        assert_eq!(dag.num_ops(), 0);
        assert_eq!(dag.depth(), 0);
    }

    #[test]
    fn test_dense_ids() {
        let mut dag = CircuitDag::new();
        assert_eq!(dag.add_qubit(), QubitId(0));
        assert_eq!(dag.add_qubit(), QubitId(1));
        assert_eq!(dag.add_clbit(), ClbitId(0));
        assert_eq!(dag.qubits().collect::<Vec<_>>(), vec![QubitId(0), QubitId(1)]);
    }

    #[test]
    fn test_bell_state_depth() {
        let mut dag = CircuitDag::with_size(2, 0);
        dag.apply(Instruction::single_qubit_gate(StandardGate::H, QubitId(0)))
            .unwrap();
        dag.apply(cx(0, 1)).unwrap();
        assert_eq!(dag.num_ops(), 2);
        assert_eq!(dag.depth(), 2);
        assert_eq!(dag.num_two_qubit_gates(), 1);
    }

    #[test]
    fn test_parallel_gates_depth() {
        let mut dag = CircuitDag::with_size(4, 0);
        dag.apply(cx(0, 1)).unwrap();
        dag.apply(cx(2, 3)).unwrap();
        dag.apply(cx(1, 2)).unwrap();
        assert_eq!(dag.depth(), 2);
    }

    #[test]
    fn test_gate_arity_mismatch() {
        let mut dag = CircuitDag::with_size(2, 0);
        let inst = Instruction::gate(StandardGate::CX, [QubitId(0)]);
        let err = dag.apply(inst).unwrap_err();
        assert!(matches!(
            err,
            IrError::QubitCountMismatch {
                expected: 2,
                got: 1,
                ..
            }
        ));
    }

    #[test]
    fn test_qubit_not_found_with_context() {
        let mut dag = CircuitDag::with_size(1, 0);
        let err = dag.apply(cx(0, 5)).unwrap_err();
        assert!(err.to_string().contains("(gate: cx)"));
    }

    #[test]
    fn test_duplicate_qubit() {
        let mut dag = CircuitDag::with_size(2, 0);
        assert!(matches!(
            dag.apply(cx(1, 1)),
            Err(IrError::DuplicateQubit { .. })
        ));
    }

    #[test]
    fn test_topological_and_reverse_order() {
        let mut dag = CircuitDag::with_size(3, 0);
        let a = dag.apply(cx(0, 1)).unwrap();
        let b = dag.apply(cx(1, 2)).unwrap();
        let c = dag
            .apply(Instruction::single_qubit_gate(StandardGate::X, QubitId(0)))
            .unwrap();

        let forward: Vec<_> = dag.topological_ops().map(|(n, _)| n).collect();
        assert_eq!(forward, vec![a, b, c]);
        let backward: Vec<_> = dag.reverse_ops().map(|(n, _)| n).collect();
        assert_eq!(backward, vec![c, b, a]);
    }

    #[test]
    fn test_successor_multiplicity() {
        let mut dag = CircuitDag::with_size(2, 0);
        let a = dag.apply(cx(0, 1)).unwrap();
        let b = dag.apply(cx(1, 0)).unwrap();

        let succ: Vec<_> = dag.successors(a).collect();
        assert_eq!(succ, vec![b, b]);
        assert_eq!(dag.num_wires(b), 2);
        assert_eq!(dag.predecessors(b).filter(|&p| p == a).count(), 2);
    }

    #[test]
    fn test_meta_nodes() {
        let dag = CircuitDag::with_size(2, 1);
        let inputs: Vec<_> = dag.input_nodes().collect();
        assert_eq!(inputs.len(), 3);
        for node in inputs {
            assert!(dag.is_meta(node));
            assert_eq!(dag.num_wires(node), 1);
        }
        assert_eq!(dag.output_nodes().count(), 3);
    }

    #[test]
    fn test_measure_wires() {
        let mut dag = CircuitDag::with_size(1, 1);
        let m = dag.apply(Instruction::measure(QubitId(0), ClbitId(0))).unwrap();
        assert_eq!(dag.num_wires(m), 2);
    }

    #[test]
    fn test_verify_integrity() {
        let mut dag = CircuitDag::with_size(3, 3);
        dag.apply(Instruction::single_qubit_gate(StandardGate::H, QubitId(0)))
            .unwrap();
        dag.apply(cx(0, 1)).unwrap();
        dag.apply(cx(1, 2)).unwrap();
        for i in 0..3 {
            dag.apply(Instruction::measure(QubitId(i), ClbitId(i))).unwrap();
        }
        assert!(dag.verify_integrity().is_ok());
    }

    #[test]
    fn test_wire_added_after_ops() {
        let mut dag = CircuitDag::with_size(2, 0);
        dag.apply(cx(0, 1)).unwrap();
        let q2 = dag.add_qubit();
        dag.apply(cx(1, q2.0)).unwrap();
        assert!(dag.verify_integrity().is_ok());
        assert_eq!(dag.depth(), 2);
    }
}
