//! Dependency counting over the circuit DAG.
//!
//! Routers schedule instructions as a dataflow: a node becomes ready once
//! every wire entering it has been released by an already scheduled node.
//! [`DependencyTracker`] keeps the per-node counters and can walk the DAG
//! forwards (from input nodes) or backwards (from output nodes).

use qroute_ir::{CircuitDag, Direction, NodeIndex};

/// Per-node count of released incoming wires.
#[derive(Debug, Clone)]
pub struct DependencyTracker<'a> {
    dag: &'a CircuitDag,
    direction: Direction,
    released: Vec<u32>,
}

impl<'a> DependencyTracker<'a> {
    /// Tracker walking `dag` in `direction` (`Outgoing` = forwards).
    pub fn new(dag: &'a CircuitDag, direction: Direction) -> Self {
        Self {
            dag,
            direction,
            released: vec![0; dag.graph().node_count()],
        }
    }

    /// Direction of the walk.
    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// The operations that are ready before anything is scheduled.
    ///
    /// Wire endpoints are released in wire order; the endpoint nodes
    /// themselves never appear in the result.
    pub fn initial_front(&mut self) -> Vec<NodeIndex> {
        let starts: Vec<NodeIndex> = match self.direction {
            Direction::Outgoing => self.dag.input_nodes().collect(),
            Direction::Incoming => self.dag.output_nodes().collect(),
        };
        let mut ready = Vec::new();
        for start in starts {
            self.release_into(start, &mut ready);
        }
        ready
    }

    /// Mark `node` as scheduled and append the operations that became ready.
    pub fn release_into(&mut self, node: NodeIndex, ready: &mut Vec<NodeIndex>) {
        for child in self.dag.neighbors(node, self.direction) {
            if self.dag.is_meta(child) {
                continue;
            }
            let count = &mut self.released[child.index()];
            *count += 1;
            if *count as usize == self.dag.num_wires(child) {
                ready.push(child);
            }
        }
    }

    /// Two-qubit gates reachable from `front` if every front node were
    /// scheduled, in breadth-first order, at most `limit` of them.
    ///
    /// The counters are restored before returning.
    pub fn extended_layer(&mut self, front: &[NodeIndex], limit: usize) -> Vec<NodeIndex> {
        let mut extended = Vec::new();
        let mut touched = Vec::new();
        let mut layer: Vec<NodeIndex> = front.to_vec();

        while !layer.is_empty() && extended.len() < limit {
            let mut next = Vec::new();
            'layer: for &node in &layer {
                for child in self.dag.neighbors(node, self.direction) {
                    if self.dag.is_meta(child) {
                        continue;
                    }
                    self.released[child.index()] += 1;
                    touched.push(child);
                    if self.released[child.index()] as usize == self.dag.num_wires(child) {
                        next.push(child);
                        let is_two_qubit = self
                            .dag
                            .get_instruction(child)
                            .is_some_and(|inst| inst.is_two_qubit_gate());
                        if is_two_qubit {
                            extended.push(child);
                            if extended.len() >= limit {
                                break 'layer;
                            }
                        }
                    }
                }
            }
            layer = next;
        }

        for node in touched {
            self.released[node.index()] -= 1;
        }
        extended
    }
}

/// As-soon-as-possible layers of all operations.
pub fn asap_layers(dag: &CircuitDag) -> Vec<Vec<NodeIndex>> {
    let mut level = vec![0usize; dag.graph().node_count()];
    let mut layers: Vec<Vec<NodeIndex>> = Vec::new();
    for (node, _) in dag.topological_ops() {
        let l = dag
            .predecessors(node)
            .filter(|&p| !dag.is_meta(p))
            .map(|p| level[p.index()] + 1)
            .max()
            .unwrap_or(0);
        level[node.index()] = l;
        if layers.len() <= l {
            layers.resize_with(l + 1, Vec::new);
        }
        layers[l].push(node);
    }
    layers
}

/// Layers of two-qubit gates, ignoring every other instruction.
///
/// A gate lands one layer after the latest two-qubit gate that shares a
/// qubit with it.
pub fn two_qubit_layers(dag: &CircuitDag) -> Vec<Vec<NodeIndex>> {
    let mut next_free = vec![0usize; dag.num_qubits()];
    let mut layers: Vec<Vec<NodeIndex>> = Vec::new();
    for (node, inst) in dag.topological_ops() {
        if !inst.is_two_qubit_gate() {
            continue;
        }
        let (a, b) = (inst.qubits[0].index(), inst.qubits[1].index());
        let l = next_free[a].max(next_free[b]);
        next_free[a] = l + 1;
        next_free[b] = l + 1;
        if layers.len() <= l {
            layers.resize_with(l + 1, Vec::new);
        }
        layers[l].push(node);
    }
    layers
}
