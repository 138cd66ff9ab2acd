//! Circuit intermediate representation for qubit mapping.
//!
//! This crate provides the circuit data structures that placement and
//! routing operate on.
//!
//! # Core Components
//!
//! - **Qubits and Classical Bits**: [`QubitId`], [`ClbitId`]. Virtual and
//!   physical qubits share the same representation.
//! - **Gates**: [`StandardGate`] for built-in gates and [`CustomGate`] for
//!   opaque operations
//! - **Instructions**: [`Instruction`] combining gates with their operands
//! - **DAG**: [`CircuitDag`], an append-only dependency graph whose node
//!   order is a topological order
//! - **Circuit**: [`Circuit`] high-level builder API with JSON support
//!
//! # Example: Building a Bell State
//!
//! ```rust
//! use qroute_ir::{Circuit, QubitId};
//!
//! let mut circuit = Circuit::with_size("bell_state", 2, 2);
//! circuit.h(QubitId(0)).unwrap();
//! circuit.cx(QubitId(0), QubitId(1)).unwrap();
//! circuit.measure_all().unwrap();
//!
//! assert_eq!(circuit.num_qubits(), 2);
//! assert_eq!(circuit.depth(), 3);
//! ```
//!
//! # Supported Gates
//!
//! | Gate | Qubits | Description |
//! |------|--------|-------------|
//! | `H` | 1 | Hadamard gate |
//! | `X`, `Y`, `Z` | 1 | Pauli gates |
//! | `S`, `Sdg`, `T`, `Tdg`, `SX`, `SXdg` | 1 | Clifford+T gates |
//! | `Rx`, `Ry`, `Rz`, `P` | 1 | Rotation and phase gates |
//! | `CX`, `CY`, `CZ`, `CP` | 2 | Controlled gates |
//! | `Swap` | 2 | SWAP gate |
//! | `Bridge` | 2 | Long-range CX, decomposed along a device path |
//! | `CCX` | 3 | Toffoli gate |

pub mod circuit;
pub mod dag;
pub mod error;
pub mod gate;
pub mod instruction;
pub mod qubit;

pub use circuit::Circuit;
pub use dag::{CircuitDag, CircuitLevel, DagEdge, DagNode, NodeIndex, WireId};
pub use error::{IrError, IrResult};
pub use gate::{CustomGate, Gate, GateKind, StandardGate};
pub use instruction::{Instruction, InstructionKind};
pub use petgraph::Direction;
pub use qubit::{ClbitId, QubitId};
