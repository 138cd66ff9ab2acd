//! Error types for placement, routing and token swapping.

use qroute_ir::QubitId;
use thiserror::Error;

/// Errors that can occur while mapping a circuit onto a device.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum MapError {
    /// Error from the IR crate.
    #[error("IR error: {0}")]
    Ir(#[from] qroute_ir::IrError),

    /// Error from the SAT backend.
    #[error("SAT error: {0}")]
    Sat(#[from] qroute_sat::SatError),

    /// A qubit index outside the device or circuit.
    #[error("Qubit {qubit} out of range (size {num_qubits})")]
    InvalidQubit { qubit: u32, num_qubits: u32 },

    /// Two physical qubits have no path between them.
    #[error("Physical qubits {from} and {to} are not connected by any path")]
    Unreachable { from: u32, to: u32 },

    /// The virtual qubit already has a physical qubit.
    #[error("Virtual qubit {0} is already mapped")]
    QubitAlreadyMapped(QubitId),

    /// The physical qubit already hosts a virtual qubit.
    #[error("Physical qubit {0} is already occupied")]
    PhysicalQubitOccupied(u32),

    /// Circuit too large for target.
    #[error("Circuit requires {required} qubits but device only has {available}")]
    CircuitTooLarge { required: usize, available: u32 },

    /// Instruction the router cannot handle.
    #[error("Unsupported instruction '{name}' on {num_qubits} qubits: {reason}")]
    UnsupportedInstruction {
        name: String,
        num_qubits: usize,
        reason: String,
    },

    /// A search exhausted its budget without a solution.
    #[error("No solution found: {0}")]
    NoSolutionFound(String),

    /// The router exceeded its SWAP budget.
    #[error("Routing did not converge after {swaps} SWAPs (limit {limit})")]
    RoutingDidNotConverge { swaps: usize, limit: usize },

    /// The run was cancelled through its cancellation token.
    #[error("Mapping cancelled")]
    Cancelled,

    /// Missing device for placement or routing.
    #[error("Missing device for mapping")]
    MissingDevice,

    /// Missing placement for routing.
    #[error("Missing placement for routing")]
    MissingPlacement,

    /// Invalid configuration.
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// The mapped circuit breaks a device constraint or changes semantics.
    #[error("Mapping violation: {0}")]
    MappingViolation(String),

    /// A token assignment that is not a permutation.
    #[error("Invalid permutation: {0}")]
    InvalidPermutation(String),
}

/// Result type for mapping operations.
pub type MapResult<T> = Result<T, MapError>;
