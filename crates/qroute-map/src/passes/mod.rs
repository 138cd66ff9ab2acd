//! Built-in mapping passes.
//!
//! - [`PlacementPass`]: choose an initial placement with any [`Placer`](crate::Placer)
//! - [`RoutingPass`]: route with any [`Router`](crate::Router), replacing the DAG
//! - [`BridgeDecomposition`]: expand Bridge gates into nearest-neighbour CX gates
//! - [`MappingVerification`]: check the routed DAG against the original

mod bridge;
mod placement;
mod routing;
mod verification;

pub use bridge::{BridgeDecomposition, bridge_cx_sequence, decompose_bridges};
pub use placement::PlacementPass;
pub use routing::RoutingPass;
pub use verification::MappingVerification;
