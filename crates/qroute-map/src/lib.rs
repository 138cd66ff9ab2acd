//! Qubit placement, routing and token swapping.
//!
//! This crate maps circuits over virtual qubits onto devices whose
//! two-qubit gates only act on coupled physical qubits. It chooses where
//! each virtual qubit starts, inserts SWAP (or Bridge) operations while
//! walking the circuit so that every two-qubit gate acts on neighbours, and
//! synthesises SWAP networks that move qubits between two placements.
//!
//! # Overview
//!
//! 1. **Device**: [`Device`] holds the coupling graph and all-pairs
//!    distances
//! 2. **Placement**: [`Placement`] is the virtual/physical bijection,
//!    possibly partial
//! 3. **Placers**: random, greedy (maximal matchings), SAT, line and SABRE
//!    re-placement
//! 4. **Routers**: SABRE with lazy placement, Bridge and layer-wise A*
//! 5. **Token swapping**: A* and SAT, minimizing SWAP count or depth
//! 6. **Verification**: connectivity, path-sum and state-vector checks
//!
//! # Architecture
//!
//! ```text
//! Logical circuit
//!       │
//!       ▼
//! ┌─────────────┐
//! │ PassManager │ ◄── PropertySet (device, placements, router config)
//! └─────────────┘
//!       │
//!       ├── PlacementPass   (Greedy / Sat / Sabre / Line / Random)
//!       ├── RoutingPass     (Sabre / Bridge / AStar)
//!       ├── BridgeDecomposition
//!       └── MappingVerification
//!       │
//!       ▼
//! Physical circuit + initial and final placement
//! ```
//!
//! # Example: Routing on a Ring
//!
//! ```rust
//! use qroute_ir::{Circuit, QubitId};
//! use qroute_map::{CancellationToken, Device, Placement, Router, SabreRouter};
//!
//! let mut circuit = Circuit::with_size("c", 4, 0);
//! circuit.cx(QubitId(0), QubitId(2)).unwrap();
//!
//! let device = Device::ring(4);
//! let result = SabreRouter::default()
//!     .route(
//!         circuit.dag(),
//!         &device,
//!         Placement::identity(4),
//!         &CancellationToken::new(),
//!     )
//!     .unwrap();
//!
//! assert_eq!(result.num_swaps(), 1);
//! ```
//!
//! # Example: Pass Pipeline
//!
//! ```rust
//! use qroute_ir::Circuit;
//! use qroute_map::{Device, MapMethod, PassManagerBuilder};
//!
//! let circuit = Circuit::ghz(5).unwrap();
//!
//! let (pm, mut props) = PassManagerBuilder::new()
//!     .with_device(Device::star(5))
//!     .with_method(MapMethod::Sabre)
//!     .with_verification(true)
//!     .build();
//!
//! let mut dag = circuit.into_dag();
//! pm.run(&mut dag, &mut props).unwrap();
//! println!("SWAPs inserted: {}", props.swaps.len());
//! ```
//!
//! # Mapping Methods
//!
//! | Method | Placement | Routing |
//! |--------|-----------|---------|
//! | `sabre` | greedy, refined forwards and backwards | SABRE |
//! | `jit` | lazy | SABRE |
//! | `bridge` | lazy | Bridge, no SWAPs |
//! | `sat` | SAT | SABRE |
//! | `astar` | greedy | A* per layer |

pub mod cancel;
pub mod device;
pub mod error;
pub mod layers;
pub mod manager;
pub mod mapping;
pub mod pass;
pub mod placement;
pub mod placer;
pub mod property;
pub mod router;
pub mod synthesis;
pub mod verify;

// Built-in passes
pub mod passes;

pub use cancel::CancellationToken;
pub use device::Device;
pub use error::{MapError, MapResult};
pub use manager::{PassManager, PassManagerBuilder};
pub use mapping::{
    MapMethod, MapOptions, SwapMethod, astar_map, bridge_map, jit_map, map, remap, sabre_map,
    sat_map,
};
pub use pass::{Pass, PassKind};
pub use placement::Placement;
pub use placer::{
    GreedyPlacer, LinePlacer, Placer, RandomPlacer, SabrePlacer, SatPlacementMode, SatPlacer,
};
pub use property::{OriginalCircuit, PropertySet};
pub use router::{
    AStarRouter, BridgeRouter, Router, RouterConfig, RoutingResult, SabreRouter,
};
pub use synthesis::{
    AStarTokenSwap, SatTokenSwap, SwapObjective, TokenSwapProblem, TokenSwapper, apply_swaps,
};
