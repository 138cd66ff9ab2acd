//! Boolean satisfiability boundary.
//!
//! Placement and token swapping encode their problems as CNF formulas and
//! hand them to an incremental solver through the [`SatSolver`] trait:
//! create variables, add clauses, solve under assumptions, and read back a
//! [`Model`] or the failed assumptions of an unsatisfiable call.
//!
//! [`VarisatSolver`] is the default backend.
//!
//! ```rust
//! use qroute_sat::{SatSolver, SolveOutcome, VarisatSolver};
//!
//! let mut solver = VarisatSolver::new();
//! let a = solver.add_variable();
//! let b = solver.add_variable();
//! solver.add_clause(&[a.positive(), b.positive()]).unwrap();
//!
//! let outcome = solver.solve(&[a.negative()]).unwrap();
//! assert!(outcome.model().unwrap().value(b));
//! assert!(matches!(solver.solve(&[a.negative(), b.negative()]).unwrap(),
//!     SolveOutcome::Unsatisfiable { .. }));
//! ```

pub mod backend;
pub mod cardinality;
pub mod error;
pub mod solver;

pub use backend::VarisatSolver;
pub use error::{SatError, SatResult};
pub use solver::{Lit, Model, SatSolver, SolveOutcome, Var};
