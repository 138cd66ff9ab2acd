//! Pass trait for mapping pipelines.

use qroute_ir::CircuitDag;

use crate::error::MapResult;
use crate::property::PropertySet;

/// The kind of mapping pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PassKind {
    /// Reads the DAG and writes to the `PropertySet`.
    Analysis,
    /// Rewrites the DAG.
    Transformation,
}

/// A step of a mapping pipeline.
pub trait Pass: Send + Sync {
    /// Get the name of this pass.
    fn name(&self) -> &str;

    /// Get the kind of this pass.
    fn kind(&self) -> PassKind;

    /// Run the pass on the given DAG.
    ///
    /// Analysis passes must leave the DAG untouched.
    fn run(&self, dag: &mut CircuitDag, properties: &mut PropertySet) -> MapResult<()>;

    /// Check if this pass should run based on current state.
    fn should_run(&self, _dag: &CircuitDag, _properties: &PropertySet) -> bool {
        true
    }
}
