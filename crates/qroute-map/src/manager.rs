//! Pass manager for mapping pipelines.

use tracing::{debug, info, instrument};

use qroute_ir::CircuitDag;

use crate::cancel::CancellationToken;
use crate::device::Device;
use crate::error::MapResult;
use crate::mapping::MapMethod;
use crate::pass::Pass;
use crate::passes::{BridgeDecomposition, MappingVerification, PlacementPass, RoutingPass};
use crate::placement::Placement;
use crate::placer::SatPlacementMode;
use crate::property::PropertySet;
use crate::router::RouterConfig;

/// Manages and executes a sequence of mapping passes.
pub struct PassManager {
    /// The passes to execute, in order.
    passes: Vec<Box<dyn Pass>>,
}

impl PassManager {
    /// Create a new empty pass manager.
    pub fn new() -> Self {
        Self { passes: vec![] }
    }

    /// Add a pass to the manager.
    pub fn add_pass(&mut self, pass: impl Pass + 'static) {
        self.passes.push(Box::new(pass));
    }

    /// Names of the passes, in execution order.
    pub fn pass_names(&self) -> Vec<&str> {
        self.passes.iter().map(|p| p.name()).collect()
    }

    /// Run all passes on the given DAG.
    #[instrument(skip(self, dag, properties))]
    pub fn run(&self, dag: &mut CircuitDag, properties: &mut PropertySet) -> MapResult<()> {
        info!(
            "Running pass manager with {} passes on circuit with {} qubits",
            self.passes.len(),
            dag.num_qubits()
        );

        for pass in &self.passes {
            properties.cancel.check()?;
            if pass.should_run(dag, properties) {
                debug!("Running pass: {}", pass.name());
                pass.run(dag, properties)?;
                debug!("Pass {} completed, ops: {}", pass.name(), dag.num_ops());
            } else {
                debug!("Skipping pass: {}", pass.name());
            }
        }

        info!(
            "Pass manager completed, swaps: {}, depth: {}, ops: {}",
            properties.swaps.len(),
            dag.depth(),
            dag.num_ops()
        );

        Ok(())
    }

    /// Get the number of passes.
    pub fn len(&self) -> usize {
        self.passes.len()
    }

    /// Check if the manager has no passes.
    pub fn is_empty(&self) -> bool {
        self.passes.is_empty()
    }
}

impl Default for PassManager {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for the standard placement, routing and checking pipeline.
pub struct PassManagerBuilder {
    method: MapMethod,
    sat_mode: SatPlacementMode,
    verify: bool,
    decompose_bridges: bool,
    properties: PropertySet,
}

impl PassManagerBuilder {
    /// Create a new builder with default settings.
    pub fn new() -> Self {
        Self {
            method: MapMethod::default(),
            sat_mode: SatPlacementMode::default(),
            verify: false,
            decompose_bridges: false,
            properties: PropertySet::new(),
        }
    }

    /// Set the target device.
    #[must_use]
    pub fn with_device(mut self, device: Device) -> Self {
        self.properties.device = Some(device);
        self
    }

    /// Choose the placement and routing combination.
    #[must_use]
    pub fn with_method(mut self, method: MapMethod) -> Self {
        self.method = method;
        self
    }

    /// Set the router configuration.
    #[must_use]
    pub fn with_config(mut self, config: RouterConfig) -> Self {
        self.properties.router_config = config;
        self
    }

    /// Set the SAT placement strategy used by [`MapMethod::Sat`].
    #[must_use]
    pub fn with_sat_mode(mut self, mode: SatPlacementMode) -> Self {
        self.sat_mode = mode;
        self
    }

    /// Start routing from `placement`; the method's placer is skipped.
    #[must_use]
    pub fn with_placement(mut self, placement: Placement) -> Self {
        self.properties.init_placement = Some(placement);
        self
    }

    /// Append a [`MappingVerification`] pass.
    #[must_use]
    pub fn with_verification(mut self, verify: bool) -> Self {
        self.verify = verify;
        self
    }

    /// Append a [`BridgeDecomposition`] pass.
    #[must_use]
    pub fn with_bridge_decomposition(mut self, decompose: bool) -> Self {
        self.decompose_bridges = decompose;
        self
    }

    /// Share `cancel` with every pass.
    #[must_use]
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.properties.cancel = cancel;
        self
    }

    /// Build the pass manager and return it with the properties.
    pub fn build(self) -> (PassManager, PropertySet) {
        let mut pm = PassManager::new();
        let config = &self.properties.router_config;

        if let Some(placer) = self
            .method
            .placer(config, self.sat_mode, &self.properties.cancel)
        {
            pm.add_pass(PlacementPass::boxed(placer));
        }
        pm.add_pass(RoutingPass::boxed(self.method.router(config)));

        if self.decompose_bridges {
            pm.add_pass(BridgeDecomposition);
        }
        if self.verify {
            pm.add_pass(MappingVerification);
        }

        (pm, self.properties)
    }
}

impl Default for PassManagerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::MapError;
    use qroute_ir::{Circuit, CircuitLevel, QubitId};

    #[test]
    fn test_empty_pass_manager() {
        let pm = PassManager::new();
        assert!(pm.is_empty());
        assert_eq!(pm.len(), 0);
    }

    #[test]
    fn test_builder_pass_order() {
        let (pm, _) = PassManagerBuilder::new()
            .with_device(Device::path(3))
            .with_method(MapMethod::Bridge)
            .with_bridge_decomposition(true)
            .with_verification(true)
            .build();
        assert_eq!(
            pm.pass_names(),
            vec!["bridge", "BridgeDecomposition", "MappingVerification"]
        );

        let (pm, _) = PassManagerBuilder::new()
            .with_method(MapMethod::Sat)
            .build();
        assert_eq!(pm.len(), 2);
    }

    #[test]
    fn test_bridge_pipeline() {
        let mut circuit = Circuit::with_size("triangle", 3, 0);
        circuit
            .cx(QubitId(0), QubitId(1))
            .unwrap()
            .cx(QubitId(1), QubitId(2))
            .unwrap()
            .cx(QubitId(0), QubitId(2))
            .unwrap();

        let (pm, mut props) = PassManagerBuilder::new()
            .with_device(Device::path(3))
            .with_method(MapMethod::Bridge)
            .with_bridge_decomposition(true)
            .with_verification(true)
            .build();

        let mut dag = circuit.into_dag();
        pm.run(&mut dag, &mut props).unwrap();

        assert_eq!(dag.level(), CircuitLevel::Physical);
        assert!(dag.topological_ops().all(|(_, inst)| !inst.is_bridge()));
        assert!(props.swaps.is_empty());
        // Two adjacent CX plus one bridge over a length-2 path.
        assert_eq!(dag.num_two_qubit_gates(), 6);
    }

    #[test]
    fn test_sabre_pipeline_with_given_placement() {
        let mut circuit = Circuit::with_size("c", 4, 0);
        circuit.cx(QubitId(0), QubitId(2)).unwrap();

        let (pm, mut props) = PassManagerBuilder::new()
            .with_device(Device::ring(4))
            .with_placement(Placement::identity(4))
            .with_verification(true)
            .build();

        let mut dag = circuit.into_dag();
        pm.run(&mut dag, &mut props).unwrap();
        assert_eq!(props.swaps.len(), 1);
    }

    #[test]
    fn test_cancelled_pipeline() {
        let cancel = CancellationToken::new();
        let (pm, mut props) = PassManagerBuilder::new()
            .with_device(Device::path(2))
            .with_cancellation(cancel.clone())
            .build();
        cancel.cancel();

        let mut dag = CircuitDag::with_size(2, 0);
        assert!(matches!(
            pm.run(&mut dag, &mut props),
            Err(MapError::Cancelled)
        ));
    }
}
