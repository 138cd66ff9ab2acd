//! Routing pass.

use qroute_ir::CircuitDag;
use tracing::info;

use crate::error::{MapError, MapResult};
use crate::pass::{Pass, PassKind};
use crate::placer::empty_placement;
use crate::property::{OriginalCircuit, PropertySet};
use crate::router::Router;

/// Routes the DAG with a [`Router`] and replaces it with the physical
/// circuit.
///
/// Starts from the initial placement in the property set, or from an empty
/// one so that every qubit is placed on demand. The logical DAG is kept as
/// an [`OriginalCircuit`] property.
pub struct RoutingPass {
    router: Box<dyn Router + Send + Sync>,
}

impl RoutingPass {
    /// Wrap a router.
    pub fn new(router: impl Router + Send + Sync + 'static) -> Self {
        Self::boxed(Box::new(router))
    }

    /// Wrap an already boxed router.
    pub fn boxed(router: Box<dyn Router + Send + Sync>) -> Self {
        Self { router }
    }
}

impl Pass for RoutingPass {
    fn name(&self) -> &str {
        self.router.name()
    }

    fn kind(&self) -> PassKind {
        PassKind::Transformation
    }

    fn run(&self, dag: &mut CircuitDag, properties: &mut PropertySet) -> MapResult<()> {
        let device = properties.device.as_ref().ok_or(MapError::MissingDevice)?;
        let placement = match properties.init_placement.take() {
            Some(placement) => placement,
            None => empty_placement(dag, device)?,
        };

        let result = self
            .router
            .route(dag, device, placement, &properties.cancel)?;
        info!(
            router = self.router.name(),
            swaps = result.num_swaps(),
            "routing pass finished"
        );

        let original = std::mem::replace(dag, result.circuit);
        properties.insert(OriginalCircuit(original));
        properties.init_placement = Some(result.init_placement);
        properties.final_placement = Some(result.final_placement);
        properties.swaps = result.swaps;
        Ok(())
    }
}
