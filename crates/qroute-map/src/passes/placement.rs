//! Initial placement pass.

use qroute_ir::CircuitDag;
use tracing::debug;

use crate::error::{MapError, MapResult};
use crate::pass::{Pass, PassKind};
use crate::placer::Placer;
use crate::property::PropertySet;

/// Runs a [`Placer`] and stores its result as the initial placement.
///
/// Skipped when the property set already carries an initial placement.
pub struct PlacementPass {
    placer: Box<dyn Placer + Send + Sync>,
}

impl PlacementPass {
    /// Wrap a placer.
    pub fn new(placer: impl Placer + Send + Sync + 'static) -> Self {
        Self::boxed(Box::new(placer))
    }

    /// Wrap an already boxed placer.
    pub fn boxed(placer: Box<dyn Placer + Send + Sync>) -> Self {
        Self { placer }
    }
}

impl Pass for PlacementPass {
    fn name(&self) -> &str {
        self.placer.name()
    }

    fn kind(&self) -> PassKind {
        PassKind::Analysis
    }

    fn run(&self, dag: &mut CircuitDag, properties: &mut PropertySet) -> MapResult<()> {
        properties.cancel.check()?;
        let device = properties.device.as_ref().ok_or(MapError::MissingDevice)?;
        let placement = self.placer.place(dag, device)?;
        debug!(
            placer = self.placer.name(),
            mapped = placement.num_mapped(),
            "initial placement chosen"
        );
        properties.init_placement = Some(placement);
        Ok(())
    }

    fn should_run(&self, _dag: &CircuitDag, properties: &PropertySet) -> bool {
        properties.init_placement.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::Device;
    use crate::placement::Placement;
    use crate::placer::{GreedyPlacer, RandomPlacer};
    use qroute_ir::{Circuit, QubitId};

    #[test]
    fn test_placement_pass_stores_placement() {
        let mut c = Circuit::with_size("c", 3, 0);
        c.cx(QubitId(0), QubitId(1)).unwrap();
        let mut dag = c.into_dag();
        let mut props = PropertySet::new().with_device(Device::path(4));

        let pass = PlacementPass::new(GreedyPlacer::new());
        assert!(pass.should_run(&dag, &props));
        pass.run(&mut dag, &mut props).unwrap();

        let placement = props.init_placement.as_ref().unwrap();
        assert!(placement.is_complete());
        assert_eq!(dag.num_ops(), 1);
    }

    #[test]
    fn test_skipped_when_placed() {
        let dag = CircuitDag::with_size(2, 0);
        let props = PropertySet::new()
            .with_device(Device::path(2))
            .with_placement(Placement::identity(2));
        assert!(!PlacementPass::new(RandomPlacer::seeded(1)).should_run(&dag, &props));
    }

    #[test]
    fn test_missing_device() {
        let mut dag = CircuitDag::with_size(2, 0);
        let mut props = PropertySet::new();
        let result = PlacementPass::new(RandomPlacer::seeded(1)).run(&mut dag, &mut props);
        assert!(matches!(result, Err(MapError::MissingDevice)));
    }
}
