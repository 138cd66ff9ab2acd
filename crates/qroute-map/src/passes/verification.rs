//! Mapping verification pass.

use qroute_ir::CircuitDag;
use tracing::info;

use crate::error::{MapError, MapResult};
use crate::pass::{Pass, PassKind};
use crate::property::{OriginalCircuit, PropertySet};
use crate::verify::verify_mapping;

/// Checks the routed DAG against the circuit the routing pass replaced.
///
/// Fails with `MappingViolation` if a gate acts on unconnected qubits or
/// the routed circuit computes something else.
pub struct MappingVerification;

impl Pass for MappingVerification {
    fn name(&self) -> &'static str {
        "MappingVerification"
    }

    fn kind(&self) -> PassKind {
        PassKind::Analysis
    }

    fn run(&self, dag: &mut CircuitDag, properties: &mut PropertySet) -> MapResult<()> {
        let device = properties.device.as_ref().ok_or(MapError::MissingDevice)?;
        let original = properties
            .get::<OriginalCircuit>()
            .ok_or_else(|| MapError::InvalidConfiguration("verification runs after routing".into()))?;
        let init = properties
            .init_placement
            .as_ref()
            .ok_or(MapError::MissingPlacement)?;
        let fin = properties
            .final_placement
            .as_ref()
            .ok_or(MapError::MissingPlacement)?;

        verify_mapping(&original.0, dag, init, fin, device)?;
        info!(ops = dag.num_ops(), "mapping verified");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::Device;
    use crate::placement::Placement;
    use qroute_ir::{Circuit, QubitId};

    fn props_for(original: &Circuit, init: Placement, fin: Placement) -> PropertySet {
        let mut props = PropertySet::new().with_device(Device::path(3));
        props.insert(OriginalCircuit(original.dag().clone()));
        props.init_placement = Some(init);
        props.final_placement = Some(fin);
        props
    }

    #[test]
    fn test_accepts_correct_routing() {
        let mut original = Circuit::with_size("o", 3, 0);
        original.cx(QubitId(0), QubitId(2)).unwrap();

        // SWAP(1, 2) moves virtual 2 next to virtual 0.
        let mut routed = Circuit::with_size("r", 3, 0);
        routed
            .swap(QubitId(1), QubitId(2))
            .unwrap()
            .cx(QubitId(0), QubitId(1))
            .unwrap();
        let fin = Placement::from_v_to_phy(&[0, 2, 1], 3).unwrap();
        let mut props = props_for(&original, Placement::identity(3), fin);

        let mut dag = routed.into_dag();
        MappingVerification.run(&mut dag, &mut props).unwrap();
    }

    #[test]
    fn test_rejects_wrong_final_placement() {
        let mut original = Circuit::with_size("o", 3, 0);
        original.cx(QubitId(0), QubitId(2)).unwrap();

        let mut routed = Circuit::with_size("r", 3, 0);
        routed
            .swap(QubitId(1), QubitId(2))
            .unwrap()
            .cx(QubitId(0), QubitId(1))
            .unwrap();
        let mut props = props_for(&original, Placement::identity(3), Placement::identity(3));

        let mut dag = routed.into_dag();
        assert!(matches!(
            MappingVerification.run(&mut dag, &mut props),
            Err(MapError::MappingViolation(_))
        ));
    }

    #[test]
    fn test_requires_routing_first() {
        let mut dag = CircuitDag::with_size(2, 0);
        let mut props = PropertySet::new().with_device(Device::path(2));
        assert!(matches!(
            MappingVerification.run(&mut dag, &mut props),
            Err(MapError::InvalidConfiguration(_))
        ));
    }
}
