//! Property set shared between mapping passes.

use std::any::{Any, TypeId};

use qroute_ir::CircuitDag;
use rustc_hash::FxHashMap;

use crate::cancel::CancellationToken;
use crate::device::Device;
use crate::placement::Placement;
use crate::router::RouterConfig;

/// The circuit as it was before routing replaced it.
///
/// Stored by the routing pass so later passes can compare against it.
#[derive(Debug, Clone)]
pub struct OriginalCircuit(pub CircuitDag);

/// Properties shared between passes.
///
/// Placement passes write [`init_placement`](Self::init_placement); the
/// routing pass consumes it and writes both placements and the inserted
/// SWAPs.
///
/// # Example
///
/// ```
/// use qroute_map::{Device, PropertySet};
///
/// let props = PropertySet::new().with_device(Device::ring(4));
/// assert_eq!(props.device.as_ref().map(Device::num_qubits), Some(4));
/// assert!(props.init_placement.is_none());
/// ```
#[derive(Debug, Default)]
pub struct PropertySet {
    /// The target device.
    pub device: Option<Device>,

    /// Where each virtual qubit starts.
    ///
    /// Set by placement passes or by the caller, used by routing.
    pub init_placement: Option<Placement>,

    /// Where each virtual qubit ends after routing.
    pub final_placement: Option<Placement>,

    /// SWAPs inserted by routing, as physical qubit pairs.
    pub swaps: Vec<(u32, u32)>,

    /// Router tuning.
    pub router_config: RouterConfig,

    /// Cancellation flag checked by placement and routing.
    pub cancel: CancellationToken,

    /// Custom properties storage (type-erased).
    custom: FxHashMap<TypeId, Box<dyn Any + Send + Sync>>,
}

impl PropertySet {
    /// Create a new empty property set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the target device.
    #[must_use]
    pub fn with_device(mut self, device: Device) -> Self {
        self.device = Some(device);
        self
    }

    /// Start routing from `placement` instead of running a placer.
    #[must_use]
    pub fn with_placement(mut self, placement: Placement) -> Self {
        self.init_placement = Some(placement);
        self
    }

    /// Set the router configuration.
    #[must_use]
    pub fn with_router_config(mut self, config: RouterConfig) -> Self {
        self.router_config = config;
        self
    }

    /// Share an existing cancellation token.
    #[must_use]
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Insert a custom property.
    pub fn insert<T: Any + Send + Sync>(&mut self, value: T) {
        self.custom.insert(TypeId::of::<T>(), Box::new(value));
    }

    /// Get a custom property.
    pub fn get<T: Any>(&self) -> Option<&T> {
        self.custom
            .get(&TypeId::of::<T>())
            .and_then(|v| v.downcast_ref())
    }

    /// Get a mutable custom property.
    pub fn get_mut<T: Any>(&mut self) -> Option<&mut T> {
        self.custom
            .get_mut(&TypeId::of::<T>())
            .and_then(|v| v.downcast_mut())
    }

    /// Remove a custom property.
    pub fn remove<T: Any>(&mut self) -> Option<T> {
        self.custom
            .remove(&TypeId::of::<T>())
            .and_then(|v| v.downcast().ok())
            .map(|v| *v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq)]
    struct Score(u32);

    #[test]
    fn test_custom_properties() {
        let mut props = PropertySet::new();
        assert!(props.get::<Score>().is_none());

        props.insert(Score(3));
        assert_eq!(props.get::<Score>(), Some(&Score(3)));

        if let Some(score) = props.get_mut::<Score>() {
            score.0 += 1;
        }
        assert_eq!(props.remove::<Score>(), Some(Score(4)));
        assert!(props.get::<Score>().is_none());
    }

    #[test]
    fn test_builders() {
        let cancel = CancellationToken::new();
        let props = PropertySet::new()
            .with_placement(Placement::identity(3))
            .with_cancellation(cancel.clone());
        cancel.cancel();
        assert!(props.cancel.is_cancelled());
        assert_eq!(props.init_placement, Some(Placement::identity(3)));
        assert!(props.device.is_none());
    }
}
