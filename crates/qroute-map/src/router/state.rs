//! Mutable state shared by all routers: the live placement, the output
//! circuit, and single-qubit instructions waiting for their qubit to be
//! placed.

use qroute_ir::{CircuitDag, CircuitLevel, Instruction, QubitId, StandardGate};
use tracing::trace;

use crate::device::Device;
use crate::error::{MapError, MapResult};
use crate::placement::Placement;

pub(crate) struct MapState<'d> {
    device: &'d Device,
    placement: Placement,
    /// `None` when only the placement evolution matters.
    output: Option<CircuitDag>,
    /// Per virtual qubit, instructions deferred until it is placed.
    delayed: Vec<Vec<Instruction>>,
    swaps: Vec<(u32, u32)>,
}

impl<'d> MapState<'d> {
    /// State for routing `dag` onto `device` starting from `placement`.
    pub fn new(
        dag: &CircuitDag,
        device: &'d Device,
        placement: Placement,
        emit: bool,
    ) -> MapResult<Self> {
        let num_v = dag.num_qubits();
        if num_v > device.num_qubits() as usize {
            return Err(MapError::CircuitTooLarge {
                required: num_v,
                available: device.num_qubits(),
            });
        }
        if placement.num_v() as usize != num_v || placement.num_phy() != device.num_qubits() {
            return Err(MapError::InvalidConfiguration(format!(
                "placement is {}x{} but circuit has {} qubits and device {}",
                placement.num_v(),
                placement.num_phy(),
                num_v,
                device.num_qubits()
            )));
        }

        #[allow(clippy::cast_possible_truncation)]
        let output = emit.then(|| {
            let mut out = CircuitDag::with_size(device.num_qubits(), dag.num_clbits() as u32);
            out.set_level(CircuitLevel::Physical);
            out
        });

        Ok(Self {
            device,
            placement,
            output,
            delayed: vec![Vec::new(); num_v],
            swaps: Vec::new(),
        })
    }

    pub fn device(&self) -> &'d Device {
        self.device
    }

    pub fn placement(&self) -> &Placement {
        &self.placement
    }

    pub fn num_swaps(&self) -> usize {
        self.swaps.len()
    }

    fn emit(&mut self, inst: &Instruction) -> MapResult<()> {
        let Some(output) = self.output.as_mut() else {
            return Ok(());
        };
        let qubits = inst
            .qubits
            .iter()
            .map(|&v| {
                self.placement
                    .v_to_phy(v)
                    .map(QubitId)
                    .ok_or(MapError::MissingPlacement)
            })
            .collect::<MapResult<Vec<_>>>()?;
        output.apply(Instruction {
            kind: inst.kind.clone(),
            qubits,
            clbits: inst.clbits.clone(),
        })?;
        Ok(())
    }

    /// Emit a gate directly on physical qubits.
    pub fn emit_physical(&mut self, gate: StandardGate, p0: u32, p1: u32) -> MapResult<()> {
        if let Some(output) = self.output.as_mut() {
            output.apply(Instruction::two_qubit_gate(gate, QubitId(p0), QubitId(p1)))?;
        }
        Ok(())
    }

    /// Insert a SWAP between two adjacent physical qubits.
    pub fn add_swap(&mut self, p0: u32, p1: u32) -> MapResult<()> {
        if !self.device.are_connected(p0, p1) {
            return Err(MapError::MappingViolation(format!(
                "SWAP on unconnected qubits {p0} and {p1}"
            )));
        }
        self.emit_physical(StandardGate::Swap, p0, p1)?;
        self.placement.swap_qubits(p0, p1)?;
        self.swaps.push((p0, p1));
        Ok(())
    }

    fn map(&mut self, v: QubitId, phy: u32) -> MapResult<()> {
        self.placement.map_v_phy(v, phy)?;
        trace!(%v, phy, "placed virtual qubit");
        let pending = std::mem::take(&mut self.delayed[v.index()]);
        for inst in &pending {
            self.emit(inst)?;
        }
        Ok(())
    }

    /// Place `v` on the free physical qubit closest to `partner`, or on the
    /// free qubit with the most neighbours when there is no partner.
    pub fn place_one(&mut self, v: QubitId, partner: Option<u32>) -> MapResult<u32> {
        let mut best: Option<(u32, u32)> = None;
        let mut first_free = None;
        for phy in self.placement.free_phy() {
            first_free.get_or_insert(phy);
            let key = match partner {
                Some(p) => match self.device.try_distance(p, phy) {
                    Some(d) => d,
                    None => continue,
                },
                None => u32::MAX - self.device.degree(phy) as u32,
            };
            if best.is_none_or(|(k, _)| key < k) {
                best = Some((key, phy));
            }
        }
        let phy = match (best, first_free, partner) {
            (Some((_, phy)), _, _) => phy,
            (None, Some(free), Some(from)) => {
                return Err(MapError::Unreachable { from, to: free });
            }
            _ => {
                return Err(MapError::CircuitTooLarge {
                    required: self.placement.num_v() as usize,
                    available: self.placement.num_phy(),
                });
            }
        };
        self.map(v, phy)?;
        Ok(phy)
    }

    /// Place two unmapped virtual qubits on the closest pair of free qubits.
    pub fn place_two(&mut self, v0: QubitId, v1: QubitId) -> MapResult<(u32, u32)> {
        let free: Vec<u32> = self.placement.free_phy().collect();
        let mut best: Option<(u32, u32, u32)> = None;
        for (i, &a) in free.iter().enumerate() {
            for &b in &free[i + 1..] {
                if let Some(d) = self.device.try_distance(a, b) {
                    if best.is_none_or(|(bd, _, _)| d < bd) {
                        best = Some((d, a, b));
                    }
                }
                if best.is_some_and(|(bd, _, _)| bd == 1) {
                    break;
                }
            }
            if best.is_some_and(|(bd, _, _)| bd == 1) {
                break;
            }
        }
        let Some((_, a, b)) = best else {
            return Err(MapError::CircuitTooLarge {
                required: self.placement.num_v() as usize,
                available: self.placement.num_phy(),
            });
        };
        self.map(v0, a)?;
        self.map(v1, b)?;
        Ok((a, b))
    }

    /// Physical qubits of a two-qubit gate, placing its qubits if needed.
    pub fn ensure_pair(&mut self, v0: QubitId, v1: QubitId) -> MapResult<(u32, u32)> {
        match (self.placement.v_to_phy(v0), self.placement.v_to_phy(v1)) {
            (Some(p0), Some(p1)) => Ok((p0, p1)),
            (Some(p0), None) => Ok((p0, self.place_one(v1, Some(p0))?)),
            (None, Some(p1)) => Ok((self.place_one(v0, Some(p1))?, p1)),
            (None, None) => self.place_two(v0, v1),
        }
    }

    /// Emit `inst` if the current placement allows it.
    ///
    /// Returns `false` only for a two-qubit gate on non-adjacent physical
    /// qubits. Single-qubit instructions on an unplaced qubit are deferred
    /// until the qubit is placed; other instructions place their qubits.
    pub fn try_add(&mut self, inst: &Instruction) -> MapResult<bool> {
        if inst.is_gate() && inst.num_qubits() > 2 {
            return Err(MapError::UnsupportedInstruction {
                name: inst.name().to_string(),
                num_qubits: inst.num_qubits(),
                reason: "decompose gates on more than two qubits before routing".into(),
            });
        }

        if inst.is_two_qubit_gate() {
            let (p0, p1) = self.ensure_pair(inst.qubits[0], inst.qubits[1])?;
            if !self.device.are_connected(p0, p1) {
                return Ok(false);
            }
            self.emit(inst)?;
            return Ok(true);
        }

        if let [v] = inst.qubits[..] {
            if inst.clbits.is_empty() && self.placement.v_to_phy(v).is_none() {
                self.delayed[v.index()].push(inst.clone());
                return Ok(true);
            }
        }

        self.place_all(&inst.qubits)?;
        self.emit(inst)?;
        Ok(true)
    }

    fn place_all(&mut self, qubits: &[QubitId]) -> MapResult<()> {
        let anchor = qubits.iter().find_map(|&v| self.placement.v_to_phy(v));
        for &v in qubits {
            if self.placement.v_to_phy(v).is_none() {
                let partner = anchor.or_else(|| {
                    qubits.iter().find_map(|&q| self.placement.v_to_phy(q))
                });
                self.place_one(v, partner)?;
            }
        }
        Ok(())
    }

    /// Place every remaining virtual qubit and flush deferred instructions.
    pub fn finish(&mut self) -> MapResult<()> {
        let unmapped: Vec<QubitId> = self.placement.unmapped_v().collect();
        for v in unmapped {
            let anchor = self.placement.free_phy().next().ok_or(MapError::CircuitTooLarge {
                required: self.placement.num_v() as usize,
                available: self.placement.num_phy(),
            })?;
            self.map(v, anchor)?;
        }
        Ok(())
    }

    /// Final placement, the placement at the start implied by undoing every
    /// SWAP, the output circuit and the SWAP list.
    pub fn into_parts(self) -> MapResult<(Option<CircuitDag>, Placement, Placement, Vec<(u32, u32)>)> {
        let mut init = self.placement.clone();
        for &(p0, p1) in self.swaps.iter().rev() {
            init.swap_qubits(p0, p1)?;
        }
        Ok((self.output, init, self.placement, self.swaps))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use qroute_ir::Circuit;

    fn empty_state<'d>(dag: &CircuitDag, device: &'d Device) -> MapState<'d> {
        let placement = Placement::new(dag.num_qubits() as u32, device.num_qubits());
        MapState::new(dag, device, placement, true).unwrap()
    }

    #[test]
    fn test_rejects_oversized_circuit() {
        let c = Circuit::with_size("big", 5, 0);
        let device = Device::path(3);
        let placement = Placement::new(5, 3);
        assert!(matches!(
            MapState::new(c.dag(), &device, placement, true),
            Err(MapError::CircuitTooLarge { required: 5, available: 3 })
        ));
    }

    #[test]
    fn test_place_two_picks_adjacent_pair() {
        let c = Circuit::with_size("c", 2, 0);
        let device = Device::star(4);
        let mut state = empty_state(c.dag(), &device);
        let (a, b) = state.place_two(QubitId(0), QubitId(1)).unwrap();
        assert!(device.are_connected(a, b));
        assert_eq!((a, b), (0, 1));
    }

    #[test]
    fn test_place_one_nearest_to_partner() {
        let c = Circuit::with_size("c", 2, 0);
        let device = Device::path(5);
        let mut state = empty_state(c.dag(), &device);
        state.map(QubitId(0), 3).unwrap();
        assert_eq!(state.place_one(QubitId(1), Some(3)).unwrap(), 2);
    }

    #[test]
    fn test_delayed_instruction_flushes_on_placement() {
        let mut c = Circuit::with_size("c", 2, 0);
        c.h(QubitId(0)).unwrap().cx(QubitId(0), QubitId(1)).unwrap();
        let device = Device::path(2);
        let mut state = empty_state(c.dag(), &device);

        let ops: Vec<Instruction> = c.dag().topological_ops().map(|(_, i)| i.clone()).collect();
        assert!(state.try_add(&ops[0]).unwrap());
        assert!(state.try_add(&ops[1]).unwrap());
        state.finish().unwrap();

        let (out, init, fin, swaps) = state.into_parts().unwrap();
        let out = out.unwrap();
        let names: Vec<_> = out.topological_ops().map(|(_, i)| i.name().to_string()).collect();
        assert_eq!(names, vec!["h", "cx"]);
        assert!(swaps.is_empty());
        assert_eq!(init, fin);
    }

    #[test]
    fn test_blocked_gate_and_swap() {
        let mut c = Circuit::with_size("c", 3, 0);
        c.cx(QubitId(0), QubitId(2)).unwrap();
        let device = Device::path(3);
        let mut state = MapState::new(c.dag(), &device, Placement::identity(3), true).unwrap();
        let inst = c.dag().topological_ops().next().unwrap().1.clone();

        assert!(!state.try_add(&inst).unwrap());
        state.add_swap(1, 2).unwrap();
        assert!(state.try_add(&inst).unwrap());

        let (_, init, fin, swaps) = state.into_parts().unwrap();
        assert_eq!(swaps, vec![(1, 2)]);
        assert_eq!(init, Placement::identity(3));
        assert_eq!(fin.v_to_phy(QubitId(2)), Some(1));
    }

    #[test]
    fn test_three_qubit_gate_rejected() {
        let mut c = Circuit::with_size("c", 3, 0);
        c.ccx(QubitId(0), QubitId(1), QubitId(2)).unwrap();
        let device = Device::complete(3);
        let mut state = empty_state(c.dag(), &device);
        let inst = c.dag().topological_ops().next().unwrap().1.clone();
        assert!(matches!(
            state.try_add(&inst),
            Err(MapError::UnsupportedInstruction { num_qubits: 3, .. })
        ));
    }

    #[test]
    fn test_swap_on_unconnected_pair_rejected() {
        let c = Circuit::with_size("c", 3, 0);
        let device = Device::path(3);
        let mut state = MapState::new(c.dag(), &device, Placement::identity(3), true).unwrap();
        assert!(state.add_swap(0, 2).is_err());
    }
}
