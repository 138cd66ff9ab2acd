//! Linear path-sum check.
//!
//! Each wire carries the set of input labels XORed into it. Two-qubit
//! gates act as CX from their first onto their last qubit, SWAP exchanges
//! the sets and single-qubit gates are ignored. Routing only inserts SWAPs
//! and Bridges, so the sets of the original circuit must reappear on the
//! mapped circuit's wires, permuted by the final placement.

use qroute_ir::{CircuitDag, Instruction};
use tracing::debug;

use crate::error::{MapError, MapResult};
use crate::placement::Placement;

/// A set of input labels, stored as a bit set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct LabelSet(Vec<u64>);

impl LabelSet {
    fn singleton(label: usize) -> Self {
        let mut words = vec![0; label / 64 + 1];
        words[label / 64] |= 1 << (label % 64);
        Self(words)
    }

    fn xor_assign(&mut self, other: &LabelSet) {
        if self.0.len() < other.0.len() {
            self.0.resize(other.0.len(), 0);
        }
        for (a, b) in self.0.iter_mut().zip(&other.0) {
            *a ^= b;
        }
        while self.0.last() == Some(&0) {
            self.0.pop();
        }
    }
}

fn propagate(wires: &mut [LabelSet], dag: &CircuitDag) -> MapResult<()> {
    for (_, inst) in dag.topological_ops() {
        apply(wires, inst)?;
    }
    Ok(())
}

fn apply(wires: &mut [LabelSet], inst: &Instruction) -> MapResult<()> {
    if !inst.is_gate() || inst.num_qubits() < 2 {
        return Ok(());
    }
    if inst.num_qubits() > 2 {
        return Err(MapError::UnsupportedInstruction {
            name: inst.name().to_string(),
            num_qubits: inst.num_qubits(),
            reason: "path sums track two-qubit gates only".into(),
        });
    }
    let (a, b) = (inst.qubits[0].index(), inst.qubits[1].index());
    if a >= wires.len() || b >= wires.len() {
        return Err(MapError::MappingViolation(format!(
            "{} acts outside the register",
            inst.name()
        )));
    }
    if inst.is_swap() {
        wires.swap(a, b);
    } else {
        let control = wires[a].clone();
        wires[b].xor_assign(&control);
    }
    Ok(())
}

/// Check that `mapped` realises the same linear reversible function as
/// `original`, given where the virtual qubits start and end.
pub fn check_pathsum(
    original: &CircuitDag,
    mapped: &CircuitDag,
    init: &Placement,
    fin: &Placement,
) -> MapResult<()> {
    let num_v = original.num_qubits();
    let mut expected: Vec<LabelSet> = (0..num_v).map(LabelSet::singleton).collect();
    propagate(&mut expected, original)?;

    let mut actual: Vec<LabelSet> = (0..mapped.num_qubits() as u32)
        .map(|phy| {
            init.phy_to_v(phy)
                .map(|v| LabelSet::singleton(v.index()))
                .unwrap_or_default()
        })
        .collect();
    propagate(&mut actual, mapped)?;

    for (v, want) in expected.iter().enumerate() {
        #[allow(clippy::cast_possible_truncation)]
        let qubit = qroute_ir::QubitId(v as u32);
        let phy = fin.v_to_phy(qubit).ok_or(MapError::MissingPlacement)?;
        let got = actual.get(phy as usize).ok_or(MapError::InvalidQubit {
            qubit: phy,
            num_qubits: mapped.num_qubits() as u32,
        })?;
        if got != want {
            return Err(MapError::MappingViolation(format!(
                "{qubit} ends on physical qubit {phy} with a different path sum"
            )));
        }
    }
    debug!(num_v, "path-sum check passed");
    Ok(())
}
