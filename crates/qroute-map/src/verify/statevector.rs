//! Exact equivalence check by state-vector simulation.

use num_complex::Complex64;
use qroute_ir::{CircuitDag, Instruction, InstructionKind, StandardGate};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::debug;

use super::unitary::{EPSILON, Unitary2x2};
use crate::error::{MapError, MapResult};
use crate::placement::Placement;

/// Largest register the simulator accepts.
pub const MAX_SIMULATED_QUBITS: usize = 12;

const INPUT_SEED: u64 = 0x5EED_0F_C0DE;

/// Dense state of `n` qubits; qubit `q` is bit `q` of the basis index.
#[derive(Debug, Clone)]
pub struct StateVector {
    amps: Vec<Complex64>,
    num_qubits: usize,
}

impl StateVector {
    /// Product state from per-qubit `(|0⟩, |1⟩)` amplitudes.
    pub fn product(qubits: &[(Complex64, Complex64)]) -> MapResult<Self> {
        let n = qubits.len();
        if n > MAX_SIMULATED_QUBITS {
            return Err(MapError::InvalidConfiguration(format!(
                "cannot simulate {n} qubits (limit {MAX_SIMULATED_QUBITS})"
            )));
        }
        let amps = (0..1usize << n)
            .map(|index| {
                qubits
                    .iter()
                    .enumerate()
                    .map(|(q, &(zero, one))| if index >> q & 1 == 1 { one } else { zero })
                    .product()
            })
            .collect();
        Ok(Self {
            amps,
            num_qubits: n,
        })
    }

    /// Amplitude of a basis state.
    pub fn amplitude(&self, index: usize) -> Complex64 {
        self.amps[index]
    }

    /// Number of qubits.
    pub fn num_qubits(&self) -> usize {
        self.num_qubits
    }

    fn apply_controlled(&mut self, controls: &[usize], target: usize, u: &Unitary2x2) {
        let control_mask = controls.iter().fold(0usize, |m, &q| m | 1 << q);
        let bit = 1usize << target;
        for index in 0..self.amps.len() {
            if index & bit != 0 || index & control_mask != control_mask {
                continue;
            }
            let (a0, a1) = u.apply(self.amps[index], self.amps[index | bit]);
            self.amps[index] = a0;
            self.amps[index | bit] = a1;
        }
    }

    fn apply_swap(&mut self, a: usize, b: usize) {
        let (ba, bb) = (1usize << a, 1usize << b);
        for index in 0..self.amps.len() {
            if index & ba != 0 && index & bb == 0 {
                self.amps.swap(index, index ^ ba ^ bb);
            }
        }
    }

    /// Apply the unitary part of `inst`.
    ///
    /// Measurements, resets, barriers and delays are skipped, so two
    /// circuits are compared on their gates only.
    pub fn apply(&mut self, inst: &Instruction) -> MapResult<()> {
        let InstructionKind::Gate(gate) = &inst.kind else {
            return Ok(());
        };
        let Some(standard) = gate.as_standard() else {
            return Err(MapError::UnsupportedInstruction {
                name: inst.name().to_string(),
                num_qubits: inst.num_qubits(),
                reason: "custom gates have no known matrix".into(),
            });
        };
        let qubits: Vec<usize> = inst.qubits.iter().map(|q| q.index()).collect();
        if let Some(&q) = qubits.iter().find(|&&q| q >= self.num_qubits) {
            return Err(MapError::InvalidQubit {
                qubit: q as u32,
                num_qubits: self.num_qubits as u32,
            });
        }
        if standard == StandardGate::Swap {
            self.apply_swap(qubits[0], qubits[1]);
            return Ok(());
        }
        let Some(u) = Unitary2x2::for_gate(standard) else {
            return Ok(());
        };
        if let Some((&target, controls)) = qubits.split_last() {
            self.apply_controlled(controls, target, &u);
        }
        Ok(())
    }

    /// Run every instruction of `dag`.
    pub fn run(&mut self, dag: &CircuitDag) -> MapResult<()> {
        for (_, inst) in dag.topological_ops() {
            self.apply(inst)?;
        }
        Ok(())
    }
}

/// Check that `mapped` computes what `original` computes.
///
/// A pseudo-random product state is prepared on the virtual qubits, placed
/// through `init` (free physical qubits start in `|0⟩`), and both circuits
/// are simulated. Every virtual basis amplitude of the original result
/// must match the mapped result read back through `fin`, with all free
/// physical qubits back in `|0⟩`.
#[allow(clippy::cast_possible_truncation)]
pub fn check_statevector(
    original: &CircuitDag,
    mapped: &CircuitDag,
    init: &Placement,
    fin: &Placement,
) -> MapResult<()> {
    let num_v = original.num_qubits();
    let num_phy = mapped.num_qubits();
    let init_v = init.to_v_to_phy_vec()?;
    let fin_v = fin.to_v_to_phy_vec()?;
    if init_v.len() != num_v || fin_v.len() != num_v {
        return Err(MapError::MissingPlacement);
    }

    let mut rng = StdRng::seed_from_u64(INPUT_SEED);
    let inputs: Vec<(Complex64, Complex64)> = (0..num_v)
        .map(|_| {
            let theta: f64 = rng.gen_range(0.0..std::f64::consts::PI);
            let phi: f64 = rng.gen_range(0.0..std::f64::consts::TAU);
            (
                Complex64::new((theta / 2.0).cos(), 0.0),
                Complex64::from_polar((theta / 2.0).sin(), phi),
            )
        })
        .collect();

    let mut expected = StateVector::product(&inputs)?;
    expected.run(original)?;

    let zero = (Complex64::new(1.0, 0.0), Complex64::new(0.0, 0.0));
    let mut placed = vec![zero; num_phy];
    for (v, &phy) in init_v.iter().enumerate() {
        let slot = placed.get_mut(phy as usize).ok_or(MapError::InvalidQubit {
            qubit: phy,
            num_qubits: num_phy as u32,
        })?;
        *slot = inputs[v];
    }
    let mut actual = StateVector::product(&placed)?;
    actual.run(mapped)?;

    let mut norm = 0.0;
    for index in 0..1usize << num_v {
        let phys_index = fin_v
            .iter()
            .enumerate()
            .filter(|&(v, _)| index >> v & 1 == 1)
            .fold(0usize, |acc, (_, &phy)| acc | 1 << phy);
        let (want, got) = (expected.amplitude(index), actual.amplitude(phys_index));
        if (want - got).norm() > EPSILON {
            return Err(MapError::MappingViolation(format!(
                "amplitude of basis state {index:#b} differs: expected {want}, got {got}"
            )));
        }
        norm += got.norm_sqr();
    }
    if (norm - 1.0).abs() > EPSILON {
        return Err(MapError::MappingViolation(
            "free physical qubits do not return to |0⟩".into(),
        ));
    }
    debug!(num_v, num_phy, "state-vector check passed");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use qroute_ir::{Circuit, QubitId};

    #[test]
    fn test_bell_state() {
        let mut c = Circuit::with_size("bell", 2, 0);
        c.h(QubitId(0)).unwrap().cx(QubitId(0), QubitId(1)).unwrap();
        let zero = (Complex64::new(1.0, 0.0), Complex64::new(0.0, 0.0));
        let mut state = StateVector::product(&[zero, zero]).unwrap();
        state.run(c.dag()).unwrap();
        let s = std::f64::consts::FRAC_1_SQRT_2;
        assert!((state.amplitude(0b00).re - s).abs() < EPSILON);
        assert!((state.amplitude(0b11).re - s).abs() < EPSILON);
        assert!(state.amplitude(0b01).norm() < EPSILON);
    }

    #[test]
    fn test_swap_routed_equivalence() {
        let mut original = Circuit::with_size("c", 3, 0);
        original.h(QubitId(0)).unwrap().cx(QubitId(0), QubitId(2)).unwrap();

        // Physical: SWAP(1, 2) brings virtual 2 next to 0.
        let mut mapped = Circuit::with_size("m", 3, 0);
        mapped
            .h(QubitId(0))
            .unwrap()
            .swap(QubitId(1), QubitId(2))
            .unwrap()
            .cx(QubitId(0), QubitId(1))
            .unwrap();

        let init = Placement::identity(3);
        let fin = Placement::from_v_to_phy(&[0, 2, 1], 3).unwrap();
        check_statevector(original.dag(), mapped.dag(), &init, &fin).unwrap();

        // Reading back through the initial placement is wrong.
        assert!(check_statevector(original.dag(), mapped.dag(), &init, &init).is_err());
    }

    #[test]
    fn test_too_many_qubits() {
        let zero = (Complex64::new(1.0, 0.0), Complex64::new(0.0, 0.0));
        assert!(StateVector::product(&vec![zero; MAX_SIMULATED_QUBITS + 1]).is_err());
    }
}
