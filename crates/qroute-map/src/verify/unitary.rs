//! 2x2 unitaries of the standard gates.
//!
//! Controlled gates are described by the matrix applied to their target;
//! the simulator adds the control condition.

use num_complex::Complex64;
use qroute_ir::StandardGate;
use std::f64::consts::FRAC_1_SQRT_2;

/// Tolerance for floating point comparisons.
pub(crate) const EPSILON: f64 = 1e-9;

#[inline]
fn c(re: f64, im: f64) -> Complex64 {
    Complex64::new(re, im)
}

/// A 2x2 unitary matrix in row-major order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Unitary2x2 {
    /// The matrix elements in row-major order: [[a, b], [c, d]].
    pub data: [Complex64; 4],
}

impl Unitary2x2 {
    /// Create a new 2x2 unitary matrix.
    pub fn new(a: Complex64, b: Complex64, c: Complex64, d: Complex64) -> Self {
        Self { data: [a, b, c, d] }
    }

    fn diagonal(a: Complex64, d: Complex64) -> Self {
        Self::new(a, c(0.0, 0.0), c(0.0, 0.0), d)
    }

    /// Create the identity matrix.
    pub fn identity() -> Self {
        Self::diagonal(c(1.0, 0.0), c(1.0, 0.0))
    }

    /// Create a Hadamard matrix.
    pub fn h() -> Self {
        let s = FRAC_1_SQRT_2;
        Self::new(c(s, 0.0), c(s, 0.0), c(s, 0.0), c(-s, 0.0))
    }

    /// Create a Pauli-X matrix.
    pub fn x() -> Self {
        Self::new(c(0.0, 0.0), c(1.0, 0.0), c(1.0, 0.0), c(0.0, 0.0))
    }

    /// Create a Pauli-Y matrix.
    pub fn y() -> Self {
        Self::new(c(0.0, 0.0), c(0.0, -1.0), c(0.0, 1.0), c(0.0, 0.0))
    }

    /// Create a phase gate P(lambda); Z, S, T and their inverses are special
    /// cases.
    pub fn p(lambda: f64) -> Self {
        Self::diagonal(c(1.0, 0.0), Complex64::from_polar(1.0, lambda))
    }

    /// Create an SX gate (sqrt(X)).
    pub fn sx() -> Self {
        let (p, m) = (c(0.5, 0.5), c(0.5, -0.5));
        Self::new(p, m, m, p)
    }

    /// Create an RX rotation matrix.
    pub fn rx(theta: f64) -> Self {
        let (cos, sin) = ((theta / 2.0).cos(), (theta / 2.0).sin());
        Self::new(c(cos, 0.0), c(0.0, -sin), c(0.0, -sin), c(cos, 0.0))
    }

    /// Create an RY rotation matrix.
    pub fn ry(theta: f64) -> Self {
        let (cos, sin) = ((theta / 2.0).cos(), (theta / 2.0).sin());
        Self::new(c(cos, 0.0), c(-sin, 0.0), c(sin, 0.0), c(cos, 0.0))
    }

    /// Create an RZ rotation matrix.
    pub fn rz(theta: f64) -> Self {
        Self::diagonal(
            Complex64::from_polar(1.0, -theta / 2.0),
            Complex64::from_polar(1.0, theta / 2.0),
        )
    }

    /// The matrix a gate applies to its last qubit, or `None` for SWAP.
    pub fn for_gate(gate: StandardGate) -> Option<Self> {
        use std::f64::consts::{FRAC_PI_2, FRAC_PI_4, PI};
        Some(match gate {
            StandardGate::I => Self::identity(),
            StandardGate::X | StandardGate::CX | StandardGate::Bridge | StandardGate::CCX => {
                Self::x()
            }
            StandardGate::Y | StandardGate::CY => Self::y(),
            StandardGate::Z | StandardGate::CZ => Self::p(PI),
            StandardGate::H => Self::h(),
            StandardGate::S => Self::p(FRAC_PI_2),
            StandardGate::Sdg => Self::p(-FRAC_PI_2),
            StandardGate::T => Self::p(FRAC_PI_4),
            StandardGate::Tdg => Self::p(-FRAC_PI_4),
            StandardGate::SX => Self::sx(),
            StandardGate::SXdg => Self::sx().dagger(),
            StandardGate::Rx(theta) => Self::rx(theta),
            StandardGate::Ry(theta) => Self::ry(theta),
            StandardGate::Rz(theta) => Self::rz(theta),
            StandardGate::P(lambda) | StandardGate::CP(lambda) => Self::p(lambda),
            StandardGate::Swap => return None,
        })
    }

    /// Multiply this matrix by another: self * other.
    #[allow(clippy::many_single_char_names)]
    pub fn mul(&self, other: &Self) -> Self {
        let [a, b, c, d] = self.data;
        let [e, f, g, h] = other.data;
        Self::new(a * e + b * g, a * f + b * h, c * e + d * g, c * f + d * h)
    }

    /// Get the conjugate transpose (dagger).
    pub fn dagger(&self) -> Self {
        let [a, b, c, d] = self.data;
        Self::new(a.conj(), c.conj(), b.conj(), d.conj())
    }

    /// Apply to the amplitude pair `(|0⟩, |1⟩)`.
    #[inline]
    pub fn apply(&self, zero: Complex64, one: Complex64) -> (Complex64, Complex64) {
        let [a, b, c, d] = self.data;
        (a * zero + b * one, c * zero + d * one)
    }

    /// Check if this is approximately identity (up to global phase).
    pub fn is_identity(&self) -> bool {
        let [a, b, c, d] = self.data;
        b.norm() < EPSILON && c.norm() < EPSILON && (a - d).norm() < EPSILON
    }
}
