//! Qubit and classical bit identifiers.
//!
//! Virtual (program) qubits and physical (device) qubits share the same
//! representation. Whether a qubit is mapped is expressed with `Option`,
//! never with a sentinel index.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of a qubit within a circuit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QubitId(pub u32);

impl QubitId {
    /// The id as a vector index.
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for QubitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "q{}", self.0)
    }
}

impl From<u32> for QubitId {
    fn from(id: u32) -> Self {
        QubitId(id)
    }
}

/// Identifier of a classical bit within a circuit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClbitId(pub u32);

impl ClbitId {
    /// The id as a vector index.
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for ClbitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "c{}", self.0)
    }
}

impl From<u32> for ClbitId {
    fn from(id: u32) -> Self {
        ClbitId(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        assert_eq!(format!("{}", QubitId(3)), "q3");
        assert_eq!(format!("{}", ClbitId(0)), "c0");
    }

    #[test]
    fn test_ordering_by_index() {
        let mut ids = vec![QubitId(4), QubitId(1), QubitId(3)];
        ids.sort();
        assert_eq!(ids, vec![QubitId(1), QubitId(3), QubitId(4)]);
        assert_eq!(QubitId(7).index(), 7);
    }

    #[test]
    fn test_serde_transparent() {
        let json = serde_json::to_string(&QubitId(5)).unwrap();
        assert_eq!(json, "5");
        let back: QubitId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, QubitId(5));
    }
}
