//! Partial bijection between virtual and physical qubits.

use qroute_ir::QubitId;
use serde::{Deserialize, Serialize};

use crate::error::{MapError, MapResult};

/// Association of virtual (circuit) qubits with physical (device) qubits.
///
/// Both directions are stored and kept consistent: whenever
/// `v_to_phy(v) == Some(p)` then `phy_to_v(p) == Some(v)` and vice versa.
/// Qubits on either side may be unassigned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "PlacementRepr", into = "PlacementRepr")]
pub struct Placement {
    v_to_phy: Vec<Option<u32>>,
    phy_to_v: Vec<Option<QubitId>>,
}

#[derive(Serialize, Deserialize)]
struct PlacementRepr {
    num_phy: u32,
    v_to_phy: Vec<Option<u32>>,
}

impl TryFrom<PlacementRepr> for Placement {
    type Error = MapError;

    #[allow(clippy::cast_possible_truncation)]
    fn try_from(repr: PlacementRepr) -> MapResult<Self> {
        let mut placement = Placement::new(repr.v_to_phy.len() as u32, repr.num_phy);
        for (v, phy) in repr.v_to_phy.into_iter().enumerate() {
            if let Some(phy) = phy {
                placement.map_v_phy(QubitId(v as u32), phy)?;
            }
        }
        Ok(placement)
    }
}

impl From<Placement> for PlacementRepr {
    #[allow(clippy::cast_possible_truncation)]
    fn from(placement: Placement) -> Self {
        PlacementRepr {
            num_phy: placement.phy_to_v.len() as u32,
            v_to_phy: placement.v_to_phy,
        }
    }
}

impl Placement {
    /// An empty placement over `num_v` virtual and `num_phy` physical qubits.
    pub fn new(num_v: u32, num_phy: u32) -> Self {
        Self {
            v_to_phy: vec![None; num_v as usize],
            phy_to_v: vec![None; num_phy as usize],
        }
    }

    /// Virtual qubit `i` on physical qubit `i`.
    pub fn identity(n: u32) -> Self {
        Self {
            v_to_phy: (0..n).map(Some).collect(),
            phy_to_v: (0..n).map(|i| Some(QubitId(i))).collect(),
        }
    }

    /// Build a placement from a dense assignment, `v_to_phy[v]` being the
    /// physical qubit of virtual qubit `v`.
    #[allow(clippy::cast_possible_truncation)]
    pub fn from_v_to_phy(v_to_phy: &[u32], num_phy: u32) -> MapResult<Self> {
        let mut placement = Self::new(v_to_phy.len() as u32, num_phy);
        for (v, &phy) in v_to_phy.iter().enumerate() {
            placement.map_v_phy(QubitId(v as u32), phy)?;
        }
        Ok(placement)
    }

    /// Number of virtual qubits.
    #[inline]
    #[allow(clippy::cast_possible_truncation)]
    pub fn num_v(&self) -> u32 {
        self.v_to_phy.len() as u32
    }

    /// Number of physical qubits.
    #[inline]
    #[allow(clippy::cast_possible_truncation)]
    pub fn num_phy(&self) -> u32 {
        self.phy_to_v.len() as u32
    }

    fn check_v(&self, v: QubitId) -> MapResult<()> {
        if v.index() < self.v_to_phy.len() {
            Ok(())
        } else {
            Err(MapError::InvalidQubit {
                qubit: v.0,
                num_qubits: self.num_v(),
            })
        }
    }

    fn check_phy(&self, phy: u32) -> MapResult<()> {
        if (phy as usize) < self.phy_to_v.len() {
            Ok(())
        } else {
            Err(MapError::InvalidQubit {
                qubit: phy,
                num_qubits: self.num_phy(),
            })
        }
    }

    /// Pair the unmapped virtual qubit `v` with the free physical qubit `phy`.
    pub fn map_v_phy(&mut self, v: QubitId, phy: u32) -> MapResult<()> {
        self.check_v(v)?;
        self.check_phy(phy)?;
        if self.v_to_phy[v.index()].is_some() {
            return Err(MapError::QubitAlreadyMapped(v));
        }
        if self.phy_to_v[phy as usize].is_some() {
            return Err(MapError::PhysicalQubitOccupied(phy));
        }
        self.v_to_phy[v.index()] = Some(phy);
        self.phy_to_v[phy as usize] = Some(v);
        Ok(())
    }

    /// Exchange the virtual qubits held by two physical qubits.
    ///
    /// Either side may be free.
    pub fn swap_qubits(&mut self, phy0: u32, phy1: u32) -> MapResult<()> {
        self.check_phy(phy0)?;
        self.check_phy(phy1)?;
        let (a, b) = (phy0 as usize, phy1 as usize);
        self.phy_to_v.swap(a, b);
        if let Some(v) = self.phy_to_v[a] {
            self.v_to_phy[v.index()] = Some(phy0);
        }
        if let Some(v) = self.phy_to_v[b] {
            self.v_to_phy[v.index()] = Some(phy1);
        }
        Ok(())
    }

    /// Physical qubit of `v`, if mapped.
    #[inline]
    pub fn v_to_phy(&self, v: QubitId) -> Option<u32> {
        self.v_to_phy.get(v.index()).copied().flatten()
    }

    /// Virtual qubit on `phy`, if any.
    #[inline]
    pub fn phy_to_v(&self, phy: u32) -> Option<QubitId> {
        self.phy_to_v.get(phy as usize).copied().flatten()
    }

    /// Snapshot of the virtual-to-physical table.
    #[inline]
    pub fn v_to_phy_slice(&self) -> &[Option<u32>] {
        &self.v_to_phy
    }

    /// Snapshot of the physical-to-virtual table.
    #[inline]
    pub fn phy_to_v_slice(&self) -> &[Option<QubitId>] {
        &self.phy_to_v
    }

    /// Physical qubits without a virtual qubit, ascending.
    #[allow(clippy::cast_possible_truncation)]
    pub fn free_phy(&self) -> impl Iterator<Item = u32> + '_ {
        self.phy_to_v
            .iter()
            .enumerate()
            .filter(|(_, v)| v.is_none())
            .map(|(p, _)| p as u32)
    }

    /// Virtual qubits without a physical qubit, ascending.
    #[allow(clippy::cast_possible_truncation)]
    pub fn unmapped_v(&self) -> impl Iterator<Item = QubitId> + '_ {
        self.v_to_phy
            .iter()
            .enumerate()
            .filter(|(_, p)| p.is_none())
            .map(|(v, _)| QubitId(v as u32))
    }

    /// Number of mapped virtual qubits.
    pub fn num_mapped(&self) -> usize {
        self.v_to_phy.iter().filter(|p| p.is_some()).count()
    }

    /// Whether every virtual qubit is mapped.
    pub fn is_complete(&self) -> bool {
        self.v_to_phy.iter().all(Option::is_some)
    }

    /// Dense virtual-to-physical vector; fails if any virtual qubit is unmapped.
    pub fn to_v_to_phy_vec(&self) -> MapResult<Vec<u32>> {
        self.v_to_phy
            .iter()
            .map(|p| p.ok_or(MapError::MissingPlacement))
            .collect()
    }

    /// Fill every unmapped virtual qubit with the lowest free physical qubit.
    pub fn complete_with_free(&mut self) -> MapResult<()> {
        let unmapped: Vec<_> = self.unmapped_v().collect();
        let free: Vec<_> = self.free_phy().collect();
        if unmapped.len() > free.len() {
            return Err(MapError::CircuitTooLarge {
                required: self.v_to_phy.len(),
                available: self.num_phy(),
            });
        }
        for (v, phy) in unmapped.into_iter().zip(free) {
            self.map_v_phy(v, phy)?;
        }
        Ok(())
    }

    /// Check the bijection invariant in both directions.
    pub fn is_consistent(&self) -> bool {
        let forward = self.v_to_phy.iter().zip(0u32..).all(|(p, v)| {
            p.is_none_or(|p| self.phy_to_v(p) == Some(QubitId(v)))
        });
        let backward = self
            .phy_to_v
            .iter()
            .zip(0u32..)
            .all(|(v, p)| v.is_none_or(|v| self.v_to_phy(v) == Some(p)));
        forward && backward
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity() {
        let placement = Placement::identity(3);
        assert_eq!(placement.v_to_phy(QubitId(2)), Some(2));
        assert_eq!(placement.phy_to_v(1), Some(QubitId(1)));
        assert!(placement.is_complete());
        assert!(placement.is_consistent());
    }

    #[test]
    fn test_map_v_phy_requires_free_slots() {
        let mut placement = Placement::new(2, 3);
        placement.map_v_phy(QubitId(0), 2).unwrap();
        assert!(matches!(
            placement.map_v_phy(QubitId(0), 1),
            Err(MapError::QubitAlreadyMapped(QubitId(0)))
        ));
        assert!(matches!(
            placement.map_v_phy(QubitId(1), 2),
            Err(MapError::PhysicalQubitOccupied(2))
        ));
        assert!(matches!(
            placement.map_v_phy(QubitId(1), 9),
            Err(MapError::InvalidQubit { qubit: 9, .. })
        ));
    }

    #[test]
    fn test_swap_with_free_qubit() {
        let mut placement = Placement::new(1, 3);
        placement.map_v_phy(QubitId(0), 0).unwrap();
        placement.swap_qubits(0, 2).unwrap();
        assert_eq!(placement.v_to_phy(QubitId(0)), Some(2));
        assert_eq!(placement.phy_to_v(0), None);
        assert_eq!(placement.free_phy().collect::<Vec<_>>(), vec![0, 1]);
        assert!(placement.is_consistent());
    }

    #[test]
    fn test_swap_two_free_qubits_is_noop() {
        let mut placement = Placement::new(1, 3);
        placement.swap_qubits(1, 2).unwrap();
        assert_eq!(placement.num_mapped(), 0);
        assert!(placement.is_consistent());
    }

    #[test]
    fn test_complete_with_free() {
        let mut placement = Placement::new(3, 4);
        placement.map_v_phy(QubitId(1), 0).unwrap();
        placement.complete_with_free().unwrap();
        assert_eq!(placement.to_v_to_phy_vec().unwrap(), vec![1, 0, 2]);

        let mut too_big = Placement::new(3, 2);
        assert!(matches!(
            too_big.complete_with_free(),
            Err(MapError::CircuitTooLarge { .. })
        ));
    }

    #[test]
    fn test_from_v_to_phy_rejects_duplicates() {
        assert!(Placement::from_v_to_phy(&[0, 0], 2).is_err());
        let placement = Placement::from_v_to_phy(&[2, 0], 3).unwrap();
        assert_eq!(placement.phy_to_v(2), Some(QubitId(0)));
    }

    #[test]
    fn test_json_roundtrip() {
        let mut placement = Placement::new(3, 5);
        placement.map_v_phy(QubitId(0), 4).unwrap();
        placement.map_v_phy(QubitId(2), 1).unwrap();
        let json = serde_json::to_string(&placement).unwrap();
        let back: Placement = serde_json::from_str(&json).unwrap();
        assert_eq!(back, placement);
    }
}
