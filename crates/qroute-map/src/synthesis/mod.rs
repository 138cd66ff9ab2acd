//! Token swapping: permute tokens on device vertices with adjacent swaps.
//!
//! A token is a virtual qubit and a vertex a physical qubit. Given where
//! every token is and where it must go, find a short sequence of SWAPs on
//! device edges that moves every token to its target.

mod astar;
mod sat;

pub use astar::AStarTokenSwap;
pub use sat::{SatTokenSwap, SwapObjective};

use crate::cancel::CancellationToken;
use crate::device::Device;
use crate::error::{MapError, MapResult};
use crate::placement::Placement;

/// Initial and target token assignments, both indexed by vertex.
///
/// Tokens below [`num_pinned`](Self::num_pinned) must end on their target
/// vertex. The remaining tokens are free: they stand for empty physical
/// qubits and may end anywhere.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenSwapProblem {
    init: Vec<u32>,
    target: Vec<u32>,
    pinned: u32,
}

impl TokenSwapProblem {
    /// Create a problem on `device`.
    ///
    /// Both assignments must be permutations of `0..device.num_qubits()`,
    /// and every token must be able to reach its target.
    pub fn new(device: &Device, init: Vec<u32>, target: Vec<u32>) -> MapResult<Self> {
        Self::with_pinned(device, init, target, device.num_qubits())
    }

    /// Like [`new`](Self::new), but only tokens below `pinned` have to reach
    /// their target vertex.
    pub fn with_pinned(
        device: &Device,
        init: Vec<u32>,
        target: Vec<u32>,
        pinned: u32,
    ) -> MapResult<Self> {
        let n = device.num_qubits() as usize;
        check_permutation("initial", &init, n)?;
        check_permutation("target", &target, n)?;
        let problem = Self {
            init,
            target,
            pinned: pinned.min(device.num_qubits()),
        };
        let goal = problem.target_positions();
        for (v, &token) in (0u32..).zip(&problem.init) {
            if problem.is_pinned(token) {
                device.distance(v, goal[token as usize])?;
            }
        }
        Ok(problem)
    }

    /// The problem of turning placement `from` into placement `to`.
    ///
    /// Tokens are virtual qubits. Physical qubits free in a placement hold
    /// free filler tokens, so empty qubits end up wherever is cheapest.
    #[allow(clippy::cast_possible_truncation)]
    pub fn from_placements(device: &Device, from: &Placement, to: &Placement) -> MapResult<Self> {
        if from.num_v() != to.num_v() || from.num_phy() != to.num_phy() {
            return Err(MapError::InvalidPermutation(
                "placements have different dimensions".into(),
            ));
        }
        if from.num_phy() != device.num_qubits() {
            return Err(MapError::InvalidPermutation(format!(
                "placements cover {} qubits but the device has {}",
                from.num_phy(),
                device.num_qubits()
            )));
        }
        let tokens = |placement: &Placement| -> MapResult<Vec<u32>> {
            let mut filler = placement.num_v();
            placement
                .phy_to_v_slice()
                .iter()
                .map(|v| match v {
                    Some(v) if to.v_to_phy(*v).is_none() || from.v_to_phy(*v).is_none() => {
                        Err(MapError::InvalidPermutation(format!(
                            "virtual qubit {v} is only placed on one side"
                        )))
                    }
                    Some(v) => Ok(v.0),
                    None => {
                        filler += 1;
                        Ok(filler - 1)
                    }
                })
                .collect()
        };
        Self::with_pinned(device, tokens(from)?, tokens(to)?, from.num_v())
    }

    /// Number of vertices (and tokens).
    pub fn len(&self) -> usize {
        self.init.len()
    }

    /// Whether the device has no vertices.
    pub fn is_empty(&self) -> bool {
        self.init.is_empty()
    }

    /// Token on each vertex at the start.
    pub fn init(&self) -> &[u32] {
        &self.init
    }

    /// Token on each vertex at the end.
    pub fn target(&self) -> &[u32] {
        &self.target
    }

    /// Number of tokens that must reach their target.
    pub fn num_pinned(&self) -> u32 {
        self.pinned
    }

    /// Whether `token` must reach its target.
    pub fn is_pinned(&self, token: u32) -> bool {
        token < self.pinned
    }

    /// Whether the permutation parity is forced. Two or more free tokens
    /// can trade places at no cost, which frees the parity.
    pub fn has_fixed_parity(&self) -> bool {
        self.len() - (self.pinned as usize) < 2
    }

    /// Whether every pinned token of `tokens` sits on its target vertex.
    pub fn is_reached(&self, tokens: &[u32]) -> bool {
        tokens.len() == self.target.len()
            && tokens
                .iter()
                .zip(&self.target)
                .all(|(&t, &goal)| !self.is_pinned(goal) || t == goal)
    }

    /// Whether no swap is needed.
    pub fn is_solved(&self) -> bool {
        self.is_reached(&self.init)
    }

    /// Vertex of each token at the start.
    pub fn init_positions(&self) -> Vec<u32> {
        positions(&self.init)
    }

    /// Vertex of each token at the end.
    pub fn target_positions(&self) -> Vec<u32> {
        positions(&self.target)
    }

    /// Whether the permutation from `init` to `target` is odd.
    pub fn is_odd(&self) -> bool {
        let goal = self.target_positions();
        let n = self.init.len();
        let mut seen = vec![false; n];
        let mut cycles = 0;
        for start in 0..n {
            if seen[start] {
                continue;
            }
            cycles += 1;
            let mut v = start;
            while !seen[v] {
                seen[v] = true;
                v = goal[self.init[v] as usize] as usize;
            }
        }
        (n - cycles) % 2 == 1
    }

    /// Hop distance each token has to travel, indexed by vertex. Free tokens
    /// travel nowhere.
    pub fn token_distances(&self, device: &Device) -> MapResult<Vec<u32>> {
        let goal = self.target_positions();
        (0u32..)
            .zip(&self.init)
            .map(|(v, &token)| {
                if self.is_pinned(token) {
                    device.distance(v, goal[token as usize])
                } else {
                    Ok(0)
                }
            })
            .collect()
    }

    /// Whether `swaps` turn `init` into `target`.
    pub fn is_solution(&self, swaps: &[(u32, u32)]) -> bool {
        let mut tokens = self.init.clone();
        apply_swaps(&mut tokens, swaps);
        self.is_reached(&tokens)
    }
}

fn check_permutation(label: &str, tokens: &[u32], n: usize) -> MapResult<()> {
    if tokens.len() != n {
        return Err(MapError::InvalidPermutation(format!(
            "{label} assignment has {} entries, expected {n}",
            tokens.len()
        )));
    }
    let mut seen = vec![false; n];
    for &token in tokens {
        match seen.get_mut(token as usize) {
            Some(slot) if !*slot => *slot = true,
            _ => {
                return Err(MapError::InvalidPermutation(format!(
                    "{label} assignment repeats or exceeds token {token}"
                )));
            }
        }
    }
    Ok(())
}

#[allow(clippy::cast_possible_truncation)]
fn positions(tokens: &[u32]) -> Vec<u32> {
    let mut pos = vec![0; tokens.len()];
    for (v, &token) in tokens.iter().enumerate() {
        pos[token as usize] = v as u32;
    }
    pos
}

/// Apply `swaps` in order to a vertex-to-token assignment.
pub fn apply_swaps(tokens: &mut [u32], swaps: &[(u32, u32)]) {
    for &(a, b) in swaps {
        tokens.swap(a as usize, b as usize);
    }
}

/// A token-swapping algorithm.
pub trait TokenSwapper {
    /// Short identifier used in logs.
    fn name(&self) -> &'static str;

    /// SWAPs, in application order, that solve `problem` on `device`.
    fn solve(
        &self,
        device: &Device,
        problem: &TokenSwapProblem,
        cancel: &CancellationToken,
    ) -> MapResult<Vec<(u32, u32)>>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use qroute_ir::QubitId;

    #[test]
    fn test_rejects_non_permutations() {
        let device = Device::path(3);
        assert!(TokenSwapProblem::new(&device, vec![0, 1, 1], vec![0, 1, 2]).is_err());
        assert!(TokenSwapProblem::new(&device, vec![0, 1], vec![0, 1]).is_err());
        assert!(TokenSwapProblem::new(&device, vec![0, 1, 3], vec![0, 1, 2]).is_err());
    }

    #[test]
    fn test_unreachable_target() {
        let device = Device::from_edges(4, [(0, 1), (2, 3)]).unwrap();
        assert!(matches!(
            TokenSwapProblem::new(&device, vec![0, 1, 2, 3], vec![2, 1, 0, 3]),
            Err(MapError::Unreachable { .. })
        ));
    }

    #[test]
    fn test_parity_and_distances() {
        let device = Device::path(3);
        let problem = TokenSwapProblem::new(&device, vec![0, 1, 2], vec![2, 1, 0]).unwrap();
        assert!(problem.is_odd());
        assert_eq!(problem.token_distances(&device).unwrap(), vec![2, 0, 2]);
        assert!(problem.is_solution(&[(0, 1), (1, 2), (0, 1)]));
        assert!(!problem.is_solution(&[(0, 1)]));
    }

    #[test]
    fn test_from_placements_with_free_qubits() {
        let device = Device::path(4);
        let mut from = Placement::new(2, 4);
        from.map_v_phy(QubitId(0), 0).unwrap();
        from.map_v_phy(QubitId(1), 1).unwrap();
        let mut to = Placement::new(2, 4);
        to.map_v_phy(QubitId(0), 3).unwrap();
        to.map_v_phy(QubitId(1), 1).unwrap();

        let problem = TokenSwapProblem::from_placements(&device, &from, &to).unwrap();
        assert_eq!(problem.init(), &[0, 1, 2, 3]);
        assert_eq!(problem.target(), &[2, 1, 3, 0]);
        assert_eq!(problem.num_pinned(), 2);
        assert!(!problem.has_fixed_parity());
        assert_eq!(problem.token_distances(&device).unwrap(), vec![3, 0, 0, 0]);
    }

    #[test]
    fn test_free_tokens_may_end_anywhere() {
        let device = Device::path(3);
        let problem =
            TokenSwapProblem::with_pinned(&device, vec![0, 1, 2], vec![1, 0, 2], 1).unwrap();
        // Token 0 reaches vertex 1; the free tokens 1 and 2 are not tracked.
        assert!(problem.is_solution(&[(0, 1)]));
        assert!(problem.is_solution(&[(1, 2), (0, 1)]));
        assert!(!problem.is_solution(&[]));
        assert!(problem.is_reached(&[2, 0, 1]));
    }
}
