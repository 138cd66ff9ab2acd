//! Device connectivity model.
//!
//! A [`Device`] is an undirected coupling graph over physical qubits
//! `0..num_qubits`. Two-qubit gates may only act on qubits joined by an
//! edge. All-pairs hop distances are computed with Floyd–Warshall on first
//! use and cached until the topology changes.

use std::collections::VecDeque;
use std::sync::OnceLock;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::error::{MapError, MapResult};

const UNREACHABLE: u32 = u32::MAX;

/// Physical connectivity of a quantum device.
///
/// ```
/// use qroute_map::Device;
///
/// let ring = Device::ring(4);
/// assert!(ring.are_connected(3, 0));
/// assert_eq!(ring.distance(0, 2).unwrap(), 2);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "DeviceRepr", into = "DeviceRepr")]
pub struct Device {
    name: String,
    num_qubits: u32,
    /// Undirected edges `(u, v)` with `u < v`, in insertion order.
    edges: Vec<(u32, u32)>,
    /// Sorted neighbour lists.
    adjacency: Vec<Vec<u32>>,
    /// Row-major `num_qubits × num_qubits` hop distances.
    distances: OnceLock<Vec<u32>>,
}

#[derive(Serialize, Deserialize)]
struct DeviceRepr {
    #[serde(default)]
    name: String,
    num_qubits: u32,
    edges: Vec<(u32, u32)>,
}

impl TryFrom<DeviceRepr> for Device {
    type Error = MapError;

    fn try_from(repr: DeviceRepr) -> MapResult<Self> {
        let mut device = Device::from_edges(repr.num_qubits, repr.edges)?;
        device.name = repr.name;
        Ok(device)
    }
}

impl From<Device> for DeviceRepr {
    fn from(device: Device) -> Self {
        DeviceRepr {
            name: device.name,
            num_qubits: device.num_qubits,
            edges: device.edges,
        }
    }
}

impl Device {
    /// Create a device with `num_qubits` isolated qubits.
    pub fn new(num_qubits: u32) -> Self {
        Self {
            name: String::new(),
            num_qubits,
            edges: Vec::new(),
            adjacency: vec![Vec::new(); num_qubits as usize],
            distances: OnceLock::new(),
        }
    }

    /// Create a device from an edge list.
    pub fn from_edges(
        num_qubits: u32,
        edges: impl IntoIterator<Item = (u32, u32)>,
    ) -> MapResult<Self> {
        let mut device = Self::new(num_qubits);
        for (u, v) in edges {
            device.add_edge(u, v)?;
        }
        Ok(device)
    }

    /// Set a descriptive name.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    fn named(n: u32, name: String, edges: impl IntoIterator<Item = (u32, u32)>) -> Self {
        let mut device = Self::new(n).with_name(name);
        for (u, v) in edges {
            device.insert_edge(u, v);
        }
        device
    }

    /// Linear chain `0-1-2-...-(n-1)`.
    pub fn path(n: u32) -> Self {
        Self::named(
            n,
            format!("path_{n}"),
            (1..n).map(|i| (i - 1, i)),
        )
    }

    /// Closed chain: a path plus the edge `(n-1, 0)`.
    pub fn ring(n: u32) -> Self {
        let closing = (n > 2).then(|| (n - 1, 0));
        Self::named(
            n,
            format!("ring_{n}"),
            (1..n).map(|i| (i - 1, i)).chain(closing),
        )
    }

    /// Qubit 0 connected to every other qubit.
    pub fn star(n: u32) -> Self {
        Self::named(n, format!("star_{n}"), (1..n).map(|i| (0, i)))
    }

    /// Every pair of qubits connected.
    pub fn complete(n: u32) -> Self {
        Self::named(
            n,
            format!("complete_{n}"),
            (0..n).flat_map(move |i| ((i + 1)..n).map(move |j| (i, j))),
        )
    }

    /// Rectangular lattice; qubit `(row, col)` has index `row * width + col`.
    pub fn grid(width: u32, height: u32) -> Self {
        let mut edges = Vec::new();
        for row in 0..height {
            for col in 0..width {
                let q = row * width + col;
                if col + 1 < width {
                    edges.push((q, q + 1));
                }
                if row + 1 < height {
                    edges.push((q, q + width));
                }
            }
        }
        Self::named(width * height, format!("grid_{width}x{height}"), edges)
    }

    /// Random connected device, deterministic for a given seed.
    ///
    /// A random spanning tree guarantees connectivity; further random edges
    /// are added until `num_edges` is reached (or the graph is complete).
    pub fn random(num_qubits: u32, num_edges: usize, seed: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut device = Self::new(num_qubits)
            .with_name(format!("random_{num_qubits}_{num_edges}_{seed}"));
        if num_qubits < 2 {
            return device;
        }

        let mut order: Vec<u32> = (0..num_qubits).collect();
        order.shuffle(&mut rng);
        for i in 1..order.len() {
            let parent = order[rng.gen_range(0..i)];
            device.insert_edge(order[i], parent);
        }

        let n = num_qubits as usize;
        let max_edges = n * (n - 1) / 2;
        let target = num_edges.min(max_edges);
        while device.edges.len() < target {
            let u = rng.gen_range(0..num_qubits);
            let v = rng.gen_range(0..num_qubits);
            device.insert_edge(u, v);
        }
        device
    }

    fn insert_edge(&mut self, u: u32, v: u32) -> bool {
        if u == v || self.are_connected(u, v) {
            return false;
        }
        self.edges.push((u.min(v), u.max(v)));
        for (a, b) in [(u, v), (v, u)] {
            let list = &mut self.adjacency[a as usize];
            let pos = list.partition_point(|&x| x < b);
            list.insert(pos, b);
        }
        self.distances = OnceLock::new();
        true
    }

    /// Connect `u` and `v`. Already-connected pairs and self loops are ignored.
    pub fn add_edge(&mut self, u: u32, v: u32) -> MapResult<()> {
        self.check_qubit(u)?;
        self.check_qubit(v)?;
        self.insert_edge(u, v);
        Ok(())
    }

    /// Fail with `InvalidQubit` unless `q` is a qubit of this device.
    pub fn check_qubit(&self, q: u32) -> MapResult<()> {
        if q < self.num_qubits {
            Ok(())
        } else {
            Err(MapError::InvalidQubit {
                qubit: q,
                num_qubits: self.num_qubits,
            })
        }
    }

    /// Descriptive name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of physical qubits.
    #[inline]
    pub fn num_qubits(&self) -> u32 {
        self.num_qubits
    }

    /// Edges as `(u, v)` pairs with `u < v`.
    #[inline]
    pub fn edges(&self) -> &[(u32, u32)] {
        &self.edges
    }

    /// Number of edges.
    #[inline]
    pub fn num_edges(&self) -> usize {
        self.edges.len()
    }

    /// Sorted neighbours of `q` (empty for out-of-range qubits).
    #[inline]
    pub fn neighbors(&self, q: u32) -> &[u32] {
        self.adjacency.get(q as usize).map_or(&[], Vec::as_slice)
    }

    /// Number of neighbours of `q`.
    #[inline]
    pub fn degree(&self, q: u32) -> usize {
        self.neighbors(q).len()
    }

    /// Whether `u` and `v` share an edge.
    #[inline]
    pub fn are_connected(&self, u: u32, v: u32) -> bool {
        self.neighbors(u).binary_search(&v).is_ok()
    }

    fn distance_matrix(&self) -> &[u32] {
        self.distances.get_or_init(|| {
            let n = self.num_qubits as usize;
            let mut dist = vec![UNREACHABLE; n * n];
            for i in 0..n {
                dist[i * n + i] = 0;
            }
            for &(u, v) in &self.edges {
                let (u, v) = (u as usize, v as usize);
                dist[u * n + v] = 1;
                dist[v * n + u] = 1;
            }
            for k in 0..n {
                for i in 0..n {
                    let ik = dist[i * n + k];
                    if ik == UNREACHABLE {
                        continue;
                    }
                    for j in 0..n {
                        let kj = dist[k * n + j];
                        if kj != UNREACHABLE && ik + kj < dist[i * n + j] {
                            dist[i * n + j] = ik + kj;
                        }
                    }
                }
            }
            dist
        })
    }

    /// Hop distance between `u` and `v`, or `None` if out of range or disconnected.
    #[inline]
    pub fn try_distance(&self, u: u32, v: u32) -> Option<u32> {
        if u >= self.num_qubits || v >= self.num_qubits {
            return None;
        }
        let n = self.num_qubits as usize;
        let d = self.distance_matrix()[u as usize * n + v as usize];
        (d != UNREACHABLE).then_some(d)
    }

    /// Hop distance between `u` and `v`.
    pub fn distance(&self, u: u32, v: u32) -> MapResult<u32> {
        self.check_qubit(u)?;
        self.check_qubit(v)?;
        self.try_distance(u, v)
            .ok_or(MapError::Unreachable { from: u, to: v })
    }

    /// A shortest path from `u` to `v`, both endpoints included.
    ///
    /// Neighbours are explored in ascending order, so the result is
    /// deterministic.
    pub fn shortest_path(&self, u: u32, v: u32) -> MapResult<Vec<u32>> {
        self.check_qubit(u)?;
        self.check_qubit(v)?;
        let n = self.num_qubits as usize;
        let mut pred = vec![UNREACHABLE; n];
        pred[u as usize] = u;
        let mut queue = VecDeque::from([u]);
        while let Some(cur) = queue.pop_front() {
            if cur == v {
                break;
            }
            for &next in self.neighbors(cur) {
                if pred[next as usize] == UNREACHABLE {
                    pred[next as usize] = cur;
                    queue.push_back(next);
                }
            }
        }
        if pred[v as usize] == UNREACHABLE {
            return Err(MapError::Unreachable { from: u, to: v });
        }

        let mut path = vec![v];
        let mut cur = v;
        while cur != u {
            cur = pred[cur as usize];
            path.push(cur);
        }
        path.reverse();
        Ok(path)
    }

    /// Whether every qubit can reach every other qubit.
    pub fn is_connected(&self) -> bool {
        (1..self.num_qubits).all(|q| self.try_distance(0, q).is_some())
    }

    /// Largest distance between any two qubits, or `None` if disconnected.
    pub fn diameter(&self) -> Option<u32> {
        let mut max = 0;
        for u in 0..self.num_qubits {
            for v in (u + 1)..self.num_qubits {
                max = max.max(self.try_distance(u, v)?);
            }
        }
        Some(max)
    }
}

impl PartialEq for Device {
    fn eq(&self, other: &Self) -> bool {
        self.num_qubits == other.num_qubits && self.edges == other.edges
    }
}
