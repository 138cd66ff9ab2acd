//! Token swapping as incremental SAT over discrete time steps.
//!
//! Time is split into moments. At each moment a token sits on exactly one
//! vertex and a vertex holds exactly one token. Between two moments some
//! edges are swapped: tokens on a swapped edge trade places, every other
//! token stays put. The final configuration is passed as assumptions so
//! moments can be appended until it becomes reachable.

use qroute_sat::cardinality::{at_least_one, at_most_one};
use qroute_sat::{Lit, Model, SatSolver, SolveOutcome, Var, VarisatSolver};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::{TokenSwapProblem, TokenSwapper};
use crate::cancel::CancellationToken;
use crate::device::Device;
use crate::error::{MapError, MapResult};

/// What the SAT token swapper minimizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SwapObjective {
    /// Total number of SWAPs: at most one SWAP per moment.
    #[default]
    SwapCount,
    /// Number of SWAP layers: any matching of edges per moment.
    Depth,
}

/// Optimal token swapping with a SAT solver.
#[derive(Debug, Clone, Copy, Default)]
pub struct SatTokenSwap {
    objective: SwapObjective,
    max_moments: Option<u32>,
}

impl SatTokenSwap {
    /// Create a solver minimizing `objective`.
    pub fn new(objective: SwapObjective) -> Self {
        Self {
            objective,
            max_moments: None,
        }
    }

    /// Give up with [`MapError::NoSolutionFound`] beyond this many moments.
    pub fn with_max_moments(mut self, max_moments: u32) -> Self {
        self.max_moments = Some(max_moments);
        self
    }

    /// The quantity being minimized.
    pub fn objective(&self) -> SwapObjective {
        self.objective
    }

    /// Moments that are certainly needed.
    ///
    /// For SWAP count every SWAP moves two tokens one hop, and unless free
    /// tokens can absorb it the count has the parity of the permutation.
    /// For depth the farthest pinned token bounds it.
    pub fn lower_bound(&self, device: &Device, problem: &TokenSwapProblem) -> MapResult<u32> {
        let distances = problem.token_distances(device)?;
        Ok(match self.objective {
            SwapObjective::SwapCount => {
                let bound = distances.iter().sum::<u32>().div_ceil(2);
                if !problem.has_fixed_parity() || (bound % 2 == 1) == problem.is_odd() {
                    bound
                } else {
                    bound + 1
                }
            }
            SwapObjective::Depth => distances.into_iter().max().unwrap_or(0),
        })
    }

    #[allow(clippy::cast_possible_truncation)]
    fn moment_cap(&self, device: &Device) -> u32 {
        self.max_moments.unwrap_or_else(|| {
            let n = device.num_qubits();
            n * n.saturating_sub(1) / 2 + 2
        })
    }
}

struct SwapEncoder<'a, S> {
    device: &'a Device,
    solver: S,
    objective: SwapObjective,
    n: usize,
    init_pos: Vec<u32>,
    /// Per moment, `token * n + vertex`.
    tokens: Vec<Vec<Var>>,
    /// Per transition into moment `m + 1`, one variable per device edge.
    swaps: Vec<Vec<Var>>,
    /// Incident edge indices per vertex.
    incident: Vec<Vec<usize>>,
}

impl<'a, S: SatSolver> SwapEncoder<'a, S> {
    fn new(
        device: &'a Device,
        solver: S,
        problem: &TokenSwapProblem,
        objective: SwapObjective,
    ) -> Self {
        let n = problem.len();
        let mut incident = vec![Vec::new(); n];
        for (k, &(a, b)) in device.edges().iter().enumerate() {
            incident[a as usize].push(k);
            incident[b as usize].push(k);
        }
        Self {
            device,
            solver,
            objective,
            n,
            init_pos: problem.init_positions(),
            tokens: Vec::new(),
            swaps: Vec::new(),
            incident,
        }
    }

    fn num_moments(&self) -> usize {
        self.tokens.len()
    }

    fn at(&self, moment: usize, token: usize, vertex: usize) -> Var {
        self.tokens[moment][token * self.n + vertex]
    }

    #[allow(clippy::cast_possible_truncation)]
    fn reachable(&self, moment: usize, token: usize, vertex: usize) -> bool {
        self.device
            .try_distance(self.init_pos[token], vertex as u32)
            .is_some_and(|d| d as usize <= moment)
    }

    fn add_moment(&mut self, init: &[u32]) -> MapResult<()> {
        let m = self.num_moments();
        let n = self.n;
        self.tokens.push(self.solver.add_variables(n * n));

        for t in 0..n {
            let mut allowed = Vec::with_capacity(n);
            for v in 0..n {
                let var = self.at(m, t, v);
                if self.reachable(m, t, v) {
                    allowed.push(var);
                } else {
                    self.solver.add_clause(&[var.negative()])?;
                }
            }
            at_least_one(&mut self.solver, &allowed)?;
            at_most_one(&mut self.solver, &allowed)?;
        }
        for v in 0..n {
            let column: Vec<Var> = (0..n)
                .filter(|&t| self.reachable(m, t, v))
                .map(|t| self.at(m, t, v))
                .collect();
            at_most_one(&mut self.solver, &column)?;
        }

        if m == 0 {
            for (v, &token) in init.iter().enumerate() {
                let var = self.at(0, token as usize, v);
                self.solver.add_clause(&[var.positive()])?;
            }
            return Ok(());
        }
        self.add_transition(m)
    }

    fn add_transition(&mut self, m: usize) -> MapResult<()> {
        let (n, device) = (self.n, self.device);
        let edges = self.solver.add_variables(device.num_edges());

        match self.objective {
            SwapObjective::SwapCount => {
                at_most_one(&mut self.solver, &edges)?;
                // Swapping the same edge twice in a row is a no-op.
                if let Some(prev) = self.swaps.last() {
                    for (p, e) in prev.iter().zip(&edges) {
                        self.solver.add_clause(&[p.negative(), e.negative()])?;
                    }
                }
            }
            SwapObjective::Depth => {
                for incident in &self.incident {
                    let vars: Vec<Var> = incident.iter().map(|&k| edges[k]).collect();
                    at_most_one(&mut self.solver, &vars)?;
                }
            }
        }

        // A swapped edge carries its tokens across.
        for (k, &(a, b)) in device.edges().iter().enumerate() {
            let (a, b) = (a as usize, b as usize);
            for t in 0..n {
                for (from, to) in [(a, b), (b, a)] {
                    let clause = [
                        edges[k].negative(),
                        self.at(m - 1, t, from).negative(),
                        self.at(m, t, to).positive(),
                    ];
                    self.solver.add_clause(&clause)?;
                }
            }
        }

        // Without a swapped incident edge a token stays.
        for v in 0..n {
            for t in 0..n {
                let mut clause: Vec<Lit> = vec![
                    self.at(m - 1, t, v).negative(),
                    self.at(m, t, v).positive(),
                ];
                clause.extend(self.incident[v].iter().map(|&k| edges[k].positive()));
                self.solver.add_clause(&clause)?;
            }
        }

        self.swaps.push(edges);
        Ok(())
    }

    /// Free tokens get no assumption and may end anywhere.
    fn target_assumptions(&self, goal: &[u32], pinned: usize) -> Vec<Lit> {
        let last = self.num_moments() - 1;
        (0..pinned)
            .map(|t| self.at(last, t, goal[t] as usize).positive())
            .collect()
    }

    fn decode(&self, model: &Model) -> Vec<(u32, u32)> {
        let edges = self.device.edges();
        self.swaps
            .iter()
            .flat_map(|vars| {
                vars.iter()
                    .zip(edges)
                    .filter(|(var, _)| model.value(**var))
                    .map(|(_, &edge)| edge)
            })
            .collect()
    }
}

impl TokenSwapper for SatTokenSwap {
    fn name(&self) -> &'static str {
        "sat"
    }

    fn solve(
        &self,
        device: &Device,
        problem: &TokenSwapProblem,
        cancel: &CancellationToken,
    ) -> MapResult<Vec<(u32, u32)>> {
        if problem.is_solved() {
            return Ok(Vec::new());
        }
        let cap = self.moment_cap(device);
        let bound = self.lower_bound(device, problem)?;
        if bound > cap {
            return Err(MapError::NoSolutionFound(format!(
                "token swap needs at least {bound} moments, cap is {cap}"
            )));
        }

        let goal = problem.target_positions();
        let mut encoder = SwapEncoder::new(device, VarisatSolver::new(), problem, self.objective);
        for _ in 0..=bound {
            encoder.add_moment(problem.init())?;
        }
        // Idle moments are allowed, so with a fixed parity the next feasible
        // SWAP count is two moments further.
        let step = match self.objective {
            SwapObjective::SwapCount if problem.has_fixed_parity() => 2,
            SwapObjective::SwapCount | SwapObjective::Depth => 1,
        };
        let pinned = problem.num_pinned() as usize;

        loop {
            cancel.check()?;
            let transitions = encoder.num_moments() - 1;
            let assumptions = encoder.target_assumptions(&goal, pinned);
            match encoder.solver.solve(&assumptions)? {
                SolveOutcome::Satisfiable(model) => {
                    let swaps = encoder.decode(&model);
                    info!(
                        objective = ?self.objective,
                        moments = transitions,
                        swaps = swaps.len(),
                        "SAT token swap solved"
                    );
                    return Ok(swaps);
                }
                SolveOutcome::Unsatisfiable { .. } => {
                    if transitions + step > cap as usize {
                        return Err(MapError::NoSolutionFound(format!(
                            "token swap unsolved within {cap} moments"
                        )));
                    }
                    debug!(moments = transitions, step, "extending horizon");
                    for _ in 0..step {
                        encoder.add_moment(problem.init())?;
                    }
                }
            }
        }
    }
}
