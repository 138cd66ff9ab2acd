//! SAT-encoded placement.
//!
//! One boolean variable per (virtual, physical) pair; every virtual qubit
//! sits on exactly one physical qubit and every physical qubit holds at
//! most one virtual qubit. A two-qubit gate on `(c, t)` adds, for every
//! physical `p`, the clause "`t` on `p` implies `c` on a neighbour of `p`".

use qroute_ir::{CircuitDag, QubitId};
use qroute_sat::cardinality::{at_most_one, exactly_one};
use qroute_sat::{Lit, Model, SatSolver, SolveOutcome, Var, VarisatSolver};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::{Placer, empty_placement};
use crate::cancel::CancellationToken;
use crate::device::Device;
use crate::error::{MapError, MapResult};
use crate::placement::Placement;

/// How interaction constraints are added to the formula.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SatPlacementMode {
    /// Add every interacting pair in circuit order and fail on the first
    /// pair that cannot be satisfied together with the previous ones.
    Incremental,
    /// Guard each pair with an activation literal and keep as many pairs as
    /// possible, most frequent first.
    #[default]
    Activation,
}

/// Placement that makes interacting qubits adjacent, found by a SAT solver.
#[derive(Debug, Clone, Default)]
pub struct SatPlacer {
    mode: SatPlacementMode,
    cancel: CancellationToken,
}

impl SatPlacer {
    /// Create a placer using `mode`.
    pub fn new(mode: SatPlacementMode) -> Self {
        Self {
            mode,
            cancel: CancellationToken::new(),
        }
    }

    /// Check `cancel` between solver calls.
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// The solving strategy.
    pub fn mode(&self) -> SatPlacementMode {
        self.mode
    }
}

/// A virtual qubit pair with the number of gates acting on it.
#[derive(Debug, Clone, Copy)]
struct Interaction {
    control: QubitId,
    target: QubitId,
    gates: usize,
}

/// Distinct interacting pairs in order of first appearance.
fn interactions(dag: &CircuitDag) -> Vec<Interaction> {
    let mut index: FxHashMap<(QubitId, QubitId), usize> = FxHashMap::default();
    let mut pairs: Vec<Interaction> = Vec::new();
    for (_, inst) in dag.topological_ops() {
        if !inst.is_two_qubit_gate() {
            continue;
        }
        let (c, t) = (inst.qubits[0], inst.qubits[1]);
        let key = (c.min(t), c.max(t));
        match index.get(&key) {
            Some(&i) => pairs[i].gates += 1,
            None => {
                index.insert(key, pairs.len());
                pairs.push(Interaction {
                    control: c,
                    target: t,
                    gates: 1,
                });
            }
        }
    }
    pairs
}

struct PlacementEncoder<'a, S> {
    device: &'a Device,
    solver: S,
    vars: Vec<Var>,
    num_v: u32,
    num_phy: u32,
}

impl<'a, S: SatSolver> PlacementEncoder<'a, S> {
    fn new(mut solver: S, num_v: u32, device: &'a Device) -> MapResult<Self> {
        let num_phy = device.num_qubits();
        let vars = solver.add_variables(num_v as usize * num_phy as usize);
        let mut encoder = Self {
            device,
            solver,
            vars,
            num_v,
            num_phy,
        };
        encoder.qubit_constraints()?;
        Ok(encoder)
    }

    fn var(&self, v: u32, phy: u32) -> Var {
        self.vars[(v * self.num_phy + phy) as usize]
    }

    fn qubit_constraints(&mut self) -> MapResult<()> {
        for v in 0..self.num_v {
            let row: Vec<Var> = (0..self.num_phy).map(|p| self.var(v, p)).collect();
            exactly_one(&mut self.solver, &row)?;
        }
        for p in 0..self.num_phy {
            let column: Vec<Var> = (0..self.num_v).map(|v| self.var(v, p)).collect();
            at_most_one(&mut self.solver, &column)?;
        }
        Ok(())
    }

    /// Require `control` next to `target`, optionally guarded by `guard`.
    fn gate_constraints(&mut self, pair: Interaction, guard: Option<Lit>) -> MapResult<()> {
        let (c, t) = (pair.control.0, pair.target.0);
        for t_phy in 0..self.num_phy {
            let mut clause: Vec<Lit> = guard.map(|g| !g).into_iter().collect();
            clause.push(self.var(t, t_phy).negative());
            clause.extend(
                self.device
                    .neighbors(t_phy)
                    .iter()
                    .map(|&c_phy| self.var(c, c_phy).positive()),
            );
            self.solver.add_clause(&clause)?;
        }
        Ok(())
    }

    fn decode(&self, model: &Model) -> MapResult<Placement> {
        let mut placement = Placement::new(self.num_v, self.num_phy);
        for v in 0..self.num_v {
            if let Some(phy) = (0..self.num_phy).find(|&p| model.value(self.var(v, p))) {
                placement.map_v_phy(QubitId(v), phy)?;
            }
        }
        Ok(placement)
    }
}

impl SatPlacer {
    fn place_incremental<S: SatSolver>(
        &self,
        encoder: &mut PlacementEncoder<'_, S>,
        pairs: &[Interaction],
    ) -> MapResult<Model> {
        let mut model = None;
        for &pair in pairs {
            self.cancel.check()?;
            encoder.gate_constraints(pair, None)?;
            match encoder.solver.solve(&[])? {
                SolveOutcome::Satisfiable(m) => model = Some(m),
                SolveOutcome::Unsatisfiable { .. } => {
                    return Err(MapError::NoSolutionFound(format!(
                        "no placement makes {} and {} adjacent alongside earlier pairs",
                        pair.control, pair.target
                    )));
                }
            }
        }
        match model {
            Some(model) => Ok(model),
            None => solve_base(&mut encoder.solver, &[]),
        }
    }

    fn place_with_activation<S: SatSolver>(
        &self,
        encoder: &mut PlacementEncoder<'_, S>,
        mut pairs: Vec<Interaction>,
    ) -> MapResult<Model> {
        // Stable: equally frequent pairs keep circuit order.
        pairs.sort_by(|a, b| b.gates.cmp(&a.gates));

        let mut assumptions: Vec<Lit> = Vec::with_capacity(pairs.len());
        let mut model = None;
        let mut dropped = 0usize;
        for pair in pairs {
            self.cancel.check()?;
            let act = encoder.solver.add_variable().positive();
            encoder.gate_constraints(pair, Some(act))?;
            assumptions.push(act);
            match encoder.solver.solve(&assumptions)? {
                SolveOutcome::Satisfiable(m) => model = Some(m),
                SolveOutcome::Unsatisfiable { .. } => {
                    // Every earlier assumption set was satisfiable, so the
                    // newest pair, the least frequent so far, is dropped.
                    debug!(
                        control = %pair.control,
                        target = %pair.target,
                        gates = pair.gates,
                        "dropping interaction"
                    );
                    if let Some(last) = assumptions.last_mut() {
                        *last = !*last;
                    }
                    dropped += 1;
                }
            }
        }
        debug!(kept = assumptions.len() - dropped, dropped, "activation placement");
        match model {
            Some(model) => Ok(model),
            None => solve_base(&mut encoder.solver, &assumptions),
        }
    }
}

fn solve_base<S: SatSolver>(solver: &mut S, assumptions: &[Lit]) -> MapResult<Model> {
    match solver.solve(assumptions)? {
        SolveOutcome::Satisfiable(model) => Ok(model),
        SolveOutcome::Unsatisfiable { .. } => Err(MapError::NoSolutionFound(
            "placement constraints are unsatisfiable".into(),
        )),
    }
}

impl Placer for SatPlacer {
    fn name(&self) -> &'static str {
        "sat"
    }

    fn place(&self, dag: &CircuitDag, device: &Device) -> MapResult<Placement> {
        let empty = empty_placement(dag, device)?;
        let pairs = interactions(dag);
        let mut encoder = PlacementEncoder::new(VarisatSolver::new(), empty.num_v(), device)?;

        let model = match self.mode {
            SatPlacementMode::Incremental => self.place_incremental(&mut encoder, &pairs)?,
            SatPlacementMode::Activation => self.place_with_activation(&mut encoder, pairs)?,
        };
        let placement = encoder.decode(&model)?;
        info!(mode = ?self.mode, mapped = placement.num_mapped(), "sat placement");
        Ok(placement)
    }
}
