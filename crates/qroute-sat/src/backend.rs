//! SAT backend on the pure-Rust `varisat` CDCL solver.

use tracing::trace;
use varisat::ExtendFormula;

use crate::error::{SatError, SatResult};
use crate::solver::{Lit, Model, SatSolver, SolveOutcome, Var};

/// Incremental solver backed by `varisat`.
pub struct VarisatSolver {
    inner: varisat::Solver<'static>,
    vars: Vec<varisat::Var>,
}

impl VarisatSolver {
    /// Create an empty solver.
    pub fn new() -> Self {
        Self {
            inner: varisat::Solver::new(),
            vars: Vec::new(),
        }
    }

    fn to_backend(&self, lit: Lit) -> SatResult<varisat::Lit> {
        let var = self
            .vars
            .get(lit.var().index())
            .copied()
            .ok_or(SatError::UnknownVariable {
                var: lit.var().index(),
                num_vars: self.vars.len(),
            })?;
        Ok(varisat::Lit::from_var(var, lit.is_positive()))
    }

    fn translate(&self, lits: &[Lit]) -> SatResult<Vec<varisat::Lit>> {
        lits.iter().map(|&l| self.to_backend(l)).collect()
    }

    #[allow(clippy::cast_possible_truncation)]
    fn from_backend(lit: varisat::Lit) -> Lit {
        Lit::new(Var(lit.var().index() as u32), lit.is_positive())
    }
}

impl Default for VarisatSolver {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for VarisatSolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VarisatSolver")
            .field("num_vars", &self.vars.len())
            .finish_non_exhaustive()
    }
}

impl SatSolver for VarisatSolver {
    #[allow(clippy::cast_possible_truncation)]
    fn add_variable(&mut self) -> Var {
        let var = self.inner.new_var();
        self.vars.push(var);
        Var((self.vars.len() - 1) as u32)
    }

    fn num_variables(&self) -> usize {
        self.vars.len()
    }

    fn add_clause(&mut self, clause: &[Lit]) -> SatResult<()> {
        let clause = self.translate(clause)?;
        self.inner.add_clause(&clause);
        Ok(())
    }

    fn solve(&mut self, assumptions: &[Lit]) -> SatResult<SolveOutcome> {
        let backend_assumptions = self.translate(assumptions)?;
        self.inner.assume(&backend_assumptions);
        let sat = self
            .inner
            .solve()
            .map_err(|e| SatError::Backend(format!("{e:?}")))?;
        trace!(
            vars = self.vars.len(),
            assumptions = assumptions.len(),
            sat,
            "varisat solve"
        );

        if sat {
            let lits = self.inner.model().ok_or(SatError::MissingModel)?;
            let mut values = vec![false; self.vars.len()];
            for lit in lits {
                let lit = Self::from_backend(lit);
                if let Some(slot) = values.get_mut(lit.var().index()) {
                    *slot = lit.is_positive();
                }
            }
            Ok(SolveOutcome::Satisfiable(Model::new(values)))
        } else {
            let core = self
                .inner
                .failed_core()
                .map(|core| core.iter().copied().map(Self::from_backend).collect())
                .unwrap_or_default();
            Ok(SolveOutcome::Unsatisfiable { core })
        }
    }
}
