//! Cardinality constraints over plain clauses.

use crate::error::SatResult;
use crate::solver::{Lit, SatSolver, Var};

/// At least one of `vars` is true.
pub fn at_least_one<S: SatSolver + ?Sized>(solver: &mut S, vars: &[Var]) -> SatResult<()> {
    let clause: Vec<Lit> = vars.iter().map(|v| v.positive()).collect();
    solver.add_clause(&clause)
}

/// At most one of `vars` is true, encoded pairwise.
pub fn at_most_one<S: SatSolver + ?Sized>(solver: &mut S, vars: &[Var]) -> SatResult<()> {
    for (i, a) in vars.iter().enumerate() {
        for b in &vars[i + 1..] {
            solver.add_clause(&[a.negative(), b.negative()])?;
        }
    }
    Ok(())
}

/// At most one of `lits` holds, encoded pairwise.
pub fn at_most_one_lits<S: SatSolver + ?Sized>(solver: &mut S, lits: &[Lit]) -> SatResult<()> {
    for (i, &a) in lits.iter().enumerate() {
        for &b in &lits[i + 1..] {
            solver.add_clause(&[!a, !b])?;
        }
    }
    Ok(())
}

/// Exactly one of `vars` is true.
pub fn exactly_one<S: SatSolver + ?Sized>(solver: &mut S, vars: &[Var]) -> SatResult<()> {
    at_least_one(solver, vars)?;
    at_most_one(solver, vars)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::VarisatSolver;

    #[test]
    fn test_at_most_one_forbids_pairs() {
        let mut solver = VarisatSolver::new();
        let vars = solver.add_variables(3);
        at_most_one(&mut solver, &vars).unwrap();
        assert!(
            !solver
                .solve(&[vars[0].positive(), vars[2].positive()])
                .unwrap()
                .is_sat()
        );
        assert!(solver.solve(&[vars[1].positive()]).unwrap().is_sat());
    }

    #[test]
    fn test_at_least_one_requires_one() {
        let mut solver = VarisatSolver::new();
        let vars = solver.add_variables(2);
        at_least_one(&mut solver, &vars).unwrap();
        assert!(
            !solver
                .solve(&[vars[0].negative(), vars[1].negative()])
                .unwrap()
                .is_sat()
        );
    }

    #[test]
    fn test_at_most_one_lits_mixed_polarity() {
        let mut solver = VarisatSolver::new();
        let vars = solver.add_variables(2);
        // At most one of {a, !b}: forbids a && !b.
        at_most_one_lits(&mut solver, &[vars[0].positive(), vars[1].negative()]).unwrap();
        assert!(
            !solver
                .solve(&[vars[0].positive(), vars[1].negative()])
                .unwrap()
                .is_sat()
        );
    }
}
