//! Solver-independent literals, models and the solver trait.

use std::fmt;
use std::ops::Not;

use crate::error::SatResult;

/// A boolean variable, identified by a dense index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Var(pub(crate) u32);

impl Var {
    /// Index of the variable.
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }

    /// The literal asserting this variable.
    #[inline]
    pub fn positive(self) -> Lit {
        Lit::positive(self)
    }

    /// The literal denying this variable.
    #[inline]
    pub fn negative(self) -> Lit {
        Lit::negative(self)
    }
}

/// A variable together with a polarity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Lit {
    var: Var,
    negated: bool,
}

impl Lit {
    /// Build a literal from a variable and polarity (`true` = positive).
    #[inline]
    pub fn new(var: Var, polarity: bool) -> Self {
        Self {
            var,
            negated: !polarity,
        }
    }

    /// Positive literal of `var`.
    #[inline]
    pub fn positive(var: Var) -> Self {
        Self::new(var, true)
    }

    /// Negative literal of `var`.
    #[inline]
    pub fn negative(var: Var) -> Self {
        Self::new(var, false)
    }

    /// The underlying variable.
    #[inline]
    pub fn var(self) -> Var {
        self.var
    }

    /// Whether this literal asserts its variable.
    #[inline]
    pub fn is_positive(self) -> bool {
        !self.negated
    }
}

impl Not for Lit {
    type Output = Lit;

    fn not(self) -> Lit {
        Lit {
            var: self.var,
            negated: !self.negated,
        }
    }
}

impl fmt::Display for Lit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.negated {
            write!(f, "-{}", self.var.0 + 1)
        } else {
            write!(f, "{}", self.var.0 + 1)
        }
    }
}

/// A satisfying assignment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Model {
    values: Vec<bool>,
}

impl Model {
    /// Build a model from per-variable values.
    pub fn new(values: Vec<bool>) -> Self {
        Self { values }
    }

    /// Value of `var`; variables the backend did not report are false.
    #[inline]
    pub fn value(&self, var: Var) -> bool {
        self.values.get(var.index()).copied().unwrap_or(false)
    }

    /// Whether `lit` holds in this model.
    #[inline]
    pub fn is_true(&self, lit: Lit) -> bool {
        self.value(lit.var()) == lit.is_positive()
    }

    /// Number of variables in the model.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether the model is empty.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Outcome of a solver call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SolveOutcome {
    /// The formula is satisfiable under the assumptions.
    Satisfiable(Model),
    /// The formula is unsatisfiable under the assumptions.
    Unsatisfiable {
        /// Assumptions involved in the conflict. Empty when the formula is
        /// unsatisfiable without any assumption.
        core: Vec<Lit>,
    },
}

impl SolveOutcome {
    /// Whether the outcome is satisfiable.
    pub fn is_sat(&self) -> bool {
        matches!(self, SolveOutcome::Satisfiable(_))
    }

    /// The model, if satisfiable.
    pub fn model(&self) -> Option<&Model> {
        match self {
            SolveOutcome::Satisfiable(model) => Some(model),
            SolveOutcome::Unsatisfiable { .. } => None,
        }
    }
}

/// An incremental SAT solver used as a black box.
///
/// Clauses accumulate across calls; assumptions only hold for the call they
/// are passed to.
pub trait SatSolver {
    /// Create a fresh variable.
    fn add_variable(&mut self) -> Var;

    /// Create `n` fresh variables with consecutive indices.
    fn add_variables(&mut self, n: usize) -> Vec<Var> {
        (0..n).map(|_| self.add_variable()).collect()
    }

    /// Number of variables created so far.
    fn num_variables(&self) -> usize;

    /// Add a clause (a disjunction of literals).
    fn add_clause(&mut self, clause: &[Lit]) -> SatResult<()>;

    /// Solve under the given assumptions.
    fn solve(&mut self, assumptions: &[Lit]) -> SatResult<SolveOutcome>;
}
