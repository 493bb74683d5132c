/* Main Interface */

use crate::clause::{lbool, Lit, Var};

/// Main interface for a solver: it makes it possible to add CNF and XOR
/// clauses, allocate variables, and check for satisfiability.
pub trait SolverInterface {
    fn num_vars(&self) -> u32;
    fn num_clauses(&self) -> u64;
    fn num_xors(&self) -> u64;
    fn num_conflicts(&self) -> u64;
    fn num_propagations(&self) -> u64;
    fn num_decisions(&self) -> u64;
    fn num_restarts(&self) -> u64;

    fn is_ok(&self) -> bool;

    /// Print some current statistics to standard output.
    fn print_stats(&self);

    /// Creates a new SAT variable in the solver. If 'dvar' is cleared,
    /// the variable will not be used as a decision variable (NOTE! This has
    /// effects on the meaning of a SATISFIABLE result).
    fn new_var(&mut self, dvar: bool) -> Var;

    /// Create a new variable eligible for branching
    fn new_var_default(&mut self) -> Var;

    /// The variable with the given index, created on demand.
    fn var_of_int(&mut self, v_idx: u32) -> Var;

    /// Add a clause to the solver. Returns `false` if the solver is in
    /// an `UNSAT` state.
    fn add_clause_reuse(&mut self, clause: &mut Vec<Lit>) -> bool;

    /// Add an XOR clause (`vars[0] ^ … ^ vars[k] = rhs`) to the solver.
    /// Returns `false` if the solver is in an `UNSAT` state.
    fn add_xor_clause_reuse(&mut self, vars: &mut Vec<Var>, rhs: bool) -> bool;

    /// Simplify the clause database according to the current top-level
    /// assignment.
    fn simplify(&mut self) -> bool;

    /// Search for a model. Returns `TRUE` on sat, `FALSE` on unsat,
    /// `UNDEF` when a resource bound was hit or the solver was interrupted.
    fn solve(&mut self) -> lbool;

    /// Obtain the slice of literals that are proved at level 0.
    ///
    /// These literals will keep this value from now on.
    fn proved_at_lvl_0(&self) -> &[Lit];

    /// Query whole model
    ///
    /// Precondition: last result was `Sat` (ie `lbool::TRUE`)
    fn get_model(&self) -> &[lbool];

    /// Query model for var
    ///
    /// Precondition: last result was `Sat` (ie `lbool::TRUE`)
    fn value_var(&self, v: Var) -> lbool;

    /// Query model for lit
    fn value_lit(&self, l: Lit) -> lbool;

    /// Value of this literal if it's assigned at level 0, or `UNDEF` otherwise
    fn value_lvl_0(&self, l: Lit) -> lbool;
}
