/*****************************************************************************************[core.rs]
MiniSat -- Copyright (c) 2003-2006, Niklas Een, Niklas Sorensson

Permission is hereby granted, free of charge, to any person obtaining a copy of this software and
associated documentation files (the "Software"), to deal in the Software without restriction,
including without limitation the rights to use, copy, modify, merge, publish, distribute,
sublicense, and/or sell copies of the Software, and to permit persons to whom the Software is
furnished to do so, subject to the following conditions:

The above copyright notice and this permission notice shall be included in all copies or
substantial portions of the Software.

THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR IMPLIED, INCLUDING BUT
NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY, FITNESS FOR A PARTICULAR PURPOSE AND
NONINFRINGEMENT. IN NO EVENT SHALL THE AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM,
DAMAGES OR OTHER LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING FROM, OUT
OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE SOFTWARE.
**************************************************************************************************/

use {
    crate::callbacks::{Callbacks, ProgressStatus},
    crate::clause::{
        self, lbool, CRef, ClauseAllocator, ClauseRef, DeletePred, Lit, OccLists, OccListsData,
        VMap, Var, Watcher,
    },
    crate::config::{GaussConf, PolarityMode, RestartType, SolverConf},
    crate::gauss::{GaussEngine, GaussResult},
    crate::interface::SolverInterface,
    crate::intmap::{Comparator, Heap, HeapData},
    crate::xor::{self, XorClause, XorReason, XorSet},
    std::{
        cmp, fmt,
        io::{self, Write},
        mem,
        sync::{
            atomic::{AtomicBool, Ordering},
            Arc,
        },
    },
};

/// Length of the short glue window driving dynamic restarts.
const GLUE_WINDOW: usize = 64;
/// Restart when the short glue average exceeds the long one by this factor.
const GLUE_RESTART_RATIO: f64 = 1.15;
/// Conflicts sampled before the auto restart policy commits.
const RESTART_TYPE_DECIDE_CONFLICTS: u64 = 4000;
/// Fraction of glue<=2 learnts above which auto commits to dynamic restarts.
const RESTART_TYPE_GLUE2_RATIO: f64 = 0.4;

/// The main solver structure
///
/// A `Solver` object contains the whole state of the SAT solver: the clause
/// arena, the XOR store and its Gaussian matrices, the trail, and the
/// statistics. It is parametrized by `Callbacks`.
pub struct Solver<Cb: Callbacks> {
    /// If problem is satisfiable, this vector contains the model (if any).
    model: Vec<lbool>,

    cb: Cb, // the callbacks
    needs_interrupt: Arc<AtomicBool>,

    /// List of problem clauses (arena clauses only; binary and ternary
    /// clauses live inline in the watch lists).
    clauses: Vec<CRef>,
    /// List of learnt clauses.
    learnts: Vec<CRef>,

    v: SolverV,
}

/// A handle through which a signal hook (or another thread) can ask the
/// solver to stop at the next safe point.
#[derive(Clone)]
pub struct InterruptHandle(Arc<AtomicBool>);

impl InterruptHandle {
    pub fn interrupt(&self) {
        self.0.store(true, Ordering::SeqCst);
    }
    pub fn is_interrupted(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Why a variable is assigned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Reason {
    /// A decision, or a level-0 fact
    None,
    /// Propagated by an arena clause whose first literal is the assigned one
    Clause(CRef),
    /// Propagated by a binary clause; the payload is the other (false) literal
    Binary(Lit),
    /// Propagated by a ternary clause; the payload are the other two literals
    Ternary(Lit, Lit),
    /// Propagated by parity reasoning; index into the XOR reason store
    Xor(u32),
}

/// A conflicting constraint found by propagation.
#[derive(Debug, Clone, Copy)]
pub(crate) enum Confl {
    Bin(Lit, Lit),
    Tri(Lit, Lit, Lit),
    Long(CRef),
    /// Literals are in the `xor_confl` scratch buffer
    Xor,
}

#[derive(Debug, Clone, Copy)]
struct VarData {
    reason: Reason,
    level: i32,
}

impl Default for VarData {
    fn default() -> Self {
        Self {
            reason: Reason::None,
            level: 0,
        }
    }
}

impl VarData {
    #[inline(always)]
    fn new(reason: Reason, level: i32) -> Self {
        Self { reason, level }
    }
}

/// The current assignments.
struct VarState {
    /// A heuristic measurement of the activity of a variable.
    activity: VMap<f64>,
    /// Current assignment for each variable.
    ass: VMap<lbool>,
    /// Stores reason and level for each variable.
    vardata: VMap<VarData>,
    /// Amount to bump next variable with.
    var_inc: f64,
    var_decay: f64,

    /// Assignment stack; stores all assigments made in the order they were made.
    trail: Vec<Lit>,
    /// Separator indices for different decision levels in `trail`.
    trail_lim: Vec<i32>,
}

/// Search statistics, printed at the end of solving.
#[derive(Debug, Default)]
pub(crate) struct SolverStats {
    pub solves: u64,
    pub starts: u64,
    pub dynamic_starts: u64,
    pub static_starts: u64,
    pub full_starts: u64,
    pub decisions: u64,
    pub rnd_decisions: u64,
    pub propagations: u64,
    pub conflicts: u64,
    pub dec_vars: u64,
    pub max_literals: u64,
    pub tot_literals: u64,
    /// Learnts with glue <= 2
    pub nb_glue2: u64,
    /// Learnts of size 2, promoted to inline binaries
    pub num_new_bin: u64,
    /// Learnts of size 1, absorbed as level-0 units
    pub unit_learnts: u64,
    /// Learnts discarded on backjump for exceeding the glue bound
    pub nb_cl_over_max_glue: u64,
    /// Clauses shrunk by on-the-fly self-subsuming resolution
    pub improved_clauses: u64,
    pub improved_clause_lits: u64,
}

struct SolverV {
    conf: SolverConf,
    vars: VarState,
    stats: SolverStats,

    learntsize_adjust_start_confl: i32,
    learntsize_adjust_inc: f64,
    max_learnts: f64,
    learntsize_adjust_confl: f64,
    learntsize_adjust_cnt: i32,
    learntsize_factor: f64,
    learntsize_inc: f64,

    num_clauses: u64,
    num_learnts: u64,
    clauses_literals: u64,
    learnts_literals: u64,
    num_bin_clauses: u64,
    num_bin_learnts: u64,
    num_tri_clauses: u64,

    /// The preferred polarity of each variable (phase cache).
    polarity: VMap<bool>,
    /// Declares if a variable is eligible for selection in the decision heuristic.
    decision: VMap<bool>,
    /// `watches[lit]` is a list of constraints watching 'lit' (will go there if literal becomes true).
    watches_data: OccListsData<Lit, Watcher>,
    /// A priority queue of variables ordered with respect to the variable activity.
    order_heap_data: HeapData<Var>,
    /// If `false`, the constraints are already unsatisfiable. No part of the solver state may be used!
    ok: bool,
    /// Amount to bump next clause with.
    cla_inc: f64,
    /// Head of the propagation queue (as index into the trail).
    qhead: i32,
    /// Next variable to be created.
    next_var: Var,
    ca: ClauseAllocator,
    random_seed: f64,

    // XOR machinery
    xors: XorSet,
    /// Synthesized reasons for parity-forced assignments, popped on backtrack
    xor_reasons: Vec<XorReason>,
    xor_units: Vec<(Lit, u32)>, // scratch
    xor_confl: Vec<Lit>,        // scratch: blamed literals of a parity conflict
    gauss: GaussEngine,

    // restart machinery
    restart_type: RestartType,
    restart_decided: bool,
    glue_win: std::collections::VecDeque<u32>,
    glue_win_sum: u64,
    glue_total_sum: u64,
    glue_total_cnt: u64,

    /// Learnts over the glue bound: (installation level, handle); discarded
    /// on the next backjump below the installation level
    over_glue: Vec<(u32, CRef)>,

    /// Clauses to shrink by on-the-fly self-subsumption: (handle, literal)
    otf_queue: Vec<(CRef, Lit)>,

    // simplify episode scheduling
    next_simplify: u64,
    simp_mult_accum: f64,

    // Temporaries (to reduce allocation overhead)
    seen: VMap<bool>,
    minimize_stack: Vec<Lit>,
    analyze_toclear: Vec<Lit>,
    tmp_analyze: Vec<Lit>,
    level_stamp: Vec<u64>,
    stamp_gen: u64,

    // Resource contraints:
    conflict_budget: i64,
    propagation_budget: i64,
    progress_estimate: f64,
}

/// Print the model as DIMACS
pub struct SolverPrintDimacs<'a, Cb: Callbacks + 'a> {
    s: &'a Solver<Cb>,
}

mod dimacs_out {
    use super::*;

    impl<'a, Cb: Callbacks> fmt::Display for SolverPrintDimacs<'a, Cb> {
        fn fmt(&self, out: &mut fmt::Formatter) -> fmt::Result {
            write!(out, "v ")?;
            for (i, &val) in self.s.model.iter().enumerate() {
                if val == lbool::TRUE {
                    write!(out, "{} ", i + 1)?
                } else if val == lbool::FALSE {
                    write!(out, "-{} ", i + 1)?
                }
            }
            write!(out, "0")
        }
    }
}

// public API
impl<Cb: Callbacks> SolverInterface for Solver<Cb> {
    fn new_var(&mut self, dvar: bool) -> Var {
        self.v.new_var(dvar)
    }

    fn new_var_default(&mut self) -> Var {
        self.new_var(true)
    }

    fn var_of_int(&mut self, v_idx: u32) -> Var {
        while v_idx >= self.num_vars() {
            self.new_var_default();
        }
        let var = Var::from_idx(v_idx);
        debug_assert_eq!(var.idx(), v_idx);
        var
    }

    // in the API, we can only add clauses at level 0
    fn add_clause_reuse(&mut self, clause: &mut Vec<Lit>) -> bool {
        debug!("add toplevel clause {:?}", clause);
        debug_assert_eq!(
            self.v.decision_level(),
            0,
            "add clause at non-zero decision level"
        );
        clause.sort_unstable();
        self.add_clause_(clause)
    }

    fn add_xor_clause_reuse(&mut self, vars: &mut Vec<Var>, rhs: bool) -> bool {
        debug!("add toplevel xor clause {:?} = {}", vars, rhs);
        debug_assert_eq!(self.v.decision_level(), 0);
        self.add_xor_clause_(vars, rhs)
    }

    fn solve(&mut self) -> lbool {
        self.solve_internal()
    }

    #[inline(always)]
    fn simplify(&mut self) -> bool {
        self.simplify_inner(false)
    }

    fn value_var(&self, v: Var) -> lbool {
        self.model
            .get(v.idx() as usize)
            .map_or(lbool::UNDEF, |&v| v)
    }
    fn value_lit(&self, v: Lit) -> lbool {
        self.value_var(v.var()) ^ !v.sign()
    }
    fn get_model(&self) -> &[lbool] {
        &self.model
    }
    fn is_ok(&self) -> bool {
        self.v.ok
    }

    fn num_vars(&self) -> u32 {
        self.v.num_vars()
    }
    fn num_clauses(&self) -> u64 {
        self.v.num_clauses + self.v.num_bin_clauses + self.v.num_tri_clauses
    }
    fn num_xors(&self) -> u64 {
        self.v.xors.len() as u64
    }
    fn num_conflicts(&self) -> u64 {
        self.v.stats.conflicts
    }
    fn num_propagations(&self) -> u64 {
        self.v.stats.propagations
    }
    fn num_decisions(&self) -> u64 {
        self.v.stats.decisions
    }
    fn num_restarts(&self) -> u64 {
        self.v.stats.starts
    }

    fn value_lvl_0(&self, lit: Lit) -> lbool {
        let mut res = self.v.value_lit(lit);
        if self.v.level(lit.var()) != 0 {
            res = lbool::UNDEF;
        }
        res
    }

    fn print_stats(&self) {
        self.print_stats_internal()
    }

    fn proved_at_lvl_0(&self) -> &[Lit] {
        self.v.vars.proved_at_lvl_0()
    }
}

impl<Cb: Callbacks + Default> Default for Solver<Cb> {
    fn default() -> Self {
        Solver::new(SolverConf::default(), GaussConf::default(), Default::default())
    }
}

// main algorithm
impl<Cb: Callbacks> Solver<Cb> {
    /// Create a new solver with the given configuration and callbacks.
    pub fn new(conf: SolverConf, gauss_conf: GaussConf, cb: Cb) -> Self {
        assert!(conf.check(), "invalid solver configuration");
        assert!(gauss_conf.check(), "invalid gauss configuration");
        Self {
            model: vec![],
            cb,
            clauses: vec![],
            learnts: vec![],
            needs_interrupt: Arc::new(AtomicBool::new(false)),
            v: SolverV::new(conf, gauss_conf),
        }
    }

    /// A handle that interrupts this solver when triggered.
    pub fn interrupt_handle(&self) -> InterruptHandle {
        InterruptHandle(self.needs_interrupt.clone())
    }

    pub fn is_interrupted(&self) -> bool {
        self.needs_interrupt.load(Ordering::SeqCst)
    }

    /// Limit the number of conflicts of the next solve; negative means none.
    pub fn set_conflict_budget(&mut self, budget: i64) {
        self.v.conflict_budget = budget;
    }

    /// Temporary access to the callbacks
    pub fn cb_mut(&mut self) -> &mut Cb {
        &mut self.cb
    }

    /// Temporary access to the callbacks
    pub fn cb(&self) -> &Cb {
        &self.cb
    }

    pub fn conf(&self) -> &SolverConf {
        &self.v.conf
    }

    pub fn dimacs_model(&self) -> SolverPrintDimacs<Cb> {
        SolverPrintDimacs { s: self }
    }

    fn within_budget(&self) -> bool {
        !self.is_interrupted()
            && (self.v.conflict_budget < 0
                || self.v.stats.conflicts < self.v.conflict_budget as u64)
            && (self.v.propagation_budget < 0
                || self.v.stats.propagations < self.v.propagation_budget as u64)
            && !self.cb.stop()
    }

    /// Search for a model for up to `nof_conflicts` conflicts (negative
    /// means no bound; the dynamic restart policy then decides).
    ///
    /// # Output:
    ///
    /// - `lbool::TRUE` if a satisfying assignment is found
    /// - `lbool::FALSE` if the clause set is unsatisfiable
    /// - `lbool::UNDEF` on a restart or an exhausted budget
    fn search(&mut self, nof_conflicts: i32, tmp_learnt: &mut Vec<Lit>) -> lbool {
        debug_assert!(self.v.ok);
        let mut conflict_c = 0i32;
        self.v.stats.starts += 1;

        loop {
            let mut confl = self.v.propagate();

            if confl.is_none() {
                if !self.within_budget() || (nof_conflicts >= 0 && conflict_c >= nof_conflicts) {
                    // budget reached or interrupt: drain at level 0
                    self.v.progress_estimate = self.v.progress_estimate();
                    self.v.cancel_until(0);
                    return lbool::UNDEF;
                }

                if self.v.decision_level() == 0
                    && self.v.conf.do_sched_simp
                    && self.v.stats.conflicts >= self.v.next_simplify
                {
                    if !self.simplify_inner(true) {
                        return lbool::FALSE;
                    }
                }

                if self.learnts.len() as f64 - self.v.num_assigns() as f64 >= self.v.max_learnts {
                    // Reduce the set of learnt clauses:
                    self.reduce_db();
                }

                if self.v.gauss.active_at(self.v.decision_level()) {
                    let (gconfl, propagated) = self.v.run_gauss();
                    if gconfl.is_some() {
                        // the blamed literals may all sit below the current
                        // level; analysis needs the conflict at the top level
                        let maxlvl = self
                            .v
                            .xor_confl
                            .iter()
                            .map(|&l| self.v.level_lit(l) as u32)
                            .max()
                            .unwrap_or(0);
                        if maxlvl < self.v.decision_level() {
                            self.v.cancel_until(maxlvl);
                        }
                        confl = gconfl;
                    } else if propagated {
                        continue; // drain the forced assignments first
                    }
                }
            }

            if let Some(confl) = confl {
                // conflict analysis
                self.v.stats.conflicts += 1;
                conflict_c += 1;
                if self.v.decision_level() == 0 {
                    return lbool::FALSE;
                }

                let btlevel = self.v.analyze(confl, &self.learnts, tmp_learnt);
                self.record_learnt(btlevel, tmp_learnt);

                self.v.vars.var_decay_activity();
                self.v.cla_decay_activity();
                self.v.maybe_commit_restart_type();

                self.v.learntsize_adjust_cnt -= 1;
                if self.v.learntsize_adjust_cnt == 0 {
                    self.v.learntsize_adjust_confl *= self.v.learntsize_adjust_inc;
                    self.v.learntsize_adjust_cnt = self.v.learntsize_adjust_confl as i32;
                    self.v.max_learnts *= self.v.learntsize_inc;

                    let v = &self.v;
                    self.cb.on_progress(|| ProgressStatus {
                        conflicts: v.stats.conflicts,
                        dec_vars: v.stats.dec_vars as i64 - v.vars.proved_at_lvl_0().len() as i64,
                        n_clauses: v.num_clauses + v.num_bin_clauses + v.num_tri_clauses,
                        n_xors: v.xors.len() as u64,
                        max_learnt: v.max_learnts as i64,
                        n_learnt: v.num_learnts + v.num_bin_learnts,
                        avg_glue: if v.glue_total_cnt == 0 {
                            0.0
                        } else {
                            v.glue_total_sum as f64 / v.glue_total_cnt as f64
                        },
                        progress_estimate: v.progress_estimate() * 100.0,
                    });
                }

                if self.v.restart_type == RestartType::Dynamic && self.v.check_dynamic_restart() {
                    self.v.progress_estimate = self.v.progress_estimate();
                    self.v.cancel_until(0);
                    return lbool::UNDEF;
                }

                // a due simplification episode forces the search back to the root
                if self.v.conf.do_sched_simp
                    && self.v.stats.conflicts >= self.v.next_simplify
                    && self.v.decision_level() > 0
                {
                    self.v.cancel_until(0);
                }
            } else {
                // new variable decision:
                let next = self.v.pick_branch_lit();
                if next == Lit::UNDEF {
                    // full assignment: the watch schemes guarantee no clause
                    // and no parity constraint is violated
                    return lbool::TRUE;
                }
                self.v.stats.decisions += 1;
                self.v.vars.new_decision_level();
                debug!("pick-next {:?}", next);
                self.v.vars.unchecked_enqueue(next, Reason::None);
            }
        }
    }

    /// Backjump and install the clause produced by conflict analysis.
    fn record_learnt(&mut self, btlevel: i32, learnt: &Vec<Lit>) {
        debug_assert!(!learnt.is_empty());
        let glue = self.v.calc_glue(learnt);
        self.v.cancel_until(btlevel as u32);
        self.v.apply_otf_shrinks();

        self.cb.on_new_clause(learnt, clause::Kind::Learnt);

        if learnt.len() == 1 {
            // directly propagate the unit clause at level 0
            self.v.vars.unchecked_enqueue(learnt[0], Reason::None);
            self.v.stats.unit_learnts += 1;
        } else if learnt.len() == 2 {
            self.v.attach_bin(learnt[0], learnt[1], true);
            self.v.stats.num_new_bin += 1;
            self.v
                .vars
                .unchecked_enqueue(learnt[0], Reason::Binary(learnt[1]));
        } else {
            let cr = self.v.ca.alloc(learnt, true);
            {
                let mut c = self.v.ca.get_mut(cr);
                c.set_glue(glue);
                if glue <= 2 {
                    c.set_protected(true);
                }
            }
            self.learnts.push(cr);
            self.v.attach_clause(cr);
            self.v.cla_bump_activity(&self.learnts, cr);
            self.v.vars.unchecked_enqueue(learnt[0], Reason::Clause(cr));

            if self.v.restart_type == RestartType::Dynamic && glue > self.v.conf.max_glue {
                self.v.over_glue.push((btlevel as u32, cr));
                self.v.stats.nb_cl_over_max_glue += 1;
            }
        }

        if learnt.len() > 1 && glue <= 2 {
            self.v.stats.nb_glue2 += 1;
        }
        self.v.record_glue(glue);
    }

    /// Main solve method.
    fn solve_internal(&mut self) -> lbool {
        assert_eq!(self.v.decision_level(), 0);
        self.model.clear();
        if !self.v.ok {
            return lbool::FALSE;
        }

        self.v.stats.solves += 1;
        let mut tmp_learnt: Vec<Lit> = vec![];

        self.v.max_learnts = self.num_clauses() as f64 * self.v.learntsize_factor;
        if self.v.max_learnts < 1000.0 {
            self.v.max_learnts = 1000.0;
        }
        self.v.learntsize_adjust_confl = self.v.learntsize_adjust_start_confl as f64;
        self.v.learntsize_adjust_cnt = self.v.learntsize_adjust_confl as i32;

        // effective restart policy; auto starts static and commits after sampling
        self.v.restart_type = match self.v.conf.fix_restart_type {
            RestartType::Auto => RestartType::Static,
            t => t,
        };
        self.v.restart_decided = self.v.conf.fix_restart_type != RestartType::Auto;
        self.v.clear_glue_history();

        if self.v.conf.polarity_mode == PolarityMode::Auto {
            self.v.calc_polarity_jw(&self.clauses);
        }
        self.v.rebuild_gauss();
        self.v.next_simplify = self.v.stats.conflicts + self.v.conf.simp_start_confl;
        self.v.simp_mult_accum = self.v.conf.simp_start_mult;

        info!("search.start");
        self.cb.on_start();

        // Search:
        let mut curr_restarts: u32 = 0;
        let mut status;
        loop {
            let nof_conflicts = if self.v.restart_type == RestartType::Dynamic {
                -1
            } else {
                let rest_base = utils::luby(self.v.conf.restart_inc, curr_restarts as i32);
                (rest_base * self.v.conf.restart_first as f64) as i32
            };
            status = self.search(nof_conflicts, &mut tmp_learnt);
            if !self.within_budget() {
                status = lbool::UNDEF;
                break;
            }
            if status != lbool::UNDEF {
                break;
            }

            info!("search.restart({})", curr_restarts);
            curr_restarts += 1;
            if self.v.restart_type == RestartType::Dynamic {
                self.v.stats.dynamic_starts += 1;
            } else {
                self.v.stats.static_starts += 1;
            }
            self.cb.on_restart();
            if curr_restarts >= self.v.conf.max_restarts {
                // restart budget exhausted: undetermined
                break;
            }
        }

        self.cb.on_result(status);

        if status == lbool::TRUE {
            // Extend & copy model:
            let num_vars = self.num_vars();
            self.model.resize(num_vars as usize, lbool::UNDEF);
            for i in 0..num_vars {
                self.model[i as usize] = self.v.value(Var::from_idx(i));
            }
        } else if status == lbool::FALSE {
            self.v.ok = false;
        }

        self.v.cancel_until(0);
        debug!("res: {:?}", status);
        status
    }

    /// Remove half of the learnt clauses, minus the clauses locked by the
    /// current assignment. Low-glue (protected) clauses are never removed.
    fn reduce_db(&mut self) {
        debug!("reduce_db.start");

        {
            let ca = &self.v.ca;
            self.learnts.retain(|&cr| ca.get_ref(cr).mark() != 1);
            // worst first: high glue, then low activity
            self.learnts.sort_unstable_by(|&x, &y| {
                let x = ca.get_ref(x);
                let y = ca.get_ref(y);
                debug_assert!(x.learnt());
                debug_assert!(y.learnt());
                Ord::cmp(&y.glue(), &x.glue()).then(
                    PartialOrd::partial_cmp(&x.activity(), &y.activity()).expect("NaN activity"),
                )
            });
        }
        let extra_lim = self.v.cla_inc / self.learnts.len() as f64;

        let mut j = 0;
        for i in 0..self.learnts.len() {
            let cr = self.learnts[i];
            let cond = {
                let c = self.v.ca.get_ref(cr);
                !c.protected()
                    && !self.v.locked(cr)
                    && (i < self.learnts.len() / 2 || (c.activity() as f64) < extra_lim)
            };
            if cond {
                self.v.remove_clause(cr);
                self.cb.on_delete_clause(self.v.ca.get_ref(cr).lits());
            } else {
                self.learnts[j] = cr;
                j += 1;
            }
        }

        let _deleted = self.learnts.len() - j;
        self.learnts.resize(j, CRef::UNDEF);

        debug!("reduce_db.done (deleted {})", _deleted);

        self.check_garbage();
    }

    /// Shrink the given set to contain only non-satisfied clauses.
    fn remove_satisfied(&mut self, learnt: bool) {
        debug_assert_eq!(self.v.decision_level(), 0);
        let cs: &mut Vec<CRef> = if learnt {
            &mut self.learnts
        } else {
            &mut self.clauses
        };
        let self_v = &mut self.v;
        cs.retain(|&cr| {
            if self_v.ca.get_ref(cr).mark() == 1 {
                return false; // already freed (over-glue discard or OTF shrink)
            }
            let satisfied = self_v.satisfied(self_v.ca.get_ref(cr));
            if satisfied {
                self_v.remove_clause(cr);
                debug!("remove satisfied clause {:?}", self_v.ca.get_ref(cr).lits());
            } else {
                let amount_shaved = {
                    let mut c = self_v.ca.get_mut(cr);
                    // Trim clause (but keep the 2 first lits as they are watching):
                    debug_assert_eq!(self_v.vars.value_lit(c[0]), lbool::UNDEF);
                    debug_assert_eq!(self_v.vars.value_lit(c[1]), lbool::UNDEF);
                    let mut k = 2;
                    let orig_size = c.size();
                    let mut end = c.size();
                    while k < end && end > 3 {
                        if self_v.vars.value_lit(c[k]) == lbool::FALSE {
                            debug_assert!(self_v.vars.level(c[k].var()) == 0);
                            end -= 1;
                            let last = c[end];
                            c[k] = last;
                        } else {
                            k += 1;
                        }
                    }
                    c.shrink(end);
                    orig_size - end
                };
                self_v.ca.free_amount(amount_shaved as usize);
            }
            !satisfied
        });
    }

    /// One simplification episode at level 0. `scheduled` episodes also count
    /// as a full restart and push the schedule forward.
    fn simplify_inner(&mut self, scheduled: bool) -> bool {
        debug_assert_eq!(self.v.decision_level(), 0);
        if !self.v.ok || self.v.propagate().is_some() {
            self.v.ok = false;
            return false;
        }

        self.cb.on_simplify();

        self.remove_satisfied(true); // learnt clauses
        self.remove_satisfied(false); // original clauses
        self.v.clean_bin_tri_watches();

        if !self.v.simplify_xors() {
            self.v.ok = false;
            return false;
        }
        if self.v.propagate().is_some() {
            self.v.ok = false;
            return false;
        }

        if self.v.conf.do_sort_watched {
            self.v.sort_watches();
        }
        self.check_garbage();
        self.v.rebuild_order_heap();
        self.v.rebuild_gauss();

        if scheduled {
            // full restart: reset glue history and phase biases, re-enable
            // any disabled matrix
            self.v.stats.full_starts += 1;
            self.v.clear_glue_history();
            self.v.gauss.re_enable();
            if self.v.conf.polarity_mode == PolarityMode::Auto {
                self.v.calc_polarity_jw(&self.clauses);
            }
            let gap = (self.v.conf.simp_start_confl as f64 * self.v.simp_mult_accum) as u64;
            self.v.next_simplify = self.v.stats.conflicts + gap.max(1);
            self.v.simp_mult_accum *= self.v.conf.simp_start_mult;
        }

        true
    }

    /// Garbage collect the clause allocator by moving alive clauses into
    /// another allocator.
    fn garbage_collect(&mut self) {
        let mut to = ClauseAllocator::with_start_cap(self.v.ca.len() - self.v.ca.wasted());

        self.v
            .reloc_all(&mut self.learnts, &mut self.clauses, &mut to);

        self.cb.on_gc(
            self.v.ca.len() * ClauseAllocator::UNIT_SIZE as usize,
            to.len() * ClauseAllocator::UNIT_SIZE as usize,
        );
        self.v.ca = to;
    }

    /// Check whether the space wasted by dead clauses in the clause allocator
    /// exceeds the threshold
    fn check_garbage(&mut self) {
        if self.v.ca.wasted() as f64 > self.v.ca.len() as f64 * self.v.conf.garbage_frac {
            self.garbage_collect();
        }
    }

    /// Add clause; returns `false` if the solver is now in an UNSAT state.
    ///
    /// Precondition: `clause` is sorted.
    fn add_clause_(&mut self, clause: &mut Vec<Lit>) -> bool {
        if !self.v.ok {
            return false;
        }

        let mut last_lit = Lit::UNDEF;
        let mut j = 0;
        // remove duplicates, drop tautologies and level-0 falsified literals
        for i in 0..clause.len() {
            let lit_i = clause[i];
            let value = self.v.value_lit(lit_i);
            let lvl = self.v.level_lit(lit_i);
            if (value == lbool::TRUE && lvl == 0) || lit_i == !last_lit {
                return true; // tauto or satisfied already at level 0
            } else if !(value == lbool::FALSE && lvl == 0) && lit_i != last_lit {
                // not a duplicate
                last_lit = lit_i;
                clause[j] = lit_i;
                j += 1;
            }
        }

        clause.truncate(j);
        match clause.len() {
            0 => {
                self.v.ok = false;
                false
            }
            1 => {
                self.v.vars.unchecked_enqueue(clause[0], Reason::None);
                true
            }
            2 => {
                self.v.attach_bin(clause[0], clause[1], false);
                true
            }
            3 => {
                self.v.attach_tri(clause[0], clause[1], clause[2]);
                true
            }
            _ => {
                let cr = self.v.ca.alloc(&clause, false);
                self.clauses.push(cr);
                self.v.attach_clause(cr);
                true
            }
        }
    }

    /// Add an XOR clause at level 0.
    fn add_xor_clause_(&mut self, vars: &mut Vec<Var>, mut rhs: bool) -> bool {
        if !self.v.ok {
            return false;
        }
        xor::normalize_vars(vars);
        // substitute level-0 assignments
        vars.retain(|&v| {
            let val = self.v.value(v);
            if val == lbool::UNDEF || self.v.level(v) != 0 {
                true
            } else {
                rhs ^= val == lbool::TRUE;
                false
            }
        });

        match vars.len() {
            0 => {
                if rhs {
                    // 0 = 1
                    self.v.ok = false;
                }
                self.v.ok
            }
            1 => {
                let lit = Lit::new(vars[0], rhs);
                let val = self.v.value_lit(lit);
                if val == lbool::FALSE {
                    self.v.ok = false;
                } else if val == lbool::UNDEF {
                    self.v.vars.unchecked_enqueue(lit, Reason::None);
                }
                self.v.ok
            }
            _ => {
                self.v.xors.add(XorClause::new(vars.clone(), rhs));
                true
            }
        }
    }
}

impl SolverV {
    #[inline(always)]
    pub fn num_assigns(&self) -> u32 {
        self.vars.num_assigns()
    }

    #[inline(always)]
    fn num_vars(&self) -> u32 {
        self.next_var.idx()
    }

    #[inline(always)]
    pub fn level(&self, x: Var) -> i32 {
        self.vars.level(x)
    }

    #[inline(always)]
    pub fn level_lit(&self, x: Lit) -> i32 {
        self.level(x.var())
    }

    #[inline(always)]
    pub fn value(&self, x: Var) -> lbool {
        self.vars.value(x)
    }

    #[inline(always)]
    pub fn value_lit(&self, x: Lit) -> lbool {
        self.vars.value_lit(x)
    }

    #[inline(always)]
    pub fn decision_level(&self) -> u32 {
        self.vars.decision_level()
    }

    #[inline(always)]
    fn reason(&self, x: Var) -> Reason {
        self.vars.reason(x)
    }

    fn order_heap(&mut self) -> Heap<Var, VarOrder> {
        self.order_heap_data.promote(VarOrder {
            activity: &self.vars.activity,
        })
    }

    fn set_decision_var(&mut self, v: Var, b: bool) {
        if b && !self.decision[v] {
            self.stats.dec_vars += 1;
        } else if !b && self.decision[v] {
            self.stats.dec_vars -= 1;
        }
        self.decision[v] = b;
        self.insert_var_order(v);
    }

    fn insert_var_order(&mut self, x: Var) {
        if !self.order_heap().in_heap(x) && self.decision[x] {
            self.order_heap().insert(x);
        }
    }

    fn cla_decay_activity(&mut self) {
        self.cla_inc *= 1.0 / self.conf.clause_decay;
    }

    fn cla_bump_activity(&mut self, learnts: &[CRef], cr: CRef) {
        let new_activity = {
            let mut c = self.ca.get_mut(cr);
            let r = c.activity() + self.cla_inc as f32;
            c.set_activity(r);
            r
        };
        if new_activity > 1e20 {
            // Rescale:
            for &learnt in learnts.iter() {
                let mut c = self.ca.get_mut(learnt);
                let r = c.activity() * 1e-20;
                c.set_activity(r);
            }
            self.cla_inc *= 1e-20;
        }
    }

    fn watches(&mut self) -> OccLists<Lit, Watcher, WatcherDeleted> {
        self.watches_data.promote(WatcherDeleted { ca: &self.ca })
    }

    fn new_var(&mut self, dvar: bool) -> Var {
        let v = self.next_var;
        self.next_var = Var::from_idx(self.next_var.idx() + 1);
        self.watches().init(Lit::new(v, false));
        self.watches().init(Lit::new(v, true));
        self.xors.init_var(v);
        self.vars.ass.insert_default(v, lbool::UNDEF);
        self.vars.vardata.insert_default(v, VarData::default());
        self.vars.activity.insert_default(v, 0.0);
        self.seen.insert_default(v, false);
        self.polarity.insert_default(v, false);
        self.decision.reserve_default(v);
        self.set_decision_var(v, dvar);
        v
    }

    /// Propagates all enqueued facts through the CNF watch lists and the
    /// XOR watch scheme, in strict FIFO order over the trail.
    ///
    /// # Post-conditions:
    ///
    /// - the propagation queue is empty, even if there was a conflict.
    fn propagate(&mut self) -> Option<Confl> {
        let mut confl = None;
        let mut num_props: u32 = 0;

        while (self.qhead as usize) < self.vars.trail.len() {
            // `p` is the next enqueued fact to propagate.
            let p = self.vars.trail[self.qhead as usize];
            self.qhead += 1;
            num_props += 1;

            confl = self.propagate_lit_cnf(p);
            if confl.is_none() && self.xors.len() > 0 {
                confl = self.propagate_xor_var(p.var());
            }
            if confl.is_some() {
                self.qhead = self.vars.trail.len() as i32;
                break;
            }
        }
        self.stats.propagations += num_props as u64;

        confl
    }

    /// Scan the CNF watch list of the newly true literal `p`.
    fn propagate_lit_cnf(&mut self, p: Lit) -> Option<Confl> {
        let mut confl = None;
        // watchers of long clauses moved to another list during the scan
        let mut pending: Vec<(Lit, Watcher)> = Vec::new();
        {
            let vars = &mut self.vars;
            let ca = &mut self.ca;
            let ws = self
                .watches_data
                .lookup_mut_pred(p, &WatcherDeleted { ca });
            let mut i: usize = 0;
            let mut j: usize = 0;
            let end: usize = ws.len();
            'watchers: while i < end {
                let w = ws[i];
                match w {
                    Watcher::Binary { other, .. } => {
                        ws[j] = w;
                        j += 1;
                        i += 1;
                        let val = vars.value_lit(other);
                        if val == lbool::FALSE {
                            confl = Some(Confl::Bin(!p, other));
                            break 'watchers;
                        } else if val == lbool::UNDEF {
                            vars.unchecked_enqueue(other, Reason::Binary(!p));
                        }
                    }
                    Watcher::Ternary { a, b } => {
                        ws[j] = w;
                        j += 1;
                        i += 1;
                        let va = vars.value_lit(a);
                        let vb = vars.value_lit(b);
                        if va == lbool::TRUE || vb == lbool::TRUE {
                            continue;
                        }
                        if va == lbool::FALSE && vb == lbool::FALSE {
                            confl = Some(Confl::Tri(!p, a, b));
                            break 'watchers;
                        }
                        if va == lbool::FALSE {
                            vars.unchecked_enqueue(b, Reason::Ternary(!p, a));
                        } else if vb == lbool::FALSE {
                            vars.unchecked_enqueue(a, Reason::Ternary(!p, b));
                        }
                        // both undefined: nothing to do yet
                    }
                    Watcher::Long { cref, blocker } => {
                        // Try to avoid inspecting the clause:
                        if vars.value_lit(blocker) == lbool::TRUE {
                            ws[j] = w;
                            j += 1;
                            i += 1;
                            continue;
                        }

                        // Make sure the false literal is lits[1]:
                        let mut c = ca.get_mut(cref);
                        let false_lit = !p;
                        if c[0] == false_lit {
                            c.lits_mut().swap(0, 1);
                        }
                        debug_assert_eq!(c[1], false_lit);
                        i += 1;

                        // If 0th watch is true, then clause is already satisfied.
                        let first = c[0];
                        let w = Watcher::Long {
                            cref,
                            blocker: first,
                        };
                        if first != blocker && vars.value_lit(first) == lbool::TRUE {
                            ws[j] = w;
                            j += 1;
                            continue;
                        }

                        // Look for new watch:
                        let mut found = false;
                        for k in 2..c.size() {
                            if vars.value_lit(c[k]) != lbool::FALSE {
                                let ck = c[k];
                                c[1] = ck;
                                c[k] = false_lit;
                                debug_assert_ne!(!ck, p);
                                pending.push((!ck, w));
                                found = true;
                                break;
                            }
                        }
                        if found {
                            continue 'watchers;
                        }

                        // Did not find watch -- clause is unit under assignment:
                        ws[j] = w;
                        j += 1;
                        if vars.value_lit(first) == lbool::FALSE {
                            confl = Some(Confl::Long(cref));
                            break 'watchers;
                        } else {
                            vars.unchecked_enqueue(first, Reason::Clause(cref));
                        }
                    }
                }
            }
            // Copy the remaining watches on an early exit:
            while i < end {
                ws[j] = ws[i];
                j += 1;
                i += 1;
            }
            ws.truncate(j);
        }
        for (l, w) in pending {
            self.watches_data[l].push(w);
        }
        confl
    }

    /// Wake the XOR clauses watching the just-assigned variable.
    fn propagate_xor_var(&mut self, v: Var) -> Option<Confl> {
        self.xor_units.clear();
        let level = self.decision_level();
        let ok = self.xors.propagate_var(
            v,
            &self.vars.ass,
            level,
            &mut self.xor_reasons,
            &mut self.xor_units,
            &mut self.xor_confl,
        );
        if !ok {
            return Some(Confl::Xor);
        }
        self.enqueue_parity_units()
    }

    /// Run one Gaussian elimination round; returns a conflict and whether
    /// anything was propagated.
    fn run_gauss(&mut self) -> (Option<Confl>, bool) {
        self.xor_units.clear();
        let level = self.decision_level();
        let res = self.gauss.perform(
            &self.vars.ass,
            level,
            &mut self.xor_reasons,
            &mut self.xor_units,
            &mut self.xor_confl,
        );
        if res == GaussResult::Confl {
            return (Some(Confl::Xor), false);
        }
        let had_units = !self.xor_units.is_empty();
        let confl = self.enqueue_parity_units();
        if confl.is_none() && had_units {
            self.gauss.sum_unit_truths += self.xor_units.len() as u64;
        }
        (confl, had_units)
    }

    /// Enqueue the parity-forced assignments gathered in `xor_units`.
    fn enqueue_parity_units(&mut self) -> Option<Confl> {
        let units = mem::take(&mut self.xor_units);
        let mut confl = None;
        for &(lit, ridx) in &units {
            let val = self.vars.value_lit(lit);
            if val == lbool::TRUE {
                continue;
            }
            if val == lbool::FALSE {
                // forced both ways: the reason clause is falsified outright
                self.xor_confl.clear();
                let lits = &self.xor_reasons[ridx as usize].lits;
                self.xor_confl.extend_from_slice(lits);
                confl = Some(Confl::Xor);
                break;
            }
            self.vars.unchecked_enqueue(lit, Reason::Xor(ridx));
        }
        self.xor_units = units;
        confl
    }

    /// Analyze a conflict and produce a learnt clause by first-UIP
    /// resolution over the reverse trail.
    ///
    /// # Pre-conditions:
    ///
    /// - current decision level must be greater than root level.
    ///
    /// # Post-conditions:
    ///
    /// - the backjump level is returned.
    /// - `out_learnt[0]` is the asserting literal at the backjump level.
    /// - if `out_learnt.len() > 1` then `out_learnt[1]` has the greatest
    ///   decision level of the rest of literals.
    fn analyze(&mut self, confl: Confl, learnts: &[CRef], out_learnt: &mut Vec<Lit>) -> i32 {
        debug!("analyze.start {:?}", confl);
        out_learnt.clear();
        out_learnt.push(Lit::UNDEF); // leave room for the asserting literal

        let conflict_level = self.decision_level() as i32;
        let mut path_c = 0i32;
        let mut p = Lit::UNDEF;
        let mut index = self.vars.trail.len();
        let mut cur: Option<Confl> = Some(confl);

        loop {
            // resolvent size before this step, for the subsumption check
            let r_before = path_c + out_learnt.len() as i32 - 1;

            // gather the literals to resolve with
            self.tmp_analyze.clear();
            let mut otf_candidate = None;
            match cur.take() {
                Some(Confl::Bin(a, b)) => {
                    self.tmp_analyze.push(a);
                    self.tmp_analyze.push(b);
                }
                Some(Confl::Tri(a, b, c)) => {
                    self.tmp_analyze.push(a);
                    self.tmp_analyze.push(b);
                    self.tmp_analyze.push(c);
                }
                Some(Confl::Long(cr)) => {
                    if self.ca.get_ref(cr).learnt() {
                        self.cla_bump_activity(learnts, cr);
                    }
                    self.tmp_analyze
                        .extend_from_slice(self.ca.get_ref(cr).lits());
                }
                Some(Confl::Xor) => {
                    let confl = &self.xor_confl;
                    self.tmp_analyze.extend_from_slice(confl);
                }
                None => match self.reason(p.var()) {
                    Reason::Clause(cr) => {
                        if self.ca.get_ref(cr).learnt() {
                            self.cla_bump_activity(learnts, cr);
                        }
                        let c = self.ca.get_ref(cr);
                        debug_assert_eq!(c[0].var(), p.var());
                        self.tmp_analyze.extend_from_slice(&c.lits()[1..]);
                        if self.conf.do_minim_learnt_more && c.size() > 2 {
                            otf_candidate = Some(cr);
                        }
                    }
                    Reason::Binary(o) => self.tmp_analyze.push(o),
                    Reason::Ternary(a, b) => {
                        self.tmp_analyze.push(a);
                        self.tmp_analyze.push(b);
                    }
                    Reason::Xor(i) => {
                        let lits = &self.xor_reasons[i as usize].lits;
                        debug_assert_eq!(lits[0], p);
                        self.tmp_analyze.extend_from_slice(&lits[1..]);
                    }
                    Reason::None => {
                        panic!("analyze: reached a reasonless literal {:?}", p)
                    }
                },
            }

            let mut n_seen_prior = 0i32;
            for k in 0..self.tmp_analyze.len() {
                let q = self.tmp_analyze[k];
                let lvl = self.vars.level(q.var());
                debug_assert!(lvl <= conflict_level);
                if self.seen[q.var()] {
                    if lvl > 0 {
                        n_seen_prior += 1;
                    }
                } else if lvl > 0 {
                    self.vars
                        .var_bump_activity(&mut self.order_heap_data, q.var());
                    self.seen[q.var()] = true;
                    if lvl == conflict_level {
                        path_c += 1;
                    } else {
                        out_learnt.push(q); // part of the learnt clause
                    }
                }
            }

            // the resolvent turned out to be exactly `C \ {p}`: shrink C
            if let Some(cr) = otf_candidate {
                let c_len = self.tmp_analyze.len() as i32;
                if n_seen_prior == c_len && r_before == c_len {
                    self.otf_queue.push((cr, p));
                }
            }

            // Select next literal in the trail to look at:
            while !self.seen[self.vars.trail[index - 1].var()] {
                debug_assert_eq!(
                    self.vars.level(self.vars.trail[index - 1].var()),
                    conflict_level
                );
                index -= 1;
            }
            index -= 1;
            p = self.vars.trail[index];
            self.seen[p.var()] = false;
            path_c -= 1;
            if path_c <= 0 {
                break;
            }
        }

        debug_assert_ne!(p, Lit::UNDEF);
        debug_assert!(self.value_lit(p) == lbool::TRUE);
        out_learnt[0] = !p;

        trace!("analyze-learnt: {:?} (before minimization)", &out_learnt);
        self.stats.max_literals += out_learnt.len() as u64;

        self.minimize_conflict(out_learnt);

        // Find correct backtrack level:
        let btlevel = if out_learnt.len() == 1 {
            0
        } else {
            let mut max_i = 1;
            let mut max_level = self.level(out_learnt[max_i].var());
            // Find the first literal assigned at the next-highest level:
            for i in 2..out_learnt.len() {
                let level = self.level(out_learnt[i].var());
                if level > max_level {
                    max_i = i;
                    max_level = level;
                }
            }
            // Swap-in this literal at index 1:
            out_learnt.swap(max_i, 1);
            self.level_lit(out_learnt[1])
        };

        for &lit in &self.analyze_toclear {
            self.seen[lit.var()] = false; // (`seen[]` is now cleared)
        }
        debug_assert!(out_learnt
            .iter()
            .all(|&l| self.value_lit(l) == lbool::FALSE));
        btlevel
    }

    /// An abstraction of the level of a variable
    #[inline]
    fn abstract_level(&self, v: Var) -> u32 {
        1 << (self.level(v) & 31)
    }

    fn minimize_conflict(&mut self, out_learnt: &mut Vec<Lit>) {
        // Simplify conflict clause:
        self.analyze_toclear.clear();
        self.analyze_toclear.extend_from_slice(&out_learnt);
        let new_size = if self.conf.do_minim_l_more_recur {
            // recursive minimization through the implication graph
            let mut abstract_levels = 0;
            for a in out_learnt[1..].iter() {
                abstract_levels |= self.abstract_level(a.var())
            }

            let mut j = 1;
            for i in 1..out_learnt.len() {
                let lit = out_learnt[i];
                // can eliminate `lit` only if it's redundant *and* not a decision
                if self.reason(lit.var()) == Reason::None
                    || !self.lit_redundant(lit, abstract_levels)
                {
                    out_learnt[j] = lit;
                    j += 1;
                }
            }
            j
        } else if self.conf.do_minim_learnt_more {
            // local minimization: drop literals whose reason is contained
            // in the clause
            let mut j = 1;
            for i in 1..out_learnt.len() {
                let lit = out_learnt[i];
                let x = lit.var();

                let retain = match self.reason(x) {
                    Reason::None => true,
                    Reason::Xor(_) => true,
                    Reason::Binary(o) => !self.seen[o.var()] && self.level(o.var()) > 0,
                    Reason::Ternary(a, b) => {
                        (!self.seen[a.var()] && self.level(a.var()) > 0)
                            || (!self.seen[b.var()] && self.level(b.var()) > 0)
                    }
                    Reason::Clause(cr) => {
                        let c = self.ca.get_ref(cr);
                        let mut keep = false;
                        for k in 1..c.size() {
                            let v = c[k].var();
                            if !self.seen[v] && self.level(v) > 0 {
                                keep = true;
                                break;
                            }
                        }
                        keep
                    }
                };
                if retain {
                    out_learnt[j] = lit;
                    j += 1;
                }
            }
            j
        } else {
            out_learnt.len()
        };

        self.stats.tot_literals += new_size as u64;
        debug_assert!(new_size <= out_learnt.len());
        out_learnt.truncate(new_size);
    }

    /// Check if `p` can be removed from a conflict clause.
    ///
    /// It can be removed if it is propagation-implied by literals of level 0
    /// exclusively or by literals already present in the clause,
    /// transitively.
    fn lit_redundant(&mut self, p: Lit, abstract_levels: u32) -> bool {
        self.minimize_stack.clear();
        self.minimize_stack.push(p);

        let top = self.analyze_toclear.len();

        while self.minimize_stack.len() > 0 {
            let q = *self.minimize_stack.last().unwrap();
            self.minimize_stack.pop();

            // gather the reason literals of `q`
            self.tmp_analyze.clear();
            match self.reason(q.var()) {
                Reason::None => unreachable!("redundancy check on a decision"),
                Reason::Xor(_) => {
                    // parity reasons mix in substituted variables that the
                    // abstraction cannot cover: bail out
                    for a in self.analyze_toclear[top..].iter() {
                        self.seen[a.var()] = false;
                    }
                    self.analyze_toclear.truncate(top);
                    return false;
                }
                Reason::Binary(o) => self.tmp_analyze.push(o),
                Reason::Ternary(a, b) => {
                    self.tmp_analyze.push(a);
                    self.tmp_analyze.push(b);
                }
                Reason::Clause(cr) => {
                    let c = self.ca.get_ref(cr);
                    self.tmp_analyze.extend_from_slice(&c.lits()[1..]);
                }
            }

            for k in 0..self.tmp_analyze.len() {
                let l = self.tmp_analyze[k];
                // Variable at level 0 or already marked: just skip
                if self.vars.level(l.var()) == 0 || self.seen[l.var()] {
                    continue;
                }

                if self.reason(l.var()) != Reason::None
                    && (self.abstract_level(l.var()) & abstract_levels) != 0
                {
                    // keep digging through this literal's reason
                    self.seen[l.var()] = true;
                    self.minimize_stack.push(l);
                    self.analyze_toclear.push(l);
                } else {
                    // cannot remove `l`, cancel
                    for a in self.analyze_toclear[top..].iter() {
                        self.seen[a.var()] = false;
                    }
                    self.analyze_toclear.truncate(top);
                    return false;
                }
            }
        }

        true
    }

    /// Apply the shrinks queued by conflict analysis. Must run after the
    /// backjump, while the trail is consistent.
    fn apply_otf_shrinks(&mut self) {
        if self.otf_queue.is_empty() {
            return;
        }
        let queue = mem::take(&mut self.otf_queue);
        for (cr, lit) in queue {
            if self.ca.get_ref(cr).mark() == 1 {
                continue;
            }
            debug_assert!(!self.locked(cr));
            let mut lits: Vec<Lit> = self
                .ca
                .get_ref(cr)
                .lits()
                .iter()
                .cloned()
                .filter(|&l| l != lit)
                .collect();
            if lits.len() + 1 != self.ca.get_ref(cr).size() as usize {
                continue; // the clause changed since analysis
            }
            self.sort_clause_lits(&mut lits);
            // only shrink when the first two literals can serve as watches
            if self.value_lit(lits[1]) == lbool::FALSE {
                continue;
            }
            let learnt = self.ca.get_ref(cr).learnt();
            self.detach_clause(cr, true);
            if lits.len() == 2 {
                self.attach_bin(lits[0], lits[1], learnt);
                self.ca.get_mut(cr).set_mark(1);
                self.ca.free(cr);
            } else {
                {
                    let mut c = self.ca.get_mut(cr);
                    c.lits_mut()[..lits.len()].copy_from_slice(&lits);
                    c.shrink(lits.len() as u32);
                }
                self.ca.free_amount(1);
                self.attach_clause(cr);
            }
            self.stats.improved_clauses += 1;
            self.stats.improved_clause_lits += 1;
        }
    }

    /// Sort literals of `clause` so that unassigned literals are first,
    /// followed by literals in decreasing assignment level
    fn sort_clause_lits(&self, clause: &mut [Lit]) {
        clause.sort_unstable_by(|&lit1, &lit2| {
            let has_val1 = self.value_lit(lit1) != lbool::UNDEF;
            let has_val2 = self.value_lit(lit2) != lbool::UNDEF;

            // unassigned variables come first
            if has_val1 && !has_val2 {
                return cmp::Ordering::Greater;
            }
            if !has_val1 && has_val2 {
                return cmp::Ordering::Less;
            }

            let lvl1 = self.level_lit(lit1);
            let lvl2 = self.level_lit(lit2);
            if lvl1 != lvl2 {
                lvl2.cmp(&lvl1) // higher level come first
            } else {
                lit1.cmp(&lit2) // otherwise default comparison
            }
        });
    }

    /// Pick a literal to make a decision with
    fn pick_branch_lit(&mut self) -> Lit {
        let mut next = Var::UNDEF;

        // Random decision:
        if utils::drand(&mut self.random_seed) < self.conf.random_var_freq
            && !self.order_heap_data.is_empty()
        {
            let idx_tmp =
                utils::irand(&mut self.random_seed, self.order_heap_data.len() as i32) as usize;
            next = self.order_heap_data[idx_tmp];
            if self.value(next) == lbool::UNDEF && self.decision[next] {
                self.stats.rnd_decisions += 1;
            }
        }

        // Activity based decision:
        if next == Var::UNDEF || self.value(next) != lbool::UNDEF || !self.decision[next] {
            next = if self.conf.restrict_pick_branch > 0 {
                self.pick_restricted()
            } else {
                loop {
                    let v = {
                        let mut order_heap = self.order_heap();
                        if order_heap.is_empty() {
                            break Var::UNDEF;
                        }
                        order_heap.remove_min()
                    };
                    if self.value(v) == lbool::UNDEF && self.decision[v] {
                        break v;
                    }
                }
            };
        }

        if next == Var::UNDEF {
            return Lit::UNDEF;
        }

        // Choose polarity based on the configured mode:
        match self.conf.polarity_mode {
            PolarityMode::True => Lit::new(next, true),
            PolarityMode::False => Lit::new(next, false),
            PolarityMode::Rnd => Lit::new(next, utils::drand(&mut self.random_seed) < 0.5),
            PolarityMode::Auto => Lit::new(next, self.polarity[next]),
        }
    }

    /// Pick uniformly among the `K` most active unassigned variables.
    fn pick_restricted(&mut self) -> Var {
        let k = self.conf.restrict_pick_branch as usize;
        let mut cands: Vec<Var> = Vec::with_capacity(k);
        loop {
            let v = {
                let mut order_heap = self.order_heap();
                if order_heap.is_empty() {
                    break;
                }
                order_heap.remove_min()
            };
            if self.value(v) == lbool::UNDEF && self.decision[v] {
                cands.push(v);
                if cands.len() == k {
                    break;
                }
            }
        }
        if cands.is_empty() {
            return Var::UNDEF;
        }
        let pick = utils::irand(&mut self.random_seed, cands.len() as i32) as usize;
        let chosen = cands.swap_remove(pick);
        for v in cands {
            self.insert_var_order(v);
        }
        chosen
    }

    /// Seed the polarity cache with a Jeroslow-Wang estimate over the
    /// current clause database.
    fn calc_polarity_jw(&mut self, clauses: &[CRef]) {
        let n = self.num_vars() as usize * 2;
        let mut score = vec![0.0f64; n];
        {
            let mut add = |lits: &[Lit], score: &mut Vec<f64>| {
                let w = f64::powi(2.0, -(lits.len().min(30) as i32));
                for &l in lits {
                    score[l.idx() as usize] += w;
                }
            };
            for &cr in clauses {
                let c = self.ca.get_ref(cr);
                if c.mark() != 1 {
                    add(c.lits(), &mut score);
                }
            }
            let mut pair = [Lit::UNDEF; 2];
            let mut triple = [Lit::UNDEF; 3];
            for (w, list) in self.watches_data.iter() {
                let cl = !w;
                for &entry in list.iter() {
                    match entry {
                        Watcher::Binary { other, learnt: false } if cl < other => {
                            pair[0] = cl;
                            pair[1] = other;
                            add(&pair, &mut score);
                        }
                        Watcher::Ternary { a, b } if cl < a && cl < b => {
                            triple[0] = cl;
                            triple[1] = a;
                            triple[2] = b;
                            add(&triple, &mut score);
                        }
                        _ => {}
                    }
                }
            }
        }
        for i in 0..self.num_vars() {
            let v = Var::from_idx(i);
            let pos = Lit::new(v, true);
            let neg = Lit::new(v, false);
            self.polarity[v] = score[pos.idx() as usize] >= score[neg.idx() as usize];
        }
    }

    /// Distinct decision levels among `lits`.
    fn calc_glue(&mut self, lits: &[Lit]) -> u32 {
        self.stamp_gen += 1;
        let mut glue = 0;
        for &l in lits {
            let lvl = self.level(l.var()) as usize;
            if self.level_stamp.len() <= lvl {
                self.level_stamp.resize(lvl + 1, 0);
            }
            if self.level_stamp[lvl] != self.stamp_gen {
                self.level_stamp[lvl] = self.stamp_gen;
                glue += 1;
            }
        }
        glue
    }

    fn record_glue(&mut self, glue: u32) {
        self.glue_total_sum += glue as u64;
        self.glue_total_cnt += 1;
        self.glue_win.push_back(glue);
        self.glue_win_sum += glue as u64;
        if self.glue_win.len() > GLUE_WINDOW {
            let old = self.glue_win.pop_front().expect("window not empty");
            self.glue_win_sum -= old as u64;
        }
    }

    fn clear_glue_history(&mut self) {
        self.glue_win.clear();
        self.glue_win_sum = 0;
    }

    /// Dynamic restart test: recent glues notably worse than the long-run
    /// average.
    fn check_dynamic_restart(&mut self) -> bool {
        if self.glue_win.len() < GLUE_WINDOW || self.glue_total_cnt == 0 {
            return false;
        }
        let short = self.glue_win_sum as f64 / self.glue_win.len() as f64;
        let long = self.glue_total_sum as f64 / self.glue_total_cnt as f64;
        if short > long * GLUE_RESTART_RATIO {
            self.clear_glue_history();
            true
        } else {
            false
        }
    }

    /// After the sampling phase, commit the auto restart policy.
    fn maybe_commit_restart_type(&mut self) {
        if self.restart_decided || self.stats.conflicts < RESTART_TYPE_DECIDE_CONFLICTS {
            return;
        }
        self.restart_decided = true;
        let ratio = self.stats.nb_glue2 as f64 / self.stats.conflicts as f64;
        self.restart_type = if ratio >= RESTART_TYPE_GLUE2_RATIO {
            RestartType::Dynamic
        } else {
            RestartType::Static
        };
        info!(
            "restart.committed({:?}, glue2-ratio {:.3})",
            self.restart_type, ratio
        );
        self.clear_glue_history();
    }

    fn rebuild_order_heap(&mut self) {
        let mut vs = vec![];
        for v in (0..self.num_vars()).map(Var::from_idx) {
            if self.decision[v] && self.value(v) == lbool::UNDEF {
                vs.push(v);
            }
        }
        self.order_heap().build(&vs);
    }

    fn rebuild_gauss(&mut self) {
        let n = self.num_vars();
        self.gauss.build_matrices(self.xors.iter(), n);
    }

    /// Substitute level-0 assignments into the XOR store; false on a
    /// parity contradiction. May enqueue level-0 units.
    fn simplify_xors(&mut self) -> bool {
        debug_assert_eq!(self.decision_level(), 0);
        if self.xors.len() == 0 {
            return true;
        }
        let xs = self.xors.take_all();
        for mut x in xs {
            let mut rhs = x.rhs;
            {
                let ass = &self.vars.ass;
                x.vars.retain(|&v| {
                    let val = ass[v];
                    if val == lbool::UNDEF {
                        true
                    } else {
                        rhs ^= val == lbool::TRUE;
                        false
                    }
                });
            }
            x.rhs = rhs;
            match x.vars.len() {
                0 => {
                    if x.rhs {
                        return false; // 0 = 1
                    }
                }
                1 => {
                    let lit = Lit::new(x.vars[0], x.rhs);
                    let val = self.vars.value_lit(lit);
                    if val == lbool::FALSE {
                        return false;
                    } else if val == lbool::UNDEF {
                        self.vars.unchecked_enqueue(lit, Reason::None);
                    }
                }
                _ => self.xors.add(x),
            }
        }
        true
    }

    /// Move to the given clause allocator, where clause indices might differ
    fn reloc_all(
        &mut self,
        learnts: &mut Vec<CRef>,
        clauses: &mut Vec<CRef>,
        to: &mut ClauseAllocator,
    ) {
        macro_rules! is_removed {
            ($ca:expr, $cr:expr) => {
                $ca.get_ref($cr).mark() == 1
            };
        }
        // All watchers:
        self.watches().clean_all();
        for v in (0..self.num_vars()).map(Var::from_idx) {
            for s in 0..2 {
                let p = Lit::new(v, s != 0);
                for watch in self.watches_data[p].iter_mut() {
                    if let Watcher::Long { cref, .. } = watch {
                        self.ca.reloc(cref, to);
                    }
                }
            }
        }

        // All reasons:
        for i in 0..self.vars.trail.len() {
            let v = self.vars.trail[i].var();
            if let Reason::Clause(cr) = self.vars.vardata[v].reason {
                let keep = {
                    let c = self.ca.get_ref(cr);
                    c.reloced() || c.mark() != 1
                };
                if keep {
                    let mut cr2 = cr;
                    self.ca.reloc(&mut cr2, to);
                    self.vars.vardata[v].reason = Reason::Clause(cr2);
                } else {
                    self.vars.vardata[v].reason = Reason::None;
                }
            }
        }

        // Over-glue queue:
        {
            let ca = &mut self.ca;
            let mut j = 0;
            for i in 0..self.over_glue.len() {
                let (lvl, mut cr) = self.over_glue[i];
                if !is_removed!(ca, cr) {
                    ca.reloc(&mut cr, to);
                    self.over_glue[j] = (lvl, cr);
                    j += 1;
                }
            }
            self.over_glue.truncate(j);
        }

        // All learnt:
        {
            let mut j = 0;
            for i in 0..learnts.len() {
                let mut cr = learnts[i];
                if !is_removed!(self.ca, cr) {
                    self.ca.reloc(&mut cr, to);
                    learnts[j] = cr;
                    j += 1;
                }
            }
            learnts.truncate(j);
        }

        // All original:
        {
            let mut j = 0;
            for i in 0..clauses.len() {
                let mut cr = clauses[i];
                if !is_removed!(self.ca, cr) {
                    self.ca.reloc(&mut cr, to);
                    clauses[j] = cr;
                    j += 1;
                }
            }
            clauses.truncate(j);
        }
    }

    /// Attach an arena clause to the watch lists
    fn attach_clause(&mut self, cr: CRef) {
        let (c0, c1, learnt, size) = {
            let c = self.ca.get_ref(cr);
            debug_assert!(c.size() > 2);
            (c[0], c[1], c.learnt(), c.size())
        };
        self.watches_data[!c0].push(Watcher::Long { cref: cr, blocker: c1 });
        self.watches_data[!c1].push(Watcher::Long { cref: cr, blocker: c0 });
        if learnt {
            self.num_learnts += 1;
            self.learnts_literals += size as u64;
        } else {
            self.num_clauses += 1;
            self.clauses_literals += size as u64;
        }
    }

    /// Attach a binary clause inline in both watch lists.
    fn attach_bin(&mut self, a: Lit, b: Lit, learnt: bool) {
        self.watches_data[!a].push(Watcher::Binary { other: b, learnt });
        self.watches_data[!b].push(Watcher::Binary { other: a, learnt });
        if learnt {
            self.num_bin_learnts += 1;
        } else {
            self.num_bin_clauses += 1;
        }
    }

    /// Attach a ternary clause inline in the three watch lists.
    fn attach_tri(&mut self, a: Lit, b: Lit, c: Lit) {
        self.watches_data[!a].push(Watcher::Ternary { a: b, b: c });
        self.watches_data[!b].push(Watcher::Ternary { a, b: c });
        self.watches_data[!c].push(Watcher::Ternary { a, b });
        self.num_tri_clauses += 1;
    }

    /// Revert to the state at given level (keeping all assignment at `level`
    /// but not beyond).
    fn cancel_until(&mut self, level: u32) {
        if self.decision_level() <= level {
            return;
        }
        let trail_lim_level = self.vars.trail_lim[level as usize] as usize;
        for c in (trail_lim_level..self.vars.trail.len()).rev() {
            let x = self.vars.trail[c].var();
            self.vars.ass[x] = lbool::UNDEF;
            if self.conf.polarity_mode == PolarityMode::Auto {
                // phase saving
                self.polarity[x] = self.vars.trail[c].sign();
            }
            self.insert_var_order(x);
        }
        self.qhead = trail_lim_level as i32;
        self.vars.trail.truncate(trail_lim_level);
        self.vars.trail_lim.truncate(level as usize);

        // drop parity reasons above the new level
        while self
            .xor_reasons
            .last()
            .map_or(false, |r| r.level > level)
        {
            self.xor_reasons.pop();
        }
        self.gauss.cancel_until(level);

        // discard learnts over the glue bound installed above the new level
        if !self.over_glue.is_empty() {
            let mut j = 0;
            for i in 0..self.over_glue.len() {
                let (lvl, cr) = self.over_glue[i];
                if lvl > level {
                    if self.ca.get_ref(cr).mark() != 1 {
                        debug_assert!(!self.locked(cr));
                        self.remove_clause(cr);
                    }
                } else {
                    self.over_glue[j] = (lvl, cr);
                    j += 1;
                }
            }
            self.over_glue.truncate(j);
        }
    }

    /// Detach an arena clause from the watch lists.
    ///
    /// param `strict` means we remove the clause from watchers eagerly,
    /// instead of just marking the watchlists as "dirty"
    fn detach_clause(&mut self, cr: CRef, strict: bool) {
        let (c0, c1, csize, clearnt) = {
            let c = self.ca.get_ref(cr);
            (c[0], c[1], c.size(), c.learnt())
        };
        debug_assert!(csize > 2);

        let mut watches = self.watches_data.promote(WatcherDeleted { ca: &self.ca });

        // Strict or lazy detaching:
        if strict {
            let find = |ws: &clause::OccVec<Watcher>| {
                ws.iter()
                    .position(|w| matches!(w, Watcher::Long { cref, .. } if *cref == cr))
                    .expect("watcher not found")
            };
            let pos = find(&watches[!c0]);
            watches[!c0].remove(pos);
            let pos = find(&watches[!c1]);
            watches[!c1].remove(pos);
        } else {
            watches.smudge(!c0);
            watches.smudge(!c1);
        }

        if clearnt {
            self.num_learnts -= 1;
            self.learnts_literals -= csize as u64;
        } else {
            self.num_clauses -= 1;
            self.clauses_literals -= csize as u64;
        }
    }

    /// Detach and free an arena clause.
    fn remove_clause(&mut self, cr: CRef) {
        self.detach_clause(cr, false);
        {
            let c = self.ca.get_ref(cr);
            // Don't leave pointers to free'd memory!
            if self.locked(cr) {
                self.vars.vardata[c[0].var()].reason = Reason::None;
            }
        }
        self.ca.get_mut(cr).set_mark(1); // used in reloc
        self.ca.free(cr);
    }

    /// Drop binary and ternary watchers of clauses satisfied at level 0, and
    /// recount them.
    fn clean_bin_tri_watches(&mut self) {
        debug_assert_eq!(self.decision_level(), 0);
        let vars = &self.vars;
        let mut bin: u64 = 0;
        let mut bin_learnt: u64 = 0;
        let mut tri: u64 = 0;
        for (w, list) in self.watches_data.iter_mut() {
            let cl = !w;
            let cl_val = vars.value_lit(cl);
            list.retain(|entry| match *entry {
                Watcher::Binary { other, learnt } => {
                    let sat = cl_val == lbool::TRUE || vars.value_lit(other) == lbool::TRUE;
                    if !sat {
                        if learnt {
                            bin_learnt += 1;
                        } else {
                            bin += 1;
                        }
                    }
                    !sat
                }
                Watcher::Ternary { a, b } => {
                    let sat = cl_val == lbool::TRUE
                        || vars.value_lit(a) == lbool::TRUE
                        || vars.value_lit(b) == lbool::TRUE;
                    if !sat {
                        tri += 1;
                    }
                    !sat
                }
                Watcher::Long { .. } => true,
            });
        }
        self.num_bin_clauses = bin / 2;
        self.num_bin_learnts = bin_learnt / 2;
        self.num_tri_clauses = tri / 3;
    }

    /// Sort every watch list so binary entries come first, then ternary,
    /// then long clauses.
    fn sort_watches(&mut self) {
        for (_, list) in self.watches_data.iter_mut() {
            list.sort_by_key(|w| w.rank());
        }
    }

    /// Iterate the binary clauses, once each.
    fn each_binary<F: FnMut(Lit, Lit, bool)>(&self, mut f: F) {
        for (w, list) in self.watches_data.iter() {
            let a = !w;
            for &entry in list.iter() {
                if let Watcher::Binary { other, learnt } = entry {
                    if a < other {
                        f(a, other, learnt);
                    }
                }
            }
        }
    }

    /// Iterate the ternary clauses, once each.
    fn each_ternary<F: FnMut(Lit, Lit, Lit)>(&self, mut f: F) {
        for (w, list) in self.watches_data.iter() {
            let x = !w;
            for &entry in list.iter() {
                if let Watcher::Ternary { a, b } = entry {
                    if x < a && x < b {
                        f(x, a, b);
                    }
                }
            }
        }
    }

    pub fn satisfied(&self, c: ClauseRef) -> bool {
        c.iter().any(|&lit| self.value_lit(lit) == lbool::TRUE)
    }

    /// Returns `true` if a clause is a reason for some implication in the
    /// current state.
    fn locked(&self, cr: CRef) -> bool {
        let c = self.ca.get_ref(cr);
        self.value_lit(c[0]) == lbool::TRUE && self.vars.reason(c[0].var()) == Reason::Clause(cr)
    }

    fn progress_estimate(&self) -> f64 {
        let mut progress = 0.0;
        let f = 1.0 / self.num_vars() as f64;

        for i in 0..self.decision_level() + 1 {
            let beg: i32 = if i == 0 {
                0
            } else {
                self.vars.trail_lim[i as usize - 1]
            };
            let end: i32 = if i == self.decision_level() {
                self.vars.trail.len() as i32
            } else {
                self.vars.trail_lim[i as usize]
            };
            progress += f64::powi(f, i as i32) * (end - beg) as f64;
        }

        progress / self.num_vars() as f64
    }

    fn new(conf: SolverConf, gauss_conf: GaussConf) -> Self {
        let random_seed = if conf.orig_seed == 0 {
            91648253.0
        } else {
            conf.orig_seed as f64
        };
        Self {
            vars: VarState::new(&conf),
            stats: SolverStats::default(),

            num_clauses: 0,
            num_learnts: 0,
            clauses_literals: 0,
            learnts_literals: 0,
            num_bin_clauses: 0,
            num_bin_learnts: 0,
            num_tri_clauses: 0,

            learntsize_adjust_start_confl: 100,
            learntsize_adjust_inc: 1.5,
            learntsize_factor: 1.0 / 3.0,
            learntsize_inc: 1.1,

            polarity: VMap::new(),
            decision: VMap::new(),
            watches_data: OccListsData::new(),
            order_heap_data: HeapData::new(),
            ok: true,
            cla_inc: 1.0,
            qhead: 0,
            next_var: Var::from_idx(0),
            ca: ClauseAllocator::new(),
            random_seed,

            xors: XorSet::new(),
            xor_reasons: vec![],
            xor_units: vec![],
            xor_confl: vec![],
            gauss: GaussEngine::new(gauss_conf),

            restart_type: RestartType::Static,
            restart_decided: false,
            glue_win: std::collections::VecDeque::with_capacity(GLUE_WINDOW + 1),
            glue_win_sum: 0,
            glue_total_sum: 0,
            glue_total_cnt: 0,

            over_glue: vec![],
            otf_queue: vec![],

            next_simplify: 0,
            simp_mult_accum: 1.0,

            seen: VMap::new(),
            minimize_stack: vec![],
            analyze_toclear: vec![],
            tmp_analyze: vec![],
            level_stamp: vec![],
            stamp_gen: 0,

            max_learnts: 0.0,
            learntsize_adjust_confl: 0.0,
            learntsize_adjust_cnt: 0,

            conflict_budget: -1,
            propagation_budget: -1,
            progress_estimate: 0.0,

            conf,
        }
    }
}

impl VarState {
    fn new(conf: &SolverConf) -> Self {
        Self {
            ass: VMap::new(),
            vardata: VMap::new(),
            activity: VMap::new(),
            var_inc: 1.0,
            var_decay: conf.var_decay,
            trail: vec![],
            trail_lim: vec![],
        }
    }

    #[inline(always)]
    pub fn num_assigns(&self) -> u32 {
        self.trail.len() as u32
    }

    /// Begins a new decision level.
    fn new_decision_level(&mut self) {
        let lvl = self.trail.len() as i32;
        self.trail_lim.push(lvl);
    }

    fn proved_at_lvl_0(&self) -> &[Lit] {
        // find where the end of the level-0 part of the trail is
        let end = self
            .trail_lim
            .get(0)
            .map_or(self.trail.len(), |&x| x as usize);
        &self.trail[..end]
    }

    #[inline(always)]
    pub fn value(&self, x: Var) -> lbool {
        self.ass[x]
    }

    #[inline(always)]
    fn value_lit(&self, x: Lit) -> lbool {
        self.ass[x.var()] ^ !x.sign()
    }

    #[inline(always)]
    fn level(&self, x: Var) -> i32 {
        self.vardata[x].level
    }

    #[inline(always)]
    fn reason(&self, x: Var) -> Reason {
        self.vardata[x].reason
    }

    fn var_decay_activity(&mut self) {
        self.var_inc *= 1.0 / self.var_decay;
    }

    #[inline(always)]
    pub fn decision_level(&self) -> u32 {
        self.trail_lim.len() as u32
    }

    fn unchecked_enqueue(&mut self, p: Lit, from: Reason) {
        debug_assert_eq!(
            self.value_lit(p),
            lbool::UNDEF,
            "lit {:?} should be undef",
            p
        );
        self.ass[p.var()] = lbool::new(p.sign());
        self.vardata[p.var()] = VarData::new(from, self.decision_level() as i32);
        self.trail.push(p);
    }

    /// Increase a variable with the current 'bump' value.
    fn var_bump_activity(&mut self, order_heap_data: &mut HeapData<Var>, v: Var) {
        self.activity[v] += self.var_inc;
        if self.activity[v] > 1e100 {
            // Rescale:
            for (_, x) in self.activity.iter_mut() {
                *x *= 1e-100;
            }
            self.var_inc *= 1e-100;
        }

        // Update order_heap with respect to new activity:
        let mut order_heap = order_heap_data.promote(VarOrder {
            activity: &self.activity,
        });
        if order_heap.in_heap(v) {
            order_heap.decrease(v);
        }
    }
}

struct VarOrder<'a> {
    activity: &'a VMap<f64>,
}

/// Predicate to test whether a clause has been removed from some lit's
/// watchlist; only long watchers carry an arena handle.
struct WatcherDeleted<'a> {
    ca: &'a ClauseAllocator,
}

impl<'a> Comparator<Var> for VarOrder<'a> {
    fn cmp(&self, lhs: &Var, rhs: &Var) -> cmp::Ordering {
        PartialOrd::partial_cmp(&self.activity[*rhs], &self.activity[*lhs]).expect("NaN activity")
    }
}

impl<'a> DeletePred<Watcher> for WatcherDeleted<'a> {
    #[inline]
    fn deleted(&self, w: &Watcher) -> bool {
        match w {
            Watcher::Long { cref, .. } => self.ca.get_ref(*cref).mark() == 1,
            _ => false,
        }
    }
}

// dumping and statistics
impl<Cb: Callbacks> Solver<Cb> {
    /// Write the learnt clauses as DIMACS, best first: level-0 facts, then
    /// learnt binaries, then arena learnts of at most `max_size` literals
    /// sorted by (glue, size).
    ///
    /// The output can be fed back through the parser (e.g. as an extra
    /// input file on a later run).
    pub fn dump_sorted_learnts<W: Write>(&self, out: &mut W, max_size: u32) -> io::Result<()> {
        for &l in self.v.vars.proved_at_lvl_0() {
            write_clause_dimacs(out, &[l])?;
        }
        if max_size >= 2 {
            let mut bins: Vec<(Lit, Lit)> = vec![];
            self.v.each_binary(|a, b, learnt| {
                if learnt {
                    bins.push((a, b));
                }
            });
            for (a, b) in bins {
                write_clause_dimacs(out, &[a, b])?;
            }
        }
        let ca = &self.v.ca;
        let mut sorted: Vec<CRef> = self
            .learnts
            .iter()
            .cloned()
            .filter(|&cr| {
                let c = ca.get_ref(cr);
                c.mark() != 1 && c.size() <= max_size
            })
            .collect();
        sorted.sort_by_key(|&cr| {
            let c = ca.get_ref(cr);
            (c.glue(), c.size())
        });
        for cr in sorted {
            write_clause_dimacs(out, ca.get_ref(cr).lits())?;
        }
        Ok(())
    }

    /// Write the original problem, simplified to the current point: a DIMACS
    /// header, the level-0 facts, the remaining CNF clauses, and the XOR
    /// clauses as `x` lines.
    pub fn dump_orig_clauses<W: Write>(&self, out: &mut W) -> io::Result<()> {
        let ca = &self.v.ca;
        let mut bins: Vec<(Lit, Lit)> = vec![];
        self.v.each_binary(|a, b, learnt| {
            if !learnt {
                bins.push((a, b));
            }
        });
        let mut tris: Vec<(Lit, Lit, Lit)> = vec![];
        self.v.each_ternary(|a, b, c| tris.push((a, b, c)));
        let longs: Vec<CRef> = self
            .clauses
            .iter()
            .cloned()
            .filter(|&cr| ca.get_ref(cr).mark() != 1)
            .collect();

        let n_clauses = self.v.vars.proved_at_lvl_0().len()
            + bins.len()
            + tris.len()
            + longs.len()
            + self.v.xors.len();
        writeln!(out, "p cnf {} {}", self.num_vars(), n_clauses)?;

        for &l in self.v.vars.proved_at_lvl_0() {
            write_clause_dimacs(out, &[l])?;
        }
        for (a, b) in bins {
            write_clause_dimacs(out, &[a, b])?;
        }
        for (a, b, c) in tris {
            write_clause_dimacs(out, &[a, b, c])?;
        }
        for cr in longs {
            write_clause_dimacs(out, ca.get_ref(cr).lits())?;
        }
        for x in self.v.xors.iter() {
            write!(out, "x ")?;
            for (i, &v) in x.vars.iter().enumerate() {
                // the sign of the first variable carries an even rhs
                let neg = i == 0 && !x.rhs;
                write!(out, "{}{} ", if neg { "-" } else { "" }, v.idx() + 1)?;
            }
            writeln!(out, "0")?;
        }
        Ok(())
    }

    fn print_stats_internal(&self) {
        let s = &self.v.stats;
        let nv = self.num_vars().max(1) as f64;
        let confl = s.conflicts.max(1) as f64;
        println!("c restarts              : {}", s.starts);
        println!("c dynamic restarts      : {}", s.dynamic_starts);
        println!("c static restarts       : {}", s.static_starts);
        println!("c full restarts         : {}", s.full_starts);
        println!("c learnts DL2           : {}", s.nb_glue2);
        println!("c learnts size 2        : {}", s.num_new_bin);
        println!(
            "c learnts size 1        : {:<11} ({:<9.2} % of vars)",
            s.unit_learnts,
            s.unit_learnts as f64 / nv * 100.0
        );
        println!(
            "c OTF clause improved   : {:<11} ({:<9.4} clauses/conflict)",
            s.improved_clauses,
            s.improved_clauses as f64 / confl
        );
        println!(
            "c OTF impr. size diff   : {:<11} ({:<9.2} lits/clause)",
            s.improved_clause_lits,
            s.improved_clause_lits as f64 / s.improved_clauses.max(1) as f64
        );
        println!(
            "c clauses over max glue : {:<11} ({:<9.2} % of all clauses)",
            s.nb_cl_over_max_glue,
            s.nb_cl_over_max_glue as f64 / confl * 100.0
        );
        let g = &self.v.gauss;
        if g.conf().decision_until > 0 {
            let called = g.sum_called.max(1) as f64;
            println!("c gauss unit truths     : {}", g.sum_unit_truths);
            println!("c gauss called          : {}", g.sum_called);
            println!(
                "c gauss conflicts       : {:<11} ({:<9.2} %)",
                g.sum_confl,
                g.sum_confl as f64 / called * 100.0
            );
            println!(
                "c gauss propagations    : {:<11} ({:<9.2} %)",
                g.sum_prop,
                g.sum_prop as f64 / called * 100.0
            );
        }
        println!("c conflicts             : {:<12}", s.conflicts);
        println!(
            "c decisions             : {:<11} ({:<9.2} % random)",
            s.decisions,
            s.rnd_decisions as f64 / s.decisions.max(1) as f64 * 100.0
        );
        println!("c propagations          : {:<12}", s.propagations);
        println!(
            "c conflict literals     : {:<11} ({:<9.2} % deleted)",
            s.tot_literals,
            (s.max_literals - s.tot_literals) as f64 / s.max_literals.max(1) as f64 * 100.0
        );
    }
}

fn write_clause_dimacs<W: Write>(out: &mut W, lits: &[Lit]) -> io::Result<()> {
    for &l in lits {
        write!(
            out,
            "{}{} ",
            if l.sign() { "" } else { "-" },
            l.var().idx() + 1
        )?;
    }
    writeln!(out, "0")
}

mod utils {
    /// Finite subsequences of the Luby-sequence:
    ///
    /// > 0: 1
    /// > 1: 1 1 2
    /// > 2: 1 1 2 1 1 2 4
    /// > 3: 1 1 2 1 1 2 4 1 1 2 1 1 2 4 8
    /// ...
    pub(super) fn luby(y: f64, mut x: i32) -> f64 {
        // Find the finite subsequence that contains index 'x', and the
        // size of that subsequence:
        let mut size = 1;
        let mut seq = 0;
        while size < x + 1 {
            seq += 1;
            size = 2 * size + 1;
        }

        while size - 1 != x {
            size = (size - 1) >> 1;
            seq -= 1;
            x = x % size;
        }

        f64::powi(y, seq)
    }

    /// Generate a random double:
    pub(super) fn drand(seed: &mut f64) -> f64 {
        *seed *= 1389796.0;
        let q = (*seed / 2147483647.0) as i32;
        *seed -= q as f64 * 2147483647.0;
        *seed / 2147483647.0
    }

    /// Generate a random integer:
    pub(super) fn irand(seed: &mut f64, size: i32) -> i32 {
        (drand(seed) * size as f64) as i32
    }
}
