//! Configuration records for the solver and the Gaussian engine.

/// How the polarity of a branch variable is chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PolarityMode {
    /// Always branch positive first
    True,
    /// Always branch negative first
    False,
    /// Uniformly random polarity
    Rnd,
    /// Jeroslow-Wang estimate, then phase saving
    Auto,
}

/// Which restart strategy the search follows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RestartType {
    /// Sample first, then commit to static or dynamic
    Auto,
    /// Luby sequence scaled by a base interval
    Static,
    /// Glue-average based (restart when recent glues degrade)
    Dynamic,
}

/// Main solver configuration.
///
/// The `do_*` booleans for CNF/XOR simplification and probing layers are
/// accepted and recorded here; the layers themselves run between search
/// episodes and only their contract towards the core is relied upon.
#[derive(Debug, Clone)]
pub struct SolverConf {
    pub verbosity: i32,
    pub polarity_mode: PolarityMode,
    /// Probability of branching on a uniformly random variable
    pub random_var_freq: f64,
    /// Seed for the decision RNG; 0 keeps the historical default seed
    pub orig_seed: u32,
    /// When > 0, pick uniformly among the top-K most active variables
    pub restrict_pick_branch: u32,
    pub fix_restart_type: RestartType,
    /// Cap on restarts; exceeding it yields an undetermined result
    pub max_restarts: u32,
    /// In dynamic-restart mode, learnts above this glue are discarded on
    /// the next backjump below their installation level
    pub max_glue: u32,

    pub var_decay: f64,
    pub clause_decay: f64,
    pub restart_first: i32,
    pub restart_inc: f64,
    /// The fraction of wasted arena memory tolerated before a GC
    pub garbage_frac: f64,

    /// Run simplification episodes on a conflict schedule
    pub do_sched_simp: bool,
    /// Conflicts before the first simplification episode
    pub simp_start_confl: u64,
    /// Growth factor of the episode schedule
    pub simp_start_mult: f64,

    pub do_sort_watched: bool,
    /// Learnt-clause minimization (local)
    pub do_minim_learnt_more: bool,
    /// Learnt-clause minimization (recursive/transitive)
    pub do_minim_l_more_recur: bool,

    // XOR simplification layers (collaborators)
    pub do_find_xors: bool,
    pub do_find_eq_lits: bool,
    pub do_congl_xors: bool,
    pub do_heule_process: bool,
    pub do_xor_subsumption: bool,

    // CNF simplification layers (collaborators)
    pub do_satelite: bool,
    pub do_var_elim: bool,
    pub do_subsume1: bool,
    pub do_blocked_clause: bool,

    // Probing layers (collaborators)
    pub do_failed_lit: bool,
    pub do_hyper_bin_res: bool,
    pub do_rem_useless_bins: bool,
    pub do_subs_w_non_exist_bins: bool,
    pub do_asymm_branch: bool,

    pub do_replace: bool,

    pub need_to_dump_learnts: bool,
    pub learnts_filename: String,
    pub max_dump_learnts_size: u32,
    pub need_to_dump_orig: bool,
    pub orig_filename: String,
}

impl Default for SolverConf {
    fn default() -> Self {
        Self {
            verbosity: 0,
            polarity_mode: PolarityMode::Auto,
            random_var_freq: 0.02,
            orig_seed: 0,
            restrict_pick_branch: 0,
            fix_restart_type: RestartType::Auto,
            max_restarts: u32::MAX,
            max_glue: 24,

            var_decay: 0.95,
            clause_decay: 0.999,
            restart_first: 100,
            restart_inc: 1.5,
            garbage_frac: 0.20,

            do_sched_simp: true,
            simp_start_confl: 300,
            simp_start_mult: 1.5,

            do_sort_watched: true,
            do_minim_learnt_more: true,
            do_minim_l_more_recur: false,

            do_find_xors: true,
            do_find_eq_lits: true,
            do_congl_xors: true,
            do_heule_process: true,
            do_xor_subsumption: true,

            do_satelite: true,
            do_var_elim: true,
            do_subsume1: true,
            do_blocked_clause: true,

            do_failed_lit: true,
            do_hyper_bin_res: true,
            do_rem_useless_bins: true,
            do_subs_w_non_exist_bins: true,
            do_asymm_branch: true,

            do_replace: true,

            need_to_dump_learnts: false,
            learnts_filename: String::new(),
            max_dump_learnts_size: u32::MAX,
            need_to_dump_orig: false,
            orig_filename: String::new(),
        }
    }
}

impl SolverConf {
    /// Check that option values are in range.
    pub fn check(&self) -> bool {
        (0.0 < self.var_decay && self.var_decay < 1.0)
            && (0.0 < self.clause_decay && self.clause_decay < 1.0)
            && (0.0 <= self.random_var_freq && self.random_var_freq <= 1.0)
            && 1 <= self.restart_first
            && (1.0 < self.restart_inc && self.restart_inc < f64::INFINITY)
            && (0.0 < self.garbage_frac && self.garbage_frac < f64::INFINITY)
            && self.max_restarts >= 1
            && (1.0 <= self.simp_start_mult)
            && (!self.need_to_dump_learnts || !self.learnts_filename.is_empty())
            && (!self.need_to_dump_orig || !self.orig_filename.is_empty())
    }
}

/// Configuration of the Gaussian elimination engine.
#[derive(Debug, Clone)]
pub struct GaussConf {
    /// Decision depth down to which elimination runs; 0 disables it
    pub decision_until: u32,
    /// Order matrix columns to reduce fill-in
    pub order_cols: bool,
    /// Keep the reduced matrix between calls instead of restarting from
    /// the original rows
    pub iterative_reduce: bool,
    pub max_matrix_rows: u32,
    pub min_matrix_rows: u32,
    /// Snapshot the matrix every Nth decision level
    pub only_nth_gauss_save: u32,
    pub max_num_matrixes: u32,
    /// Put all XOR clauses into one big matrix
    pub no_matrix_find: bool,
    /// Never disable an unproductive matrix
    pub dont_disable: bool,
}

impl Default for GaussConf {
    fn default() -> Self {
        Self {
            decision_until: 0,
            order_cols: true,
            iterative_reduce: true,
            max_matrix_rows: 1000,
            min_matrix_rows: 3,
            only_nth_gauss_save: 2,
            max_num_matrixes: 3,
            no_matrix_find: false,
            dont_disable: false,
        }
    }
}

impl GaussConf {
    pub fn check(&self) -> bool {
        self.min_matrix_rows <= self.max_matrix_rows && self.only_nth_gauss_save >= 1
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_default_conf_is_valid() {
        assert!(SolverConf::default().check());
        assert!(GaussConf::default().check());
    }

    #[test]
    fn test_bad_conf_rejected() {
        let mut c = SolverConf::default();
        c.random_var_freq = 1.5;
        assert!(!c.check());

        let mut c = SolverConf::default();
        c.need_to_dump_learnts = true;
        assert!(!c.check());

        let mut g = GaussConf::default();
        g.min_matrix_rows = 10;
        g.max_matrix_rows = 5;
        assert!(!g.check());

        let mut g = GaussConf::default();
        g.only_nth_gauss_save = 0;
        assert!(!g.check());
    }
}
