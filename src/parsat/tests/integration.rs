//! End-to-end scenarios driving the solver through its public interface.

use parsat::{
    lbool, BasicSolver, GaussConf, Lit, PolarityMode, RestartType, SolverConf, SolverInterface,
    Var,
};

fn solver() -> BasicSolver {
    BasicSolver::default()
}

fn solver_with(conf: SolverConf, gauss: GaussConf) -> BasicSolver {
    BasicSolver::new(conf, gauss, Default::default())
}

/// Add a clause given in DIMACS-style signed integers.
fn add(s: &mut BasicSolver, lits: &[i32]) -> bool {
    let mut clause: Vec<Lit> = lits
        .iter()
        .map(|&l| {
            assert_ne!(l, 0);
            Lit::new(s.var_of_int((l.abs() - 1) as u32), l > 0)
        })
        .collect();
    s.add_clause_reuse(&mut clause)
}

/// Add an XOR clause over 1-based variable numbers.
fn add_xor(s: &mut BasicSolver, vars: &[u32], rhs: bool) -> bool {
    let mut vs: Vec<Var> = vars.iter().map(|&v| s.var_of_int(v - 1)).collect();
    s.add_xor_clause_reuse(&mut vs, rhs)
}

fn model_satisfies(s: &BasicSolver, clauses: &[Vec<i32>], xors: &[(Vec<u32>, bool)]) {
    let model = s.get_model();
    for c in clauses {
        assert!(
            c.iter().any(|&l| {
                let val = model[(l.abs() - 1) as usize];
                (l > 0 && val == lbool::TRUE) || (l < 0 && val == lbool::FALSE)
            }),
            "clause {:?} falsified by the model",
            c
        );
    }
    for (vars, rhs) in xors {
        let mut parity = false;
        for &v in vars {
            let val = model[(v - 1) as usize];
            assert_ne!(val, lbool::UNDEF, "xor var unassigned in model");
            parity ^= val == lbool::TRUE;
        }
        assert_eq!(parity, *rhs, "xor {:?} = {} violated", vars, rhs);
    }
}

/// The 9-clause pigeonhole instance with 3 pigeons and 2 holes.
fn add_php_3_2(s: &mut BasicSolver) {
    // variable 2*(i-1)+j is "pigeon i sits in hole j"
    for i in 0..3i32 {
        add(s, &[2 * i + 1, 2 * i + 2]);
    }
    for j in 1..=2i32 {
        add(s, &[-(j), -(j + 2)]);
        add(s, &[-(j), -(j + 4)]);
        add(s, &[-(j + 2), -(j + 4)]);
    }
}

/// Pigeonhole with 4 pigeons and 3 holes; needs real search to refute.
fn add_php_4_3(s: &mut BasicSolver) {
    let var = |p: i32, h: i32| 3 * p + h + 1; // p in 0..4, h in 0..3
    for p in 0..4 {
        add(s, &[var(p, 0), var(p, 1), var(p, 2)]);
    }
    for h in 0..3 {
        for p1 in 0..4 {
            for p2 in (p1 + 1)..4 {
                add(s, &[-var(p1, h), -var(p2, h)]);
            }
        }
    }
}

#[test]
fn test_single_unit_is_sat() {
    let mut s = solver();
    add(&mut s, &[1]);
    assert_eq!(s.solve(), lbool::TRUE);
    assert_eq!(s.get_model()[0], lbool::TRUE);
}

#[test]
fn test_immediate_contradiction_is_unsat() {
    let mut s = solver();
    add(&mut s, &[1]);
    add(&mut s, &[-1]);
    assert_eq!(s.solve(), lbool::FALSE);
}

#[test]
fn test_empty_clause_is_unsat() {
    let mut s = solver();
    let mut empty: Vec<Lit> = vec![];
    assert!(!s.add_clause_reuse(&mut empty));
    assert_eq!(s.solve(), lbool::FALSE);
}

#[test]
fn test_tautology_and_duplicates_ignored() {
    let mut s = solver();
    add(&mut s, &[1, -1]); // tautology, dropped
    add(&mut s, &[2, 2, 2]); // deduplicated to a unit
    assert_eq!(s.solve(), lbool::TRUE);
    assert_eq!(s.get_model()[1], lbool::TRUE);
}

#[test]
fn test_pigeonhole_3_2_is_unsat() {
    let mut s = solver();
    add_php_3_2(&mut s);
    assert_eq!(s.solve(), lbool::FALSE);
}

#[test]
fn test_simple_sat_model_is_sound() {
    let clauses: Vec<Vec<i32>> = vec![
        vec![1, 2, -3],
        vec![-1, 3],
        vec![-2, 3, 4],
        vec![-4, 1, 5],
        vec![-5, -3],
        vec![2, 4, 5],
    ];
    let mut s = solver();
    for c in &clauses {
        add(&mut s, c);
    }
    assert_eq!(s.solve(), lbool::TRUE);
    model_satisfies(&s, &clauses, &[]);
}

#[test]
fn test_xor_chain_unsat_by_watches() {
    // v1^v2=1, v2^v3=1, v1^v3=1 sums to 0=1
    let mut s = solver();
    add_xor(&mut s, &[1, 2], true);
    add_xor(&mut s, &[2, 3], true);
    add_xor(&mut s, &[1, 3], true);
    assert_eq!(s.solve(), lbool::FALSE);
}

#[test]
fn test_xor_chain_sat_variant() {
    // v1^v2=1, v2^v3=1, v1^v3=0 is consistent
    let xors: Vec<(Vec<u32>, bool)> =
        vec![(vec![1, 2], true), (vec![2, 3], true), (vec![1, 3], false)];
    let mut s = solver();
    for (vs, rhs) in &xors {
        add_xor(&mut s, vs, *rhs);
    }
    assert_eq!(s.solve(), lbool::TRUE);
    model_satisfies(&s, &[], &xors);
}

#[test]
fn test_xor_chain_with_gauss() {
    let mut gauss = GaussConf::default();
    gauss.decision_until = 32;
    gauss.min_matrix_rows = 1;
    let mut s = solver_with(SolverConf::default(), gauss);
    add_xor(&mut s, &[1, 2], true);
    add_xor(&mut s, &[2, 3], true);
    add_xor(&mut s, &[1, 3], true);
    assert_eq!(s.solve(), lbool::FALSE);

    let mut gauss = GaussConf::default();
    gauss.decision_until = 32;
    gauss.min_matrix_rows = 1;
    let mut s = solver_with(SolverConf::default(), gauss);
    add_xor(&mut s, &[1, 2], true);
    add_xor(&mut s, &[2, 3], true);
    add_xor(&mut s, &[1, 3], false);
    assert_eq!(s.solve(), lbool::TRUE);
}

#[test]
fn test_gauss_on_longer_system() {
    // x1^x2^x3=1, x3^x4^x5=1, x1^x2^x4^x5=1: adding the first two gives
    // x1^x2^x4^x5=0, contradicting the third.
    let mut gauss = GaussConf::default();
    gauss.decision_until = 32;
    let mut s = solver_with(SolverConf::default(), gauss);
    add_xor(&mut s, &[1, 2, 3], true);
    add_xor(&mut s, &[3, 4, 5], true);
    add_xor(&mut s, &[1, 2, 4, 5], true);
    assert_eq!(s.solve(), lbool::FALSE);
}

#[test]
fn test_mixed_cnf_and_xor() {
    let clauses: Vec<Vec<i32>> = vec![vec![1, 2], vec![-1, 3], vec![-3, -2, 4]];
    let xors: Vec<(Vec<u32>, bool)> = vec![(vec![1, 4], false), (vec![2, 3, 4], true)];
    let mut s = solver();
    for c in &clauses {
        add(&mut s, c);
    }
    for (vs, rhs) in &xors {
        add_xor(&mut s, vs, *rhs);
    }
    assert_eq!(s.solve(), lbool::TRUE);
    model_satisfies(&s, &clauses, &xors);
}

#[test]
fn test_model_enumeration_finds_distinct_models() {
    let mut s = solver();
    s.var_of_int(1); // two free variables, no constraints
    let mut models: Vec<Vec<lbool>> = vec![];
    loop {
        let res = s.solve();
        if res != lbool::TRUE {
            assert_eq!(res, lbool::FALSE);
            break;
        }
        let model = s.get_model().to_vec();
        // block this model
        let mut blocking: Vec<Lit> = model
            .iter()
            .enumerate()
            .filter(|(_, &v)| v != lbool::UNDEF)
            .map(|(i, &v)| Lit::new(s.var_of_int(i as u32), v == lbool::FALSE))
            .collect();
        for prev in &models {
            assert_ne!(prev, &model, "enumeration repeated a model");
        }
        models.push(model);
        s.add_clause_reuse(&mut blocking);
    }
    assert_eq!(models.len(), 4);
}

#[test]
fn test_restart_budget_yields_undetermined() {
    let mut conf = SolverConf::default();
    conf.restart_first = 1;
    conf.max_restarts = 1;
    conf.do_sched_simp = false;
    let mut s = solver_with(conf, GaussConf::default());
    add_php_4_3(&mut s);
    assert_eq!(s.solve(), lbool::UNDEF);
    // state stays coherent for dumping
    let mut buf: Vec<u8> = vec![];
    s.dump_sorted_learnts(&mut buf, u32::MAX).unwrap();
    assert!(!buf.is_empty());
}

#[test]
fn test_php_4_3_unsat_with_dynamic_restarts() {
    let mut conf = SolverConf::default();
    conf.fix_restart_type = RestartType::Dynamic;
    let mut s = solver_with(conf, GaussConf::default());
    add_php_4_3(&mut s);
    assert_eq!(s.solve(), lbool::FALSE);
}

#[test]
fn test_php_4_3_unsat_with_static_restarts() {
    let mut conf = SolverConf::default();
    conf.fix_restart_type = RestartType::Static;
    let mut s = solver_with(conf, GaussConf::default());
    add_php_4_3(&mut s);
    assert_eq!(s.solve(), lbool::FALSE);
}

#[test]
fn test_polarity_modes_all_solve() {
    for mode in [
        PolarityMode::True,
        PolarityMode::False,
        PolarityMode::Rnd,
        PolarityMode::Auto,
    ] {
        let mut conf = SolverConf::default();
        conf.polarity_mode = mode;
        let mut s = solver_with(conf, GaussConf::default());
        add(&mut s, &[1, 2]);
        add(&mut s, &[-1, 2]);
        add(&mut s, &[1, -2]);
        assert_eq!(s.solve(), lbool::TRUE, "mode {:?}", mode);
    }
}

#[test]
fn test_restricted_branching_still_complete() {
    let mut conf = SolverConf::default();
    conf.restrict_pick_branch = 2;
    let mut s = solver_with(conf, GaussConf::default());
    add_php_3_2(&mut s);
    assert_eq!(s.solve(), lbool::FALSE);
}

#[test]
fn test_deterministic_with_fixed_seed() {
    let run = || {
        let mut conf = SolverConf::default();
        conf.orig_seed = 42;
        conf.random_var_freq = 0.1;
        let mut s = solver_with(conf, GaussConf::default());
        let clauses: Vec<Vec<i32>> = vec![
            vec![1, 2, 3],
            vec![-1, -2],
            vec![-2, -3],
            vec![-1, -3],
            vec![2, 4],
            vec![-4, 5, 1],
            vec![-5, -1, 2],
        ];
        for c in &clauses {
            add(&mut s, c);
        }
        let res = s.solve();
        (res, s.get_model().to_vec(), s.num_conflicts())
    };
    let a = run();
    let b = run();
    assert_eq!(a.0, b.0);
    assert_eq!(a.1, b.1);
    assert_eq!(a.2, b.2);
}

#[test]
fn test_interrupt_yields_undetermined() {
    let mut s = solver();
    add_php_4_3(&mut s);
    s.interrupt_handle().interrupt();
    assert_eq!(s.solve(), lbool::UNDEF);
}

#[test]
fn test_dump_and_reread_roundtrip() {
    let mut conf = SolverConf::default();
    conf.restart_first = 1;
    conf.max_restarts = 2;
    conf.do_sched_simp = false;
    let mut s = solver_with(conf, GaussConf::default());
    add_php_4_3(&mut s);
    add_xor(&mut s, &[13, 14], true);
    assert_eq!(s.solve(), lbool::UNDEF);

    let mut orig = vec![];
    s.dump_orig_clauses(&mut orig).unwrap();
    let mut learnts = vec![];
    s.dump_sorted_learnts(&mut learnts, u32::MAX).unwrap();

    // the dumps together must still be unsatisfiable
    let mut s2 = solver();
    let mut input = std::io::BufReader::new(&orig[..]);
    parsat::dimacs::parse(&mut input, &mut s2, parsat::dimacs::ParseOpts::default()).unwrap();
    let mut input = std::io::BufReader::new(&learnts[..]);
    parsat::dimacs::parse(&mut input, &mut s2, parsat::dimacs::ParseOpts::default()).unwrap();
    assert_eq!(s2.solve(), lbool::FALSE);
}

#[test]
fn test_simplify_episode_keeps_result() {
    let mut conf = SolverConf::default();
    conf.simp_start_confl = 5; // force frequent episodes
    let mut s = solver_with(conf, GaussConf::default());
    add_php_4_3(&mut s);
    assert_eq!(s.solve(), lbool::FALSE);
}

#[test]
fn test_solve_twice_after_sat() {
    let mut s = solver();
    add(&mut s, &[1, 2]);
    assert_eq!(s.solve(), lbool::TRUE);
    // adding a clause falsifying the model and re-solving still works
    let m1 = s.get_model()[0];
    let m2 = s.get_model()[1];
    let mut blocking = vec![
        Lit::new(s.var_of_int(0), m1 == lbool::FALSE),
        Lit::new(s.var_of_int(1), m2 == lbool::FALSE),
    ];
    s.add_clause_reuse(&mut blocking);
    assert_eq!(s.solve(), lbool::TRUE);
}
