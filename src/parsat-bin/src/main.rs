/*****************************************************************************************[main.rs]
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

extern crate clap;
extern crate cpu_time;
extern crate ctrlc;
extern crate flate2;
extern crate parsat;

#[cfg(not(feature = "logging"))]
mod env_logger {
    pub fn init() {}
}

#[cfg(feature = "logging")]
extern crate env_logger;

use clap::{App, Arg, ArgMatches};
use flate2::bufread::GzDecoder;
use parsat::dimacs::ParseOpts;
use parsat::{
    lbool, Callbacks, GaussConf, Lit, PolarityMode, ProgressStatus, RestartType, Solver,
    SolverConf, SolverInterface,
};
use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Read, Write};
use std::process::exit;
use std::str::FromStr;
use std::sync::{mpsc, Arc};
use std::thread;
use std::time::Instant;

mod system;

fn main() {
    env_logger::init();
    let exitcode = main2().unwrap_or_else(|err| {
        eprintln!("{}", err);
        exit(1)
    });
    exit(exitcode);
}

/// Printing callbacks
struct CB {
    pub verbosity: i32,
    pub lim: Option<(system::ResourceMeasure, f64)>,
}

impl CB {
    fn new() -> Self {
        CB {
            verbosity: 0,
            lim: None,
        }
    }
}

impl Callbacks for CB {
    fn on_start(&mut self) {
        if self.verbosity >= 1 {
            println!("c ============================[ Search Statistics ]==============================");
            println!("c | Conflicts |       ORIGINAL        |         LEARNT          |    Progress  |");
            println!("c |           |    Vars  Clauses Xors |    Limit  Clauses  Glue |              |");
            println!("c ===============================================================================");
        }
    }

    fn on_result(&mut self, _: lbool) {
        if self.verbosity >= 1 {
            println!(
                "c ==============================================================================="
            );
        }
    }

    fn on_progress<F>(&mut self, f: F)
    where
        F: FnOnce() -> ProgressStatus,
    {
        if self.verbosity >= 1 {
            let p = f();
            println!(
                "c | {:9} | {:7} {:8} {:4} | {:8} {:8} {:5.1} | {:10.3} % |",
                p.conflicts,
                p.dec_vars,
                p.n_clauses,
                p.n_xors,
                p.max_learnt,
                p.n_learnt,
                p.avg_glue,
                p.progress_estimate
            );
        }
    }

    fn on_gc(&mut self, old: usize, new: usize) {
        if self.verbosity >= 2 {
            println!(
                "c |  Garbage collection:   {:12} bytes => {:12} bytes             |",
                old, new
            );
        }
    }

    fn stop(&self) -> bool {
        match self.lim {
            None => false,
            Some((ref r, max_cpu)) => r.cpu_time() > max_cpu,
        }
    }
}

type MSolver = Solver<CB>;

/// Everything the drivers need beyond the solver configuration.
struct RunOpts {
    conf: SolverConf,
    gauss_conf: GaussConf,
    parse_opts: ParseOpts,
    max_solutions: u64,
    print_model: bool,
    result_file: Option<String>,
    threads: usize,
    cpu_lim: Option<f64>,
}

fn arg_value<T: FromStr>(matches: &ArgMatches, name: &str, default: T) -> T {
    match matches.value_of(name) {
        None => default,
        Some(s) => s.parse().unwrap_or_else(|_| {
            eprintln!("ERROR! illegal value '{}' for option '{}'", s, name);
            exit(1)
        }),
    }
}

fn main2() -> io::Result<i32> {
    let resource = system::ResourceMeasure::new();

    let matches = App::new("parsat")
        .version("0.1.0")
        .about("XOR-aware CDCL SAT solver")
        .arg(Arg::with_name("input-file").help("plain or gzipped DIMACS; stdin when absent"))
        .arg(Arg::with_name("result-output-file"))
        .arg(
            Arg::with_name("verbosity")
                .long("verb")
                .default_value("1")
                .takes_value(true),
        )
        .arg(
            Arg::with_name("polarity-mode")
                .long("polarity-mode")
                .help("Default polarity selection: {true,false,rnd,auto}; auto is the Jeroslow-Wang method")
                .default_value("auto")
                .takes_value(true),
        )
        .arg(
            Arg::with_name("rnd-freq")
                .long("rnd-freq")
                .help("The frequency with which the decision heuristic tries to choose a random variable")
                .takes_value(true),
        )
        .arg(
            Arg::with_name("randomize")
                .long("randomize")
                .help("Seed for picking decision variables")
                .takes_value(true),
        )
        .arg(
            Arg::with_name("restrict")
                .long("restrict")
                .help("Pick a random variable among the N most active ones; useful for cryptographic problems where the question is a small key")
                .takes_value(true),
        )
        .arg(
            Arg::with_name("restart")
                .long("restart")
                .help("Restart strategy: {auto,static,dynamic}")
                .default_value("auto")
                .takes_value(true),
        )
        .arg(
            Arg::with_name("restarts")
                .long("restarts")
                .help("No more than the given number of restarts will be performed")
                .takes_value(true),
        )
        .arg(
            Arg::with_name("maxglue")
                .long("maxglue")
                .help("Glue value above which learnts are thrown away on backtrack; only active with dynamic restarts")
                .takes_value(true),
        )
        .arg(Arg::with_name("var-decay").long("var-decay").takes_value(true))
        .arg(Arg::with_name("cla-decay").long("cla-decay").takes_value(true))
        .arg(
            Arg::with_name("cpu-lim")
                .long("cpu-lim")
                .help("CPU time limit in seconds")
                .takes_value(true),
        )
        .arg(
            Arg::with_name("threads")
                .long("threads")
                .help("Number of independent solver workers; first to finish wins")
                .default_value("1")
                .takes_value(true),
        )
        .arg(
            Arg::with_name("maxsolutions")
                .long("maxsolutions")
                .help("Search for the given number of solutions")
                .default_value("1")
                .takes_value(true),
        )
        .arg(
            Arg::with_name("alsoread")
                .long("alsoread")
                .help("Also read this file in; can be used to re-read dumped learnts")
                .multiple(true)
                .number_of_values(1)
                .takes_value(true),
        )
        .arg(
            Arg::with_name("dumplearnts")
                .long("dumplearnts")
                .help("If interrupted or the restart limit is reached, dump the learnt clauses to this file")
                .takes_value(true),
        )
        .arg(
            Arg::with_name("maxdumplearnts")
                .long("maxdumplearnts")
                .help("Maximum length of a dumped learnt clause")
                .takes_value(true),
        )
        .arg(
            Arg::with_name("dumporig")
                .long("dumporig")
                .help("If interrupted or the restart limit is reached, dump the simplified original problem to this file")
                .takes_value(true),
        )
        .arg(Arg::with_name("nosolprint").long("nosolprint").help("Don't print the satisfying assignment"))
        .arg(Arg::with_name("is-strict").long("strict"))
        .arg(Arg::with_name("debuglib").long("debuglib").help("Solve at 'c Solver::solve()' points in the file"))
        .arg(Arg::with_name("debugnewvar").long("debugnewvar").help("Add variables at 'c Solver::newVar()' points in the file"))
        .arg(Arg::with_name("nosimplify").long("nosimplify").help("Don't do regular simplification rounds"))
        .arg(Arg::with_name("nosortwatched").long("nosortwatched").help("Don't sort watches according to size"))
        .arg(Arg::with_name("nolfminim").long("nolfminim").help("Don't do on-the-fly self-subsuming resolution"))
        .arg(Arg::with_name("lfminimrec").long("lfminimrec").help("Perform recursive/transitive learnt clause minimisation"))
        .arg(Arg::with_name("nonormxorfind").long("nonormxorfind").help("Don't find >2-long xor clauses among regular clauses"))
        .arg(Arg::with_name("nobinxorfind").long("nobinxorfind").help("Don't find 2-long xor clauses among regular clauses"))
        .arg(Arg::with_name("noconglomerate").long("noconglomerate").help("Don't conglomerate xor clauses over dependent variables"))
        .arg(Arg::with_name("noheuleprocess").long("noheuleprocess").help("Don't minimise xors by xor-ing them together"))
        .arg(Arg::with_name("noxorsubs").long("noxorsubs").help("Don't subsume xor clauses"))
        .arg(Arg::with_name("nosatelite").long("nosatelite").help("Don't do clause subsumption, strengthening and variable elimination"))
        .arg(Arg::with_name("novarelim").long("novarelim").help("Don't perform variable elimination"))
        .arg(Arg::with_name("nosubsume1").long("nosubsume1").help("Don't perform clause contraction through resolution"))
        .arg(Arg::with_name("noblockedclause").long("noblockedclause").help("Don't remove blocked clauses"))
        .arg(Arg::with_name("nofailedvar").long("nofailedvar").help("Don't search for failed literals"))
        .arg(Arg::with_name("nohyperbinres").long("nohyperbinres").help("Don't add binary clauses when doing failed literal probing"))
        .arg(Arg::with_name("noremovebins").long("noremovebins").help("Don't remove useless binary clauses"))
        .arg(Arg::with_name("nosubswithbins").long("nosubswithbins").help("Don't subsume with non-existent binaries"))
        .arg(Arg::with_name("noasymm").long("noasymm").help("Don't do asymmetric branching"))
        .arg(Arg::with_name("novarreplace").long("novarreplace").help("Don't perform variable replacement"))
        .arg(
            Arg::with_name("gaussuntil")
                .long("gaussuntil")
                .help("Depth until which Gaussian elimination is active; 0 switches it off")
                .takes_value(true),
        )
        .arg(Arg::with_name("nomatrixfind").long("nomatrixfind").help("Don't find distinct matrixes; put all xors into one"))
        .arg(Arg::with_name("noordercol").long("noordercol").help("Don't order variables in the matrix columns"))
        .arg(Arg::with_name("noiterreduce").long("noiterreduce").help("Don't reduce iteratively the matrix"))
        .arg(Arg::with_name("nodisablegauss").long("nodisablegauss").help("Never disable an unproductive matrix"))
        .arg(Arg::with_name("maxmatrixrows").long("maxmatrixrows").takes_value(true))
        .arg(Arg::with_name("minmatrixrows").long("minmatrixrows").takes_value(true))
        .arg(
            Arg::with_name("savematrix")
                .long("savematrix")
                .help("Save the matrix every Nth decision level")
                .takes_value(true),
        )
        .arg(Arg::with_name("maxnummatrixes").long("maxnummatrixes").takes_value(true))
        .get_matches();

    let mut conf = SolverConf::default();
    conf.verbosity = arg_value(&matches, "verbosity", 1);
    if conf.verbosity < 0 || conf.verbosity > 2 {
        eprintln!("ERROR! illegal verbosity level {}", conf.verbosity);
        exit(1);
    }
    conf.polarity_mode = match matches.value_of("polarity-mode").unwrap() {
        "true" => PolarityMode::True,
        "false" => PolarityMode::False,
        "rnd" => PolarityMode::Rnd,
        "auto" => PolarityMode::Auto,
        other => {
            eprintln!("ERROR! unknown polarity-mode {}", other);
            exit(1)
        }
    };
    conf.random_var_freq = arg_value(&matches, "rnd-freq", conf.random_var_freq);
    if conf.random_var_freq < 0.0 || conf.random_var_freq > 1.0 {
        eprintln!("ERROR! illegal rnd-freq constant {}", conf.random_var_freq);
        exit(1);
    }
    conf.orig_seed = arg_value(&matches, "randomize", conf.orig_seed);
    conf.restrict_pick_branch = arg_value(&matches, "restrict", conf.restrict_pick_branch);
    conf.fix_restart_type = match matches.value_of("restart").unwrap() {
        "auto" => RestartType::Auto,
        "static" => RestartType::Static,
        "dynamic" => RestartType::Dynamic,
        other => {
            eprintln!("ERROR! unknown restart type {}", other);
            exit(1)
        }
    };
    conf.max_restarts = arg_value(&matches, "restarts", conf.max_restarts);
    conf.max_glue = arg_value(&matches, "maxglue", conf.max_glue);
    conf.var_decay = arg_value(&matches, "var-decay", conf.var_decay);
    conf.clause_decay = arg_value(&matches, "cla-decay", conf.clause_decay);
    conf.do_sched_simp = !matches.is_present("nosimplify");
    conf.do_sort_watched = !matches.is_present("nosortwatched");
    conf.do_minim_learnt_more = !matches.is_present("nolfminim");
    conf.do_minim_l_more_recur = matches.is_present("lfminimrec");
    conf.do_find_xors = !matches.is_present("nonormxorfind");
    conf.do_find_eq_lits = !matches.is_present("nobinxorfind");
    conf.do_congl_xors = !matches.is_present("noconglomerate");
    conf.do_heule_process = !matches.is_present("noheuleprocess");
    conf.do_xor_subsumption = !matches.is_present("noxorsubs");
    conf.do_satelite = !matches.is_present("nosatelite");
    conf.do_var_elim = !matches.is_present("novarelim");
    conf.do_subsume1 = !matches.is_present("nosubsume1");
    conf.do_blocked_clause = !matches.is_present("noblockedclause");
    conf.do_failed_lit = !matches.is_present("nofailedvar");
    conf.do_hyper_bin_res = !matches.is_present("nohyperbinres");
    conf.do_rem_useless_bins = !matches.is_present("noremovebins");
    conf.do_subs_w_non_exist_bins = !matches.is_present("nosubswithbins");
    conf.do_asymm_branch = !matches.is_present("noasymm");
    conf.do_replace = !matches.is_present("novarreplace");
    if let Some(f) = matches.value_of("dumplearnts") {
        conf.need_to_dump_learnts = true;
        conf.learnts_filename = f.to_string();
    }
    conf.max_dump_learnts_size = arg_value(&matches, "maxdumplearnts", conf.max_dump_learnts_size);
    if let Some(f) = matches.value_of("dumporig") {
        conf.need_to_dump_orig = true;
        conf.orig_filename = f.to_string();
    }

    let mut gauss_conf = GaussConf::default();
    gauss_conf.decision_until = arg_value(&matches, "gaussuntil", gauss_conf.decision_until);
    gauss_conf.no_matrix_find = matches.is_present("nomatrixfind");
    gauss_conf.order_cols = !matches.is_present("noordercol");
    gauss_conf.iterative_reduce = !matches.is_present("noiterreduce");
    gauss_conf.dont_disable = matches.is_present("nodisablegauss");
    gauss_conf.max_matrix_rows = arg_value(&matches, "maxmatrixrows", gauss_conf.max_matrix_rows);
    gauss_conf.min_matrix_rows = arg_value(&matches, "minmatrixrows", gauss_conf.min_matrix_rows);
    gauss_conf.only_nth_gauss_save =
        arg_value(&matches, "savematrix", gauss_conf.only_nth_gauss_save);
    gauss_conf.max_num_matrixes =
        arg_value(&matches, "maxnummatrixes", gauss_conf.max_num_matrixes);

    if !conf.check() || !gauss_conf.check() {
        eprintln!("ERROR! invalid option value");
        exit(1);
    }

    let mut parse_opts = ParseOpts::default();
    parse_opts.is_strict = matches.is_present("is-strict");
    parse_opts.debug_lib = matches.is_present("debuglib");
    parse_opts.debug_new_var = matches.is_present("debugnewvar");

    let opts = RunOpts {
        max_solutions: arg_value(&matches, "maxsolutions", 1u64).max(1),
        print_model: !matches.is_present("nosolprint"),
        result_file: matches.value_of("result-output-file").map(|s| s.to_string()),
        threads: arg_value(&matches, "threads", 1usize).max(1),
        cpu_lim: matches
            .value_of("cpu-lim")
            .map(|s| s.parse().unwrap_or(-1.0))
            .filter(|&x| x > 0.0),
        conf,
        gauss_conf,
        parse_opts,
    };

    // read every input up front (extra files first, then the main one), so
    // the portfolio workers can each parse the same bytes
    let mut inputs: Vec<Vec<u8>> = vec![];
    if let Some(files) = matches.values_of("alsoread") {
        for f in files {
            inputs.push(read_file_autogz(Some(f), opts.conf.verbosity)?);
        }
    }
    inputs.push(read_file_autogz(
        matches.value_of("input-file"),
        opts.conf.verbosity,
    )?);

    if opts.threads > 1 {
        multi_thread_solve(opts, inputs, resource)
    } else {
        single_thread_solve(opts, inputs, resource)
    }
}

/// Read a file (or stdin when `path` is `None`), transparently inflating
/// gzip input.
fn read_file_autogz(path: Option<&str>, verbosity: i32) -> io::Result<Vec<u8>> {
    let mut reader: Box<dyn BufRead> = match path {
        Some(p) => {
            if verbosity >= 1 {
                println!("c Reading file '{}'", p);
            }
            Box::new(BufReader::new(File::open(p)?))
        }
        None => {
            if verbosity >= 1 {
                println!("c Reading from standard input... Use '--help' for help.");
            }
            Box::new(BufReader::new(io::stdin()))
        }
    };
    let is_gz = reader.fill_buf()?.starts_with(b"\x1F\x8B");
    let mut data = vec![];
    if is_gz {
        GzDecoder::new(reader).read_to_end(&mut data)?;
    } else {
        reader.read_to_end(&mut data)?;
    }
    Ok(data)
}

fn parse_all(inputs: &[Vec<u8>], solver: &mut MSolver, opts: ParseOpts) -> io::Result<()> {
    for data in inputs {
        let mut input = BufReader::new(&data[..]);
        parsat::dimacs::parse(&mut input, solver, opts)?;
    }
    Ok(())
}

/// Print the result the way the output contract wants it: `s` lines (plus
/// the `v` model line) on the console, bare `SAT`/`UNSAT`/`INCONCLUSIVE`
/// plus the assignment into the result file.
fn print_result_func(
    solver: &MSolver,
    ret: lbool,
    resfile: Option<&mut BufWriter<File>>,
    print_model: bool,
) -> io::Result<()> {
    match resfile {
        Some(res) => {
            if ret == lbool::TRUE {
                println!("c SAT");
                writeln!(res, "SAT")?;
                if print_model {
                    for (i, &val) in solver.get_model().iter().enumerate() {
                        if val != lbool::UNDEF {
                            write!(
                                res,
                                "{}{} ",
                                if val == lbool::TRUE { "" } else { "-" },
                                i + 1
                            )?;
                        }
                    }
                    writeln!(res, "0")?;
                }
            } else if ret == lbool::FALSE {
                println!("c UNSAT");
                writeln!(res, "UNSAT")?;
            } else {
                println!("c INCONCLUSIVE");
                writeln!(res, "INCONCLUSIVE")?;
            }
            res.flush()?;
        }
        None => {
            if ret == lbool::TRUE {
                println!("s SATISFIABLE");
                if print_model {
                    println!("{}", solver.dimacs_model());
                }
            } else if ret == lbool::FALSE {
                println!("s UNSATISFIABLE");
            }
        }
    }
    Ok(())
}

fn dump_files(solver: &MSolver) -> io::Result<()> {
    let conf = solver.conf();
    if conf.need_to_dump_learnts {
        let mut w = BufWriter::new(File::create(&conf.learnts_filename)?);
        solver.dump_sorted_learnts(&mut w, conf.max_dump_learnts_size)?;
        w.flush()?;
        println!(
            "c Sorted learnt clauses dumped to file '{}'",
            conf.learnts_filename
        );
    }
    if conf.need_to_dump_orig {
        let mut w = BufWriter::new(File::create(&conf.orig_filename)?);
        solver.dump_orig_clauses(&mut w)?;
        w.flush()?;
        println!(
            "c Simplified original clauses dumped to file '{}'",
            conf.orig_filename
        );
    }
    Ok(())
}

fn return_value(ret: lbool) -> i32 {
    if ret == lbool::TRUE {
        10
    } else if ret == lbool::FALSE {
        20
    } else {
        15
    }
}

/// Enumerate up to `max_solutions` models by blocking each one found.
fn solve_with_enumeration(
    solver: &mut MSolver,
    opts: &RunOpts,
    resfile: &mut Option<BufWriter<File>>,
) -> io::Result<lbool> {
    let mut nsolutions: u64 = 0;
    let mut ret = solver.solve();
    while ret == lbool::TRUE {
        nsolutions += 1;
        if nsolutions >= opts.max_solutions {
            break;
        }
        print_result_func(solver, ret, resfile.as_mut(), opts.print_model)?;
        if opts.conf.verbosity >= 1 {
            println!("c Prepare for next run...");
        }
        let model = solver.get_model().to_vec();
        let mut blocking: Vec<Lit> = model
            .iter()
            .enumerate()
            .filter(|(_, &v)| v != lbool::UNDEF)
            .map(|(i, &v)| Lit::new(solver.var_of_int(i as u32), v == lbool::FALSE))
            .collect();
        if !solver.add_clause_reuse(&mut blocking) {
            ret = lbool::FALSE;
            break;
        }
        ret = solver.solve();
    }
    Ok(ret)
}

fn single_thread_solve(
    opts: RunOpts,
    inputs: Vec<Vec<u8>>,
    resource: system::ResourceMeasure,
) -> io::Result<i32> {
    let mut cb = CB::new();
    cb.verbosity = opts.conf.verbosity;
    if let Some(max_cpu) = opts.cpu_lim {
        cb.lim = Some((system::ResourceMeasure::new(), max_cpu));
    }
    let mut solver = Solver::new(opts.conf.clone(), opts.gauss_conf.clone(), cb);

    let handle = solver.interrupt_handle();
    let _ = ctrlc::set_handler(move || {
        eprintln!("c *** INTERRUPTED ***");
        handle.interrupt();
    });

    let parse_start = Instant::now();
    parse_all(&inputs, &mut solver, opts.parse_opts)?;
    if solver.cb().verbosity >= 1 {
        println!(
            "c |  Number of variables:  {:12}                                         |",
            solver.num_vars()
        );
        println!(
            "c |  Number of clauses:    {:12}                                         |",
            solver.num_clauses()
        );
        println!(
            "c |  Number of xor clauses:{:12}                                         |",
            solver.num_xors()
        );
        let duration = parse_start.elapsed();
        println!(
            "c |  Parse time:           {:9}.{:02} s                                       |",
            duration.as_secs(),
            duration.subsec_nanos() / 10_000_000
        );
    }

    let mut resfile = match &opts.result_file {
        Some(f) => Some(BufWriter::new(File::create(f)?)),
        None => None,
    };

    if !solver.simplify() {
        if solver.cb().verbosity >= 1 {
            println!("c Solved by unit propagation");
        }
        print_result_func(&solver, lbool::FALSE, resfile.as_mut(), opts.print_model)?;
        if solver.cb().verbosity >= 1 {
            solver.print_stats();
        }
        return Ok(20);
    }

    let ret = solve_with_enumeration(&mut solver, &opts, &mut resfile)?;

    dump_files(&solver)?;
    if ret == lbool::UNDEF && opts.conf.verbosity >= 1 {
        println!("c Not finished running -- maximum restart or interrupt reached");
    }
    print_result_func(&solver, ret, resfile.as_mut(), opts.print_model)?;
    if opts.conf.verbosity >= 1 {
        solver.print_stats();
        println!("c CPU time              : {:.3} s", resource.cpu_time());
    }

    Ok(return_value(ret))
}

/// Run independent, diversified workers; the first finished result wins and
/// the others are interrupted. The workers share nothing but the input
/// bytes.
fn multi_thread_solve(
    opts: RunOpts,
    inputs: Vec<Vec<u8>>,
    resource: system::ResourceMeasure,
) -> io::Result<i32> {
    if opts.conf.verbosity >= 1 {
        println!("c Using {} threads", opts.threads);
    }
    let inputs = Arc::new(inputs);
    let (tx, rx) = mpsc::channel();
    let mut interrupts = vec![];
    let mut joins = vec![];

    for i in 0..opts.threads {
        let mut conf = opts.conf.clone();
        conf.orig_seed = i as u32;
        if i > 0 {
            conf.fix_restart_type = if i % 2 == 1 {
                RestartType::Dynamic
            } else {
                RestartType::Static
            };
            conf.simp_start_confl *= 2 * (i as u64 + 1);
            conf.verbosity = 0;
        }
        let mut cb = CB::new();
        cb.verbosity = conf.verbosity;
        if let Some(max_cpu) = opts.cpu_lim {
            cb.lim = Some((system::ResourceMeasure::new(), max_cpu));
        }
        let solver = Solver::new(conf, opts.gauss_conf.clone(), cb);
        interrupts.push(solver.interrupt_handle());

        let tx = tx.clone();
        let inputs = Arc::clone(&inputs);
        let parse_opts = opts.parse_opts;
        joins.push(thread::spawn(move || {
            let mut solver = solver;
            if parse_all(&inputs, &mut solver, parse_opts).is_err() {
                let _ = tx.send((i, lbool::UNDEF, solver));
                return;
            }
            let ret = if solver.simplify() {
                solver.solve()
            } else {
                lbool::FALSE
            };
            let _ = tx.send((i, ret, solver));
        }));
    }
    drop(tx);

    {
        let interrupts = interrupts.clone();
        let _ = ctrlc::set_handler(move || {
            eprintln!("c *** INTERRUPTED ***");
            for h in &interrupts {
                h.interrupt();
            }
        });
    }

    let (winner, ret, solver) = rx
        .recv()
        .map_err(|_| io::Error::new(io::ErrorKind::Other, "all workers died"))?;
    for h in &interrupts {
        h.interrupt();
    }
    for j in joins {
        let _ = j.join();
    }

    if opts.conf.verbosity >= 1 {
        println!("c Worker {} finished first", winner);
    }
    let mut resfile = match &opts.result_file {
        Some(f) => Some(BufWriter::new(File::create(f)?)),
        None => None,
    };
    dump_files(&solver)?;
    print_result_func(&solver, ret, resfile.as_mut(), opts.print_model)?;
    if opts.conf.verbosity >= 1 {
        solver.print_stats();
        println!("c CPU time              : {:.3} s", resource.cpu_time());
    }

    Ok(return_value(ret))
}
