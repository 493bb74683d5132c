/*****************************************************************************************[dimacs.rs]
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

//! DIMACS CNF reader, extended with XOR clauses.
//!
//! An XOR clause is a line starting with `x` followed by literals and a
//! terminating `0`. The line `x 1 2 0` constrains `v1 ^ v2 = true`; every
//! negated literal flips the right-hand side, so `x -1 2 0` constrains
//! `v1 ^ v2 = false`.

use {
    crate::{
        clause::Var,
        interface::SolverInterface,
        {lbool, Lit},
    },
    std::io::{self, BufRead},
};

/// Options of the parser.
#[derive(Debug, Clone, Copy, Default)]
pub struct ParseOpts {
    /// Fail if the clause count does not match the declared header
    pub is_strict: bool,
    /// Solve at `c Solver::solve()` markers embedded in the file
    pub debug_lib: bool,
    /// Allocate a variable at `c Solver::newVar()` markers
    pub debug_new_var: bool,
}

/// `parse(input, solver, opts)` adds the content of `input` to the solver.
pub fn parse<S: SolverInterface, R: BufRead>(
    input: &mut R,
    solver: &mut S,
    opts: ParseOpts,
) -> io::Result<()> {
    let mut lits = vec![];
    let mut vars = vec![];
    let mut declared_vars: i32 = -1;
    let mut num_clauses = 0;
    let mut num_read_clauses = 0;
    loop {
        skip_whitespace(input)?;
        let ch = next_byte(input)?;
        if ch == Some(b'p') {
            let mut header = [0; 5];
            input.read_exact(&mut header)?;
            if &header != b"p cnf" {
                return parse_error(format!("PARSE ERROR! Unexpected char: p"));
            }
            declared_vars = parse_int(input)?;
            num_clauses = parse_int(input)?;
            if declared_vars > 0 {
                solver.var_of_int(declared_vars as u32 - 1);
            }
        } else if ch == Some(b'c') {
            if opts.debug_lib || opts.debug_new_var {
                let line = read_line(input)?;
                if opts.debug_lib && line.starts_with("c Solver::solve()") {
                    let res = solver.solve();
                    if res == lbool::TRUE {
                        println!("c Solver::solve() returned SAT");
                    } else if res == lbool::FALSE {
                        println!("c Solver::solve() returned UNSAT");
                    } else {
                        println!("c Solver::solve() returned UNKNOWN");
                    }
                } else if opts.debug_new_var && line.starts_with("c Solver::newVar()") {
                    solver.new_var_default();
                }
            } else {
                skip_line(input)?;
            }
        } else if ch == Some(b'x') {
            input.consume(1); // skip 'x'
            let rhs = read_xor_clause(input, solver, &mut vars, declared_vars, opts.is_strict)?;
            solver.add_xor_clause_reuse(&mut vars, rhs);
            num_read_clauses += 1;
        } else if let Some(_) = ch {
            read_clause(input, solver, &mut lits, declared_vars, opts.is_strict)?;
            solver.add_clause_reuse(&mut lits);
            num_read_clauses += 1;
        } else {
            break;
        }
    }
    if opts.is_strict && num_clauses != num_read_clauses {
        return parse_error(format!(
            "PARSE ERROR! DIMACS header mismatch: wrong number of clauses"
        ));
    }
    Ok(())
}

fn check_var_range(parsed_lit: i32, declared_vars: i32, is_strict: bool) -> io::Result<()> {
    if parsed_lit == 0 {
        return parse_error(format!("PARSE ERROR! Variable index 0 is invalid"));
    }
    if is_strict && declared_vars >= 0 && parsed_lit.abs() > declared_vars {
        return parse_error(format!(
            "PARSE ERROR! Literal {} out of declared range",
            parsed_lit
        ));
    }
    Ok(())
}

fn read_clause<S: SolverInterface, R: BufRead>(
    input: &mut R,
    solver: &mut S,
    lits: &mut Vec<Lit>,
    declared_vars: i32,
    is_strict: bool,
) -> io::Result<()> {
    lits.clear();
    loop {
        let parsed_lit = parse_int(input)?;
        if parsed_lit == 0 {
            return Ok(());
        }
        check_var_range(parsed_lit, declared_vars, is_strict)?;
        let var = (parsed_lit.abs() - 1) as u32;
        let lit = Lit::new(solver.var_of_int(var), parsed_lit > 0);
        lits.push(lit);
    }
}

/// Read the variables of an `x` line; the returned right-hand side starts
/// true and is flipped by every negated literal.
fn read_xor_clause<S: SolverInterface, R: BufRead>(
    input: &mut R,
    solver: &mut S,
    vars: &mut Vec<Var>,
    declared_vars: i32,
    is_strict: bool,
) -> io::Result<bool> {
    vars.clear();
    let mut rhs = true;
    loop {
        let parsed_lit = parse_int(input)?;
        if parsed_lit == 0 {
            return Ok(rhs);
        }
        check_var_range(parsed_lit, declared_vars, is_strict)?;
        if parsed_lit < 0 {
            rhs = !rhs;
        }
        let var = (parsed_lit.abs() - 1) as u32;
        vars.push(solver.var_of_int(var));
    }
}

fn parse_int<R: BufRead>(input: &mut R) -> io::Result<i32> {
    skip_whitespace(input)?;
    let ch = next_byte(input)?;
    let neg = if ch == Some(b'+') || ch == Some(b'-') {
        input.consume(1);
        ch == Some(b'-')
    } else {
        false
    };
    if let Some(ch) = next_byte(input)? {
        if !(b'0' <= ch && ch <= b'9') {
            return parse_error(format!("PARSE ERROR! Unexpected char: {}", ch as char));
        }
    } else {
        return parse_error(format!("PARSE ERROR! Unexpected EOF"));
    };
    let mut val = 0;
    while let Some(ch) = next_byte(input)? {
        if !(b'0' <= ch && ch <= b'9') {
            break;
        }
        input.consume(1);
        val = val * 10 + (ch - b'0') as i32;
    }
    if neg {
        Ok(-val)
    } else {
        Ok(val)
    }
}

#[inline(always)]
fn is_whitespace(ch: Option<u8>) -> bool {
    ch.map(|ch| b'\x09' <= ch && ch <= b'\x0d' || ch == b' ')
        .unwrap_or(false)
}

fn skip_whitespace<R: BufRead>(input: &mut R) -> io::Result<()> {
    while is_whitespace(next_byte(input)?) {
        input.consume(1);
    }
    Ok(())
}

fn skip_line<R: BufRead>(input: &mut R) -> io::Result<()> {
    loop {
        if let Some(ch) = next_byte(input)? {
            input.consume(1);
            if ch == b'\n' {
                return Ok(());
            }
        } else {
            return Ok(());
        }
    }
}

fn read_line<R: BufRead>(input: &mut R) -> io::Result<String> {
    let mut line = String::new();
    while let Some(ch) = next_byte(input)? {
        input.consume(1);
        if ch == b'\n' {
            break;
        }
        line.push(ch as char);
    }
    Ok(line)
}

fn next_byte<R: BufRead>(input: &mut R) -> io::Result<Option<u8>> {
    Ok(input.fill_buf()?.first().map(|&ch| ch))
}

fn parse_error<T>(message: String) -> io::Result<T> {
    Err(io::Error::new(io::ErrorKind::InvalidInput, message))
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::BasicSolver;

    fn parse_str(s: &str, solver: &mut BasicSolver, opts: ParseOpts) -> io::Result<()> {
        let mut input = io::BufReader::new(s.as_bytes());
        parse(&mut input, solver, opts)
    }

    #[test]
    fn test_parse_simple_cnf() {
        let mut s = BasicSolver::default();
        parse_str("p cnf 3 2\n1 -2 0\n2 3 0\n", &mut s, ParseOpts::default()).unwrap();
        assert_eq!(s.num_vars(), 3);
        assert_eq!(s.num_clauses(), 2);
    }

    #[test]
    fn test_parse_gap_creates_vars() {
        let mut s = BasicSolver::default();
        parse_str("1 5 0\n", &mut s, ParseOpts::default()).unwrap();
        assert_eq!(s.num_vars(), 5);
    }

    #[test]
    fn test_parse_xor_line_signs() {
        let mut s = BasicSolver::default();
        parse_str("p cnf 2 1\nx 1 2 0\n", &mut s, ParseOpts::default()).unwrap();
        assert_eq!(s.num_xors(), 1);

        // two flipped signs cancel: still rhs = true
        let mut s = BasicSolver::default();
        parse_str("p cnf 2 1\nx -1 -2 0\n", &mut s, ParseOpts::default()).unwrap();
        assert_eq!(s.num_xors(), 1);
    }

    #[test]
    fn test_parse_empty_xor_rhs_one_is_unsat() {
        // `x 0` is the empty parity constraint 0 = 1
        let mut s = BasicSolver::default();
        parse_str("p cnf 1 1\nx 0\n", &mut s, ParseOpts::default()).unwrap();
        assert!(!s.is_ok());
    }

    #[test]
    fn test_strict_clause_count_mismatch() {
        let mut s = BasicSolver::default();
        let mut opts = ParseOpts::default();
        opts.is_strict = true;
        let res = parse_str("p cnf 2 2\n1 2 0\n", &mut s, opts);
        assert!(res.is_err());
    }

    #[test]
    fn test_strict_out_of_range_literal() {
        let mut s = BasicSolver::default();
        let mut opts = ParseOpts::default();
        opts.is_strict = true;
        let res = parse_str("p cnf 2 1\n1 7 0\n", &mut s, opts);
        assert!(res.is_err());
    }

    #[test]
    fn test_bad_char_is_parse_error() {
        let mut s = BasicSolver::default();
        let res = parse_str("p cnf 1 1\n1 ? 0\n", &mut s, ParseOpts::default());
        assert!(res.is_err());
    }

    #[test]
    fn test_debug_newvar_marker() {
        let mut s = BasicSolver::default();
        let mut opts = ParseOpts::default();
        opts.debug_new_var = true;
        parse_str("c Solver::newVar()\nc Solver::newVar()\n", &mut s, opts).unwrap();
        assert_eq!(s.num_vars(), 2);
    }
}
