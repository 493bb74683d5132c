//! XOR clause store and its two-watched-variable scheme.
//!
//! An XOR clause is an unordered set of variables together with a
//! right-hand-side bit: `v1 ^ … ^ vk = rhs`. Two variables per clause are
//! watched, so a clause is only inspected once at most one of its
//! variables remains unassigned.

use crate::clause::{lbool, Lit, OccVec, VMap, Var};
use crate::intmap::IntMap;

/// A parity constraint over a set of variables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XorClause {
    /// The variables; positions 0 and 1 are the watched ones.
    pub vars: Vec<Var>,
    /// The parity the variables must sum to.
    pub rhs: bool,
}

impl XorClause {
    pub fn new(vars: Vec<Var>, rhs: bool) -> Self {
        Self { vars, rhs }
    }
}

/// Sort the variables, cancel duplicate pairs (`v ^ v = 0`).
///
/// Returns the normalized clause; the rhs is untouched since duplicate
/// removal never changes parity.
pub fn normalize_vars(vars: &mut Vec<Var>) {
    vars.sort_unstable();
    let mut j = 0;
    let mut i = 0;
    while i < vars.len() {
        if i + 1 < vars.len() && vars[i] == vars[i + 1] {
            i += 2; // the pair cancels
        } else {
            vars[j] = vars[i];
            j += 1;
            i += 1;
        }
    }
    vars.truncate(j);
}

/// A reason synthesized for an assignment forced by parity reasoning.
///
/// `lits[0]` is the propagated literal; the rest are the falsified
/// literals of the variables substituted along the row or clause.
#[derive(Debug, Clone)]
pub(crate) struct XorReason {
    pub level: u32,
    pub lits: Vec<Lit>,
}

/// The store of XOR clauses with per-variable watch lists.
#[derive(Debug)]
pub(crate) struct XorSet {
    xors: Vec<XorClause>,
    watches: IntMap<Var, OccVec<u32>>,
}

impl XorSet {
    pub fn new() -> Self {
        Self {
            xors: vec![],
            watches: IntMap::new(),
        }
    }

    pub fn init_var(&mut self, v: Var) {
        self.watches.reserve_default(v);
    }

    pub fn len(&self) -> usize {
        self.xors.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &XorClause> {
        self.xors.iter()
    }

    /// Add a normalized clause with at least two variables and watch it.
    pub fn add(&mut self, xor: XorClause) {
        debug_assert!(xor.vars.len() >= 2);
        let idx = self.xors.len() as u32;
        self.watches[xor.vars[0]].push(idx);
        self.watches[xor.vars[1]].push(idx);
        self.xors.push(xor);
    }

    /// Remove every clause, dropping all watches. Used when the level-0
    /// simplifier rewrites the store.
    pub fn take_all(&mut self) -> Vec<XorClause> {
        for (_, w) in self.watches.iter_mut() {
            w.clear();
        }
        std::mem::replace(&mut self.xors, vec![])
    }

    /// Wake up the clauses watching `v` after `v` got assigned.
    ///
    /// Forced assignments are appended to `units` as `(lit, reason_idx)`
    /// pairs, with the synthesized reason pushed onto `reasons`. On a
    /// violated parity the falsified literals are written to `confl` and
    /// `false` is returned.
    pub fn propagate_var(
        &mut self,
        v: Var,
        ass: &VMap<lbool>,
        level: u32,
        reasons: &mut Vec<XorReason>,
        units: &mut Vec<(Lit, u32)>,
        confl: &mut Vec<Lit>,
    ) -> bool {
        debug_assert!(ass[v] != lbool::UNDEF);
        let mut i = 0;
        while i < self.watches[v].len() {
            let xi = self.watches[v][i] as usize;
            let xor = &mut self.xors[xi];
            if xor.vars[0] == v {
                xor.vars.swap(0, 1);
            }
            debug_assert_eq!(xor.vars[1], v);

            // look for a replacement watch
            let mut moved = false;
            for k in 2..xor.vars.len() {
                if ass[xor.vars[k]] == lbool::UNDEF {
                    xor.vars.swap(1, k);
                    let w = xor.vars[1];
                    let xi = xi as u32;
                    self.watches[w].push(xi);
                    self.watches[v].swap_remove(i);
                    moved = true;
                    break;
                }
            }
            if moved {
                continue;
            }

            // all of vars[1..] are assigned
            let w0 = xor.vars[0];
            if ass[w0] == lbool::UNDEF {
                // the clause forces w0 to restore the parity
                let mut val = xor.rhs;
                for &u in &xor.vars[1..] {
                    val ^= ass[u] == lbool::TRUE;
                }
                let lit = Lit::new(w0, val);
                let mut lits = Vec::with_capacity(xor.vars.len());
                lits.push(lit);
                for &u in &xor.vars[1..] {
                    lits.push(Lit::new(u, ass[u] == lbool::FALSE));
                }
                let idx = reasons.len() as u32;
                reasons.push(XorReason { level, lits });
                units.push((lit, idx));
                i += 1;
            } else {
                let mut parity = xor.rhs;
                for &u in &xor.vars {
                    parity ^= ass[u] == lbool::TRUE;
                }
                if parity {
                    // violated: blame every variable of the clause
                    confl.clear();
                    for &u in &xor.vars {
                        confl.push(Lit::new(u, ass[u] == lbool::FALSE));
                    }
                    return false;
                }
                i += 1;
            }
        }
        true
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn v(i: u32) -> Var {
        Var::from_idx(i)
    }

    #[test]
    fn test_normalize_cancels_pairs() {
        let mut vars = vec![v(2), v(0), v(2), v(1)];
        normalize_vars(&mut vars);
        assert_eq!(vars, vec![v(0), v(1)]);

        let mut vars = vec![v(3), v(3)];
        normalize_vars(&mut vars);
        assert!(vars.is_empty());
    }

    fn mk_set(n_vars: u32, xors: &[(&[u32], bool)]) -> (XorSet, VMap<lbool>) {
        let mut set = XorSet::new();
        let mut ass: VMap<lbool> = VMap::new();
        for i in 0..n_vars {
            set.init_var(v(i));
            ass.insert_default(v(i), lbool::UNDEF);
        }
        for &(vars, rhs) in xors {
            set.add(XorClause::new(vars.iter().map(|&i| v(i)).collect(), rhs));
        }
        (set, ass)
    }

    #[test]
    fn test_xor_unit_propagation() {
        // x0 ^ x1 = 1; assign x0=false -> x1 must be true
        let (mut set, mut ass) = mk_set(2, &[(&[0, 1], true)]);
        ass[v(0)] = lbool::FALSE;
        let mut reasons = vec![];
        let mut units = vec![];
        let mut confl = vec![];
        let ok = set.propagate_var(v(0), &ass, 1, &mut reasons, &mut units, &mut confl);
        assert!(ok);
        assert_eq!(units.len(), 1);
        let (lit, ridx) = units[0];
        assert_eq!(lit, Lit::new(v(1), true));
        assert_eq!(reasons[ridx as usize].lits[0], lit);
        // the rest of the reason is falsified under the assignment
        assert_eq!(reasons[ridx as usize].lits[1], Lit::new(v(0), true));
    }

    #[test]
    fn test_xor_conflict_on_violated_parity() {
        // x0 ^ x1 = 0; x0=true, x1=false violates it
        let (mut set, mut ass) = mk_set(2, &[(&[0, 1], false)]);
        ass[v(0)] = lbool::TRUE;
        let mut reasons = vec![];
        let mut units = vec![];
        let mut confl = vec![];
        assert!(set.propagate_var(v(0), &ass, 1, &mut reasons, &mut units, &mut confl));
        // x0=true forces x1=true
        assert_eq!(units[0].0, Lit::new(v(1), true));

        ass[v(1)] = lbool::FALSE;
        units.clear();
        let ok = set.propagate_var(v(1), &ass, 1, &mut reasons, &mut units, &mut confl);
        assert!(!ok);
        assert_eq!(confl.len(), 2);
        // every conflict literal is false under the assignment
        assert!(confl.contains(&Lit::new(v(0), false)));
        assert!(confl.contains(&Lit::new(v(1), true)));
    }

    #[test]
    fn test_xor_watch_moves_to_unassigned() {
        // x0 ^ x1 ^ x2 = 1; the first assignment only moves the watch
        let (mut set, mut ass) = mk_set(3, &[(&[0, 1, 2], true)]);
        let mut reasons = vec![];
        let mut units = vec![];
        let mut confl = vec![];

        ass[v(0)] = lbool::TRUE;
        assert!(set.propagate_var(v(0), &ass, 1, &mut reasons, &mut units, &mut confl));
        assert!(units.is_empty());

        ass[v(1)] = lbool::TRUE;
        assert!(set.propagate_var(v(1), &ass, 1, &mut reasons, &mut units, &mut confl));
        // x0 and x1 true -> x2 must be true to reach rhs=1
        assert_eq!(units.len(), 1);
        assert_eq!(units[0].0, Lit::new(v(2), true));
    }
}
