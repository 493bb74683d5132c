//! Gaussian elimination over GF(2) for the XOR clause matrices.
//!
//! XOR clauses sharing variables are grouped into matrices (connected
//! components, unless disabled). During search, each matrix is reduced to
//! echelon form over the currently-unassigned columns; a row left with no
//! unassigned column and odd substituted parity is a conflict, a row with
//! exactly one is a forced assignment. The blamed literals of a row are
//! exactly the assigned variables it mentions, so learnt clauses from
//! parity reasoning stay sound.

use crate::clause::{lbool, Lit, VMap, Var};
use crate::config::GaussConf;
use crate::xor::{XorClause, XorReason};

/// A matrix row: one bit per column plus the right-hand-side bit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct PackedRow {
    bits: Vec<u64>,
    rhs: bool,
}

impl PackedRow {
    pub fn new(n_cols: usize, rhs: bool) -> Self {
        Self {
            bits: vec![0; (n_cols + 63) / 64],
            rhs,
        }
    }

    #[inline(always)]
    pub fn get(&self, col: usize) -> bool {
        (self.bits[col / 64] >> (col % 64)) & 1 != 0
    }

    #[inline(always)]
    pub fn set(&mut self, col: usize) {
        self.bits[col / 64] |= 1 << (col % 64);
    }

    pub fn rhs(&self) -> bool {
        self.rhs
    }

    pub fn xor_assign(&mut self, other: &PackedRow) {
        debug_assert_eq!(self.bits.len(), other.bits.len());
        for (a, b) in self.bits.iter_mut().zip(other.bits.iter()) {
            *a ^= *b;
        }
        self.rhs ^= other.rhs;
    }

    pub fn is_zero(&self) -> bool {
        self.bits.iter().all(|&w| w == 0)
    }

    /// Iterate the indices of set columns.
    pub fn iter_set<'a>(&'a self) -> impl Iterator<Item = usize> + 'a {
        self.bits.iter().enumerate().flat_map(|(wi, &w)| {
            (0..64).filter(move |b| (w >> b) & 1 != 0).map(move |b| wi * 64 + b)
        })
    }
}

/// What a round of elimination produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum GaussResult {
    Nothing,
    Prop,
    Confl,
}

#[derive(Debug)]
struct GaussMatrix {
    /// column index -> variable
    cols: Vec<Var>,
    rows_orig: Vec<PackedRow>,
    /// working rows, kept reduced in iterative mode
    rows: Vec<PackedRow>,
    /// (decision level, rows) pairs, most recent last
    snapshots: Vec<(u32, Vec<PackedRow>)>,
    disabled: bool,
    called: u64,
    useful: u64,
}

impl GaussMatrix {
    fn build(cols: Vec<Var>, xors: &[&XorClause]) -> Self {
        let col_of = {
            let mut m = std::collections::HashMap::new();
            for (i, &v) in cols.iter().enumerate() {
                m.insert(v, i);
            }
            m
        };
        let mut rows_orig = Vec::with_capacity(xors.len());
        for x in xors {
            let mut row = PackedRow::new(cols.len(), x.rhs);
            for &v in &x.vars {
                row.set(col_of[&v]);
            }
            rows_orig.push(row);
        }
        let rows = rows_orig.clone();
        Self {
            cols,
            rows_orig,
            rows,
            snapshots: vec![],
            disabled: false,
            called: 0,
            useful: 0,
        }
    }

    /// Row-reduce over the unassigned columns.
    fn eliminate(rows: &mut Vec<PackedRow>, cols: &[Var], ass: &VMap<lbool>) {
        let mut r = 0;
        for c in 0..cols.len() {
            if ass[cols[c]] != lbool::UNDEF {
                continue;
            }
            let pivot = match (r..rows.len()).find(|&k| rows[k].get(c)) {
                Some(k) => k,
                None => continue,
            };
            rows.swap(r, pivot);
            let piv = rows[r].clone();
            for (k, row) in rows.iter_mut().enumerate() {
                if k != r && row.get(c) {
                    row.xor_assign(&piv);
                }
            }
            r += 1;
            if r == rows.len() {
                break;
            }
        }
    }

    /// Scan the reduced rows for conflicts and forced assignments.
    fn extract(
        rows: &[PackedRow],
        cols: &[Var],
        ass: &VMap<lbool>,
        level: u32,
        reasons: &mut Vec<XorReason>,
        units: &mut Vec<(Lit, u32)>,
        confl: &mut Vec<Lit>,
    ) -> GaussResult {
        let mut res = GaussResult::Nothing;
        for row in rows {
            let mut unassigned: Option<usize> = None;
            let mut n_unassigned = 0;
            let mut parity = row.rhs();
            for c in row.iter_set() {
                let v = cols[c];
                match ass[v] {
                    x if x == lbool::UNDEF => {
                        unassigned = Some(c);
                        n_unassigned += 1;
                        if n_unassigned > 1 {
                            break;
                        }
                    }
                    x => parity ^= x == lbool::TRUE,
                }
            }
            if n_unassigned > 1 {
                continue;
            }
            if n_unassigned == 0 {
                if parity {
                    // 0 = 1: blame the substituted variables of the row
                    confl.clear();
                    for c in row.iter_set() {
                        let v = cols[c];
                        confl.push(Lit::new(v, ass[v] == lbool::FALSE));
                    }
                    return GaussResult::Confl;
                }
                continue;
            }
            // exactly one unassigned column: the row forces it
            let u = cols[unassigned.expect("row with one unassigned column")];
            let lit = Lit::new(u, parity);
            let mut lits = vec![lit];
            for c in row.iter_set() {
                let v = cols[c];
                if v != u {
                    lits.push(Lit::new(v, ass[v] == lbool::FALSE));
                }
            }
            let idx = reasons.len() as u32;
            reasons.push(XorReason { level, lits });
            units.push((lit, idx));
            res = GaussResult::Prop;
        }
        res
    }
}

/// The set of Gaussian matrices plus their shared configuration.
#[derive(Debug)]
pub(crate) struct GaussEngine {
    conf: GaussConf,
    matrices: Vec<GaussMatrix>,

    // statistics
    pub sum_called: u64,
    pub sum_confl: u64,
    pub sum_prop: u64,
    pub sum_unit_truths: u64,
}

/// Calls before the usefulness of a matrix is judged.
const DISABLE_CHECK_CALLS: u64 = 800;
/// A matrix below 1-in-20 useful calls gets disabled.
const DISABLE_USEFUL_RATIO: u64 = 20;

impl GaussEngine {
    pub fn new(conf: GaussConf) -> Self {
        Self {
            conf,
            matrices: vec![],
            sum_called: 0,
            sum_confl: 0,
            sum_prop: 0,
            sum_unit_truths: 0,
        }
    }

    pub fn conf(&self) -> &GaussConf {
        &self.conf
    }

    pub fn num_matrices(&self) -> usize {
        self.matrices.len()
    }

    /// Gaussian reasoning runs while the decision level is shallow enough.
    pub fn active_at(&self, level: u32) -> bool {
        self.conf.decision_until > 0
            && level <= self.conf.decision_until
            && !self.matrices.is_empty()
    }

    /// Group the XOR clauses into matrices and build their rows.
    ///
    /// Called at the start of a solve and after a simplification episode
    /// rewrote the XOR store.
    pub fn build_matrices<'a, I>(&mut self, xors: I, num_vars: u32)
    where
        I: Iterator<Item = &'a XorClause>,
    {
        self.matrices.clear();
        if self.conf.decision_until == 0 {
            return;
        }

        let all: Vec<&XorClause> = xors.collect();
        if all.is_empty() {
            return;
        }

        // union-find over variables to get connected components
        let mut parent: Vec<u32> = (0..num_vars).collect();
        fn find(parent: &mut Vec<u32>, mut x: u32) -> u32 {
            while parent[x as usize] != x {
                let gp = parent[parent[x as usize] as usize];
                parent[x as usize] = gp;
                x = gp;
            }
            x
        }
        if !self.conf.no_matrix_find {
            for x in &all {
                let r0 = find(&mut parent, x.vars[0].idx());
                for &v in &x.vars[1..] {
                    let r = find(&mut parent, v.idx());
                    parent[r as usize] = r0;
                }
            }
        }

        // group xors by component root (or all together)
        let mut groups: std::collections::HashMap<u32, Vec<&XorClause>> =
            std::collections::HashMap::new();
        for x in &all {
            let key = if self.conf.no_matrix_find {
                0
            } else {
                find(&mut parent, x.vars[0].idx())
            };
            groups.entry(key).or_insert_with(Vec::new).push(x);
        }

        let mut groups: Vec<Vec<&XorClause>> = groups.into_iter().map(|(_, g)| g).collect();
        // biggest components first, deterministically
        groups.sort_by_key(|g| {
            let min_var = g.iter().flat_map(|x| x.vars.iter()).min().cloned();
            (std::cmp::Reverse(g.len()), min_var)
        });

        for g in groups {
            if self.matrices.len() >= self.conf.max_num_matrixes as usize {
                break;
            }
            let n_rows = g.len() as u32;
            if n_rows < self.conf.min_matrix_rows || n_rows > self.conf.max_matrix_rows {
                continue;
            }
            // column ordering: densest variables first when requested
            let mut occ: std::collections::HashMap<Var, (u32, Var)> =
                std::collections::HashMap::new();
            for x in &g {
                for &v in &x.vars {
                    occ.entry(v).or_insert((0, v)).0 += 1;
                }
            }
            let mut cols: Vec<(u32, Var)> = occ.into_iter().map(|(_, p)| p).collect();
            if self.conf.order_cols {
                cols.sort_by_key(|&(n, v)| (std::cmp::Reverse(n), v));
            } else {
                cols.sort_by_key(|&(_, v)| v);
            }
            let cols: Vec<Var> = cols.into_iter().map(|(_, v)| v).collect();
            self.matrices.push(GaussMatrix::build(cols, &g));
        }
    }

    /// Run one round of elimination at the given decision level.
    pub fn perform(
        &mut self,
        ass: &VMap<lbool>,
        level: u32,
        reasons: &mut Vec<XorReason>,
        units: &mut Vec<(Lit, u32)>,
        confl: &mut Vec<Lit>,
    ) -> GaussResult {
        let mut res = GaussResult::Nothing;
        for m in self.matrices.iter_mut() {
            if m.disabled {
                continue;
            }
            m.called += 1;
            self.sum_called += 1;

            let mut scratch;
            let rows: &mut Vec<PackedRow> = if self.conf.iterative_reduce {
                &mut m.rows
            } else {
                scratch = m.rows_orig.clone();
                &mut scratch
            };

            GaussMatrix::eliminate(rows, &m.cols, ass);
            let r = GaussMatrix::extract(rows, &m.cols, ass, level, reasons, units, confl);

            match r {
                GaussResult::Confl => {
                    m.useful += 1;
                    self.sum_confl += 1;
                    return GaussResult::Confl;
                }
                GaussResult::Prop => {
                    m.useful += 1;
                    self.sum_prop += 1;
                    res = GaussResult::Prop;
                }
                GaussResult::Nothing => {}
            }

            if self.conf.iterative_reduce
                && level > 0
                && level % self.conf.only_nth_gauss_save == 0
            {
                match m.snapshots.last_mut() {
                    Some(s) if s.0 == level => s.1 = m.rows.clone(),
                    _ => m.snapshots.push((level, m.rows.clone())),
                }
            }

            if !self.conf.dont_disable
                && m.called >= DISABLE_CHECK_CALLS
                && m.useful * DISABLE_USEFUL_RATIO < m.called
            {
                m.disabled = true;
            }
        }
        res
    }

    /// Roll the working rows back to the nearest snapshot at or below `level`.
    pub fn cancel_until(&mut self, level: u32) {
        if !self.conf.iterative_reduce {
            return;
        }
        for m in self.matrices.iter_mut() {
            while m.snapshots.last().map_or(false, |s| s.0 > level) {
                m.snapshots.pop();
            }
            match m.snapshots.last() {
                Some(s) => m.rows = s.1.clone(),
                None => m.rows = m.rows_orig.clone(),
            }
        }
    }

    /// Re-enable every matrix; part of a full restart.
    pub fn re_enable(&mut self) {
        for m in self.matrices.iter_mut() {
            m.disabled = false;
            m.called = 0;
            m.useful = 0;
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn v(i: u32) -> Var {
        Var::from_idx(i)
    }

    fn ass_of(n: u32, set: &[(u32, bool)]) -> VMap<lbool> {
        let mut ass: VMap<lbool> = VMap::new();
        for i in 0..n {
            ass.insert_default(v(i), lbool::UNDEF);
        }
        for &(i, b) in set {
            ass[v(i)] = lbool::new(b);
        }
        ass
    }

    fn engine(until: u32, xors: &[(&[u32], bool)]) -> (GaussEngine, Vec<XorClause>) {
        let mut conf = GaussConf::default();
        conf.decision_until = until;
        let clauses: Vec<XorClause> = xors
            .iter()
            .map(|&(vs, rhs)| XorClause::new(vs.iter().map(|&i| v(i)).collect(), rhs))
            .collect();
        let mut e = GaussEngine::new(conf);
        let n = 1 + xors
            .iter()
            .flat_map(|&(vs, _)| vs.iter().cloned())
            .max()
            .unwrap_or(0);
        e.build_matrices(clauses.iter(), n);
        (e, clauses)
    }

    #[test]
    fn test_packed_row_ops() {
        let mut a = PackedRow::new(100, true);
        let mut b = PackedRow::new(100, true);
        a.set(3);
        a.set(70);
        b.set(70);
        b.set(99);
        a.xor_assign(&b);
        assert!(a.get(3) && a.get(99));
        assert!(!a.get(70));
        assert!(!a.rhs());
        assert_eq!(a.iter_set().collect::<Vec<_>>(), vec![3, 99]);
        let z = PackedRow::new(100, false);
        assert!(z.is_zero());
    }

    #[test]
    fn test_inconsistent_chain_is_conflict() {
        // x0^x1=1, x1^x2=1, x0^x2=1 sums to 0=1: conflict once enough
        // variables are assigned for the rows to close.
        let (mut e, _x) = engine(10, &[(&[0, 1], true), (&[1, 2], true), (&[0, 2], true)]);
        assert_eq!(e.num_matrices(), 1);
        let ass = ass_of(3, &[(0, false), (1, true), (2, true)]);
        let mut reasons = vec![];
        let mut units = vec![];
        let mut confl = vec![];
        let r = e.perform(&ass, 1, &mut reasons, &mut units, &mut confl);
        assert_eq!(r, GaussResult::Confl);
        assert!(!confl.is_empty());
        // every blamed literal is false under the assignment
        for &l in &confl {
            let val = ass[l.var()] ^ !l.sign();
            assert_eq!(val, lbool::FALSE);
        }
    }

    #[test]
    fn test_unit_derivation() {
        // x0^x1=1 with x0=false forces x1=true
        let mut conf = GaussConf::default();
        conf.decision_until = 10;
        conf.min_matrix_rows = 1;
        let xors = vec![
            XorClause::new(vec![v(0), v(1)], true),
            XorClause::new(vec![v(2), v(3)], false),
        ];
        let mut e = GaussEngine::new(conf);
        e.build_matrices(xors.iter(), 4);
        let ass = ass_of(4, &[(0, false)]);
        let mut reasons = vec![];
        let mut units = vec![];
        let mut confl = vec![];
        let r = e.perform(&ass, 1, &mut reasons, &mut units, &mut confl);
        assert_eq!(r, GaussResult::Prop);
        assert!(units.iter().any(|&(l, _)| l == Lit::new(v(1), true)));
        for &(_, ridx) in &units {
            let reason = &reasons[ridx as usize];
            // the non-asserting part of the reason is falsified
            for &l in &reason.lits[1..] {
                assert_eq!(ass[l.var()] ^ !l.sign(), lbool::FALSE);
            }
        }
    }

    #[test]
    fn test_matrix_find_splits_components() {
        let (e, _x) = engine(10, &[(&[0, 1, 2], true), (&[1, 2, 3], false), (&[5, 6, 7], true), (&[6, 7, 8], true), (&[7, 8, 5], false)]);
        // {0..3} and {5..8} share no variable: two matrices, but the
        // default min_matrix_rows=3 drops the 2-row component.
        assert_eq!(e.num_matrices(), 1);

        let mut conf = GaussConf::default();
        conf.decision_until = 10;
        conf.min_matrix_rows = 1;
        let xors: Vec<XorClause> = vec![
            XorClause::new(vec![v(0), v(1), v(2)], true),
            XorClause::new(vec![v(1), v(2), v(3)], false),
            XorClause::new(vec![v(5), v(6), v(7)], true),
        ];
        let mut e = GaussEngine::new(conf);
        e.build_matrices(xors.iter(), 9);
        assert_eq!(e.num_matrices(), 2);
    }

    #[test]
    fn test_rollback_restores_rows() {
        let (mut e, _x) = engine(10, &[(&[0, 1, 2], true), (&[1, 2, 3], false), (&[2, 3, 0], true)]);
        let before: Vec<PackedRow> = e.matrices[0].rows.clone();
        let ass = ass_of(4, &[(0, true)]);
        let mut reasons = vec![];
        let mut units = vec![];
        let mut confl = vec![];
        // run at a level that snapshots (level 2 with save-every-2)
        e.perform(&ass, 2, &mut reasons, &mut units, &mut confl);
        e.cancel_until(0);
        assert_eq!(e.matrices[0].rows, before);
        assert!(e.matrices[0].snapshots.is_empty());
    }
}
