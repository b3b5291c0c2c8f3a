//! Calculation of nullable, FIRST and FOLLOW sets.
//!
//! The fixed points run over a context-free grammar lowered to dense symbol
//! indices, so that the same code serves both the user grammar and the
//! auxiliary grammar built for LALR(1) lookahead propagation.

use crate::{
    grammar::{Grammar, SymbolId},
    set::SymbolSet,
};
use bit_set::BitSet;

#[derive(Debug)]
pub(crate) struct Rule {
    pub lhs: usize,
    pub rhs: Vec<usize>,
}

/// A grammar over dense symbol indices.
#[derive(Debug, Default)]
pub(crate) struct Cfg {
    pub is_nonterminal: Vec<bool>,
    pub rules: Vec<Rule>,
}

/// The analysis sets of a `Cfg`, indexed by symbol or by rule.
#[derive(Debug)]
pub(crate) struct Analysis {
    pub nullable: Vec<bool>,
    pub first: Vec<BitSet>,
    pub follow: Vec<BitSet>,
    pub rule_nullable: Vec<bool>,
    pub rule_first: Vec<BitSet>,
}

impl Analysis {
    pub fn new(cfg: &Cfg) -> Self {
        let symbols = cfg.is_nonterminal.len();
        Self {
            nullable: vec![false; symbols],
            first: vec![BitSet::new(); symbols],
            follow: vec![BitSet::new(); symbols],
            rule_nullable: vec![false; cfg.rules.len()],
            rule_first: vec![BitSet::new(); cfg.rules.len()],
        }
    }

    /// Run all three fixed points, returning whether any set changed.
    pub fn run<G>(&mut self, cfg: &Cfg, gate: G) -> bool
    where
        G: FnMut(usize, usize) -> bool,
    {
        let n = self.nullable_sets(cfg);
        let f = self.first_sets(cfg);
        let w = self.follow_sets(cfg, gate);
        n || f || w
    }

    pub fn seq_nullable(&self, cfg: &Cfg, seq: &[usize]) -> bool {
        seq.iter().all(|&s| cfg.is_nonterminal[s] && self.nullable[s])
    }

    pub fn seq_first(&self, cfg: &Cfg, seq: &[usize]) -> BitSet {
        let mut set = BitSet::new();
        for &s in seq {
            if !cfg.is_nonterminal[s] {
                set.insert(s);
                break;
            }
            set.union_with(&self.first[s]);
            if !self.nullable[s] {
                break;
            }
        }
        set
    }

    #[tracing::instrument(skip_all)]
    fn nullable_sets(&mut self, cfg: &Cfg) -> bool {
        let mut grown = false;
        let mut rounds = 0;
        loop {
            let mut changed = false;
            rounds += 1;
            for (i, rule) in cfg.rules.iter().enumerate() {
                if !self.rule_nullable[i] && self.seq_nullable(cfg, &rule.rhs) {
                    self.rule_nullable[i] = true;
                    changed = true;
                }
                if self.rule_nullable[i] && !self.nullable[rule.lhs] {
                    self.nullable[rule.lhs] = true;
                    changed = true;
                }
            }
            if !changed {
                break;
            }
            grown = true;
        }
        tracing::trace!(rounds);
        grown
    }

    #[tracing::instrument(skip_all)]
    fn first_sets(&mut self, cfg: &Cfg) -> bool {
        let mut grown = false;
        let mut rounds = 0;
        loop {
            let mut changed = false;
            rounds += 1;
            for (i, rule) in cfg.rules.iter().enumerate() {
                let first = self.seq_first(cfg, &rule.rhs);
                changed |= union(&mut self.rule_first[i], &first);
                let first = self.rule_first[i].clone();
                changed |= union(&mut self.first[rule.lhs], &first);
            }
            if !changed {
                break;
            }
            grown = true;
        }
        tracing::trace!(rounds);
        grown
    }

    /// For every `A -> α B β`, add FIRST(β) to FOLLOW(B), and FOLLOW(A) too when
    /// β is nullable and `gate(rule, position of B)` admits the transition.
    #[tracing::instrument(skip_all)]
    fn follow_sets<G>(&mut self, cfg: &Cfg, mut gate: G) -> bool
    where
        G: FnMut(usize, usize) -> bool,
    {
        let mut grown = false;
        let mut rounds = 0;
        loop {
            let mut changed = false;
            rounds += 1;
            for (i, rule) in cfg.rules.iter().enumerate() {
                for (pos, &b) in rule.rhs.iter().enumerate() {
                    if !cfg.is_nonterminal[b] {
                        continue;
                    }
                    let beta = &rule.rhs[pos + 1..];
                    let mut set = self.seq_first(cfg, beta);
                    if self.seq_nullable(cfg, beta) && gate(i, pos) {
                        set.union_with(&self.follow[rule.lhs]);
                    }
                    changed |= union(&mut self.follow[b], &set);
                }
            }
            if !changed {
                break;
            }
            grown = true;
        }
        tracing::trace!(rounds);
        grown
    }
}

fn union(dst: &mut BitSet, src: &BitSet) -> bool {
    let before = dst.len();
    dst.union_with(src);
    dst.len() != before
}

fn lower(g: &Grammar) -> Cfg {
    Cfg {
        is_nonterminal: g.symbols.iter().map(|s| !s.is_terminal()).collect(),
        rules: g
            .productions
            .iter()
            .map(|p| Rule {
                lhs: p.lhs().index(),
                rhs: p.rhs().iter().map(|s| s.index()).collect(),
            })
            .collect(),
    }
}

/// Bring the analysis sets stored in the grammar to their fixed point.
///
/// The iteration resumes from the sets already stored, so running it on a
/// converged grammar changes nothing. Returns whether any set grew.
pub(crate) fn compute(g: &mut Grammar) -> bool {
    let cfg = lower(g);
    let mut analysis = Analysis::new(&cfg);
    for (i, p) in g.productions.iter().enumerate() {
        analysis.rule_nullable[i] = p.nullable;
        analysis.rule_first[i] = p.first.bits().clone();
    }
    for n in g.nonterminals.values() {
        let i = n.symbol().index();
        analysis.nullable[i] = n.nullable;
        analysis.first[i] = n.first.bits().clone();
        analysis.follow[i] = n.follow.bits().clone();
    }

    let changed = analysis.run(&cfg, |_, _| true);

    for (i, p) in g.productions.iter_mut().enumerate() {
        p.nullable = analysis.rule_nullable[i];
        p.first = SymbolSet::from_bits(std::mem::take(&mut analysis.rule_first[i]));
    }
    for n in g.nonterminals.values_mut() {
        let i = n.symbol().index();
        n.nullable = analysis.nullable[i];
        n.first = SymbolSet::from_bits(std::mem::take(&mut analysis.first[i]));
        n.follow = SymbolSet::from_bits(std::mem::take(&mut analysis.follow[i]));
    }
    changed
}

impl Grammar {
    /// Whether the sequence derives the empty string.
    pub fn nullable(&self, seq: &[SymbolId]) -> bool {
        seq.iter()
            .all(|s| self.nonterminal(*s).map_or(false, |n| n.nullable))
    }

    /// The terminals that can begin a string derived from the sequence.
    pub fn first(&self, seq: &[SymbolId]) -> SymbolSet {
        let mut set = SymbolSet::new();
        for s in seq {
            match self.nonterminal(*s) {
                None => {
                    set.insert(*s);
                    break;
                }
                Some(n) => {
                    set.union_with(&n.first);
                    if !n.nullable {
                        break;
                    }
                }
            }
        }
        set
    }
}
