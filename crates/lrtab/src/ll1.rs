//! LL(1) predictive parse table.

use crate::{
    grammar::{Grammar, ProductionId, SymbolId},
    types::{display_fn, Map},
};
use std::fmt;

#[derive(Debug, Clone)]
pub struct LlTable {
    /// `nonterminal -> terminal -> candidate productions`
    pub rows: Map<SymbolId, Map<SymbolId, Vec<ProductionId>>>,
    /// The number of times a cell received more than one production.
    pub conflicts: usize,
}

impl LlTable {
    /// Predict each production on its FIRST set, plus FOLLOW of its
    /// left-hand side when the right-hand side is nullable.
    #[tracing::instrument(skip_all)]
    pub fn build(g: &Grammar) -> Self {
        let mut rows = Map::<SymbolId, Map<SymbolId, Vec<ProductionId>>>::default();
        let mut conflicts = 0;
        for p in g.productions() {
            let mut tokens = p.first().clone();
            if g.nullable(p.rhs()) {
                if let Some(n) = g.nonterminal(p.lhs()) {
                    tokens.union_with(n.follow());
                }
            }
            let row = rows.entry(p.lhs()).or_default();
            for token in tokens.iter() {
                let cell = row.entry(token).or_default();
                if !cell.is_empty() {
                    conflicts += 1;
                }
                cell.push(p.id());
            }
        }
        if conflicts > 0 {
            tracing::warn!("LL(1) table has {} conflict(s)", conflicts);
        }
        Self { rows, conflicts }
    }

    pub fn predict(&self, nonterminal: SymbolId, token: SymbolId) -> &[ProductionId] {
        self.rows
            .get(&nonterminal)
            .and_then(|row| row.get(&token))
            .map(|cell| &cell[..])
            .unwrap_or(&[])
    }

    pub fn display<'g>(&'g self, g: &'g Grammar) -> impl fmt::Display + 'g {
        display_fn(move |f| {
            for (n, row) in &self.rows {
                writeln!(f, "#### {}", g.symbol(*n))?;
                for (t, cell) in row {
                    write!(f, "- {} =>", g.symbol(*t))?;
                    for p in cell {
                        write!(f, " ({})", g.production(*p).display(g))?;
                    }
                    writeln!(f)?;
                }
            }
            Ok(())
        })
    }
}
