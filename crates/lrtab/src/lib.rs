//! A parser table generator for LR(0), SLR(1), LALR(1), canonical LR(1) and
//! LL(1) grammars.
//!
//! ```
//! use lrtab::{grammar::{Assoc, Grammar}, Config};
//!
//! let g = Grammar::define(|g| {
//!     g.operators(Assoc::Left, ["+"]);
//!     g.rule("E", ["E", "+", "E"]);
//!     g.rule("E", ["NUMBER"]);
//!     Ok(())
//! })?;
//! let table = Config::new().generate(&g)?;
//! assert_eq!(table.conflict_count(), 0);
//! # Ok::<_, Box<dyn std::error::Error>>(())
//! ```

pub mod automaton;
pub mod diagnostics;
pub mod grammar;
mod lalr;
pub mod ll1;
mod lookahead;
pub mod set;
pub mod table;
pub mod types;

use crate::{
    automaton::{Automaton, ClosureKind},
    diagnostics::{Diagnostics, TracingDiagnostics},
    grammar::Grammar,
    table::{Lookaheads, ParseTable},
};
use std::{fmt, str::FromStr};

/// The parsing discipline of the generated table.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Discipline {
    Lr0,
    Slr,
    Lalr,
    Canonical,
    Ll,
}

impl fmt::Display for Discipline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Lr0 => "lr0",
            Self::Slr => "slr",
            Self::Lalr => "lalr",
            Self::Canonical => "lr",
            Self::Ll => "ll",
        })
    }
}

impl FromStr for Discipline {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "lr0" => Ok(Self::Lr0),
            "slr" => Ok(Self::Slr),
            "lalr" => Ok(Self::Lalr),
            "lr" | "lr1" => Ok(Self::Canonical),
            "ll" | "ll1" => Ok(Self::Ll),
            _ => Err(format!("unknown parser type: `{}'", s)),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum GenerateError {
    #[error("{} is not an LR discipline, build an `ll1::LlTable` instead", _0)]
    NotAnLrDiscipline(Discipline),
}

#[derive(Debug, Clone)]
pub struct Config {
    discipline: Discipline,
    on_demand: bool,
    no_default_resolve: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}

impl Config {
    pub const fn new() -> Self {
        Self {
            discipline: Discipline::Lalr,
            on_demand: false,
            no_default_resolve: false,
        }
    }

    /// Every terminal triggers every reduction.
    pub fn use_lr0(&mut self) -> &mut Self {
        self.discipline(Discipline::Lr0)
    }

    /// Reductions are installed on the FOLLOW set of the left-hand side.
    pub fn use_slr(&mut self) -> &mut Self {
        self.discipline(Discipline::Slr)
    }

    /// LR(0) states with propagated lookaheads. This is the default.
    pub fn use_lalr(&mut self) -> &mut Self {
        self.discipline(Discipline::Lalr)
    }

    /// Knuth's canonical LR(1), with lookaheads taking part in state identity.
    pub fn use_canonical(&mut self) -> &mut Self {
        self.discipline(Discipline::Canonical)
    }

    pub fn discipline(&mut self, discipline: Discipline) -> &mut Self {
        self.discipline = discipline;
        self
    }

    /// Propagate LALR(1) lookaheads into inadequate states only.
    ///
    /// Adequate states reduce on every terminal, which postpones the
    /// detection of some syntax errors without accepting more input.
    pub fn on_demand_lookahead(&mut self, enabled: bool) -> &mut Self {
        self.on_demand = enabled;
        self
    }

    /// Keep every competing action of a by-default conflict in the cell.
    pub fn no_default_resolve(&mut self, enabled: bool) -> &mut Self {
        self.no_default_resolve = enabled;
        self
    }

    pub fn get_discipline(&self) -> Discipline {
        self.discipline
    }

    /// Build the automaton with the lookaheads of the selected discipline.
    pub fn automaton(&self, g: &Grammar) -> Result<Automaton, GenerateError> {
        let automaton = match self.discipline {
            Discipline::Lr0 | Discipline::Slr => Automaton::build(g, ClosureKind::Core),
            Discipline::Lalr => {
                let mut automaton = Automaton::build(g, ClosureKind::Core);
                lalr::propagate(g, &mut automaton, self.on_demand);
                automaton
            }
            Discipline::Canonical => Automaton::build(g, ClosureKind::Lookahead),
            Discipline::Ll => return Err(GenerateError::NotAnLrDiscipline(self.discipline)),
        };
        Ok(automaton)
    }

    /// Generate the table, reporting conflicts as `tracing` warnings.
    pub fn generate(&self, g: &Grammar) -> Result<ParseTable, GenerateError> {
        self.generate_with(g, &mut TracingDiagnostics)
    }

    pub fn generate_with(
        &self,
        g: &Grammar,
        diagnostics: &mut dyn Diagnostics,
    ) -> Result<ParseTable, GenerateError> {
        let automaton = self.automaton(g)?;
        self.table(g, &automaton, diagnostics)
    }

    /// Derive the table from an automaton built by [`Config::automaton`].
    pub fn table(
        &self,
        g: &Grammar,
        automaton: &Automaton,
        diagnostics: &mut dyn Diagnostics,
    ) -> Result<ParseTable, GenerateError> {
        let lookaheads = match self.discipline {
            Discipline::Lr0 => Lookaheads::All,
            Discipline::Slr => Lookaheads::Follow,
            Discipline::Lalr if self.on_demand => Lookaheads::ItemIfInadequate,
            Discipline::Lalr | Discipline::Canonical => Lookaheads::Item,
            Discipline::Ll => return Err(GenerateError::NotAnLrDiscipline(self.discipline)),
        };
        tracing::debug!(discipline = %self.discipline, "generating table");
        Ok(ParseTable::build(
            g,
            automaton,
            lookaheads,
            self.no_default_resolve,
            diagnostics,
        ))
    }
}
