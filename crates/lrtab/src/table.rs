//! Calculation of the action table with conflict resolution.

use crate::{
    automaton::{Automaton, Item, ItemSet, StateId},
    diagnostics::Diagnostics,
    grammar::{Assoc, Grammar, Operator, Production, ProductionId, SymbolId},
    set::SymbolSet,
    types::{display_fn, Map},
};
use indexmap::map::Entry;
use lrtab_runtime::definition::{Arity, ParseAction, ParserDef};
use std::fmt;

/// The action that the LR automaton in a state performs on a particular
/// symbol.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Read a lookahead symbol and transition to the specified state.
    Shift(StateId),

    /// Reduce by the specified production.
    Reduce(ProductionId),

    Accept,

    /// The state entered after reducing to the nonterminal of this column.
    Goto(StateId),

    /// Reject the lookahead symbol.
    ///
    /// Behaves like a missing action, but is explicitly inserted when a
    /// non-associative operator meets itself. Later reductions never
    /// overwrite it.
    Fail,

    /// Every competing action, kept when default resolution is disabled.
    Conflict(Vec<Action>),
}

impl Action {
    pub fn display<'g>(&'g self, g: &'g Grammar) -> impl fmt::Display + 'g {
        display_fn(move |f| match self {
            Self::Shift(n) => write!(f, "shift({:?})", n),
            Self::Reduce(p) => write!(f, "reduce({})", g.production(*p).display(g)),
            Self::Accept => f.write_str("accept"),
            Self::Goto(n) => write!(f, "goto({:?})", n),
            Self::Fail => f.write_str("fail"),
            Self::Conflict(actions) => {
                f.write_str("conflict(")?;
                for (i, action) in actions.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", action.display(g))?;
                }
                f.write_str(")")
            }
        })
    }
}

/// How a conflict between two actions was settled.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ResolutionKind {
    /// Two reductions; the production declared first wins.
    ReduceReduce,
    /// No precedence available; the shift wins.
    ShiftByDefault,
    ShiftHigherPrecedence,
    ShiftRightAssoc,
    ReduceLeftAssoc,
    /// The cell is cleared.
    Nonassoc,
    ReduceHigherPrecedence,
}

impl fmt::Display for ResolutionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::ReduceReduce => "Resolve R/R conflict (use first production declared in grammar.)",
            Self::ShiftByDefault => "Resolve S/R conflict (shift by default.)",
            Self::ShiftHigherPrecedence => {
                "Resolve S/R conflict (shift for higher precedent operator.)"
            }
            Self::ShiftRightAssoc => "Resolve S/R conflict (shift for right associative operator.)",
            Self::ReduceLeftAssoc => "Resolve S/R conflict (reduce for left associative operator.)",
            Self::Nonassoc => "Resolve S/R conflict (no action for non-associative operator.)",
            Self::ReduceHigherPrecedence => "Resolve conflict (reduce for higher precedent production.)",
        })
    }
}

/// A record of one conflict resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub state: StateId,
    pub token: SymbolId,
    /// The reduction that met an occupied cell.
    pub reduce: Action,
    /// The action found in the cell.
    pub existing: Action,
    /// The action kept in the cell.
    pub chosen: Action,
    pub kind: ResolutionKind,
    /// The outcome came from a default rule rather than a declaration.
    pub by_default: bool,
}

impl Resolution {
    pub fn display<'g>(&'g self, g: &'g Grammar) -> impl fmt::Display + 'g {
        display_fn(move |f| {
            write!(
                f,
                "state {:?} on {}: {} [{} vs {}] => {}",
                self.state,
                g.symbol(self.token),
                self.kind,
                self.reduce.display(g),
                self.existing.display(g),
                self.chosen.display(g),
            )
        })
    }
}

/// Settle a conflict between a reduction by `production` and the action
/// already in the cell of a token whose operator is `op`.
pub fn resolve(
    production: &Production,
    op: Option<&Operator>,
    existing: &Action,
) -> (ResolutionKind, Action, bool) {
    use ResolutionKind::*;

    let reduce = Action::Reduce(production.id());
    if let Action::Reduce(other) = existing {
        let chosen = if *other < production.id() {
            existing.clone()
        } else {
            reduce
        };
        return (ReduceReduce, chosen, *other != production.id());
    }

    let op = match op {
        Some(op) if production.precedence() != 0 => op,
        _ => return (ShiftByDefault, existing.clone(), true),
    };
    let (kind, chosen) = if production.precedence() < op.precedence {
        (ShiftHigherPrecedence, existing.clone())
    } else if production.precedence() == op.precedence {
        match op.assoc {
            Assoc::Right => (ShiftRightAssoc, existing.clone()),
            Assoc::Left => (ReduceLeftAssoc, reduce),
            Assoc::Nonassoc => (Nonassoc, Action::Fail),
        }
    } else {
        (ReduceHigherPrecedence, reduce)
    };
    (kind, chosen, false)
}

/// The set of tokens on which a reduction item is installed.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Lookaheads {
    /// Every terminal (LR(0)).
    All,
    /// FOLLOW of the production's left-hand side (SLR(1)).
    Follow,
    /// The lookahead attached to the item (LR(1), LALR(1)).
    Item,
    /// The item's lookahead in inadequate states, every terminal elsewhere.
    ItemIfInadequate,
}

impl Lookaheads {
    fn of<'a>(
        self,
        g: &'a Grammar,
        state: &ItemSet,
        item: &'a Item,
        all: &'a SymbolSet,
    ) -> &'a SymbolSet {
        match self {
            Self::All => all,
            Self::Follow => {
                let lhs = g.production(item.production).lhs();
                &g.nonterminals[&lhs].follow
            }
            Self::Item => &item.lookahead,
            Self::ItemIfInadequate if state.inadequate => &item.lookahead,
            Self::ItemIfInadequate => all,
        }
    }
}

/// The finished action table and the metadata the runtime needs to drive it.
#[derive(Debug, Clone)]
pub struct ParseTable {
    pub states: Vec<Map<SymbolId, Action>>,
    pub default_actions: Map<StateId, ProductionId>,
    /// Every conflict resolution in the order it happened.
    pub resolutions: Vec<Resolution>,
    productions: Vec<Arity>,
    symbols: Map<String, SymbolId>,
    terminals: Map<SymbolId, String>,
}

impl ParseTable {
    #[tracing::instrument(skip_all)]
    pub(crate) fn build(
        g: &Grammar,
        automaton: &Automaton,
        lookaheads: Lookaheads,
        no_default_resolve: bool,
        diagnostics: &mut dyn Diagnostics,
    ) -> Self {
        let all: SymbolSet = g.terminals().collect();
        let mut states = Vec::with_capacity(automaton.states().len());
        let mut resolutions = vec![];
        let mut conflicted = vec![];

        for q in automaton.state_ids() {
            let state = automaton.state(q);
            let mut actions = Map::<SymbolId, Action>::default();
            for (&symbol, &next) in &state.edges {
                let action = if g.is_terminal(symbol) {
                    Action::Shift(next)
                } else {
                    Action::Goto(next)
                };
                actions.insert(symbol, action);
            }
            if state
                .items
                .iter()
                .any(|id| automaton.item(*id).marked_symbol(g) == Some(SymbolId::END))
            {
                actions.insert(SymbolId::END, Action::Accept);
            }

            for id in &state.reductions {
                let item = automaton.item(*id);
                let production = g.production(item.production);
                let reduce = Action::Reduce(production.id());
                for token in lookaheads.of(g, state, item, &all).iter() {
                    let cell = match actions.entry(token) {
                        Entry::Occupied(entry) => entry.into_mut(),
                        Entry::Vacant(entry) => {
                            entry.insert(reduce.clone());
                            continue;
                        }
                    };
                    let existing = match &*cell {
                        // A nonassoc hole is open to the next reduction.
                        Action::Fail => {
                            *cell = reduce.clone();
                            continue;
                        }
                        Action::Conflict(competing) if competing.contains(&reduce) => continue,
                        Action::Conflict(competing) => competing[0].clone(),
                        existing if *existing == reduce => continue,
                        existing => existing.clone(),
                    };

                    let (kind, chosen, by_default) =
                        resolve(production, g.operator_of(token), &existing);
                    let resolution = Resolution {
                        state: q,
                        token,
                        reduce: reduce.clone(),
                        existing,
                        chosen: chosen.clone(),
                        kind,
                        by_default,
                    };
                    tracing::trace!("{}", resolution.display(g));

                    if by_default {
                        diagnostics.conflict(g, &resolution);
                        if conflicted.last() != Some(&q) {
                            conflicted.push(q);
                        }
                    }
                    if by_default && no_default_resolve {
                        match cell {
                            Action::Conflict(competing) => competing.push(reduce.clone()),
                            cell => {
                                let existing = std::mem::replace(cell, Action::Fail);
                                *cell = Action::Conflict(vec![existing, reduce.clone()]);
                            }
                        }
                    } else {
                        *cell = chosen;
                    }
                    resolutions.push(resolution);
                }
            }

            states.push(actions);
        }

        diagnostics.finish(g, &conflicted);

        let default_actions = find_defaults(&states);
        tracing::debug!(
            states = states.len(),
            conflicts = conflicted.len(),
            defaults = default_actions.len()
        );

        Self {
            states,
            default_actions,
            resolutions,
            productions: g
                .productions()
                .iter()
                .map(|p| Arity {
                    lhs: p.lhs().index(),
                    len: p.rhs().len(),
                })
                .collect(),
            symbols: g
                .symbols()
                .iter()
                .map(|s| (s.name().to_owned(), s.id()))
                .collect(),
            terminals: g
                .symbols()
                .iter()
                .filter(|s| s.is_terminal())
                .map(|s| (s.id(), s.name().to_owned()))
                .collect(),
        }
    }

    /// The resolutions that depended on a default rule.
    pub fn conflicts(&self) -> impl Iterator<Item = &Resolution> + '_ {
        self.resolutions.iter().filter(|r| r.by_default)
    }

    pub fn conflict_count(&self) -> usize {
        self.conflicts().count()
    }

    pub fn row(&self, state: StateId) -> &Map<SymbolId, Action> {
        &self.states[state.index()]
    }

    pub fn action(&self, state: StateId, symbol: SymbolId) -> Option<&Action> {
        self.states.get(state.index())?.get(&symbol)
    }

    /// `[lhs, rhs length]` of every production, indexed by production id.
    pub fn arities(&self) -> &[Arity] {
        &self.productions[..]
    }

    pub fn symbols(&self) -> &Map<String, SymbolId> {
        &self.symbols
    }

    pub fn terminals(&self) -> &Map<SymbolId, String> {
        &self.terminals
    }

    pub fn display<'g>(&'g self, g: &'g Grammar) -> impl fmt::Display + 'g {
        display_fn(move |f| {
            for (i, row) in self.states.iter().enumerate() {
                if i > 0 {
                    writeln!(f)?;
                }
                let id = StateId::from_raw(i as u32);
                writeln!(f, "#### State {:?}", id)?;
                writeln!(f, "## actions")?;
                for (symbol, action) in row.iter().filter(|(_, a)| !matches!(a, Action::Goto(..))) {
                    writeln!(f, "- {} => {}", g.symbol(*symbol), action.display(g))?;
                }
                if row.values().any(|a| matches!(a, Action::Goto(..))) {
                    writeln!(f, "## gotos")?;
                    for (symbol, action) in row {
                        if let Action::Goto(next) = action {
                            writeln!(f, "- {} => goto({:?})", g.symbol(*symbol), next)?;
                        }
                    }
                }
                if let Some(p) = self.default_actions.get(&id) {
                    writeln!(f, "## default")?;
                    writeln!(f, "- reduce({})", g.production(*p).display(g))?;
                }
            }
            Ok(())
        })
    }
}

/// A state whose only populated column is a reduction reduces without
/// consulting the lookahead.
fn find_defaults(states: &[Map<SymbolId, Action>]) -> Map<StateId, ProductionId> {
    let mut defaults = Map::default();
    for (i, row) in states.iter().enumerate() {
        if let (1, Some(Action::Reduce(p))) = (row.len(), row.values().next()) {
            defaults.insert(StateId::from_raw(i as u32), *p);
        }
    }
    defaults
}

fn to_symbol(symbol: usize) -> Option<SymbolId> {
    u16::try_from(symbol).ok().map(SymbolId::from_raw)
}

impl ParserDef for ParseTable {
    fn action(&self, state: usize, symbol: usize) -> Option<ParseAction> {
        match self.states.get(state)?.get(&to_symbol(symbol)?)? {
            Action::Shift(next) => Some(ParseAction::Shift(next.index())),
            Action::Reduce(p) => Some(ParseAction::Reduce(p.index())),
            Action::Accept => Some(ParseAction::Accept),
            Action::Conflict(..) => Some(ParseAction::Conflict),
            Action::Goto(..) | Action::Fail => None,
        }
    }

    fn goto(&self, state: usize, nonterminal: usize) -> Option<usize> {
        match self.states.get(state)?.get(&to_symbol(nonterminal)?)? {
            Action::Goto(next) => Some(next.index()),
            _ => None,
        }
    }

    fn default_action(&self, state: usize) -> Option<usize> {
        let state = StateId::from_raw(u32::try_from(state).ok()?);
        self.default_actions.get(&state).map(|p| p.index())
    }

    fn production(&self, production: usize) -> Arity {
        self.productions[production]
    }

    fn symbol_id(&self, name: &str) -> Option<usize> {
        self.symbols.get(name).map(|s| s.index())
    }

    fn terminal_name(&self, symbol: usize) -> Option<&str> {
        self.terminals.get(&to_symbol(symbol)?).map(String::as_str)
    }

    fn expected_terminals(&self, state: usize) -> Vec<usize> {
        let mut expected: Vec<_> = self
            .states
            .get(state)
            .into_iter()
            .flatten()
            .filter(|(symbol, action)| {
                self.terminals.contains_key(*symbol)
                    && !matches!(action, Action::Goto(..) | Action::Fail)
            })
            .map(|(symbol, _)| symbol.index())
            .collect();
        expected.sort_unstable();
        expected
    }
}
