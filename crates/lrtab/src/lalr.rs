//! LALR(1) lookahead propagation over the LR(0) automaton.
//!
//! Every item at position 0 of a state `q` is turned into a production of an
//! auxiliary grammar whose left-hand side is the pair `q:A` and whose
//! right-hand side is the path of `state:symbol` pairs walked while shifting
//! the production's symbols from `q`. The FOLLOW set of `q:A` in that grammar,
//! mapped back to the user grammar's terminals, is the lookahead of the reduction by
//! that production in the state the path ends in.

use crate::{
    automaton::{Automaton, ClosureKind, StateId},
    grammar::{Grammar, ProductionId, SymbolId},
    lookahead::{Analysis, Cfg, Rule},
    types::Map,
};

/// The auxiliary grammar over `state:symbol` pairs.
#[derive(Debug, Default)]
struct PathGrammar {
    cfg: Cfg,
    labels: Map<(StateId, SymbolId), usize>,
    /// For every reduction, the auxiliary nonterminals whose FOLLOW sets feed it.
    goes: Map<(StateId, ProductionId), Vec<usize>>,
}

impl PathGrammar {
    fn label(&mut self, g: &Grammar, state: StateId, symbol: SymbolId) -> usize {
        let next = self.labels.len();
        let is_nonterminal = &mut self.cfg.is_nonterminal;
        *self.labels.entry((state, symbol)).or_insert_with(|| {
            is_nonterminal.push(!g.is_terminal(symbol));
            next
        })
    }

    fn state_of(&self, label: usize) -> StateId {
        self.labels.get_index(label).map(|(key, _)| key.0).unwrap_or(StateId::INITIAL)
    }

    fn symbol_of(&self, label: usize) -> SymbolId {
        self.labels.get_index(label).map(|(key, _)| key.1).unwrap_or(SymbolId::END)
    }

    #[tracing::instrument(skip_all)]
    fn build(g: &Grammar, automaton: &Automaton) -> Self {
        let mut this = Self::default();
        for q in automaton.state_ids() {
            for id in &automaton.state(q).items {
                let item = automaton.item(*id);
                if item.dot != 0 {
                    continue;
                }
                let production = g.production(item.production);
                let lhs = this.label(g, q, production.lhs());

                let mut rhs = Vec::with_capacity(production.rhs().len());
                let mut end = q;
                for symbol in production.rhs() {
                    rhs.push(this.label(g, end, *symbol));
                    end = go(automaton, end, std::slice::from_ref(symbol));
                }
                this.cfg.rules.push(Rule { lhs, rhs });
                this.goes.entry((end, item.production)).or_default().push(lhs);
            }
        }
        tracing::debug!(
            symbols = this.labels.len(),
            productions = this.cfg.rules.len()
        );
        this
    }
}

/// The state reached by following `symbols` from `state`. A missing edge leaves
/// the state unchanged.
pub(crate) fn go(automaton: &Automaton, mut state: StateId, symbols: &[SymbolId]) -> StateId {
    for symbol in symbols {
        if let Some(next) = automaton.state(state).edges.get(symbol) {
            state = *next;
        }
    }
    state
}

/// Attach LALR(1) lookaheads to the reduction items of an LR(0) automaton.
///
/// With `on_demand`, only inadequate states receive them.
#[tracing::instrument(skip_all)]
pub(crate) fn propagate(g: &Grammar, automaton: &mut Automaton, on_demand: bool) {
    debug_assert_eq!(automaton.kind(), ClosureKind::Core);

    let paths = PathGrammar::build(g, automaton);
    let mut analysis = Analysis::new(&paths.cfg);
    {
        let automaton = &*automaton;
        let paths = &paths;
        analysis.run(&paths.cfg, |rule, pos| {
            let rule = &paths.cfg.rules[rule];
            let prefix: Vec<_> = rule.rhs[..pos].iter().map(|l| paths.symbol_of(*l)).collect();
            go(automaton, paths.state_of(rule.lhs), &prefix) == paths.state_of(rule.rhs[pos])
        });
    }

    let mut targets = vec![];
    for q in automaton.state_ids() {
        let state = automaton.state(q);
        if on_demand && !state.inadequate {
            continue;
        }
        for id in &state.reductions {
            targets.push((q, *id, automaton.item(*id).production));
        }
    }

    for (q, id, production) in targets {
        let sources = match paths.goes.get(&(q, production)) {
            Some(sources) => sources,
            None => continue,
        };
        let item = automaton.item_mut(id);
        for source in sources {
            item.lookahead
                .extend(analysis.follow[*source].iter().map(|l| paths.symbol_of(l)));
        }
    }
}
