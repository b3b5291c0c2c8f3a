//! The canonical collection of LR item sets.

use crate::{
    grammar::{Grammar, ProductionId, SymbolId},
    set::SymbolSet,
    types::{display_fn, Map, Set},
};
use std::fmt;

#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StateId(u32);

impl fmt::Debug for StateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "S#{:03}", self.0)
    }
}

impl StateId {
    pub const INITIAL: Self = Self(0);

    pub const fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    pub const fn into_raw(self) -> u32 {
        self.0
    }

    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Index of an item in the automaton's item arena.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ItemId(u32);

impl ItemId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// How the closure treats lookaheads.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ClosureKind {
    /// Items are identified by their core. Lookaheads are attached afterwards.
    Core,
    /// Items carry the exact LR(1) lookahead, which takes part in their identity.
    Lookahead,
}

#[derive(Debug, Clone)]
pub struct Item {
    pub production: ProductionId,
    pub dot: u16,
    pub lookahead: SymbolSet,
    /// The state this item was advanced from, if it is a kernel item.
    pub predecessor: Option<StateId>,
}

impl Item {
    fn new(production: ProductionId) -> Self {
        Self {
            production,
            dot: 0,
            lookahead: SymbolSet::new(),
            predecessor: None,
        }
    }

    /// The symbol immediately after the dot, `None` for a completed item.
    pub fn marked_symbol(&self, g: &Grammar) -> Option<SymbolId> {
        g.production(self.production)
            .rhs()
            .get(usize::from(self.dot))
            .copied()
    }

    /// The symbols after the marked symbol.
    pub fn remaining<'g>(&self, g: &'g Grammar) -> &'g [SymbolId] {
        let rhs = g.production(self.production).rhs();
        rhs.get(usize::from(self.dot) + 1..).unwrap_or(&[])
    }

    fn key(&self, kind: ClosureKind) -> ItemKey {
        ItemKey {
            production: self.production,
            dot: self.dot,
            lookahead: match kind {
                ClosureKind::Core => None,
                ClosureKind::Lookahead => Some(self.lookahead.clone()),
            },
        }
    }

    // `"E -> [ E . + E ] { $end, + }"`
    pub fn display<'g>(&'g self, g: &'g Grammar) -> impl fmt::Display + 'g {
        display_fn(move |f| {
            let production = g.production(self.production);
            write!(f, "{} -> [", g.symbol(production.lhs()))?;
            for (i, s) in production.rhs().iter().enumerate() {
                if i == usize::from(self.dot) {
                    f.write_str(" .")?;
                }
                write!(f, " {}", g.symbol(*s))?;
            }
            if production.rhs().len() == usize::from(self.dot) {
                f.write_str(" .")?;
            }
            f.write_str(" ]")?;
            if !self.lookahead.is_empty() {
                f.write_str(" {")?;
                for (i, t) in self.lookahead.iter().enumerate() {
                    if i > 0 {
                        f.write_str(",")?;
                    }
                    write!(f, " {}", g.symbol(t))?;
                }
                f.write_str(" }")?;
            }
            Ok(())
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
struct ItemKey {
    production: ProductionId,
    dot: u16,
    lookahead: Option<SymbolSet>,
}

/// A state of the automaton.
#[derive(Debug, Clone, Default)]
pub struct ItemSet {
    pub items: Vec<ItemId>,
    /// Items with the dot at the end of the production.
    pub reductions: Vec<ItemId>,
    pub edges: Map<SymbolId, StateId>,
    pub predecessors: Map<SymbolId, Vec<StateId>>,
    pub shifts: bool,
    /// More than one reduction, or a reduction alongside a shift.
    pub inadequate: bool,
}

#[derive(Debug, Clone)]
pub struct Automaton {
    kind: ClosureKind,
    items: Vec<Item>,
    states: Vec<ItemSet>,
}

impl Automaton {
    /// Build the canonical collection by a breadth-first walk over goto edges.
    #[tracing::instrument(skip_all, fields(kind = ?kind))]
    pub fn build(g: &Grammar, kind: ClosureKind) -> Self {
        let mut this = Self {
            kind,
            items: vec![],
            states: vec![],
        };
        let mut isocores = Map::<Vec<ItemKey>, StateId>::default();

        let mut initial = Item::new(ProductionId::ACCEPT);
        initial.lookahead.insert(SymbolId::END);
        let closure = this.closure(g, vec![initial]);
        this.insert(g, closure, &mut isocores);

        let mut marked = 0;
        while marked < this.states.len() {
            let current = StateId(marked as u32);
            marked += 1;

            let mut kernels = Map::<SymbolId, Vec<Item>>::default();
            for id in &this.states[current.index()].items {
                let item = &this.items[id.index()];
                match item.marked_symbol(g) {
                    Some(symbol) if symbol != SymbolId::END => {
                        kernels.entry(symbol).or_default().push(Item {
                            production: item.production,
                            dot: item.dot + 1,
                            lookahead: item.lookahead.clone(),
                            predecessor: Some(current),
                        });
                    }
                    _ => {}
                }
            }

            for (symbol, kernel) in kernels {
                let closure = this.closure(g, kernel);
                let next = this.insert(g, closure, &mut isocores);
                this.states[current.index()].edges.insert(symbol, next);
                this.states[next.index()]
                    .predecessors
                    .entry(symbol)
                    .or_default()
                    .push(current);
            }
        }

        tracing::debug!(states = this.states.len(), items = this.items.len());
        this
    }

    /// Expand the kernel with an item at position 0 for every production of
    /// each nonterminal found after a dot.
    fn closure(&self, g: &Grammar, kernel: Vec<Item>) -> Vec<Item> {
        let mut seen = Set::<ItemKey>::default();
        let mut items = Vec::with_capacity(kernel.len());
        for item in kernel {
            if seen.insert(item.key(self.kind)) {
                items.push(item);
            }
        }

        let mut expanded = Set::<SymbolId>::default();
        let mut i = 0;
        while i < items.len() {
            let item = &items[i];
            i += 1;
            let nonterminal = match item.marked_symbol(g).and_then(|s| g.nonterminal(s)) {
                Some(n) => n,
                None => continue,
            };

            let lookahead = match self.kind {
                ClosureKind::Core => {
                    if !expanded.insert(nonterminal.symbol()) {
                        continue;
                    }
                    SymbolSet::new()
                }
                ClosureKind::Lookahead => {
                    let rest = item.remaining(g);
                    let mut lookahead = g.first(rest);
                    if g.nullable(rest) {
                        lookahead.union_with(&item.lookahead);
                    }
                    lookahead
                }
            };

            let mut added = vec![];
            for &production in nonterminal.productions() {
                let new_item = Item {
                    lookahead: lookahead.clone(),
                    ..Item::new(production)
                };
                if seen.insert(new_item.key(self.kind)) {
                    added.push(new_item);
                }
            }
            items.extend(added);
        }

        items
    }

    fn insert(
        &mut self,
        g: &Grammar,
        closure: Vec<Item>,
        isocores: &mut Map<Vec<ItemKey>, StateId>,
    ) -> StateId {
        let mut signature: Vec<_> = closure.iter().map(|item| item.key(self.kind)).collect();
        signature.sort();
        if let Some(id) = isocores.get(&signature) {
            return *id;
        }

        let id = StateId(self.states.len() as u32);
        let mut state = ItemSet::default();
        for item in closure {
            let item_id = ItemId(self.items.len() as u32);
            match item.marked_symbol(g) {
                None => state.reductions.push(item_id),
                Some(symbol) if g.is_terminal(symbol) => state.shifts = true,
                Some(..) => {}
            }
            state.items.push(item_id);
            self.items.push(item);
        }
        state.inadequate =
            state.reductions.len() > 1 || (state.shifts && !state.reductions.is_empty());

        tracing::trace!(state = ?id, items = state.items.len(), inadequate = state.inadequate);
        isocores.insert(signature, id);
        self.states.push(state);
        id
    }

    pub fn kind(&self) -> ClosureKind {
        self.kind
    }

    pub fn states(&self) -> &[ItemSet] {
        &self.states[..]
    }

    pub fn state(&self, id: StateId) -> &ItemSet {
        &self.states[id.index()]
    }

    pub fn item(&self, id: ItemId) -> &Item {
        &self.items[id.index()]
    }

    pub(crate) fn item_mut(&mut self, id: ItemId) -> &mut Item {
        &mut self.items[id.index()]
    }

    pub fn state_ids(&self) -> impl Iterator<Item = StateId> {
        (0..self.states.len() as u32).map(StateId)
    }

    pub fn display<'g>(&'g self, g: &'g Grammar) -> impl fmt::Display + 'g {
        display_fn(move |f| {
            for (id, state) in self.state_ids().zip(&self.states) {
                write!(f, "#### State {:?}", id)?;
                if state.inadequate {
                    f.write_str(" (inadequate)")?;
                }
                writeln!(f)?;
                writeln!(f, "## items:")?;
                for item in &state.items {
                    writeln!(f, "- {}", self.item(*item).display(g))?;
                }
                if !state.edges.is_empty() {
                    writeln!(f, "## edges:")?;
                    for (symbol, to) in &state.edges {
                        writeln!(f, "- {} => {:?}", g.symbol(*symbol), to)?;
                    }
                }
                if !state.predecessors.is_empty() {
                    writeln!(f, "## predecessors:")?;
                    for (symbol, from) in &state.predecessors {
                        for from in from {
                            writeln!(f, "- {:?} --({})-->", from, g.symbol(*symbol))?;
                        }
                    }
                }
                writeln!(f)?;
            }
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::Assoc;

    fn arith() -> Grammar {
        Grammar::define(|g| {
            g.operators(Assoc::Left, ["+"]);
            g.rule("E", ["E", "+", "E"]);
            g.rule("E", ["NUMBER"]);
            Ok(())
        })
        .unwrap()
    }

    // S -> C C ; C -> 'c' C | 'd'
    fn dragon() -> Grammar {
        Grammar::define(|g| {
            g.rule("S", ["C", "C"]);
            g.rule("C", ["c", "C"]);
            g.rule("C", ["d"]);
            Ok(())
        })
        .unwrap()
    }

    fn signature(a: &Automaton, state: &ItemSet) -> Vec<ItemKey> {
        let mut keys: Vec<_> = state
            .items
            .iter()
            .map(|id| a.item(*id).key(a.kind()))
            .collect();
        keys.sort();
        keys
    }

    #[test]
    fn initial_state() {
        let g = arith();
        let a = Automaton::build(&g, ClosureKind::Core);
        let s0 = a.state(StateId::INITIAL);
        assert_eq!(s0.items.len(), 3);
        let first = a.item(s0.items[0]);
        assert_eq!(first.production, ProductionId::ACCEPT);
        assert_eq!(first.dot, 0);
        assert!(first.lookahead.contains(SymbolId::END));
        assert!(s0.shifts);
        assert!(!s0.inadequate);
    }

    #[test]
    fn arith_lr0_states() {
        let g = arith();
        let a = Automaton::build(&g, ClosureKind::Core);
        // 0: start, 1: after E, 2: after NUMBER, 3: after E +, 4: after E + E
        assert_eq!(a.states().len(), 5);
        let e = g.symbol_id("E").unwrap();
        let plus = g.symbol_id("+").unwrap();
        let s1 = a.state(StateId::INITIAL).edges[&e];
        let s3 = a.state(s1).edges[&plus];
        let s4 = a.state(s3).edges[&e];
        assert!(a.state(s4).inadequate);
        assert_eq!(a.state(s4).reductions.len(), 1);
        assert_eq!(a.state(s4).edges[&plus], s3);
        assert_eq!(a.state(s3).predecessors[&plus], [s1, s4]);
        assert!(!a.state(s1).edges.contains_key(&SymbolId::END));
    }

    #[test]
    fn states_are_unique() {
        for kind in [ClosureKind::Core, ClosureKind::Lookahead] {
            let g = dragon();
            let a = Automaton::build(&g, kind);
            let mut signatures = Set::default();
            for state in a.states() {
                assert!(signatures.insert(signature(&a, state)));
            }
        }
    }

    #[test]
    fn canonical_lr1_splits_cores() {
        let g = dragon();
        let lr0 = Automaton::build(&g, ClosureKind::Core);
        let lr1 = Automaton::build(&g, ClosureKind::Lookahead);
        assert_eq!(lr0.states().len(), 7);
        assert_eq!(lr1.states().len(), 10);
    }

    #[test]
    fn lr1_closure_lookaheads() {
        let g = dragon();
        let a = Automaton::build(&g, ClosureKind::Lookahead);
        let c = g.symbol_id("c").unwrap();
        let d = g.symbol_id("d").unwrap();
        // In the initial state `C -> . c C` has lookahead FIRST(C) = { c, d }.
        let s0 = a.state(StateId::INITIAL);
        let item = s0
            .items
            .iter()
            .map(|id| a.item(*id))
            .find(|item| item.marked_symbol(&g) == Some(c))
            .unwrap();
        assert_eq!(item.lookahead, [c, d].into_iter().collect::<SymbolSet>());
    }

    #[test]
    fn display_marks_dot() {
        let g = arith();
        let a = Automaton::build(&g, ClosureKind::Core);
        let dump = a.display(&g).to_string();
        assert!(dump.contains("$accept -> [ . E $end ] { $end }"));
        assert!(dump.contains("E -> [ E + E . ]"));
    }
}
