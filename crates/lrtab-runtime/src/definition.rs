//! Parser definition.

/// Symbol index of the synthetic `$accept` nonterminal.
pub const ACCEPT: usize = 0;

/// Symbol index of the end-of-input marker `$end`.
pub const END: usize = 1;

/// Symbol index of the reserved `error` terminal.
pub const ERROR: usize = 2;

/// The action that the LR automaton performs in a state on a particular
/// lookahead symbol.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ParseAction {
    /// Consume the lookahead symbol and transition to the specified state.
    Shift(usize),

    /// Reduce by the specified production.
    Reduce(usize),

    Accept,

    /// More than one action was retained for this cell when the table was
    /// built without default conflict resolution.
    Conflict,
}

/// The shape of a production as seen by the driver.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Arity {
    /// The symbol index of the left-hand side.
    pub lhs: usize,
    /// The number of symbols on the right-hand side.
    pub len: usize,
}

/// The trait for abstracting the generated parse table.
pub trait ParserDef {
    /// Return the initial state number.
    fn initial_state(&self) -> usize {
        0
    }

    /// Return the action for the given state and terminal symbol, if any.
    fn action(&self, state: usize, symbol: usize) -> Option<ParseAction>;

    /// Return the state reached after reducing to `nonterminal` on top of `state`.
    fn goto(&self, state: usize, nonterminal: usize) -> Option<usize>;

    /// Return the production to reduce without consulting the lookahead, if the
    /// state has a single reducing action.
    fn default_action(&self, state: usize) -> Option<usize>;

    fn production(&self, production: usize) -> Arity;

    /// Resolve a terminal name handed out by a lexer.
    fn symbol_id(&self, name: &str) -> Option<usize>;

    fn terminal_name(&self, symbol: usize) -> Option<&str>;

    /// Return the terminals that have an action defined in the state.
    fn expected_terminals(&self, state: usize) -> Vec<usize>;
}

impl<T: ?Sized> ParserDef for &T
where
    T: ParserDef,
{
    fn initial_state(&self) -> usize {
        (**self).initial_state()
    }

    fn action(&self, state: usize, symbol: usize) -> Option<ParseAction> {
        (**self).action(state, symbol)
    }

    fn goto(&self, state: usize, nonterminal: usize) -> Option<usize> {
        (**self).goto(state, nonterminal)
    }

    fn default_action(&self, state: usize) -> Option<usize> {
        (**self).default_action(state)
    }

    fn production(&self, production: usize) -> Arity {
        (**self).production(production)
    }

    fn symbol_id(&self, name: &str) -> Option<usize> {
        (**self).symbol_id(name)
    }

    fn terminal_name(&self, symbol: usize) -> Option<&str> {
        (**self).terminal_name(symbol)
    }

    fn expected_terminals(&self, state: usize) -> Vec<usize> {
        (**self).expected_terminals(state)
    }
}

impl<T: ?Sized> ParserDef for std::rc::Rc<T>
where
    T: ParserDef,
{
    fn initial_state(&self) -> usize {
        (**self).initial_state()
    }

    fn action(&self, state: usize, symbol: usize) -> Option<ParseAction> {
        (**self).action(state, symbol)
    }

    fn goto(&self, state: usize, nonterminal: usize) -> Option<usize> {
        (**self).goto(state, nonterminal)
    }

    fn default_action(&self, state: usize) -> Option<usize> {
        (**self).default_action(state)
    }

    fn production(&self, production: usize) -> Arity {
        (**self).production(production)
    }

    fn symbol_id(&self, name: &str) -> Option<usize> {
        (**self).symbol_id(name)
    }

    fn terminal_name(&self, symbol: usize) -> Option<&str> {
        (**self).terminal_name(symbol)
    }

    fn expected_terminals(&self, state: usize) -> Vec<usize> {
        (**self).expected_terminals(state)
    }
}

impl<T: ?Sized> ParserDef for std::sync::Arc<T>
where
    T: ParserDef,
{
    fn initial_state(&self) -> usize {
        (**self).initial_state()
    }

    fn action(&self, state: usize, symbol: usize) -> Option<ParseAction> {
        (**self).action(state, symbol)
    }

    fn goto(&self, state: usize, nonterminal: usize) -> Option<usize> {
        (**self).goto(state, nonterminal)
    }

    fn default_action(&self, state: usize) -> Option<usize> {
        (**self).default_action(state)
    }

    fn production(&self, production: usize) -> Arity {
        (**self).production(production)
    }

    fn symbol_id(&self, name: &str) -> Option<usize> {
        (**self).symbol_id(name)
    }

    fn terminal_name(&self, symbol: usize) -> Option<&str> {
        (**self).terminal_name(symbol)
    }

    fn expected_terminals(&self, state: usize) -> Vec<usize> {
        (**self).expected_terminals(state)
    }
}
