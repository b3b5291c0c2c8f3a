//! The table-driven shift/reduce parser.

use crate::{
    definition::{ParseAction, ParserDef, END, ERROR},
    lexer::{Lexer, Location, Token, TokenKind},
};
use std::{fmt, ops::ControlFlow};

/// Number of tokens that must be shifted after an error before a new error
/// is reported.
const RECOVERY_WINDOW: u8 = 3;

/// Symbol index given to token names missing from the parse table. No state
/// has an action on it.
const UNKNOWN: usize = usize::MAX;

/// Semantic actions invoked while parsing.
pub trait Actions {
    type Value;
    type Error: fmt::Display;

    /// Produce the semantic value of a shifted token.
    fn shift(&mut self, token: &Token) -> Self::Value;

    /// Run the semantic action of `production`.
    fn reduce(
        &mut self,
        production: usize,
        args: Reduction<'_, Self::Value>,
    ) -> Result<Self::Value, Self::Error>;

    /// Called when a syntax error is detected outside of a recovery window.
    ///
    /// Returning `Break` aborts the parse with the reported error.
    fn parse_error(&mut self, error: &SyntaxError) -> ControlFlow<()> {
        if error.recoverable {
            tracing::warn!("{}", error);
            ControlFlow::Continue(())
        } else {
            ControlFlow::Break(())
        }
    }
}

/// The arguments handed to a semantic action.
#[derive(Debug)]
pub struct Reduction<'a, V> {
    /// Values of the right-hand side symbols, `$1` first.
    pub values: Vec<V>,
    /// Locations of the right-hand side symbols, `@1` first.
    pub locations: &'a [Location],
    /// The span of the whole phrase (`@$`).
    pub loc: Location,
    /// Text of the most recently shifted token.
    pub text: &'a str,
    pub line: usize,
}

impl<V> Reduction<'_, V> {
    /// Take the value at the 1-based position `n`.
    pub fn take(&mut self, n: usize) -> Option<V> {
        if n == 0 || n > self.values.len() {
            return None;
        }
        Some(self.values.remove(n - 1))
    }

    /// The default action `$$ = $1`.
    pub fn into_first(self) -> Option<V> {
        self.values.into_iter().next()
    }
}

/// A syntax error detected by the parser.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyntaxError {
    pub message: String,
    /// The offending text.
    pub text: String,
    /// The resolved name of the offending token.
    pub token: String,
    pub line: usize,
    pub loc: Location,
    /// Names of the terminals that would have been accepted.
    pub expected: Vec<String>,
    /// Whether an error recovery rule is reachable from the current state.
    pub recoverable: bool,
}

impl fmt::Display for SyntaxError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for SyntaxError {}

#[derive(Debug, thiserror::Error)]
pub enum Error<L: fmt::Display, A: fmt::Display> {
    #[error("from lexer: {}", _0)]
    Lexer(L),

    #[error("from semantic action: {}", _0)]
    Action(A),

    #[error("{}", _0)]
    Syntax(SyntaxError),

    #[error("{}", _0)]
    Halted(String),

    #[error("multiple actions possible at state {}, token {}", state, symbol)]
    Ambiguous { state: usize, symbol: usize },

    #[error("missing goto from state {} on symbol {}", state, symbol)]
    MissingGoto { state: usize, symbol: usize },

    #[error("empty parser stack")]
    EmptyStack,
}

/// The parser driven by a generated parse table.
#[derive(Debug, Clone)]
pub struct Parser<TDef> {
    definition: TDef,
}

impl<TDef> Parser<TDef>
where
    TDef: ParserDef,
{
    /// Create an instance of `Parser` using the specified parse table.
    pub fn new(definition: TDef) -> Self {
        Self { definition }
    }

    pub fn definition(&self) -> &TDef {
        &self.definition
    }

    /// Consume the whole token stream and return the value of the start symbol.
    pub fn parse<L, A>(
        &self,
        lexer: &mut L,
        actions: &mut A,
    ) -> Result<A::Value, Error<L::Error, A::Error>>
    where
        L: Lexer,
        A: Actions,
    {
        let span = tracing::trace_span!("parse");
        let _entered = span.enter();

        let initial = self.definition.initial_state();
        Session {
            def: &self.definition,
            lexer,
            actions,
            stack: vec![Frame {
                symbol: crate::definition::ACCEPT,
                state: initial,
            }],
            values: vec![],
            locations: vec![Location::default()],
            lookahead: None,
            pre_error: None,
            recovering: 0,
            text: String::new(),
            line: 0,
            last_loc: Location::default(),
        }
        .run()
    }
}

#[derive(Debug)]
struct Frame {
    symbol: usize,
    state: usize,
}

#[derive(Debug)]
struct Lookahead {
    symbol: usize,
    token: Token,
}

struct Session<'p, TDef, L, A>
where
    L: Lexer,
    A: Actions,
{
    def: &'p TDef,
    lexer: &'p mut L,
    actions: &'p mut A,
    stack: Vec<Frame>,
    values: Vec<A::Value>,
    locations: Vec<Location>,
    lookahead: Option<Lookahead>,
    pre_error: Option<Lookahead>,
    recovering: u8,
    // the most recently shifted token
    text: String,
    line: usize,
    last_loc: Location,
}

impl<TDef, L, A> Session<'_, TDef, L, A>
where
    TDef: ParserDef,
    L: Lexer,
    A: Actions,
{
    fn run(mut self) -> Result<A::Value, Error<L::Error, A::Error>> {
        loop {
            let state = self.top()?;

            let action = match self.def.default_action(state) {
                Some(production) => Some(ParseAction::Reduce(production)),
                None => {
                    let symbol = self.peek()?;
                    self.def.action(state, symbol)
                }
            };

            let action = match action {
                Some(ParseAction::Conflict) => {
                    return Err(Error::Ambiguous {
                        state,
                        symbol: self.lookahead_symbol(),
                    })
                }
                Some(action) => action,
                None => self.recover(state)?,
            };

            match action {
                ParseAction::Shift(next) => self.shift(next)?,
                ParseAction::Reduce(production) => self.reduce(production)?,
                ParseAction::Accept => {
                    tracing::trace!("accepted");
                    return self.values.pop().ok_or(Error::EmptyStack);
                }
                ParseAction::Conflict => {
                    return Err(Error::Ambiguous {
                        state: self.top()?,
                        symbol: self.lookahead_symbol(),
                    })
                }
            }
        }
    }

    fn top(&self) -> Result<usize, Error<L::Error, A::Error>> {
        self.stack
            .last()
            .map(|frame| frame.state)
            .ok_or(Error::EmptyStack)
    }

    fn lookahead_symbol(&self) -> usize {
        self.lookahead.as_ref().map_or(END, |la| la.symbol)
    }

    /// Return the current lookahead symbol, fetching a token if needed.
    fn peek(&mut self) -> Result<usize, Error<L::Error, A::Error>> {
        if self.lookahead.is_none() {
            let la = self.lex()?;
            self.lookahead = Some(la);
        }
        Ok(self.lookahead_symbol())
    }

    fn lex(&mut self) -> Result<Lookahead, Error<L::Error, A::Error>> {
        match self.lexer.next_token().map_err(Error::Lexer)? {
            Some(token) => {
                let symbol = match &token.kind {
                    TokenKind::Id(id) => *id,
                    TokenKind::Name(name) => self.def.symbol_id(name).unwrap_or_else(|| {
                        tracing::trace!(%name, "unknown token");
                        UNKNOWN
                    }),
                };
                Ok(Lookahead { symbol, token })
            }
            None => {
                let mut token = Token::new(END, "");
                token.line = self.line;
                token.loc = self.last_loc.clone();
                Ok(Lookahead { symbol: END, token })
            }
        }
    }

    fn shift(&mut self, next: usize) -> Result<(), Error<L::Error, A::Error>> {
        let la = match self.lookahead.take() {
            Some(la) => la,
            None => self.lex()?,
        };
        tracing::trace!(symbol = la.symbol, next, "shift");

        let value = self.actions.shift(&la.token);
        self.stack.push(Frame {
            symbol: la.symbol,
            state: next,
        });
        self.values.push(value);
        self.locations.push(la.token.loc.clone());

        match self.pre_error.take() {
            None => {
                self.text = la.token.text;
                self.line = la.token.line;
                self.last_loc = la.token.loc;
                self.recovering = self.recovering.saturating_sub(1);
            }
            Some(pre_error) => {
                // The error token was just shifted; resume with the token
                // that caused the error.
                self.lookahead = Some(pre_error);
            }
        }
        Ok(())
    }

    fn reduce(&mut self, production: usize) -> Result<(), Error<L::Error, A::Error>> {
        let arity = self.def.production(production);
        let len = arity.len;
        if len >= self.stack.len() || len > self.values.len() {
            return Err(Error::EmptyStack);
        }
        tracing::trace!(production, lhs = arity.lhs, len, "reduce");

        let first = &self.locations[self.locations.len() - len.max(1)];
        let last = &self.locations[self.locations.len() - 1];
        let loc = Location::span(first, last);

        let values = self.values.split_off(self.values.len() - len);
        let split = self.locations.len() - len;
        let value = self
            .actions
            .reduce(
                production,
                Reduction {
                    values,
                    locations: &self.locations[split..],
                    loc: loc.clone(),
                    text: &self.text,
                    line: self.line,
                },
            )
            .map_err(Error::Action)?;

        self.stack.truncate(self.stack.len() - len);
        self.locations.truncate(split);

        let current = self.top()?;
        let next = self
            .def
            .goto(current, arity.lhs)
            .ok_or(Error::MissingGoto {
                state: current,
                symbol: arity.lhs,
            })?;
        self.stack.push(Frame {
            symbol: arity.lhs,
            state: next,
        });
        self.values.push(value);
        self.locations.push(loc);
        Ok(())
    }

    /// Return the pop depth to reach the nearest state that can shift `error`.
    fn locate_recovery_rule(&self) -> Option<usize> {
        self.stack
            .iter()
            .rev()
            .position(|frame| self.def.action(frame.state, ERROR).is_some())
    }

    fn syntax_error(&self, state: usize, recoverable: bool) -> SyntaxError {
        let (symbol, token) = match &self.lookahead {
            Some(la) => (la.symbol, la.token.clone()),
            None => (END, Token::new(END, "")),
        };
        let name = self
            .def
            .terminal_name(symbol)
            .map_or_else(|| token.kind.to_string(), ToOwned::to_owned);

        let expected: Vec<String> = self
            .def
            .expected_terminals(state)
            .into_iter()
            .filter(|&t| t != ERROR)
            .filter_map(|t| self.def.terminal_name(t).map(|name| format!("'{}'", name)))
            .collect();

        let message = if !expected.is_empty() {
            format!(
                "Parse error on line {}: Expecting {}, got '{}'",
                token.line,
                expected.join(", "),
                name
            )
        } else if symbol == END {
            format!("Parse error on line {}: Unexpected end of input", token.line)
        } else {
            format!("Parse error on line {}: Unexpected '{}'", token.line, name)
        };

        SyntaxError {
            message,
            text: token.text,
            token: name,
            line: token.line,
            loc: token.loc,
            expected,
            recoverable,
        }
    }

    /// Handle a missing action, returning the action on the `error` symbol
    /// in the recovery state.
    fn recover(&mut self, state: usize) -> Result<ParseAction, Error<L::Error, A::Error>> {
        let mut depth = None;
        let mut report = None;

        if self.recovering == 0 {
            depth = self.locate_recovery_rule();
            let error = self.syntax_error(state, depth.is_some());
            if self.actions.parse_error(&error).is_break() {
                return Err(Error::Syntax(error));
            }
            report = Some(error);
        } else if self.pre_error.as_ref().map_or(true, |la| la.symbol != END) {
            depth = self.locate_recovery_rule();
        }

        if self.recovering == RECOVERY_WINDOW {
            let at_end = self.lookahead_symbol() == END
                || self.pre_error.as_ref().map_or(false, |la| la.symbol == END);
            if at_end {
                return Err(Error::Halted(report.map_or_else(
                    || "Parsing halted while starting to recover from another error.".into(),
                    |e| e.message,
                )));
            }

            // Discard the current lookahead and grab another.
            if let Some(discarded) = self.lookahead.take() {
                tracing::trace!(symbol = discarded.symbol, "discard");
                self.text = discarded.token.text;
                self.line = discarded.token.line;
                self.last_loc = discarded.token.loc;
            }
            let la = self.lex()?;
            self.lookahead = Some(la);
        }

        let depth = match depth {
            Some(depth) => depth,
            None => {
                return Err(Error::Halted(report.map_or_else(
                    || "Parsing halted. No suitable error recovery rule available.".into(),
                    |e| e.message,
                )))
            }
        };

        tracing::trace!(depth, "recover");
        for frame in self.stack.drain(self.stack.len() - depth..) {
            tracing::trace!(symbol = frame.symbol, state = frame.state, "pop");
        }
        self.values.truncate(self.values.len() - depth);
        self.locations.truncate(self.locations.len() - depth);

        let la = match self.lookahead.take() {
            Some(la) => la,
            None => self.lex()?,
        };
        let mut token = la.token.clone();
        token.kind = TokenKind::Id(ERROR);
        self.pre_error = if la.symbol == ERROR { None } else { Some(la) };
        self.lookahead = Some(Lookahead {
            symbol: ERROR,
            token,
        });
        self.recovering = RECOVERY_WINDOW;

        let state = self.top()?;
        match self.def.action(state, ERROR) {
            Some(ParseAction::Conflict) => Err(Error::Ambiguous {
                state,
                symbol: ERROR,
            }),
            Some(action) => Ok(action),
            None => Err(Error::Halted(
                "Parsing halted. No suitable error recovery rule available.".into(),
            )),
        }
    }
}
