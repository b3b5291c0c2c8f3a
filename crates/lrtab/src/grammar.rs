//! Grammar types.

use crate::{
    set::SymbolSet,
    types::{display_fn, Map},
};
use std::fmt;

#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct SymbolId {
    raw: u16,
}

impl SymbolId {
    /// The synthetic nonterminal on the left-hand side of the augmented production.
    pub const ACCEPT: Self = Self::from_raw(0);

    /// Reserved terminal symbol that means the end of input.
    pub const END: Self = Self::from_raw(1);

    /// Reserved terminal symbol used as an error token.
    pub const ERROR: Self = Self::from_raw(2);

    const OFFSET: u16 = 3;

    #[inline]
    pub const fn from_raw(raw: u16) -> Self {
        Self { raw }
    }

    #[inline]
    pub const fn into_raw(self) -> u16 {
        self.raw
    }

    #[inline]
    pub fn index(self) -> usize {
        self.raw as usize
    }

    #[inline]
    pub(crate) fn from_index(index: usize) -> Self {
        debug_assert!(index <= u16::MAX as usize);
        Self::from_raw(index as u16)
    }
}

impl fmt::Debug for SymbolId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Self::ACCEPT => f.write_str("$accept"),
            Self::END => f.write_str("$end"),
            Self::ERROR => f.write_str("error"),
            Self { raw } => write!(f, "Sym#{:03}", raw),
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum SymbolKind {
    Terminal,
    Nonterminal,
}

#[derive(Debug, Clone)]
pub struct Symbol {
    id: SymbolId,
    name: String,
    kind: SymbolKind,
}

impl Symbol {
    pub fn id(&self) -> SymbolId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> SymbolKind {
        self.kind
    }

    pub fn is_terminal(&self) -> bool {
        self.kind == SymbolKind::Terminal
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct ProductionId {
    raw: u16,
}

impl ProductionId {
    /// The augmented production `$accept -> start $end`.
    pub const ACCEPT: Self = Self::from_raw(0);

    #[inline]
    pub const fn from_raw(raw: u16) -> Self {
        Self { raw }
    }

    #[inline]
    pub const fn into_raw(self) -> u16 {
        self.raw
    }

    #[inline]
    pub fn index(self) -> usize {
        self.raw as usize
    }
}

impl fmt::Debug for ProductionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "P#{:03}", self.raw)
    }
}

/// The type that represents a production rule in grammar.
#[derive(Debug, Clone)]
pub struct Production {
    id: ProductionId,
    lhs: SymbolId,
    rhs: Vec<SymbolId>,
    precedence: u16,
    action: Option<String>,
    pub(crate) nullable: bool,
    pub(crate) first: SymbolSet,
}

impl Production {
    pub fn id(&self) -> ProductionId {
        self.id
    }

    /// Return the left-hand side of this production.
    pub fn lhs(&self) -> SymbolId {
        self.lhs
    }

    /// Return the right-hand side of this production.
    pub fn rhs(&self) -> &[SymbolId] {
        &self.rhs[..]
    }

    /// The precedence used for conflict resolution, `0` if there is none.
    pub fn precedence(&self) -> u16 {
        self.precedence
    }

    /// The opaque semantic action attached to this production.
    pub fn action(&self) -> Option<&str> {
        self.action.as_deref()
    }

    pub fn nullable(&self) -> bool {
        self.nullable
    }

    pub fn first(&self) -> &SymbolSet {
        &self.first
    }

    // `"LHS -> R1 R2 R3"`
    pub fn display<'g>(&'g self, g: &'g Grammar) -> impl fmt::Display + 'g {
        display_fn(move |f| {
            write!(f, "{} ->", g.symbol(self.lhs))?;
            if self.rhs.is_empty() {
                write!(f, " %empty")?;
            }
            for symbol in &self.rhs {
                write!(f, " {}", g.symbol(*symbol))?;
            }
            Ok(())
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Nonterminal {
    symbol: SymbolId,
    productions: Vec<ProductionId>,
    pub(crate) nullable: bool,
    pub(crate) first: SymbolSet,
    pub(crate) follow: SymbolSet,
}

impl Nonterminal {
    pub fn symbol(&self) -> SymbolId {
        self.symbol
    }

    /// The productions of this nonterminal in declaration order.
    pub fn productions(&self) -> &[ProductionId] {
        &self.productions[..]
    }

    pub fn nullable(&self) -> bool {
        self.nullable
    }

    pub fn first(&self) -> &SymbolSet {
        &self.first
    }

    pub fn follow(&self) -> &SymbolSet {
        &self.follow
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Assoc {
    Left,
    Right,
    Nonassoc,
}

impl fmt::Display for Assoc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Left => write!(f, "left"),
            Self::Right => write!(f, "right"),
            Self::Nonassoc => write!(f, "nonassoc"),
        }
    }
}

/// A declared operator. Tiers declared later bind tighter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Operator {
    pub name: String,
    pub precedence: u16,
    pub assoc: Assoc,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GrammarWarning {
    /// The declared token list does not match the terminals found in the rules.
    TokenMismatch { declared: usize, found: usize },
}

impl fmt::Display for GrammarWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TokenMismatch { declared, found } => write!(
                f,
                "declared tokens differ from tokens found in rules ({} declared, {} found)",
                declared, found
            ),
        }
    }
}

/// The grammar definition used to derive the parser tables.
///
/// A grammar is augmented with the production `$accept -> start $end` and its
/// nullable, FIRST and FOLLOW sets are computed when it is defined.
#[derive(Debug, Clone)]
pub struct Grammar {
    pub(crate) symbols: Vec<Symbol>,
    pub(crate) symbol_ids: Map<String, SymbolId>,
    pub(crate) productions: Vec<Production>,
    pub(crate) nonterminals: Map<SymbolId, Nonterminal>,
    pub(crate) operators: Map<String, Operator>,
    pub(crate) start: SymbolId,
    pub(crate) uses_error: bool,
    pub(crate) warnings: Vec<GrammarWarning>,
}

impl Grammar {
    /// Define a grammar using the specified function.
    pub fn define<F>(f: F) -> Result<Self, GrammarError>
    where
        F: FnOnce(&mut GrammarDef) -> Result<(), GrammarError>,
    {
        let mut def = GrammarDef::default();
        f(&mut def)?;
        def.end()
    }

    pub fn symbol(&self, id: SymbolId) -> &Symbol {
        &self.symbols[id.index()]
    }

    pub fn symbols(&self) -> &[Symbol] {
        &self.symbols[..]
    }

    pub fn symbol_id(&self, name: &str) -> Option<SymbolId> {
        self.symbol_ids.get(name).copied()
    }

    pub fn is_terminal(&self, id: SymbolId) -> bool {
        self.symbol(id).is_terminal()
    }

    /// The terminals that may appear as lookahead: `$end`, `error` if the
    /// grammar uses it, then the terminals in order of appearance.
    pub fn terminals(&self) -> impl Iterator<Item = SymbolId> + '_ {
        self.symbols
            .iter()
            .filter(move |s| s.is_terminal() && (s.id != SymbolId::ERROR || self.uses_error))
            .map(|s| s.id)
    }

    pub fn production(&self, id: ProductionId) -> &Production {
        &self.productions[id.index()]
    }

    pub fn productions(&self) -> &[Production] {
        &self.productions[..]
    }

    pub fn nonterminal(&self, id: SymbolId) -> Option<&Nonterminal> {
        self.nonterminals.get(&id)
    }

    pub fn nonterminals(&self) -> impl Iterator<Item = &Nonterminal> + '_ {
        self.nonterminals.values()
    }

    pub fn operator(&self, name: &str) -> Option<&Operator> {
        self.operators.get(name)
    }

    /// The operator declared for a terminal, if any.
    pub fn operator_of(&self, id: SymbolId) -> Option<&Operator> {
        self.operators.get(self.symbol(id).name())
    }

    pub fn start_symbol(&self) -> SymbolId {
        self.start
    }

    /// Whether some production uses the `error` token for recovery.
    pub fn uses_error_recovery(&self) -> bool {
        self.uses_error
    }

    pub fn warnings(&self) -> &[GrammarWarning] {
        &self.warnings[..]
    }
}

impl fmt::Display for Grammar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "## terminals:")?;
        for symbol in self.symbols.iter().filter(|s| s.is_terminal()) {
            write!(f, "{} {}", symbol.id.raw, symbol)?;
            if let Some(op) = self.operators.get(symbol.name()) {
                write!(f, " (precedence={}, assoc={})", op.precedence, op.assoc)?;
            }
            writeln!(f)?;
        }

        writeln!(f, "\n## nonterminals:")?;
        for n in self.nonterminals.values() {
            write!(f, "{} {}", n.symbol.raw, self.symbol(n.symbol))?;
            if n.symbol == self.start {
                write!(f, " (start)")?;
            }
            if n.nullable {
                write!(f, " (nullable)")?;
            }
            writeln!(f)?;
            let names = |set: &SymbolSet| {
                set.iter()
                    .map(|t| self.symbol(t).name().to_owned())
                    .collect::<Vec<_>>()
                    .join(", ")
            };
            writeln!(f, "  first: [{}]", names(&n.first))?;
            writeln!(f, "  follow: [{}]", names(&n.follow))?;
        }

        writeln!(f, "\n## productions:")?;
        for p in &self.productions {
            write!(f, "{} {}", p.id.raw, p.display(self))?;
            if p.precedence > 0 {
                write!(f, " (precedence={})", p.precedence)?;
            }
            writeln!(f)?;
        }

        Ok(())
    }
}

/// A right-hand side alternative of a rule being defined.
#[derive(Debug, Default, Clone)]
pub struct Alternative {
    rhs: Vec<String>,
    action: Option<String>,
    prec: Option<String>,
}

impl Alternative {
    /// Attach an opaque semantic action, kept verbatim for the emitter.
    pub fn action(&mut self, label: impl Into<String>) -> &mut Self {
        self.action = Some(label.into());
        self
    }

    /// Use the precedence of the named operator instead of the rightmost one.
    pub fn prec(&mut self, operator: impl Into<String>) -> &mut Self {
        self.prec = Some(operator.into());
        self
    }
}

/// The contextual values for building a `Grammar`.
#[derive(Debug, Default)]
pub struct GrammarDef {
    rules: Map<String, Vec<Alternative>>,
    tokens: Option<Vec<String>>,
    operators: Vec<(Assoc, Vec<String>)>,
    start: Option<String>,
}

impl GrammarDef {
    /// Add an alternative to the rules of `lhs`.
    ///
    /// An empty right-hand side derives the empty string. Every symbol that
    /// never appears on a left-hand side is a terminal.
    pub fn rule<I, S>(&mut self, lhs: &str, rhs: I) -> &mut Alternative
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let rhs = rhs
            .into_iter()
            .map(|s| s.as_ref().to_owned())
            .filter(|s| !s.is_empty())
            .collect();
        let alternatives = self.rules.entry(lhs.to_owned()).or_default();
        alternatives.push(Alternative {
            rhs,
            ..Default::default()
        });
        let last = alternatives.len() - 1;
        &mut alternatives[last]
    }

    /// Declare the token list. It is only checked against the terminals found
    /// in the rules.
    pub fn tokens<I, S>(&mut self, tokens: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tokens
            .get_or_insert_with(Vec::new)
            .extend(tokens.into_iter().map(Into::into));
    }

    /// Declare a precedence tier. Each call binds tighter than the previous ones.
    pub fn operators<I, S>(&mut self, assoc: Assoc, names: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.operators
            .push((assoc, names.into_iter().map(Into::into).collect()));
    }

    /// Specify the start symbol for this grammar.
    pub fn start_symbol(&mut self, name: &str) {
        self.start = Some(name.to_owned());
    }

    fn end(self) -> Result<Grammar, GrammarError> {
        if self.rules.values().all(|alts| alts.is_empty()) {
            return Err(GrammarError::NoProductions);
        }

        let mut symbols = vec![
            Symbol {
                id: SymbolId::ACCEPT,
                name: "$accept".into(),
                kind: SymbolKind::Nonterminal,
            },
            Symbol {
                id: SymbolId::END,
                name: "$end".into(),
                kind: SymbolKind::Terminal,
            },
            Symbol {
                id: SymbolId::ERROR,
                name: "error".into(),
                kind: SymbolKind::Terminal,
            },
        ];
        let mut symbol_ids: Map<String, SymbolId> = symbols
            .iter()
            .map(|s| (s.name.clone(), s.id))
            .collect();

        let mut intern = |name: &str| -> Result<SymbolId, GrammarError> {
            if let Some(id) = symbol_ids.get(name) {
                return Ok(*id);
            }
            let raw = u16::try_from(symbols.len()).map_err(|_| "too many symbols in grammar")?;
            let id = SymbolId::from_raw(raw);
            let kind = if self.rules.contains_key(name) {
                SymbolKind::Nonterminal
            } else {
                SymbolKind::Terminal
            };
            symbols.push(Symbol {
                id,
                name: name.to_owned(),
                kind,
            });
            symbol_ids.insert(name.to_owned(), id);
            Ok(id)
        };

        let mut rules = Vec::with_capacity(self.rules.len());
        let mut uses_error = false;
        for (lhs, alternatives) in &self.rules {
            if matches!(&**lhs, "$accept" | "$end" | "error") {
                return Err(GrammarError::ReservedSymbol(lhs.clone()));
            }
            let lhs = intern(lhs)?;
            for alt in alternatives {
                let mut rhs = Vec::with_capacity(alt.rhs.len());
                for name in &alt.rhs {
                    if name == "$accept" {
                        return Err(GrammarError::ReservedSymbol(name.clone()));
                    }
                    let id = intern(name)?;
                    uses_error |= id == SymbolId::ERROR;
                    rhs.push(id);
                }
                rules.push((lhs, rhs, alt));
            }
        }

        let start = match &self.start {
            Some(name) => match symbol_ids.get(&**name) {
                Some(id) if symbols[id.index()].kind == SymbolKind::Nonterminal => *id,
                _ => return Err(GrammarError::InvalidStartSymbol(name.clone())),
            },
            None => rules[0].0,
        };

        let mut operators: Map<String, Operator> = Map::default();
        for (tier, (assoc, names)) in self.operators.iter().enumerate() {
            let precedence = u16::try_from(tier + 1).map_err(|_| "too many precedence tiers")?;
            for name in names {
                operators.insert(
                    name.clone(),
                    Operator {
                        name: name.clone(),
                        precedence,
                        assoc: *assoc,
                    },
                );
            }
        }

        let mut nonterminals: Map<SymbolId, Nonterminal> = Map::default();
        let nonterminal = |id: SymbolId| Nonterminal {
            symbol: id,
            productions: vec![],
            nullable: false,
            first: SymbolSet::new(),
            follow: SymbolSet::new(),
        };
        nonterminals.insert(SymbolId::ACCEPT, nonterminal(SymbolId::ACCEPT));
        for s in symbols.iter().filter(|s| s.kind == SymbolKind::Nonterminal) {
            nonterminals
                .entry(s.id)
                .or_insert_with(|| nonterminal(s.id));
        }

        let mut productions = Vec::with_capacity(rules.len() + 1);
        productions.push(Production {
            id: ProductionId::ACCEPT,
            lhs: SymbolId::ACCEPT,
            rhs: vec![start, SymbolId::END],
            precedence: 0,
            action: None,
            nullable: false,
            first: SymbolSet::new(),
        });
        for (lhs, rhs, alt) in rules {
            let id = u16::try_from(productions.len())
                .map(ProductionId::from_raw)
                .map_err(|_| "too many productions in grammar")?;
            let precedence = match &alt.prec {
                Some(name) => {
                    operators
                        .get(name)
                        .ok_or_else(|| GrammarError::UnknownOperator(name.clone()))?
                        .precedence
                }
                None => rhs
                    .iter()
                    .rev()
                    .filter(|s| symbols[s.index()].kind == SymbolKind::Terminal)
                    .find_map(|s| operators.get(&symbols[s.index()].name))
                    .map_or(0, |op| op.precedence),
            };
            productions.push(Production {
                id,
                lhs,
                rhs,
                precedence,
                action: alt.action.clone(),
                nullable: false,
                first: SymbolSet::new(),
            });
        }
        for p in &productions {
            if let Some(n) = nonterminals.get_mut(&p.lhs) {
                n.productions.push(p.id);
            }
        }
        if let Some(n) = nonterminals.get_mut(&start) {
            n.follow.insert(SymbolId::END);
        }

        let mut warnings = vec![];
        if let Some(tokens) = &self.tokens {
            let found = symbols
                .iter()
                .filter(|s| s.is_terminal() && s.id.raw >= SymbolId::OFFSET)
                .count();
            let declared = tokens
                .iter()
                .filter(|t| t.as_str() != "$end" && t.as_str() != "error")
                .count();
            if declared != found {
                let warning = GrammarWarning::TokenMismatch { declared, found };
                tracing::warn!("{}", warning);
                warnings.push(warning);
            }
        }

        let mut grammar = Grammar {
            symbols,
            symbol_ids,
            productions,
            nonterminals,
            operators,
            start,
            uses_error,
            warnings,
        };
        crate::lookahead::compute(&mut grammar);

        Ok(grammar)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum GrammarError {
    #[error("Grammar error: must have at least one rule.")]
    NoProductions,

    #[error("Grammar error: the start symbol must be a nonterminal found in the grammar: `{}'", _0)]
    InvalidStartSymbol(String),

    #[error("unknown precedence name: `{}'", _0)]
    UnknownOperator(String),

    #[error("the symbol `{}' is reserved", _0)]
    ReservedSymbol(String),

    #[error("Other error: {}", msg)]
    Other { msg: String },
}

impl From<&str> for GrammarError {
    fn from(msg: &str) -> Self {
        Self::Other { msg: msg.into() }
    }
}

impl From<String> for GrammarError {
    fn from(msg: String) -> Self {
        Self::Other { msg }
    }
}
