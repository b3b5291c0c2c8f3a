//! The boundary between the parser and a lexer.

use std::{borrow::Cow, fmt};

/// Source span of a token or of a reduced phrase.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Location {
    pub first_line: usize,
    pub last_line: usize,
    pub first_column: usize,
    pub last_column: usize,
    /// Byte offsets `[start, end)`, if the lexer tracks them.
    pub range: Option<(usize, usize)>,
}

impl Location {
    /// A location covering a single line.
    pub fn line(line: usize, first_column: usize, last_column: usize) -> Self {
        Self {
            first_line: line,
            last_line: line,
            first_column,
            last_column,
            range: None,
        }
    }

    pub fn with_range(mut self, start: usize, end: usize) -> Self {
        self.range = Some((start, end));
        self
    }

    /// The span starting at `first` and ending at `last`.
    pub fn span(first: &Location, last: &Location) -> Self {
        let range = match (first.range, last.range) {
            (Some((start, _)), Some((_, end))) => Some((start, end)),
            _ => None,
        };
        Self {
            first_line: first.first_line,
            last_line: last.last_line,
            first_column: first.first_column,
            last_column: last.last_column,
            range,
        }
    }
}

/// How a lexer identifies the terminal of a token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenKind {
    /// The symbol index from the parse table.
    Id(usize),
    /// The terminal name, resolved through the parse table's symbol map.
    Name(Cow<'static, str>),
}

impl From<usize> for TokenKind {
    fn from(id: usize) -> Self {
        Self::Id(id)
    }
}

impl From<&'static str> for TokenKind {
    fn from(name: &'static str) -> Self {
        Self::Name(Cow::Borrowed(name))
    }
}

impl From<String> for TokenKind {
    fn from(name: String) -> Self {
        Self::Name(Cow::Owned(name))
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Id(id) => write!(f, "#{}", id),
            Self::Name(name) => f.write_str(name),
        }
    }
}

/// A token handed to the parser.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
    pub line: usize,
    pub loc: Location,
}

impl Token {
    pub fn new(kind: impl Into<TokenKind>, text: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            text: text.into(),
            line: 0,
            loc: Location::default(),
        }
    }

    pub fn at(mut self, line: usize, loc: Location) -> Self {
        self.line = line;
        self.loc = loc;
        self
    }

    /// The length of the matched text in bytes.
    pub fn len(&self) -> usize {
        self.text.len()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}

/// A source of tokens.
///
/// Returning `Ok(None)` signals the end of input. It may be returned repeatedly.
pub trait Lexer {
    type Error: fmt::Display;

    fn next_token(&mut self) -> Result<Option<Token>, Self::Error>;
}

impl<I, E> Lexer for I
where
    I: Iterator<Item = Result<Token, E>>,
    E: fmt::Display,
{
    type Error = E;

    fn next_token(&mut self) -> Result<Option<Token>, Self::Error> {
        self.next().transpose()
    }
}
