use logos::Logos;
use lrtab_runtime::{Location, Token};

#[derive(Debug, Copy, Clone, Logos, PartialEq)]
#[logos(skip r"[ \t\f\r]+")]
pub enum Tok {
    #[token("\n")]
    Newline,

    #[token("(")]
    LParen,

    #[token(")")]
    RParen,

    #[token("+")]
    Plus,

    #[token("-")]
    Minus,

    #[token("*")]
    Star,

    #[token("/")]
    Slash,

    #[token(";")]
    Semi,

    #[regex(r"[0-9]+(\.[0-9]+)?")]
    Number,
}

impl Tok {
    /// The terminal name used in the grammars.
    pub fn name(self) -> &'static str {
        match self {
            Self::Newline => "NEWLINE",
            Self::LParen => "(",
            Self::RParen => ")",
            Self::Plus => "+",
            Self::Minus => "-",
            Self::Star => "*",
            Self::Slash => "/",
            Self::Semi => ";",
            Self::Number => "NUMBER",
        }
    }
}

#[derive(Debug, thiserror::Error)]
#[error("unrecognized input {text:?} on line {line}")]
pub struct LexError {
    pub text: String,
    pub line: usize,
}

/// Tokenize `input`, tracking 0-based line numbers and 1-based locations.
pub fn tokens(input: &str) -> impl Iterator<Item = Result<Token, LexError>> + '_ {
    let mut line = 0;
    let mut line_start = 0;
    Tok::lexer(input).spanned().filter_map(move |(tok, span)| {
        let text = &input[span.clone()];
        let tok = match tok {
            Ok(Tok::Newline) => {
                line += 1;
                line_start = span.end;
                return None;
            }
            Ok(tok) => tok,
            Err(()) => {
                return Some(Err(LexError {
                    text: text.to_owned(),
                    line,
                }))
            }
        };
        let loc = Location::line(line + 1, span.start - line_start, span.end - line_start)
            .with_range(span.start, span.end);
        Some(Ok(Token::new(tok.name(), text).at(line, loc)))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tracks_lines() {
        let tokens: Vec<_> = tokens("1 +\n 2").collect::<Result<_, _>>().unwrap();
        assert_eq!(tokens.len(), 3);
        assert_eq!(tokens[2].text, "2");
        assert_eq!(tokens[2].line, 1);
        assert_eq!(tokens[2].loc, Location::line(2, 1, 2).with_range(5, 6));
    }

    #[test]
    fn rejects_unknown_characters() {
        let err = tokens("1 $").find_map(Result::err).unwrap();
        assert_eq!(err.text, "$");
    }
}
