//! Runtime implementation for `lrtab` parse tables.

pub mod definition;
pub mod lexer;
pub mod parser;

pub use crate::{
    definition::{Arity, ParseAction, ParserDef},
    lexer::{Lexer, Location, Token, TokenKind},
    parser::{Actions, Error, Parser, Reduction, SyntaxError},
};
