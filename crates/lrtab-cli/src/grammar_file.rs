//! The JSON form of a grammar description.
//!
//! ```json
//! {
//!   "tokens": "NUMBER + *",
//!   "operators": [["left", "+"], ["left", "*"]],
//!   "start": "e",
//!   "bnf": {
//!     "e": ["e + e", ["e * e", "mul"], { "rhs": "NUMBER", "action": "num" }]
//!   }
//! }
//! ```

use indexmap::IndexMap;
use lrtab::grammar::{Assoc, GrammarDef, GrammarError};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GrammarFile {
    pub bnf: IndexMap<String, Alternatives>,
    #[serde(default)]
    pub operators: Vec<Vec<String>>,
    #[serde(default)]
    pub start: Option<String>,
    #[serde(default)]
    pub tokens: Option<Tokens>,
}

/// Either `"a b | c"` or a list of alternatives.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum Alternatives {
    Inline(String),
    List(Vec<Alternative>),
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum Alternative {
    Rhs(String),
    WithOptions(String, String, Options),
    WithAction(String, String),
    Full {
        rhs: String,
        #[serde(default)]
        action: Option<String>,
        #[serde(default)]
        prec: Option<String>,
    },
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Options {
    pub prec: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum Tokens {
    Inline(String),
    List(Vec<String>),
}

impl GrammarFile {
    pub fn define(&self, g: &mut GrammarDef) -> Result<(), GrammarError> {
        if let Some(tokens) = &self.tokens {
            match tokens {
                Tokens::Inline(s) => g.tokens(s.split_whitespace()),
                Tokens::List(names) => g.tokens(names),
            }
        }

        for tier in &self.operators {
            let (assoc, names) = tier
                .split_first()
                .ok_or("empty operator declaration")?;
            let assoc = match &**assoc {
                "left" => Assoc::Left,
                "right" => Assoc::Right,
                "nonassoc" => Assoc::Nonassoc,
                other => return Err(format!("unknown associativity `{}'", other).into()),
            };
            g.operators(assoc, names);
        }

        if let Some(start) = &self.start {
            g.start_symbol(start);
        }

        for (lhs, alternatives) in &self.bnf {
            match alternatives {
                Alternatives::Inline(s) => {
                    for rhs in s.split('|') {
                        g.rule(lhs, rhs.split_whitespace());
                    }
                }
                Alternatives::List(list) => {
                    for alt in list {
                        let (rhs, action, prec) = match alt {
                            Alternative::Rhs(rhs) => (rhs, None, None),
                            Alternative::WithAction(rhs, action) => (rhs, Some(action), None),
                            Alternative::WithOptions(rhs, action, options) => {
                                (rhs, Some(action), options.prec.as_ref())
                            }
                            Alternative::Full { rhs, action, prec } => {
                                (rhs, action.as_ref(), prec.as_ref())
                            }
                        };
                        let alt = g.rule(lhs, rhs.split_whitespace());
                        if let Some(action) = action {
                            alt.action(action.as_str());
                        }
                        if let Some(prec) = prec {
                            alt.prec(prec.as_str());
                        }
                    }
                }
            }
        }

        Ok(())
    }
}
