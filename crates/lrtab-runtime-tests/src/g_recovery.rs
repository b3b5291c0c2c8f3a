use crate::lexer::tokens;
use lrtab::{diagnostics::Quiet, grammar::Grammar, table::ParseTable, Config, Discipline};
use lrtab_runtime::{Actions, Error, Parser, Reduction, SyntaxError, Token};
use std::ops::ControlFlow;

fn grammar() -> Grammar {
    Grammar::define(|g| {
        g.rule("lines", ["lines", "line"]).action("append");
        g.rule("lines", ["line"]);
        g.rule("line", ["NUMBER", ";"]).action("number");
        g.rule("line", ["error", ";"]).action("recovered");
        Ok(())
    })
    .unwrap()
}

#[derive(Default)]
struct Lines<'g> {
    grammar: Option<&'g Grammar>,
    errors: Vec<SyntaxError>,
}

impl Actions for Lines<'_> {
    type Value = Vec<String>;
    type Error = String;

    fn shift(&mut self, token: &Token) -> Vec<String> {
        vec![token.text.clone()]
    }

    fn reduce(
        &mut self,
        production: usize,
        mut args: Reduction<'_, Vec<String>>,
    ) -> Result<Vec<String>, String> {
        let label = self
            .grammar
            .and_then(|g| g.productions().get(production))
            .and_then(|p| p.action());
        match label {
            Some("append") => {
                let mut lines = args.take(1).unwrap_or_default();
                lines.extend(args.take(1).unwrap_or_default());
                Ok(lines)
            }
            Some("recovered") => Ok(vec!["<error>".into()]),
            _ => Ok(args.into_first().unwrap_or_default()),
        }
    }

    fn parse_error(&mut self, error: &SyntaxError) -> ControlFlow<()> {
        self.errors.push(error.clone());
        if error.recoverable {
            ControlFlow::Continue(())
        } else {
            ControlFlow::Break(())
        }
    }
}

fn parse(
    g: &Grammar,
    table: &ParseTable,
    input: &str,
) -> (Result<Vec<String>, Error<crate::lexer::LexError, String>>, Vec<SyntaxError>) {
    let mut actions = Lines {
        grammar: Some(g),
        ..Default::default()
    };
    let result = Parser::new(table).parse(&mut tokens(input), &mut actions);
    (result, actions.errors)
}

#[test]
fn clean_input() {
    let g = grammar();
    let table = Config::new().generate_with(&g, &mut Quiet).unwrap();
    let (result, errors) = parse(&g, &table, "1; 2;\n3;");
    assert_eq!(result.unwrap(), ["1", "2", "3"]);
    assert!(errors.is_empty());
}

#[test]
fn recovers_at_error_production() {
    let g = grammar();
    let table = Config::new().generate_with(&g, &mut Quiet).unwrap();
    let (result, errors) = parse(&g, &table, "1; 2 3; 4;");
    assert_eq!(result.unwrap(), ["1", "<error>", "4"]);

    // The second error inside the recovery window is not reported.
    assert_eq!(errors.len(), 1);
    assert!(errors[0].recoverable);
    assert_eq!(errors[0].token, "NUMBER");
    assert_eq!(errors[0].text, "3");
    assert_eq!(errors[0].expected, ["';'"]);
}

#[test]
fn undeclared_token_goes_through_recovery() {
    let g = grammar();
    for discipline in [
        Discipline::Lr0,
        Discipline::Slr,
        Discipline::Lalr,
        Discipline::Canonical,
    ] {
        let table = Config::new()
            .discipline(discipline)
            .generate_with(&g, &mut Quiet)
            .unwrap();
        // `+` is not a terminal of this grammar.
        let (result, errors) = parse(&g, &table, "1; + 2;");
        assert_eq!(result.unwrap(), ["1", "<error>"], "{}", discipline);

        assert_eq!(errors.len(), 1, "{}", discipline);
        assert!(errors[0].recoverable);
        assert_eq!(errors[0].token, "+");
        assert_eq!(errors[0].text, "+");
        assert!(errors[0].expected.contains(&"'NUMBER'".to_owned()));
    }
}

#[test]
fn error_token_resynchronizes_on_the_next_separator() {
    let g = grammar();
    let table = Config::new().use_canonical().generate_with(&g, &mut Quiet).unwrap();
    let (result, errors) = parse(&g, &table, "; 5;");
    assert_eq!(result.unwrap(), ["<error>", "5"]);
    assert_eq!(errors.len(), 1);
}

#[test]
fn halts_at_end_of_input_while_recovering() {
    let g = grammar();
    let table = Config::new().generate_with(&g, &mut Quiet).unwrap();
    let (result, errors) = parse(&g, &table, "1; 2");
    assert!(matches!(result, Err(Error::Halted(..))), "{:?}", result);
    assert_eq!(errors.len(), 1);
}
