use crate::lexer::tokens;
use lrtab::{
    diagnostics::Quiet,
    grammar::{Assoc, Grammar},
    table::ParseTable,
    Config, Discipline,
};
use lrtab_runtime::{Actions, Error, Location, Parser, Reduction, Token};

fn grammar() -> Grammar {
    Grammar::define(|g| {
        g.tokens(["NUMBER", "+", "-", "*", "/", "(", ")"]);
        g.operators(Assoc::Left, ["+", "-"]);
        g.operators(Assoc::Left, ["*", "/"]);
        g.operators(Assoc::Right, ["UMINUS"]);
        g.rule("e", ["e", "+", "e"]).action("add");
        g.rule("e", ["e", "-", "e"]).action("sub");
        g.rule("e", ["e", "*", "e"]).action("mul");
        g.rule("e", ["e", "/", "e"]).action("div");
        g.rule("e", ["-", "e"]).action("neg").prec("UMINUS");
        g.rule("e", ["(", "e", ")"]).action("paren");
        g.rule("e", ["NUMBER"]).action("num");
        Ok(())
    })
    .unwrap()
}

fn table(g: &Grammar, discipline: Discipline) -> ParseTable {
    Config::new()
        .discipline(discipline)
        .generate_with(g, &mut Quiet)
        .unwrap()
}

struct Calc<'g> {
    grammar: &'g Grammar,
}

impl Actions for Calc<'_> {
    type Value = f64;
    type Error = String;

    fn shift(&mut self, token: &Token) -> f64 {
        token.text.parse().unwrap_or_default()
    }

    fn reduce(&mut self, production: usize, args: Reduction<'_, f64>) -> Result<f64, String> {
        let label = self
            .grammar
            .productions()
            .get(production)
            .and_then(|p| p.action());
        let v = &args.values;
        match label {
            Some("add") => Ok(v[0] + v[2]),
            Some("sub") => Ok(v[0] - v[2]),
            Some("mul") => Ok(v[0] * v[2]),
            Some("div") if v[2] == 0.0 => Err("division by zero".into()),
            Some("div") => Ok(v[0] / v[2]),
            Some("neg") => Ok(-v[1]),
            Some("paren") => Ok(v[1]),
            _ => Ok(args.into_first().unwrap_or_default()),
        }
    }
}

fn eval(input: &str, discipline: Discipline) -> Result<f64, Error<crate::lexer::LexError, String>> {
    let g = grammar();
    let parser = Parser::new(table(&g, discipline));
    parser.parse(&mut tokens(input), &mut Calc { grammar: &g })
}

#[test]
fn simple_sum() {
    assert_eq!(eval("2 + 3", Discipline::Lalr).unwrap(), 5.0);
}

#[test]
fn disciplines_agree() {
    let cases = [
        ("1 + 2 * 3", 7.0),
        ("(1 + 2) * 3", 9.0),
        ("10 - 4 - 3", 3.0),
        ("-2 * 3", -6.0),
        ("- (2 - 5) / 2", 1.5),
        ("42", 42.0),
    ];
    for discipline in [
        Discipline::Lr0,
        Discipline::Slr,
        Discipline::Lalr,
        Discipline::Canonical,
    ] {
        for (input, expected) in cases {
            assert_eq!(eval(input, discipline).unwrap(), expected, "{} ({})", input, discipline);
        }
    }
}

#[test]
fn on_demand_lookahead_accepts_the_same_input() {
    let g = grammar();
    let table = Config::new()
        .on_demand_lookahead(true)
        .generate_with(&g, &mut Quiet)
        .unwrap();
    let parser = Parser::new(&table);
    let value = parser
        .parse(&mut tokens("(1 + 2) * -3"), &mut Calc { grammar: &g })
        .unwrap();
    assert_eq!(value, -9.0);
    assert!(parser
        .parse(&mut tokens("1 + + 2"), &mut Calc { grammar: &g })
        .is_err());
}

#[test]
fn syntax_error_names_the_token() {
    match eval("1 + * 2", Discipline::Lalr) {
        Err(Error::Syntax(err)) => {
            assert!(!err.recoverable);
            assert_eq!(err.token, "*");
            assert_eq!(err.text, "*");
            assert_eq!(err.line, 0);
            for expected in ["'('", "'-'", "'NUMBER'"] {
                assert!(err.expected.iter().any(|e| e == expected), "{:?}", err.expected);
            }
            assert!(err.message.starts_with("Parse error on line 0: Expecting "));
            assert!(err.message.ends_with(", got '*'"));
        }
        other => panic!("unexpected result: {:?}", other.map(|_| ())),
    }
}

#[test]
fn unexpected_end_of_input() {
    match eval("1 +", Discipline::Lalr) {
        Err(Error::Syntax(err)) => assert_eq!(err.token, "$end"),
        other => panic!("unexpected result: {:?}", other.map(|_| ())),
    }
}

#[test]
fn lexer_and_action_errors() {
    assert!(matches!(eval("1 + $", Discipline::Lalr), Err(Error::Lexer(..))));
    assert!(matches!(
        eval("1 / (2 - 2)", Discipline::Lalr),
        Err(Error::Action(msg)) if msg == "division by zero"
    ));
}

#[test]
fn unresolved_conflicts_are_reported() {
    let g = Grammar::define(|g| {
        g.rule("e", ["e", "+", "e"]);
        g.rule("e", ["NUMBER"]);
        Ok(())
    })
    .unwrap();
    let table = Config::new()
        .no_default_resolve(true)
        .generate_with(&g, &mut Quiet)
        .unwrap();
    let parser = Parser::new(table);
    assert!(matches!(
        parser.parse(&mut tokens("1 + 2 + 3"), &mut Calc { grammar: &g }),
        Err(Error::Ambiguous { .. })
    ));
    assert_eq!(
        parser
            .parse(&mut tokens("1 + 2"), &mut Calc { grammar: &g })
            .unwrap(),
        3.0
    );
}

struct Spans;

impl Actions for Spans {
    type Value = Location;
    type Error = String;

    fn shift(&mut self, token: &Token) -> Location {
        token.loc.clone()
    }

    fn reduce(&mut self, _: usize, args: Reduction<'_, Location>) -> Result<Location, String> {
        Ok(args.loc)
    }
}

#[test]
fn reductions_span_their_phrase() {
    let g = grammar();
    let parser = Parser::new(table(&g, Discipline::Lalr));
    let loc = parser.parse(&mut tokens("1 +\n 2"), &mut Spans).unwrap();
    assert_eq!(loc.first_line, 1);
    assert_eq!(loc.last_line, 2);
    assert_eq!(loc.first_column, 0);
    assert_eq!(loc.last_column, 2);
    assert_eq!(loc.range, Some((0, 6)));
}
