//! Grammar definitions for integration tests and benchmarks.

#![allow(dead_code)]

use lrtab::grammar::{Assoc, GrammarDef, GrammarError};

pub type Define = fn(&mut GrammarDef) -> Result<(), GrammarError>;

pub fn arithmetic(g: &mut GrammarDef) -> Result<(), GrammarError> {
    g.operators(Assoc::Left, ["+"]);
    g.rule("E", ["E", "+", "E"]).action("$$ = $1 + $3");
    g.rule("E", ["NUMBER"]).action("$$ = Number(yytext)");
    Ok(())
}

pub fn arithmetic_prec(g: &mut GrammarDef) -> Result<(), GrammarError> {
    g.tokens(["NUM", "+", "-", "*", "/", "^", "(", ")"]);
    g.operators(Assoc::Left, ["+", "-"]);
    g.operators(Assoc::Left, ["*", "/"]);
    g.operators(Assoc::Right, ["^"]);
    g.operators(Assoc::Right, ["UMINUS"]);

    g.rule("expr", ["expr", "+", "expr"]);
    g.rule("expr", ["expr", "-", "expr"]);
    g.rule("expr", ["expr", "*", "expr"]);
    g.rule("expr", ["expr", "/", "expr"]);
    g.rule("expr", ["expr", "^", "expr"]);
    g.rule("expr", ["-", "expr"]).prec("UMINUS");
    g.rule("expr", ["(", "expr", ")"]);
    g.rule("expr", ["NUM"]);
    Ok(())
}

pub fn g1(g: &mut GrammarDef) -> Result<(), GrammarError> {
    g.rule("E", ["E", "PLUS", "T"]);
    g.rule("E", ["T"]);
    g.rule("T", ["T", "STAR", "A"]);
    g.rule("T", ["A"]);
    Ok(())
}

/// LALR(1) but not SLR(1).
pub fn pointers(g: &mut GrammarDef) -> Result<(), GrammarError> {
    g.rule("S", ["L", "=", "R"]);
    g.rule("S", ["R"]);
    g.rule("L", ["*", "R"]);
    g.rule("L", ["id"]);
    g.rule("R", ["L"]);
    Ok(())
}

pub fn dragon(g: &mut GrammarDef) -> Result<(), GrammarError> {
    g.rule("S", ["C", "C"]);
    g.rule("C", ["c", "C"]);
    g.rule("C", ["d"]);
    Ok(())
}

/// LR(1) but not LALR(1).
pub fn lr1_only(g: &mut GrammarDef) -> Result<(), GrammarError> {
    g.rule("S", ["a", "E", "c"]);
    g.rule("S", ["a", "F", "d"]);
    g.rule("S", ["b", "F", "c"]);
    g.rule("S", ["b", "E", "d"]);
    g.rule("E", ["e"]);
    g.rule("F", ["e"]);
    Ok(())
}

pub fn nullable_list(g: &mut GrammarDef) -> Result<(), GrammarError> {
    g.rule("program", ["stmts"]);
    g.rule("stmts", ["stmts", "stmt"]);
    g.rule("stmts", Vec::<&str>::new());
    g.rule("stmt", ["ID", "opt_args", ";"]);
    g.rule("opt_args", ["(", ")"]);
    g.rule("opt_args", Vec::<&str>::new());
    Ok(())
}

pub fn recovery(g: &mut GrammarDef) -> Result<(), GrammarError> {
    g.rule("lines", ["lines", "line"]);
    g.rule("lines", ["line"]);
    g.rule("line", ["NUMBER", ";"]);
    g.rule("line", ["error", ";"]);
    Ok(())
}

pub fn json(g: &mut GrammarDef) -> Result<(), GrammarError> {
    g.rule("value", ["object"]);
    g.rule("value", ["array"]);
    g.rule("value", ["STRING"]);
    g.rule("value", ["NUMBER"]);
    g.rule("value", ["true"]);
    g.rule("value", ["false"]);
    g.rule("value", ["null"]);
    g.rule("object", ["{", "}"]);
    g.rule("object", ["{", "members", "}"]);
    g.rule("members", ["pair"]);
    g.rule("members", ["members", ",", "pair"]);
    g.rule("pair", ["STRING", ":", "value"]);
    g.rule("array", ["[", "]"]);
    g.rule("array", ["[", "elements", "]"]);
    g.rule("elements", ["value"]);
    g.rule("elements", ["elements", ",", "value"]);
    Ok(())
}

/// A reduced expression language in the spirit of MinCaml.
pub fn min_caml(g: &mut GrammarDef) -> Result<(), GrammarError> {
    g.operators(Assoc::Right, ["prec_let"]);
    g.operators(Assoc::Right, [";"]);
    g.operators(Assoc::Right, ["prec_if"]);
    g.operators(Assoc::Right, ["<-"]);
    g.operators(Assoc::Left, [","]);
    g.operators(Assoc::Left, ["=", "<>", "<", ">", "<=", ">="]);
    g.operators(Assoc::Left, ["+", "-"]);
    g.operators(Assoc::Right, ["prec_unary_minus"]);
    g.operators(Assoc::Left, ["prec_app"]);
    g.start_symbol("exp");

    g.rule("simple_exp", ["(", "exp", ")"]);
    g.rule("simple_exp", ["(", ")"]);
    g.rule("simple_exp", ["BOOL"]);
    g.rule("simple_exp", ["INT"]);
    g.rule("simple_exp", ["IDENT"]);

    g.rule("exp", ["simple_exp"]);
    g.rule("exp", ["NOT", "exp"]).prec("prec_app");
    g.rule("exp", ["-", "exp"]).prec("prec_unary_minus");
    g.rule("exp", ["exp", "+", "exp"]);
    g.rule("exp", ["exp", "-", "exp"]);
    g.rule("exp", ["exp", "=", "exp"]);
    g.rule("exp", ["exp", "<>", "exp"]);
    g.rule("exp", ["exp", "<", "exp"]);
    g.rule("exp", ["exp", ">", "exp"]);
    g.rule("exp", ["exp", "<=", "exp"]);
    g.rule("exp", ["exp", ">=", "exp"]);
    g.rule("exp", ["IF", "exp", "THEN", "exp", "ELSE", "exp"])
        .prec("prec_if");
    g.rule("exp", ["LET", "IDENT", "=", "exp", "IN", "exp"])
        .prec("prec_let");
    g.rule("exp", ["exp", "actual_args"]).prec("prec_app");
    g.rule("exp", ["exp", ";", "exp"]);

    g.rule("actual_args", ["actual_args", "simple_exp"])
        .prec("prec_app");
    g.rule("actual_args", ["simple_exp"]).prec("prec_app");
    Ok(())
}

pub const ALL: &[(&str, Define)] = &[
    ("arithmetic", arithmetic),
    ("arithmetic_prec", arithmetic_prec),
    ("g1", g1),
    ("pointers", pointers),
    ("dragon", dragon),
    ("lr1_only", lr1_only),
    ("nullable_list", nullable_list),
    ("recovery", recovery),
    ("json", json),
    ("min_caml", min_caml),
];
