mod grammar_file;

use crate::grammar_file::GrammarFile;
use anyhow::Context as _;
use clap::Parser;
use lrtab::{
    diagnostics::{Diagnostics, Quiet, TracingDiagnostics},
    grammar::Grammar,
    ll1::LlTable,
    Config, Discipline,
};
use std::{fs, path::PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// The path of the JSON grammar description.
    input: PathBuf,

    /// The parsing discipline: lr0, slr, lalr, lr or ll.
    #[arg(short = 'p', long, default_value = "lalr")]
    discipline: Discipline,

    /// Dump the grammar and every conflict resolution instead of warning
    /// about conflicts.
    #[arg(long)]
    debug: bool,

    /// Compute LALR lookaheads for inadequate states only.
    #[arg(long)]
    on_demand: bool,

    /// Keep every action of a conflict that only a default rule would resolve.
    #[arg(long)]
    no_default_resolve: bool,

    /// Dump the item sets of the automaton.
    #[arg(long)]
    dump_automaton: bool,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    tracing::trace!("CLI args = {:?}", args);

    let source = fs::read_to_string(&args.input)
        .with_context(|| format!("failed to read {}", args.input.display()))?;
    let file: GrammarFile =
        serde_json::from_str(&source).context("failed to parse the grammar description")?;
    let grammar = Grammar::define(|g| file.define(g)).context("invalid grammar")?;

    for warning in grammar.warnings() {
        println!("[warning] {}", warning);
    }
    if args.debug {
        println!("{}", grammar);
    }

    if args.discipline == Discipline::Ll {
        let table = LlTable::build(&grammar);
        print!("{}", table.display(&grammar));
        report_conflicts(table.conflicts);
        return Ok(());
    }

    let mut config = Config::new();
    config
        .discipline(args.discipline)
        .on_demand_lookahead(args.on_demand)
        .no_default_resolve(args.no_default_resolve);

    let automaton = config.automaton(&grammar)?;
    if args.dump_automaton {
        print!("{}", automaton.display(&grammar));
    }

    let (mut quiet, mut warnings) = (Quiet, TracingDiagnostics);
    let diagnostics: &mut dyn Diagnostics = if args.debug {
        &mut quiet
    } else {
        &mut warnings
    };
    let table = config.table(&grammar, &automaton, diagnostics)?;

    if args.debug {
        println!("## resolutions");
        for resolution in &table.resolutions {
            println!("{}", resolution.display(&grammar));
        }
    }
    print!("{}", table.display(&grammar));
    report_conflicts(table.conflict_count());

    Ok(())
}

fn report_conflicts(count: usize) {
    if count > 0 {
        let suffix = if count == 1 { "" } else { "s" };
        println!("[warning] The table has {} conflict{}.", count, suffix);
    }
}
