use anyhow::Context as _;
use clap::{Parser, ValueEnum};
use llgen::{
    codegen::{DefaultGenerator, ExternalTokenizer},
    grammar::Grammar,
    predict::PredictionSets,
    table::{ConflictPolicy, ParsingTable},
};
use llgen_python::PythonAdapter;
use std::{
    ffi::OsString,
    fmt::Write as _,
    fs,
    path::{Path, PathBuf},
    time::Instant,
};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// The language of the generated parser.
    #[arg(long, value_enum, default_value_t = Target::Python)]
    target: Target,

    /// Use the specified template instead of the bundled one.
    #[arg(long)]
    template: Option<PathBuf>,

    /// Use the specified tokenizer instead of the one built from the lexer rules.
    #[arg(long)]
    tokenizer: Option<PathBuf>,

    /// How to handle conflicts in the parsing table.
    #[arg(long, value_enum, default_value_t = Conflicts::Reject)]
    conflicts: Conflicts,

    /// Write the prediction sets and the parsing table to `<INPUT>.table`.
    #[arg(long)]
    dump_table: bool,

    /// Specify the path of generated file.
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// The path of grammar definition file.
    input: PathBuf,
}

#[derive(Debug, Copy, Clone, PartialEq, ValueEnum)]
enum Target {
    Python,
}

#[derive(Debug, Copy, Clone, PartialEq, ValueEnum)]
enum Conflicts {
    Reject,
    PreferFirst,
}

impl From<Conflicts> for ConflictPolicy {
    fn from(conflicts: Conflicts) -> Self {
        match conflicts {
            Conflicts::Reject => ConflictPolicy::Reject,
            Conflicts::PreferFirst => ConflictPolicy::PreferFirst,
        }
    }
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args = Args::parse();
    tracing::debug!("parsed CLI args = {:?}", args);

    process_file(&args)
        .with_context(|| anyhow::anyhow!("errored during processing {}", args.input.display()))?;

    Ok(())
}

fn process_file(args: &Args) -> anyhow::Result<()> {
    let in_file = fs::canonicalize(&args.input) //
        .context("failed to canonicalize the input file name")?;

    let extension = match args.target {
        Target::Python => llgen_python::EXTENSION,
    };
    let out_file = args
        .output
        .clone()
        .unwrap_or_else(|| in_file.with_extension(extension));
    let backup_file = append_extension(&out_file, "bak");
    let table_file = append_extension(&in_file, "table");

    let s = Instant::now();
    let grammar = Grammar::from_file(&in_file)?;
    tracing::info!("parse_file: {:?} elapsed", s.elapsed());

    let mut empty_nonterminals = vec![];
    for nonterminal in grammar.nonterminals() {
        if grammar.productions_of(nonterminal.id()).next().is_none() {
            empty_nonterminals.push(nonterminal.name());
        }
    }
    if !empty_nonterminals.is_empty() {
        println!(
            "[warning] The following nonterminals have no associated production rule: {:?}",
            empty_nonterminals
        );
    }

    let policy = ConflictPolicy::from(args.conflicts);

    if args.dump_table {
        dump_table(&grammar, policy, &table_file)?;
    }

    let mut generator = match args.target {
        Target::Python => {
            let adapter = match args.template {
                Some(ref path) => PythonAdapter::with_template(read_file(path, "template")?),
                None => PythonAdapter::default(),
            };
            DefaultGenerator::new(adapter)
        }
    };
    generator.conflict_policy(policy);
    if let Some(ref path) = args.tokenizer {
        generator.tokenizer(ExternalTokenizer::new(read_file(path, "tokenizer")?));
    }

    let s = Instant::now();
    let generated = generator.generate(&grammar)?;
    tracing::info!("generate: {:?} elapsed", s.elapsed());

    // dump results.
    if out_file.exists() {
        fs::copy(&out_file, &backup_file).with_context(|| {
            anyhow::anyhow!(
                "failed to backup the output file to {}",
                backup_file.display()
            )
        })?;
    }
    fs::write(&out_file, generated).with_context(|| {
        anyhow::anyhow!("failed to write generated parser to {}", out_file.display())
    })?;

    Ok(())
}

fn dump_table(grammar: &Grammar, policy: ConflictPolicy, path: &Path) -> anyhow::Result<()> {
    let mut dump = grammar.to_string();

    match PredictionSets::compute(grammar, policy) {
        Ok(sets) => {
            write!(dump, "\n## prediction sets:\n{}", sets.display(grammar))?;
            match ParsingTable::build(grammar, &sets, policy) {
                Ok(table) => {
                    if !table.resolved_conflicts().is_empty() {
                        println!(
                            "[warning] {} conflict(s) resolved by preferring the first alternative. See {} for details.",
                            table.resolved_conflicts().len(),
                            path.display()
                        );
                    }
                    write!(dump, "\n## parsing table:\n{}", table.display(grammar))?;
                }
                Err(err) => write!(dump, "\n## parsing table:\n[error] {}\n", err)?,
            }
        }
        Err(err) => write!(dump, "\n## prediction sets:\n[error] {}\n", err)?,
    }

    fs::write(path, dump)
        .with_context(|| anyhow::anyhow!("failed to write the table to {}", path.display()))?;

    Ok(())
}

fn read_file(path: &Path, what: &str) -> anyhow::Result<String> {
    fs::read_to_string(path)
        .with_context(|| anyhow::anyhow!("failed to read the {} {}", what, path.display()))
}

// `foo.py` -> `foo.py.bak`
fn append_extension(path: &Path, extension: &str) -> PathBuf {
    let mut path = OsString::from(path);
    path.push(".");
    path.push(extension);
    path.into()
}
