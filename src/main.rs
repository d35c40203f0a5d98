use std::fs::read_to_string;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::Level;

use methodopt::config::OptimizationConfig;
use methodopt::frontend::parse;
use methodopt::optimizations::{propagate_constants, BytecodeOptimizationPass};
use methodopt::semantics::analyze;

#[derive(Parser)]
#[clap(about, version, author)]
struct Args {
    /// The file to optimize
    #[clap(short, long)]
    target: PathBuf,

    /// TOML file with pipeline switches
    #[clap(short, long)]
    config: Option<PathBuf>,

    /// Remove stores of constants into slots that are never read
    #[clap(long, value_name = "BOOL", parse(try_from_str))]
    remove_unused_stores: Option<bool>,

    /// Rotate while-loops so the test sits at the bottom
    #[clap(long, value_name = "BOOL", parse(try_from_str))]
    invert_loops: Option<bool>,

    /// Log more (repeat for more detail)
    #[clap(short, long, parse(from_occurrences))]
    verbose: u64,
}

fn log_level(verbose: u64) -> Level {
    match verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_max_level(log_level(args.verbose))
        .init();

    let config = match &args.config {
        Some(path) => OptimizationConfig::load(path)?,
        None => OptimizationConfig::default(),
    }
    .with_overrides(args.remove_unused_stores, args.invert_loops);

    let contents = read_to_string(&args.target).context("unable to open source file")?;
    let exprs = parse(&contents)?;
    let mut program = analyze(&exprs)?;

    let pass = BytecodeOptimizationPass::new(config);
    for method in &mut program.methods {
        pass.transform(method)
            .with_context(|| format!("failed to optimize {}", method.qualified_name()))?;
    }
    for func in &mut program.funcs {
        propagate_constants(func);
    }

    print!("{}", program);
    Ok(())
}
