use std::process;
use std::str::FromStr;

use arrow::util::pretty::pretty_format_batches;
use clap::Parser;
use linkage::fixture::{CATEGORIES, LINKS, PRODUCTS};
use linkage::{
    Categories, DanglingPolicy, Error as LinkageError, Links, PairBatch, Products,
    ResolveOptions, Strategy, compare_strategies, resolve,
};
use tracing_subscriber::EnvFilter;

/// Link row pointing "Headphones Delta" at a category that does not exist.
const DANGLING_LINK: (i64, i64) = (4, 999);

/// Which strategies the CLI runs.
#[derive(Clone, Copy, Debug)]
enum Selection {
    Only(Strategy),
    Both,
}

impl FromStr for Selection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().eq_ignore_ascii_case("both") {
            return Ok(Selection::Both);
        }
        s.parse::<Strategy>()
            .map(Selection::Only)
            .map_err(|err| err.to_string())
    }
}

#[derive(Parser, Debug)]
#[command(
    name = "linkage",
    version,
    about = "Resolve product/category pairs for the sample catalog"
)]
struct Cli {
    /// Strategy to run: `left-join`, `union-anti`, or `both` to run the two
    /// and compare them.
    #[arg(long, default_value = "both")]
    strategy: Selection,

    /// Treatment of links to missing categories in the union strategy.
    #[arg(long, default_value_t = DanglingPolicy::Drop)]
    dangling: DanglingPolicy,

    /// Maximum rows per join output batch.
    #[arg(long, default_value_t = ResolveOptions::default().batch_size, value_parser = parse_batch_size)]
    batch_size: usize,

    /// Add a link from "Headphones Delta" to a missing category.
    #[arg(long)]
    with_dangling_link: bool,

    /// Reject duplicate product or category ids.
    #[arg(long)]
    validate_keys: bool,
}

fn parse_batch_size(value: &str) -> Result<usize, String> {
    let parsed = value
        .parse::<usize>()
        .map_err(|err| format!("invalid batch size '{value}': {err}"))?;
    if parsed == 0 {
        return Err("batch size must be greater than zero".into());
    }
    Ok(parsed)
}

fn load_catalog(with_dangling_link: bool) -> Result<(Products, Categories, Links), LinkageError> {
    let mut links = LINKS.to_vec();
    if with_dangling_link {
        links.push(DANGLING_LINK);
    }
    Ok((
        Products::from_rows(&PRODUCTS)?,
        Categories::from_rows(&CATEGORIES)?,
        Links::from_rows(&links)?,
    ))
}

fn print_pairs(title: &str, pairs: &PairBatch) -> Result<(), LinkageError> {
    println!("--- {title} ({} rows) ---", pairs.num_rows());
    println!("{}", pretty_format_batches(std::slice::from_ref(pairs.batch()))?);
    Ok(())
}

fn run(cli: &Cli) -> Result<(), LinkageError> {
    let (products, categories, links) = load_catalog(cli.with_dangling_link)?;
    let options = ResolveOptions::default()
        .with_batch_size(cli.batch_size)
        .with_dangling_policy(cli.dangling)
        .with_key_validation(cli.validate_keys);

    tracing::info!(
        products = products.num_rows(),
        categories = categories.num_rows(),
        links = links.num_rows(),
        dangling_policy = %options.dangling,
        "loaded sample catalog"
    );

    match cli.strategy {
        Selection::Only(strategy) => {
            let pairs = resolve(strategy, &products, &categories, &links, &options)?;
            print_pairs(&strategy.to_string(), &pairs)?;
        }
        Selection::Both => {
            let comparison = compare_strategies(&products, &categories, &links, &options)?;
            print_pairs(&Strategy::LeftJoin.to_string(), &comparison.left_join)?;
            println!();
            print_pairs(&Strategy::UnionAnti.to_string(), &comparison.union_anti)?;
            println!();

            if comparison.is_equivalent() {
                println!("strategies agree");
            } else {
                println!("strategies disagree (dangling policy: {})", options.dangling);
                for pair in &comparison.missing_from_union {
                    println!("  only in {}: {pair}", Strategy::LeftJoin);
                }
                for pair in &comparison.extra_in_union {
                    println!("  only in {}: {pair}", Strategy::UnionAnti);
                }
            }
        }
    }

    Ok(())
}

fn main() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    if let Err(err) = run(&cli) {
        eprintln!("Error: {err}");
        process::exit(1);
    }
}
