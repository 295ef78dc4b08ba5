use std::fs;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use modmap::{LayoutConfig, RawGraph, SizeMetric, Viewport, build_indexes, lookup};

#[derive(Debug, Parser)]
#[command(author, version, about)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Lay out a module graph and write nodes, links and import indexes as JSON
    Layout(LayoutArgs),
    /// Show what a module imports and what imports it
    Lookup(LookupArgs),
    /// List the heaviest modules
    Top(TopArgs),
}

#[derive(Debug, Args)]
struct LayoutArgs {
    /// Graph JSON (`{"nodes": {...}, "links": [...]}`), `-` for stdin
    input: PathBuf,

    #[arg(long, default_value_t = 800.0)]
    width: f64,

    #[arg(long, default_value_t = 600.0)]
    height: f64,

    /// TOML file overriding layout tunables
    #[arg(long)]
    config: Option<PathBuf>,

    /// Simulation steps, overrides the config file
    #[arg(long)]
    iterations: Option<usize>,

    /// Weight used for circle sizes: rendered, gzip or brotli
    #[arg(long)]
    metric: Option<SizeMetric>,

    /// Output file (defaults to stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    #[arg(long)]
    pretty: bool,
}

#[derive(Debug, Args)]
struct LookupArgs {
    input: PathBuf,

    /// Module uid or a fuzzy fragment of its id
    query: String,

    #[arg(long, default_value_t = 3)]
    limit: usize,
}

#[derive(Debug, Args)]
struct TopArgs {
    input: PathBuf,

    #[arg(long, default_value = "rendered")]
    metric: SizeMetric,

    #[arg(long, default_value_t = 20)]
    limit: usize,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_env("MODMAP_LOG").unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .with_target(false)
        .init();

    match Cli::parse().command {
        Command::Layout(args) => run_layout(args),
        Command::Lookup(args) => run_lookup(args),
        Command::Top(args) => run_top(args),
    }
}

fn read_graph(path: &Path) -> Result<RawGraph> {
    let raw = if path == Path::new("-") {
        let mut raw = String::new();
        io::stdin()
            .read_to_string(&mut raw)
            .context("failed to read graph from stdin")?;
        raw
    } else {
        fs::read_to_string(path)
            .with_context(|| format!("failed to read graph from {}", path.display()))?
    };

    serde_json::from_str(&raw).context("invalid graph JSON")
}

fn run_layout(args: LayoutArgs) -> Result<()> {
    let graph = read_graph(&args.input)?;

    let mut config = match &args.config {
        Some(path) => LayoutConfig::load(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => LayoutConfig::default(),
    };
    if let Some(iterations) = args.iterations {
        config.iterations = iterations;
    }
    if let Some(metric) = args.metric {
        config.metric = metric;
    }

    let viewport = Viewport::new(args.width, args.height)?;
    let output = modmap::run(&graph, viewport, &config)?;

    let json = if args.pretty {
        serde_json::to_string_pretty(&output)
    } else {
        serde_json::to_string(&output)
    }
    .context("failed to serialize layout")?;

    match &args.output {
        Some(path) => fs::write(path, json)
            .with_context(|| format!("failed to write layout to {}", path.display()))?,
        None => {
            let mut stdout = io::stdout().lock();
            writeln!(stdout, "{json}").context("failed to write layout to stdout")?;
        }
    }

    Ok(())
}

fn run_lookup(args: LookupArgs) -> Result<()> {
    let graph = read_graph(&args.input)?;
    let indexes = build_indexes(&graph)?;

    let matches = lookup::find_modules(&graph, &args.query, args.limit);
    if matches.is_empty() {
        bail!("no module matches `{}`", args.query);
    }

    let mut stdout = io::stdout().lock();
    for found in matches {
        let Some(summary) = lookup::describe(&graph, &indexes, found.uid) else {
            continue;
        };

        writeln!(
            stdout,
            "{} [{}] {}",
            summary.node.id, summary.uid, summary.node.rendered_length
        )?;
        writeln!(stdout, "  imported by ({}):", summary.imported_by.len())?;
        for entry in &summary.imported_by {
            writeln!(stdout, "    {}", entry.node.id)?;
        }
        writeln!(stdout, "  imports ({}):", summary.imports.len())?;
        for entry in &summary.imports {
            writeln!(stdout, "    {}", entry.node.id)?;
        }
    }

    Ok(())
}

fn run_top(args: TopArgs) -> Result<()> {
    let graph = read_graph(&args.input)?;

    let mut stdout = io::stdout().lock();
    for uid in graph.top_by_metric(args.metric, args.limit) {
        let node = &graph.nodes[uid];
        writeln!(
            stdout,
            "{:>12}  {}",
            node.metric(args.metric),
            node.id
        )?;
    }

    Ok(())
}
