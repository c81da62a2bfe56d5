use anyhow::{Context, Result};
use clap::Parser;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Instant;
use tracing::info;

use deptree::core::package::parse_ignore_list;
use deptree::core::{DependencyAnalyzer, GoEnv, GoLocator, PackageScanner, ResolveOptions};
use deptree::formatters::{
    write_unresolved, DotFormatter, GraphFormatter, JsonGraphFormatter, ListFormatter,
};
use deptree::logging::init_logger;

#[derive(Debug, Clone, Parser)]
#[command(
    name = "deptree",
    version,
    author = "deptree developers",
    about = "Import-dependency graph of every Go package under a directory"
)]
struct Cli {
    /// Directory to scan
    #[arg(short, long, value_name = "PATH", default_value = ".")]
    input: PathBuf,

    /// Write the output here instead of stdout
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Comma-separated import names to ignore; a trailing `*` matches by prefix
    #[arg(long, value_name = "PATTERNS", default_value = "")]
    ignore: String,

    /// Render GraphViz DOT
    #[arg(long, conflicts_with = "list")]
    dot: bool,

    /// Render a sorted list of package names
    #[arg(long)]
    list: bool,

    /// Keep standard library packages as leaf nodes
    #[arg(long)]
    std: bool,

    /// Include test imports of the scanned packages
    #[arg(long)]
    test: bool,

    /// Stop expanding imports below this depth
    #[arg(long, value_name = "N")]
    max_depth: Option<usize>,

    /// Do not look for packages more than N directories below the input
    #[arg(long, value_name = "N")]
    walk_depth: Option<usize>,

    /// Pretty-print JSON output
    #[arg(long)]
    pretty: bool,

    /// Debug logging
    #[arg(short, long, conflicts_with = "quiet")]
    verbose: bool,

    /// Only log errors
    #[arg(short, long)]
    quiet: bool,
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    init_logger(cli.verbose, cli.quiet);
    run(cli)
}

fn run(cli: Cli) -> Result<ExitCode> {
    let start_time = Instant::now();

    let locator = GoLocator::new(GoEnv::from_env())?;
    let options = ResolveOptions {
        include_builtin: cli.std,
        include_tests: cli.test,
        max_depth: cli.max_depth,
    };
    let mut scanner = PackageScanner::new();
    if let Some(depth) = cli.walk_depth {
        scanner = scanner.with_max_depth(depth);
    }
    let report = DependencyAnalyzer::new(&locator)
        .with_scanner(scanner)
        .with_ignore_patterns(parse_ignore_list(&cli.ignore))
        .with_options(options)
        .resolve_tree(&cli.input)
        .with_context(|| format!("scan of {} could not start", cli.input.display()))?;

    info!(
        nodes = report.graph.node_count(),
        edges = report.graph.edge_count(),
        directories = locator.directories_read(),
        elapsed_ms = start_time.elapsed().as_millis() as u64,
        "analysis complete"
    );

    let formatter: Box<dyn GraphFormatter> = if cli.dot {
        Box::new(DotFormatter::new())
    } else if cli.list {
        Box::new(ListFormatter::new())
    } else {
        Box::new(JsonGraphFormatter::new().with_pretty(cli.pretty))
    };

    let stdout = io::stdout();
    let mut console = BufWriter::new(stdout.lock());

    match &cli.output {
        Some(path) => {
            let mut file = BufWriter::new(
                File::create(path).with_context(|| format!("creating {}", path.display()))?,
            );
            formatter.format_to_writer(&report.graph, &mut file)?;
            file.flush()?;
        }
        None => formatter.format_to_writer(&report.graph, &mut console)?,
    }

    if report.is_complete() {
        console.flush()?;
        return Ok(ExitCode::SUCCESS);
    }

    write_unresolved(&report.unresolved, &mut console)?;
    console.flush()?;
    Ok(ExitCode::FAILURE)
}
