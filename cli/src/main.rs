use std::process;

use clap::Parser;
use heapscope::dump::{HeapGraph, LabelPolicy};
use heapscope::errors::HeapScopeError;
use heapscope::report::{Report, Summary};
use heapscope::{Inspector, Runtime, snapshot};
use owo_colors::OwoColorize;
use tracing_subscriber::EnvFilter;

mod repl;

#[derive(Parser)]
#[command(
    name = "heapscope",
    about = "Walk a Lua-style heap snapshot and print its labeled object graph"
)]
struct Cli {
    /// Path to a JSON heap snapshot
    snapshot: Option<String>,
    /// Print the report as JSON
    #[arg(long)]
    json: bool,
    /// Keep only the first edge into each object
    #[arg(long)]
    spanning_tree: bool,
    /// Keep the first label when a parent reaches a child twice
    #[arg(long)]
    keep_first_label: bool,
    /// Print per-kind object counts
    #[arg(long)]
    stats: bool,
    /// List heap objects the trace never reached
    #[arg(long)]
    unreached: bool,
    /// Open the interactive graph explorer
    #[arg(long)]
    explore: bool,
    /// Log trace progress to stderr
    #[arg(long)]
    verbose: bool,
    /// Print version and exit
    #[arg(long)]
    version: bool,
}

impl Cli {
    fn inspector(&self) -> Inspector {
        let policy = if self.keep_first_label {
            LabelPolicy::KeepFirst
        } else {
            LabelPolicy::KeepLast
        };
        Inspector::new()
            .with_record_revisits(!self.spanning_tree)
            .with_label_policy(policy)
    }
}

fn main() {
    let cli = Cli::parse();

    if cli.version {
        println!(
            "{} {}",
            "heapscope".bright_cyan().bold(),
            env!("CARGO_PKG_VERSION").bright_black()
        );
        return;
    }

    init_logging(cli.verbose);

    let Some(path) = cli.snapshot.as_deref() else {
        if let Err(err) = repl::run(cli.inspector(), None) {
            eprintln!("{} {err}", "repl error:".red().bold());
            process::exit(1);
        }
        return;
    };

    let (runtime, graph) = match load_and_trace(path, cli.inspector()) {
        Ok(loaded) => loaded,
        Err(err) => {
            eprintln!("{:?}", miette::Report::new(err));
            process::exit(1);
        }
    };

    if cli.explore {
        if let Err(err) = repl::run(cli.inspector(), Some((runtime, graph))) {
            eprintln!("{} {err}", "repl error:".red().bold());
            process::exit(1);
        }
        return;
    }

    if cli.json {
        match Report::new(&graph, runtime.heap()).to_json() {
            Ok(json) => println!("{json}"),
            Err(err) => {
                eprintln!("{} {err}", "error:".red().bold());
                process::exit(1);
            }
        }
        return;
    }

    print_edges(&graph);
    if cli.stats {
        print_summary(&Summary::new(&graph, runtime.heap()));
    }
    if cli.unreached {
        print_unreached(&graph, &runtime);
    }
}

fn init_logging(verbose: bool) {
    let fallback = if verbose { "debug" } else { "warn" };
    let filter = if verbose {
        EnvFilter::new(fallback)
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_and_trace(path: &str, inspector: Inspector) -> Result<(Runtime, HeapGraph), HeapScopeError> {
    let runtime = snapshot::load_file(path)?;
    let graph = inspector.inspect(&runtime)?;
    Ok((runtime, graph))
}

pub(crate) fn print_edges(graph: &HeapGraph) {
    for edge in graph.edges() {
        println!(
            "{} {} {} {} {}",
            edge.parent.to_string().cyan(),
            "->".bright_black(),
            edge.child.to_string().cyan(),
            format!(": {}", edge.kind).yellow(),
            format!("{{ {} }}", edge.label).bright_white()
        );
    }
}

pub(crate) fn print_summary(summary: &Summary) {
    println!(
        "{} {} objects, {} edges, {} unreached",
        "summary".bright_blue().bold(),
        summary.objects,
        summary.edges,
        summary.unreached
    );
    for (kind, count) in &summary.by_kind {
        println!("  {} {count}", format!("{:<14}", format!("{kind:?}")).yellow());
    }
}

pub(crate) fn print_unreached(graph: &HeapGraph, runtime: &Runtime) {
    let unreached = graph.unreached(runtime.heap());
    if unreached.is_empty() {
        println!("{}", "every object is reachable".green());
        return;
    }
    for object in unreached {
        let kind = runtime
            .heap()
            .body(object)
            .map(|body| body.kind().to_string())
            .unwrap_or_default();
        println!("{} {}", object.to_string().red(), kind.bright_black());
    }
}
