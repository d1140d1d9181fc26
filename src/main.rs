//! Fieldset Replicator CLI
//!
//! Usage:
//!   fieldset-replicator [OPTIONS] [TEMPLATE]
//!
//! Options:
//!   -d, --depth <N>        Nesting depth of the container (overrides config)
//!   -c, --config <FILE>    Container configuration (TOML format)
//!   -n, --add <N>          Number of new instances to materialize
//!   -r, --records <FILE>   JSON array of records to populate from
//!       --rewrite          Print the rewritten template instead of instances
//!       --submission       Print the submission view after materializing
//!   -v, --verbose          Log container operations to stderr
//!   -h, --help             Print help

use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process;

use clap::Parser;
use serde_json::Value;

use fieldset_replicator::{
    populate, AddOutcome, Container, ContainerConfig, Overrides, ReplicateError,
};

#[derive(Parser)]
#[command(name = "fieldset-replicator")]
#[command(about = "Materialize repeatable form fieldsets from a prototype template")]
struct Cli {
    /// Template file (reads from stdin if not provided)
    input: Option<PathBuf>,

    /// Container configuration file (TOML format)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Nesting depth of the container
    #[arg(short, long)]
    depth: Option<usize>,

    /// Number of new instances to add
    #[arg(short = 'n', long = "add", default_value_t = 1)]
    add: usize,

    /// JSON file holding an array of records to populate from
    #[arg(short, long)]
    records: Option<PathBuf>,

    /// Print the rewritten template and its seed index
    #[arg(long)]
    rewrite: bool,

    /// Print the submission view after materializing
    #[arg(long)]
    submission: bool,

    /// Log container operations to stderr
    #[arg(short, long)]
    verbose: bool,
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let mut config = match &cli.config {
        Some(path) => match ContainerConfig::from_file(path) {
            Ok(c) => c,
            Err(e) => {
                eprintln!("Error loading config '{}': {}", path.display(), e);
                process::exit(1);
            }
        },
        None => ContainerConfig::default(),
    };
    if let Some(depth) = cli.depth {
        config = config.with_depth(depth);
    }

    // Read template
    let source = match &cli.input {
        Some(path) => match fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) => {
                eprintln!("Error reading file '{}': {}", path.display(), e);
                process::exit(1);
            }
        },
        None => {
            let mut buffer = String::new();
            match io::stdin().read_to_string(&mut buffer) {
                Ok(_) => buffer,
                Err(e) => {
                    eprintln!("Error reading from stdin: {}", e);
                    process::exit(1);
                }
            }
        }
    };

    let records = match &cli.records {
        Some(path) => match read_records(path) {
            Ok(records) => Some(records),
            Err(message) => {
                eprintln!("Error reading records '{}': {}", path.display(), message);
                process::exit(1);
            }
        },
        None => None,
    };

    let filename = cli
        .input
        .as_ref()
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| "<stdin>".to_string());

    if let Err(e) = run(&cli, config, &source, &filename, records.as_deref()) {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn init_tracing(verbose: bool) {
    let level = if verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::WARN
    };
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .with_writer(io::stderr)
        .init();
}

fn read_records(path: &Path) -> Result<Vec<Value>, String> {
    let content = fs::read_to_string(path).map_err(|e| e.to_string())?;
    match serde_json::from_str::<Value>(&content).map_err(|e| e.to_string())? {
        Value::Array(records) => Ok(records),
        _ => Err("expected a JSON array of records".to_string()),
    }
}

fn run(
    cli: &Cli,
    config: ContainerConfig,
    source: &str,
    filename: &str,
    records: Option<&[Value]>,
) -> Result<(), ReplicateError> {
    let mut container = Container::new(config);
    let template = container.capture(None, source)?.clone();

    for diag in &template.diagnostics {
        eprint!("{}", diag.format(source, filename));
    }

    if cli.rewrite {
        println!("{}", template.rewritten);
        eprintln!(
            "seed index: {} (next index: {})",
            template.seed_index,
            container.peek_index(None).unwrap_or_default()
        );
        return Ok(());
    }

    let instances = match records {
        Some(records) => populate(&mut container, records)?,
        None => {
            let mut added = Vec::with_capacity(cli.add);
            for _ in 0..cli.add {
                match container.add(None, &Overrides::new())? {
                    AddOutcome::Added(instance) => added.push(instance),
                    AddOutcome::Rejected => {
                        eprintln!("Item limit reached after {} instances", added.len());
                        break;
                    }
                }
            }
            added
        }
    };

    for instance in &instances {
        println!("{}", instance.markup);
    }

    if cli.submission {
        for entry in container.instances_for_submission() {
            let path = entry.path.as_deref().unwrap_or("-");
            match entry.destroy_field() {
                Some((field, value)) => println!("{}\tdeleted\t{}={}", path, field, value),
                None => println!("{}\tactive", path),
            }
        }
    }

    Ok(())
}
