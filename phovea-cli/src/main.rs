use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde_json::json;

use phovea_core::config::CONFIG_PATH_ENV;
use phovea_core::{AppContext, Config, Range, Range1D, SliceSpec};

#[derive(Debug, Subcommand)]
pub enum IdsCommand {
    /// Assigns indices to the given ids, allocating new ones for unseen ids
    Assign {
        idtype: String,
        #[clap(required = true)]
        ids: Vec<String>,
    },
    /// Resolves the indices selected by a range back to ids
    Unmap { idtype: String, range: String },
    /// Case-insensitive substring search over the known ids
    Search {
        idtype: String,
        query: String,
        /// Maximum number of hits, defaults to `search_limit` from the config
        #[clap(long)]
        limit: Option<usize>,
    },
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Parses a multi-dimensional range and prints its canonical form per dimension
    Parse { range: String },
    /// Compresses a list of indices into a range
    Compress {
        #[clap(required = true, allow_negative_numbers = true)]
        values: Vec<i64>,
    },
    /// Expands a range into the indices it selects
    Expand {
        range: String,
        /// Size of every dimension, e.g. `10,4`. Needed for ranges counting from the end
        #[clap(long, value_delimiter = ',')]
        shape: Vec<i64>,
    },
    /// Lowers every dimension of a range to a slice or an index list
    Slice {
        range: String,
        /// Size of every dimension, e.g. `10,4`
        #[clap(long, value_delimiter = ',')]
        shape: Vec<i64>,
    },
    /// Identifier assignment through the configured assigner
    Ids {
        #[clap(subcommand)]
        command: IdsCommand,
    },
}

#[derive(Parser)]
#[clap(version, author, about, subcommand_negates_reqs = true)]
pub struct Cli {
    /// Output results as JSON
    #[clap(long, global = true)]
    pub json: bool,

    #[clap(subcommand)]
    pub command: Command,
}

fn load_context() -> Result<AppContext> {
    let current_dir = std::env::current_dir()?;
    let config = match Config::find(&current_dir) {
        Some(config) => config.with_context(|| {
            format!("Failed to read config (set {CONFIG_PATH_ENV} to use another file)")
        })?,
        None => {
            log::debug!("No config found from {}, using defaults", current_dir.display());
            Config::default()
        }
    };
    AppContext::from_config(config)
}

/// Indices selected by every dimension of `range` within `shape`.
fn expand(range: &Range, shape: &[i64]) -> Result<Vec<Vec<i64>>> {
    let ndim = range.ndim().max(shape.len());
    (0..ndim)
        .map(|i| {
            range
                .dim(i)
                .to_vec(shape.get(i).copied())
                .with_context(|| format!("Failed to expand dimension {i}"))
        })
        .collect()
}

fn join(values: &[i64]) -> String {
    values
        .iter()
        .map(i64::to_string)
        .collect::<Vec<_>>()
        .join(" ")
}

fn describe(spec: &SliceSpec) -> String {
    match spec {
        SliceSpec::Slice { start, stop, step } => {
            let stop = stop.map(|v| v.to_string()).unwrap_or_else(|| "-".to_string());
            format!("slice {start} {stop} {step}")
        }
        SliceSpec::Indices(indices) => format!("indices {}", join(indices)),
    }
}

fn run_ids(command: IdsCommand, json: bool) -> Result<()> {
    let ctx = load_context()?;
    let assigner = ctx.assigner();

    match command {
        IdsCommand::Assign { idtype, ids } => {
            let uids = assigner.assign(&ids, &idtype)?;
            if json {
                println!("{}", serde_json::to_string(&uids)?);
            } else {
                for (uid, id) in uids.iter().zip(&ids) {
                    println!("{uid}\t{id}");
                }
            }
        }
        IdsCommand::Unmap { idtype, range } => {
            let range = Range1D::parse(&range)?;
            let names = assigner.unmap_range(&range, &idtype)?;
            if json {
                println!("{}", serde_json::to_string(&names)?);
            } else {
                for (uid, name) in range.iter(None)?.zip(names) {
                    println!("{uid}\t{}", name.as_deref().unwrap_or("-"));
                }
            }
        }
        IdsCommand::Search {
            idtype,
            query,
            limit,
        } => {
            let limit = limit.unwrap_or(ctx.config().search_limit());
            let hits = assigner.search(&idtype, &query, Some(limit))?;
            if json {
                println!("{}", serde_json::to_string(&hits)?);
            } else if hits.is_empty() {
                println!("No matches");
            } else {
                for hit in hits {
                    println!("{}\t{}", hit.id, hit.name);
                }
            }
        }
    }
    Ok(())
}

fn try_main() -> Result<()> {
    env_logger::init();

    let cli = Cli::parse();

    match cli.command {
        Command::Parse { range } => {
            let range = Range::parse(&range)?;
            if cli.json {
                println!("{}", json!({"range": range, "dims": range.dims()}));
            } else if range.is_all() {
                println!("all");
            } else {
                for (i, dim) in range.dims().iter().enumerate() {
                    println!("{i}: {dim}");
                }
            }
        }
        Command::Compress { values } => {
            let range = Range1D::from_list(&values);
            if cli.json {
                println!("{}", json!({"range": range}));
            } else {
                println!("{range}");
            }
        }
        Command::Expand { range, shape } => {
            let range = Range::parse(&range)?;
            let indices = expand(&range, &shape)?;
            if cli.json {
                println!("{}", serde_json::to_string(&indices)?);
            } else {
                for dim in indices {
                    println!("{}", join(&dim));
                }
            }
        }
        Command::Slice { range, shape } => {
            let specs = Range::parse(&range)?.asslice(&shape)?;
            if cli.json {
                println!("{}", serde_json::to_string(&specs)?);
            } else {
                for spec in &specs {
                    println!("{}", describe(spec));
                }
            }
        }
        Command::Ids { command } => run_ids(command, cli.json)?,
    }
    Ok(())
}

fn main() {
    if let Err(e) = try_main() {
        eprintln!("{e:?}");
        ::std::process::exit(1)
    }
}
