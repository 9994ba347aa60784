//! deepmem: command-line front-end for the memory store.
//!
//! Parses arguments into store options, runs one operation, prints the result.

mod output;

use anyhow::{Context, Result, bail};
use camino::Utf8PathBuf;
use clap::{Parser, Subcommand, ValueEnum};
use deepmem_core::{
    Export, Filter, ImportOptions, ImportSource, ListOptions, MemoryStore, Metadata, NewRecord,
    RecordPatch, SearchOptions, SortOrder, StoreConfig,
};
use serde_json::json;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

/// Environment variable holding the log filter (e.g. `debug`).
const LOG_ENV: &str = "DEEPMEM_LOG";

#[derive(Parser)]
#[command(name = "deepmem", version, about = "DeepMem - memory store for AI agents")]
struct Cli {
    /// Storage file path (default: $DEEPMEM_STORAGE or ~/.deepmem/memories.json)
    #[arg(short, long, global = true)]
    storage: Option<String>,

    /// Print JSON instead of text
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Add a new memory
    Add {
        /// Memory content
        #[arg(required = true, num_args = 1..)]
        content: Vec<String>,

        /// Comma-separated tags
        #[arg(short, long)]
        tags: Option<String>,

        /// Category (default: general)
        #[arg(short, long)]
        category: Option<String>,

        /// Importance 1-10 (default: 5)
        #[arg(short, long, allow_negative_numbers = true)]
        importance: Option<i64>,

        /// Metadata entry as key=value (value parsed as JSON when possible)
        #[arg(long = "meta")]
        meta: Vec<String>,
    },

    /// Get a memory by ID
    Get { id: String },

    /// Update a memory
    Update {
        id: String,

        /// New content
        #[arg(long)]
        content: Option<String>,

        /// New tags (comma-separated)
        #[arg(short, long)]
        tags: Option<String>,

        /// New category
        #[arg(short, long)]
        category: Option<String>,

        /// New importance
        #[arg(short, long, allow_negative_numbers = true)]
        importance: Option<i64>,

        /// Metadata entry to merge, as key=value
        #[arg(long = "meta")]
        meta: Vec<String>,
    },

    /// Delete a memory
    Delete { id: String },

    /// Search memories
    Search {
        /// Search words
        #[arg(required = true, num_args = 1..)]
        query: Vec<String>,

        #[command(flatten)]
        filter: FilterArgs,

        /// Maximum results
        #[arg(short, long, default_value_t = deepmem_core::query::DEFAULT_SEARCH_LIMIT)]
        limit: usize,
    },

    /// List memories
    List {
        #[command(flatten)]
        filter: FilterArgs,

        /// Sort order
        #[arg(long, value_enum, default_value_t = SortArg::Created)]
        sort: SortArg,

        /// Maximum results
        #[arg(short, long, default_value_t = deepmem_core::query::DEFAULT_LIST_LIMIT)]
        limit: usize,
    },

    /// List all tags
    Tags,

    /// List all categories
    Categories,

    /// Show statistics
    Stats,

    /// Export memories to JSON (stdout when no file is given)
    Export { file: Option<String> },

    /// Import memories from a JSON file or inline JSON text
    Import {
        source: String,

        /// Keep existing memories and skip incoming duplicates
        #[arg(long)]
        merge: bool,
    },

    /// Delete all memories
    Clear {
        /// Required to actually clear
        #[arg(short = 'y', long)]
        confirm: bool,
    },
}

#[derive(clap::Args)]
struct FilterArgs {
    /// Filter by category
    #[arg(short, long)]
    category: Option<String>,

    /// Filter by tag
    #[arg(long)]
    tag: Option<String>,

    /// Minimum importance
    #[arg(long, value_parser = clap::value_parser!(u8).range(1..=10))]
    min_importance: Option<u8>,
}

impl From<FilterArgs> for Filter {
    fn from(args: FilterArgs) -> Self {
        Filter {
            category: args.category,
            tag: args.tag,
            min_importance: args.min_importance,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum SortArg {
    Created,
    Importance,
}

impl From<SortArg> for SortOrder {
    fn from(arg: SortArg) -> Self {
        match arg {
            SortArg::Created => SortOrder::Created,
            SortArg::Importance => SortOrder::Importance,
        }
    }
}

fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();

    match run(cli) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn run(cli: Cli) -> Result<ExitCode> {
    let config = cli
        .storage
        .map(StoreConfig::new)
        .unwrap_or_else(StoreConfig::from_env);
    tracing::debug!(path = %config.path, "opening store");
    let mut store = MemoryStore::open(config);
    let json = cli.json;

    match cli.command {
        Command::Add {
            content,
            tags,
            category,
            importance,
            meta,
        } => {
            let options = NewRecord {
                tags: tags.as_deref().map(parse_tags).unwrap_or_default(),
                category,
                importance,
                metadata: parse_meta(&meta)?,
            };
            let record = store.add(content.join(" "), options)?;
            if json {
                output::print_json(&record)?;
            } else {
                println!("Memory added:");
                println!("{}", output::record_detail(&record));
            }
        }

        Command::Get { id } => {
            let Some(record) = store.get(&id) else {
                return Ok(not_found(&id));
            };
            if json {
                output::print_json(record)?;
            } else {
                println!("{}", output::record_detail(record));
            }
        }

        Command::Update {
            id,
            content,
            tags,
            category,
            importance,
            meta,
        } => {
            let patch = RecordPatch {
                content,
                tags: tags.as_deref().map(parse_tags),
                category,
                importance,
                metadata: if meta.is_empty() {
                    None
                } else {
                    Some(parse_meta(&meta)?)
                },
            };
            if patch.is_empty() {
                bail!("nothing to update; pass --content, --tags, --category, --importance or --meta");
            }
            let Some(record) = store.update(&id, patch)? else {
                return Ok(not_found(&id));
            };
            if json {
                output::print_json(&record)?;
            } else {
                println!("Memory updated:");
                println!("{}", output::record_detail(&record));
            }
        }

        Command::Delete { id } => {
            if !store.delete(&id)? {
                return Ok(not_found(&id));
            }
            if json {
                output::print_json(&json!({ "deleted": id }))?;
            } else {
                println!("Memory deleted");
            }
        }

        Command::Search {
            query,
            filter,
            limit,
        } => {
            let options = SearchOptions {
                filter: filter.into(),
                limit,
            };
            let results = store.search(&query.join(" "), &options);
            if json {
                output::print_json(&results)?;
            } else {
                println!("Found {} memories:", results.len());
                for r in &results {
                    println!("{}", output::record_line(r));
                }
            }
        }

        Command::List {
            filter,
            sort,
            limit,
        } => {
            let options = ListOptions {
                filter: filter.into(),
                sort: sort.into(),
                limit,
            };
            let results = store.list(&options);
            if json {
                output::print_json(&results)?;
            } else {
                println!("Total: {} memories", results.len());
                for r in &results {
                    println!("{}", output::record_line(r));
                }
            }
        }

        Command::Tags => print_names("Tags", &store.tags(), json)?,

        Command::Categories => print_names("Categories", &store.categories(), json)?,

        Command::Stats => {
            let stats = store.stats();
            if json {
                output::print_json(&stats)?;
            } else {
                println!("{}", output::stats_report(&stats));
            }
        }

        Command::Export { file } => {
            let path = file.map(Utf8PathBuf::from);
            match store.export(path.as_deref())? {
                Export::Written(path) => {
                    if json {
                        output::print_json(&json!({ "path": path }))?;
                    } else {
                        println!("Exported {} memories to {}", store.len(), path);
                    }
                }
                Export::Text(text) => println!("{text}"),
            }
        }

        Command::Import { source, merge } => {
            let count = store
                .import(ImportSource::detect(&source), ImportOptions { merge })
                .context("import failed")?;
            if json {
                output::print_json(&json!({ "imported": count }))?;
            } else {
                println!("Imported {count} memories");
            }
        }

        Command::Clear { confirm } => {
            if !confirm {
                eprintln!("This will delete ALL memories. Use --confirm or -y to proceed.");
                return Ok(ExitCode::FAILURE);
            }
            let removed = store.clear()?;
            if json {
                output::print_json(&json!({ "cleared": removed }))?;
            } else {
                println!("All memories cleared ({removed} removed)");
            }
        }
    }

    Ok(ExitCode::SUCCESS)
}

fn not_found(id: &str) -> ExitCode {
    eprintln!("Memory not found: {id}");
    ExitCode::FAILURE
}

fn print_names(label: &str, names: &[String], json: bool) -> Result<()> {
    if json {
        return output::print_json(names);
    }
    println!("{label} ({}):", names.len());
    for name in names {
        println!("  - {name}");
    }
    Ok(())
}

/// Split a comma-separated tag list, dropping blanks.
fn parse_tags(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

/// Parse `key=value` pairs. Values that are valid JSON keep their type,
/// anything else is stored as a string.
fn parse_meta(entries: &[String]) -> Result<Metadata> {
    let mut metadata = Metadata::new();
    for entry in entries {
        let Some((key, value)) = entry.split_once('=') else {
            bail!("invalid --meta '{entry}': expected key=value");
        };
        let key = key.trim();
        if key.is_empty() {
            bail!("invalid --meta '{entry}': key is empty");
        }
        let value = serde_json::from_str(value)
            .unwrap_or_else(|_| serde_json::Value::String(value.to_string()));
        metadata.insert(key.to_string(), value);
    }
    Ok(metadata)
}
