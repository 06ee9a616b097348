//! trading-tools: inspect and manage template-keyed result caches.
//!
//! ```bash
//! # Where would `get_markets` for binance/spot be cached?
//! trading-tools path --template '{exchange_name}/{market_type}/' \
//!     --attr exchange_name=binance --attr market_type=spot --name get_markets
//!
//! # Show a stored JSON entry
//! trading-tools inspect ~/.trading-tools/cache/binance/spot/get_markets.json
//!
//! # Force recomputation on the next call
//! trading-tools evict --template '{exchange_name}/' --attr exchange_name=binance --name get_markets
//! ```
//!
//! Relative templates are anchored under `<home>/cache`.

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use trading_tools::cli::{self, EntryFormat, EntryName};
use trading_tools::config::{default_paths, LogConfig, ToolsPaths};
use trading_tools::log::{LogLevel, LogSink};

#[derive(Parser)]
#[command(
    name = "trading-tools",
    author,
    version,
    about = "Inspect and manage template-keyed result caches"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Base directory (cache lives under <home>/cache)
    #[arg(long, global = true, env = "TRADING_TOOLS_HOME")]
    home: Option<PathBuf>,

    /// Append runtime log lines to this file
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,

    /// Runtime log level (debug, info, warning, error)
    #[arg(long, global = true, env = "TRADING_TOOLS_LOG_LEVEL", default_value = "warning")]
    log_level: LogLevel,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the directory a template resolves to
    Resolve(TemplateArgs),
    /// Print the full path of a cache entry
    Path(EntryArgs),
    /// Print the value stored in a JSON cache entry
    Inspect {
        /// Cache entry file
        file: PathBuf,
    },
    /// Delete a cache entry so the next call recomputes it
    Evict(EntryArgs),
}

#[derive(Args)]
struct TemplateArgs {
    /// Path template, e.g. '{exchange_name}/{market_type}/'
    #[arg(long)]
    template: String,

    /// Owner attribute as key=value (repeatable)
    #[arg(long = "attr", value_parser = cli::parse_attr)]
    attrs: Vec<(String, String)>,
}

#[derive(Args)]
struct EntryArgs {
    #[command(flatten)]
    template: TemplateArgs,

    /// Operation name (default filename <name>.<ext>)
    #[arg(long, required_unless_present = "filename", conflicts_with = "filename")]
    name: Option<String>,

    /// Entry format used for the default filename
    #[arg(long, value_enum, default_value_t = EntryFormat::Json)]
    format: EntryFormat,

    /// Explicit filename override
    #[arg(long)]
    filename: Option<String>,
}

impl EntryArgs {
    fn entry(&self) -> EntryName {
        match (&self.filename, &self.name) {
            (Some(file), _) => EntryName::File(file.clone()),
            (None, name) => EntryName::Operation {
                name: name.clone().unwrap_or_default(),
                format: self.format,
            },
        }
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let paths = cli
        .home
        .clone()
        .map(ToolsPaths::from_base)
        .unwrap_or_else(default_paths);

    let log_config = LogConfig {
        enabled: cli.log_file.is_some(),
        path: cli
            .log_file
            .clone()
            .unwrap_or_else(|| paths.logs_dir().join("runtime.log")),
        level: cli.log_level,
    };
    let logger: Arc<dyn LogSink> = log_config.build_logger()?;

    run(cli.command, &paths, logger.as_ref())
}

fn run(command: Commands, paths: &ToolsPaths, logger: &dyn LogSink) -> Result<()> {
    let cache_dir = paths.cache_dir();
    match command {
        Commands::Resolve(args) => {
            let template = cli::anchor_template(&args.template, &cache_dir);
            let attrs = cli::attributes_from_pairs(&args.attrs);
            println!("{}", cli::resolve_dir(&template, &attrs)?.display());
        }
        Commands::Path(args) => {
            let template = cli::anchor_template(&args.template.template, &cache_dir);
            let attrs = cli::attributes_from_pairs(&args.template.attrs);
            println!(
                "{}",
                cli::entry_path(&template, &attrs, &args.entry())?.display()
            );
        }
        Commands::Inspect { file } => {
            let value = cli::inspect(&file)?;
            println!("{}", serde_json::to_string_pretty(&value)?);
        }
        Commands::Evict(args) => {
            let template = cli::anchor_template(&args.template.template, &cache_dir);
            let attrs = cli::attributes_from_pairs(&args.template.attrs);
            let (path, existed) = cli::evict(&template, &attrs, &args.entry())?;
            if existed {
                logger.info(&format!("Evicted cache entry {}", path.display()));
                println!("evicted {}", path.display());
            } else {
                logger.warning(&format!("No cache entry at {}", path.display()));
                println!("absent {}", path.display());
            }
        }
    }
    Ok(())
}
