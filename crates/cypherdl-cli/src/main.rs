//! cypherdl CLI
//!
//! Offline tooling around the reasoner:
//! - Compiling JSON class expressions to Cypher (or to the pattern IR)
//! - Printing the schema query catalog for a mapping
//! - Printing the effective reasoner configuration

use anyhow::{anyhow, Context, Result};
use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use cypherdl_model::ClassExpression;
use cypherdl_reasoner::{QueryCatalog, QueryId, ReasonerConfig};

#[derive(Parser)]
#[command(name = "cypherdl")]
#[command(
    author,
    version,
    about = "cypherdl: structural DL reasoning over a Cypher property graph"
)]
struct Cli {
    /// Increase log verbosity (-v debug, -vv trace). `RUST_LOG` wins when set.
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile a class expression (JSON) to a Cypher instance query.
    ///
    /// Reads the expression from INPUT, or from stdin when INPUT is omitted
    /// or `-`.
    Compile {
        input: Option<PathBuf>,

        #[command(flatten)]
        settings: SettingsArgs,

        /// Name of the returned variable.
        #[arg(long)]
        target: Option<String>,

        /// Print the pattern IR as JSON instead of Cypher.
        #[arg(long)]
        ir: bool,
    },

    /// Print the schema query catalog, or a single template by id.
    Catalog {
        /// Query id, e.g. `sub_classes` (see `catalog --list`).
        id: Option<String>,

        #[command(flatten)]
        settings: SettingsArgs,

        /// Only list the query ids.
        #[arg(long)]
        list: bool,
    },

    /// Print the effective configuration as JSON.
    Config {
        #[command(flatten)]
        settings: SettingsArgs,
    },
}

#[derive(Args, Debug, Clone, Default)]
struct SettingsArgs {
    /// Reasoner configuration file (JSON, every field optional).
    #[arg(long)]
    config: Option<PathBuf>,

    /// Resolve class membership through the subsumption-closure procedure.
    #[arg(long)]
    inference: bool,
}

impl SettingsArgs {
    fn resolve(&self) -> Result<ReasonerConfig> {
        let config = match &self.config {
            Some(path) => load_config(path)?,
            None => ReasonerConfig::default(),
        };
        // The flag only ever switches inference on.
        let inference = config.inference || self.inference;
        Ok(config.with_inference(inference))
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Compile {
            input,
            settings,
            target,
            ir,
        } => cmd_compile(input.as_deref(), &settings, target.as_deref(), ir),
        Commands::Catalog { id, settings, list } => cmd_catalog(id.as_deref(), &settings, list),
        Commands::Config { settings } => cmd_config(&settings),
    }
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

// ============================================================================
// Commands
// ============================================================================

fn cmd_compile(
    input: Option<&Path>,
    settings: &SettingsArgs,
    target: Option<&str>,
    ir: bool,
) -> Result<()> {
    let config = settings.resolve()?;
    let text = read_input(input)?;
    let expression = parse_expression(&text)?;
    debug!(expression = %expression, mode = ?config.mode(), "compiling");

    let output = compile_output(&config, &expression, target, ir)?;
    eprintln!(
        "{} {} ({:?} mode)",
        "Compiled".green().bold(),
        expression.to_string().cyan(),
        config.mode()
    );
    println!("{output}");
    Ok(())
}

fn cmd_catalog(id: Option<&str>, settings: &SettingsArgs, list: bool) -> Result<()> {
    let config = settings.resolve()?;
    let catalog = QueryCatalog::new(&config.schema);

    if list {
        for (id, _) in catalog.iter() {
            println!("{id}");
        }
        return Ok(());
    }

    match id {
        Some(name) => println!("{}", template_for(&catalog, name)?),
        None => {
            for (id, template) in catalog.iter() {
                println!("{}", format!("// {id}").yellow());
                println!("{template}\n");
            }
            eprintln!("{} {} queries", "Catalog:".green().bold(), catalog.len());
        }
    }
    Ok(())
}

fn cmd_config(settings: &SettingsArgs) -> Result<()> {
    let config = settings.resolve()?;
    println!("{}", serde_json::to_string_pretty(&config)?);
    Ok(())
}

// ============================================================================
// Helpers
// ============================================================================

fn load_config(path: &Path) -> Result<ReasonerConfig> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read config {}", path.display()))?;
    ReasonerConfig::from_json_str(&text)
        .with_context(|| format!("invalid config {}", path.display()))
}

fn read_input(input: Option<&Path>) -> Result<String> {
    match input {
        Some(path) if path != Path::new("-") => fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display())),
        _ => {
            let mut text = String::new();
            io::stdin()
                .read_to_string(&mut text)
                .context("failed to read stdin")?;
            Ok(text)
        }
    }
}

fn parse_expression(text: &str) -> Result<ClassExpression> {
    if text.trim().is_empty() {
        return Err(anyhow!("expected a JSON class expression"));
    }
    serde_json::from_str(text).context("invalid class expression")
}

fn compile_output(
    config: &ReasonerConfig,
    expression: &ClassExpression,
    target: Option<&str>,
    ir: bool,
) -> Result<String> {
    let compiler = config.compiler();
    if ir {
        let query = compiler.lower(expression, target)?;
        Ok(serde_json::to_string_pretty(&query)?)
    } else {
        Ok(compiler.compile(expression, target)?)
    }
}

fn template_for<'c>(catalog: &'c QueryCatalog, name: &str) -> Result<&'c str> {
    let id: QueryId = name.parse()?;
    Ok(catalog.get(id)?)
}
