//! optresolve - resolve option strings against defaults from the shell.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use optresolve::{
    generate_error_output, generate_json, generate_output_string, parse_sources,
    write_temp_file, Config, OptionsError, ResolvedSet, Source,
};
use std::path::PathBuf;
use tracing::warn;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Resolve option strings and JSON sources against configured defaults.
#[derive(Parser, Debug)]
#[command(name = "optresolve", version, about, disable_help_subcommand = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Resolve options and print them as JSON or shell exports
    Resolve {
        /// JSON configuration (defaults, policy and rules)
        #[arg(long)]
        config: Option<String>,

        /// Environment variable prefix (overrides config)
        #[arg(long)]
        prefix: Option<String>,

        /// Output format
        #[arg(long, value_enum, default_value_t = Format::Json)]
        format: Format,

        /// An option source given as JSON, applied before the strings
        #[arg(long = "json", value_name = "SRC")]
        json_sources: Vec<String>,

        /// Option strings, applied in order
        #[arg(last = true)]
        sources: Vec<String>,
    },

    /// Print the parsed options of the given strings as JSON
    Tokenize {
        /// Option strings, applied in order
        #[arg(last = true)]
        sources: Vec<String>,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum Format {
    /// Pretty JSON on stdout
    Json,
    /// Path of a sourceable file of export statements
    Env,
}

fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("optresolve=warn"));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn load_config(config: Option<&str>) -> Result<Config> {
    let cfg = match config {
        Some(json) => Config::from_json(json).context("failed to parse config JSON")?,
        None => Config::default(),
    };
    cfg.validate().context("invalid config")?;
    Ok(cfg)
}

fn collect_sources(json_sources: &[String], sources: Vec<String>) -> Result<Vec<Source>> {
    let mut collected = Vec::with_capacity(json_sources.len() + sources.len());
    for raw in json_sources {
        let value: serde_json::Value = serde_json::from_str(raw)
            .with_context(|| format!("failed to parse JSON source {raw:?}"))?;
        collected.push(Source::from(value));
    }
    collected.extend(sources.into_iter().map(Source::from));
    Ok(collected)
}

/// Write the exports file, or a sourceable error file when resolution or
/// variable naming fails.
fn write_env_output(
    resolved: Result<ResolvedSet, OptionsError>,
    prefix: &str,
    program: &str,
) -> Result<PathBuf> {
    let message = match resolved {
        Ok(resolved) => match generate_output_string(&resolved, prefix) {
            Ok(content) => {
                return write_temp_file(&content).context("failed to generate output file")
            }
            Err(err) => err.to_string(),
        },
        Err(err) => err.to_string(),
    };

    warn!(error = %message, "option resolution failed");
    generate_error_output(program, &message).context("failed to generate error file")
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Commands::Resolve {
            config,
            prefix,
            format,
            json_sources,
            sources,
        } => {
            let cfg = load_config(config.as_deref())?;
            let effective_prefix = prefix.as_deref().unwrap_or_else(|| cfg.effective_prefix());

            let custom = collect_sources(&json_sources, sources)?;
            let mut options = cfg
                .build_options()
                .context("failed to apply config defaults")?;
            let resolved = options
                .set_options(custom)
                .and_then(|options| options.all().cloned());

            match format {
                Format::Json => {
                    let resolved = resolved.context("failed to resolve options")?;
                    println!("{}", generate_json(&resolved)?);
                }
                Format::Env => {
                    let path =
                        write_env_output(resolved, effective_prefix, cfg.effective_name())?;
                    println!("{}", path.display());
                }
            }
        }
        Commands::Tokenize { sources } => {
            let parsed = parse_sources(sources).context("failed to parse options")?;
            println!("{}", generate_json(&parsed)?);
        }
    }

    Ok(())
}
