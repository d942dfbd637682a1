//! Thin CLI over the registration pipeline.
//!
//! The host installer owns real statement execution; this binary renders the
//! operation plans and the decoded configuration for inspection.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use scriptreg::extract::extract_config;
use scriptreg::plan::{removal_plan, replace_plan};
use scriptreg::schema::{decode_config, ScriptConfig};
use scriptreg::sql::Operation;
use scriptreg::statement::resolve_script_path;
use scriptreg::validate::validate_config;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Parser, Debug)]
#[command(
    name = "scriptreg",
    version,
    about = "Plan script registrations from embedded scriptConfig objects"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print the replace plan for a script file
    Plan(PlanArgs),
    /// Print the removal plan for a script name
    Remove(RemoveArgs),
    /// Extract, decode and validate the embedded configuration
    Config(ConfigArgs),
}

#[derive(Parser, Debug)]
struct PlanArgs {
    /// Path to the script file
    #[arg(long)]
    path: PathBuf,

    /// Scripting language recorded on the script record
    #[arg(long)]
    language: Option<String>,

    /// Fallback directory for resolving the script path
    #[arg(long, value_name = "DIR")]
    base_dir: Option<PathBuf>,

    /// Emit operations as JSON instead of SQL text
    #[arg(long)]
    json: bool,
}

#[derive(Parser, Debug)]
struct RemoveArgs {
    /// Script name to remove
    #[arg(long)]
    script: String,

    /// Emit operations as JSON instead of SQL text
    #[arg(long)]
    json: bool,
}

#[derive(Parser, Debug)]
struct ConfigArgs {
    /// Path to the script file
    #[arg(long)]
    path: PathBuf,

    /// Fallback directory for resolving the script path
    #[arg(long, value_name = "DIR")]
    base_dir: Option<PathBuf>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Plan(args) => cmd_plan(args),
        Commands::Remove(args) => cmd_remove(args),
        Commands::Config(args) => cmd_config(args),
    }
}

fn cmd_plan(args: PlanArgs) -> Result<()> {
    let (config, source) = load_config(&args.path, args.base_dir.as_deref())?;
    let ops = replace_plan(&config, &source, args.language.as_deref());
    print_ops(&ops, args.json)
}

fn cmd_remove(args: RemoveArgs) -> Result<()> {
    let ops = removal_plan(&args.script);
    print_ops(&ops, args.json)
}

fn cmd_config(args: ConfigArgs) -> Result<()> {
    let (config, _source) = load_config(&args.path, args.base_dir.as_deref())?;
    println!("{}", serde_json::to_string_pretty(&config)?);
    Ok(())
}

fn load_config(path: &Path, base_dir: Option<&Path>) -> Result<(ScriptConfig, String)> {
    let base = base_dir.unwrap_or(Path::new("."));
    let path = path.to_str().context("script path is not valid UTF-8")?;
    let resolved = resolve_script_path(path, base)?;
    let source = fs::read_to_string(&resolved)
        .with_context(|| format!("read {}", resolved.display()))?;
    let object = extract_config(&source)?;
    let config = decode_config(object)?;
    validate_config(&config)?;
    Ok((config, source))
}

fn print_ops(ops: &[Operation], json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(ops)?);
    } else {
        for op in ops {
            println!("{op};");
        }
    }
    Ok(())
}
