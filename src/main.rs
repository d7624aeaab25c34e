use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;

use extjs2react::{Codebase, CompilerConfig, PipelineError};

#[derive(Parser)]
#[command(version, about = "Compile Ext.define class trees into ES modules", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// JSON configuration file (camelCase keys)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Source root, overrides `sourceDir`
    #[arg(short, long)]
    source: Option<PathBuf>,

    /// Target root, overrides `targetDir`
    #[arg(short, long)]
    target: Option<PathBuf>,

    /// Unit declaring the framework classes
    #[arg(short, long)]
    framework: Option<PathBuf>,

    /// Cache the resolved codebase under this snapshot id
    #[arg(long)]
    snapshot: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile the source tree into the target root
    Transpile,

    /// Print class names, most referenced first
    ClassNames,

    /// Print method call frequencies
    Calls,
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), PipelineError> {
    let mut config = match &cli.config {
        Some(path) => CompilerConfig::load(path)?,
        None => CompilerConfig::default(),
    };
    if let Some(source) = cli.source {
        config.source_dir = source;
    }
    if let Some(target) = cli.target {
        config.target_dir = target;
    }
    if cli.framework.is_some() {
        config.framework_file = cli.framework;
    }
    if cli.snapshot.is_some() {
        config.snapshot_id = cli.snapshot;
    }
    config.validate()?;

    let codebase = Codebase::load(&config)?;

    match cli.command {
        Commands::Transpile => {
            let (summary, diagnostics) = codebase.transpile(&config.target_dir)?;
            let report = codebase.usage_report(&diagnostics);
            for (tag, count) in report.unrecognized_tags.iter().take(20) {
                log::info!("unrecognized tag {} ({})", tag, count);
            }
            for (prop, count) in report.unrecognized_props.iter().take(20) {
                log::info!("unrecognized prop {} ({})", prop, count);
            }
            for (name, count) in report.property_usage.iter().take(20) {
                log::info!("property {} ({})", name, count);
            }
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }
        Commands::ClassNames => {
            for (name, count) in codebase.registry().class_names_ranked() {
                println!("{:>6}  {}", count, name);
            }
        }
        Commands::Calls => {
            for (call, count) in codebase.registry().method_call_frequencies() {
                println!("{:>6}  {}", count, call);
            }
        }
    }

    Ok(())
}
