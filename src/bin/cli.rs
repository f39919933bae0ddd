use std::collections::HashMap;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use scene_workflows::prelude::*;
use scene_workflows::workflow::{PRESET_NAMES, DEFAULT_SETTINGS_FILE};
use serde_json::json;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "scene-workflows")]
#[command(about = "Run declarative scene-population workflows", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Workflows directory (overrides the settings file)
    #[arg(short, long, global = true)]
    dir: Option<PathBuf>,

    /// Path to the runner settings file
    #[arg(short, long, global = true, default_value = DEFAULT_SETTINGS_FILE)]
    settings: PathBuf,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// List workflow files in the workflows directory
    List,

    /// Show name, description, task count and config of a workflow
    Info {
        /// Workflow file name, with or without `.json`
        #[arg(value_name = "FILE")]
        file: String,
    },

    /// Build a workflow and check its dependency graph without running it
    Validate {
        #[arg(value_name = "FILE")]
        file: String,
    },

    /// Dry-run a workflow against an in-memory scene
    Run {
        #[arg(value_name = "FILE")]
        file: String,

        /// Use a named preset instead of the workflow's own config
        #[arg(short, long)]
        preset: Option<String>,

        /// Print task results as JSON
        #[arg(long)]
        json: bool,
    },

    /// List the available config presets
    Presets,
}

fn init_tracing(verbose: bool, settings_filter: Option<&str>) {
    let filter = match (std::env::var("RUST_LOG").ok(), settings_filter) {
        (Some(env), _) => EnvFilter::new(env),
        (None, Some(directive)) => EnvFilter::new(directive),
        (None, None) if verbose => EnvFilter::new("scene_workflows=debug"),
        (None, None) => EnvFilter::new("scene_workflows=info"),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let settings = RunnerSettings::load(&cli.settings);
    init_tracing(
        cli.verbose,
        settings
            .as_ref()
            .ok()
            .and_then(|s| s.log_filter.as_deref()),
    );

    let result = match settings {
        Ok(settings) => run(cli, settings).await,
        Err(e) => Err(e.into()),
    };

    match result {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(1),
        Err(e) => {
            tracing::error!(error = %e, "Command failed");
            ExitCode::from(2)
        }
    }
}

async fn run(cli: Cli, settings: RunnerSettings) -> anyhow::Result<bool> {
    let dir = cli.dir.clone().unwrap_or_else(|| settings.workflows_dir.clone());
    let loader = WorkflowLoader::new(dir);

    match cli.command {
        Commands::List => list_workflows(&loader),
        Commands::Info { file } => show_info(&loader, &file),
        Commands::Validate { file } => validate(&loader, &file),
        Commands::Run { file, preset, json } => {
            let preset = preset.or_else(|| settings.preset.clone());
            run_workflow(&loader, &file, preset.as_deref(), json).await
        }
        Commands::Presets => list_presets(),
    }
}

fn list_workflows(loader: &WorkflowLoader) -> anyhow::Result<bool> {
    let files = loader.list_workflows()?;
    if files.is_empty() {
        println!("No workflows found in: {}", loader.workflows_dir().display());
        return Ok(true);
    }

    println!("Workflows in {}:\n", loader.workflows_dir().display());
    for file in &files {
        match loader.get_workflow_info(file) {
            Ok(info) => println!("  {} - {} ({} tasks)", file, info.name, info.task_count),
            Err(e) => println!("  {} - unreadable: {}", file, e),
        }
    }
    Ok(true)
}

fn show_info(loader: &WorkflowLoader, file: &str) -> anyhow::Result<bool> {
    let info = loader.get_workflow_info(file)?;
    println!("Name:        {}", info.name);
    println!("File:        {}", info.file);
    println!("Description: {}", info.description);
    println!("Tasks:       {}", info.task_count);
    println!("Config:      {}", serde_json::to_string_pretty(&info.config)?);
    Ok(true)
}

fn validate(loader: &WorkflowLoader, file: &str) -> anyhow::Result<bool> {
    let workflow = loader.load(file)?;
    let order = workflow.graph.execution_order()?;

    println!("{}", workflow.graph.visualize()?);
    println!("✓ {} is valid ({} tasks)", workflow.name, order.len());
    println!("Order: {}", order.join(" → "));
    Ok(true)
}

async fn run_workflow(
    loader: &WorkflowLoader,
    file: &str,
    preset: Option<&str>,
    as_json: bool,
) -> anyhow::Result<bool> {
    let mut workflow = loader.load(file)?;
    if let Some(name) = preset {
        workflow.config = WorkflowConfig::preset(name)?;
    }

    let name = workflow.name.clone();
    let order = workflow.graph.execution_order()?;
    let scene = Arc::new(MemoryScene::with_essentials());
    let mut executor = workflow.into_executor().with_scene(scene.clone());

    if !as_json {
        println!("Running workflow: {} (dry run)\n", name);
    }
    let results = executor.execute(None).await?;
    let summary = executor.summary();

    if as_json {
        let report = json!({
            "workflow": name,
            "run_id": executor.run_id(),
            "results": results,
            "summary": summary,
            "actors": scene.snapshot(),
        });
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_results(&order, &results);
        println!("\n{}", summary);
        println!("Scene now holds {} actors", scene.actor_count());
    }

    Ok(summary.all_succeeded())
}

fn list_presets() -> anyhow::Result<bool> {
    for name in PRESET_NAMES {
        println!("{:<12} {}", name, WorkflowConfig::preset(name)?);
    }
    Ok(true)
}

fn print_results(order: &[String], results: &HashMap<String, TaskResult>) {
    println!("=== Task Results ===\n");
    for task in order {
        if let Some(result) = results.get(task) {
            println!("  {:<24} {}", task, result);
        }
    }
}
