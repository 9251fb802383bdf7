use clap::Parser;
use colored::Colorize;
use eyre::{Context, Result};
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

mod cli;

use bakeoff::domain::Team;
use bakeoff::evaluator::{Evaluator, MetricBinding};
use bakeoff::judge::Judge;
use bakeoff::llm::{AnthropicClient, AnthropicConfig, LlmClient, LlmMetric, LlmProducer};
use bakeoff::orchestrator::{Orchestrator, TeamEntry};
use bakeoff::store::RankingStore;
use cli::{Cli, RunSpec, render};

fn setup_logging(verbose: bool) -> Result<()> {
    // Logs go to a file; stdout stays clean for the report
    let log_dir = dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("bakeoff")
        .join("logs");

    fs::create_dir_all(&log_dir).context("Failed to create log directory")?;

    let log_file = log_dir.join("bakeoff.log");
    let file = fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_file)
        .context("Failed to open log file")?;

    let default_filter = if verbose { "bakeoff=debug" } else { "bakeoff=info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Arc::new(file))
        .with_ansi(false)
        .init();

    info!(log_file = %log_file.display(), "logging initialized");
    Ok(())
}

fn default_store_path(execution_id: &str) -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("bakeoff")
        .join("runs")
        .join(format!("{execution_id}.db"))
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_logging(cli.verbose)?;

    let mut spec = RunSpec::load(&cli.spec)?;
    if let Some(task) = cli.task.clone() {
        spec.task = task;
    }

    let retry = spec.retry_policy();
    let anthropic_config = match &spec.model {
        Some(model) => AnthropicConfig::with_model(model),
        None => AnthropicConfig::default(),
    };
    let client: Arc<dyn LlmClient> =
        Arc::new(AnthropicClient::new(anthropic_config).context("Failed to build LLM client")?);

    let mut bindings = Vec::with_capacity(spec.metrics.len());
    for metric_spec in &spec.metrics {
        let mut metric = LlmMetric::new(client.clone(), &metric_spec.rubric);
        if let Some(model) = &metric_spec.model {
            metric = metric.with_model(model);
        }
        bindings.push(MetricBinding::new(
            &metric_spec.name,
            metric_spec.weight,
            Arc::new(metric),
        ));
    }
    let evaluator = Evaluator::new(bindings, retry).context("Invalid metric configuration")?;

    let mut judge = Judge::new(client.clone()).with_retry(retry);
    if let Some(model) = &spec.judge.model {
        judge = judge.with_model(model);
    }
    if let Some(max_tokens) = spec.judge.max_tokens {
        judge = judge.with_max_tokens(max_tokens);
    }

    let mut entries = Vec::with_capacity(spec.teams.len());
    for team_spec in &spec.teams {
        let mut producer = LlmProducer::new(client.clone());
        if let Some(prompt) = &team_spec.system_prompt {
            producer = producer.with_system_prompt(prompt);
        }
        if let Some(model) = &team_spec.model {
            producer = producer.with_model(model);
        }
        entries.push(TeamEntry::new(
            Team::new(&team_spec.id, &team_spec.name),
            Arc::new(producer),
        ));
    }

    let execution_id = bakeoff::id::execution_id(&spec.task);
    let db_path = cli
        .store
        .clone()
        .unwrap_or_else(|| default_store_path(&execution_id));
    let store = RankingStore::open(&db_path)
        .context("Failed to open ranking store")?
        .with_retry(retry);

    let orchestrator = Orchestrator::new(evaluator, judge, store).with_execution_id(&execution_id);

    // First Ctrl-C cancels cooperatively; teams stop at their next
    // phase boundary and recorded rounds are kept
    let cancel = orchestrator.cancel_handle();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("interrupt received, cancelling all teams");
            cancel.cancel();
        }
    });

    println!("{} {}", "Task:".bold(), spec.task);
    println!(
        "{} {} team(s), up to {} round(s) each",
        "Racing:".bold(),
        spec.teams.len(),
        spec.max_rounds
    );
    println!("{} {}\n", "Store:".bold(), db_path.display());

    let result = orchestrator
        .run(spec.task_definition(), entries, spec.execution_config())
        .await?;

    print!("{}", render::format_execution(&result));
    Ok(())
}
