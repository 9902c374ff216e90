use anyhow::Context;
use clap::Parser;
use project_planner::utils::error::ErrorSeverity;
use project_planner::utils::{logger, validation::Validate};
use project_planner::{
    CliArgs, FileRevisionChannel, HttpDraftService, HttpExpansionService, LocalRecordStore,
    PipelineOrchestrator, PipelineState, PlannerConfig,
};
use std::path::Path;
use std::sync::Arc;

fn load_config(path: &Path) -> anyhow::Result<PlannerConfig> {
    let config = PlannerConfig::from_file(path)
        .with_context(|| format!("failed to load config file '{}'", path.display()))?;
    config.validate().context("configuration validation failed")?;
    Ok(config)
}

async fn run(args: &CliArgs, config: &PlannerConfig) -> project_planner::Result<()> {
    let store = Arc::new(LocalRecordStore::open(&config.store.path).await?);
    let drafts = HttpDraftService::from_config(&config.services)?;
    let expansion = HttpExpansionService::from_config(&config.services)?;
    let orchestrator = PipelineOrchestrator::new(&args.project_id, store, drafts, expansion);

    let mut state = orchestrator.initialize().await?;
    if args.reset && state == PipelineState::Reviewing {
        orchestrator.reset().await?;
        state = orchestrator.state();
    }

    if state == PipelineState::Ready {
        tracing::info!("Generating plan for project {}", args.project_id);
        orchestrator.start_generation().await?;
    }

    if let Some(path) = &args.revisions {
        let mut channel = FileRevisionChannel::from_file(path).await?;
        tracing::debug!("Loaded {} recorded revision(s)", channel.remaining());
        let applied = orchestrator.drain_revisions(&mut channel).await?;
        tracing::info!("Applied {} revision(s) from {}", applied, path.display());
    }

    if let Some(set) = orchestrator.suggestions().await {
        println!("{}", serde_json::to_string_pretty(&set)?);
    }

    if args.commit {
        let report = orchestrator.commit().await?;
        println!(
            "✅ Committed: {} inserted, {} already in catalog, {} skipped, {} duplicate(s)",
            report.inserted.len(),
            report.already_present.len(),
            report.skipped.len(),
            report.duplicates.len()
        );
    }

    Ok(())
}

#[tokio::main]
async fn main() {
    let args = CliArgs::parse();

    let config = match load_config(&args.config) {
        Ok(config) => config,
        Err(e) => {
            logger::init_cli_logger(args.verbose);
            tracing::error!("❌ {:#}", e);
            eprintln!("❌ {:#}", e);
            eprintln!("💡 Make sure the file exists, is valid TOML and has [store] and [services] sections");
            std::process::exit(1);
        }
    };

    logger::init_from_config(&config.logging, args.verbose);
    tracing::info!("Starting project-planner for project {}", args.project_id);

    if let Err(e) = run(&args, &config).await {
        tracing::error!(
            "❌ Planning failed: {} (Category: {:?}, Severity: {:?})",
            e,
            e.category(),
            e.severity()
        );
        tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

        eprintln!("❌ {}", e.user_friendly_message());
        eprintln!("💡 {}", e.recovery_suggestion());

        let exit_code = if e.severity() == ErrorSeverity::Critical {
            3
        } else if e.is_retryable() {
            2
        } else {
            1
        };
        std::process::exit(exit_code);
    }
}
