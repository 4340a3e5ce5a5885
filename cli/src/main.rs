//! CLI entrypoint for conclave
//!
//! Wires the layers together with dependency injection: config from the
//! loader, filesystem recorder and memory store, HTTP model clients, and
//! the deliberation session use case on top.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use conclave_application::{DeliberationSession, IdGenerator, SessionDeps};
use conclave_domain::{OutputType, Severity};
use conclave_infrastructure::{
    ConfigLoader, FsMemoryStore, FsSessionRecorder, SequentialIdGenerator, SystemClock,
    providers::build_clients,
};
use tokio_util::sync::CancellationToken;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "conclave", version, about = "Council deliberation engine over LLM members")]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one deliberation session
    Run {
        /// Path to the council configuration (JSON)
        #[arg(long)]
        config: PathBuf,

        /// The prompt the council deliberates on
        #[arg(long)]
        prompt: String,

        /// Approve execution of the outcome, if the session calls for it
        #[arg(long)]
        approve_execution: bool,

        /// Override the configured output type (none|documentation)
        #[arg(long)]
        output_type: Option<String>,
    },

    /// Validate a council configuration and report every issue
    Validate {
        /// Path to the council configuration (JSON)
        #[arg(long)]
        config: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    match cli.command {
        Commands::Run {
            config,
            prompt,
            approve_execution,
            output_type,
        } => run(config, prompt, approve_execution, output_type).await,
        Commands::Validate { config } => validate(config),
    }
}

async fn run(
    config_path: PathBuf,
    prompt: String,
    approve_execution: bool,
    output_type: Option<String>,
) -> Result<()> {
    let mut config = ConfigLoader::load(&config_path)
        .with_context(|| format!("loading {}", config_path.display()))?;

    if let Some(output_type) = output_type {
        config.output = match output_type.as_str() {
            "none" => OutputType::None,
            "documentation" => OutputType::Documentation,
            other => bail!("unknown output type '{other}' (expected none|documentation)"),
        };
    }

    info!(council = %config.council_name, "configuration loaded");

    // === Dependency injection ===
    let ids = Arc::new(SequentialIdGenerator::new());
    let session_id = ids.session_id();
    let recorder = Arc::new(FsSessionRecorder::create(&config.storage.root_dir, &session_id)?);
    let session_dir = recorder.session_dir().to_path_buf();
    let memory = Arc::new(FsMemoryStore::new(config.storage.memory_dir.clone()));
    let clients = build_clients(&config);

    // Ctrl-C cancels outstanding model calls and fails the session fast.
    let cancel = CancellationToken::new();
    let ctrl_c_token = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            ctrl_c_token.cancel();
        }
    });

    let session = DeliberationSession::new(SessionDeps {
        config: Arc::new(config),
        clients,
        recorder,
        memory,
        clock: Arc::new(SystemClock),
        ids,
    })
    .with_cancellation(cancel);

    let outcome = session.run(&prompt, approve_execution).await?;

    println!();
    println!("Session `{}` closed ({}).", outcome.session_id, outcome.ended_by);
    println!("Leader: {}", outcome.leader_id);
    println!("Final resolution: {}", outcome.final_resolution);
    if let Some(approved) = outcome.documentation_approved {
        println!(
            "Documentation: {}",
            if approved { "approved" } else { "NOT approved (see unresolved blockers)" }
        );
    }
    if let Some(handoff) = &outcome.handoff {
        println!(
            "Execution handoff: {} (profile: {})",
            if handoff.approved { "approved" } else { "awaiting human approval" },
            handoff.default_executor_profile
        );
    }
    println!("Artifacts: {}", session_dir.display());

    Ok(())
}

fn validate(config_path: PathBuf) -> Result<()> {
    let (config, issues) = ConfigLoader::inspect(&config_path)
        .with_context(|| format!("loading {}", config_path.display()))?;

    println!(
        "Council \"{}\": {} members, {} phases, entry phase `{}`",
        config.council_name,
        config.council_size(),
        config.phases.len(),
        config.session.entry_phase_id
    );

    if issues.is_empty() {
        println!("No issues found.");
        return Ok(());
    }

    let mut has_errors = false;
    for issue in &issues {
        match issue.severity {
            Severity::Error => {
                has_errors = true;
                println!("[ERROR] {}", issue.message);
            }
            Severity::Warning => println!("[WARN ] {}", issue.message),
        }
    }
    if has_errors {
        bail!("configuration has errors");
    }
    Ok(())
}
