// ABOUTME: Entry point for the gantry CLI application.
// ABOUTME: Parses arguments and dispatches to the lifecycle controller.

mod cli;

use clap::Parser;
use cli::{Cli, Commands};
use gantry::collaborators::{
    CommandHealthCheck, CommandSupervisor, FsTransfer, NullSupervisor, ProcessSupervisor,
};
use gantry::config::{self, Config};
use gantry::error::{Error, Result};
use gantry::lifecycle::{DeployOutcome, LifecycleController, RollbackTarget};
use gantry::output::{Output, OutputMode};
use gantry::pointer::PointerSwitch;
use gantry::store::ReleaseStore;
use gantry::types::{ArtifactLocation, ReleaseId};
use std::env;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Initialize tracing subscriber based on verbose flag
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("warn")
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();

    let mode = if cli.json {
        OutputMode::Json
    } else if cli.quiet {
        OutputMode::Quiet
    } else {
        OutputMode::Normal
    };
    let mut output = Output::new(mode);
    output.start_timer();

    match run(cli, &output).await {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            output.error(&e.to_string());
            std::process::exit(e.exit_code());
        }
    }
}

async fn run(cli: Cli, output: &Output) -> Result<i32> {
    match cli.command {
        Commands::Init { project, force } => {
            let cwd = env::current_dir()?;
            config::init_config(&cwd, project.as_deref(), force)?;
            output.success("Created gantry.yml");
            Ok(0)
        }
        Commands::Deploy {
            artifact,
            bootstrap,
            force,
        } => {
            let config = discover_config()?;
            let artifact = ArtifactLocation::parse(&artifact)
                .map_err(|e| Error::InvalidArtifact(e.to_string()))?;
            deploy(&config, &artifact, bootstrap, force, output).await
        }
        Commands::Rollback {
            to,
            previous: _,
            force,
        } => {
            let config = discover_config()?;
            let target = match to {
                Some(id) => {
                    if id.is_empty() {
                        return Err(Error::InvalidReleaseId(id));
                    }
                    RollbackTarget::To(ReleaseId::new(id))
                }
                None => RollbackTarget::Previous,
            };
            rollback(&config, target, force, output).await
        }
        Commands::ListReleases => {
            let config = discover_config()?;
            list_releases(&config, cli.json)
        }
        Commands::Status => {
            let config = discover_config()?;
            status(&config, output)
        }
        Commands::Prune { keep } => {
            let config = discover_config()?;
            prune(&config, keep, output).await
        }
        Commands::Abort => {
            let config = discover_config()?;
            abort(&config, output)
        }
    }
}

fn discover_config() -> Result<Config> {
    let cwd = env::current_dir()?;
    Config::discover(&cwd)
}

/// Build the engine pieces shared by every deploy-dependent command.
struct Engine {
    store: ReleaseStore,
    pointer: PointerSwitch,
    transfer: FsTransfer,
    health: CommandHealthCheck,
    supervisor: Box<dyn ProcessSupervisor>,
}

impl Engine {
    fn open(config: &Config) -> Result<Self> {
        let store = ReleaseStore::open(&config.state_dir)?;
        let pointer = PointerSwitch::open(&config.state_dir)
            .map_err(gantry::lifecycle::LifecycleError::from)?;
        let supervisor: Box<dyn ProcessSupervisor> = match &config.restart_cmd {
            Some(cmd) => Box::new(CommandSupervisor::new(cmd.clone())),
            None => Box::new(NullSupervisor),
        };
        Ok(Self {
            store,
            pointer,
            transfer: FsTransfer,
            health: CommandHealthCheck::new(config.probe.cmd.clone()),
            supervisor,
        })
    }

    fn controller<'a>(&'a self, config: &'a Config) -> LifecycleController<'a> {
        LifecycleController::new(
            config,
            &self.store,
            &self.pointer,
            &self.transfer,
            &self.health,
            self.supervisor.as_ref(),
        )
    }
}

async fn deploy(
    config: &Config,
    artifact: &ArtifactLocation,
    bootstrap: bool,
    force: bool,
    output: &Output,
) -> Result<i32> {
    let engine = Engine::open(config)?;
    let controller = engine.controller(config);

    output.progress(&format!(
        "Deploying {} to project {}",
        artifact, config.project
    ));

    match controller.deploy(artifact, bootstrap, force).await? {
        DeployOutcome::Committed { release } => {
            output.success(&format!("✓ Deployed {} (live)", release.id));
            Ok(0)
        }
        DeployOutcome::RolledBack {
            release,
            restored,
            status,
        } => {
            output.error(&format!(
                "✗ {} failed verification ({status:?}); rolled back to {} (reconfirmed healthy)",
                release.id, restored.id
            ));
            Ok(1)
        }
    }
}

async fn rollback(
    config: &Config,
    target: RollbackTarget,
    force: bool,
    output: &Output,
) -> Result<i32> {
    let engine = Engine::open(config)?;
    let controller = engine.controller(config);

    output.progress(&format!("Rolling back project {}", config.project));

    let promoted = controller.rollback(target, force).await?;
    output.success(&format!("✓ Rolled back to {} (live)", promoted.id));
    Ok(0)
}

fn list_releases(config: &Config, json: bool) -> Result<i32> {
    let engine = Engine::open(config)?;
    let controller = engine.controller(config);
    let report = controller.status()?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report.releases)?);
        return Ok(0);
    }

    let current = report.current.as_ref().map(|r| r.id.clone());
    for release in &report.releases {
        let marker = if Some(&release.id) == current.as_ref() {
            "*"
        } else {
            " "
        };
        println!(
            "{marker} {:<8} {:<12} {:<24} {}",
            release.id,
            release.status,
            release.created_at.format("%Y-%m-%d %H:%M:%S UTC"),
            release.artifact_location
        );
    }
    Ok(0)
}

fn status(config: &Config, output: &Output) -> Result<i32> {
    let engine = Engine::open(config)?;
    let controller = engine.controller(config);
    let report = controller.status()?;

    println!("Project: {}", config.project);
    match &report.current {
        Some(release) => println!("Live:    {} ({})", release.id, release.artifact_location),
        None => println!("Live:    (uninitialized)"),
    }
    println!("Tracked: {} release(s)", report.releases.len());

    if let Some(stale) = &report.stale_verifying {
        output.error(&format!(
            "release {} is stranded in verifying (interrupted attempt); \
             run `gantry abort` or retry the deploy",
            stale.id
        ));
    }
    Ok(0)
}

async fn prune(config: &Config, keep: Option<usize>, output: &Output) -> Result<i32> {
    let engine = Engine::open(config)?;
    let controller = engine.controller(config);

    let report = controller.prune(keep).await?;
    for warning in report.diagnostics.warnings() {
        output.error(&warning.message);
    }
    if report.purged.is_empty() {
        output.success("Nothing to prune");
    } else {
        let ids: Vec<&str> = report.purged.iter().map(|r| r.id.as_str()).collect();
        output.success(&format!("Purged {}", ids.join(", ")));
    }
    Ok(0)
}

fn abort(config: &Config, output: &Output) -> Result<i32> {
    let engine = Engine::open(config)?;
    let controller = engine.controller(config);

    let aborted = controller.abort_stale()?;
    output.success(&format!("Aborted stranded release {}", aborted.id));
    Ok(0)
}
