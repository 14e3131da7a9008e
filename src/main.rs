//! Bottle Scan - recycling-rewards validation CLI
//!
//! Runs the two-step bottle validation workflow over still images.

use std::path::PathBuf;
use std::sync::Arc;

use bottle_scan::app::cli::{Cli, Commands, ConfigAction};
use bottle_scan::app::config::Config;
use bottle_scan::camera::{Camera, FileCamera};
use bottle_scan::gateway::client::{AnthropicVision, ClassifierGateway};
use bottle_scan::gateway::schema::ValidationStep;
use bottle_scan::ledger::JsonlLedger;
use bottle_scan::session::engine::ScanEngine;
use bottle_scan::session::state::ScanPhase;
use tracing::info;
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    // Parse CLI arguments first so we can use --verbose to set log level
    let cli = Cli::parse_args();

    // Initialize tracing (--verbose enables debug-level output)
    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .init();

    // Load config
    let config = if let Some(path) = &cli.config {
        Config::load(path)?
    } else {
        Config::load_default()?
    };

    // Execute command
    match cli.command {
        Commands::Scan { identify, confirm } => {
            run_scan(identify, confirm, &config)?;
        }
        Commands::Identify { image } => {
            run_identify(image, &config)?;
        }
        Commands::Config { action } => {
            run_config(action, &config)?;
        }
    }

    Ok(())
}

/// Print the session's user-facing state after one trigger.
fn report_session(engine: &ScanEngine) {
    let session = engine.session();
    match session.phase() {
        ScanPhase::Identifying => {
            if let Some(error) = session.last_error() {
                println!("Still identifying: {error}");
            }
        }
        ScanPhase::Confirming => {
            if let Some(error) = session.last_error() {
                println!("Still confirming: {error}");
            } else if let Some(label) = session.detected_label() {
                println!("Identified: {label}");
            }
        }
        ScanPhase::Completed => {}
    }
}

fn run_scan(identify: PathBuf, confirm: Option<PathBuf>, config: &Config) -> anyhow::Result<()> {
    let rt = tokio::runtime::Runtime::new()?;

    let gateway: Arc<dyn ClassifierGateway> =
        Arc::new(AnthropicVision::from_config(&config.gateway)?);
    let ledger = Arc::new(JsonlLedger::new(&config.scan.ledger_path));

    let mut paths = vec![identify];
    let run_confirm = confirm.is_some();
    if let Some(confirm) = confirm {
        paths.push(confirm);
    }
    let camera = FileCamera::new(paths);

    rt.block_on(async {
        let mut engine = ScanEngine::start(
            &camera,
            gateway,
            ledger.clone(),
            config.scan.max_label_chars,
        )
        .await?;

        // Identify step
        engine.trigger().await?;
        report_session(&engine);

        // Confirm step, only when identification advanced the session and
        // a confirm image was supplied
        if run_confirm && engine.session().phase() == ScanPhase::Confirming {
            let recorded = engine.trigger().await?;
            report_session(&engine);
            if let Some(item) = recorded {
                println!(
                    "Recorded: {} at {} (ledger: {})",
                    item.label,
                    item.recorded_at.to_rfc3339(),
                    ledger.path().display()
                );
            }
        }

        info!(
            session = %engine.session().id(),
            phase = %engine.session().phase(),
            "Scan session finished"
        );
        Ok::<(), anyhow::Error>(())
    })?;

    Ok(())
}

fn run_identify(image: PathBuf, config: &Config) -> anyhow::Result<()> {
    let rt = tokio::runtime::Runtime::new()?;

    let gateway = AnthropicVision::from_config(&config.gateway)?;
    let camera = FileCamera::new(vec![image]);

    rt.block_on(async {
        let mut stream = camera.acquire_stream().await?;
        let frame = stream.capture_still_frame().await?;
        let result = gateway.classify(&frame, ValidationStep::Identify).await?;
        println!("{}", serde_json::to_string_pretty(&result)?);
        Ok::<(), anyhow::Error>(())
    })?;

    Ok(())
}

fn run_config(action: ConfigAction, config: &Config) -> anyhow::Result<()> {
    match action {
        ConfigAction::Show => {
            println!("{}", config.to_toml()?);
        }
        ConfigAction::Init { force } => {
            let path = Config::default_path();
            if path.exists() && !force {
                anyhow::bail!(
                    "config already exists at {} (use --force to overwrite)",
                    path.display()
                );
            }
            Config::default().save(&path)?;
            println!("Wrote {}", path.display());
        }
        ConfigAction::Path => {
            println!("{}", Config::default_path().display());
        }
    }
    Ok(())
}
