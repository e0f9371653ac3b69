use anyhow::Context;
use stableswap_ledger::orchestration::Ingestor;
use stableswap_ledger::{api, config::Config, db::init_db, JsonlEventSource, Repository};
use std::net::SocketAddr;
use std::sync::Arc;

/// Apply the configured event file, if any, before serving queries.
async fn ingest_startup_events(config: &Config, repo: Arc<Repository>) -> anyhow::Result<()> {
    let Some(path) = config.events_path.as_deref() else {
        return Ok(());
    };

    let source = JsonlEventSource::open(path)
        .await
        .with_context(|| format!("loading events from {}", path))?;
    let mut ingestor = Ingestor::from_config(Arc::new(source), repo, config);
    let report = ingestor
        .run_to_end()
        .await
        .with_context(|| format!("ingesting events from {}", path))?;

    if !report.zero_supply_reports.is_empty() {
        tracing::warn!(
            count = report.zero_supply_reports.len(),
            policy = %config.zero_supply_policy,
            "shares were computed against a zero total supply"
        );
    }
    Ok(())
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing_subscriber::filter::LevelFilter::INFO.into()),
        )
        .init();

    // Load configuration
    let config = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            std::process::exit(1);
        }
    };

    let port = config.port;

    // Initialize database and dependencies
    let pool = match init_db(&config.database_path).await {
        Ok(p) => p,
        Err(e) => {
            eprintln!("Failed to initialize database: {}", e);
            std::process::exit(1);
        }
    };

    let repo = Arc::new(Repository::new(pool));

    if let Err(e) = ingest_startup_events(&config, repo.clone()).await {
        eprintln!("Startup ingestion failed: {:#}", e);
        std::process::exit(1);
    }

    // Create router
    let app = api::create_router(api::AppState::new(repo));

    // Bind to address
    let addr = SocketAddr::from(([127, 0, 0, 1], port));
    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(l) => l,
        Err(e) => {
            eprintln!("Failed to bind to {}: {}", addr, e);
            std::process::exit(1);
        }
    };

    tracing::info!("Server listening on {}", addr);

    // Run server
    if let Err(e) = axum::serve(listener, app).await {
        eprintln!("Server error: {}", e);
        std::process::exit(1);
    }
}
