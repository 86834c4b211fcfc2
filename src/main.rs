use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use api_rest::{AppState, Collaborators};
use hemo_core::config::core_config_from_env_values;
use hemo_core::inventory::{FileInventoryStore, InventoryStore, MemoryInventoryStore};
use hemo_core::{Clock, CoreConfig, DirectoryFixture, LogNotifier, SystemClock};

/// Main entry point for the HEMO server
///
/// Serves the REST API (with Swagger UI at `/swagger-ui`) on `HEMO_REST_ADDR`.
///
/// # Environment Variables
/// - `HEMO_REST_ADDR`: REST server address (default: "0.0.0.0:3000")
/// - `HEMO_DIRECTORY_FIXTURE`: YAML snapshot of donors, hospitals and opening inventory
/// - `INVENTORY_DATA_DIR`: inventory file store; when unset inventory is held in memory and
///   seeded from the fixture
/// - `HEMO_SEARCH_RADIUS_KM`, `HEMO_DIRECTORY_RESULT_CAP`, `HEMO_COLLABORATOR_TIMEOUT_MS`,
///   `HEMO_MIN_THRESHOLD`, `HEMO_MAX_CAPACITY`: see `hemo_core::config`
///
/// # Errors
/// Returns an error if configuration is invalid, the fixture cannot be loaded, the address
/// cannot be bound, or the server fails while running.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("hemo_run=info".parse()?)
                .add_directive("hemo_core=info".parse()?)
                .add_directive("api_rest=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let rest_addr = std::env::var("HEMO_REST_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".into());
    let cfg = Arc::new(core_config_from_env_values(|name| std::env::var(name).ok())?);
    let fixture_path = std::env::var("HEMO_DIRECTORY_FIXTURE")
        .ok()
        .filter(|v| !v.trim().is_empty())
        .map(PathBuf::from);

    let state = build_state(cfg, fixture_path.as_deref()).await?;
    let app = api_rest::router(state);

    tracing::info!("++ Starting HEMO REST on {}", rest_addr);
    let listener = tokio::net::TcpListener::bind(&rest_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Wires collaborators and services.
///
/// The fixture's opening inventory is only applied to the in-memory store; a file store is
/// already authoritative and is left untouched.
async fn build_state(
    cfg: Arc<CoreConfig>,
    fixture_path: Option<&Path>,
) -> anyhow::Result<AppState> {
    let fixture = match fixture_path {
        Some(path) => {
            tracing::info!(path = %path.display(), "loading directory fixture");
            DirectoryFixture::load(path).await?
        }
        None => {
            tracing::warn!("HEMO_DIRECTORY_FIXTURE not set; donor and hospital directory is empty");
            DirectoryFixture::default()
        }
    };
    let directory = Arc::new(fixture.directory()?);
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);

    let store: Arc<dyn InventoryStore> = match cfg.inventory_data_dir() {
        Some(dir) => {
            tracing::info!(dir = %dir.display(), "using inventory file store");
            Arc::new(FileInventoryStore::new(dir))
        }
        None => Arc::new(MemoryInventoryStore::new()),
    };
    let seed_inventory = cfg.inventory_data_dir().is_none();

    let state = AppState::new(
        cfg,
        Collaborators {
            donors: directory.clone(),
            registry: directory.clone(),
            hospitals: directory,
            store,
            notifier: Arc::new(LogNotifier),
            clock,
        },
    );

    if seed_inventory {
        fixture.seed_inventory(&state.ledger).await?;
    } else if !fixture.inventory.is_empty() {
        tracing::warn!(
            entries = fixture.inventory.len(),
            "fixture inventory ignored; INVENTORY_DATA_DIR is set"
        );
    }

    Ok(state)
}
