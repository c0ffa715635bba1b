use crate::cli::ServeArgs;
use crate::infra::{AppState, InMemoryConfigStore};
use crate::routes::with_cra_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use fincra_core::config::AppConfig;
use fincra_core::cra::scorecards::{self, ScorecardSource};
use fincra_core::cra::{CraService, JsonFileConfigStore};
use fincra_core::error::AppError;
use fincra_core::telemetry;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tracing::info;

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }
    if let Some(dir) = args.scorecards.take() {
        config.cra.scorecards_dir = dir;
    }
    if let Some(path) = args.engine_config.take() {
        config.cra.engine_config_path = Some(path);
    }

    telemetry::init(&config.telemetry)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let scorecard_store = scorecards::install_global(ScorecardSource::Directory(
        config.cra.scorecards_dir.clone(),
    ));
    let tables = scorecard_store.get();
    info!(
        dir = %config.cra.scorecards_dir.display(),
        geography = tables.geography.len(),
        industry = tables.industry.len(),
        entity = tables.entity.len(),
        product = tables.product.len(),
        delivery = tables.delivery.len(),
        "scorecards loaded"
    );

    let routes = match config.cra.engine_config_path.clone() {
        Some(path) => {
            info!(path = %path.display(), "engine config persisted to file");
            let store = Arc::new(JsonFileConfigStore::new(path));
            with_cra_routes(Arc::new(CraService::new(store, scorecard_store)))
        }
        None => {
            info!("engine config held in memory");
            let store = Arc::new(InMemoryConfigStore::default());
            with_cra_routes(Arc::new(CraService::new(store, scorecard_store)))
        }
    };

    let app = routes
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "compliance risk assessment service ready");

    axum::serve(listener, app).await?;
    Ok(())
}
