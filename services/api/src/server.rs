use crate::cli::ServeArgs;
use crate::infra::{load_catalog, AppState, InMemoryCompletionPublisher, InMemoryProgressStore};
use crate::routes::with_registration_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tracing::info;
use tutor_intake::config::AppConfig;
use tutor_intake::error::AppError;
use tutor_intake::telemetry;
use tutor_intake::workflows::registration::RegistrationService;

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }
    if let Some(path) = args.catalog_csv.take() {
        config.catalog.seed_csv = Some(path);
    }

    telemetry::init(&config.telemetry)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let catalog = Arc::new(load_catalog(config.catalog.seed_csv.as_deref())?);
    let store = Arc::new(InMemoryProgressStore::default());
    let publisher = Arc::new(InMemoryCompletionPublisher::default());
    let registration_service = Arc::new(RegistrationService::new(
        store,
        catalog.clone(),
        publisher,
    ));

    let app = with_registration_routes(registration_service, catalog)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "tutor registration service ready");

    axum::serve(listener, app).await?;
    Ok(())
}
