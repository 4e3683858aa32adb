use crate::cli::ServeArgs;
use crate::infra::{AppState, ConfiguredNotifier};
use crate::routes::with_application_routes;
use admissions_ai::config::AppConfig;
use admissions_ai::error::AppError;
use admissions_ai::telemetry;
use admissions_ai::workflows::applications::{ApplicationService, GeminiModel};
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
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

    telemetry::init(&config.telemetry)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let model = GeminiModel::from_config(&config.model)?;
    let notifier = ConfiguredNotifier::from_config(&config.notifications)?;
    info!(
        model = model.model_id(),
        notifier = notifier.label(),
        "document screening configured"
    );
    let application_service = Arc::new(ApplicationService::new(
        Arc::new(model),
        Arc::new(notifier),
    ));

    let app = with_application_routes(application_service)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "application intake service ready");

    axum::serve(listener, app).await?;
    Ok(())
}
