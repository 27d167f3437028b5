use crate::cli::ServeArgs;
use crate::infra::{
    load_contract_template, AppState, HtmlFileRenderer, InMemoryApplicantRepository,
    InMemoryStudentRegistry, PlaceholderFiller,
};
use crate::routes::with_enrollment_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use school_enrollment::config::AppConfig;
use school_enrollment::error::AppError;
use school_enrollment::telemetry;
use school_enrollment::workflows::enrollment::{ContractPipeline, EnrollmentService};
use std::sync::atomic::{AtomicBool, Ordering};
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

    telemetry::init(&config.telemetry, config.environment)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let template = load_contract_template(&config.contract)?;
    let pipeline = Arc::new(ContractPipeline::new(
        Arc::new(PlaceholderFiller),
        Arc::new(HtmlFileRenderer::new(config.contract.output_dir.clone())),
    ));
    let enrollment_service = Arc::new(EnrollmentService::new(
        Arc::new(InMemoryApplicantRepository::default()),
        Arc::new(InMemoryStudentRegistry::default()),
        pipeline,
        config.school.clone(),
        template,
    ));

    let app = with_enrollment_routes(enrollment_service)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(
        ?config.environment,
        %addr,
        contracts = %config.contract.output_dir.display(),
        "enrollment desk ready"
    );

    axum::serve(listener, app).await?;
    Ok(())
}
