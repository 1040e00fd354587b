use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use axum_prometheus::PrometheusMetricLayer;
use clap::{Args, Parser, Subcommand};
use inspection_engine::config::AppConfig;
use inspection_engine::error::AppError;
use inspection_engine::telemetry;
use inspection_engine::workflows::inspections::{
    inspection_router, InspectionDraft, InspectionService, LogNotifier, MemoryInspectionStore,
    StaticWorkflowDirectory, WorkflowConfig,
};
use metrics_exporter_prometheus::PrometheusHandle;
use serde_json::json;
use std::fs;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::info;

#[derive(Clone)]
struct AppState {
    readiness: Arc<AtomicBool>,
    metrics: PrometheusHandle,
}

#[derive(Parser, Debug)]
#[command(
    name = "Inspection Decision Engine",
    about = "Run the inspection approval service or evaluate a workflow decision offline",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// Evaluate a draft against a workflow configuration and print the decision
    Decide(DecideArgs),
}

#[derive(Args, Debug, Default)]
struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    port: Option<u16>,
    /// JSON file holding the workflow configurations to serve
    #[arg(long)]
    workflows: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct DecideArgs {
    /// JSON file holding one workflow configuration
    #[arg(long)]
    workflow: PathBuf,
    /// JSON file holding the inspection draft to decide
    #[arg(long)]
    draft: PathBuf,
}

#[tokio::main]
async fn main() {
    if let Err(err) = run_cli().await {
        eprintln!("application error: {err}");
        std::process::exit(1);
    }
}

async fn run_cli() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => run_server(args).await,
        Command::Decide(args) => run_decide(args),
    }
}

async fn run_server(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }

    telemetry::init(&config.telemetry)?;

    let directory = match args.workflows.take() {
        Some(path) => {
            let raw = fs::read_to_string(path)?;
            let workflows: Vec<WorkflowConfig> = serde_json::from_str(&raw)?;
            StaticWorkflowDirectory::with_workflows(workflows)
        }
        None => StaticWorkflowDirectory::default(),
    };

    let service = Arc::new(InspectionService::with_retry_limit(
        Arc::new(MemoryInspectionStore::default()),
        Arc::new(directory),
        Arc::new(LogNotifier),
        config.engine.max_decision_retries,
    ));

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(AtomicBool::new(false));
    let state = AppState {
        readiness: readiness_flag.clone(),
        metrics: prometheus_handle,
    };

    let app = Router::new()
        .route("/health", get(healthcheck))
        .route("/ready", get(readiness_endpoint))
        .route("/metrics", get(metrics_endpoint))
        .with_state(state)
        .merge(inspection_router(service))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "inspection decision engine ready");

    axum::serve(listener, app).await?;
    Ok(())
}

fn run_decide(args: DecideArgs) -> Result<(), AppError> {
    let workflow: WorkflowConfig = serde_json::from_str(&fs::read_to_string(args.workflow)?)?;
    let draft: InspectionDraft = serde_json::from_str(&fs::read_to_string(args.draft)?)?;

    let service = InspectionService::new(
        Arc::new(MemoryInspectionStore::default()),
        Arc::new(StaticWorkflowDirectory::with_workflows([workflow])),
        Arc::new(LogNotifier),
    );

    let record = service.submit(draft)?;
    let view = record.status_view();

    println!("Inspection decision");
    println!("- id: {}", view.inspection_id.0);
    println!("- status: {}", view.status);
    println!("- auto approved: {}", view.auto_approved);
    println!("- rationale: {}", view.decision_rationale);
    for approval in &view.approvals {
        println!("- approver {}: {}", approval.approver.0, approval.status);
    }

    Ok(())
}

async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

async fn readiness_endpoint(State(state): State<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

async fn metrics_endpoint(State(state): State<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}
