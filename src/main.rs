//! Host Dashboard
//!
//! Serves the host dashboard REST API on top of in-memory backends seeded
//! from a YAML cluster fixture, plus health and Prometheus metrics
//! endpoints.

use clap::Parser;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, Level};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use host_dashboard::{
    ApiContext, ApiMetrics, ApiServer, ApiServerConfig, ClusterFixture, Error,
    ReconcilerConfig, Result, TaskManagerConfig,
};

// =============================================================================
// CLI Arguments
// =============================================================================

/// Host Dashboard - cluster hosts, labels, maintenance and device inventory
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// REST API bind address
    #[arg(long, env = "API_ADDR", default_value = "0.0.0.0:8080")]
    api_addr: String,

    /// Health server bind address
    #[arg(long, env = "HEALTH_ADDR", default_value = "0.0.0.0:8081")]
    health_addr: String,

    /// Metrics server bind address
    #[arg(long, env = "METRICS_ADDR", default_value = "0.0.0.0:9090")]
    metrics_addr: String,

    /// YAML cluster fixture seeding the in-memory backends
    #[arg(long, env = "FIXTURE")]
    fixture: Option<String>,

    /// Seconds an identify request waits for its task
    #[arg(long, env = "IDENTIFY_WAIT_SECS", default_value = "2")]
    identify_wait_secs: u64,

    /// Seconds finished tasks are kept
    #[arg(long, env = "TASK_RETENTION_SECS", default_value = "300")]
    task_retention_secs: u64,

    /// Allow cross-origin requests from any origin
    #[arg(long, env = "PERMISSIVE_CORS")]
    permissive_cors: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    log_level: String,

    /// Output logs as JSON
    #[arg(long, env = "LOG_JSON")]
    log_json: bool,
}

// =============================================================================
// Main
// =============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    init_logging(&args)?;

    info!("Starting Host Dashboard");
    info!("  Version: {}", host_dashboard::VERSION);
    info!("  REST API: {}", args.api_addr);

    let fixture = match &args.fixture {
        Some(path) => ClusterFixture::load(path)?,
        None => {
            info!("No fixture given, starting with an empty cluster");
            ClusterFixture::default()
        }
    };
    let backends = fixture.into_backends();

    let context = ApiContext::from_backends(
        &backends,
        ReconcilerConfig {
            identify_wait: Duration::from_secs(args.identify_wait_secs),
        },
        TaskManagerConfig {
            retention: Duration::from_secs(args.task_retention_secs),
        },
    )?;

    // Start health server
    let health_addr = parse_addr(&args.health_addr, "health server")?;
    tokio::spawn(async move {
        if let Err(e) = run_health_server(health_addr).await {
            error!("Health server error: {}", e);
        }
    });

    // Start metrics server
    let metrics_addr = parse_addr(&args.metrics_addr, "metrics server")?;
    let metrics = context.metrics.clone();
    tokio::spawn(async move {
        if let Err(e) = run_metrics_server(metrics_addr, metrics).await {
            error!("Metrics server error: {}", e);
        }
    });

    // Keep the executing-tasks gauge current between requests
    let gauge_context = context.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(5));
        loop {
            interval.tick().await;
            gauge_context
                .metrics
                .set_executing_tasks(gauge_context.tasks.executing_count());
        }
    });

    let api_config = ApiServerConfig {
        rest_addr: parse_addr(&args.api_addr, "REST API")?,
        permissive_cors: args.permissive_cors,
        ..Default::default()
    };
    let api_server = Arc::new(ApiServer::new(api_config, context));

    let signal_server = api_server.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("Received shutdown signal");
                signal_server.shutdown();
            }
            Err(e) => error!("Failed to listen for shutdown signal: {}", e),
        }
    });

    api_server.run().await?;

    info!("Host Dashboard shutdown complete");
    Ok(())
}

fn parse_addr(addr: &str, what: &str) -> Result<SocketAddr> {
    addr.parse()
        .map_err(|e| Error::Configuration(format!("Invalid {} address {}: {}", what, addr, e)))
}

// =============================================================================
// Logging Setup
// =============================================================================

fn init_logging(args: &Args) -> Result<()> {
    let level = match args.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let mut filter = EnvFilter::from_default_env().add_directive(level.into());
    for directive in ["hyper=warn", "tower=warn", "tower_http=info", "axum=info"] {
        let directive = directive
            .parse()
            .map_err(|e| Error::Configuration(format!("Invalid log directive: {}", e)))?;
        filter = filter.add_directive(directive);
    }

    if args.log_json {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_target(true))
            .init();
    }
    Ok(())
}

// =============================================================================
// Health Server
// =============================================================================

async fn run_health_server(addr: SocketAddr) -> Result<()> {
    use hyper::service::{make_service_fn, service_fn};
    use hyper::{Body, Request, Response, Server, StatusCode};

    let make_svc = make_service_fn(|_conn| async {
        Ok::<_, std::convert::Infallible>(service_fn(|req: Request<Body>| async move {
            let (status, body) = match req.uri().path() {
                "/healthz" | "/livez" | "/readyz" => (StatusCode::OK, "ok"),
                _ => (StatusCode::NOT_FOUND, "not found"),
            };
            let mut response = Response::new(Body::from(body));
            *response.status_mut() = status;
            Ok::<_, std::convert::Infallible>(response)
        }))
    });

    info!("Health server listening on {}", addr);
    Server::bind(&addr)
        .serve(make_svc)
        .await
        .map_err(|e| Error::Internal(format!("Health server error: {}", e)))?;

    Ok(())
}

// =============================================================================
// Metrics Server
// =============================================================================

async fn run_metrics_server(addr: SocketAddr, metrics: ApiMetrics) -> Result<()> {
    use hyper::header::{HeaderValue, CONTENT_TYPE};
    use hyper::service::{make_service_fn, service_fn};
    use hyper::{Body, Request, Response, Server, StatusCode};

    let make_svc = make_service_fn(move |_conn| {
        let metrics = metrics.clone();
        async move {
            Ok::<_, std::convert::Infallible>(service_fn(move |req: Request<Body>| {
                let metrics = metrics.clone();
                async move {
                    let response = if req.uri().path() != "/metrics" {
                        let mut response = Response::new(Body::from("not found"));
                        *response.status_mut() = StatusCode::NOT_FOUND;
                        response
                    } else {
                        match metrics.encode() {
                            Ok((content_type, buffer)) => {
                                let mut response = Response::new(Body::from(buffer));
                                if let Ok(value) = HeaderValue::from_str(&content_type) {
                                    response.headers_mut().insert(CONTENT_TYPE, value);
                                }
                                response
                            }
                            Err(e) => {
                                error!("Failed to encode metrics: {}", e);
                                let mut response = Response::new(Body::from(e.to_string()));
                                *response.status_mut() = StatusCode::INTERNAL_SERVER_ERROR;
                                response
                            }
                        }
                    };
                    Ok::<_, std::convert::Infallible>(response)
                }
            }))
        }
    });

    info!("Metrics server listening on {}", addr);
    Server::bind(&addr)
        .serve(make_svc)
        .await
        .map_err(|e| Error::Internal(format!("Metrics server error: {}", e)))?;

    Ok(())
}
