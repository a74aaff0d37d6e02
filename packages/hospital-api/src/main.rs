use clap::Parser;
use hospital_api::api::{self, AppState};
use hospital_api::config::HospitalConfig;
use hospital_api::error::Error;
use hospital_api::{cli, connect, log, prometheus, store, Args};
use tokio::signal::unix::{signal, SignalKind};
use tracing::{error, info, warn};

fn main() {
    let args = Args::parse();

    let config = match HospitalConfig::load(&args) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("Configuration Error: {}", err);
            std::process::exit(exitcode::CONFIG);
        }
    };

    log::init(config.log.clone());

    let _ = rustls::crypto::aws_lc_rs::default_provider().install_default();

    let runtime = match tokio::runtime::Builder::new_multi_thread()
        .worker_threads(config.server.worker_threads)
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(err) => {
            error!(msg = "Could not start runtime", error = err.to_string());
            std::process::exit(exitcode::OSERR);
        }
    };

    runtime.block_on(async move {
        let exit = match run(args, config).await {
            Ok(()) => exitcode::OK,
            Err(err @ (Error::Config(_) | Error::Prometheus(_))) => {
                error!(msg = "Could not start Hospital API", error = err.to_string());
                exitcode::CONFIG
            }
            Err(err @ (Error::DatabaseConnection { .. } | Error::ConnectionTimeout(_))) => {
                error!(msg = "Could not start Hospital API", error = err.to_string());
                exitcode::UNAVAILABLE
            }
            Err(err) => {
                error!(msg = "Hospital API stopped", error = err.to_string());
                exitcode::SOFTWARE
            }
        };

        if exit != exitcode::OK {
            std::process::exit(exit);
        }
    });
}

async fn run(args: Args, config: HospitalConfig) -> Result<(), Error> {
    if !config.database.is_memory() && !config.database.with_tls_verification {
        warn!(
            msg = "Bypassing Transport Layer Security (TLS) verification for database connections"
        );
    }

    let document_store = store::connect(&config.database).await?;
    let state = AppState::new(document_store, config.auth.clone());

    if cli::run(args, state.clone(), &config).await? {
        return Ok(());
    }

    if config.database.is_memory() {
        warn!(msg = "Documents are held in memory and will be lost on shutdown");
    }

    if !config.session_required() {
        warn!(msg = "Sessions are not required, every route is open");
    }

    if config.prometheus_enabled() {
        prometheus::start(&config.server.host, config.prometheus.port)?;
    }

    let router = api::router(state, &config.server)?;
    let listener = connect::bind_with_retry(&config.server).await?;

    connect::serve(
        listener,
        router,
        shutdown_signal(),
        config.server.shutdown_timeout(),
    )
    .await
}

async fn shutdown_signal() {
    tokio::select! {
        _ = sigint() => info!(msg = "Received SIGINT"),
        _ = sigterm() => info!(msg = "Received SIGTERM"),
    }
}

async fn sigint() -> std::io::Result<()> {
    signal(SignalKind::interrupt())?.recv().await;
    Ok(())
}

async fn sigterm() -> std::io::Result<()> {
    signal(SignalKind::terminate())?.recv().await;
    Ok(())
}
