use std::future::IntoFuture;
use std::process::ExitCode;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

use gridgrab_server::build_app;
use gridgrab_server::config::ServerConfig;

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let json = std::env::var("GRIDGRAB_LOG_FORMAT").is_ok_and(|v| v.eq_ignore_ascii_case("json"));
    if json {
        tracing_subscriber::fmt().json().with_env_filter(filter).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    init_tracing();
    std::panic::set_hook(Box::new(|info| {
        tracing::error!(panic = %info, "Panic");
    }));

    let config = ServerConfig::load();
    if let Err(e) = config.validate() {
        tracing::error!(error = %e, "Invalid configuration");
        return ExitCode::FAILURE;
    }

    let addr = config.listen_addr.clone();
    let grace = Duration::from_secs(config.shutdown.grace_period_secs);
    let shutdown = CancellationToken::new();
    let (app, _state, game_loop) = build_app(config, shutdown.clone());

    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(l) => l,
        Err(e) => {
            tracing::error!(%addr, error = %e, "Failed to bind");
            return ExitCode::FAILURE;
        },
    };
    tracing::info!(%addr, "gridgrab server listening");

    tokio::spawn(watch_for_shutdown(shutdown.clone(), game_loop));

    let token = shutdown.clone();
    let serve = axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            token.cancelled().await;
        })
        .into_future();
    let deadline = async {
        shutdown.cancelled().await;
        tokio::time::sleep(grace).await;
    };

    tokio::select! {
        res = serve => {
            if let Err(e) = res {
                tracing::error!(error = %e, "Server error");
                return ExitCode::FAILURE;
            }
        },
        _ = deadline => {
            tracing::warn!(grace_secs = grace.as_secs(), "Grace period elapsed, exiting");
        },
    }
    tracing::info!("gridgrab server stopped");
    ExitCode::SUCCESS
}

/// Cancel `shutdown` on ctrl-c, SIGTERM, or the game loop dying.
async fn watch_for_shutdown(shutdown: CancellationToken, mut game_loop: JoinHandle<()>) {
    tokio::select! {
        _ = terminate_signal() => {
            tracing::info!("Shutdown signal received");
        },
        res = &mut game_loop => {
            match res {
                Ok(()) => tracing::warn!("Game loop exited"),
                Err(e) => tracing::error!(error = %e, "Game loop task failed"),
            }
        },
        _ = shutdown.cancelled() => {},
    }
    shutdown.cancel();
}

async fn terminate_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let term = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            },
            Err(e) => {
                tracing::error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            },
        }
    };
    #[cfg(not(unix))]
    let term = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = term => {},
    }
}
