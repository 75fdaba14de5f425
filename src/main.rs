use std::{future::Future, process, sync::Arc};

use sitecache::{
    application::{
        error::AppError,
        pages::{PageService, PageSource},
    },
    cache::{CacheConfig, PageCache, spawn_sweeper},
    config,
    infra::{
        content::FsPageSource,
        error::InfraError,
        http::{self, AdminState, HttpState},
        telemetry,
    },
};
use tokio::{signal, sync::watch, try_join};
use tracing::{Dispatch, Level, dispatcher, error, info, warn};
use tracing_subscriber::fmt as tracing_fmt;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        report_application_error(&error);
        process::exit(1);
    }
}

fn report_application_error(error: &AppError) {
    if dispatcher::has_been_set() {
        error!(error = %error, "application error");
        return;
    }

    let subscriber = tracing_fmt().with_max_level(Level::ERROR).finish();
    let dispatch = Dispatch::new(subscriber);
    dispatcher::with_default(&dispatch, || {
        error!(error = %error, "application error");
    });
}

async fn run() -> Result<(), AppError> {
    let (cli_args, settings) = config::load_with_cli()?;

    let command = cli_args
        .command
        .unwrap_or(config::Command::Serve(Box::<config::ServeArgs>::default()));

    telemetry::init(&settings.logging).map_err(AppError::from)?;

    match command {
        config::Command::Serve(_) => run_serve(settings).await,
    }
}

async fn run_serve(settings: config::Settings) -> Result<(), AppError> {
    let content_root = &settings.content.directory;
    if !content_root.is_dir() {
        return Err(InfraError::MissingContentRoot {
            path: content_root.clone(),
        }
        .into());
    }

    let cache_config = CacheConfig::from(&settings.cache);
    let cache = Arc::new(PageCache::new());
    let source: Arc<dyn PageSource> = Arc::new(FsPageSource::new(content_root.clone()));
    let pages = Arc::new(PageService::new(
        Arc::clone(&cache),
        source,
        cache_config.clone(),
    ));

    info!(
        target = "sitecache::serve",
        enabled = cache_config.enabled,
        default_ttl_seconds = cache_config.default_ttl_seconds,
        content = %content_root.display(),
        "page cache configured"
    );

    let sweeper = cache_config
        .sweep_interval()
        .filter(|_| cache_config.enabled)
        .map(|interval| spawn_sweeper(Arc::clone(&cache), interval));

    let http_state = HttpState {
        pages: Arc::clone(&pages),
    };
    let admin_state = AdminState { pages };

    let result = serve_http(&settings, http_state, admin_state).await;

    if let Some(handle) = sweeper {
        handle.abort();
        let _ = handle.await;
    }

    result
}

async fn serve_http(
    settings: &config::Settings,
    http_state: HttpState,
    admin_state: AdminState,
) -> Result<(), AppError> {
    let public_router = http::build_router(http_state);
    let admin_router = http::build_admin_router(admin_state);

    let public_addr = settings.server.public_addr;
    let admin_addr = settings.server.admin_addr;
    let public_listener = tokio::net::TcpListener::bind(public_addr)
        .await
        .map_err(InfraError::bind(public_addr))?;
    let admin_listener = tokio::net::TcpListener::bind(admin_addr)
        .await
        .map_err(InfraError::bind(admin_addr))?;

    info!(
        target = "sitecache::serve",
        public = %public_addr,
        admin = %admin_addr,
        "listening"
    );

    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let public_server = axum::serve(public_listener, public_router.into_make_service())
        .with_graceful_shutdown(wait_for(shutdown_rx.clone()));
    let admin_server = axum::serve(admin_listener, admin_router.into_make_service())
        .with_graceful_shutdown(wait_for(shutdown_rx.clone()));
    let servers = async { try_join!(public_server, admin_server) };

    let graceful_shutdown = settings.server.graceful_shutdown;
    let deadline = async move {
        shutdown_signal().await;
        info!(
            target = "sitecache::serve",
            timeout_secs = graceful_shutdown.as_secs(),
            "shutdown requested, draining connections"
        );
        let _ = shutdown_tx.send(true);
        tokio::time::sleep(graceful_shutdown).await;
    };

    tokio::select! {
        result = servers => {
            result.map_err(InfraError::Serve)?;
        }
        _ = deadline => {
            warn!(
                target = "sitecache::serve",
                "graceful shutdown timed out; dropping open connections"
            );
        }
    }

    Ok(())
}

fn wait_for(mut rx: watch::Receiver<bool>) -> impl Future<Output = ()> + Send + 'static {
    async move {
        let _ = rx.wait_for(|stopped| *stopped).await;
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            error!(error = %err, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(err) => {
                error!(error = %err, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}
