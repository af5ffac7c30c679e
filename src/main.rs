use std::{future::IntoFuture, process, sync::Arc};

use flagforge::{
    application::{
        cache::FlagCache,
        error::AppError,
        flags::FeatureFlagService,
        notify::Notifier,
        repos::{FlagsRepo, FlagsWriteRepo},
    },
    cache::{CacheConfig, FlagStore},
    config,
    infra::{
        db::PostgresRepositories,
        error::InfraError,
        http::{self, ApiState, HealthProbe, RouterState},
        notify::SlackNotifier,
        telemetry,
    },
};
use tokio::sync::oneshot;
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
    let (cli_args, settings) = config::load_with_cli()
        .map_err(|err| AppError::unexpected(format!("failed to load configuration: {err}")))?;

    let command = cli_args
        .command
        .unwrap_or(config::Command::Serve(Box::<config::ServeArgs>::default()));

    telemetry::init(&settings.logging).map_err(AppError::from)?;

    match command {
        config::Command::Serve(_) => run_serve(settings).await,
        config::Command::Migrate(_) => run_migrate(settings).await,
    }
}

async fn run_migrate(settings: config::Settings) -> Result<(), AppError> {
    init_repositories(&settings).await?;
    info!(target = "flagforge::migrate", "database migrations applied");
    Ok(())
}

async fn run_serve(settings: config::Settings) -> Result<(), AppError> {
    let repositories = init_repositories(&settings).await?;
    let service = build_flag_service(repositories.clone(), &settings)?;

    let health: Arc<dyn HealthProbe> = repositories;
    let router = http::build_router(RouterState {
        api: ApiState::new(service),
        health,
    });

    serve_http(&settings, router).await
}

async fn init_repositories(
    settings: &config::Settings,
) -> Result<Arc<PostgresRepositories>, AppError> {
    let database_url = settings
        .database
        .url
        .as_ref()
        .ok_or_else(|| InfraError::configuration("database url is not configured"))
        .map_err(AppError::from)?;

    let pool = PostgresRepositories::connect(database_url, settings.database.max_connections.get())
        .await
        .map_err(|err| AppError::from(InfraError::database(err.to_string())))?;

    PostgresRepositories::run_migrations(&pool)
        .await
        .map_err(|err| AppError::from(InfraError::database(err.to_string())))?;

    Ok(Arc::new(PostgresRepositories::new(pool)))
}

fn build_flag_service(
    repositories: Arc<PostgresRepositories>,
    settings: &config::Settings,
) -> Result<FeatureFlagService, AppError> {
    let reader: Arc<dyn FlagsRepo> = repositories.clone();
    let writer: Arc<dyn FlagsWriteRepo> = repositories;
    let mut service = FeatureFlagService::new(reader, writer);

    let cache_config = CacheConfig::from(&settings.cache);
    if cache_config.enabled {
        let store: Arc<dyn FlagCache> = Arc::new(FlagStore::new(&cache_config));
        service = service.with_cache(store);
        info!(
            target = "flagforge::bootstrap",
            namespace = %cache_config.namespace,
            capacity = cache_config.capacity,
            ttl_seconds = cache_config.ttl_seconds,
            "flag cache enabled"
        );
    } else {
        warn!(
            target = "flagforge::bootstrap",
            "flag cache disabled; every read hits the database"
        );
    }

    if let Some(url) = settings.notifier.slack_webhook_url.as_deref() {
        let notifier = SlackNotifier::new(url, settings.notifier.filter.clone())
            .and_then(|notifier| {
                notifier.with_headers(
                    settings
                        .notifier
                        .headers
                        .iter()
                        .map(|(name, value)| (name.as_str(), value.as_str())),
                )
            })
            .map_err(AppError::from)?;
        let notifier: Arc<dyn Notifier> = Arc::new(notifier);
        service = service.with_notifier(notifier);
        info!(target = "flagforge::bootstrap", "slack notifier enabled");
    }

    Ok(service)
}

async fn serve_http(settings: &config::Settings, router: axum::Router) -> Result<(), AppError> {
    let listener = tokio::net::TcpListener::bind(settings.server.addr)
        .await
        .map_err(|err| AppError::from(InfraError::from(err)))?;

    info!(
        target = "flagforge::serve",
        addr = %settings.server.addr,
        "listening"
    );

    let (signalled_tx, signalled_rx) = oneshot::channel::<()>();
    let server = axum::serve(listener, router.into_make_service()).with_graceful_shutdown(
        async move {
            shutdown_signal().await;
            let _ = signalled_tx.send(());
        },
    );

    let drain_timeout = settings.server.graceful_shutdown;
    tokio::select! {
        result = server.into_future() => {
            result.map_err(|err| AppError::unexpected(format!("server error: {err}")))?;
        }
        _ = async {
            if signalled_rx.await.is_ok() {
                tokio::time::sleep(drain_timeout).await;
            } else {
                std::future::pending::<()>().await;
            }
        } => {
            warn!(
                target = "flagforge::serve",
                timeout_secs = drain_timeout.as_secs(),
                "graceful shutdown timed out; dropping open connections"
            );
        }
    }

    info!(target = "flagforge::serve", "server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            error!(error = %err, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                error!(error = %err, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    info!(target = "flagforge::serve", "shutdown signal received");
}
