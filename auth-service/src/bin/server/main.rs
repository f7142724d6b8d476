use std::sync::Arc;

use auth::SystemClock;
use auth::TokenCodec;
use auth_service::config::Config;
use auth_service::config::StorageBackend;
use auth_service::domain::session::guard::AccessGuard;
use auth_service::domain::session::models::SessionSettings;
use auth_service::domain::session::ports::RefreshTokenRepository;
use auth_service::domain::session::service::SessionService;
use auth_service::domain::user::ports::UserRepository;
use auth_service::domain::user::service::UserService;
use auth_service::inbound::http::router::create_router;
use auth_service::outbound::repositories::InMemoryRefreshTokenRepository;
use auth_service::outbound::repositories::InMemoryUserRepository;
use auth_service::outbound::repositories::PostgresRefreshTokenRepository;
use auth_service::outbound::repositories::PostgresUserRepository;
use axum::http::HeaderValue;
use axum::Router;
use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "auth_service=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!(
        service = "auth-service",
        version = env!("CARGO_PKG_VERSION"),
        "Service starting"
    );

    let config = Config::load()?;

    tracing::info!(
        http_port = config.server.http_port,
        storage = ?config.storage.backend,
        jwt_algorithm = %config.jwt.algorithm,
        access_token_expire_minutes = config.jwt.access_token_expire_minutes,
        refresh_token_expire_days = config.jwt.refresh_token_expire_days,
        frontend_url = %config.cors.frontend_url,
        "Configuration loaded"
    );

    let algorithm = TokenCodec::parse_algorithm(&config.jwt.algorithm)?;
    let codec = Arc::new(TokenCodec::with_algorithm(
        config.jwt.secret.as_bytes(),
        algorithm,
        Arc::new(SystemClock),
    )?);
    let allowed_origin = HeaderValue::from_str(&config.cors.frontend_url)?;
    let settings = config.session_settings();

    let http_application = match config.storage.backend {
        StorageBackend::Postgres => {
            let database_url = config
                .database
                .url
                .as_deref()
                .ok_or_else(|| anyhow::anyhow!("database.url is not set"))?;

            let pg_pool = PgPoolOptions::new()
                .max_connections(config.database.max_connections)
                .connect(database_url)
                .await?;
            tracing::info!(
                max_connections = config.database.max_connections,
                database = "postgresql",
                "Database connection pool created"
            );

            sqlx::migrate!("./migrations").run(&pg_pool).await?;
            tracing::info!(database = "postgresql", "Database migrations completed");

            build_application(
                Arc::new(PostgresUserRepository::new(pg_pool.clone())),
                Arc::new(PostgresRefreshTokenRepository::new(pg_pool)),
                codec,
                settings,
                allowed_origin,
            )
        }
        StorageBackend::Memory => {
            tracing::warn!("Using in-memory storage, all data is lost on shutdown");

            build_application(
                Arc::new(InMemoryUserRepository::new()),
                Arc::new(InMemoryRefreshTokenRepository::new()),
                codec,
                settings,
                allowed_origin,
            )
        }
    };

    let http_address = format!("0.0.0.0:{}", config.server.http_port);
    let http_listener = tokio::net::TcpListener::bind(&http_address).await?;
    tracing::info!(
        address = %http_address,
        port = config.server.http_port,
        protocol = "http",
        "Http server listening"
    );

    if let Err(e) = axum::serve(http_listener, http_application).await {
        tracing::error!(error = %e, "Server error");
        return Err(e.into());
    }

    tracing::info!("Server exited successfully");

    Ok(())
}

fn build_application<UR, RR>(
    users: Arc<UR>,
    refresh_tokens: Arc<RR>,
    codec: Arc<TokenCodec>,
    settings: SessionSettings,
    allowed_origin: HeaderValue,
) -> Router
where
    UR: UserRepository,
    RR: RefreshTokenRepository,
{
    let user_service = Arc::new(UserService::new(Arc::clone(&users)));
    let session_service = Arc::new(SessionService::new(
        Arc::clone(&users),
        refresh_tokens,
        Arc::clone(&codec),
        settings,
    ));
    let access_guard = Arc::new(AccessGuard::new(users, codec));

    create_router(user_service, session_service, access_guard, allowed_origin)
}
