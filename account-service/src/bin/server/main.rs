use std::sync::Arc;

use account_service::config::Config;
use account_service::domain::principal::service::AuthService;
use account_service::inbound::http::router::create_router;
use account_service::outbound::documents::FsDocumentStore;
use account_service::outbound::notifications::SmtpNotifier;
use account_service::outbound::repositories::PostgresPrincipalRepository;
use account_service::outbound::roster::FileEnrollmentDirectory;
use auth::OtpGenerator;
use auth::TokenService;
use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "account_service=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!(
        service = "account-service",
        version = env!("CARGO_PKG_VERSION"),
        "Service starting"
    );

    let config = Config::load()?;

    tracing::info!(
        http_port = config.server.http_port,
        otp_window_seconds = config.otp.window_seconds,
        roster_path = %config.roster.path,
        "Configuration loaded"
    );

    let pg_pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&config.database.url)
        .await?;
    tracing::info!(
        max_connections = 5,
        database = "postgresql",
        "Database connection pool created"
    );

    sqlx::migrate!("./migrations").run(&pg_pool).await?;
    tracing::info!(database = "postgresql", "Database migrations completed");

    let tokens = Arc::new(TokenService::new(config.jwt.secret.as_bytes()));
    let repository = Arc::new(PostgresPrincipalRepository::new(pg_pool));
    let notifier = Arc::new(SmtpNotifier::new(&config.smtp)?);
    let directory = Arc::new(FileEnrollmentDirectory::load(&config.roster.path)?);
    let documents = Arc::new(FsDocumentStore::new(
        &config.documents.dir,
        &config.documents.public_base,
    ));

    let auth_service = Arc::new(AuthService::new(
        repository,
        notifier,
        directory,
        Arc::clone(&tokens),
        OtpGenerator::new(chrono::Duration::seconds(config.otp.window_seconds)),
        config.reset.url_base.clone(),
    ));

    let address = format!("0.0.0.0:{}", config.server.http_port);
    let listener = tokio::net::TcpListener::bind(&address).await?;
    tracing::info!(
        address = %address,
        port = config.server.http_port,
        protocol = "http",
        "Http server listening"
    );

    let application = create_router(auth_service, documents, tokens);
    axum::serve(listener, application).await?;

    Ok(())
}
