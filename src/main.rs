use anyhow::Context;
use book_catalog::auth::hash_password;
use book_catalog::config::{AdminCredentials, Config};
use book_catalog::database::SqliteStore;
use book_catalog::http::{AppState, HttpServer, HttpServerConfig};
use book_catalog::models::{CreateUserError, CreateUserRequest};
use book_catalog::repositories::CredentialRepository;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("book_catalog=info,tower_http=info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let config = Config::from_env()?;

    let store = SqliteStore::connect(config.database_url(), config.database_max_connections())
        .await?;
    tracing::info!("Connected to database at {}", config.database_url());

    if let Some(admin) = config.admin() {
        bootstrap_admin(&store, admin).await?;
    }

    let state = AppState::new(store);
    let server_config = HttpServerConfig::new(config.server_port());
    let http_server = HttpServer::new(state, server_config).await?;
    http_server.run().await
}

/// Creates the configured administrator on first start and prints its API token.
async fn bootstrap_admin(store: &SqliteStore, admin: &AdminCredentials) -> anyhow::Result<()> {
    let password_hash = hash_password(admin.password())?;
    let req = CreateUserRequest::new(admin.username(), password_hash, true);

    match store.create_user(&req).await {
        Ok(user) => {
            let token = store.issue_token(user.id()).await?;
            tracing::info!(
                "Created administrator \"{}\" with API token {token}",
                user.username()
            );
        }
        Err(CreateUserError::Duplicate { username }) => {
            tracing::info!("Administrator \"{username}\" already exists");
        }
        Err(CreateUserError::Other(err)) => {
            return Err(err).context("Failed to bootstrap administrator");
        }
    }

    Ok(())
}
