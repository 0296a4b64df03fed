mod context;
pub mod handler;
mod payload;
mod serializer;

pub use context::RequestContext;

use crate::repositories::Store;
use anyhow::Context;
use axum::Router;
use axum::routing::get;
use handler::{authors, books};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

#[derive(Debug)]
pub struct AppState<S> {
    store: Arc<S>,
}

impl<S> AppState<S> {
    pub fn new(store: S) -> Self {
        Self {
            store: Arc::new(store),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }
}

impl<S> Clone for AppState<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

#[derive(Debug)]
pub struct HttpServerConfig {
    port: u16,
}

impl HttpServerConfig {
    pub const fn new(port: u16) -> Self {
        Self { port }
    }
}

pub struct HttpServer {
    router: Router,
    listener: TcpListener,
}

impl HttpServer {
    pub async fn new<S: Store>(
        state: AppState<S>,
        config: HttpServerConfig,
    ) -> anyhow::Result<Self> {
        let router = router(state);

        let listener = TcpListener::bind(format!("0.0.0.0:{}", config.port))
            .await
            .with_context(|| format!("Failed to bind to port {}", config.port))?;

        Ok(Self { router, listener })
    }

    pub async fn run(self) -> anyhow::Result<()> {
        tracing::info!(
            "Listening on {}",
            self.listener
                .local_addr()
                .context("Failed to read listener address")?
        );
        axum::serve(self.listener, self.router)
            .with_graceful_shutdown(shutdown_signal())
            .await
            .context("Received error from running server")?;
        Ok(())
    }
}

/// Builds the full application router over the given store.
pub fn router<S: Store>(state: AppState<S>) -> Router {
    Router::new()
        .merge(book_routes())
        .merge(author_routes())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn book_routes<S: Store>() -> Router<AppState<S>> {
    Router::new()
        .route(
            "/books/",
            get(books::list_books::<S>).post(books::create_book::<S>),
        )
        .route(
            "/books/{id}/",
            get(books::get_book::<S>)
                .put(books::replace_book::<S>)
                .patch(books::patch_book::<S>)
                .delete(books::delete_book::<S>),
        )
}

fn author_routes<S: Store>() -> Router<AppState<S>> {
    Router::new()
        .route(
            "/authors/",
            get(authors::list_authors::<S>).post(authors::create_author::<S>),
        )
        .route(
            "/authors/{id}/",
            get(authors::get_author::<S>)
                .put(authors::replace_author::<S>)
                .patch(authors::patch_author::<S>)
                .delete(authors::delete_author::<S>),
        )
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {err}");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutting down");
}
