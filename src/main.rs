mod cache;
mod config;
mod error;
mod media;
mod middleware;
mod models;
mod pagination;
mod routes;
mod schema;
mod services;
mod state;
#[cfg(test)]
mod tests;

use std::sync::Arc;
use std::time::Duration;

use axum::http::header;
use axum::Router;
use diesel_async::async_connection_wrapper::AsyncConnectionWrapper;
use diesel_async::pooled_connection::deadpool::Pool;
use diesel_async::pooled_connection::AsyncDieselConnectionManager;
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};
use tower::ServiceBuilder;
use tower_http::compression::CompressionLayer;
use tower_http::set_header::SetResponseHeaderLayer;
use tracing::*;
use tracing_forest::ForestLayer;
use tracing_subscriber::{prelude::*, EnvFilter};

use crate::cache::PageCache;
use crate::media::MediaStore;
use crate::middleware::logging::HttpLoggingExt;
use crate::services::AppServiceDb;
use crate::state::AppState;

const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cfg = config::load()?;

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(ForestLayer::default())
        .init();

    run_migrations(cfg.database_url.clone()).await?;

    info!("starting DB pool");
    let mgr = AsyncDieselConnectionManager::<diesel_async::AsyncPgConnection>::new(
        &cfg.database_url,
    );
    let pool = Pool::builder(mgr).max_size(10).build()?;

    let svc = AppServiceDb::new(pool);
    let tera = state::load_templates()?;

    let state = AppState {
        svc,
        tera: Arc::new(tera),
        cache: PageCache::new(Duration::from_secs(cfg.index_cache_secs)),
        media: MediaStore::new(cfg.media_root.clone()),
        session_ttl: chrono::Duration::hours(cfg.session_ttl_hours),
    };

    let assets = |dir: &str| {
        ServiceBuilder::new()
            .layer(SetResponseHeaderLayer::if_not_present(
                header::CACHE_CONTROL,
                header::HeaderValue::from_static("max-age=86400"),
            ))
            .layer(CompressionLayer::new())
            .service(tower_http::services::ServeDir::new(dir))
    };

    let app = Router::new()
        .nest_service("/static", assets("./static"))
        .nest_service(
            "/media",
            assets(&cfg.media_root.to_string_lossy()),
        )
        .merge(routes::router::<AppServiceDb>())
        .with_state(state)
        .with_http_logging();

    let listener = tokio::net::TcpListener::bind(&cfg.listen_addr).await?;
    info!("listening at {}", cfg.listen_addr);
    axum::serve(listener, app.into_make_service()).await?;

    Ok(())
}

/// Apply pending migrations before the pool comes up. The embedded
/// migration harness is synchronous, so it runs on a blocking thread over
/// a wrapped async connection.
async fn run_migrations(database_url: String) -> anyhow::Result<()> {
    tokio::task::spawn_blocking(move || {
        use diesel::Connection;

        let mut conn =
            AsyncConnectionWrapper::<diesel_async::AsyncPgConnection>::establish(&database_url)?;
        let applied = conn
            .run_pending_migrations(MIGRATIONS)
            .map_err(|e| anyhow::anyhow!("migrations failed: {e}"))?;
        for version in applied {
            info!(%version, "applied migration");
        }
        Ok(())
    })
    .await?
}
