//! Application startup and lifecycle management.

use axum::{
    middleware,
    routing::{delete, get, post, put},
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::config::Settings;
use crate::error::AppError;
use crate::handlers;
use crate::middleware::{request_id_middleware, require_auth, track_requests};
use crate::services::{init_metrics, Database, JwtService};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: Settings,
    pub db: Arc<Database>,
    pub jwt: JwtService,
}

/// Application container for managing server lifecycle.
pub struct Application {
    port: u16,
    listener: TcpListener,
    state: AppState,
}

impl Application {
    /// Build the application with the given configuration.
    pub async fn build(config: Settings) -> Result<Self, AppError> {
        Self::build_internal(config, true).await
    }

    /// Build the application without running migrations. For tests where
    /// the harness has already applied them.
    pub async fn build_without_migrations(config: Settings) -> Result<Self, AppError> {
        Self::build_internal(config, false).await
    }

    async fn build_internal(config: Settings, run_migrations: bool) -> Result<Self, AppError> {
        init_metrics();

        let db = Database::new(
            &config.database.url,
            config.database.max_connections,
            config.database.min_connections,
        )
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Failed to connect to PostgreSQL");
            e
        })?;

        if run_migrations {
            db.run_migrations().await.map_err(|e| {
                tracing::error!(error = %e, "Failed to run migrations");
                e
            })?;
        }

        db.ensure_default_admin(&config.auth).await?;

        let jwt = JwtService::new(&config.auth);
        let state = AppState {
            config: config.clone(),
            db: Arc::new(db),
            jwt,
        };

        let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
        let listener = TcpListener::bind(addr).await.map_err(|e| {
            tracing::error!(error = %e, addr = %addr, "Failed to bind listener");
            AppError::from(e)
        })?;
        let port = listener.local_addr()?.port();

        tracing::info!(port = port, "Listener bound");

        Ok(Self {
            port,
            listener,
            state,
        })
    }

    /// Get the port the server is listening on.
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Get a reference to the database.
    pub fn db(&self) -> &Database {
        &self.state.db
    }

    /// Run the application until stopped.
    pub async fn run_until_stopped(self) -> std::io::Result<()> {
        let router = build_router(self.state);

        tracing::info!(
            version = env!("CARGO_PKG_VERSION"),
            port = self.port,
            "Server ready to accept connections"
        );

        axum::serve(self.listener, router).await
    }
}

/// Assemble the full router. Login, health and metrics are public; every
/// business route requires a bearer token.
pub fn build_router(state: AppState) -> Router {
    let protected = Router::new()
        .route("/api/customers", get(handlers::customers::list_customers))
        .route("/api/customers", post(handlers::customers::create_customer))
        .route("/api/customers/:id", get(handlers::customers::get_customer))
        .route("/api/customers/:id", put(handlers::customers::update_customer))
        .route("/api/customers/:id", delete(handlers::customers::delete_customer))
        .route(
            "/api/customers/:id/transactions",
            get(handlers::customers::customer_transactions),
        )
        .route(
            "/api/customers/:id/repayment",
            post(handlers::customers::record_repayment),
        )
        .route("/api/item-groups", get(handlers::items::list_item_groups))
        .route("/api/item-groups", post(handlers::items::create_item_group))
        .route("/api/item-groups/:id", put(handlers::items::update_item_group))
        .route("/api/item-groups/:id", delete(handlers::items::delete_item_group))
        .route("/api/items", get(handlers::items::list_items))
        .route("/api/items", post(handlers::items::create_item))
        .route("/api/items/:id", put(handlers::items::update_item))
        .route("/api/items/:id", delete(handlers::items::delete_item))
        .route("/api/invoices", get(handlers::invoices::list_invoices))
        .route("/api/invoices", post(handlers::invoices::create_invoice))
        .route("/api/invoices/:id", get(handlers::invoices::get_invoice))
        .route("/api/invoices/:id", put(handlers::invoices::update_invoice))
        .route("/api/invoices/:id", delete(handlers::invoices::delete_invoice))
        .route("/api/reminders", get(handlers::reminders::list_reminders))
        .route("/api/reminders", post(handlers::reminders::create_reminder))
        .route("/api/reminders/today", get(handlers::reminders::today_reminders))
        .route(
            "/api/reminders/:id/complete",
            put(handlers::reminders::complete_reminder),
        )
        .route("/api/reminders/:id", delete(handlers::reminders::delete_reminder))
        .route("/api/dashboard/stats", get(handlers::dashboard::stats))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_auth));

    Router::new()
        .route("/api/auth/login", post(handlers::auth::login))
        .route("/api/health", get(handlers::auth::health_check))
        .route("/metrics", get(handlers::auth::metrics))
        .merge(protected)
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(track_requests))
        .layer(middleware::from_fn(request_id_middleware))
        .layer(CorsLayer::permissive())
        .with_state(state)
}
