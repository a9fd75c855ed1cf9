use axum::{
    extract::DefaultBodyLimit,
    routing::{delete, get, post},
    Router,
};
use onboarding::{CustomerService, CustomerStore};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

pub mod error;
pub mod handlers;

/// The shared application state that all handlers can access.
pub struct AppState<S> {
    pub service: CustomerService<S>,
}

/// Builds the customer routes over any storage backend.
pub fn router<S: CustomerStore>(service: CustomerService<S>) -> Router {
    let app_state = Arc::new(AppState { service });

    Router::new()
        .route("/", get(handlers::home))
        .route("/health", get(handlers::health::<S>))
        .route("/readCustomer/:id", get(handlers::read_customer::<S>))
        .route("/createCustomer", post(handlers::create_customer::<S>))
        .route("/deleteCustomer/:id", delete(handlers::delete_customer::<S>))
        .with_state(app_state)
        .layer(TraceLayer::new_for_http())
        .layer(DefaultBodyLimit::max(64 * 1024))
}

/// The main function to configure and run the web server.
pub async fn run_server<S: CustomerStore>(addr: SocketAddr, service: CustomerService<S>) -> anyhow::Result<()> {
    let app = router(service);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Web server started and listening on {}", addr);
    axum::serve(listener, app).await?;

    Ok(())
}
