pub use crate::common::RouteResult;

use std::net::SocketAddr;

use axum::{
    response::{Html, IntoResponse},
    routing::{get, on},
    Json, Router,
};
use geoconsulta::{client::Client, database::Database};
use serde_json::json;
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

pub mod api;
pub mod common;
pub mod config;

use common::{route_not_found, METHOD_FILTER_ALL};

pub const SERVICE_NAME: &str = "geoconsulta";

#[derive(Clone)]
pub struct WebState<D: Database> {
    pub client: Client<D>,
    /// Include error details in responses.
    pub development: bool,
}

impl<D: Database> WebState<D> {
    pub fn new(database: D, development: bool) -> Self {
        Self {
            client: Client::new(database),
            development,
        }
    }
}

pub fn router<D: Database>(state: WebState<D>) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/health", get(health))
        .nest_service("/api", api::routes(state))
        .fallback_service(on(METHOD_FILTER_ALL, route_not_found))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

pub async fn start_web_server<D: Database>(
    address: SocketAddr,
    state: WebState<D>,
) -> std::io::Result<()> {
    let routes = router(state);

    let listener = TcpListener::bind(address).await?;
    log::info!("listening on http://{}", listener.local_addr()?);
    axum::serve(listener, routes.into_make_service()).await?;

    Ok(())
}

async fn index() -> impl IntoResponse {
    Html(include_str!("../resources/www/index.html"))
}

async fn health() -> impl IntoResponse {
    Json(json!({
        "status": "healthy",
        "service": SERVICE_NAME,
    }))
}
