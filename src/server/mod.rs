mod extractors;
mod handlers;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    body::Body,
    extract::Extension,
    http::Request,
    routing::{get, patch},
    Router,
};
use tower_http::trace::TraceLayer;

use crate::api::{DynAPI, API};
use crate::error::Error;
use crate::server::handlers::rides;

pub fn router<T: API + Sync + Send + 'static>(api: T) -> Router {
    let api = Arc::new(api) as DynAPI;

    Router::new()
        .route("/rides", get(rides::list_mine).post(rides::create))
        .route("/rides/:id", get(rides::find))
        .route("/rides/:id/accept", patch(rides::accept))
        .route("/rides/:id/advance", patch(rides::advance))
        .route("/rides/:id/cancel", patch(rides::cancel))
        .route("/available_rides", get(rides::available))
        .layer(Extension(api))
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
                tracing::info_span!(
                    "http_request",
                    method = %request.method(),
                    uri = %request.uri(),
                    user_id = tracing::field::Empty,
                )
            }),
        )
}

pub async fn serve<T: API + Sync + Send + 'static>(api: T, addr: SocketAddr) -> Result<(), Error> {
    let app = router(api);

    tracing::info!("listening on {}", addr);

    axum::Server::bind(&addr)
        .serve(app.into_make_service())
        .await
        .map_err(|err| Error::Server(err.to_string()))
}
