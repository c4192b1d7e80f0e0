use crate::prelude::*;
use axum::{
    extract::State,
    http::StatusCode,
    response::{
        sse::{Event, Sse},
        IntoResponse, Response,
    },
    routing::{get, post},
    Json, Router,
};
use futures::stream::{self, Stream};
use std::convert::Infallible;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

use super::{shutdown_signal, Context};

pub async fn run_sse(options: super::cli::SseOptions, ctx: Context) -> Result<()> {
    let addr = format!("{}:{}", options.host, options.port);

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app_router = router(Arc::new(ctx)).layer(cors);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| eyre!("Failed to bind to {}: {}", addr, e))?;

    log::info!("MCP server listening on http://{addr}");
    log::info!("SSE endpoint: http://{addr}/sse");
    log::info!("Message endpoint: http://{addr}/message");

    axum::serve(listener, app_router)
        .with_graceful_shutdown(async {
            shutdown_signal().await;
            log::info!("Shutdown signal received, draining connections");
        })
        .await
        .map_err(|e| eyre!("Server error: {e}"))?;

    log::info!("MCP server stopped");
    Ok(())
}

fn router(ctx: Arc<Context>) -> Router {
    Router::new()
        .route("/sse", get(sse_handler))
        .route("/message", post(message_handler))
        .with_state(ctx)
}

async fn sse_handler(
    State(_ctx): State<Arc<Context>>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let stream = stream::once(async { Ok(Event::default().data("MCP SSE endpoint ready")) });
    Sse::new(stream)
}

async fn message_handler(
    State(ctx): State<Arc<Context>>,
    Json(request): Json<serde_json::Value>,
) -> Response {
    let request_str = request.to_string();

    match super::handle_request(&request_str, &ctx).await {
        Some(response) => match serde_json::to_value(response) {
            Ok(value) => Json(value).into_response(),
            Err(e) => {
                log::error!("Failed to serialize response: {e}");
                StatusCode::INTERNAL_SERVER_ERROR.into_response()
            }
        },
        None => StatusCode::NO_CONTENT.into_response(),
    }
}
