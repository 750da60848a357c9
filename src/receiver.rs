use crate::dispatcher::Dispatcher;
use crate::error::ReceiveError;
use crate::types::IncomingEvent;
use axum::{
    body::{self, Body},
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
    Router,
};
use std::future::Future;
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tracing::{info, info_span, warn, Instrument};

#[derive(Clone)]
pub struct ServerState {
    pub dispatcher: Dispatcher,
    pub body_limit: usize,
}

pub fn router(state: ServerState) -> Router {
    Router::new()
        .route("/", post(handle_webhook))
        .with_state(state)
}

/// Bind the listener. Kept separate from `serve` so the bound port is known
/// before any request is accepted.
pub async fn bind(addr: SocketAddr) -> std::io::Result<(TcpListener, SocketAddr)> {
    let listener = TcpListener::bind(addr).await?;
    let local = listener.local_addr()?;
    info!(addr = %local, "webhook receiver listening");
    Ok((listener, local))
}

pub async fn serve(
    listener: TcpListener,
    state: ServerState,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> std::io::Result<()> {
    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown)
        .await
}

async fn handle_webhook(State(state): State<ServerState>, body: Body) -> Response {
    let delivery_id = uuid::Uuid::new_v4();
    let span = info_span!("webhook", %delivery_id);
    async move {
        match receive(&state, body).await {
            Ok(response) => response,
            Err(e) => {
                match &e {
                    ReceiveError::BodyRead(cause) => {
                        warn!(error = %cause, "couldn't read request body")
                    }
                    ReceiveError::InvalidJson(cause) => {
                        warn!(error = %cause, "error parsing JSON body")
                    }
                }
                e.into_response()
            }
        }
    }
    .instrument(span)
    .await
}

async fn receive(state: &ServerState, body: Body) -> Result<Response, ReceiveError> {
    let bytes = body::to_bytes(body, state.body_limit)
        .await
        .map_err(ReceiveError::BodyRead)?;
    // A bare `null` body is an empty event, not a decode failure.
    let event = serde_json::from_slice::<Option<IncomingEvent>>(&bytes)?.unwrap_or_default();

    info!(id = %event.id, "received incoming request");

    let Some(notification) = event.notification() else {
        return Ok(StatusCode::NOT_FOUND.into_response());
    };

    // Not awaited: the response goes out regardless of the push outcome.
    drop(state.dispatcher.dispatch(notification));

    Ok((StatusCode::OK, format!("{}\n", event.event_type)).into_response())
}
