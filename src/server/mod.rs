mod request;

pub use request::{BodyError, PlayMetadata};

use crate::shutdown::ShutdownSignal;
use crate::sound::{Dispatcher, PlayError};
use anyhow::Result;
use axum::{
    body::Bytes,
    extract::{ConnectInfo, RawQuery, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use std::net::{SocketAddr, TcpListener};

const EVENT_LIST_ALL: &str = "list_all";
const EVENT_PLAY_SOUND: &str = "play_sound";

#[derive(Clone)]
pub struct AppState {
    dispatcher: Dispatcher,
}

impl AppState {
    pub fn new(dispatcher: Dispatcher) -> Self {
        Self { dispatcher }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/all", get(list_all))
        .route("/sfx", post(play_sfx))
        .with_state(state)
}

/// Serves until `shutdown` fires, then lets in-flight requests finish.
pub async fn serve(listener: TcpListener, state: AppState, shutdown: ShutdownSignal) -> Result<()> {
    listener.set_nonblocking(true)?;
    let address = listener.local_addr()?;
    let app = router(state).into_make_service_with_connect_info::<SocketAddr>();

    tracing::info!(address = %address, "Cybersonicd is listening");
    axum::Server::from_tcp(listener)?
        .serve(app)
        .with_graceful_shutdown(shutdown.wait())
        .await?;
    tracing::info!("HTTP server stopped");
    Ok(())
}

async fn list_all(
    State(state): State<AppState>,
    ConnectInfo(remote): ConnectInfo<SocketAddr>,
) -> String {
    tracing::info!(
        method = "GET",
        event_type = EVENT_LIST_ALL,
        remote_addr = %remote,
        "Sound files list"
    );

    state
        .dispatcher
        .registry()
        .names()
        .iter()
        .map(|name| format!("{}\n", name))
        .collect()
}

/// First `name` value in the query string; later repeats are ignored.
fn sfx_name(query: Option<&str>) -> String {
    query
        .and_then(|raw| {
            url::form_urlencoded::parse(raw.as_bytes())
                .find(|(key, _)| key == "name")
                .map(|(_, value)| value.into_owned())
        })
        .unwrap_or_default()
}

async fn play_sfx(
    State(state): State<AppState>,
    ConnectInfo(remote): ConnectInfo<SocketAddr>,
    RawQuery(query): RawQuery,
    body: Bytes,
) -> Response {
    let sfx_name = sfx_name(query.as_deref());
    let request_id = uuid::Uuid::new_v4();

    let meta = match PlayMetadata::from_body(&body) {
        Ok(meta) => meta,
        Err(err) => {
            tracing::error!(
                %request_id,
                error = %err,
                sfx_name = %sfx_name,
                event_type = EVENT_PLAY_SOUND,
                remote_addr = %remote,
                "Request body decoding failed"
            );
            return (StatusCode::BAD_REQUEST, "Invalid request body").into_response();
        }
    };

    tracing::debug!(
        %request_id,
        sfx_name = %sfx_name,
        sound_file = %state.dispatcher.registry().file_name(&sfx_name),
        name = %meta.name,
        id = meta.id,
        message = %meta.message,
        timestamp = %meta.timestamp,
        method = "POST",
        event_type = EVENT_PLAY_SOUND,
        remote_addr = %remote,
        "Sound play request details"
    );
    tracing::info!(
        %request_id,
        sfx_name = %sfx_name,
        name = %meta.name,
        id = meta.id,
        message = %meta.message,
        event_type = EVENT_PLAY_SOUND,
        "Sound play request"
    );

    match state.dispatcher.play(&sfx_name) {
        Ok(ack) => (StatusCode::OK, format!("Playing sound: {}\n", ack.file_name)).into_response(),
        Err(PlayError::NotFound(file_name)) => {
            tracing::warn!(
                %request_id,
                sound_name = %file_name,
                event_type = EVENT_PLAY_SOUND,
                "Sound not found"
            );
            (StatusCode::NOT_FOUND, "Sound not found").into_response()
        }
        Err(PlayError::Output(err)) => {
            tracing::error!(
                %request_id,
                sfx_name = %sfx_name,
                error = %err,
                event_type = EVENT_PLAY_SOUND,
                "Playback failed"
            );
            (StatusCode::INTERNAL_SERVER_ERROR, "Playback failed").into_response()
        }
    }
}
