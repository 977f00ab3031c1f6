//! Intake conversation endpoints
//!
//! Text turns for web clients, audio turns for the speech pipeline.

use std::sync::Arc;

use axum::{
    Json, Router,
    body::Bytes,
    extract::{Query, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::ApiState;
use crate::Error;
use crate::engine::{SlotFillingEngine, Turn, TurnHandler};

/// Build the intake router
pub fn router(state: Arc<ApiState>) -> Router {
    Router::new()
        .route("/session", post(open_session))
        .route("/text", post(text_turn))
        .route("/audio", post(audio_turn))
        .route("/log", get(log))
        .with_state(state)
}

/// Response to opening a session
#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub session_id: String,
    /// Opening line: greeting plus the first question
    pub reply: String,
}

/// Open a new session and return its opening line
async fn open_session(
    State(state): State<Arc<ApiState>>,
) -> Result<Json<SessionResponse>, IntakeError> {
    let session_id = uuid::Uuid::new_v4().to_string();
    let engine = state.session(&session_id).await?;
    let reply = engine.lock().await.opening();

    Ok(Json(SessionResponse { session_id, reply }))
}

/// One text turn
#[derive(Debug, Deserialize)]
pub struct TextTurnRequest {
    pub session_id: String,
    pub utterance: String,
}

/// Outcome of a turn
#[derive(Debug, Serialize)]
pub struct TurnResponse {
    pub session_id: String,
    pub reply: String,
    /// True when this turn completed a record
    pub done: bool,
    /// The persisted record, present on completion
    #[serde(skip_serializing_if = "Option::is_none")]
    pub record: Option<Value>,
}

/// Apply one utterance to a session's engine, mapping conversation-
/// survivable errors to a re-prompt (same policy as `DialogueSession`)
fn drive_turn(
    engine: &mut SlotFillingEngine,
    utterance: &str,
) -> Result<(String, bool, Option<Value>), IntakeError> {
    match engine.apply(utterance) {
        Ok(Turn::Completion { reply, record, .. }) => Ok((reply, true, Some(record))),
        Ok(turn) => Ok((turn.reply().to_string(), false, None)),
        Err(Error::InvalidInput(reason)) => {
            tracing::debug!(%reason, "no-op turn");
            Ok((engine.reprompt(), false, None))
        }
        Err(Error::Storage(reason)) => {
            tracing::warn!(%reason, "record not persisted");
            Ok((engine.reprompt(), false, None))
        }
        Err(e) => Err(IntakeError::Turn(e.to_string())),
    }
}

/// Take one text turn in a session
async fn text_turn(
    State(state): State<Arc<ApiState>>,
    Json(request): Json<TextTurnRequest>,
) -> Result<Json<TurnResponse>, IntakeError> {
    let engine = state.session(&request.session_id).await?;
    let mut engine = engine.lock().await;

    let (reply, done, record) = drive_turn(&mut engine, &request.utterance)?;

    Ok(Json(TurnResponse {
        session_id: request.session_id,
        reply,
        done,
        record,
    }))
}

/// Query parameters for an audio turn
#[derive(Debug, Deserialize)]
pub struct AudioParams {
    pub session_id: String,
}

/// Take one spoken turn: WAV in, MP3 reply out
async fn audio_turn(
    State(state): State<Arc<ApiState>>,
    Query(params): Query<AudioParams>,
    body: Bytes,
) -> Result<Response, IntakeError> {
    let stt = state
        .stt
        .as_ref()
        .ok_or(IntakeError::NotConfigured("STT not configured"))?;
    let tts = state
        .tts
        .as_ref()
        .ok_or(IntakeError::NotConfigured("TTS not configured"))?;

    if body.is_empty() {
        return Err(IntakeError::BadRequest("empty audio data"));
    }

    let utterance = stt
        .transcribe(&body)
        .await
        .map_err(|e| IntakeError::Transcription(e.to_string()))?;

    let engine = state.session(&params.session_id).await?;
    let mut engine = engine.lock().await;
    let (reply, _, _) = drive_turn(&mut engine, &utterance)?;
    drop(engine);

    let audio = tts
        .synthesize(&reply)
        .await
        .map_err(|e| IntakeError::Synthesis(e.to_string()))?;

    Ok((
        StatusCode::OK,
        [(header::CONTENT_TYPE, "audio/mpeg")],
        audio,
    )
        .into_response())
}

/// The recorded entries
async fn log(State(state): State<Arc<ApiState>>) -> Json<Vec<Value>> {
    Json(state.store.load())
}

/// Intake API errors
#[derive(Debug)]
pub enum IntakeError {
    NotConfigured(&'static str),
    BadRequest(&'static str),
    Transcription(String),
    Synthesis(String),
    Turn(String),
    Session(String),
}

impl From<Error> for IntakeError {
    fn from(e: Error) -> Self {
        Self::Session(e.to_string())
    }
}

impl IntoResponse for IntakeError {
    fn into_response(self) -> Response {
        #[derive(Serialize)]
        struct ErrorResponse {
            error: ErrorBody,
        }

        #[derive(Serialize)]
        struct ErrorBody {
            code: &'static str,
            message: String,
        }

        let (status, code, message) = match self {
            Self::NotConfigured(msg) => (
                StatusCode::SERVICE_UNAVAILABLE,
                "not_configured",
                msg.to_string(),
            ),
            Self::BadRequest(msg) => (StatusCode::BAD_REQUEST, "bad_request", msg.to_string()),
            Self::Transcription(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "transcription_failed",
                msg,
            ),
            Self::Synthesis(msg) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "synthesis_failed", msg)
            }
            Self::Turn(msg) => (StatusCode::INTERNAL_SERVER_ERROR, "turn_failed", msg),
            Self::Session(msg) => (StatusCode::INTERNAL_SERVER_ERROR, "session_failed", msg),
        };

        (
            status,
            Json(ErrorResponse {
                error: ErrorBody { code, message },
            }),
        )
            .into_response()
    }
}
