//! Conversation endpoints: run the engine against an existing roster and
//! fetch persisted transcripts.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;

use troupe_core::error::ServerError;
use troupe_core::state::AppState;
use troupe_core::store::ConversationSink;
use troupe_core::workflow::RunStatus;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/{id}/conversations", post(start_conversation))
        .route("/{id}/conversations/{conversation_id}", get(get_conversation))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StartConversationRequest {
    user_input: String,
}

/// Run one conversation for a use case, from the user's message to
/// termination, persisting every turn as it is appended.
///
/// A FAILED run maps to a structured error carrying the failure reason and
/// the transcript present at failure — never a truncated "success".
async fn start_conversation(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<StartConversationRequest>,
) -> Result<Response, ServerError> {
    state
        .use_case_store
        .get(&id)
        .await?
        .ok_or_else(|| ServerError::NotFound(format!("Use case {} not found", id)))?;

    let graph = match state.workflow_cache.get(&id).await {
        Some(graph) => graph,
        None => {
            let roster = state.use_case_store.load_roster(&id).await?;
            if roster.is_empty() {
                return Err(ServerError::NotFound(format!(
                    "Use case {} has no agents",
                    id
                )));
            }
            state.workflow_cache.get_or_build(&id, roster).await?
        }
    };

    let conversation = state.conversation_store.create(&id).await?;
    tracing::info!(
        "starting conversation {} for use case {} with input: {}",
        conversation.id,
        id,
        body.user_input
    );

    let sink = ConversationSink::new(state.conversation_store.clone(), conversation.id.clone());
    let report = state
        .engine
        .run(&graph, &body.user_input, Some(&sink), None)
        .await;

    if !report.persistence_failures.is_empty() {
        tracing::warn!(
            "conversation {} had {} persistence failures",
            conversation.id,
            report.persistence_failures.len()
        );
    }

    match report.status {
        RunStatus::Terminated { final_response } => {
            state.conversation_store.mark_terminated(&conversation.id).await?;
            Ok(Json(serde_json::json!({
                "conversationId": conversation.id,
                "finalResponse": final_response,
            }))
            .into_response())
        }
        RunStatus::Failed { error } => {
            let reason = error.to_string();
            state
                .conversation_store
                .mark_failed(&conversation.id, &reason)
                .await?;
            Ok((
                StatusCode::BAD_GATEWAY,
                Json(serde_json::json!({
                    "error": reason,
                    "conversationId": conversation.id,
                    "messages": report.state.messages(),
                })),
            )
                .into_response())
        }
        RunStatus::Cancelled => {
            state
                .conversation_store
                .mark_failed(&conversation.id, "cancelled")
                .await?;
            Ok((
                StatusCode::BAD_GATEWAY,
                Json(serde_json::json!({
                    "error": "cancelled",
                    "conversationId": conversation.id,
                    "messages": report.state.messages(),
                })),
            )
                .into_response())
        }
    }
}

async fn get_conversation(
    State(state): State<AppState>,
    Path((id, conversation_id)): Path<(String, String)>,
) -> Result<Json<serde_json::Value>, ServerError> {
    let conversation = state
        .conversation_store
        .get(&conversation_id)
        .await?
        .filter(|c| c.use_case_id == id)
        .ok_or_else(|| {
            ServerError::NotFound(format!("Conversation {} not found", conversation_id))
        })?;

    let transcript = state.conversation_store.transcript(&conversation.id).await?;

    Ok(Json(serde_json::json!({
        "conversation": conversation,
        "messages": transcript,
    })))
}
