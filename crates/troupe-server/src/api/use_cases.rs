//! Use-case endpoints: design a roster from a description, browse and
//! delete use cases.

use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};
use serde::Deserialize;

use troupe_core::error::ServerError;
use troupe_core::models::UseCase;
use troupe_core::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_use_cases).post(create_use_case))
        .route("/{id}", get(get_use_case_details).delete(delete_use_case))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateUseCaseRequest {
    description: String,
}

/// Receive a use-case description, let the architect design the agent team,
/// and persist the result. Nothing is written if the architect fails.
async fn create_use_case(
    State(state): State<AppState>,
    Json(body): Json<CreateUseCaseRequest>,
) -> Result<Json<serde_json::Value>, ServerError> {
    if body.description.trim().is_empty() {
        return Err(ServerError::BadRequest(
            "description must not be empty".to_string(),
        ));
    }

    tracing::info!("designing agent team for use case: {}", body.description);
    let roster = state.architect.propose(&body.description).await?;

    let use_case = UseCase::new(uuid::Uuid::new_v4().to_string(), body.description);
    state.use_case_store.save(&use_case).await?;
    state.use_case_store.save_roster(&use_case.id, &roster).await?;

    Ok(Json(serde_json::json!({
        "useCase": use_case,
        "agents": roster,
    })))
}

async fn list_use_cases(
    State(state): State<AppState>,
) -> Result<Json<serde_json::Value>, ServerError> {
    let use_cases = state.use_case_store.list().await?;

    let mut items = Vec::with_capacity(use_cases.len());
    for use_case in use_cases {
        let roster = state.use_case_store.load_roster(&use_case.id).await?;
        items.push(serde_json::json!({
            "useCase": use_case,
            "agents": roster,
        }));
    }

    Ok(Json(serde_json::json!({ "useCases": items })))
}

/// Full details for one use case: roster plus conversation history with
/// transcripts.
async fn get_use_case_details(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, ServerError> {
    let use_case = state
        .use_case_store
        .get(&id)
        .await?
        .ok_or_else(|| ServerError::NotFound(format!("Use case {} not found", id)))?;

    let roster = state.use_case_store.load_roster(&id).await?;
    let conversations = state.conversation_store.list_by_use_case(&id).await?;

    let mut history = Vec::with_capacity(conversations.len());
    for conversation in conversations {
        let transcript = state.conversation_store.transcript(&conversation.id).await?;
        history.push(serde_json::json!({
            "conversation": conversation,
            "messages": transcript,
        }));
    }

    Ok(Json(serde_json::json!({
        "useCase": use_case,
        "agents": roster,
        "conversations": history,
    })))
}

async fn delete_use_case(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, ServerError> {
    state
        .use_case_store
        .get(&id)
        .await?
        .ok_or_else(|| ServerError::NotFound(format!("Use case {} not found", id)))?;

    state.use_case_store.delete(&id).await?;
    // The compiled graph dies with the use case.
    state.workflow_cache.invalidate(&id).await;

    Ok(Json(serde_json::json!({ "deleted": true })))
}
