use axum::http::StatusCode;
use axum::{Json, extract::Path, extract::State};
use serde_json::{Value, json};
use uuid::Uuid;

use recap_types::api::{
    ChatOwner, ChatResponse, ChatWithOwner, CreateChatRequest, ListChatsResponse,
    RenameChatRequest, RenameChatResponse,
};

use crate::error::ApiError;
use crate::state::AppState;

pub async fn create_chat(
    State(state): State<AppState>,
    Json(req): Json<CreateChatRequest>,
) -> Result<(StatusCode, Json<ChatResponse>), ApiError> {
    let user_id = parse_user_id(req.user_id.as_deref())?;

    let name = match req.name {
        Some(name) if !name.is_empty() => name,
        _ => return Err(ApiError::invalid("Chat name is required")),
    };

    let chat_id = Uuid::new_v4();
    let row = state
        .run_db(move |db| {
            if db.get_user_by_id(&user_id.to_string())?.is_none() {
                return Ok(None);
            }
            db.insert_chat(&chat_id.to_string(), &name, &user_id.to_string())
                .map(Some)
        })
        .await?
        .ok_or(ApiError::NotFound("User not found"))?;

    let chat = row.into_chat()?;
    Ok((
        StatusCode::CREATED,
        Json(ChatResponse {
            id: chat.id,
            name: chat.name,
            user: chat.user_id,
            created_at: chat.created_at,
            updated_at: chat.updated_at,
        }),
    ))
}

/// Every chat owned by the user, with the owner's identity denormalized onto
/// each entry. A user with no chats gets an empty list, not an error.
pub async fn list_chats(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<ListChatsResponse>, ApiError> {
    let user_id = parse_user_id(Some(&user_id))?;

    let rows = state
        .run_db(move |db| db.chats_for_user(&user_id.to_string()))
        .await?;

    let mut chats = Vec::with_capacity(rows.len());
    for row in rows {
        let owner_name = row.owner_name;
        let owner_email = row.owner_email;
        let chat = row.chat.into_chat()?;
        chats.push(ChatWithOwner {
            id: chat.id,
            name: chat.name,
            user: ChatOwner {
                id: chat.user_id,
                name: owner_name,
                email: owner_email,
            },
            created_at: chat.created_at,
            updated_at: chat.updated_at,
        });
    }

    Ok(Json(ListChatsResponse { chats }))
}

pub async fn rename_chat(
    State(state): State<AppState>,
    Path(chat_id): Path<Uuid>,
    Json(req): Json<RenameChatRequest>,
) -> Result<Json<RenameChatResponse>, ApiError> {
    let name = match req.name {
        Some(name) if !name.is_empty() => name,
        _ => return Err(ApiError::invalid("Chat name is required")),
    };

    let new_name = state
        .run_db(move |db| db.rename_chat(&chat_id.to_string(), &name))
        .await?
        .ok_or(ApiError::NotFound("Chat not found"))?;

    Ok(Json(RenameChatResponse { name: new_name }))
}

/// Removes the chat and everything that exists only in relation to it. The
/// cascade runs as one transaction in the db layer, so a failure cannot
/// leave orphaned messages behind.
pub async fn delete_chat(
    State(state): State<AppState>,
    Path(chat_id): Path<Uuid>,
) -> Result<Json<Value>, ApiError> {
    let deleted = state
        .run_db(move |db| db.delete_chat_cascade(&chat_id.to_string()))
        .await?;

    if !deleted {
        return Err(ApiError::NotFound("Chat not found"));
    }

    Ok(Json(json!({
        "message": "Chat and related messages deleted successfully"
    })))
}

fn parse_user_id(raw: Option<&str>) -> Result<Uuid, ApiError> {
    raw.and_then(|s| Uuid::parse_str(s).ok())
        .ok_or_else(|| ApiError::invalid("Invalid user ID"))
}
