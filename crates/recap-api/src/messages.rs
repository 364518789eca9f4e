use axum::http::StatusCode;
use axum::{Json, extract::Path, extract::State};
use uuid::Uuid;

use recap_db::models::MessageRow;
use recap_types::api::{MessageResponse, SendMessageRequest};
use recap_types::models::MessageSender;

use crate::error::ApiError;
use crate::state::AppState;

/// Messages of a chat in append order — array position is chronological
/// order, the same order the sends happened in.
pub async fn get_messages(
    State(state): State<AppState>,
    Path(chat_id): Path<Uuid>,
) -> Result<Json<Vec<MessageResponse>>, ApiError> {
    let rows = state
        .run_db(move |db| {
            let id = chat_id.to_string();
            if db.get_chat(&id)?.is_none() {
                return Ok(None);
            }
            db.messages_for_chat(&id).map(Some)
        })
        .await?
        .ok_or(ApiError::NotFound("Chat not found"))?;

    let messages = rows
        .into_iter()
        .map(to_response)
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Json(messages))
}

pub async fn send_message(
    State(state): State<AppState>,
    Path(chat_id): Path<Uuid>,
    Json(req): Json<SendMessageRequest>,
) -> Result<(StatusCode, Json<MessageResponse>), ApiError> {
    let (sender, content) = match (req.sender, req.content) {
        (Some(sender), Some(content)) if !sender.is_empty() && !content.is_empty() => {
            (sender, content)
        }
        _ => return Err(ApiError::invalid("Sender and content are required")),
    };

    let sender: MessageSender = sender
        .parse()
        .map_err(|_| ApiError::invalid("Sender must be either 'user' or 'model'"))?;

    let message_id = Uuid::new_v4();
    let images = req.images;

    let row = state
        .run_db(move |db| {
            db.append_message(
                &message_id.to_string(),
                &chat_id.to_string(),
                sender.as_str(),
                &content,
                &images,
            )
        })
        .await?
        .ok_or(ApiError::NotFound("Chat not found"))?;

    Ok((StatusCode::CREATED, Json(to_response(row)?)))
}

fn to_response(row: MessageRow) -> Result<MessageResponse, ApiError> {
    let message = row.into_message()?;
    Ok(MessageResponse {
        id: message.id,
        chat: message.chat_id,
        sender: message.sender,
        content: message.content,
        images: message.images,
        created_at: message.created_at,
        updated_at: message.updated_at,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::test_state;

    fn state_with_chat() -> (AppState, Uuid) {
        let state = test_state();
        let user_id = Uuid::new_v4();
        let chat_id = Uuid::new_v4();
        state
            .db
            .create_user(&user_id.to_string(), "Ada", "ada@example.com", "hash")
            .unwrap();
        state
            .db
            .insert_chat(&chat_id.to_string(), "notes", &user_id.to_string())
            .unwrap();
        (state, chat_id)
    }

    fn send_request(sender: &str, content: &str) -> SendMessageRequest {
        SendMessageRequest {
            sender: Some(sender.to_string()),
            content: Some(content.to_string()),
            images: vec![],
        }
    }

    #[tokio::test]
    async fn messages_are_returned_in_send_order() {
        let (state, chat_id) = state_with_chat();

        for i in 0..4 {
            let sender = if i % 2 == 0 { "user" } else { "model" };
            let (status, _) = send_message(
                State(state.clone()),
                Path(chat_id),
                Json(send_request(sender, &format!("turn {}", i))),
            )
            .await
            .unwrap();
            assert_eq!(status, StatusCode::CREATED);
        }

        let Json(messages) = get_messages(State(state), Path(chat_id)).await.unwrap();
        assert_eq!(messages.len(), 4);
        for (i, m) in messages.iter().enumerate() {
            assert_eq!(m.content, format!("turn {}", i));
        }
        assert_eq!(messages[0].sender, MessageSender::User);
        assert_eq!(messages[1].sender, MessageSender::Model);
    }

    #[tokio::test]
    async fn empty_content_is_rejected_and_nothing_is_stored() {
        let (state, chat_id) = state_with_chat();

        let err = send_message(
            State(state.clone()),
            Path(chat_id),
            Json(send_request("user", "")),
        )
        .await
        .unwrap_err();
        assert_eq!(err.to_string(), "Sender and content are required");

        let err = send_message(
            State(state.clone()),
            Path(chat_id),
            Json(SendMessageRequest {
                sender: None,
                content: Some("hello".to_string()),
                images: vec![],
            }),
        )
        .await
        .unwrap_err();
        assert_eq!(err.to_string(), "Sender and content are required");

        assert!(state.db.messages_for_chat(&chat_id.to_string()).unwrap().is_empty());
    }

    #[tokio::test]
    async fn unknown_sender_role_is_rejected() {
        let (state, chat_id) = state_with_chat();

        let err = send_message(
            State(state),
            Path(chat_id),
            Json(send_request("assistant", "hello")),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ApiError::InvalidArgument(_)));
    }

    #[tokio::test]
    async fn missing_chat_is_not_found_for_both_operations() {
        let (state, _) = state_with_chat();
        let missing = Uuid::new_v4();

        let err = get_messages(State(state.clone()), Path(missing))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::NotFound("Chat not found")));

        let err = send_message(
            State(state),
            Path(missing),
            Json(send_request("user", "hello")),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ApiError::NotFound("Chat not found")));
    }

    #[tokio::test]
    async fn image_urls_survive_the_round_trip() {
        let (state, chat_id) = state_with_chat();

        let (_, Json(sent)) = send_message(
            State(state.clone()),
            Path(chat_id),
            Json(SendMessageRequest {
                sender: Some("model".to_string()),
                content: Some("summary with pictures".to_string()),
                images: vec!["https://example.com/chart.png".to_string()],
            }),
        )
        .await
        .unwrap();
        assert_eq!(sent.images, vec!["https://example.com/chart.png"]);

        let Json(messages) = get_messages(State(state), Path(chat_id)).await.unwrap();
        assert_eq!(messages[0].images, sent.images);
    }
}
