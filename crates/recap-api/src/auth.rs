use argon2::password_hash::{SaltString, rand_core::OsRng};
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use axum::http::StatusCode;
use axum::{Extension, Json, extract::State};
use jsonwebtoken::{EncodingKey, Header, encode};
use uuid::Uuid;

use recap_types::api::{AuthResponse, LoginRequest, MeResponse, SignupRequest};

use crate::error::ApiError;
use crate::middleware::Claims;
use crate::state::AppState;

const TOKEN_TTL_DAYS: i64 = 1;

pub async fn signup(
    State(state): State<AppState>,
    Json(req): Json<SignupRequest>,
) -> Result<(StatusCode, Json<AuthResponse>), ApiError> {
    let full_name = require_field(req.full_name, "Full Name is required")?;
    let email = require_field(req.email, "Email is required")?;
    let password = require_field(req.password, "Password is required")?;

    if state
        .run_db({
            let email = email.clone();
            move |db| db.get_user_by_email(&email)
        })
        .await?
        .is_some()
    {
        return Err(ApiError::AlreadyExists("User already exists"));
    }

    // Argon2id with a fresh salt; the plaintext never reaches the database.
    let salt = SaltString::generate(&mut OsRng);
    let password_hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| ApiError::Internal(anyhow::anyhow!("password hashing failed: {}", e)))?
        .to_string();

    let user_id = Uuid::new_v4();

    state
        .run_db({
            let id = user_id.to_string();
            move |db| db.create_user(&id, &full_name, &email, &password_hash)
        })
        .await?;

    let token = create_token(&state.jwt_secret, user_id)?;

    Ok((StatusCode::CREATED, Json(AuthResponse { access_token: token })))
}

pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<AuthResponse>, ApiError> {
    let email = require_field(req.email, "Email is required")?;
    let password = require_field(req.password, "Password is required")?;

    // Unknown email and wrong password answer identically so the response
    // does not leak which one was wrong.
    let user = state
        .run_db(move |db| db.get_user_by_email(&email))
        .await?
        .ok_or_else(invalid_credentials)?;

    let parsed_hash = PasswordHash::new(&user.password_hash)
        .map_err(|e| ApiError::Internal(anyhow::anyhow!("stored hash unreadable: {}", e)))?;

    Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .map_err(|_| invalid_credentials())?;

    let user_id: Uuid = user
        .id
        .parse()
        .map_err(|e| ApiError::Internal(anyhow::anyhow!("corrupt user id: {}", e)))?;

    let token = create_token(&state.jwt_secret, user_id)?;

    Ok(Json(AuthResponse { access_token: token }))
}

/// Identity of the bearer-token holder.
pub async fn me(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<MeResponse>, ApiError> {
    let user = state
        .run_db(move |db| db.get_user_by_id(&claims.sub.to_string()))
        .await?
        .ok_or(ApiError::NotFound("User not found"))?
        .into_user()?;

    Ok(Json(MeResponse {
        id: user.id,
        name: user.name,
        email: user.email,
    }))
}

fn invalid_credentials() -> ApiError {
    ApiError::invalid("Invalid email or password")
}

fn require_field(value: Option<String>, message: &str) -> Result<String, ApiError> {
    match value {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(ApiError::invalid(message)),
    }
}

pub fn create_token(secret: &str, user_id: Uuid) -> Result<String, ApiError> {
    let claims = Claims {
        sub: user_id,
        exp: (chrono::Utc::now() + chrono::Duration::days(TOKEN_TTL_DAYS)).timestamp() as usize,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| ApiError::Internal(anyhow::anyhow!("token signing failed: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::middleware::decode_token;
    use crate::state::test_state;

    fn signup_request(email: &str) -> SignupRequest {
        SignupRequest {
            full_name: Some("Ada Lovelace".to_string()),
            email: Some(email.to_string()),
            password: Some("correct horse".to_string()),
        }
    }

    #[tokio::test]
    async fn signup_issues_a_decodable_token() {
        let state = test_state();
        let (status, Json(body)) = signup(State(state.clone()), Json(signup_request("a@x.com")))
            .await
            .unwrap();

        assert_eq!(status, StatusCode::CREATED);
        let claims = decode_token(&body.access_token, &state.jwt_secret).unwrap();

        let stored = state.db.get_user_by_id(&claims.sub.to_string()).unwrap().unwrap();
        assert_eq!(stored.email, "a@x.com");
    }

    #[tokio::test]
    async fn duplicate_email_is_already_exists() {
        let state = test_state();
        signup(State(state.clone()), Json(signup_request("a@x.com")))
            .await
            .unwrap();

        let err = signup(State(state), Json(signup_request("a@x.com")))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::AlreadyExists("User already exists")));
    }

    #[tokio::test]
    async fn each_missing_signup_field_names_itself() {
        let state = test_state();

        let mut req = signup_request("a@x.com");
        req.full_name = None;
        let err = signup(State(state.clone()), Json(req)).await.unwrap_err();
        assert_eq!(err.to_string(), "Full Name is required");

        let mut req = signup_request("a@x.com");
        req.password = Some(String::new());
        let err = signup(State(state), Json(req)).await.unwrap_err();
        assert_eq!(err.to_string(), "Password is required");
    }

    #[tokio::test]
    async fn password_is_stored_hashed() {
        let state = test_state();
        signup(State(state.clone()), Json(signup_request("a@x.com")))
            .await
            .unwrap();

        let stored = state.db.get_user_by_email("a@x.com").unwrap().unwrap();
        assert_ne!(stored.password_hash, "correct horse");
        assert!(stored.password_hash.starts_with("$argon2"));
    }

    #[tokio::test]
    async fn login_does_not_say_which_credential_was_wrong() {
        let state = test_state();
        signup(State(state.clone()), Json(signup_request("a@x.com")))
            .await
            .unwrap();

        let wrong_password = login(
            State(state.clone()),
            Json(LoginRequest {
                email: Some("a@x.com".to_string()),
                password: Some("wrong".to_string()),
            }),
        )
        .await
        .unwrap_err();

        let unknown_email = login(
            State(state.clone()),
            Json(LoginRequest {
                email: Some("nobody@x.com".to_string()),
                password: Some("correct horse".to_string()),
            }),
        )
        .await
        .unwrap_err();

        assert_eq!(wrong_password.to_string(), "Invalid email or password");
        assert_eq!(unknown_email.to_string(), "Invalid email or password");

        let ok = login(
            State(state),
            Json(LoginRequest {
                email: Some("a@x.com".to_string()),
                password: Some("correct horse".to_string()),
            }),
        )
        .await;
        assert!(ok.is_ok());
    }
}
