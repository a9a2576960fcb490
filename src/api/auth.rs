use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, Set};
use serde::Deserialize;
use serde_json::json;
use utoipa::ToSchema;

use crate::api::error_response;
use crate::domain::{DomainError, ValidationErrors};
use crate::infrastructure::AppState;
use crate::infrastructure::auth::{AuthUser, create_jwt, hash_password, verify_password};
use crate::models::user::{self, ROLE_USER};
use crate::services::validation;
use crate::utils::now_rfc3339;

#[derive(Debug, Deserialize, ToSchema)]
pub struct RegisterRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

fn email_taken() -> DomainError {
    let mut errors = ValidationErrors::new();
    errors.add("email", "The email has already been taken.");
    DomainError::Validation(errors)
}

fn token_for(user: &user::Model) -> Result<String, DomainError> {
    create_jwt(user.id, &user.email, &user.role).map_err(DomainError::Internal)
}

#[utoipa::path(
    post,
    path = "/api/auth/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Account created"),
        (status = 422, description = "Invalid registration data")
    )
)]
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> impl IntoResponse {
    let email = payload.email.trim().to_lowercase();
    if let Err(e) = validation::validate_registration(&payload.name, &email, &payload.password) {
        return error_response(e, "");
    }

    let result = async {
        let password_hash = hash_password(&payload.password).map_err(DomainError::Internal)?;
        let now = now_rfc3339();
        let model = user::ActiveModel {
            name: Set(payload.name.trim().to_string()),
            email: Set(email.clone()),
            password_hash: Set(password_hash),
            role: Set(ROLE_USER.to_string()),
            created_at: Set(now.clone()),
            updated_at: Set(now),
            ..Default::default()
        };

        let created = model.insert(state.db()).await.map_err(|e| match DomainError::from(e) {
            DomainError::Conflict(_) => email_taken(),
            other => other,
        })?;
        let token = token_for(&created)?;
        Ok::<_, DomainError>((created, token))
    }
    .await;

    match result {
        Ok((created, token)) => {
            tracing::info!("Registered user {} ({})", created.id, created.email);
            (
                StatusCode::CREATED,
                Json(json!({
                    "success": true,
                    "message": "Registration successful",
                    "data": { "user": created, "token": token }
                })),
            )
                .into_response()
        }
        Err(e) => error_response(e, "User not found"),
    }
}

#[utoipa::path(
    post,
    path = "/api/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Bearer token issued"),
        (status = 401, description = "Invalid credentials")
    )
)]
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> impl IntoResponse {
    let email = payload.email.trim().to_lowercase();
    tracing::info!("Login attempt for {}", email);

    let invalid = || {
        (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "success": false, "message": "Invalid credentials" })),
        )
            .into_response()
    };

    let user = match user::Entity::find()
        .filter(user::Column::Email.eq(&email))
        .one(state.db())
        .await
    {
        Ok(Some(u)) => u,
        Ok(None) => {
            tracing::warn!("Unknown account: {}", email);
            return invalid();
        }
        Err(e) => return error_response(e.into(), ""),
    };

    match verify_password(&payload.password, &user.password_hash) {
        Ok(true) => match token_for(&user) {
            Ok(token) => (
                StatusCode::OK,
                Json(json!({
                    "success": true,
                    "message": "Login successful",
                    "data": { "user": user, "token": token }
                })),
            )
                .into_response(),
            Err(e) => error_response(e, ""),
        },
        _ => {
            tracing::warn!("Password verification failed for {}", email);
            invalid()
        }
    }
}

#[utoipa::path(
    get,
    path = "/api/auth/me",
    responses(
        (status = 200, description = "Current user"),
        (status = 401, description = "Missing or invalid token")
    ),
    security(("bearer" = []))
)]
pub async fn me(State(state): State<AppState>, auth: AuthUser) -> impl IntoResponse {
    match user::Entity::find_by_id(auth.id).one(state.db()).await {
        Ok(Some(u)) => {
            (StatusCode::OK, Json(json!({ "success": true, "data": u }))).into_response()
        }
        Ok(None) => error_response(DomainError::NotFound, "User not found"),
        Err(e) => error_response(e.into(), ""),
    }
}
