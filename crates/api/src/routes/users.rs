//! User-account route handlers.

use axum::{Json, extract::Path, extract::State, http::StatusCode};
use serde::{Deserialize, Serialize};

use shoplite_core::UserId;

use crate::error::Result;
use crate::middleware::{CurrentUser, RequireAdmin};
use crate::models::User;
use crate::services::{AuthService, auth::Registration};
use crate::state::AppState;

/// Registration request body.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub mobile_no: String,
    pub password: String,
}

/// Login request body.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Password-change request body.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePasswordRequest {
    pub new_password: String,
}

/// Public view of a user, password hash excluded.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserView {
    pub id: UserId,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub mobile_no: String,
    pub is_admin: bool,
}

impl From<User> for UserView {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            first_name: user.first_name,
            last_name: user.last_name,
            email: user.email.into_inner(),
            mobile_no: user.mobile_no.into_inner(),
            is_admin: user.is_admin,
        }
    }
}

/// Simple message body.
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

/// The user summary returned with a fresh token.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginUser {
    pub id: UserId,
    pub is_admin: bool,
}

/// Login response: the access token and a user summary.
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub access: String,
    pub user: LoginUser,
}

/// Profile response wrapper.
#[derive(Debug, Serialize)]
pub struct ProfileResponse {
    pub user: UserView,
}

/// Promotion response wrapper.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PromoteResponse {
    pub updated_user: UserView,
}

/// Create an account.
///
/// POST /users/register
pub async fn register(
    State(state): State<AppState>,
    Json(body): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<MessageResponse>)> {
    AuthService::new(state.store())
        .register(Registration {
            first_name: body.first_name,
            last_name: body.last_name,
            email: body.email,
            mobile_no: body.mobile_no,
            password: body.password,
        })
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(MessageResponse {
            message: "Registered successfully".to_owned(),
        }),
    ))
}

/// Authenticate and issue an access token.
///
/// POST /users/login
pub async fn login(
    State(state): State<AppState>,
    Json(body): Json<LoginRequest>,
) -> Result<Json<LoginResponse>> {
    let user = AuthService::new(state.store())
        .login(&body.email, &body.password)
        .await?;

    let access = state.tokens().issue(&user)?;

    Ok(Json(LoginResponse {
        access,
        user: LoginUser {
            id: user.id,
            is_admin: user.is_admin,
        },
    }))
}

/// Current user's profile.
///
/// GET /users/details
pub async fn details(
    State(state): State<AppState>,
    CurrentUser(claims): CurrentUser,
) -> Result<Json<ProfileResponse>> {
    let user = AuthService::new(state.store()).user(claims.id).await?;

    Ok(Json(ProfileResponse {
        user: UserView::from(user),
    }))
}

/// Replace the current user's password.
///
/// PATCH /users/update-password
pub async fn update_password(
    State(state): State<AppState>,
    CurrentUser(claims): CurrentUser,
    Json(body): Json<UpdatePasswordRequest>,
) -> Result<(StatusCode, Json<MessageResponse>)> {
    AuthService::new(state.store())
        .change_password(claims.id, &body.new_password)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(MessageResponse {
            message: "Password updated successfully".to_owned(),
        }),
    ))
}

/// Grant the admin flag to a user.
///
/// PATCH /users/{id}/set-as-admin (admin)
pub async fn set_as_admin(
    State(state): State<AppState>,
    RequireAdmin(_): RequireAdmin,
    Path(id): Path<i32>,
) -> Result<Json<PromoteResponse>> {
    let updated = AuthService::new(state.store())
        .promote_to_admin(UserId::new(id))
        .await?;

    Ok(Json(PromoteResponse {
        updated_user: UserView::from(updated),
    }))
}
