// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! End-user endpoints: registration, login and profile.

use axum::extract::State;
use tracing::info;

use super::{blocking, ValidJson, INVALID_CREDENTIALS};
use crate::auth::{password, CurrentUser, Principal};
use crate::envelope::Envelope;
use crate::error::ApiError;
use crate::models::{LoginRequest, RegisterRequest, UserLoginResponse, UserProfile};
use crate::state::AppState;
use crate::storage::{AccountStoreError, NewUser};

/// Register a new user account.
#[utoipa::path(
    post,
    path = "/api/user/register",
    tag = "Users",
    request_body = RegisterRequest,
    responses(
        (status = 200, description = "code 0 on success, 1 for duplicate username/email or invalid fields"),
        (status = 400, description = "Body is not JSON")
    )
)]
pub async fn register(
    State(state): State<AppState>,
    ValidJson(req): ValidJson<RegisterRequest>,
) -> Result<Envelope<()>, ApiError> {
    // Checked again inside create_user's transaction.
    if state
        .accounts
        .user_email_taken(&req.email)
        .map_err(|e| ApiError::internal(e.to_string()))?
    {
        return Err(ApiError::business("email already registered"));
    }

    let accounts = state.accounts.clone();
    let created = blocking(move || {
        let password_hash = password::hash_password(&req.password);
        accounts.create_user(NewUser {
            username: req.username,
            password_hash,
            email: req.email,
            nickname: req.nickname,
        })
    })
    .await?;

    match created {
        Ok(user) => {
            info!(user_id = user.id, username = %user.username, "User registered");
            Ok(Envelope::done("registered"))
        }
        Err(AccountStoreError::UsernameTaken) => Err(ApiError::business("username already exists")),
        Err(AccountStoreError::EmailTaken) => Err(ApiError::business("email already registered")),
        Err(e) => Err(ApiError::internal(e.to_string())),
    }
}

/// Log in with username and password.
///
/// Unknown usernames and wrong passwords get the same message.
#[utoipa::path(
    post,
    path = "/api/user/login",
    tag = "Users",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "code 0 with token and profile, or 1 on failure", body = UserLoginResponse)
    )
)]
pub async fn login(
    State(state): State<AppState>,
    ValidJson(req): ValidJson<LoginRequest>,
) -> Result<Envelope<UserLoginResponse>, ApiError> {
    let found = state
        .accounts
        .get_user_by_username(&req.username)
        .map_err(|e| ApiError::internal(e.to_string()))?;
    let Some(user) = found else {
        blocking(move || password::verify_against_nothing(&req.password)).await?;
        return Err(ApiError::business(INVALID_CREDENTIALS));
    };

    let hash = user.password_hash.clone();
    let password_ok = blocking(move || password::verify_password(&req.password, &hash)).await?;
    if !password_ok {
        return Err(ApiError::business(INVALID_CREDENTIALS));
    }
    if !user.is_active() {
        return Err(ApiError::business("account disabled"));
    }

    let token = state
        .tokens
        .issue(user.id, &user.username, Principal::User, state.user_token_ttl)
        .map_err(|e| ApiError::internal(format!("token issue failed: {e}")))?;

    info!(user_id = user.id, "User logged in");
    Ok(Envelope::success(UserLoginResponse {
        token,
        user_info: user.into(),
    }))
}

/// Profile of the authenticated user.
#[utoipa::path(
    get,
    path = "/api/user/info",
    tag = "Users",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "User profile", body = UserProfile),
        (status = 401, description = "Missing, invalid or non-user token")
    )
)]
pub async fn get_user_info(
    State(state): State<AppState>,
    CurrentUser(identity): CurrentUser,
) -> Result<Envelope<UserProfile>, ApiError> {
    let user = state
        .accounts
        .get_user_by_id(identity.subject_id)
        .map_err(|e| ApiError::internal(e.to_string()))?
        .ok_or_else(|| ApiError::business("user not found"))?;

    if !user.is_active() {
        return Err(ApiError::business("account disabled"));
    }
    Ok(Envelope::success(user.into()))
}
