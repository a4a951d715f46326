// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Administrator endpoints.
//!
//! - `POST /api/admin/login`, `GET /api/admin/roles`: public
//! - `GET /api/admin/info`: any authenticated admin
//! - `POST /api/admin/create`: super admins only (rank gate in the router)

use axum::extract::State;
use tracing::info;

use super::{blocking, ValidJson, INVALID_CREDENTIALS};
use crate::auth::{password, AdminRank, CurrentAdmin, Principal};
use crate::envelope::Envelope;
use crate::error::ApiError;
use crate::models::{AdminLoginResponse, AdminProfile, CreateAdminRequest, LoginRequest, RoleInfo};
use crate::state::AppState;
use crate::storage::{AccountStoreError, NewAdmin};

/// Log in as an administrator.
#[utoipa::path(
    post,
    path = "/api/admin/login",
    tag = "Admin",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "code 0 with token and profile, or 1 on failure", body = AdminLoginResponse)
    )
)]
pub async fn login(
    State(state): State<AppState>,
    ValidJson(req): ValidJson<LoginRequest>,
) -> Result<Envelope<AdminLoginResponse>, ApiError> {
    let found = state
        .accounts
        .get_admin_by_username(&req.username)
        .map_err(|e| ApiError::internal(e.to_string()))?;
    let Some(admin) = found else {
        blocking(move || password::verify_against_nothing(&req.password)).await?;
        return Err(ApiError::business(INVALID_CREDENTIALS));
    };

    let hash = admin.password_hash.clone();
    let password_ok = blocking(move || password::verify_password(&req.password, &hash)).await?;
    if !password_ok {
        return Err(ApiError::business(INVALID_CREDENTIALS));
    }
    if !admin.is_active() {
        return Err(ApiError::business("account disabled"));
    }

    let token = state
        .tokens
        .issue(
            admin.id,
            &admin.username,
            Principal::Admin(admin.rank),
            state.admin_token_ttl,
        )
        .map_err(|e| ApiError::internal(format!("token issue failed: {e}")))?;

    info!(admin_id = admin.id, rank = admin.rank.value(), "Admin logged in");
    Ok(Envelope::success(AdminLoginResponse {
        token,
        admin_info: admin.into(),
    }))
}

/// List the admin ranks, highest privilege first.
#[utoipa::path(
    get,
    path = "/api/admin/roles",
    tag = "Admin",
    responses(
        (status = 200, description = "Available ranks", body = [RoleInfo])
    )
)]
pub async fn list_roles() -> Envelope<Vec<RoleInfo>> {
    Envelope::success(AdminRank::ALL.into_iter().map(RoleInfo::from).collect())
}

/// Profile of the authenticated admin.
#[utoipa::path(
    get,
    path = "/api/admin/info",
    tag = "Admin",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Admin profile", body = AdminProfile),
        (status = 401, description = "Missing, invalid or non-admin token")
    )
)]
pub async fn get_admin_info(
    State(state): State<AppState>,
    CurrentAdmin(identity): CurrentAdmin,
) -> Result<Envelope<AdminProfile>, ApiError> {
    let admin = state
        .accounts
        .get_admin_by_id(identity.subject_id)
        .map_err(|e| ApiError::internal(e.to_string()))?
        .ok_or_else(|| ApiError::business("admin not found"))?;

    if !admin.is_active() {
        return Err(ApiError::business("account disabled"));
    }
    Ok(Envelope::success(admin.into()))
}

/// Create another administrator account.
#[utoipa::path(
    post,
    path = "/api/admin/create",
    tag = "Admin",
    security(("bearer" = [])),
    request_body = CreateAdminRequest,
    responses(
        (status = 200, description = "code 0 on success, 1 for duplicate username or invalid fields"),
        (status = 401, description = "Missing, invalid or non-admin token"),
        (status = 403, description = "Caller is not a super admin")
    )
)]
pub async fn create_admin(
    State(state): State<AppState>,
    CurrentAdmin(creator): CurrentAdmin,
    ValidJson(req): ValidJson<CreateAdminRequest>,
) -> Result<Envelope<()>, ApiError> {
    let rank = req
        .rank()
        .ok_or_else(|| ApiError::business(format!("invalid parameters: unknown role {}", req.role)))?;

    let accounts = state.accounts.clone();
    let created = blocking(move || {
        let password_hash = password::hash_password(&req.password);
        accounts.create_admin(NewAdmin {
            username: req.username,
            password_hash,
            rank,
        })
    })
    .await?;

    match created {
        Ok(admin) => {
            info!(
                admin_id = admin.id,
                rank = admin.rank.value(),
                created_by = creator.subject_id,
                "Admin account created"
            );
            Ok(Envelope::done("admin created"))
        }
        Err(AccountStoreError::UsernameTaken) => Err(ApiError::business("username already exists")),
        Err(e) => Err(ApiError::internal(e.to_string())),
    }
}
