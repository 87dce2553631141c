//! `/auth` handlers. Thin wrappers over the auth actions.

use axum::{
    extract::{rejection::JsonRejection, Extension},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::domains::auth::actions;
use crate::domains::auth::{AuthError, Identity, PasscodeRequestInput};
use crate::server::app::AxumAppState;
use crate::server::middleware::BearerToken;

#[derive(Debug, Deserialize)]
pub struct VerifyPasscodeBody {
    pub email: String,
    #[serde(alias = "otp")]
    pub code: String,
}

#[derive(Debug, Serialize)]
pub struct OkResponse {
    pub ok: bool,
}

#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub ok: bool,
    pub token: String,
    pub identity: Identity,
}

#[derive(Debug, Serialize)]
pub struct IdentityResponse {
    pub ok: bool,
    pub identity: Identity,
}

/// Malformed or missing JSON is a client error like any other validation failure.
fn bad_body(rejection: JsonRejection) -> AuthError {
    AuthError::validation(rejection.body_text())
}

/// POST /auth/request-passcode
pub async fn request_passcode_handler(
    Extension(state): Extension<AxumAppState>,
    body: Result<Json<PasscodeRequestInput>, JsonRejection>,
) -> Result<Json<OkResponse>, AuthError> {
    let Json(input) = body.map_err(bad_body)?;
    actions::request_passcode(input, &state.server_deps).await?;
    Ok(Json(OkResponse { ok: true }))
}

/// POST /auth/verify-passcode
pub async fn verify_passcode_handler(
    Extension(state): Extension<AxumAppState>,
    body: Result<Json<VerifyPasscodeBody>, JsonRejection>,
) -> Result<Json<SessionResponse>, AuthError> {
    let Json(body) = body.map_err(bad_body)?;
    let session = actions::verify_passcode(&body.email, &body.code, &state.server_deps).await?;
    Ok(Json(SessionResponse {
        ok: true,
        token: session.token,
        identity: session.identity,
    }))
}

/// GET /auth/me
pub async fn me_handler(
    Extension(state): Extension<AxumAppState>,
    BearerToken(token): BearerToken,
) -> Result<Json<IdentityResponse>, AuthError> {
    let identity = actions::who_am_i(&token, &state.server_deps).await?;
    Ok(Json(IdentityResponse { ok: true, identity }))
}
