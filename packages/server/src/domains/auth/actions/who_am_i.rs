//! Token introspection

use tracing::debug;

use crate::domains::auth::errors::AuthError;
use crate::domains::auth::models::Identity;
use crate::kernel::ServerDeps;

/// Resolve a session token to its identity.
///
/// Any token problem (signature, expiry, shape) and a deleted identity all
/// come back as `Unauthorized`.
pub async fn who_am_i(token: &str, deps: &ServerDeps) -> Result<Identity, AuthError> {
    let claims = deps.jwt_service.verify_token(token).map_err(|e| {
        debug!(error = %e, "Rejected session token");
        AuthError::Unauthorized
    })?;

    deps.identities
        .find_by_id(claims.sub)
        .await?
        .ok_or(AuthError::Unauthorized)
}
