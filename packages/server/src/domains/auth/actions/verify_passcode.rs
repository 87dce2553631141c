//! Verify passcode action

use anyhow::Context;
use tracing::{info, warn};

use crate::common::{is_valid_email, normalize_email};
use crate::domains::auth::errors::AuthError;
use crate::domains::auth::passcode::{is_well_formed, matches_hash};
use crate::domains::auth::types::VerifiedSession;
use crate::kernel::ServerDeps;

/// Check a submitted code against the latest unconsumed passcode for the
/// e-mail and, on success, consume it and issue a session token.
///
/// Every compare spends one of the row's `max_attempts`, reserved atomically
/// before the hash is checked; once they are used up the passcode stays
/// locked until a new one is requested.
pub async fn verify_passcode(
    email: &str,
    code: &str,
    deps: &ServerDeps,
) -> Result<VerifiedSession, AuthError> {
    let email = normalize_email(email);
    if !is_valid_email(&email) {
        return Err(AuthError::validation("A valid email address is required"));
    }
    let code = code.trim();
    if !is_well_formed(code) {
        return Err(AuthError::validation("Passcode must be exactly 6 digits"));
    }

    let row = deps
        .passcodes
        .find_latest_active(&email)
        .await?
        .ok_or(AuthError::InvalidCode)?;

    let max_attempts = deps.policy.max_attempts;
    if row.attempts >= max_attempts {
        warn!(passcode_id = %row.id, email = %email, "Passcode locked after too many attempts");
        return Err(AuthError::TooManyAttempts);
    }

    let now = deps.clock.now();
    if row.is_expired_at(now) {
        info!(passcode_id = %row.id, email = %email, "Expired passcode submitted");
        return Err(AuthError::Expired);
    }

    // `row.attempts` may be stale under concurrent guesses; the reservation
    // is the authoritative limit check.
    let Some(attempts) = deps.passcodes.reserve_attempt(row.id, max_attempts).await? else {
        warn!(passcode_id = %row.id, email = %email, "Passcode locked after too many attempts");
        return Err(AuthError::TooManyAttempts);
    };

    if !matches_hash(code, &row.code_hash) {
        warn!(passcode_id = %row.id, email = %email, attempts, "Wrong passcode submitted");
        if attempts >= max_attempts {
            return Err(AuthError::TooManyAttempts);
        }
        return Err(AuthError::InvalidCode);
    }

    // A concurrent verify of the same code may have won the swap.
    if !deps.passcodes.mark_consumed(row.id).await? {
        info!(passcode_id = %row.id, "Passcode already consumed by a concurrent request");
        return Err(AuthError::InvalidCode);
    }

    let identity = match deps.identities.find_by_email(&email).await? {
        Some(identity) => identity,
        None => deps.identities.upsert_if_absent(None, &email, None).await?,
    };

    let token = deps
        .jwt_service
        .create_token(identity.id, &identity.email, now)
        .context("Failed to issue session token")?;

    info!(identity_id = %identity.id, "Passcode verified, session issued");

    Ok(VerifiedSession { token, identity })
}
