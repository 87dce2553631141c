//! Request passcode action

use tracing::info;

use crate::common::{is_valid_email, is_valid_phone, normalize_email, normalize_phone};
use crate::domains::auth::errors::AuthError;
use crate::domains::auth::passcode::Passcode;
use crate::domains::auth::types::{PasscodeIssued, PasscodeRequestInput};
use crate::kernel::{PasscodeMessage, Recipient, ServerDeps};

/// Issue a passcode for an e-mail and send it out of band.
///
/// Creates the identity on first contact. Delivery runs on a background task
/// and its outcome never affects the result.
pub async fn request_passcode(
    input: PasscodeRequestInput,
    deps: &ServerDeps,
) -> Result<PasscodeIssued, AuthError> {
    let email = normalize_email(&input.email);
    if !is_valid_email(&email) {
        return Err(AuthError::validation("A valid email address is required"));
    }

    let phone = input
        .phone
        .as_deref()
        .map(normalize_phone)
        .filter(|p| !p.is_empty());
    if let Some(phone) = &phone {
        if !is_valid_phone(phone) {
            return Err(AuthError::validation("Phone number is not valid"));
        }
    }

    let name = input
        .name
        .as_deref()
        .map(str::trim)
        .filter(|n| !n.is_empty());

    let passcode = Passcode::generate();

    let identity = deps
        .identities
        .upsert_if_absent(name, &email, phone.as_deref())
        .await?;

    let expires_at = deps.clock.now() + deps.policy.passcode_ttl;
    let row = deps
        .passcodes
        .insert(&email, &passcode.hash, expires_at)
        .await?;

    info!(
        identity_id = %identity.id,
        passcode_id = %row.id,
        email = %email,
        "Passcode issued"
    );

    let recipient = Recipient {
        email: email.clone(),
        phone: phone.or(identity.phone),
    };
    let message = PasscodeMessage {
        code: passcode.code,
        valid_minutes: deps.policy.passcode_ttl.num_minutes(),
    };
    deps.dispatcher.dispatch_in_background(recipient, message);

    Ok(PasscodeIssued { email, expires_at })
}
