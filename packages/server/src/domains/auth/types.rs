//! Auth domain data types
//!
//! Inputs and results of the auth actions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::models::Identity;

/// Input to `request_passcode`, straight from the client.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PasscodeRequestInput {
    pub name: Option<String>,
    pub email: String,
    /// Optional SMS recipient.
    pub phone: Option<String>,
}

/// Result of issuing a passcode
#[derive(Debug, Clone, Serialize)]
pub struct PasscodeIssued {
    pub email: String,
    pub expires_at: DateTime<Utc>,
}

/// Result of a successful verification
#[derive(Debug, Clone, Serialize)]
pub struct VerifiedSession {
    pub token: String,
    pub identity: Identity,
}
