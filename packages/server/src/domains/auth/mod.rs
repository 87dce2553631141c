//! Auth domain - passcode login and JWT sessions
//!
//! Flow:
//!   request_passcode → code generated, hash stored, plaintext dispatched out of band
//!   verify_passcode  → latest unconsumed row checked, consumed, session token issued
//!   who_am_i         → token verified, identity loaded
//!
//! Only the SHA-256 hash of a passcode is persisted. Sessions are stateless
//! HS256 tokens; logout is the client discarding its token.

pub mod actions;
pub mod errors;
pub mod jwt;
pub mod models;
pub mod passcode;
pub mod types;

pub use errors::AuthError;
pub use jwt::{Claims, JwtService, TokenError};
pub use models::{Identity, PasscodeRequest};
pub use passcode::Passcode;
pub use types::*;
