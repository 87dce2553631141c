mod identity;
mod passcode_request;

pub use identity::Identity;
pub use passcode_request::PasscodeRequest;
