// Germany Meds - authentication core
//
// One-time passcode login (e-mail / SMS delivery) and JWT sessions for the
// pharmacy point-of-sale UI. The UI itself lives elsewhere and only talks to
// the HTTP routes in `server::routes::auth`.

pub mod common;
pub mod config;
pub mod domains;
pub mod kernel;
pub mod server;

pub use config::*;
