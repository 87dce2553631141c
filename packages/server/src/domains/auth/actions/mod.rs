//! Auth domain actions - business logic functions
//!
//! Actions are async functions called directly from the HTTP routes. They hold
//! no state of their own; everything goes through `ServerDeps`.

mod request_passcode;
mod verify_passcode;
mod who_am_i;

pub use request_passcode::request_passcode;
pub use verify_passcode::verify_passcode;
pub use who_am_i::who_am_i;
