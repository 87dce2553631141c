// HTTP middleware
pub mod bearer;

pub use bearer::*;
