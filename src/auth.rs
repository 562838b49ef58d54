//! Auth-domain identifiers, redacted secrets, and the persisted credential model.

pub mod app_id;
pub mod credential;
pub mod secret;

pub use app_id::*;
pub use credential::*;
pub use secret::*;
