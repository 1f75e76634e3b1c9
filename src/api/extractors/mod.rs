pub mod auth;
pub mod client_id;
pub mod maybe_auth;
