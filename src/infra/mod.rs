pub mod factory;
pub mod notify;
pub mod realtime;
pub mod repositories;
