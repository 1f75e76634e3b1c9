pub mod auth;
pub mod change;
pub mod event;
pub mod job;
pub mod notification;
pub mod rsvp;
pub mod settings;
pub mod share;
pub mod user;
