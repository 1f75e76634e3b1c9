pub mod auth;
pub mod calendar;
pub mod event;
pub mod guest;
pub mod health;
pub mod live;
pub mod notification;
pub mod preferences;
pub mod rsvp;
pub mod settings;
pub mod share;
pub mod stats;
pub mod wizard;
