pub mod auth_service;
pub mod calendar;
pub mod guest_import;
pub mod guest_list;
pub mod notification_service;
pub mod reminders;
pub mod rsvp_service;
pub mod share;
pub mod stats;
pub mod wizard;
