pub mod config;
pub mod events;
pub mod model;
pub mod notify;
pub mod pagination;
pub mod reminders;
pub mod scheduler;
pub mod site;
pub mod starboard;
pub mod surface;
pub mod sync;
pub mod timefmt;
