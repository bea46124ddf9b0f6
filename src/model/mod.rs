// File: ./src/model/mod.rs
pub mod event;
pub mod matcher;

pub use event::{Event, EventPatch, EventStatus, PrimaryType};
pub use matcher::{EventFilter, EventPage, paginate};
