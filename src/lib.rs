// Crate root library declaration and module exports.
pub mod cli;
pub mod client;
pub mod config;
pub mod context;
pub mod error;
pub mod logging;
pub mod model;
pub mod seed;
pub mod storage;
pub mod store;

pub use error::{JournalError, Result};
pub use store::EventStore;
