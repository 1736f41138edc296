pub mod client;
pub mod memory;
mod record;
pub mod store;

pub use store::{BlogStore, DbError};
