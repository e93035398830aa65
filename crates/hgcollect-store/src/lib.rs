// SQLite persistence layer.
// One writer at a time: every persist call runs behind the store's gate.

mod db;
mod error;
mod schema;

pub use db::Store;
pub use error::{Error, Result};
pub use schema::SCHEMA_VERSION;
