//! Target store (article master) database layer

mod connection;
mod migrations;
mod repository;

pub use connection::Database;
pub use repository::{SqliteTargetStore, TargetStore};
