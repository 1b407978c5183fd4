//! SQLite backend for the promotion engine.
mod sqlite_impl;

pub mod db;
pub use sqlite_impl::SqliteDatabase;
