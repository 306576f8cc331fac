//! Session-scoped, in-memory storage. Nothing outlives the process.

mod repository;

pub use repository::*;
