//! Database layer shared by muslib services

pub mod init;

pub use init::{create_schema, init_database, init_in_memory_database};
