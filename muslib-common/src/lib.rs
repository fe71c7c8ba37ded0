//! # muslib Common Library
//!
//! Shared code for the muslib services:
//! - Error types
//! - Configuration loading and resolution
//! - Database initialization and schema

pub mod config;
pub mod db;
pub mod error;

pub use error::{Error, Result};
