//! # QPrep Common Library
//!
//! Shared code for the QPrep services including:
//! - Question corpus models
//! - Database initialization and schema
//! - Configuration loading
//! - Common error types

pub mod config;
pub mod db;
pub mod error;

pub use error::{Error, Result};
