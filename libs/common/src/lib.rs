//! Common library for the Tablier application
//!
//! This crate provides shared functionality used across the Tablier
//! services, including database connectivity and error handling.

pub mod database;
pub mod error;
