//! # clipstream-common
//!
//! Shared types, configuration, error handling, and utilities used across all Clipstream crates.
//! This is the foundation layer: primitives and contracts, no request handling.

pub mod auth;
pub mod config;
pub mod error;
pub mod ids;
pub mod models;
pub mod response;
pub mod validation;
