//! Core domain models shared across all Clipstream crates.

pub mod user;

pub use user::*;
