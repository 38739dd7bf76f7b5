//! Query functions, organized by table.

pub mod users;
