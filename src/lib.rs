// ABOUTME: Library root for gantry - exposes public types for testing.
// ABOUTME: The main binary is in main.rs.

pub mod collaborators;
pub mod config;
pub mod diagnostics;
pub mod error;
pub mod lifecycle;
pub mod output;
pub mod pointer;
pub mod probe;
pub mod retention;
pub mod store;
pub mod types;
