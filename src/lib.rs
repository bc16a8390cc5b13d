//! Intake - terminal client for request intake and priority-ordered ticket review
//!
//! The binary is a thin clap front end over these modules; integration tests
//! drive them directly.

pub mod api;
pub mod app;
pub mod config;
pub mod forms;
pub mod logging;
pub mod types;
pub mod ui;
pub mod workspace;
