//! # Taskline API Server
//!
//! HTTP server for the Taskline project tracker, built with Axum on top
//! of the shared models and auth crate.
//!
//! The server exposes a JSON API for projects, tasks, comments, time
//! logs, and attachments, guarded by JWT bearer authentication and a
//! role policy table evaluated before any handler runs.

pub mod app;
pub mod bootstrap;
pub mod config;
pub mod error;
pub mod routes;
