//! Grow Monitor - greenhouse dashboard API in front of the LeafAI backend
//!
//! This library exposes the core modules for testing and reuse.

pub mod backend;
pub mod common;
pub mod config;
pub mod error;
pub mod provisioning;
pub mod routes;
pub mod sync;
pub mod telemetry;
