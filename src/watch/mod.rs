// src/watch/mod.rs

//! Watching the run's result directory.
//!
//! Workers signal completion only by writing files into the shared result
//! directory. This module turns that directory into readiness decisions; it
//! does **not** know about levels or the dependency graph.

pub mod readiness;

pub use readiness::ReadinessProbe;
