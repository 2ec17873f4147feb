//! services/api/src/lib.rs
//!
//! The library crate for the `api` service. It wires the pure core crate to
//! the outside world: configuration, the service-wide error type, the
//! concrete adapters (PostgreSQL, the xkcd index), and the axum web layer.

pub mod adapters;
pub mod config;
pub mod error;
pub mod web;
