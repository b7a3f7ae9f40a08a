//! # Storewatch Backend
//!
//! Store uptime monitoring engine.
//!
//! This crate computes per-store uptime and downtime over three trailing
//! windows (1 hour, 24 hours, 7 days) from sparse status polls, restricted
//! to each store's declared business hours in its local timezone. Reports
//! are generated asynchronously and retrieved as CSV through a small REST
//! API.
//!
//! ## Features
//!
//! - **Status Reconstruction**: Midpoint interpolation turns sparse polls
//!   into a continuous status signal
//! - **Business Hours**: Timezone-aware expansion of weekly schedules,
//!   including overnight spans and DST transitions
//! - **Report Engine**: Bounded-concurrency per-store aggregation with
//!   progress tracking
//! - **CSV Ingest**: Tolerant loaders for the three source tables
//! - **HTTP API**: Trigger a report, poll its status, stream its progress
//!
//! ## Architecture
//!
//! The crate is organized into several logical modules:
//!
//! - [`models`]: Domain entities and interval algebra
//! - [`services`]: Reconstruction, schedule expansion, aggregation, and
//!   report orchestration
//! - [`db`]: Repository traits and the in-memory backend
//! - [`ingest`]: CSV loaders
//! - [`http`]: Axum-based HTTP server and request handlers

pub mod config;
pub mod db;
pub mod ingest;
pub mod models;
pub mod services;

#[cfg(feature = "http-server")]
pub mod http;
