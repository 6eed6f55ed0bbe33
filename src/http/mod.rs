//! HTTP trigger surface
//!
//! A small axum API for external schedulers and dashboards: trigger a run,
//! inspect the schedule record, health checks. Mounted under `/api/v1` with
//! optional API-key authentication.

mod auth;
mod handlers;
mod routes;
mod server;
mod types;

pub use handlers::AppState;
pub use server::HttpServer;
