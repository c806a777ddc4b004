//! HTTP surface of the simulation: lure-page sessions, rate-limited capture
//! endpoints that feed the attempt log, debriefs, and debug-only log views.

pub mod api;
pub mod capture_rate_limit;
pub mod models;
pub mod scenario;
pub mod validation;
