//! Phishing-awareness simulation server.
//!
//! Lure pages post submissions to capture endpoints; each submission passes a
//! per-address [`tracker::AttemptTracker`], is recorded by the
//! [`attempt_log::AttemptLogger`], and is answered with an educational debrief.

pub mod attempt_log;
pub mod clock;
pub mod config;
pub mod tracker;
pub mod web;
