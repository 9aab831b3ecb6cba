//! Heal backend HTTP server

pub mod api;
pub mod config;
