//! imf-gadgets - gadget inventory API for IMF field teams
//!
//! Authenticated agents create gadgets with generated codenames, list and
//! rename them, and drive them through the decommission and self-destruct
//! lifecycle.

pub mod auth;
pub mod cli;
pub mod database;
pub mod gadgets;
pub mod http_server;
pub mod validation;
