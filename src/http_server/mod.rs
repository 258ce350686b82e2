//! # HTTP Server Module
//!
//! axum server exposing the gadget API.
//!
//! # Endpoints
//!
//! - `/` and `/health` - Welcome document and health check
//! - `/api/v1/auth/*` - Signup, signin, session check, logout
//! - `/api/v1/gadgets/*` - Gadget inventory and lifecycle

pub mod auth_routes;
pub mod config;
pub mod error;
pub mod extract;
pub mod gadget_routes;
pub mod observability_routes;
pub mod server;
pub mod state;

pub use config::{Environment, HttpServerConfig};
pub use error::{ApiError, ErrorKind};
pub use server::{build_router, HttpServer};
pub use state::AppState;
