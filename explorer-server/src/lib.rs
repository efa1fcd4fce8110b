//! HTTP surface, fetch planner, and process state for the data-explorer
//! backend. Split out as a library so integration tests can drive the
//! Axum app directly against a fake upstream, without a real process or
//! network.

pub mod config;
pub mod fetch;
pub mod http;
pub mod logging;
pub mod state;

pub use config::Config;
pub use state::AppState;
