#![doc = "The `taskgate` library crate."]
#![doc = ""]
#![doc = "A task-list service whose sessions are short-lived JWTs. Login records the token"]
#![doc = "as the user's active session in a key-value cache; logout blacklists it until it"]
#![doc = "would have expired, and the auth guard refuses blacklisted tokens before it even"]
#![doc = "checks their signature. The binary (`main.rs`) wires these pieces into an actix-web server."]

pub mod auth;
pub mod cache;
pub mod config;
pub mod error;
pub mod models;
pub mod routes;
pub mod state;
pub mod store;

pub use crate::error::AppError;
pub use crate::state::AppState;
