//! Devserver
//!
//! A development HTTP server that either serves canned responses (mock mode)
//! or reflects requests back to the caller (echo mode).
//!
//! # Features
//!
//! - **Mock responses**: Per path, per method and per status code bodies and headers
//! - **Status selection**: Clients pick a stored response with the `X-Response-Code` header
//! - **Contracts**: Seed responses from OpenAPI 3 or Swagger 2 examples
//! - **Overrides**: Layer a hand-written config on top of a contract
//! - **Export**: Write a contract-derived config back to disk for editing
//! - **Echo**: Mirror request headers (as `X-Req-*`) and body
//!
//! # Example Configuration
//!
//! ```json
//! {
//!   "headers": {"Content-Type": "application/json"},
//!   "paths": {
//!     "/users": {
//!       "responses": {
//!         "200": [{"id": 1}],
//!         "500": {"error": "boom"}
//!       }
//!     },
//!     "/orders": {
//!       "get": {"responses": {"200": []}},
//!       "post": {"responses": {"201": {"id": 1}, "400": null}}
//!     }
//!   }
//! }
//! ```

pub mod config;
pub mod contract;
pub mod echo;
pub mod error;
pub mod merge;
pub mod mock;
pub mod request;
pub mod resolver;
pub mod server;
pub mod table;

pub use config::MockConfig;
pub use contract::ContractVersion;
pub use echo::EchoHandler;
pub use error::{ConfigError, ContractError};
pub use mock::MockRouter;
pub use server::{Handler, ServerConfig};
pub use table::{PathEntry, ResponseSet, ResponseTable, Responses};
