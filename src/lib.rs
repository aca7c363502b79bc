//! # daily-gateway
//!
//! Rust client library for the Daily journal API.
//!
//! Every call goes through an authenticated request [`Gateway`]: it stamps the
//! bearer credential, classifies the `{code, message, data}` envelope, and
//! recovers expired sessions with a single shared refresh call, replaying
//! every request that overlapped it.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use daily_gateway::{Config, DailyApi, FileStorage, GatewayBuilder, Result, SessionStore};
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let config = Config::default();
//!     let storage = Arc::new(FileStorage::default_path()?);
//!     let session = Arc::new(SessionStore::restore(storage)?);
//!
//!     let gateway = GatewayBuilder::from_config(&config)?
//!         .credential_store(session)
//!         .build()?;
//!
//!     let api = DailyApi::new(Arc::new(gateway));
//!     for kind in api.all_types().await? {
//!         println!("{} {}", kind.id, kind.name);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - `system-keyring` - Enable system keyring storage for the session

pub mod api;
pub mod auth;
pub mod config;
pub mod error;
pub mod gateway;
pub mod models;
pub mod storage;
pub mod transport;

// Re-exports for ergonomic usage
pub use api::DailyApi;
pub use auth::{CredentialStore, Navigator, SessionStore, TracingNavigator, UserInfo};
pub use config::{Config, StatusCodes};
pub use error::{Error, RefreshFailure, Result};
pub use gateway::{
    Gateway, GatewayBuilder, GatewayResponse, NotificationCache, Notifier, TracingNotifier,
};
pub use models::credential::Credential;
pub use models::envelope::ApiResponse;
pub use models::request::{RequestBody, RequestDescriptor, ResponseType};
pub use storage::{FileStorage, KeyValueStorage, MemoryStorage};
pub use transport::{HttpTransport, Transport, TransportError, TransportResponse};
