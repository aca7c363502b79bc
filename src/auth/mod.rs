//! Session collaborators of the gateway.
//!
//! - [`CredentialStore`] - who holds the access token
//! - [`SessionStore`] - the concrete store, mirrored into durable storage
//! - [`Navigator`] - who gets told to show the login page

pub mod navigator;
pub mod session;

pub use navigator::{Navigator, TracingNavigator};
pub use session::{CredentialStore, SessionStore, UserInfo};
