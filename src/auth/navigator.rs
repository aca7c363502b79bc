//! Navigation collaborator: sends the user to the login page.

use tracing::{info, warn};

use crate::error::Result;

/// Receives the gateway's "go log in" signal.
///
/// The gateway calls [`Navigator::goto_login`] on every terminal auth
/// failure; when that fails it falls back to a full redirect to the
/// configured login path.
pub trait Navigator: Send + Sync {
    /// Navigate to the login screen.
    fn goto_login(&self) -> Result<()>;

    /// Full redirect to `path`, bypassing the normal navigation stack.
    fn redirect(&self, path: &str);
}

/// Navigator that only records the signal in the logs.
///
/// Suitable for headless use (CLI, services) where there is no login screen.
#[derive(Debug, Clone, Default)]
pub struct TracingNavigator;

impl Navigator for TracingNavigator {
    fn goto_login(&self) -> Result<()> {
        info!("Login required");
        Ok(())
    }

    fn redirect(&self, path: &str) {
        warn!(path, "Redirecting to login");
    }
}
