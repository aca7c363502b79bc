//! Fixed key namespace used in durable storage.

/// Access token.
pub const TOKEN: &str = "token";

/// Logged-in user profile (JSON).
pub const USER_INFO: &str = "userInfo";

/// UI locale, e.g. `zh-CN` or `en-US`.
pub const LOCALE: &str = "locale";
