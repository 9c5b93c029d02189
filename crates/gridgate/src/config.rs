//! Login configuration.

use std::time::Duration;

use gridgate_grant::DEFAULT_WELCOME_MESSAGE;
use gridgate_session::LoginSerialization;

/// How long a connection may sit idle between login frames.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Settings for the login service.
///
/// ```rust
/// use std::time::Duration;
/// use gridgate::{LoginConfig, LoginSerialization};
///
/// let config = LoginConfig::default()
///     .welcome_message("Welcome to Ahern")
///     .serialization(LoginSerialization::PerIdentity)
///     .request_timeout(Duration::from_secs(30));
/// assert_eq!(config.welcome_message, "Welcome to Ahern");
/// ```
#[derive(Debug, Clone)]
pub struct LoginConfig {
    /// Text shown by the viewer after a successful login.
    pub welcome_message: String,
    /// Global (default) or per-identity login lock.
    pub serialization: LoginSerialization,
    pub request_timeout: Duration,
}

impl Default for LoginConfig {
    fn default() -> Self {
        Self {
            welcome_message: DEFAULT_WELCOME_MESSAGE.to_string(),
            serialization: LoginSerialization::Global,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }
}

impl LoginConfig {
    pub fn welcome_message(mut self, message: impl Into<String>) -> Self {
        self.welcome_message = message.into();
        self
    }

    pub fn serialization(mut self, serialization: LoginSerialization) -> Self {
        self.serialization = serialization;
        self
    }

    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_uses_global_lock() {
        let config = LoginConfig::default();
        assert_eq!(config.serialization, LoginSerialization::Global);
        assert_eq!(config.request_timeout, Duration::from_secs(10));
        assert_eq!(config.welcome_message, "Welcome to gridgate");
    }
}
