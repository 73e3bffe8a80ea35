//! Process-wide configuration
//!
//! Credentials are read once at startup and never logged. The HTTP
//! settings default to the live site and can be pointed elsewhere
//! (e.g., a mock server in tests).

use std::fmt;

use crate::error::{AltvrError, Result};
use crate::url::{DEFAULT_BASE_URL, normalize_base_url};

/// Environment variable holding the account email
pub const EMAIL_VAR: &str = "EMAIL";

/// Environment variable holding the account password
pub const PASSWORD_VAR: &str = "PASSWORD";

/// Desktop browser signature; the site rejects unknown clients
pub const USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_10_5) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/54.0.2840.71 Safari/537.36";

/// Account credentials used for the sign-in form
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    email: String,
    password: String,
}

impl Credentials {
    /// Create credentials from explicit values
    ///
    /// # Errors
    /// Returns `Config` if either value is blank
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Result<Self> {
        let email = email.into();
        let password = password.into();

        if email.trim().is_empty() {
            return Err(AltvrError::Config(format!("{} is empty", EMAIL_VAR)));
        }
        if password.is_empty() {
            return Err(AltvrError::Config(format!("{} is empty", PASSWORD_VAR)));
        }

        Ok(Self { email, password })
    }

    /// Read credentials from the `EMAIL` and `PASSWORD` environment variables
    ///
    /// # Errors
    /// Returns `Config` naming the first variable that is unset or blank
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read credentials through an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let email = lookup(EMAIL_VAR)
            .ok_or_else(|| AltvrError::Config(format!("{} is not set", EMAIL_VAR)))?;
        let password = lookup(PASSWORD_VAR)
            .ok_or_else(|| AltvrError::Config(format!("{} is not set", PASSWORD_VAR)))?;

        Self::new(email, password)
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn password(&self) -> &str {
        &self.password
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &"<redacted>")
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Configuration for the HTTP client
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Site origin without trailing slash (default: https://account.altvr.com)
    pub base_url: String,
    /// User-Agent sent with every request
    pub user_agent: String,
    /// Maximum requests per second (default: 2.0)
    pub requests_per_second: f64,
    /// Request timeout in seconds (default: 30)
    pub timeout_secs: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            user_agent: USER_AGENT.to_string(),
            requests_per_second: 2.0,
            timeout_secs: 30,
        }
    }
}

impl ClientConfig {
    /// Default configuration pointed at another origin
    pub fn with_base_url(base_url: &str) -> Self {
        Self {
            base_url: normalize_base_url(base_url),
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_credentials_from_lookup() {
        let creds = Credentials::from_lookup(lookup_from(&[
            ("EMAIL", "pilot@example.com"),
            ("PASSWORD", "hunter2"),
        ]))
        .unwrap();

        assert_eq!(creds.email(), "pilot@example.com");
        assert_eq!(creds.password(), "hunter2");
    }

    #[test]
    fn test_credentials_missing_email() {
        let result = Credentials::from_lookup(lookup_from(&[("PASSWORD", "hunter2")]));
        match result {
            Err(AltvrError::Config(msg)) => assert!(msg.contains("EMAIL")),
            _ => panic!("Expected Config error"),
        }
    }

    #[test]
    fn test_credentials_missing_password() {
        let result = Credentials::from_lookup(lookup_from(&[("EMAIL", "pilot@example.com")]));
        match result {
            Err(AltvrError::Config(msg)) => assert!(msg.contains("PASSWORD")),
            _ => panic!("Expected Config error"),
        }
    }

    #[test]
    fn test_credentials_blank_values_rejected() {
        assert!(Credentials::new("   ", "hunter2").is_err());
        assert!(Credentials::new("pilot@example.com", "").is_err());
    }

    #[test]
    fn test_credentials_debug_redacts() {
        let creds = Credentials::new("pilot@example.com", "hunter2").unwrap();
        let debug = format!("{:?}", creds);
        assert!(!debug.contains("hunter2"));
        assert!(!debug.contains("pilot@example.com"));
    }

    #[test]
    fn test_client_config_default() {
        let config = ClientConfig::default();
        assert_eq!(config.base_url, "https://account.altvr.com");
        assert_eq!(config.user_agent, USER_AGENT);
        assert_eq!(config.requests_per_second, 2.0);
        assert_eq!(config.timeout_secs, 30);
    }

    #[test]
    fn test_client_config_with_base_url() {
        let config = ClientConfig::with_base_url("http://127.0.0.1:8080/");
        assert_eq!(config.base_url, "http://127.0.0.1:8080");
        assert_eq!(config.timeout_secs, 30);
    }
}
