//! Admin console access configuration

use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;

use super::error::ValidationError;

/// Minimum accepted admin token length
pub const MIN_ADMIN_TOKEN_LEN: usize = 16;

/// Admin API access
///
/// Without a token every admin operation is rejected as unauthorized.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AdminConfig {
    /// Bearer token expected on admin requests
    pub api_token: Option<SecretString>,
}

impl AdminConfig {
    pub fn is_enabled(&self) -> bool {
        self.api_token.is_some()
    }

    /// Validate admin configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        match &self.api_token {
            Some(token) if token.expose_secret().len() < MIN_ADMIN_TOKEN_LEN => {
                Err(ValidationError::AdminTokenTooShort(MIN_ADMIN_TOKEN_LEN))
            }
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_token_disables_admin() {
        let config = AdminConfig::default();
        assert!(!config.is_enabled());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_short_token_rejected() {
        let config = AdminConfig {
            api_token: Some(SecretString::new("short".to_string())),
        };
        assert_eq!(
            config.validate(),
            Err(ValidationError::AdminTokenTooShort(MIN_ADMIN_TOKEN_LEN))
        );
    }

    #[test]
    fn test_long_token_accepted() {
        let config = AdminConfig {
            api_token: Some(SecretString::new("a-long-enough-admin-token".to_string())),
        };
        assert!(config.is_enabled());
        assert!(config.validate().is_ok());
    }
}
