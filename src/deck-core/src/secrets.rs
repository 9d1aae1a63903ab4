//! Catalog credentials in the OS keyring.
//!
//! Obtaining a token is out of scope; this only keeps one that the user
//! supplied so it does not have to live in the config file. Entries use the
//! service name "preview-deck" and keys of the form `<catalog>/<kind>`.

use thiserror::Error;

const SERVICE_NAME: &str = crate::APP_NAME;

#[derive(Debug, Error)]
pub enum SecretsError {
    #[error("credential not found: {key}")]
    NotFound { key: String },

    #[error("keyring access denied: {0}")]
    AccessDenied(String),

    #[error("keyring unavailable: {0}")]
    Unavailable(String),

    #[error("keyring error: {0}")]
    Other(String),
}

impl From<keyring::Error> for SecretsError {
    fn from(err: keyring::Error) -> Self {
        match err {
            keyring::Error::NoEntry => SecretsError::NotFound {
                key: "unknown".into(),
            },
            keyring::Error::NoStorageAccess(e) => SecretsError::AccessDenied(e.to_string()),
            keyring::Error::PlatformFailure(e) => SecretsError::Unavailable(e.to_string()),
            other => SecretsError::Other(other.to_string()),
        }
    }
}

pub type SecretsResult<T> = Result<T, SecretsError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SecretKind {
    AccessToken,
}

impl SecretKind {
    fn as_str(&self) -> &'static str {
        match self {
            SecretKind::AccessToken => "access_token",
        }
    }
}

#[derive(Debug, Clone)]
pub struct CredentialStore {
    service: String,
}

impl Default for CredentialStore {
    fn default() -> Self {
        Self::new()
    }
}

impl CredentialStore {
    pub fn new() -> Self {
        Self {
            service: SERVICE_NAME.into(),
        }
    }

    fn build_key(catalog: &str, kind: SecretKind) -> String {
        format!("{}/{}", catalog, kind.as_str())
    }

    fn entry(&self, key: &str) -> SecretsResult<keyring::Entry> {
        Ok(keyring::Entry::new(&self.service, key)?)
    }

    pub fn store_access_token(&self, catalog: &str, token: &str) -> SecretsResult<()> {
        let key = Self::build_key(catalog, SecretKind::AccessToken);
        self.entry(&key)?.set_password(token)?;
        tracing::debug!(catalog, "stored access token in keyring");
        Ok(())
    }

    /// Returns `SecretsError::NotFound` if no token was stored.
    pub fn access_token(&self, catalog: &str) -> SecretsResult<String> {
        let key = Self::build_key(catalog, SecretKind::AccessToken);
        match self.entry(&key)?.get_password() {
            Ok(secret) => Ok(secret),
            Err(keyring::Error::NoEntry) => Err(SecretsError::NotFound { key }),
            Err(e) => Err(e.into()),
        }
    }

    /// Succeeds when nothing was stored.
    pub fn clear_access_token(&self, catalog: &str) -> SecretsResult<()> {
        let key = Self::build_key(catalog, SecretKind::AccessToken);
        match self.entry(&key)?.delete_credential() {
            Ok(()) => {
                tracing::debug!(catalog, "removed access token from keyring");
                Ok(())
            }
            Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    /// Config value first, then the keyring. Keyring failures are logged
    /// and treated as "no token" so anonymous requests can still be tried.
    pub fn resolve_access_token(&self, catalog: &str, configured: Option<&str>) -> Option<String> {
        if let Some(token) = configured.filter(|t| !t.trim().is_empty()) {
            return Some(token.to_string());
        }
        match self.access_token(catalog) {
            Ok(token) => Some(token),
            Err(SecretsError::NotFound { .. }) => None,
            Err(e) => {
                tracing::warn!(catalog, error = %e, "keyring lookup failed");
                None
            }
        }
    }
}
