use crate::domain::models::AuthTokens;
use crate::infrastructure::error::CoreError;
use std::sync::Mutex;

/// Opaque persistence for the bearer credential pair. The gateway is the
/// only writer; screens never touch tokens directly.
pub trait CredentialStore: Send + Sync {
    fn save_tokens(&self, tokens: &AuthTokens) -> Result<(), CoreError>;
    fn load_tokens(&self) -> Result<Option<AuthTokens>, CoreError>;
    fn delete_tokens(&self) -> Result<(), CoreError>;
}

/// Stores the serialized token pair in the operating system keychain.
#[derive(Debug, Clone)]
pub struct KeyringCredentialStore {
    service_name: String,
    account_name: String,
}

impl KeyringCredentialStore {
    pub fn new(service_name: impl Into<String>, account_name: impl Into<String>) -> Self {
        Self {
            service_name: service_name.into(),
            account_name: account_name.into(),
        }
    }

    fn entry(&self) -> Result<keyring::Entry, CoreError> {
        keyring::Entry::new(&self.service_name, &self.account_name)
            .map_err(|error| CoreError::Credential(error.to_string()))
    }
}

impl Default for KeyringCredentialStore {
    fn default() -> Self {
        Self::new("liftplan.auth.tokens", "default")
    }
}

impl CredentialStore for KeyringCredentialStore {
    fn save_tokens(&self, tokens: &AuthTokens) -> Result<(), CoreError> {
        let payload = serde_json::to_string(tokens)
            .map_err(|error| CoreError::Credential(error.to_string()))?;
        self.entry()?
            .set_password(&payload)
            .map_err(|error| CoreError::Credential(error.to_string()))
    }

    fn load_tokens(&self) -> Result<Option<AuthTokens>, CoreError> {
        let payload = match self.entry()?.get_password() {
            Ok(value) => value,
            Err(keyring::Error::NoEntry) => return Ok(None),
            Err(error) => return Err(CoreError::Credential(error.to_string())),
        };

        let tokens = serde_json::from_str::<AuthTokens>(&payload)
            .map_err(|error| CoreError::Credential(error.to_string()))?;
        Ok(Some(tokens))
    }

    fn delete_tokens(&self) -> Result<(), CoreError> {
        match self.entry()?.delete_credential() {
            Ok(_) => Ok(()),
            Err(keyring::Error::NoEntry) => Ok(()),
            Err(error) => Err(CoreError::Credential(error.to_string())),
        }
    }
}

#[derive(Debug, Default)]
pub struct InMemoryCredentialStore {
    tokens: Mutex<Option<AuthTokens>>,
}

impl CredentialStore for InMemoryCredentialStore {
    fn save_tokens(&self, tokens: &AuthTokens) -> Result<(), CoreError> {
        let mut guard = self
            .tokens
            .lock()
            .map_err(|error| CoreError::Credential(format!("in-memory lock poisoned: {error}")))?;
        *guard = Some(tokens.clone());
        Ok(())
    }

    fn load_tokens(&self) -> Result<Option<AuthTokens>, CoreError> {
        let guard = self
            .tokens
            .lock()
            .map_err(|error| CoreError::Credential(format!("in-memory lock poisoned: {error}")))?;
        Ok(guard.clone())
    }

    fn delete_tokens(&self) -> Result<(), CoreError> {
        let mut guard = self
            .tokens
            .lock()
            .map_err(|error| CoreError::Credential(format!("in-memory lock poisoned: {error}")))?;
        *guard = None;
        Ok(())
    }
}
