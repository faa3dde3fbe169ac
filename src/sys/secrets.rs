// src/sys/secrets.rs

use secrecy::{ExposeSecret, Secret, SecretString};

/// SecretToken is an ephemeral, memory-safe wrapper for the two credentials this
/// binary handles: the platform bearer token and the Consul SecretID.
///
/// 1. It cannot be accidentally logged (`{:?}` prints `[REDACTED]`).
/// 2. When the struct goes out of scope, the heap buffer is zeroized.
pub struct SecretToken {
    token: SecretString,
}

impl SecretToken {
    /// Takes ownership of `raw` so no second plaintext copy is left behind.
    pub fn new(raw: String) -> Self {
        Self {
            token: Secret::new(raw),
        }
    }

    /// Exposes the plaintext to `action` only. The borrow cannot outlive the call,
    /// so the secret never crosses an `.await` point.
    pub fn use_secret<F, R>(&self, action: F) -> R
    where
        F: FnOnce(&str) -> R,
    {
        action(self.token.expose_secret())
    }

    pub fn len(&self) -> usize {
        self.token.expose_secret().len()
    }

    pub fn is_empty(&self) -> bool {
        self.token.expose_secret().is_empty()
    }
}

impl From<SecretString> for SecretToken {
    fn from(token: SecretString) -> Self {
        Self { token }
    }
}

impl std::fmt::Debug for SecretToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecretToken")
            .field("value", &"[REDACTED]")
            .finish()
    }
}
