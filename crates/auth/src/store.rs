//! Credential store - valid tokens and their destination bindings

use std::collections::{HashMap, HashSet};

use contracts::{AuthConfig, BindingConfig, DestinationKey};
use parking_lot::RwLock;
use tracing::{debug, info};

use crate::error::{AuthError, Result};

/// Thread-safe token store
///
/// Many tokens may bind to one destination; a token binds at most once.
#[derive(Debug, Default)]
pub struct CredentialStore {
    inner: RwLock<StoreInner>,
}

#[derive(Debug, Default)]
struct StoreInner {
    valid: HashSet<String>,
    bindings: HashMap<String, DestinationKey>,
}

impl CredentialStore {
    /// Create a store that accepts `tokens`
    pub fn new<I, T>(tokens: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        Self {
            inner: RwLock::new(StoreInner {
                valid: tokens.into_iter().map(Into::into).collect(),
                bindings: HashMap::new(),
            }),
        }
    }

    /// Build from `[auth]` and apply `[[bindings]]`
    ///
    /// # Errors
    ///
    /// Fails on the first binding that [`bind`](Self::bind) rejects.
    pub fn from_config(auth: &AuthConfig, bindings: &[BindingConfig]) -> Result<Self> {
        let store = Self::new(auth.valid_tokens.iter().cloned());
        for binding in bindings {
            store.bind(&binding.token, binding.destination.clone())?;
        }
        info!(
            tokens = auth.valid_tokens.len(),
            bindings = bindings.len(),
            "credential store loaded"
        );
        Ok(store)
    }

    #[inline]
    pub fn is_valid(&self, token: &str) -> bool {
        self.inner.read().valid.contains(token)
    }

    /// Destination `token` is bound to, if any
    pub fn destination_of(&self, token: &str) -> Option<DestinationKey> {
        self.inner.read().bindings.get(token).cloned()
    }

    /// Bind `token` to `destination`, signing the token up if it is new
    ///
    /// # Errors
    ///
    /// `EmptyToken` for an empty token, `AlreadyBound` if it has been bound
    /// before (including to the same destination).
    pub fn bind(&self, token: &str, destination: DestinationKey) -> Result<()> {
        if token.is_empty() {
            return Err(AuthError::EmptyToken);
        }

        let mut inner = self.inner.write();
        if let Some(existing) = inner.bindings.get(token) {
            return Err(AuthError::AlreadyBound {
                destination: existing.to_string(),
            });
        }

        let signed_up = inner.valid.insert(token.to_string());
        debug!(%destination, signed_up, "token bound");
        inner.bindings.insert(token.to_string(), destination);
        Ok(())
    }

    pub fn token_count(&self) -> usize {
        self.inner.read().valid.len()
    }

    pub fn binding_count(&self) -> usize {
        self.inner.read().bindings.len()
    }
}
