//! Wallet public-key lookup.

use std::sync::Arc;

use dashmap::DashMap;
use p2px_core::{BoxFuture, UserId};

/// Source of custody-wallet public keys. Absence is normal for users whose
/// wallet is not provisioned yet.
pub trait PublicKeyProvider: Send + Sync {
    fn public_key_for<'a>(
        &'a self,
        user: &'a UserId,
        crypto_symbol: &'a str,
    ) -> BoxFuture<'a, Option<String>>;
}

pub type DynPublicKeyProvider = Arc<dyn PublicKeyProvider>;

/// In-memory key registry keyed by `(user, symbol)`.
#[derive(Debug, Default)]
pub struct StaticKeys {
    keys: DashMap<(UserId, String), String>,
}

impl StaticKeys {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, user: UserId, crypto_symbol: &str, key: impl Into<String>) {
        self.keys
            .insert((user, crypto_symbol.to_ascii_uppercase()), key.into());
    }
}

impl PublicKeyProvider for StaticKeys {
    fn public_key_for<'a>(
        &'a self,
        user: &'a UserId,
        crypto_symbol: &'a str,
    ) -> BoxFuture<'a, Option<String>> {
        let key = self
            .keys
            .get(&(user.clone(), crypto_symbol.to_ascii_uppercase()))
            .map(|k| k.value().clone());
        Box::pin(async move { key })
    }
}
