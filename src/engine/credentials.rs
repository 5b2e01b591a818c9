//! Registered callers and password verification.

use sha2::{Digest, Sha224};
use std::collections::HashMap;

/// Hex SHA-224 of the password bytes. Unsalted.
pub fn password_digest(password: &str) -> String {
    hex::encode(Sha224::digest(password.as_bytes()))
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Caller {
    pub name: String,
    pub password_digest: String,
}

#[derive(Clone, Debug, Default)]
pub struct CredentialStore {
    callers: HashMap<String, Caller>,
}

impl CredentialStore {
    pub fn new() -> Self {
        CredentialStore::default()
    }

    /// Store `name` with the digest of `password`, replacing any earlier entry.
    /// Ignored when either value is empty.
    pub fn register(&mut self, name: &str, password: &str) {
        if name.is_empty() || password.is_empty() {
            return;
        }
        self.callers.insert(
            name.to_string(),
            Caller {
                name: name.to_string(),
                password_digest: password_digest(password),
            },
        );
    }

    pub fn authenticate(&self, name: &str, password: &str) -> bool {
        let ok = !name.is_empty()
            && !password.is_empty()
            && self
                .callers
                .get(name)
                .is_some_and(|c| c.password_digest == password_digest(password));
        if !ok {
            tracing::warn!(username = %name, "unable to authenticate user");
        }
        ok
    }

    pub fn get(&self, name: &str) -> Option<&Caller> {
        self.callers.get(name)
    }

    pub fn len(&self) -> usize {
        self.callers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.callers.is_empty()
    }
}
