//! Process-wide credential store
//!
//! Holds the one live shared secret. Reads and the compare-and-replace update
//! go through a single `RwLock` so no half-updated value is ever observable,
//! and comparisons are constant-time.

use subtle::ConstantTimeEq;
use thiserror::Error;
use tokio::sync::RwLock;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CredentialError {
    #[error("Current password is incorrect")]
    Incorrect,
}

pub struct CredentialStore {
    secret: RwLock<String>,
}

impl CredentialStore {
    pub fn new(initial: impl Into<String>) -> Self {
        Self {
            secret: RwLock::new(initial.into()),
        }
    }

    /// Check a candidate against the live secret without side effects.
    pub async fn verify(&self, candidate: &str) -> bool {
        let secret = self.secret.read().await;
        constant_time_eq(secret.as_bytes(), candidate.as_bytes())
    }

    /// Swap in a new secret, but only if `old` matches the live one. The write
    /// lock is held across compare and swap, so concurrent calls serialize and
    /// a failed call leaves the stored value untouched.
    pub async fn replace(&self, old: &str, new: String) -> Result<(), CredentialError> {
        let mut secret = self.secret.write().await;
        if !constant_time_eq(secret.as_bytes(), old.as_bytes()) {
            return Err(CredentialError::Incorrect);
        }
        *secret = new;
        Ok(())
    }
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    // ct_eq requires equal lengths; a length mismatch is an immediate reject
    a.len() == b.len() && bool::from(a.ct_eq(b))
}
