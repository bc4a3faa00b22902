//! # Identity Providers
//!
//! Authentication is delegated: the client never sees key material unless
//! the provider chooses to hold it locally. A provider's job is to run
//! one interactive authentication round and report how it ended — with an
//! identity, or with the user walking away. Walking away is an outcome,
//! not an error.
//!
//! [`DevIdentityProvider`] is the batteries-included local provider for
//! development networks: an in-process ed25519 key whose public half
//! derives the principal, no browser round-trip, no external trust.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use ed25519_dalek::SigningKey;
use rand::rngs::OsRng;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use super::Principal;
use crate::config::DEFAULT_SESSION_TTL;

/// The provider itself failed: unreachable, misconfigured, or it refused
/// the authentication attempt. Distinct from the user dismissing the
/// prompt, which is [`AuthOutcome::Dismissed`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("identity provider failed: {reason}")]
pub struct ProviderError {
    /// Human-readable description of what went wrong.
    pub reason: String,
}

impl ProviderError {
    pub fn new(reason: impl Into<String>) -> Self {
        ProviderError {
            reason: reason.into(),
        }
    }
}

/// An authenticated identity as issued by a provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    /// The principal this session acts as.
    pub principal: Principal,
    /// Unique id for this authentication round, for logs and storage.
    pub session_id: Uuid,
    /// When the delegation lapses. `None` means the provider set no expiry.
    pub expires_at: Option<DateTime<Utc>>,
}

impl Identity {
    /// Returns `true` once the expiry, if any, has passed.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        match self.expires_at {
            Some(expires_at) => now >= expires_at,
            None => false,
        }
    }
}

/// How one authentication round ended.
///
/// Both variants are successful completions of the flow: a dismissal
/// resolves the attempt, it does not poison it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthOutcome {
    /// The provider vouched for an identity.
    Authenticated(Identity),
    /// The user closed or cancelled the prompt.
    Dismissed,
}

/// One interactive authentication round against some identity authority.
///
/// Implementations must be cancel-safe: the session manager may be
/// dropped while `authenticate` is pending.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Runs the flow to completion and reports the outcome.
    async fn authenticate(&self) -> Result<AuthOutcome, ProviderError>;
}

// ---------------------------------------------------------------------------
// Dev provider
// ---------------------------------------------------------------------------

/// Local identity provider for development and test networks.
///
/// Holds an ed25519 keypair in process. The principal is derived from the
/// public key (digest plus self-authenticating tag), so the same seed
/// always authenticates as the same principal. Never use on a production
/// network: there is no user consent step and no external authority.
pub struct DevIdentityProvider {
    signing_key: SigningKey,
}

impl DevIdentityProvider {
    /// Generates a fresh random keypair.
    pub fn generate() -> Self {
        DevIdentityProvider {
            signing_key: SigningKey::generate(&mut OsRng),
        }
    }

    /// Rebuilds the keypair from a stored 32-byte seed.
    pub fn from_seed(seed: [u8; 32]) -> Self {
        DevIdentityProvider {
            signing_key: SigningKey::from_bytes(&seed),
        }
    }

    /// The 32-byte seed, for persistence by a key store.
    pub fn seed(&self) -> [u8; 32] {
        self.signing_key.to_bytes()
    }

    /// The principal this provider authenticates as.
    pub fn principal(&self) -> Principal {
        let public_key = self.signing_key.verifying_key();
        Principal::self_authenticating(public_key.as_bytes())
    }
}

#[async_trait]
impl IdentityProvider for DevIdentityProvider {
    async fn authenticate(&self) -> Result<AuthOutcome, ProviderError> {
        let expires_at = Utc::now() + Duration::seconds(DEFAULT_SESSION_TTL.as_secs() as i64);
        Ok(AuthOutcome::Authenticated(Identity {
            principal: self.principal(),
            session_id: Uuid::new_v4(),
            expires_at: Some(expires_at),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn dev_provider_always_authenticates() {
        let provider = DevIdentityProvider::generate();
        let outcome = provider.authenticate().await.unwrap();
        match outcome {
            AuthOutcome::Authenticated(identity) => {
                assert_eq!(identity.principal, provider.principal());
                assert!(!identity.is_expired(Utc::now()));
            }
            AuthOutcome::Dismissed => panic!("dev provider never dismisses"),
        }
    }

    #[tokio::test]
    async fn each_round_gets_a_fresh_session_id() {
        let provider = DevIdentityProvider::generate();
        let a = provider.authenticate().await.unwrap();
        let b = provider.authenticate().await.unwrap();
        let (AuthOutcome::Authenticated(a), AuthOutcome::Authenticated(b)) = (a, b) else {
            panic!("expected authenticated outcomes");
        };
        assert_eq!(a.principal, b.principal);
        assert_ne!(a.session_id, b.session_id);
    }

    #[test]
    fn seed_round_trip_is_deterministic() {
        let provider = DevIdentityProvider::generate();
        let rebuilt = DevIdentityProvider::from_seed(provider.seed());
        assert_eq!(provider.principal(), rebuilt.principal());

        let other = DevIdentityProvider::generate();
        assert_ne!(provider.principal(), other.principal());
    }

    #[test]
    fn expiry_is_checked_against_now() {
        let identity = Identity {
            principal: Principal::anonymous(),
            session_id: Uuid::new_v4(),
            expires_at: Some(Utc::now() - Duration::seconds(1)),
        };
        assert!(identity.is_expired(Utc::now()));

        let open_ended = Identity {
            expires_at: None,
            ..identity
        };
        assert!(!open_ended.is_expired(Utc::now()));
    }
}
