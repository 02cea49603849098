//! Pseudonym exchange.

use async_trait::async_trait;
use register_persistence::types::Pseudonym;
use thiserror::Error;
use tracing::debug;

/// Errors raised while exchanging a pseudonym.
#[derive(Error, Debug)]
pub enum PseudonymError {
    /// The exchange service could not be reached or answered with an error.
    #[error("failed to exchange pseudonym: {message}")]
    ExchangeFailed {
        /// What went wrong.
        message: String,
    },

    /// The exchange service answered with something that is not a pseudonym.
    #[error("failed to exchange pseudonym: invalid pseudonym")]
    InvalidResponse,
}

/// Translates a pseudonym issued to a caller into the one stored for a provider.
///
/// Resources are always stored and searched under the exchanged pseudonym,
/// never the one the caller sent.
#[async_trait]
pub trait PseudonymService: Send + Sync {
    /// Exchanges `pseudonym` for the pseudonym belonging to `provider_id`.
    async fn exchange(
        &self,
        pseudonym: &Pseudonym,
        provider_id: &str,
    ) -> Result<Pseudonym, PseudonymError>;
}

/// Exchange stand-in that hands back the pseudonym it was given.
#[derive(Debug, Clone, Copy, Default)]
pub struct MockPseudonymService;

#[async_trait]
impl PseudonymService for MockPseudonymService {
    async fn exchange(
        &self,
        pseudonym: &Pseudonym,
        provider_id: &str,
    ) -> Result<Pseudonym, PseudonymError> {
        debug!(pseudonym = %pseudonym, provider_id = %provider_id, "Exchanging pseudonym (mock)");
        Ok(pseudonym.clone())
    }
}
