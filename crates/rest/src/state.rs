//! Application state for the register's HTTP API.
//!
//! The state is shared by every request handler: the metadata service, the
//! pseudonym and referral collaborators, and the server configuration.

use std::sync::Arc;

use register_metadata::MetadataService;
use register_persistence::core::VersionedResourceRepository;

use crate::config::ServerConfig;
use crate::services::{
    LoggingReferralNotifier, MockPseudonymService, PseudonymService, ReferralNotifier,
};

/// Shared application state for the HTTP API.
///
/// # Example
///
/// ```rust,ignore
/// use std::sync::Arc;
///
/// use register_persistence::backends::sqlite::SqliteBackend;
/// use register_rest::{AppState, ServerConfig};
///
/// let backend = SqliteBackend::in_memory()?;
/// backend.init_schema()?;
/// let state = AppState::new(Arc::new(backend), ServerConfig::default());
/// ```
#[derive(Clone)]
pub struct AppState {
    /// The metadata service.
    service: MetadataService,

    /// Pseudonym exchange client.
    pseudonyms: Arc<dyn PseudonymService>,

    /// Referral index client.
    referrals: Arc<dyn ReferralNotifier>,

    /// Server configuration.
    config: Arc<ServerConfig>,
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("service", &self.service)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl AppState {
    /// Creates a new AppState over a repository.
    ///
    /// Pseudonyms are exchanged by [`MockPseudonymService`] and referrals are
    /// only logged until other collaborators are installed.
    pub fn new(repository: Arc<dyn VersionedResourceRepository>, config: ServerConfig) -> Self {
        Self {
            service: MetadataService::new(repository),
            pseudonyms: Arc::new(MockPseudonymService),
            referrals: Arc::new(LoggingReferralNotifier),
            config: Arc::new(config),
        }
    }

    /// Replaces the pseudonym exchange client.
    pub fn with_pseudonym_service(mut self, pseudonyms: Arc<dyn PseudonymService>) -> Self {
        self.pseudonyms = pseudonyms;
        self
    }

    /// Replaces the referral index client.
    pub fn with_referral_notifier(mut self, referrals: Arc<dyn ReferralNotifier>) -> Self {
        self.referrals = referrals;
        self
    }

    /// Returns the metadata service.
    pub fn service(&self) -> &MetadataService {
        &self.service
    }

    /// Returns the pseudonym exchange client.
    pub fn pseudonyms(&self) -> &dyn PseudonymService {
        self.pseudonyms.as_ref()
    }

    /// Returns the referral index client.
    pub fn referrals(&self) -> &dyn ReferralNotifier {
        self.referrals.as_ref()
    }

    /// Returns a reference to the server configuration.
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Returns the provider id used for pseudonym exchange and referrals.
    pub fn provider_id(&self) -> &str {
        &self.config.provider_id
    }
}

#[cfg(all(test, feature = "sqlite"))]
mod tests {
    use super::*;
    use register_persistence::backends::sqlite::SqliteBackend;

    fn create_state() -> AppState {
        let backend = SqliteBackend::in_memory().unwrap();
        backend.init_schema().unwrap();
        AppState::new(Arc::new(backend), ServerConfig::for_testing())
    }

    #[test]
    fn test_state_exposes_config() {
        let state = create_state();
        assert_eq!(state.provider_id(), "00000000");
        assert_eq!(state.config().port, 0);
    }

    #[test]
    fn test_state_clone_shares_service() {
        let state = create_state();
        let cloned = state.clone();
        assert!(Arc::ptr_eq(
            state.service().repository(),
            cloned.service().repository()
        ));
    }

    #[tokio::test]
    async fn test_default_pseudonym_service_is_identity() {
        let state = create_state();
        let pseudonym = register_persistence::types::Pseudonym::random();
        let exchanged = state
            .pseudonyms()
            .exchange(&pseudonym, state.provider_id())
            .await
            .unwrap();
        assert_eq!(exchanged, pseudonym);
    }
}
