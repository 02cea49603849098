//! Referral notifications.
//!
//! After a resource is written under a pseudonym, the referral index is told
//! that this provider holds data of a given domain for that subject.

use async_trait::async_trait;
use register_persistence::types::Pseudonym;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

/// UZI number sent with every referral until requests carry an authenticated one.
pub const DEFAULT_REQUESTING_UZI_NUMBER: &str = "00000000";

/// The data domain a referral announces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataDomain {
    /// Imaging data.
    BeeldBank,
    /// Medication data.
    Medicatie,
}

impl DataDomain {
    /// Picks the domain for a resource kind, ignoring case.
    pub fn for_kind(kind: &str) -> Self {
        if kind.to_ascii_lowercase().starts_with("medication") {
            DataDomain::Medicatie
        } else {
            DataDomain::BeeldBank
        }
    }
}

/// Request body for a new referral.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateReferral {
    /// The caller's pseudonym, before exchange.
    pub pseudonym: Pseudonym,
    /// What kind of data the provider holds.
    pub data_domain: DataDomain,
    /// The provider holding the data.
    pub ura_number: String,
    /// The practitioner making the request.
    pub requesting_uzi_number: String,
}

/// A referral as recorded by the index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferralEntry {
    /// Subject of the referral.
    pub pseudonym: Pseudonym,
    /// What kind of data the provider holds.
    pub data_domain: DataDomain,
    /// The provider holding the data.
    pub ura_number: String,
}

/// Errors raised while creating a referral.
#[derive(Error, Debug)]
pub enum ReferralError {
    /// The referral index rejected the request or could not be reached.
    #[error("failed to create referral: {message}")]
    Failed {
        /// What went wrong.
        message: String,
    },
}

/// Client of the referral index.
#[async_trait]
pub trait ReferralNotifier: Send + Sync {
    /// Registers a referral.
    async fn create_referral(&self, referral: CreateReferral)
    -> Result<ReferralEntry, ReferralError>;
}

/// Notifier that only logs the referral and echoes it back.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingReferralNotifier;

#[async_trait]
impl ReferralNotifier for LoggingReferralNotifier {
    async fn create_referral(
        &self,
        referral: CreateReferral,
    ) -> Result<ReferralEntry, ReferralError> {
        info!(
            pseudonym = %referral.pseudonym,
            data_domain = ?referral.data_domain,
            ura_number = %referral.ura_number,
            "Creating referral"
        );

        Ok(ReferralEntry {
            pseudonym: referral.pseudonym,
            data_domain: referral.data_domain,
            ura_number: referral.ura_number,
        })
    }
}
