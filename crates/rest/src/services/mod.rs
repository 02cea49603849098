//! Outbound collaborators of the HTTP layer.
//!
//! - [`pseudonym`] - Exchanges a caller's pseudonym for the register's own
//! - [`referral`] - Notifies the referral index after an owned write
//!
//! Both are traits so deployments can plug in network clients; the mock
//! implementations here are what the server runs with by default.

pub mod pseudonym;
pub mod referral;

pub use pseudonym::{MockPseudonymService, PseudonymError, PseudonymService};
pub use referral::{
    CreateReferral, DataDomain, LoggingReferralNotifier, ReferralEntry, ReferralError,
    ReferralNotifier,
};
