//! Contracts implemented by the partner HTTP adapters.

use async_trait::async_trait;
use serde_json::Value;

use crate::models::partner::{
    PartnerAffiliate, PartnerError, PartnerKind, RegistrationRequest, RegistrationStatus,
    ResultsPage, ResultsQuery,
};

/// Read side shared by both partners: affiliate listing and paged results.
#[async_trait]
pub trait PartnerFeed: Send + Sync {
    fn kind(&self) -> PartnerKind;

    /// False when no API key is configured; syncs are skipped in that case.
    fn is_configured(&self) -> bool;

    async fn fetch_affiliates(&self) -> Result<Vec<PartnerAffiliate>, PartnerError>;

    /// One page of results. Unrecognised envelopes yield an empty page.
    async fn fetch_results(&self, query: &ResultsQuery) -> Result<ResultsPage, PartnerError>;
}

/// Superbet's registration and deal endpoints.
#[async_trait]
pub trait PartnerOnboarding: Send + Sync {
    async fn register_affiliate(
        &self,
        request: &RegistrationRequest,
    ) -> Result<RegistrationStatus, PartnerError>;

    async fn check_request_status(&self, request_id: &str)
        -> Result<RegistrationStatus, PartnerError>;

    /// Raw deal payload for a partner affiliate, `None` when the partner has none.
    async fn get_affiliate_deal(&self, affiliate_id: &str) -> Result<Option<Value>, PartnerError>;
}
