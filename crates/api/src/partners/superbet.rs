//! Superbet partner API client.
//!
//! Besides the shared feed endpoints Superbet handles affiliate registration
//! and exposes per-affiliate deals.

use async_trait::async_trait;
use domain::models::partner::{
    PartnerAffiliate, PartnerError, PartnerKind, RegistrationRequest, RegistrationStatus,
    ResultRow, ResultsPage, ResultsQuery,
};
use domain::services::{PartnerFeed, PartnerOnboarding};
use serde_json::Value;
use tracing::{debug, info};

use super::envelope::{normalize, Normalized};
use super::http::PartnerHttp;
use crate::config::SuperbetConfig;

#[derive(Debug, Clone)]
pub struct SuperbetClient {
    http: PartnerHttp,
}

impl SuperbetClient {
    pub fn new(config: &SuperbetConfig) -> Result<Self, PartnerError> {
        Ok(Self {
            http: PartnerHttp::new(PartnerKind::Superbet, &config.api())?,
        })
    }

    fn decode_status(&self, body: Value) -> Result<RegistrationStatus, PartnerError> {
        // Some deployments wrap the payload in `data`.
        let payload = match body {
            Value::Object(mut obj) if obj.get("data").is_some_and(Value::is_object) => {
                obj.remove("data").unwrap_or(Value::Null)
            }
            other => other,
        };
        serde_json::from_value(payload).map_err(|e| PartnerError::InvalidResponse {
            partner: PartnerKind::Superbet,
            message: e.to_string(),
        })
    }
}

#[async_trait]
impl PartnerFeed for SuperbetClient {
    fn kind(&self) -> PartnerKind {
        PartnerKind::Superbet
    }

    fn is_configured(&self) -> bool {
        self.http.is_configured()
    }

    async fn fetch_affiliates(&self) -> Result<Vec<PartnerAffiliate>, PartnerError> {
        match self.http.get_json("/affiliates", &()).await {
            Ok(body) => Ok(normalize(PartnerKind::Superbet, "affiliates", body).rows),
            // Listing is optional on Superbet's side.
            Err(PartnerError::NotFound(_)) => {
                info!("Superbet affiliate listing not available");
                Ok(Vec::new())
            }
            Err(e) => Err(e),
        }
    }

    async fn fetch_results(&self, query: &ResultsQuery) -> Result<ResultsPage, PartnerError> {
        let body = self
            .http
            .get_json("/results", &query.to_query_pairs())
            .await?;
        let Normalized { rows, meta } =
            normalize::<ResultRow>(PartnerKind::Superbet, "results", body);
        Ok(ResultsPage { rows, meta })
    }
}

#[async_trait]
impl PartnerOnboarding for SuperbetClient {
    async fn register_affiliate(
        &self,
        request: &RegistrationRequest,
    ) -> Result<RegistrationStatus, PartnerError> {
        let body = self.http.post_json("/affiliates/register", request).await?;
        let status = self.decode_status(body)?;
        info!(
            request_id = %status.request_id,
            status = ?status.status,
            "Superbet registration submitted"
        );
        Ok(status)
    }

    async fn check_request_status(
        &self,
        request_id: &str,
    ) -> Result<RegistrationStatus, PartnerError> {
        let body = self
            .http
            .get_json(&format!("/affiliates/requests/{}", request_id), &())
            .await?;
        self.decode_status(body)
    }

    async fn get_affiliate_deal(&self, affiliate_id: &str) -> Result<Option<Value>, PartnerError> {
        match self
            .http
            .get_json(&format!("/affiliates/{}/deal", affiliate_id), &())
            .await
        {
            Ok(Value::Null) => Ok(None),
            Ok(body) => {
                debug!(affiliate_id, payload = %body, "Superbet deal payload");
                Ok(Some(body))
            }
            Err(PartnerError::NotFound(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }
}
