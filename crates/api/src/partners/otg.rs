//! OTG partner API client.

use async_trait::async_trait;
use domain::models::partner::{
    PartnerAffiliate, PartnerError, PartnerKind, ResultRow, ResultsPage, ResultsQuery,
};
use domain::services::PartnerFeed;
use serde::Deserialize;

use super::envelope::{normalize, Normalized};
use super::http::PartnerHttp;
use crate::config::PartnerApiConfig;

/// Campaign as listed by OTG.
#[derive(Debug, Clone, Deserialize)]
pub struct OtgCampaign {
    #[serde(deserialize_with = "id_string")]
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
}

fn id_string<'de, D: serde::Deserializer<'de>>(d: D) -> Result<String, D::Error> {
    match serde_json::Value::deserialize(d)? {
        serde_json::Value::String(s) => Ok(s),
        serde_json::Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!("invalid id: {}", other))),
    }
}

#[derive(Debug, Clone)]
pub struct OtgClient {
    http: PartnerHttp,
}

impl OtgClient {
    pub fn new(config: &PartnerApiConfig) -> Result<Self, PartnerError> {
        Ok(Self {
            http: PartnerHttp::new(PartnerKind::Otg, config)?,
        })
    }

    pub async fn fetch_campaigns(&self) -> Result<Vec<OtgCampaign>, PartnerError> {
        let body = self.http.get_json("/external/campaigns", &()).await?;
        Ok(normalize::<OtgCampaign>(PartnerKind::Otg, "campaigns", body).rows)
    }
}

#[async_trait]
impl PartnerFeed for OtgClient {
    fn kind(&self) -> PartnerKind {
        PartnerKind::Otg
    }

    fn is_configured(&self) -> bool {
        self.http.is_configured()
    }

    async fn fetch_affiliates(&self) -> Result<Vec<PartnerAffiliate>, PartnerError> {
        let body = self.http.get_json("/external/affiliates", &()).await?;
        Ok(normalize(PartnerKind::Otg, "affiliates", body).rows)
    }

    async fn fetch_results(&self, query: &ResultsQuery) -> Result<ResultsPage, PartnerError> {
        let body = self
            .http
            .get_json("/external/results", &query.to_query_pairs())
            .await?;
        let Normalized { rows, meta } = normalize::<ResultRow>(PartnerKind::Otg, "results", body);
        Ok(ResultsPage { rows, meta })
    }
}
