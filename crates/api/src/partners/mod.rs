//! HTTP clients for the partner platforms.

pub mod envelope;
pub mod http;
pub mod otg;
pub mod superbet;

use std::sync::Arc;

use domain::models::partner::{PartnerError, PartnerKind};
use domain::services::{PartnerFeed, PartnerOnboarding};

pub use otg::OtgClient;
pub use superbet::SuperbetClient;

use crate::config::PartnersConfig;

/// The partner clients shared by handlers and jobs.
#[derive(Clone)]
pub struct Partners {
    pub otg: Arc<dyn PartnerFeed>,
    pub superbet: Arc<dyn PartnerFeed>,
    pub onboarding: Arc<dyn PartnerOnboarding>,
    otg_client: Option<Arc<OtgClient>>,
}

impl Partners {
    pub fn from_config(config: &PartnersConfig) -> Result<Self, PartnerError> {
        let otg = Arc::new(OtgClient::new(&config.otg)?);
        let superbet = Arc::new(SuperbetClient::new(&config.superbet)?);
        Ok(Self {
            otg: otg.clone(),
            superbet: superbet.clone(),
            onboarding: superbet,
            otg_client: Some(otg),
        })
    }

    /// Assembles partners from arbitrary implementations (used by tests).
    pub fn new(
        otg: Arc<dyn PartnerFeed>,
        superbet: Arc<dyn PartnerFeed>,
        onboarding: Arc<dyn PartnerOnboarding>,
    ) -> Self {
        Self {
            otg,
            superbet,
            onboarding,
            otg_client: None,
        }
    }

    pub fn feed(&self, kind: PartnerKind) -> Arc<dyn PartnerFeed> {
        match kind {
            PartnerKind::Otg => self.otg.clone(),
            PartnerKind::Superbet => self.superbet.clone(),
        }
    }

    /// The concrete OTG client, for endpoints outside the feed contract.
    pub fn otg_client(&self) -> Option<&OtgClient> {
        self.otg_client.as_deref()
    }
}
