//! In-memory `LedgerStore` and scripted `PartnerFeed` for unit tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::models::deal::Deal;
use crate::models::ledger::{TransactionStatus, TransactionType};
use crate::models::partner::{
    PartnerAffiliate, PartnerError, PartnerKind, PartnerPageMeta, ResultRow, ResultsPage,
    ResultsQuery,
};
use crate::services::commission::DayWindow;
use crate::services::deal_resolution::DefaultTerms;
use crate::services::ledger::{
    FtdEntry, LedgerError, LedgerStore, LinkedAffiliate, NewPartnerAffiliate, RevShareEntry,
};
use crate::services::partner_feed::PartnerFeed;

#[derive(Debug, Clone)]
pub struct MemAffiliate {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub partner: PartnerKind,
    pub external_id: String,
    pub site_ids: Vec<i32>,
    pub deal: Option<Deal>,
}

#[derive(Debug, Clone)]
pub struct MemTransaction {
    pub affiliate_id: Uuid,
    pub player_id: Option<Uuid>,
    pub amount: Decimal,
    pub kind: TransactionType,
    pub status: TransactionStatus,
    pub description: String,
}

#[derive(Default)]
struct LedgerState {
    users: HashMap<Uuid, (String, Option<Uuid>)>,
    affiliates: Vec<MemAffiliate>,
    players: Vec<(Uuid, Uuid, String)>,
    ftds: Vec<FtdEntry>,
    commissions: Vec<(Uuid, Decimal)>,
    rev_share_reports: Vec<RevShareEntry>,
    transactions: Vec<MemTransaction>,
    defaults: Option<DefaultTerms>,
    fail_ftd_for: Option<Uuid>,
}

#[derive(Default)]
pub struct MemoryLedger {
    state: Mutex<LedgerState>,
    ftd_checks: AtomicUsize,
}

impl MemoryLedger {
    pub fn with_defaults(defaults: DefaultTerms) -> Self {
        let ledger = Self::default();
        ledger.state.lock().unwrap().defaults = Some(defaults);
        ledger
    }

    /// Number of `ftd_exists_on` lookups served so far.
    pub fn ftd_checks(&self) -> usize {
        self.ftd_checks.load(Ordering::SeqCst)
    }

    /// Inserts a linked OTG affiliate directly.
    pub fn seed_affiliate(&self, external_id: &str, name: &str) -> Uuid {
        let mut state = self.state.lock().unwrap();
        let id = Uuid::new_v4();
        let user_id = Uuid::new_v4();
        state
            .users
            .insert(user_id, (PartnerKind::Otg.placeholder_email(external_id), Some(id)));
        state.affiliates.push(MemAffiliate {
            id,
            user_id,
            name: name.to_string(),
            partner: PartnerKind::Otg,
            external_id: external_id.to_string(),
            site_ids: vec![],
            deal: None,
        });
        id
    }

    pub fn set_deal(&self, affiliate_id: Uuid, cpa: i64, pct: i64, active: bool) {
        let mut state = self.state.lock().unwrap();
        let affiliate = state
            .affiliates
            .iter_mut()
            .find(|a| a.id == affiliate_id)
            .unwrap();
        affiliate.deal = Some(Deal {
            id: Uuid::new_v4(),
            name: "Deal Teste".into(),
            cpa_value: Decimal::from(cpa),
            rev_share_percentage: Decimal::from(pct),
            active,
            description: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        });
    }

    pub fn fail_ftd_writes_for(&self, affiliate_id: Uuid) {
        self.state.lock().unwrap().fail_ftd_for = Some(affiliate_id);
    }

    pub fn affiliate_by_external(&self, external_id: &str) -> Option<MemAffiliate> {
        self.state
            .lock()
            .unwrap()
            .affiliates
            .iter()
            .find(|a| a.external_id == external_id)
            .cloned()
    }

    pub fn user_email_for(&self, affiliate_id: Uuid) -> Option<String> {
        let state = self.state.lock().unwrap();
        state
            .users
            .values()
            .find(|(_, aff)| *aff == Some(affiliate_id))
            .map(|(email, _)| email.clone())
    }

    pub fn affiliate_count(&self) -> usize {
        self.state.lock().unwrap().affiliates.len()
    }

    pub fn player_count(&self) -> usize {
        self.state.lock().unwrap().players.len()
    }

    pub fn ftds(&self) -> Vec<FtdEntry> {
        self.state.lock().unwrap().ftds.clone()
    }

    pub fn commissions(&self) -> Vec<(Uuid, Decimal)> {
        self.state.lock().unwrap().commissions.clone()
    }

    pub fn rev_share_reports(&self) -> Vec<RevShareEntry> {
        self.state.lock().unwrap().rev_share_reports.clone()
    }

    pub fn transactions(&self) -> Vec<MemTransaction> {
        self.state.lock().unwrap().transactions.clone()
    }
}

#[async_trait]
impl LedgerStore for MemoryLedger {
    async fn find_partner_affiliate(
        &self,
        partner: PartnerKind,
        external_id: &str,
    ) -> Result<Option<LinkedAffiliate>, LedgerError> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .affiliates
            .iter()
            .find(|a| a.partner == partner && a.external_id == external_id)
            .map(|a| LinkedAffiliate {
                id: a.id,
                name: a.name.clone(),
                external_id: a.external_id.clone(),
            }))
    }

    async fn create_partner_affiliate(
        &self,
        partner: PartnerKind,
        new: &NewPartnerAffiliate,
    ) -> Result<Uuid, LedgerError> {
        let mut state = self.state.lock().unwrap();
        if state.users.values().any(|(email, _)| *email == new.email) {
            return Err(LedgerError::Conflict(new.email.clone()));
        }
        let id = Uuid::new_v4();
        let user_id = Uuid::new_v4();
        state.users.insert(user_id, (new.email.clone(), Some(id)));
        state.affiliates.push(MemAffiliate {
            id,
            user_id,
            name: new.name.clone(),
            partner,
            external_id: new.external_id.clone(),
            site_ids: new.site_ids.clone(),
            deal: None,
        });
        Ok(id)
    }

    async fn refresh_partner_affiliate(
        &self,
        affiliate_id: Uuid,
        name: &str,
        site_ids: &[i32],
    ) -> Result<(), LedgerError> {
        let mut state = self.state.lock().unwrap();
        let affiliate = state
            .affiliates
            .iter_mut()
            .find(|a| a.id == affiliate_id)
            .ok_or_else(|| LedgerError::NotFound(affiliate_id.to_string()))?;
        affiliate.name = name.to_string();
        affiliate.site_ids = site_ids.to_vec();
        Ok(())
    }

    async fn affiliate_deal(&self, affiliate_id: Uuid) -> Result<Option<Deal>, LedgerError> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .affiliates
            .iter()
            .find(|a| a.id == affiliate_id)
            .and_then(|a| a.deal.clone()))
    }

    async fn default_terms(&self) -> Result<DefaultTerms, LedgerError> {
        Ok(self.state.lock().unwrap().defaults.unwrap_or_default())
    }

    async fn ftd_exists_on(&self, affiliate_id: Uuid, day: &DayWindow) -> Result<bool, LedgerError> {
        self.ftd_checks.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .state
            .lock()
            .unwrap()
            .ftds
            .iter()
            .any(|f| f.affiliate_id == affiliate_id && day.contains(f.date)))
    }

    async fn find_or_create_player(
        &self,
        affiliate_id: Uuid,
        external_id: &str,
    ) -> Result<Uuid, LedgerError> {
        let mut state = self.state.lock().unwrap();
        if let Some((id, _, _)) = state.players.iter().find(|(_, aff, _)| *aff == affiliate_id) {
            return Ok(*id);
        }
        let id = Uuid::new_v4();
        state
            .players
            .push((id, affiliate_id, external_id.to_string()));
        Ok(id)
    }

    async fn record_ftd(&self, entry: &FtdEntry) -> Result<(), LedgerError> {
        let mut state = self.state.lock().unwrap();
        if state.fail_ftd_for == Some(entry.affiliate_id) {
            return Err(LedgerError::Storage("simulated write failure".into()));
        }
        state.ftds.push(entry.clone());
        if let Some(cpa) = &entry.cpa {
            state.commissions.push((entry.affiliate_id, cpa.amount));
            state.transactions.push(MemTransaction {
                affiliate_id: entry.affiliate_id,
                player_id: Some(entry.player_id),
                amount: cpa.amount,
                kind: TransactionType::Cpa,
                status: TransactionStatus::Approved,
                description: cpa.description.clone(),
            });
        }
        Ok(())
    }

    async fn rev_share_report_exists(
        &self,
        affiliate_id: Uuid,
        day: &DayWindow,
        campaign_id: Option<&str>,
    ) -> Result<bool, LedgerError> {
        Ok(self.state.lock().unwrap().rev_share_reports.iter().any(|r| {
            r.affiliate_id == affiliate_id
                && day.contains(r.date)
                && r.campaign_id.as_deref() == campaign_id
        }))
    }

    async fn record_rev_share(&self, entry: &RevShareEntry) -> Result<(), LedgerError> {
        let mut state = self.state.lock().unwrap();
        state.rev_share_reports.push(entry.clone());
        state.transactions.push(MemTransaction {
            affiliate_id: entry.affiliate_id,
            player_id: None,
            amount: entry.commission,
            kind: TransactionType::RevenueShare,
            status: TransactionStatus::Approved,
            description: entry.description.clone(),
        });
        Ok(())
    }
}

pub fn partner_affiliate(id: &str, name: &str, site_ids: &[i32]) -> PartnerAffiliate {
    PartnerAffiliate {
        id: id.to_string(),
        name: Some(name.to_string()),
        site_ids: site_ids.to_vec(),
    }
}

pub fn result_row(affiliate_id: &str, date: &str) -> ResultRow {
    ResultRow {
        affiliate_id: affiliate_id.to_string(),
        date: date.to_string(),
        ..Default::default()
    }
}

pub fn page_of(rows: Vec<ResultRow>, current_page: i64, total_pages: i64) -> ResultsPage {
    ResultsPage {
        meta: Some(PartnerPageMeta {
            current_page,
            total_pages,
            total_rows: rows.len() as i64,
            page_size: 50,
        }),
        rows,
    }
}

enum Failure {
    Unauthorized,
}

/// Feed returning canned affiliates and result pages (page N = index N-1).
pub struct ScriptedFeed {
    kind: PartnerKind,
    configured: bool,
    affiliates: Mutex<Vec<PartnerAffiliate>>,
    pages: Mutex<Vec<ResultsPage>>,
    failure: Option<Failure>,
    affiliate_calls: AtomicUsize,
    requested_pages: Mutex<Vec<u32>>,
}

impl ScriptedFeed {
    pub fn new(kind: PartnerKind) -> Self {
        Self {
            kind,
            configured: true,
            affiliates: Mutex::new(Vec::new()),
            pages: Mutex::new(Vec::new()),
            failure: None,
            affiliate_calls: AtomicUsize::new(0),
            requested_pages: Mutex::new(Vec::new()),
        }
    }

    pub fn with_affiliates(self, affiliates: Vec<PartnerAffiliate>) -> Self {
        *self.affiliates.lock().unwrap() = affiliates;
        self
    }

    pub fn with_pages(self, pages: Vec<ResultsPage>) -> Self {
        *self.pages.lock().unwrap() = pages;
        self
    }

    pub fn unconfigured(mut self) -> Self {
        self.configured = false;
        self
    }

    pub fn failing_with_unauthorized(mut self) -> Self {
        self.failure = Some(Failure::Unauthorized);
        self
    }

    pub fn set_affiliates(&self, affiliates: Vec<PartnerAffiliate>) {
        *self.affiliates.lock().unwrap() = affiliates;
    }

    pub fn affiliate_calls(&self) -> usize {
        self.affiliate_calls.load(Ordering::SeqCst)
    }

    pub fn requested_pages(&self) -> Vec<u32> {
        self.requested_pages.lock().unwrap().clone()
    }

    fn check_failure(&self) -> Result<(), PartnerError> {
        match self.failure {
            Some(Failure::Unauthorized) => Err(PartnerError::InvalidCredentials(self.kind)),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl PartnerFeed for ScriptedFeed {
    fn kind(&self) -> PartnerKind {
        self.kind
    }

    fn is_configured(&self) -> bool {
        self.configured
    }

    async fn fetch_affiliates(&self) -> Result<Vec<PartnerAffiliate>, PartnerError> {
        self.check_failure()?;
        self.affiliate_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.affiliates.lock().unwrap().clone())
    }

    async fn fetch_results(&self, query: &ResultsQuery) -> Result<ResultsPage, PartnerError> {
        self.check_failure()?;
        self.requested_pages.lock().unwrap().push(query.page);
        Ok(self
            .pages
            .lock()
            .unwrap()
            .get(query.page as usize - 1)
            .cloned()
            .unwrap_or_default())
    }
}
