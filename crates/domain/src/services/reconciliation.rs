//! Partner results reconciliation.
//!
//! Walks a partner's paged results for a date window and turns each row into
//! ledger records exactly once:
//!
//! - FTDs are de-duplicated per (affiliate, UTC day). Only the first deposit
//!   of a day is ever recorded, however many the partner reports.
//! - Revenue-share reports are de-duplicated per (affiliate, UTC day, campaign).
//!
//! Partner errors abort the run. Store errors abort only the row being
//! processed. Rows committed before an abort stay committed.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use metrics::counter;
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::models::partner::{PartnerError, ResultRow, ResultsQuery};
use crate::services::affiliate_sync::AffiliateSync;
use crate::services::commission::{
    cpa_description, parse_row_date, rev_share_commission, rev_share_description, rolling_window,
    DayWindow,
};
use crate::services::deal_resolution::{resolve_terms, EffectiveTerms};
use crate::services::ledger::{
    CpaPayout, FtdEntry, LedgerError, LedgerStore, LinkedAffiliate, RevShareEntry,
};
use crate::services::partner_feed::PartnerFeed;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconciliationSettings {
    /// Length of the rolling window ending today.
    pub window_days: u32,
    pub page_size: u32,
}

impl Default for ReconciliationSettings {
    fn default() -> Self {
        Self {
            window_days: 30,
            page_size: 50,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncSummary {
    pub configured: bool,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub pages: u32,
    pub rows_processed: usize,
    pub rows_skipped: usize,
    pub ftds_created: usize,
    pub commissions_created: usize,
    pub rev_share_reports_created: usize,
    pub affiliate_resyncs: usize,
}

#[derive(Debug)]
enum RowError {
    Partner(PartnerError),
    Store(LedgerError),
}

impl From<LedgerError> for RowError {
    fn from(e: LedgerError) -> Self {
        RowError::Store(e)
    }
}

impl From<PartnerError> for RowError {
    fn from(e: PartnerError) -> Self {
        RowError::Partner(e)
    }
}

/// Ids that stayed unknown after a resync in the current run.
#[derive(Default)]
struct RunState {
    unresolved: HashSet<String>,
}

pub struct ReconciliationEngine {
    feed: Arc<dyn PartnerFeed>,
    store: Arc<dyn LedgerStore>,
    affiliate_sync: AffiliateSync,
    settings: ReconciliationSettings,
}

impl ReconciliationEngine {
    pub fn new(
        feed: Arc<dyn PartnerFeed>,
        store: Arc<dyn LedgerStore>,
        settings: ReconciliationSettings,
    ) -> Self {
        let affiliate_sync = AffiliateSync::new(feed.clone(), store.clone());
        Self {
            feed,
            store,
            affiliate_sync,
            settings,
        }
    }

    /// Reconciles the rolling window ending today (UTC).
    pub async fn sync_recent(&self) -> Result<SyncSummary, PartnerError> {
        let (start, end) = rolling_window(Utc::now().date_naive(), self.settings.window_days);
        self.sync_range(start, end).await
    }

    pub async fn sync_range(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<SyncSummary, PartnerError> {
        let partner = self.feed.kind();
        if !self.feed.is_configured() {
            warn!(partner = %partner, "Partner API key not configured, skipping results sync");
            return Ok(SyncSummary::default());
        }

        let base = ResultsQuery::new(start, end, self.settings.page_size)?;
        let mut summary = SyncSummary {
            configured: true,
            start_date: Some(start),
            end_date: Some(end),
            ..Default::default()
        };
        let mut state = RunState::default();
        let mut page = 1u32;

        info!(partner = %partner, start = %start, end = %end, "Starting results sync");

        loop {
            let result = self.feed.fetch_results(&base.with_page(page)).await?;
            summary.pages += 1;

            if result.rows.is_empty() {
                debug!(partner = %partner, page, "Empty results page, stopping");
                break;
            }

            for row in &result.rows {
                match self.process_row(row, &mut state, &mut summary).await {
                    Ok(true) => summary.rows_processed += 1,
                    Ok(false) => summary.rows_skipped += 1,
                    Err(RowError::Partner(e)) => return Err(e),
                    Err(RowError::Store(e)) => {
                        summary.rows_skipped += 1;
                        warn!(
                            partner = %partner,
                            external_id = %row.affiliate_id,
                            date = %row.date,
                            error = %e,
                            "Failed to reconcile result row"
                        );
                    }
                }
            }

            if !result.has_more_after(page) {
                break;
            }
            page += 1;
        }

        let label = partner.as_str();
        counter!("reconciliation_rows_total", "partner" => label)
            .increment(summary.rows_processed as u64);
        counter!("reconciliation_rows_skipped_total", "partner" => label)
            .increment(summary.rows_skipped as u64);
        counter!("reconciliation_ftds_created_total", "partner" => label)
            .increment(summary.ftds_created as u64);
        counter!("reconciliation_commissions_created_total", "partner" => label)
            .increment(summary.commissions_created as u64);
        counter!("reconciliation_rev_share_reports_created_total", "partner" => label)
            .increment(summary.rev_share_reports_created as u64);

        info!(
            partner = %partner,
            pages = summary.pages,
            rows = summary.rows_processed,
            skipped = summary.rows_skipped,
            ftds = summary.ftds_created,
            commissions = summary.commissions_created,
            rev_share_reports = summary.rev_share_reports_created,
            "Results sync finished"
        );
        Ok(summary)
    }

    /// Returns `Ok(false)` when the row was skipped without error.
    async fn process_row(
        &self,
        row: &ResultRow,
        state: &mut RunState,
        summary: &mut SyncSummary,
    ) -> Result<bool, RowError> {
        let Some(affiliate) = self.resolve_affiliate(&row.affiliate_id, state, summary).await?
        else {
            warn!(
                partner = %self.feed.kind(),
                external_id = %row.affiliate_id,
                "Affiliate not found after resync, skipping row"
            );
            return Ok(false);
        };

        let Some(date) = parse_row_date(&row.date) else {
            warn!(external_id = %row.affiliate_id, date = %row.date, "Unparsable result date, skipping row");
            return Ok(false);
        };
        let day = DayWindow::of(date);
        let campaign = row.campaign();

        let rev_share = if row.rvs > Decimal::ZERO || row.lucro_tipster > Decimal::ZERO {
            let terms = self.terms_for(affiliate.id).await?;
            let Some(commission) =
                rev_share_commission(row.lucro_tipster, terms.rev_share_percentage)
            else {
                warn!(
                    external_id = %row.affiliate_id,
                    date = %row.date,
                    revenue = %row.lucro_tipster,
                    percentage = %terms.rev_share_percentage,
                    "Revenue share commission out of range, skipping row"
                );
                return Ok(false);
            };
            Some((terms.rev_share_percentage, commission))
        } else {
            None
        };

        // One FTD per affiliate per day, however many deposits the row reports.
        if row.first_deposits > 0 && !self.store.ftd_exists_on(affiliate.id, &day).await? {
            let player_external_id = format!(
                "player_{}_{}",
                affiliate.external_id,
                Utc::now().timestamp_millis()
            );
            let player_id = self
                .store
                .find_or_create_player(affiliate.id, &player_external_id)
                .await?;

            let cpa = if row.qualified_cpa > 0 {
                let terms = self.terms_for(affiliate.id).await?;
                Some(CpaPayout {
                    amount: terms.cpa_value,
                    description: cpa_description(campaign),
                })
            } else {
                None
            };
            let has_cpa = cpa.is_some();

            self.store
                .record_ftd(&FtdEntry {
                    affiliate_id: affiliate.id,
                    player_id,
                    date,
                    cpa,
                })
                .await?;

            summary.ftds_created += 1;
            if has_cpa {
                summary.commissions_created += 1;
            }
        }

        if let Some((percentage, commission)) = rev_share {
            if commission > Decimal::ZERO
                && !self
                    .store
                    .rev_share_report_exists(affiliate.id, &day, campaign)
                    .await?
            {
                self.store
                    .record_rev_share(&RevShareEntry {
                        affiliate_id: affiliate.id,
                        date,
                        revenue: row.lucro_tipster,
                        percentage,
                        commission,
                        campaign_id: campaign.map(str::to_string),
                        description: rev_share_description(campaign),
                    })
                    .await?;
                summary.rev_share_reports_created += 1;
            }
        }

        Ok(true)
    }

    /// Looks the affiliate up, running one affiliate sync on a miss.
    async fn resolve_affiliate(
        &self,
        external_id: &str,
        state: &mut RunState,
        summary: &mut SyncSummary,
    ) -> Result<Option<LinkedAffiliate>, RowError> {
        let partner = self.feed.kind();
        if let Some(found) = self.store.find_partner_affiliate(partner, external_id).await? {
            return Ok(Some(found));
        }
        if state.unresolved.contains(external_id) {
            return Ok(None);
        }

        info!(partner = %partner, external_id, "Unknown affiliate in results, syncing affiliates");
        self.affiliate_sync.run().await?;
        summary.affiliate_resyncs += 1;

        let found = self.store.find_partner_affiliate(partner, external_id).await?;
        if found.is_none() {
            state.unresolved.insert(external_id.to_string());
        }
        Ok(found)
    }

    async fn terms_for(&self, affiliate_id: Uuid) -> Result<EffectiveTerms, LedgerError> {
        let deal = self.store.affiliate_deal(affiliate_id).await?;
        let defaults = self.store.default_terms().await?;
        Ok(resolve_terms(deal.as_ref(), &defaults))
    }
}
