//! Invite-driven onboarding and Superbet approval handling.
//!
//! Approvals arrive three ways: immediately from the registration call, via
//! the Superbet webhook, or by polling the request status. All three end in
//! [`OnboardingService::approve`], which is idempotent per invite.

use std::sync::Arc;

use chrono::Utc;
use domain::models::affiliate::{Affiliate, AffiliateStatus};
use domain::models::deal::{Deal, DealSummary};
use domain::models::invite::{
    AffiliateInvite, CreateInviteRequest, CreateInviteResponse, InviteAffiliateInfo,
    InviteListItem, InviteRegisterRequest, InviteRegistrationResponse, InviteStatus,
    PendingInvitesSummary, PublicInvite, DEFAULT_INVITE_EXPIRY_DAYS, WEBHOOK_INVITE_EXPIRY_DAYS,
};
use domain::models::partner::{
    PartnerError, RegistrationRequest, RegistrationState, RegistrationStatus,
    SuperbetWebhookPayload,
};
use domain::services::invite_lifecycle::{
    check_registrable, expiry_from, is_lapsed, status_for, transition,
};
use domain::services::PartnerOnboarding;
use persistence::repositories::{
    AffiliateRepository, DealRepository, InviteRepository, NewAccount, NewAffiliate, NewInvite,
    UserRepository,
};
use serde::Serialize;
use shared::crypto::{generate_invite_code, generate_temp_password};
use shared::password::hash_password;
use sqlx::PgPool;
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::ApiError;
use crate::services::deal_assignment::DealAssignment;
use crate::services::system_config::SystemConfigService;

/// Partner-side facts about an approved registration.
#[derive(Debug, Clone, Default)]
pub struct Approval {
    pub affiliate_link: String,
    pub superbet_affiliate_id: Option<String>,
    /// Email reported by the partner; falls back to the invite's.
    pub email: Option<String>,
    pub name: Option<String>,
    /// Password chosen on the partner side, mirrored when present.
    pub password: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WebhookOutcome {
    pub message: String,
    pub affiliate_id: Option<Uuid>,
}

impl WebhookOutcome {
    fn new(message: &str, affiliate_id: Option<Uuid>) -> Self {
        Self {
            message: message.to_string(),
            affiliate_id,
        }
    }
}

#[derive(Clone)]
pub struct OnboardingService {
    affiliates: AffiliateRepository,
    users: UserRepository,
    invites: InviteRepository,
    deals: DealRepository,
    config: SystemConfigService,
    assignment: DealAssignment,
    partner: Arc<dyn PartnerOnboarding>,
}

impl OnboardingService {
    pub fn new(pool: PgPool, partner: Arc<dyn PartnerOnboarding>) -> Self {
        Self {
            affiliates: AffiliateRepository::new(pool.clone()),
            users: UserRepository::new(pool.clone()),
            invites: InviteRepository::new(pool.clone()),
            deals: DealRepository::new(pool.clone()),
            config: SystemConfigService::new(pool.clone()),
            assignment: DealAssignment::new(pool, partner.clone()),
            partner,
        }
    }

    pub async fn create_invite(
        &self,
        request: &CreateInviteRequest,
    ) -> Result<CreateInviteResponse, ApiError> {
        let registration_link = self.config.admin_superbet_link().await?.ok_or_else(|| {
            ApiError::Validation(
                "Admin Superbet link is not configured. Set it before creating invites."
                    .to_string(),
            )
        })?;

        let email = request.email.trim().to_lowercase();
        let now = Utc::now();
        if let Some(open) = self.invites.find_open_for_email(&email, now).await? {
            return Err(ApiError::Conflict(format!(
                "A pending invite already exists for this email (code {})",
                open.code
            )));
        }

        let days = request.expires_in_days.unwrap_or(DEFAULT_INVITE_EXPIRY_DAYS);
        let invite: AffiliateInvite = self
            .invites
            .create(&NewInvite {
                code: generate_invite_code(),
                email,
                name: request.name.trim().to_string(),
                status: InviteStatus::Pending,
                expires_at: expiry_from(now, days),
                superbet_request_id: None,
            })
            .await?
            .into();

        info!(invite_id = %invite.id, code = %invite.code, expires_at = %invite.expires_at, "Invite created");
        Ok(CreateInviteResponse {
            invite,
            registration_link,
        })
    }

    /// Invites, newest first, with their affiliate when one exists.
    pub async fn list_invites(
        &self,
        status: Option<InviteStatus>,
    ) -> Result<Vec<InviteListItem>, ApiError> {
        let expired = self.invites.expire_lapsed(Utc::now()).await?;
        if expired > 0 {
            info!(expired, "Expired lapsed invites");
        }

        let invites = self.invites.list(status).await?;
        let mut items = Vec::with_capacity(invites.len());
        for entity in invites {
            let invite: AffiliateInvite = entity.into();
            let affiliate = match invite.affiliate_id {
                Some(id) => self.affiliate_info(id).await?,
                None => None,
            };
            items.push(InviteListItem { invite, affiliate });
        }
        Ok(items)
    }

    async fn affiliate_info(&self, id: Uuid) -> Result<Option<InviteAffiliateInfo>, ApiError> {
        let Some(row) = self.affiliates.find_with_email(id).await? else {
            return Ok(None);
        };
        let deal = match row.affiliate.deal_id {
            Some(deal_id) => self
                .deals
                .find_by_id(deal_id)
                .await?
                .map(|entity| DealSummary::from(&Deal::from(entity))),
            None => None,
        };
        let affiliate: Affiliate = row.affiliate.into();
        Ok(Some(InviteAffiliateInfo {
            id: affiliate.id,
            name: affiliate.name,
            email: row.email,
            status: affiliate.status,
            superbet_affiliate_link: affiliate.superbet_affiliate_link,
            deal,
        }))
    }

    /// Loads an invite by code, persisting lazy expiry.
    async fn load_by_code(&self, code: &str) -> Result<AffiliateInvite, ApiError> {
        let mut invite: AffiliateInvite = self
            .invites
            .find_by_code(code)
            .await?
            .ok_or_else(|| ApiError::NotFound("Invite not found".to_string()))?
            .into();

        if is_lapsed(&invite, Utc::now()) {
            if let Some(expired) = self
                .invites
                .transition_from_pending(invite.id, InviteStatus::Expired)
                .await?
            {
                info!(invite_id = %invite.id, "Invite expired on read");
                invite = expired.into();
            }
        }
        Ok(invite)
    }

    /// Public view of an invite. Expired or settled invites are rejected.
    pub async fn public_invite(&self, code: &str) -> Result<PublicInvite, ApiError> {
        let invite = self.load_by_code(code).await?;
        check_registrable(&invite, Utc::now())?;
        Ok(PublicInvite::from(&invite))
    }

    /// Submits the invitee to Superbet. Partner failures leave the invite
    /// pending for the webhook or the poller to settle.
    pub async fn register_with_invite(
        &self,
        code: &str,
        request: &InviteRegisterRequest,
    ) -> Result<InviteRegistrationResponse, ApiError> {
        let invite = self.load_by_code(code).await?;
        check_registrable(&invite, Utc::now())?;

        if self.users.find_by_email(&invite.email).await?.is_some() {
            return Err(ApiError::Conflict("Email already registered".to_string()));
        }

        let registration = RegistrationRequest {
            email: invite.email.clone(),
            name: invite.name.clone(),
            phone: request.phone.clone(),
            company: request.company.clone(),
        };

        let status = match self.partner.register_affiliate(&registration).await {
            Ok(status) => status,
            Err(e) => {
                warn!(invite_id = %invite.id, error = %e, "Superbet registration failed");
                return Ok(pending_response(None));
            }
        };

        let invite: AffiliateInvite = self
            .invites
            .set_request_id(invite.id, &status.request_id)
            .await?
            .map(Into::into)
            .unwrap_or(invite);

        match (status.status, status.affiliate_link.as_deref()) {
            (RegistrationState::Approved, Some(link)) if !link.is_empty() => {
                let affiliate = self
                    .approve(
                        &invite,
                        Approval {
                            affiliate_link: link.to_string(),
                            superbet_affiliate_id: status.affiliate_id.clone(),
                            password: Some(request.password.clone()),
                            ..Default::default()
                        },
                    )
                    .await?;
                Ok(InviteRegistrationResponse {
                    status: InviteStatus::Approved,
                    message: "Registration approved. You can log in now.".to_string(),
                    request_id: Some(status.request_id),
                    affiliate_id: Some(affiliate.id),
                    affiliate_link: affiliate.superbet_affiliate_link,
                })
            }
            (RegistrationState::Rejected, _) => {
                self.apply_status(&invite, InviteStatus::Rejected).await?;
                Ok(InviteRegistrationResponse {
                    status: InviteStatus::Rejected,
                    message: "Registration was rejected by the partner.".to_string(),
                    request_id: Some(status.request_id),
                    affiliate_id: None,
                    affiliate_link: None,
                })
            }
            _ => Ok(pending_response(Some(status.request_id))),
        }
    }

    /// Applies a Superbet webhook. The caller has already checked the token.
    pub async fn handle_webhook(
        &self,
        payload: &SuperbetWebhookPayload,
    ) -> Result<WebhookOutcome, ApiError> {
        let (request_id, partner_id, link) = match (
            non_empty(&payload.request_id),
            non_empty(&payload.affiliate_id),
            non_empty(&payload.affiliate_link),
        ) {
            (Some(r), Some(a), Some(l)) => (r, a, l),
            _ => {
                return Err(ApiError::Validation(
                    "requestId, affiliateId and affiliateLink are required".to_string(),
                ))
            }
        };
        let state = payload.state();
        info!(request_id, superbet_affiliate_id = partner_id, state = ?state, "Superbet webhook received");

        let invite = match self.invites.find_by_request_id(request_id).await? {
            Some(invite) => AffiliateInvite::from(invite),
            None => {
                let email = non_empty(&payload.email).ok_or_else(|| {
                    ApiError::Validation(
                        "email is required when no invite matches the requestId".to_string(),
                    )
                })?;

                if let Some(user) = self.users.find_by_email(email).await? {
                    if let Some(existing) = self.affiliates.find_by_user_id(user.id).await? {
                        self.affiliates
                            .update_superbet_link(existing.id, link, Some(partner_id))
                            .await?;
                        if state == RegistrationState::Approved && existing.deal_id.is_none() {
                            self.assignment.ensure_deal(existing.id).await;
                        }
                        return Ok(WebhookOutcome::new("Affiliate updated", Some(existing.id)));
                    }
                }

                let name = non_empty(&payload.name)
                    .map(str::to_string)
                    .unwrap_or_else(|| email.split('@').next().unwrap_or(email).to_string());
                let status = if state == RegistrationState::Approved {
                    InviteStatus::Approved
                } else {
                    InviteStatus::Pending
                };
                let created: AffiliateInvite = self
                    .invites
                    .create(&NewInvite {
                        code: generate_invite_code(),
                        email: email.trim().to_lowercase(),
                        name,
                        status,
                        expires_at: expiry_from(Utc::now(), WEBHOOK_INVITE_EXPIRY_DAYS),
                        superbet_request_id: Some(request_id.to_string()),
                    })
                    .await?
                    .into();
                info!(invite_id = %created.id, request_id, "Invite synthesised from webhook");
                created
            }
        };

        if let Some(affiliate_id) = invite.affiliate_id {
            self.affiliates
                .update_superbet_link(affiliate_id, link, Some(partner_id))
                .await?;
            if state != RegistrationState::Pending {
                self.apply_status(&invite, status_for(state)).await?;
            }
            if state == RegistrationState::Approved {
                self.assignment.ensure_deal(affiliate_id).await;
            }
            return Ok(WebhookOutcome::new("Affiliate updated", Some(affiliate_id)));
        }

        match state {
            RegistrationState::Approved => {
                let affiliate = self
                    .approve(
                        &invite,
                        Approval {
                            affiliate_link: link.to_string(),
                            superbet_affiliate_id: Some(partner_id.to_string()),
                            email: non_empty(&payload.email).map(str::to_string),
                            name: non_empty(&payload.name).map(str::to_string),
                            password: non_empty(&payload.password).map(str::to_string),
                        },
                    )
                    .await?;
                Ok(WebhookOutcome::new("Webhook processed", Some(affiliate.id)))
            }
            RegistrationState::Rejected => {
                self.apply_status(&invite, InviteStatus::Rejected).await?;
                Ok(WebhookOutcome::new("Webhook processed", None))
            }
            RegistrationState::Pending => {
                info!(invite_id = %invite.id, "Webhook reports registration still pending");
                Ok(WebhookOutcome::new("Webhook processed", None))
            }
        }
    }

    /// Polls Superbet for one invite and applies the answer.
    pub async fn check_status(&self, invite_id: Uuid) -> Result<RegistrationStatus, ApiError> {
        let invite: AffiliateInvite = self
            .invites
            .find_by_id(invite_id)
            .await?
            .ok_or_else(|| ApiError::NotFound("Invite not found".to_string()))?
            .into();
        let request_id = invite.superbet_request_id.clone().ok_or_else(|| {
            ApiError::Validation(
                "This invite has not been registered with Superbet yet".to_string(),
            )
        })?;

        let status = self.partner.check_request_status(&request_id).await?;
        self.apply_partner_status(&invite, &status).await?;
        Ok(status)
    }

    async fn apply_partner_status(
        &self,
        invite: &AffiliateInvite,
        status: &RegistrationStatus,
    ) -> Result<InviteStatus, ApiError> {
        match status.status {
            RegistrationState::Approved => match (&invite.affiliate_id, non_empty(&status.affiliate_link)) {
                (None, Some(link)) => {
                    self.approve(
                        invite,
                        Approval {
                            affiliate_link: link.to_string(),
                            superbet_affiliate_id: status.affiliate_id.clone(),
                            ..Default::default()
                        },
                    )
                    .await?;
                    Ok(InviteStatus::Approved)
                }
                (Some(_), _) => {
                    self.apply_status(invite, InviteStatus::Approved).await?;
                    Ok(InviteStatus::Approved)
                }
                (None, None) => {
                    info!(invite_id = %invite.id, "Approved without an affiliate link yet");
                    Ok(invite.status)
                }
            },
            RegistrationState::Rejected => {
                self.apply_status(invite, InviteStatus::Rejected).await?;
                Ok(InviteStatus::Rejected)
            }
            RegistrationState::Pending => Ok(invite.status),
        }
    }

    /// Expires lapsed invites and settles those Superbet has decided on.
    pub async fn check_pending_invites(&self) -> Result<PendingInvitesSummary, ApiError> {
        let mut summary = PendingInvitesSummary {
            expired: self.invites.expire_lapsed(Utc::now()).await?,
            ..Default::default()
        };

        for entity in self.invites.list_awaiting_partner().await? {
            let invite: AffiliateInvite = entity.into();
            let Some(request_id) = invite.superbet_request_id.clone() else {
                continue;
            };
            summary.checked += 1;

            let status = match self.partner.check_request_status(&request_id).await {
                Ok(status) => status,
                Err(PartnerError::NotConfigured(_)) => {
                    warn!("Superbet API key not configured, skipping pending invite check");
                    break;
                }
                Err(e) => {
                    warn!(invite_id = %invite.id, error = %e, "Pending invite status check failed");
                    summary.failed += 1;
                    continue;
                }
            };

            match self.apply_partner_status(&invite, &status).await {
                Ok(InviteStatus::Approved) => summary.approved += 1,
                Ok(InviteStatus::Rejected) => summary.rejected += 1,
                Ok(_) => {}
                Err(e) => {
                    warn!(invite_id = %invite.id, error = %e, "Failed to apply partner status");
                    summary.failed += 1;
                }
            }
        }

        info!(
            expired = summary.expired,
            checked = summary.checked,
            approved = summary.approved,
            rejected = summary.rejected,
            failed = summary.failed,
            "Pending invite check finished"
        );
        Ok(summary)
    }

    /// Creates (or reuses) the user and affiliate for an approved invite,
    /// links them and attaches a deal.
    pub async fn approve(
        &self,
        invite: &AffiliateInvite,
        approval: Approval,
    ) -> Result<Affiliate, ApiError> {
        let lookup_email = invite.email.as_str();
        let name = approval.name.clone().unwrap_or_else(|| invite.name.clone());
        let mut new_affiliate = NewAffiliate::named(name.clone(), AffiliateStatus::Approved);
        new_affiliate.superbet_affiliate_link = Some(approval.affiliate_link.clone());
        new_affiliate.superbet_affiliate_id = approval.superbet_affiliate_id.clone();

        let affiliate: Affiliate = match self.users.find_by_email(lookup_email).await? {
            Some(user) => match self.affiliates.find_by_user_id(user.id).await? {
                Some(existing) => self
                    .affiliates
                    .update_superbet_link(
                        existing.id,
                        &approval.affiliate_link,
                        approval.superbet_affiliate_id.as_deref(),
                    )
                    .await?
                    .unwrap_or(existing)
                    .into(),
                None => self
                    .affiliates
                    .create_for_user(user.id, &new_affiliate)
                    .await?
                    .into(),
            },
            None => {
                let password = match approval.password.as_deref() {
                    Some(mirrored) => mirrored.to_string(),
                    None => {
                        warn!(invite_id = %invite.id, "No password from partner, issuing a temporary one");
                        generate_temp_password()
                    }
                };
                let account = NewAccount {
                    email: approval
                        .email
                        .as_deref()
                        .unwrap_or(lookup_email)
                        .trim()
                        .to_lowercase(),
                    password_hash: hash_password(&password)?,
                    name,
                };
                let (_, created) = self
                    .affiliates
                    .create_with_user(&account, &new_affiliate)
                    .await?;
                created.into()
            }
        };

        let status = match transition(invite.status, InviteStatus::Approved) {
            Ok(status) => status,
            Err(e) => {
                warn!(invite_id = %invite.id, error = %e, "Approval for a settled invite, keeping its status");
                invite.status
            }
        };
        self.invites
            .link_affiliate(invite.id, affiliate.id, status)
            .await?;

        info!(invite_id = %invite.id, affiliate_id = %affiliate.id, "Invite approved");
        self.assignment.ensure_deal(affiliate.id).await;
        Ok(affiliate)
    }

    /// Moves an invite to `target`. Conflicting transitions are logged and ignored.
    async fn apply_status(
        &self,
        invite: &AffiliateInvite,
        target: InviteStatus,
    ) -> Result<(), ApiError> {
        if invite.status == target {
            return Ok(());
        }
        match transition(invite.status, target) {
            Ok(_) => {
                if self
                    .invites
                    .transition_from_pending(invite.id, target)
                    .await?
                    .is_none()
                {
                    warn!(invite_id = %invite.id, target = %target, "Invite changed concurrently");
                }
                Ok(())
            }
            Err(e) => {
                warn!(invite_id = %invite.id, error = %e, "Ignoring invite transition");
                Ok(())
            }
        }
    }
}

fn pending_response(request_id: Option<String>) -> InviteRegistrationResponse {
    InviteRegistrationResponse {
        status: InviteStatus::Pending,
        message: "Registration sent for approval.".to_string(),
        request_id,
        affiliate_id: None,
        affiliate_link: None,
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_non_empty() {
        assert_eq!(non_empty(&Some(" abc ".to_string())), Some("abc"));
        assert_eq!(non_empty(&Some("   ".to_string())), None);
        assert_eq!(non_empty(&None), None);
    }

    #[test]
    fn test_pending_response() {
        let response = pending_response(Some("req-1".to_string()));
        assert_eq!(response.status, InviteStatus::Pending);
        assert_eq!(response.request_id.as_deref(), Some("req-1"));
        assert!(response.affiliate_id.is_none());
    }
}
